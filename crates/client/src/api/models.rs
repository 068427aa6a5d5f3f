//! Cart API models.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use tablecart::{
    cart::{LineItem, PendingOperation},
    fingerprint::Fingerprint,
    menu::{MenuItem, SelectedOption},
};

/// One instruction in a batch, as the server expects it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CartAction {
    /// Create a new line.
    AddItem {
        /// Menu item to add
        menu_item_id: String,

        /// Units to add
        quantity: u32,

        /// Chosen option choices
        selected_options: Vec<SelectedOption>,
    },

    /// Set the quantity of an existing line.
    UpdateItem {
        /// Line to update
        fingerprint: Fingerprint,

        /// New quantity
        quantity: u32,
    },

    /// Delete an existing line.
    RemoveItem {
        /// Line to remove
        fingerprint: Fingerprint,
    },
}

impl From<&PendingOperation> for CartAction {
    fn from(operation: &PendingOperation) -> Self {
        match operation {
            PendingOperation::AddItem {
                menu_item_id,
                quantity,
                selected_options,
                ..
            } => Self::AddItem {
                menu_item_id: menu_item_id.clone(),
                quantity: *quantity,
                selected_options: selected_options.clone(),
            },
            PendingOperation::UpdateItem {
                fingerprint,
                quantity,
            } => Self::UpdateItem {
                fingerprint: fingerprint.clone(),
                quantity: *quantity,
            },
            PendingOperation::RemoveItem { fingerprint } => Self::RemoveItem {
                fingerprint: fingerprint.clone(),
            },
        }
    }
}

/// A set of actions submitted together.
///
/// `id` is sent as the idempotency key and stays the same across retries of
/// the batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartBatch {
    /// Batch identifier
    pub id: Uuid,

    /// Actions in submission order
    pub actions: Vec<CartAction>,
}

impl CartBatch {
    /// Wrap captured operations in a new batch.
    #[must_use]
    pub fn new(operations: &[PendingOperation]) -> Self {
        Self {
            id: Uuid::now_v7(),
            actions: operations.iter().map(CartAction::from).collect(),
        }
    }

    /// Number of actions.
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Whether the batch has no actions.
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

/// Request body for batch submission.
#[derive(Debug, Serialize)]
pub(crate) struct CartBatchRequest<'a> {
    pub(crate) actions: &'a [CartAction],
}

/// The authoritative cart as returned by the server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ServerCartSnapshot {
    /// Lines in the server cart
    #[serde(default)]
    pub items: Vec<ServerCartItem>,

    /// Server-computed total in minor units, if provided
    #[serde(default)]
    pub total: Option<u64>,
}

/// One line of the server cart.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerCartItem {
    /// Server's identifier for the line; local fingerprints are recomputed
    #[serde(default)]
    pub fingerprint: Option<String>,

    /// Product snapshot
    pub menu_item: MenuItem,

    /// Number of units
    pub quantity: u32,

    /// Chosen option choices
    #[serde(default)]
    pub selected_options: Vec<SelectedOption>,
}

impl ServerCartSnapshot {
    /// Convert the snapshot into local line items.
    #[must_use]
    pub fn into_lines(self) -> Vec<LineItem> {
        self.items
            .into_iter()
            .map(|item| LineItem::new(item.menu_item, item.quantity, item.selected_options))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use testresult::TestResult;

    use super::*;

    #[test]
    fn add_action_omits_local_fingerprint() -> TestResult {
        let operation = PendingOperation::AddItem {
            fingerprint: Fingerprint::from_string("abc"),
            menu_item_id: "pasta".to_string(),
            quantity: 2,
            selected_options: vec![SelectedOption::new("sauce", ["pesto"])],
        };

        let value = serde_json::to_value(CartAction::from(&operation))?;

        assert_eq!(
            value,
            json!({
                "type": "add_item",
                "menu_item_id": "pasta",
                "quantity": 2,
                "selected_options": [{ "option_id": "sauce", "choice_ids": ["pesto"] }],
            })
        );

        Ok(())
    }

    #[test]
    fn update_and_remove_actions_carry_fingerprint() -> TestResult {
        let fp = Fingerprint::from_string("abc");

        let update = serde_json::to_value(CartAction::from(&PendingOperation::UpdateItem {
            fingerprint: fp.clone(),
            quantity: 4,
        }))?;
        let remove = serde_json::to_value(CartAction::from(&PendingOperation::RemoveItem {
            fingerprint: fp,
        }))?;

        assert_eq!(update, json!({ "type": "update_item", "fingerprint": "abc", "quantity": 4 }));
        assert_eq!(remove, json!({ "type": "remove_item", "fingerprint": "abc" }));

        Ok(())
    }

    #[test]
    fn batch_ids_are_unique() {
        let a = CartBatch::new(&[]);
        let b = CartBatch::new(&[]);

        assert_ne!(a.id, b.id);
        assert!(a.is_empty());
    }

    #[test]
    fn snapshot_tolerates_missing_fields() -> TestResult {
        let snapshot: ServerCartSnapshot = serde_json::from_value(json!({
            "items": [{
                "menu_item": { "id": "water", "name": "Water", "price": 150 },
                "quantity": 2
            }]
        }))?;

        assert_eq!(snapshot.total, None);

        let lines = snapshot.into_lines();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines.first().map(|line| line.quantity), Some(2));

        Ok(())
    }
}
