//! Pending operations and their compaction.
//!
//! The log holds at most one operation per fingerprint. Each cart mutation
//! folds into the existing entry instead of appending, so the batch sent to
//! the server is the smallest set of instructions that reproduces the local
//! cart.
//!
//! Per fingerprint the entry moves through:
//!
//! ```text
//! ∅ ── add (new line) ──▶ AddItem ── add/update ──▶ AddItem(q')
//! AddItem ── remove ──▶ ∅                      (the server never saw it)
//! ∅ ── update/add (known line) ──▶ UpdateItem
//! ∅ ── remove (known line) ──▶ RemoveItem ── add ──▶ UpdateItem
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{cart::LineItem, fingerprint::Fingerprint, menu::SelectedOption};

use super::errors::OperationError;

/// A deferred instruction to mutate the server cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PendingOperation {
    /// Create a line the server has not seen yet.
    AddItem {
        /// Local key used for compaction; not sent to the server
        fingerprint: Fingerprint,

        /// Menu item to add
        #[serde(default)]
        menu_item_id: String,

        /// Units to add
        #[serde(default)]
        quantity: u32,

        /// Chosen option choices
        #[serde(default)]
        selected_options: Vec<SelectedOption>,
    },

    /// Set the quantity of a line the server already has.
    UpdateItem {
        /// Line to update
        fingerprint: Fingerprint,

        /// New quantity
        #[serde(default)]
        quantity: u32,
    },

    /// Delete a line the server already has.
    RemoveItem {
        /// Line to remove
        fingerprint: Fingerprint,
    },
}

impl PendingOperation {
    /// Fingerprint of the line this operation targets.
    pub fn fingerprint(&self) -> &Fingerprint {
        match self {
            Self::AddItem { fingerprint, .. }
            | Self::UpdateItem { fingerprint, .. }
            | Self::RemoveItem { fingerprint } => fingerprint,
        }
    }

    /// Short name of the operation kind, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AddItem { .. } => "add_item",
            Self::UpdateItem { .. } => "update_item",
            Self::RemoveItem { .. } => "remove_item",
        }
    }

    fn add_from_line(line: &LineItem, quantity: u32) -> Self {
        Self::AddItem {
            fingerprint: line.fingerprint.clone(),
            menu_item_id: line.menu_item.id.clone(),
            quantity,
            selected_options: line.selected_options.clone(),
        }
    }
}

/// Compacted, insertion-ordered log of pending operations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperationLog {
    operations: Vec<PendingOperation>,
}

impl OperationLog {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a log from stored operations. If several entries target the same
    /// fingerprint, the last one wins.
    #[must_use]
    pub fn from_operations(operations: Vec<PendingOperation>) -> Self {
        let mut log = Self::new();

        for operation in operations {
            log.replace(operation);
        }

        log
    }

    /// Operations in insertion order.
    pub fn as_slice(&self) -> &[PendingOperation] {
        &self.operations
    }

    /// Iterate operations in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &PendingOperation> {
        self.operations.iter()
    }

    /// Number of pending operations.
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Whether nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// The pending operation for a fingerprint, if any.
    pub fn get(&self, fingerprint: &Fingerprint) -> Option<&PendingOperation> {
        self.operations
            .iter()
            .find(|operation| operation.fingerprint() == fingerprint)
    }

    /// Whether an operation is pending for a fingerprint.
    pub fn contains(&self, fingerprint: &Fingerprint) -> bool {
        self.get(fingerprint).is_some()
    }

    /// Empty the log, returning its operations.
    pub fn take(&mut self) -> Vec<PendingOperation> {
        std::mem::take(&mut self.operations)
    }

    /// Drop every operation.
    pub fn clear(&mut self) {
        self.operations.clear();
    }

    /// Fold an addition of `added` units into the log.
    ///
    /// `line` is the line after the addition; `line_existed` says whether it
    /// was already in the cart beforehand.
    pub fn record_add(&mut self, line: &LineItem, added: u32, line_existed: bool) {
        let fingerprint = &line.fingerprint;

        if let Some(PendingOperation::AddItem { quantity, .. }) = self.get_mut(fingerprint) {
            *quantity = quantity.saturating_add(added);
            debug!(%fingerprint, quantity = *quantity, "merged add into pending add_item");
            return;
        }

        if let Some(existing) = self.get(fingerprint) {
            debug!(%fingerprint, superseded = existing.kind(), "re-add collapses to update_item");
        } else if !line_existed {
            self.operations
                .push(PendingOperation::add_from_line(line, added));
            return;
        }

        self.replace(PendingOperation::UpdateItem {
            fingerprint: fingerprint.clone(),
            quantity: line.quantity,
        });
    }

    /// Fold a quantity change into the log.
    pub fn record_update(&mut self, fingerprint: &Fingerprint, new_quantity: u32) {
        if let Some(PendingOperation::AddItem { quantity, .. }) = self.get_mut(fingerprint) {
            *quantity = new_quantity;
            debug!(%fingerprint, quantity = new_quantity, "rewrote pending add_item quantity");
            return;
        }

        self.replace(PendingOperation::UpdateItem {
            fingerprint: fingerprint.clone(),
            quantity: new_quantity,
        });
    }

    /// Fold a removal into the log.
    pub fn record_remove(&mut self, fingerprint: &Fingerprint) {
        if matches!(
            self.get(fingerprint),
            Some(PendingOperation::AddItem { .. })
        ) {
            self.discard(fingerprint);
            debug!(%fingerprint, "removal cancelled unsent add_item");
            return;
        }

        self.replace(PendingOperation::RemoveItem {
            fingerprint: fingerprint.clone(),
        });
    }

    /// Merge a batch that failed to submit back under the edits made while it
    /// was in flight. Captured entries keep their position; the fresh edits
    /// refine them.
    #[must_use]
    pub fn merge_captured(captured: &[PendingOperation], fresh: &OperationLog) -> Self {
        let mut merged = Vec::with_capacity(captured.len() + fresh.len());

        for operation in captured {
            match fresh.get(operation.fingerprint()) {
                None => merged.push(operation.clone()),
                Some(later) => merged.extend(merge_pair(operation, later)),
            }
        }

        merged.extend(
            fresh
                .iter()
                .filter(|later| {
                    !captured
                        .iter()
                        .any(|operation| operation.fingerprint() == later.fingerprint())
                })
                .cloned(),
        );

        Self { operations: merged }
    }

    /// Check every operation is well formed before it is sent.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::Invalid`] for the first malformed operation.
    pub fn validate(&self) -> Result<(), OperationError> {
        for (index, operation) in self.operations.iter().enumerate() {
            let reason = match operation {
                _ if operation.fingerprint().is_empty() => Some("missing fingerprint"),
                PendingOperation::AddItem { menu_item_id, .. } if menu_item_id.trim().is_empty() => {
                    Some("add_item is missing its menu item")
                }
                PendingOperation::AddItem { quantity: 0, .. }
                | PendingOperation::UpdateItem { quantity: 0, .. } => {
                    Some("quantity must be at least 1")
                }
                _ if self
                    .operations
                    .iter()
                    .filter(|other| other.fingerprint() == operation.fingerprint())
                    .count()
                    > 1 =>
                {
                    Some("more than one operation for the same line")
                }
                _ => None,
            };

            if let Some(reason) = reason {
                return Err(OperationError::Invalid {
                    index,
                    reason: reason.to_string(),
                });
            }
        }

        Ok(())
    }

    fn get_mut(&mut self, fingerprint: &Fingerprint) -> Option<&mut PendingOperation> {
        self.operations
            .iter_mut()
            .find(|operation| operation.fingerprint() == fingerprint)
    }

    fn discard(&mut self, fingerprint: &Fingerprint) {
        self.operations
            .retain(|operation| operation.fingerprint() != fingerprint);
    }

    /// Drop any entry for the operation's fingerprint and append it.
    fn replace(&mut self, operation: PendingOperation) {
        self.discard(operation.fingerprint());
        self.operations.push(operation);
    }
}

fn merge_pair(captured: &PendingOperation, later: &PendingOperation) -> Option<PendingOperation> {
    match (captured, later) {
        (PendingOperation::AddItem { .. }, PendingOperation::RemoveItem { .. }) => None,
        (
            PendingOperation::AddItem {
                fingerprint,
                menu_item_id,
                selected_options,
                ..
            },
            PendingOperation::AddItem { quantity, .. } | PendingOperation::UpdateItem { quantity, .. },
        ) => Some(PendingOperation::AddItem {
            fingerprint: fingerprint.clone(),
            menu_item_id: menu_item_id.clone(),
            quantity: *quantity,
            selected_options: selected_options.clone(),
        }),
        (_, PendingOperation::AddItem { fingerprint, quantity, .. }) => {
            Some(PendingOperation::UpdateItem {
                fingerprint: fingerprint.clone(),
                quantity: *quantity,
            })
        }
        (_, later) => Some(later.clone()),
    }
}
