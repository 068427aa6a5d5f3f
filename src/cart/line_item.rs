//! Line Items

use jiff::Timestamp;
use rusty_money::{Money, iso::Currency};
use serde::{Deserialize, Serialize};

use crate::{
    fingerprint::{Fingerprint, fingerprint},
    menu::{MenuItem, SelectedOption},
    pricing,
};

/// One configured product in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Content fingerprint of `menu_item.id` and `selected_options`
    pub fingerprint: Fingerprint,

    /// Product snapshot taken when the line was created
    pub menu_item: MenuItem,

    /// Number of units, always at least one
    pub quantity: u32,

    /// Chosen option choices
    #[serde(default)]
    pub selected_options: Vec<SelectedOption>,

    /// When the line was first added
    pub created_at: Timestamp,

    /// When the line was last changed
    pub updated_at: Timestamp,
}

impl LineItem {
    /// Create a line, deriving its fingerprint from the item and selections.
    #[must_use]
    pub fn new(menu_item: MenuItem, quantity: u32, selected_options: Vec<SelectedOption>) -> Self {
        let now = Timestamp::now();

        Self {
            fingerprint: fingerprint(&menu_item.id, &selected_options),
            menu_item,
            quantity,
            selected_options,
            created_at: now,
            updated_at: now,
        }
    }

    /// Price of a single unit including selected choices.
    pub fn unit_price(&self, currency: &'static Currency) -> Money<'static, Currency> {
        pricing::unit_price(&self.menu_item, &self.selected_options, currency)
    }

    /// Price of the whole line.
    pub fn total(&self, currency: &'static Currency) -> Money<'static, Currency> {
        pricing::line_total(
            &self.menu_item,
            &self.selected_options,
            self.quantity,
            currency,
        )
    }

    pub(crate) fn touch(&mut self) {
        self.updated_at = Timestamp::now();
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::USD;

    use super::*;

    #[test]
    fn new_line_derives_fingerprint() {
        let selected = vec![SelectedOption::new("size", ["large"])];

        let line = LineItem::new(MenuItem::new("cola", "Cola", 2_00), 1, selected.clone());

        assert_eq!(line.fingerprint, fingerprint("cola", &selected));
        assert_eq!(line.created_at, line.updated_at);
    }

    #[test]
    fn total_multiplies_unit_price() {
        let line = LineItem::new(MenuItem::new("cola", "Cola", 2_00), 4, Vec::new());

        assert_eq!(line.unit_price(USD), Money::from_minor(2_00, USD));
        assert_eq!(line.total(USD), Money::from_minor(8_00, USD));
    }
}
