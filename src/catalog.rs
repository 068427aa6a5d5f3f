//! Menu Catalog
//!
//! Menus are described in YAML with human readable prices:
//!
//! ```yaml
//! currency: GBP
//! items:
//!   burger:
//!     name: Burger
//!     price: "8.50 GBP"
//!     options:
//!       - id: size
//!         name: Size
//!         required: true
//!         choices:
//!           - id: large
//!             name: Large
//!             price: "1.00 GBP"
//! ```

use std::{fs, path::Path};

use rust_decimal::{Decimal, prelude::ToPrimitive};
use rustc_hash::FxHashMap;
use rusty_money::iso::{Currency, EUR, GBP, USD};
use serde::Deserialize;
use thiserror::Error;

use crate::menu::{MenuItem, MenuOption, OptionChoice};

/// Catalog Parsing Errors
#[derive(Debug, Error)]
pub enum CatalogError {
    /// IO error reading the menu file
    #[error("Failed to read menu file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Invalid price format
    #[error("Invalid price format: {0}")]
    InvalidPrice(String),

    /// Unknown currency code
    #[error("Unknown currency code: {0}")]
    UnknownCurrency(String),

    /// A price is quoted in a different currency to the menu
    #[error("Price {price} does not match menu currency {currency}")]
    CurrencyMismatch {
        /// The offending price string
        price: String,

        /// The menu's currency code
        currency: String,
    },
}

/// A parsed menu.
#[derive(Debug, Clone)]
pub struct Menu {
    currency: &'static Currency,
    items: FxHashMap<String, MenuItem>,
}

impl Menu {
    /// Parse a menu from YAML.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is malformed, a price cannot be parsed,
    /// or a price is quoted in a currency other than the menu's.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, CatalogError> {
        let fixture: MenuFixture = serde_norway::from_str(yaml)?;
        let currency = parse_currency(&fixture.currency)?;

        let mut items = FxHashMap::default();

        for (id, item) in fixture.items {
            let menu_item = item.into_menu_item(id.clone(), currency)?;
            items.insert(id, menu_item);
        }

        Ok(Self { currency, items })
    }

    /// Read and parse a menu file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let contents = fs::read_to_string(path)?;

        Self::from_yaml_str(&contents)
    }

    /// Menu currency.
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }

    /// Look up an item by id.
    pub fn item(&self, id: &str) -> Option<&MenuItem> {
        self.items.get(id)
    }

    /// All items, sorted by id.
    pub fn items(&self) -> Vec<&MenuItem> {
        let mut items: Vec<&MenuItem> = self.items.values().collect();
        items.sort_by(|a, b| a.id.cmp(&b.id));
        items
    }
}

#[derive(Debug, Deserialize)]
struct MenuFixture {
    currency: String,

    #[serde(default)]
    items: FxHashMap<String, MenuItemFixture>,
}

#[derive(Debug, Deserialize)]
struct MenuItemFixture {
    name: String,
    price: String,

    #[serde(default)]
    options: Vec<MenuOptionFixture>,
}

#[derive(Debug, Deserialize)]
struct MenuOptionFixture {
    id: String,
    name: String,

    #[serde(default)]
    required: bool,

    #[serde(default)]
    choices: Vec<OptionChoiceFixture>,
}

#[derive(Debug, Deserialize)]
struct OptionChoiceFixture {
    id: String,
    name: String,

    #[serde(default)]
    price: Option<String>,
}

impl MenuItemFixture {
    fn into_menu_item(
        self,
        id: String,
        currency: &'static Currency,
    ) -> Result<MenuItem, CatalogError> {
        let mut item = MenuItem::new(id, self.name, parse_price_in(&self.price, currency)?);

        for option in self.options {
            let mut menu_option = MenuOption::new(option.id, option.name, option.required);

            for choice in option.choices {
                let price = match choice.price {
                    Some(price) => parse_price_in(&price, currency)?,
                    None => 0,
                };

                menu_option = menu_option.with_choice(OptionChoice::new(choice.id, choice.name, price));
            }

            item = item.with_option(menu_option);
        }

        Ok(item)
    }
}

fn parse_price_in(s: &str, currency: &'static Currency) -> Result<u64, CatalogError> {
    let (minor_units, price_currency) = parse_price(s)?;

    if price_currency != currency {
        return Err(CatalogError::CurrencyMismatch {
            price: s.to_string(),
            currency: currency.iso_alpha_code.to_string(),
        });
    }

    Ok(minor_units)
}

/// Parse price string (e.g., "2.99 GBP") into minor units and currency
///
/// # Errors
///
/// Returns an error if the string is not in the format "AMOUNT CURRENCY",
/// if the amount is negative or not a decimal number, or if the currency code
/// is not recognized.
pub fn parse_price(s: &str) -> Result<(u64, &'static Currency), CatalogError> {
    let parts: Vec<&str> = s.split_whitespace().collect();

    let [amount, currency_code] = parts.as_slice() else {
        return Err(CatalogError::InvalidPrice(format!(
            "Expected format 'AMOUNT CURRENCY', got: {s}"
        )));
    };

    let amount = amount
        .parse::<Decimal>()
        .map_err(|_err| CatalogError::InvalidPrice(s.to_string()))?;

    let minor_units = amount
        .checked_mul(Decimal::new(100, 0))
        .and_then(|value| value.round_dp(0).to_u64())
        .ok_or_else(|| CatalogError::InvalidPrice(s.to_string()))?;

    Ok((minor_units, parse_currency(currency_code)?))
}

/// Resolve a supported ISO currency code.
///
/// # Errors
///
/// Returns [`CatalogError::UnknownCurrency`] for anything but GBP, USD or EUR.
pub fn parse_currency(code: &str) -> Result<&'static Currency, CatalogError> {
    match code.trim().to_ascii_uppercase().as_str() {
        "GBP" => Ok(GBP),
        "USD" => Ok(USD),
        "EUR" => Ok(EUR),
        _ => Err(CatalogError::UnknownCurrency(code.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;
    use testresult::TestResult;

    use super::*;

    const MENU: &str = r#"
currency: GBP
items:
  pasta:
    name: Pasta
    price: "10.00 GBP"
    options:
      - id: sauce
        name: Sauce
        required: true
        choices:
          - id: pesto
            name: Pesto
            price: "2.50 GBP"
          - id: tomato
            name: Tomato
  water:
    name: Water
    price: "1.50 GBP"
"#;

    #[test]
    fn parses_items_options_and_choices() -> TestResult {
        let menu = Menu::from_yaml_str(MENU)?;

        let pasta = menu.item("pasta").ok_or("pasta missing")?;

        assert_eq!(menu.currency(), GBP);
        assert_eq!(pasta.price, 10_00);
        assert_eq!(pasta.choice("sauce", "pesto").map(|c| c.price), Some(2_50));
        assert_eq!(pasta.choice("sauce", "tomato").map(|c| c.price), Some(0));
        assert_eq!(pasta.option("sauce").map(|o| o.required), Some(true));

        Ok(())
    }

    #[test]
    fn items_are_sorted_by_id() -> TestResult {
        let menu = Menu::from_yaml_str(MENU)?;

        let ids: Vec<&str> = menu.items().iter().map(|item| item.id.as_str()).collect();

        assert_eq!(ids, ["pasta", "water"]);

        Ok(())
    }

    #[test]
    fn reads_menu_from_file() -> TestResult {
        let mut file = NamedTempFile::new()?;
        file.write_all(MENU.as_bytes())?;

        let menu = Menu::from_file(file.path())?;

        assert!(menu.item("water").is_some());

        Ok(())
    }

    #[test]
    fn rejects_price_in_other_currency() {
        let yaml = "currency: GBP\nitems:\n  tea:\n    name: Tea\n    price: \"2.00 USD\"\n";

        let result = Menu::from_yaml_str(yaml);

        assert!(matches!(result, Err(CatalogError::CurrencyMismatch { .. })));
    }

    #[test]
    fn parse_price_rejects_invalid_format() {
        let result = parse_price("2.99GBP");

        assert!(matches!(result, Err(CatalogError::InvalidPrice(_))));
    }

    #[test]
    fn parse_price_rejects_negative_amounts() {
        let result = parse_price("-1.00 GBP");

        assert!(matches!(result, Err(CatalogError::InvalidPrice(_))));
    }

    #[test]
    fn parse_price_rejects_unknown_currency() {
        let result = parse_price("2.99 ABC");

        assert!(matches!(result, Err(CatalogError::UnknownCurrency(code)) if code == "ABC"));
    }

    #[test]
    fn parse_currency_is_case_insensitive() -> TestResult {
        assert_eq!(parse_currency("eur")?, EUR);

        Ok(())
    }
}
