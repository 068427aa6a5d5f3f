//! Storage Config

use std::path::PathBuf;

use clap::Args;
use rusty_money::iso::Currency;
use tablecart::{
    catalog::{CatalogError, parse_currency},
    storage::CartNamespace,
};

/// Local cart storage settings.
#[derive(Debug, Args)]
pub struct StorageConfig {
    /// Directory holding stored carts
    #[arg(long, env = "TABLECART_DATA_DIR", default_value = ".tablecart")]
    pub data_dir: PathBuf,

    /// Currency used for totals (GBP, USD, EUR)
    #[arg(long, env = "TABLECART_CURRENCY", default_value = "GBP")]
    pub currency: String,

    /// Dine-in table session; the pickup cart is used when omitted
    #[arg(long, env = "TABLECART_SESSION")]
    pub session: Option<String>,
}

impl StorageConfig {
    /// Namespace selected by `--session`.
    #[must_use]
    pub fn namespace(&self) -> CartNamespace {
        CartNamespace::from_session(self.session.clone())
    }

    /// Configured currency.
    ///
    /// # Errors
    ///
    /// Returns an error for an unsupported currency code.
    pub fn currency(&self) -> Result<&'static Currency, CatalogError> {
        parse_currency(&self.currency)
    }
}
