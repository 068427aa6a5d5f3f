//! Tablecart prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    cart::{CartError, LineItem, LocalCart, OperationError, OperationLog, PendingOperation},
    catalog::{CatalogError, Menu},
    fingerprint::{Fingerprint, fingerprint},
    menu::{MenuItem, MenuOption, OptionChoice, SelectedOption},
    pricing::{cart_total, line_total, unit_price},
    storage::{
        CartNamespace, CartRepository, FileStore, KeyValueStore, MemoryStore, StorageError,
        StoredCart,
    },
};
