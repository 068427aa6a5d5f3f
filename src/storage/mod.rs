//! Storage
//!
//! Durable key/value persistence for local carts. Every table session gets its
//! own namespace so two dine-in sessions on the same device never share state.
//!
//! # Layout
//!
//! ```text
//! local-cart[-table-{id}]        JSON array of LineItem
//! cart-operations[-table-{id}]   JSON array of PendingOperation
//! ```

use std::{
    fmt::{Debug, Display, Formatter, Result as FmtResult},
    io,
};

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use thiserror::Error;

use crate::cart::{LineItem, operations::PendingOperation};

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

const LINES_KEY: &str = "local-cart";
const OPERATIONS_KEY: &str = "cart-operations";

/// Errors raised by storage backends.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The stored value exists but is not valid JSON for the expected type.
    #[error("stored value under '{key}' is corrupted")]
    Corrupted {
        /// Storage key that failed to parse
        key: String,

        /// Underlying parse error
        #[source]
        source: serde_json::Error,
    },

    /// A value could not be encoded before writing.
    #[error("failed to encode value for '{key}'")]
    Encode {
        /// Storage key being written
        key: String,

        /// Underlying encode error
        #[source]
        source: serde_json::Error,
    },

    /// The backend failed to read or write.
    #[error("storage I/O failed for '{key}'")]
    Io {
        /// Storage key being accessed
        key: String,

        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The key contains characters the backend cannot store.
    #[error("invalid storage key '{0}'")]
    InvalidKey(String),
}

/// Which cart a store instance owns: a table session, or the pickup cart used
/// when no session is active.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CartNamespace {
    /// Session-less pickup cart
    Pickup,

    /// Dine-in cart scoped to a table session
    Table {
        /// Table session identifier
        session_id: String,
    },
}

impl CartNamespace {
    /// Namespace for a table session.
    #[must_use]
    pub fn table(session_id: impl Into<String>) -> Self {
        Self::Table {
            session_id: session_id.into(),
        }
    }

    /// Namespace for an optional session: pickup when absent.
    #[must_use]
    pub fn from_session(session_id: Option<String>) -> Self {
        session_id.map_or(Self::Pickup, Self::table)
    }

    /// Session identifier sent to the cart API, if any.
    pub fn session_id(&self) -> Option<&str> {
        match self {
            Self::Pickup => None,
            Self::Table { session_id } => Some(session_id),
        }
    }

    /// Key holding the serialized line items.
    pub fn lines_key(&self) -> String {
        self.scoped(LINES_KEY)
    }

    /// Key holding the serialized pending operations.
    pub fn operations_key(&self) -> String {
        self.scoped(OPERATIONS_KEY)
    }

    fn scoped(&self, base: &str) -> String {
        match self {
            Self::Pickup => base.to_string(),
            Self::Table { session_id } => format!("{base}-table-{session_id}"),
        }
    }
}

impl Display for CartNamespace {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Pickup => f.write_str("pickup"),
            Self::Table { session_id } => write!(f, "table:{session_id}"),
        }
    }
}

/// Everything persisted for one namespace.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredCart {
    /// Line items, in display order
    pub lines: Vec<LineItem>,

    /// Operations not yet confirmed by the server
    pub operations: Vec<PendingOperation>,
}

/// Persistence seam injected into the local cart.
pub trait CartRepository: Debug + Send + Sync {
    /// Read the stored cart for a namespace. Missing entries load as empty.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Corrupted`] when stored JSON cannot be parsed,
    /// or a backend error when the read itself fails.
    fn load(&self, namespace: &CartNamespace) -> Result<StoredCart, StorageError>;

    /// Replace the stored cart for a namespace.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if encoding or writing fails.
    fn save(&self, namespace: &CartNamespace, cart: &StoredCart) -> Result<(), StorageError>;

    /// Erase every entry for a namespace.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the backend fails to delete.
    fn clear(&self, namespace: &CartNamespace) -> Result<(), StorageError>;
}

/// Raw string key/value backend, in the shape of browser local storage.
pub trait KeyValueStore: Debug + Send + Sync {
    /// Read a value.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the backend fails to read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a value, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the backend fails to write.
    fn set(&self, key: &str, value: String) -> Result<(), StorageError>;

    /// Delete a value. Deleting a missing key succeeds.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the backend fails to delete.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

impl<S: KeyValueStore> CartRepository for S {
    fn load(&self, namespace: &CartNamespace) -> Result<StoredCart, StorageError> {
        Ok(StoredCart {
            lines: read_json(self, &namespace.lines_key())?,
            operations: read_json(self, &namespace.operations_key())?,
        })
    }

    fn save(&self, namespace: &CartNamespace, cart: &StoredCart) -> Result<(), StorageError> {
        write_json(self, &namespace.lines_key(), &cart.lines)?;
        write_json(self, &namespace.operations_key(), &cart.operations)
    }

    fn clear(&self, namespace: &CartNamespace) -> Result<(), StorageError> {
        self.remove(&namespace.lines_key())?;
        self.remove(&namespace.operations_key())
    }
}

fn read_json<S, T>(store: &S, key: &str) -> Result<T, StorageError>
where
    S: KeyValueStore + ?Sized,
    T: DeserializeOwned + Default,
{
    let Some(raw) = store.get(key)? else {
        return Ok(T::default());
    };

    serde_json::from_str(&raw).map_err(|source| StorageError::Corrupted {
        key: key.to_string(),
        source,
    })
}

fn write_json<S, T>(store: &S, key: &str, value: &T) -> Result<(), StorageError>
where
    S: KeyValueStore + ?Sized,
    T: Serialize + ?Sized,
{
    let encoded = serde_json::to_string(value).map_err(|source| StorageError::Encode {
        key: key.to_string(),
        source,
    })?;

    store.set(key, encoded)
}
