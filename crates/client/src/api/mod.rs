//! Cart API
//!
//! The remote side of reconciliation: one call to apply a batch of actions and
//! one to read the authoritative cart.

use async_trait::async_trait;
use mockall::automock;
use tablecart::storage::CartNamespace;

mod errors;
mod http;
pub mod models;

pub use errors::ApiError;
pub use http::{HttpCartApi, HttpCartApiConfig};
pub use models::{CartAction, CartBatch, ServerCartItem, ServerCartSnapshot};

/// Server cart endpoints, scoped to the table session or pickup cart named by
/// `namespace`.
#[automock]
#[async_trait]
pub trait CartApi: Send + Sync {
    /// Apply a batch of actions and return the resulting cart.
    async fn submit_batch(
        &self,
        batch: &CartBatch,
        namespace: &CartNamespace,
    ) -> Result<ServerCartSnapshot, ApiError>;

    /// Read the current server cart.
    async fn fetch_server_cart(
        &self,
        namespace: &CartNamespace,
    ) -> Result<ServerCartSnapshot, ApiError>;
}
