//! Client configuration module

use clap::Args;

use crate::config::{
    api::ApiConfig, observability::LoggingConfig, retry::RetryConfig, storage::StorageConfig,
};

pub mod api;
pub mod observability;
pub mod retry;
pub mod storage;

pub use observability::LogFormat;

/// Tablecart client configuration
#[derive(Debug, Args)]
pub struct ClientConfig {
    /// Cart API settings.
    #[command(flatten)]
    pub api: ApiConfig,

    /// Submission retry settings.
    #[command(flatten)]
    pub retry: RetryConfig,

    /// Local storage settings.
    #[command(flatten)]
    pub storage: StorageConfig,

    /// Logging output settings.
    #[command(flatten)]
    pub logging: LoggingConfig,
}
