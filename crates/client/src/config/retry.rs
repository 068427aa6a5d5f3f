//! Retry Config

use std::time::Duration;

use clap::Args;

use crate::submission::RetryPolicy;

/// Submission retry settings.
#[derive(Debug, Args)]
pub struct RetryConfig {
    /// Attempts per submission, including the first
    #[arg(long, env = "TABLECART_RETRY_ATTEMPTS", default_value_t = 3_u32)]
    pub retry_attempts: u32,

    /// Delay before the first retry in milliseconds
    #[arg(long, env = "TABLECART_RETRY_BASE_DELAY_MS", default_value_t = 500_u64)]
    pub retry_base_delay_ms: u64,

    /// Upper bound for any retry delay in milliseconds
    #[arg(long, env = "TABLECART_RETRY_MAX_DELAY_MS", default_value_t = 5_000_u64)]
    pub retry_max_delay_ms: u64,
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.retry_attempts,
            base_delay: Duration::from_millis(config.retry_base_delay_ms),
            max_delay: Duration::from_millis(config.retry_max_delay_ms),
        }
    }
}
