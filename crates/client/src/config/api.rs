//! API Config

use std::time::Duration;

use clap::Args;

use crate::api::HttpCartApiConfig;

/// Cart API connection settings.
#[derive(Debug, Args)]
pub struct ApiConfig {
    /// Cart API base URL
    #[arg(long, env = "TABLECART_API_URL", default_value = "http://localhost:8080")]
    pub api_url: String,

    /// Bearer token sent with every request
    #[arg(long, env = "TABLECART_API_TOKEN", hide_env_values = true)]
    pub api_token: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, env = "TABLECART_REQUEST_TIMEOUT_SECONDS", default_value_t = 10_u64)]
    pub request_timeout_seconds: u64,
}

impl ApiConfig {
    /// HTTP client settings.
    #[must_use]
    pub fn http(&self) -> HttpCartApiConfig {
        HttpCartApiConfig {
            base_url: self.api_url.clone(),
            token: self.api_token.clone(),
            timeout: Duration::from_secs(self.request_timeout_seconds),
        }
    }
}
