//! HTTP client for the cart API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use tablecart::storage::CartNamespace;
use tracing::debug;

use crate::api::{
    ApiError, CartApi,
    models::{CartBatch, CartBatchRequest, ServerCartSnapshot},
};

const IDEMPOTENCY_KEY: &str = "Idempotency-Key";

/// Connection settings for [`HttpCartApi`].
#[derive(Debug, Clone)]
pub struct HttpCartApiConfig {
    /// API base URL, e.g. `"https://api.example.com/v1"`.
    pub base_url: String,

    /// Bearer token, when the API requires one.
    pub token: Option<String>,

    /// Per-request timeout.
    pub timeout: Duration,
}

/// [`CartApi`] over HTTP/JSON.
#[derive(Debug, Clone)]
pub struct HttpCartApi {
    base_url: Url,
    token: Option<String>,
    http: Client,
}

impl HttpCartApi {
    /// Create a new client from the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is not an absolute `http(s)` style URL
    /// or the underlying HTTP client cannot be built.
    pub fn new(config: HttpCartApiConfig) -> Result<Self, ApiError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|error| ApiError::InvalidUrl(format!("{}: {error}", config.base_url)))?;

        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(config.base_url));
        }

        let http = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            base_url,
            token: config.token.filter(|token| !token.trim().is_empty()),
            http,
        })
    }

    /// `{base}/sessions/{id}/cart/{tail..}` for a table, `{base}/cart/{tail..}`
    /// for pickup. The session id is a single encoded path segment.
    fn cart_url(&self, namespace: &CartNamespace, tail: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();

        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(
                namespace
                    .session_id()
                    .map(|session_id| ["sessions", session_id])
                    .into_iter()
                    .flatten(),
            )
            .push("cart")
            .extend(tail);

        Ok(url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

async fn read_snapshot(response: Response) -> Result<ServerCartSnapshot, ApiError> {
    let status = response.status();

    if status == StatusCode::UNAUTHORIZED {
        return Err(ApiError::Unauthorized);
    }

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();

        return Err(ApiError::Status {
            status: status.as_u16(),
            body,
        });
    }

    Ok(response.json().await?)
}

#[async_trait]
impl CartApi for HttpCartApi {
    async fn submit_batch(
        &self,
        batch: &CartBatch,
        namespace: &CartNamespace,
    ) -> Result<ServerCartSnapshot, ApiError> {
        let url = self.cart_url(namespace, &["actions"])?;

        debug!(%url, batch = %batch.id, actions = batch.len(), "posting cart batch");

        let response = self
            .authorize(self.http.post(url))
            .header(IDEMPOTENCY_KEY, batch.id.to_string())
            .json(&CartBatchRequest {
                actions: &batch.actions,
            })
            .send()
            .await?;

        read_snapshot(response).await
    }

    async fn fetch_server_cart(
        &self,
        namespace: &CartNamespace,
    ) -> Result<ServerCartSnapshot, ApiError> {
        let url = self.cart_url(namespace, &[])?;

        debug!(%url, "fetching server cart");

        let response = self.authorize(self.http.get(url)).send().await?;

        read_snapshot(response).await
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    fn api(base_url: &str) -> Result<HttpCartApi, ApiError> {
        HttpCartApi::new(HttpCartApiConfig {
            base_url: base_url.to_string(),
            token: Some("  ".to_string()),
            timeout: Duration::from_secs(1),
        })
    }

    #[test]
    fn table_carts_are_scoped_to_session() -> TestResult {
        let api = api("https://api.example.com/v1/")?;

        assert_eq!(
            api.cart_url(&CartNamespace::table("t-12"), &[])?.as_str(),
            "https://api.example.com/v1/sessions/t-12/cart"
        );

        Ok(())
    }

    #[test]
    fn pickup_cart_uses_root_path() -> TestResult {
        let api = api("https://api.example.com/v1")?;

        assert_eq!(
            api.cart_url(&CartNamespace::Pickup, &["actions"])?.as_str(),
            "https://api.example.com/v1/cart/actions"
        );

        Ok(())
    }

    #[test]
    fn bare_host_base_url() -> TestResult {
        let api = api("http://localhost:8080")?;

        assert_eq!(
            api.cart_url(&CartNamespace::table("7"), &["actions"])?.as_str(),
            "http://localhost:8080/sessions/7/cart/actions"
        );

        Ok(())
    }

    #[test]
    fn session_id_stays_one_path_segment() -> TestResult {
        let api = api("https://api.example.com/v1")?;

        let url = api.cart_url(&CartNamespace::table("../admin?x=1#frag"), &["actions"])?;

        assert_eq!(url.path(), "/v1/sessions/..%2Fadmin%3Fx=1%23frag/cart/actions");
        assert_eq!(url.query(), None);
        assert_eq!(url.fragment(), None);

        Ok(())
    }

    #[test]
    fn relative_base_url_is_rejected() {
        assert!(matches!(api("api.example.com"), Err(ApiError::InvalidUrl(_))));
        assert!(matches!(api("mailto:ops@example.com"), Err(ApiError::InvalidUrl(_))));
    }

    #[test]
    fn blank_token_is_ignored() -> TestResult {
        let api = api("https://api.example.com")?;

        assert_eq!(api.token, None);

        Ok(())
    }
}
