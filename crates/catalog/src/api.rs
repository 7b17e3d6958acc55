//! REST client for the kit catalog endpoint.
//!
//! Issues a single `GET <endpoint>?id=<category>` with a bearer
//! credential and hands the body to [`parse_catalog_body`]. Retrying is
//! not done here; callers feed the result into a
//! [`CatalogSynchronizer`](crate::CatalogSynchronizer).

use std::future::Future;
use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;

use crate::parse::{parse_catalog_body, preview, ParsedCatalog};

/// Errors from one catalog fetch. Every variant is retryable.
#[derive(Debug, thiserror::Error)]
pub enum CatalogFetchError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The endpoint answered with something other than 200.
    #[error("Catalog endpoint returned HTTP {status}: {preview}")]
    HttpStatus {
        status: u16,
        /// Truncated response body for diagnostics.
        preview: String,
    },

    #[error("Catalog endpoint returned an empty body")]
    EmptyBody,

    /// The body does not look like JSON (HTML error or challenge page).
    #[error("Catalog body is not JSON: {preview}")]
    NotJson { preview: String },

    #[error("Failed to parse catalog: {source} (body: {preview})")]
    Parse {
        #[source]
        source: serde_json::Error,
        preview: String,
    },
}

/// HTTP client for one catalog category.
pub struct CatalogApi {
    client: reqwest::Client,
    endpoint: String,
    token: String,
    category_id: String,
}

impl CatalogApi {
    /// Create a client with a fixed per-request `timeout`.
    pub fn new(
        endpoint: String,
        token: String,
        category_id: String,
        timeout: Duration,
    ) -> Result<Self, CatalogFetchError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, endpoint, token, category_id))
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(
        client: reqwest::Client,
        endpoint: String,
        token: String,
        category_id: String,
    ) -> Self {
        Self {
            client,
            endpoint,
            token,
            category_id,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Fetch and validate the kit list.
    pub async fn fetch(&self) -> Result<ParsedCatalog, CatalogFetchError> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("id", self.category_id.as_str())])
            .bearer_auth(&self.token)
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if status != StatusCode::OK {
            return Err(CatalogFetchError::HttpStatus {
                status: status.as_u16(),
                preview: preview(&body),
            });
        }

        let parsed = parse_catalog_body(&body)?;
        tracing::debug!(
            endpoint = %self.endpoint,
            kits = parsed.kits.len(),
            skipped = parsed.skipped,
            "Fetched kit catalog",
        );
        Ok(parsed)
    }
}

/// Anything the sync driver can pull a catalog from.
pub trait CatalogSource: Send + Sync {
    /// Where the catalog comes from; used in logs.
    fn endpoint(&self) -> &str;

    fn fetch(&self) -> impl Future<Output = Result<ParsedCatalog, CatalogFetchError>> + Send;
}

impl CatalogSource for CatalogApi {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn fetch(&self) -> impl Future<Output = Result<ParsedCatalog, CatalogFetchError>> + Send {
        CatalogApi::fetch(self)
    }
}
