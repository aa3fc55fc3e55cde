//! BAXUS inventory backend.
//!
//! Provides the `InventorySource` trait and its BAXUS implementation, which
//! fetches a user's bar from the public API. The recommendation engine only
//! sees the resulting entries, so other inventory sources can slot in.

use barkeep_model::OwnedBottleEntry;
use serde::Deserialize;
use std::future::Future;
use thiserror::Error;

/// Errors from inventory backend operations.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Invalid base URL: {0}")]
    InvalidUrl(String),
}

/// Trait for inventory sources (BAXUS, local files, etc.)
pub trait InventorySource {
    /// Fetch a user's bar. `Ok(None)` means the user does not exist.
    fn fetch_bar(
        &self,
        username: &str,
    ) -> impl Future<Output = Result<Option<Vec<OwnedBottleEntry>>, BackendError>> + Send;

    /// Get the source name for logging.
    fn name(&self) -> &'static str;
}

/// BAXUS backend configuration.
#[derive(Debug, Clone)]
pub struct BaxusConfig {
    /// Base URL of the BAXUS API
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for BaxusConfig {
    fn default() -> Self {
        Self {
            base_url: "https://services.baxus.co/api".to_string(),
            timeout_secs: 30,
        }
    }
}

/// BAXUS inventory backend.
pub struct BaxusBackend {
    config: BaxusConfig,
    client: reqwest::Client,
}

impl BaxusBackend {
    /// Create a new BAXUS backend.
    pub fn new(config: BaxusConfig) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| BackendError::Connection(e.to_string()))?;

        Ok(Self { config, client })
    }

    /// URL of a user's bar, with the username escaped as a path segment.
    fn bar_url(&self, username: &str) -> Result<reqwest::Url, BackendError> {
        let mut url = reqwest::Url::parse(&self.config.base_url)
            .map_err(|e| BackendError::InvalidUrl(e.to_string()))?;

        url.path_segments_mut()
            .map_err(|_| BackendError::InvalidUrl(self.config.base_url.clone()))?
            .pop_if_empty()
            .extend(["bar", "user", username]);

        Ok(url)
    }
}

/// Bar payloads come back either bare or wrapped in `{"bar": [...]}`.
#[derive(Deserialize)]
#[serde(untagged)]
enum BarPayload {
    Entries(Vec<serde_json::Value>),
    Wrapped { bar: Vec<serde_json::Value> },
}

/// Parse a bar payload into entries.
///
/// Entries that do not match the expected shape are skipped, not fatal.
pub fn parse_bar(payload: serde_json::Value) -> Result<Vec<OwnedBottleEntry>, BackendError> {
    let raw = match serde_json::from_value::<BarPayload>(payload) {
        Ok(BarPayload::Entries(raw)) | Ok(BarPayload::Wrapped { bar: raw }) => raw,
        Err(_) => {
            return Err(BackendError::ParseError(
                "Expected an array of bar entries".to_string(),
            ))
        }
    };

    let total = raw.len();
    let entries: Vec<OwnedBottleEntry> = raw
        .into_iter()
        .filter_map(|value| match serde_json::from_value(value) {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::debug!(error = %e, "Skipping malformed bar entry");
                None
            }
        })
        .collect();

    if entries.len() < total {
        tracing::warn!(
            skipped = total - entries.len(),
            total,
            "Some bar entries could not be parsed"
        );
    }

    Ok(entries)
}

impl InventorySource for BaxusBackend {
    async fn fetch_bar(
        &self,
        username: &str,
    ) -> Result<Option<Vec<OwnedBottleEntry>>, BackendError> {
        let url = self.bar_url(username)?;

        tracing::debug!(url = %url, username, "Fetching bar data");

        let response = self
            .client
            .get(url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .send()
            .await
            .map_err(|e| BackendError::Connection(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            tracing::info!(username, "No bar found for user");
            return Ok(None);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(%status, username, "Failed to retrieve bar data");
            return Err(BackendError::RequestFailed(format!(
                "HTTP {}: {}",
                status, body
            )));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| BackendError::ParseError(e.to_string()))?;

        let entries = parse_bar(json)?;
        tracing::debug!(username, entries = entries.len(), "Retrieved bar data");
        Ok(Some(entries))
    }

    fn name(&self) -> &'static str {
        "baxus"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve one canned HTTP response on a local port.
    async fn serve_once(status_line: &'static str, body: String) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
        });

        format!("http://{}/api", addr)
    }

    fn backend(base_url: String) -> BaxusBackend {
        BaxusBackend::new(BaxusConfig {
            base_url,
            timeout_secs: 5,
        })
        .unwrap()
    }

    #[test]
    fn test_bar_url() {
        let backend = backend("https://services.baxus.co/api".to_string());
        let url = backend.bar_url("carrie").unwrap();
        assert_eq!(url.as_str(), "https://services.baxus.co/api/bar/user/carrie");

        let url = backend.bar_url("a b/c").unwrap();
        assert_eq!(url.as_str(), "https://services.baxus.co/api/bar/user/a%20b%2Fc");
    }

    #[test]
    fn test_parse_bar_shapes() {
        let entry = json!({"id": 1, "release_id": 164, "product": {"id": 164, "spirit": "Bourbon"}});

        let bare = parse_bar(json!([entry.clone()])).unwrap();
        assert_eq!(bare.len(), 1);
        assert_eq!(bare[0].release_id, Some(164));

        let wrapped = parse_bar(json!({"bar": [entry]})).unwrap();
        assert_eq!(wrapped, bare);

        assert!(matches!(
            parse_bar(json!({"error": "nope"})),
            Err(BackendError::ParseError(_))
        ));
    }

    #[test]
    fn test_parse_bar_skips_malformed_entries() {
        let entries = parse_bar(json!([
            {"release_id": "not a number"},
            {"release_id": 7, "product": null},
            42
        ]))
        .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].release_id, Some(7));
    }

    #[tokio::test]
    async fn test_fetch_bar_success() {
        let body = json!([{
            "id": 9,
            "release_id": 2847,
            "product": {
                "id": 2847,
                "name": "Blanton's",
                "spirit": "Bourbon",
                "average_msrp": 69.99,
                "proof": 93
            }
        }]);
        let base = serve_once("200 OK", body.to_string()).await;

        let entries = backend(base).fetch_bar("carrie").await.unwrap().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].product.as_ref().unwrap().proof, Some(93.0));
    }

    #[tokio::test]
    async fn test_fetch_bar_not_found() {
        let base = serve_once("404 Not Found", "{}".to_string()).await;
        assert!(backend(base).fetch_bar("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_fetch_bar_server_error() {
        let base = serve_once("500 Internal Server Error", "{}".to_string()).await;
        assert!(matches!(
            backend(base).fetch_bar("carrie").await,
            Err(BackendError::RequestFailed(_))
        ));
    }
}
