use std::time::Duration;

use async_trait::async_trait;

use crate::source::ManifestSource;
use crate::types::{FetchedManifest, ManifestDocument, ManifestError};

/// The well-known remote manifest authority.
pub const DEFAULT_REMOTE_URL: &str = "https://manifests.polyver.dev";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_ATTEMPTS: u32 = 3;
const BACKOFF_STEP: Duration = Duration::from_millis(500);

/// Fetches `{base}/{runtime}.json` from the remote authority. Transient
/// failures (transport errors and 5xx) are retried a fixed number of times
/// with linear backoff; anything else fails immediately.
pub struct HttpSource {
    base_url: String,
    client: reqwest::Client,
}

impl HttpSource {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("polyver/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();
        Self {
            base_url: base_url.into(),
            client,
        }
    }

    fn manifest_url(&self, runtime: &str) -> String {
        format!("{}/{runtime}.json", self.base_url.trim_end_matches('/'))
    }

    async fn fetch_once(&self, url: &str) -> Result<String, ManifestError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| ManifestError::Request {
                url: url.to_string(),
                details: err.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ManifestError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|err| ManifestError::Request {
            url: url.to_string(),
            details: err.to_string(),
        })
    }
}

fn is_retryable(error: &ManifestError) -> bool {
    match error {
        ManifestError::Request { .. } => true,
        ManifestError::HttpStatus { status, .. } => *status >= 500,
        _ => false,
    }
}

#[async_trait]
impl ManifestSource for HttpSource {
    fn name(&self) -> &'static str {
        "remote"
    }

    async fn fetch_manifest(&self, runtime: &str) -> Result<FetchedManifest, ManifestError> {
        let url = self.manifest_url(runtime);

        let mut last_error = None;
        for attempt in 1..=MAX_ATTEMPTS {
            match self.fetch_once(&url).await {
                Ok(body) => {
                    let document = ManifestDocument::from_json(&body, "remote")?;
                    return Ok(FetchedManifest {
                        manifest: document.manifest_for(runtime),
                        origin: "remote",
                    });
                }
                Err(error) if is_retryable(&error) && attempt < MAX_ATTEMPTS => {
                    log::debug!("Manifest fetch attempt {attempt} failed, retrying: {error}");
                    tokio::time::sleep(BACKOFF_STEP * attempt).await;
                    last_error = Some(error);
                }
                Err(error) => return Err(error),
            }
        }

        // Unreachable: the loop always returns on the last attempt.
        Err(last_error.unwrap_or(ManifestError::Request {
            url,
            details: "no attempts were made".to_string(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document_body() -> String {
        r#"{
            "version": 1,
            "versions": {
                "node": {
                    "22.15.1": {
                        "linux-amd64": { "url": "https://example.invalid/node.tar.gz" }
                    }
                }
            }
        }"#
        .to_string()
    }

    #[tokio::test]
    async fn fetches_and_extracts_runtime_manifest() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/node.json")
            .with_status(200)
            .with_body(document_body())
            .create_async()
            .await;

        let source = HttpSource::new(server.url());
        let fetched = source.fetch_manifest("node").await.unwrap();

        assert_eq!(fetched.origin, "remote");
        assert!(fetched.manifest.descriptor("22.15.1", "linux-amd64").is_some());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn not_found_fails_immediately_without_retry() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/node.json")
            .with_status(404)
            .expect(1)
            .create_async()
            .await;

        let result = HttpSource::new(server.url()).fetch_manifest("node").await;

        assert!(matches!(
            result,
            Err(ManifestError::HttpStatus { status: 404, .. })
        ));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn server_errors_are_retried_a_fixed_number_of_times() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/node.json")
            .with_status(503)
            .expect(3)
            .create_async()
            .await;

        let result = HttpSource::new(server.url()).fetch_manifest("node").await;

        assert!(matches!(
            result,
            Err(ManifestError::HttpStatus { status: 503, .. })
        ));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn bad_schema_from_remote_is_not_retried() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/node.json")
            .with_status(200)
            .with_body(r#"{"version": 9, "versions": {}}"#)
            .expect(1)
            .create_async()
            .await;

        let result = HttpSource::new(server.url()).fetch_manifest("node").await;

        assert!(matches!(
            result,
            Err(ManifestError::SchemaVersion { found: 9 })
        ));
        mock.assert_async().await;
    }
}
