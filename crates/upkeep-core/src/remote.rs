//! Authoritative remote update check.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::SourceError;

/// Result of a successful remote check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteUpdate {
    pub version: String,
    #[serde(default)]
    pub body: Option<String>,
}

/// The primary update source. `Ok(None)` means "up to date"; errors are
/// treated by the caller as "no candidate" for this pass.
#[async_trait]
pub trait RemoteSource: Send + Sync {
    async fn check(&self) -> Result<Option<RemoteUpdate>, SourceError>;
}

/// Fetches a JSON manifest (`{"version": "...", "body": "..."}`) over
/// HTTP. An empty or missing `version` field reads as "up to date".
pub struct HttpManifestSource {
    client: reqwest::Client,
    url: String,
}

#[derive(Debug, Deserialize)]
struct Manifest {
    #[serde(default)]
    version: String,
    #[serde(default)]
    body: Option<String>,
}

impl HttpManifestSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl RemoteSource for HttpManifestSource {
    async fn check(&self) -> Result<Option<RemoteUpdate>, SourceError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| SourceError::Remote(e.to_string()))?;

        let manifest: Manifest = response
            .json()
            .await
            .map_err(|e| SourceError::Remote(e.to_string()))?;

        if manifest.version.is_empty() {
            return Ok(None);
        }
        Ok(Some(RemoteUpdate {
            version: manifest.version,
            body: manifest.body,
        }))
    }
}

/// A source that never reports an update. Useful for hosts that disable
/// the remote check.
pub struct NullRemoteSource;

#[async_trait]
impl RemoteSource for NullRemoteSource {
    async fn check(&self) -> Result<Option<RemoteUpdate>, SourceError> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifest_without_version_reads_as_up_to_date() {
        let manifest: Manifest = serde_json::from_str(r#"{"body": "notes"}"#).unwrap();
        assert!(manifest.version.is_empty());
    }

    #[test]
    fn manifest_parses_version_and_body() {
        let manifest: Manifest =
            serde_json::from_str(r#"{"version": "2.3.0", "body": "• fixes"}"#).unwrap();
        assert_eq!(manifest.version, "2.3.0");
        assert_eq!(manifest.body.as_deref(), Some("• fixes"));
    }

    #[tokio::test]
    async fn null_source_reports_no_update() {
        assert_eq!(NullRemoteSource.check().await.unwrap(), None);
    }
}
