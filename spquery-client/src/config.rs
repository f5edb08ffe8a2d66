use serde::{Deserialize, Serialize};

/// Client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Site URL; requests go to `{site_url}/_api/...`
    pub site_url: String,
    /// Maximum number of queued queries handed to the transport at once
    pub max_batch_size: usize,
    /// Request timeout in milliseconds
    pub timeout_ms: u64,
    /// Bearer token for the `Authorization` header
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    /// Form digest value for write requests
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_digest: Option<String>,
    /// Default level for the spquery crates when `RUST_LOG` is unset
    pub log_level: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            site_url: "http://localhost".to_string(),
            max_batch_size: 100,
            timeout_ms: 30000,
            access_token: None,
            request_digest: None,
            log_level: "info".to_string(),
        }
    }
}

impl ClientConfig {
    pub fn new(site_url: impl Into<String>) -> Self {
        Self {
            site_url: site_url.into(),
            ..Default::default()
        }
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Batch size used when flushing; never below one.
    pub fn effective_batch_size(&self) -> usize {
        self.max_batch_size.max(1)
    }

    #[cfg(feature = "http")]
    pub fn transport_config(&self) -> spquery_transport::HttpTransportConfig {
        spquery_transport::HttpTransportConfig {
            timeout_ms: self.timeout_ms,
            access_token: self.access_token.clone(),
            request_digest: self.request_digest.clone(),
        }
    }
}
