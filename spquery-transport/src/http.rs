use crate::codec::{decode_response, encode_body};
use crate::{RestTransport, TransportError};
use async_trait::async_trait;
use reqwest::Client as HttpClient;
use spquery_core::{HttpMethod, RestRequest, RestResponse};
use std::time::Duration;
use tracing::{debug, trace};

/// HTTP transport configuration
#[derive(Debug, Clone)]
pub struct HttpTransportConfig {
    /// Request timeout in milliseconds
    pub timeout_ms: u64,
    /// Sent as `Authorization: Bearer <token>`
    pub access_token: Option<String>,
    /// Form digest sent as `X-RequestDigest` on POST requests
    pub request_digest: Option<String>,
}

impl Default for HttpTransportConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 30000,
            access_token: None,
            request_digest: None,
        }
    }
}

/// Sends each request as one HTTP round trip with reqwest.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    config: HttpTransportConfig,
    http_client: HttpClient,
}

impl HttpTransport {
    pub fn new(config: HttpTransportConfig) -> Result<Self, TransportError> {
        let http_client = HttpClient::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| TransportError::Connection(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            config,
            http_client,
        })
    }

    pub fn config(&self) -> &HttpTransportConfig {
        &self.config
    }

    fn map_send_error(err: reqwest::Error) -> TransportError {
        if err.is_timeout() {
            TransportError::Timeout(err.to_string())
        } else {
            TransportError::Connection(err.to_string())
        }
    }
}

#[async_trait]
impl RestTransport for HttpTransport {
    async fn execute(&self, request: RestRequest) -> Result<RestResponse, TransportError> {
        debug!("Sending {} {}", request.method, request.url);

        let mut builder = match request.method {
            HttpMethod::Get => self.http_client.get(&request.url),
            HttpMethod::Post => self.http_client.post(&request.url),
        };

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(token) = &self.config.access_token {
            builder = builder.bearer_auth(token);
        }
        if request.method == HttpMethod::Post {
            if let Some(digest) = &self.config.request_digest {
                builder = builder.header("X-RequestDigest", digest.as_str());
            }
        }
        if let Some(body) = &request.body {
            let bytes = encode_body(body)?;
            trace!("Request body: {}", String::from_utf8_lossy(&bytes));
            builder = builder.body(bytes);
        }

        let response = builder.send().await.map_err(Self::map_send_error)?;
        let status = response.status().as_u16();
        let text = response.text().await.map_err(Self::map_send_error)?;

        trace!("Response {} body: {}", status, text);
        decode_response(status, &text)
    }
}
