use async_trait::async_trait;
use spquery_core::{ClientError, RemoteFault, RestRequest, RestResponse};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Connection failed: {0}")]
    Connection(String),
    #[error("Request timed out: {0}")]
    Timeout(String),
    #[error("Codec error: {0}")]
    Codec(String),
    #[error("Remote error: {0}")]
    Remote(RemoteFault),
}

impl From<TransportError> for ClientError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Remote(fault) => ClientError::Remote(fault),
            TransportError::Codec(message) => ClientError::InvalidResponse(message),
            other => ClientError::Transport(other.to_string()),
        }
    }
}

/// Carries REST requests to the remote API.
#[async_trait]
pub trait RestTransport: Send + Sync {
    /// One physical round trip.
    async fn execute(&self, request: RestRequest) -> Result<RestResponse, TransportError>;

    /// Sends `requests` in order and stops at the first failure.
    ///
    /// The returned results line up with the leading requests; requests past
    /// the failed one have no entry. Implementations may combine requests into
    /// fewer round trips as long as that shape is preserved.
    async fn execute_batch(
        &self,
        requests: Vec<RestRequest>,
    ) -> Vec<Result<RestResponse, TransportError>> {
        send_in_order(self, requests).await
    }
}

/// Runs `requests` one round trip at a time through `transport.execute`,
/// stopping after the first error.
pub async fn send_in_order<T>(
    transport: &T,
    requests: Vec<RestRequest>,
) -> Vec<Result<RestResponse, TransportError>>
where
    T: RestTransport + ?Sized,
{
    let mut results = Vec::with_capacity(requests.len());
    for request in requests {
        let result = transport.execute(request).await;
        let failed = result.is_err();
        results.push(result);
        if failed {
            break;
        }
    }
    results
}
