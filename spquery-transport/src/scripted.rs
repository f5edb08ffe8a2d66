//! In-memory transport that replays canned responses and records requests.

use crate::transport::send_in_order;
use crate::{RestTransport, TransportError};
use async_trait::async_trait;
use parking_lot::Mutex;
use spquery_core::{RestRequest, RestResponse};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

type Reply = Result<RestResponse, TransportError>;

/// Answers requests in arrival order from a script.
///
/// Once the script is exhausted every request receives 204 No Content.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<RestRequest>>,
    batches: AtomicUsize,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, response: RestResponse) -> &Self {
        self.script.lock().push_back(Ok(response));
        self
    }

    pub fn fail(&self, error: TransportError) -> &Self {
        self.script.lock().push_back(Err(error));
        self
    }

    /// Every request sent so far, in order.
    pub fn requests(&self) -> Vec<RestRequest> {
        self.requests.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Number of `execute_batch` calls received.
    pub fn batch_count(&self) -> usize {
        self.batches.load(Ordering::Relaxed)
    }

    pub fn remaining(&self) -> usize {
        self.script.lock().len()
    }
}

#[async_trait]
impl RestTransport for ScriptedTransport {
    async fn execute(&self, request: RestRequest) -> Result<RestResponse, TransportError> {
        self.requests.lock().push(request);
        self.script
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(RestResponse::no_content()))
    }

    async fn execute_batch(&self, requests: Vec<RestRequest>) -> Vec<Reply> {
        self.batches.fetch_add(1, Ordering::Relaxed);
        send_in_order(self, requests).await
    }
}
