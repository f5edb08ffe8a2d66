// Client context: owns the pending-query queue and flushes it through a
// transport. Every entity is created against an explicit context; contexts
// share no queue or property state with each other.

use crate::config::ClientConfig;
use crate::web::Web;
use parking_lot::Mutex;
use spquery_core::{ClientError, Query, QueryId, QueryIdAllocator, QueryOutcome, Result};
use spquery_transport::RestTransport;
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace, warn};

#[derive(Clone)]
pub struct ClientContext {
    inner: Arc<ContextInner>,
}

struct ContextInner {
    config: ClientConfig,
    transport: Arc<dyn RestTransport>,
    queue: Mutex<VecDeque<(QueryId, Query)>>,
    query_ids: QueryIdAllocator,
}

impl ClientContext {
    pub fn new(config: ClientConfig, transport: Arc<dyn RestTransport>) -> Self {
        Self {
            inner: Arc::new(ContextInner {
                config,
                transport,
                queue: Mutex::new(VecDeque::new()),
                query_ids: QueryIdAllocator::new(),
            }),
        }
    }

    /// Context backed by the reqwest transport built from `config`.
    #[cfg(feature = "http")]
    pub fn connect(config: ClientConfig) -> Result<Self> {
        let transport = spquery_transport::HttpTransport::new(config.transport_config())?;
        Ok(Self::new(config, Arc::new(transport)))
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub fn site_url(&self) -> &str {
        &self.inner.config.site_url
    }

    pub fn web(&self) -> Web {
        Web::new(self)
    }

    /// Appends `query` to the queue. Nothing is sent until the next flush.
    pub fn add_query(&self, query: Query) -> QueryId {
        let id = self.inner.query_ids.allocate();
        trace!("Enqueued {} {} {}", id, query.kind(), query.path());
        self.inner.queue.lock().push_back((id, query));
        id
    }

    pub fn pending_count(&self) -> usize {
        self.inner.queue.lock().len()
    }

    pub fn has_pending(&self) -> bool {
        self.pending_count() > 0
    }

    pub fn pending_ids(&self) -> Vec<QueryId> {
        self.inner.queue.lock().iter().map(|(id, _)| *id).collect()
    }

    /// Flushes the queue: sends every pending query in enqueue order and
    /// delivers each outcome to the query's sink.
    ///
    /// Queries are handed to the transport in chunks of at most
    /// `max_batch_size`. Delivery stops at the first failure; that query's
    /// sink sees `Failed`, every query behind it sees `NotAttempted`, and the
    /// returned `QueryFailed` names both. Queries enqueued while the flush runs
    /// wait for the next one. An empty queue is a no-op.
    pub async fn execute_query(&self) -> Result<()> {
        let mut pending: VecDeque<(QueryId, Query)> = std::mem::take(&mut *self.inner.queue.lock());
        if pending.is_empty() {
            trace!("Flush requested with an empty queue");
            return Ok(());
        }

        let site_url = self.site_url();
        let batch_size = self.inner.config.effective_batch_size();
        debug!("Flushing {} queued queries", pending.len());

        while !pending.is_empty() {
            let chunk: Vec<(QueryId, Query)> = pending.drain(..batch_size.min(pending.len())).collect();
            let requests = chunk.iter().map(|(_, query)| query.to_request(site_url)).collect();

            let mut results = self.inner.transport.execute_batch(requests).await.into_iter();

            for (index, (id, query)) in chunk.iter().enumerate() {
                let failure = match results.next() {
                    Some(Ok(response)) => {
                        let outcome = QueryOutcome::Succeeded(response.payload());
                        match query.complete(&outcome) {
                            Ok(()) => {
                                trace!("{} completed with status {}", id, response.status);
                                None
                            }
                            // The sink already received its outcome.
                            Err(e) => Some((e, true)),
                        }
                    }
                    Some(Err(e)) => Some((ClientError::from(e), false)),
                    None => Some((
                        ClientError::Transport(format!("transport returned no result for {}", id)),
                        false,
                    )),
                };

                if let Some((cause, delivered)) = failure {
                    warn!("{} ({} {}) failed: {}", id, query.kind(), query.path(), cause);
                    if !delivered {
                        if let Err(e) = query.complete(&QueryOutcome::Failed(cause.clone())) {
                            warn!("Sink of {} rejected its failure outcome: {}", id, e);
                        }
                    }

                    let abandoned: Vec<QueryId> = chunk[index + 1..]
                        .iter()
                        .chain(pending.iter())
                        .map(|(abandoned_id, abandoned_query)| {
                            if let Err(e) = abandoned_query.complete(&QueryOutcome::NotAttempted) {
                                warn!("Sink of {} rejected its outcome: {}", abandoned_id, e);
                            }
                            *abandoned_id
                        })
                        .collect();

                    if !abandoned.is_empty() {
                        debug!("Abandoned {} queries queued behind {}", abandoned.len(), id);
                    }
                    return Err(ClientError::QueryFailed {
                        query: *id,
                        cause: Box::new(cause),
                        abandoned,
                    });
                }
            }
        }

        debug!("Flush complete");
        Ok(())
    }
}

impl fmt::Debug for ClientContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientContext")
            .field("site_url", &self.inner.config.site_url)
            .field("pending", &self.pending_count())
            .finish()
    }
}
