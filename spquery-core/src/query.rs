//! Deferred intents against a resource path.

use crate::error::{ClientError, Result};
use crate::path::{OperationArgs, ResourcePath};
use crate::request::{HttpMethod, RestRequest, ODATA_VERBOSE};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryKind {
    Read,
    Create,
    Update,
    Delete,
    ServiceOperation,
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            QueryKind::Read => "read",
            QueryKind::Create => "create",
            QueryKind::Update => "update",
            QueryKind::Delete => "delete",
            QueryKind::ServiceOperation => "service_operation",
        };
        f.write_str(s)
    }
}

/// What happened to one query during a flush.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    Succeeded(Value),
    Failed(ClientError),
    /// Queued behind a failed query and never sent.
    NotAttempted,
}

impl QueryOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, QueryOutcome::Succeeded(_))
    }
}

/// Receives the single outcome of a query.
///
/// An error returned for a `Succeeded` outcome (e.g. an unexpected payload
/// shape) fails the query and stops the flush.
pub trait ResultSink: Send + Sync {
    fn complete(&self, outcome: &QueryOutcome) -> Result<()>;
}

/// `$select` / `$expand` options of a read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ODataOptions {
    pub select: Vec<String>,
    pub expand: Vec<String>,
}

impl ODataOptions {
    pub fn select<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ODataOptions {
            select: names.into_iter().map(Into::into).collect(),
            expand: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.select.is_empty() && self.expand.is_empty()
    }

    fn to_query_string(&self) -> String {
        let mut parts = Vec::new();
        if !self.select.is_empty() {
            parts.push(format!("$select={}", self.select.join(",")));
        }
        if !self.expand.is_empty() {
            parts.push(format!("$expand={}", self.expand.join(",")));
        }
        parts.join("&")
    }
}

/// Builder for a service-operation query.
#[derive(Debug, Clone)]
pub struct ServiceOperation {
    target: ResourcePath,
    name: String,
    args: OperationArgs,
    payload: Option<Value>,
    payload_key: Option<String>,
    method: HttpMethod,
}

impl ServiceOperation {
    pub fn new(target: &ResourcePath, name: impl Into<String>) -> Self {
        ServiceOperation {
            target: target.clone(),
            name: name.into(),
            args: OperationArgs::None,
            payload: None,
            payload_key: None,
            method: HttpMethod::Post,
        }
    }

    pub fn args(mut self, args: OperationArgs) -> Self {
        self.args = args;
        self
    }

    pub fn payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Wraps the payload as `{key: payload}` in the request body.
    pub fn payload_key(mut self, key: impl Into<String>) -> Self {
        self.payload_key = Some(key.into());
        self
    }

    pub fn method(mut self, method: HttpMethod) -> Self {
        self.method = method;
        self
    }

    pub fn into_query(self) -> Query {
        let body = match (self.payload, self.payload_key) {
            (Some(payload), Some(key)) => {
                let mut wrapped = Map::new();
                wrapped.insert(key, payload);
                Some(Value::Object(wrapped))
            }
            (payload, _) => payload,
        };
        Query {
            kind: QueryKind::ServiceOperation,
            path: self.target.service_operation(self.name, self.args),
            method: self.method,
            payload: body,
            options: ODataOptions::default(),
            sink: None,
        }
    }
}

/// One deferred action against a resource path.
#[derive(Clone)]
pub struct Query {
    kind: QueryKind,
    path: ResourcePath,
    method: HttpMethod,
    payload: Option<Value>,
    options: ODataOptions,
    sink: Option<Arc<dyn ResultSink>>,
}

impl Query {
    fn new(kind: QueryKind, path: &ResourcePath, method: HttpMethod, payload: Option<Value>) -> Self {
        Query {
            kind,
            path: path.clone(),
            method,
            payload,
            options: ODataOptions::default(),
            sink: None,
        }
    }

    pub fn read(path: &ResourcePath) -> Self {
        Self::new(QueryKind::Read, path, HttpMethod::Get, None)
    }

    pub fn create(collection: &ResourcePath, payload: Value) -> Self {
        Self::new(QueryKind::Create, collection, HttpMethod::Post, Some(payload))
    }

    pub fn update(path: &ResourcePath, payload: Value) -> Self {
        Self::new(QueryKind::Update, path, HttpMethod::Post, Some(payload))
    }

    pub fn delete(path: &ResourcePath) -> Self {
        Self::new(QueryKind::Delete, path, HttpMethod::Post, None)
    }

    pub fn with_options(mut self, options: ODataOptions) -> Self {
        self.options = options;
        self
    }

    pub fn bind(mut self, sink: Arc<dyn ResultSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn kind(&self) -> QueryKind {
        self.kind
    }

    pub fn path(&self) -> &ResourcePath {
        &self.path
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn payload(&self) -> Option<&Value> {
        self.payload.as_ref()
    }

    pub fn options(&self) -> &ODataOptions {
        &self.options
    }

    pub fn sink(&self) -> Option<&Arc<dyn ResultSink>> {
        self.sink.as_ref()
    }

    /// Delivers `outcome` to the bound sink, if any.
    pub fn complete(&self, outcome: &QueryOutcome) -> Result<()> {
        match &self.sink {
            Some(sink) => sink.complete(outcome),
            None => Ok(()),
        }
    }

    pub fn to_request(&self, site_url: &str) -> RestRequest {
        let mut url = self.path.to_url(site_url);
        if !self.options.is_empty() {
            url.push('?');
            url.push_str(&self.options.to_query_string());
        }

        let mut request = RestRequest::new(self.method, url).with_header("Accept", ODATA_VERBOSE);
        match self.kind {
            QueryKind::Update => {
                request = request
                    .with_header("X-HTTP-Method", "MERGE")
                    .with_header("IF-MATCH", "*");
            }
            QueryKind::Delete => {
                request = request
                    .with_header("X-HTTP-Method", "DELETE")
                    .with_header("IF-MATCH", "*");
            }
            _ => {}
        }
        if let Some(payload) = &self.payload {
            request = request
                .with_header("Content-Type", ODATA_VERBOSE)
                .with_body(payload.clone());
        }
        request
    }
}

impl fmt::Debug for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("kind", &self.kind)
            .field("path", &self.path)
            .field("method", &self.method)
            .field("payload", &self.payload)
            .field("options", &self.options)
            .field("bound", &self.sink.is_some())
            .finish()
    }
}
