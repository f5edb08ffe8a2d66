//! Wire-level request/response envelopes shared by the client and transports.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

pub const ODATA_VERBOSE: &str = "application/json;odata=verbose";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestRequest {
    pub method: HttpMethod,
    pub url: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub headers: Vec<(String, String)>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

impl RestRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        RestRequest {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestResponse {
    pub status: u16,
    pub body: Value,
}

impl RestResponse {
    pub fn new(status: u16, body: Value) -> Self {
        RestResponse { status, body }
    }

    pub fn ok(body: Value) -> Self {
        Self::new(200, body)
    }

    pub fn no_content() -> Self {
        Self::new(204, Value::Null)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Entity or collection payload with the OData envelope removed.
    pub fn payload(&self) -> Value {
        unwrap_envelope(&self.body)
    }
}

/// Strips `{"d": ...}` (verbose) and `{"value": [...]}` (light) envelopes.
///
/// Verbose collections arrive as `{"d": {"results": [...]}}` and come back
/// as a bare array; scalar service-operation results such as
/// `{"d": {"GetCount": 3}}` are returned unchanged below `d`.
pub fn unwrap_envelope(body: &Value) -> Value {
    let inner = match body.get("d") {
        Some(d) => d,
        None => body,
    };
    if let Some(obj) = inner.as_object() {
        if let Some(results @ Value::Array(_)) = obj.get("results") {
            return results.clone();
        }
        if let Some(value @ Value::Array(_)) = obj.get("value") {
            return value.clone();
        }
    }
    inner.clone()
}
