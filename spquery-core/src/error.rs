use crate::ids::QueryId;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Fault reported by the remote API in its error envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteFault {
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub message: String,
}

impl RemoteFault {
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        RemoteFault {
            status,
            code: None,
            message: message.into(),
        }
    }

    pub fn with_code(status: u16, code: impl Into<String>, message: impl Into<String>) -> Self {
        RemoteFault {
            status,
            code: Some(code.into()),
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status == 404
    }
}

impl fmt::Display for RemoteFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.code {
            Some(code) => write!(f, "HTTP {} ({}): {}", self.status, code, self.message),
            None => write!(f, "HTTP {}: {}", self.status, self.message),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClientError {
    /// The resource path cannot be built yet.
    #[error("Addressing error: {0}")]
    Addressing(String),

    /// An operation needed a property that was never loaded.
    #[error("Property '{property}' is not loaded")]
    PropertyNotLoaded { property: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Remote error: {0}")]
    Remote(RemoteFault),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A flush stopped at `query`; `abandoned` were queued behind it and never sent.
    #[error("{query} failed: {cause} ({} queued queries not attempted)", .abandoned.len())]
    QueryFailed {
        query: QueryId,
        cause: Box<ClientError>,
        abandoned: Vec<QueryId>,
    },
}

impl ClientError {
    pub fn addressing(message: impl Into<String>) -> Self {
        ClientError::Addressing(message.into())
    }

    pub fn not_loaded(property: impl Into<String>) -> Self {
        ClientError::PropertyNotLoaded {
            property: property.into(),
        }
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        ClientError::InvalidResponse(message.into())
    }

    /// The innermost cause, looking through `QueryFailed` wrappers.
    pub fn root_cause(&self) -> &ClientError {
        match self {
            ClientError::QueryFailed { cause, .. } => cause.root_cause(),
            other => other,
        }
    }

    pub fn remote_fault(&self) -> Option<&RemoteFault> {
        match self.root_cause() {
            ClientError::Remote(fault) => Some(fault),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Serialization(err.to_string())
    }
}

impl From<RemoteFault> for ClientError {
    fn from(fault: RemoteFault) -> Self {
        ClientError::Remote(fault)
    }
}

pub type Result<T, E = ClientError> = std::result::Result<T, E>;
