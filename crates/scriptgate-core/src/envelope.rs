//! Request and response envelopes for the scripting endpoint

use crate::error::Error;
use serde::{Deserialize, Serialize};

/// Inbound body of the scripting endpoint.
///
/// Wire shape: `{"for": "<namespace>", "script": "<source>"}`. The
/// namespace is optional; an empty one resolves to the reserved default.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestEnvelope {
    /// Namespace the script is executed for. Not required.
    #[serde(rename = "for", default)]
    pub namespace: String,
    /// Script to run in the sandbox. Required.
    #[serde(default)]
    pub script: String,
}

impl RequestEnvelope {
    /// Create an envelope for the default namespace.
    pub fn new(script: impl Into<String>) -> Self {
        Self {
            namespace: String::new(),
            script: script.into(),
        }
    }

    /// Create an envelope for a specific namespace.
    pub fn for_namespace(namespace: impl Into<String>, script: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            script: script.into(),
        }
    }
}

/// Outbound body of the scripting endpoint.
///
/// This is the sole response shape; errors and successes share it,
/// differentiated only by `status`. The HTTP frame uses the same status
/// code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    /// Status code, mirrored in the HTTP response frame.
    pub status: u16,
    /// Result or error text.
    pub body: String,
}

impl ResponseEnvelope {
    /// Create an envelope with an explicit status code.
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// 200 envelope.
    pub fn ok(body: impl Into<String>) -> Self {
        Self::new(http::StatusCode::OK.as_u16(), body)
    }

    /// 400 envelope.
    pub fn bad_request(body: impl Into<String>) -> Self {
        Self::new(http::StatusCode::BAD_REQUEST.as_u16(), body)
    }

    /// Envelope carrying an error's message under its mapped status code.
    pub fn from_error(err: &Error) -> Self {
        Self::new(err.to_status_code().as_u16(), err.to_string())
    }
}
