// FormRelay - Upstream workflow engine abstraction

pub mod factory;
pub mod forwarder;
pub mod http;

use crate::error::RelayError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

pub use forwarder::Forwarder;

// ---------------------------------------------------------------------------
// Core types
// ---------------------------------------------------------------------------

/// One user submission, owned by the request that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionPayload {
    pub workflow_id: String,
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
}

impl SubmissionPayload {
    pub fn new(workflow_id: impl Into<String>) -> Self {
        Self {
            workflow_id: workflow_id.into(),
            fields: BTreeMap::new(),
        }
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }
}

/// Successful upstream answer. Unknown fields are kept so the client sees the
/// body unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpstreamReply {
    pub result: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_id: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<serde_json::Value>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[cfg(test)]
impl UpstreamReply {
    pub(crate) fn new(result: impl Into<String>) -> Self {
        Self {
            result: result.into(),
            workflow_id: None,
            run_id: None,
            extra: serde_json::Map::new(),
        }
    }
}

/// Flat view of a forward outcome, for callers that want `ok`-tagged data
/// instead of a `Result`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpstreamResult {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
}

impl From<&Result<UpstreamReply, RelayError>> for UpstreamResult {
    fn from(outcome: &Result<UpstreamReply, RelayError>) -> Self {
        match outcome {
            Ok(reply) => Self {
                ok: true,
                result_text: Some(reply.result.clone()),
                error_message: None,
                status_code: None,
            },
            Err(e) => Self {
                ok: false,
                result_text: None,
                error_message: Some(e.client_message()),
                status_code: Some(e.status_code().as_u16()),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Transport trait
// ---------------------------------------------------------------------------

/// Raw HTTP answer, before any interpretation.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("failed to read response body: {0}")]
    Body(String),
}

/// Outbound HTTP seam. Exactly one request per call, no retries.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn post_json(
        &self,
        url: &str,
        bearer: &str,
        body: &serde_json::Value,
    ) -> Result<TransportResponse, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_keeps_unknown_fields() {
        let reply: UpstreamReply = serde_json::from_str(
            r#"{"result": "Hi", "run_id": "run_1", "usage": {"tokens": 3}}"#,
        )
        .unwrap();
        assert_eq!(reply.result, "Hi");
        assert_eq!(reply.run_id, Some(serde_json::json!("run_1")));

        let back = serde_json::to_value(&reply).unwrap();
        assert_eq!(back["usage"]["tokens"], 3);
        assert!(back.get("workflow_id").is_none());
    }

    #[test]
    fn test_upstream_result_views() {
        let ok: Result<UpstreamReply, RelayError> = Ok(UpstreamReply::new("text"));
        let view = UpstreamResult::from(&ok);
        assert!(view.ok);
        assert_eq!(view.result_text.as_deref(), Some("text"));

        let err: Result<UpstreamReply, RelayError> = Err(RelayError::UpstreamRequestFailed {
            status: 503,
            message: "busy".into(),
        });
        let view = UpstreamResult::from(&err);
        assert!(!view.ok);
        assert_eq!(view.error_message.as_deref(), Some("busy"));
        assert_eq!(view.status_code, Some(503));

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["errorMessage"], "busy");
        assert_eq!(json["statusCode"], 503);
    }
}
