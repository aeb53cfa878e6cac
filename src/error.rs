// FormRelay - Error taxonomy for the relay boundary
//
// Every failure that can reach a client is a RelayError. The HTTP layer turns
// it into a `{"error": "..."}` envelope; the CLI turns it into an exit code.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

/// Message shown to clients for failures that are ours, not theirs.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal Server Error";

/// Fallback when the upstream engine fails without an `error` field.
pub const UPSTREAM_FAILED_MESSAGE: &str = "API request failed";

#[derive(Error, Debug)]
pub enum RelayError {
    /// The request body could not be understood at all.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    /// Unknown or missing workflow / content-kind identifier.
    #[error("invalid workflow type: {0}")]
    InvalidWorkflow(String),
    #[error("missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<String>),
    /// Upstream answered with a non-2xx status.
    #[error("upstream request failed ({status}): {message}")]
    UpstreamRequestFailed { status: u16, message: String },
    /// Network-level failure talking to the upstream engine.
    #[error("upstream unreachable: {0}")]
    UpstreamUnreachable(String),
    /// Upstream answered, but not with the JSON we expect.
    #[error("malformed upstream response: {0}")]
    MalformedResponse(String),
}

impl RelayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            RelayError::InvalidRequest(_)
            | RelayError::InvalidWorkflow(_)
            | RelayError::MissingFields(_) => StatusCode::BAD_REQUEST,
            RelayError::UpstreamRequestFailed { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
            RelayError::UpstreamUnreachable(_) | RelayError::MalformedResponse(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// The text placed in the `error` envelope. Internal details stay in the logs.
    pub fn client_message(&self) -> String {
        match self {
            RelayError::InvalidRequest(msg) => format!("Invalid request: {}", msg),
            RelayError::InvalidWorkflow(id) if id.is_empty() => "Invalid workflow type".to_string(),
            RelayError::InvalidWorkflow(id) => format!("Invalid workflow type: {}", id),
            RelayError::MissingFields(names) => {
                format!("Please fill in all fields: {}", names.join(", "))
            }
            RelayError::UpstreamRequestFailed { message, .. } => message.clone(),
            RelayError::UpstreamUnreachable(_) | RelayError::MalformedResponse(_) => {
                INTERNAL_ERROR_MESSAGE.to_string()
            }
        }
    }

    /// True when the caller sent something we rejected before any upstream call.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            RelayError::InvalidRequest(_)
                | RelayError::InvalidWorkflow(_)
                | RelayError::MissingFields(_)
        )
    }

    /// Process exit code for the CLI: the HTTP status class (4 or 5).
    pub fn exit_code(&self) -> i32 {
        if self.is_client_error() {
            4
        } else {
            5
        }
    }
}

/// Uniform `{"error": "..."}` envelope.
pub fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    let body = serde_json::json!({ "error": message.into() });
    (status, Json(body)).into_response()
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(status = %status, error = %self, "Relay request failed");
        } else {
            tracing::warn!(status = %status, error = %self, "Relay request rejected");
        }
        error_response(status, self.client_message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors_map_to_400() {
        for err in [
            RelayError::InvalidRequest("not json".into()),
            RelayError::InvalidWorkflow("nope".into()),
            RelayError::MissingFields(vec!["food".into()]),
        ] {
            assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
            assert_eq!(err.exit_code(), 4);
        }
    }

    #[test]
    fn test_upstream_status_is_preserved() {
        let err = RelayError::UpstreamRequestFailed {
            status: 429,
            message: "Rate limited".into(),
        };
        assert_eq!(err.status_code(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(err.client_message(), "Rate limited");
        assert_eq!(err.exit_code(), 5);
    }

    #[test]
    fn test_out_of_range_upstream_status_becomes_500() {
        let err = RelayError::UpstreamRequestFailed {
            status: 1000,
            message: "weird".into(),
        };
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_internal_failures_hide_details() {
        let err = RelayError::UpstreamUnreachable("connection refused".into());
        assert_eq!(err.client_message(), "Internal Server Error");
        let err = RelayError::MalformedResponse("expected value at line 1".into());
        assert_eq!(err.client_message(), "Internal Server Error");
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_missing_fields_lists_names() {
        let err = RelayError::MissingFields(vec!["bodypart".into(), "time".into()]);
        assert_eq!(err.client_message(), "Please fill in all fields: bodypart, time");
    }
}
