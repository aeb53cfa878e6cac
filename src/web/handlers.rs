// FormRelay - HTTP handlers

use super::AppState;
use crate::content::{self, ContentKind, ParsedContent};
use crate::error::RelayError;
use crate::render::{self, DisplayBlock};
use crate::workflow::pipeline::WorkoutRequest;
use crate::workflow::BodyMode;
use axum::body::Bytes;
use axum::extract::State;
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::Instrument;

/// Accepted shapes of a run request body. Tried in order, first match wins.
#[derive(Debug, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum RunRequest {
    ByType {
        #[serde(rename = "workflowType")]
        workflow_type: String,
        #[serde(rename = "formData", default)]
        form_data: serde_json::Map<String, serde_json::Value>,
    },
    ById {
        #[serde(rename = "workflowId")]
        workflow_id: String,
        #[serde(rename = "formData", default)]
        form_data: serde_json::Map<String, serde_json::Value>,
    },
    Workout(WorkoutRequest),
    Story {
        story: String,
    },
    Food {
        food: String,
    },
}

impl RunRequest {
    pub fn from_body(body: &[u8]) -> Result<Self, RelayError> {
        let value: serde_json::Value = serde_json::from_slice(body)
            .map_err(|e| RelayError::InvalidRequest(format!("body is not valid JSON ({})", e)))?;
        serde_json::from_value(value).map_err(|_| {
            RelayError::InvalidRequest(
                "expected workflowType or workflowId with formData, story, food, or bodypart/difficulty/time"
                    .to_string(),
            )
        })
    }

    /// Form values must be strings; anything else is named in the error.
    pub fn form_fields(
        form_data: serde_json::Map<String, serde_json::Value>,
    ) -> Result<BTreeMap<String, String>, RelayError> {
        form_data
            .into_iter()
            .map(|(name, value)| match value {
                serde_json::Value::String(s) => Ok((name, s)),
                other => Err(RelayError::InvalidRequest(format!(
                    "formData.{} must be a string, got {}",
                    name,
                    json_type(&other)
                ))),
            })
            .collect()
    }

    fn label(&self) -> &str {
        match self {
            RunRequest::ByType { workflow_type, .. } => workflow_type,
            RunRequest::ById { workflow_id, .. } => workflow_id,
            RunRequest::Workout(_) => "workout-pipeline",
            RunRequest::Story { .. } => "story",
            RunRequest::Food { .. } => "food",
        }
    }
}

/// POST /api/run
pub async fn run(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let request_id = uuid::Uuid::new_v4();
    let span = tracing::info_span!("run", request_id = %request_id);

    async move {
        let request = match RunRequest::from_body(&body) {
            Ok(r) => r,
            Err(e) => return e.into_response(),
        };
        tracing::info!(workflow = %request.label(), "Run request received");

        match request {
            RunRequest::Workout(req) => run_pipeline(&state, &req).await,
            RunRequest::ByType { workflow_type: id, form_data }
            | RunRequest::ById { workflow_id: id, form_data } => {
                match RunRequest::form_fields(form_data) {
                    Ok(fields) => forward(&state, &id, &fields).await,
                    Err(e) => e.into_response(),
                }
            }
            RunRequest::Story { story } => {
                forward(&state, "story", &BTreeMap::from([("story".to_string(), story)])).await
            }
            RunRequest::Food { food } => {
                forward(&state, "food", &BTreeMap::from([("food".to_string(), food)])).await
            }
        }
    }
    .instrument(span)
    .await
}

fn json_type(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

async fn forward(state: &AppState, id: &str, fields: &BTreeMap<String, String>) -> Response {
    match state.forwarder.forward(id, fields).await {
        Ok(reply) => Json(reply).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn run_pipeline(state: &AppState, request: &WorkoutRequest) -> Response {
    let Some(pipeline) = &state.pipeline else {
        return RelayError::InvalidWorkflow(crate::workflow::WORKOUT.to_string()).into_response();
    };
    match pipeline.run(request).await {
        Ok(outcome) => Json(serde_json::json!({
            "result": outcome.meal,
            "workout": outcome.workout,
            "meal": outcome.meal,
        }))
        .into_response(),
        Err(e) => e.into_response(),
    }
}

#[derive(Debug, Deserialize)]
pub struct RenderRequest {
    pub kind: String,
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct RenderResponse {
    #[serde(flatten)]
    pub content: ParsedContent,
    pub blocks: Vec<DisplayBlock>,
    pub html: String,
}

impl RenderResponse {
    pub fn build(kind: ContentKind, text: &str) -> Self {
        let content = content::parse(kind, text);
        let blocks = render::render(&content);
        let html = render::to_html(&blocks);
        Self {
            content,
            blocks,
            html,
        }
    }
}

/// POST /api/render
pub async fn render(body: Bytes) -> Response {
    let request: RenderRequest = match serde_json::from_slice(&body) {
        Ok(r) => r,
        Err(e) => return RelayError::InvalidRequest(e.to_string()).into_response(),
    };
    let kind: ContentKind = match request.kind.parse() {
        Ok(k) => k,
        Err(_) => {
            return RelayError::InvalidRequest(format!("unknown content kind '{}'", request.kind))
                .into_response()
        }
    };
    Json(RenderResponse::build(kind, &request.text)).into_response()
}

#[derive(Debug, Serialize)]
pub struct WorkflowSummary<'a> {
    pub id: &'a str,
    pub name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<&'a str>,
    pub required_fields: &'a [String],
    pub body: BodyMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_kind: Option<ContentKind>,
    pub upstream_endpoint_id: &'a str,
}

/// GET /api/workflows
pub async fn workflows(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let list: Vec<WorkflowSummary<'_>> = state
        .forwarder
        .catalog()
        .iter()
        .map(|wf| WorkflowSummary {
            id: &wf.id,
            name: if wf.name.is_empty() { &wf.id } else { &wf.name },
            description: wf.description.as_deref(),
            required_fields: &wf.required_field_names,
            body: wf.body,
            content_kind: wf.content_kind,
            upstream_endpoint_id: &wf.upstream_endpoint_id,
        })
        .collect();

    Json(serde_json::json!({ "workflows": list }))
}

/// GET /api/status
pub async fn status(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "online",
        "version": crate::VERSION,
        "started_at": state.started_at.to_rfc3339(),
        "workflows": state.forwarder.catalog().len(),
        "workout_pipeline": state.pipeline.is_some(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_request_shapes() {
        let req = RunRequest::from_body(br#"{"workflowType": "food", "formData": {"food": "soup"}}"#).unwrap();
        match req {
            RunRequest::ByType { workflow_type, form_data } => {
                assert_eq!(workflow_type, "food");
                assert_eq!(
                    RunRequest::form_fields(form_data).unwrap(),
                    BTreeMap::from([("food".to_string(), "soup".to_string())])
                );
            }
            other => panic!("unexpected shape: {other:?}"),
        }

        let req = RunRequest::from_body(br#"{"workflowId": "wf-1"}"#).unwrap();
        assert!(matches!(req, RunRequest::ById { ref form_data, .. } if form_data.is_empty()));

        let req = RunRequest::from_body(br#"{"bodypart": "arms", "difficulty": "easy", "time": "20"}"#).unwrap();
        assert_eq!(req.label(), "workout-pipeline");

        let req = RunRequest::from_body(br#"{"story": "a fox"}"#).unwrap();
        assert_eq!(req, RunRequest::Story { story: "a fox".into() });

        let req = RunRequest::from_body(br#"{"food": "pie"}"#).unwrap();
        assert_eq!(req, RunRequest::Food { food: "pie".into() });
    }

    #[test]
    fn test_run_request_rejects_unknown_shape() {
        let err = RunRequest::from_body(br#"{"poem": "roses"}"#).unwrap_err();
        assert!(matches!(err, RelayError::InvalidRequest(_)));

        let err = RunRequest::from_body(b"not json").unwrap_err();
        assert!(err.client_message().starts_with("Invalid request: body is not valid JSON"));
    }

    #[test]
    fn test_non_string_form_value_is_named() {
        let req = RunRequest::from_body(
            br#"{"workflowType": "food", "formData": {"food": "soup", "notes": null}}"#,
        )
        .unwrap();
        let RunRequest::ByType { form_data, .. } = req else {
            panic!("expected workflowType shape");
        };
        let err = RunRequest::form_fields(form_data).unwrap_err();
        assert_eq!(
            err.client_message(),
            "Invalid request: formData.notes must be a string, got null"
        );
    }

    #[test]
    fn test_partial_workout_body_is_rejected() {
        let err = RunRequest::from_body(br#"{"bodypart": "arms"}"#).unwrap_err();
        assert!(matches!(err, RelayError::InvalidRequest(_)));
    }

    #[test]
    fn test_render_response_includes_blocks_and_html() {
        let resp = RenderResponse::build(ContentKind::Food, "Pancakes\n#Ingredients\n- Flour\n#Instructions\n1. Mix");
        assert_eq!(resp.content.title, "Pancakes");
        assert!(!resp.blocks.is_empty());
        assert!(resp.html.contains("Flour"));

        let value = serde_json::to_value(&resp).unwrap();
        assert_eq!(value["title"], "Pancakes");
        assert_eq!(value["metadata"]["ingredient_count"], 1);
        assert!(value["blocks"].is_array());
    }
}
