// FormRelay - Workflow request forwarder
//
// Resolves a workflow id against the catalog, builds the outbound body and
// performs exactly one upstream call. No retries: the upstream is generative,
// so a second attempt produces a different answer, not a corrected one.

use super::{SubmissionPayload, Transport, TransportError, UpstreamReply};
use crate::error::{RelayError, UPSTREAM_FAILED_MESSAGE};
use crate::workflow::{WorkflowCatalog, WorkflowDescriptor};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

pub struct Forwarder {
    catalog: Arc<WorkflowCatalog>,
    transport: Arc<dyn Transport>,
    api_base: String,
    api_key: String,
    enforce_required_fields: bool,
}

impl Forwarder {
    pub fn new(
        catalog: Arc<WorkflowCatalog>,
        transport: Arc<dyn Transport>,
        api_base: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            catalog,
            transport,
            api_base: api_base.into(),
            api_key: api_key.into(),
            enforce_required_fields: true,
        }
    }

    /// Reject submissions with missing required fields before calling upstream.
    /// Off restores the permissive pass-through.
    pub fn enforce_required_fields(mut self, enforce: bool) -> Self {
        self.enforce_required_fields = enforce;
        self
    }

    pub fn catalog(&self) -> &WorkflowCatalog {
        &self.catalog
    }

    pub fn endpoint_url(&self, workflow: &WorkflowDescriptor) -> String {
        format!(
            "{}/{}",
            self.api_base.trim_end_matches('/'),
            workflow.upstream_endpoint_id
        )
    }

    pub async fn submit(&self, payload: &SubmissionPayload) -> Result<UpstreamReply, RelayError> {
        self.forward(&payload.workflow_id, &payload.fields).await
    }

    pub async fn forward(
        &self,
        workflow_id: &str,
        fields: &BTreeMap<String, String>,
    ) -> Result<UpstreamReply, RelayError> {
        let workflow = self
            .catalog
            .get(workflow_id)
            .ok_or_else(|| RelayError::InvalidWorkflow(workflow_id.to_string()))?;

        let missing = workflow.missing_fields(fields);
        if !missing.is_empty() {
            if self.enforce_required_fields {
                return Err(RelayError::MissingFields(missing));
            }
            tracing::warn!(
                workflow = %workflow_id,
                missing = ?missing,
                "Forwarding submission with missing required fields"
            );
        }

        let url = self.endpoint_url(workflow);
        let body = workflow.outbound_body(fields);

        tracing::info!(
            workflow = %workflow_id,
            endpoint = %workflow.upstream_endpoint_id,
            "Forwarding workflow request"
        );
        tracing::debug!(
            url = %url,
            fields = ?body.as_object().map(|m| m.keys().collect::<Vec<_>>()),
            "Outbound request body"
        );

        let response = self
            .transport
            .post_json(&url, &self.api_key, &body)
            .await
            .map_err(|e| {
                tracing::error!(workflow = %workflow_id, error = %e, "Upstream call failed");
                match e {
                    TransportError::Body(msg) => RelayError::MalformedResponse(msg),
                    other => RelayError::UpstreamUnreachable(other.to_string()),
                }
            })?;

        interpret(response.status, &response.body)
    }
}

/// Turn a raw upstream answer into a reply or a relay error.
pub fn interpret(status: u16, body: &str) -> Result<UpstreamReply, RelayError> {
    let value: Value = serde_json::from_str(body).map_err(|e| {
        tracing::error!(status = status, error = %e, "Upstream body is not JSON");
        RelayError::MalformedResponse(e.to_string())
    })?;

    if !(200..300).contains(&status) {
        let message = error_message(&value).unwrap_or(UPSTREAM_FAILED_MESSAGE).to_string();
        tracing::error!(status = status, error = %message, "Upstream API error");
        return Err(RelayError::UpstreamRequestFailed { status, message });
    }

    serde_json::from_value::<UpstreamReply>(value).map_err(|e| {
        tracing::error!(error = %e, "Upstream success body has no usable result");
        RelayError::MalformedResponse(e.to_string())
    })
}

/// `error` as a string, or `error.message` when the engine nests it.
fn error_message(body: &Value) -> Option<&str> {
    let err = body.get("error")?;
    err.as_str()
        .or_else(|| err.get("message").and_then(|m| m.as_str()))
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upstream::TransportResponse;
    use crate::workflow::{builtin_workflows, WorkflowCatalog};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Records every call and answers with a canned response.
    struct FakeTransport {
        calls: AtomicUsize,
        seen: Mutex<Vec<(String, String, Value)>>,
        status: u16,
        body: String,
        fail: bool,
    }

    impl FakeTransport {
        fn answering(status: u16, body: &str) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                seen: Mutex::new(Vec::new()),
                status,
                body: body.to_string(),
                fail: false,
            })
        }

        fn unreachable() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                seen: Mutex::new(Vec::new()),
                status: 0,
                body: String::new(),
                fail: true,
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Transport for FakeTransport {
        async fn post_json(
            &self,
            url: &str,
            bearer: &str,
            body: &Value,
        ) -> Result<TransportResponse, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen
                .lock()
                .unwrap()
                .push((url.to_string(), bearer.to_string(), body.clone()));
            if self.fail {
                return Err(TransportError::Connect("connection refused".into()));
            }
            Ok(TransportResponse {
                status: self.status,
                body: self.body.clone(),
            })
        }
    }

    fn forwarder(transport: Arc<FakeTransport>) -> Forwarder {
        let catalog = Arc::new(WorkflowCatalog::new(builtin_workflows()).unwrap());
        Forwarder::new(catalog, transport, "https://engine.test/api/v1/run/", "sk-test")
    }

    fn fields(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn test_each_workflow_posts_to_its_own_endpoint() {
        let transport = FakeTransport::answering(200, r#"{"result": "ok"}"#);
        let fwd = forwarder(transport.clone());
        let catalog = WorkflowCatalog::new(builtin_workflows()).unwrap();

        for wf in catalog.iter() {
            let submitted: BTreeMap<String, String> = wf
                .required_field_names
                .iter()
                .map(|name| (name.clone(), "value".to_string()))
                .collect();
            fwd.forward(&wf.id, &submitted).await.unwrap();
        }

        let seen = transport.seen.lock().unwrap();
        assert_eq!(seen.len(), catalog.len());
        for (wf, (url, _, _)) in catalog.iter().zip(seen.iter()) {
            assert_eq!(
                url,
                &format!("https://engine.test/api/v1/run/{}", wf.upstream_endpoint_id)
            );
            for other in catalog.iter().filter(|o| o.id != wf.id) {
                assert!(!url.contains(&other.upstream_endpoint_id));
            }
        }
    }

    #[tokio::test]
    async fn test_unknown_workflow_makes_no_call() {
        let transport = FakeTransport::answering(200, r#"{"result": "ok"}"#);
        let fwd = forwarder(transport.clone());

        let err = fwd.forward("poetry", &fields(&[("poem", "x")])).await.unwrap_err();
        assert!(matches!(err, RelayError::InvalidWorkflow(ref id) if id == "poetry"));
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_missing_fields_rejected_before_call() {
        let transport = FakeTransport::answering(200, r#"{"result": "ok"}"#);
        let fwd = forwarder(transport.clone());

        let err = fwd.forward("food", &fields(&[("food", "  ")])).await.unwrap_err();
        assert!(matches!(err, RelayError::MissingFields(ref f) if f == &["food".to_string()]));
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_permissive_mode_forwards_incomplete_fields() {
        let transport = FakeTransport::answering(200, r#"{"result": "ok"}"#);
        let fwd = forwarder(transport.clone()).enforce_required_fields(false);

        let reply = fwd.forward("story", &BTreeMap::new()).await.unwrap();
        assert_eq!(reply.result, "ok");
        assert_eq!(transport.calls(), 1);
        let seen = transport.seen.lock().unwrap();
        assert_eq!(seen[0].2, serde_json::json!({}));
    }

    #[tokio::test]
    async fn test_success_sends_bearer_and_subset_body() {
        let transport =
            FakeTransport::answering(200, r#"{"result": "Omelette\n#Ingredients\nEgg", "run_id": "r1"}"#);
        let fwd = forwarder(transport.clone());

        let reply = fwd
            .forward("food", &fields(&[("food", "omelette"), ("story", "ignored")]))
            .await
            .unwrap();
        assert_eq!(reply.result, "Omelette\n#Ingredients\nEgg");
        assert_eq!(reply.run_id, Some(serde_json::json!("r1")));

        let seen = transport.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, "https://engine.test/api/v1/run/wf_kje4ajgswaebfx7upzmbrfr9");
        assert_eq!(seen[0].1, "sk-test");
        assert_eq!(seen[0].2, serde_json::json!({"food": "omelette"}));
    }

    #[tokio::test]
    async fn test_upstream_error_keeps_status_and_message() {
        let transport = FakeTransport::answering(402, r#"{"error": "Out of credits"}"#);
        let fwd = forwarder(transport.clone());

        let err = fwd.forward("story", &fields(&[("story", "dragons")])).await.unwrap_err();
        match err {
            RelayError::UpstreamRequestFailed { status, message } => {
                assert_eq!(status, 402);
                assert_eq!(message, "Out of credits");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn test_unreachable_upstream() {
        let transport = FakeTransport::unreachable();
        let fwd = forwarder(transport.clone());

        let err = fwd.forward("story", &fields(&[("story", "dragons")])).await.unwrap_err();
        assert!(matches!(err, RelayError::UpstreamUnreachable(_)));
        assert_eq!(err.client_message(), "Internal Server Error");
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn test_submit_uses_payload() {
        let transport = FakeTransport::answering(200, r#"{"result": "story text"}"#);
        let fwd = forwarder(transport.clone());

        let payload = SubmissionPayload::new("story").field("story", "a knight");
        let reply = fwd.submit(&payload).await.unwrap();
        assert_eq!(reply.result, "story text");
    }

    #[test]
    fn test_interpret_error_without_message() {
        let err = interpret(500, r#"{"detail": "boom"}"#).unwrap_err();
        assert!(matches!(
            err,
            RelayError::UpstreamRequestFailed { status: 500, ref message } if message == "API request failed"
        ));
    }

    #[test]
    fn test_interpret_nested_error_message() {
        let err = interpret(401, r#"{"error": {"message": "Invalid API key"}}"#).unwrap_err();
        assert_eq!(err.client_message(), "Invalid API key");
    }

    #[test]
    fn test_interpret_non_json_is_malformed() {
        let err = interpret(502, "<html>Bad Gateway</html>").unwrap_err();
        assert!(matches!(err, RelayError::MalformedResponse(_)));
        assert_eq!(err.status_code().as_u16(), 500);
    }

    #[test]
    fn test_interpret_passes_non_string_ids_through() {
        let reply = interpret(200, r#"{"result": "Omelette", "run_id": 42, "workflow_id": null}"#).unwrap();
        assert_eq!(reply.result, "Omelette");
        assert_eq!(reply.run_id, Some(serde_json::json!(42)));

        let back = serde_json::to_value(&reply).unwrap();
        assert_eq!(back["run_id"], 42);
    }

    #[test]
    fn test_interpret_success_without_result_is_malformed() {
        let err = interpret(200, r#"{"run_id": "r1"}"#).unwrap_err();
        assert!(matches!(err, RelayError::MalformedResponse(_)));
    }
}
