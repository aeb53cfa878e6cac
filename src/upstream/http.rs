// FormRelay - reqwest-backed transport

use super::{Transport, TransportError, TransportResponse};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// HTTPTransport posts JSON to the workflow engine over HTTPS.
pub struct HTTPTransport {
    client: Client,
}

impl HTTPTransport {
    /// `request_timeout` of `None` leaves the client's default (no overall timeout).
    pub fn new(connect_timeout: Duration, request_timeout: Option<Duration>) -> anyhow::Result<Self> {
        let mut builder = Client::builder()
            .connect_timeout(connect_timeout)
            .user_agent(concat!("formrelay/", env!("CARGO_PKG_VERSION")));

        if let Some(timeout) = request_timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
        })
    }
}

#[async_trait]
impl Transport for HTTPTransport {
    async fn post_json(
        &self,
        url: &str,
        bearer: &str,
        body: &serde_json::Value,
    ) -> Result<TransportResponse, TransportError> {
        let response = self
            .client
            .post(url)
            .header("Authorization", format!("Bearer {}", bearer))
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TransportError::Timeout
                } else {
                    TransportError::Connect(e.to_string())
                }
            })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::Body(e.to_string()))?;

        tracing::debug!(status = status, body_len = body.len(), "Upstream response received");

        Ok(TransportResponse { status, body })
    }
}
