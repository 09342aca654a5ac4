use crate::features::http_transport::{HttpRequest, HttpResponse, HttpTransport};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;
use warden_core::{ComputeControl, CoreError, InstanceDescription, Result};

const CAPABILITY: &str = "compute";

/// Compute-control capability backed by a REST control API.
///
/// `GET {base}/instances/{id}` describes the instance; `POST .../start` and
/// `POST .../stop` drive it.
pub struct HttpComputeControl {
    transport: Arc<dyn HttpTransport>,
    base_url: String,
    api_token: Option<String>,
}

impl HttpComputeControl {
    pub fn new(transport: Arc<dyn HttpTransport>, base_url: impl Into<String>) -> Self {
        Self {
            transport,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_token: None,
        }
    }

    pub fn with_api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    fn instance_url(&self, instance_id: &str, action: Option<&str>) -> String {
        match action {
            Some(action) => format!("{}/instances/{instance_id}/{action}", self.base_url),
            None => format!("{}/instances/{instance_id}", self.base_url),
        }
    }

    fn authorize(&self, mut request: HttpRequest) -> HttpRequest {
        if let Some(token) = &self.api_token {
            request
                .headers
                .insert("authorization".to_string(), format!("Bearer {token}"));
        }
        request
    }

    async fn send(&self, operation: &str, request: HttpRequest) -> Result<HttpResponse> {
        let response = self
            .transport
            .execute(CAPABILITY, &self.authorize(request))
            .await?;
        if !response.is_success() {
            return Err(CoreError::external(
                CAPABILITY,
                operation,
                format!("control API returned status {}", response.status),
            ));
        }
        Ok(response)
    }
}

#[async_trait]
impl ComputeControl for HttpComputeControl {
    async fn describe(&self, instance_id: &str) -> Result<InstanceDescription> {
        let response = self
            .send(
                "describe",
                HttpRequest::get(self.instance_url(instance_id, None)),
            )
            .await?;
        let description: InstanceDescription = serde_json::from_str(&response.body)
            .map_err(|e| CoreError::external(CAPABILITY, "describe", e))?;
        debug!(instance_id = %instance_id, state = %description.state, "Described instance");
        Ok(description)
    }

    async fn start(&self, instance_id: &str) -> Result<()> {
        self.send(
            "start",
            HttpRequest::post(self.instance_url(instance_id, Some("start")), None),
        )
        .await
        .map(|_| ())
    }

    async fn stop(&self, instance_id: &str) -> Result<()> {
        self.send(
            "stop",
            HttpRequest::post(self.instance_url(instance_id, Some("stop")), None),
        )
        .await
        .map(|_| ())
    }
}
