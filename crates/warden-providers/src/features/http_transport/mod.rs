use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use warden_core::{CoreError, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: String,
    pub url: String,
    pub headers: HashMap<String, String>,
    pub body: Option<Value>,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: "GET".to_string(),
            url: url.into(),
            headers: HashMap::new(),
            body: None,
        }
    }

    pub fn post(url: impl Into<String>, body: Option<Value>) -> Self {
        Self {
            method: "POST".to_string(),
            url: url.into(),
            headers: HashMap::new(),
            body,
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Raw request execution shared by the HTTP-backed capabilities.
///
/// Transport failures come back as `CoreError::ExternalService` tagged with
/// `capability`; non-2xx statuses are returned as responses for the caller to judge.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn execute(&self, capability: &str, request: &HttpRequest) -> Result<HttpResponse>;
}

pub struct ReqwestHttpTransport {
    client: Client,
}

impl ReqwestHttpTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build().map_err(|e| {
            CoreError::Configuration(format!("failed to build http client: {e}"))
        })?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestHttpTransport {
    async fn execute(&self, capability: &str, request: &HttpRequest) -> Result<HttpResponse> {
        let method = reqwest::Method::from_bytes(request.method.as_bytes()).map_err(|e| {
            CoreError::Validation(format!("invalid HTTP method: {e}"))
        })?;

        let mut headers = HeaderMap::new();
        for (key, value) in &request.headers {
            let key = HeaderName::from_bytes(key.as_bytes()).map_err(|e| {
                CoreError::Validation(format!("invalid header name '{key}': {e}"))
            })?;
            let value = HeaderValue::from_str(value).map_err(|e| {
                CoreError::Validation(format!("invalid header value for '{key}': {e}"))
            })?;
            headers.insert(key, value);
        }

        let mut builder = self.client.request(method, &request.url).headers(headers);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| CoreError::external(capability, "send", e))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| CoreError::external(capability, "read response", e))?;

        Ok(HttpResponse { status, body })
    }
}
