pub mod features;

pub use features::compute_control::HttpComputeControl;
pub use features::http_transport::{HttpTransport, ReqwestHttpTransport};
pub use features::secret_resolver::AesGcmSecretResolver;
pub use features::webhook_notifier::WebhookNotifier;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use warden_core::{ComputeControl, CoreError, Notifier, Result, SecretResolver};

pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

/// Settings for the concrete capability providers.
#[derive(Clone)]
pub struct ProviderConfig {
    pub secret_key: String,
    pub compute_api_url: String,
    pub compute_api_token: Option<String>,
    pub http_timeout: Duration,
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("secret_key", &"<redacted>")
            .field("compute_api_url", &self.compute_api_url)
            .field("compute_api_token", &self.compute_api_token.as_ref().map(|_| "<redacted>"))
            .field("http_timeout", &self.http_timeout)
            .finish()
    }
}

impl ProviderConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| CoreError::Configuration(format!("{key} is not set")))
        };

        let http_timeout_secs = match lookup("WARDEN_HTTP_TIMEOUT_SECS") {
            Some(raw) => raw.parse::<u64>().map_err(|e| {
                CoreError::Configuration(format!("WARDEN_HTTP_TIMEOUT_SECS is invalid: {e}"))
            })?,
            None => DEFAULT_HTTP_TIMEOUT_SECS,
        };

        Ok(Self {
            secret_key: required("WARDEN_SECRET_KEY")?,
            compute_api_url: required("WARDEN_COMPUTE_API_URL")?,
            compute_api_token: lookup("WARDEN_COMPUTE_API_TOKEN").filter(|t| !t.is_empty()),
            http_timeout: Duration::from_secs(http_timeout_secs),
        })
    }
}

/// The capability set handed to lifecycle workers.
#[derive(Clone)]
pub struct Providers {
    pub secrets: Arc<dyn SecretResolver>,
    pub compute: Arc<dyn ComputeControl>,
    pub notifier: Arc<dyn Notifier>,
}

impl Providers {
    pub fn from_config(config: &ProviderConfig) -> Result<Self> {
        let transport: Arc<dyn HttpTransport> =
            Arc::new(ReqwestHttpTransport::new(config.http_timeout)?);

        let mut compute = HttpComputeControl::new(transport.clone(), &config.compute_api_url);
        if let Some(token) = &config.compute_api_token {
            compute = compute.with_api_token(token);
        }

        Ok(Self {
            secrets: Arc::new(AesGcmSecretResolver::from_base64_key(&config.secret_key)?),
            compute: Arc::new(compute),
            notifier: Arc::new(WebhookNotifier::new(transport)),
        })
    }
}
