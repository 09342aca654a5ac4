use std::net::SocketAddr;
use warden_core::{CoreError, Result};
use warden_worker::DEFAULT_QUEUE_DEPTH;

pub const DEFAULT_GATEWAY_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_GATEWAY_CONTEXT: &str = "warden-gateway";

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub addr: SocketAddr,
    /// Encrypted hex public key; decrypted once at startup.
    pub public_key_ciphertext: String,
    pub gateway_context: String,
    pub queue_depth: usize,
}

impl GatewayConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let addr = lookup("WARDEN_GATEWAY_ADDR")
            .unwrap_or_else(|| DEFAULT_GATEWAY_ADDR.to_string())
            .parse::<SocketAddr>()
            .map_err(|e| CoreError::Configuration(format!("WARDEN_GATEWAY_ADDR: {e}")))?;

        let public_key_ciphertext = lookup("WARDEN_PUBLIC_KEY")
            .filter(|value| !value.is_empty())
            .ok_or_else(|| CoreError::Configuration("WARDEN_PUBLIC_KEY is not set".to_string()))?;

        let gateway_context = lookup("WARDEN_GATEWAY_CONTEXT")
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_GATEWAY_CONTEXT.to_string());

        let queue_depth = match lookup("WARDEN_INVOCATION_QUEUE_DEPTH") {
            Some(raw) => raw.parse::<usize>().map_err(|e| {
                CoreError::Configuration(format!("WARDEN_INVOCATION_QUEUE_DEPTH: {e}"))
            })?,
            None => DEFAULT_QUEUE_DEPTH,
        };

        Ok(Self {
            addr,
            public_key_ciphertext,
            gateway_context,
            queue_depth,
        })
    }
}
