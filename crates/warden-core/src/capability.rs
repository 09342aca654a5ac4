//! Contracts for the external capabilities lifecycle workers depend on.
//!
//! Workers receive these as injected trait objects; nothing reaches for an
//! ambient client.

use crate::{InstanceDescription, NotificationMessage, Result};
use async_trait::async_trait;

/// Turns at-rest ciphertext into plaintext, scoped by an execution context.
#[async_trait]
pub trait SecretResolver: Send + Sync {
    async fn decrypt(&self, ciphertext: &str, context: &str) -> Result<String>;
}

/// Reads and drives the managed compute instance.
#[async_trait]
pub trait ComputeControl: Send + Sync {
    async fn describe(&self, instance_id: &str) -> Result<InstanceDescription>;

    async fn start(&self, instance_id: &str) -> Result<()>;

    async fn stop(&self, instance_id: &str) -> Result<()>;
}

/// Delivers a message to a webhook destination. Best effort, no retry.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, destination: &str, message: &NotificationMessage) -> Result<()>;
}
