pub mod capability;
pub mod interaction;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

pub use capability::{ComputeControl, Notifier, SecretResolver};
pub use interaction::{Command, Interaction, InteractionCallback, InteractionKind};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("Authentication failed: {0}")]
    Authentication(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("{capability} {operation} failed: {message}")]
    ExternalService {
        capability: String,
        operation: String,
        message: String,
    },
    #[error("Timeout: {0}")]
    Timeout(String),
    #[error("Cancelled: {0}")]
    Cancelled(String),
}

impl CoreError {
    /// Wrap a failure of an external capability with the operation that was attempted.
    pub fn external(
        capability: impl Into<String>,
        operation: impl Into<String>,
        message: impl fmt::Display,
    ) -> Self {
        Self::ExternalService {
            capability: capability.into(),
            operation: operation.into(),
            message: message.to_string(),
        }
    }

    pub fn is_external(&self) -> bool {
        matches!(self, Self::ExternalService { .. })
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;

/// Instance state as reported by the compute-control capability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum InstanceState {
    Running,
    Stopped,
    Pending,
    Other(String),
}

impl InstanceState {
    pub fn as_str(&self) -> &str {
        match self {
            InstanceState::Running => "running",
            InstanceState::Stopped => "stopped",
            InstanceState::Pending => "pending",
            InstanceState::Other(raw) => raw,
        }
    }
}

impl From<String> for InstanceState {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "running" => InstanceState::Running,
            "stopped" => InstanceState::Stopped,
            "pending" => InstanceState::Pending,
            _ => InstanceState::Other(raw),
        }
    }
}

impl From<&str> for InstanceState {
    fn from(raw: &str) -> Self {
        InstanceState::from(raw.to_string())
    }
}

impl From<InstanceState> for String {
    fn from(state: InstanceState) -> Self {
        state.as_str().to_string()
    }
}

impl fmt::Display for InstanceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot returned by `ComputeControl::describe`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceDescription {
    pub instance_id: String,
    pub state: InstanceState,
    #[serde(default)]
    pub public_ip: Option<String>,
}

/// The lifecycle worker an accepted command is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerTarget {
    Start,
    Stop,
    Status,
}

impl WorkerTarget {
    pub const ALL: [WorkerTarget; 3] = [
        WorkerTarget::Start,
        WorkerTarget::Stop,
        WorkerTarget::Status,
    ];

    /// Parse the `server` command's action argument. Exact, case-sensitive.
    pub fn from_action(action: &str) -> Option<Self> {
        match action {
            "start" => Some(WorkerTarget::Start),
            "stop" => Some(WorkerTarget::Stop),
            "status" => Some(WorkerTarget::Status),
            _ => None,
        }
    }

    pub fn action(&self) -> &'static str {
        match self {
            WorkerTarget::Start => "start",
            WorkerTarget::Stop => "stop",
            WorkerTarget::Status => "status",
        }
    }

    /// Reply shown to the operator while the worker runs.
    pub fn ack_message(&self) -> &'static str {
        match self {
            WorkerTarget::Start => "Starting the server...",
            WorkerTarget::Stop => "Stopping the server...",
            WorkerTarget::Status => "Fetching the server status...",
        }
    }

    /// Worker name; doubles as the execution context secrets are sealed against.
    pub fn worker_name(&self) -> &'static str {
        match self {
            WorkerTarget::Start => "warden-start-instance",
            WorkerTarget::Stop => "warden-stop-instance",
            WorkerTarget::Status => "warden-check-instance",
        }
    }
}

impl fmt::Display for WorkerTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.action())
    }
}

/// Message placed on the invocation queue by the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerInvocation {
    pub invocation_id: Uuid,
    pub target: WorkerTarget,
    pub requested_at: DateTime<Utc>,
}

impl WorkerInvocation {
    pub fn new(target: WorkerTarget) -> Self {
        Self {
            invocation_id: Uuid::new_v4(),
            target,
            requested_at: Utc::now(),
        }
    }
}

/// Opaque delivery-flags bitmask passed through to the chat platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageFlags(pub u64);

impl MessageFlags {
    pub const SUPPRESS_NOTIFICATIONS: MessageFlags = MessageFlags(1 << 12);

    pub fn bits(&self) -> u64 {
        self.0
    }
}

impl Default for MessageFlags {
    fn default() -> Self {
        Self::SUPPRESS_NOTIFICATIONS
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationMessage {
    pub content: String,
    pub flags: MessageFlags,
}

impl NotificationMessage {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            flags: MessageFlags::default(),
        }
    }

    pub fn with_flags(mut self, flags: MessageFlags) -> Self {
        self.flags = flags;
        self
    }
}
