//! Signed-webhook gateway for the managed instance.
//!
//! `POST /interactions` verifies the Ed25519 signature over the raw body,
//! answers pings, and turns `server` commands into queued worker invocations.

pub mod features;
pub mod server;
pub mod shared;

pub use features::command_dispatch::repo::{QueueWorkerTrigger, WorkerTrigger};
pub use features::command_dispatch::service::{AsyncInvoker, CommandDispatcher};
pub use features::interaction::controller::InteractionController;
pub use features::interaction::service::InteractionRouter;
pub use features::observability::controller::ObservabilityController;
pub use features::signature::{AuthFailure, SignatureVerifier};
pub use server::{router, AppState};
pub use shared::config::GatewayConfig;
pub use shared::error::{GatewayError, GatewayResult};
