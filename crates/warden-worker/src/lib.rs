//! Lifecycle workers for the managed instance.
//!
//! The gateway enqueues a [`WorkerInvocation`] and replies immediately; the
//! [`WorkerRuntime`] drains that queue and runs every invocation on its own
//! detached task. Nothing flows back to the request that triggered it.

pub mod features;

pub use features::lifecycle::controller::LifecycleController;
pub use features::lifecycle::repo::{ProcessEnvironment, StaticEnvironment, WorkerEnvironment};
pub use features::lifecycle::service::{
    LifecycleService, StopPolicy, WorkerError, WorkerReport, WorkerResult,
};

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use warden_core::WorkerInvocation;

pub const DEFAULT_QUEUE_DEPTH: usize = 64;

/// Bounded queue between the gateway and the worker runtime.
pub fn invocation_channel(
    depth: usize,
) -> (
    mpsc::Sender<WorkerInvocation>,
    mpsc::Receiver<WorkerInvocation>,
) {
    mpsc::channel(depth.max(1))
}

pub struct WorkerRuntime {
    controller: LifecycleController,
    cancel: CancellationToken,
}

impl WorkerRuntime {
    pub fn new(service: Arc<LifecycleService>, cancel: CancellationToken) -> Self {
        Self {
            controller: LifecycleController::new(service, cancel.clone()),
            cancel,
        }
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Drain the queue until it closes or the runtime is cancelled.
    pub async fn run(self, mut receiver: mpsc::Receiver<WorkerInvocation>) {
        info!("Worker runtime started");
        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    info!("Worker runtime cancelled");
                    break;
                }
                next = receiver.recv() => match next {
                    Some(invocation) => {
                        debug!(
                            invocation_id = %invocation.invocation_id,
                            target = %invocation.target,
                            "Dispatching worker invocation"
                        );
                        self.controller.spawn_invocation(invocation);
                    }
                    None => {
                        info!("Invocation queue closed");
                        break;
                    }
                },
            }
        }
    }

    pub fn spawn(self, receiver: mpsc::Receiver<WorkerInvocation>) -> JoinHandle<()> {
        tokio::spawn(self.run(receiver))
    }
}
