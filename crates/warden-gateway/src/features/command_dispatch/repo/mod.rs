use tokio::sync::mpsc::{self, error::TrySendError};
use warden_core::{CoreError, Result, WorkerInvocation};

/// Hands an invocation to the worker side without waiting for it to run.
#[cfg_attr(test, mockall::automock)]
pub trait WorkerTrigger: Send + Sync {
    fn trigger(&self, invocation: WorkerInvocation) -> Result<()>;
}

/// Enqueues onto the in-process worker runtime. Never blocks the caller.
pub struct QueueWorkerTrigger {
    sender: mpsc::Sender<WorkerInvocation>,
}

impl QueueWorkerTrigger {
    pub fn new(sender: mpsc::Sender<WorkerInvocation>) -> Self {
        Self { sender }
    }
}

impl WorkerTrigger for QueueWorkerTrigger {
    fn trigger(&self, invocation: WorkerInvocation) -> Result<()> {
        self.sender.try_send(invocation).map_err(|e| match e {
            TrySendError::Full(_) => {
                CoreError::external("worker-queue", "enqueue", "invocation queue is full")
            }
            TrySendError::Closed(_) => {
                CoreError::external("worker-queue", "enqueue", "worker runtime is not running")
            }
        })
    }
}
