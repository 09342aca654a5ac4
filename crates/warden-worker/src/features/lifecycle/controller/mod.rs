use std::sync::Arc;
use std::time::Instant;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn, Instrument};
use warden_core::WorkerInvocation;

use crate::features::lifecycle::service::{LifecycleService, WorkerError, WorkerReport};

/// Runs lifecycle workers detached from whoever triggered them.
#[derive(Clone)]
pub struct LifecycleController {
    service: Arc<LifecycleService>,
    cancel: CancellationToken,
}

impl LifecycleController {
    pub fn new(service: Arc<LifecycleService>, cancel: CancellationToken) -> Self {
        Self { service, cancel }
    }

    /// Execute an invocation on its own task. The handle is for tests and
    /// shutdown only; the gateway never joins it.
    pub fn spawn_invocation(&self, invocation: WorkerInvocation) -> JoinHandle<()> {
        let controller = self.clone();
        let span = tracing::info_span!(
            "worker",
            invocation_id = %invocation.invocation_id,
            target = %invocation.target,
        );
        tokio::spawn(
            async move {
                let _ = controller.execute(invocation).await;
            }
            .instrument(span),
        )
    }

    /// Execute an invocation inline and log its outcome.
    pub async fn execute(
        &self,
        invocation: WorkerInvocation,
    ) -> Result<WorkerReport, WorkerError> {
        let started = Instant::now();
        let result = self.service.run(invocation.target, &self.cancel).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match &result {
            Ok(report) => {
                info!(summary = %report.summary, elapsed_ms, "Worker completed");
            }
            Err(WorkerError::NotificationFailed { report, source }) => {
                warn!(
                    summary = %report.summary,
                    error = %source,
                    elapsed_ms,
                    "Worker completed but the notification was not delivered"
                );
            }
            Err(WorkerError::Failed(error)) => {
                error!(error = %error, elapsed_ms, "Worker failed");
            }
        }

        result
    }
}
