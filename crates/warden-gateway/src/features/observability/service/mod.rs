use crate::features::observability::repo::ObservabilityRepository;
use std::sync::Arc;
use warden_core::WorkerTarget;

pub struct ObservabilityService {
    repo: Arc<ObservabilityRepository>,
}

impl ObservabilityService {
    pub fn new(repo: Arc<ObservabilityRepository>) -> Self {
        Self { repo }
    }

    pub fn record_interaction(&self, kind: &str, status: &str, seconds: f64) {
        self.repo.observe_interaction(kind, status, seconds);
    }

    pub fn record_worker_invocation(&self, target: WorkerTarget) {
        self.repo.inc_worker_invocation(target.action());
    }

    pub fn record_dispatch_failure(&self) {
        self.repo.inc_worker_dispatch_failure();
    }

    pub fn render_metrics(&self) -> Result<String, String> {
        self.repo.render_metrics()
    }
}
