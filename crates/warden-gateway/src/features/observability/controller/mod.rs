use crate::features::observability::repo::ObservabilityRepository;
use crate::features::observability::service::ObservabilityService;
use std::sync::Arc;
use warden_core::WorkerTarget;

pub struct ObservabilityController {
    service: ObservabilityService,
}

impl ObservabilityController {
    pub fn new(service: ObservabilityService) -> Self {
        Self { service }
    }

    /// Controller backed by a fresh registry.
    pub fn with_new_registry() -> Result<Self, String> {
        let repo = Arc::new(ObservabilityRepository::new()?);
        Ok(Self::new(ObservabilityService::new(repo)))
    }

    pub fn record_interaction(&self, kind: &str, status: &str, seconds: f64) {
        self.service.record_interaction(kind, status, seconds);
    }

    pub fn record_worker_invocation(&self, target: WorkerTarget) {
        self.service.record_worker_invocation(target);
    }

    pub fn record_dispatch_failure(&self) {
        self.service.record_dispatch_failure();
    }

    pub fn render_metrics(&self) -> Result<String, String> {
        self.service.render_metrics()
    }
}
