use prometheus::{
    opts, CounterVec, Encoder, HistogramOpts, HistogramVec, IntCounter, Registry, TextEncoder,
};

pub struct ObservabilityRepository {
    registry: Registry,
    interaction_total: CounterVec,
    interaction_latency_seconds: HistogramVec,
    worker_invocation_total: CounterVec,
    worker_dispatch_failure_total: IntCounter,
}

impl ObservabilityRepository {
    pub fn new() -> Result<Self, String> {
        let registry = Registry::new();

        let interaction_total = CounterVec::new(
            opts!("warden_interaction_total", "Interactions handled by outcome"),
            &["kind", "status"],
        )
        .map_err(|e| e.to_string())?;
        let interaction_latency_seconds = HistogramVec::new(
            HistogramOpts::new(
                "warden_interaction_latency_seconds",
                "Interaction handling latency (seconds)",
            ),
            &["kind"],
        )
        .map_err(|e| e.to_string())?;
        let worker_invocation_total = CounterVec::new(
            opts!(
                "warden_worker_invocation_total",
                "Worker invocations enqueued by target"
            ),
            &["target"],
        )
        .map_err(|e| e.to_string())?;
        let worker_dispatch_failure_total = IntCounter::with_opts(opts!(
            "warden_worker_dispatch_failure_total",
            "Worker invocations that could not be enqueued"
        ))
        .map_err(|e| e.to_string())?;

        registry
            .register(Box::new(interaction_total.clone()))
            .map_err(|e| e.to_string())?;
        registry
            .register(Box::new(interaction_latency_seconds.clone()))
            .map_err(|e| e.to_string())?;
        registry
            .register(Box::new(worker_invocation_total.clone()))
            .map_err(|e| e.to_string())?;
        registry
            .register(Box::new(worker_dispatch_failure_total.clone()))
            .map_err(|e| e.to_string())?;

        Ok(Self {
            registry,
            interaction_total,
            interaction_latency_seconds,
            worker_invocation_total,
            worker_dispatch_failure_total,
        })
    }

    pub fn observe_interaction(&self, kind: &str, status: &str, seconds: f64) {
        self.interaction_total
            .with_label_values(&[kind, status])
            .inc();
        self.interaction_latency_seconds
            .with_label_values(&[kind])
            .observe(seconds);
    }

    pub fn inc_worker_invocation(&self, target: &str) {
        self.worker_invocation_total
            .with_label_values(&[target])
            .inc();
    }

    pub fn inc_worker_dispatch_failure(&self) {
        self.worker_dispatch_failure_total.inc();
    }

    pub fn render_metrics(&self) -> Result<String, String> {
        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();
        let families = self.registry.gather();
        encoder
            .encode(&families, &mut buffer)
            .map_err(|e| e.to_string())?;
        String::from_utf8(buffer).map_err(|e| e.to_string())
    }
}
