use crate::features::interaction::service::InteractionRouter;
use crate::features::observability::controller::ObservabilityController;
use crate::features::signature::SignatureVerifier;
use crate::shared::error::{GatewayError, GatewayResult};
use crate::shared::types::{
    kind_label, MALFORMED_LABEL, SIGNATURE_HEADER, TIMESTAMP_HEADER, UNVERIFIED_LABEL,
};
use axum::http::HeaderMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};
use warden_core::{Interaction, InteractionCallback};

/// Entry point for `POST /interactions`.
///
/// The raw body is verified before any of it is parsed; nothing here waits on
/// a worker.
pub struct InteractionController {
    verifier: SignatureVerifier,
    router: InteractionRouter,
    observability: Arc<ObservabilityController>,
}

impl InteractionController {
    pub fn new(
        verifier: SignatureVerifier,
        router: InteractionRouter,
        observability: Arc<ObservabilityController>,
    ) -> Self {
        Self {
            verifier,
            router,
            observability,
        }
    }

    pub fn handle(&self, headers: &HeaderMap, raw_body: &[u8]) -> GatewayResult<InteractionCallback> {
        let started = Instant::now();
        let mut label = UNVERIFIED_LABEL;

        let result = self.verify(headers, raw_body).and_then(|()| {
            label = MALFORMED_LABEL;
            let interaction = Interaction::from_slice(raw_body).map_err(|e| {
                warn!(error = %e, "Rejected malformed interaction payload");
                GatewayError::UnhandledRequestType
            })?;
            label = kind_label(interaction.kind);
            self.router.route(&interaction)
        });

        let status = match &result {
            Ok(_) => "ok",
            Err(e) => e.status_label(),
        };
        self.observability
            .record_interaction(label, status, started.elapsed().as_secs_f64());
        info!(kind = label, status, "Handled interaction");

        result
    }

    fn verify(&self, headers: &HeaderMap, raw_body: &[u8]) -> GatewayResult<()> {
        let signature = header_str(headers, SIGNATURE_HEADER);
        let timestamp = header_str(headers, TIMESTAMP_HEADER);
        let (Some(signature), Some(timestamp)) = (signature, timestamp) else {
            warn!("Interaction missing signature headers");
            return Err(GatewayError::InvalidSignature);
        };

        self.verifier
            .verify(signature, timestamp, raw_body)
            .map_err(|_| {
                warn!("Interaction signature rejected");
                GatewayError::InvalidSignature
            })
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}
