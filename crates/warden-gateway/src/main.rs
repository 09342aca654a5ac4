use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use warden_gateway::{
    router, AppState, AsyncInvoker, CommandDispatcher, GatewayConfig, InteractionController,
    InteractionRouter, ObservabilityController, QueueWorkerTrigger, SignatureVerifier,
};
use warden_providers::{ProviderConfig, Providers};
use warden_worker::{
    invocation_channel, LifecycleService, ProcessEnvironment, StopPolicy, WorkerRuntime,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("warden_gateway=info,warden_worker=info,info")
        }))
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = GatewayConfig::from_env()?;
    let provider_config = ProviderConfig::from_env()?;
    let stop_policy = StopPolicy::from_env()?;
    info!(addr = %config.addr, queue_depth = config.queue_depth, "Starting Instance Warden gateway");

    let providers = Providers::from_config(&provider_config)?;

    let public_key_hex = providers
        .secrets
        .decrypt(&config.public_key_ciphertext, &config.gateway_context)
        .await?;
    let verifier = SignatureVerifier::from_hex(&public_key_hex)?;

    let observability = Arc::new(ObservabilityController::with_new_registry()?);

    let cancel = CancellationToken::new();
    let (sender, receiver) = invocation_channel(config.queue_depth);
    let lifecycle = LifecycleService::new(
        Arc::new(ProcessEnvironment),
        providers.secrets.clone(),
        providers.compute.clone(),
        providers.notifier.clone(),
    )
    .with_stop_policy(stop_policy);
    let worker_runtime = WorkerRuntime::new(Arc::new(lifecycle), cancel.clone()).spawn(receiver);

    let invoker = AsyncInvoker::new(Arc::new(QueueWorkerTrigger::new(sender)), observability.clone());
    let interactions = InteractionController::new(
        verifier,
        InteractionRouter::new(CommandDispatcher::new(invoker)),
        observability.clone(),
    );
    let app = router(AppState {
        interactions: Arc::new(interactions),
        observability,
    });

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    info!(addr = %config.addr, "Gateway listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Gateway stopped; cancelling in-flight workers");
    cancel.cancel();
    if let Err(error) = worker_runtime.await {
        warn!(%error, "Worker runtime task ended abnormally");
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        warn!(%error, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
