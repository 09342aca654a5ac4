use crate::features::command_dispatch::repo::WorkerTrigger;
use crate::features::observability::controller::ObservabilityController;
use crate::shared::error::{GatewayError, GatewayResult};
use std::sync::Arc;
use tracing::{error, info};
use warden_core::{Command, InteractionCallback, MessageFlags, WorkerInvocation, WorkerTarget};

/// Fire-and-forget worker invocation followed by an immediate acknowledgement.
pub struct AsyncInvoker {
    trigger: Arc<dyn WorkerTrigger>,
    observability: Arc<ObservabilityController>,
    flags: MessageFlags,
}

impl AsyncInvoker {
    pub fn new(trigger: Arc<dyn WorkerTrigger>, observability: Arc<ObservabilityController>) -> Self {
        Self {
            trigger,
            observability,
            flags: MessageFlags::default(),
        }
    }

    pub fn with_flags(mut self, flags: MessageFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn invoke(&self, target: WorkerTarget, ack: &str) -> GatewayResult<InteractionCallback> {
        let invocation = WorkerInvocation::new(target);
        let invocation_id = invocation.invocation_id;

        if let Err(e) = self.trigger.trigger(invocation) {
            error!(%invocation_id, %target, error = %e, "Failed to enqueue worker invocation");
            self.observability.record_dispatch_failure();
            return Err(GatewayError::DispatchFailed(e.to_string()));
        }

        info!(%invocation_id, %target, worker = target.worker_name(), "Worker invocation enqueued");
        self.observability.record_worker_invocation(target);
        Ok(InteractionCallback::channel_message(ack, self.flags))
    }
}

/// Maps a slash command onto exactly one worker target.
pub struct CommandDispatcher {
    invoker: AsyncInvoker,
}

impl CommandDispatcher {
    pub fn new(invoker: AsyncInvoker) -> Self {
        Self { invoker }
    }

    pub fn dispatch(&self, name: &str, action: Option<&str>) -> GatewayResult<InteractionCallback> {
        match Command::parse(name, action) {
            Some(Command::Server(target)) => self.invoker.invoke(target, target.ack_message()),
            None => Err(GatewayError::UnhandledCommand),
        }
    }
}
