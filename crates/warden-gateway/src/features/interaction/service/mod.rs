use crate::features::command_dispatch::service::CommandDispatcher;
use crate::shared::error::{GatewayError, GatewayResult};
use tracing::debug;
use warden_core::{Interaction, InteractionCallback, InteractionKind};

/// Routes a verified interaction by its type.
pub struct InteractionRouter {
    dispatcher: CommandDispatcher,
}

impl InteractionRouter {
    pub fn new(dispatcher: CommandDispatcher) -> Self {
        Self { dispatcher }
    }

    pub fn route(&self, interaction: &Interaction) -> GatewayResult<InteractionCallback> {
        match interaction.kind {
            InteractionKind::Ping => Ok(InteractionCallback::pong()),
            InteractionKind::ApplicationCommand => {
                let Some(command) = &interaction.command else {
                    debug!("Application command without data");
                    return Err(GatewayError::UnhandledCommand);
                };
                self.dispatcher
                    .dispatch(&command.name, command.action.as_deref())
            }
            InteractionKind::Other(kind) => {
                debug!(kind, "Unhandled interaction type");
                Err(GatewayError::UnhandledRequestType)
            }
        }
    }
}
