use std::sync::Arc;

use async_trait::async_trait;
use chat_gateway::{CommandMeta, InteractionKind, MessagePayload};

use crate::{
    command::{BotCommand, Handler},
    context::InteractionContext,
    error::HandlerError,
};

struct Ping;

#[async_trait]
impl Handler for Ping {
    fn accepts(&self) -> &[InteractionKind] {
        &[InteractionKind::Command]
    }

    async fn handle(&self, ctx: &InteractionContext) -> Result<(), HandlerError> {
        ctx.reply(MessagePayload::content("Pong!")).await?;
        Ok(())
    }
}

/// `/ping`, a liveness check.
pub fn ping_command() -> BotCommand {
    BotCommand::new(CommandMeta::new("ping", "Replies with Pong!"), Arc::new(Ping))
}
