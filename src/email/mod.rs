//! The `/email` command group.

use std::sync::Arc;

use chat_gateway::CommandMeta;

use crate::{
    command::{BotCommand, build_command_group},
    error::RegistryError,
    lock::ChannelLocks,
    store::ThreadStore,
};

pub mod reply;

pub use reply::ReplyRecorder;

pub fn email_command(
    store: Arc<dyn ThreadStore>,
    locks: ChannelLocks,
) -> Result<BotCommand, RegistryError> {
    build_command_group(
        CommandMeta::new("email", "Email related commands").guild_only(),
        vec![ReplyRecorder::new(store, locks).subcommand()],
    )
}
