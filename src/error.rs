use chat_gateway::{GatewayError, InteractionKind};
use thiserror::Error;

use crate::store::StoreError;

/// Faults found while wiring commands together. All of them abort startup.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RegistryError {
    #[error("command name '{0}' is already registered")]
    DuplicateCommandName(String),
    #[error("interaction handler id '{0}' is already registered")]
    DuplicateInteractionId(String),
    #[error("subcommand '{name}' is already registered in command group '{group}'")]
    DuplicateSubcommandName { group: String, name: String },
}

/// Anything a handler can fail with. Routed to the generic error reply.
#[derive(Error, Debug)]
pub enum HandlerError {
    #[error("handler accepts {expected} interactions, got {actual}")]
    WrongInteractionType {
        expected: String,
        actual: InteractionKind,
    },
    #[error("no subcommand executor found for {name:?} in command group '{group}'")]
    UnknownSubcommand { group: String, name: Option<String> },
    #[error("interaction in channel '{0}' has no guild context")]
    GuildUnavailable(String),
    #[error("recording prompt in channel '{0}' did not report a message id")]
    MissingRecordingMessageId(String),
    #[error("channel '{0}' has no recording in progress")]
    MissingRecordingMarker(String),
    #[error("modal submission is missing field '{0}'")]
    MissingField(String),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error(transparent)]
    Store(#[from] StoreError),
}
