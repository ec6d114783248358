// chat_gateway/src/gateway.rs
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    interaction::Interaction,
    message::{ChannelInfo, ChatMessage, MessagePayload, Modal},
};

/// Errors a gateway implementation can return.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// The platform rejected or failed the call.
    #[error("transport error: {0}")]
    Transport(String),

    /// The addressed channel, message or interaction does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// An initial response was already sent for this interaction.
    #[error("interaction {0} was already acknowledged")]
    AlreadyAcknowledged(String),

    /// A follow-up was attempted before any initial response.
    #[error("interaction {0} has not been acknowledged yet")]
    NotAcknowledged(String),

    /// The response type is not valid for this interaction variant.
    #[error("unsupported response: {0}")]
    Unsupported(String),
}

/// The first (and only) response to an interaction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum InteractionResponse {
    /// Post a new message answering the interaction.
    Message(MessagePayload),
    /// Replace the message the component lives on.
    UpdateMessage(MessagePayload),
    /// Acknowledge a component without visible change yet.
    DeferredUpdate,
    /// Open a form.
    Modal(Modal),
}

impl InteractionResponse {
    pub fn name(&self) -> &'static str {
        match self {
            InteractionResponse::Message(_) => "message",
            InteractionResponse::UpdateMessage(_) => "update_message",
            InteractionResponse::DeferredUpdate => "deferred_update",
            InteractionResponse::Modal(_) => "modal",
        }
    }
}

/// Messages strictly after `after` and, when set, strictly before `before`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageRange {
    pub after: String,
    pub before: Option<String>,
}

/// What the core needs from a chat platform.
#[async_trait]
pub trait ChatGateway: Send + Sync {
    /// Name of the platform, for logs.
    fn name(&self) -> &str;

    /// Look a channel up in a community, with the bot's permissions in it.
    /// `Ok(None)` when the channel does not exist or is not visible.
    async fn fetch_channel(
        &self,
        guild_id: &str,
        channel_id: &str,
    ) -> Result<Option<ChannelInfo>, GatewayError>;

    /// Fetch channel history in `range`, newest first as platforms return it.
    async fn fetch_messages(
        &self,
        channel_id: &str,
        range: MessageRange,
    ) -> Result<Vec<ChatMessage>, GatewayError>;

    /// Replace the body of an existing message.
    async fn edit_message(
        &self,
        channel_id: &str,
        message_id: &str,
        payload: MessagePayload,
    ) -> Result<(), GatewayError>;

    /// Send the initial response. Returns the id of the message the response
    /// produced or acknowledged, when the platform reports one.
    async fn respond(
        &self,
        interaction: &Interaction,
        response: InteractionResponse,
    ) -> Result<Option<String>, GatewayError>;

    /// Send an additional message after the initial response.
    async fn follow_up(
        &self,
        interaction: &Interaction,
        payload: MessagePayload,
    ) -> Result<Option<String>, GatewayError>;
}

/// Receives every inbound interaction a platform adapter decodes.
#[async_trait]
pub trait InteractionSink: Send + Sync {
    async fn on_interaction(&self, gateway: Arc<dyn ChatGateway>, interaction: Interaction);
}
