// chat_gateway/src/responder.rs
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use tracing::trace;

use crate::{
    gateway::{ChatGateway, GatewayError, InteractionResponse},
    interaction::Interaction,
    message::{MessagePayload, Modal},
};

/// Wraps one inbound interaction and tracks whether it has been answered.
///
/// Platforms accept exactly one initial response per interaction; anything
/// after that must be a follow-up. The responder enforces that ordering so
/// callers can ask "was this acknowledged?" instead of tracking it themselves.
pub struct InteractionResponder {
    gateway: Arc<dyn ChatGateway>,
    interaction: Interaction,
    acknowledged: AtomicBool,
}

impl InteractionResponder {
    pub fn new(gateway: Arc<dyn ChatGateway>, interaction: Interaction) -> Self {
        Self {
            gateway,
            interaction,
            acknowledged: AtomicBool::new(false),
        }
    }

    pub fn interaction(&self) -> &Interaction {
        &self.interaction
    }

    pub fn gateway(&self) -> &Arc<dyn ChatGateway> {
        &self.gateway
    }

    pub fn is_acknowledged(&self) -> bool {
        self.acknowledged.load(Ordering::SeqCst)
    }

    /// Answer with a new message.
    pub async fn reply(&self, payload: MessagePayload) -> Result<Option<String>, GatewayError> {
        self.respond(InteractionResponse::Message(payload)).await
    }

    /// Replace the message the triggering component is attached to.
    pub async fn update(&self, payload: MessagePayload) -> Result<(), GatewayError> {
        self.respond(InteractionResponse::UpdateMessage(payload))
            .await
            .map(|_| ())
    }

    /// Acknowledge without a visible change.
    pub async fn defer_update(&self) -> Result<Option<String>, GatewayError> {
        self.respond(InteractionResponse::DeferredUpdate).await
    }

    pub async fn show_modal(&self, modal: Modal) -> Result<(), GatewayError> {
        self.respond(InteractionResponse::Modal(modal))
            .await
            .map(|_| ())
    }

    pub async fn follow_up(&self, payload: MessagePayload) -> Result<Option<String>, GatewayError> {
        if !self.is_acknowledged() {
            return Err(GatewayError::NotAcknowledged(self.interaction.base().id.clone()));
        }
        self.gateway.follow_up(&self.interaction, payload).await
    }

    /// Reply if nothing was sent yet, otherwise follow up. Never both.
    pub async fn send(&self, payload: MessagePayload) -> Result<Option<String>, GatewayError> {
        if self.is_acknowledged() {
            self.follow_up(payload).await
        } else {
            self.reply(payload).await
        }
    }

    async fn respond(&self, response: InteractionResponse) -> Result<Option<String>, GatewayError> {
        let id = &self.interaction.base().id;
        if self
            .acknowledged
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(GatewayError::AlreadyAcknowledged(id.clone()));
        }
        trace!(interaction = %id, response = response.name(), "responding to interaction");
        match self.gateway.respond(&self.interaction, response).await {
            Ok(message_id) => Ok(message_id),
            Err(err) => {
                // the platform never saw an answer, so a later reply is still allowed
                self.acknowledged.store(false, Ordering::SeqCst);
                Err(err)
            }
        }
    }
}
