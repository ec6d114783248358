use std::{ops::Deref, sync::Arc};

use chat_gateway::{
    ButtonInteraction, ChatGateway, CommandInteraction, Interaction, InteractionKind,
    InteractionResponder, ModalSubmitInteraction,
};

use crate::error::HandlerError;

/// Everything a handler gets for one inbound interaction. Dereferences to
/// the [`InteractionResponder`] so handlers can answer directly.
pub struct InteractionContext {
    responder: InteractionResponder,
}

impl InteractionContext {
    pub fn new(gateway: Arc<dyn ChatGateway>, interaction: Interaction) -> Self {
        Self {
            responder: InteractionResponder::new(gateway, interaction),
        }
    }

    pub fn channel_id(&self) -> &str {
        self.responder.interaction().channel_id()
    }

    pub fn guild_id(&self) -> Option<&str> {
        self.responder.interaction().guild_id()
    }

    pub fn as_command(&self) -> Result<&CommandInteraction, HandlerError> {
        match self.responder.interaction() {
            Interaction::Command(command) => Ok(command),
            other => Err(wrong_type(InteractionKind::Command, other)),
        }
    }

    pub fn as_button(&self) -> Result<&ButtonInteraction, HandlerError> {
        match self.responder.interaction() {
            Interaction::Button(button) => Ok(button),
            other => Err(wrong_type(InteractionKind::Button, other)),
        }
    }

    pub fn as_modal_submit(&self) -> Result<&ModalSubmitInteraction, HandlerError> {
        match self.responder.interaction() {
            Interaction::ModalSubmit(modal) => Ok(modal),
            other => Err(wrong_type(InteractionKind::ModalSubmit, other)),
        }
    }
}

fn wrong_type(expected: InteractionKind, actual: &Interaction) -> HandlerError {
    HandlerError::WrongInteractionType {
        expected: expected.to_string(),
        actual: actual.kind(),
    }
}

impl Deref for InteractionContext {
    type Target = InteractionResponder;

    fn deref(&self) -> &InteractionResponder {
        &self.responder
    }
}
