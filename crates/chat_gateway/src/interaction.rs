// chat_gateway/src/interaction.rs
use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display};

/// Discriminant of an [`Interaction`], used by handlers to declare what they accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum InteractionKind {
    Command,
    Button,
    ModalSubmit,
    Unsupported,
}

/// Fields every interaction carries, whatever its variant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct InteractionBase {
    pub id: String,               // platform interaction id
    pub token: String,            // continuation token for responses
    pub channel_id: String,
    pub guild_id: Option<String>, // None outside of a community
    pub user_id: String,
}

/// A slash command invocation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommandInteraction {
    pub base: InteractionBase,
    pub command_name: String,
    pub subcommand: Option<String>,
}

/// A click on a button attached to a previously sent message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ButtonInteraction {
    pub base: InteractionBase,
    pub custom_id: String,
    pub message_id: String, // the message the button is attached to
}

/// A submitted modal form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModalSubmitInteraction {
    pub base: InteractionBase,
    pub custom_id: String,
    pub message_id: Option<String>,      // set when the modal was opened from a message
    pub fields: HashMap<String, String>, // input custom_id → submitted value
}

impl ModalSubmitInteraction {
    pub fn field(&self, custom_id: &str) -> Option<&str> {
        self.fields.get(custom_id).map(String::as_str)
    }
}

/// Every inbound event the gateway can deliver.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Interaction {
    Command(CommandInteraction),
    Button(ButtonInteraction),
    ModalSubmit(ModalSubmitInteraction),
    /// Anything else (autocomplete, pings, select menus...), kept for logging.
    Unsupported { base: InteractionBase, kind: String },
}

impl Interaction {
    pub fn kind(&self) -> InteractionKind {
        match self {
            Interaction::Command(_) => InteractionKind::Command,
            Interaction::Button(_) => InteractionKind::Button,
            Interaction::ModalSubmit(_) => InteractionKind::ModalSubmit,
            Interaction::Unsupported { .. } => InteractionKind::Unsupported,
        }
    }

    pub fn base(&self) -> &InteractionBase {
        match self {
            Interaction::Command(c) => &c.base,
            Interaction::Button(b) => &b.base,
            Interaction::ModalSubmit(m) => &m.base,
            Interaction::Unsupported { base, .. } => base,
        }
    }

    pub fn channel_id(&self) -> &str {
        &self.base().channel_id
    }

    pub fn guild_id(&self) -> Option<&str> {
        self.base().guild_id.as_deref()
    }

    /// The routing key: command name for commands, custom id for components.
    pub fn route_key(&self) -> Option<&str> {
        match self {
            Interaction::Command(c) => Some(&c.command_name),
            Interaction::Button(b) => Some(&b.custom_id),
            Interaction::ModalSubmit(m) => Some(&m.custom_id),
            Interaction::Unsupported { .. } => None,
        }
    }
}
