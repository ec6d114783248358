// chat_gateway/src/message.rs
use std::ops::BitOr;

use serde::{Deserialize, Serialize};

/// A message as stored in a channel's history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ChatMessage {
    pub id: String,         // platform id, ordered by creation time
    pub channel_id: String,
    pub author_id: String,
    pub content: String,    // plain text body, may be empty for attachments
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum ButtonStyle {
    #[default]
    Primary,
    Secondary,
    Success,
    Danger,
}

/// An interactive button. The `custom_id` routes the click back to a handler.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Button {
    pub custom_id: String,
    pub label: String,
    pub style: ButtonStyle,
    pub disabled: bool,
}

impl Button {
    pub fn new(custom_id: impl Into<String>, label: impl Into<String>, style: ButtonStyle) -> Self {
        Self {
            custom_id: custom_id.into(),
            label: label.into(),
            style,
            disabled: false,
        }
    }

    /// Copy of this button that can no longer be clicked.
    pub fn to_disabled(&self) -> Self {
        Self {
            disabled: true,
            ..self.clone()
        }
    }
}

/// Layout blocks of a message body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum Component {
    TextDisplay(String),
    Container(Vec<Component>),
    ActionRow(Vec<Button>),
}

impl Component {
    pub fn text(content: impl Into<String>) -> Self {
        Component::TextDisplay(content.into())
    }

    /// Every button in this block, depth first.
    pub fn buttons(&self) -> Vec<&Button> {
        match self {
            Component::TextDisplay(_) => Vec::new(),
            Component::ActionRow(buttons) => buttons.iter().collect(),
            Component::Container(children) => children.iter().flat_map(|c| c.buttons()).collect(),
        }
    }

    /// Every text block in this block, depth first.
    pub fn texts(&self) -> Vec<&str> {
        match self {
            Component::TextDisplay(text) => vec![text.as_str()],
            Component::ActionRow(_) => Vec::new(),
            Component::Container(children) => children.iter().flat_map(|c| c.texts()).collect(),
        }
    }
}

/// Outgoing message body used for replies, follow-ups and edits.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct MessagePayload {
    pub content: Option<String>,
    pub components: Vec<Component>,
    pub ephemeral: bool,          // only visible to the invoking user
    pub suppress_mentions: bool,  // render user/role mentions inert
}

impl MessagePayload {
    pub fn content(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    pub fn components(components: Vec<Component>) -> Self {
        Self {
            components,
            ..Self::default()
        }
    }

    pub fn ephemeral(mut self) -> Self {
        self.ephemeral = true;
        self
    }

    pub fn without_mentions(mut self) -> Self {
        self.suppress_mentions = true;
        self
    }

    pub fn buttons(&self) -> Vec<&Button> {
        self.components.iter().flat_map(|c| c.buttons()).collect()
    }

    /// Plain text of the payload: the content followed by every text block.
    pub fn texts(&self) -> Vec<&str> {
        self.content
            .as_deref()
            .into_iter()
            .chain(self.components.iter().flat_map(|c| c.texts()))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum TextInputStyle {
    #[default]
    Short,
    Paragraph,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TextInput {
    pub custom_id: String,
    pub label: String,
    pub style: TextInputStyle,
    pub placeholder: Option<String>,
    pub required: bool,
}

/// A structured input form shown in response to an interaction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Modal {
    pub custom_id: String,
    pub title: String,
    pub inputs: Vec<TextInput>,
}

/// Channel permission bits the core cares about.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Permissions(pub u64);

impl Permissions {
    pub const NONE: Permissions = Permissions(0);
    pub const VIEW_CHANNEL: Permissions = Permissions(1 << 10);
    pub const READ_MESSAGE_HISTORY: Permissions = Permissions(1 << 16);

    pub fn contains(self, other: Permissions) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for Permissions {
    type Output = Permissions;

    fn bitor(self, rhs: Permissions) -> Permissions {
        Permissions(self.0 | rhs.0)
    }
}

/// What the bot can see about a channel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChannelInfo {
    pub id: String,
    pub text_based: bool,
    pub bot_permissions: Permissions, // resolved for the bot's own member
}
