// chat_gateway/src/command.rs
use serde::{Deserialize, Serialize};

/// Publishable description of a top-level command and its subcommands.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommandMeta {
    pub name: String,
    pub description: String,
    pub subcommands: Vec<SubcommandMeta>,
    pub guild_only: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubcommandMeta {
    pub name: String,
    pub description: String,
}

impl CommandMeta {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            subcommands: Vec::new(),
            guild_only: false,
        }
    }

    /// Only invocable inside a community, never in direct messages.
    pub fn guild_only(mut self) -> Self {
        self.guild_only = true;
        self
    }

    pub fn with_subcommand(mut self, sub: SubcommandMeta) -> Self {
        self.subcommands.push(sub);
        self
    }
}

impl SubcommandMeta {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}
