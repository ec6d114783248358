//! Emoji and limits shared by user-facing messages.

pub struct Emojis;

impl Emojis {
    pub const CHECK: &'static str = "✅";
    pub const CROSS: &'static str = "❌";
    pub const NO_ENTRY: &'static str = "⛔";
    pub const OUTBOX: &'static str = "📤";
}

/// Longest text block, in characters, the bot puts in a single message.
pub const MAX_MESSAGE_STRING_LENGTH: usize = 4000;

/// What an invoker sees when a handler fails. Never carries internal detail.
pub const GENERIC_ERROR_MESSAGE: &str = "An error occurred.";
