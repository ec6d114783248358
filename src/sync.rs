//! Target selection for publishing the command set.

use std::{fmt, str::FromStr};

use chat_gateway::CommandMeta;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncTarget {
    #[default]
    Global,
    Guild(u64),
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("Unknown argument \"{0}\". Only a guild ID or \"global\" (default) are supported.")]
pub struct UnknownSyncTarget(pub String);

impl SyncTarget {
    /// No argument means global.
    pub fn parse(arg: Option<&str>) -> Result<Self, UnknownSyncTarget> {
        arg.map_or(Ok(SyncTarget::Global), str::parse)
    }

    pub fn guild_id(self) -> Option<u64> {
        match self {
            SyncTarget::Global => None,
            SyncTarget::Guild(id) => Some(id),
        }
    }
}

impl FromStr for SyncTarget {
    type Err = UnknownSyncTarget;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "global" {
            return Ok(SyncTarget::Global);
        }
        // snowflakes are plain digits and never zero
        match s.parse::<u64>() {
            Ok(id) if id != 0 && s.bytes().all(|b| b.is_ascii_digit()) => {
                return Ok(SyncTarget::Guild(id));
            }
            _ => {}
        }
        Err(UnknownSyncTarget(s.to_string()))
    }
}

impl fmt::Display for SyncTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncTarget::Global => f.write_str("global"),
            SyncTarget::Guild(id) => write!(f, "guild {id}"),
        }
    }
}

/// Human readable listing of what is about to be published.
pub fn describe_commands(commands: &[CommandMeta]) -> String {
    let mut out = String::from("Preparing to sync:\n");
    for command in commands {
        out.push_str(&format!("- /{}: {}\n", command.name, command.description));
        for sub in &command.subcommands {
            out.push_str(&format!("  - {}: {}\n", sub.name, sub.description));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chat_gateway::SubcommandMeta;

    #[test]
    fn missing_argument_means_global() {
        assert_eq!(SyncTarget::parse(None), Ok(SyncTarget::Global));
        assert_eq!(SyncTarget::parse(Some("global")), Ok(SyncTarget::Global));
        assert_eq!(SyncTarget::Global.guild_id(), None);
    }

    #[test]
    fn numeric_argument_is_a_guild() {
        let target = SyncTarget::parse(Some("123456789012345678")).unwrap();
        assert_eq!(target, SyncTarget::Guild(123456789012345678));
        assert_eq!(target.guild_id(), Some(123456789012345678));
    }

    #[test]
    fn anything_else_is_rejected_with_usage() {
        for arg in ["GLOBAL", "12a", "", "-5", "0", "99999999999999999999999"] {
            let err = SyncTarget::parse(Some(arg)).unwrap_err();
            assert_eq!(err, UnknownSyncTarget(arg.to_string()));
        }
        assert_eq!(
            UnknownSyncTarget("guild".into()).to_string(),
            "Unknown argument \"guild\". Only a guild ID or \"global\" (default) are supported."
        );
    }

    #[test]
    fn describe_lists_commands_and_subcommands() {
        let commands = vec![
            CommandMeta::new("email", "Email related commands")
                .with_subcommand(SubcommandMeta::new("reply", "Reply to the email")),
            CommandMeta::new("ping", "Replies with Pong!"),
        ];
        assert_eq!(
            describe_commands(&commands),
            "Preparing to sync:\n- /email: Email related commands\n  - reply: Reply to the email\n- /ping: Replies with Pong!\n"
        );
    }
}
