// channel_discord/src/lib.rs
pub mod client;
pub mod convert;
pub mod discord_gateway;
pub mod render;
pub mod sync;

pub use client::run_client;
pub use discord_gateway::DiscordGateway;
pub use sync::{publish_commands, publish_with_token};
