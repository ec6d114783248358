// src/app.rs
use std::sync::Arc;

use anyhow::{Context, Result};
use chat_gateway::CommandMeta;
use tracing::info;

use crate::{
    config::BotConfig,
    email::email_command,
    error::RegistryError,
    lock::ChannelLocks,
    ping::ping_command,
    registry::CommandRegistry,
    store::{EmailThread, InMemoryThreadStore, SqliteThreadStore, ThreadStore},
    sync::{SyncTarget, describe_commands},
};

/// Every command the bot serves, wired to `store` and `locks`.
pub fn build_registry(
    store: Arc<dyn ThreadStore>,
    locks: ChannelLocks,
) -> Result<CommandRegistry, RegistryError> {
    let mut registry = CommandRegistry::new();
    registry.register([email_command(store, locks)?, ping_command()])?;
    Ok(registry)
}

/// Published metadata of the full command set. Needs no database.
pub fn command_metas() -> Result<Vec<CommandMeta>, RegistryError> {
    let registry = build_registry(Arc::new(InMemoryThreadStore::new()), ChannelLocks::new())?;
    Ok(registry.command_metas())
}

/// Open the database, register the commands and serve interactions until
/// shutdown.
pub async fn run(config: &BotConfig) -> Result<()> {
    let store = open_store(config)?;
    let registry = build_registry(store, ChannelLocks::new())
        .context("command registration failed")?;
    info!(
        commands = ?registry.command_metas().iter().map(|c| &c.name).collect::<Vec<_>>(),
        forum_channel_id = %config.forum_channel_id,
        "mailroom starting up"
    );

    channel_discord::run_client(&config.discord_token, Arc::new(registry)).await
}

/// Overwrite the published command set. Returns how many commands the
/// platform now lists.
pub async fn sync(config: &BotConfig, target: SyncTarget) -> Result<usize> {
    let metas = command_metas().context("command registration failed")?;
    print!("{}", describe_commands(&metas));

    let count = channel_discord::publish_with_token(&config.discord_token, target.guild_id(), &metas)
        .await?;
    info!(%target, count, "commands published");
    Ok(count)
}

pub async fn list_threads(config: &BotConfig) -> Result<Vec<EmailThread>> {
    let store = open_store(config)?;
    Ok(store.list().await?)
}

/// Link a channel to an email thread so `/email reply` can be used in it.
pub async fn link_thread(config: &BotConfig, channel_id: &str, thread_id: &str) -> Result<()> {
    let store = open_store(config)?;
    store
        .insert(EmailThread::new(channel_id, thread_id))
        .await
        .with_context(|| format!("failed to link channel {channel_id} to thread {thread_id}"))?;
    info!(channel_id, thread_id, "channel linked to email thread");
    Ok(())
}

fn open_store(config: &BotConfig) -> Result<Arc<dyn ThreadStore>> {
    let store = SqliteThreadStore::open(&config.db_filename).with_context(|| {
        format!("failed to open database {}", config.db_filename.display())
    })?;
    Ok(Arc::new(store))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_serves_email_and_ping() {
        let registry =
            build_registry(Arc::new(InMemoryThreadStore::new()), ChannelLocks::new()).unwrap();
        assert!(registry.has_command("email"));
        assert!(registry.has_command("ping"));
        assert!(registry.has_interaction_handler(crate::email::reply::CONFIRM_BUTTON_ID));
    }

    #[test]
    fn metas_are_sorted_and_email_is_guild_only() {
        let metas = command_metas().unwrap();
        let names: Vec<&str> = metas.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["email", "ping"]);
        assert!(metas[0].guild_only);
        assert_eq!(metas[0].subcommands[0].name, "reply");
    }

    #[tokio::test]
    async fn link_then_list_through_sqlite() {
        let dir = tempfile::tempdir().unwrap();
        let config = BotConfig {
            discord_token: "token".into(),
            forum_channel_id: "1".into(),
            db_filename: dir.path().join("db/threads.sqlite"),
            log_level: "info".into(),
            log_dir: dir.path().join("logs"),
        };

        link_thread(&config, "C2", "T2").await.unwrap();
        link_thread(&config, "C1", "T1").await.unwrap();
        assert!(link_thread(&config, "C1", "T3").await.is_err());

        let threads = list_threads(&config).await.unwrap();
        let channels: Vec<&str> = threads.iter().map(|t| t.channel_id.as_str()).collect();
        assert_eq!(channels, vec!["C1", "C2"]);
    }
}
