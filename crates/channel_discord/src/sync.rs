// channel_discord/src/sync.rs
use anyhow::Context as _;
use chat_gateway::CommandMeta;
use serenity::all::{
    Command, CommandOptionType, CreateCommand, CreateCommandOption, GuildId, Http,
};
use tracing::info;

pub fn build_command(meta: &CommandMeta) -> CreateCommand {
    let mut command = CreateCommand::new(&meta.name).description(&meta.description);
    if meta.guild_only {
        command = command.dm_permission(false);
    }
    for sub in &meta.subcommands {
        command = command.add_option(CreateCommandOption::new(
            CommandOptionType::SubCommand,
            &sub.name,
            &sub.description,
        ));
    }
    command
}

/// Overwrite the published command set, globally or for one guild.
/// Returns how many commands the platform now lists.
pub async fn publish_commands(
    http: &Http,
    guild_id: Option<u64>,
    commands: &[CommandMeta],
) -> anyhow::Result<usize> {
    let app = http
        .get_current_application_info()
        .await
        .context("failed to look up the application")?;
    http.set_application_id(app.id);

    let builders: Vec<CreateCommand> = commands.iter().map(build_command).collect();
    let published = match guild_id {
        Some(guild_id) => {
            let guild = GuildId::new(guild_id);
            info!(guild_id, count = builders.len(), "publishing guild commands");
            guild
                .set_commands(http, builders)
                .await
                .with_context(|| format!("failed to publish commands to guild {guild_id}"))?
        }
        None => {
            info!(count = builders.len(), "publishing global commands");
            Command::set_global_commands(http, builders)
                .await
                .context("failed to publish global commands")?
        }
    };
    Ok(published.len())
}

/// [`publish_commands`] over a fresh REST client, for one-shot tooling that
/// never opens a gateway connection.
pub async fn publish_with_token(
    token: &str,
    guild_id: Option<u64>,
    commands: &[CommandMeta],
) -> anyhow::Result<usize> {
    let http = Http::new(token);
    publish_commands(&http, guild_id, commands).await
}
