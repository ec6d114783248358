// channel_discord/src/client.rs
use std::sync::Arc;

use anyhow::Context as _;
use chat_gateway::{ChatGateway, InteractionSink};
use serenity::all::{
    Client, Context, EventHandler, GatewayIntents, Http, Interaction as DiscordInteraction, Ready,
};
use serenity::async_trait;
use tracing::{debug, info, warn};

use crate::{convert::to_interaction, discord_gateway::DiscordGateway};

struct Handler {
    gateway: Arc<DiscordGateway>,
    sink: Arc<dyn InteractionSink>,
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, _ctx: Context, ready: Ready) {
        info!(user = %ready.user.name, guilds = ready.guilds.len(), "discord client ready");
    }

    async fn interaction_create(&self, _ctx: Context, interaction: DiscordInteraction) {
        let interaction = to_interaction(&interaction);
        debug!(
            interaction = %interaction.base().id,
            kind = %interaction.kind(),
            "interaction received"
        );
        let gateway: Arc<dyn ChatGateway> = self.gateway.clone();
        let sink = self.sink.clone();
        tokio::spawn(async move {
            sink.on_interaction(gateway, interaction).await;
        });
    }
}

/// Connect to Discord and feed every interaction to `sink`, one task per
/// event, until the process receives Ctrl-C.
pub async fn run_client(token: &str, sink: Arc<dyn InteractionSink>) -> anyhow::Result<()> {
    let http = Arc::new(Http::new(token));
    let gateway = Arc::new(DiscordGateway::new(http));
    let handler = Handler { gateway, sink };

    // message content is needed to read recorded replies back from history
    let intents = GatewayIntents::GUILDS | GatewayIntents::MESSAGE_CONTENT;
    let mut client = Client::builder(token, intents)
        .event_handler(handler)
        .await
        .context("failed to build the discord client")?;

    let shards = client.shard_manager.clone();
    tokio::spawn(async move {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!("failed to listen for shutdown signal: {err}");
            return;
        }
        info!("shutting down discord client");
        shards.shutdown_all().await;
    });

    client.start().await.context("discord client stopped")?;
    Ok(())
}
