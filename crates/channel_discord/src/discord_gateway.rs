// channel_discord/src/discord_gateway.rs
use std::{cmp::Reverse, sync::Arc};

use async_trait::async_trait;
use chat_gateway::{
    ChannelInfo, ChatGateway, ChatMessage, GatewayError, Interaction, InteractionResponse,
    MessagePayload, MessageRange, Permissions,
};
use serenity::all::{
    Channel, ChannelId, ChannelType, CreateInteractionResponse, GetMessages, GuildChannel, GuildId,
    Http, InteractionId, Message, MessageId, UserId,
};
use tokio::sync::OnceCell;
use tracing::{debug, trace, warn};

use crate::render::{render, render_modal};

/// Largest page Discord serves for channel history.
const PAGE_SIZE: u8 = 100;
/// Upper bound on history pages read for a single range.
const MAX_PAGES: usize = 20;

/// [`ChatGateway`] over serenity's REST client.
pub struct DiscordGateway {
    http: Arc<Http>,
    bot_user: OnceCell<UserId>,
}

impl DiscordGateway {
    pub fn new(http: Arc<Http>) -> Self {
        Self {
            http,
            bot_user: OnceCell::new(),
        }
    }

    async fn bot_user_id(&self) -> Result<UserId, GatewayError> {
        self.bot_user
            .get_or_try_init(|| async {
                self.http
                    .get_current_user()
                    .await
                    .map(|user| user.id)
                    .map_err(transport)
            })
            .await
            .copied()
    }

    /// Channel whose overwrites decide access: threads defer to their parent.
    async fn permission_scope(&self, channel: GuildChannel) -> Result<GuildChannel, GatewayError> {
        let parent = match (channel.thread_metadata.is_some(), channel.parent_id) {
            (true, Some(parent)) => parent,
            _ => return Ok(channel),
        };
        match self.http.get_channel(parent).await.map_err(transport)? {
            Channel::Guild(parent) => Ok(parent),
            _ => Ok(channel),
        }
    }
}

fn parse_id(kind: &str, raw: &str) -> Result<u64, GatewayError> {
    raw.parse::<u64>()
        .ok()
        .filter(|id| *id != 0)
        .ok_or_else(|| GatewayError::NotFound(format!("invalid {kind} id {raw:?}")))
}

fn transport(err: serenity::Error) -> GatewayError {
    if let serenity::Error::Http(http) = &err {
        if http.status_code().map(|code| code.as_u16()) == Some(404) {
            return GatewayError::NotFound(err.to_string());
        }
    }
    GatewayError::Transport(err.to_string())
}

/// Where the next history page starts, or `None` once the range is covered:
/// a short page means the channel has nothing newer, and a page reaching
/// `before` means the rest is out of range.
fn next_cursor(page_len: usize, newest: Option<MessageId>, before: Option<u64>) -> Option<MessageId> {
    newest.filter(|id| page_len == PAGE_SIZE as usize && before.is_none_or(|b| id.get() < b))
}

/// Position in the channel timeline a message-less response stands for.
///
/// An update rewrites the component's own message. A deferred update posts
/// nothing, so the interaction id, a snowflake minted at the click, marks it.
fn acknowledged_message_id(
    response: &InteractionResponse,
    interaction: &Interaction,
) -> Option<String> {
    match (response, interaction) {
        (InteractionResponse::UpdateMessage(_), Interaction::Button(button)) => {
            Some(button.message_id.clone())
        }
        (InteractionResponse::UpdateMessage(_), Interaction::ModalSubmit(modal)) => {
            modal.message_id.clone()
        }
        (InteractionResponse::DeferredUpdate, _) => Some(interaction.base().id.clone()),
        _ => None,
    }
}

fn is_text_based(kind: ChannelType) -> bool {
    matches!(
        kind,
        ChannelType::Text
            | ChannelType::News
            | ChannelType::Voice
            | ChannelType::Stage
            | ChannelType::PublicThread
            | ChannelType::PrivateThread
            | ChannelType::NewsThread
    )
}

fn to_chat_message(message: Message) -> ChatMessage {
    ChatMessage {
        id: message.id.to_string(),
        channel_id: message.channel_id.to_string(),
        author_id: message.author.id.to_string(),
        content: message.content,
    }
}

#[async_trait]
impl ChatGateway for DiscordGateway {
    fn name(&self) -> &str {
        "discord"
    }

    async fn fetch_channel(
        &self,
        guild_id: &str,
        channel_id: &str,
    ) -> Result<Option<ChannelInfo>, GatewayError> {
        let guild_id = GuildId::new(parse_id("guild", guild_id)?);
        let channel_id = ChannelId::new(parse_id("channel", channel_id)?);

        let channel = match self.http.get_channel(channel_id).await {
            Ok(Channel::Guild(channel)) if channel.guild_id == guild_id => channel,
            Ok(_) => return Ok(None),
            Err(err) => {
                return match transport(err) {
                    GatewayError::NotFound(_) => Ok(None),
                    other => Err(other),
                };
            }
        };
        let text_based = is_text_based(channel.kind);
        let id = channel.id.to_string();

        let scope = self.permission_scope(channel).await?;
        let guild = self.http.get_guild(guild_id).await.map_err(transport)?;
        let member = self
            .http
            .get_member(guild_id, self.bot_user_id().await?)
            .await
            .map_err(transport)?;
        let permissions = guild.user_permissions_in(&scope, &member);
        trace!(channel_id = %id, permissions = permissions.bits(), "resolved channel permissions");

        Ok(Some(ChannelInfo {
            id,
            text_based,
            bot_permissions: Permissions(permissions.bits()),
        }))
    }

    async fn fetch_messages(
        &self,
        channel_id: &str,
        range: MessageRange,
    ) -> Result<Vec<ChatMessage>, GatewayError> {
        let channel = ChannelId::new(parse_id("channel", channel_id)?);
        let mut cursor = MessageId::new(parse_id("message", &range.after)?);
        let before = range
            .before
            .as_deref()
            .map(|raw| parse_id("message", raw))
            .transpose()?;
        let in_range = |id: MessageId| before.is_none_or(|b| id.get() < b);

        let mut collected: Vec<Message> = Vec::new();
        let mut pages = 0;
        loop {
            if pages == MAX_PAGES {
                warn!(
                    channel_id,
                    pages,
                    count = collected.len(),
                    "history page limit reached, later messages are left out"
                );
                break;
            }
            let batch = channel
                .messages(
                    self.http.as_ref(),
                    GetMessages::new().after(cursor).limit(PAGE_SIZE),
                )
                .await
                .map_err(transport)?;
            pages += 1;
            let next = next_cursor(batch.len(), batch.iter().map(|m| m.id).max(), before);
            collected.extend(batch.into_iter().filter(|m| in_range(m.id)));
            match next {
                Some(id) => cursor = id,
                None => break,
            }
        }
        collected.sort_by_key(|m| Reverse(m.id));
        debug!(channel_id, count = collected.len(), "fetched channel history");
        Ok(collected.into_iter().map(to_chat_message).collect())
    }

    async fn edit_message(
        &self,
        channel_id: &str,
        message_id: &str,
        payload: MessagePayload,
    ) -> Result<(), GatewayError> {
        let channel = ChannelId::new(parse_id("channel", channel_id)?);
        let message = MessageId::new(parse_id("message", message_id)?);
        channel
            .edit_message(self.http.as_ref(), message, render(&payload).to_edit())
            .await
            .map_err(transport)?;
        Ok(())
    }

    async fn respond(
        &self,
        interaction: &Interaction,
        response: InteractionResponse,
    ) -> Result<Option<String>, GatewayError> {
        let base = interaction.base();
        let interaction_id = InteractionId::new(parse_id("interaction", &base.id)?);
        trace!(interaction = %base.id, response = response.name(), "sending interaction response");

        let (create, posts_message) = match &response {
            InteractionResponse::Message(payload) => (
                CreateInteractionResponse::Message(render(payload).to_response_message()),
                true,
            ),
            InteractionResponse::UpdateMessage(payload) => (
                CreateInteractionResponse::UpdateMessage(render(payload).to_response_message()),
                false,
            ),
            InteractionResponse::DeferredUpdate => (CreateInteractionResponse::Acknowledge, false),
            InteractionResponse::Modal(modal) => {
                (CreateInteractionResponse::Modal(render_modal(modal)), false)
            }
        };
        self.http
            .create_interaction_response(interaction_id, &base.token, &create, Vec::new())
            .await
            .map_err(transport)?;

        if posts_message {
            let original = self
                .http
                .get_original_interaction_response(&base.token)
                .await
                .map_err(transport)?;
            return Ok(Some(original.id.to_string()));
        }
        Ok(acknowledged_message_id(&response, interaction))
    }

    async fn follow_up(
        &self,
        interaction: &Interaction,
        payload: MessagePayload,
    ) -> Result<Option<String>, GatewayError> {
        let message = self
            .http
            .create_followup_message(
                &interaction.base().token,
                &render(&payload).to_followup(),
                Vec::new(),
            )
            .await
            .map_err(transport)?;
        Ok(Some(message.id.to_string()))
    }
}
