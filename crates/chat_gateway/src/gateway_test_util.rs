// chat_gateway/src/gateway_test_util.rs
//! In-process [`ChatGateway`] for tests: keeps channel history in memory,
//! hands out ordered numeric message ids and records every call it receives.

use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
};

use async_trait::async_trait;
use dashmap::DashMap;

use crate::{
    gateway::{ChatGateway, GatewayError, InteractionResponse, MessageRange},
    interaction::Interaction,
    message::{ChannelInfo, ChatMessage, MessagePayload, Permissions},
};

pub const BOT_USER_ID: &str = "bot";

/// One observed gateway call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayCall {
    FetchChannel { channel_id: String },
    FetchMessages { channel_id: String, range: MessageRange },
    EditMessage { channel_id: String, message_id: String, payload: MessagePayload },
    Respond { interaction_id: String, response: InteractionResponse },
    FollowUp { interaction_id: String, payload: MessagePayload },
}

pub struct InMemoryGateway {
    channels: DashMap<String, ChannelInfo>,
    history: Mutex<HashMap<String, Vec<ChatMessage>>>, // oldest first
    next_id: AtomicU64,
    calls: Mutex<Vec<GatewayCall>>,
    fail_next_response: AtomicBool,
}

impl InMemoryGateway {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            channels: DashMap::new(),
            history: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1_000),
            calls: Mutex::new(Vec::new()),
            fail_next_response: AtomicBool::new(false),
        })
    }

    /// Register a text channel where the bot holds `permissions`.
    pub fn add_text_channel(&self, channel_id: &str, permissions: Permissions) {
        self.channels.insert(
            channel_id.to_string(),
            ChannelInfo {
                id: channel_id.to_string(),
                text_based: true,
                bot_permissions: permissions,
            },
        );
    }

    pub fn add_channel(&self, info: ChannelInfo) {
        self.channels.insert(info.id.clone(), info);
    }

    /// Simulate a user posting in a channel. Returns the new message id.
    pub fn post_message(&self, channel_id: &str, author_id: &str, content: &str) -> String {
        let id = self.allocate_id();
        self.history
            .lock()
            .unwrap()
            .entry(channel_id.to_string())
            .or_default()
            .push(ChatMessage {
                id: id.clone(),
                channel_id: channel_id.to_string(),
                author_id: author_id.to_string(),
                content: content.to_string(),
            });
        id
    }

    /// Channel history, oldest first.
    pub fn messages(&self, channel_id: &str) -> Vec<ChatMessage> {
        self.history
            .lock()
            .unwrap()
            .get(channel_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn message(&self, channel_id: &str, message_id: &str) -> Option<ChatMessage> {
        self.messages(channel_id)
            .into_iter()
            .find(|m| m.id == message_id)
    }

    pub fn calls(&self) -> Vec<GatewayCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Initial responses, in order.
    pub fn responses(&self) -> Vec<InteractionResponse> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                GatewayCall::Respond { response, .. } => Some(response),
                _ => None,
            })
            .collect()
    }

    pub fn follow_ups(&self) -> Vec<MessagePayload> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                GatewayCall::FollowUp { payload, .. } => Some(payload),
                _ => None,
            })
            .collect()
    }

    pub fn edits(&self) -> Vec<(String, MessagePayload)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                GatewayCall::EditMessage { message_id, payload, .. } => Some((message_id, payload)),
                _ => None,
            })
            .collect()
    }

    /// Make the next `respond` call fail with a transport error.
    pub fn fail_next_response(&self) {
        self.fail_next_response.store(true, Ordering::SeqCst);
    }

    fn allocate_id(&self) -> String {
        self.next_id.fetch_add(1, Ordering::SeqCst).to_string()
    }

    fn record(&self, call: GatewayCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn post_bot_message(&self, channel_id: &str, payload: &MessagePayload) -> String {
        let content = payload.texts().join("\n");
        if payload.ephemeral {
            // visible to the invoker only, never part of channel history
            return self.allocate_id();
        }
        self.post_message(channel_id, BOT_USER_ID, &content)
    }

    fn replace_message(
        &self,
        channel_id: &str,
        message_id: &str,
        payload: &MessagePayload,
    ) -> Result<(), GatewayError> {
        let mut history = self.history.lock().unwrap();
        let message = history
            .get_mut(channel_id)
            .and_then(|messages| messages.iter_mut().find(|m| m.id == message_id))
            .ok_or_else(|| GatewayError::NotFound(format!("message {message_id}")))?;
        message.content = payload.texts().join("\n");
        Ok(())
    }
}

fn id_order(id: &str) -> u64 {
    id.parse().unwrap_or(u64::MAX)
}

#[async_trait]
impl ChatGateway for InMemoryGateway {
    fn name(&self) -> &str {
        "in-memory"
    }

    async fn fetch_channel(
        &self,
        _guild_id: &str,
        channel_id: &str,
    ) -> Result<Option<ChannelInfo>, GatewayError> {
        self.record(GatewayCall::FetchChannel {
            channel_id: channel_id.to_string(),
        });
        // give concurrent handlers a chance to interleave, like a real round trip would
        tokio::task::yield_now().await;
        Ok(self.channels.get(channel_id).map(|entry| entry.value().clone()))
    }

    async fn fetch_messages(
        &self,
        channel_id: &str,
        range: MessageRange,
    ) -> Result<Vec<ChatMessage>, GatewayError> {
        self.record(GatewayCall::FetchMessages {
            channel_id: channel_id.to_string(),
            range: range.clone(),
        });
        let after = id_order(&range.after);
        let before = range.before.as_deref().map(id_order);
        let mut found: Vec<ChatMessage> = self
            .messages(channel_id)
            .into_iter()
            .filter(|m| {
                let id = id_order(&m.id);
                id > after && before.is_none_or(|b| id < b)
            })
            .collect();
        found.reverse();
        Ok(found)
    }

    async fn edit_message(
        &self,
        channel_id: &str,
        message_id: &str,
        payload: MessagePayload,
    ) -> Result<(), GatewayError> {
        self.record(GatewayCall::EditMessage {
            channel_id: channel_id.to_string(),
            message_id: message_id.to_string(),
            payload: payload.clone(),
        });
        self.replace_message(channel_id, message_id, &payload)
    }

    async fn respond(
        &self,
        interaction: &Interaction,
        response: InteractionResponse,
    ) -> Result<Option<String>, GatewayError> {
        self.record(GatewayCall::Respond {
            interaction_id: interaction.base().id.clone(),
            response: response.clone(),
        });
        if self.fail_next_response.swap(false, Ordering::SeqCst) {
            return Err(GatewayError::Transport("simulated failure".into()));
        }
        let channel_id = interaction.channel_id();
        match response {
            InteractionResponse::Message(payload) => {
                Ok(Some(self.post_bot_message(channel_id, &payload)))
            }
            InteractionResponse::UpdateMessage(payload) => {
                let message_id = match interaction {
                    Interaction::Button(button) => Some(button.message_id.clone()),
                    Interaction::ModalSubmit(modal) => modal.message_id.clone(),
                    _ => None,
                }
                .ok_or_else(|| {
                    GatewayError::Unsupported("update without a source message".into())
                })?;
                self.replace_message(channel_id, &message_id, &payload)?;
                Ok(Some(message_id))
            }
            // the acknowledgment marks "now" in the channel timeline
            InteractionResponse::DeferredUpdate => Ok(Some(self.allocate_id())),
            InteractionResponse::Modal(_) => Ok(None),
        }
    }

    async fn follow_up(
        &self,
        interaction: &Interaction,
        payload: MessagePayload,
    ) -> Result<Option<String>, GatewayError> {
        self.record(GatewayCall::FollowUp {
            interaction_id: interaction.base().id.clone(),
            payload: payload.clone(),
        });
        Ok(Some(self.post_bot_message(interaction.channel_id(), &payload)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fetch_messages_is_exclusive_and_newest_first() {
        let gateway = InMemoryGateway::new();
        let first = gateway.post_message("C1", "u", "a");
        gateway.post_message("C1", "u", "b");
        gateway.post_message("C1", "u", "c");
        let last = gateway.post_message("C1", "u", "d");

        let found = gateway
            .fetch_messages(
                "C1",
                MessageRange {
                    after: first,
                    before: Some(last),
                },
            )
            .await
            .unwrap();

        let contents: Vec<&str> = found.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["c", "b"]);
    }

    #[tokio::test]
    async fn unknown_channel_is_none() {
        let gateway = InMemoryGateway::new();
        assert!(gateway.fetch_channel("G1", "missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn editing_unknown_message_fails() {
        let gateway = InMemoryGateway::new();
        let err = gateway
            .edit_message("C1", "42", MessagePayload::content("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::NotFound(_)));
    }
}
