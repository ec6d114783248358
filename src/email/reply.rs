//! Recording a reply to an email thread from chat messages.
//!
//! `/email reply` posts a prompt and stores its message id as the channel's
//! recording marker. Everything said in the channel after the prompt becomes
//! the draft. Confirming collects and previews the draft, and the send button
//! asks for a subject line before handing the draft off.

use std::sync::Arc;

use async_trait::async_trait;
use chat_gateway::{
    Button, ButtonStyle, Component, InteractionKind, MessagePayload, MessageRange, Modal,
    Permissions, SubcommandMeta, TextInput, TextInputStyle,
};
use tracing::{info, warn};

use crate::{
    command::{Handler, InteractionHandlers, SubCommand},
    constants::{Emojis, MAX_MESSAGE_STRING_LENGTH},
    context::InteractionContext,
    error::HandlerError,
    lock::ChannelLocks,
    store::ThreadStore,
};

pub const CONFIRM_BUTTON_ID: &str = "email-reply-confirm";
pub const CANCEL_BUTTON_ID: &str = "email-reply-cancel";
pub const SEND_BUTTON_ID: &str = "email-reply-send";
pub const SEND_MODAL_ID: &str = "email-reply-modal";
pub const SUBJECT_FIELD_ID: &str = "subject";

pub const ALREADY_RECORDING: &str = "A reply is already being recorded.";
pub const PERMISSIONS_MISSING: &str =
    "Permissions missing. Need \"View Channel\" and \"Read Message History\".";
pub const NOT_AN_EMAIL_THREAD: &str = "This channel is not an active email thread.";
pub const NO_CONTENT: &str = "No content found to send in reply.";

const REQUIRED_PERMISSIONS: Permissions =
    Permissions(Permissions::VIEW_CHANNEL.0 | Permissions::READ_MESSAGE_HISTORY.0);

fn confirm_button() -> Button {
    Button::new(
        CONFIRM_BUTTON_ID,
        format!("{} Send Reply", Emojis::OUTBOX),
        ButtonStyle::Success,
    )
}

fn cancel_button() -> Button {
    Button::new(
        CANCEL_BUTTON_ID,
        format!("{} Cancel", Emojis::CROSS),
        ButtonStyle::Danger,
    )
}

fn send_button() -> Button {
    Button::new(
        SEND_BUTTON_ID,
        format!("{} Confirm Send", Emojis::OUTBOX),
        ButtonStyle::Success,
    )
}

fn send_modal() -> Modal {
    Modal {
        custom_id: SEND_MODAL_ID.into(),
        title: "Send Email".into(),
        inputs: vec![TextInput {
            custom_id: SUBJECT_FIELD_ID.into(),
            label: "Subject".into(),
            style: TextInputStyle::Short,
            placeholder: Some("Email subject line".into()),
            required: true,
        }],
    }
}

/// The recording prompt with its two controls.
fn prompt(text: &str, enabled: bool) -> MessagePayload {
    let buttons = if enabled {
        vec![confirm_button(), cancel_button()]
    } else {
        vec![confirm_button().to_disabled(), cancel_button().to_disabled()]
    };
    MessagePayload::components(vec![Component::text(text), Component::ActionRow(buttons)])
}

fn not_allowed(text: &str) -> MessagePayload {
    MessagePayload::content(format!("{} {text}", Emojis::NO_ENTRY)).ephemeral()
}

/// Cut `draft` to the message limit, in characters, marking the cut with `...`.
pub fn truncate_draft(draft: &str) -> String {
    match draft.char_indices().nth(MAX_MESSAGE_STRING_LENGTH) {
        Some((cut, _)) => format!("{}...", &draft[..cut]),
        None => draft.to_string(),
    }
}

/// Drives the recording workflow for every channel. Cheap to clone.
#[derive(Clone)]
pub struct ReplyRecorder {
    store: Arc<dyn ThreadStore>,
    locks: ChannelLocks,
}

impl ReplyRecorder {
    pub fn new(store: Arc<dyn ThreadStore>, locks: ChannelLocks) -> Self {
        Self { store, locks }
    }

    /// The `reply` subcommand together with the handlers for its controls.
    pub fn subcommand(self) -> SubCommand {
        let step = |step: Step| -> Arc<dyn Handler> {
            Arc::new(ReplyStep {
                recorder: self.clone(),
                step,
            })
        };
        let interaction_handlers: InteractionHandlers = [
            (CONFIRM_BUTTON_ID, Step::Confirm),
            (CANCEL_BUTTON_ID, Step::Cancel),
            (SEND_BUTTON_ID, Step::RequestSubject),
            (SEND_MODAL_ID, Step::Submit),
        ]
        .into_iter()
        .map(|(id, s)| (id.to_string(), step(s)))
        .collect();

        SubCommand {
            meta: SubcommandMeta::new("reply", "Reply to the email"),
            execute: step(Step::Start),
            interaction_handlers,
        }
    }

    /// `/email reply`: claim the channel and post the recording prompt.
    pub async fn start(&self, ctx: &InteractionContext) -> Result<(), HandlerError> {
        let channel_id = ctx.channel_id().to_string();
        let Some(guard) = self.locks.try_acquire(&channel_id) else {
            ctx.reply(not_allowed(ALREADY_RECORDING)).await?;
            return Ok(());
        };

        let guild_id = ctx
            .guild_id()
            .ok_or_else(|| HandlerError::GuildUnavailable(channel_id.clone()))?;
        let channel = match ctx.gateway().fetch_channel(guild_id, &channel_id).await {
            Ok(channel) => channel,
            Err(err) => {
                warn!(%channel_id, error = %err, "could not fetch channel");
                None
            }
        };
        let usable = channel
            .is_some_and(|c| c.text_based && c.bot_permissions.contains(REQUIRED_PERMISSIONS));
        if !usable {
            ctx.reply(not_allowed(PERMISSIONS_MISSING)).await?;
            return Ok(());
        }

        let Some(thread) = self.store.get(&channel_id).await? else {
            drop(guard);
            ctx.reply(not_allowed(NOT_AN_EMAIL_THREAD)).await?;
            return Ok(());
        };
        if thread.is_recording() {
            ctx.reply(not_allowed(ALREADY_RECORDING)).await?;
            return Ok(());
        }

        let prompt_id = ctx
            .reply(prompt("Recording reply...", true))
            .await?
            .ok_or_else(|| HandlerError::MissingRecordingMessageId(channel_id.clone()))?;
        self.store
            .set_recording_marker(&channel_id, Some(&prompt_id))
            .await?;
        info!(%channel_id, thread_id = %thread.thread_id, %prompt_id, "recording reply");
        Ok(())
    }

    /// Cancel button: forget the recording and retire the prompt.
    pub async fn cancel(&self, ctx: &InteractionContext) -> Result<(), HandlerError> {
        ctx.as_button()?;
        let channel_id = ctx.channel_id();
        self.store.set_recording_marker(channel_id, None).await?;
        ctx.update(prompt("Reply cancelled.", false)).await?;
        info!(%channel_id, "reply recording cancelled");
        Ok(())
    }

    /// Confirm button: collect everything said since the prompt and preview it.
    pub async fn confirm(&self, ctx: &InteractionContext) -> Result<(), HandlerError> {
        ctx.as_button()?;
        let channel_id = ctx.channel_id();
        let prompt_id = self
            .store
            .get(channel_id)
            .await?
            .and_then(|thread| thread.recording_message_id)
            .ok_or_else(|| HandlerError::MissingRecordingMarker(channel_id.to_string()))?;

        ctx.gateway()
            .edit_message(channel_id, &prompt_id, prompt("Preparing reply...", false))
            .await?;
        let acknowledged_id = ctx.defer_update().await?;

        let messages = ctx
            .gateway()
            .fetch_messages(
                channel_id,
                MessageRange {
                    after: prompt_id,
                    before: acknowledged_id,
                },
            )
            .await?;
        // platforms return newest first
        let draft: String = messages
            .iter()
            .rev()
            .map(|message| format!("{}\n", message.content))
            .collect();
        if draft.is_empty() {
            ctx.follow_up(MessagePayload::content(format!("{} {NO_CONTENT}", Emojis::CROSS)))
                .await?;
            return Ok(());
        }

        let preview = MessagePayload::components(vec![
            Component::text("Sending:"),
            Component::Container(vec![Component::text(truncate_draft(&draft))]),
            Component::ActionRow(vec![send_button()]),
        ])
        .without_mentions();
        ctx.follow_up(preview).await?;
        info!(%channel_id, messages = messages.len(), "reply draft ready for review");
        Ok(())
    }

    /// Send button: ask for a subject line.
    pub async fn request_subject(&self, ctx: &InteractionContext) -> Result<(), HandlerError> {
        ctx.as_button()?;
        ctx.show_modal(send_modal()).await?;
        Ok(())
    }

    /// Subject form submitted.
    pub async fn submit(&self, ctx: &InteractionContext) -> Result<(), HandlerError> {
        let form = ctx.as_modal_submit()?;
        let subject = form
            .field(SUBJECT_FIELD_ID)
            .ok_or_else(|| HandlerError::MissingField(SUBJECT_FIELD_ID.to_string()))?;

        // TODO: clear the recording marker once a real email transport confirms delivery.
        ctx.update(MessagePayload::components(vec![Component::text(format!(
            "Sending email \"{subject}\""
        ))]))
        .await?;
        info!(channel_id = %ctx.channel_id(), %subject, "reply submitted");
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Start,
    Confirm,
    Cancel,
    RequestSubject,
    Submit,
}

struct ReplyStep {
    recorder: ReplyRecorder,
    step: Step,
}

#[async_trait]
impl Handler for ReplyStep {
    fn accepts(&self) -> &[InteractionKind] {
        match self.step {
            Step::Start => &[InteractionKind::Command],
            Step::Confirm | Step::Cancel | Step::RequestSubject => &[InteractionKind::Button],
            Step::Submit => &[InteractionKind::ModalSubmit],
        }
    }

    async fn handle(&self, ctx: &InteractionContext) -> Result<(), HandlerError> {
        match self.step {
            Step::Start => self.recorder.start(ctx).await,
            Step::Confirm => self.recorder.confirm(ctx).await,
            Step::Cancel => self.recorder.cancel(ctx).await,
            Step::RequestSubject => self.recorder.request_subject(ctx).await,
            Step::Submit => self.recorder.submit(ctx).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draft_at_limit_is_untouched() {
        let draft = "a".repeat(MAX_MESSAGE_STRING_LENGTH);
        assert_eq!(truncate_draft(&draft), draft);
    }

    #[test]
    fn draft_over_limit_is_cut_and_marked() {
        let draft = "a".repeat(MAX_MESSAGE_STRING_LENGTH + 1);
        let truncated = truncate_draft(&draft);
        assert_eq!(truncated.len(), MAX_MESSAGE_STRING_LENGTH + 3);
        assert!(truncated.ends_with("..."));
        assert_eq!(&truncated[..MAX_MESSAGE_STRING_LENGTH], &draft[..MAX_MESSAGE_STRING_LENGTH]);
    }

    #[test]
    fn truncation_counts_characters_not_bytes() {
        let draft = "é".repeat(MAX_MESSAGE_STRING_LENGTH + 1);
        let truncated = truncate_draft(&draft);
        assert_eq!(truncated.chars().count(), MAX_MESSAGE_STRING_LENGTH + 3);
    }

    #[test]
    fn prompt_controls_follow_enabled_flag() {
        let live = prompt("Recording reply...", true);
        assert!(live.buttons().iter().all(|b| !b.disabled));
        let ids: Vec<&str> = live.buttons().iter().map(|b| b.custom_id.as_str()).collect();
        assert_eq!(ids, vec![CONFIRM_BUTTON_ID, CANCEL_BUTTON_ID]);

        let retired = prompt("Reply cancelled.", false);
        assert!(retired.buttons().iter().all(|b| b.disabled));
        assert_eq!(retired.texts(), vec!["Reply cancelled."]);
    }

    #[test]
    fn subcommand_declares_every_control() {
        let recorder = ReplyRecorder::new(
            Arc::new(crate::store::InMemoryThreadStore::new()),
            ChannelLocks::new(),
        );
        let sub = recorder.subcommand();
        assert_eq!(sub.meta.name, "reply");
        let mut ids: Vec<&str> = sub.interaction_handlers.keys().map(String::as_str).collect();
        ids.sort();
        assert_eq!(
            ids,
            vec![CANCEL_BUTTON_ID, CONFIRM_BUTTON_ID, SEND_MODAL_ID, SEND_BUTTON_ID]
        );
        assert_eq!(sub.execute.accepts(), &[InteractionKind::Command]);
    }
}
