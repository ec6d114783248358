// channel_discord/src/render.rs
//! Flattens contract payloads into what a classic Discord message can show:
//! top-level text becomes the content, containers become embeds and action
//! rows become button rows.

use chat_gateway::{Button, ButtonStyle, Component, MessagePayload, Modal, TextInputStyle};
use serenity::all::{
    ButtonStyle as DiscordButtonStyle, CreateActionRow, CreateAllowedMentions, CreateButton,
    CreateEmbed, CreateInputText, CreateInteractionResponseFollowup,
    CreateInteractionResponseMessage, CreateModal, EditMessage, InputTextStyle,
};

/// Discord's limit for plain message content.
pub const MAX_CONTENT_LEN: usize = 2000;
/// Discord's limit for an embed description.
pub const MAX_EMBED_LEN: usize = 4096;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RenderedMessage {
    pub content: Option<String>,
    pub embeds: Vec<String>,
    pub rows: Vec<Vec<Button>>,
    pub ephemeral: bool,
    pub suppress_mentions: bool,
}

pub fn render(payload: &MessagePayload) -> RenderedMessage {
    let mut lines: Vec<String> = payload.content.iter().cloned().collect();
    let mut embeds = Vec::new();
    let mut rows = Vec::new();

    for component in &payload.components {
        match component {
            Component::TextDisplay(text) => lines.push(text.clone()),
            Component::ActionRow(buttons) => rows.push(buttons.clone()),
            Component::Container(children) => {
                let body = component.texts().join("\n");
                embeds.push(clamp(&body, MAX_EMBED_LEN));
                rows.extend(children.iter().filter_map(|child| match child {
                    Component::ActionRow(buttons) => Some(buttons.clone()),
                    _ => None,
                }));
            }
        }
    }

    RenderedMessage {
        content: (!lines.is_empty()).then(|| clamp(&lines.join("\n"), MAX_CONTENT_LEN)),
        embeds,
        rows,
        ephemeral: payload.ephemeral,
        suppress_mentions: payload.suppress_mentions,
    }
}

fn clamp(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

fn button_style(style: ButtonStyle) -> DiscordButtonStyle {
    match style {
        ButtonStyle::Primary => DiscordButtonStyle::Primary,
        ButtonStyle::Secondary => DiscordButtonStyle::Secondary,
        ButtonStyle::Success => DiscordButtonStyle::Success,
        ButtonStyle::Danger => DiscordButtonStyle::Danger,
    }
}

impl RenderedMessage {
    fn action_rows(&self) -> Vec<CreateActionRow> {
        self.rows
            .iter()
            .map(|row| {
                CreateActionRow::Buttons(
                    row.iter()
                        .map(|button| {
                            CreateButton::new(&button.custom_id)
                                .label(&button.label)
                                .style(button_style(button.style))
                                .disabled(button.disabled)
                        })
                        .collect(),
                )
            })
            .collect()
    }

    fn create_embeds(&self) -> Vec<CreateEmbed> {
        self.embeds
            .iter()
            .map(|body| CreateEmbed::new().description(body))
            .collect()
    }

    fn content_or_empty(&self) -> String {
        self.content.clone().unwrap_or_default()
    }

    /// Body of an initial response or of an in-place update. Every part is
    /// set so an update replaces the whole message.
    pub fn to_response_message(&self) -> CreateInteractionResponseMessage {
        let mut message = CreateInteractionResponseMessage::new()
            .content(self.content_or_empty())
            .embeds(self.create_embeds())
            .components(self.action_rows())
            .ephemeral(self.ephemeral);
        if self.suppress_mentions {
            message = message.allowed_mentions(CreateAllowedMentions::new());
        }
        message
    }

    pub fn to_followup(&self) -> CreateInteractionResponseFollowup {
        let mut followup = CreateInteractionResponseFollowup::new()
            .content(self.content_or_empty())
            .embeds(self.create_embeds())
            .components(self.action_rows())
            .ephemeral(self.ephemeral);
        if self.suppress_mentions {
            followup = followup.allowed_mentions(CreateAllowedMentions::new());
        }
        followup
    }

    pub fn to_edit(&self) -> EditMessage {
        let mut edit = EditMessage::new()
            .content(self.content_or_empty())
            .embeds(self.create_embeds())
            .components(self.action_rows());
        if self.suppress_mentions {
            edit = edit.allowed_mentions(CreateAllowedMentions::new());
        }
        edit
    }
}

pub fn render_modal(modal: &Modal) -> CreateModal {
    let inputs = modal
        .inputs
        .iter()
        .map(|input| {
            let style = match input.style {
                TextInputStyle::Short => InputTextStyle::Short,
                TextInputStyle::Paragraph => InputTextStyle::Paragraph,
            };
            let mut text = CreateInputText::new(style, &input.label, &input.custom_id)
                .required(input.required);
            if let Some(placeholder) = &input.placeholder {
                text = text.placeholder(placeholder);
            }
            CreateActionRow::InputText(text)
        })
        .collect();
    CreateModal::new(&modal.custom_id, &modal.title).components(inputs)
}
