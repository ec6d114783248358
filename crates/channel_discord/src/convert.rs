// channel_discord/src/convert.rs
use std::collections::HashMap;

use chat_gateway::{
    ButtonInteraction, CommandInteraction, Interaction, InteractionBase, ModalSubmitInteraction,
};
use serenity::all::{
    ActionRowComponent, ChannelId, CommandDataOption, CommandDataOptionValue,
    ComponentInteractionDataKind, GuildId, Interaction as DiscordInteraction, InteractionId,
    UserId,
};

fn base(
    id: InteractionId,
    token: &str,
    channel_id: ChannelId,
    guild_id: Option<GuildId>,
    user_id: UserId,
) -> InteractionBase {
    InteractionBase {
        id: id.to_string(),
        token: token.to_string(),
        channel_id: channel_id.to_string(),
        guild_id: guild_id.map(|g| g.to_string()),
        user_id: user_id.to_string(),
    }
}

/// Name of the invoked subcommand, descending into subcommand groups.
fn subcommand_name(options: &[CommandDataOption]) -> Option<String> {
    options.iter().find_map(|option| match &option.value {
        CommandDataOptionValue::SubCommand(_) => Some(option.name.clone()),
        CommandDataOptionValue::SubCommandGroup(inner) => subcommand_name(inner),
        _ => None,
    })
}

/// Decode a serenity interaction into the platform-neutral enum.
pub fn to_interaction(interaction: &DiscordInteraction) -> Interaction {
    match interaction {
        DiscordInteraction::Command(command) => Interaction::Command(CommandInteraction {
            base: base(
                command.id,
                &command.token,
                command.channel_id,
                command.guild_id,
                command.user.id,
            ),
            command_name: command.data.name.clone(),
            subcommand: subcommand_name(&command.data.options),
        }),
        DiscordInteraction::Autocomplete(command) => Interaction::Unsupported {
            base: base(
                command.id,
                &command.token,
                command.channel_id,
                command.guild_id,
                command.user.id,
            ),
            kind: "autocomplete".into(),
        },
        DiscordInteraction::Component(component) => {
            let base = base(
                component.id,
                &component.token,
                component.channel_id,
                component.guild_id,
                component.user.id,
            );
            match component.data.kind {
                ComponentInteractionDataKind::Button => Interaction::Button(ButtonInteraction {
                    base,
                    custom_id: component.data.custom_id.clone(),
                    message_id: component.message.id.to_string(),
                }),
                _ => Interaction::Unsupported {
                    base,
                    kind: "select_menu".into(),
                },
            }
        }
        DiscordInteraction::Modal(modal) => {
            let fields: HashMap<String, String> = modal
                .data
                .components
                .iter()
                .flat_map(|row| row.components.iter())
                .filter_map(|component| match component {
                    ActionRowComponent::InputText(input) => Some((
                        input.custom_id.clone(),
                        input.value.clone().unwrap_or_default(),
                    )),
                    _ => None,
                })
                .collect();
            Interaction::ModalSubmit(ModalSubmitInteraction {
                base: base(
                    modal.id,
                    &modal.token,
                    modal.channel_id,
                    modal.guild_id,
                    modal.user.id,
                ),
                custom_id: modal.data.custom_id.clone(),
                message_id: modal.message.as_ref().map(|m| m.id.to_string()),
                fields,
            })
        }
        other => Interaction::Unsupported {
            base: InteractionBase {
                id: other.id().to_string(),
                token: other.token().to_string(),
                ..InteractionBase::default()
            },
            kind: format!("{:?}", other.kind()),
        },
    }
}
