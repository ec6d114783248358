//! Command and interaction handler definitions, and grouping of subcommands
//! under one top-level command.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use chat_gateway::{CommandMeta, Interaction, InteractionKind, SubcommandMeta};
use tracing::debug;

use crate::{
    context::InteractionContext,
    error::{HandlerError, RegistryError},
};

#[async_trait]
pub trait Handler: Send + Sync {
    /// Interaction variants this handler can process.
    fn accepts(&self) -> &[InteractionKind];

    async fn handle(&self, ctx: &InteractionContext) -> Result<(), HandlerError>;
}

/// Opaque interaction id → handler.
pub type InteractionHandlers = HashMap<String, Arc<dyn Handler>>;

/// Fails with [`HandlerError::WrongInteractionType`] unless `handler` declared
/// the variant of `interaction`.
pub fn ensure_accepts(handler: &dyn Handler, interaction: &Interaction) -> Result<(), HandlerError> {
    let accepted = handler.accepts();
    if accepted.contains(&interaction.kind()) {
        return Ok(());
    }
    Err(HandlerError::WrongInteractionType {
        expected: accepted
            .iter()
            .map(|kind| kind.as_ref())
            .collect::<Vec<_>>()
            .join(" or "),
        actual: interaction.kind(),
    })
}

pub struct BotCommand {
    pub meta: CommandMeta,
    pub execute: Arc<dyn Handler>,
    pub interaction_handlers: InteractionHandlers,
}

impl BotCommand {
    pub fn new(meta: CommandMeta, execute: Arc<dyn Handler>) -> Self {
        Self {
            meta,
            execute,
            interaction_handlers: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.meta.name
    }
}

pub struct SubCommand {
    pub meta: SubcommandMeta,
    pub execute: Arc<dyn Handler>,
    pub interaction_handlers: InteractionHandlers,
}

/// Compose `subcommands` into one command named by `meta`. The composed
/// command routes on the invoked subcommand name and carries the merged
/// interaction handlers of every subcommand.
pub fn build_command_group(
    meta: CommandMeta,
    subcommands: Vec<SubCommand>,
) -> Result<BotCommand, RegistryError> {
    let mut group_meta = meta;
    let mut executors: HashMap<String, Arc<dyn Handler>> = HashMap::new();
    let mut interaction_handlers = InteractionHandlers::new();

    for sub in subcommands {
        if executors.contains_key(&sub.meta.name) {
            return Err(RegistryError::DuplicateSubcommandName {
                group: group_meta.name.clone(),
                name: sub.meta.name,
            });
        }
        for (custom_id, handler) in sub.interaction_handlers {
            if interaction_handlers.contains_key(&custom_id) {
                return Err(RegistryError::DuplicateInteractionId(custom_id));
            }
            interaction_handlers.insert(custom_id, handler);
        }
        executors.insert(sub.meta.name.clone(), sub.execute);
        group_meta.subcommands.push(sub.meta);
    }

    let execute = Arc::new(GroupHandler {
        group: group_meta.name.clone(),
        executors,
    });
    Ok(BotCommand {
        meta: group_meta,
        execute,
        interaction_handlers,
    })
}

struct GroupHandler {
    group: String,
    executors: HashMap<String, Arc<dyn Handler>>,
}

#[async_trait]
impl Handler for GroupHandler {
    fn accepts(&self) -> &[InteractionKind] {
        &[InteractionKind::Command]
    }

    async fn handle(&self, ctx: &InteractionContext) -> Result<(), HandlerError> {
        let command = ctx.as_command()?;
        // metadata and executors come from the same list, so this only trips
        // when the published commands are stale
        let executor = command
            .subcommand
            .as_deref()
            .and_then(|name| self.executors.get(name))
            .ok_or_else(|| HandlerError::UnknownSubcommand {
                group: self.group.clone(),
                name: command.subcommand.clone(),
            })?;
        debug!(group = %self.group, subcommand = ?command.subcommand, "routing subcommand");
        ensure_accepts(executor.as_ref(), ctx.interaction())?;
        executor.handle(ctx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chat_gateway::{CommandInteraction, InteractionBase, gateway_test_util::InMemoryGateway};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counting {
        kind: InteractionKind,
        calls: AtomicUsize,
    }

    impl Counting {
        fn new(kind: InteractionKind) -> Arc<Self> {
            Arc::new(Self {
                kind,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl Handler for Counting {
        fn accepts(&self) -> &[InteractionKind] {
            std::slice::from_ref(&self.kind)
        }

        async fn handle(&self, _ctx: &InteractionContext) -> Result<(), HandlerError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn sub(name: &str, execute: Arc<dyn Handler>, ids: &[&str]) -> SubCommand {
        SubCommand {
            meta: SubcommandMeta::new(name, format!("{name} things")),
            execute,
            interaction_handlers: ids
                .iter()
                .map(|id| {
                    (
                        id.to_string(),
                        Counting::new(InteractionKind::Button) as Arc<dyn Handler>,
                    )
                })
                .collect(),
        }
    }

    fn invoke(subcommand: Option<&str>) -> InteractionContext {
        InteractionContext::new(
            InMemoryGateway::new(),
            Interaction::Command(CommandInteraction {
                base: InteractionBase {
                    id: "1".into(),
                    channel_id: "C1".into(),
                    guild_id: Some("G1".into()),
                    ..InteractionBase::default()
                },
                command_name: "email".into(),
                subcommand: subcommand.map(str::to_string),
            }),
        )
    }

    #[test]
    fn group_lists_subcommands_and_merges_handlers() {
        let group = build_command_group(
            CommandMeta::new("email", "Email related commands"),
            vec![
                sub("reply", Counting::new(InteractionKind::Command), &["a", "b"]),
                sub("forward", Counting::new(InteractionKind::Command), &["c"]),
            ],
        )
        .unwrap();

        let names: Vec<&str> = group.meta.subcommands.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["reply", "forward"]);
        assert_eq!(group.interaction_handlers.len(), 3);
    }

    #[test]
    fn duplicate_interaction_id_inside_group_fails() {
        let result = build_command_group(
            CommandMeta::new("email", "Email related commands"),
            vec![
                sub("reply", Counting::new(InteractionKind::Command), &["shared"]),
                sub("forward", Counting::new(InteractionKind::Command), &["shared"]),
            ],
        );
        assert_eq!(
            result.err(),
            Some(RegistryError::DuplicateInteractionId("shared".into()))
        );
    }

    #[test]
    fn duplicate_subcommand_name_fails() {
        let result = build_command_group(
            CommandMeta::new("email", "Email related commands"),
            vec![
                sub("reply", Counting::new(InteractionKind::Command), &[]),
                sub("reply", Counting::new(InteractionKind::Command), &[]),
            ],
        );
        assert!(matches!(
            result.err(),
            Some(RegistryError::DuplicateSubcommandName { name, .. }) if name == "reply"
        ));
    }

    #[tokio::test]
    async fn routes_to_named_subcommand() {
        let reply = Counting::new(InteractionKind::Command);
        let forward = Counting::new(InteractionKind::Command);
        let group = build_command_group(
            CommandMeta::new("email", "Email related commands"),
            vec![
                sub("reply", reply.clone(), &[]),
                sub("forward", forward.clone(), &[]),
            ],
        )
        .unwrap();

        group.execute.handle(&invoke(Some("forward"))).await.unwrap();

        assert_eq!(reply.calls.load(Ordering::SeqCst), 0);
        assert_eq!(forward.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unknown_or_missing_subcommand_fails() {
        let group = build_command_group(
            CommandMeta::new("email", "Email related commands"),
            vec![sub("reply", Counting::new(InteractionKind::Command), &[])],
        )
        .unwrap();

        let unknown = group.execute.handle(&invoke(Some("archive"))).await;
        assert!(matches!(
            unknown,
            Err(HandlerError::UnknownSubcommand { name: Some(name), .. }) if name == "archive"
        ));

        let missing = group.execute.handle(&invoke(None)).await;
        assert!(matches!(
            missing,
            Err(HandlerError::UnknownSubcommand { name: None, .. })
        ));
    }

    #[test]
    fn accepts_check_names_expected_kinds() {
        let handler = Counting::new(InteractionKind::Button);
        let ctx = invoke(Some("reply"));
        let err = ensure_accepts(handler.as_ref(), ctx.interaction()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "handler accepts button interactions, got command"
        );
    }
}
