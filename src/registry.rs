//! Routes inbound interactions to the handler registered for them.

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
    time::Instant,
};

use async_trait::async_trait;
use chat_gateway::{ChatGateway, CommandMeta, Interaction, InteractionSink, MessagePayload};
use tracing::{debug, error, info, warn};

use crate::{
    command::{BotCommand, Handler, ensure_accepts},
    constants::GENERIC_ERROR_MESSAGE,
    context::InteractionContext,
    error::RegistryError,
};

/// Command name → command and interaction id → handler, both unique.
/// Built once at startup and shared read-only afterwards.
#[derive(Default)]
pub struct CommandRegistry {
    commands: HashMap<String, BotCommand>,
    interaction_handlers: HashMap<String, Arc<dyn Handler>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every command and the interaction handlers it declares.
    /// Nothing is registered when any name or id collides.
    pub fn register(
        &mut self,
        commands: impl IntoIterator<Item = BotCommand>,
    ) -> Result<(), RegistryError> {
        let commands: Vec<BotCommand> = commands.into_iter().collect();

        let mut names = HashSet::new();
        let mut ids = HashSet::new();
        for command in &commands {
            let name = command.name();
            if self.commands.contains_key(name) || !names.insert(name) {
                return Err(RegistryError::DuplicateCommandName(name.to_string()));
            }
            for custom_id in command.interaction_handlers.keys() {
                if self.interaction_handlers.contains_key(custom_id)
                    || !ids.insert(custom_id.as_str())
                {
                    return Err(RegistryError::DuplicateInteractionId(custom_id.clone()));
                }
            }
        }

        for mut command in commands {
            self.interaction_handlers
                .extend(command.interaction_handlers.drain());
            info!(command = %command.name(), "registered command");
            self.commands.insert(command.name().to_string(), command);
        }
        Ok(())
    }

    /// Published metadata of every command, sorted by name.
    pub fn command_metas(&self) -> Vec<CommandMeta> {
        let mut metas: Vec<CommandMeta> =
            self.commands.values().map(|c| c.meta.clone()).collect();
        metas.sort_by(|a, b| a.name.cmp(&b.name));
        metas
    }

    pub fn has_command(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    pub fn has_interaction_handler(&self, custom_id: &str) -> bool {
        self.interaction_handlers.contains_key(custom_id)
    }

    fn resolve(&self, interaction: &Interaction) -> Option<Arc<dyn Handler>> {
        match interaction {
            Interaction::Command(command) => {
                let found = self.commands.get(&command.command_name);
                if found.is_none() {
                    error!(command = %command.command_name, "no command \"{}\" was found", command.command_name);
                }
                found.map(|c| c.execute.clone())
            }
            Interaction::Button(_) | Interaction::ModalSubmit(_) => {
                let custom_id = interaction.route_key().unwrap_or_default();
                let found = self.interaction_handlers.get(custom_id);
                if found.is_none() {
                    error!(custom_id, "no interaction handler \"{custom_id}\" was found");
                }
                found.cloned()
            }
            Interaction::Unsupported { kind, .. } => {
                warn!(kind = %kind, "unsupported interaction type");
                None
            }
        }
    }

    /// Run the handler for `interaction`. Failures are logged and answered
    /// with a generic message; nothing is returned to the caller.
    pub async fn dispatch(&self, gateway: Arc<dyn ChatGateway>, interaction: Interaction) {
        let route = interaction.route_key().unwrap_or("-").to_string();
        let kind = interaction.kind();
        debug!(%route, %kind, channel_id = %interaction.channel_id(), "dispatching interaction");

        let Some(handler) = self.resolve(&interaction) else {
            return;
        };

        let started = Instant::now();
        let ctx = InteractionContext::new(gateway, interaction);
        let result = match ensure_accepts(handler.as_ref(), ctx.interaction()) {
            Ok(()) => handler.handle(&ctx).await,
            Err(err) => Err(err),
        };
        let elapsed = started.elapsed().as_secs_f64() * 1_000.0;

        if let Err(err) = &result {
            error!(%route, %kind, error = %err, "interaction handler failed");
            report_error(&ctx).await;
        }

        tracing::event!(
            target: "request",
            tracing::Level::INFO,
            request = %route,
            kind = %kind,
            latency_ms = elapsed,
            status = if result.is_ok() { "ok" } else { "error" },
        );
    }
}

/// Tell the invoker something went wrong, exactly once: a reply when the
/// interaction was never answered, otherwise a follow-up.
async fn report_error(ctx: &InteractionContext) {
    if let Err(err) = ctx.send(MessagePayload::content(GENERIC_ERROR_MESSAGE)).await {
        error!(error = %err, "failed to report error to invoker");
    }
}

#[async_trait]
impl InteractionSink for CommandRegistry {
    async fn on_interaction(&self, gateway: Arc<dyn ChatGateway>, interaction: Interaction) {
        self.dispatch(gateway, interaction).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HandlerError;
    use chat_gateway::{
        ButtonInteraction, CommandInteraction, InteractionBase, InteractionKind,
        InteractionResponse,
        gateway_test_util::{GatewayCall, InMemoryGateway},
    };
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Probe {
        accepts: Vec<InteractionKind>,
        calls: AtomicUsize,
        outcome: fn() -> Result<(), HandlerError>,
        answer_first: bool,
    }

    impl Probe {
        fn ok(kind: InteractionKind) -> Arc<Self> {
            Self::build(kind, || Ok(()), false)
        }

        fn failing(kind: InteractionKind, answer_first: bool) -> Arc<Self> {
            Self::build(
                kind,
                || Err(HandlerError::MissingField("subject".into())),
                answer_first,
            )
        }

        fn build(
            kind: InteractionKind,
            outcome: fn() -> Result<(), HandlerError>,
            answer_first: bool,
        ) -> Arc<Self> {
            Arc::new(Self {
                accepts: vec![kind],
                calls: AtomicUsize::new(0),
                outcome,
                answer_first,
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Handler for Probe {
        fn accepts(&self) -> &[InteractionKind] {
            &self.accepts
        }

        async fn handle(&self, ctx: &InteractionContext) -> Result<(), HandlerError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.answer_first {
                ctx.defer_update().await?;
            }
            (self.outcome)()
        }
    }

    fn base() -> InteractionBase {
        InteractionBase {
            id: "i-1".into(),
            token: "t".into(),
            channel_id: "C1".into(),
            guild_id: Some("G1".into()),
            user_id: "U1".into(),
        }
    }

    fn command(name: &str) -> Interaction {
        Interaction::Command(CommandInteraction {
            base: base(),
            command_name: name.into(),
            subcommand: None,
        })
    }

    fn button(custom_id: &str) -> Interaction {
        Interaction::Button(ButtonInteraction {
            base: base(),
            custom_id: custom_id.into(),
            message_id: "10".into(),
        })
    }

    fn command_with(
        name: &str,
        execute: Arc<dyn Handler>,
        ids: &[(&str, Arc<dyn Handler>)],
    ) -> BotCommand {
        let mut command = BotCommand::new(CommandMeta::new(name, "test"), execute);
        for (id, handler) in ids {
            command
                .interaction_handlers
                .insert(id.to_string(), handler.clone());
        }
        command
    }

    fn error_replies(gateway: &InMemoryGateway) -> usize {
        gateway
            .calls()
            .into_iter()
            .filter(|call| match call {
                GatewayCall::Respond {
                    response: InteractionResponse::Message(payload),
                    ..
                } => payload.content.as_deref() == Some(GENERIC_ERROR_MESSAGE),
                GatewayCall::FollowUp { payload, .. } => {
                    payload.content.as_deref() == Some(GENERIC_ERROR_MESSAGE)
                }
                _ => false,
            })
            .count()
    }

    #[test]
    fn duplicate_command_name_is_rejected() {
        let mut registry = CommandRegistry::new();
        registry
            .register([command_with("ping", Probe::ok(InteractionKind::Command), &[])])
            .unwrap();
        let err = registry
            .register([command_with("ping", Probe::ok(InteractionKind::Command), &[])])
            .unwrap_err();
        assert_eq!(err, RegistryError::DuplicateCommandName("ping".into()));
    }

    #[test]
    fn duplicate_interaction_id_across_commands_registers_nothing() {
        let mut registry = CommandRegistry::new();
        let shared: Arc<dyn Handler> = Probe::ok(InteractionKind::Button);
        let err = registry
            .register([
                command_with("a", Probe::ok(InteractionKind::Command), &[("x", shared.clone())]),
                command_with("b", Probe::ok(InteractionKind::Command), &[("x", shared)]),
            ])
            .unwrap_err();

        assert_eq!(err, RegistryError::DuplicateInteractionId("x".into()));
        assert!(!registry.has_command("a"));
        assert!(!registry.has_interaction_handler("x"));
    }

    #[tokio::test]
    async fn routes_commands_by_name_and_buttons_by_id() {
        let execute = Probe::ok(InteractionKind::Command);
        let click = Probe::ok(InteractionKind::Button);
        let mut registry = CommandRegistry::new();
        registry
            .register([command_with(
                "email",
                execute.clone(),
                &[("confirm", click.clone() as Arc<dyn Handler>)],
            )])
            .unwrap();
        let gateway = InMemoryGateway::new();

        registry.dispatch(gateway.clone(), command("email")).await;
        registry.dispatch(gateway.clone(), button("confirm")).await;

        assert_eq!(execute.calls(), 1);
        assert_eq!(click.calls(), 1);
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn unknown_routes_and_unsupported_kinds_are_dropped() {
        let registry = CommandRegistry::new();
        let gateway = InMemoryGateway::new();

        registry.dispatch(gateway.clone(), command("nope")).await;
        registry.dispatch(gateway.clone(), button("nope")).await;
        registry
            .dispatch(
                gateway.clone(),
                Interaction::Unsupported {
                    base: base(),
                    kind: "autocomplete".into(),
                },
            )
            .await;

        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn failure_before_any_answer_replies_once() {
        let failing = Probe::failing(InteractionKind::Command, false);
        let mut registry = CommandRegistry::new();
        registry.register([command_with("email", failing, &[])]).unwrap();
        let gateway = InMemoryGateway::new();

        registry.dispatch(gateway.clone(), command("email")).await;

        let calls = gateway.calls();
        assert_eq!(calls.len(), 1);
        assert!(matches!(calls[0], GatewayCall::Respond { .. }));
        assert_eq!(error_replies(&gateway), 1);
    }

    #[tokio::test]
    async fn failure_after_answer_follows_up_once() {
        let failing = Probe::failing(InteractionKind::Button, true);
        let mut registry = CommandRegistry::new();
        registry
            .register([command_with(
                "email",
                Probe::ok(InteractionKind::Command),
                &[("confirm", failing as Arc<dyn Handler>)],
            )])
            .unwrap();
        let gateway = InMemoryGateway::new();

        registry.dispatch(gateway.clone(), button("confirm")).await;

        let calls = gateway.calls();
        assert_eq!(calls.len(), 2);
        assert!(matches!(
            calls[0],
            GatewayCall::Respond {
                response: InteractionResponse::DeferredUpdate,
                ..
            }
        ));
        assert!(matches!(calls[1], GatewayCall::FollowUp { .. }));
        assert_eq!(error_replies(&gateway), 1);
    }

    #[tokio::test]
    async fn wrong_interaction_type_takes_the_error_path() {
        let command_only = Probe::ok(InteractionKind::Command);
        let mut registry = CommandRegistry::new();
        registry
            .register([command_with(
                "email",
                Probe::ok(InteractionKind::Command),
                &[("confirm", command_only.clone() as Arc<dyn Handler>)],
            )])
            .unwrap();
        let gateway = InMemoryGateway::new();

        registry.dispatch(gateway.clone(), button("confirm")).await;

        assert_eq!(command_only.calls(), 0);
        assert_eq!(error_replies(&gateway), 1);
    }

    #[tokio::test]
    async fn failed_error_report_is_swallowed() {
        let failing = Probe::failing(InteractionKind::Command, false);
        let mut registry = CommandRegistry::new();
        registry.register([command_with("email", failing, &[])]).unwrap();
        let gateway = InMemoryGateway::new();
        gateway.fail_next_response();

        registry.dispatch(gateway.clone(), command("email")).await;

        assert_eq!(gateway.calls().len(), 1);
    }

    #[test]
    fn metas_are_sorted_by_name() {
        let mut registry = CommandRegistry::new();
        registry
            .register([
                command_with("ping", Probe::ok(InteractionKind::Command), &[]),
                command_with("email", Probe::ok(InteractionKind::Command), &[]),
            ])
            .unwrap();
        let names: Vec<String> = registry.command_metas().into_iter().map(|m| m.name).collect();
        assert_eq!(names, vec!["email", "ping"]);
    }
}
