//! Interaction dispatcher - resolves, checks, executes and reports each interaction

use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::Instrument;

use crate::application::errors::CommandError;
use crate::application::services::ReadyRegistry;
use crate::domain::entities::{CommandArgs, CommandRegistry, Interaction, InteractionEvent};
use crate::domain::traits::Platform;
use super::classifier::{Classified, ErrorClassifier, ExecutionOutcome, Failure, FailureKind};
use super::context::CommandContext;
use super::preconditions::{self, PreconditionResult};
use super::router::ResponseRouter;

/// Replaces the "thinking" placeholder of a deferred command that finished silently
pub const COMPLETED_MESSAGE: &str = "Done.";

/// Steps of the per-interaction pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    Idle,
    Resolving,
    CheckingPreconditions,
    Executing,
    Completed,
    Failed(FailureKind),
}

impl fmt::Display for DispatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchState::Failed(kind) => write!(f, "Failed({})", kind),
            other => write!(f, "{:?}", other),
        }
    }
}

/// Tunables for the dispatcher
#[derive(Debug, Clone)]
pub struct DispatchSettings {
    /// Platform's acknowledgment window, counted from receipt. Not enforced;
    /// a command that returns after it without having replied is reported as
    /// a fault.
    pub ack_deadline: Option<Duration>,
    /// Deferred acknowledgments are only visible to the caller
    pub ephemeral_defer: bool,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            ack_deadline: Some(Duration::from_secs(3)),
            ephemeral_defer: false,
        }
    }
}

/// Routes inbound interactions to their handlers.
///
/// Only constructible from a [`ReadyRegistry`], i.e. after the command set
/// has been published.
pub struct Dispatcher {
    registry: Arc<CommandRegistry>,
    router: ResponseRouter,
    settings: DispatchSettings,
}

impl Dispatcher {
    pub fn new(ready: ReadyRegistry, platform: Arc<dyn Platform>) -> Self {
        tracing::debug!("Dispatcher serving commands published to {}", ready.scope());
        Self {
            registry: ready.into_registry(),
            router: ResponseRouter::new(platform),
            settings: DispatchSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: DispatchSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Consume gateway events until the channel closes, one task per interaction.
    pub async fn run(self: Arc<Self>, mut events: mpsc::Receiver<InteractionEvent>) {
        tracing::info!("Dispatch loop accepting interactions");

        while let Some(event) = events.recv().await {
            let dispatcher = Arc::clone(&self);
            tokio::spawn(async move {
                dispatcher.dispatch(event).await;
            });
        }

        tracing::info!("Gateway channel closed, dispatch loop stopped");
    }

    /// Run one interaction through the whole pipeline
    pub async fn dispatch(&self, event: InteractionEvent) -> ExecutionOutcome {
        let interaction = Arc::new(Interaction::from_event(event));
        let span = tracing::info_span!(
            "interaction",
            id = interaction.id(),
            kind = interaction.kind().label(),
            user = interaction.user_id()
        );
        self.process(interaction).instrument(span).await
    }

    async fn process(&self, interaction: Arc<Interaction>) -> ExecutionOutcome {
        let mut state = DispatchState::Idle;

        let Some(route) = interaction.kind().route() else {
            self.router.pong(&interaction).await;
            return ExecutionOutcome::Success;
        };

        let command = format!("/{}", interaction.path().join(" "));

        enter(&mut state, DispatchState::Resolving);
        let Some(descriptor) = self.registry.resolve(route, interaction.path()) else {
            let failure = Failure::new(
                FailureKind::UnknownCommand,
                format!("no handler registered for `{}`", interaction.path().join(" ")),
            );
            return self.fail(&interaction, &command, failure, &mut state).await;
        };
        let command = descriptor.display_name();

        enter(&mut state, DispatchState::CheckingPreconditions);
        if let PreconditionResult::Deny(reason) = preconditions::evaluate(&interaction, &descriptor.preconditions) {
            let failure = Failure::new(FailureKind::UnmetPrecondition, reason);
            return self.fail(&interaction, &command, failure, &mut state).await;
        }

        enter(&mut state, DispatchState::Executing);
        let args = match CommandArgs::convert(&descriptor.options, interaction.raw_args()) {
            Ok(args) => args,
            Err(reason) => {
                let failure = Failure::new(FailureKind::MalformedInput, reason);
                return self.fail(&interaction, &command, failure, &mut state).await;
            }
        };

        if descriptor.defer {
            self.router.defer(&interaction, self.settings.ephemeral_defer).await;
        }

        let ctx = CommandContext::new(Arc::clone(&interaction), args, self.router.clone());
        let handler = Arc::clone(&descriptor.handler);
        let joined = tokio::spawn(async move { handler.execute(ctx).await }).await;

        let failure = match joined {
            Ok(Ok(())) => match self.settings.ack_deadline {
                Some(deadline) if interaction.elapsed() > deadline && !interaction.has_responded() => Some(Failure::new(
                    FailureKind::HandlerFault,
                    format!("no acknowledgment within {:?} (took {:?})", deadline, interaction.elapsed()),
                )),
                _ => None,
            },
            Ok(Err(CommandError::InvalidArgs(reason))) => Some(Failure::new(FailureKind::MalformedInput, reason)),
            Ok(Err(e)) => Some(Failure::new(FailureKind::HandlerFault, e.to_string())),
            Err(e) if e.is_panic() => Some(Failure::new(
                FailureKind::HandlerFault,
                format!("handler panicked: {}", panic_message(e.into_panic())),
            )),
            Err(e) => Some(Failure::new(FailureKind::HandlerFault, format!("handler task failed: {}", e))),
        };

        if let Some(failure) = failure {
            return self.fail(&interaction, &command, failure, &mut state).await;
        }

        enter(&mut state, DispatchState::Completed);
        if interaction.acknowledged_by_platform_only() {
            tracing::warn!("{} completed without following up its deferral", command);
            self.router
                .send_neutral(&interaction, COMPLETED_MESSAGE, self.settings.ephemeral_defer)
                .await;
        } else if !interaction.has_responded() {
            tracing::warn!("{} completed without replying", command);
        }
        ExecutionOutcome::Success
    }

    /// Classify, log, clean up and report a failure. Never retries.
    async fn fail(
        &self,
        interaction: &Interaction,
        command: &str,
        failure: Failure,
        state: &mut DispatchState,
    ) -> ExecutionOutcome {
        enter(state, DispatchState::Failed(failure.kind));

        let Classified { user_message, log } = ErrorClassifier::classify(&failure, interaction, command);
        log.emit();

        if failure.kind == FailureKind::HandlerFault {
            self.router.cleanup_on_exception(interaction).await;
        }

        if let Some(message) = user_message {
            if interaction.kind().accepts_messages() {
                self.router.send_error(interaction, &message, true).await;
            }
        }

        ExecutionOutcome::Failure { failure, log }
    }
}

fn enter(state: &mut DispatchState, next: DispatchState) {
    tracing::trace!("{} -> {}", state, next);
    *state = next;
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
