//! Context handed to command bodies

use std::sync::Arc;

use crate::domain::entities::{CommandArgs, Interaction, Severity, UserId};
use super::router::{ReplyRoute, ResponseRouter};

/// Everything a command body gets to see of its interaction.
///
/// Owned so the body can run on its own task.
#[derive(Clone)]
pub struct CommandContext {
    interaction: Arc<Interaction>,
    args: CommandArgs,
    router: ResponseRouter,
}

impl CommandContext {
    pub fn new(interaction: Arc<Interaction>, args: CommandArgs, router: ResponseRouter) -> Self {
        Self {
            interaction,
            args,
            router,
        }
    }

    pub fn interaction(&self) -> &Interaction {
        &self.interaction
    }

    pub fn user_id(&self) -> UserId {
        self.interaction.user_id()
    }

    pub fn args(&self) -> &CommandArgs {
        &self.args
    }

    pub async fn reply(&self, content: impl Into<String>, severity: Severity, ephemeral: bool) -> Option<ReplyRoute> {
        self.router.reply(&self.interaction, content, severity, ephemeral).await
    }

    pub async fn send_success(&self, message: &str) -> Option<ReplyRoute> {
        self.router.send_success(&self.interaction, message, false).await
    }

    pub async fn send_error(&self, message: &str) -> Option<ReplyRoute> {
        self.router.send_error(&self.interaction, message, true).await
    }

    pub async fn send_warning(&self, message: &str) -> Option<ReplyRoute> {
        self.router.send_warning(&self.interaction, message, false).await
    }

    pub async fn send_neutral(&self, message: &str) -> Option<ReplyRoute> {
        self.router.send_neutral(&self.interaction, message, false).await
    }
}
