//! Response router - picks initial response vs followup and sends exactly once

use std::sync::Arc;

use crate::domain::entities::{InitialResponse, Interaction, ReplyPayload, Severity};
use crate::domain::traits::Platform;
use super::classifier::ErrorClassifier;

/// How a reply went out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyRoute {
    Initial,
    Followup,
}

/// Sends replies for interactions.
///
/// The decision between initial response and followup is taken while holding
/// the interaction's reply lock, so two concurrent replies to the same
/// interaction can never both see "not yet responded". Transport failures are
/// logged and swallowed.
#[derive(Clone)]
pub struct ResponseRouter {
    platform: Arc<dyn Platform>,
}

impl ResponseRouter {
    pub fn new(platform: Arc<dyn Platform>) -> Self {
        Self { platform }
    }

    pub async fn reply(
        &self,
        interaction: &Interaction,
        content: impl Into<String>,
        severity: Severity,
        ephemeral: bool,
    ) -> Option<ReplyRoute> {
        let payload = ReplyPayload::new(content, severity, ephemeral);
        let _guard = interaction.reply_lock().await;

        if interaction.has_responded() {
            match self.platform.send_followup(interaction.handle(), payload).await {
                Ok(()) => {
                    interaction.record_followup();
                    Some(ReplyRoute::Followup)
                }
                Err(e) => {
                    ErrorClassifier::transport_fault(interaction, "followup", &e).emit();
                    None
                }
            }
        } else {
            let handle = interaction.handle();
            match self.platform.send_initial_response(handle, InitialResponse::Message(payload)).await {
                Ok(()) => {
                    interaction.mark_responded();
                    Some(ReplyRoute::Initial)
                }
                Err(e) => {
                    ErrorClassifier::transport_fault(interaction, "initial response", &e).emit();
                    None
                }
            }
        }
    }

    pub async fn send_success(&self, interaction: &Interaction, message: &str, ephemeral: bool) -> Option<ReplyRoute> {
        self.reply(interaction, message, Severity::Success, ephemeral).await
    }

    pub async fn send_error(&self, interaction: &Interaction, message: &str, ephemeral: bool) -> Option<ReplyRoute> {
        self.reply(interaction, message, Severity::Error, ephemeral).await
    }

    pub async fn send_warning(&self, interaction: &Interaction, message: &str, ephemeral: bool) -> Option<ReplyRoute> {
        self.reply(interaction, message, Severity::Warning, ephemeral).await
    }

    pub async fn send_neutral(&self, interaction: &Interaction, message: &str, ephemeral: bool) -> Option<ReplyRoute> {
        self.reply(interaction, message, Severity::Neutral, ephemeral).await
    }

    /// Platform-side "thinking" acknowledgment. Returns false if the
    /// interaction was already answered or the send failed.
    pub async fn defer(&self, interaction: &Interaction, ephemeral: bool) -> bool {
        let _guard = interaction.reply_lock().await;
        if interaction.has_responded() {
            return false;
        }

        match self
            .platform
            .send_initial_response(interaction.handle(), InitialResponse::Deferred { ephemeral })
            .await
        {
            Ok(()) => {
                interaction.mark_deferred();
                interaction.mark_responded();
                true
            }
            Err(e) => {
                ErrorClassifier::transport_fault(interaction, "deferred acknowledgment", &e).emit();
                false
            }
        }
    }

    pub async fn pong(&self, interaction: &Interaction) -> bool {
        let _guard = interaction.reply_lock().await;
        if interaction.has_responded() {
            return false;
        }

        match self.platform.send_initial_response(interaction.handle(), InitialResponse::Pong).await {
            Ok(()) => {
                interaction.mark_responded();
                true
            }
            Err(e) => {
                ErrorClassifier::transport_fault(interaction, "pong", &e).emit();
                false
            }
        }
    }

    /// Remove a stale deferred acknowledgment after the command faulted.
    ///
    /// Only acts when the platform's own deferral is all the user has seen.
    /// A failed delete is logged once and otherwise ignored.
    pub async fn cleanup_on_exception(&self, interaction: &Interaction) -> bool {
        let _guard = interaction.reply_lock().await;
        if !interaction.acknowledged_by_platform_only() {
            return false;
        }

        match self.platform.delete_original_response(interaction.handle()).await {
            Ok(()) => {
                tracing::debug!("Deleted stale acknowledgment for interaction {}", interaction.id());
                true
            }
            Err(e) => {
                ErrorClassifier::transport_fault(interaction, "delete original response", &e).emit();
                false
            }
        }
    }
}
