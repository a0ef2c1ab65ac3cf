//! Precondition checks run before a command body

use std::fmt;
use std::sync::Arc;

use crate::domain::entities::{Interaction, OwnerSet};

/// Reason given to callers outside the owner set
pub const NOT_OWNER_REASON: &str = "caller is not an authorized owner";

/// Reason given when a guild-only command is used in a direct message
pub const GUILD_ONLY_REASON: &str = "this command can only be used in a server";

/// Outcome of a single check or a whole chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreconditionResult {
    Allow,
    Deny(String),
}

impl PreconditionResult {
    pub fn is_allowed(&self) -> bool {
        matches!(self, PreconditionResult::Allow)
    }
}

/// A stateless authorization or validity check attached to a command.
///
/// Checks may be skipped when an earlier one denies, so they must not have
/// side effects beyond logging.
pub trait Precondition: Send + Sync {
    fn name(&self) -> &'static str;

    fn evaluate(&self, interaction: &Interaction) -> PreconditionResult;
}

impl fmt::Debug for dyn Precondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Precondition({})", self.name())
    }
}

/// Only users in the configured owner set may pass
pub struct IsOwner {
    owners: Arc<OwnerSet>,
}

impl IsOwner {
    pub fn new(owners: Arc<OwnerSet>) -> Self {
        Self { owners }
    }
}

impl Precondition for IsOwner {
    fn name(&self) -> &'static str {
        "IsOwner"
    }

    fn evaluate(&self, interaction: &Interaction) -> PreconditionResult {
        tracing::debug!(source = "Precondition", "Checking if {} is a bot owner.", interaction.user_id());

        if self.owners.contains(interaction.user_id()) {
            PreconditionResult::Allow
        } else {
            PreconditionResult::Deny(NOT_OWNER_REASON.to_string())
        }
    }
}

/// Rejects interactions that did not come from a guild
pub struct GuildOnly;

impl Precondition for GuildOnly {
    fn name(&self) -> &'static str {
        "GuildOnly"
    }

    fn evaluate(&self, interaction: &Interaction) -> PreconditionResult {
        match interaction.guild_id() {
            Some(_) => PreconditionResult::Allow,
            None => PreconditionResult::Deny(GUILD_ONLY_REASON.to_string()),
        }
    }
}

/// Run `checks` in order, stopping at the first denial
pub fn evaluate(interaction: &Interaction, checks: &[Arc<dyn Precondition>]) -> PreconditionResult {
    for check in checks {
        if let PreconditionResult::Deny(reason) = check.evaluate(interaction) {
            tracing::warn!(
                severity = "warning",
                source = "Precondition",
                "{} denied {} on interaction {}: {}",
                check.name(),
                interaction.user_id(),
                interaction.id(),
                reason
            );
            return PreconditionResult::Deny(reason);
        }
    }
    PreconditionResult::Allow
}
