//! The bot's command set

pub mod admin;
pub mod balance;
pub mod genesis;

use std::sync::Arc;

use crate::domain::entities::{CommandDescriptor, OwnerSet};
use crate::domain::traits::{BalanceStore, TokenMetadataSource};

/// Collaborators the command bodies call into
#[derive(Clone)]
pub struct CommandDeps {
    pub store: Arc<dyn BalanceStore>,
    pub owners: Arc<OwnerSet>,
    /// `None` when no API key is configured; `/genesis` then faults
    pub metadata: Option<Arc<dyn TokenMetadataSource>>,
}

/// Every descriptor, in registration order
pub fn all(deps: &CommandDeps) -> Vec<CommandDescriptor> {
    vec![
        balance::descriptor(Arc::clone(&deps.store)),
        genesis::descriptor(deps.metadata.clone()),
        admin::grant(Arc::clone(&deps.store), Arc::clone(&deps.owners)),
        admin::whoami(Arc::clone(&deps.owners)),
    ]
}
