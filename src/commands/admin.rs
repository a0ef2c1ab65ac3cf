//! Owner-only commands

use std::sync::Arc;

use async_trait::async_trait;

use crate::application::errors::{CommandError, StorageError};
use crate::application::messaging::{CommandContext, IsOwner};
use crate::domain::entities::{CommandDescriptor, CommandHandler, OptionKind, OptionSpec, OwnerSet, Severity};
use crate::domain::traits::{BalanceStore, BALANCE_FIELD};

pub const OUT_OF_RANGE_MESSAGE: &str = "That would push the balance out of range.";

/// `/admin grant user:<user> amount:<n>`
pub struct GrantCommand {
    store: Arc<dyn BalanceStore>,
}

#[async_trait]
impl CommandHandler for GrantCommand {
    async fn execute(&self, ctx: CommandContext) -> Result<(), CommandError> {
        let user = ctx.args().require_user("user")?;
        let amount = ctx.args().require_integer("amount")?;
        if amount == 0 {
            return Err(CommandError::InvalidArgs("`amount` must not be zero.".to_string()));
        }

        let balance = match self.store.upsert_increment(user, BALANCE_FIELD, amount).await {
            Err(StorageError::Overflow { .. }) => {
                return Err(CommandError::InvalidArgs(OUT_OF_RANGE_MESSAGE.to_string()));
            }
            result => result?,
        };
        ctx.send_success(&format!("Granted {:+} to {}. New balance: {}.", amount, user, balance))
            .await;
        Ok(())
    }
}

/// `/admin whoami`
pub struct WhoAmICommand;

#[async_trait]
impl CommandHandler for WhoAmICommand {
    async fn execute(&self, ctx: CommandContext) -> Result<(), CommandError> {
        ctx.reply(format!("You are {}, an authorized owner.", ctx.user_id()), Severity::Neutral, true)
            .await;
        Ok(())
    }
}

pub fn grant(store: Arc<dyn BalanceStore>, owners: Arc<OwnerSet>) -> CommandDescriptor {
    CommandDescriptor::slash(&["admin", "grant"], Arc::new(GrantCommand { store }))
        .with_description("Add to a user's balance.")
        .with_option(OptionSpec::required("user", OptionKind::User, "Recipient"))
        .with_option(OptionSpec::required("amount", OptionKind::Integer, "Amount to add (negative to remove)"))
        .with_precondition(Arc::new(IsOwner::new(owners)))
}

pub fn whoami(owners: Arc<OwnerSet>) -> CommandDescriptor {
    CommandDescriptor::slash(&["admin", "whoami"], Arc::new(WhoAmICommand))
        .with_description("Confirm owner access.")
        .with_precondition(Arc::new(IsOwner::new(owners)))
}
