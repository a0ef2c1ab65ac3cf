use std::sync::Arc;

use async_trait::async_trait;

use crate::application::errors::CommandError;
use crate::application::messaging::CommandContext;
use crate::domain::entities::{CommandDescriptor, CommandHandler, OptionKind, OptionSpec};
use crate::domain::traits::{BalanceStore, BALANCE_FIELD};

/// `/balance [user]`
pub struct BalanceCommand {
    store: Arc<dyn BalanceStore>,
}

#[async_trait]
impl CommandHandler for BalanceCommand {
    async fn execute(&self, ctx: CommandContext) -> Result<(), CommandError> {
        let target = ctx.args().user("user").unwrap_or_else(|| ctx.user_id());
        let balance = self.store.read_field(target, BALANCE_FIELD).await?;

        ctx.send_neutral(&balance.to_string()).await;
        Ok(())
    }
}

pub fn descriptor(store: Arc<dyn BalanceStore>) -> CommandDescriptor {
    CommandDescriptor::slash(&["balance"], Arc::new(BalanceCommand { store }))
        .with_description("Show a balance.")
        .with_option(OptionSpec::optional("user", OptionKind::User, "Whose balance to show"))
}
