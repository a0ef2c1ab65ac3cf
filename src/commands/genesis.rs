use std::sync::Arc;

use async_trait::async_trait;

use crate::application::errors::{CommandError, FetchError};
use crate::application::messaging::CommandContext;
use crate::domain::entities::{CommandDescriptor, CommandHandler, OptionKind, OptionSpec, Severity};
use crate::domain::traits::TokenMetadataSource;

pub const NOT_FOUND_MESSAGE: &str = "Couldn't find that token.";

/// `/genesis token_id:<n>` - fetch a GENE_SIS token
pub struct GenesisCommand {
    source: Option<Arc<dyn TokenMetadataSource>>,
}

#[async_trait]
impl CommandHandler for GenesisCommand {
    async fn execute(&self, ctx: CommandContext) -> Result<(), CommandError> {
        let token_id = ctx.args().require_integer("token_id")?;
        let token_id = u64::try_from(token_id)
            .map_err(|_| CommandError::InvalidArgs("`token_id` must not be negative.".to_string()))?;

        let source = self
            .source
            .as_ref()
            .ok_or_else(|| FetchError::MissingKey("OPENSEA_API_KEY".to_string()))?;

        match source.fetch_token(token_id).await? {
            None => {
                ctx.send_error(NOT_FOUND_MESSAGE).await;
            }
            Some(token) => {
                let mut text = format!("Token #{}", token_id);
                if let Some(name) = token.name.filter(|n| !n.is_empty()) {
                    text.push_str(&format!(" - {}", name));
                }
                for url in [token.image_url, token.permalink].into_iter().flatten() {
                    text.push('\n');
                    text.push_str(&url);
                }
                ctx.reply(text, Severity::Neutral, false).await;
            }
        }
        Ok(())
    }
}

pub fn descriptor(source: Option<Arc<dyn TokenMetadataSource>>) -> CommandDescriptor {
    CommandDescriptor::slash(&["genesis"], Arc::new(GenesisCommand { source }))
        .with_description("Fetch a GENE_SIS token.")
        .with_option(OptionSpec::required("token_id", OptionKind::Integer, "Token number"))
        .deferred()
}
