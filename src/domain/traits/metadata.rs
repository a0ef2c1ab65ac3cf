use async_trait::async_trait;
use serde::Deserialize;

use crate::application::errors::FetchError;

/// Public metadata of a collection token
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenMetadata {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub permalink: Option<String>,
}

/// Source of token metadata for the `genesis` command
#[async_trait]
pub trait TokenMetadataSource: Send + Sync {
    /// `Ok(None)` when the token does not exist
    async fn fetch_token(&self, token_id: u64) -> Result<Option<TokenMetadata>, FetchError>;
}
