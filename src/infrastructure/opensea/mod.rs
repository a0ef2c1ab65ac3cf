//! OpenSea asset API client

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;

use crate::application::errors::FetchError;
use crate::domain::traits::{TokenMetadata, TokenMetadataSource};

/// Fetches asset metadata for one contract
pub struct OpenSeaClient {
    client: Client,
    endpoint: String,
    contract: String,
    api_key: String,
}

impl OpenSeaClient {
    pub fn new(endpoint: impl Into<String>, contract: impl Into<String>, api_key: impl Into<String>) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(concat!("genesis-bot/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            contract: contract.into(),
            api_key: api_key.into(),
        })
    }

    /// Build from the key stored in environment variable `key_env`
    pub fn from_env(endpoint: &str, contract: &str, key_env: &str) -> Result<Self, FetchError> {
        let api_key = std::env::var(key_env).map_err(|_| FetchError::MissingKey(key_env.to_string()))?;
        Self::new(endpoint, contract, api_key)
    }

    pub fn asset_url(&self, token_id: u64) -> String {
        format!("{}/{}/{}", self.endpoint.trim_end_matches('/'), self.contract, token_id)
    }
}

#[async_trait]
impl TokenMetadataSource for OpenSeaClient {
    async fn fetch_token(&self, token_id: u64) -> Result<Option<TokenMetadata>, FetchError> {
        let response = self
            .client
            .get(self.asset_url(token_id))
            .header("X-API-KEY", &self.api_key)
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => Ok(Some(response.json().await?)),
            status => Err(FetchError::Status(status.as_u16())),
        }
    }
}
