use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::application::errors::TransportError;
use crate::domain::entities::{InitialResponse, InteractionHandle, ReplyPayload};

/// Where commands are published on the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "scope", content = "guild-id")]
pub enum CommandScope {
    /// A single guild; updates show up immediately
    Guild(u64),
    Global,
}

impl fmt::Display for CommandScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandScope::Guild(id) => write!(f, "guild {}", id),
            CommandScope::Global => write!(f, "global"),
        }
    }
}

/// Top level entry of the published command manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandManifest {
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<ManifestOption>,
}

/// Option, subcommand or subcommand group inside a manifest entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestOption {
    #[serde(rename = "type")]
    pub kind: u8,
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<ManifestOption>,
}

/// Outbound calls to the chat platform.
///
/// Every call may fail with a transport error; callers log and move on.
#[async_trait]
pub trait Platform: Send + Sync {
    async fn send_initial_response(
        &self,
        interaction: &InteractionHandle,
        response: InitialResponse,
    ) -> Result<(), TransportError>;

    async fn send_followup(
        &self,
        interaction: &InteractionHandle,
        payload: ReplyPayload,
    ) -> Result<(), TransportError>;

    async fn delete_original_response(&self, interaction: &InteractionHandle) -> Result<(), TransportError>;

    /// Overwrite the command set for `scope`
    async fn register_commands(
        &self,
        scope: CommandScope,
        commands: &[CommandManifest],
    ) -> Result<(), TransportError>;
}
