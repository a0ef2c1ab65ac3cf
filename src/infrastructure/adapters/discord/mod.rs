//! Discord REST adapter for interaction responses and command registration

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Serialize;

use crate::application::errors::TransportError;
use crate::domain::entities::{InitialResponse, InteractionHandle, ReplyPayload};
use crate::domain::traits::{CommandManifest, CommandScope, Platform};

/// Interaction callback types
const CALLBACK_PONG: u8 = 1;
const CALLBACK_MESSAGE: u8 = 4;
const CALLBACK_DEFERRED_MESSAGE: u8 = 5;

/// Message flag hiding a reply from everyone but the caller
const FLAG_EPHEMERAL: u64 = 1 << 6;

#[derive(Debug, Serialize)]
struct MessageData {
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    flags: Option<u64>,
}

#[derive(Debug, Serialize)]
struct Callback {
    #[serde(rename = "type")]
    kind: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<MessageData>,
}

fn flags(ephemeral: bool) -> Option<u64> {
    ephemeral.then_some(FLAG_EPHEMERAL)
}

fn message_data(payload: &ReplyPayload) -> MessageData {
    MessageData {
        content: payload.render(),
        flags: flags(payload.ephemeral),
    }
}

fn callback_body(response: &InitialResponse) -> Callback {
    match response {
        InitialResponse::Message(payload) => Callback {
            kind: CALLBACK_MESSAGE,
            data: Some(message_data(payload)),
        },
        InitialResponse::Deferred { ephemeral } => Callback {
            kind: CALLBACK_DEFERRED_MESSAGE,
            data: flags(*ephemeral).map(|flags| MessageData {
                content: String::new(),
                flags: Some(flags),
            }),
        },
        InitialResponse::Pong => Callback {
            kind: CALLBACK_PONG,
            data: None,
        },
    }
}

/// Talks to the platform's HTTP API with a bot token
pub struct DiscordRestPlatform {
    client: Client,
    api_base: String,
    application_id: u64,
    token: String,
}

impl DiscordRestPlatform {
    pub fn new(api_base: impl Into<String>, application_id: u64, token: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            application_id,
            token: token.into(),
        }
    }

    fn webhook_url(&self, interaction: &InteractionHandle) -> String {
        format!("{}/webhooks/{}/{}", self.api_base, self.application_id, interaction.token)
    }

    fn commands_url(&self, scope: CommandScope) -> String {
        match scope {
            CommandScope::Guild(guild_id) => format!(
                "{}/applications/{}/guilds/{}/commands",
                self.api_base, self.application_id, guild_id
            ),
            CommandScope::Global => format!("{}/applications/{}/commands", self.api_base, self.application_id),
        }
    }

    fn check(method: &'static str, response: Response) -> Result<(), TransportError> {
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(TransportError::Rejected {
                method,
                status: status.as_u16(),
            })
        }
    }
}

#[async_trait]
impl Platform for DiscordRestPlatform {
    async fn send_initial_response(
        &self,
        interaction: &InteractionHandle,
        response: InitialResponse,
    ) -> Result<(), TransportError> {
        let url = format!(
            "{}/interactions/{}/{}/callback",
            self.api_base, interaction.id, interaction.token
        );
        let response = self.client.post(&url).json(&callback_body(&response)).send().await?;
        Self::check("interaction callback", response)
    }

    async fn send_followup(&self, interaction: &InteractionHandle, payload: ReplyPayload) -> Result<(), TransportError> {
        let response = self
            .client
            .post(self.webhook_url(interaction))
            .json(&message_data(&payload))
            .send()
            .await?;
        Self::check("followup", response)
    }

    async fn delete_original_response(&self, interaction: &InteractionHandle) -> Result<(), TransportError> {
        let url = format!("{}/messages/@original", self.webhook_url(interaction));
        let response = self.client.delete(&url).send().await?;
        Self::check("delete original response", response)
    }

    async fn register_commands(&self, scope: CommandScope, commands: &[CommandManifest]) -> Result<(), TransportError> {
        let response = self
            .client
            .put(self.commands_url(scope))
            .header("Authorization", format!("Bot {}", self.token))
            .json(commands)
            .send()
            .await?;
        Self::check("register commands", response)
    }
}
