//! Console adapter for development/testing
//!
//! Lines typed on stdin become interactions, replies are printed to stdout.
//! A line holding a JSON `InteractionEvent` is passed through as is, so an
//! external gateway process can pipe its events in.
//!
//! ```text
//! /balance
//! /genesis token_id:12
//! as:42 /admin grant user:7 amount:"5"
//! ping
//! {"id": 9, "token": "abc", "kind": "command", "user_id": 42, "path": ["balance"]}
//! ```

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex_lite::Regex;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use crate::application::errors::TransportError;
use crate::domain::entities::{InitialResponse, InteractionEvent, InteractionHandle, InteractionKind, ReplyPayload};
use crate::domain::traits::{CommandManifest, CommandScope, Platform};
use crate::infrastructure::config::ConsoleConfig;

static OPTION_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^([A-Za-z0-9_-]+):(?:"([^"]*)"|(\S+))$"#).expect("option pattern is valid")
});

static OPTION_TOKENS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"[A-Za-z0-9_-]+:"[^"]*"|\S+"#).expect("token pattern is valid")
});

/// Prints everything the pipeline sends
#[derive(Default)]
pub struct ConsolePlatform;

impl ConsolePlatform {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Platform for ConsolePlatform {
    async fn send_initial_response(
        &self,
        interaction: &InteractionHandle,
        response: InitialResponse,
    ) -> Result<(), TransportError> {
        match response {
            InitialResponse::Message(payload) => println!("[BOT #{}] {}", interaction.id, payload.render()),
            InitialResponse::Deferred { .. } => println!("[BOT #{}] is thinking...", interaction.id),
            InitialResponse::Pong => println!("[BOT #{}] pong", interaction.id),
        }
        Ok(())
    }

    async fn send_followup(&self, interaction: &InteractionHandle, payload: ReplyPayload) -> Result<(), TransportError> {
        println!("[BOT #{} followup] {}", interaction.id, payload.render());
        Ok(())
    }

    async fn delete_original_response(&self, interaction: &InteractionHandle) -> Result<(), TransportError> {
        println!("[BOT #{}] (original response deleted)", interaction.id);
        Ok(())
    }

    async fn register_commands(&self, scope: CommandScope, commands: &[CommandManifest]) -> Result<(), TransportError> {
        let names: Vec<&str> = commands.iter().map(|c| c.name.as_str()).collect();
        tracing::info!("Console registered [{}] to {}", names.join(", "), scope);
        Ok(())
    }
}

/// Reads interactions from stdin
pub struct ConsoleGateway {
    identity: ConsoleConfig,
    next_id: AtomicU64,
}

impl ConsoleGateway {
    pub fn new(identity: ConsoleConfig) -> Self {
        Self {
            identity,
            next_id: AtomicU64::new(1),
        }
    }

    /// Forward parsed lines until stdin closes or the dispatcher goes away
    pub async fn run(self, events: mpsc::Sender<InteractionEvent>) {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        println!("Type a command such as `/balance` (Ctrl-D to quit)");

        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                    match self.parse_line(id, &line) {
                        Some(event) => {
                            if events.send(event).await.is_err() {
                                break;
                            }
                        }
                        None if line.trim().is_empty() => {}
                        None => println!("Could not parse `{}`", line.trim()),
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    tracing::error!("Failed to read stdin: {}", e);
                    break;
                }
            }
        }
        tracing::info!("Console input closed");
    }

    pub fn parse_line(&self, id: u64, line: &str) -> Option<InteractionEvent> {
        let mut rest = line.trim();
        if rest.starts_with('{') {
            return match serde_json::from_str(rest) {
                Ok(event) => Some(event),
                Err(e) => {
                    tracing::warn!("Ignoring malformed event: {}", e);
                    None
                }
            };
        }

        let mut user_id = self.identity.user_id;

        if let Some(stripped) = rest.strip_prefix("as:") {
            let (uid, tail) = stripped.split_once(char::is_whitespace)?;
            user_id = uid.parse().ok()?;
            rest = tail.trim_start();
        }

        let base = InteractionEvent {
            id,
            token: uuid::Uuid::new_v4().to_string(),
            kind: InteractionKind::Command,
            user_id,
            guild_id: self.identity.guild_id,
            path: Vec::new(),
            raw_args: serde_json::Map::new(),
        };

        if rest.eq_ignore_ascii_case("ping") {
            return Some(base.with_kind(InteractionKind::Ping));
        }

        let body = rest.strip_prefix('/')?;
        let mut event = base;
        for token in OPTION_TOKENS.find_iter(body).map(|m| m.as_str()) {
            match OPTION_PATTERN.captures(token) {
                Some(caps) => {
                    let name = caps.get(1)?.as_str();
                    let value = caps.get(2).or_else(|| caps.get(3))?.as_str();
                    event = event.with_arg(name, value);
                }
                None if event.raw_args.is_empty() => event.path.push(token.to_string()),
                None => return None,
            }
        }

        if event.path.is_empty() {
            None
        } else {
            Some(event)
        }
    }
}
