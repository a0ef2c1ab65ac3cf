use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, MutexGuard};

use super::command::RouteKind;

/// Numeric platform user identifier
pub type UserId = u64;

/// Kind of inbound interaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InteractionKind {
    Command,
    ComponentAction,
    Autocomplete,
    ModalSubmit,
    Ping,
}

impl InteractionKind {
    /// Label used as the `source` of log records
    pub fn label(&self) -> &'static str {
        match self {
            InteractionKind::Command => "ApplicationCommand",
            InteractionKind::ComponentAction => "MessageComponent",
            InteractionKind::Autocomplete => "ApplicationCommandAutocomplete",
            InteractionKind::ModalSubmit => "ModalSubmit",
            InteractionKind::Ping => "Ping",
        }
    }

    /// Autocomplete and ping interactions cannot carry a message reply.
    pub fn accepts_messages(&self) -> bool {
        !matches!(self, InteractionKind::Autocomplete | InteractionKind::Ping)
    }

    /// Registry route for this kind; pings are never routed.
    pub fn route(&self) -> Option<RouteKind> {
        match self {
            InteractionKind::Command => Some(RouteKind::SlashCommand),
            InteractionKind::ComponentAction => Some(RouteKind::Component),
            InteractionKind::Autocomplete => Some(RouteKind::Autocomplete),
            InteractionKind::ModalSubmit => Some(RouteKind::Modal),
            InteractionKind::Ping => None,
        }
    }
}

/// Raw event as delivered by the gateway layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionEvent {
    pub id: u64,
    pub token: String,
    pub kind: InteractionKind,
    pub user_id: UserId,
    #[serde(default)]
    pub guild_id: Option<u64>,
    #[serde(default)]
    pub path: Vec<String>,
    #[serde(default)]
    pub raw_args: serde_json::Map<String, serde_json::Value>,
}

impl InteractionEvent {
    pub fn command(id: u64, user_id: UserId, path: &[&str]) -> Self {
        Self {
            id,
            token: uuid::Uuid::new_v4().to_string(),
            kind: InteractionKind::Command,
            user_id,
            guild_id: None,
            path: path.iter().map(|s| s.to_string()).collect(),
            raw_args: serde_json::Map::new(),
        }
    }

    pub fn with_kind(mut self, kind: InteractionKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_guild(mut self, guild_id: u64) -> Self {
        self.guild_id = Some(guild_id);
        self
    }

    pub fn with_arg(mut self, name: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.raw_args.insert(name.into(), value.into());
        self
    }
}

/// What the outbound platform calls need to address an interaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteractionHandle {
    pub id: u64,
    pub token: String,
}

/// A single in-flight interaction.
///
/// Everything is fixed at creation except the reply state, which only the
/// response router changes while holding [`Interaction::reply_lock`].
#[derive(Debug)]
pub struct Interaction {
    handle: InteractionHandle,
    kind: InteractionKind,
    user_id: UserId,
    guild_id: Option<u64>,
    path: Vec<String>,
    raw_args: serde_json::Map<String, serde_json::Value>,
    received_at: DateTime<Utc>,
    responded: AtomicBool,
    deferred: AtomicBool,
    followups: AtomicUsize,
    reply_lock: Mutex<()>,
}

impl Interaction {
    pub fn from_event(event: InteractionEvent) -> Self {
        Self {
            handle: InteractionHandle {
                id: event.id,
                token: event.token,
            },
            kind: event.kind,
            user_id: event.user_id,
            guild_id: event.guild_id,
            path: event.path,
            raw_args: event.raw_args,
            received_at: Utc::now(),
            responded: AtomicBool::new(false),
            deferred: AtomicBool::new(false),
            followups: AtomicUsize::new(0),
            reply_lock: Mutex::new(()),
        }
    }

    pub fn id(&self) -> u64 {
        self.handle.id
    }

    pub fn handle(&self) -> &InteractionHandle {
        &self.handle
    }

    pub fn kind(&self) -> InteractionKind {
        self.kind
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn guild_id(&self) -> Option<u64> {
        self.guild_id
    }

    pub fn path(&self) -> &[String] {
        &self.path
    }

    pub fn raw_args(&self) -> &serde_json::Map<String, serde_json::Value> {
        &self.raw_args
    }

    /// Time since the interaction reached the bot
    pub fn elapsed(&self) -> Duration {
        (Utc::now() - self.received_at).to_std().unwrap_or_default()
    }

    /// Whether an initial response (message, deferral or pong) has been sent
    pub fn has_responded(&self) -> bool {
        self.responded.load(Ordering::Acquire)
    }

    /// True when the only thing the user sees is the platform's own
    /// "thinking" acknowledgment.
    pub fn acknowledged_by_platform_only(&self) -> bool {
        self.deferred.load(Ordering::Acquire) && self.followups.load(Ordering::Acquire) == 0
    }

    pub fn followup_count(&self) -> usize {
        self.followups.load(Ordering::Acquire)
    }

    pub(crate) async fn reply_lock(&self) -> MutexGuard<'_, ()> {
        self.reply_lock.lock().await
    }

    /// Flips `has_responded`; returns false if it was already set.
    pub(crate) fn mark_responded(&self) -> bool {
        !self.responded.swap(true, Ordering::AcqRel)
    }

    pub(crate) fn mark_deferred(&self) {
        self.deferred.store(true, Ordering::Release);
    }

    pub(crate) fn record_followup(&self) {
        self.followups.fetch_add(1, Ordering::AcqRel);
    }
}
