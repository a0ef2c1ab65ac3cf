//! Configuration management

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::application::errors::ConfigError;
use crate::application::messaging::DispatchSettings;
use crate::domain::entities::OwnerSet;
use crate::domain::traits::CommandScope;

/// Bot configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Config {
    pub bot: BotConfig,
    /// Users allowed to run owner-only commands
    pub owner_ids: Vec<u64>,
    pub registration: RegistrationConfig,
    pub platform: PlatformConfig,
    pub storage: StorageConfig,
    pub opensea: OpenSeaConfig,
    pub dispatch: DispatchConfig,
    pub console: ConsoleConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct BotConfig {
    pub name: String,
    /// "playing", "listening", "watching", ...
    pub status_type: Option<String>,
    pub status_text: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScopeKind {
    Guild,
    Global,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct RegistrationConfig {
    pub scope: ScopeKind,
    pub guild_id: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct PlatformConfig {
    pub api_base: String,
    pub application_id: Option<u64>,
    /// Read from `token-env` when not set here
    pub token: Option<String>,
    pub token_env: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StorageBackend {
    Memory,
    Sqlite,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub path: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct OpenSeaConfig {
    pub endpoint: String,
    pub contract: String,
    pub api_key_env: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct DispatchConfig {
    /// 0 disables the check
    pub ack_deadline_ms: u64,
    pub ephemeral_defer: bool,
}

/// Identity used for interactions typed into the console
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ConsoleConfig {
    pub user_id: u64,
    pub guild_id: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bot: BotConfig {
                name: "genesis-bot".to_string(),
                status_type: Some("listening".to_string()),
                status_text: Some("/balance".to_string()),
            },
            owner_ids: Vec::new(),
            registration: RegistrationConfig {
                scope: ScopeKind::Guild,
                guild_id: None,
            },
            platform: PlatformConfig {
                api_base: "https://discord.com/api/v10".to_string(),
                application_id: None,
                token: None,
                token_env: "BOT_TOKEN".to_string(),
            },
            storage: StorageConfig {
                backend: StorageBackend::Sqlite,
                path: PathBuf::from("genesis-bot.db"),
            },
            opensea: OpenSeaConfig {
                endpoint: "https://api.opensea.io/api/v1/asset/".to_string(),
                contract: "0xd8a5d498ab43ed060cb6629b97a19e3e4276dd9f".to_string(),
                api_key_env: "OPENSEA_API_KEY".to_string(),
            },
            dispatch: DispatchConfig {
                ack_deadline_ms: 3000,
                ephemeral_defer: false,
            },
            console: ConsoleConfig {
                user_id: 1,
                guild_id: Some(1),
            },
        }
    }
}

impl Config {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)
            .map_err(|e| ConfigError::Parse(format!("Failed to read config: {}", e)))?;

        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(content)
            .map_err(|e| ConfigError::Parse(format!("Failed to parse config: {}", e)))
    }

    /// Environment overrides: `BOT_TOKEN` (or the configured token variable),
    /// `BOT_APPLICATION_ID`, `BOT_OWNER_IDS` ("1, 2"), `BOT_GUILD_ID`.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Ok(token) = std::env::var(&self.platform.token_env) {
            if !token.is_empty() {
                self.platform.token = Some(token);
            }
        }

        if let Ok(id) = std::env::var("BOT_APPLICATION_ID") {
            self.platform.application_id = Some(parse_id("BOT_APPLICATION_ID", &id)?);
        }

        if let Ok(ids) = std::env::var("BOT_OWNER_IDS") {
            self.owner_ids = parse_id_list(&ids)?;
        }

        if let Ok(id) = std::env::var("BOT_GUILD_ID") {
            self.registration.guild_id = Some(parse_id("BOT_GUILD_ID", &id)?);
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.owner_ids.is_empty() {
            return Err(ConfigError::MissingField("owner-ids".to_string()));
        }
        if self.registration.scope == ScopeKind::Guild && self.registration.guild_id.is_none() {
            return Err(ConfigError::MissingField("registration.guild-id".to_string()));
        }
        if self.storage.backend == StorageBackend::Sqlite && self.storage.path.as_os_str().is_empty() {
            return Err(ConfigError::MissingField("storage.path".to_string()));
        }
        Ok(())
    }

    pub fn owner_set(&self) -> OwnerSet {
        self.owner_ids.iter().copied().collect()
    }

    pub fn command_scope(&self) -> Result<CommandScope, ConfigError> {
        match (self.registration.scope, self.registration.guild_id) {
            (ScopeKind::Global, _) => Ok(CommandScope::Global),
            (ScopeKind::Guild, Some(id)) => Ok(CommandScope::Guild(id)),
            (ScopeKind::Guild, None) => Err(ConfigError::MissingField("registration.guild-id".to_string())),
        }
    }

    pub fn dispatch_settings(&self) -> DispatchSettings {
        DispatchSettings {
            ack_deadline: match self.dispatch.ack_deadline_ms {
                0 => None,
                ms => Some(Duration::from_millis(ms)),
            },
            ephemeral_defer: self.dispatch.ephemeral_defer,
        }
    }

    /// Presence to show, if both type and text are configured
    pub fn status(&self) -> Option<BotStatus> {
        let kind = self.bot.status_type.as_deref().filter(|s| !s.is_empty())?;
        let text = self.bot.status_text.as_deref().filter(|s| !s.is_empty())?;
        Some(BotStatus {
            activity: ActivityKind::parse_or_default(kind),
            text: text.to_string(),
        })
    }
}

fn parse_id(field: &str, value: &str) -> Result<u64, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue(format!("{} is not a numeric id: `{}`", field, value)))
}

/// Parse a comma separated owner list such as `"1, 2"`
pub fn parse_id_list(value: &str) -> Result<Vec<u64>, ConfigError> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| parse_id("owner id", s))
        .collect()
}

/// Activity shown in the bot's presence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityKind {
    Playing,
    Streaming,
    Listening,
    Watching,
    Competing,
}

impl ActivityKind {
    /// Case-insensitive; unknown types fall back to `Playing` with a warning.
    pub fn parse_or_default(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "playing" => ActivityKind::Playing,
            "streaming" => ActivityKind::Streaming,
            "listening" => ActivityKind::Listening,
            "watching" => ActivityKind::Watching,
            "competing" => ActivityKind::Competing,
            _ => {
                tracing::warn!("Invalid status type `{}`. Defaulting to `Playing`.", value);
                ActivityKind::Playing
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityKind::Playing => "Playing",
            ActivityKind::Streaming => "Streaming",
            ActivityKind::Listening => "Listening",
            ActivityKind::Watching => "Watching",
            ActivityKind::Competing => "Competing",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotStatus {
    pub activity: ActivityKind,
    pub text: String,
}
