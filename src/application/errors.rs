//! Application layer errors

use thiserror::Error;

use crate::domain::entities::CommandPath;

/// General bot errors
#[derive(Error, Debug)]
pub enum BotError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Command error: {0}")]
    Command(#[from] CommandError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Errors a command body may return
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),
}

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Lock poisoned")]
    Poisoned,

    #[error("Adding {delta} to {field} would overflow")]
    Overflow { field: String, delta: i64 },

    #[error("Background task failed: {0}")]
    Task(String),
}

/// Failures talking to the chat platform's REST surface
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Platform rejected {method}: HTTP {status}")]
    Rejected { method: &'static str, status: u16 },

    #[error("Console output failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures fetching third-party data for a command
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Unexpected status {0}")]
    Status(u16),

    #[error("Missing API key in ${0}")]
    MissingKey(String),
}

/// Startup-time registry failures; all of them abort the process
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Two commands registered under `{0}`")]
    DuplicatePath(CommandPath),

    #[error("Invalid command definition: {0}")]
    InvalidDefinition(String),

    #[error("Registry already populated")]
    AlreadyRegistered,

    #[error("Failed to publish commands: {0}")]
    Publish(#[from] TransportError),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Parse error: {0}")]
    Parse(String),
}
