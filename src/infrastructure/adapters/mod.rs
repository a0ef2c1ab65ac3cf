//! Platform adapters

pub mod console;
pub mod discord;

pub use console::{ConsoleGateway, ConsolePlatform};
pub use discord::DiscordRestPlatform;
