//! Infrastructure layer - External concerns
//! 
//! This layer contains:
//! - Config: Configuration loading
//! - Storage / Database: Balance stores (memory, SQLite)
//! - Adapters: Platform integrations (Discord REST, console)
//! - OpenSea: Token metadata for the `genesis` command

pub mod adapters;
pub mod config;
pub mod database;
pub mod opensea;
pub mod storage;
