//! Application services - Startup orchestration of the command set

pub mod command_service;

pub use command_service::ReadyRegistry;
