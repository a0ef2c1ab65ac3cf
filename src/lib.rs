//! genesis-bot - interaction dispatch for a chat-platform bot

pub mod application;
pub mod commands;
pub mod domain;
pub mod infrastructure;
