//! Domain layer - Core types of the interaction pipeline
//! 
//! This layer contains:
//! - Entities: Interactions, command descriptors, the registry, owners
//! - Traits: Abstractions for infrastructure (Platform, BalanceStore, TokenMetadataSource)

pub mod entities;
pub mod traits;
