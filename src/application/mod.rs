//! Application layer - The interaction pipeline
//! 
//! This layer contains:
//! - Services: Publishing the command set before traffic is accepted
//! - Errors: Error types shared across layers
//! - Messaging: Preconditions, classification, routing and dispatch

pub mod errors;
pub mod services;
pub mod messaging;
