//! Domain traits - Abstractions for infrastructure implementations

pub mod metadata;
pub mod platform;
pub mod store;

pub use metadata::{TokenMetadata, TokenMetadataSource};
pub use platform::{CommandManifest, CommandScope, ManifestOption, Platform};
pub use store::{BalanceStore, BALANCE_FIELD};
