//! Domain entities - Core business objects

pub mod command;
pub mod interaction;
pub mod options;
pub mod owners;
pub mod reply;

pub use command::{
    handler_fn, CommandDescriptor, CommandHandler, CommandPath, CommandRegistry, RouteKind,
};
pub use interaction::{Interaction, InteractionEvent, InteractionHandle, InteractionKind, UserId};
pub use options::{ArgValue, CommandArgs, OptionKind, OptionSpec};
pub use owners::OwnerSet;
pub use reply::{InitialResponse, ReplyPayload, Severity};
