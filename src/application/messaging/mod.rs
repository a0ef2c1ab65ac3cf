//! Interaction handling - resolution, preconditions, dispatch and replies

pub mod classifier;
pub mod context;
pub mod dispatcher;
pub mod preconditions;
pub mod router;

pub use classifier::{Classified, ErrorClassifier, ExecutionOutcome, Failure, FailureKind, LogRecord, LogSeverity};
pub use context::CommandContext;
pub use dispatcher::{DispatchSettings, DispatchState, Dispatcher};
pub use preconditions::{GuildOnly, IsOwner, Precondition, PreconditionResult};
pub use router::{ReplyRoute, ResponseRouter};
