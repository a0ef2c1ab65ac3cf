//! Failure taxonomy and mapping to user text plus a log record

use std::fmt;

use crate::domain::entities::{Interaction, InteractionKind};

/// Shown when resolution fails
pub const UNKNOWN_COMMAND_MESSAGE: &str = "That command isn't available right now.";

/// Shown for any unexpected failure inside a command
pub const HANDLER_FAULT_MESSAGE: &str = "Something went wrong while running that command.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Registry miss; registration and platform are out of sync
    UnknownCommand,
    /// Arguments failed conversion before the body ran
    MalformedInput,
    /// A precondition denied the caller
    UnmetPrecondition,
    /// Unexpected failure inside the command body
    HandlerFault,
    /// A reply or registration call to the platform failed
    TransportFault,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureKind::UnknownCommand => "UnknownCommand",
            FailureKind::MalformedInput => "MalformedInput",
            FailureKind::UnmetPrecondition => "UnmetPrecondition",
            FailureKind::HandlerFault => "HandlerFault",
            FailureKind::TransportFault => "TransportFault",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub kind: FailureKind,
    pub detail: String,
}

impl Failure {
    pub fn new(kind: FailureKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }
}

/// Result of running one interaction through the pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionOutcome {
    Success,
    /// Carries the record that was logged for it
    Failure { failure: Failure, log: LogRecord },
}

impl ExecutionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ExecutionOutcome::Success)
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            ExecutionOutcome::Success => None,
            ExecutionOutcome::Failure { failure, .. } => Some(failure.kind),
        }
    }

    pub fn log(&self) -> Option<&LogRecord> {
        match self {
            ExecutionOutcome::Success => None,
            ExecutionOutcome::Failure { log, .. } => Some(log),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogSeverity {
    Error,
    Warning,
}

impl LogSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogSeverity::Error => "error",
            LogSeverity::Warning => "warning",
        }
    }
}

/// Structured line describing one classified failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub severity: LogSeverity,
    /// Interaction kind label
    pub source: &'static str,
    pub message: String,
}

impl LogRecord {
    pub fn emit(&self) {
        match self.severity {
            LogSeverity::Error => {
                tracing::error!(severity = self.severity.as_str(), source = self.source, message = %self.message)
            }
            LogSeverity::Warning => {
                tracing::warn!(severity = self.severity.as_str(), source = self.source, message = %self.message)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classified {
    /// `None` when there is nobody left to tell
    pub user_message: Option<String>,
    pub log: LogRecord,
}

/// Maps failures to what the user sees and what gets logged.
///
/// Internal detail only ever reaches the log record.
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorClassifier;

impl ErrorClassifier {
    pub fn classify(failure: &Failure, interaction: &Interaction, command: &str) -> Classified {
        let user_message = match failure.kind {
            FailureKind::UnmetPrecondition | FailureKind::MalformedInput => Some(failure.detail.clone()),
            FailureKind::UnknownCommand => Some(UNKNOWN_COMMAND_MESSAGE.to_string()),
            FailureKind::HandlerFault => Some(HANDLER_FAULT_MESSAGE.to_string()),
            FailureKind::TransportFault => None,
        };

        let severity = match failure.kind {
            FailureKind::HandlerFault | FailureKind::UnknownCommand | FailureKind::TransportFault => {
                LogSeverity::Error
            }
            FailureKind::UnmetPrecondition | FailureKind::MalformedInput => LogSeverity::Warning,
        };

        let user = interaction.user_id();
        let what = format!("{}: {}", failure.kind, failure.detail);
        let message = match interaction.kind() {
            InteractionKind::Ping => format!("{}'s ping: {}", user, what),
            InteractionKind::Command => format!("{}'s `{}` command failed: {}", user, command, what),
            InteractionKind::ComponentAction => format!("{}'s component interaction failed: {}", user, what),
            InteractionKind::Autocomplete => format!("{}'s autocomplete failed: {}", user, what),
            InteractionKind::ModalSubmit => format!("{}'s modal submit failed: {}", user, what),
        };

        Classified {
            user_message,
            log: LogRecord {
                severity,
                source: interaction.kind().label(),
                message,
            },
        }
    }

    /// Log record for a failed outbound call; there is no user channel left.
    pub fn transport_fault(interaction: &Interaction, operation: &str, detail: impl fmt::Display) -> LogRecord {
        let failure = Failure::new(FailureKind::TransportFault, format!("{} failed: {}", operation, detail));
        Self::classify(&failure, interaction, operation).log
    }
}
