// error.rs - Error taxonomy for the command pipeline
// Every failure the bot can hit while building the catalog, authorizing a caller,
// running a command or delivering a reply has a named variant here, so callers can
// tell expected outcomes (swallowed) apart from real failures (reported).

use std::time::Duration;
use thiserror::Error;

use crate::commands::eligibility::Ineligibility;

/// Raised while building the command catalog. Always fatal to startup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("command name or alias `{name}` is already registered by `{existing}`")]
    DuplicateName { name: String, existing: String },
}

/// Failure of the permission resolver collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PermissionError {
    #[error("failed to fetch guild data: {0}")]
    Fetch(String),
    #[error("permission resolution did not finish within {0:?}")]
    TimedOut(Duration),
}

/// Outcome of handing a reply to the chat platform.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryError {
    /// The recipient can't be messaged (DMs closed, user left, ...). Expected, never reported.
    #[error("recipient is unreachable")]
    Unreachable,
    #[error("failed to deliver reply: {0}")]
    Other(String),
}

/// Errors a command handler can finish with.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("command did not finish within its {0:?} timeout")]
    TimedOut(Duration),
    #[error("command was cancelled")]
    Cancelled,
    #[error(transparent)]
    Delivery(#[from] DeliveryError),
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),
    #[error("{0}")]
    Failed(String),
}

/// Why an invocation never reached its handler.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("no command matches the invoked token")]
    UnknownCommand,
    #[error("could not resolve the caller's permission level: {0}")]
    PermissionResolutionFailed(#[source] PermissionError),
    #[error("caller is not eligible: {0}")]
    Ineligible(Ineligibility),
}

/// What the error-reporting sink receives.
#[derive(Debug, Clone, Error)]
pub enum BotError {
    #[error("permission resolution failed while invoking `{command}`: {source}")]
    PermissionResolution {
        command: String,
        #[source]
        source: PermissionError,
    },
    #[error("command `{command}` failed: {source}")]
    Handler {
        command: String,
        #[source]
        source: CommandError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("no botconfig.txt file found in any expected location (., .., ../.., src/)")]
    NotFound,
    #[error("{0} not found in botconfig.txt")]
    Missing(&'static str),
    #[error("{0} in botconfig.txt is set to a placeholder value")]
    Placeholder(&'static str),
    #[error("invalid value for {key}: `{value}`")]
    Invalid { key: &'static str, value: String },
}
