// reporting.rs - Error reporting sink
// Only permission-resolution failures and handler failures are reported; expected
// outcomes (unknown commands, ineligible callers, unreachable recipients) never get here.

use log::error;
use std::error::Error as _;

use crate::error::BotError;

/// Fire-and-forget sink. `report` must not block the invocation that calls it.
pub trait ErrorReporter: Send + Sync {
    fn report(&self, error: BotError);
}

/// Writes reported errors through the `log` facade
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

impl ErrorReporter for LogReporter {
    fn report(&self, error: BotError) {
        let mut message = error.to_string();
        let mut source = error.source().and_then(|s| s.source());
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        error!("[REPORT] {}", message);
    }
}
