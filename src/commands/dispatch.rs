// dispatch.rs - Command dispatch pipeline
// One dispatch per invocation:
//
//   Received -> Resolved -> Authorized -> Executing -> Completed | Failed
//        \           \            \
//         Rejected(UnknownCommand) \ Rejected(Ineligible)
//                    Rejected(PermissionResolutionFailed)
//
// Invocations share nothing but the read-only catalog, so each Discord event can be
// dispatched on its own task.

use futures_util::FutureExt;
use log::{debug, info, warn};
use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::time::{timeout, timeout_at, Instant};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::command_ids::CommandIdLookup;
use crate::commands::catalog::CommandCatalog;
use crate::commands::context::{CallerContext, CommandContext};
use crate::commands::eligibility::{self, FilterMode};
use crate::error::{BotError, CommandError, PermissionError, Rejection};
use crate::permission::PermissionResolver;
use crate::reply::ReplySink;
use crate::reporting::ErrorReporter;

/// A request to run a command, as received from the platform
pub struct Invocation {
    /// Command name or alias, matched case-sensitively
    pub token: String,
    pub caller: CallerContext,
    pub args: String,
    pub reply: Arc<dyn ReplySink>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    Resolved,
    Authorized,
    Executing,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Received => "received",
            Stage::Resolved => "resolved",
            Stage::Authorized => "authorized",
            Stage::Executing => "executing",
        };
        f.write_str(name)
    }
}

/// Terminal state of an invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Completed,
    Failed(CommandError),
    Rejected(Rejection),
}

impl DispatchOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, DispatchOutcome::Completed)
    }
}

#[derive(Clone)]
pub struct Dispatcher {
    catalog: Arc<CommandCatalog>,
    resolver: Arc<dyn PermissionResolver>,
    command_ids: Arc<dyn CommandIdLookup>,
    reporter: Arc<dyn ErrorReporter>,
}

impl Dispatcher {
    pub fn new(
        catalog: Arc<CommandCatalog>,
        resolver: Arc<dyn PermissionResolver>,
        command_ids: Arc<dyn CommandIdLookup>,
        reporter: Arc<dyn ErrorReporter>,
    ) -> Self {
        Self {
            catalog,
            resolver,
            command_ids,
            reporter,
        }
    }

    pub fn catalog(&self) -> &Arc<CommandCatalog> {
        &self.catalog
    }

    pub async fn dispatch(&self, invocation: Invocation) -> DispatchOutcome {
        let id = Uuid::new_v4();
        let Invocation { token, caller, args, reply } = invocation;
        trace_stage(id, Stage::Received, &token);

        // Received -> Resolved
        let Some(command) = self.catalog.lookup(&token).cloned() else {
            debug!("[DISPATCH] {} unknown command '{}', dropping", id, token);
            return DispatchOutcome::Rejected(Rejection::UnknownCommand);
        };
        let properties = command.properties();
        trace_stage(id, Stage::Resolved, &properties.name);

        // Resolved -> Authorized. The level is resolved exactly once per invocation.
        let level = match timeout(properties.timeout, self.resolver.resolve(&caller)).await {
            Ok(Ok(level)) => level,
            Ok(Err(e)) => return self.reject_resolution(id, &properties.name, e),
            Err(_) => {
                let e = PermissionError::TimedOut(properties.timeout);
                return self.reject_resolution(id, &properties.name, e);
            }
        };

        if let Err(reason) = eligibility::check(properties, &caller, level, FilterMode::Dispatch) {
            debug!(
                "[DISPATCH] {} user {} not eligible for '{}': {}",
                id, caller.user_id, properties.name, reason
            );
            return DispatchOutcome::Rejected(Rejection::Ineligible(reason));
        }
        trace_stage(id, Stage::Authorized, &properties.name);

        // Authorized -> Executing
        let deadline = Instant::now() + properties.timeout;
        let cancel = CancellationToken::new();
        // Work the handler spawned off is told to stop once the invocation ends, however it ends
        let _cancel_on_exit = cancel.clone().drop_guard();
        let ctx = CommandContext {
            invocation_id: id,
            caller,
            permission_level: level,
            args,
            catalog: self.catalog.clone(),
            command_ids: self.command_ids.clone(),
            deadline,
            cancel: cancel.clone(),
            reply,
        };
        trace_stage(id, Stage::Executing, &properties.name);

        let execution = AssertUnwindSafe(command.execute(&ctx)).catch_unwind();
        match timeout_at(deadline, execution).await {
            Ok(Ok(Ok(()))) => {
                info!(
                    "[DISPATCH] {} '{}' completed for user {}",
                    id, properties.name, ctx.caller.user_id
                );
                DispatchOutcome::Completed
            }
            Ok(Ok(Err(e))) => self.fail(id, &properties.name, e),
            Ok(Err(panic)) => {
                let message = format!("command panicked: {}", panic_message(panic.as_ref()));
                self.fail(id, &properties.name, CommandError::Failed(message))
            }
            Err(_) => {
                cancel.cancel();
                self.fail(id, &properties.name, CommandError::TimedOut(properties.timeout))
            }
        }
    }

    fn reject_resolution(&self, id: Uuid, command: &str, error: PermissionError) -> DispatchOutcome {
        warn!("[DISPATCH] {} could not resolve permissions for '{}': {}", id, command, error);
        self.reporter.report(BotError::PermissionResolution {
            command: command.to_string(),
            source: error.clone(),
        });
        DispatchOutcome::Rejected(Rejection::PermissionResolutionFailed(error))
    }

    fn fail(&self, id: Uuid, command: &str, error: CommandError) -> DispatchOutcome {
        warn!("[DISPATCH] {} '{}' failed: {}", id, command, error);
        self.reporter.report(BotError::Handler {
            command: command.to_string(),
            source: error.clone(),
        });
        DispatchOutcome::Failed(error)
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}

fn trace_stage(id: Uuid, stage: Stage, command: &str) {
    debug!("[DISPATCH] {} {} '{}'", id, stage, command);
}
