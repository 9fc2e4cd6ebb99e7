// testing.rs - In-memory fakes shared by the unit tests

use async_trait::async_trait;
use serenity::model::id::{GuildId, UserId};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::command_ids::StaticCommandIds;
use crate::commands::catalog::CommandCatalog;
use crate::commands::context::{CallerContext, CommandContext};
use crate::commands::{Command, CommandProperties};
use crate::error::{BotError, CommandError, DeliveryError, PermissionError};
use crate::permission::{PermissionLevel, PermissionResolver};
use crate::reply::{ReplySink, Response};
use crate::reporting::ErrorReporter;

/// A plain guild member with no bot-wide roles on the main deployment
pub fn caller() -> CallerContext {
    CallerContext {
        guild_id: Some(GuildId(1)),
        user_id: UserId(10),
        bot_id: UserId(99),
        is_whitelabel: false,
        is_bot_admin: false,
        is_bot_helper: false,
    }
}

pub fn command_context(reply: Arc<dyn ReplySink>, level: PermissionLevel) -> CommandContext {
    context_with(Arc::new(CommandCatalog::new()), caller(), reply, level)
}

pub fn context_with(
    catalog: Arc<CommandCatalog>,
    caller: CallerContext,
    reply: Arc<dyn ReplySink>,
    level: PermissionLevel,
) -> CommandContext {
    CommandContext {
        invocation_id: Uuid::new_v4(),
        caller,
        permission_level: level,
        args: String::new(),
        catalog,
        command_ids: Arc::new(StaticCommandIds::default()),
        deadline: Instant::now() + Duration::from_secs(5),
        cancel: CancellationToken::new(),
        reply,
    }
}

// ============================================================================
// COMMANDS
// ============================================================================

#[derive(Debug, Clone)]
pub enum Behaviour {
    Succeed,
    Reply,
    Fail(String),
    Sleep(Duration),
    /// Spawn background work tied to the invocation, then never finish
    SpawnAndHang,
    SpawnAndSucceed,
    SpawnAndFail(String),
    Panic,
}

pub struct TestCommand {
    properties: CommandProperties,
    behaviour: Behaviour,
    executions: AtomicUsize,
    cancelled: Arc<Notify>,
}

impl TestCommand {
    pub fn new(properties: CommandProperties) -> Self {
        Self {
            properties,
            behaviour: Behaviour::Succeed,
            executions: AtomicUsize::new(0),
            cancelled: Arc::new(Notify::new()),
        }
    }

    pub fn behaviour(mut self, behaviour: Behaviour) -> Self {
        self.behaviour = behaviour;
        self
    }

    pub fn executions(&self) -> usize {
        self.executions.load(Ordering::SeqCst)
    }

    pub async fn wait_for_cancellation(&self) {
        self.cancelled.notified().await;
    }

    /// Background task that signals once the invocation's token is cancelled
    fn spawn_child_work(&self, ctx: &CommandContext) {
        let token = ctx.cancel.child_token();
        let cancelled = self.cancelled.clone();
        tokio::spawn(async move {
            token.cancelled().await;
            cancelled.notify_one();
        });
    }
}

#[async_trait]
impl Command for TestCommand {
    fn properties(&self) -> &CommandProperties {
        &self.properties
    }

    async fn execute(&self, ctx: &CommandContext) -> Result<(), CommandError> {
        self.executions.fetch_add(1, Ordering::SeqCst);
        match &self.behaviour {
            Behaviour::Succeed => Ok(()),
            Behaviour::Reply => ctx.reply(Response::text("ok")).await,
            Behaviour::Fail(message) => Err(CommandError::Failed(message.clone())),
            Behaviour::Sleep(duration) => {
                tokio::time::sleep(*duration).await;
                Ok(())
            }
            Behaviour::SpawnAndHang => {
                self.spawn_child_work(ctx);
                std::future::pending::<()>().await;
                Ok(())
            }
            Behaviour::SpawnAndSucceed => {
                self.spawn_child_work(ctx);
                Ok(())
            }
            Behaviour::SpawnAndFail(message) => {
                self.spawn_child_work(ctx);
                Err(CommandError::Failed(message.clone()))
            }
            Behaviour::Panic => {
                let empty: Vec<u8> = Vec::new();
                let index = ctx.args.len() + 3;
                let _ = empty[index];
                Ok(())
            }
        }
    }
}


// ============================================================================
// COLLABORATORS
// ============================================================================

pub struct RecordingReply {
    responses: Mutex<Vec<Response>>,
    attempts: AtomicUsize,
    failure: Option<DeliveryError>,
}

impl RecordingReply {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(Vec::new()),
            attempts: AtomicUsize::new(0),
            failure: None,
        }
    }

    pub fn failing(failure: DeliveryError) -> Self {
        Self {
            failure: Some(failure),
            ..Self::new()
        }
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn responses(&self) -> Vec<Response> {
        self.responses.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReplySink for RecordingReply {
    async fn send(&self, response: Response) -> Result<(), DeliveryError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if let Some(failure) = &self.failure {
            return Err(failure.clone());
        }
        self.responses.lock().unwrap().push(response);
        Ok(())
    }
}

pub struct RecordingReporter {
    reported: Mutex<Vec<String>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self {
            reported: Mutex::new(Vec::new()),
        }
    }

    pub fn reported(&self) -> Vec<String> {
        self.reported.lock().unwrap().clone()
    }
}

impl ErrorReporter for RecordingReporter {
    fn report(&self, error: BotError) {
        self.reported.lock().unwrap().push(error.to_string());
    }
}

pub struct CountingResolver {
    result: Result<PermissionLevel, PermissionError>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl CountingResolver {
    pub fn new(result: Result<PermissionLevel, PermissionError>) -> Self {
        Self {
            result,
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PermissionResolver for CountingResolver {
    async fn resolve(&self, _caller: &CallerContext) -> Result<PermissionLevel, PermissionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.result.clone()
    }
}
