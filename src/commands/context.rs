// context.rs - Who is invoking, and what a running command gets to work with

use log::debug;
use serenity::model::id::{GuildId, UserId};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::command_ids::CommandIdLookup;
use crate::commands::catalog::CommandCatalog;
use crate::config::BotConfig;
use crate::error::{CommandError, DeliveryError};
use crate::permission::PermissionLevel;
use crate::reply::{ReplySink, Response};

/// Identity and deployment facts for one invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerContext {
    /// None for direct messages
    pub guild_id: Option<GuildId>,
    pub user_id: UserId,
    pub bot_id: UserId,
    pub is_whitelabel: bool,
    pub is_bot_admin: bool,
    pub is_bot_helper: bool,
}

impl CallerContext {
    pub fn from_config(config: &BotConfig, guild_id: Option<GuildId>, user_id: UserId, bot_id: UserId) -> Self {
        Self {
            guild_id,
            user_id,
            bot_id,
            is_whitelabel: config.whitelabel,
            is_bot_admin: config.is_bot_admin(user_id),
            is_bot_helper: config.is_bot_helper(user_id),
        }
    }
}

/// Everything a command handler receives. Built by the dispatcher once the caller
/// has been authorized; lives for a single invocation.
pub struct CommandContext {
    pub invocation_id: Uuid,
    pub caller: CallerContext,
    /// Resolved once by the dispatcher for this invocation
    pub permission_level: PermissionLevel,
    pub args: String,
    pub catalog: Arc<CommandCatalog>,
    pub command_ids: Arc<dyn CommandIdLookup>,
    pub deadline: Instant,
    pub cancel: CancellationToken,
    pub(crate) reply: Arc<dyn ReplySink>,
}

impl CommandContext {
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Send a reply. An unreachable recipient is expected and swallowed; any other
    /// delivery failure is returned. Gives up as soon as the invocation is cancelled.
    pub async fn reply(&self, response: Response) -> Result<(), CommandError> {
        let result = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(CommandError::Cancelled),
            result = self.reply.send(response) => result,
        };

        match result {
            Ok(()) => Ok(()),
            Err(DeliveryError::Unreachable) => {
                debug!("[REPLY] {} recipient {} unreachable, dropping reply", self.invocation_id, self.caller.user_id);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}
