// command_ids.rs - Command name -> application command id lookup
// Used by help to render clickable </name:id> mentions. A missing entry is never an
// error: the help line just falls back to the plain /name form.

use async_trait::async_trait;
use serenity::http::Http;
use serenity::model::id::{CommandId, UserId};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

pub type CommandIds = HashMap<String, CommandId>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to load command ids: {0}")]
pub struct LookupError(pub String);

#[async_trait]
pub trait CommandIdLookup: Send + Sync {
    /// Ids of the application commands registered for `bot_id`. May be partial or empty.
    async fn lookup(&self, bot_id: UserId) -> Result<CommandIds, LookupError>;
}

/// Fixed mapping, the same for every bot id
#[derive(Debug, Clone, Default)]
pub struct StaticCommandIds {
    ids: CommandIds,
}

impl StaticCommandIds {
    pub fn new(ids: CommandIds) -> Self {
        Self { ids }
    }
}

#[async_trait]
impl CommandIdLookup for StaticCommandIds {
    async fn lookup(&self, _bot_id: UserId) -> Result<CommandIds, LookupError> {
        Ok(self.ids.clone())
    }
}

/// Fetches global application commands from Discord, memoised per bot id.
/// Command ids only change when commands are re-registered, which `ready` does
/// through `remember`.
pub struct DiscordCommandIds {
    http: Arc<Http>,
    cache: RwLock<HashMap<UserId, CommandIds>>,
}

impl DiscordCommandIds {
    pub fn new(http: Arc<Http>) -> Self {
        Self {
            http,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Replace the cached ids for `bot_id`, e.g. right after registering commands
    pub async fn remember(&self, bot_id: UserId, ids: CommandIds) {
        self.cache.write().await.insert(bot_id, ids);
    }
}

#[async_trait]
impl CommandIdLookup for DiscordCommandIds {
    async fn lookup(&self, bot_id: UserId) -> Result<CommandIds, LookupError> {
        if let Some(ids) = self.cache.read().await.get(&bot_id) {
            return Ok(ids.clone());
        }

        let commands = self
            .http
            .get_global_application_commands()
            .await
            .map_err(|e| LookupError(e.to_string()))?;

        let ids: CommandIds = commands
            .into_iter()
            .map(|command| (command.name, command.id))
            .collect();

        log::debug!("[COMMAND_IDS] Loaded {} command ids for bot {}", ids.len(), bot_id);
        self.remember(bot_id, ids.clone()).await;
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_ids_ignore_bot_id() {
        let mut ids = CommandIds::new();
        ids.insert("help".to_string(), CommandId(42));
        let lookup = StaticCommandIds::new(ids);

        let first = lookup.lookup(UserId(1)).await.unwrap();
        let second = lookup.lookup(UserId(2)).await.unwrap();
        assert_eq!(first.get("help"), Some(&CommandId(42)));
        assert_eq!(first, second);
    }
}
