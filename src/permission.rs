// permission.rs - Caller permission levels and how they are resolved
// A caller's level is resolved fresh for every invocation: guild roles can change at
// any time, so nothing here caches results across calls.

use async_trait::async_trait;
use serde::Serialize;
use serenity::http::Http;
use serenity::model::id::{GuildId, RoleId, UserId};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use crate::commands::context::CallerContext;
use crate::error::PermissionError;

/// Guild-scoped permission level. Ordered: a caller may run a command when their
/// level is greater than or equal to the command's required level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum PermissionLevel {
    Everyone,
    Support,
    Admin,
}

impl PermissionLevel {
    pub const ALL: [PermissionLevel; 3] = [
        PermissionLevel::Everyone,
        PermissionLevel::Support,
        PermissionLevel::Admin,
    ];
}

impl fmt::Display for PermissionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PermissionLevel::Everyone => "Everyone",
            PermissionLevel::Support => "Support",
            PermissionLevel::Admin => "Admin",
        };
        f.write_str(name)
    }
}

#[async_trait]
pub trait PermissionResolver: Send + Sync {
    async fn resolve(&self, caller: &CallerContext) -> Result<PermissionLevel, PermissionError>;
}

/// Role ids that grant elevated levels inside a guild
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleMappings {
    pub admin_roles: HashSet<RoleId>,
    pub support_roles: HashSet<RoleId>,
}

impl RoleMappings {
    /// Level granted by a member's roles. `administrator` is true when any of the
    /// member's roles (other than @everyone) carries the Administrator permission.
    pub fn level_for(&self, member_roles: &[RoleId], administrator: bool) -> PermissionLevel {
        if administrator || member_roles.iter().any(|role| self.admin_roles.contains(role)) {
            PermissionLevel::Admin
        } else if member_roles.iter().any(|role| self.support_roles.contains(role)) {
            PermissionLevel::Support
        } else {
            PermissionLevel::Everyone
        }
    }
}

/// Resolves levels from live guild data: the owner is Admin, roles with the
/// Administrator permission are Admin, then the configured role mappings apply.
pub struct RolePermissionResolver {
    http: Arc<Http>,
    roles: RoleMappings,
}

impl RolePermissionResolver {
    pub fn new(http: Arc<Http>, roles: RoleMappings) -> Self {
        Self { http, roles }
    }
}

#[async_trait]
impl PermissionResolver for RolePermissionResolver {
    async fn resolve(&self, caller: &CallerContext) -> Result<PermissionLevel, PermissionError> {
        // Direct messages have no guild roles
        let Some(guild_id) = caller.guild_id else {
            return Ok(PermissionLevel::Everyone);
        };

        let guild = self
            .http
            .get_guild(guild_id.0)
            .await
            .map_err(|e| PermissionError::Fetch(e.to_string()))?;

        if guild.owner_id == caller.user_id {
            return Ok(PermissionLevel::Admin);
        }

        let member = self
            .http
            .get_member(guild_id.0, caller.user_id.0)
            .await
            .map_err(|e| PermissionError::Fetch(e.to_string()))?;

        let administrator = member.roles.iter().any(|role_id| {
            // @everyone shares the guild's id and never counts, even with Administrator
            role_id.0 != guild_id.0
                && guild
                    .roles
                    .get(role_id)
                    .map_or(false, |role| role.permissions.administrator())
        });

        Ok(self.roles.level_for(&member.roles, administrator))
    }
}

/// Fixed per-user levels, with a fallback for everyone else.
#[derive(Debug, Clone)]
pub struct StaticPermissionResolver {
    levels: HashMap<(Option<GuildId>, UserId), PermissionLevel>,
    default: PermissionLevel,
}

impl StaticPermissionResolver {
    pub fn new(default: PermissionLevel) -> Self {
        Self {
            levels: HashMap::new(),
            default,
        }
    }

    pub fn with_level(mut self, guild_id: Option<GuildId>, user_id: UserId, level: PermissionLevel) -> Self {
        self.levels.insert((guild_id, user_id), level);
        self
    }
}

#[async_trait]
impl PermissionResolver for StaticPermissionResolver {
    async fn resolve(&self, caller: &CallerContext) -> Result<PermissionLevel, PermissionError> {
        Ok(self
            .levels
            .get(&(caller.guild_id, caller.user_id))
            .copied()
            .unwrap_or(self.default))
    }
}
