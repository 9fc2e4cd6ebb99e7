// general.rs - General commands available to everyone
// ping  - measures how long the reply takes to go out
// about - bot status summary
// invite - invite link for the main bot (hidden on whitelabel deployments)

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serenity::model::id::UserId;
use std::time::Instant;

use crate::commands::context::CommandContext;
use crate::commands::{Category, Command, CommandProperties};
use crate::error::CommandError;
use crate::reply::{Embed, Response};

// ============================================================================
// PING
// ============================================================================

pub struct PingCommand {
    properties: CommandProperties,
}

impl PingCommand {
    pub fn new() -> Self {
        Self {
            properties: CommandProperties::new("ping", "Measures the bot's response time")
                .aliases(["latency"])
                .category(Category::General),
        }
    }
}

#[async_trait]
impl Command for PingCommand {
    fn properties(&self) -> &CommandProperties {
        &self.properties
    }

    async fn execute(&self, ctx: &CommandContext) -> Result<(), CommandError> {
        let start_time = Instant::now();
        ctx.reply(Response::text("Pong! 🏓")).await?;
        log::debug!(
            "[PING] {} reply delivered in {}ms",
            ctx.invocation_id,
            start_time.elapsed().as_millis()
        );
        Ok(())
    }
}

// ============================================================================
// ABOUT
// ============================================================================

pub struct AboutCommand {
    properties: CommandProperties,
    started_at: DateTime<Utc>,
}

impl AboutCommand {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            properties: CommandProperties::new("about", "Tells you information about the bot")
                .category(Category::General)
                .ephemeral(),
            started_at,
        }
    }
}

/// "2d 3h 4m" style uptime
fn format_uptime(started_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let minutes = (now - started_at).num_minutes().max(0);
    let (days, hours, minutes) = (minutes / 1440, (minutes / 60) % 24, minutes % 60);
    if days > 0 {
        format!("{}d {}h {}m", days, hours, minutes)
    } else if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else {
        format!("{}m", minutes)
    }
}

#[async_trait]
impl Command for AboutCommand {
    fn properties(&self) -> &CommandProperties {
        &self.properties
    }

    async fn execute(&self, ctx: &CommandContext) -> Result<(), CommandError> {
        let deployment = if ctx.caller.is_whitelabel { "Whitelabel" } else { "Main bot" };
        let embed = Embed::new("About")
            .field("Uptime", format_uptime(self.started_at, Utc::now()), true)
            .field("Commands", ctx.catalog.len().to_string(), true)
            .field("Deployment", deployment, true);

        ctx.reply(Response::embed(embed).ephemeral(self.properties.default_ephemeral))
            .await
    }
}

// ============================================================================
// INVITE
// ============================================================================

/// Administrator
const INVITE_PERMISSIONS: u64 = 8;

pub struct InviteCommand {
    properties: CommandProperties,
}

impl InviteCommand {
    pub fn new() -> Self {
        Self {
            properties: CommandProperties::new("invite", "Gives you a link to invite the bot to your own server")
                .category(Category::General)
                .main_bot_only()
                .ephemeral(),
        }
    }
}

pub fn invite_url(bot_id: UserId) -> String {
    format!(
        "https://discord.com/oauth2/authorize?client_id={}&scope=bot%20applications.commands&permissions={}",
        bot_id.0, INVITE_PERMISSIONS
    )
}

#[async_trait]
impl Command for InviteCommand {
    fn properties(&self) -> &CommandProperties {
        &self.properties
    }

    async fn execute(&self, ctx: &CommandContext) -> Result<(), CommandError> {
        let embed = Embed::new("Invite").description(format!(
            "Click [here]({}) to invite the bot to your server",
            invite_url(ctx.caller.bot_id)
        ));
        ctx.reply(Response::embed(embed).ephemeral(self.properties.default_ephemeral))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permission::PermissionLevel;
    use crate::reply::Content;
    use crate::testing::{command_context, RecordingReply};
    use chrono::Duration;
    use std::sync::Arc;

    #[test]
    fn test_format_uptime() {
        let start = Utc::now();
        assert_eq!(format_uptime(start, start + Duration::minutes(5)), "5m");
        assert_eq!(format_uptime(start, start + Duration::minutes(125)), "2h 5m");
        assert_eq!(format_uptime(start, start + Duration::minutes(2 * 1440 + 61)), "2d 1h 1m");
        assert_eq!(format_uptime(start, start - Duration::minutes(3)), "0m");
    }

    #[test]
    fn test_invite_url_uses_bot_id() {
        let url = invite_url(UserId(508391840525975553));
        assert!(url.contains("client_id=508391840525975553"));
        assert!(url.contains("applications.commands"));
    }

    #[test]
    fn test_invite_is_main_bot_only() {
        assert!(InviteCommand::new().properties().main_bot_only);
    }

    #[tokio::test]
    async fn test_ping_replies() {
        let reply = Arc::new(RecordingReply::new());
        let ctx = command_context(reply.clone(), PermissionLevel::Everyone);

        PingCommand::new().execute(&ctx).await.unwrap();
        assert_eq!(reply.responses(), vec![Response::text("Pong! 🏓")]);
    }

    #[tokio::test]
    async fn test_about_reports_deployment() {
        let reply = Arc::new(RecordingReply::new());
        let mut ctx = command_context(reply.clone(), PermissionLevel::Everyone);
        ctx.caller.is_whitelabel = true;

        AboutCommand::new(Utc::now()).execute(&ctx).await.unwrap();
        let Content::Embed(embed) = &reply.responses()[0].content else {
            panic!("about should reply with an embed");
        };
        assert!(embed.fields.iter().any(|f| f.name == "Deployment" && f.value == "Whitelabel"));
    }
}
