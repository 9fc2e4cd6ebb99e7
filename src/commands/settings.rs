// settings.rs - Guild setup commands
// setup       - quick start guide for server admins (main bot only; whitelabel
//               customers get their own onboarding)
// permissions - shows the caller which permission level the bot resolved for them

use async_trait::async_trait;

use crate::commands::context::CommandContext;
use crate::commands::{Category, Command, CommandProperties};
use crate::error::CommandError;
use crate::permission::PermissionLevel;
use crate::reply::{Embed, Response};

pub struct SetupCommand {
    properties: CommandProperties,
}

impl SetupCommand {
    pub fn new() -> Self {
        Self {
            properties: CommandProperties::new("setup", "Shows how to set the bot up in this server")
                .category(Category::Settings)
                .permission_level(PermissionLevel::Admin)
                .main_bot_only()
                .ephemeral(),
        }
    }
}

fn setup_guide() -> Embed {
    Embed::new("Setup")
        .description("Below is a quick guide on setting the bot up in your server.")
        .field(
            "Adding Staff",
            "Staff must be known to the bot before they can answer tickets. Give them one of the \
             configured support roles, or an admin role to let them change the bot's settings.",
            false,
        )
        .field(
            "Panels",
            "Panels let members open tickets with a single click. Create one from the dashboard.",
            false,
        )
        .field(
            "Commands",
            "Use `/help` at any time to see every command available to you.",
            false,
        )
}

#[async_trait]
impl Command for SetupCommand {
    fn properties(&self) -> &CommandProperties {
        &self.properties
    }

    async fn execute(&self, ctx: &CommandContext) -> Result<(), CommandError> {
        if ctx.caller.guild_id.is_none() {
            return Err(CommandError::InvalidArguments(
                "setup can only be run inside a server".to_string(),
            ));
        }

        ctx.reply(Response::embed(setup_guide()).ephemeral(self.properties.default_ephemeral))
            .await
    }
}

pub struct PermissionsCommand {
    properties: CommandProperties,
}

impl PermissionsCommand {
    pub fn new() -> Self {
        Self {
            properties: CommandProperties::new("permissions", "Shows your permission level in this server")
                .aliases(["perms"])
                .category(Category::Settings)
                .permission_level(PermissionLevel::Support)
                .ephemeral(),
        }
    }
}

#[async_trait]
impl Command for PermissionsCommand {
    fn properties(&self) -> &CommandProperties {
        &self.properties
    }

    async fn execute(&self, ctx: &CommandContext) -> Result<(), CommandError> {
        let text = format!("Your permission level in this server is **{}**", ctx.permission_level);
        ctx.reply(Response::text(text).ephemeral(self.properties.default_ephemeral))
            .await
    }
}
