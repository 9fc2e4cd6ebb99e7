// admin.rs - Bot staff diagnostics
// Text-only commands for bot admins and helpers. They never show up in help and are
// not registered as slash commands.

use async_trait::async_trait;

use crate::commands::context::CommandContext;
use crate::commands::{Category, Command, CommandProperties, InvocationType};
use crate::error::CommandError;
use crate::reply::Response;

/// Discord rejects messages longer than this
const MESSAGE_LIMIT: usize = 2000;

pub struct CatalogDumpCommand {
    properties: CommandProperties,
}

impl CatalogDumpCommand {
    pub fn new() -> Self {
        Self {
            properties: CommandProperties::new("admincatalog", "Dumps the registered command properties")
                .aliases(["acatalog"])
                .invocation_type(InvocationType::Text)
                .category(Category::Statistics)
                .admin_only(),
        }
    }
}

#[async_trait]
impl Command for CatalogDumpCommand {
    fn properties(&self) -> &CommandProperties {
        &self.properties
    }

    async fn execute(&self, ctx: &CommandContext) -> Result<(), CommandError> {
        // Optional argument narrows the dump to one command
        let wanted = ctx.args.trim();
        let properties: Vec<&CommandProperties> = ctx
            .catalog
            .all()
            .map(|command| command.properties())
            .filter(|properties| wanted.is_empty() || properties.name == wanted)
            .collect();

        if properties.is_empty() {
            return Err(CommandError::InvalidArguments(format!("no command named `{}`", wanted)));
        }

        let json = serde_json::to_string_pretty(&properties)
            .map_err(|e| CommandError::Failed(format!("failed to serialize catalog: {}", e)))?;

        for chunk in code_block_chunks(&json, MESSAGE_LIMIT) {
            ctx.reply(Response::text(chunk)).await?;
        }
        Ok(())
    }
}

/// Split `text` on line boundaries into ```json blocks that fit in `limit` characters
fn code_block_chunks(text: &str, limit: usize) -> Vec<String> {
    const OPEN: &str = "```json\n";
    const CLOSE: &str = "```";
    // At least one character per line, even when the fences alone exceed the limit
    let budget = limit.saturating_sub(OPEN.len() + CLOSE.len()).max(2);

    let mut chunks = Vec::new();
    let mut current = String::new();
    for line in text.lines() {
        // Over-long single lines are cut rather than dropped
        let line: String = line.chars().take(budget - 1).collect();
        if !current.is_empty() && current.len() + line.len() + 1 > budget {
            chunks.push(format!("{}{}{}", OPEN, current, CLOSE));
            current.clear();
        }
        current.push_str(&line);
        current.push('\n');
    }
    if !current.is_empty() {
        chunks.push(format!("{}{}{}", OPEN, current, CLOSE));
    }
    chunks
}

pub struct GuildInfoCommand {
    properties: CommandProperties,
}

impl GuildInfoCommand {
    pub fn new() -> Self {
        Self {
            properties: CommandProperties::new("helperinfo", "Shows ids and the resolved level for this invocation")
                .invocation_type(InvocationType::Text)
                .category(Category::Statistics)
                .helper_only(),
        }
    }
}

#[async_trait]
impl Command for GuildInfoCommand {
    fn properties(&self) -> &CommandProperties {
        &self.properties
    }

    async fn execute(&self, ctx: &CommandContext) -> Result<(), CommandError> {
        let guild = ctx
            .caller
            .guild_id
            .map(|id| id.0.to_string())
            .unwrap_or_else(|| "direct message".to_string());

        let text = format!(
            "**Guild:** {}\n**User:** {}\n**Bot:** {}\n**Level:** {}\n**Whitelabel:** {}",
            guild, ctx.caller.user_id.0, ctx.caller.bot_id.0, ctx.permission_level, ctx.caller.is_whitelabel
        );
        ctx.reply(Response::text(text)).await
    }
}
