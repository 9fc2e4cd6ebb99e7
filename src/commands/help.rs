// help.rs - Help command and command listing renderer
// Lists every command the caller could invoke as a slash command, grouped by category
// in CATEGORY_ORDER and sorted by name inside each category.

use async_trait::async_trait;
use log::warn;
use serenity::model::id::CommandId;
use std::collections::HashMap;

use crate::command_ids::CommandIds;
use crate::commands::catalog::CommandCatalog;
use crate::commands::context::{CallerContext, CommandContext};
use crate::commands::eligibility::{self, FilterMode};
use crate::commands::{Category, Command, CommandProperties, CATEGORY_ORDER};
use crate::error::CommandError;
use crate::permission::PermissionLevel;
use crate::reply::{Embed, Response, COLOUR_GREEN};

const HELP_TITLE: &str = "Help";

// ============================================================================
// RENDERER
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelpSection {
    pub category: Category,
    /// One formatted line per command, sorted by command name
    pub lines: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HelpListing {
    pub sections: Vec<HelpSection>,
}

impl HelpListing {
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn categories(&self) -> Vec<Category> {
        self.sections.iter().map(|section| section.category).collect()
    }

    /// One embed, one field per non-empty category
    pub fn into_response(self, ephemeral: bool) -> Response {
        let embed = self
            .sections
            .into_iter()
            .fold(Embed::new(HELP_TITLE).colour(COLOUR_GREEN), |embed, section| {
                embed.field(section.category.as_str(), section.lines.join("\n"), false)
            });
        Response::embed(embed).ephemeral(ephemeral)
    }
}

#[derive(Debug, Clone)]
pub struct HelpRenderer {
    order: Vec<Category>,
}

impl Default for HelpRenderer {
    fn default() -> Self {
        Self::new(CATEGORY_ORDER)
    }
}

impl HelpRenderer {
    /// Categories missing from `order` are never rendered
    pub fn new(order: &[Category]) -> Self {
        Self {
            order: order.to_vec(),
        }
    }

    pub fn render(
        &self,
        catalog: &CommandCatalog,
        caller: &CallerContext,
        level: PermissionLevel,
        command_ids: &HashMap<String, CommandId>,
    ) -> HelpListing {
        // Seed every category up front so the output follows `order`, not registration order
        let mut groups: Vec<(Category, Vec<&CommandProperties>)> =
            self.order.iter().map(|category| (*category, Vec::new())).collect();

        for command in catalog.all() {
            let properties = command.properties();
            if !eligibility::is_eligible(properties, caller, level, FilterMode::HelpListing) {
                continue;
            }

            if let Some((_, group)) = groups.iter_mut().find(|(category, _)| *category == properties.category) {
                group.push(properties);
            }
        }

        let sections = groups
            .into_iter()
            .filter(|(_, group)| !group.is_empty())
            .map(|(category, mut group)| {
                group.sort_by(|a, b| a.name.cmp(&b.name));
                HelpSection {
                    category,
                    lines: group
                        .into_iter()
                        .map(|properties| format_help_line(properties, command_ids.get(&properties.name).copied()))
                        .collect(),
                }
            })
            .collect();

        HelpListing { sections }
    }
}

/// `</name:id> - description` when the command id is known, `/name - description` otherwise
pub fn format_help_line(properties: &CommandProperties, command_id: Option<CommandId>) -> String {
    match command_id {
        Some(id) => format!("</{}:{}> - {}", properties.name, id.0, properties.description),
        None => format!("/{} - {}", properties.name, properties.description),
    }
}

// ============================================================================
// COMMAND
// ============================================================================

pub struct HelpCommand {
    properties: CommandProperties,
    renderer: HelpRenderer,
}

impl HelpCommand {
    pub fn new() -> Self {
        Self {
            properties: CommandProperties::new("help", "Shows you a list of commands")
                .aliases(["h"])
                .category(Category::General)
                .permission_level(PermissionLevel::Everyone)
                .ephemeral(),
            renderer: HelpRenderer::default(),
        }
    }
}

#[async_trait]
impl Command for HelpCommand {
    fn properties(&self) -> &CommandProperties {
        &self.properties
    }

    async fn execute(&self, ctx: &CommandContext) -> Result<(), CommandError> {
        // Missing ids only cost the clickable mentions
        let command_ids = match ctx.command_ids.lookup(ctx.caller.bot_id).await {
            Ok(ids) => ids,
            Err(e) => {
                warn!("[HELP] {} {}, falling back to plain names", ctx.invocation_id, e);
                CommandIds::new()
            }
        };

        let listing = self
            .renderer
            .render(&ctx.catalog, &ctx.caller, ctx.permission_level, &command_ids);

        ctx.reply(listing.into_response(self.properties.default_ephemeral)).await
    }
}
