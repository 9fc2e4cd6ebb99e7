// commands/mod.rs - Command model and module registry
// Declares the command abstraction every bot command implements, the fixed category
// order used for presentation, and the submodules making up the dispatch pipeline.

pub mod admin;          // Bot admin / helper diagnostics (hidden from help)
pub mod catalog;        // Init-once name/alias registry
pub mod context;        // Caller and per-invocation command context
pub mod dispatch;       // Resolve -> authorize -> execute pipeline
pub mod eligibility;    // Who may see or run a command
pub mod general;        // ping, about, invite
pub mod help;           // Categorized command listing
pub mod settings;       // setup, permissions

use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use std::time::Duration;

use crate::error::CommandError;
use crate::permission::PermissionLevel;

pub use catalog::{default_catalog, CommandCatalog};
pub use context::{CallerContext, CommandContext};
pub use dispatch::{DispatchOutcome, Dispatcher, Invocation};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

// ============================================================================
// CATEGORIES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Category {
    General,
    Tickets,
    Settings,
    Moderation,
    Tags,
    Statistics,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::General => "General",
            Category::Tickets => "Tickets",
            Category::Settings => "Settings",
            Category::Moderation => "Moderation",
            Category::Tags => "Tags",
            Category::Statistics => "Statistics",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Presentation order of categories in help. Lists every category.
pub const CATEGORY_ORDER: &[Category] = &[
    Category::General,
    Category::Tickets,
    Category::Settings,
    Category::Moderation,
    Category::Tags,
    Category::Statistics,
];

// ============================================================================
// PROPERTIES
// ============================================================================

/// How a command is invoked on the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum InvocationType {
    /// Slash command
    ChatInput,
    /// User context menu
    User,
    /// Message context menu
    Message,
    /// Prefix-only text command
    Text,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Argument {
    pub name: String,
    pub description: String,
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandProperties {
    pub name: String,
    pub aliases: Vec<String>,
    pub description: String,
    pub invocation_type: InvocationType,
    pub permission_level: PermissionLevel,
    pub category: Category,
    pub admin_only: bool,
    pub helper_only: bool,
    pub main_bot_only: bool,
    pub default_ephemeral: bool,
    pub timeout: Duration,
    pub arguments: Vec<Argument>,
}

impl CommandProperties {
    /// A slash command everyone may run, in General, with the default 5s timeout
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            aliases: Vec::new(),
            description: description.into(),
            invocation_type: InvocationType::ChatInput,
            permission_level: PermissionLevel::Everyone,
            category: Category::General,
            admin_only: false,
            helper_only: false,
            main_bot_only: false,
            default_ephemeral: false,
            timeout: DEFAULT_TIMEOUT,
            arguments: Vec::new(),
        }
    }

    pub fn aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases = aliases.into_iter().map(Into::into).collect();
        self
    }

    pub fn invocation_type(mut self, invocation_type: InvocationType) -> Self {
        self.invocation_type = invocation_type;
        self
    }

    pub fn permission_level(mut self, level: PermissionLevel) -> Self {
        self.permission_level = level;
        self
    }

    pub fn category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    pub fn admin_only(mut self) -> Self {
        self.admin_only = true;
        self
    }

    pub fn helper_only(mut self) -> Self {
        self.helper_only = true;
        self
    }

    pub fn main_bot_only(mut self) -> Self {
        self.main_bot_only = true;
        self
    }

    pub fn ephemeral(mut self) -> Self {
        self.default_ephemeral = true;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn argument(mut self, name: impl Into<String>, description: impl Into<String>, required: bool) -> Self {
        self.arguments.push(Argument {
            name: name.into(),
            description: description.into(),
            required,
        });
        self
    }

    /// Name followed by aliases
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.aliases.iter().map(String::as_str))
    }
}

// ============================================================================
// COMMAND
// ============================================================================

/// A registered command. The catalog only ever sees this trait.
#[async_trait]
pub trait Command: Send + Sync {
    fn properties(&self) -> &CommandProperties;

    async fn execute(&self, ctx: &CommandContext) -> Result<(), CommandError>;
}
