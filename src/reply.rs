// reply.rs - Platform-neutral replies
// Commands build a Response and hand it to a ReplySink. The Discord-backed sinks live
// in discord.rs; this module only describes what a reply looks like.

use async_trait::async_trait;

use crate::error::DeliveryError;

pub const COLOUR_GREEN: u32 = 0x2ECC71;
pub const COLOUR_RED: u32 = 0xE74C3C;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Embed {
    pub title: String,
    pub description: Option<String>,
    pub colour: u32,
    pub fields: Vec<EmbedField>,
    pub footer: Option<String>,
}

impl Embed {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            colour: COLOUR_GREEN,
            fields: Vec::new(),
            footer: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn colour(mut self, colour: u32) -> Self {
        self.colour = colour;
        self
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>, inline: bool) -> Self {
        self.fields.push(EmbedField {
            name: name.into(),
            value: value.into(),
            inline,
        });
        self
    }

    pub fn footer(mut self, footer: impl Into<String>) -> Self {
        self.footer = Some(footer.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    Text(String),
    Embed(Embed),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub content: Content,
    /// Only visible to the invoking user, where the platform supports it
    pub ephemeral: bool,
}

impl Response {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: Content::Text(text.into()),
            ephemeral: false,
        }
    }

    pub fn embed(embed: Embed) -> Self {
        Self {
            content: Content::Embed(embed),
            ephemeral: false,
        }
    }

    pub fn ephemeral(mut self, ephemeral: bool) -> Self {
        self.ephemeral = ephemeral;
        self
    }
}

/// Where a command's reply goes. Implementations report `DeliveryError::Unreachable`
/// when the recipient can't be messaged so callers can swallow it.
#[async_trait]
pub trait ReplySink: Send + Sync {
    async fn send(&self, response: Response) -> Result<(), DeliveryError>;
}
