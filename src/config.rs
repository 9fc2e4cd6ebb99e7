// config.rs - Bot configuration loading
// Reads botconfig.txt (KEY=VALUE lines) from the usual fallback locations and turns it
// into a typed BotConfig that is built once at startup and shared read-only.
//
// Recognised keys:
//   DISCORD_TOKEN  - bot token (required)
//   PREFIX         - prefix for text commands (default "!")
//   WHITELABEL     - true when this instance is a customer-branded deployment
//   BOT_ADMINS     - comma separated user ids with bot-admin rights
//   BOT_HELPERS    - comma separated user ids with bot-helper rights
//   ADMIN_ROLES    - comma separated role ids granting the Admin permission level
//   SUPPORT_ROLES  - comma separated role ids granting the Support permission level

use serenity::model::id::{RoleId, UserId};
use std::collections::HashSet;
use std::fs;

use crate::error::ConfigError;
use crate::permission::RoleMappings;

const CONFIG_PATHS: [&str; 4] = [
    "botconfig.txt",
    "../botconfig.txt",
    "../../botconfig.txt",
    "src/botconfig.txt",
];

const TOKEN_PLACEHOLDER: &str = "YOUR_BOT_TOKEN_HERE";
const DEFAULT_PREFIX: &str = "!";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotConfig {
    pub token: String,
    pub prefix: String,
    pub whitelabel: bool,
    pub bot_admins: HashSet<UserId>,
    pub bot_helpers: HashSet<UserId>,
    pub roles: RoleMappings,
}

impl BotConfig {
    pub fn is_bot_admin(&self, user_id: UserId) -> bool {
        self.bot_admins.contains(&user_id)
    }

    pub fn is_bot_helper(&self, user_id: UserId) -> bool {
        self.bot_helpers.contains(&user_id)
    }
}

/// Load botconfig.txt from the first location that exists
pub fn load_bot_config() -> Result<BotConfig, ConfigError> {
    for config_path in &CONFIG_PATHS {
        match fs::read_to_string(config_path) {
            Ok(content) => {
                log::info!("Configuration loaded from {}", config_path);
                return parse_bot_config(&content);
            }
            // Try next path
            Err(_) => continue,
        }
    }

    Err(ConfigError::NotFound)
}

/// Parse the contents of a botconfig.txt file
pub fn parse_bot_config(content: &str) -> Result<BotConfig, ConfigError> {
    // Remove BOM if present
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);

    let mut token = None;
    let mut prefix = None;
    let mut whitelabel = false;
    let mut bot_admins = HashSet::new();
    let mut bot_helpers = HashSet::new();
    let mut roles = RoleMappings::default();

    for line in content.lines() {
        let line = line.trim();

        // Skip empty lines and comments
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let value = value.trim();

        match key.trim() {
            "DISCORD_TOKEN" => token = Some(value.to_string()),
            "PREFIX" => {
                if !value.is_empty() {
                    prefix = Some(value.to_string());
                }
            }
            "WHITELABEL" => whitelabel = parse_bool("WHITELABEL", value)?,
            "BOT_ADMINS" => bot_admins = parse_ids("BOT_ADMINS", value)?.into_iter().map(UserId).collect(),
            "BOT_HELPERS" => bot_helpers = parse_ids("BOT_HELPERS", value)?.into_iter().map(UserId).collect(),
            "ADMIN_ROLES" => roles.admin_roles = parse_ids("ADMIN_ROLES", value)?.into_iter().map(RoleId).collect(),
            "SUPPORT_ROLES" => roles.support_roles = parse_ids("SUPPORT_ROLES", value)?.into_iter().map(RoleId).collect(),
            other => log::debug!("Ignoring unknown config key '{}'", other),
        }
    }

    let token = token.ok_or(ConfigError::Missing("DISCORD_TOKEN"))?;
    if token.is_empty() || token == TOKEN_PLACEHOLDER {
        return Err(ConfigError::Placeholder("DISCORD_TOKEN"));
    }

    Ok(BotConfig {
        token,
        prefix: prefix.unwrap_or_else(|| DEFAULT_PREFIX.to_string()),
        whitelabel,
        bot_admins,
        bot_helpers,
        roles,
    })
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" | "" => Ok(false),
        _ => Err(ConfigError::Invalid { key, value: value.to_string() }),
    }
}

fn parse_ids(key: &'static str, value: &str) -> Result<Vec<u64>, ConfigError> {
    value
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(|id| {
            id.parse::<u64>().map_err(|_| ConfigError::Invalid {
                key,
                value: id.to_string(),
            })
        })
        .collect()
}
