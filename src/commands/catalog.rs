// catalog.rs - Command catalog
// Built once at startup, then shared read-only (behind an Arc) by the dispatcher and
// the help renderer. Names and aliases share one namespace and must be unique.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;

use crate::commands::admin::{CatalogDumpCommand, GuildInfoCommand};
use crate::commands::general::{AboutCommand, InviteCommand, PingCommand};
use crate::commands::help::HelpCommand;
use crate::commands::settings::{PermissionsCommand, SetupCommand};
use crate::commands::Command;
use crate::error::CatalogError;

#[derive(Default)]
pub struct CommandCatalog {
    /// Registration order
    commands: Vec<Arc<dyn Command>>,
    /// Name or alias -> index into `commands`
    index: HashMap<String, usize>,
}

impl CommandCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every command in order, stopping at the first collision
    pub fn build<I>(commands: I) -> Result<Self, CatalogError>
    where
        I: IntoIterator<Item = Arc<dyn Command>>,
    {
        let mut catalog = Self::new();
        for command in commands {
            catalog.register(command)?;
        }
        Ok(catalog)
    }

    /// Add a command. Fails without modifying the catalog if its name or any alias
    /// is already taken, or if it repeats one of its own tokens.
    pub fn register(&mut self, command: Arc<dyn Command>) -> Result<(), CatalogError> {
        let properties = command.properties();
        let mut tokens: Vec<String> = Vec::with_capacity(1 + properties.aliases.len());

        for token in properties.tokens() {
            if let Some(&existing) = self.index.get(token) {
                return Err(CatalogError::DuplicateName {
                    name: token.to_string(),
                    existing: self.commands[existing].properties().name.clone(),
                });
            }
            if tokens.iter().any(|seen| seen == token) {
                return Err(CatalogError::DuplicateName {
                    name: token.to_string(),
                    existing: properties.name.clone(),
                });
            }
            tokens.push(token.to_string());
        }

        let position = self.commands.len();
        for token in tokens {
            self.index.insert(token, position);
        }
        self.commands.push(command);
        Ok(())
    }

    /// Exact, case-sensitive match on a name or alias
    pub fn lookup(&self, token: &str) -> Option<&Arc<dyn Command>> {
        self.index.get(token).map(|&position| &self.commands[position])
    }

    /// Every command, in registration order
    pub fn all(&self) -> impl Iterator<Item = &Arc<dyn Command>> {
        self.commands.iter()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// The bot's built-in commands
pub fn default_catalog(started_at: DateTime<Utc>) -> Result<CommandCatalog, CatalogError> {
    CommandCatalog::build([
        Arc::new(HelpCommand::new()) as Arc<dyn Command>,
        Arc::new(PingCommand::new()),
        Arc::new(AboutCommand::new(started_at)),
        Arc::new(InviteCommand::new()),
        Arc::new(SetupCommand::new()),
        Arc::new(PermissionsCommand::new()),
        Arc::new(CatalogDumpCommand::new()),
        Arc::new(GuildInfoCommand::new()),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{CommandProperties, CATEGORY_ORDER};
    use crate::testing::TestCommand;
    use std::collections::HashSet;

    fn command(name: &str, aliases: &[&str]) -> Arc<dyn Command> {
        Arc::new(TestCommand::new(
            CommandProperties::new(name, "test").aliases(aliases.iter().copied()),
        ))
    }

    #[test]
    fn test_lookup_by_name_and_alias() {
        let catalog = CommandCatalog::build([command("help", &["h"]), command("ping", &[])]).unwrap();

        let by_name = catalog.lookup("help").unwrap();
        let by_alias = catalog.lookup("h").unwrap();
        assert!(Arc::ptr_eq(by_name, by_alias));
        assert_eq!(by_alias.properties().name, "help");
    }

    #[test]
    fn test_lookup_is_exact_and_case_sensitive() {
        let catalog = CommandCatalog::build([command("help", &["h"])]).unwrap();
        assert!(catalog.lookup("Help").is_none());
        assert!(catalog.lookup("hel").is_none());
        assert!(catalog.lookup("helpp").is_none());
        assert!(catalog.lookup("").is_none());
    }

    #[test]
    fn test_all_keeps_registration_order() {
        let catalog = CommandCatalog::build([command("zeta", &[]), command("alpha", &[]), command("mid", &[])]).unwrap();
        let names: Vec<_> = catalog.all().map(|c| c.properties().name.clone()).collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
        assert_eq!(catalog.len(), 3);
    }

    #[test]
    fn test_duplicate_name_is_rejected() {
        let mut catalog = CommandCatalog::build([command("help", &["h"])]).unwrap();
        let err = catalog.register(command("help", &[])).unwrap_err();
        assert_eq!(
            err,
            CatalogError::DuplicateName { name: "help".to_string(), existing: "help".to_string() }
        );
    }

    #[test]
    fn test_alias_colliding_with_name_or_alias_is_rejected() {
        let mut catalog = CommandCatalog::build([command("help", &["h"])]).unwrap();

        assert!(catalog.register(command("history", &["h"])).is_err());
        assert!(catalog.register(command("h", &[])).is_err());
        assert!(catalog.register(command("hello", &["help"])).is_err());

        // A failed registration leaves nothing behind
        assert_eq!(catalog.len(), 1);
        assert!(catalog.lookup("history").is_none());
        assert!(catalog.lookup("hello").is_none());
    }

    #[test]
    fn test_command_repeating_its_own_tokens_is_rejected() {
        let mut catalog = CommandCatalog::new();
        assert!(catalog.register(command("close", &["close"])).is_err());
        assert!(catalog.register(command("close", &["c", "c"])).is_err());
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_generated_registration_sets_keep_tokens_unique() {
        // Small deterministic LCG so every run explores the same sets
        let mut seed: u64 = 0x5eed;
        let mut next = move |bound: u64| {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            (seed >> 33) % bound
        };

        for _ in 0..200 {
            let mut catalog = CommandCatalog::new();
            let mut taken: HashSet<String> = HashSet::new();

            for _ in 0..12 {
                let name = format!("c{}", next(20));
                let aliases: Vec<String> = (0..next(3)).map(|_| format!("c{}", next(20))).collect();

                let mut tokens = vec![name.clone()];
                tokens.extend(aliases.iter().cloned());
                let unique_within = tokens.iter().collect::<HashSet<_>>().len() == tokens.len();
                let expected_ok = unique_within && tokens.iter().all(|t| !taken.contains(t));

                let result = catalog.register(Arc::new(TestCommand::new(
                    CommandProperties::new(name, "generated").aliases(aliases),
                )));
                assert_eq!(result.is_ok(), expected_ok);
                if expected_ok {
                    taken.extend(tokens);
                }
            }

            let mut seen = HashSet::new();
            for registered in catalog.all() {
                for token in registered.properties().tokens() {
                    assert!(seen.insert(token.to_string()), "token {} registered twice", token);
                }
            }
            assert_eq!(seen, taken);
        }
    }

    #[test]
    fn test_default_catalog_builds_and_categories_are_ordered() {
        let catalog = default_catalog(Utc::now()).unwrap();
        assert!(catalog.lookup("help").is_some());
        assert!(catalog.lookup("h").is_some());
        for command in catalog.all() {
            assert!(CATEGORY_ORDER.contains(&command.properties().category));
        }
    }
}
