// eligibility.rs - Who may see or run a command
// Dispatch and help both go through `check`, so anything listed in help can be
// invoked and anything that can be invoked (as a slash command) is listed.

use thiserror::Error;

use crate::commands::context::CallerContext;
use crate::commands::{CommandProperties, InvocationType};
use crate::permission::PermissionLevel;

/// Where the check is being made
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    /// An incoming invocation; its type is already known from the event
    Dispatch,
    /// Building the help listing, which only shows slash commands
    HelpListing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Ineligibility {
    #[error("command is restricted to bot admins")]
    AdminOnly,
    #[error("command is restricted to bot helpers")]
    HelperOnly,
    #[error("command is not a slash command")]
    NotSlashCommand,
    #[error("command is unavailable on whitelabel deployments")]
    MainBotOnly,
    #[error("command requires {required}, caller has {actual}")]
    InsufficientPermission {
        required: PermissionLevel,
        actual: PermissionLevel,
    },
}

/// Evaluate the restrictions in order, stopping at the first that fails:
/// bot admin/helper role, slash-only (help only), whitelabel deployment, level.
pub fn check(
    properties: &CommandProperties,
    caller: &CallerContext,
    level: PermissionLevel,
    mode: FilterMode,
) -> Result<(), Ineligibility> {
    // Both flags set means both roles are required
    if properties.admin_only && !caller.is_bot_admin {
        return Err(Ineligibility::AdminOnly);
    }
    if properties.helper_only && !caller.is_bot_helper {
        return Err(Ineligibility::HelperOnly);
    }

    if mode == FilterMode::HelpListing && properties.invocation_type != InvocationType::ChatInput {
        return Err(Ineligibility::NotSlashCommand);
    }

    if properties.main_bot_only && caller.is_whitelabel {
        return Err(Ineligibility::MainBotOnly);
    }

    if level < properties.permission_level {
        return Err(Ineligibility::InsufficientPermission {
            required: properties.permission_level,
            actual: level,
        });
    }

    Ok(())
}

pub fn is_eligible(
    properties: &CommandProperties,
    caller: &CallerContext,
    level: PermissionLevel,
    mode: FilterMode,
) -> bool {
    check(properties, caller, level, mode).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::caller;

    const MODES: [FilterMode; 2] = [FilterMode::Dispatch, FilterMode::HelpListing];

    #[test]
    fn test_permission_level_gate() {
        let properties = CommandProperties::new("addadmin", "test").permission_level(PermissionLevel::Admin);
        let caller = caller();

        assert_eq!(
            check(&properties, &caller, PermissionLevel::Support, FilterMode::Dispatch),
            Err(Ineligibility::InsufficientPermission {
                required: PermissionLevel::Admin,
                actual: PermissionLevel::Support,
            })
        );
        assert!(is_eligible(&properties, &caller, PermissionLevel::Admin, FilterMode::Dispatch));
    }

    #[test]
    fn test_role_restrictions() {
        let admin_only = CommandProperties::new("a", "test").admin_only();
        let helper_only = CommandProperties::new("h", "test").helper_only();
        let both = CommandProperties::new("b", "test").admin_only().helper_only();

        let mut user = caller();
        assert_eq!(check(&admin_only, &user, PermissionLevel::Admin, FilterMode::Dispatch), Err(Ineligibility::AdminOnly));
        assert_eq!(check(&helper_only, &user, PermissionLevel::Admin, FilterMode::Dispatch), Err(Ineligibility::HelperOnly));

        user.is_bot_admin = true;
        assert!(is_eligible(&admin_only, &user, PermissionLevel::Everyone, FilterMode::Dispatch));
        // Admin alone is not enough when both are set
        assert_eq!(check(&both, &user, PermissionLevel::Everyone, FilterMode::Dispatch), Err(Ineligibility::HelperOnly));

        user.is_bot_helper = true;
        assert!(is_eligible(&both, &user, PermissionLevel::Everyone, FilterMode::Dispatch));
    }

    #[test]
    fn test_slash_only_applies_to_help_listing() {
        let text = CommandProperties::new("legacy", "test").invocation_type(InvocationType::Text);
        let caller = caller();

        assert!(is_eligible(&text, &caller, PermissionLevel::Everyone, FilterMode::Dispatch));
        assert_eq!(
            check(&text, &caller, PermissionLevel::Everyone, FilterMode::HelpListing),
            Err(Ineligibility::NotSlashCommand)
        );
    }

    #[test]
    fn test_main_bot_only_excluded_on_whitelabel_at_any_level() {
        let setup = CommandProperties::new("setup", "test").main_bot_only();
        let mut caller = caller();

        assert!(is_eligible(&setup, &caller, PermissionLevel::Everyone, FilterMode::HelpListing));

        caller.is_whitelabel = true;
        caller.is_bot_admin = true;
        for mode in MODES {
            for level in PermissionLevel::ALL {
                assert_eq!(check(&setup, &caller, level, mode), Err(Ineligibility::MainBotOnly));
            }
        }
    }

    #[test]
    fn test_short_circuits_in_declared_order() {
        let everything = CommandProperties::new("x", "test")
            .admin_only()
            .invocation_type(InvocationType::Text)
            .main_bot_only()
            .permission_level(PermissionLevel::Admin);
        let mut caller = caller();
        caller.is_whitelabel = true;

        assert_eq!(check(&everything, &caller, PermissionLevel::Everyone, FilterMode::HelpListing), Err(Ineligibility::AdminOnly));
        caller.is_bot_admin = true;
        assert_eq!(check(&everything, &caller, PermissionLevel::Everyone, FilterMode::HelpListing), Err(Ineligibility::NotSlashCommand));
        assert_eq!(check(&everything, &caller, PermissionLevel::Everyone, FilterMode::Dispatch), Err(Ineligibility::MainBotOnly));
        caller.is_whitelabel = false;
        assert!(matches!(
            check(&everything, &caller, PermissionLevel::Everyone, FilterMode::Dispatch),
            Err(Ineligibility::InsufficientPermission { .. })
        ));
    }

    #[test]
    fn test_eligibility_is_monotonic_in_level() {
        let flags = [false, true];
        for required in PermissionLevel::ALL {
            for &admin_only in &flags {
                for &helper_only in &flags {
                    for &main_bot_only in &flags {
                        for &text in &flags {
                            let mut properties = CommandProperties::new("cmd", "test").permission_level(required);
                            properties.admin_only = admin_only;
                            properties.helper_only = helper_only;
                            properties.main_bot_only = main_bot_only;
                            if text {
                                properties.invocation_type = InvocationType::Text;
                            }

                            for &is_admin in &flags {
                                for &is_helper in &flags {
                                    for &whitelabel in &flags {
                                        let mut caller = caller();
                                        caller.is_bot_admin = is_admin;
                                        caller.is_bot_helper = is_helper;
                                        caller.is_whitelabel = whitelabel;

                                        for mode in MODES {
                                            for (i, low) in PermissionLevel::ALL.iter().enumerate() {
                                                if !is_eligible(&properties, &caller, *low, mode) {
                                                    continue;
                                                }
                                                for high in &PermissionLevel::ALL[i..] {
                                                    assert!(is_eligible(&properties, &caller, *high, mode));
                                                }
                                            }
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}
