//! CLI argument definitions for secdir.
//!
//! All `clap` structures live here so that `main.rs` stays focused on
//! dispatching subcommands.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use secdir_types::RoleSet;
use secdir_vault::PolicySetting;

use crate::config::DEFAULT_CONFIG_PATH;

/// secdir -- security policy and user directory administration.
#[derive(Parser)]
#[command(
    name = "secdir",
    version,
    about = "secdir -- security policy and user directory administration",
    long_about = "Manages a flat-file user directory: accounts, password history, roles, \
                  and the security policy that governs them."
)]
pub struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, short, global = true, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the interactive administrator menu.
    Menu,

    /// View or change the security policy.
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },

    /// Manage user accounts.
    Users {
        #[command(subcommand)]
        action: UserAction,
    },

    /// Check a user's login: password attempts and expiration.
    Login,
}

/// Actions on the security policy.
#[derive(Subcommand)]
pub enum SettingsAction {
    /// Show every setting.
    Show {
        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
    /// Set one setting.
    Set {
        /// Setting key, e.g. `minPasswordLength`.
        #[arg(value_parser = parse_setting)]
        key: PolicySetting,
        /// New value.
        value: u32,
    },
    /// Write the recommended value for every setting.
    Init,
}

/// Actions for managing user accounts.
#[derive(Subcommand)]
pub enum UserAction {
    /// Create a new account.
    Add {
        /// Login for the new account.
        #[arg(value_parser = parse_login)]
        login: String,
        /// Comma-separated role indices (0-3) or names (ROLE1-ROLE4).
        #[arg(long, short, value_parser = parse_roles)]
        roles: RoleSet,
        /// Password; prompted without echo when omitted.
        #[arg(long, short)]
        password: Option<String>,
    },
    /// Change an account's password.
    Passwd {
        #[arg(value_parser = parse_login)]
        login: String,
        /// New password; prompted without echo when omitted.
        #[arg(long, short)]
        password: Option<String>,
    },
    /// Replace an account's roles.
    Roles {
        #[arg(value_parser = parse_login)]
        login: String,
        /// Comma-separated role indices (0-3) or names (ROLE1-ROLE4).
        #[arg(long, short, value_parser = parse_roles)]
        roles: RoleSet,
    },
    /// Disable an account. The login stays reserved.
    Remove {
        #[arg(value_parser = parse_login)]
        login: String,
    },
    /// List active accounts, or the archive.
    List {
        /// List the archive instead of active accounts.
        #[arg(long)]
        archive: bool,
        /// Print JSON instead of raw lines.
        #[arg(long)]
        json: bool,
    },
}

// ---------------------------------------------------------------------------
// Value parsers
// ---------------------------------------------------------------------------

/// Logins are table keys: non-empty and free of whitespace.
pub fn parse_login(raw: &str) -> Result<String, String> {
    if raw.is_empty() {
        return Err("login must not be empty".into());
    }
    if raw.chars().any(char::is_whitespace) {
        return Err("login must not contain whitespace".into());
    }
    Ok(raw.to_owned())
}

fn parse_roles(raw: &str) -> Result<RoleSet, String> {
    RoleSet::parse_field(raw).map_err(|e| e.to_string())
}

fn parse_setting(raw: &str) -> Result<PolicySetting, String> {
    PolicySetting::from_key(raw).ok_or_else(|| {
        let keys: Vec<&str> = PolicySetting::ALL.iter().map(PolicySetting::key).collect();
        format!("unknown setting {raw:?}, expected one of: {}", keys.join(", "))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use secdir_types::UserRole;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_users_add() {
        let cli = Cli::try_parse_from(["secdir", "users", "add", "alice", "--roles", "0,ROLE3"])
            .unwrap();
        match cli.command {
            Commands::Users {
                action:
                    UserAction::Add {
                        login,
                        roles,
                        password,
                    },
            } => {
                assert_eq!(login, "alice");
                assert_eq!(roles.roles(), &[UserRole::Role1, UserRole::Role3]);
                assert!(password.is_none());
            }
            _ => panic!("expected users add"),
        }
        assert_eq!(cli.config, PathBuf::from(DEFAULT_CONFIG_PATH));
    }

    #[test]
    fn rejects_bad_logins_and_roles() {
        assert!(Cli::try_parse_from(["secdir", "users", "remove", "al ice"]).is_err());
        assert!(Cli::try_parse_from(["secdir", "users", "remove", ""]).is_err());
        assert!(
            Cli::try_parse_from(["secdir", "users", "roles", "bob", "--roles", "7"]).is_err()
        );
        assert!(Cli::try_parse_from(["secdir", "users", "roles", "bob", "--roles", ""]).is_err());
    }

    #[test]
    fn parses_settings_set() {
        let cli = Cli::try_parse_from([
            "secdir",
            "--config",
            "/etc/secdir.toml",
            "settings",
            "set",
            "passwordHistoryDepth",
            "4",
        ])
        .unwrap();
        assert_eq!(cli.config, PathBuf::from("/etc/secdir.toml"));
        match cli.command {
            Commands::Settings {
                action: SettingsAction::Set { key, value },
            } => {
                assert_eq!(key, PolicySetting::PasswordHistoryDepth);
                assert_eq!(value, 4);
            }
            _ => panic!("expected settings set"),
        }
        assert!(Cli::try_parse_from(["secdir", "settings", "set", "bogus", "1"]).is_err());
    }
}
