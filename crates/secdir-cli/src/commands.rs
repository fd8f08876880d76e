//! Subcommand handlers.
//!
//! Each handler prints domain outcomes as `Result: <message>` and maps them
//! to the process exit code. Only process-level failures (unreadable
//! configuration, broken stdout) are returned as errors.

use std::io::{self, IsTerminal, Write};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use secdir_accounts::AccountsEditor;
use secdir_store::{ActiveRecord, ArchiveEntry, FileRecordStore, RecordStore, Table, today};
use secdir_types::DirectoryResult;
use secdir_vault::{FilePolicyStore, Pbkdf2Hasher, PolicySetting, PolicyStore};

use crate::cli::{SettingsAction, UserAction};
use crate::config::DirectoryConfig;
use crate::helpers::{read_password, render};
use crate::menu::{Menu, PasswordEcho};
use crate::session::{LoginError, LoginSession, TerminalInput};

// ---------------------------------------------------------------------------
// Directory wiring
// ---------------------------------------------------------------------------

/// The production capabilities, opened from configuration.
pub struct Directory {
    store: Arc<FileRecordStore>,
    policy: Arc<FilePolicyStore>,
    hasher: Arc<Pbkdf2Hasher>,
}

impl Directory {
    pub fn open(config: &DirectoryConfig) -> Result<Self> {
        let store = FileRecordStore::open(config.storage.table_paths())
            .context("failed to open record store")?;
        let policy = FilePolicyStore::open(&config.storage.policy_file)
            .context("failed to open policy file")?;
        let hasher = Pbkdf2Hasher::with_iterations(config.hashing.pbkdf2_iterations)
            .context("invalid hashing configuration")?;

        tracing::debug!(
            policy = %config.storage.policy_file.display(),
            iterations = hasher.iterations(),
            "directory opened"
        );
        Ok(Self {
            store: Arc::new(store),
            policy: Arc::new(policy),
            hasher: Arc::new(hasher),
        })
    }

    fn editor(&self) -> AccountsEditor {
        AccountsEditor::new(self.store.clone(), self.policy.clone(), self.hasher.clone())
    }

    fn login_session(&self) -> LoginSession {
        LoginSession::new(self.store.clone(), self.policy.clone(), self.hasher.clone())
    }
}

fn exit_code<T>(result: &DirectoryResult<T>) -> ExitCode {
    if result.is_ok() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Print `Result: <message>` and turn the outcome into an exit code.
fn report<T>(result: DirectoryResult<T>) -> ExitCode {
    if let Err(e) = &result {
        tracing::debug!(error = %e, "operation failed");
    }
    println!("{}", render(&result));
    exit_code(&result)
}

// ---------------------------------------------------------------------------
// Subcommand: menu
// ---------------------------------------------------------------------------

pub fn cmd_menu(dir: &Directory) -> Result<ExitCode> {
    let editor = dir.editor();
    let echo = if io::stdin().is_terminal() {
        PasswordEcho::Hidden
    } else {
        PasswordEcho::Visible
    };

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    Menu::new(&editor, &mut input, &mut out, echo)
        .run()
        .context("menu I/O failed")?;
    Ok(ExitCode::SUCCESS)
}

// ---------------------------------------------------------------------------
// Subcommand: settings
// ---------------------------------------------------------------------------

pub fn cmd_settings(dir: &Directory, action: SettingsAction) -> Result<ExitCode> {
    match action {
        SettingsAction::Show { json } => {
            if json {
                let snapshot = dir.policy.snapshot();
                println!("{}", serde_json::to_string_pretty(&snapshot)?);
                return Ok(ExitCode::SUCCESS);
            }
            let mut out = io::stdout().lock();
            for setting in PolicySetting::ALL {
                match dir.policy.get(setting) {
                    Ok(value) => writeln!(out, "{:<24} {value}", setting.key())?,
                    Err(_) => writeln!(out, "{:<24} N/A", setting.key())?,
                }
            }
            Ok(ExitCode::SUCCESS)
        }
        SettingsAction::Set { key, value } => Ok(report(dir.policy.set(key, value))),
        SettingsAction::Init => {
            let result = PolicySetting::ALL
                .into_iter()
                .try_for_each(|setting| dir.policy.set(setting, setting.recommended()));
            Ok(report(result))
        }
    }
}

// ---------------------------------------------------------------------------
// Subcommand: users
// ---------------------------------------------------------------------------

pub fn cmd_users(dir: &Directory, action: UserAction) -> Result<ExitCode> {
    let editor = dir.editor();
    match action {
        UserAction::Add {
            login,
            roles,
            password,
        } => {
            let password = password_or_prompt(password, "Password: ")?;
            Ok(report(editor.create_account(&login, &password, &roles)))
        }
        UserAction::Passwd { login, password } => {
            let password = password_or_prompt(password, "New password: ")?;
            Ok(report(editor.edit_password(&login, &password)))
        }
        UserAction::Roles { login, roles } => Ok(report(editor.edit_roles(&login, &roles))),
        UserAction::Remove { login } => Ok(report(editor.delete_account(&login))),
        UserAction::List { archive, json } => {
            let table = if archive { Table::Archive } else { Table::Active };
            list_users(dir.store.as_ref(), table, json)
        }
    }
}

fn password_or_prompt(password: Option<String>, prompt: &str) -> Result<String> {
    match password {
        Some(password) => Ok(password),
        None => read_password(prompt).context("failed to read password"),
    }
}

fn list_users(store: &dyn RecordStore, table: Table, json: bool) -> Result<ExitCode> {
    let lines = match store.list(table) {
        Ok(lines) => lines,
        Err(e) => return Ok(report(Err::<(), _>(e))),
    };

    if !json {
        let mut out = io::stdout().lock();
        for line in &lines {
            writeln!(out, "{line}")?;
        }
        return Ok(ExitCode::SUCCESS);
    }

    let rendered = match table {
        Table::Active => lines
            .iter()
            .map(|line| ActiveRecord::parse(line))
            .collect::<DirectoryResult<Vec<_>>>()
            .map(|records| serde_json::to_string_pretty(&records)),
        Table::Archive => lines
            .iter()
            .map(|line| ArchiveEntry::parse(line))
            .collect::<DirectoryResult<Vec<_>>>()
            .map(|entries| serde_json::to_string_pretty(&entries)),
    };
    match rendered {
        Ok(json) => {
            println!("{}", json?);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => Ok(report(Err::<(), _>(e))),
    }
}

// ---------------------------------------------------------------------------
// Subcommand: login
// ---------------------------------------------------------------------------

pub fn cmd_login(dir: &Directory) -> Result<ExitCode> {
    let session = dir.login_session();
    let stdin = io::stdin();
    let mut input = TerminalInput::new(stdin.lock(), io::stdout());

    match session.check(&mut input, today()) {
        Ok(_) => {
            println!("Access is allowed");
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            if let LoginError::Data { reason } = &e {
                tracing::warn!(%reason, "login check could not read the directory");
            }
            println!("{e}");
            Ok(ExitCode::FAILURE)
        }
    }
}
