//! Interactive administrator menu.
//!
//! Numbered commands for viewing and setting the policy and for managing
//! accounts. Domain outcomes are printed as `Result: <message>` and the menu
//! keeps running; only `0` or the end of input leaves it.

use std::io::{self, BufRead, Write};

use secdir_accounts::AccountsEditor;
use secdir_store::Table;
use secdir_types::{DirectoryError, DirectoryResult, RoleSet, UserRole};
use secdir_vault::PolicySetting;

use crate::cli::parse_login;
use crate::helpers::{self, ask, render};

const ROLES_PROMPT: &str =
    "Enter roles (0 for ROLE1, 1 for ROLE2, 2 for ROLE3, 3 for ROLE4), -1 to finish: ";

/// How the menu reads passwords.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordEcho {
    /// Read from the menu input like any other answer.
    Visible,
    /// Read from the terminal without echo.
    Hidden,
}

pub struct Menu<'a> {
    editor: &'a AccountsEditor,
    input: &'a mut dyn BufRead,
    out: &'a mut dyn Write,
    echo: PasswordEcho,
}

impl<'a> Menu<'a> {
    pub fn new(
        editor: &'a AccountsEditor,
        input: &'a mut dyn BufRead,
        out: &'a mut dyn Write,
        echo: PasswordEcho,
    ) -> Self {
        Self {
            editor,
            input,
            out,
            echo,
        }
    }

    /// Run until the operator exits.
    pub fn run(&mut self) -> io::Result<()> {
        loop {
            self.print_menu()?;
            let Some(choice) = ask(self.input, self.out, "Enter command (0-13): ")? else {
                writeln!(self.out)?;
                return Ok(());
            };

            let Ok(command) = choice.parse::<u8>() else {
                writeln!(self.out, "Invalid input. Please enter a number between 0 and 13.")?;
                continue;
            };

            match command {
                0 => {
                    writeln!(self.out, "Exiting program.")?;
                    return Ok(());
                }
                1 => self.view_settings()?,
                2..=7 => self.set_setting(PolicySetting::ALL[usize::from(command - 2)])?,
                8 => self.add_user()?,
                9 => self.update_password()?,
                10 => self.update_roles()?,
                11 => self.remove_user()?,
                12 => self.list(Table::Active)?,
                13 => self.list(Table::Archive)?,
                _ => writeln!(self.out, "Invalid command. Please enter a number between 0 and 13.")?,
            }
        }
    }

    fn print_menu(&mut self) -> io::Result<()> {
        writeln!(self.out)?;
        writeln!(self.out, "=== Security Configuration and User Management ===")?;
        writeln!(self.out, "1. View current security settings")?;
        for (i, setting) in PolicySetting::ALL.iter().enumerate() {
            writeln!(self.out, "{}. Set {}", i + 2, setting_name(*setting))?;
        }
        writeln!(self.out, "8. Add new user")?;
        writeln!(self.out, "9. Update user password")?;
        writeln!(self.out, "10. Update user roles")?;
        writeln!(self.out, "11. Remove user")?;
        writeln!(self.out, "12. List active users")?;
        writeln!(self.out, "13. List archive users")?;
        writeln!(self.out, "0. Exit")
    }

    // -- Settings -----------------------------------------------------------

    fn view_settings(&mut self) -> io::Result<()> {
        let policy = self.editor.policy();
        writeln!(self.out)?;
        writeln!(self.out, "Current Security Settings:")?;
        for setting in PolicySetting::ALL {
            match policy.get(setting) {
                Ok(value) => writeln!(self.out, "{}: {value}", setting.label())?,
                Err(_) => writeln!(self.out, "{}: N/A", setting.label())?,
            }
        }
        Ok(())
    }

    fn set_setting(&mut self, setting: PolicySetting) -> io::Result<()> {
        let prompt = format!("Enter {}: ", setting_name(setting));
        let Some(answer) = ask(self.input, self.out, &prompt)? else {
            return Ok(());
        };
        let Ok(value) = answer.parse::<u32>() else {
            return writeln!(self.out, "Invalid input. Please enter a positive number.");
        };

        let result = self.editor.policy().set(setting, value);
        writeln!(self.out, "{}", render(&result))
    }

    // -- Accounts -----------------------------------------------------------

    fn add_user(&mut self) -> io::Result<()> {
        let Some(login) = self.read_login("Enter login: ")? else {
            return Ok(());
        };
        let Some(password) = self.read_password("Enter password: ")? else {
            return Ok(());
        };
        let result = match self.read_roles()? {
            Ok(roles) => self.editor.create_account(&login, &password, &roles),
            Err(e) => Err(e),
        };
        writeln!(self.out, "{}", render(&result))
    }

    fn update_password(&mut self) -> io::Result<()> {
        let Some(login) = self.read_login("Enter login: ")? else {
            return Ok(());
        };
        let Some(password) = self.read_password("Enter new password: ")? else {
            return Ok(());
        };
        let result = self.editor.edit_password(&login, &password);
        writeln!(self.out, "{}", render(&result))
    }

    fn update_roles(&mut self) -> io::Result<()> {
        let Some(login) = self.read_login("Enter login: ")? else {
            return Ok(());
        };
        let result = match self.read_roles()? {
            Ok(roles) => self.editor.edit_roles(&login, &roles),
            Err(e) => Err(e),
        };
        writeln!(self.out, "{}", render(&result))
    }

    fn remove_user(&mut self) -> io::Result<()> {
        let Some(login) = self.read_login("Enter login to remove: ")? else {
            return Ok(());
        };
        let result = self.editor.delete_account(&login);
        writeln!(self.out, "{}", render(&result))
    }

    fn list(&mut self, table: Table) -> io::Result<()> {
        let (label, heading) = match table {
            Table::Active => ("active", "Active Users:"),
            Table::Archive => ("archive", "Archive Users:"),
        };

        let (cursor, first) = match self.editor.store().scan_first(table) {
            Ok(scan) => scan,
            Err(e) => {
                return writeln!(self.out, "Failed to get {label} users: {}", e.code());
            }
        };

        writeln!(self.out)?;
        writeln!(self.out, "{heading}")?;
        writeln!(self.out, "{first}")?;
        for line in cursor {
            match line {
                Ok(line) => writeln!(self.out, "{line}")?,
                Err(e) => return writeln!(self.out, "Result: {}", e.code()),
            }
        }
        Ok(())
    }

    // -- Input --------------------------------------------------------------

    /// A valid login, or `None` if the input ended or the login was
    /// rejected (the reason has been printed).
    fn read_login(&mut self, prompt: &str) -> io::Result<Option<String>> {
        let Some(raw) = ask(self.input, self.out, prompt)? else {
            return Ok(None);
        };
        match parse_login(&raw) {
            Ok(login) => Ok(Some(login)),
            Err(reason) => {
                writeln!(self.out, "Invalid login: {reason}")?;
                Ok(None)
            }
        }
    }

    fn read_password(&mut self, prompt: &str) -> io::Result<Option<String>> {
        match self.echo {
            PasswordEcho::Visible => ask(self.input, self.out, prompt),
            PasswordEcho::Hidden => {
                self.out.flush()?;
                helpers::read_password(prompt).map(Some)
            }
        }
    }

    /// Role indices separated by whitespace, possibly over several lines,
    /// terminated by `-1` or the end of input.
    fn read_roles(&mut self) -> io::Result<DirectoryResult<RoleSet>> {
        write!(self.out, "{ROLES_PROMPT}")?;
        self.out.flush()?;

        let mut roles = Vec::new();
        while let Some(line) = helpers::read_line(self.input)? {
            for token in line.split_whitespace() {
                if token == "-1" {
                    return Ok(RoleSet::new(roles));
                }
                match token.parse::<u8>().ok().and_then(UserRole::from_index) {
                    Some(role) => roles.push(role),
                    None => {
                        return Ok(Err(DirectoryError::RoleNotFound {
                            role: token.to_owned(),
                        }));
                    }
                }
            }
        }
        Ok(RoleSet::new(roles))
    }
}

fn setting_name(setting: PolicySetting) -> &'static str {
    match setting {
        PolicySetting::MinPasswordLength => "minimum password length",
        PolicySetting::PasswordHistoryDepth => "password history depth",
        PolicySetting::PasswordExpirationDays => "password expiration days",
        PolicySetting::MaxInactiveTimeMin => "maximum inactive time (minutes)",
        PolicySetting::MaxFailedAttempts => "maximum failed login attempts",
        PolicySetting::LockoutTimeMin => "lockout time (minutes)",
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
