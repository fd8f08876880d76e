//! Table line formats.
//!
//! ```text
//! Active:  <login> <passwordHash> <DD.MM.YYYY> <role,role,...>
//! Archive: <login> <hash0> <hash1> ... <hashN>
//! ```
//!
//! Fields are separated by single spaces and lines end with `\n`. The first
//! field of every line is the login, which is how both tables are keyed.

use chrono::{Datelike, NaiveDate};
use secdir_types::{DirectoryError, DirectoryResult, RoleSet};
use serde::Serialize;

/// The login field of a table line: everything up to the first space.
pub fn leading_token(line: &str) -> &str {
    line.split(' ').next().unwrap_or_default()
}

/// Refuse a login that could not be read back as the leading token of its
/// own line.
///
/// # Errors
///
/// Returns [`DirectoryError::Database`] for an empty login or one
/// containing whitespace.
pub fn check_login(login: &str) -> DirectoryResult<()> {
    if login.is_empty() || login.chars().any(char::is_whitespace) {
        return Err(DirectoryError::database(format!(
            "login {login:?} would corrupt table format"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Dates
// ---------------------------------------------------------------------------

/// Today's date on the local calendar.
pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// Format a password-set date as `DD.MM.YYYY`.
pub fn format_date(date: NaiveDate) -> String {
    format!("{:02}.{:02}.{:04}", date.day(), date.month(), date.year())
}

/// Parse a `D.M.YYYY` / `DD.MM.YYYY` date.
pub fn parse_date(field: &str) -> DirectoryResult<NaiveDate> {
    let bad = || DirectoryError::database(format!("malformed password date: {field:?}"));

    let mut parts = field.split('.');
    let (Some(day), Some(month), Some(year), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(bad());
    };

    let day: u32 = day.parse().map_err(|_| bad())?;
    let month: u32 = month.parse().map_err(|_| bad())?;
    let year: i32 = year.parse().map_err(|_| bad())?;

    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(bad)
}

// ---------------------------------------------------------------------------
// Active table
// ---------------------------------------------------------------------------

/// One line of the active table: a currently enabled account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActiveRecord {
    pub login: String,
    pub password_hash: String,
    /// Local date on which the current password was set.
    pub password_set: NaiveDate,
    pub roles: RoleSet,
}

impl ActiveRecord {
    /// Parse an active-table line.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::Database`] if the line does not have exactly
    /// four fields or a field is malformed.
    pub fn parse(line: &str) -> DirectoryResult<Self> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        let [login, hash, date, roles] = fields.as_slice() else {
            return Err(DirectoryError::database(format!(
                "malformed active record: expected 4 fields, got {}",
                fields.len()
            )));
        };

        let roles = RoleSet::parse_field(roles).map_err(|e| {
            DirectoryError::database(format!("malformed roles for {login}: {e}"))
        })?;

        Ok(Self {
            login: login.to_string(),
            password_hash: hash.to_string(),
            password_set: parse_date(date)?,
            roles,
        })
    }

    pub fn to_line(&self) -> String {
        format!(
            "{} {} {} {}",
            self.login,
            self.password_hash,
            format_date(self.password_set),
            self.roles.to_field()
        )
    }
}

// ---------------------------------------------------------------------------
// Archive table
// ---------------------------------------------------------------------------

/// One line of the archive: a login and its password hashes, oldest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchiveEntry {
    pub login: String,
    pub history: Vec<String>,
}

impl ArchiveEntry {
    pub fn new(login: impl Into<String>, first_hash: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            history: vec![first_hash.into()],
        }
    }

    /// Parse an archive line. A line holding only a login has no history.
    pub fn parse(line: &str) -> DirectoryResult<Self> {
        let mut fields = line.split_whitespace();
        let login = fields
            .next()
            .ok_or_else(|| DirectoryError::database("empty archive line"))?;
        Ok(Self {
            login: login.to_string(),
            history: fields.map(str::to_string).collect(),
        })
    }

    pub fn to_line(&self) -> String {
        let mut line = self.login.clone();
        for hash in &self.history {
            line.push(' ');
            line.push_str(hash);
        }
        line
    }

    /// Append `new_hash`, evicting the oldest hashes so that at most `depth`
    /// remain.
    ///
    /// While the history is shorter than `depth` the hash is simply
    /// appended. Otherwise only the newest `depth - 1` existing hashes are
    /// kept before appending, so the result holds exactly `depth` hashes.
    /// Histories left longer than a since-lowered depth are only trimmed
    /// here, on the next password change.
    ///
    /// A depth of zero keeps no previous hashes: the history becomes just
    /// `[new_hash]`.
    pub fn push_bounded(&mut self, new_hash: impl Into<String>, depth: u32) {
        let depth = usize::try_from(depth).unwrap_or(usize::MAX);
        if self.history.len() >= depth {
            let keep = depth.saturating_sub(1);
            let evict = self.history.len() - keep;
            self.history.drain(..evict);
        }
        self.history.push(new_hash.into());
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use secdir_types::{ErrorCode, UserRole};

    fn hashes(entry: &ArchiveEntry) -> Vec<&str> {
        entry.history.iter().map(String::as_str).collect()
    }

    #[test]
    fn leading_token_is_login() {
        assert_eq!(leading_token("alice h1 01.01.2026 0"), "alice");
        assert_eq!(leading_token("bob"), "bob");
        assert_eq!(leading_token(""), "");
    }

    #[test]
    fn login_must_be_a_single_token() {
        assert!(check_login("alice").is_ok());
        assert!(check_login("a.l_i-c3").is_ok());
        for bad in ["", "al ice", " alice", "alice\t", "al\nice"] {
            let err = check_login(bad).unwrap_err();
            assert_eq!(err.code(), ErrorCode::DatabaseError, "input {bad:?}");
        }
    }

    #[test]
    fn date_format_is_zero_padded() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 7).unwrap();
        assert_eq!(format_date(date), "07.03.2026");
    }

    #[test]
    fn date_parse_accepts_unpadded() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        assert_eq!(parse_date("5.3.2024").unwrap(), date);
        assert_eq!(parse_date("05.03.2024").unwrap(), date);
    }

    #[test]
    fn date_parse_rejects_garbage() {
        for bad in ["", "5.3", "5.3.2024.1", "32.1.2024", "a.b.c", "29.02.2023"] {
            assert!(parse_date(bad).is_err(), "input {bad:?}");
        }
    }

    #[test]
    fn active_record_round_trip() {
        let line = "alice 1000:c2FsdA==:a2V5 17.10.2026 0,2";
        let record = ActiveRecord::parse(line).unwrap();
        assert_eq!(record.login, "alice");
        assert_eq!(record.password_hash, "1000:c2FsdA==:a2V5");
        assert_eq!(record.roles.roles(), &[UserRole::Role1, UserRole::Role3]);
        assert_eq!(record.to_line(), line);
    }

    #[test]
    fn active_record_rejects_wrong_field_count() {
        let err = ActiveRecord::parse("alice hash 01.01.2026").unwrap_err();
        assert_eq!(err.code(), ErrorCode::DatabaseError);
        assert!(ActiveRecord::parse("alice hash 01.01.2026 0 extra").is_err());
    }

    #[test]
    fn active_record_rejects_unknown_role() {
        let err = ActiveRecord::parse("alice hash 01.01.2026 0,7").unwrap_err();
        assert_eq!(err.code(), ErrorCode::DatabaseError);
    }

    #[test]
    fn archive_entry_parse() {
        let entry = ArchiveEntry::parse("alice h1 h2 h3").unwrap();
        assert_eq!(entry.login, "alice");
        assert_eq!(hashes(&entry), ["h1", "h2", "h3"]);
        assert_eq!(entry.to_line(), "alice h1 h2 h3");

        let bare = ArchiveEntry::parse("bob").unwrap();
        assert!(bare.history.is_empty());
        assert!(ArchiveEntry::parse("").is_err());
    }

    #[test]
    fn push_bounded_appends_below_depth() {
        let mut entry = ArchiveEntry::new("alice", "h1");
        entry.push_bounded("h2", 3);
        assert_eq!(hashes(&entry), ["h1", "h2"]);
    }

    #[test]
    fn push_bounded_evicts_oldest_at_depth() {
        let mut entry = ArchiveEntry::new("alice", "h1");
        entry.push_bounded("h2", 2);
        entry.push_bounded("h3", 2);
        assert_eq!(hashes(&entry), ["h2", "h3"]);
    }

    #[test]
    fn push_bounded_trims_lazily_after_depth_lowered() {
        let mut entry = ArchiveEntry::parse("alice h1 h2 h3 h4 h5").unwrap();
        entry.push_bounded("h6", 2);
        assert_eq!(hashes(&entry), ["h5", "h6"]);
    }

    #[test]
    fn push_bounded_depth_one_and_zero() {
        let mut entry = ArchiveEntry::parse("alice h1 h2").unwrap();
        entry.push_bounded("h3", 1);
        assert_eq!(hashes(&entry), ["h3"]);

        entry.push_bounded("h4", 0);
        assert_eq!(hashes(&entry), ["h4"]);
    }
}
