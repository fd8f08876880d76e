//! Per-line table transforms.
//!
//! Every mutation other than an append is expressed as a transform applied
//! to each line of a table. The file store streams lines through it during
//! the rewrite protocol; the memory store applies it to its line vector.
//! Sharing the transforms keeps both stores byte-for-byte equivalent.

use chrono::NaiveDate;
use secdir_types::{DirectoryError, DirectoryResult, RoleSet};

use crate::record::{ArchiveEntry, format_date, leading_token};

/// What to do with one line of a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineEdit {
    /// Copy the line unchanged.
    Keep,
    /// Write this line instead.
    Replace(String),
    /// Drop the line.
    Remove,
}

/// Apply `edit` to every line, returning the new lines and how many lines
/// the transform changed.
pub(crate) fn apply_edits<F>(lines: &[String], mut edit: F) -> DirectoryResult<(Vec<String>, usize)>
where
    F: FnMut(&str) -> DirectoryResult<LineEdit>,
{
    let mut out = Vec::with_capacity(lines.len());
    let mut edited = 0;
    for line in lines {
        match edit(line)? {
            LineEdit::Keep => out.push(line.clone()),
            LineEdit::Replace(new) => {
                edited += 1;
                out.push(new);
            }
            LineEdit::Remove => edited += 1,
        }
    }
    Ok((out, edited))
}

/// Drop the lines belonging to `login`.
pub(crate) fn remove_login<'a>(
    login: &'a str,
) -> impl FnMut(&str) -> DirectoryResult<LineEdit> + 'a {
    move |line| {
        Ok(if leading_token(line) == login {
            LineEdit::Remove
        } else {
            LineEdit::Keep
        })
    }
}

/// Replace the hash and date of `login`'s active line, keeping the role
/// field exactly as written.
pub(crate) fn replace_password<'a>(
    login: &'a str,
    new_hash: &'a str,
    date: NaiveDate,
) -> impl FnMut(&str) -> DirectoryResult<LineEdit> + 'a {
    let date = format_date(date);
    move |line| {
        if leading_token(line) != login {
            return Ok(LineEdit::Keep);
        }
        let mut fields = line.splitn(4, ' ');
        let roles = fields.nth(3).ok_or_else(|| malformed_active(login))?;
        Ok(LineEdit::Replace(format!("{login} {new_hash} {date} {roles}")))
    }
}

/// Append `new_hash` to `login`'s archive history, bounded by `depth`.
pub(crate) fn append_history<'a>(
    login: &'a str,
    new_hash: &'a str,
    depth: u32,
) -> impl FnMut(&str) -> DirectoryResult<LineEdit> + 'a {
    move |line| {
        if leading_token(line) != login {
            return Ok(LineEdit::Keep);
        }
        let mut entry = ArchiveEntry::parse(line)?;
        entry.push_bounded(new_hash, depth);
        Ok(LineEdit::Replace(entry.to_line()))
    }
}

/// Replace only the role field of `login`'s active line.
pub(crate) fn replace_roles<'a>(
    login: &'a str,
    roles: &'a RoleSet,
) -> impl FnMut(&str) -> DirectoryResult<LineEdit> + 'a {
    let roles = roles.to_field();
    move |line| {
        if leading_token(line) != login {
            return Ok(LineEdit::Keep);
        }
        let mut fields = line.splitn(4, ' ');
        let (Some(_), Some(hash), Some(date)) = (fields.next(), fields.next(), fields.next())
        else {
            return Err(malformed_active(login));
        };
        Ok(LineEdit::Replace(format!("{login} {hash} {date} {roles}")))
    }
}

fn malformed_active(login: &str) -> DirectoryError {
    DirectoryError::database(format!("malformed active record for {login}"))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use secdir_types::UserRole;

    fn lines(text: &[&str]) -> Vec<String> {
        text.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn remove_matches_whole_login_only() {
        let table = lines(&["al h 01.01.2026 0", "alice h 01.01.2026 0", "bob h 01.01.2026 1"]);
        let (out, edited) = apply_edits(&table, remove_login("alice")).unwrap();
        assert_eq!(edited, 1);
        assert_eq!(out, lines(&["al h 01.01.2026 0", "bob h 01.01.2026 1"]));
    }

    #[test]
    fn password_replacement_keeps_roles_verbatim() {
        let table = lines(&["alice old 1.2.2020 3,0", "bob h 01.01.2026 1"]);
        let date = NaiveDate::from_ymd_opt(2026, 10, 17).unwrap();
        let (out, edited) = apply_edits(&table, replace_password("alice", "new", date)).unwrap();
        assert_eq!(edited, 1);
        assert_eq!(out[0], "alice new 17.10.2026 3,0");
        assert_eq!(out[1], "bob h 01.01.2026 1");
    }

    #[test]
    fn password_replacement_on_truncated_line_fails() {
        let table = lines(&["alice old"]);
        let date = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        assert!(apply_edits(&table, replace_password("alice", "new", date)).is_err());
    }

    #[test]
    fn history_append_is_bounded() {
        let table = lines(&["alice h1 h2", "bob b1"]);
        let (out, _) = apply_edits(&table, append_history("alice", "h3", 2)).unwrap();
        assert_eq!(out, lines(&["alice h2 h3", "bob b1"]));
    }

    #[test]
    fn role_replacement() {
        let table = lines(&["alice h 01.01.2026 0"]);
        let roles = RoleSet::new([UserRole::Role2, UserRole::Role4]).unwrap();
        let (out, edited) = apply_edits(&table, replace_roles("alice", &roles)).unwrap();
        assert_eq!(edited, 1);
        assert_eq!(out[0], "alice h 01.01.2026 1,3");
    }

    #[test]
    fn no_match_edits_nothing() {
        let table = lines(&["bob h 01.01.2026 1"]);
        let (out, edited) = apply_edits(&table, remove_login("alice")).unwrap();
        assert_eq!(edited, 0);
        assert_eq!(out, table);
    }
}
