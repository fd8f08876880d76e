//! Role model.
//!
//! Accounts carry one or more of four fixed roles. On disk a role is its
//! decimal index (`0`..=`3`) and a role list is the comma-joined indices,
//! e.g. `0,2`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{DirectoryError, DirectoryResult};

/// Role-based access levels for directory accounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UserRole {
    Role1,
    Role2,
    Role3,
    Role4,
}

impl UserRole {
    /// Every role, in index order.
    pub const ALL: [UserRole; 4] = [Self::Role1, Self::Role2, Self::Role3, Self::Role4];

    /// The on-disk index of this role.
    pub fn index(&self) -> u8 {
        match self {
            Self::Role1 => 0,
            Self::Role2 => 1,
            Self::Role3 => 2,
            Self::Role4 => 3,
        }
    }

    /// Resolve an on-disk index.
    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(usize::from(index)).copied()
    }

    /// Display name (`ROLE1`..`ROLE4`).
    pub fn name(&self) -> &'static str {
        match self {
            Self::Role1 => "ROLE1",
            Self::Role2 => "ROLE2",
            Self::Role3 => "ROLE3",
            Self::Role4 => "ROLE4",
        }
    }
}

impl FromStr for UserRole {
    type Err = DirectoryError;

    /// Accepts either the index (`"2"`) or the name (`"ROLE3"`, any case).
    fn from_str(s: &str) -> DirectoryResult<Self> {
        let s = s.trim();
        if let Ok(index) = s.parse::<u8>()
            && let Some(role) = Self::from_index(index)
        {
            return Ok(role);
        }
        Self::ALL
            .into_iter()
            .find(|role| role.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| DirectoryError::RoleNotFound {
                role: s.to_string(),
            })
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// RoleSet
// ---------------------------------------------------------------------------

/// An ordered, duplicate-free, non-empty list of roles.
///
/// Every account holds at least one role, so an empty set cannot be built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<UserRole>", into = "Vec<UserRole>")]
pub struct RoleSet(Vec<UserRole>);

impl RoleSet {
    /// Build a role set, keeping first occurrences in order.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::RoleNotFound`] if `roles` is empty.
    pub fn new(roles: impl IntoIterator<Item = UserRole>) -> DirectoryResult<Self> {
        let mut out: Vec<UserRole> = Vec::with_capacity(UserRole::ALL.len());
        for role in roles {
            if !out.contains(&role) {
                out.push(role);
            }
        }
        if out.is_empty() {
            return Err(DirectoryError::RoleNotFound {
                role: "<empty role list>".into(),
            });
        }
        Ok(Self(out))
    }

    /// A set holding a single role.
    pub fn single(role: UserRole) -> Self {
        Self(vec![role])
    }

    /// Parse the on-disk field (`0,2`). Names are accepted too.
    pub fn parse_field(field: &str) -> DirectoryResult<Self> {
        let roles = field
            .split(',')
            .filter(|part| !part.trim().is_empty())
            .map(str::parse)
            .collect::<DirectoryResult<Vec<UserRole>>>()?;
        Self::new(roles)
    }

    /// The on-disk field: comma-joined role indices.
    pub fn to_field(&self) -> String {
        self.0
            .iter()
            .map(|role| role.index().to_string())
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn roles(&self) -> &[UserRole] {
        &self.0
    }

    pub fn contains(&self, role: UserRole) -> bool {
        self.0.contains(&role)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false`; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl TryFrom<Vec<UserRole>> for RoleSet {
    type Error = DirectoryError;

    fn try_from(roles: Vec<UserRole>) -> DirectoryResult<Self> {
        Self::new(roles)
    }
}

impl From<RoleSet> for Vec<UserRole> {
    fn from(set: RoleSet) -> Self {
        set.0
    }
}

impl fmt::Display for RoleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.0.iter().map(UserRole::name).collect();
        f.write_str(&names.join(","))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
