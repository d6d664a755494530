//! User roles and role sets.
//!
//! Role tags are persisted as a Postgres `TEXT[]` and embedded in access
//! tokens. The string forms must match the seed data in the users migration.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_ENGINEER: &str = "engineer";
pub const ROLE_ANALYST: &str = "analyst";
pub const ROLE_OPERATOR: &str = "operator";

/// Legacy tag for the base role, still accepted on input.
const ROLE_USER_ALIAS: &str = "user";

/// A single role a user may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Engineer,
    Analyst,
    #[serde(alias = "user")]
    Operator,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Admin, Role::Engineer, Role::Analyst, Role::Operator];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => ROLE_ADMIN,
            Role::Engineer => ROLE_ENGINEER,
            Role::Analyst => ROLE_ANALYST,
            Role::Operator => ROLE_OPERATOR,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            ROLE_ADMIN => Ok(Role::Admin),
            ROLE_ENGINEER => Ok(Role::Engineer),
            ROLE_ANALYST => Ok(Role::Analyst),
            ROLE_OPERATOR | ROLE_USER_ALIAS => Ok(Role::Operator),
            other => Err(CoreError::Validation(format!("Unknown role '{other}'"))),
        }
    }
}

/// The set of roles held by one user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleSet(BTreeSet<Role>);

impl RoleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, role: Role) -> bool {
        self.0.contains(&role)
    }

    /// True when at least one role in `allowed` is held.
    pub fn intersects(&self, allowed: &[Role]) -> bool {
        allowed.iter().any(|r| self.0.contains(r))
    }

    pub fn insert(&mut self, role: Role) -> bool {
        self.0.insert(role)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Role> + '_ {
        self.0.iter().copied()
    }

    /// Parse role tags strictly. Any unknown tag fails the whole set.
    pub fn parse_tags<S: AsRef<str>>(tags: &[S]) -> Result<Self, CoreError> {
        tags.iter()
            .map(|t| t.as_ref().parse::<Role>())
            .collect::<Result<BTreeSet<_>, _>>()
            .map(RoleSet)
    }

    /// Build a set from stored tags, skipping ones that no longer parse.
    pub fn from_stored<S: AsRef<str>>(tags: &[S]) -> Self {
        let mut set = RoleSet::new();
        for tag in tags {
            match tag.as_ref().parse::<Role>() {
                Ok(role) => {
                    set.insert(role);
                }
                Err(_) => {
                    tracing::warn!(tag = tag.as_ref(), "Ignoring unknown stored role tag");
                }
            }
        }
        set
    }

    /// Parse a comma-joined tag list such as `"admin,engineer"`.
    pub fn parse_joined(joined: &str) -> Result<Self, CoreError> {
        let tags: Vec<&str> = joined
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();
        Self::parse_tags(&tags)
    }

    /// Canonical string tags, in stable order.
    pub fn to_tags(&self) -> Vec<String> {
        self.0.iter().map(|r| r.as_str().to_string()).collect()
    }
}

impl FromIterator<Role> for RoleSet {
    fn from_iter<I: IntoIterator<Item = Role>>(iter: I) -> Self {
        RoleSet(iter.into_iter().collect())
    }
}

impl<const N: usize> From<[Role; N]> for RoleSet {
    fn from(roles: [Role; N]) -> Self {
        roles.into_iter().collect()
    }
}
