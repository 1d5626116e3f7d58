use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CoreError;

/// Role of a user account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    Driver,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Driver => "DRIVER",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
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
        match s {
            "ADMIN" => Ok(Role::Admin),
            "DRIVER" => Ok(Role::Driver),
            other => Err(CoreError::UnknownRole(other.to_string())),
        }
    }
}

/// Who an announcement is addressed to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Audience {
    #[default]
    All,
    Only(Role),
}

impl Audience {
    pub const WILDCARD: &'static str = "ALL";

    pub fn as_str(&self) -> &'static str {
        match self {
            Audience::All => Self::WILDCARD,
            Audience::Only(role) => role.as_str(),
        }
    }

    /// A message is visible when addressed to everyone or exactly to the role
    pub fn is_visible_to(&self, role: Role) -> bool {
        match self {
            Audience::All => true,
            Audience::Only(target) => *target == role,
        }
    }

    /// The stored tags a user with `role` may see
    pub fn visible_tags(role: Role) -> [&'static str; 2] {
        [Self::WILDCARD, role.as_str()]
    }
}

impl fmt::Display for Audience {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Audience {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == Self::WILDCARD {
            return Ok(Audience::All);
        }
        s.parse::<Role>()
            .map(Audience::Only)
            .map_err(|_| CoreError::UnknownAudience(s.to_string()))
    }
}

impl Serialize for Audience {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Audience {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Per-user read markers, unique per (user, message)
#[derive(Debug, Clone, Default)]
pub struct ReadMarkers {
    marks: HashSet<(Uuid, Uuid)>,
}

impl ReadMarkers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `user` has read `message`.
    ///
    /// Returns `true` when a new marker was created; repeating the call is a no-op.
    pub fn mark(&mut self, user: Uuid, message: Uuid) -> bool {
        self.marks.insert((user, message))
    }

    pub fn is_read(&self, user: Uuid, message: Uuid) -> bool {
        self.marks.contains(&(user, message))
    }

    /// Markers held across all users
    pub fn len(&self) -> usize {
        self.marks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }
}
