use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CoreError;
use crate::messaging::Role;

/// Review state of a sheet
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SheetStatus {
    #[default]
    Submitted,
    Confirmed,
}

impl SheetStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SheetStatus::Submitted => "SUBMITTED",
            SheetStatus::Confirmed => "CONFIRMED",
        }
    }
}

impl fmt::Display for SheetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SheetStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SUBMITTED" => Ok(SheetStatus::Submitted),
            "CONFIRMED" => Ok(SheetStatus::Confirmed),
            other => Err(CoreError::UnknownStatus(other.to_string())),
        }
    }
}

/// The signed-in user an operation runs as
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: Uuid,
    pub role: Role,
}

impl Actor {
    pub fn new(id: Uuid, role: Role) -> Self {
        Self { id, role }
    }

    /// Admins may read and edit any sheet; drivers only their own
    pub fn can_access_sheet(&self, driver_id: Uuid) -> bool {
        self.role.is_admin() || self.id == driver_id
    }

    pub fn can_delete_sheet(&self) -> bool {
        self.role.is_admin()
    }

    pub fn can_publish_messages(&self) -> bool {
        self.role.is_admin()
    }

    /// Driver whose sheets a listing is limited to, `None` for everyone
    pub fn sheet_scope(&self) -> Option<Uuid> {
        if self.role.is_admin() {
            None
        } else {
            Some(self.id)
        }
    }
}

/// Miles driven, with the same never-NaN policy as line items
pub fn coerce_miles(value: Option<&serde_json::Value>) -> f64 {
    crate::normalize::coerce_count(value)
}
