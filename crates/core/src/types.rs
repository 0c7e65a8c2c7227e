//! Identifier newtypes and small shared enums.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of one on-screen grid instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ViewId(String);

impl ViewId {
    /// Create a view id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ViewId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Code of the active tenant, sent on every request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(String);

impl TenantId {
    /// Create a tenant id.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Borrow the tenant code.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a row as reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowId(String);

impl RowId {
    /// Create a row id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Extract the id of a JSON row from `field`.
    ///
    /// String and number ids are accepted; anything else has no identity.
    #[must_use]
    pub fn from_row(row: &serde_json::Value, field: &str) -> Option<Self> {
        match row.get(field)? {
            serde_json::Value::String(s) => Some(Self::new(s.clone())),
            serde_json::Value::Number(n) => Some(Self::new(n.to_string())),
            _ => None,
        }
    }

    /// Borrow the id.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Rendering strategy of a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    /// Row-virtualized table.
    #[default]
    Table,
    /// Grid of cards.
    Card,
}

impl ViewMode {
    /// The other mode.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Table => Self::Card,
            Self::Card => Self::Table,
        }
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Table => write!(f, "table"),
            Self::Card => write!(f, "card"),
        }
    }
}

impl std::str::FromStr for ViewMode {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(Self::Table),
            "card" | "cards" => Ok(Self::Card),
            other => Err(crate::Error::Unknown(format!("unknown view mode '{other}'"))),
        }
    }
}

/// Sort direction of one sort field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    /// Whether this is descending.
    #[must_use]
    pub const fn is_desc(self) -> bool {
        matches!(self, Self::Desc)
    }
}

/// One entry of an ordered sort specification.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortField {
    pub field_id: String,
    pub direction: SortDirection,
}

impl SortField {
    /// Ascending sort on `field_id`.
    pub fn asc(field_id: impl Into<String>) -> Self {
        Self {
            field_id: field_id.into(),
            direction: SortDirection::Asc,
        }
    }

    /// Descending sort on `field_id`.
    pub fn desc(field_id: impl Into<String>) -> Self {
        Self {
            field_id: field_id.into(),
            direction: SortDirection::Desc,
        }
    }
}
