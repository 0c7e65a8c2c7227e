//! Column descriptors and typed filter values.
//!
//! Every column carries a closed [`FieldKind`], so serializing a filter to
//! its wire string and parsing it back are exhaustive matches rather than
//! runtime shape checks.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::Error;
use crate::result::Result;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Kind of a column, deciding how its filter values are encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Number,
    Date,
    Enum { options: Vec<String> },
    Relation { target: String },
}

/// Declarative description of one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub display_name: String,
    pub field_path: String,
    #[serde(flatten)]
    pub kind: FieldKind,
}

impl FieldDescriptor {
    /// Create a descriptor of the given kind.
    pub fn new(display_name: impl Into<String>, field_path: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            display_name: display_name.into(),
            field_path: field_path.into(),
            kind,
        }
    }

    /// Free-text column.
    pub fn text(display_name: impl Into<String>, field_path: impl Into<String>) -> Self {
        Self::new(display_name, field_path, FieldKind::Text)
    }

    /// Numeric column.
    pub fn number(display_name: impl Into<String>, field_path: impl Into<String>) -> Self {
        Self::new(display_name, field_path, FieldKind::Number)
    }

    /// Calendar date column.
    pub fn date(display_name: impl Into<String>, field_path: impl Into<String>) -> Self {
        Self::new(display_name, field_path, FieldKind::Date)
    }

    /// Column restricted to a fixed set of values.
    pub fn enumeration<I, S>(display_name: impl Into<String>, field_path: impl Into<String>, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            display_name,
            field_path,
            FieldKind::Enum {
                options: options.into_iter().map(Into::into).collect(),
            },
        )
    }

    /// Column referencing another resource by id.
    pub fn relation(
        display_name: impl Into<String>,
        field_path: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self::new(
            display_name,
            field_path,
            FieldKind::Relation {
                target: target.into(),
            },
        )
    }
}

/// Find the column whose `field_path` is `field_id`.
#[must_use]
pub fn find_field<'a>(columns: &'a [FieldDescriptor], field_id: &str) -> Option<&'a FieldDescriptor> {
    columns.iter().find(|c| c.field_path == field_id)
}

/// A typed filter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum FilterValue {
    Text(String),
    Number(f64),
    Date(NaiveDate),
    Enum(String),
    Relation(String),
}

impl FilterValue {
    /// The string sent to the backend.
    #[must_use]
    pub fn to_wire(&self) -> String {
        match self {
            Self::Text(s) | Self::Enum(s) | Self::Relation(s) => s.clone(),
            Self::Number(n) => n.to_string(),
            Self::Date(d) => d.format(DATE_FORMAT).to_string(),
        }
    }

    /// Parse a wire string according to the column kind.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFilterValue`] when `raw` is not a valid value
    /// for `kind` (non-finite numbers, malformed dates, enum values outside
    /// the allowed options).
    pub fn parse(kind: &FieldKind, field_id: &str, raw: &str) -> Result<Self> {
        match kind {
            FieldKind::Text => Ok(Self::Text(raw.to_string())),
            FieldKind::Number => raw
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .map(Self::Number)
                .ok_or_else(|| Error::invalid_filter_value(field_id, format!("'{raw}' is not a number"))),
            FieldKind::Date => NaiveDate::parse_from_str(raw, DATE_FORMAT)
                .map(Self::Date)
                .map_err(|e| Error::invalid_filter_value(field_id, e.to_string())),
            FieldKind::Enum { options } => {
                if options.iter().any(|o| o == raw) {
                    Ok(Self::Enum(raw.to_string()))
                } else {
                    Err(Error::invalid_filter_value(
                        field_id,
                        format!("'{raw}' is not one of {options:?}"),
                    ))
                }
            }
            FieldKind::Relation { .. } => Ok(Self::Relation(raw.to_string())),
        }
    }
}

/// One `{field, value}` filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub field_id: String,
    pub value: FilterValue,
}

impl Filter {
    /// Create a filter.
    pub fn new(field_id: impl Into<String>, value: FilterValue) -> Self {
        Self {
            field_id: field_id.into(),
            value,
        }
    }

    /// Create a text filter.
    pub fn text(field_id: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(field_id, FilterValue::Text(value.into()))
    }
}

/// Ordered set of filters with at most one filter per field.
///
/// Serialized as a plain list. Deserializing goes through
/// [`FilterSet::insert`], so a repeated field keeps its first position and
/// its last value.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FilterSet(Vec<Filter>);

impl FilterSet {
    /// Empty set.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Insert a filter; an existing filter on the same field is replaced in
    /// place so the original insertion order survives.
    pub fn insert(&mut self, filter: Filter) {
        match self.0.iter_mut().find(|f| f.field_id == filter.field_id) {
            Some(existing) => *existing = filter,
            None => self.0.push(filter),
        }
    }

    /// Builder-style [`FilterSet::insert`].
    #[must_use]
    pub fn with(mut self, filter: Filter) -> Self {
        self.insert(filter);
        self
    }

    /// Remove the filter on `field_id`, returning it.
    pub fn remove(&mut self, field_id: &str) -> Option<Filter> {
        let pos = self.0.iter().position(|f| f.field_id == field_id)?;
        Some(self.0.remove(pos))
    }

    /// Filter on `field_id`, if any.
    #[must_use]
    pub fn get(&self, field_id: &str) -> Option<&Filter> {
        self.0.iter().find(|f| f.field_id == field_id)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Filter> {
        self.0.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Filter> for FilterSet {
    fn from_iter<I: IntoIterator<Item = Filter>>(iter: I) -> Self {
        iter.into_iter().fold(Self::new(), Self::with)
    }
}

impl<'de> Deserialize<'de> for FilterSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Vec::<Filter>::deserialize(deserializer).map(|filters| filters.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a FilterSet {
    type Item = &'a Filter;
    type IntoIter = std::slice::Iter<'a, Filter>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
