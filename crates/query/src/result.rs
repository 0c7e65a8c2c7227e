//! Decoded list responses.

use gridwire_fetch::Body;
use serde_json::Value;

use crate::error::{Error, Result};

/// Rows of one list response plus the server-reported total.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    pub rows: Vec<Value>,
    /// `meta.totalRowCount` when the server sent one.
    pub total_row_count: Option<u64>,
}

impl QueryResult {
    #[must_use]
    pub const fn new(rows: Vec<Value>, total_row_count: Option<u64>) -> Self {
        Self {
            rows,
            total_row_count,
        }
    }

    /// Decode a response body.
    ///
    /// Accepted shapes: `{"data": [...], "meta": {"totalRowCount": n}}`, a bare
    /// array, a single object (treated as one row) and an empty body.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidResponse`] for scalars or a non-array `data`.
    pub fn from_body(body: Body) -> Result<Self> {
        match body {
            Value::Null => Ok(Self::default()),
            Value::Array(rows) => Ok(Self::new(rows, None)),
            Value::Object(mut object) => match object.remove("data") {
                Some(Value::Array(rows)) => {
                    let total = object
                        .get("meta")
                        .and_then(|meta| meta.get("totalRowCount"))
                        .or_else(|| object.get("totalRowCount"))
                        .and_then(Value::as_u64);
                    Ok(Self::new(rows, total))
                }
                Some(other) => Err(Error::invalid_response(format!(
                    "expected 'data' to be an array, got {}",
                    kind_of(&other)
                ))),
                None => Ok(Self::new(vec![Value::Object(object)], None)),
            },
            other => Err(Error::invalid_response(format!(
                "expected a list response, got {}",
                kind_of(&other)
            ))),
        }
    }

    /// Total for paging: the reported count, else the number of rows.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.total_row_count.unwrap_or(self.rows.len() as u64)
    }
}

const fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_with_total() -> Result<()> {
        let result = QueryResult::from_body(json!({
            "data": [{"id": 1}, {"id": 2}],
            "meta": {"totalRowCount": 240}
        }))?;
        assert_eq!(result.rows.len(), 2);
        assert_eq!(result.total_row_count, Some(240));
        assert_eq!(result.total(), 240);
        Ok(())
    }

    #[test]
    fn test_bare_array_counts_rows() -> Result<()> {
        let result = QueryResult::from_body(json!([{"id": 1}, {"id": 2}, {"id": 3}]))?;
        assert_eq!(result.total_row_count, None);
        assert_eq!(result.total(), 3);
        Ok(())
    }

    #[test]
    fn test_single_record_and_empty_body() -> Result<()> {
        let me = QueryResult::from_body(json!({"id": 7, "name": "ana"}))?;
        assert_eq!(me.rows, vec![json!({"id": 7, "name": "ana"})]);

        let empty = QueryResult::from_body(Value::Null)?;
        assert!(empty.rows.is_empty());
        assert_eq!(empty.total(), 0);
        Ok(())
    }

    #[test]
    fn test_rejects_scalar_bodies() {
        assert!(QueryResult::from_body(json!("nope")).is_err());
        assert!(QueryResult::from_body(json!({"data": 5})).is_err());
    }
}
