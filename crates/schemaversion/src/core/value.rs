//! Engine-neutral values, rows and query results.
//!
//! Every engine client converts its native row format into these types, so
//! callers see one shape no matter which database answered.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use uuid::Uuid;

/// A single cell value, owned.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SqlValue {
    Null,
    Bool(bool),
    I64(i64),
    /// Unsigned integers that do not fit in `i64` (MySQL `BIGINT UNSIGNED`).
    U64(u64),
    F64(f64),
    Decimal(Decimal),
    Text(String),
    Bytes(Vec<u8>),
    Uuid(Uuid),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(NaiveDateTime),
    DateTimeOffset(DateTime<FixedOffset>),
}

impl SqlValue {
    /// Check if the value is NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    /// Interpret the value as a signed integer.
    ///
    /// Text is parsed, since the text protocols (PostgreSQL simple query,
    /// MySQL text results) deliver integers as strings. Decimals and floats
    /// are accepted only when they carry no fractional part.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SqlValue::I64(v) => Some(*v),
            SqlValue::U64(v) => i64::try_from(*v).ok(),
            SqlValue::Bool(b) => Some(i64::from(*b)),
            SqlValue::Decimal(d) if d.fract().is_zero() => d.to_i64(),
            SqlValue::F64(f) if f.fract() == 0.0 => Some(*f as i64),
            SqlValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Borrow the value as text, if it is text.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            SqlValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::I64(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(v.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::Text(v)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(SqlValue::Null)
    }
}

/// One result row: column names paired with values, in column order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    cells: Vec<(String, SqlValue)>,
}

impl Row {
    /// Create an empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty row with room for `n` columns.
    pub fn with_capacity(n: usize) -> Self {
        Self {
            cells: Vec::with_capacity(n),
        }
    }

    /// Append a column.
    pub fn push(&mut self, column: impl Into<String>, value: SqlValue) {
        self.cells.push((column.into(), value));
    }

    /// Look up a value by column name. The first matching column wins.
    pub fn get(&self, column: &str) -> Option<&SqlValue> {
        self.cells
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// Look up a value by position.
    pub fn get_index(&self, idx: usize) -> Option<&SqlValue> {
        self.cells.get(idx).map(|(_, value)| value)
    }

    /// Column names in order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(name, _)| name.as_str())
    }

    /// Iterate over `(column, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SqlValue)> {
        self.cells.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, SqlValue)> for Row {
    fn from_iter<I: IntoIterator<Item = (S, SqlValue)>>(iter: I) -> Self {
        Self {
            cells: iter.into_iter().map(|(c, v)| (c.into(), v)).collect(),
        }
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.cells.len()))?;
        for (name, value) in &self.cells {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Column metadata reported by an engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Field {
    /// Column name.
    pub name: String,
    /// Engine-specific type name; `None` when the protocol does not report one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
}

impl Field {
    pub fn new(name: impl Into<String>, type_name: Option<String>) -> Self {
        Self {
            name: name.into(),
            type_name,
        }
    }
}

/// Output of an [`EngineClient`](super::EngineClient) before normalization.
///
/// Each client fills in what its engine reports; the adapter for that engine
/// then decides what the caller sees.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EngineResult {
    pub rows: Option<Vec<Row>>,
    pub fields: Option<Vec<Field>>,
}

/// Normalized result of [`run_query`](super::DriverAdapter::run_query).
///
/// Both members are optional per engine; absent members are omitted when
/// serialized rather than written as empty lists.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct QueryResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<Vec<Row>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<Field>>,
}

impl QueryResult {
    /// First row, if any rows were returned.
    pub fn first_row(&self) -> Option<&Row> {
        self.rows.as_ref().and_then(|rows| rows.first())
    }

    /// Whether the result carries at least one row.
    pub fn has_rows(&self) -> bool {
        self.rows.as_ref().is_some_and(|rows| !rows.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_as_i64_conversions() {
        assert_eq!(SqlValue::I64(3).as_i64(), Some(3));
        assert_eq!(SqlValue::Text(" 42 ".into()).as_i64(), Some(42));
        assert_eq!(SqlValue::Decimal(Decimal::new(700, 2)).as_i64(), Some(7));
        assert_eq!(SqlValue::Decimal(Decimal::new(701, 2)).as_i64(), None);
        assert_eq!(SqlValue::U64(u64::MAX).as_i64(), None);
        assert_eq!(SqlValue::Text("abc".into()).as_i64(), None);
        assert_eq!(SqlValue::Null.as_i64(), None);
    }

    #[test]
    fn test_row_lookup_preserves_order() {
        let row: Row = [
            ("version", SqlValue::I64(3)),
            ("applied_by", SqlValue::from("ci")),
        ]
        .into_iter()
        .collect();

        assert_eq!(row.len(), 2);
        assert_eq!(row.get("version"), Some(&SqlValue::I64(3)));
        assert_eq!(row.get_index(1).and_then(SqlValue::as_str), Some("ci"));
        assert!(row.get("missing").is_none());
        assert_eq!(row.columns().collect::<Vec<_>>(), vec!["version", "applied_by"]);
    }

    #[test]
    fn test_row_serializes_as_object() {
        let row: Row = [("version", SqlValue::I64(3)), ("note", SqlValue::Null)]
            .into_iter()
            .collect();
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(json, r#"{"version":3,"note":null}"#);
    }

    #[test]
    fn test_query_result_omits_absent_members() {
        let result = QueryResult {
            rows: Some(vec![]),
            fields: None,
        };
        let json = serde_json::to_value(&result).unwrap();
        assert!(json.get("rows").is_some());
        assert!(json.get("fields").is_none());

        let empty = serde_json::to_string(&QueryResult::default()).unwrap();
        assert_eq!(empty, "{}");
    }
}
