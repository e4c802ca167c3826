//! SQL identifier quoting and literal rendering
//!
//! Statements are built as text for the Statement Executor, so every
//! identifier and value that reaches SQL goes through these helpers.

use chrono::{NaiveDate, NaiveDateTime};

/// Quote a SQL identifier to prevent injection.
///
/// Wraps the identifier in double quotes and escapes any embedded double quotes
/// by doubling them, following the SQL standard.
///
/// # Examples
/// ```
/// use chorus_core::sql_utils::quote_ident;
/// assert_eq!(quote_ident("users"), r#""users""#);
/// assert_eq!(quote_ident(r#"my"table"#), r#""my""table""#);
/// ```
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Quote a potentially schema-qualified name (e.g. `schema.table`).
///
/// # Examples
/// ```
/// use chorus_core::sql_utils::quote_qualified;
/// assert_eq!(quote_qualified("users"), r#""users""#);
/// assert_eq!(quote_qualified("analytics.songs"), r#""analytics"."songs""#);
/// ```
pub fn quote_qualified(name: &str) -> String {
    name.split('.')
        .map(quote_ident)
        .collect::<Vec<_>>()
        .join(".")
}

/// Split a potentially schema-qualified table name into (schema, table).
///
/// Uses the last `.` as the separator. If no `.` is present, returns
/// `("main", name)`.
pub fn split_qualified_name(name: &str) -> (&str, &str) {
    if let Some(pos) = name.rfind('.') {
        (&name[..pos], &name[pos + 1..])
    } else {
        ("main", name)
    }
}

/// Escape a SQL string literal value by doubling single quotes.
pub fn escape_sql_string(value: &str) -> String {
    value.replace('\'', "''")
}

/// A value rendered as a SQL literal
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Int(i64),
    /// Rendered in exponent form so the store parses it as DOUBLE, not DECIMAL
    Float(f64),
    Text(String),
    Bool(bool),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
}

impl SqlValue {
    /// Render as a SQL literal
    pub fn to_sql(&self) -> String {
        match self {
            SqlValue::Null => "NULL".to_string(),
            SqlValue::Int(n) => n.to_string(),
            SqlValue::Float(f) if f.is_finite() => format!("{f:e}"),
            SqlValue::Float(_) => "NULL".to_string(),
            SqlValue::Text(s) => format!("'{}'", escape_sql_string(s)),
            SqlValue::Bool(b) => (if *b { "TRUE" } else { "FALSE" }).to_string(),
            SqlValue::Date(d) => format!("DATE '{}'", d.format("%Y-%m-%d")),
            SqlValue::Timestamp(ts) => {
                format!("TIMESTAMP '{}'", ts.format("%Y-%m-%d %H:%M:%S%.3f"))
            }
        }
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Int(value)
    }
}

impl From<i32> for SqlValue {
    fn from(value: i32) -> Self {
        SqlValue::Int(value.into())
    }
}

impl From<u32> for SqlValue {
    fn from(value: u32) -> Self {
        SqlValue::Int(value.into())
    }
}

impl From<f64> for SqlValue {
    fn from(value: f64) -> Self {
        SqlValue::Float(value)
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_string())
    }
}

impl From<&String> for SqlValue {
    fn from(value: &String) -> Self {
        SqlValue::Text(value.clone())
    }
}

impl From<bool> for SqlValue {
    fn from(value: bool) -> Self {
        SqlValue::Bool(value)
    }
}

impl From<NaiveDate> for SqlValue {
    fn from(value: NaiveDate) -> Self {
        SqlValue::Date(value)
    }
}

impl From<NaiveDateTime> for SqlValue {
    fn from(value: NaiveDateTime) -> Self {
        SqlValue::Timestamp(value)
    }
}

impl<T> From<Option<T>> for SqlValue
where
    T: Into<SqlValue>,
{
    fn from(value: Option<T>) -> Self {
        value.map_or(SqlValue::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    #[test]
    fn test_quote_ident_with_embedded_quotes() {
        assert_eq!(quote_ident(r#"my"table"#), r#""my""table""#);
    }

    #[test]
    fn test_quote_qualified_two_parts() {
        assert_eq!(quote_qualified("analytics.time"), r#""analytics"."time""#);
    }

    #[test]
    fn test_split_qualified_name() {
        assert_eq!(split_qualified_name("users"), ("main", "users"));
        assert_eq!(split_qualified_name("analytics.users"), ("analytics", "users"));
    }

    #[test]
    fn test_text_literal_escapes_quotes() {
        assert_eq!(SqlValue::from("Des'ree").to_sql(), "'Des''ree'");
    }

    #[test]
    fn test_float_literal_round_trips() {
        for value in [200.5, 246.30812, 0.1, 1e-7, 123456789.125] {
            let sql = SqlValue::from(value).to_sql();
            assert_eq!(sql.parse::<f64>().unwrap(), value, "{sql}");
            assert!(sql.contains('e'), "{sql}");
        }
    }

    #[test]
    fn test_non_finite_float_is_null() {
        assert_eq!(SqlValue::Float(f64::NAN).to_sql(), "NULL");
        assert_eq!(SqlValue::Float(f64::INFINITY).to_sql(), "NULL");
    }

    #[test]
    fn test_option_maps_to_null() {
        assert_eq!(SqlValue::from(None::<i64>).to_sql(), "NULL");
        assert_eq!(SqlValue::from(Some(7i64)).to_sql(), "7");
        assert_eq!(SqlValue::from(Some(&"free".to_string())).to_sql(), "'free'");
    }

    #[test]
    fn test_timestamp_literal_keeps_milliseconds() {
        let ts = DateTime::from_timestamp_millis(1541106106796)
            .unwrap()
            .naive_utc();
        assert_eq!(
            SqlValue::from(ts).to_sql(),
            "TIMESTAMP '2018-11-01 21:01:46.796'"
        );
    }

    #[test]
    fn test_date_and_bool_literals() {
        let date = NaiveDate::from_ymd_opt(2018, 11, 4).unwrap();
        assert_eq!(SqlValue::from(date).to_sql(), "DATE '2018-11-04'");
        assert_eq!(SqlValue::from(true).to_sql(), "TRUE");
        assert_eq!(SqlValue::from(false).to_sql(), "FALSE");
    }
}
