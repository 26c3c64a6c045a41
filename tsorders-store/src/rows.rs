//! Decoding of stored-procedure result rows into JSON objects.
//!
//! Procedures return different column sets, so each column is decoded by its
//! reported MySQL type instead of through a fixed struct.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::{Number, Value};
use sqlx::mysql::MySqlRow;
use sqlx::{Column, Row as _, TypeInfo, ValueRef};
use tsorders_core::Row;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ColumnKind {
    Signed,
    Unsigned,
    Float,
    Double,
    Decimal,
    Date,
    DateTime,
    Time,
    Json,
    Text,
}

/// Maps the type name sqlx reports (`"INT UNSIGNED"`, `"DECIMAL"`, ...) to a decoder.
pub(crate) fn column_kind(type_name: &str) -> ColumnKind {
    let unsigned = type_name.ends_with(" UNSIGNED");
    let base = type_name.trim_end_matches(" UNSIGNED");

    match base {
        "BOOLEAN" | "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" if unsigned => {
            ColumnKind::Unsigned
        }
        "BOOLEAN" | "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" => ColumnKind::Signed,
        "YEAR" => ColumnKind::Unsigned,
        "FLOAT" => ColumnKind::Float,
        "DOUBLE" => ColumnKind::Double,
        "DECIMAL" => ColumnKind::Decimal,
        "DATE" => ColumnKind::Date,
        "DATETIME" | "TIMESTAMP" => ColumnKind::DateTime,
        "TIME" => ColumnKind::Time,
        "JSON" => ColumnKind::Json,
        _ => ColumnKind::Text,
    }
}

fn float_value(value: f64) -> Value {
    Number::from_f64(value).map(Value::Number).unwrap_or(Value::Null)
}

pub(crate) fn decimal_value(value: Decimal) -> Value {
    value.to_f64().map(float_value).unwrap_or(Value::Null)
}

fn decode(row: &MySqlRow, index: usize, kind: ColumnKind) -> Result<Value, sqlx::Error> {
    let value = match kind {
        ColumnKind::Signed => Value::from(row.try_get::<i64, _>(index)?),
        ColumnKind::Unsigned => Value::from(row.try_get::<u64, _>(index)?),
        ColumnKind::Float => float_value(f64::from(row.try_get::<f32, _>(index)?)),
        ColumnKind::Double => float_value(row.try_get::<f64, _>(index)?),
        ColumnKind::Decimal => decimal_value(row.try_get::<Decimal, _>(index)?),
        ColumnKind::Date => {
            Value::String(row.try_get::<NaiveDate, _>(index)?.format("%Y-%m-%d").to_string())
        }
        ColumnKind::DateTime => Value::String(
            row.try_get::<NaiveDateTime, _>(index)?
                .format("%Y-%m-%dT%H:%M:%S")
                .to_string(),
        ),
        ColumnKind::Time => {
            Value::String(row.try_get::<NaiveTime, _>(index)?.format("%H:%M:%S").to_string())
        }
        ColumnKind::Json => row.try_get::<Value, _>(index)?,
        ColumnKind::Text => match row.try_get::<String, _>(index) {
            Ok(text) => Value::String(text),
            Err(_) => {
                let bytes = row.try_get_unchecked::<Vec<u8>, _>(index)?;
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            }
        },
    };
    Ok(value)
}

/// Converts one result row into a JSON object keyed by column name.
pub fn row_to_json(row: &MySqlRow) -> Result<Row, sqlx::Error> {
    let mut map = Row::new();
    for column in row.columns() {
        let index = column.ordinal();
        let is_null = row.try_get_raw(index)?.is_null();
        let value = if is_null {
            Value::Null
        } else {
            decode(row, index, column_kind(column.type_info().name()))?
        };
        map.insert(column.name().to_string(), value);
    }
    Ok(map)
}

/// `CALL name(?, ?, ...)` with one placeholder per argument.
pub(crate) fn call_sql(procedure: &str, arity: usize) -> String {
    let placeholders = vec!["?"; arity].join(", ");
    format!("CALL {}({})", procedure, placeholders)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_column_kind_by_type_name() {
        assert_eq!(column_kind("INT"), ColumnKind::Signed);
        assert_eq!(column_kind("BOOLEAN"), ColumnKind::Signed);
        assert_eq!(column_kind("BIGINT UNSIGNED"), ColumnKind::Unsigned);
        assert_eq!(column_kind("DECIMAL"), ColumnKind::Decimal);
        assert_eq!(column_kind("TIMESTAMP"), ColumnKind::DateTime);
        assert_eq!(column_kind("DATE"), ColumnKind::Date);
        assert_eq!(column_kind("VARCHAR"), ColumnKind::Text);
        assert_eq!(column_kind("BLOB"), ColumnKind::Text);
        assert_eq!(column_kind("JSON"), ColumnKind::Json);
    }

    #[test]
    fn test_decimal_becomes_json_number() {
        let price = Decimal::from_str("12.50").unwrap();
        assert_eq!(decimal_value(price), serde_json::json!(12.5));
    }

    #[test]
    fn test_call_sql_placeholders() {
        assert_eq!(call_sql("uSp_getOrdersDetailUnshipped", 0), "CALL uSp_getOrdersDetailUnshipped()");
        assert_eq!(call_sql("uSp_updateOrdersWS", 2), "CALL uSp_updateOrdersWS(?, ?)");
    }
}
