/*
 * value.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Scalar values delivered by queries and the cell values written to sheets.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single value in a query result row.
///
/// Rows arrive as JSON objects. Integral numbers become [`Scalar::Integer`],
/// every other number becomes an exact [`Scalar::Decimal`] built from its
/// textual form, so `55.66` stays `55.66` rather than a binary float.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "serde_json::Value", into = "serde_json::Value")]
pub enum Scalar {
    Text(String),
    Integer(i64),
    Decimal(Decimal),
    Null,
}

impl Scalar {
    pub fn text(value: impl Into<String>) -> Self {
        Scalar::Text(value.into())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }
}

impl fmt::Display for Scalar {
    /// The natural string form: text as-is, numbers in plain notation,
    /// null as the empty string.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Text(s) => f.write_str(s),
            Scalar::Integer(n) => write!(f, "{n}"),
            Scalar::Decimal(d) => write!(f, "{d}"),
            Scalar::Null => Ok(()),
        }
    }
}

impl From<serde_json::Value> for Scalar {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Scalar::Null,
            serde_json::Value::String(s) => Scalar::Text(s),
            serde_json::Value::Bool(b) => Scalar::Text(b.to_string()),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    return Scalar::Integer(i);
                }
                let literal = n.to_string();
                Decimal::from_str(&literal)
                    .or_else(|_| Decimal::from_scientific(&literal))
                    .map(Scalar::Decimal)
                    .unwrap_or(Scalar::Text(literal))
            }
            other => Scalar::Text(other.to_string()),
        }
    }
}

impl From<Scalar> for serde_json::Value {
    fn from(value: Scalar) -> Self {
        match value {
            Scalar::Text(s) => serde_json::Value::String(s),
            Scalar::Integer(i) => serde_json::Value::from(i),
            Scalar::Decimal(d) => serde_json::Number::from_str(&d.to_string())
                .map(serde_json::Value::Number)
                .unwrap_or_else(|_| serde_json::Value::String(d.to_string())),
            Scalar::Null => serde_json::Value::Null,
        }
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Text(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::Text(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Integer(value)
    }
}

impl From<Decimal> for Scalar {
    fn from(value: Decimal) -> Self {
        Scalar::Decimal(value)
    }
}

/// The content of one cell in a template sheet.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Number(Decimal),
    Bool(bool),
    /// A formula, stored without the leading `=`.
    Formula(String),
}

impl CellValue {
    /// The text of a string cell; placeholders only ever live in these.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.is_empty(),
            _ => false,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Text(s) => f.write_str(s),
            CellValue::Number(n) => write!(f, "{n}"),
            CellValue::Bool(true) => f.write_str("TRUE"),
            CellValue::Bool(false) => f.write_str("FALSE"),
            CellValue::Formula(formula) => write!(f, "={formula}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_numbers_keep_their_decimal_digits() {
        let row: Vec<Scalar> = serde_json::from_str(r#"[1, 55.66, "x", null, 1e3]"#).unwrap();
        assert_eq!(row[0], Scalar::Integer(1));
        assert_eq!(row[1], Scalar::Decimal(Decimal::from_str("55.66").unwrap()));
        assert_eq!(row[2], Scalar::text("x"));
        assert_eq!(row[3], Scalar::Null);
        assert_eq!(row[4], Scalar::Decimal(Decimal::from(1000)));
    }

    #[test]
    fn test_natural_string_form() {
        assert_eq!(Scalar::Integer(-4).to_string(), "-4");
        assert_eq!(
            Scalar::Decimal(Decimal::from_str("100.25").unwrap()).to_string(),
            "100.25"
        );
        assert_eq!(Scalar::Null.to_string(), "");
    }

    #[test]
    fn test_cell_value_emptiness() {
        assert!(CellValue::Empty.is_empty());
        assert!(CellValue::Text(String::new()).is_empty());
        assert!(!CellValue::Number(Decimal::ZERO).is_empty());
    }
}
