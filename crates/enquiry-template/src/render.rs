/*
 * render.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Conversion of resolved values into cell content and display text.

use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::sheet::ValueStyle;
use crate::value::{CellValue, Scalar};

/// Format a decimal the way reports print amounts.
///
/// The integer part is truncated toward zero and grouped by thousands with a
/// space. Exactly one fractional digit follows a comma; it is the remainder
/// times ten, rounded half to even, without a sign of its own.
///
/// `12345.67` prints as `12 345,7`, `-987.65` as `-987,6`.
pub fn format_decimal(value: Decimal) -> String {
    let integer_part = value.trunc();
    let tenths = ((value - integer_part) * Decimal::TEN)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven)
        .abs();

    let integer = integer_part.to_i128().unwrap_or_default();
    let tenths = tenths.to_i128().unwrap_or_default();
    format!("{},{}", group_thousands(integer), tenths)
}

fn group_thousands(value: i128) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        grouped.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(ch);
    }
    grouped
}

/// Display text of a value: decimals in report format, everything else in
/// its natural form.
pub fn render_text(value: &Scalar) -> String {
    match value {
        Scalar::Decimal(d) => format_decimal(*d),
        other => other.to_string(),
    }
}

/// Cell content for a block value.
pub fn to_cell_value(value: &Scalar, style: ValueStyle) -> CellValue {
    match style {
        ValueStyle::FormattedText => CellValue::Text(render_text(value)),
        ValueStyle::Native => match value {
            Scalar::Text(s) => CellValue::Text(s.clone()),
            Scalar::Null => CellValue::Empty,
            other => coerce_numeric(&other.to_string()),
        },
    }
}

/// Read `text` as an integer, then as a decimal; keep it as text when
/// neither works.
pub fn coerce_numeric(text: &str) -> CellValue {
    if let Ok(n) = text.parse::<i64>() {
        return CellValue::Number(Decimal::from(n));
    }
    match Decimal::from_str(text) {
        Ok(d) => CellValue::Number(d),
        Err(_) => CellValue::Text(text.to_string()),
    }
}

/// Turn the `_x000a_` escapes some writers leave in header and footer text
/// back into line feeds.
pub fn unescape_line_breaks(text: &str) -> String {
    text.replace("_x000a_", "\n").replace("_x000A_", "\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_format_decimal_groups_and_rounds() {
        assert_eq!(format_decimal(dec("12345.67")), "12 345,7");
        assert_eq!(format_decimal(dec("-987.65")), "-987,6");
        assert_eq!(format_decimal(dec("100.25")), "100,2");
        assert_eq!(format_decimal(dec("1234567")), "1 234 567,0");
        assert_eq!(format_decimal(dec("0")), "0,0");
    }

    #[test]
    fn test_format_decimal_tenths_round_half_even() {
        assert_eq!(format_decimal(dec("2.45")), "2,4");
        assert_eq!(format_decimal(dec("2.55")), "2,6");
    }

    #[test]
    fn test_format_decimal_keeps_literal_carry() {
        // The tenths digit is not carried into the integer part.
        assert_eq!(format_decimal(dec("1.96")), "1,10");
    }

    #[test]
    fn test_render_text() {
        assert_eq!(render_text(&Scalar::Decimal(dec("55.66"))), "55,7");
        assert_eq!(render_text(&Scalar::Integer(777777)), "777777");
        assert_eq!(render_text(&Scalar::text("МБОУ")), "МБОУ");
        assert_eq!(render_text(&Scalar::Null), "");
    }

    #[test]
    fn test_native_cell_values() {
        assert_eq!(
            to_cell_value(&Scalar::Integer(3), ValueStyle::Native),
            CellValue::Number(Decimal::from(3))
        );
        assert_eq!(
            to_cell_value(&Scalar::Decimal(dec("55.66")), ValueStyle::Native),
            CellValue::Number(dec("55.66"))
        );
        assert_eq!(
            to_cell_value(&Scalar::text("007"), ValueStyle::Native),
            CellValue::Text("007".to_string())
        );
        assert_eq!(to_cell_value(&Scalar::Null, ValueStyle::Native), CellValue::Empty);
    }

    #[test]
    fn test_formatted_text_cell_values() {
        assert_eq!(
            to_cell_value(&Scalar::Decimal(dec("12345.67")), ValueStyle::FormattedText),
            CellValue::Text("12 345,7".to_string())
        );
    }

    #[test]
    fn test_coerce_numeric_falls_back_to_text() {
        assert_eq!(coerce_numeric("42"), CellValue::Number(Decimal::from(42)));
        assert_eq!(coerce_numeric("4.5"), CellValue::Number(dec("4.5")));
        assert_eq!(coerce_numeric("n/a"), CellValue::Text("n/a".to_string()));
    }

    #[test]
    fn test_unescape_line_breaks() {
        assert_eq!(
            unescape_line_breaks("Справка сформирована_x000a_01.02.2025"),
            "Справка сформирована\n01.02.2025"
        );
    }
}
