/*
 * cell_ref.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! A1-style cell and range references.

use enquiry_template::MergeRange;

/// `1` → `A`, `28` → `AB`.
pub fn column_letters(mut column: u32) -> String {
    let mut letters = Vec::new();
    while column > 0 {
        let rem = (column - 1) % 26;
        letters.push(b'A' + rem as u8);
        column = (column - 1) / 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

/// `B12` → `(12, 2)`. Absolute markers (`$B$12`) are accepted.
pub fn parse_cell_ref(reference: &str) -> Option<(u32, u32)> {
    let reference = reference.replace('$', "");
    let split = reference.find(|c: char| c.is_ascii_digit())?;
    let (letters, digits) = reference.split_at(split);
    if letters.is_empty() || !letters.bytes().all(|b| b.is_ascii_alphabetic()) {
        return None;
    }
    let column = letters.bytes().try_fold(0u32, |acc, b| {
        acc.checked_mul(26)?
            .checked_add(u32::from(b.to_ascii_uppercase() - b'A') + 1)
    })?;
    let row: u32 = digits.parse().ok()?;
    (row > 0).then_some((row, column))
}

pub fn cell_ref(row: u32, column: u32) -> String {
    format!("{}{}", column_letters(column), row)
}

/// `A1:C3` → a merge range; a single cell reference gives a 1x1 range.
pub fn parse_range(reference: &str) -> Option<MergeRange> {
    let (start, end) = reference.split_once(':').unwrap_or((reference, reference));
    let (min_row, min_col) = parse_cell_ref(start)?;
    let (max_row, max_col) = parse_cell_ref(end)?;
    MergeRange::new(min_row, max_row, min_col, max_col)
}

pub fn range_ref(range: &MergeRange) -> String {
    format!(
        "{}:{}",
        cell_ref(range.min_row, range.min_col),
        cell_ref(range.max_row, range.max_col)
    )
}
