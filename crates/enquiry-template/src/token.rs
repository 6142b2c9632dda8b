/*
 * token.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Placeholder recognition
 */

//! Placeholder recognition.
//!
//! A placeholder is a `{{...}}` span whose body takes one of four shapes:
//!
//! | Body                  | Kind                                      |
//! |-----------------------|-------------------------------------------|
//! | `5:0;inn`             | [`TokenKind::Cell`] (query, row, column)  |
//! | `ROUND;SUM;5;total`   | [`TokenKind::Formatter`]                  |
//! | `5;inn`               | [`TokenKind::Block`] (query, column)      |
//! | `name`                | [`TokenKind::Field`]                      |
//!
//! The alternatives are tried in that order, so a numeric-prefixed body is
//! never read as a field name. Any other `{{...}}` text is not a placeholder
//! and stays in the document verbatim.

use std::ops::Range;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::store::QueryId;

static PLACEHOLDER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"\{\{(?:",
        r"(?P<cell_query>\d+):(?P<cell_row>\d+);(?P<cell_column>\w+)",
        r"|(?P<ops>[a-zA-Z_][\w;]*);(?P<fmt_query>\d+);(?P<fmt_column>[a-zA-Z_]\w*)",
        r"|(?P<block_query>\d+);(?P<block_column>\w+)",
        r"|(?P<field>\w+)",
        r")\}\}",
    ))
    .expect("Invalid regex pattern for placeholders")
});

/// What a placeholder asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// `{{name}}`: a user-submitted form value.
    Field { field_name: String },
    /// `{{query:row;column}}`: one value of one result row.
    Cell {
        query_id: QueryId,
        row_index: usize,
        column: String,
    },
    /// `{{query;column}}`: one column of every result row, expanded into rows.
    Block { query_id: QueryId, column: String },
    /// `{{OP;OP;query;column}}`: an operation chain over a column.
    Formatter {
        operations: Vec<String>,
        query_id: QueryId,
        column: String,
    },
}

/// A recognized placeholder and where it sits in the scanned text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    /// The full matched text, braces included.
    pub raw: String,
    /// Byte range of `raw` in the scanned text.
    pub span: Range<usize>,
    pub kind: TokenKind,
}

impl Placeholder {
    pub fn is_block(&self) -> bool {
        matches!(self.kind, TokenKind::Block { .. })
    }
}

/// Find the first placeholder in `text`.
pub fn find_first(text: &str) -> Option<Placeholder> {
    find_all(text).into_iter().next()
}

/// Find every non-overlapping placeholder in `text`, left to right.
pub fn find_all(text: &str) -> Vec<Placeholder> {
    if !text.contains("{{") {
        return Vec::new();
    }
    PLACEHOLDER_RE
        .captures_iter(text)
        .filter_map(|caps| classify(&caps))
        .collect()
}

/// Find the block placeholders in `text`, as `(query_id, column)` pairs.
pub fn find_blocks(text: &str) -> Vec<(QueryId, String)> {
    find_all(text)
        .into_iter()
        .filter_map(|placeholder| match placeholder.kind {
            TokenKind::Block { query_id, column } => Some((query_id, column)),
            _ => None,
        })
        .collect()
}

/// Build a placeholder from one regex match.
///
/// Numbers too large for their target type make the span literal text.
fn classify(caps: &Captures<'_>) -> Option<Placeholder> {
    let whole = caps.get(0)?;
    let kind = if let Some(query) = caps.name("cell_query") {
        TokenKind::Cell {
            query_id: query.as_str().parse().ok()?,
            row_index: caps.name("cell_row")?.as_str().parse().ok()?,
            column: caps.name("cell_column")?.as_str().to_string(),
        }
    } else if let Some(ops) = caps.name("ops") {
        TokenKind::Formatter {
            operations: ops.as_str().split(';').map(str::to_string).collect(),
            query_id: caps.name("fmt_query")?.as_str().parse().ok()?,
            column: caps.name("fmt_column")?.as_str().to_string(),
        }
    } else if let Some(query) = caps.name("block_query") {
        TokenKind::Block {
            query_id: query.as_str().parse().ok()?,
            column: caps.name("block_column")?.as_str().to_string(),
        }
    } else {
        TokenKind::Field {
            field_name: caps.name("field")?.as_str().to_string(),
        }
    };

    Some(Placeholder {
        raw: whole.as_str().to_string(),
        span: whole.range(),
        kind,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kind_of(text: &str) -> Option<TokenKind> {
        find_first(text).map(|p| p.kind)
    }

    #[test]
    fn test_field() {
        assert_eq!(
            kind_of("Dear {{full_name}},"),
            Some(TokenKind::Field {
                field_name: "full_name".to_string()
            })
        );
    }

    #[test]
    fn test_cell() {
        assert_eq!(
            kind_of("{{5:2;inn}}"),
            Some(TokenKind::Cell {
                query_id: 5,
                row_index: 2,
                column: "inn".to_string()
            })
        );
    }

    #[test]
    fn test_block() {
        assert_eq!(
            kind_of("{{6;pokaz}}"),
            Some(TokenKind::Block {
                query_id: 6,
                column: "pokaz".to_string()
            })
        );
    }

    #[test]
    fn test_formatter_splits_operations() {
        assert_eq!(
            kind_of("{{ROUND;SUM;6;y_2023}}"),
            Some(TokenKind::Formatter {
                operations: vec!["ROUND".to_string(), "SUM".to_string()],
                query_id: 6,
                column: "y_2023".to_string()
            })
        );
    }

    #[test]
    fn test_numeric_body_is_never_a_field() {
        assert!(matches!(kind_of("{{7;x}}"), Some(TokenKind::Block { .. })));
        assert!(matches!(kind_of("{{7:0;x}}"), Some(TokenKind::Cell { .. })));
    }

    #[test]
    fn test_unicode_column_names() {
        assert_eq!(
            kind_of("{{3;наименование}}"),
            Some(TokenKind::Block {
                query_id: 3,
                column: "наименование".to_string()
            })
        );
    }

    #[test]
    fn test_unrecognized_bodies_are_literal() {
        assert_eq!(find_all("{{ spaced }}"), vec![]);
        assert_eq!(find_all("{{a-b}}"), vec![]);
        assert_eq!(find_all("{{}}"), vec![]);
        assert_eq!(find_all("{single}"), vec![]);
    }

    #[test]
    fn test_overflowing_query_id_is_literal() {
        assert_eq!(find_all("{{99999999999999999999;x}}"), vec![]);
    }

    #[test]
    fn test_find_all_reports_spans() {
        let text = "{{a}} and {{1;b}}";
        let found = find_all(text);
        assert_eq!(found.len(), 2);
        assert_eq!(&text[found[1].span.clone()], "{{1;b}}");
        assert!(found[1].is_block());
    }

    #[test]
    fn test_find_blocks() {
        assert_eq!(
            find_blocks("{{1;a}} {{name}} {{2;b}}"),
            vec![(1, "a".to_string()), (2, "b".to_string())]
        );
    }
}
