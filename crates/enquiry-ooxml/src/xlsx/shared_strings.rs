/*
 * shared_strings.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! The workbook's shared string table, read-only.
//!
//! New strings are written as inline strings, so the table is never
//! rewritten.

use crate::xml::{XmlDocument, XmlElement};

#[derive(Debug, Clone, Default)]
pub struct SharedStrings {
    items: Vec<String>,
}

impl SharedStrings {
    pub fn from_document(document: &XmlDocument) -> Self {
        let items = document.root.children_named("si").map(item_text).collect();
        Self { items }
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.items.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Text of a string item: plain `t`, or the `t` of each rich-text run.
/// Phonetic runs are skipped.
pub fn item_text(item: &XmlElement) -> String {
    let mut text = String::new();
    for child in item.elements() {
        match child.name.as_str() {
            "t" => text.push_str(&child.text()),
            "r" => {
                if let Some(t) = child.child("t") {
                    text.push_str(&t.text());
                }
            }
            _ => {}
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_and_rich_items() {
        let doc = XmlDocument::parse(
            r#"<sst count="2" uniqueCount="2"><si><t>{{1;inn}}</t></si><si><r><rPr><b/></rPr><t>Ит</t></r><r><t>ого</t></r><rPh><t>x</t></rPh></si></sst>"#,
            "xl/sharedStrings.xml",
        )
        .unwrap();
        let strings = SharedStrings::from_document(&doc);
        assert_eq!(strings.len(), 2);
        assert_eq!(strings.get(0), Some("{{1;inn}}"));
        assert_eq!(strings.get(1), Some("Итого"));
        assert_eq!(strings.get(2), None);
    }
}
