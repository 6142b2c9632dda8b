/*
 * header_footer.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Page header and footer text with its `&L`/`&C`/`&R` sections.

use enquiry_template::{FooterStamp, unescape_line_breaks};

/// The three sections of a header or footer, codes included.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderFooterText {
    pub left: String,
    pub center: String,
    pub right: String,
}

impl HeaderFooterText {
    /// Split stored text into sections. Text before any section code belongs
    /// to the center, and `&&` is a literal ampersand.
    pub fn parse(text: &str) -> Self {
        let text = unescape_line_breaks(text);
        let mut sections = Self::default();
        let mut current = &mut sections.center;
        let mut chars = text.chars().peekable();
        while let Some(ch) = chars.next() {
            if ch != '&' {
                current.push(ch);
                continue;
            }
            match chars.peek().copied() {
                Some('L') => {
                    chars.next();
                    current = &mut sections.left;
                }
                Some('C') => {
                    chars.next();
                    current = &mut sections.center;
                }
                Some('R') => {
                    chars.next();
                    current = &mut sections.right;
                }
                Some('&') => {
                    chars.next();
                    current.push_str("&&");
                }
                _ => current.push('&'),
            }
        }
        sections
    }

    pub fn is_empty(&self) -> bool {
        self.left.is_empty() && self.center.is_empty() && self.right.is_empty()
    }

    /// Replace the right section with the stamp, in the stamp's font.
    pub fn stamp_right(&mut self, stamp: &FooterStamp) {
        self.right = format!(
            "&\"{},Regular\"&{}{}",
            stamp.font,
            stamp.size,
            stamp.text().replace('&', "&&")
        );
    }
}

impl std::fmt::Display for HeaderFooterText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (code, section) in [("&L", &self.left), ("&C", &self.center), ("&R", &self.right)] {
            if !section.is_empty() {
                write!(f, "{code}{section}")?;
            }
        }
        Ok(())
    }
}
