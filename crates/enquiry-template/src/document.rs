/*
 * document.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! The per-format document interface driven by the orchestrator.

use std::path::Path;

use crate::error::TemplateResult;
use crate::expander::ExpansionSummary;
use crate::store::QueryResultStore;
use crate::substitute::PlaceholderResolver;

/// The "report generated at" note placed in the page footer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FooterStamp {
    pub caption: String,
    pub timestamp: String,
    pub font: String,
    /// Font size in points.
    pub size: u32,
}

impl FooterStamp {
    pub fn new(caption: impl Into<String>, timestamp: impl Into<String>) -> Self {
        Self {
            caption: caption.into(),
            timestamp: timestamp.into(),
            font: "Times New Roman".to_string(),
            size: 9,
        }
    }

    pub fn with_font(mut self, font: impl Into<String>, size: u32) -> Self {
        self.font = font.into();
        self.size = size;
        self
    }

    /// Caption and timestamp on two lines.
    pub fn text(&self) -> String {
        format!("{}\n{}", self.caption, self.timestamp)
    }
}

/// A template document of one output format.
///
/// Generation calls these in order: [`load`](Self::load),
/// [`replace_single_placeholders`](Self::replace_single_placeholders),
/// [`expand_blocks`](Self::expand_blocks), [`add_footer`](Self::add_footer),
/// [`save`](Self::save).
pub trait ReportDocument: Sized {
    /// Output file extension, without the dot.
    const EXTENSION: &'static str;

    fn load(path: &Path) -> TemplateResult<Self>;

    fn replace_single_placeholders(
        &mut self,
        resolver: &mut PlaceholderResolver<'_>,
    ) -> TemplateResult<()>;

    fn expand_blocks(&mut self, store: &QueryResultStore) -> TemplateResult<ExpansionSummary>;

    fn add_footer(&mut self, stamp: &FooterStamp) -> TemplateResult<()>;

    fn save(&self, path: &Path) -> TemplateResult<()>;
}
