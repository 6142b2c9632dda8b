/*
 * workbook.rs
 * Copyright (c) 2025 Posit, PBC
 */

use std::path::Path;

use enquiry_template::{
    ExpansionSummary, FooterStamp, PlaceholderResolver, QueryResultStore, ReportDocument,
    TemplateResult, expand_sheet, substitute_sheet,
};
use tracing::debug;

use super::shared_strings::SharedStrings;
use super::worksheet::Worksheet;
use crate::error::{OoxmlError, OoxmlResult};
use crate::package::OoxmlPackage;
use crate::relationships::{self, Relationships};
use crate::xml::XmlElement;

/// A spreadsheet template. Only the active worksheet is processed.
#[derive(Debug, Clone)]
pub struct XlsxWorkbook {
    package: OoxmlPackage,
    workbook_part: String,
    worksheet: Worksheet,
}

impl XlsxWorkbook {
    pub fn from_package(package: OoxmlPackage) -> OoxmlResult<Self> {
        let root_rels = Relationships::load(&package, "")?;
        let office_document = root_rels
            .first_of_kind(relationships::OFFICE_DOCUMENT)
            .ok_or_else(|| OoxmlError::MissingPart("xl/workbook.xml".to_string()))?;
        let workbook_part = root_rels.target_part(&office_document);
        let workbook = package.xml_part(&workbook_part)?;
        let workbook_rels = Relationships::load(&package, &workbook_part)?;

        let shared = match workbook_rels.first_of_kind(relationships::SHARED_STRINGS) {
            Some(rel) => {
                SharedStrings::from_document(&package.xml_part(&workbook_rels.target_part(&rel))?)
            }
            None => SharedStrings::default(),
        };

        let sheet_id = active_sheet_relationship(&workbook.root)
            .ok_or_else(|| OoxmlError::invalid(&workbook_part, "workbook has no sheets"))?;
        let sheet_rel = workbook_rels.by_id(&sheet_id).ok_or_else(|| {
            OoxmlError::invalid(&workbook_part, format!("unknown sheet relationship {sheet_id}"))
        })?;
        let sheet_part = workbook_rels.target_part(&sheet_rel);
        debug!(sheet = %sheet_part, shared_strings = shared.len(), "Loading active worksheet");
        let worksheet = Worksheet::parse(&sheet_part, package.xml_part(&sheet_part)?, &shared)?;

        Ok(Self {
            package,
            workbook_part,
            worksheet,
        })
    }

    pub fn worksheet(&self) -> &Worksheet {
        &self.worksheet
    }

    pub fn worksheet_mut(&mut self) -> &mut Worksheet {
        &mut self.worksheet
    }

    /// The package with the worksheet written back into it.
    pub fn to_package(&self) -> OoxmlResult<OoxmlPackage> {
        let mut package = self.package.clone();
        package.set_xml_part(self.worksheet.part(), &self.worksheet.to_document())?;
        drop_calc_chain(&mut package, &self.workbook_part)?;
        Ok(package)
    }
}

impl ReportDocument for XlsxWorkbook {
    const EXTENSION: &'static str = "xlsx";

    fn load(path: &Path) -> TemplateResult<Self> {
        OoxmlPackage::open(path)
            .and_then(Self::from_package)
            .map_err(|e| e.into_load_error(path))
    }

    fn replace_single_placeholders(
        &mut self,
        resolver: &mut PlaceholderResolver<'_>,
    ) -> TemplateResult<()> {
        let changed = substitute_sheet(&mut self.worksheet, resolver)?;
        debug!(cells = changed, "Replaced single placeholders");
        Ok(())
    }

    fn expand_blocks(&mut self, store: &QueryResultStore) -> TemplateResult<ExpansionSummary> {
        expand_sheet(&mut self.worksheet, store)
    }

    fn add_footer(&mut self, stamp: &FooterStamp) -> TemplateResult<()> {
        self.worksheet.stamp_footer(stamp);
        Ok(())
    }

    fn save(&self, path: &Path) -> TemplateResult<()> {
        self.to_package()
            .and_then(|package| package.save(path))
            .map_err(|e| e.into_save_error(path))
    }
}

/// Relationship id of the sheet shown when the workbook opens.
fn active_sheet_relationship(workbook: &XmlElement) -> Option<String> {
    let active: usize = workbook
        .child("bookViews")
        .and_then(|views| views.child("workbookView"))
        .and_then(|view| view.attr("activeTab"))
        .and_then(|tab| tab.parse().ok())
        .unwrap_or(0);
    let sheets: Vec<&XmlElement> = workbook.child("sheets")?.children_named("sheet").collect();
    let sheet = sheets.get(active).or_else(|| sheets.first())?;
    sheet
        .attributes
        .iter()
        .find(|(key, _)| key.ends_with(":id"))
        .map(|(_, value)| value.clone())
}

/// Rows moved, so cached calculation order no longer matches the cells.
fn drop_calc_chain(package: &mut OoxmlPackage, workbook_part: &str) -> OoxmlResult<()> {
    let mut rels = Relationships::load(package, workbook_part)?;
    let removed = rels.remove_kind(relationships::CALC_CHAIN);
    if removed.is_empty() {
        return Ok(());
    }
    for rel in &removed {
        let part = rels.target_part(rel);
        package.remove_part(&part);
        package.remove_content_type_override(&format!("/{part}"))?;
    }
    rels.save_into(package)
}
