/*
 * worksheet.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Worksheet part model
 */

//! Worksheet part model.
//!
//! `sheetData` and `mergeCells` are lifted out of the part into row and merge
//! structures that support insertion and deletion. Everything else in the
//! part stays in the XML tree untouched. Cells that are never rewritten keep
//! their original element, so their formulas, types and attributes survive.

use std::collections::BTreeMap;
use std::str::FromStr;

use enquiry_template::{CellValue, FooterStamp, MergeRange};
use rust_decimal::Decimal;

use super::cell_ref::{cell_ref, parse_cell_ref, parse_range, range_ref};
use super::header_footer::HeaderFooterText;
use super::shared_strings::{SharedStrings, item_text};
use crate::error::{OoxmlError, OoxmlResult};
use crate::xml::{XmlDocument, XmlElement, XmlNode};

const WORKSHEET_ORDER: &[&str] = &[
    "sheetPr",
    "dimension",
    "sheetViews",
    "sheetFormatPr",
    "cols",
    "sheetData",
    "sheetCalcPr",
    "sheetProtection",
    "protectedRanges",
    "scenarios",
    "autoFilter",
    "sortState",
    "dataConsolidate",
    "customSheetViews",
    "mergeCells",
    "phoneticPr",
    "conditionalFormatting",
    "dataValidations",
    "hyperlinks",
    "printOptions",
    "pageMargins",
    "pageSetup",
    "headerFooter",
    "rowBreaks",
    "colBreaks",
    "customProperties",
    "cellWatches",
    "ignoredErrors",
    "smartTags",
    "drawing",
    "legacyDrawing",
    "legacyDrawingHF",
    "drawingHF",
    "picture",
    "oleObjects",
    "controls",
    "webPublishItems",
    "tableParts",
    "extLst",
];

const HEADER_FOOTER_ORDER: &[&str] = &[
    "oddHeader",
    "oddFooter",
    "evenHeader",
    "evenFooter",
    "firstHeader",
    "firstFooter",
];

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct SheetCell {
    pub style: u32,
    pub value: CellValue,
    /// The element the cell was loaded from, while the value is unchanged.
    source: Option<XmlElement>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct SheetRow {
    /// Row attributes other than `r`.
    attributes: Vec<(String, String)>,
    cells: BTreeMap<u32, SheetCell>,
}

impl SheetRow {
    fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    fn set_attr(&mut self, name: &str, value: String) {
        match self.attributes.iter_mut().find(|(key, _)| key == name) {
            Some((_, existing)) => *existing = value,
            None => self.attributes.push((name.to_string(), value)),
        }
    }

    fn remove_attr(&mut self, name: &str) {
        self.attributes.retain(|(key, _)| key != name);
    }

    /// Style applied to cells of this row that have none of their own.
    fn default_style(&self) -> u32 {
        if self.attr("customFormat") == Some("1") {
            self.attr("s").and_then(|s| s.parse().ok()).unwrap_or(0)
        } else {
            0
        }
    }
}

/// One worksheet of a workbook.
#[derive(Debug, Clone)]
pub struct Worksheet {
    part: String,
    document: XmlDocument,
    rows: BTreeMap<u32, SheetRow>,
    merges: Vec<MergeRange>,
    max_column: u32,
}

impl Worksheet {
    pub fn parse(part: &str, mut document: XmlDocument, shared: &SharedStrings) -> OoxmlResult<Self> {
        let sheet_data = document
            .root
            .child_mut("sheetData")
            .ok_or_else(|| OoxmlError::invalid(part, "worksheet has no sheetData"))?;
        let row_elements = std::mem::take(&mut sheet_data.children);

        let mut rows = BTreeMap::new();
        let mut max_column = 0;
        let mut previous_row = 0;
        for node in row_elements {
            let XmlNode::Element(row_element) = node else {
                continue;
            };
            if row_element.name != "row" {
                continue;
            }
            let index = row_element
                .attr("r")
                .and_then(|r| r.parse().ok())
                .unwrap_or(previous_row + 1);
            previous_row = index;

            let mut row = SheetRow {
                attributes: row_element
                    .attributes
                    .iter()
                    .filter(|(key, _)| key != "r")
                    .cloned()
                    .collect(),
                cells: BTreeMap::new(),
            };
            let mut previous_column = 0;
            for cell in row_element.children_named("c") {
                let column = cell
                    .attr("r")
                    .and_then(parse_cell_ref)
                    .map_or(previous_column + 1, |(_, column)| column);
                previous_column = column;
                max_column = max_column.max(column);
                row.cells.insert(
                    column,
                    SheetCell {
                        style: cell.attr("s").and_then(|s| s.parse().ok()).unwrap_or(0),
                        value: cell_value(cell, shared),
                        source: Some(cell.clone()),
                    },
                );
            }
            rows.insert(index, row);
        }

        let merges = document
            .root
            .child("mergeCells")
            .map(|m| {
                m.children_named("mergeCell")
                    .filter_map(|c| c.attr("ref").and_then(parse_range))
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            part: part.to_string(),
            document,
            rows,
            merges,
            max_column,
        })
    }

    pub fn part(&self) -> &str {
        &self.part
    }

    pub fn row_count(&self) -> u32 {
        self.rows.keys().next_back().copied().unwrap_or(0)
    }

    pub fn column_count(&self) -> u32 {
        self.max_column
    }

    pub fn value(&self, row: u32, column: u32) -> CellValue {
        self.cell(row, column)
            .map(|c| c.value.clone())
            .unwrap_or_default()
    }

    pub fn set_value(&mut self, row: u32, column: u32, value: CellValue) {
        if self.cell(row, column).is_none() && value.is_empty() {
            return;
        }
        let cell = self.cell_mut(row, column);
        if cell.value != value {
            cell.value = value;
            cell.source = None;
        }
    }

    /// Index of the `cellXfs` entry in effect for a cell.
    pub fn style_index(&self, row: u32, column: u32) -> u32 {
        match self.cell(row, column) {
            Some(cell) => cell.style,
            None => self.rows.get(&row).map_or(0, SheetRow::default_style),
        }
    }

    pub fn set_style_index(&mut self, row: u32, column: u32, style: u32) {
        if self.cell(row, column).is_none() && style == self.style_index(row, column) {
            return;
        }
        self.cell_mut(row, column).style = style;
    }

    pub fn row_height(&self, row: u32) -> Option<f64> {
        self.rows.get(&row)?.attr("ht")?.parse().ok()
    }

    pub fn set_row_height(&mut self, row: u32, height: Option<f64>) {
        match height {
            Some(height) => {
                let entry = self.rows.entry(row).or_default();
                entry.set_attr("ht", height.to_string());
                entry.set_attr("customHeight", "1".to_string());
            }
            None => {
                if let Some(entry) = self.rows.get_mut(&row) {
                    entry.remove_attr("ht");
                    entry.remove_attr("customHeight");
                }
            }
        }
    }

    /// Insert `copies` copies of `row` directly below it.
    pub fn clone_row(&mut self, row: u32, copies: u32) {
        let template = self.rows.get(&row).cloned().unwrap_or_default();
        let below = self.rows.split_off(&(row + 1));
        for i in 1..=copies {
            self.rows.insert(row + i, template.clone());
        }
        for (index, data) in below {
            self.rows.insert(index + copies, data);
        }
    }

    pub fn delete_row(&mut self, row: u32) {
        self.rows.remove(&row);
        let below = self.rows.split_off(&(row + 1));
        for (index, data) in below {
            self.rows.insert(index - 1, data);
        }
    }

    pub fn merges(&self) -> &[MergeRange] {
        &self.merges
    }

    pub fn set_merges(&mut self, merges: Vec<MergeRange>) {
        self.merges = merges;
    }

    /// Every string cell, for the single-placeholder pass.
    pub fn text_cells(&self) -> Vec<(u32, u32)> {
        self.rows
            .iter()
            .flat_map(|(row, data)| {
                data.cells
                    .iter()
                    .filter(|(_, cell)| matches!(cell.value, CellValue::Text(_)))
                    .map(move |(column, _)| (*row, *column))
            })
            .collect()
    }

    /// Current text of the odd-page footer.
    pub fn odd_footer(&self) -> Option<String> {
        self.document
            .root
            .child("headerFooter")?
            .child("oddFooter")
            .map(XmlElement::text)
    }

    /// Write the stamp into the right section of the odd-page footer.
    pub fn stamp_footer(&mut self, stamp: &FooterStamp) {
        let mut text = HeaderFooterText::parse(&self.odd_footer().unwrap_or_default());
        text.stamp_right(stamp);
        let footer = self
            .document
            .root
            .child_or_insert_ordered("headerFooter", WORKSHEET_ORDER)
            .child_or_insert_ordered("oddFooter", HEADER_FOOTER_ORDER);
        footer.set_text(text.to_string());
    }

    /// The part as it should be written.
    pub fn to_document(&self) -> XmlDocument {
        let mut document = self.document.clone();
        let root = &mut document.root;

        if let Some(sheet_data) = root.child_mut("sheetData") {
            sheet_data.children = self
                .rows
                .iter()
                .map(|(index, row)| XmlNode::Element(row_element(*index, row)))
                .collect();
        }

        if self.merges.is_empty() {
            root.remove_children("mergeCells");
        } else {
            let merge_cells = root.child_or_insert_ordered("mergeCells", WORKSHEET_ORDER);
            merge_cells.children = self
                .merges
                .iter()
                .map(|m| XmlNode::Element(XmlElement::new("mergeCell").with_attr("ref", range_ref(m))))
                .collect();
            merge_cells.set_attr("count", self.merges.len().to_string());
        }

        if let Some(dimension) = root.child_mut("dimension") {
            dimension.set_attr("ref", self.dimension());
        }

        document
    }

    fn dimension(&self) -> String {
        let mut bounds: Option<(u32, u32, u32, u32)> = None;
        for (row, data) in &self.rows {
            for column in data.cells.keys() {
                bounds = Some(match bounds {
                    None => (*row, *row, *column, *column),
                    Some((r0, r1, c0, c1)) => (r0.min(*row), r1.max(*row), c0.min(*column), c1.max(*column)),
                });
            }
        }
        match bounds {
            Some((r0, r1, c0, c1)) if (r0, c0) != (r1, c1) => {
                format!("{}:{}", cell_ref(r0, c0), cell_ref(r1, c1))
            }
            Some((r0, _, c0, _)) => cell_ref(r0, c0),
            None => "A1".to_string(),
        }
    }

    fn cell(&self, row: u32, column: u32) -> Option<&SheetCell> {
        self.rows.get(&row)?.cells.get(&column)
    }

    fn cell_mut(&mut self, row: u32, column: u32) -> &mut SheetCell {
        self.max_column = self.max_column.max(column);
        let data = self.rows.entry(row).or_default();
        let default_style = data.default_style();
        data.cells.entry(column).or_insert_with(|| SheetCell {
            style: default_style,
            ..SheetCell::default()
        })
    }
}

fn cell_value(cell: &XmlElement, shared: &SharedStrings) -> CellValue {
    if let Some(formula) = cell.child("f").map(XmlElement::text).filter(|f| !f.is_empty()) {
        return CellValue::Formula(formula);
    }
    let raw = cell.child("v").map(XmlElement::text);
    match cell.attr("t").unwrap_or("n") {
        "s" => raw
            .and_then(|v| v.trim().parse::<usize>().ok())
            .and_then(|i| shared.get(i))
            .map(|s| CellValue::Text(s.to_string()))
            .unwrap_or_default(),
        "inlineStr" => cell
            .child("is")
            .map(|is| CellValue::Text(item_text(is)))
            .unwrap_or_default(),
        "str" | "e" => raw.map(CellValue::Text).unwrap_or_default(),
        "b" => raw
            .map(|v| CellValue::Bool(v.trim() == "1"))
            .unwrap_or_default(),
        _ => raw
            .and_then(|v| {
                let v = v.trim();
                Decimal::from_str(v)
                    .or_else(|_| Decimal::from_scientific(v))
                    .ok()
            })
            .map(CellValue::Number)
            .unwrap_or_default(),
    }
}

fn row_element(index: u32, row: &SheetRow) -> XmlElement {
    let mut element = XmlElement::new("row").with_attr("r", index.to_string());
    element.attributes.extend(row.attributes.iter().cloned());
    for (column, cell) in &row.cells {
        element
            .children
            .push(XmlNode::Element(cell_element(index, *column, cell)));
    }
    element
}

fn cell_element(row: u32, column: u32, cell: &SheetCell) -> XmlElement {
    let reference = cell_ref(row, column);
    let mut element = match &cell.source {
        Some(source) => {
            let mut element = source.clone();
            element.set_attr("r", reference);
            element
        }
        None => new_cell_element(reference, &cell.value),
    };
    if cell.style == 0 {
        element.remove_attr("s");
    } else {
        element.set_attr("s", cell.style.to_string());
    }
    element
}

fn new_cell_element(reference: String, value: &CellValue) -> XmlElement {
    let element = XmlElement::new("c").with_attr("r", reference);
    match value {
        CellValue::Empty => element,
        CellValue::Text(text) => element.with_attr("t", "inlineStr").with_child(
            XmlElement::new("is").with_child(
                XmlElement::new("t")
                    .with_attr("xml:space", "preserve")
                    .with_text(text.as_str()),
            ),
        ),
        CellValue::Number(n) => element.with_child(XmlElement::new("v").with_text(n.to_string())),
        CellValue::Bool(b) => element
            .with_attr("t", "b")
            .with_child(XmlElement::new("v").with_text(if *b { "1" } else { "0" })),
        CellValue::Formula(formula) => {
            element.with_child(XmlElement::new("f").with_text(formula.as_str()))
        }
    }
}
