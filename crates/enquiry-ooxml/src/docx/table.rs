/*
 * table.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! A `w:tbl` as a template grid.

use enquiry_template::{
    CellValue, MergeRange, TemplateError, TemplateResult, TemplateSheet, ValueStyle,
};

use super::paragraph::{
    first_run_properties, paragraph_text, set_leading_child, set_paragraph_text,
    set_run_properties,
};
use crate::xml::{XmlElement, XmlNode};

const ROW_ORDER: &[&str] = &["w:tblPrEx", "w:trPr", "w:tc"];

/// Twentieths of a point.
const TWIPS_PER_POINT: f64 = 20.0;

/// Formatting carried over when a row is repeated.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DocxCellStyle {
    pub cell_properties: Option<XmlElement>,
    pub paragraph_properties: Option<XmlElement>,
    pub run_properties: Option<XmlElement>,
}

/// A body table borrowed from the document tree.
#[derive(Debug)]
pub struct DocxTable<'a> {
    table: &'a mut XmlElement,
}

impl<'a> DocxTable<'a> {
    pub fn new(table: &'a mut XmlElement) -> Self {
        Self { table }
    }

    /// Index in the table's children of the `w:tr` for `row`.
    fn row_position(&self, row: u32) -> Option<usize> {
        let wanted = usize::try_from(row).ok()?.checked_sub(1)?;
        self.table
            .children
            .iter()
            .enumerate()
            .filter(|(_, node)| matches!(node, XmlNode::Element(e) if e.name == "w:tr"))
            .nth(wanted)
            .map(|(i, _)| i)
    }

    fn row(&self, row: u32) -> Option<&XmlElement> {
        match self.table.children.get(self.row_position(row)?)? {
            XmlNode::Element(e) => Some(e),
            _ => None,
        }
    }

    fn row_mut(&mut self, row: u32) -> TemplateResult<&mut XmlElement> {
        let position = self
            .row_position(row)
            .ok_or(TemplateError::RowOutOfRange { row })?;
        match &mut self.table.children[position] {
            XmlNode::Element(e) => Ok(e),
            _ => unreachable!("row position points at an element"),
        }
    }

    fn cell(&self, row: u32, column: u32) -> Option<&XmlElement> {
        self.row(row)?
            .children_named("w:tc")
            .nth(column.checked_sub(1)? as usize)
    }

    fn cell_mut(&mut self, row: u32, column: u32) -> TemplateResult<&mut XmlElement> {
        let index = column.saturating_sub(1) as usize;
        self.row_mut(row)?
            .elements_mut()
            .filter(|e| e.name == "w:tc")
            .nth(index)
            .ok_or(TemplateError::RowOutOfRange { row })
    }
}

fn first_paragraph(cell: &XmlElement) -> Option<&XmlElement> {
    cell.child("w:p")
}

fn first_paragraph_mut(cell: &mut XmlElement) -> &mut XmlElement {
    cell.child_or_insert("w:p")
}

impl TemplateSheet for DocxTable<'_> {
    type Style = DocxCellStyle;

    fn row_count(&self) -> u32 {
        self.table.children_named("w:tr").count() as u32
    }

    fn column_count(&self, row: u32) -> u32 {
        self.row(row)
            .map_or(0, |r| r.children_named("w:tc").count() as u32)
    }

    fn cell_value(&self, row: u32, column: u32) -> CellValue {
        let text = self
            .cell(row, column)
            .and_then(first_paragraph)
            .map(paragraph_text)
            .unwrap_or_default();
        if text.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(text)
        }
    }

    fn set_cell_value(&mut self, row: u32, column: u32, value: CellValue) -> TemplateResult<()> {
        let cell = self.cell_mut(row, column)?;
        set_paragraph_text(first_paragraph_mut(cell), &value.to_string());
        Ok(())
    }

    fn cell_style(&self, row: u32, column: u32) -> DocxCellStyle {
        let Some(cell) = self.cell(row, column) else {
            return DocxCellStyle::default();
        };
        let paragraph = first_paragraph(cell);
        DocxCellStyle {
            cell_properties: cell.child("w:tcPr").cloned(),
            paragraph_properties: paragraph.and_then(|p| p.child("w:pPr").cloned()),
            run_properties: paragraph.and_then(first_run_properties),
        }
    }

    fn set_cell_style(&mut self, row: u32, column: u32, style: &DocxCellStyle) -> TemplateResult<()> {
        let cell = self.cell_mut(row, column)?;
        set_leading_child(cell, "w:tcPr", style.cell_properties.as_ref());
        let paragraph = first_paragraph_mut(cell);
        set_leading_child(paragraph, "w:pPr", style.paragraph_properties.as_ref());
        set_run_properties(paragraph, style.run_properties.as_ref());
        Ok(())
    }

    fn row_height(&self, row: u32) -> Option<f64> {
        let twips: f64 = self
            .row(row)?
            .child("w:trPr")?
            .child("w:trHeight")?
            .attr("w:val")?
            .parse()
            .ok()?;
        Some(twips / TWIPS_PER_POINT)
    }

    fn set_row_height(&mut self, row: u32, height: Option<f64>) -> TemplateResult<()> {
        let tr = self.row_mut(row)?;
        match height {
            Some(points) => {
                let twips = (points * TWIPS_PER_POINT).round() as u32;
                tr.child_or_insert_ordered("w:trPr", ROW_ORDER)
                    .child_or_insert("w:trHeight")
                    .set_attr("w:val", twips.to_string());
            }
            None => {
                if let Some(properties) = tr.child_mut("w:trPr") {
                    properties.remove_children("w:trHeight");
                }
            }
        }
        Ok(())
    }

    fn clone_row(&mut self, row: u32, copies: u32) -> TemplateResult<()> {
        let position = self
            .row_position(row)
            .ok_or(TemplateError::RowOutOfRange { row })?;
        let template = self.table.children[position].clone();
        for offset in 1..=copies as usize {
            self.table.children.insert(position + offset, template.clone());
        }
        Ok(())
    }

    fn delete_row(&mut self, row: u32) -> TemplateResult<()> {
        let position = self
            .row_position(row)
            .ok_or(TemplateError::RowOutOfRange { row })?;
        self.table.children.remove(position);
        Ok(())
    }

    fn merge_ranges(&self) -> Vec<MergeRange> {
        Vec::new()
    }

    fn set_merge_ranges(&mut self, _ranges: Vec<MergeRange>) {}

    fn value_style(&self) -> ValueStyle {
        ValueStyle::FormattedText
    }
}
