/*
 * document.rs
 * Copyright (c) 2025 Posit, PBC
 */

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use enquiry_template::{
    ExpansionSummary, FooterStamp, PlaceholderResolver, QueryResultStore, ReportDocument,
    TemplateError, TemplateResult, expand_sheet,
};
use tracing::debug;

use super::footer::{FOOTER_CONTENT_TYPE, RELATIONSHIP_NAMESPACE, empty_footer, stamp_paragraph};
use super::paragraph::{paragraph_text, set_paragraph_text};
use super::table::DocxTable;
use crate::error::{OoxmlError, OoxmlResult};
use crate::package::OoxmlPackage;
use crate::relationships::{self, Relationships};
use crate::xml::{XmlDocument, XmlElement, XmlNode};

/// A word-processing template.
#[derive(Debug, Clone)]
pub struct DocxDocument {
    source: PathBuf,
    package: OoxmlPackage,
    document_part: String,
    document: XmlDocument,
}

impl DocxDocument {
    pub fn from_package(package: OoxmlPackage, source: impl Into<PathBuf>) -> OoxmlResult<Self> {
        let root_rels = Relationships::load(&package, "")?;
        let office_document = root_rels
            .first_of_kind(relationships::OFFICE_DOCUMENT)
            .ok_or_else(|| OoxmlError::MissingPart("word/document.xml".to_string()))?;
        let document_part = root_rels.target_part(&office_document);
        let document = package.xml_part(&document_part)?;
        if document.root.child("w:body").is_none() {
            return Err(OoxmlError::invalid(&document_part, "document has no body"));
        }
        Ok(Self {
            source: source.into(),
            package,
            document_part,
            document,
        })
    }

    pub fn body(&self) -> Option<&XmlElement> {
        self.document.root.child("w:body")
    }

    /// The package with the main document part written back into it.
    pub fn to_package(&self) -> OoxmlResult<OoxmlPackage> {
        let mut package = self.package.clone();
        package.set_xml_part(&self.document_part, &self.document)?;
        Ok(package)
    }

    fn stamp_footers(&mut self, stamp: &FooterStamp) -> OoxmlResult<usize> {
        let Self {
            package,
            document_part,
            document,
            ..
        } = self;
        let mut rels = Relationships::load(package, document_part.as_str())?;
        let mut rels_changed = false;
        let mut stamped = BTreeSet::new();

        if document.root.attr("xmlns:r").is_none() {
            document.root.set_attr("xmlns:r", RELATIONSHIP_NAMESPACE);
        }
        let body = document
            .root
            .child_mut("w:body")
            .ok_or_else(|| OoxmlError::invalid(document_part.as_str(), "document has no body"))?;
        if body.find("w:sectPr").is_none() {
            body.children
                .push(XmlNode::Element(XmlElement::new("w:sectPr")));
        }

        visit_sections(body, &mut |section: &mut XmlElement| -> OoxmlResult<()> {
            let existing = default_footer_id(section)
                .and_then(|id| rels.by_id(&id))
                .map(|rel| rels.target_part(&rel));
            let part = match existing {
                Some(part) => part,
                None => {
                    let (part, target) = unused_footer_name(package);
                    package.set_xml_part(&part, &empty_footer())?;
                    package.add_content_type_override(&format!("/{part}"), FOOTER_CONTENT_TYPE)?;
                    let id = rels.add(relationships::FOOTER, &target);
                    rels_changed = true;
                    insert_footer_reference(section, &id);
                    part
                }
            };
            if stamped.insert(part.clone()) {
                let mut footer = package.xml_part(&part)?;
                footer
                    .root
                    .children
                    .insert(0, XmlNode::Element(stamp_paragraph(stamp)));
                package.set_xml_part(&part, &footer)?;
            }
            Ok(())
        })?;

        if rels_changed {
            rels.save_into(package)?;
        }
        Ok(stamped.len())
    }
}

impl ReportDocument for DocxDocument {
    const EXTENSION: &'static str = "docx";

    fn load(path: &Path) -> TemplateResult<Self> {
        OoxmlPackage::open(path)
            .and_then(|package| Self::from_package(package, path))
            .map_err(|e| e.into_load_error(path))
    }

    fn replace_single_placeholders(
        &mut self,
        resolver: &mut PlaceholderResolver<'_>,
    ) -> TemplateResult<()> {
        let changed = substitute_paragraphs(&mut self.document.root, resolver);
        debug!(paragraphs = changed, "Replaced single placeholders");
        Ok(())
    }

    fn expand_blocks(&mut self, store: &QueryResultStore) -> TemplateResult<ExpansionSummary> {
        let mut summary = ExpansionSummary::default();
        let Some(body) = self.document.root.child_mut("w:body") else {
            return Ok(summary);
        };
        for table in body.elements_mut().filter(|e| e.name == "w:tbl") {
            summary.absorb(expand_sheet(&mut DocxTable::new(table), store)?);
        }
        Ok(summary)
    }

    fn add_footer(&mut self, stamp: &FooterStamp) -> TemplateResult<()> {
        let footers = self
            .stamp_footers(stamp)
            .map_err(|e| TemplateError::malformed(&self.source, e))?;
        debug!(footers, "Stamped footers");
        Ok(())
    }

    fn save(&self, path: &Path) -> TemplateResult<()> {
        self.to_package()
            .and_then(|package| package.save(path))
            .map_err(|e| e.into_save_error(path))
    }
}

/// Run the single-placeholder pass over every paragraph below `element`.
fn substitute_paragraphs(element: &mut XmlElement, resolver: &mut PlaceholderResolver<'_>) -> usize {
    let mut changed = 0;
    for child in element.elements_mut() {
        if child.name == "w:p" {
            if let Some(updated) = resolver.substitute(&paragraph_text(child)) {
                set_paragraph_text(child, &updated);
                changed += 1;
            }
        } else {
            changed += substitute_paragraphs(child, resolver);
        }
    }
    changed
}

fn visit_sections(
    element: &mut XmlElement,
    visit: &mut dyn FnMut(&mut XmlElement) -> OoxmlResult<()>,
) -> OoxmlResult<()> {
    for child in element.elements_mut() {
        if child.name == "w:sectPr" {
            visit(child)?;
        } else {
            visit_sections(child, visit)?;
        }
    }
    Ok(())
}

fn default_footer_id(section: &XmlElement) -> Option<String> {
    section
        .children_named("w:footerReference")
        .find(|r| r.attr("w:type").is_none_or(|t| t == "default"))
        .and_then(|r| r.attr("r:id"))
        .map(str::to_string)
}

/// Header and footer references lead the section properties.
fn insert_footer_reference(section: &mut XmlElement, id: &str) {
    let position = section
        .children
        .iter()
        .position(|node| {
            !matches!(node, XmlNode::Element(e)
                if e.name == "w:headerReference" || e.name == "w:footerReference")
        })
        .unwrap_or(section.children.len());
    section.children.insert(
        position,
        XmlNode::Element(
            XmlElement::new("w:footerReference")
                .with_attr("w:type", "default")
                .with_attr("r:id", id),
        ),
    );
}

/// Part name and relationship target of the first free `footerN.xml`.
fn unused_footer_name(package: &OoxmlPackage) -> (String, String) {
    (1..)
        .map(|n| (format!("word/footer{n}.xml"), format!("footer{n}.xml")))
        .find(|(part, _)| !package.has_part(part))
        .unwrap_or_else(|| unreachable!("footer numbering is unbounded"))
}
