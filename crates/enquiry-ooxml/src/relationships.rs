/*
 * relationships.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Relationship parts (`_rels/*.rels`) linking a part to its targets.

use crate::error::OoxmlResult;
use crate::package::{OoxmlPackage, rels_part_for, resolve_target};
use crate::xml::{XmlDocument, XmlElement, XmlNode};

const RELATIONSHIPS_NAMESPACE: &str =
    "http://schemas.openxmlformats.org/package/2006/relationships";

pub const OFFICE_DOCUMENT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
pub const WORKSHEET: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet";
pub const SHARED_STRINGS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings";
pub const CALC_CHAIN: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/calcChain";
pub const FOOTER: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/footer";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub id: String,
    pub kind: String,
    pub target: String,
    pub external: bool,
}

/// The relationships of one source part.
#[derive(Debug, Clone)]
pub struct Relationships {
    source_part: String,
    document: XmlDocument,
}

impl Relationships {
    /// Relationships of `source_part`; empty when the package has none.
    pub fn load(package: &OoxmlPackage, source_part: &str) -> OoxmlResult<Self> {
        let rels_part = rels_part_for(source_part);
        let document = if package.has_part(&rels_part) {
            package.xml_part(&rels_part)?
        } else {
            XmlDocument::new(
                XmlElement::new("Relationships").with_attr("xmlns", RELATIONSHIPS_NAMESPACE),
            )
        };
        Ok(Self {
            source_part: source_part.to_string(),
            document,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = Relationship> + '_ {
        self.document
            .root
            .children_named("Relationship")
            .map(|r| Relationship {
                id: r.attr("Id").unwrap_or_default().to_string(),
                kind: r.attr("Type").unwrap_or_default().to_string(),
                target: r.attr("Target").unwrap_or_default().to_string(),
                external: r.attr("TargetMode") == Some("External"),
            })
    }

    pub fn by_id(&self, id: &str) -> Option<Relationship> {
        self.iter().find(|r| r.id == id)
    }

    pub fn first_of_kind(&self, kind: &str) -> Option<Relationship> {
        self.iter().find(|r| r.kind == kind)
    }

    /// Package part name a relationship points at.
    pub fn target_part(&self, relationship: &Relationship) -> String {
        resolve_target(&self.source_part, &relationship.target)
    }

    /// Add a relationship and return its new id.
    pub fn add(&mut self, kind: &str, target: &str) -> String {
        let mut n = self.document.root.children_named("Relationship").count() + 1;
        let id = loop {
            let candidate = format!("rId{n}");
            if self.by_id(&candidate).is_none() {
                break candidate;
            }
            n += 1;
        };
        self.document.root.children.push(XmlNode::Element(
            XmlElement::new("Relationship")
                .with_attr("Id", id.as_str())
                .with_attr("Type", kind)
                .with_attr("Target", target),
        ));
        id
    }

    /// Remove every relationship of `kind`, returning the removed ones.
    pub fn remove_kind(&mut self, kind: &str) -> Vec<Relationship> {
        let removed: Vec<Relationship> = self.iter().filter(|r| r.kind == kind).collect();
        self.document.root.children.retain(|node| {
            !matches!(node, XmlNode::Element(e) if e.attr("Type") == Some(kind))
        });
        removed
    }

    pub fn save_into(&self, package: &mut OoxmlPackage) -> OoxmlResult<()> {
        package.set_xml_part(&rels_part_for(&self.source_part), &self.document)
    }
}
