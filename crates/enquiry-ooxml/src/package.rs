/*
 * package.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! OOXML packages: the ZIP container holding a document's parts.
//!
//! Entries are written back in their original order, with their original
//! compression and timestamps. Parts that were never replaced are copied
//! byte for byte.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipArchive, ZipWriter};

use crate::error::{OoxmlError, OoxmlResult};
use crate::xml::{XmlDocument, XmlElement, XmlNode};

const CONTENT_TYPES: &str = "[Content_Types].xml";

/// Upper bound on the buffer reserved from an entry's declared size.
const MAX_CAPACITY_HINT: u64 = 1 << 20;

#[derive(Debug, Clone)]
struct PackageEntry {
    name: String,
    data: Vec<u8>,
    compression: CompressionMethod,
    last_modified: Option<DateTime>,
    is_dir: bool,
}

/// An OOXML package held in memory.
#[derive(Debug, Clone)]
pub struct OoxmlPackage {
    entries: Vec<PackageEntry>,
}

impl OoxmlPackage {
    pub fn open(path: &Path) -> OoxmlResult<Self> {
        let file = File::open(path).map_err(|source| OoxmlError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read + std::io::Seek>(reader: R) -> OoxmlResult<Self> {
        let mut archive = ZipArchive::new(reader)?;
        let mut entries = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            let capacity = file.size().min(MAX_CAPACITY_HINT) as usize;
            let mut data = Vec::with_capacity(capacity);
            file.read_to_end(&mut data)
                .map_err(|source| OoxmlError::Entry {
                    name: file.name().to_string(),
                    source,
                })?;
            entries.push(PackageEntry {
                name: file.name().to_string(),
                data,
                compression: file.compression(),
                last_modified: file.last_modified(),
                is_dir: file.is_dir(),
            });
        }
        Ok(Self { entries })
    }

    pub fn has_part(&self, name: &str) -> bool {
        self.entry(name).is_some()
    }

    pub fn part(&self, name: &str) -> Option<&[u8]> {
        self.entry(name).map(|e| e.data.as_slice())
    }

    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(|e| !e.is_dir)
            .map(|e| e.name.as_str())
    }

    /// Parse a part as XML.
    pub fn xml_part(&self, name: &str) -> OoxmlResult<XmlDocument> {
        let data = self
            .part(name)
            .ok_or_else(|| OoxmlError::MissingPart(name.to_string()))?;
        XmlDocument::parse_bytes(data, name)
    }

    /// Replace a part, or add it at the end of the package.
    pub fn set_part(&mut self, name: &str, data: Vec<u8>) {
        match self.entries.iter_mut().find(|e| e.name == name) {
            Some(entry) => entry.data = data,
            None => self.entries.push(PackageEntry {
                name: name.to_string(),
                data,
                compression: CompressionMethod::Deflated,
                last_modified: None,
                is_dir: false,
            }),
        }
    }

    pub fn remove_part(&mut self, name: &str) {
        self.entries.retain(|e| e.name != name);
    }

    pub fn set_xml_part(&mut self, name: &str, document: &XmlDocument) -> OoxmlResult<()> {
        let data = document.to_bytes()?;
        self.set_part(name, data);
        Ok(())
    }

    /// Register `part_name` (an absolute name such as `/word/footer1.xml`)
    /// with `content_type` in the content types part.
    pub fn add_content_type_override(
        &mut self,
        part_name: &str,
        content_type: &str,
    ) -> OoxmlResult<()> {
        let mut types = self.xml_part(CONTENT_TYPES)?;
        let exists = types
            .root
            .children_named("Override")
            .any(|o| o.attr("PartName") == Some(part_name));
        if !exists {
            types.root.children.push(XmlNode::Element(
                XmlElement::new("Override")
                    .with_attr("PartName", part_name)
                    .with_attr("ContentType", content_type),
            ));
            self.set_xml_part(CONTENT_TYPES, &types)?;
        }
        Ok(())
    }

    pub fn remove_content_type_override(&mut self, part_name: &str) -> OoxmlResult<()> {
        let mut types = self.xml_part(CONTENT_TYPES)?;
        let before = types.root.children.len();
        types.root.children.retain(|node| {
            !matches!(node, XmlNode::Element(e)
                if e.name == "Override" && e.attr("PartName") == Some(part_name))
        });
        if types.root.children.len() != before {
            self.set_xml_part(CONTENT_TYPES, &types)?;
        }
        Ok(())
    }

    pub fn save(&self, path: &Path) -> OoxmlResult<()> {
        let file = File::create(path)?;
        self.write_to(file)?;
        Ok(())
    }

    pub fn write_to<W: Write + std::io::Seek>(&self, writer: W) -> OoxmlResult<W> {
        let mut zip = ZipWriter::new(writer);
        for entry in &self.entries {
            let mut options =
                SimpleFileOptions::default().compression_method(entry.compression);
            if let Some(modified) = entry.last_modified {
                options = options.last_modified_time(modified);
            }
            if entry.is_dir {
                zip.add_directory(entry.name.as_str(), options)?;
            } else {
                zip.start_file(entry.name.as_str(), options)?;
                zip.write_all(&entry.data)?;
            }
        }
        Ok(zip.finish()?)
    }

    fn entry(&self, name: &str) -> Option<&PackageEntry> {
        self.entries.iter().find(|e| e.name == name)
    }
}

/// Resolve a relationship target against the folder of the source part.
///
/// `resolve_target("xl/workbook.xml", "worksheets/sheet1.xml")` is
/// `xl/worksheets/sheet1.xml`; absolute targets start at the package root.
pub fn resolve_target(source_part: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }
    let mut segments: Vec<&str> = source_part.split('/').collect();
    segments.pop();
    for segment in target.split('/') {
        match segment {
            ".." => {
                segments.pop();
            }
            "." | "" => {}
            other => segments.push(other),
        }
    }
    segments.join("/")
}

/// The relationships part belonging to `part`.
pub fn rels_part_for(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((folder, file)) => format!("{folder}/_rels/{file}.rels"),
        None => format!("_rels/{part}.rels"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_target() {
        assert_eq!(
            resolve_target("xl/workbook.xml", "worksheets/sheet1.xml"),
            "xl/worksheets/sheet1.xml"
        );
        assert_eq!(
            resolve_target("xl/worksheets/sheet1.xml", "../sharedStrings.xml"),
            "xl/sharedStrings.xml"
        );
        assert_eq!(
            resolve_target("word/document.xml", "/word/footer1.xml"),
            "word/footer1.xml"
        );
    }

    #[test]
    fn test_rels_part_for() {
        assert_eq!(rels_part_for("word/document.xml"), "word/_rels/document.xml.rels");
        assert_eq!(rels_part_for("xl/workbook.xml"), "xl/_rels/workbook.xml.rels");
    }

    #[test]
    fn test_round_trip_in_memory() {
        let mut package = OoxmlPackage { entries: Vec::new() };
        package.set_part("a.txt", b"hello".to_vec());
        let buffer = package
            .write_to(std::io::Cursor::new(Vec::new()))
            .unwrap()
            .into_inner();

        let reopened = OoxmlPackage::from_reader(std::io::Cursor::new(buffer)).unwrap();
        assert_eq!(reopened.part("a.txt"), Some(&b"hello"[..]));
        assert_eq!(reopened.part_names().collect::<Vec<_>>(), vec!["a.txt"]);
    }
}
