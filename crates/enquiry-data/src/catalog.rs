/*
 * catalog.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Enquiry catalog
 */

//! The enquiry catalog: which templates an enquiry has, which queries fill
//! each template, and where those queries run.
//!
//! ```yaml
//! databases:
//!   - id: 1
//!     dbms: postgresql
//!     host: db.internal
//!     port: 5432
//!     name: reports
//!     username: reader
//!     password: secret
//! enquiries:
//!   - id: 12
//!     title: Справка о работах
//!     input_fields:
//!       - field_key: org_name
//!         title: Организация
//!         field_type: text
//!     templates:
//!       - path: templates/works.xlsx
//!         blocks:
//!           - queries:
//!               - id: 7
//!                 title: Работы
//!                 database_id: 1
//!                 code: works
//! ```

use std::path::{Path, PathBuf};

use enquiry_template::QueryId;
use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, CatalogResult};

pub type EnquiryId = u32;
pub type DatabaseId = u32;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub enquiries: Vec<EnquiryDefinition>,
    #[serde(default)]
    pub databases: Vec<DatabaseDescriptor>,
    /// Directory relative template paths are resolved against.
    #[serde(skip)]
    pub base_dir: PathBuf,
}

impl Catalog {
    pub fn load(path: &Path) -> CatalogResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut catalog: Catalog =
            serde_yaml::from_str(&content).map_err(|source| CatalogError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        catalog.base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Ok(catalog)
    }

    pub fn enquiry(&self, id: EnquiryId) -> Option<&EnquiryDefinition> {
        self.enquiries.iter().find(|e| e.id == id)
    }

    pub fn database(&self, id: DatabaseId) -> Option<&DatabaseDescriptor> {
        self.databases.iter().find(|d| d.id == id)
    }

    /// Where the template file lives on disk.
    pub fn template_path(&self, template: &TemplateDefinition) -> PathBuf {
        let path = Path::new(&template.path);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnquiryDefinition {
    pub id: EnquiryId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub templates: Vec<TemplateDefinition>,
    #[serde(default)]
    pub input_fields: Vec<InputFieldDefinition>,
}

impl EnquiryDefinition {
    /// The template to generate `format` from.
    ///
    /// Templates whose path mentions `pdf` are reserved for PDF output: they
    /// are the only candidates when `for_pdf` is set and are skipped
    /// otherwise.
    pub fn select_template(&self, format: &str, for_pdf: bool) -> Option<&TemplateDefinition> {
        self.templates
            .iter()
            .filter(|t| t.extension() == Some(format))
            .find(|t| t.is_pdf_source() == for_pdf)
    }

    /// Distinct template extensions in catalog order.
    pub fn template_formats(&self) -> Vec<String> {
        let mut formats: Vec<String> = Vec::new();
        for extension in self.templates.iter().filter_map(TemplateDefinition::extension) {
            if !formats.iter().any(|f| f == extension) {
                formats.push(extension.to_string());
            }
        }
        formats
    }

    pub fn input_field(&self, field_key: &str) -> Option<&InputFieldDefinition> {
        self.input_fields.iter().find(|f| f.field_key == field_key)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateDefinition {
    pub path: String,
    #[serde(default)]
    pub blocks: Vec<TemplateBlock>,
}

impl TemplateDefinition {
    pub fn extension(&self) -> Option<&str> {
        let file_name = self.path.rsplit(['/', '\\']).next()?;
        file_name.rsplit_once('.').map(|(_, extension)| extension)
    }

    pub fn is_pdf_source(&self) -> bool {
        self.path.contains("pdf")
    }

    pub fn queries(&self) -> impl Iterator<Item = &QueryDefinition> {
        self.blocks.iter().flat_map(|b| b.queries.iter())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemplateBlock {
    #[serde(default)]
    pub queries: Vec<QueryDefinition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryDefinition {
    pub id: QueryId,
    #[serde(default)]
    pub title: String,
    pub database_id: DatabaseId,
    /// Name of the view holding the query's rows.
    #[serde(default)]
    pub code: Option<String>,
}

impl QueryDefinition {
    pub fn view_name(&self) -> String {
        match &self.code {
            Some(code) => code.clone(),
            None => format!("query_{}", self.id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseDescriptor {
    pub id: DatabaseId,
    pub dbms: String,
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub port: Option<u16>,
    pub name: String,
    #[serde(default)]
    pub username: String,
    #[serde(default, skip_serializing)]
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputFieldDefinition {
    pub field_key: String,
    #[serde(default)]
    pub title: String,
    #[serde(default = "default_field_type")]
    pub field_type: String,
}

fn default_field_type() -> String {
    "text".to_string()
}
