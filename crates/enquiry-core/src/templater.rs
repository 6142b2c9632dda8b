/*
 * templater.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Report generation.
//!
//! [`Templater::generate`] runs one request end to end:
//!
//! 1. pick the enquiry's template for the requested format;
//! 2. fetch every query of the template into a [`QueryResultStore`];
//! 3. load the template and replace form fields, cell references and
//!    formatter chains;
//! 4. remember the form field values that were used;
//! 5. expand block rows;
//! 6. stamp the footer and save under a fresh name in the output directory.
//!
//! PDF output is generated from the word-processing template flagged for PDF
//! and handed to a [`PdfConverter`].

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use enquiry_data::{
    Catalog, EnquiryDefinition, EnquiryId, FieldValueId, FieldValueStore, FilterParams,
    FixtureConnector, JsonFieldValues, QueryExecutor,
};
use enquiry_ooxml::{DocxDocument, XlsxWorkbook};
use enquiry_template::{PlaceholderResolver, QueryResultStore, ReportDocument, TemplateError};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, info, warn};

use crate::config::ServiceConfig;
use crate::convert::{PdfConverter, SofficeConverter};
use crate::error::{EnquiryError, EnquiryResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Xlsx,
    Docx,
    Pdf,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Xlsx => "xlsx",
            OutputFormat::Docx => "docx",
            OutputFormat::Pdf => "pdf",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = EnquiryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "xlsx" => Ok(OutputFormat::Xlsx),
            "docx" => Ok(OutputFormat::Docx),
            "pdf" => Ok(OutputFormat::Pdf),
            _ => Err(EnquiryError::UnsupportedFormat(s.to_string())),
        }
    }
}

/// What the caller supplies for one report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemplaterRequest {
    #[serde(default)]
    pub user_id: Option<u32>,
    /// Column filters applied to every query view that has the column.
    #[serde(default, deserialize_with = "null_as_default")]
    pub filter_params: FilterParams,
    /// Form field values. Anything but an object counts as no fields.
    #[serde(default, deserialize_with = "field_map")]
    pub fields: BTreeMap<String, String>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn field_map<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let serde_json::Value::Object(map) = serde_json::Value::deserialize(deserializer)? else {
        return Ok(BTreeMap::new());
    };
    Ok(map
        .into_iter()
        .map(|(key, value)| {
            let value = match value {
                serde_json::Value::String(s) => s,
                serde_json::Value::Null => String::new(),
                other => other.to_string(),
            };
            (key, value)
        })
        .collect())
}

/// Formats and input fields of an enquiry, for building a request form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemplateInfo {
    pub formats: Vec<String>,
    pub fields: Vec<FieldInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldInfo {
    pub title: String,
    pub field_key: String,
    pub field_type: String,
    /// Values entered before, oldest first.
    pub values: Vec<FieldValueInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldValueInfo {
    pub id: FieldValueId,
    pub value: String,
    pub user_id: Option<u32>,
    /// `dd.mm.yyyy`
    pub created_at: String,
}

pub struct Templater {
    config: ServiceConfig,
    executor: Arc<QueryExecutor>,
    fields: Arc<dyn FieldValueStore>,
    converter: Arc<dyn PdfConverter>,
}

impl Templater {
    pub fn new(
        config: ServiceConfig,
        executor: Arc<QueryExecutor>,
        fields: Arc<dyn FieldValueStore>,
        converter: Arc<dyn PdfConverter>,
    ) -> Self {
        Self {
            config,
            executor,
            fields,
            converter,
        }
    }

    /// Wire up the file-backed collaborators named by `config`.
    pub async fn from_config(config: ServiceConfig) -> EnquiryResult<Self> {
        let catalog = Arc::new(Catalog::load(&config.catalog)?);
        let connector = Arc::new(FixtureConnector::new(config.data_dir.clone()));
        let executor =
            QueryExecutor::new(catalog, connector).with_schema(config.view_schema.clone());
        let fields = JsonFieldValues::open(config.field_values.clone()).await?;
        let converter = SofficeConverter::from_config(&config.converter);
        debug!(
            catalog = %config.catalog.display(),
            field_values = %fields.path().display(),
            converter = %converter.binary().display(),
            "Templater configured"
        );
        Ok(Self::new(
            config,
            Arc::new(executor),
            Arc::new(fields),
            Arc::new(converter),
        ))
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Catalog {
        self.executor.catalog()
    }

    fn enquiry(&self, enquiry_id: EnquiryId) -> EnquiryResult<&EnquiryDefinition> {
        self.catalog()
            .enquiry(enquiry_id)
            .ok_or(EnquiryError::EnquiryNotFound(enquiry_id))
    }

    /// Generate a report. Returns the path of the written file.
    pub async fn generate(
        &self,
        enquiry_id: EnquiryId,
        format: OutputFormat,
        request: &TemplaterRequest,
    ) -> EnquiryResult<PathBuf> {
        match format {
            OutputFormat::Xlsx => self.render::<XlsxWorkbook>(enquiry_id, format, request).await,
            OutputFormat::Docx => self.render::<DocxDocument>(enquiry_id, format, request).await,
            OutputFormat::Pdf => {
                let source = self.render::<DocxDocument>(enquiry_id, format, request).await?;
                let converted = self.converter.convert(&source, &self.config.output_dir).await;
                if let Err(e) = tokio::fs::remove_file(&source).await {
                    warn!(path = %source.display(), error = %e, "Could not remove intermediate document");
                }
                let pdf = converted?;
                info!(enquiry_id, path = %pdf.display(), "Report converted to PDF");
                Ok(pdf)
            }
        }
    }

    async fn render<D: ReportDocument + Send>(
        &self,
        enquiry_id: EnquiryId,
        format: OutputFormat,
        request: &TemplaterRequest,
    ) -> EnquiryResult<PathBuf> {
        let enquiry = self.enquiry(enquiry_id)?;
        let for_pdf = format == OutputFormat::Pdf;
        let template = enquiry.select_template(D::EXTENSION, for_pdf).ok_or_else(|| {
            EnquiryError::TemplateUnavailable {
                enquiry_id,
                format: format.to_string(),
            }
        })?;
        let template_path = self.catalog().template_path(template);
        debug!(enquiry_id, template = %template_path.display(), "Selected template");

        let store = self.executor.fetch_all(template, &request.filter_params).await;

        let mut document = D::load(&template_path)?;
        let observed = {
            let mut resolver = PlaceholderResolver::new(&store, &request.fields);
            document.replace_single_placeholders(&mut resolver)?;
            resolver.into_observed()
        };
        self.remember_fields(enquiry, &observed, request.user_id).await?;

        let summary = document.expand_blocks(&store)?;
        debug!(
            enquiry_id,
            regions = summary.regions,
            rows_inserted = summary.rows_inserted,
            rows_deleted = summary.rows_deleted,
            "Expanded blocks"
        );

        let stamp = self.config.footer.stamp(&chrono::Local::now());
        document.add_footer(&stamp)?;

        let output = self.output_path(enquiry_id, D::EXTENSION).await?;
        document.save(&output)?;
        info!(enquiry_id, path = %output.display(), "Report saved");
        Ok(output)
    }

    /// Persist the values of declared input fields used by the template.
    async fn remember_fields(
        &self,
        enquiry: &EnquiryDefinition,
        observed: &BTreeMap<String, String>,
        user_id: Option<u32>,
    ) -> EnquiryResult<()> {
        for (field_key, value) in observed {
            if enquiry.input_field(field_key).is_none() {
                debug!(enquiry_id = enquiry.id, field_key, "Field is not declared, not recorded");
                continue;
            }
            self.fields
                .record(enquiry.id, field_key, value, user_id)
                .await?;
        }
        Ok(())
    }

    /// A fresh file in the output directory.
    async fn output_path(&self, enquiry_id: EnquiryId, extension: &str) -> EnquiryResult<PathBuf> {
        let dir = &self.config.output_dir;
        tokio::fs::create_dir_all(dir).await?;
        let (_, path) = tempfile::Builder::new()
            .prefix(&format!("enquiry_{enquiry_id}_"))
            .suffix(&format!(".{extension}"))
            .tempfile_in(dir)
            .map_err(|e| TemplateError::write_failed(dir, e))?
            .keep()
            .map_err(|e| TemplateError::write_failed(dir, e.error))?;
        Ok(path)
    }

    /// Output formats and input fields of an enquiry.
    pub async fn template_info(&self, enquiry_id: EnquiryId) -> EnquiryResult<TemplateInfo> {
        let enquiry = self.enquiry(enquiry_id)?;

        let mut formats = enquiry.template_formats();
        formats.push(OutputFormat::Pdf.to_string());

        let mut fields = Vec::with_capacity(enquiry.input_fields.len());
        for field in &enquiry.input_fields {
            let values = self
                .fields
                .values(enquiry_id, &field.field_key)
                .await?
                .into_iter()
                .map(|v| FieldValueInfo {
                    id: v.id,
                    value: v.value,
                    user_id: v.user_id,
                    created_at: v.created_at.format("%d.%m.%Y").to_string(),
                })
                .collect();
            fields.push(FieldInfo {
                title: field.title.clone(),
                field_key: field.field_key.clone(),
                field_type: field.field_type.clone(),
                values,
            });
        }

        Ok(TemplateInfo { formats, fields })
    }

    /// Hide a remembered field value. Returns `false` when the value does not
    /// belong to the enquiry.
    pub async fn delete_field_value(
        &self,
        enquiry_id: EnquiryId,
        value_id: FieldValueId,
    ) -> EnquiryResult<bool> {
        Ok(self.fields.soft_delete(enquiry_id, value_id).await?)
    }

    pub fn output_dir(&self) -> &Path {
        &self.config.output_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use enquiry_template::Scalar;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_output_format_parse() {
        assert_eq!("XLSX".parse::<OutputFormat>().unwrap(), OutputFormat::Xlsx);
        assert_eq!("pdf".parse::<OutputFormat>().unwrap(), OutputFormat::Pdf);
        assert!(matches!(
            "odt".parse::<OutputFormat>(),
            Err(EnquiryError::UnsupportedFormat(f)) if f == "odt"
        ));
    }

    #[test]
    fn test_request_defaults() {
        let request: TemplaterRequest =
            serde_json::from_str(r#"{"filter_params": null, "fields": "nope"}"#).unwrap();
        assert_eq!(request, TemplaterRequest::default());
    }

    #[test]
    fn test_request_fields_and_filters() {
        let request: TemplaterRequest = serde_json::from_str(
            r#"{"user_id": 7, "filter_params": {"year": [2024, "2025"]}, "fields": {"city": "Москва", "n": 5, "x": null}}"#,
        )
        .unwrap();
        assert_eq!(request.user_id, Some(7));
        assert_eq!(
            request.filter_params["year"],
            vec![Scalar::Integer(2024), Scalar::text("2025")]
        );
        assert_eq!(request.fields["city"], "Москва");
        assert_eq!(request.fields["n"], "5");
        assert_eq!(request.fields["x"], "");
    }
}
