/*
 * templater_tests.rs
 * Copyright (c) 2025 Posit, PBC
 */

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use enquiry_core::{
    EnquiryError, EnquiryResult, OutputFormat, PdfConverter, ServiceConfig, Templater,
    TemplaterRequest,
};
use enquiry_data::{Catalog, FixtureConnector, InMemoryFieldValues, QueryExecutor};
use enquiry_ooxml::DocxDocument;
use enquiry_ooxml::docx::paragraph::paragraph_text;
use enquiry_template::{ReportDocument, Scalar};
use pretty_assertions::assert_eq;
use zip::write::SimpleFileOptions;

const CATALOG: &str = r#"
databases:
  - id: 1
    dbms: postgresql
    host: localhost
    name: contracts
    username: reader
    password: secret
enquiries:
  - id: 3
    title: Справка по договорам
    input_fields:
      - field_key: org_name
        title: Организация
    templates:
      - path: templates/contracts.docx
        blocks:
          - queries:
              - id: 4
                title: Работы
                database_id: 1
      - path: templates/contracts_pdf.docx
        blocks:
          - queries:
              - id: 4
                title: Работы
                database_id: 1
"#;

const CONTRACTS: &str = r#"{
    "cbias_spravki.query_4": [
        {"inn": "7701", "work": "Ремонт кровли", "total": 1250000},
        {"inn": "7701", "work": "Покраска", "total": 3400},
        {"inn": "7702", "work": "Уборка", "total": 10}
    ]
}"#;

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

const DOCUMENT: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body><w:p><w:r><w:t>Договоры {{org_name}}</w:t></w:r></w:p><w:tbl><w:tr><w:tc><w:p><w:r><w:t>{{4;work}}</w:t></w:r></w:p></w:tc><w:tc><w:p><w:r><w:t>{{4;total}}</w:t></w:r></w:p></w:tc></w:tr></w:tbl><w:sectPr/></w:body></w:document>"#;

fn write_template(path: &Path) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    let file = std::fs::File::create(path).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    for (name, content) in [
        ("[Content_Types].xml", CONTENT_TYPES),
        ("_rels/.rels", ROOT_RELS),
        ("word/document.xml", DOCUMENT),
    ] {
        zip.start_file(name, SimpleFileOptions::default()).unwrap();
        zip.write_all(content.as_bytes()).unwrap();
    }
    zip.finish().unwrap();
}

/// Copies the source next to the output directory with a `.pdf` extension.
#[derive(Default)]
struct CopyConverter {
    calls: AtomicUsize,
}

#[async_trait]
impl PdfConverter for CopyConverter {
    async fn convert(&self, source: &Path, out_dir: &Path) -> EnquiryResult<PathBuf> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let target = out_dir.join(source.file_stem().unwrap()).with_extension("pdf");
        std::fs::copy(source, &target)?;
        Ok(target)
    }
}

struct Fixture {
    _dir: tempfile::TempDir,
    templater: Templater,
    converter: Arc<CopyConverter>,
    output_dir: PathBuf,
}

fn fixture() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    std::fs::write(root.join("catalog.yml"), CATALOG).unwrap();
    std::fs::write(root.join("contracts.json"), CONTRACTS).unwrap();
    write_template(&root.join("templates/contracts.docx"));
    write_template(&root.join("templates/contracts_pdf.docx"));

    let config = ServiceConfig {
        catalog: root.join("catalog.yml"),
        data_dir: root.to_path_buf(),
        output_dir: root.join("out"),
        ..ServiceConfig::default()
    };
    let catalog = Arc::new(Catalog::load(&config.catalog).unwrap());
    let executor = QueryExecutor::new(catalog, Arc::new(FixtureConnector::new(root)));
    let converter = Arc::new(CopyConverter::default());
    let output_dir = config.output_dir.clone();
    let templater = Templater::new(
        config,
        Arc::new(executor),
        Arc::new(InMemoryFieldValues::new()),
        converter.clone(),
    );
    Fixture {
        _dir: dir,
        templater,
        converter,
        output_dir,
    }
}

fn request() -> TemplaterRequest {
    serde_json::from_value(serde_json::json!({
        "user_id": 42,
        "filter_params": {"inn": ["7701"]},
        "fields": {"org_name": "ООО «Ромашка»", "unused": "x"}
    }))
    .unwrap()
}

fn texts(path: &Path) -> Vec<String> {
    let document = DocxDocument::load(path).unwrap();
    let body = document.body().unwrap();
    let mut texts = Vec::new();
    for element in body.elements() {
        match element.name.as_str() {
            "w:p" => texts.push(paragraph_text(element)),
            "w:tbl" => {
                for row in element.children_named("w:tr") {
                    let cells: Vec<String> = row
                        .children_named("w:tc")
                        .map(|tc| tc.child("w:p").map(paragraph_text).unwrap_or_default())
                        .collect();
                    texts.push(cells.join(" | "));
                }
            }
            _ => {}
        }
    }
    texts
}

#[tokio::test]
async fn test_generate_docx() {
    let fixture = fixture();
    let path = fixture
        .templater
        .generate(3, OutputFormat::Docx, &request())
        .await
        .unwrap();

    assert_eq!(path.parent(), Some(fixture.output_dir.as_path()));
    assert_eq!(path.extension().and_then(|e| e.to_str()), Some("docx"));
    assert_eq!(
        texts(&path),
        vec![
            "Договоры ООО «Ромашка»".to_string(),
            "Ремонт кровли | 1250000".to_string(),
            "Покраска | 3400".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_each_generation_gets_its_own_file() {
    let fixture = fixture();
    let first = fixture.templater.generate(3, OutputFormat::Docx, &request()).await.unwrap();
    let second = fixture.templater.generate(3, OutputFormat::Docx, &request()).await.unwrap();
    assert_ne!(first, second);
    assert!(first.exists() && second.exists());
}

#[tokio::test]
async fn test_declared_fields_are_remembered_once() {
    let fixture = fixture();
    fixture.templater.generate(3, OutputFormat::Docx, &request()).await.unwrap();
    fixture.templater.generate(3, OutputFormat::Docx, &request()).await.unwrap();

    let info = fixture.templater.template_info(3).await.unwrap();
    assert_eq!(info.formats, vec!["docx".to_string(), "pdf".to_string()]);
    assert_eq!(info.fields.len(), 1);
    let field = &info.fields[0];
    assert_eq!(field.field_key, "org_name");
    assert_eq!(field.field_type, "text");
    assert_eq!(field.values.len(), 1);
    assert_eq!(field.values[0].value, "ООО «Ромашка»");
    assert_eq!(field.values[0].user_id, Some(42));

    let id = field.values[0].id;
    assert!(!fixture.templater.delete_field_value(99, id).await.unwrap());
    assert!(fixture.templater.delete_field_value(3, id).await.unwrap());
    let info = fixture.templater.template_info(3).await.unwrap();
    assert!(info.fields[0].values.is_empty());
}

#[tokio::test]
async fn test_pdf_converts_and_removes_intermediate() {
    let fixture = fixture();
    let pdf = fixture
        .templater
        .generate(3, OutputFormat::Pdf, &request())
        .await
        .unwrap();

    assert_eq!(pdf.extension().and_then(|e| e.to_str()), Some("pdf"));
    assert!(pdf.exists());
    assert_eq!(fixture.converter.calls.load(Ordering::SeqCst), 1);

    let leftovers: Vec<_> = std::fs::read_dir(&fixture.output_dir)
        .unwrap()
        .filter_map(Result::ok)
        .filter(|e| e.path().extension().and_then(|x| x.to_str()) == Some("docx"))
        .collect();
    assert!(leftovers.is_empty());
}

#[tokio::test]
async fn test_missing_enquiry_and_template() {
    let fixture = fixture();
    let err = fixture
        .templater
        .generate(8, OutputFormat::Docx, &TemplaterRequest::default())
        .await
        .unwrap_err();
    assert!(matches!(err, EnquiryError::EnquiryNotFound(8)));

    let err = fixture
        .templater
        .generate(3, OutputFormat::Xlsx, &TemplaterRequest::default())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EnquiryError::TemplateUnavailable { enquiry_id: 3, ref format } if format == "xlsx"
    ));
}

#[tokio::test]
async fn test_missing_data_deletes_block_rows() {
    let fixture = fixture();
    let mut request = request();
    request
        .filter_params
        .insert("inn".to_string(), vec![Scalar::text("0000")]);

    let path = fixture
        .templater
        .generate(3, OutputFormat::Docx, &request)
        .await
        .unwrap();
    assert_eq!(texts(&path), vec!["Договоры ООО «Ромашка»".to_string()]);
}

#[tokio::test]
async fn test_field_values_persist_across_templaters() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    std::fs::write(root.join("catalog.yml"), CATALOG).unwrap();
    std::fs::write(root.join("contracts.json"), CONTRACTS).unwrap();
    write_template(&root.join("templates/contracts.docx"));
    let config_path = root.join("enquiry.yml");
    std::fs::write(
        &config_path,
        "data-dir: .\noutput-dir: out\nfield-values: state/field_values.json\n",
    )
    .unwrap();
    let config = ServiceConfig::load(Some(&config_path)).unwrap();

    let first = Templater::from_config(config.clone()).await.unwrap();
    first.generate(3, OutputFormat::Docx, &request()).await.unwrap();
    assert!(root.join("state/field_values.json").exists());

    let second = Templater::from_config(config.clone()).await.unwrap();
    let info = second.template_info(3).await.unwrap();
    let values = &info.fields[0].values;
    assert_eq!(values.len(), 1);
    assert_eq!(values[0].value, "ООО «Ромашка»");
    assert!(second.delete_field_value(3, values[0].id).await.unwrap());

    let third = Templater::from_config(config).await.unwrap();
    let info = third.template_info(3).await.unwrap();
    assert!(info.fields[0].values.is_empty());
}
