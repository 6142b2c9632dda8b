/*
 * xlsx_tests.rs
 * Copyright (c) 2025 Posit, PBC
 */

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;

use enquiry_ooxml::{OoxmlPackage, XlsxWorkbook};
use enquiry_template::{
    CellValue, FooterStamp, MergeRange, PlaceholderResolver, QueryResultSet, QueryResultStore,
    ReportDocument, Row, Scalar, TemplateError, TemplateSheet,
};
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use zip::write::SimpleFileOptions;

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/><Override PartName="/xl/worksheets/sheet2.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/><Override PartName="/xl/sharedStrings.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml"/></Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;

const WORKBOOK: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><bookViews><workbookView activeTab="1"/></bookViews><sheets><sheet name="Пусто" sheetId="1" r:id="rId1"/><sheet name="Справка" sheetId="2" r:id="rId2"/></sheets></workbook>"#;

const WORKBOOK_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet2.xml"/><Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings" Target="sharedStrings.xml"/></Relationships>"#;

const SHARED_STRINGS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="4" uniqueCount="4"><si><t>Справка по {{city}}</t></si><si><t>{{7;name}}</t></si><si><t>{{7;amount}}</t></si><si><r><t>Итого: </t></r><r><t>{{ROUND;7;amount}}</t></r></si></sst>"#;

const EMPTY_SHEET: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData/></worksheet>"#;

const REPORT_SHEET: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><dimension ref="A1:C4"/><sheetData><row r="1"><c r="A1" t="s"><v>0</v></c></row><row r="2" ht="30" customHeight="1"><c r="A2" s="2" t="s"><v>1</v></c><c r="B2" s="3"/><c r="C2" s="4" t="s"><v>2</v></c></row><row r="3"><c r="A3" t="s"><v>3</v></c></row><row r="4"><c r="A4"><f>1+1</f><v>2</v></c></row></sheetData><mergeCells count="2"><mergeCell ref="A2:B2"/><mergeCell ref="A3:C3"/></mergeCells><pageMargins left="0.7" right="0.7" top="0.75" bottom="0.75" header="0.3" footer="0.3"/><headerFooter><oddFooter>&amp;LЛист &amp;P</oddFooter></headerFooter></worksheet>"#;

fn write_package(path: &Path, parts: &[(&str, &str)]) {
    let file = std::fs::File::create(path).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    for (name, content) in parts {
        zip.start_file(*name, SimpleFileOptions::default()).unwrap();
        zip.write_all(content.as_bytes()).unwrap();
    }
    zip.finish().unwrap();
}

fn template(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("template.xlsx");
    write_package(
        &path,
        &[
            ("[Content_Types].xml", CONTENT_TYPES),
            ("_rels/.rels", ROOT_RELS),
            ("xl/workbook.xml", WORKBOOK),
            ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS),
            ("xl/sharedStrings.xml", SHARED_STRINGS),
            ("xl/worksheets/sheet1.xml", EMPTY_SHEET),
            ("xl/worksheets/sheet2.xml", REPORT_SHEET),
        ],
    );
    path
}

fn store() -> QueryResultStore {
    let rows = [("Ремонт", "1500.25"), ("Покраска", "99.94"), ("Уборка", "10")]
        .into_iter()
        .map(|(name, amount)| {
            let mut row = Row::new();
            row.insert("name".to_string(), Scalar::Text(name.to_string()));
            row.insert(
                "amount".to_string(),
                Scalar::Decimal(Decimal::from_str(amount).unwrap()),
            );
            row
        })
        .collect::<Vec<_>>();
    [(7, QueryResultSet::new(rows))].into_iter().collect()
}

fn text(value: &str) -> CellValue {
    CellValue::Text(value.to_string())
}

fn number(value: &str) -> CellValue {
    CellValue::Number(Decimal::from_str(value).unwrap())
}

#[test]
fn test_generate_report_workbook() {
    let dir = tempfile::tempdir().unwrap();
    let source = template(dir.path());
    let output = dir.path().join("report.xlsx");

    let store = store();
    let fields = BTreeMap::from([("city".to_string(), "Казани".to_string())]);
    let mut workbook = XlsxWorkbook::load(&source).unwrap();
    let mut resolver = PlaceholderResolver::new(&store, &fields);
    workbook.replace_single_placeholders(&mut resolver).unwrap();
    assert_eq!(resolver.into_observed(), fields);

    let summary = workbook.expand_blocks(&store).unwrap();
    assert_eq!(summary.rows_inserted, 2);
    workbook
        .add_footer(&FooterStamp::new("Справка сформирована", "05.06.2025 14:30:00"))
        .unwrap();
    workbook.save(&output).unwrap();

    let reloaded = XlsxWorkbook::load(&output).unwrap();
    let sheet = reloaded.worksheet();
    assert_eq!(sheet.row_count(), 6);
    assert_eq!(sheet.cell_value(1, 1), text("Справка по Казани"));
    assert_eq!(sheet.cell_value(2, 1), text("Ремонт"));
    assert_eq!(sheet.cell_value(3, 3), number("99.94"));
    assert_eq!(sheet.cell_value(4, 1), text("Уборка"));
    assert_eq!(sheet.cell_value(4, 3), number("10"));
    assert_eq!(sheet.cell_value(5, 1), text("Итого: 0,0"));
    assert_eq!(sheet.cell_value(6, 1), CellValue::Formula("1+1".to_string()));

    assert_eq!(sheet.cell_style(4, 1), 2);
    assert_eq!(sheet.cell_style(4, 2), 3);
    assert_eq!(sheet.row_height(3), Some(30.0));
    assert_eq!(
        sheet.merge_ranges(),
        vec![
            MergeRange::new(2, 2, 1, 2).unwrap(),
            MergeRange::new(5, 5, 1, 3).unwrap(),
            MergeRange::new(3, 3, 1, 2).unwrap(),
            MergeRange::new(4, 4, 1, 2).unwrap(),
        ]
    );
    assert_eq!(
        sheet.odd_footer().as_deref(),
        Some("&LЛист &P&R&\"Times New Roman,Regular\"&9Справка сформирована\n05.06.2025 14:30:00")
    );
}

#[test]
fn test_untouched_parts_are_copied() {
    let dir = tempfile::tempdir().unwrap();
    let source = template(dir.path());
    let output = dir.path().join("copy.xlsx");

    let workbook = XlsxWorkbook::load(&source).unwrap();
    workbook.save(&output).unwrap();

    let before = OoxmlPackage::open(&source).unwrap();
    let after = OoxmlPackage::open(&output).unwrap();
    assert_eq!(
        before.part_names().collect::<Vec<_>>(),
        after.part_names().collect::<Vec<_>>()
    );
    for part in ["xl/sharedStrings.xml", "xl/worksheets/sheet1.xml", "xl/workbook.xml"] {
        assert_eq!(before.part(part), after.part(part), "{part}");
    }
}

#[test]
fn test_missing_template() {
    let dir = tempfile::tempdir().unwrap();
    let err = XlsxWorkbook::load(&dir.path().join("absent.xlsx")).unwrap_err();
    assert!(matches!(err, TemplateError::TemplateNotFound { .. }));
}

#[test]
fn test_not_a_package() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.xlsx");
    std::fs::write(&path, b"not a zip file").unwrap();
    let err = XlsxWorkbook::load(&path).unwrap_err();
    assert!(matches!(err, TemplateError::MalformedTemplate { .. }));
}

#[test]
fn test_corrupt_entry_is_malformed() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("corrupt.xlsx");
    let mut zip = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    let stored = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
    zip.start_file("[Content_Types].xml", stored).unwrap();
    zip.write_all(CONTENT_TYPES.as_bytes()).unwrap();
    let mut bytes = zip.finish().unwrap().into_inner();

    let marker = b"content-types";
    let at = bytes
        .windows(marker.len())
        .position(|w| w == marker)
        .unwrap();
    bytes[at] ^= 0x20;
    std::fs::write(&path, &bytes).unwrap();

    let err = XlsxWorkbook::load(&path).unwrap_err();
    assert!(
        matches!(err, TemplateError::MalformedTemplate { .. }),
        "unexpected error: {err:?}"
    );
}
