//! XLSX writer
//!
//! Every part is rendered as a string and stored with a fixed timestamp, so
//! writing the same workbook twice yields identical bytes.

mod sheet;

use std::fs::File;
use std::io::{BufWriter, Cursor, Seek, Write};
use std::path::Path;

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::XlsxResult;
use crate::styles::XlsxStyleTable;
use crate::xml::escape_xml;
use formsheet_core::Workbook;

const XML_HEADER: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;
const REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// XLSX package writer
pub struct XlsxWriter;

impl XlsxWriter {
    /// Write a workbook to a file path
    pub fn write_file<P: AsRef<Path>>(workbook: &Workbook, path: P) -> XlsxResult<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        Self::write(workbook, &mut writer)?;
        writer.flush()?;
        Ok(())
    }

    /// Serialize a workbook into an in-memory package
    pub fn to_bytes(workbook: &Workbook) -> XlsxResult<Vec<u8>> {
        let mut cursor = Cursor::new(Vec::new());
        Self::write(workbook, &mut cursor)?;
        Ok(cursor.into_inner())
    }

    /// Write a workbook to a writer
    pub fn write<W: Write + Seek>(workbook: &Workbook, writer: W) -> XlsxResult<()> {
        let mut zip = ZipWriter::new(writer);
        let style_table = XlsxStyleTable::build(workbook);

        Self::add_part(&mut zip, "[Content_Types].xml", &content_types_xml(workbook))?;
        Self::add_part(&mut zip, "_rels/.rels", &root_rels_xml())?;
        Self::add_part(&mut zip, "xl/workbook.xml", &workbook_xml(workbook))?;
        Self::add_part(
            &mut zip,
            "xl/_rels/workbook.xml.rels",
            &workbook_rels_xml(workbook),
        )?;
        Self::add_part(&mut zip, "xl/styles.xml", &style_table.to_styles_xml())?;

        for (index, worksheet) in workbook.worksheets().enumerate() {
            let xml = sheet::worksheet_xml(worksheet, index, &style_table);
            Self::add_part(&mut zip, &format!("xl/worksheets/sheet{}.xml", index + 1), &xml)?;
        }

        zip.finish()?;
        log::debug!("wrote package with {} sheet(s)", workbook.sheet_count());
        Ok(())
    }

    fn add_part<W: Write + Seek>(zip: &mut ZipWriter<W>, name: &str, body: &str) -> XlsxResult<()> {
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .last_modified_time(zip::DateTime::default());
        zip.start_file(name, options)?;
        zip.write_all(body.as_bytes())?;
        Ok(())
    }
}

fn content_types_xml(workbook: &Workbook) -> String {
    let mut xml = format!(
        r#"{XML_HEADER}
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>"#
    );
    for i in 1..=workbook.sheet_count() {
        xml.push_str(&format!(
            r#"<Override PartName="/xl/worksheets/sheet{i}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#
        ));
    }
    xml.push_str("</Types>");
    xml
}

fn root_rels_xml() -> String {
    format!(
        r#"{XML_HEADER}
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="{REL_NS}/officeDocument" Target="xl/workbook.xml"/></Relationships>"#
    )
}

fn workbook_xml(workbook: &Workbook) -> String {
    let mut xml = format!(
        r#"{XML_HEADER}
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="{REL_NS}">"#
    );
    if workbook.date_1904() {
        xml.push_str(r#"<workbookPr date1904="1"/>"#);
    }
    xml.push_str(&format!(
        r#"<bookViews><workbookView activeTab="{}"/></bookViews><sheets>"#,
        workbook.active_sheet()
    ));
    for (i, sheet) in workbook.worksheets().enumerate() {
        let state = if sheet.is_visible() { "" } else { r#" state="hidden""# };
        xml.push_str(&format!(
            r#"<sheet name="{}" sheetId="{}"{} r:id="rId{}"/>"#,
            escape_xml(sheet.name()),
            i + 1,
            state,
            i + 1
        ));
    }
    xml.push_str("</sheets></workbook>");
    xml
}

fn workbook_rels_xml(workbook: &Workbook) -> String {
    let mut xml = format!(
        r#"{XML_HEADER}
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#
    );
    let count = workbook.sheet_count();
    for i in 1..=count {
        xml.push_str(&format!(
            r#"<Relationship Id="rId{i}" Type="{REL_NS}/worksheet" Target="worksheets/sheet{i}.xml"/>"#
        ));
    }
    xml.push_str(&format!(
        r#"<Relationship Id="rId{}" Type="{REL_NS}/styles" Target="styles.xml"/>"#,
        count + 1
    ));
    xml.push_str("</Relationships>");
    xml
}
