//! XLSX reader

mod sheet;

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek};
use std::path::Path;

use quick_xml::events::Event;
use quick_xml::reader::Reader;

use crate::error::{XlsxError, XlsxResult};
use crate::styles::read_styles_xml;
use crate::xml::{attr, decode_excel_escapes, flag};
use formsheet_core::style::Style;
use formsheet_core::Workbook;

/// A `<sheet>` entry of `workbook.xml`
#[derive(Debug)]
struct SheetEntry {
    name: String,
    rel_id: String,
    hidden: bool,
}

/// XLSX package reader
pub struct XlsxReader;

impl XlsxReader {
    /// Read a workbook from a file path
    pub fn read_file<P: AsRef<Path>>(path: P) -> XlsxResult<Workbook> {
        let file = File::open(path)?;
        Self::read(BufReader::new(file))
    }

    /// Read a workbook from an in-memory package
    pub fn read_bytes(bytes: &[u8]) -> XlsxResult<Workbook> {
        Self::read(Cursor::new(bytes))
    }

    /// Read a workbook from a reader
    pub fn read<R: Read + Seek>(reader: R) -> XlsxResult<Workbook> {
        let mut archive = zip::ZipArchive::new(reader)?;

        if archive.by_name("[Content_Types].xml").is_err() {
            return Err(XlsxError::InvalidFormat(
                "Missing [Content_Types].xml".into(),
            ));
        }

        let shared_strings = Self::read_shared_strings(&mut archive)?;
        let styles = Self::read_styles(&mut archive)?;
        let (entries, date_1904) = Self::read_workbook_xml(&mut archive)?;
        let sheet_paths = Self::read_workbook_rels(&mut archive)?;

        let mut workbook = Workbook::empty();
        workbook.set_date_1904(date_1904);

        for entry in &entries {
            let Some(path) = sheet_paths.get(&entry.rel_id) else {
                log::warn!(
                    "sheet '{}' has no worksheet relationship {}, skipped",
                    entry.name,
                    entry.rel_id
                );
                continue;
            };

            let index = workbook.add_worksheet_with_name(&entry.name)?;
            let worksheet = workbook
                .worksheet_mut(index)
                .ok_or_else(|| XlsxError::Parse(format!("sheet {} vanished", entry.name)))?;
            worksheet.set_visible(!entry.hidden);

            let part = archive
                .by_name(path)
                .map_err(|_| XlsxError::MissingPart(path.clone()))?;
            sheet::read_worksheet(part, worksheet, &shared_strings, &styles)?;
            log::debug!(
                "read sheet '{}' ({} cells, {} merged regions)",
                entry.name,
                worksheet.cell_count(),
                worksheet.merged_regions().len()
            );
        }

        if workbook.is_empty() {
            workbook.add_worksheet_with_name("Sheet1")?;
        }

        Ok(workbook)
    }

    /// Read the shared strings table; rich text runs are concatenated
    fn read_shared_strings<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
    ) -> XlsxResult<Vec<String>> {
        let mut strings = Vec::new();

        let file = match archive.by_name("xl/sharedStrings.xml") {
            Ok(f) => f,
            Err(_) => return Ok(strings),
        };

        let mut xml_reader = Reader::from_reader(BufReader::new(file));
        // Leading and trailing spaces inside <t> are content
        xml_reader.trim_text(false);

        let mut buf = Vec::new();
        let mut current = String::new();
        let mut in_t = false;
        let mut in_phonetic = false;

        loop {
            match xml_reader.read_event_into(&mut buf)? {
                Event::Start(e) => match e.name().as_ref() {
                    b"si" => current.clear(),
                    b"rPh" => in_phonetic = true,
                    b"t" if !in_phonetic => in_t = true,
                    _ => {}
                },
                Event::Empty(e) if e.name().as_ref() == b"si" => strings.push(String::new()),
                Event::End(e) => match e.name().as_ref() {
                    b"si" => strings.push(decode_excel_escapes(&current)),
                    b"rPh" => in_phonetic = false,
                    b"t" => in_t = false,
                    _ => {}
                },
                Event::Text(e) if in_t => current.push_str(&e.unescape()?),
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        Ok(strings)
    }

    fn read_styles<R: Read + Seek>(archive: &mut zip::ZipArchive<R>) -> XlsxResult<Vec<Style>> {
        match archive.by_name("xl/styles.xml") {
            Ok(file) => read_styles_xml(file),
            Err(_) => Ok(vec![Style::default()]),
        }
    }

    /// Sheet entries in tab order, plus the `date1904` flag
    fn read_workbook_xml<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
    ) -> XlsxResult<(Vec<SheetEntry>, bool)> {
        let file = archive
            .by_name("xl/workbook.xml")
            .map_err(|_| XlsxError::MissingPart("xl/workbook.xml".into()))?;

        let mut xml_reader = Reader::from_reader(BufReader::new(file));
        xml_reader.trim_text(true);

        let mut buf = Vec::new();
        let mut sheets = Vec::new();
        let mut date_1904 = false;

        loop {
            match xml_reader.read_event_into(&mut buf)? {
                Event::Empty(e) | Event::Start(e) => match e.name().as_ref() {
                    b"workbookPr" => date_1904 = flag(&e, b"date1904"),
                    b"sheet" => {
                        if let (Some(name), Some(rel_id)) = (attr(&e, b"name"), attr(&e, b"r:id")) {
                            let hidden = matches!(
                                attr(&e, b"state").as_deref(),
                                Some("hidden") | Some("veryHidden")
                            );
                            sheets.push(SheetEntry {
                                name,
                                rel_id,
                                hidden,
                            });
                        }
                    }
                    _ => {}
                },
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        Ok((sheets, date_1904))
    }

    /// Worksheet relationship id -> part path inside the archive
    fn read_workbook_rels<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
    ) -> XlsxResult<HashMap<String, String>> {
        let file = archive
            .by_name("xl/_rels/workbook.xml.rels")
            .map_err(|_| XlsxError::MissingPart("xl/_rels/workbook.xml.rels".into()))?;

        let mut xml_reader = Reader::from_reader(BufReader::new(file));
        xml_reader.trim_text(true);

        let mut buf = Vec::new();
        let mut rels = HashMap::new();

        loop {
            match xml_reader.read_event_into(&mut buf)? {
                Event::Empty(e) | Event::Start(e) if e.name().as_ref() == b"Relationship" => {
                    let is_worksheet = attr(&e, b"Type")
                        .map(|t| t.ends_with("/worksheet"))
                        .unwrap_or(false);
                    if let (true, Some(id), Some(target)) =
                        (is_worksheet, attr(&e, b"Id"), attr(&e, b"Target"))
                    {
                        rels.insert(id, part_path(&target));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        Ok(rels)
    }
}

/// Resolve a relationship target from `xl/_rels` to an archive path
fn part_path(target: &str) -> String {
    match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => format!("xl/{}", target.trim_start_matches("./")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    pub(crate) fn package(sheet_xml: &str, extra: &[(&str, &str)]) -> Vec<u8> {
        let mut buf = Vec::new();
        {
            let mut zip = zip::ZipWriter::new(Cursor::new(&mut buf));
            let options = zip::write::SimpleFileOptions::default();
            let mut parts = vec![
                ("[Content_Types].xml", r#"<?xml version="1.0"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="xml" ContentType="application/xml"/></Types>"#),
                ("xl/workbook.xml", r#"<?xml version="1.0"?><workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="RECEPCION" sheetId="1" r:id="rId1"/></sheets></workbook>"#),
                ("xl/_rels/workbook.xml.rels", r#"<?xml version="1.0"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="/xl/worksheets/sheet1.xml"/></Relationships>"#),
                ("xl/worksheets/sheet1.xml", sheet_xml),
            ];
            parts.extend_from_slice(extra);
            for (name, body) in parts {
                zip.start_file(name, options).unwrap();
                zip.write_all(body.as_bytes()).unwrap();
            }
            zip.finish().unwrap();
        }
        buf
    }

    #[test]
    fn test_read_empty_xlsx() {
        let bytes = package(
            r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData/></worksheet>"#,
            &[],
        );
        let workbook = XlsxReader::read_bytes(&bytes).unwrap();

        assert_eq!(workbook.sheet_count(), 1);
        assert_eq!(workbook.worksheet(0).unwrap().name(), "RECEPCION");
        assert!(workbook.worksheet(0).unwrap().is_empty());
    }

    #[test]
    fn test_not_a_package() {
        let err = XlsxReader::read_bytes(b"definitely not a zip").unwrap_err();
        assert!(matches!(err, XlsxError::Zip(_)));
    }

    #[test]
    fn test_shared_strings_keep_spaces_and_join_runs() {
        let shared = r#"<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="3" uniqueCount="3">
<si><t xml:space="preserve"> N° OT </t></si>
<si><r><rPr><b/></rPr><t>Entregado </t></r><r><t>por:</t></r><rPh sb="0" eb="1"><t>ignored</t></rPh></si>
<si/>
</sst>"#;
        let sheet = r#"<worksheet><sheetData><row r="1"><c r="A1" t="s"><v>0</v></c><c r="B1" t="s"><v>1</v></c><c r="C1" t="s"><v>2</v></c></row></sheetData></worksheet>"#;
        let bytes = package(sheet, &[("xl/sharedStrings.xml", shared)]);
        let workbook = XlsxReader::read_bytes(&bytes).unwrap();
        let ws = workbook.worksheet(0).unwrap();

        assert_eq!(ws.get_value_at(0, 0).as_string(), Some(" N° OT "));
        assert_eq!(ws.get_value_at(0, 1).as_string(), Some("Entregado por:"));
        assert_eq!(ws.get_value_at(0, 2).as_string(), Some(""));
    }

    #[test]
    fn test_part_path() {
        assert_eq!(part_path("worksheets/sheet1.xml"), "xl/worksheets/sheet1.xml");
        assert_eq!(part_path("/xl/worksheets/sheet2.xml"), "xl/worksheets/sheet2.xml");
    }
}
