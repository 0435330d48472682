//! Worksheet part parser

use std::io::{BufReader, Read};

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::error::{XlsxError, XlsxResult};
use crate::xml::{attr, decode_excel_escapes, flag, parse_attr};
use formsheet_core::style::Style;
use formsheet_core::{
    CellAddress, CellRange, CellValue, PageMargins, PageOrientation, Worksheet,
};

/// `<c>` element being assembled
#[derive(Debug, Default)]
struct PendingCell {
    reference: String,
    cell_type: Option<String>,
    style: Option<usize>,
    value: Option<String>,
    formula: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TextTarget {
    None,
    Value,
    Formula,
    Inline,
}

/// Parse state for one worksheet part
struct SheetParser<'a> {
    worksheet: &'a mut Worksheet,
    shared_strings: &'a [String],
    styles: &'a [Style],
    cell: Option<PendingCell>,
    target: TextTarget,
    in_inline_string: bool,
    in_phonetic: bool,
}

impl SheetParser<'_> {
    fn open(&mut self, e: &BytesStart, empty: bool) -> XlsxResult<()> {
        match e.name().as_ref() {
            b"c" => {
                let pending = PendingCell {
                    reference: attr(e, b"r").unwrap_or_default(),
                    cell_type: attr(e, b"t"),
                    style: parse_attr(e, b"s"),
                    ..PendingCell::default()
                };
                if empty {
                    self.store(pending)?;
                } else {
                    self.cell = Some(pending);
                }
            }
            b"v" if self.cell.is_some() && !empty => self.target = TextTarget::Value,
            b"f" if self.cell.is_some() && !empty => self.target = TextTarget::Formula,
            b"is" if self.cell.is_some() => self.in_inline_string = !empty,
            b"rPh" => self.in_phonetic = !empty,
            b"t" if self.in_inline_string && !self.in_phonetic && !empty => {
                self.target = TextTarget::Inline
            }
            b"row" => read_row(e, self.worksheet),
            b"col" => read_col(e, self.worksheet),
            b"sheetFormatPr" => {
                if let Some(height) = parse_attr(e, b"defaultRowHeight") {
                    self.worksheet.set_default_row_height(height);
                }
                if let Some(width) = parse_attr(e, b"defaultColWidth") {
                    self.worksheet.set_default_column_width(width);
                }
            }
            b"mergeCell" => read_merge(e, self.worksheet),
            b"pageSetUpPr" => self.worksheet.page_setup_mut().fit_to_page = flag(e, b"fitToPage"),
            b"pageMargins" => self.worksheet.set_page_margins(Some(read_margins(e))),
            b"pageSetup" => {
                let setup = self.worksheet.page_setup_mut();
                setup.paper_size = parse_attr(e, b"paperSize");
                setup.orientation =
                    attr(e, b"orientation").and_then(|o| PageOrientation::parse(&o));
                setup.scale = parse_attr(e, b"scale");
                setup.fit_to_width = parse_attr(e, b"fitToWidth");
                setup.fit_to_height = parse_attr(e, b"fitToHeight");
            }
            _ => {}
        }
        Ok(())
    }

    fn text(&mut self, text: &str) {
        let Some(pending) = self.cell.as_mut() else {
            return;
        };
        let slot = match self.target {
            TextTarget::None => return,
            TextTarget::Formula => &mut pending.formula,
            TextTarget::Value | TextTarget::Inline => &mut pending.value,
        };
        slot.get_or_insert_with(String::new).push_str(text);
    }

    fn close(&mut self, name: &[u8]) -> XlsxResult<()> {
        match name {
            b"v" | b"f" | b"t" => self.target = TextTarget::None,
            b"is" => self.in_inline_string = false,
            b"rPh" => self.in_phonetic = false,
            b"c" => {
                if let Some(pending) = self.cell.take() {
                    self.store(pending)?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn store(&mut self, pending: PendingCell) -> XlsxResult<()> {
        store_cell(self.worksheet, pending, self.shared_strings, self.styles)
    }
}

pub(super) fn read_worksheet<R: Read>(
    part: R,
    worksheet: &mut Worksheet,
    shared_strings: &[String],
    styles: &[Style],
) -> XlsxResult<()> {
    let mut xml_reader = Reader::from_reader(BufReader::new(part));
    // Text nodes are only collected inside <v>, <f> and <t>, where spaces matter
    xml_reader.trim_text(false);

    let mut parser = SheetParser {
        worksheet,
        shared_strings,
        styles,
        cell: None,
        target: TextTarget::None,
        in_inline_string: false,
        in_phonetic: false,
    };
    let mut buf = Vec::new();

    loop {
        match xml_reader.read_event_into(&mut buf)? {
            Event::Start(e) => parser.open(&e, false)?,
            Event::Empty(e) => parser.open(&e, true)?,
            Event::Text(e) if parser.target != TextTarget::None => parser.text(&e.unescape()?),
            Event::End(e) => parser.close(e.name().as_ref())?,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(())
}

fn read_row(e: &BytesStart, worksheet: &mut Worksheet) {
    let Some(row) = parse_attr::<u32>(e, b"r").and_then(|r| r.checked_sub(1)) else {
        return;
    };
    if let Some(height) = parse_attr(e, b"ht") {
        worksheet.set_row_height(row, height);
    }
    if flag(e, b"hidden") {
        worksheet.set_row_hidden(row, true);
    }
}

fn read_col(e: &BytesStart, worksheet: &mut Worksheet) {
    let (Some(min), Some(max)) = (parse_attr::<u16>(e, b"min"), parse_attr::<u16>(e, b"max")) else {
        return;
    };
    let width: Option<f64> = parse_attr(e, b"width");
    let hidden = flag(e, b"hidden");
    let last = max.min(formsheet_core::MAX_COLS);
    for col in min.max(1) - 1..last {
        if let Some(width) = width {
            worksheet.set_column_width(col, width);
        }
        if hidden {
            worksheet.set_column_hidden(col, true);
        }
    }
}

fn read_merge(e: &BytesStart, worksheet: &mut Worksheet) {
    let Some(reference) = attr(e, b"ref") else {
        return;
    };
    // Conflicting regions are kept so callers can report them
    let result =
        CellRange::parse(&reference).and_then(|range| worksheet.push_merged_region(&range));
    if let Err(err) = result {
        log::warn!("skipping merged region {}: {}", reference, err);
    }
}

fn read_margins(e: &BytesStart) -> PageMargins {
    let defaults = PageMargins::default();
    PageMargins {
        left: parse_attr(e, b"left").unwrap_or(defaults.left),
        right: parse_attr(e, b"right").unwrap_or(defaults.right),
        top: parse_attr(e, b"top").unwrap_or(defaults.top),
        bottom: parse_attr(e, b"bottom").unwrap_or(defaults.bottom),
        header: parse_attr(e, b"header").unwrap_or(defaults.header),
        footer: parse_attr(e, b"footer").unwrap_or(defaults.footer),
    }
}

/// Decode a `<v>` payload according to the cell's `t` attribute
fn decode_value(
    raw: &str,
    cell_type: Option<&str>,
    shared_strings: &[String],
) -> XlsxResult<CellValue> {
    Ok(match cell_type {
        Some("s") => {
            let index: usize = raw
                .trim()
                .parse()
                .map_err(|_| XlsxError::Parse(format!("Invalid shared string index: {}", raw)))?;
            let s = shared_strings.get(index).ok_or_else(|| {
                XlsxError::Parse(format!("Shared string index {} out of bounds", index))
            })?;
            CellValue::string(s.as_str())
        }
        Some("b") => CellValue::Boolean(raw.trim() == "1" || raw.trim().eq_ignore_ascii_case("true")),
        Some("str") | Some("inlineStr") => CellValue::string(decode_excel_escapes(raw)),
        // Error values (#REF!, #N/A) are kept as their display text
        Some("e") => CellValue::string(raw),
        _ => match raw.trim().parse::<f64>() {
            Ok(n) => CellValue::Number(n),
            Err(_) => CellValue::string(raw),
        },
    })
}

fn store_cell(
    worksheet: &mut Worksheet,
    pending: PendingCell,
    shared_strings: &[String],
    styles: &[Style],
) -> XlsxResult<()> {
    let address = CellAddress::parse(&pending.reference).map_err(|e| {
        XlsxError::Parse(format!("Invalid cell reference '{}': {}", pending.reference, e))
    })?;
    let cell_type = pending.cell_type.as_deref();

    let value = match (pending.formula, pending.value) {
        (Some(text), cached) if !text.trim().is_empty() => CellValue::Formula {
            text,
            cached_value: cached
                .map(|raw| decode_value(&raw, cell_type, shared_strings))
                .transpose()?
                .map(Box::new),
        },
        // Followers of a shared formula carry no text; keep their result
        (_, Some(raw)) => decode_value(&raw, cell_type, shared_strings)?,
        (_, None) if cell_type == Some("inlineStr") => CellValue::string(""),
        (_, None) => CellValue::Empty,
    };
    if !value.is_empty() {
        worksheet.set_cell_value_at(address.row, address.col, value)?;
    }

    let index = pending.style.unwrap_or(0);
    let style = styles
        .get(index)
        .ok_or_else(|| XlsxError::Parse(format!("Style index {} out of bounds", index)))?;
    if *style != Style::default() {
        worksheet.set_cell_style_at(address.row, address.col, style)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::tests::package;
    use super::super::XlsxReader;
    use formsheet_core::{CellRange, CellValue, PageOrientation};
    use pretty_assertions::assert_eq;

    const FORM_SHEET: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <sheetPr><pageSetUpPr fitToPage="1"/></sheetPr>
  <sheetFormatPr defaultRowHeight="12.75"/>
  <cols><col min="1" max="1" width="5.5" customWidth="1"/><col min="2" max="3" width="12" customWidth="1"/></cols>
  <sheetData>
    <row r="4" ht="18" customHeight="1">
      <c r="B4" t="inlineStr"><is><t xml:space="preserve">N° RECEPCION </t></is></c>
      <c r="D4"/>
    </row>
    <row r="10" hidden="1">
      <c r="A10"><v>17</v></c>
      <c r="B10"><f>A10*2</f><v>34</v></c>
      <c r="C10" t="str"><f>"OT-"&amp;A10</f><v>OT-17</v></c>
      <c r="D10"><f t="shared" si="0"/><v>3</v></c>
      <c r="E10" t="b"><v>1</v></c>
      <c r="F10" t="e"><v>#REF!</v></c>
    </row>
  </sheetData>
  <mergeCells count="4"><mergeCell ref="B4:C4"/><mergeCell ref="B4:B4"/><mergeCell ref="A12:K12"/><mergeCell ref="K11:K12"/></mergeCells>
  <pageMargins left="0.25" right="0.25" top="0.5" bottom="0.5" header="0.3" footer="0.3"/>
  <pageSetup paperSize="9" orientation="landscape" fitToHeight="0"/>
</worksheet>"#;

    #[test]
    fn test_read_form_sheet() {
        let workbook = XlsxReader::read_bytes(&package(FORM_SHEET, &[])).unwrap();
        let ws = workbook.worksheet(0).unwrap();

        assert_eq!(ws.get_value_at(3, 1).as_string(), Some("N° RECEPCION "));
        assert_eq!(ws.get_value_at(9, 0), CellValue::Number(17.0));
        assert_eq!(ws.get_value_at(9, 1).formula_text(), Some("A10*2"));
        assert_eq!(ws.get_value_at(9, 1).as_number(), Some(34.0));
        assert_eq!(ws.get_value_at(9, 2).formula_text(), Some("\"OT-\"&A10"));
        assert_eq!(ws.get_value_at(9, 2).as_string(), Some("OT-17"));
        assert_eq!(ws.get_value_at(9, 3), CellValue::Number(3.0));
        assert_eq!(ws.get_value_at(9, 4), CellValue::Boolean(true));
        assert_eq!(ws.get_value_at(9, 5).as_string(), Some("#REF!"));
        assert!(ws.get_value_at(3, 3).is_empty());

        assert_eq!(ws.custom_row_height(3), Some(18.0));
        assert!(ws.is_row_hidden(9));
        assert_eq!(ws.default_row_height(), 12.75);
        assert_eq!(ws.column_width(0), 5.5);
        assert_eq!(ws.column_width(2), 12.0);

        // The single-cell merge is skipped, the conflicting one is kept
        assert_eq!(
            ws.merged_regions(),
            &[
                CellRange::parse("B4:C4").unwrap(),
                CellRange::parse("A12:K12").unwrap(),
                CellRange::parse("K11:K12").unwrap()
            ]
        );

        assert!(ws.page_setup().fit_to_page);
        assert_eq!(ws.page_setup().paper_size, Some(9));
        assert_eq!(ws.page_setup().orientation, Some(PageOrientation::Landscape));
        assert_eq!(ws.page_setup().fit_to_height, Some(0));
        assert_eq!(ws.page_margins().map(|m| m.left), Some(0.25));
    }

    #[test]
    fn test_bad_style_index_is_an_error() {
        let sheet = r#"<worksheet><sheetData><row r="1"><c r="A1" s="7"><v>1</v></c></row></sheetData></worksheet>"#;
        let err = XlsxReader::read_bytes(&package(sheet, &[])).unwrap_err();
        assert!(err.to_string().contains("Style index 7"));
    }
}
