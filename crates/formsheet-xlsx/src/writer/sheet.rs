//! Worksheet part rendering

use std::collections::BTreeSet;
use std::fmt::Write as _;

use crate::styles::XlsxStyleTable;
use crate::xml::{escape_cell_text, escape_xml, fmt_num};
use formsheet_core::{CellAddress, CellData, CellValue, Worksheet};

const DEFAULT_ROW_HEIGHT: f64 = 15.0;
const DEFAULT_COLUMN_WIDTH: f64 = 8.43;

pub(super) fn worksheet_xml(sheet: &Worksheet, index: usize, styles: &XlsxStyleTable) -> String {
    let mut xml = format!(
        r#"{}
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="{}">"#,
        super::XML_HEADER,
        super::REL_NS
    );

    if sheet.page_setup().fit_to_page {
        xml.push_str(r#"<sheetPr><pageSetUpPr fitToPage="1"/></sheetPr>"#);
    }

    let dimension = sheet
        .used_range()
        .map(|r| r.to_a1_string())
        .unwrap_or_else(|| "A1".to_string());
    let _ = write!(xml, r#"<dimension ref="{dimension}"/>"#);
    xml.push_str(r#"<sheetViews><sheetView workbookViewId="0"/></sheetViews>"#);

    let _ = write!(
        xml,
        r#"<sheetFormatPr defaultRowHeight="{}""#,
        fmt_num(sheet.default_row_height())
    );
    if sheet.default_row_height() != DEFAULT_ROW_HEIGHT {
        xml.push_str(r#" customHeight="1""#);
    }
    if sheet.default_column_width() != DEFAULT_COLUMN_WIDTH {
        let _ = write!(
            xml,
            r#" defaultColWidth="{}""#,
            fmt_num(sheet.default_column_width())
        );
    }
    xml.push_str("/>");

    write_cols(&mut xml, sheet);
    write_sheet_data(&mut xml, sheet, index, styles);

    let merged = sheet.merged_regions();
    if !merged.is_empty() {
        let _ = write!(xml, r#"<mergeCells count="{}">"#, merged.len());
        for range in merged {
            let _ = write!(xml, r#"<mergeCell ref="{range}"/>"#);
        }
        xml.push_str("</mergeCells>");
    }

    if let Some(m) = sheet.page_margins() {
        let _ = write!(
            xml,
            r#"<pageMargins left="{}" right="{}" top="{}" bottom="{}" header="{}" footer="{}"/>"#,
            fmt_num(m.left),
            fmt_num(m.right),
            fmt_num(m.top),
            fmt_num(m.bottom),
            fmt_num(m.header),
            fmt_num(m.footer)
        );
    }

    let setup = sheet.page_setup();
    if !setup.is_empty() {
        xml.push_str("<pageSetup");
        if let Some(paper) = setup.paper_size {
            let _ = write!(xml, r#" paperSize="{paper}""#);
        }
        if let Some(scale) = setup.scale {
            let _ = write!(xml, r#" scale="{scale}""#);
        }
        if let Some(width) = setup.fit_to_width {
            let _ = write!(xml, r#" fitToWidth="{width}""#);
        }
        if let Some(height) = setup.fit_to_height {
            let _ = write!(xml, r#" fitToHeight="{height}""#);
        }
        if let Some(orientation) = setup.orientation {
            let _ = write!(xml, r#" orientation="{}""#, orientation.as_str());
        }
        xml.push_str("/>");
    }

    xml.push_str("</worksheet>");
    xml
}

/// `<cols>`, with neighbouring columns of equal width folded into one entry
fn write_cols(xml: &mut String, sheet: &Worksheet) {
    let columns: BTreeSet<u16> = sheet
        .custom_column_widths()
        .keys()
        .chain(sheet.hidden_columns().keys())
        .copied()
        .collect();
    if columns.is_empty() {
        return;
    }

    // (first, last, width, hidden)
    let mut runs: Vec<(u16, u16, f64, bool)> = Vec::new();
    for col in columns {
        let width = sheet.column_width(col);
        let hidden = sheet.is_column_hidden(col);
        match runs.last_mut() {
            Some(run) if run.1 + 1 == col && run.2 == width && run.3 == hidden => run.1 = col,
            _ => runs.push((col, col, width, hidden)),
        }
    }

    xml.push_str("<cols>");
    for (first, last, width, hidden) in runs {
        let _ = write!(
            xml,
            r#"<col min="{}" max="{}" width="{}" customWidth="1""#,
            first + 1,
            last + 1,
            fmt_num(width)
        );
        if hidden {
            xml.push_str(r#" hidden="1""#);
        }
        xml.push_str("/>");
    }
    xml.push_str("</cols>");
}

fn write_sheet_data(xml: &mut String, sheet: &Worksheet, index: usize, styles: &XlsxStyleTable) {
    // Rows without cells are still written when they carry a height or are hidden
    let rows: BTreeSet<u32> = sheet
        .row_indices()
        .chain(sheet.custom_row_heights().keys().copied())
        .chain(sheet.hidden_rows().keys().copied())
        .collect();

    if rows.is_empty() {
        xml.push_str("<sheetData/>");
        return;
    }

    xml.push_str("<sheetData>");
    for row in rows {
        let _ = write!(xml, r#"<row r="{}""#, row + 1);
        if let Some(height) = sheet.custom_row_height(row) {
            let _ = write!(xml, r#" ht="{}" customHeight="1""#, fmt_num(height));
        }
        if sheet.is_row_hidden(row) {
            xml.push_str(r#" hidden="1""#);
        }

        let mut cells = sheet.iter_row(row).peekable();
        if cells.peek().is_none() {
            xml.push_str("/>");
            continue;
        }
        xml.push('>');
        for (col, cell) in cells {
            write_cell(xml, CellAddress::new(row, col), cell, styles.xf_id_for(index, cell.style_index));
        }
        xml.push_str("</row>");
    }
    xml.push_str("</sheetData>");
}

fn write_cell(xml: &mut String, address: CellAddress, cell: &CellData, xf_id: u32) {
    let _ = write!(xml, r#"<c r="{}""#, address.to_a1_string());
    if xf_id != 0 {
        let _ = write!(xml, r#" s="{xf_id}""#);
    }

    match &cell.value {
        CellValue::Empty => xml.push_str("/>"),
        CellValue::Number(n) if n.is_finite() => {
            let _ = write!(xml, "><v>{}</v></c>", fmt_num(*n));
        }
        CellValue::Number(_) => xml.push_str(r#" t="e"><v>#NUM!</v></c>"#),
        CellValue::Boolean(b) => {
            let _ = write!(xml, r#" t="b"><v>{}</v></c>"#, u8::from(*b));
        }
        CellValue::String(s) => {
            let _ = write!(
                xml,
                r#" t="inlineStr"><is><t xml:space="preserve">{}</t></is></c>"#,
                escape_cell_text(s.as_str())
            );
        }
        CellValue::Formula { text, cached_value } => {
            let cached = cached_value.as_deref();
            match cached {
                Some(CellValue::String(_)) => xml.push_str(r#" t="str">"#),
                Some(CellValue::Boolean(_)) => xml.push_str(r#" t="b">"#),
                _ => xml.push('>'),
            }
            let _ = write!(xml, "<f>{}</f>", escape_xml(text));
            match cached {
                Some(CellValue::Number(n)) if n.is_finite() => {
                    let _ = write!(xml, "<v>{}</v>", fmt_num(*n));
                }
                Some(CellValue::String(s)) => {
                    let _ = write!(xml, "<v>{}</v>", escape_cell_text(s.as_str()));
                }
                Some(CellValue::Boolean(b)) => {
                    let _ = write!(xml, "<v>{}</v>", u8::from(*b));
                }
                _ => {}
            }
            xml.push_str("</c>");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formsheet_core::{CellRange, PageOrientation, Style, Workbook};

    fn render(sheet: &Worksheet) -> String {
        let mut workbook = Workbook::empty();
        workbook.add_existing_worksheet(sheet.clone()).unwrap();
        let table = XlsxStyleTable::build(&workbook);
        worksheet_xml(sheet, 0, &table)
    }

    #[test]
    fn test_cells_and_rows() {
        let mut sheet = Worksheet::new("RECEPCION");
        sheet.set_cell_value("A1", "Entregado por:\n(Cliente)").unwrap();
        sheet.set_cell_value("B1", 3.5).unwrap();
        sheet.set_cell_value("C1", true).unwrap();
        sheet.set_cell_formula_at(0, 3, "=SUM(B1:B1)").unwrap();
        sheet.set_row_height(4, 35.0);

        let xml = render(&sheet);
        assert!(xml.contains(r#"<dimension ref="A1:D1"/>"#));
        assert!(xml.contains(
            r#"<c r="A1" t="inlineStr"><is><t xml:space="preserve">Entregado por:
(Cliente)</t></is></c>"#
        ));
        assert!(xml.contains(r#"<c r="B1"><v>3.5</v></c>"#));
        assert!(xml.contains(r#"<c r="C1" t="b"><v>1</v></c>"#));
        assert!(xml.contains(r#"<c r="D1"><f>SUM(B1:B1)</f></c>"#));
        assert!(xml.contains(r#"<row r="5" ht="35" customHeight="1"/>"#));
    }

    #[test]
    fn test_styled_blank_cell_is_kept() {
        let mut sheet = Worksheet::new("S");
        sheet.set_cell_style("B3", &Style::new().bold(true)).unwrap();
        let xml = render(&sheet);
        assert!(xml.contains(r#"<c r="B3" s="1"/>"#));
    }

    #[test]
    fn test_columns_fold_into_runs() {
        let mut sheet = Worksheet::new("S");
        for col in 1..=3 {
            sheet.set_column_width(col, 12.0);
        }
        sheet.set_column_width(5, 20.0);
        let xml = render(&sheet);
        assert!(xml.contains(
            r#"<cols><col min="2" max="4" width="12" customWidth="1"/><col min="6" max="6" width="20" customWidth="1"/></cols>"#
        ));
    }

    #[test]
    fn test_merges_and_print_layout() {
        let mut sheet = Worksheet::new("S");
        sheet.merge_cells(&CellRange::parse("A44:K44").unwrap()).unwrap();
        sheet.page_setup_mut().fit_to_page = true;
        sheet.page_setup_mut().orientation = Some(PageOrientation::Landscape);
        sheet.page_setup_mut().fit_to_height = Some(0);

        let xml = render(&sheet);
        assert!(xml.contains(r#"<sheetPr><pageSetUpPr fitToPage="1"/></sheetPr>"#));
        assert!(xml.contains(r#"<mergeCells count="1"><mergeCell ref="A44:K44"/></mergeCells>"#));
        assert!(xml.contains(r#"<pageSetup fitToHeight="0" orientation="landscape"/>"#));
    }
}
