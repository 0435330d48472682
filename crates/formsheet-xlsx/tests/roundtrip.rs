use formsheet_core::{
    Alignment, BorderLineStyle, BorderStyle, CellRange, CellValue, Color, FillStyle,
    HorizontalAlignment, NumberFormat, PageMargins, PageOrientation, Style, VerticalAlignment,
    Workbook,
};
use formsheet_xlsx::{XlsxReader, XlsxWriter};
use pretty_assertions::assert_eq;

fn boxed() -> Style {
    Style::new()
        .with_border(BorderStyle::all(BorderLineStyle::Thin, Color::Auto))
        .with_alignment(Alignment {
            horizontal: HorizontalAlignment::Center,
            vertical: VerticalAlignment::Center,
            wrap_text: true,
            ..Alignment::default()
        })
}

/// A small reception form: header band, two item rows, footer band
fn form() -> Workbook {
    let mut workbook = Workbook::empty();
    workbook.add_worksheet_with_name("RECEPCION").unwrap();
    let ws = workbook.worksheet_mut(0).unwrap();

    ws.set_cell_value("A1", "RECEPCIÓN DE MUESTRAS CILÍNDRICAS DE CONCRETO").unwrap();
    ws.set_cell_style("A1", &Style::new().bold(true).font_size(14.0)).unwrap();
    ws.merge_cells(&CellRange::parse("A1:K1").unwrap()).unwrap();

    ws.set_cell_value("B3", "N° OT").unwrap();
    ws.set_cell_style(
        "B3",
        &Style::new().with_fill(FillStyle::solid(Color::rgb(0xD9, 0xE1, 0xF2))),
    )
    .unwrap();

    for row in 4..6 {
        for col in 0..11 {
            ws.set_cell_style_at(row, col, &boxed()).unwrap();
        }
        ws.merge_cells(&CellRange::from_indices(row, 1, row, 2)).unwrap();
        ws.set_row_height(row, 18.0);
    }
    ws.set_cell_value_at(4, 0, 1).unwrap();
    ws.set_cell_value_at(4, 5, 210).unwrap();
    ws.set_cell_style_at(
        4,
        6,
        &boxed().with_number_format(NumberFormat::Custom("dd/mm/yyyy".into())),
    )
    .unwrap();
    ws.set_cell_formula_at(5, 0, "A5+1").unwrap();

    ws.set_cell_value("A7", "(1) OBLIGATORIO").unwrap();
    ws.set_cell_value("B8", "Entregado por:").unwrap();
    ws.merge_cells(&CellRange::parse("B8:E8").unwrap()).unwrap();
    ws.set_row_height(7, 35.0);

    ws.set_column_width(0, 5.0);
    ws.set_column_width(1, 14.0);
    ws.set_column_width(2, 14.0);
    ws.set_row_hidden(9, true);

    ws.page_setup_mut().fit_to_page = true;
    ws.page_setup_mut().paper_size = Some(9);
    ws.page_setup_mut().orientation = Some(PageOrientation::Portrait);
    ws.page_setup_mut().fit_to_width = Some(1);
    ws.page_setup_mut().fit_to_height = Some(0);
    ws.set_page_margins(Some(PageMargins {
        left: 0.25,
        right: 0.25,
        ..PageMargins::default()
    }));
    workbook
}

#[test]
fn form_survives_write_and_read() {
    let original = form();
    let bytes = XlsxWriter::to_bytes(&original).unwrap();
    let back = XlsxReader::read_bytes(&bytes).unwrap();

    let a = original.worksheet(0).unwrap();
    let b = back.worksheet(0).unwrap();

    assert_eq!(b.name(), "RECEPCION");
    assert_eq!(b.cell_count(), a.cell_count());
    for (row, col, cell) in a.iter_cells() {
        assert_eq!(b.get_value_at(row, col), cell.value, "value at {row},{col}");
        assert_eq!(b.style_at(row, col), a.style_at(row, col), "style at {row},{col}");
    }

    assert_eq!(b.merged_regions(), a.merged_regions());
    assert_eq!(b.custom_row_heights(), a.custom_row_heights());
    assert!(b.is_row_hidden(9));
    assert_eq!(b.column_width(1), 14.0);
    assert_eq!(b.column_width(2), 14.0);
    assert_eq!(b.page_setup(), a.page_setup());
    assert_eq!(b.page_margins(), a.page_margins());
}

#[test]
fn rows_inserted_after_reading_are_written_back() {
    let bytes = XlsxWriter::to_bytes(&form()).unwrap();
    let mut workbook = XlsxReader::read_bytes(&bytes).unwrap();
    let ws = workbook.worksheet_mut(0).unwrap();

    // Open three rows at the sentinel row (row 7, index 6)
    ws.insert_rows(6, 3).unwrap();

    let bytes = XlsxWriter::to_bytes(&workbook).unwrap();
    let back = XlsxReader::read_bytes(&bytes).unwrap();
    let ws = back.worksheet(0).unwrap();

    assert_eq!(ws.get_value("A10").unwrap().as_string(), Some("(1) OBLIGATORIO"));
    assert_eq!(ws.get_value("B11").unwrap().as_string(), Some("Entregado por:"));
    assert_eq!(ws.custom_row_height(10), Some(35.0));
    assert!(ws.is_row_hidden(12));
    assert!(ws
        .merged_regions()
        .contains(&CellRange::parse("B11:E11").unwrap()));
    // Rows above the insertion point are untouched
    assert_eq!(ws.get_value("A6").unwrap().formula_text(), Some("A5+1"));
    assert!(ws
        .merged_regions()
        .contains(&CellRange::parse("B5:C5").unwrap()));
}

#[test]
fn formula_cached_values_are_preserved() {
    let mut workbook = Workbook::new();
    let ws = workbook.worksheet_mut(0).unwrap();
    ws.set_cell_value_at(
        0,
        0,
        CellValue::Formula {
            text: "\"OT-\"&B1".into(),
            cached_value: Some(Box::new(CellValue::string("OT-17"))),
        },
    )
    .unwrap();

    let back = XlsxReader::read_bytes(&XlsxWriter::to_bytes(&workbook).unwrap()).unwrap();
    let value = back.worksheet(0).unwrap().get_value_at(0, 0);
    assert_eq!(value.formula_text(), Some("\"OT-\"&B1"));
    assert_eq!(value.as_string(), Some("OT-17"));
}

#[test]
fn text_that_looks_like_an_escape_is_kept() {
    let mut workbook = Workbook::new();
    let ws = workbook.worksheet_mut(0).unwrap();
    ws.set_cell_value("A1", "LOTE_x000D_7").unwrap();
    ws.set_cell_value("A2", "Entregado por:\r\n(Cliente)").unwrap();
    ws.set_cell_value_at(
        2,
        0,
        CellValue::Formula {
            text: "A1".into(),
            cached_value: Some(Box::new(CellValue::string("LOTE_x000D_7"))),
        },
    )
    .unwrap();

    let back = XlsxReader::read_bytes(&XlsxWriter::to_bytes(&workbook).unwrap()).unwrap();
    let ws = back.worksheet(0).unwrap();
    assert_eq!(ws.get_value("A1").unwrap().as_string(), Some("LOTE_x000D_7"));
    assert_eq!(ws.get_value("A2").unwrap().as_string(), Some("Entregado por:\r\n(Cliente)"));
    assert_eq!(ws.get_value_at(2, 0).as_string(), Some("LOTE_x000D_7"));
}
