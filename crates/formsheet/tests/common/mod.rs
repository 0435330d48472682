//! Shared fixtures: an in-memory copy of the reception form
#![allow(dead_code)]

use formsheet::{LineItem, SampleItem, TemplateLayout};
use formsheet_core::{
    Alignment, BorderLineStyle, BorderStyle, CellRange, Color, FillStyle, HorizontalAlignment,
    Style, VerticalAlignment, Workbook,
};
use formsheet_xlsx::XlsxWriter;

/// First item row as printed (1-based)
pub const DATA_START_ROW: u32 = 26;
/// Footer sentinel row as printed (1-based)
pub const FOOTER_ROW: u32 = 43;
pub const CAPACITY: u32 = FOOTER_ROW - DATA_START_ROW;
pub const SENTINEL: &str = "(1) OBLIGATORIO";

/// Footer merges of the template
pub const FOOTER_MERGES: [&str; 4] = ["A43:K43", "A44:K46", "B48:E48", "G48:K48"];

pub fn range(s: &str) -> CellRange {
    CellRange::parse(s).unwrap()
}

pub fn item_style() -> Style {
    Style::new()
        .font_size(9.0)
        .with_border(BorderStyle::all(BorderLineStyle::Thin, Color::BLACK))
        .with_alignment(Alignment {
            horizontal: HorizontalAlignment::Center,
            vertical: VerticalAlignment::Center,
            ..Alignment::default()
        })
}

/// Header band, 17 item rows (26-42) and a footer band starting at row 43
pub fn reception_template() -> Workbook {
    reception_template_with_sentinel(SENTINEL)
}

pub fn reception_template_with_sentinel(sentinel: &str) -> Workbook {
    let mut workbook = Workbook::empty();
    workbook.add_worksheet_with_name("RECEPCION").unwrap();
    let ws = workbook.worksheet_mut(0).unwrap();

    ws.set_cell_value("A1", "RECEPCIÓN DE MUESTRAS CILÍNDRICAS DE CONCRETO").unwrap();
    ws.set_cell_style("A1", &Style::new().bold(true).font_size(14.0)).unwrap();
    ws.merge_cells(&range("A1:K1")).unwrap();

    let label = Style::new()
        .bold(true)
        .with_fill(FillStyle::solid(Color::rgb(0xD9, 0xE1, 0xF2)));
    for (cell, text) in [
        ("B4", "RECEPCIÓN N°:"),
        ("F4", "FECHA:"),
        ("B5", "COTIZACIÓN N°:"),
        ("F5", "OT N°:"),
        ("B12", "CLIENTE:"),
        ("B21", "EMISIÓN FÍSICA"),
        ("B22", "EMISIÓN DIGITAL"),
    ] {
        ws.set_cell_value(cell, text).unwrap();
        ws.set_cell_style(cell, &label).unwrap();
    }
    for merge in ["D4:E4", "G4:K4", "D5:E5", "G5:K5", "D12:K12"] {
        ws.merge_cells(&range(merge)).unwrap();
    }

    for (col, title) in [
        "N°", "CÓDIGO", "", "IDENTIFICACIÓN", "ESTRUCTURA", "F'C", "FECHA MOLDEO",
        "HORA", "EDAD", "FECHA ROTURA", "DENSIDAD",
    ]
    .iter()
    .enumerate()
    {
        ws.set_cell_value_at(24, col as u16, *title).unwrap();
        ws.set_cell_style_at(24, col as u16, &item_style().bold(true)).unwrap();
    }
    ws.merge_cells(&range("B25:C25")).unwrap();

    for row in (DATA_START_ROW - 1)..(FOOTER_ROW - 1) {
        for col in 0..11 {
            ws.set_cell_style_at(row, col, &item_style()).unwrap();
        }
        ws.merge_cells(&CellRange::from_indices(row, 1, row, 2)).unwrap();
        ws.set_row_height(row, 20.0);
    }

    ws.set_cell_value("A43", format!("{}: para edades de rotura menores a 3 días", sentinel))
        .unwrap();
    ws.set_cell_value("A44", "Observaciones generales del laboratorio").unwrap();
    ws.set_cell_value("B48", "Entregado por:").unwrap();
    ws.set_cell_value("G48", "Recibido por:").unwrap();
    for merge in ["A43:K43", "A44:K46", "B48:E48", "G48:K48"] {
        ws.merge_cells(&range(merge)).unwrap();
    }
    ws.set_row_height(47, 28.0);

    ws.set_column_width(0, 5.0);
    ws.set_column_width(3, 24.0);
    workbook
}

pub fn template_bytes(workbook: &Workbook) -> Vec<u8> {
    XlsxWriter::to_bytes(workbook).unwrap()
}

/// The shipped reception layout
pub fn layout() -> TemplateLayout {
    TemplateLayout::from_file(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/../../layouts/recepcion.json"
    ))
    .unwrap()
}

pub fn sample(i: usize) -> LineItem {
    LineItem::from(&SampleItem {
        codigo_muestra: format!("{:03}", i + 1),
        identificacion_muestra: format!("Probeta {}", i + 1),
        estructura: "Zapata".into(),
        fc_kg_cm2: Some(210.0),
        fecha_moldeo: Some("2024-03-05".into()),
        hora_moldeo: Some("08:30".into()),
        edad: Some(7),
        fecha_rotura: Some("2024-03-12".into()),
        requiere_densidad: i % 2 == 0,
    })
}

pub fn samples(n: usize) -> Vec<LineItem> {
    (0..n).map(sample).collect()
}
