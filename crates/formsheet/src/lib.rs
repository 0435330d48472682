//! # formsheet
//!
//! Populates fixed-layout spreadsheet forms with a variable number of line
//! items. When the items outnumber the rows printed on the form, rows are
//! opened above the footer, styled like the last native item row, and every
//! merged region of the footer moves down with it.
//!
//! ## Features
//!
//! - Footer located by a sentinel text, never by a hard-coded row
//! - Per-form [`TemplateLayout`] loaded from JSON
//! - Value kinds for the form's vocabulary: verbatim codes, `SI`/`NO`,
//!   `DD/MM/YYYY` dates and `HH:MM` times
//! - Fatal structural errors versus per-cell [`CellWriteError`]s
//! - [`inspect`] for checking a template before use
//!
//! ## Example
//!
//! ```rust
//! use formsheet::prelude::*;
//!
//! // A tiny form: items on rows 2-3, footer on row 4
//! let mut workbook = Workbook::new();
//! let sheet = workbook.worksheet_mut(0).unwrap();
//! sheet.set_cell_value("A1", "N°").unwrap();
//! sheet.set_cell_value("A4", "(1) OBLIGATORIO").unwrap();
//! sheet.merge_cells(&CellRange::parse("A4:C4").unwrap()).unwrap();
//!
//! let layout = TemplateLayout::from_json(r#"{
//!     "name": "demo",
//!     "data_start_row": 2,
//!     "footer_sentinel": "(1) OBLIGATORIO",
//!     "columns": [
//!         {"column": "A", "field": "item", "kind": "sequence"},
//!         {"column": "B", "field": "codigo", "kind": "numeric_text"}
//!     ]
//! }"#).unwrap();
//! let engine = TemplateEngine::new(&layout).unwrap();
//!
//! let items: Vec<LineItem> = ["001", "002", "003"]
//!     .iter()
//!     .map(|code| LineItem::new().with("codigo", *code))
//!     .collect();
//! let outcome = engine.populate(&mut workbook, &HeaderRecord::new(), &items).unwrap();
//!
//! assert_eq!(outcome.rows_inserted, 1);
//! let sheet = workbook.worksheet(0).unwrap();
//! assert_eq!(sheet.get_value("B4").unwrap().as_string(), Some("003"));
//! assert_eq!(sheet.merged_regions()[0].to_string(), "A5:C5");
//! ```

pub mod engine;
pub mod error;
pub mod expander;
pub mod footer;
pub mod inspect;
pub mod layout;
pub mod merges;
pub mod planner;
pub mod prelude;
pub mod record;
pub mod serializer;
pub mod snapshot;
pub mod writer;

pub use engine::{GenerationResult, PopulateOutcome, TemplateEngine};
pub use error::{CellWriteError, GenerateError, MergeRelocationError, Result};
pub use inspect::{inspect, inspect_sheet, Finding, Severity, TemplateReport};
pub use layout::{
    ColumnBinding, FooterFixup, FooterLabel, HeaderBinding, ResolvedLayout, TemplateLayout,
    ValueKind,
};
pub use record::{FieldValue, FormData, HeaderRecord, LineItem, ReceptionHeader, SampleItem};
pub use snapshot::{RowSnapshot, StyleSnapshot};

pub use formsheet_core::{
    CellAddress, CellRange, CellValue, ColumnSpan, Style, Workbook, Worksheet, MAX_ROWS,
};
pub use formsheet_xlsx::{XlsxError, XlsxReader, XlsxWriter, CONTENT_TYPE};

use std::path::Path;

/// File I/O for [`Workbook`] in terms of generation errors
pub trait WorkbookExt {
    /// Open an `.xlsx` file
    fn open<P: AsRef<Path>>(path: P) -> Result<Workbook>;

    /// Save as an `.xlsx` file
    fn save<P: AsRef<Path>>(&self, path: P) -> Result<()>;
}

impl WorkbookExt for Workbook {
    fn open<P: AsRef<Path>>(path: P) -> Result<Workbook> {
        serializer::load_template(path)
    }

    fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        XlsxWriter::write_file(self, path)
            .map_err(|e| GenerateError::Serialization(format!("{}: {}", path.display(), e)))
    }
}
