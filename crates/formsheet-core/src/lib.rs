//! # formsheet-core
//!
//! In-memory worksheet model used by the formsheet template engine.
//!
//! - [`CellValue`] - Cell values (numbers, strings, booleans, preserved formulas)
//! - [`CellAddress`], [`CellRange`], [`ColumnSpan`] - Addressing
//! - [`Style`] - Cell formatting (fonts, fills, borders, alignment, number formats)
//! - [`Workbook`], [`Worksheet`] - The document structures
//! - [`Worksheet::insert_rows`] - The structural edit everything else relies on
//!
//! ## Example
//!
//! ```rust
//! use formsheet_core::{CellRange, Workbook};
//!
//! let mut workbook = Workbook::new();
//! let sheet = workbook.worksheet_mut(0).unwrap();
//!
//! sheet.set_cell_value("A5", "FOOTER").unwrap();
//! sheet.merge_cells(&CellRange::parse("A5:D5").unwrap()).unwrap();
//!
//! // Open two rows above the footer; the footer and its merge move down
//! sheet.insert_rows(4, 2).unwrap();
//! assert_eq!(sheet.get_value("A7").unwrap().as_string(), Some("FOOTER"));
//! assert_eq!(sheet.merged_regions()[0].to_string(), "A7:D7");
//! ```

pub mod cell;
pub mod error;
pub mod page;
pub mod reference;
pub mod style;
pub mod workbook;
pub mod worksheet;

pub use cell::{CellAddress, CellData, CellRange, CellValue, ColumnSpan, SharedString};
pub use error::{Error, Result};
pub use page::{PageMargins, PageOrientation, PageSetup};
pub use workbook::Workbook;
pub use worksheet::Worksheet;

pub use style::{
    Alignment, BorderEdge, BorderLineStyle, BorderStyle, Color, FillStyle, FontStyle,
    HorizontalAlignment, NumberFormat, PatternType, Protection, Style, StylePool, Underline,
    VerticalAlignment,
};

/// Maximum number of rows in a worksheet
pub const MAX_ROWS: u32 = 1_048_576;

/// Maximum number of columns in a worksheet
pub const MAX_COLS: u16 = 16_384;

/// Maximum length of a sheet name
pub const MAX_SHEET_NAME_LEN: usize = 31;
