//! # formsheet-xlsx
//!
//! XLSX (Office Open XML) reader and writer for the formsheet worksheet model.
//!
//! The reader keeps everything a fixed-layout form depends on: cell values
//! and formulas, styles, merged regions, row heights, column widths and the
//! print layout. The writer emits a self-contained package whose bytes depend
//! only on the workbook content.

pub mod error;
pub mod reader;
pub mod writer;

mod styles;
mod xml;

pub use error::{XlsxError, XlsxResult};
pub use reader::XlsxReader;
pub use writer::XlsxWriter;

/// MIME type of an `.xlsx` package
pub const CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
