//! Common imports
//!
//! ```rust
//! use formsheet::prelude::*;
//! ```

pub use crate::{
    CellRange, CellValue, CellWriteError, FieldValue, FormData, GenerateError,
    GenerationResult, HeaderRecord, LineItem, PopulateOutcome, Result, TemplateEngine,
    TemplateLayout, TemplateReport, ValueKind, Workbook, WorkbookExt, Worksheet,
};
