//! Cell-related types
//!
//! - [`CellValue`] - The value stored in a cell
//! - [`CellAddress`] - A cell's location (e.g., "A1")
//! - [`CellRange`] - A rectangle of cells (e.g., "A1:B10")
//! - [`ColumnSpan`] - A run of columns (e.g., "B:C")
//! - [`CellData`] - Value plus style index

mod address;
mod storage;
mod value;

pub use address::{CellAddress, CellRange, ColumnSpan};
pub use storage::{CellData, CellStorage};
pub use value::{CellValue, SharedString};
