//! Engine error types
//!
//! Every [`GenerateError`] aborts the call before anything is serialized.
//! [`CellWriteError`]s are cosmetic: they are collected, logged and returned
//! next to a valid document.

use std::fmt;

use thiserror::Error;

/// Result type for template generation
pub type Result<T> = std::result::Result<T, GenerateError>;

/// Fatal failure of a generation call
#[derive(Debug, Error)]
pub enum GenerateError {
    /// The template file is missing or not a readable workbook
    #[error("failed to load template: {0}")]
    TemplateLoad(String),

    #[error("footer sentinel {sentinel:?} not found in sheet '{sheet}'")]
    FooterNotFound { sentinel: String, sheet: String },

    /// The located footer does not lie below the first data row
    #[error("inverted layout: footer row {footer_row} is not below data start row {data_start_row}")]
    CapacityComputation { data_start_row: u32, footer_row: u32 },

    #[error("row insertion failed: {0}")]
    RowInsertion(String),

    #[error("merged region bookkeeping is inconsistent: {0}")]
    MergeRelocation(#[from] MergeRelocationError),

    #[error("failed to serialize workbook: {0}")]
    Serialization(String),

    #[error("invalid layout: {0}")]
    InvalidLayout(String),
}

impl GenerateError {
    /// Structural errors mean the document cannot be produced at all.
    ///
    /// Every variant is structural; cosmetic problems are reported as
    /// [`CellWriteError`] instead.
    pub fn is_structural(&self) -> bool {
        match self {
            GenerateError::TemplateLoad(_)
            | GenerateError::FooterNotFound { .. }
            | GenerateError::CapacityComputation { .. }
            | GenerateError::RowInsertion(_)
            | GenerateError::MergeRelocation(_)
            | GenerateError::Serialization(_)
            | GenerateError::InvalidLayout(_) => true,
        }
    }
}

/// Merged regions that did not survive row insertion
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MergeRelocationError {
    /// Two regions cover the same cell
    #[error("merged regions {first} and {second} overlap")]
    Overlap { first: String, second: String },

    /// A footer region is absent from its expected position
    #[error("footer region {original} expected at {expected} after inserting {rows_inserted} row(s)")]
    MissingFooterRegion {
        original: String,
        expected: String,
        rows_inserted: u32,
    },
}

/// A single value that could not be written as requested
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellWriteError {
    /// A1 reference of the target cell
    pub cell: String,
    pub field: String,
    pub reason: String,
}

impl CellWriteError {
    pub(crate) fn new(cell: impl Into<String>, field: &str, reason: impl Into<String>) -> Self {
        Self {
            cell: cell.into(),
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for CellWriteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.cell, self.field, self.reason)
    }
}

impl std::error::Error for CellWriteError {}
