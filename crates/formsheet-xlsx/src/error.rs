//! XLSX error types

use thiserror::Error;

/// Result type for XLSX operations
pub type XlsxResult<T> = std::result::Result<T, XlsxError>;

/// Errors that can occur while reading or writing a package
#[derive(Debug, Error)]
pub enum XlsxError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// The archive is not a spreadsheet package
    #[error("Invalid XLSX format: {0}")]
    InvalidFormat(String),

    /// A part referenced by the package is absent
    #[error("Missing required part: {0}")]
    MissingPart(String),

    /// A part is present but its content is malformed
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Worksheet model error: {0}")]
    Core(#[from] formsheet_core::Error),
}
