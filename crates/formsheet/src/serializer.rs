//! Template loading and workbook serialization

use std::path::Path;

use formsheet_core::Workbook;
use formsheet_xlsx::{XlsxReader, XlsxWriter};
use tracing::debug;

use crate::error::{GenerateError, Result};

/// Load a template into a workbook owned by the caller
pub fn load_template<P: AsRef<Path>>(path: P) -> Result<Workbook> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(GenerateError::TemplateLoad(format!(
            "{} does not exist or is not a file",
            path.display()
        )));
    }
    XlsxReader::read_file(path)
        .map_err(|e| GenerateError::TemplateLoad(format!("{}: {}", path.display(), e)))
}

pub fn load_template_bytes(bytes: &[u8]) -> Result<Workbook> {
    XlsxReader::read_bytes(bytes).map_err(|e| GenerateError::TemplateLoad(e.to_string()))
}

/// Flush the workbook to an in-memory `.xlsx` package
pub fn serialize(workbook: &Workbook) -> Result<Vec<u8>> {
    let bytes =
        XlsxWriter::to_bytes(workbook).map_err(|e| GenerateError::Serialization(e.to_string()))?;
    debug!(bytes = bytes.len(), "workbook serialized");
    Ok(bytes)
}
