//! Footer locator

use formsheet_core::Worksheet;

use crate::error::{GenerateError, Result};

/// Row (0-based) of the first cell in the leading `scan_columns` columns
/// whose text contains `sentinel`, scanning top to bottom.
pub fn locate_footer(sheet: &Worksheet, sentinel: &str, scan_columns: u16) -> Result<u32> {
    for row in sheet.row_indices() {
        let hit = sheet
            .iter_row(row)
            .take_while(|(col, _)| *col < scan_columns)
            .any(|(_, cell)| cell.value.as_string().is_some_and(|s| s.contains(sentinel)));
        if hit {
            return Ok(row);
        }
    }

    Err(GenerateError::FooterNotFound {
        sentinel: sentinel.to_string(),
        sheet: sheet.name().to_string(),
    })
}
