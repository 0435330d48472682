//! Capacity planner

use crate::error::{GenerateError, Result};

/// Where and how many rows to open above the footer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacityPlan {
    /// Item rows the template holds natively
    pub capacity: u32,
    pub rows_to_insert: u32,
    /// Row (0-based) the new rows are inserted before: the footer row
    pub insertion_point: u32,
}

impl CapacityPlan {
    pub fn needs_growth(&self) -> bool {
        self.rows_to_insert > 0
    }
}

/// Plan the growth of the item table; all rows are 0-based.
pub fn plan(data_start: u32, footer_row: u32, item_count: usize) -> Result<CapacityPlan> {
    if footer_row <= data_start {
        return Err(GenerateError::CapacityComputation {
            data_start_row: data_start + 1,
            footer_row: footer_row + 1,
        });
    }

    let capacity = footer_row - data_start;
    let item_count = u32::try_from(item_count).map_err(|_| {
        GenerateError::RowInsertion(format!("{} items exceed the sheet's row limit", item_count))
    })?;

    Ok(CapacityPlan {
        capacity,
        rows_to_insert: item_count.saturating_sub(capacity),
        insertion_point: footer_row,
    })
}
