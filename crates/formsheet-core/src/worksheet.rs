//! Worksheet type

use std::collections::BTreeMap;

use crate::cell::{CellAddress, CellData, CellRange, CellStorage, CellValue};
use crate::error::{Error, Result};
use crate::page::{PageMargins, PageSetup};
use crate::style::{Style, StylePool};
use crate::{MAX_COLS, MAX_ROWS};

/// A worksheet (single sheet in a workbook)
#[derive(Debug, Clone)]
pub struct Worksheet {
    name: String,
    cells: CellStorage,
    visible: bool,
    page_setup: PageSetup,
    page_margins: Option<PageMargins>,
}

impl Worksheet {
    /// Create a new worksheet with the given name
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            cells: CellStorage::new(),
            visible: true,
            page_setup: PageSetup::default(),
            page_margins: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name<S: Into<String>>(&mut self, name: S) {
        self.name = name.into();
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    // === Cell Access ===

    /// Get a cell by address string (e.g., "A1")
    pub fn cell(&self, address: &str) -> Result<Option<&CellData>> {
        let addr = CellAddress::parse(address)?;
        Ok(self.cells.get(addr.row, addr.col))
    }

    pub fn cell_at(&self, row: u32, col: u16) -> Option<&CellData> {
        self.cells.get(row, col)
    }

    /// Get cell value (convenience method)
    pub fn get_value(&self, address: &str) -> Result<CellValue> {
        let addr = CellAddress::parse(address)?;
        Ok(self.get_value_at(addr.row, addr.col))
    }

    pub fn get_value_at(&self, row: u32, col: u16) -> CellValue {
        self.cells
            .get(row, col)
            .map(|c| c.value.clone())
            .unwrap_or(CellValue::Empty)
    }

    /// Style index of a cell, 0 when the cell does not exist
    pub fn cell_style_index_at(&self, row: u32, col: u16) -> u32 {
        self.cells.get(row, col).map(|c| c.style_index).unwrap_or(0)
    }

    pub fn style_by_index(&self, style_index: u32) -> Option<&Style> {
        self.cells.style_pool().get(style_index)
    }

    /// Effective style of a cell (the default style for missing cells)
    pub fn style_at(&self, row: u32, col: u16) -> &Style {
        self.cells
            .style_pool()
            .resolve(self.cell_style_index_at(row, col))
    }

    /// Non-default style of a cell, if any
    pub fn cell_style_at(&self, row: u32, col: u16) -> Option<&Style> {
        match self.cell_style_index_at(row, col) {
            0 => None,
            idx => self.style_by_index(idx),
        }
    }

    /// Styles referenced by this sheet's cells
    pub fn style_pool(&self) -> &StylePool {
        self.cells.style_pool()
    }

    // === Cell Modification ===

    pub fn set_cell_value<V: Into<CellValue>>(&mut self, address: &str, value: V) -> Result<()> {
        let addr = CellAddress::parse(address)?;
        self.set_cell_value_at(addr.row, addr.col, value)
    }

    /// Set a cell value, keeping the cell's style
    pub fn set_cell_value_at<V: Into<CellValue>>(
        &mut self,
        row: u32,
        col: u16,
        value: V,
    ) -> Result<()> {
        self.validate_cell_position(row, col)?;
        self.cells.set_value(row, col, value.into());
        Ok(())
    }

    /// Set a formula; a leading `=` is accepted and dropped
    pub fn set_cell_formula_at(&mut self, row: u32, col: u16, formula: &str) -> Result<()> {
        self.set_cell_value_at(row, col, CellValue::formula(formula))
    }

    pub fn set_cell_style(&mut self, address: &str, style: &Style) -> Result<()> {
        let addr = CellAddress::parse(address)?;
        self.set_cell_style_at(addr.row, addr.col, style)
    }

    /// Set a cell style, keeping the cell's value
    pub fn set_cell_style_at(&mut self, row: u32, col: u16, style: &Style) -> Result<()> {
        self.validate_cell_position(row, col)?;
        let style_index = self.cells.style_pool_mut().get_or_insert(style.clone());
        self.cells.set_style(row, col, style_index);
        Ok(())
    }

    pub fn clear_cell_at(&mut self, row: u32, col: u16) {
        self.cells.remove(row, col);
    }

    // === Range Operations ===

    /// Bounds of all stored cells
    pub fn used_range(&self) -> Option<CellRange> {
        self.cells
            .used_bounds()
            .map(|(min_row, min_col, max_row, max_col)| {
                CellRange::from_indices(min_row, min_col, max_row, max_col)
            })
    }

    /// Last row index holding anything that moves on insertion
    pub fn last_occupied_row(&self) -> Option<u32> {
        let cells = self.cells.used_bounds().map(|(_, _, max_row, _)| max_row);
        let merges = self.cells.merged_regions().iter().map(|r| r.end.row).max();
        let heights = self.cells.custom_row_heights().keys().next_back().copied();
        let hidden = self.cells.hidden_rows().keys().next_back().copied();
        [cells, merges, heights, hidden].into_iter().flatten().max()
    }

    // === Row Insertion ===

    /// Insert `count` blank rows before row `at`, shifting everything below.
    ///
    /// See [`CellStorage::insert_rows`] for how merged regions and formulas
    /// follow the move.
    pub fn insert_rows(&mut self, at: u32, count: u32) -> Result<()> {
        if at >= MAX_ROWS {
            return Err(Error::RowOutOfBounds(at, MAX_ROWS - 1));
        }
        if let Some(last) = self.last_occupied_row().filter(|last| *last >= at) {
            let new_last = last.saturating_add(count);
            if new_last >= MAX_ROWS {
                return Err(Error::RowOutOfBounds(new_last, MAX_ROWS - 1));
            }
        }
        self.cells.insert_rows(at, count, &self.name);
        Ok(())
    }

    // === Row/Column Operations ===

    pub fn row_height(&self, row: u32) -> f64 {
        self.cells.row_height(row)
    }

    /// Height pinned for a row, if any
    pub fn custom_row_height(&self, row: u32) -> Option<f64> {
        self.cells.custom_row_height(row)
    }

    pub fn set_row_height(&mut self, row: u32, height: f64) {
        self.cells.set_row_height(row, height);
    }

    pub fn clear_row_height(&mut self, row: u32) {
        self.cells.clear_row_height(row);
    }

    pub fn default_row_height(&self) -> f64 {
        self.cells.default_row_height()
    }

    pub fn set_default_row_height(&mut self, height: f64) {
        self.cells.set_default_row_height(height);
    }

    pub fn is_row_hidden(&self, row: u32) -> bool {
        self.cells.is_row_hidden(row)
    }

    pub fn set_row_hidden(&mut self, row: u32, hidden: bool) {
        self.cells.set_row_hidden(row, hidden);
    }

    pub fn column_width(&self, col: u16) -> f64 {
        self.cells.column_width(col)
    }

    pub fn set_column_width(&mut self, col: u16, width: f64) {
        self.cells.set_column_width(col, width);
    }

    pub fn default_column_width(&self) -> f64 {
        self.cells.default_column_width()
    }

    pub fn set_default_column_width(&mut self, width: f64) {
        self.cells.set_default_column_width(width);
    }

    pub fn is_column_hidden(&self, col: u16) -> bool {
        self.cells.is_column_hidden(col)
    }

    pub fn set_column_hidden(&mut self, col: u16, hidden: bool) {
        self.cells.set_column_hidden(col, hidden);
    }

    pub fn custom_row_heights(&self) -> &BTreeMap<u32, f64> {
        self.cells.custom_row_heights()
    }

    pub fn hidden_rows(&self) -> &BTreeMap<u32, bool> {
        self.cells.hidden_rows()
    }

    pub fn custom_column_widths(&self) -> &BTreeMap<u16, f64> {
        self.cells.custom_column_widths()
    }

    pub fn hidden_columns(&self) -> &BTreeMap<u16, bool> {
        self.cells.hidden_columns()
    }

    // === Merged Cells ===

    pub fn merged_regions(&self) -> &[CellRange] {
        self.cells.merged_regions()
    }

    /// The merged region covering a cell, if any
    pub fn merged_region_at(&self, row: u32, col: u16) -> Option<CellRange> {
        self.cells.merged_region_at(row, col).copied()
    }

    /// Merge a rectangle.
    ///
    /// Merging the exact rectangle of an existing region is a no-op; any
    /// other overlap is [`Error::MergedCellConflict`].
    pub fn merge_cells(&mut self, range: &CellRange) -> Result<()> {
        if range.is_single_cell() {
            return Err(Error::InvalidRange(format!(
                "{} is a single cell and cannot be merged",
                range
            )));
        }
        for existing in self.cells.merged_regions() {
            if existing == range {
                return Ok(());
            }
            if range.overlaps(existing) {
                return Err(Error::MergedCellConflict {
                    requested: range.to_string(),
                    existing: existing.to_string(),
                });
            }
        }
        self.cells.add_merged_region(*range);
        Ok(())
    }

    /// Record a region exactly as a file declares it.
    ///
    /// Unlike [`merge_cells`](Self::merge_cells) an overlap with an existing
    /// region is kept, so that a damaged template can be diagnosed instead of
    /// silently repaired. Exact duplicates are still collapsed.
    pub fn push_merged_region(&mut self, range: &CellRange) -> Result<()> {
        if range.is_single_cell() {
            return Err(Error::InvalidRange(format!(
                "{} is a single cell and cannot be merged",
                range
            )));
        }
        if !self.cells.merged_regions().contains(range) {
            self.cells.add_merged_region(*range);
        }
        Ok(())
    }

    /// Remove a region with exactly this rectangle; false if none matched
    pub fn unmerge_cells(&mut self, range: &CellRange) -> bool {
        let found = self
            .cells
            .merged_regions()
            .iter()
            .position(|existing| existing == range);

        match found {
            Some(i) => self.cells.remove_merged_region(i).is_some(),
            None => false,
        }
    }

    // === Page Layout ===

    pub fn page_setup(&self) -> &PageSetup {
        &self.page_setup
    }

    pub fn page_setup_mut(&mut self) -> &mut PageSetup {
        &mut self.page_setup
    }

    pub fn page_margins(&self) -> Option<&PageMargins> {
        self.page_margins.as_ref()
    }

    pub fn set_page_margins(&mut self, margins: Option<PageMargins>) {
        self.page_margins = margins;
    }

    // === Internal ===

    fn validate_cell_position(&self, row: u32, col: u16) -> Result<()> {
        if row >= MAX_ROWS {
            return Err(Error::RowOutOfBounds(row, MAX_ROWS - 1));
        }
        if col >= MAX_COLS {
            return Err(Error::ColumnOutOfBounds(col, MAX_COLS - 1));
        }
        Ok(())
    }

    pub fn cell_count(&self) -> usize {
        self.cells.cell_count()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Iterate over all stored cells in row-major order
    pub fn iter_cells(&self) -> impl Iterator<Item = (u32, u16, &CellData)> {
        self.cells.iter()
    }

    /// Iterate over the stored cells of one row
    pub fn iter_row(&self, row: u32) -> impl Iterator<Item = (u16, &CellData)> {
        self.cells.iter_row(row)
    }

    /// Row indices that hold at least one cell
    pub fn row_indices(&self) -> impl Iterator<Item = u32> + '_ {
        self.cells.row_indices()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::{BorderLineStyle, BorderStyle, Color};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_new_worksheet() {
        let ws = Worksheet::new("Recepcion");
        assert_eq!(ws.name(), "Recepcion");
        assert!(ws.is_visible());
        assert!(ws.is_empty());
        assert!(ws.page_setup().is_empty());
    }

    #[test]
    fn test_set_cell_values() {
        let mut ws = Worksheet::new("Test");

        ws.set_cell_value("A1", "Hello").unwrap();
        ws.set_cell_value("B1", 42.0).unwrap();
        ws.set_cell_value("C1", true).unwrap();

        assert_eq!(ws.get_value("A1").unwrap().as_string(), Some("Hello"));
        assert_eq!(ws.get_value("B1").unwrap().as_number(), Some(42.0));
        assert_eq!(ws.get_value("C1").unwrap().as_bool(), Some(true));
    }

    #[test]
    fn test_value_write_keeps_style() {
        let mut ws = Worksheet::new("Test");
        let boxed = Style::new().with_border(BorderStyle::all(BorderLineStyle::Thin, Color::Auto));
        ws.set_cell_style("D26", &boxed).unwrap();
        ws.set_cell_value("D26", "Losa").unwrap();

        assert_eq!(ws.cell_style_at(25, 3), Some(&boxed));
        assert_eq!(ws.get_value_at(25, 3).as_string(), Some("Losa"));
        assert_eq!(ws.style_at(0, 0), &Style::default());
    }

    #[test]
    fn test_used_range() {
        let mut ws = Worksheet::new("Test");
        assert!(ws.used_range().is_none());

        ws.set_cell_value_at(5, 3, "A").unwrap();
        ws.set_cell_value_at(10, 7, "B").unwrap();

        assert_eq!(ws.used_range(), Some(CellRange::from_indices(5, 3, 10, 7)));
    }

    #[test]
    fn test_merge_cells() {
        let mut ws = Worksheet::new("Test");

        let range = CellRange::parse("A1:C3").unwrap();
        ws.merge_cells(&range).unwrap();
        ws.merge_cells(&range).unwrap();
        assert_eq!(ws.merged_regions().len(), 1);

        let overlapping = CellRange::parse("B2:D4").unwrap();
        assert!(matches!(
            ws.merge_cells(&overlapping),
            Err(Error::MergedCellConflict { .. })
        ));
        assert!(ws.merge_cells(&CellRange::parse("E5").unwrap()).is_err());

        assert_eq!(ws.merged_region_at(1, 1), Some(range));
        assert_eq!(ws.merged_region_at(3, 0), None);

        assert!(ws.unmerge_cells(&range));
        assert!(!ws.unmerge_cells(&range));
    }

    #[test]
    fn test_push_merged_region_keeps_overlaps() {
        let mut ws = Worksheet::new("Test");
        let footer = CellRange::parse("A43:K43").unwrap();
        let stray = CellRange::parse("J42:K43").unwrap();

        ws.push_merged_region(&footer).unwrap();
        ws.push_merged_region(&footer).unwrap();
        ws.push_merged_region(&stray).unwrap();
        assert_eq!(ws.merged_regions(), &[footer, stray]);
        assert!(ws.push_merged_region(&CellRange::parse("B4").unwrap()).is_err());
    }

    #[test]
    fn test_insert_rows_moves_footer_block() {
        let mut ws = Worksheet::new("Test");
        ws.set_cell_value("A3", "item").unwrap();
        ws.set_cell_value("A5", "FOOTER").unwrap();
        ws.merge_cells(&CellRange::parse("A5:K5").unwrap()).unwrap();
        ws.set_row_height(4, 35.0);

        ws.insert_rows(4, 2).unwrap();

        assert_eq!(ws.get_value("A3").unwrap().as_string(), Some("item"));
        assert!(ws.get_value("A5").unwrap().is_empty());
        assert_eq!(ws.get_value("A7").unwrap().as_string(), Some("FOOTER"));
        assert_eq!(ws.merged_regions(), &[CellRange::parse("A7:K7").unwrap()]);
        assert_eq!(ws.custom_row_height(6), Some(35.0));
        assert_eq!(ws.custom_row_height(4), None);
    }

    #[test]
    fn test_insert_rows_bounds() {
        let mut ws = Worksheet::new("Test");
        ws.set_cell_value_at(MAX_ROWS - 2, 0, "last").unwrap();

        assert!(matches!(
            ws.insert_rows(10, 5),
            Err(Error::RowOutOfBounds(_, _))
        ));
        assert!(ws.insert_rows(MAX_ROWS, 1).is_err());
        // Inserting below the last occupied row moves nothing
        ws.insert_rows(MAX_ROWS - 1, 1).unwrap();
        assert_eq!(ws.get_value_at(MAX_ROWS - 2, 0).as_string(), Some("last"));
    }
}
