//! Style snapshots
//!
//! A snapshot holds formatting by value, detached from the sheet it came
//! from, so applying it to many cells never links them together.

use formsheet_core::style::{Alignment, BorderStyle, FillStyle, FontStyle, NumberFormat, Style};
use formsheet_core::Worksheet;

/// Formatting of one cell
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct StyleSnapshot {
    pub font: FontStyle,
    pub border: BorderStyle,
    pub fill: FillStyle,
    pub number_format: NumberFormat,
    pub alignment: Alignment,
}

impl StyleSnapshot {
    pub fn capture(sheet: &Worksheet, row: u32, col: u16) -> Self {
        Self::from(sheet.style_at(row, col))
    }

    /// Overwrite the cell's formatting, keeping its value and protection
    pub fn apply(&self, sheet: &mut Worksheet, row: u32, col: u16) -> formsheet_core::Result<()> {
        let mut style = sheet.style_at(row, col).clone();
        style.font = self.font.clone();
        style.border = self.border.clone();
        style.fill = self.fill;
        style.number_format = self.number_format.clone();
        style.alignment = self.alignment;
        sheet.set_cell_style_at(row, col, &style)
    }
}

impl From<&Style> for StyleSnapshot {
    fn from(style: &Style) -> Self {
        Self {
            font: style.font.clone(),
            border: style.border.clone(),
            fill: style.fill,
            number_format: style.number_format.clone(),
            alignment: style.alignment,
        }
    }
}

/// Per-column snapshots plus the height of one reference row
#[derive(Debug, Clone, PartialEq)]
pub struct RowSnapshot {
    /// Index i holds column i
    columns: Vec<StyleSnapshot>,
    height: Option<f64>,
}

impl RowSnapshot {
    /// Capture columns `0..=last_col` of `row`
    pub fn capture(sheet: &Worksheet, row: u32, last_col: u16) -> Self {
        Self {
            columns: (0..=last_col)
                .map(|col| StyleSnapshot::capture(sheet, row, col))
                .collect(),
            height: sheet.custom_row_height(row),
        }
    }

    pub fn column(&self, col: u16) -> Option<&StyleSnapshot> {
        self.columns.get(col as usize)
    }

    pub fn height(&self) -> Option<f64> {
        self.height
    }

    /// Stamp the captured formatting and height onto another row
    pub fn apply(&self, sheet: &mut Worksheet, row: u32) -> formsheet_core::Result<()> {
        for (col, snapshot) in self.columns.iter().enumerate() {
            snapshot.apply(sheet, row, col as u16)?;
        }
        if let Some(height) = self.height {
            sheet.set_row_height(row, height);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formsheet_core::{BorderLineStyle, Color};
    use pretty_assertions::assert_eq;

    fn boxed() -> Style {
        Style::new()
            .with_border(BorderStyle::all(BorderLineStyle::Thin, Color::BLACK))
            .with_fill(FillStyle::solid(Color::rgb(0xF2, 0xF2, 0xF2)))
            .font_size(9.0)
    }

    #[test]
    fn test_row_snapshot_copies_by_value() {
        let mut sheet = Worksheet::new("S");
        sheet.set_cell_style_at(5, 1, &boxed()).unwrap();
        sheet.set_row_height(5, 21.0);

        let snapshot = RowSnapshot::capture(&sheet, 5, 3);
        assert_eq!(snapshot.height(), Some(21.0));

        snapshot.apply(&mut sheet, 9).unwrap();
        assert_eq!(sheet.style_at(9, 1), &boxed());
        assert_eq!(sheet.custom_row_height(9), Some(21.0));

        // Changing the source afterwards leaves the copy alone
        sheet.set_cell_style_at(5, 1, &Style::new().bold(true)).unwrap();
        assert_eq!(sheet.style_at(9, 1), &boxed());
    }

    #[test]
    fn test_apply_keeps_value() {
        let mut sheet = Worksheet::new("S");
        sheet.set_cell_value_at(2, 0, "kept").unwrap();
        StyleSnapshot::from(&boxed()).apply(&mut sheet, 2, 0).unwrap();

        assert_eq!(sheet.get_value_at(2, 0).as_string(), Some("kept"));
        assert_eq!(sheet.style_at(2, 0).font.size, 9.0);
    }

    #[test]
    fn test_unstyled_columns_stay_unstored() {
        let sheet = Worksheet::new("S");
        let mut target = Worksheet::new("T");
        RowSnapshot::capture(&sheet, 0, 10).apply(&mut target, 4).unwrap();
        assert_eq!(target.cell_count(), 0);
        assert_eq!(target.custom_row_height(4), None);
    }
}
