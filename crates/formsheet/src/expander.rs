//! Row expander
//!
//! Opens rows above the footer and dresses them like the last native item
//! row. [`Worksheet::insert_rows`] already moves every region below the
//! insertion point, so the footer's regions are verified at their shifted
//! position rather than merged again.

use formsheet_core::{ColumnSpan, Worksheet};
use tracing::debug;

use crate::error::{GenerateError, MergeRelocationError, Result};
use crate::merges::{ensure_merged, MergedRegionIndex};
use crate::planner::CapacityPlan;
use crate::snapshot::RowSnapshot;

/// Insert `plan.rows_to_insert` rows at the footer and return the new
/// footer row (0-based).
///
/// `reference_row` is the row whose formatting, height and single-row merges
/// are cloned; `last_col` bounds the cloned columns. `row_merges` are merged
/// on every new row in addition to the reference row's own merges.
pub fn expand(
    sheet: &mut Worksheet,
    plan: &CapacityPlan,
    reference_row: u32,
    last_col: u16,
    row_merges: &[ColumnSpan],
) -> Result<u32> {
    let at = plan.insertion_point;
    let count = plan.rows_to_insert;
    if count == 0 {
        return Ok(at);
    }

    let snapshot = RowSnapshot::capture(sheet, reference_row, last_col);
    let index = MergedRegionIndex::of(sheet);
    let footer_regions = index.at_or_below(at);
    let spans = item_row_spans(&index, reference_row, row_merges);
    debug!(
        at,
        count,
        reference_row,
        footer_regions = footer_regions.len(),
        "inserting rows above footer"
    );

    sheet
        .insert_rows(at, count)
        .map_err(|e| GenerateError::RowInsertion(e.to_string()))?;

    for row in at..at + count {
        snapshot
            .apply(sheet, row)
            .map_err(|e| GenerateError::RowInsertion(e.to_string()))?;
        for span in &spans {
            let range = span.at_row(row);
            ensure_merged(sheet, &range).map_err(|e| match e {
                formsheet_core::Error::MergedCellConflict { requested, existing } => {
                    GenerateError::MergeRelocation(MergeRelocationError::Overlap {
                        first: requested,
                        second: existing,
                    })
                }
                other => GenerateError::RowInsertion(other.to_string()),
            })?;
        }
    }

    let after = MergedRegionIndex::of(sheet);
    after.verify_shifted(&footer_regions, count)?;
    after.ensure_disjoint()?;

    Ok(at + count)
}

/// Layout merge groups plus the merges confined to the reference row
fn item_row_spans(
    index: &MergedRegionIndex,
    reference_row: u32,
    row_merges: &[ColumnSpan],
) -> Vec<ColumnSpan> {
    let mut spans: Vec<ColumnSpan> = row_merges.to_vec();
    let local = index
        .touching_rows(reference_row, reference_row)
        .filter(|r| r.start.row == reference_row && r.end.row == reference_row)
        .map(|r| ColumnSpan::new(r.start.col, r.end.col));
    for span in local {
        if !spans.iter().any(|s| s.overlaps(&span)) {
            spans.push(span);
        }
    }
    spans.sort_by_key(|s| s.first);
    spans
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::plan;
    use formsheet_core::{BorderLineStyle, BorderStyle, CellRange, Color, Style};
    use pretty_assertions::assert_eq;

    fn range(s: &str) -> CellRange {
        CellRange::parse(s).unwrap()
    }

    /// Items on rows 3..=5 (0-based 2..5), footer on row 6 (0-based 5)
    fn template() -> Worksheet {
        let mut ws = Worksheet::new("S");
        let boxed = Style::new().with_border(BorderStyle::all(BorderLineStyle::Thin, Color::Auto));
        for row in 2..5 {
            for col in 0..6 {
                ws.set_cell_style_at(row, col, &boxed).unwrap();
            }
            ws.merge_cells(&CellRange::from_indices(row, 1, row, 2)).unwrap();
            ws.set_row_height(row, 18.0);
        }
        ws.merge_cells(&CellRange::from_indices(4, 4, 4, 5)).unwrap();
        ws.set_cell_value("A6", "(1) OBLIGATORIO").unwrap();
        ws.merge_cells(&range("A6:F6")).unwrap();
        ws.set_cell_value("B8", "Entregado por:").unwrap();
        ws.merge_cells(&range("B8:C9")).unwrap();
        ws
    }

    #[test]
    fn test_no_growth_is_a_no_op() {
        let mut ws = template();
        let before = ws.clone();
        let p = plan(2, 5, 3).unwrap();
        assert_eq!(expand(&mut ws, &p, 4, 5, &[ColumnSpan::new(1, 2)]).unwrap(), 5);
        assert_eq!(ws.merged_regions(), before.merged_regions());
        assert_eq!(ws.cell_count(), before.cell_count());
    }

    #[test]
    fn test_growth_moves_footer_and_clones_reference_row() {
        let mut ws = template();
        let p = plan(2, 5, 5).unwrap();
        let footer = expand(&mut ws, &p, 4, 5, &[ColumnSpan::new(1, 2)]).unwrap();

        assert_eq!(footer, 7);
        assert_eq!(ws.get_value("A8").unwrap().as_string(), Some("(1) OBLIGATORIO"));
        for row in 5..7 {
            assert_eq!(ws.style_at(row, 0), ws.style_at(4, 0));
            assert_eq!(ws.custom_row_height(row), Some(18.0));
            assert_eq!(ws.merged_region_at(row, 1), Some(CellRange::from_indices(row, 1, row, 2)));
            // Single-row merge of the reference row is cloned too
            assert_eq!(ws.merged_region_at(row, 4), Some(CellRange::from_indices(row, 4, row, 5)));
        }
        assert!(ws.merged_regions().contains(&range("A8:F8")));
        assert!(ws.merged_regions().contains(&range("B10:C11")));
    }

    #[test]
    fn test_conflicting_row_merge_is_fatal() {
        let mut ws = template();
        let p = plan(2, 5, 4).unwrap();
        // C:D collides with the cloned B:C merge of the reference row
        let err = expand(&mut ws, &p, 4, 5, &[ColumnSpan::new(1, 2), ColumnSpan::new(2, 3)]);
        assert!(matches!(
            err,
            Err(GenerateError::MergeRelocation(MergeRelocationError::Overlap { .. }))
        ));
    }

    #[test]
    fn test_item_row_spans_prefer_layout_groups() {
        let ws = template();
        let index = MergedRegionIndex::of(&ws);
        let spans = item_row_spans(&index, 4, &[ColumnSpan::new(1, 2)]);
        assert_eq!(spans, vec![ColumnSpan::new(1, 2), ColumnSpan::new(4, 5)]);
    }
}
