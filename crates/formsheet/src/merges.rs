//! Merged-region index
//!
//! Classifies a sheet's merged regions against the item table and provides
//! the checks and edits the expander and the data writer rely on.

use formsheet_core::{CellRange, Worksheet};

use crate::error::MergeRelocationError;

/// Where a merged region sits relative to the item table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionClass {
    /// Entirely above the first item row
    Header,
    /// Within the item rows
    Items,
    /// Starts at or below the footer row
    Footer,
    /// Crosses a block boundary
    Straddling,
}

/// Snapshot of a sheet's merged regions
#[derive(Debug, Clone, PartialEq)]
pub struct MergedRegionIndex {
    regions: Vec<CellRange>,
}

impl MergedRegionIndex {
    pub fn of(sheet: &Worksheet) -> Self {
        Self {
            regions: sheet.merged_regions().to_vec(),
        }
    }

    pub fn regions(&self) -> &[CellRange] {
        &self.regions
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Classify a region for an item table spanning rows `data_start..footer_row`
    pub fn classify(region: &CellRange, data_start: u32, footer_row: u32) -> RegionClass {
        if region.end.row < data_start {
            RegionClass::Header
        } else if region.start.row >= footer_row {
            RegionClass::Footer
        } else if region.start.row >= data_start && region.end.row < footer_row {
            RegionClass::Items
        } else {
            RegionClass::Straddling
        }
    }

    /// Regions whose first row is at or below `row`
    pub fn at_or_below(&self, row: u32) -> Vec<CellRange> {
        self.regions
            .iter()
            .filter(|r| r.start.row >= row)
            .copied()
            .collect()
    }

    /// Regions touching any row of `first..=last`
    pub fn touching_rows(&self, first: u32, last: u32) -> impl Iterator<Item = &CellRange> {
        self.regions.iter().filter(move |r| r.touches_rows(first, last))
    }

    /// First pair of regions covering a common cell
    pub fn find_overlap(&self) -> Option<(CellRange, CellRange)> {
        let mut sorted = self.regions.clone();
        sorted.sort_by_key(|r| (r.start.row, r.start.col));
        for (i, a) in sorted.iter().enumerate() {
            for b in &sorted[i + 1..] {
                // Sorted by first row: nothing later can reach back into `a`
                if b.start.row > a.end.row {
                    break;
                }
                if a.overlaps(b) {
                    return Some((*a, *b));
                }
            }
        }
        None
    }

    /// Fail on the first overlapping pair
    pub fn ensure_disjoint(&self) -> Result<(), MergeRelocationError> {
        match self.find_overlap() {
            Some((first, second)) => Err(MergeRelocationError::Overlap {
                first: first.to_string(),
                second: second.to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Check that each of `originals` now exists `offset` rows lower
    pub fn verify_shifted(
        &self,
        originals: &[CellRange],
        offset: u32,
    ) -> Result<(), MergeRelocationError> {
        for original in originals {
            let expected = original.offset_rows(offset);
            if !self.regions.contains(&expected) {
                return Err(MergeRelocationError::MissingFooterRegion {
                    original: original.to_string(),
                    expected: expected.to_string(),
                    rows_inserted: offset,
                });
            }
        }
        Ok(())
    }
}

/// Merge `range` unless that exact region already exists
pub fn ensure_merged(sheet: &mut Worksheet, range: &CellRange) -> formsheet_core::Result<()> {
    sheet.merge_cells(range)
}

/// Remove every region touching `range`; returns what was removed
pub fn unmerge_touching(sheet: &mut Worksheet, range: &CellRange) -> Vec<CellRange> {
    let hits: Vec<CellRange> = sheet
        .merged_regions()
        .iter()
        .filter(|r| r.overlaps(range))
        .copied()
        .collect();
    for region in &hits {
        sheet.unmerge_cells(region);
    }
    hits
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn range(s: &str) -> CellRange {
        CellRange::parse(s).unwrap()
    }

    fn sheet(merges: &[&str]) -> Worksheet {
        let mut ws = Worksheet::new("S");
        for m in merges {
            ws.merge_cells(&range(m)).unwrap();
        }
        ws
    }

    #[test]
    fn test_classify() {
        // Item rows 26..=42 (0-based 25..42), footer at 0-based 42
        assert_eq!(MergedRegionIndex::classify(&range("A1:K1"), 25, 42), RegionClass::Header);
        assert_eq!(MergedRegionIndex::classify(&range("B26:C26"), 25, 42), RegionClass::Items);
        assert_eq!(MergedRegionIndex::classify(&range("A43:K43"), 25, 42), RegionClass::Footer);
        assert_eq!(MergedRegionIndex::classify(&range("A42:A44"), 25, 42), RegionClass::Straddling);
    }

    #[test]
    fn test_at_or_below_and_touching() {
        let index = MergedRegionIndex::of(&sheet(&["A1:K1", "B26:C26", "A43:K43", "B48:E49"]));
        assert_eq!(index.at_or_below(42), vec![range("A43:K43"), range("B48:E49")]);
        assert_eq!(index.touching_rows(48, 48).count(), 1);
        assert_eq!(index.len(), 4);
    }

    #[test]
    fn test_find_overlap() {
        let index = MergedRegionIndex {
            regions: vec![range("A1:C1"), range("A5:B6"), range("B6:D6")],
        };
        assert_eq!(index.find_overlap(), Some((range("A5:B6"), range("B6:D6"))));
        assert!(matches!(
            index.ensure_disjoint(),
            Err(MergeRelocationError::Overlap { .. })
        ));

        let clean = MergedRegionIndex::of(&sheet(&["A1:C1", "A2:C2"]));
        assert_eq!(clean.find_overlap(), None);
        assert!(clean.ensure_disjoint().is_ok());
    }

    #[test]
    fn test_verify_shifted() {
        let index = MergedRegionIndex::of(&sheet(&["A46:K46", "B51:E51"]));
        assert!(index.verify_shifted(&[range("A43:K43"), range("B48:E48")], 3).is_ok());

        let err = index.verify_shifted(&[range("A43:K43")], 2).unwrap_err();
        assert_eq!(
            err,
            MergeRelocationError::MissingFooterRegion {
                original: "A43:K43".into(),
                expected: "A45:K45".into(),
                rows_inserted: 2,
            }
        );
    }

    #[test]
    fn test_ensure_merged_is_idempotent() {
        let mut ws = sheet(&["B26:C26"]);
        ensure_merged(&mut ws, &range("B26:C26")).unwrap();
        assert_eq!(ws.merged_regions().len(), 1);
        assert!(ensure_merged(&mut ws, &range("C26:D26")).is_err());
    }

    #[test]
    fn test_unmerge_touching() {
        let mut ws = sheet(&["A1:B1", "C1:D1", "A3:B3"]);
        let removed = unmerge_touching(&mut ws, &range("B1:C1"));
        assert_eq!(removed, vec![range("A1:B1"), range("C1:D1")]);
        assert_eq!(ws.merged_regions(), &[range("A3:B3")]);
    }
}
