use formsheet_core::{CellRange, CellValue, Worksheet};
use proptest::prelude::*;

fn sheet_with(cells: &[(u32, u16)], merge_rows: &[u32]) -> Worksheet {
    let mut ws = Worksheet::new("Test");
    for (row, col) in cells {
        ws.set_cell_value_at(*row, *col, format!("{}:{}", row, col))
            .unwrap();
    }
    // One A:C merge per distinct row never overlaps another
    for row in merge_rows {
        ws.merge_cells(&CellRange::from_indices(*row, 0, *row, 2))
            .unwrap();
    }
    ws
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        rng_seed: proptest::test_runner::RngSeed::Fixed(0),
        failure_persistence: None,
        .. ProptestConfig::default()
    })]

    #[test]
    fn insert_rows_moves_exactly_the_rows_at_or_below(
        cells in proptest::collection::btree_set((0u32..60, 0u16..12), 0..40),
        merge_rows in proptest::collection::btree_set(0u32..60, 0..10),
        at in 0u32..70,
        count in 0u32..25,
    ) {
        let cells: Vec<_> = cells.into_iter().collect();
        let merge_rows: Vec<_> = merge_rows.into_iter().collect();
        let mut ws = sheet_with(&cells, &merge_rows);

        ws.insert_rows(at, count).unwrap();

        prop_assert_eq!(ws.cell_count(), cells.len());
        for (row, col) in &cells {
            let expected_row = if *row >= at { row + count } else { *row };
            let expected = CellValue::string(format!("{}:{}", row, col));
            prop_assert_eq!(ws.get_value_at(expected_row, *col), expected);
        }

        let regions = ws.merged_regions();
        prop_assert_eq!(regions.len(), merge_rows.len());
        for (region, row) in regions.iter().zip(&merge_rows) {
            let expected_row = if *row >= at { row + count } else { *row };
            prop_assert_eq!(*region, CellRange::from_indices(expected_row, 0, expected_row, 2));
        }
        for (i, a) in regions.iter().enumerate() {
            for b in &regions[i + 1..] {
                prop_assert!(!a.overlaps(b));
            }
        }
    }

    #[test]
    fn inserted_rows_are_blank(
        rows in proptest::collection::btree_set(0u32..40, 1..20),
        at in 0u32..40,
        count in 1u32..10,
    ) {
        let cells: Vec<_> = rows.into_iter().map(|r| (r, 0u16)).collect();
        let mut ws = sheet_with(&cells, &[]);
        ws.insert_rows(at, count).unwrap();

        for row in at..at + count {
            prop_assert_eq!(ws.iter_row(row).count(), 0);
            prop_assert_eq!(ws.custom_row_height(row), None);
        }
    }
}
