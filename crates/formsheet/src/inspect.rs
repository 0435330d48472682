//! Template inspection
//!
//! Diagnoses a template before it is put into service: merge topology, row
//! and column sizes, and whether the layout's footer and item columns match
//! the sheet.

use std::fmt;

use formsheet_core::{CellAddress, CellRange, Workbook, Worksheet};

use crate::footer::locate_footer;
use crate::layout::{ResolvedLayout, TemplateLayout};
use crate::merges::{MergedRegionIndex, RegionClass};

/// Largest row height a spreadsheet application accepts, in points
pub const MAX_ROW_HEIGHT: f64 = 409.0;
/// Largest column width, in characters
pub const MAX_COLUMN_WIDTH: f64 = 255.0;

const WIDE_MERGE_COLUMNS: u16 = 5;
const TALL_MERGE_ROWS: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Worth a look, does not stop generation
    Note,
    /// Generation fails or produces a broken document
    Error,
}

/// One observation about a template. Rows and columns are 0-based.
#[derive(Debug, Clone, PartialEq)]
pub enum Finding {
    InvalidLayout(String),
    SheetNotFound(String),
    WideMerge(CellRange),
    TallMerge(CellRange),
    OverlappingMerges(CellRange, CellRange),
    /// A merge crossing the first item row or the footer row
    StraddlingMerge(CellRange),
    RowTooTall { row: u32, height: f64 },
    ColumnTooWide { col: u16, width: f64 },
    FooterNotFound { sentinel: String },
    InvertedLayout { data_start: u32, footer_row: u32 },
    CapacityMismatch { declared: u32, located: u32 },
    /// An item cell's merge differs from the layout's row merge groups
    ItemColumnMerge {
        row: u32,
        col: u16,
        found: Option<CellRange>,
        expected: Option<CellRange>,
    },
}

impl Finding {
    pub fn severity(&self) -> Severity {
        match self {
            Finding::WideMerge(_) | Finding::TallMerge(_) | Finding::CapacityMismatch { .. } => {
                Severity::Note
            }
            _ => Severity::Error,
        }
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Finding::InvalidLayout(msg) => write!(f, "invalid layout: {}", msg),
            Finding::SheetNotFound(msg) => write!(f, "worksheet not found: {}", msg),
            Finding::WideMerge(r) => write!(f, "merge {} spans {} columns", r, r.col_count()),
            Finding::TallMerge(r) => write!(f, "merge {} spans {} rows", r, r.row_count()),
            Finding::OverlappingMerges(a, b) => write!(f, "merges {} and {} overlap", a, b),
            Finding::StraddlingMerge(r) => write!(f, "merge {} crosses the item table boundary", r),
            Finding::RowTooTall { row, height } => write!(
                f,
                "row {} is {} pt high (max {})",
                row + 1,
                height,
                MAX_ROW_HEIGHT
            ),
            Finding::ColumnTooWide { col, width } => write!(
                f,
                "column {} is {} wide (max {})",
                CellAddress::column_to_letters(*col),
                width,
                MAX_COLUMN_WIDTH
            ),
            Finding::FooterNotFound { sentinel } => {
                write!(f, "footer sentinel {:?} not found", sentinel)
            }
            Finding::InvertedLayout {
                data_start,
                footer_row,
            } => write!(
                f,
                "footer row {} is not below data start row {}",
                footer_row + 1,
                data_start + 1
            ),
            Finding::CapacityMismatch { declared, located } => write!(
                f,
                "layout declares capacity {} but the footer leaves room for {}",
                declared, located
            ),
            Finding::ItemColumnMerge {
                row,
                col,
                found,
                expected,
            } => {
                let cell = CellAddress::new(*row, *col);
                match (found, expected) {
                    (Some(found), Some(expected)) => {
                        write!(f, "{} is merged as {}, expected {}", cell, found, expected)
                    }
                    (Some(found), None) => write!(f, "{} is merged as {}, expected no merge", cell, found),
                    (None, Some(expected)) => write!(f, "{} should be merged as {}", cell, expected),
                    (None, None) => write!(f, "{} merge mismatch", cell),
                }
            }
        }
    }
}

/// Result of [`inspect`]
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateReport {
    pub sheet: String,
    pub used_range: Option<CellRange>,
    pub merge_count: usize,
    /// Located footer sentinel row (0-based)
    pub footer_row: Option<u32>,
    /// Item rows between the first data row and the footer
    pub capacity: Option<u32>,
    pub findings: Vec<Finding>,
}

impl TemplateReport {
    fn new(sheet: &Worksheet) -> Self {
        Self {
            sheet: sheet.name().to_string(),
            used_range: sheet.used_range(),
            merge_count: sheet.merged_regions().len(),
            footer_row: None,
            capacity: None,
            findings: Vec::new(),
        }
    }

    /// No finding of [`Severity::Error`]
    pub fn is_healthy(&self) -> bool {
        self.findings.iter().all(|f| f.severity() < Severity::Error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Finding> {
        self.findings
            .iter()
            .filter(|f| f.severity() == Severity::Error)
    }
}

impl fmt::Display for TemplateReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "sheet:         {}", self.sheet)?;
        match &self.used_range {
            Some(range) => writeln!(f, "used range:    {}", range)?,
            None => writeln!(f, "used range:    (empty)")?,
        }
        writeln!(f, "merged cells:  {}", self.merge_count)?;
        if let Some(row) = self.footer_row {
            writeln!(f, "footer row:    {}", row + 1)?;
        }
        if let Some(capacity) = self.capacity {
            writeln!(f, "capacity:      {}", capacity)?;
        }
        for finding in &self.findings {
            let tag = match finding.severity() {
                Severity::Note => "note",
                Severity::Error => "error",
            };
            writeln!(f, "{:>5}: {}", tag, finding)?;
        }
        write!(
            f,
            "status:        {}",
            if self.is_healthy() { "ok" } else { "unhealthy" }
        )
    }
}

/// Check merges and sizes of a sheet, without a layout
pub fn inspect_sheet(sheet: &Worksheet) -> TemplateReport {
    let mut report = TemplateReport::new(sheet);
    let index = MergedRegionIndex::of(sheet);

    for region in index.regions() {
        if region.col_count() > WIDE_MERGE_COLUMNS {
            report.findings.push(Finding::WideMerge(*region));
        }
        if region.row_count() > TALL_MERGE_ROWS {
            report.findings.push(Finding::TallMerge(*region));
        }
    }
    report.findings.extend(overlapping_pairs(index.regions()));

    for (row, height) in sheet.custom_row_heights() {
        if *height > MAX_ROW_HEIGHT {
            report.findings.push(Finding::RowTooTall {
                row: *row,
                height: *height,
            });
        }
    }
    for (col, width) in sheet.custom_column_widths() {
        if *width > MAX_COLUMN_WIDTH {
            report.findings.push(Finding::ColumnTooWide {
                col: *col,
                width: *width,
            });
        }
    }

    report
}

/// Diagnose the sheet `layout` targets
pub fn inspect(workbook: &Workbook, layout: &TemplateLayout) -> TemplateReport {
    let index = workbook.resolve_sheet(layout.sheet.as_deref()).ok();
    let Some(sheet) = index.and_then(|i| workbook.worksheet(i)) else {
        return TemplateReport {
            sheet: layout.sheet.clone().unwrap_or_default(),
            used_range: None,
            merge_count: 0,
            footer_row: None,
            capacity: None,
            findings: vec![Finding::SheetNotFound(
                layout.sheet.clone().unwrap_or_else(|| "(first sheet)".into()),
            )],
        };
    };

    let mut report = inspect_sheet(sheet);
    match layout.resolve() {
        Ok(resolved) => check_layout(sheet, &resolved, &mut report),
        Err(e) => report.findings.push(Finding::InvalidLayout(e.to_string())),
    }
    report
}

fn check_layout(sheet: &Worksheet, layout: &ResolvedLayout, report: &mut TemplateReport) {
    let Ok(footer_row) = locate_footer(sheet, &layout.footer_sentinel, layout.sentinel_scan_columns) else {
        report.findings.push(Finding::FooterNotFound {
            sentinel: layout.footer_sentinel.clone(),
        });
        return;
    };
    report.footer_row = Some(footer_row);

    if footer_row <= layout.data_start {
        report.findings.push(Finding::InvertedLayout {
            data_start: layout.data_start,
            footer_row,
        });
        return;
    }
    let capacity = footer_row - layout.data_start;
    report.capacity = Some(capacity);
    if let Some(declared) = layout.template_capacity.filter(|c| *c != capacity) {
        report.findings.push(Finding::CapacityMismatch {
            declared,
            located: capacity,
        });
    }

    for region in sheet.merged_regions() {
        if MergedRegionIndex::classify(region, layout.data_start, footer_row) == RegionClass::Straddling {
            report.findings.push(Finding::StraddlingMerge(*region));
        }
    }

    for row in layout.data_start..footer_row {
        for column in &layout.columns {
            let found = sheet.merged_region_at(row, column.col);
            let expected = layout
                .row_merges
                .iter()
                .find(|span| span.contains(column.col))
                .map(|span| span.at_row(row));
            if found != expected {
                report.findings.push(Finding::ItemColumnMerge {
                    row,
                    col: column.col,
                    found,
                    expected,
                });
            }
        }
    }
}

fn overlapping_pairs(regions: &[CellRange]) -> Vec<Finding> {
    let mut found = Vec::new();
    for (i, a) in regions.iter().enumerate() {
        for b in &regions[i + 1..] {
            if a.overlaps(b) {
                found.push(Finding::OverlappingMerges(*a, *b));
            }
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn layout() -> TemplateLayout {
        TemplateLayout::from_json(
            r#"{
                "name": "t",
                "data_start_row": 3,
                "footer_sentinel": "FIN",
                "template_capacity": 3,
                "columns": [
                    {"column": "A", "field": "item", "kind": "sequence"},
                    {"column": "B", "field": "codigo", "kind": "numeric_text"}
                ],
                "row_merges": ["B:C"]
            }"#,
        )
        .unwrap()
    }

    fn healthy_workbook() -> Workbook {
        let mut workbook = Workbook::new();
        let ws = workbook.worksheet_mut(0).unwrap();
        for row in 2..5 {
            ws.merge_cells(&CellRange::from_indices(row, 1, row, 2)).unwrap();
        }
        ws.set_cell_value("A6", "FIN del formulario").unwrap();
        ws.merge_cells(&CellRange::parse("A6:K6").unwrap()).unwrap();
        workbook
    }

    #[test]
    fn test_healthy_template() {
        let report = inspect(&healthy_workbook(), &layout());
        assert_eq!(report.footer_row, Some(5));
        assert_eq!(report.capacity, Some(3));
        assert_eq!(report.merge_count, 4);
        // A6:K6 is wide, which is only a note
        assert_eq!(report.findings, vec![Finding::WideMerge(CellRange::parse("A6:K6").unwrap())]);
        assert!(report.is_healthy());
        assert!(report.to_string().ends_with("status:        ok"));
    }

    #[test]
    fn test_item_column_merge_mismatch() {
        let mut workbook = healthy_workbook();
        let ws = workbook.worksheet_mut(0).unwrap();
        ws.unmerge_cells(&CellRange::parse("B4:C4").unwrap());
        ws.merge_cells(&CellRange::parse("A4:B4").unwrap()).unwrap();

        let report = inspect(&workbook, &layout());
        let errors: Vec<String> = report.errors().map(|f| f.to_string()).collect();
        assert_eq!(
            errors,
            vec![
                "A4 is merged as A4:B4, expected no merge",
                "B4 is merged as A4:B4, expected B4:C4",
            ]
        );
        assert!(!report.is_healthy());
    }

    #[test]
    fn test_missing_footer_and_capacity_mismatch() {
        let mut l = layout();
        l.footer_sentinel = "NOPE".into();
        let report = inspect(&healthy_workbook(), &l);
        assert_eq!(report.footer_row, None);
        assert!(!report.is_healthy());

        let mut l = layout();
        l.template_capacity = Some(17);
        let report = inspect(&healthy_workbook(), &l);
        assert!(report.findings.contains(&Finding::CapacityMismatch { declared: 17, located: 3 }));
        assert!(report.is_healthy());
    }

    #[test]
    fn test_sizes_and_overlaps() {
        let mut ws = Worksheet::new("S");
        ws.set_row_height(4, 500.0);
        ws.set_column_width(2, 300.0);
        ws.merge_cells(&CellRange::parse("A1:A5").unwrap()).unwrap();

        let mut report = inspect_sheet(&ws);
        report.findings.extend(overlapping_pairs(&[
            CellRange::parse("A1:B2").unwrap(),
            CellRange::parse("B2:C3").unwrap(),
        ]));
        let text: Vec<String> = report.findings.iter().map(|f| f.to_string()).collect();
        assert_eq!(
            text,
            vec![
                "merge A1:A5 spans 5 rows",
                "row 5 is 500 pt high (max 409)",
                "column C is 300 wide (max 255)",
                "merges A1:B2 and B2:C3 overlap",
            ]
        );
        assert!(!report.is_healthy());
    }

    #[test]
    fn test_merge_across_footer_row() {
        let mut workbook = healthy_workbook();
        let ws = workbook.worksheet_mut(0).unwrap();
        ws.unmerge_cells(&CellRange::parse("A6:K6").unwrap());
        ws.merge_cells(&CellRange::parse("A6:J6").unwrap()).unwrap();
        ws.merge_cells(&CellRange::parse("K5:K6").unwrap()).unwrap();

        let report = inspect(&workbook, &layout());
        let errors: Vec<String> = report.errors().map(|f| f.to_string()).collect();
        assert_eq!(errors, vec!["merge K5:K6 crosses the item table boundary"]);
    }

    #[test]
    fn test_unknown_sheet() {
        let mut l = layout();
        l.sheet = Some("Otra".into());
        let report = inspect(&healthy_workbook(), &l);
        assert_eq!(report.findings, vec![Finding::SheetNotFound("Otra".into())]);
    }
}
