//! Template engine
//!
//! [`TemplateEngine`] ties the pieces together for one layout. It holds only
//! the resolved layout, so a single engine can serve any number of threads;
//! every call loads its own copy of the template and owns it until the bytes
//! are produced.

use std::path::Path;

use formsheet_core::{CellAddress, CellValue, Workbook, Worksheet};
use formsheet_xlsx::CONTENT_TYPE;
use tracing::{debug, info, warn};

use crate::error::{CellWriteError, GenerateError, Result};
use crate::expander::expand;
use crate::footer::locate_footer;
use crate::layout::{FooterFixup, ResolvedLayout, TemplateLayout};
use crate::merges::MergedRegionIndex;
use crate::planner::plan;
use crate::record::{HeaderRecord, LineItem};
use crate::serializer::{load_template, load_template_bytes, serialize};
use crate::writer::{write_header, write_item};

/// A generated document
#[derive(Debug, Clone)]
pub struct GenerationResult {
    /// The `.xlsx` package
    pub bytes: Vec<u8>,
    pub rows_inserted: u32,
    /// Footer sentinel row in the output (1-based)
    pub footer_row: u32,
    /// Values that were written differently than requested
    pub cell_errors: Vec<CellWriteError>,
}

impl GenerationResult {
    /// MIME type of [`bytes`](Self::bytes)
    pub fn content_type(&self) -> &'static str {
        CONTENT_TYPE
    }

    pub fn is_clean(&self) -> bool {
        self.cell_errors.is_empty()
    }
}

/// Result of populating a workbook in memory
#[derive(Debug, Clone, PartialEq)]
pub struct PopulateOutcome {
    /// Index of the populated worksheet
    pub sheet: usize,
    pub rows_inserted: u32,
    /// Footer sentinel row after expansion (0-based)
    pub footer_row: u32,
    pub cell_errors: Vec<CellWriteError>,
}

/// Populates templates of one layout
#[derive(Debug, Clone)]
pub struct TemplateEngine {
    layout: ResolvedLayout,
}

impl TemplateEngine {
    /// Validate `layout` and build an engine for it
    pub fn new(layout: &TemplateLayout) -> Result<Self> {
        Ok(Self {
            layout: layout.resolve()?,
        })
    }

    pub fn layout(&self) -> &ResolvedLayout {
        &self.layout
    }

    /// Load the template at `template_path`, populate it and serialize it.
    /// The file itself is never modified.
    pub fn generate<P: AsRef<Path>>(
        &self,
        template_path: P,
        header: &HeaderRecord,
        items: &[LineItem],
    ) -> Result<GenerationResult> {
        let mut workbook = load_template(template_path)?;
        self.finish(&mut workbook, header, items)
    }

    /// Same as [`generate`](Self::generate) with the template already in memory
    pub fn generate_from_bytes(
        &self,
        template: &[u8],
        header: &HeaderRecord,
        items: &[LineItem],
    ) -> Result<GenerationResult> {
        let mut workbook = load_template_bytes(template)?;
        self.finish(&mut workbook, header, items)
    }

    fn finish(
        &self,
        workbook: &mut Workbook,
        header: &HeaderRecord,
        items: &[LineItem],
    ) -> Result<GenerationResult> {
        let outcome = self.populate(workbook, header, items)?;
        let bytes = serialize(workbook)?;
        Ok(GenerationResult {
            bytes,
            rows_inserted: outcome.rows_inserted,
            footer_row: outcome.footer_row + 1,
            cell_errors: outcome.cell_errors,
        })
    }

    /// Fill `workbook` in place.
    ///
    /// The footer is located and the template's merges are checked before
    /// anything is changed; a missing sentinel leaves the workbook untouched.
    pub fn populate(
        &self,
        workbook: &mut Workbook,
        header: &HeaderRecord,
        items: &[LineItem],
    ) -> Result<PopulateOutcome> {
        let layout = &self.layout;
        let index = workbook
            .resolve_sheet(layout.sheet.as_deref())
            .map_err(|e| GenerateError::TemplateLoad(e.to_string()))?;
        let sheet = workbook.worksheet_mut(index).ok_or_else(|| {
            GenerateError::TemplateLoad(format!("worksheet {} disappeared", index))
        })?;

        let footer_row = locate_footer(sheet, &layout.footer_sentinel, layout.sentinel_scan_columns)?;
        debug!(layout = %layout.name, sheet = sheet.name(), footer_row = footer_row + 1, "footer located");

        let plan = plan(layout.data_start, footer_row, items.len())?;
        if let Some(declared) = layout.template_capacity.filter(|c| *c != plan.capacity) {
            warn!(
                layout = %layout.name,
                declared,
                located = plan.capacity,
                "template capacity differs from layout; using the located footer"
            );
        }
        debug!(
            capacity = plan.capacity,
            items = items.len(),
            rows_to_insert = plan.rows_to_insert,
            "capacity planned"
        );

        MergedRegionIndex::of(sheet).ensure_disjoint()?;

        let new_footer = expand(
            sheet,
            &plan,
            footer_row - 1,
            layout.last_item_column(),
            &layout.row_merges,
        )?;

        let mut cell_errors = write_header(sheet, header, layout);
        for (i, item) in items.iter().enumerate() {
            let row = layout.data_start + i as u32;
            cell_errors.extend(write_item(sheet, row, i, item, layout));
        }
        debug!(items = items.len(), "data written");

        fix_footer(
            sheet,
            new_footer,
            &layout.footer,
            layout.sentinel_scan_columns,
            &mut cell_errors,
        );
        check_integrity(sheet, new_footer, &layout.footer_sentinel, layout.sentinel_scan_columns)?;

        for error in &cell_errors {
            warn!(cell = %error.cell, field = %error.field, reason = %error.reason, "cell write");
        }
        info!(
            layout = %layout.name,
            items = items.len(),
            rows_inserted = plan.rows_to_insert,
            footer_row = new_footer + 1,
            cell_errors = cell_errors.len(),
            "template populated"
        );

        Ok(PopulateOutcome {
            sheet: index,
            rows_inserted: plan.rows_to_insert,
            footer_row: new_footer,
            cell_errors,
        })
    }
}

/// Re-assert the footer's labels and row height at its current position.
/// Returns the rows that were touched.
fn fix_footer(
    sheet: &mut Worksheet,
    footer_row: u32,
    fixup: &FooterFixup,
    scan_columns: u16,
    errors: &mut Vec<CellWriteError>,
) -> Vec<u32> {
    let mut rewrites: Vec<(u32, u16, &str)> = Vec::new();
    let mut rows: Vec<u32> = Vec::new();

    for row in sheet.row_indices().filter(|r| *r >= footer_row) {
        for (col, cell) in sheet.iter_row(row).take_while(|(col, _)| *col < scan_columns) {
            if cell.value.is_formula() {
                continue;
            }
            let Some(current) = cell.value.as_string() else {
                continue;
            };
            for label in &fixup.labels {
                if current.contains(label.contains.as_str()) {
                    if current != label.text {
                        rewrites.push((row, col, label.text.as_str()));
                    }
                    if !rows.contains(&row) {
                        rows.push(row);
                    }
                }
            }
        }
    }

    let mut written = 0;
    for (row, col, text) in &rewrites {
        let cell = CellAddress::new(*row, *col).to_a1_string();
        let covering = sheet
            .merged_region_at(*row, *col)
            .filter(|r| r.start.row != *row || r.start.col != *col);
        if let Some(region) = covering {
            errors.push(CellWriteError::new(
                cell,
                "footer label",
                format!("cell is hidden under merged region {}", region),
            ));
            continue;
        }

        let style = sheet.style_at(*row, *col);
        if text.contains('\n') && !style.alignment.wrap_text {
            let wrapped = style.clone().wrap_text(true);
            if let Err(e) = sheet.set_cell_style_at(*row, *col, &wrapped) {
                errors.push(CellWriteError::new(cell, "footer label", e.to_string()));
                continue;
            }
        }
        match sheet.set_cell_value_at(*row, *col, CellValue::string(*text)) {
            Ok(()) => written += 1,
            Err(e) => errors.push(CellWriteError::new(cell, "footer label", e.to_string())),
        }
    }

    if fixup.labels.is_empty() {
        rows.push(footer_row);
    }
    if let Some(height) = fixup.row_height {
        for row in &rows {
            sheet.set_row_height(*row, height);
        }
    }

    debug!(labels = written, rows = rows.len(), "footer fixed up");
    rows
}

/// Final structural check before anything is serialized
fn check_integrity(sheet: &Worksheet, footer_row: u32, sentinel: &str, scan_columns: u16) -> Result<()> {
    MergedRegionIndex::of(sheet).ensure_disjoint()?;

    let sentinel_in_place = sheet
        .iter_row(footer_row)
        .take_while(|(col, _)| *col < scan_columns)
        .any(|(_, cell)| cell.value.as_string().is_some_and(|s| s.contains(sentinel)));
    if !sentinel_in_place {
        return Err(GenerateError::RowInsertion(format!(
            "footer sentinel is no longer on row {}",
            footer_row + 1
        )));
    }
    Ok(())
}
