//! Data writer
//!
//! Places header fields and item records into their cells. Formatting is read
//! before every write and left in place; only `numeric_text` cells have their
//! number format switched to `@`. Problems with a single value are returned as
//! [`CellWriteError`]s and never stop the remaining writes.

use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use formsheet_core::{CellAddress, CellRange, CellValue, NumberFormat, Worksheet};
use tracing::debug;

use crate::error::CellWriteError;
use crate::layout::{ResolvedLayout, ValueKind};
use crate::merges::unmerge_touching;
use crate::record::{FieldValue, HeaderRecord, LineItem};

/// Cell content produced from one field value
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Rendered {
    pub value: CellValue,
    /// Switch the cell to the `@` number format before writing
    pub force_text: bool,
    /// Why the value was not written exactly as requested
    pub problem: Option<String>,
}

impl Rendered {
    fn value(value: impl Into<CellValue>) -> Self {
        Self {
            value: value.into(),
            force_text: false,
            problem: None,
        }
    }

    fn text(text: impl Into<String>) -> Self {
        Self::value(CellValue::string(text))
    }

    fn blank() -> Self {
        Self::text("")
    }

    /// Raw text written in place of a value that could not be converted
    fn fallback(raw: &str, problem: String) -> Self {
        Self {
            value: CellValue::string(raw.trim()),
            force_text: false,
            problem: Some(problem),
        }
    }
}

/// Render `value` for a cell of kind `kind`. `sequence` is the 1-based item
/// index and is only present on item rows.
pub(crate) fn render(kind: ValueKind, value: &FieldValue, sequence: Option<u32>) -> Rendered {
    match kind {
        ValueKind::Text => match value {
            FieldValue::Text(s) => Rendered::text(s.trim()),
            other => Rendered::text(other.to_text()),
        },
        ValueKind::NumericText => Rendered {
            value: CellValue::string(value.to_text()),
            force_text: true,
            problem: None,
        },
        ValueKind::Numeric => render_number(value, false),
        ValueKind::Integer => render_number(value, true),
        ValueKind::Boolean => match truthiness(value) {
            Ok(Some(true)) => Rendered::text("SI"),
            Ok(Some(false)) | Ok(None) => Rendered::text("NO"),
            Err(raw) => Rendered::fallback(&raw, format!("not a yes/no value: {:?}", raw)),
        },
        ValueKind::Mark => match truthiness(value) {
            Ok(Some(true)) => Rendered::text("X"),
            Ok(_) => Rendered::blank(),
            Err(raw) => Rendered {
                value: CellValue::string(""),
                force_text: false,
                problem: Some(format!("not a yes/no value: {:?}", raw)),
            },
        },
        ValueKind::Date => render_date(value),
        ValueKind::Time => render_time(value),
        ValueKind::Sequence => match sequence {
            Some(n) => Rendered::value(n),
            None => Rendered {
                value: CellValue::string(""),
                force_text: false,
                problem: Some("sequence numbers exist on item rows only".into()),
            },
        },
    }
}

fn render_number(value: &FieldValue, integer: bool) -> Rendered {
    let number = match value {
        _ if value.is_blank() => return Rendered::blank(),
        FieldValue::Number(n) => *n,
        FieldValue::Text(s) => match parse_number(s) {
            Some(n) => n,
            None => return Rendered::fallback(s, format!("not a number: {:?}", s.trim())),
        },
        FieldValue::Bool(b) => {
            return Rendered::fallback(&b.to_string(), format!("expected a number, got {}", b))
        }
        FieldValue::Empty => return Rendered::blank(),
    };

    if !number.is_finite() {
        return Rendered::fallback(&value.to_text(), format!("not a finite number: {}", number));
    }
    if integer && number.fract() != 0.0 {
        let rounded = number.round();
        return Rendered {
            value: CellValue::Number(rounded),
            force_text: false,
            problem: Some(format!("rounded {} to {}", number, rounded)),
        };
    }
    Rendered::value(number)
}

/// Accepts `210`, `210.5` and the decimal comma form `210,5`
fn parse_number(s: &str) -> Option<f64> {
    let s = s.trim();
    s.parse::<f64>()
        .ok()
        .or_else(|| match s.matches(',').count() {
            1 if !s.contains('.') => s.replace(',', ".").parse().ok(),
            _ => None,
        })
        .filter(|n| n.is_finite())
}

/// `Ok(None)` for blank input, `Err(raw)` for text that is neither yes nor no
fn truthiness(value: &FieldValue) -> Result<Option<bool>, String> {
    match value {
        _ if value.is_blank() => Ok(None),
        FieldValue::Bool(b) => Ok(Some(*b)),
        FieldValue::Number(n) => Ok(Some(*n != 0.0)),
        FieldValue::Text(s) => match s.trim().to_lowercase().as_str() {
            "si" | "sí" | "s" | "x" | "yes" | "y" | "true" | "1" => Ok(Some(true)),
            "no" | "n" | "false" | "0" => Ok(Some(false)),
            _ => Err(s.clone()),
        },
        FieldValue::Empty => Ok(None),
    }
}

/// Day zero of spreadsheet date serials
fn serial_epoch() -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(1899, 12, 30)
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| NaiveDate::parse_from_str(s, "%d/%m/%Y").ok())
        .or_else(|| parse_datetime(s).map(|dt| dt.date()))
}

fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
}

fn render_date(value: &FieldValue) -> Rendered {
    let date = match value {
        _ if value.is_blank() => return Rendered::blank(),
        FieldValue::Text(s) => parse_date(s),
        FieldValue::Number(n) if *n >= 0.0 && n.is_finite() => {
            serial_epoch().and_then(|epoch| epoch.checked_add_days(Days::new(n.trunc() as u64)))
        }
        _ => None,
    };
    match date {
        Some(date) => Rendered::text(date.format("%d/%m/%Y").to_string()),
        None => {
            let raw = value.to_text();
            Rendered::fallback(&raw, format!("not a date: {:?}", raw.trim()))
        }
    }
}

fn render_time(value: &FieldValue) -> Rendered {
    let time = match value {
        _ if value.is_blank() => return Rendered::blank(),
        FieldValue::Text(s) => {
            let s = s.trim();
            NaiveTime::parse_from_str(s, "%H:%M")
                .ok()
                .or_else(|| NaiveTime::parse_from_str(s, "%H:%M:%S").ok())
                .or_else(|| parse_datetime(s).map(|dt| dt.time()))
        }
        // Fraction of a day
        FieldValue::Number(n) if (0.0..1.0).contains(n) => {
            NaiveTime::from_num_seconds_from_midnight_opt((n * 86_400.0).round() as u32, 0)
        }
        _ => None,
    };
    match time {
        Some(t) => Rendered::text(format!("{:02}:{:02}", t.hour(), t.minute())),
        None => {
            let raw = value.to_text();
            Rendered::fallback(&raw, format!("not a time of day: {:?}", raw.trim()))
        }
    }
}

/// Cell a write to `(row, col)` should land on: the anchor of its merge
fn resolve_target(sheet: &Worksheet, row: u32, col: u16) -> (u32, u16) {
    match sheet.merged_region_at(row, col) {
        Some(region) => (region.start.row, region.start.col),
        None => (row, col),
    }
}

fn a1(row: u32, col: u16) -> String {
    CellAddress::new(row, col).to_a1_string()
}

/// Write a rendered value, keeping the cell's formatting
fn put(
    sheet: &mut Worksheet,
    row: u32,
    col: u16,
    field: &str,
    rendered: Rendered,
    errors: &mut Vec<CellWriteError>,
) {
    if let Some(problem) = &rendered.problem {
        errors.push(CellWriteError::new(a1(row, col), field, problem.clone()));
    }

    if rendered.force_text && !sheet.style_at(row, col).number_format.is_text() {
        let style = sheet
            .style_at(row, col)
            .clone()
            .with_number_format(NumberFormat::text());
        if let Err(e) = sheet.set_cell_style_at(row, col, &style) {
            errors.push(CellWriteError::new(a1(row, col), field, e.to_string()));
            return;
        }
    }

    if let Err(e) = sheet.set_cell_value_at(row, col, rendered.value) {
        errors.push(CellWriteError::new(a1(row, col), field, e.to_string()));
    }
}

/// Write the header block
pub fn write_header(
    sheet: &mut Worksheet,
    header: &HeaderRecord,
    layout: &ResolvedLayout,
) -> Vec<CellWriteError> {
    let mut errors = Vec::new();

    for binding in &layout.header {
        let (row, col) = resolve_target(sheet, binding.address.row, binding.address.col);
        let rendered = render(binding.kind, header.get(&binding.field), None);
        put(sheet, row, col, &binding.field, rendered, &mut errors);
    }

    for name in header.field_names() {
        if !layout.header.iter().any(|b| b.field == name) {
            debug!(field = name, "header field has no cell in layout");
        }
    }

    errors
}

/// Write item number `index` (0-based) on `row` and re-assert the row's
/// merge groups.
pub fn write_item(
    sheet: &mut Worksheet,
    row: u32,
    index: usize,
    item: &LineItem,
    layout: &ResolvedLayout,
) -> Vec<CellWriteError> {
    let mut errors = Vec::new();
    let sequence = u32::try_from(index + 1).ok();

    for span in &layout.row_merges {
        if let Err(e) = reassert_row_merge(sheet, &span.at_row(row)) {
            errors.push(e);
        }
    }

    for binding in &layout.columns {
        let (target_row, target_col) = resolve_target(sheet, row, binding.col);
        if target_row != row {
            errors.push(CellWriteError::new(
                a1(row, binding.col),
                &binding.field,
                format!(
                    "cell is covered by a merge anchored on another row ({})",
                    a1(target_row, target_col)
                ),
            ));
            continue;
        }
        let rendered = render(binding.kind, item.get(&binding.field), sequence);
        put(sheet, target_row, target_col, &binding.field, rendered, &mut errors);
    }

    for name in item.field_names() {
        if !layout.columns.iter().any(|b| b.field == name) {
            debug!(field = name, row = row + 1, "item field has no column in layout");
        }
    }

    errors
}

/// Make `range` a merged region again if it was split or never merged.
/// Only regions confined to the same row are replaced.
fn reassert_row_merge(sheet: &mut Worksheet, range: &CellRange) -> Result<(), CellWriteError> {
    if sheet.merged_regions().contains(range) {
        return Ok(());
    }

    let row = range.start.row;
    let foreign = sheet
        .merged_regions()
        .iter()
        .find(|r| r.overlaps(range) && (r.start.row != row || r.end.row != row))
        .copied();
    if let Some(foreign) = foreign {
        return Err(CellWriteError::new(
            range.to_a1_string(),
            "row merge",
            format!("blocked by merged region {}", foreign),
        ));
    }

    let removed = unmerge_touching(sheet, range);
    if !removed.is_empty() {
        debug!(merge = %range, removed = removed.len(), "row merge restored");
    }
    sheet
        .merge_cells(range)
        .map_err(|e| CellWriteError::new(range.to_a1_string(), "row merge", e.to_string()))
}
