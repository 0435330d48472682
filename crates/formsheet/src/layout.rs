//! Template layout configuration
//!
//! A [`TemplateLayout`] describes one fixed-layout form: where the item table
//! starts, how the footer is recognized, which column receives which field
//! and how each value is rendered. Layouts are plain data, loaded once (usually
//! from JSON) and validated by [`TemplateLayout::resolve`] before any template
//! is touched.
//!
//! Row numbers in a layout are 1-based, as printed in the spreadsheet.

use std::collections::HashSet;
use std::path::Path;

use formsheet_core::{CellAddress, ColumnSpan};
use serde::{Deserialize, Serialize};

use crate::error::{GenerateError, Result};

fn default_scan_columns() -> u16 {
    11
}

/// Static description of a template worksheet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateLayout {
    /// Label used in logs
    pub name: String,
    /// Worksheet to populate; the first sheet when absent
    #[serde(default)]
    pub sheet: Option<String>,
    /// First item row (1-based)
    pub data_start_row: u32,
    /// Literal marker text found once in the footer block
    pub footer_sentinel: String,
    /// Leading columns searched for the sentinel
    #[serde(default = "default_scan_columns")]
    pub sentinel_scan_columns: u16,
    /// Declared item capacity, cross-checked against the located footer
    #[serde(default)]
    pub template_capacity: Option<u32>,
    pub columns: Vec<ColumnBinding>,
    /// Column groups merged on every item row, e.g. `"B:C"`
    #[serde(default)]
    pub row_merges: Vec<String>,
    #[serde(default)]
    pub header: Vec<HeaderBinding>,
    #[serde(default)]
    pub footer: FooterFixup,
}

/// Item column -> field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnBinding {
    /// Column letters, e.g. `"F"`
    pub column: String,
    pub field: String,
    pub kind: ValueKind,
}

/// Header cell -> field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeaderBinding {
    /// A1 reference, e.g. `"D4"`
    pub cell: String,
    pub field: String,
    #[serde(default)]
    pub kind: ValueKind,
}

/// Footer content re-asserted after the footer has moved
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FooterFixup {
    /// Height for the rows carrying a label (the sentinel row when there are none)
    #[serde(default)]
    pub row_height: Option<f64>,
    #[serde(default)]
    pub labels: Vec<FooterLabel>,
}

/// A footer cell whose text contains `contains` is rewritten to `text`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FooterLabel {
    pub contains: String,
    pub text: String,
}

/// How a field value is rendered into its cell
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    /// Trimmed string
    #[default]
    Text,
    /// String kept verbatim under the `@` number format (`"007"` stays `"007"`)
    NumericText,
    Numeric,
    /// Number rounded to a whole value
    Integer,
    /// `"SI"` / `"NO"`
    Boolean,
    /// `DD/MM/YYYY` text
    Date,
    /// `HH:MM` text
    Time,
    /// The 1-based item index; item rows only
    Sequence,
    /// `"X"` when true, blank otherwise
    Mark,
}

/// Item column bound to its 0-based index
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedColumn {
    pub col: u16,
    pub field: String,
    pub kind: ValueKind,
}

/// Header cell bound to its 0-based address
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedHeader {
    pub address: CellAddress,
    pub field: String,
    pub kind: ValueKind,
}

/// A layout with every reference parsed and checked
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedLayout {
    pub name: String,
    pub sheet: Option<String>,
    /// First item row (0-based)
    pub data_start: u32,
    pub footer_sentinel: String,
    pub sentinel_scan_columns: u16,
    pub template_capacity: Option<u32>,
    pub columns: Vec<ResolvedColumn>,
    pub row_merges: Vec<ColumnSpan>,
    pub header: Vec<ResolvedHeader>,
    pub footer: FooterFixup,
}

impl ResolvedLayout {
    /// Right-most column the item rows touch (0-based)
    pub fn last_item_column(&self) -> u16 {
        let columns = self.columns.iter().map(|c| c.col);
        let merges = self.row_merges.iter().map(|m| m.last);
        columns.chain(merges).max().unwrap_or(0)
    }
}

impl TemplateLayout {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| GenerateError::InvalidLayout(e.to_string()))
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            GenerateError::InvalidLayout(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> Result<()> {
        self.resolve().map(|_| ())
    }

    /// Parse and check every reference of the layout
    pub fn resolve(&self) -> Result<ResolvedLayout> {
        let invalid = |msg: String| GenerateError::InvalidLayout(format!("{}: {}", self.name, msg));

        if self.data_start_row == 0 {
            return Err(invalid("data_start_row is 1-based and cannot be 0".into()));
        }
        if self.footer_sentinel.trim().is_empty() {
            return Err(invalid("footer_sentinel is empty".into()));
        }
        if self.sentinel_scan_columns == 0 {
            return Err(invalid("sentinel_scan_columns must be at least 1".into()));
        }

        let mut row_merges: Vec<ColumnSpan> = Vec::with_capacity(self.row_merges.len());
        for group in &self.row_merges {
            let span = ColumnSpan::parse(group)
                .map_err(|e| invalid(format!("row merge {:?}: {}", group, e)))?;
            if span.width() < 2 {
                return Err(invalid(format!("row merge {} spans a single column", span)));
            }
            if let Some(other) = row_merges.iter().find(|m| m.overlaps(&span)) {
                return Err(invalid(format!("row merges {} and {} overlap", other, span)));
            }
            row_merges.push(span);
        }

        let mut seen = HashSet::new();
        let mut columns = Vec::with_capacity(self.columns.len());
        for binding in &self.columns {
            let col = CellAddress::letters_to_column(binding.column.trim())
                .map_err(|e| invalid(format!("column {:?}: {}", binding.column, e)))?;
            if !seen.insert(col) {
                return Err(invalid(format!("column {} is bound twice", binding.column)));
            }
            if let Some(span) = row_merges.iter().find(|m| m.contains(col) && m.first != col) {
                return Err(invalid(format!(
                    "column {} lies inside row merge {} but is not its first column",
                    binding.column, span
                )));
            }
            columns.push(ResolvedColumn {
                col,
                field: binding.field.clone(),
                kind: binding.kind,
            });
        }

        let mut header = Vec::with_capacity(self.header.len());
        for binding in &self.header {
            let address = CellAddress::parse(binding.cell.trim())
                .map_err(|e| invalid(format!("header cell {:?}: {}", binding.cell, e)))?;
            if binding.kind == ValueKind::Sequence {
                return Err(invalid(format!(
                    "header cell {} cannot use the sequence kind",
                    binding.cell
                )));
            }
            // Header cells are written after growth at fixed coordinates
            if address.row >= self.data_start_row - 1 {
                return Err(invalid(format!(
                    "header cell {} is not above data_start_row {}",
                    binding.cell, self.data_start_row
                )));
            }
            header.push(ResolvedHeader {
                address,
                field: binding.field.clone(),
                kind: binding.kind,
            });
        }

        Ok(ResolvedLayout {
            name: self.name.clone(),
            sheet: self.sheet.clone(),
            data_start: self.data_start_row - 1,
            footer_sentinel: self.footer_sentinel.clone(),
            sentinel_scan_columns: self.sentinel_scan_columns,
            template_capacity: self.template_capacity,
            columns,
            row_merges,
            header,
            footer: self.footer.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn layout(json: &str) -> TemplateLayout {
        TemplateLayout::from_json(json).unwrap()
    }

    const MINIMAL: &str = r#"{
        "name": "recepcion",
        "data_start_row": 26,
        "footer_sentinel": "(1) OBLIGATORIO",
        "columns": [
            {"column": "A", "field": "item", "kind": "sequence"},
            {"column": "B", "field": "codigo_muestra", "kind": "numeric_text"},
            {"column": "K", "field": "requiere_densidad", "kind": "boolean"}
        ],
        "row_merges": ["B:C"],
        "header": [{"cell": "D4", "field": "numero_recepcion"}]
    }"#;

    #[test]
    fn test_resolve_minimal_layout() {
        let resolved = layout(MINIMAL).resolve().unwrap();

        assert_eq!(resolved.data_start, 25);
        assert_eq!(resolved.sentinel_scan_columns, 11);
        assert_eq!(resolved.template_capacity, None);
        assert_eq!(resolved.columns[1].col, 1);
        assert_eq!(resolved.columns[1].kind, ValueKind::NumericText);
        assert_eq!(resolved.row_merges, vec![ColumnSpan::new(1, 2)]);
        assert_eq!(resolved.header[0].address, CellAddress::new(3, 3));
        assert_eq!(resolved.header[0].kind, ValueKind::Text);
        assert_eq!(resolved.last_item_column(), 10);
    }

    #[test]
    fn test_rejects_zero_start_row() {
        let mut l = layout(MINIMAL);
        l.data_start_row = 0;
        assert!(matches!(l.validate(), Err(GenerateError::InvalidLayout(_))));
    }

    #[test]
    fn test_rejects_empty_sentinel() {
        let mut l = layout(MINIMAL);
        l.footer_sentinel = "  ".into();
        assert!(l.validate().is_err());
    }

    #[test]
    fn test_rejects_duplicate_and_bad_columns() {
        let mut l = layout(MINIMAL);
        l.columns.push(ColumnBinding {
            column: "K".into(),
            field: "again".into(),
            kind: ValueKind::Text,
        });
        let err = l.validate().unwrap_err().to_string();
        assert!(err.contains("bound twice"), "{err}");

        let mut l = layout(MINIMAL);
        l.columns[0].column = "1A".into();
        assert!(l.validate().is_err());
    }

    #[test]
    fn test_rejects_column_inside_merge_group() {
        let mut l = layout(MINIMAL);
        l.columns.push(ColumnBinding {
            column: "C".into(),
            field: "hidden_half".into(),
            kind: ValueKind::Text,
        });
        let err = l.validate().unwrap_err().to_string();
        assert!(err.contains("inside row merge B:C"), "{err}");
    }

    #[test]
    fn test_rejects_bad_merge_groups() {
        let mut l = layout(MINIMAL);
        l.row_merges = vec!["B:C".into(), "C:D".into()];
        assert!(l.validate().unwrap_err().to_string().contains("overlap"));

        let mut l = layout(MINIMAL);
        l.row_merges = vec!["B:B".into()];
        assert!(l.validate().is_err());

        let mut l = layout(MINIMAL);
        l.row_merges = vec!["B-C".into()];
        assert!(l.validate().is_err());
    }

    #[test]
    fn test_rejects_sequence_in_header() {
        let mut l = layout(MINIMAL);
        l.header[0].kind = ValueKind::Sequence;
        assert!(l.validate().is_err());
    }

    #[test]
    fn test_rejects_header_cells_in_or_below_item_rows() {
        for cell in ["B26", "B43", "D48"] {
            let mut l = layout(MINIMAL);
            l.header[0].cell = cell.into();
            let err = l.validate().unwrap_err();
            assert!(matches!(err, GenerateError::InvalidLayout(_)));
            assert!(err.to_string().contains("not above data_start_row 26"), "{err}");
        }

        let mut l = layout(MINIMAL);
        l.header[0].cell = "D25".into();
        assert!(l.validate().is_ok());
    }

    #[test]
    fn test_unknown_kind_is_a_layout_error() {
        let json = MINIMAL.replace("\"boolean\"", "\"checkbox\"");
        assert!(matches!(
            TemplateLayout::from_json(&json),
            Err(GenerateError::InvalidLayout(_))
        ));
    }
}
