//! Row-reference rewriting for formulas kept across a row insertion.
//!
//! Formulas are never evaluated here, but a template may carry totals or
//! lookups that point at rows which move when item rows are inserted. Every
//! reference to a row of the grown sheet at or after the insertion point is
//! moved down, whether or not it carries a `$` marker, mirroring what a
//! spreadsheet application does on a structural insert.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::MAX_ROWS;

/// An optional unquoted sheet qualifier (group 1), then `A5`, `$A$5`, `A$5`
/// (group 2 = column part, group 3 = row) or a whole-row range `5:7`,
/// `$5:$7` (groups 4..=7).
static REFERENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:([A-Za-z_][A-Za-z0-9_.]*)!)?(?:(\$?[A-Za-z]{1,3}\$?)(\d+)|(\$?)(\d+):(\$?)(\d+))")
        .expect("reference pattern is valid")
});

/// Shift row references in `formula` for `count` rows inserted before the
/// 0-based row `at` of the worksheet named `sheet`.
///
/// Text inside `"..."` literals is left alone, as are tokens that only look
/// like references (`LOG10(`, `ABC1D`). References qualified with another
/// sheet's name (`Otra!A50`, `'Hoja 2'!A1:A50`) keep their rows.
pub fn shift_row_references(formula: &str, sheet: &str, at: u32, count: u32) -> String {
    if count == 0 {
        return formula.to_string();
    }

    let mut out = String::with_capacity(formula.len() + 8);
    let mut segment_start = 0;
    // Quote character and where its content starts
    let mut quote: Option<(char, usize)> = None;
    let mut quoted_sheet: Option<String> = None;
    let mut chars = formula.char_indices().peekable();

    while let Some((i, ch)) = chars.next() {
        match quote {
            // Doubled quote inside a literal or sheet name
            Some((q, _)) if ch == q && chars.peek().map(|(_, c)| *c) == Some(q) => {
                chars.next();
            }
            Some((q, content)) if ch == q => {
                let end = i + ch.len_utf8();
                out.push_str(&formula[segment_start..end]);
                quoted_sheet = (q == '\'').then(|| formula[content..i].replace("''", "'"));
                segment_start = end;
                quote = None;
            }
            Some(_) => {}
            None if ch == '"' || ch == '\'' => {
                let segment = &formula[segment_start..i];
                out.push_str(&shift_segment(segment, quoted_sheet.take().as_deref(), sheet, at, count));
                segment_start = i;
                quote = Some((ch, i + ch.len_utf8()));
            }
            None => {}
        }
    }

    let rest = &formula[segment_start..];
    if quote.is_some() {
        out.push_str(rest);
    } else {
        out.push_str(&shift_segment(rest, quoted_sheet.as_deref(), sheet, at, count));
    }
    out
}

/// `quoted_sheet` is the `'...'` name closed right before `segment`, if any.
fn shift_segment(segment: &str, quoted_sheet: Option<&str>, sheet: &str, at: u32, count: u32) -> String {
    let bytes = segment.as_bytes();
    // End of the last reference that points at another sheet
    let mut foreign_end: Option<usize> = None;

    REFERENCE
        .replace_all(segment, |caps: &Captures| {
            let (start, end) = caps.get(0).map_or((0, 0), |m| (m.start(), m.end()));
            let original = &segment[start..end];

            let before = start.checked_sub(1).map(|i| bytes[i]);
            let after = bytes.get(end).copied();
            if before.is_some_and(is_name_byte) || after.is_some_and(|b| is_name_byte(b) || b == b'(') {
                return original.to_string();
            }

            let qualifier = match caps.get(1) {
                Some(name) => Some(name.as_str()),
                None if start == 1 && before == Some(b'!') => quoted_sheet,
                None => None,
            };
            let foreign = match qualifier {
                Some(name) => !name.eq_ignore_ascii_case(sheet),
                // Second half of `Otra!A1:A50`
                None => before == Some(b':') && foreign_end == Some(start - 1),
            };
            if foreign {
                foreign_end = Some(end);
                return original.to_string();
            }

            let prefix = caps.get(1).map_or("", |name| &segment[name.start()..name.end() + 1]);
            if let (Some(col), Some(row)) = (caps.get(2), caps.get(3)) {
                return format!("{}{}{}", prefix, col.as_str(), shift_row(row.as_str(), at, count));
            }

            match (caps.get(4), caps.get(5), caps.get(6), caps.get(7)) {
                (Some(a1), Some(r1), Some(a2), Some(r2)) => format!(
                    "{}{}{}:{}{}",
                    prefix,
                    a1.as_str(),
                    shift_row(r1.as_str(), at, count),
                    a2.as_str(),
                    shift_row(r2.as_str(), at, count)
                ),
                _ => original.to_string(),
            }
        })
        .into_owned()
}

/// `row` is 1-based text; `at` is a 0-based index.
fn shift_row(row: &str, at: u32, count: u32) -> String {
    match row.parse::<u32>() {
        Ok(n) if n > at => n.saturating_add(count).min(MAX_ROWS).to_string(),
        _ => row.to_string(),
    }
}

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'.'
}
