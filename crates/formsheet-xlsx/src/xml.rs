//! Small XML helpers shared by the reader, the writer and the styles codec

use std::str::FromStr;

use quick_xml::events::BytesStart;

/// Unescaped value of an attribute
pub(crate) fn attr(e: &BytesStart, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == key)
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

/// Attribute parsed into `T`; absent or malformed values are `None`
pub(crate) fn parse_attr<T: FromStr>(e: &BytesStart, key: &[u8]) -> Option<T> {
    attr(e, key).and_then(|v| v.trim().parse().ok())
}

/// Boolean attribute (`1` / `true`)
pub(crate) fn flag(e: &BytesStart, key: &[u8]) -> bool {
    matches!(attr(e, key).as_deref(), Some("1") | Some("true"))
}

/// Like [`flag`], but an absent attribute takes `default`
pub(crate) fn flag_or(e: &BytesStart, key: &[u8], default: bool) -> bool {
    match attr(e, key).as_deref() {
        Some("1") | Some("true") => true,
        Some("0") | Some("false") => false,
        _ => default,
    }
}

/// Escape text for element content and attribute values
pub(crate) fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            '\r' => out.push_str("_x000D_"),
            c if (c as u32) < 0x20 && c != '\n' && c != '\t' => {
                out.push_str(&format!("_x{:04X}_", c as u32))
            }
            c => out.push(c),
        }
    }
    out
}

/// Escape string cell content. Text that already reads as an `_xHHHH_`
/// escape gets its underscore written as `_x005F_` so it is not decoded on
/// the way back in.
pub(crate) fn escape_cell_text(s: &str) -> String {
    if !s.contains("_x") {
        return escape_xml(s);
    }

    let mut protected = String::with_capacity(s.len() + 12);
    let mut rest = s;
    while let Some(pos) = rest.find("_x") {
        protected.push_str(&rest[..pos]);
        let candidate = &rest[pos..];
        if is_escape_sequence(candidate) {
            protected.push_str("_x005F");
        }
        protected.push_str("_x");
        rest = &candidate[2..];
    }
    protected.push_str(rest);
    escape_xml(&protected)
}

/// `s` starts with `_xHHHH_`
fn is_escape_sequence(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() >= 7
        && bytes.starts_with(b"_x")
        && bytes[2..6].iter().all(u8::is_ascii_hexdigit)
        && bytes[6] == b'_'
}

/// Decode the `_xHHHH_` escapes spreadsheet writers use for control
/// characters (`_x000D_` = CR, `_x005F_` = underscore).
pub(crate) fn decode_excel_escapes(s: &str) -> String {
    if !s.contains("_x") {
        return s.to_string();
    }

    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(pos) = rest.find("_x") {
        out.push_str(&rest[..pos]);
        let candidate = &rest[pos..];
        let decoded = candidate
            .get(2..6)
            .filter(|_| is_escape_sequence(candidate))
            .and_then(|hex| u32::from_str_radix(hex, 16).ok())
            .and_then(char::from_u32);

        match decoded {
            Some(c) => {
                out.push(c);
                rest = &candidate[7..];
            }
            None => {
                out.push_str("_x");
                rest = &candidate[2..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Shortest decimal rendering of a float (`15` rather than `15.0`)
pub(crate) fn fmt_num(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_control_escapes() {
        assert_eq!(decode_excel_escapes("hello_x000d_world"), "hello\rworld");
        assert_eq!(decode_excel_escapes("a_x000D__x000A_b"), "a\r\nb");
        assert_eq!(decode_excel_escapes("col1_x0009_col2"), "col1\tcol2");
        assert_eq!(decode_excel_escapes("under_x005f_score"), "under_score");
    }

    #[test]
    fn test_decode_leaves_partial_sequences() {
        assert_eq!(decode_excel_escapes("plain text"), "plain text");
        assert_eq!(decode_excel_escapes("_x00"), "_x00");
        assert_eq!(decode_excel_escapes("_x000d"), "_x000d");
        assert_eq!(decode_excel_escapes("M_xyz_1"), "M_xyz_1");
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("A & B <C>"), "A &amp; B &lt;C&gt;");
        assert_eq!(escape_xml("Entregado por:\n(Cliente)"), "Entregado por:\n(Cliente)");
        assert_eq!(escape_xml("a\rb"), "a_x000D_b");
    }

    #[test]
    fn test_escape_cell_text_protects_literal_escapes() {
        assert_eq!(escape_cell_text("lote_x000D_7"), "lote_x005F_x000D_7");
        assert_eq!(escape_cell_text("M_x1 & a\rb"), "M_x1 &amp; a_x000D_b");
        assert_eq!(escape_cell_text("plain"), "plain");

        for text in ["lote_x000D_7", "_x005F_", "a_x0041__x0042_b", "a\r\nb"] {
            assert_eq!(decode_excel_escapes(&unescape(&escape_cell_text(text))), text);
        }
    }

    fn unescape(s: &str) -> String {
        quick_xml::escape::unescape(s).unwrap().into_owned()
    }

    #[test]
    fn test_fmt_num() {
        assert_eq!(fmt_num(15.0), "15");
        assert_eq!(fmt_num(210.5), "210.5");
        assert_eq!(fmt_num(-3.0), "-3");
    }
}
