//! Number formats

/// Number format of a cell style
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum NumberFormat {
    /// General format (built-in id 0)
    #[default]
    General,

    /// Built-in format by id
    BuiltIn(u32),

    /// Custom format code
    Custom(String),
}

impl NumberFormat {
    /// 49 - `@`, literal text
    pub const ID_TEXT: u32 = 49;

    /// First id available to custom formats in `styles.xml`
    pub const FIRST_CUSTOM_ID: u32 = 164;

    /// Text format (`@`)
    pub fn text() -> Self {
        NumberFormat::BuiltIn(Self::ID_TEXT)
    }

    /// Resolve a `numFmtId`; custom ids without a code fall back to General
    pub fn from_id(id: u32) -> Self {
        match id {
            0 => NumberFormat::General,
            id if builtin_code(id).is_some() => NumberFormat::BuiltIn(id),
            _ => NumberFormat::General,
        }
    }

    /// Build from a format code, folding built-in codes back to their ids
    pub fn from_code(code: &str) -> Self {
        match (0..Self::FIRST_CUSTOM_ID).find(|id| builtin_code(*id) == Some(code)) {
            Some(0) => NumberFormat::General,
            Some(id) => NumberFormat::BuiltIn(id),
            None => NumberFormat::Custom(code.to_string()),
        }
    }

    pub fn format_code(&self) -> &str {
        match self {
            NumberFormat::General => "General",
            NumberFormat::BuiltIn(id) => builtin_code(*id).unwrap_or("General"),
            NumberFormat::Custom(code) => code,
        }
    }

    /// True for the literal-text format `@`
    pub fn is_text(&self) -> bool {
        self.format_code() == "@"
    }
}

fn builtin_code(id: u32) -> Option<&'static str> {
    Some(match id {
        0 => "General",
        1 => "0",
        2 => "0.00",
        3 => "#,##0",
        4 => "#,##0.00",
        9 => "0%",
        10 => "0.00%",
        11 => "0.00E+00",
        12 => "# ?/?",
        13 => "# ??/??",
        14 => "mm-dd-yy",
        15 => "d-mmm-yy",
        16 => "d-mmm",
        17 => "mmm-yy",
        18 => "h:mm AM/PM",
        19 => "h:mm:ss AM/PM",
        20 => "h:mm",
        21 => "h:mm:ss",
        22 => "m/d/yy h:mm",
        37 => "#,##0 ;(#,##0)",
        38 => "#,##0 ;[Red](#,##0)",
        39 => "#,##0.00;(#,##0.00)",
        40 => "#,##0.00;[Red](#,##0.00)",
        45 => "mm:ss",
        46 => "[h]:mm:ss",
        47 => "mmss.0",
        48 => "##0.0E+0",
        49 => "@",
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_format() {
        assert!(NumberFormat::text().is_text());
        assert!(NumberFormat::Custom("@".into()).is_text());
        assert!(!NumberFormat::General.is_text());
    }

    #[test]
    fn test_codes_fold_to_builtins() {
        assert_eq!(NumberFormat::from_code("@"), NumberFormat::text());
        assert_eq!(NumberFormat::from_code("General"), NumberFormat::General);
        assert_eq!(
            NumberFormat::from_code("dd/mm/yyyy"),
            NumberFormat::Custom("dd/mm/yyyy".into())
        );
        assert_eq!(NumberFormat::from_id(14).format_code(), "mm-dd-yy");
        assert_eq!(NumberFormat::from_id(170), NumberFormat::General);
    }
}
