//! Print layout of a worksheet
//!
//! Printed forms depend on these settings to fit on one sheet of paper, so
//! they are carried through a read/write cycle unchanged.

/// `<pageSetup>` plus the `fitToPage` flag from `<sheetPr>`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PageSetup {
    /// Paper size code (1 = Letter, 9 = A4)
    pub paper_size: Option<u16>,
    pub orientation: Option<PageOrientation>,
    /// Scale percentage (10-400)
    pub scale: Option<u16>,
    /// Pages wide when fitting to page (0 = automatic)
    pub fit_to_width: Option<u16>,
    /// Pages tall when fitting to page (0 = automatic)
    pub fit_to_height: Option<u16>,
    /// Print scaling uses the fit-to values instead of `scale`
    pub fit_to_page: bool,
}

impl PageSetup {
    /// Nothing would be written for `<pageSetup>`
    pub fn is_empty(&self) -> bool {
        self.paper_size.is_none()
            && self.orientation.is_none()
            && self.scale.is_none()
            && self.fit_to_width.is_none()
            && self.fit_to_height.is_none()
    }
}

/// Page orientation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageOrientation {
    Portrait,
    Landscape,
}

impl PageOrientation {
    pub fn as_str(&self) -> &'static str {
        match self {
            PageOrientation::Portrait => "portrait",
            PageOrientation::Landscape => "landscape",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "portrait" => Some(PageOrientation::Portrait),
            "landscape" => Some(PageOrientation::Landscape),
            _ => None,
        }
    }
}

/// `<pageMargins>`, all values in inches
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageMargins {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
    pub header: f64,
    pub footer: f64,
}

impl Default for PageMargins {
    fn default() -> Self {
        Self {
            left: 0.7,
            right: 0.7,
            top: 0.75,
            bottom: 0.75,
            header: 0.3,
            footer: 0.3,
        }
    }
}
