//! `xl/styles.xml` codec
//!
//! Reading resolves every `cellXfs` entry into a full [`Style`] value.
//! Writing collects the styles used by all sheets, deduplicates them into one
//! `cellXfs` table and emits the font, fill, border and number format tables
//! those entries point into.

use std::collections::HashMap;
use std::hash::Hash;
use std::io::{BufReader, Read};

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::error::XlsxResult;
use crate::xml::{attr, escape_xml, flag, flag_or, fmt_num, parse_attr};
use formsheet_core::style::{
    Alignment, BorderEdge, BorderLineStyle, BorderStyle, Color, FillStyle, FontStyle,
    HorizontalAlignment, NumberFormat, PatternType, Protection, Style, Underline,
    VerticalAlignment,
};
use formsheet_core::Workbook;

// === Writing ===

/// Insertion-ordered set handing out stable ids
struct Interner<T> {
    items: Vec<T>,
    ids: HashMap<T, u32>,
}

impl<T: Hash + Eq + Clone> Interner<T> {
    fn with(initial: impl IntoIterator<Item = T>) -> Self {
        let mut interner = Self {
            items: Vec::new(),
            ids: HashMap::new(),
        };
        for item in initial {
            interner.id(&item);
        }
        interner
    }

    fn id(&mut self, item: &T) -> u32 {
        if let Some(&id) = self.ids.get(item) {
            return id;
        }
        let id = self.items.len() as u32;
        self.items.push(item.clone());
        self.ids.insert(item.clone(), id);
        id
    }
}

/// Workbook-wide `cellXfs` table plus the per-sheet index translation
#[derive(Debug)]
pub(crate) struct XlsxStyleTable {
    /// Index is the `cellXfs` position written as `s="..."`
    styles: Vec<Style>,
    /// Per worksheet: local style pool index -> `cellXfs` index
    sheet_maps: Vec<HashMap<u32, u32>>,
}

impl XlsxStyleTable {
    pub(crate) fn build(workbook: &Workbook) -> Self {
        let mut table = Interner::with([Style::default()]);
        let mut sheet_maps = Vec::with_capacity(workbook.sheet_count());

        for sheet in workbook.worksheets() {
            let mut map = HashMap::from([(0u32, 0u32)]);
            for (_, _, cell) in sheet.iter_cells() {
                let local = cell.style_index;
                if map.contains_key(&local) {
                    continue;
                }
                let style = sheet.style_pool().resolve(local);
                map.insert(local, table.id(style));
            }
            sheet_maps.push(map);
        }

        Self {
            styles: table.items,
            sheet_maps,
        }
    }

    /// `cellXfs` index for a cell's local style index
    pub(crate) fn xf_id_for(&self, sheet_index: usize, local_style_index: u32) -> u32 {
        self.sheet_maps
            .get(sheet_index)
            .and_then(|m| m.get(&local_style_index).copied())
            .unwrap_or(0)
    }

    pub(crate) fn to_styles_xml(&self) -> String {
        let mut fonts = Interner::with([FontStyle::default()]);
        let gray125 = FillStyle::Pattern {
            pattern: PatternType::Gray125,
            foreground: Color::Auto,
            background: Color::Auto,
        };
        // The first two fills are reserved: none and gray125
        let mut fills = Interner::with([FillStyle::None, gray125]);
        let mut borders = Interner::with([BorderStyle::default()]);
        let mut custom_formats: Vec<(u32, String)> = Vec::new();

        let mut xfs = String::new();
        for style in &self.styles {
            let num_fmt_id = match &style.number_format {
                NumberFormat::General => 0,
                NumberFormat::BuiltIn(id) => *id,
                NumberFormat::Custom(code) => match custom_formats.iter().find(|(_, c)| c == code) {
                    Some((id, _)) => *id,
                    None => {
                        let id = NumberFormat::FIRST_CUSTOM_ID + custom_formats.len() as u32;
                        custom_formats.push((id, code.clone()));
                        id
                    }
                },
            };
            let font_id = fonts.id(&style.font);
            let fill_id = fills.id(&style.fill);
            let border_id = borders.id(&style.border);

            xfs.push_str(&write_xf(style, num_fmt_id, font_id, fill_id, border_id));
        }

        let mut xml = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
        );

        if !custom_formats.is_empty() {
            xml.push_str(&format!("<numFmts count=\"{}\">", custom_formats.len()));
            for (id, code) in &custom_formats {
                xml.push_str(&format!(
                    "<numFmt numFmtId=\"{}\" formatCode=\"{}\"/>",
                    id,
                    escape_xml(code)
                ));
            }
            xml.push_str("</numFmts>");
        }

        xml.push_str(&format!("<fonts count=\"{}\">", fonts.items.len()));
        fonts.items.iter().for_each(|f| xml.push_str(&write_font(f)));
        xml.push_str("</fonts>");

        xml.push_str(&format!("<fills count=\"{}\">", fills.items.len()));
        fills.items.iter().for_each(|f| xml.push_str(&write_fill(f)));
        xml.push_str("</fills>");

        xml.push_str(&format!("<borders count=\"{}\">", borders.items.len()));
        borders.items.iter().for_each(|b| xml.push_str(&write_border(b)));
        xml.push_str("</borders>");

        xml.push_str(
            r#"<cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs>"#,
        );
        xml.push_str(&format!("<cellXfs count=\"{}\">{}</cellXfs>", self.styles.len(), xfs));
        xml.push_str(
            r#"<cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles>"#,
        );
        xml.push_str(r#"<dxfs count="0"/><tableStyles count="0"/>"#);
        xml.push_str("</styleSheet>");
        xml
    }
}

fn write_color(tag: &str, color: &Color) -> String {
    match color {
        Color::Auto => format!("<{tag} indexed=\"64\"/>"),
        Color::Indexed(i) => format!("<{tag} indexed=\"{i}\"/>"),
        Color::Argb { .. } => format!(
            "<{tag} rgb=\"{}\"/>",
            color.argb_hex().unwrap_or_default()
        ),
        Color::Theme { index, .. } => match color.tint_value() {
            Some(tint) => format!("<{tag} theme=\"{index}\" tint=\"{tint}\"/>"),
            None => format!("<{tag} theme=\"{index}\"/>"),
        },
    }
}

fn write_font(font: &FontStyle) -> String {
    let mut s = String::from("<font>");
    if font.bold {
        s.push_str("<b/>");
    }
    if font.italic {
        s.push_str("<i/>");
    }
    if font.strikethrough {
        s.push_str("<strike/>");
    }
    match font.underline.as_str() {
        None => {}
        Some("single") => s.push_str("<u/>"),
        Some(val) => s.push_str(&format!("<u val=\"{val}\"/>")),
    }
    s.push_str(&format!("<sz val=\"{}\"/>", fmt_num(font.size)));
    if !font.color.is_auto() {
        s.push_str(&write_color("color", &font.color));
    }
    s.push_str(&format!("<name val=\"{}\"/>", escape_xml(&font.name)));
    if let Some(family) = font.family {
        s.push_str(&format!("<family val=\"{family}\"/>"));
    }
    s.push_str("</font>");
    s
}

fn write_fill(fill: &FillStyle) -> String {
    match fill {
        FillStyle::None => r#"<fill><patternFill patternType="none"/></fill>"#.to_string(),
        FillStyle::Solid { color } => format!(
            "<fill><patternFill patternType=\"solid\">{}{}</patternFill></fill>",
            write_color("fgColor", color),
            write_color("bgColor", &Color::Auto)
        ),
        FillStyle::Pattern {
            pattern,
            foreground,
            background,
        } => {
            let mut s = format!("<fill><patternFill patternType=\"{}\"", pattern.as_str());
            if foreground.is_auto() && background.is_auto() {
                s.push_str("/></fill>");
                return s;
            }
            s.push('>');
            if !foreground.is_auto() {
                s.push_str(&write_color("fgColor", foreground));
            }
            if !background.is_auto() {
                s.push_str(&write_color("bgColor", background));
            }
            s.push_str("</patternFill></fill>");
            s
        }
    }
}

fn write_border(border: &BorderStyle) -> String {
    let mut s = String::from("<border");
    if border.diagonal_up {
        s.push_str(" diagonalUp=\"1\"");
    }
    if border.diagonal_down {
        s.push_str(" diagonalDown=\"1\"");
    }
    s.push('>');
    for (tag, edge) in [
        ("left", &border.left),
        ("right", &border.right),
        ("top", &border.top),
        ("bottom", &border.bottom),
        ("diagonal", &border.diagonal),
    ] {
        match edge.as_ref().and_then(|e| e.style.as_str().map(|name| (name, e.color))) {
            Some((name, color)) => s.push_str(&format!(
                "<{tag} style=\"{name}\">{}</{tag}>",
                write_color("color", &color)
            )),
            None => s.push_str(&format!("<{tag}/>")),
        }
    }
    s.push_str("</border>");
    s
}

fn write_alignment(a: &Alignment) -> String {
    if a.is_default() {
        return String::new();
    }
    let mut s = String::from("<alignment");
    if a.horizontal != HorizontalAlignment::General {
        s.push_str(&format!(" horizontal=\"{}\"", a.horizontal.as_str()));
    }
    if a.vertical != VerticalAlignment::Bottom {
        s.push_str(&format!(" vertical=\"{}\"", a.vertical.as_str()));
    }
    if a.rotation != 0 {
        s.push_str(&format!(" textRotation=\"{}\"", a.rotation));
    }
    if a.wrap_text {
        s.push_str(" wrapText=\"1\"");
    }
    if a.shrink_to_fit {
        s.push_str(" shrinkToFit=\"1\"");
    }
    if a.indent != 0 {
        s.push_str(&format!(" indent=\"{}\"", a.indent));
    }
    s.push_str("/>");
    s
}

fn write_xf(style: &Style, num_fmt_id: u32, font_id: u32, fill_id: u32, border_id: u32) -> String {
    let mut s = format!(
        "<xf numFmtId=\"{num_fmt_id}\" fontId=\"{font_id}\" fillId=\"{fill_id}\" borderId=\"{border_id}\" xfId=\"0\""
    );
    if num_fmt_id != 0 {
        s.push_str(" applyNumberFormat=\"1\"");
    }
    if font_id != 0 {
        s.push_str(" applyFont=\"1\"");
    }
    if fill_id != 0 {
        s.push_str(" applyFill=\"1\"");
    }
    if border_id != 0 {
        s.push_str(" applyBorder=\"1\"");
    }
    if !style.alignment.is_default() {
        s.push_str(" applyAlignment=\"1\"");
    }
    let protection = style.protection != Protection::default();
    if protection {
        s.push_str(" applyProtection=\"1\"");
    }

    let alignment = write_alignment(&style.alignment);
    if alignment.is_empty() && !protection {
        s.push_str("/>");
        return s;
    }
    s.push('>');
    s.push_str(&alignment);
    if protection {
        s.push_str(&format!(
            "<protection locked=\"{}\" hidden=\"{}\"/>",
            u8::from(style.protection.locked),
            u8::from(style.protection.hidden)
        ));
    }
    s.push_str("</xf>");
    s
}

// === Reading ===

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Other,
    NumFmts,
    Fonts,
    Fills,
    Borders,
    CellXfs,
}

#[derive(Debug, Default)]
struct PendingFill {
    pattern: Option<PatternType>,
    foreground: Color,
    background: Color,
}

impl PendingFill {
    fn finish(self) -> FillStyle {
        match self.pattern.unwrap_or_default() {
            PatternType::None => FillStyle::None,
            PatternType::Solid => FillStyle::Solid {
                color: self.foreground,
            },
            pattern => FillStyle::Pattern {
                pattern,
                foreground: self.foreground,
                background: self.background,
            },
        }
    }
}

/// Parse state for one pass over `styles.xml`
struct StylesParser {
    section: Section,
    num_fmts: HashMap<u32, String>,
    fonts: Vec<FontStyle>,
    fills: Vec<FillStyle>,
    borders: Vec<BorderStyle>,
    cell_xfs: Vec<Style>,
    font: Option<FontStyle>,
    fill: Option<PendingFill>,
    border: Option<BorderStyle>,
    edge: Option<(&'static str, BorderEdge)>,
    xf: Option<Style>,
}

impl StylesParser {
    fn new() -> Self {
        Self {
            section: Section::Other,
            num_fmts: HashMap::new(),
            fonts: Vec::new(),
            fills: Vec::new(),
            borders: Vec::new(),
            cell_xfs: Vec::new(),
            font: None,
            fill: None,
            border: None,
            edge: None,
            xf: None,
        }
    }

    fn open(&mut self, e: &BytesStart) {
        match (self.section, e.name().as_ref()) {
            (_, b"numFmts") => self.section = Section::NumFmts,
            (_, b"fonts") => self.section = Section::Fonts,
            (_, b"fills") => self.section = Section::Fills,
            (_, b"borders") => self.section = Section::Borders,
            (_, b"cellXfs") => self.section = Section::CellXfs,
            (_, b"cellStyleXfs") | (_, b"dxfs") | (_, b"cellStyles") => {
                self.section = Section::Other
            }

            (Section::NumFmts, b"numFmt") => {
                if let (Some(id), Some(code)) = (parse_attr(e, b"numFmtId"), attr(e, b"formatCode")) {
                    self.num_fmts.insert(id, code);
                }
            }

            (Section::Fonts, b"font") => self.font = Some(FontStyle {
                family: None,
                ..FontStyle::default()
            }),
            (Section::Fonts, tag) => {
                if let Some(font) = self.font.as_mut() {
                    apply_font_property(font, tag, e);
                }
            }

            (Section::Fills, b"fill") => self.fill = Some(PendingFill::default()),
            (Section::Fills, b"patternFill") => {
                if let Some(fill) = self.fill.as_mut() {
                    fill.pattern = attr(e, b"patternType").map(|p| PatternType::parse(&p));
                }
            }
            (Section::Fills, b"fgColor") => {
                if let Some(fill) = self.fill.as_mut() {
                    fill.foreground = parse_color(e);
                }
            }
            (Section::Fills, b"bgColor") => {
                if let Some(fill) = self.fill.as_mut() {
                    fill.background = parse_color(e);
                }
            }

            (Section::Borders, b"border") => {
                self.border = Some(BorderStyle {
                    diagonal_up: flag(e, b"diagonalUp"),
                    diagonal_down: flag(e, b"diagonalDown"),
                    ..BorderStyle::default()
                })
            }
            (Section::Borders, b"color") => {
                if let Some((_, edge)) = self.edge.as_mut() {
                    edge.color = parse_color(e);
                }
            }
            (Section::Borders, tag) => {
                let side = match tag {
                    b"left" | b"start" => Some("left"),
                    b"right" | b"end" => Some("right"),
                    b"top" => Some("top"),
                    b"bottom" => Some("bottom"),
                    b"diagonal" => Some("diagonal"),
                    _ => None,
                };
                if let Some(side) = side {
                    let style = attr(e, b"style")
                        .map(|s| BorderLineStyle::parse(&s))
                        .unwrap_or_default();
                    self.edge = Some((side, BorderEdge::new(style, Color::Auto)));
                }
            }

            (Section::CellXfs, b"xf") => self.xf = Some(self.resolve_xf(e)),
            (Section::CellXfs, b"alignment") => {
                if let Some(xf) = self.xf.as_mut() {
                    xf.alignment = parse_alignment(e);
                }
            }
            (Section::CellXfs, b"protection") => {
                if let Some(xf) = self.xf.as_mut() {
                    xf.protection = Protection {
                        locked: flag_or(e, b"locked", true),
                        hidden: flag(e, b"hidden"),
                    };
                }
            }
            _ => {}
        }
    }

    fn close(&mut self, name: &[u8]) {
        match name {
            b"numFmts" | b"fonts" | b"fills" | b"borders" | b"cellXfs" => {
                self.section = Section::Other
            }
            b"font" if self.section == Section::Fonts => {
                if let Some(font) = self.font.take() {
                    self.fonts.push(font);
                }
            }
            b"fill" if self.section == Section::Fills => {
                if let Some(fill) = self.fill.take() {
                    self.fills.push(fill.finish());
                }
            }
            b"left" | b"start" | b"right" | b"end" | b"top" | b"bottom" | b"diagonal"
                if self.section == Section::Borders =>
            {
                if let (Some(border), Some((side, edge))) = (self.border.as_mut(), self.edge.take()) {
                    let slot = match side {
                        "left" => &mut border.left,
                        "right" => &mut border.right,
                        "top" => &mut border.top,
                        "bottom" => &mut border.bottom,
                        _ => &mut border.diagonal,
                    };
                    *slot = (edge.style != BorderLineStyle::None).then_some(edge);
                }
            }
            b"border" if self.section == Section::Borders => {
                if let Some(border) = self.border.take() {
                    self.borders.push(border);
                }
            }
            b"xf" if self.section == Section::CellXfs => {
                if let Some(xf) = self.xf.take() {
                    self.cell_xfs.push(xf);
                }
            }
            _ => {}
        }
    }

    fn resolve_xf(&self, e: &BytesStart) -> Style {
        let num_fmt_id: u32 = parse_attr(e, b"numFmtId").unwrap_or(0);
        let index = |key: &[u8]| parse_attr::<usize>(e, key).unwrap_or(0);

        Style {
            font: self.fonts.get(index(b"fontId")).cloned().unwrap_or_default(),
            fill: self.fills.get(index(b"fillId")).copied().unwrap_or_default(),
            border: self.borders.get(index(b"borderId")).cloned().unwrap_or_default(),
            alignment: Alignment::default(),
            number_format: match self.num_fmts.get(&num_fmt_id) {
                Some(code) => NumberFormat::from_code(code),
                None => NumberFormat::from_id(num_fmt_id),
            },
            protection: Protection::default(),
        }
    }
}

fn apply_font_property(font: &mut FontStyle, tag: &[u8], e: &BytesStart) {
    match tag {
        b"b" => font.bold = flag_or(e, b"val", true),
        b"i" => font.italic = flag_or(e, b"val", true),
        b"strike" => font.strikethrough = flag_or(e, b"val", true),
        b"u" => {
            font.underline = attr(e, b"val")
                .map(|v| Underline::parse(&v))
                .unwrap_or(Underline::Single)
        }
        b"sz" => font.size = parse_attr(e, b"val").unwrap_or(font.size),
        b"name" => font.name = attr(e, b"val").unwrap_or_else(|| font.name.clone()),
        b"family" => font.family = parse_attr(e, b"val"),
        b"color" => font.color = parse_color(e),
        _ => {}
    }
}

fn parse_color(e: &BytesStart) -> Color {
    if flag(e, b"auto") {
        return Color::Auto;
    }
    if let Some(color) = attr(e, b"rgb").and_then(|rgb| Color::from_hex(&rgb)) {
        return color;
    }
    if let Some(index) = parse_attr::<u8>(e, b"theme") {
        let tint = parse_attr::<f64>(e, b"tint").map(Color::tint_from_f64).unwrap_or(0);
        return Color::Theme { index, tint };
    }
    match parse_attr::<u8>(e, b"indexed") {
        Some(64) | None => Color::Auto,
        Some(i) => Color::Indexed(i),
    }
}

fn parse_alignment(e: &BytesStart) -> Alignment {
    Alignment {
        horizontal: attr(e, b"horizontal")
            .map(|v| HorizontalAlignment::parse(&v))
            .unwrap_or_default(),
        vertical: attr(e, b"vertical")
            .map(|v| VerticalAlignment::parse(&v))
            .unwrap_or_default(),
        wrap_text: flag(e, b"wrapText"),
        shrink_to_fit: flag(e, b"shrinkToFit"),
        indent: parse_attr(e, b"indent").unwrap_or(0),
        rotation: parse_attr(e, b"textRotation").unwrap_or(0),
    }
}

/// Parse `styles.xml` into the `cellXfs` table; position `i` is the style
/// cells reference with `s="i"`.
pub(crate) fn read_styles_xml<R: Read>(reader: R) -> XlsxResult<Vec<Style>> {
    let mut xml_reader = Reader::from_reader(BufReader::new(reader));
    xml_reader.trim_text(true);

    let mut parser = StylesParser::new();
    let mut buf = Vec::new();

    loop {
        match xml_reader.read_event_into(&mut buf)? {
            Event::Start(e) => parser.open(&e),
            Event::Empty(e) => {
                parser.open(&e);
                parser.close(e.name().as_ref());
            }
            Event::End(e) => parser.close(e.name().as_ref()),
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if parser.cell_xfs.is_empty() {
        parser.cell_xfs.push(Style::default());
    }
    Ok(parser.cell_xfs)
}
