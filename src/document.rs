//! The finished document tree: fonts, colors, and an ordered list of
//! top-level content (text, breaks, tables, images, hyperlinks).
//!
//! Every owned string/byte buffer here belongs to its `ContentElement` (or to
//! the `Document` itself for the font/color tables); dropping the `Document`
//! drops everything reachable from it in one pass, matching the "one arena,
//! one owner" lifecycle from the data model — implemented with ordinary
//! `String`/`Vec<u8>` ownership rather than a self-referential bump arena
//! (see DESIGN.md).

use crate::format::{CharFormat, ParaFormat};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontFamily {
    DontCare,
    Roman,
    Swiss,
    Modern,
    Script,
    Decorative,
}

impl Default for FontFamily {
    fn default() -> Self {
        FontFamily::DontCare
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontInfo {
    pub id: u16,
    pub name: String,
    pub family: FontFamily,
    pub charset: u8,
}

/// `id == 0` is always the reserved "auto" color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorInfo {
    pub id: u16,
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Unknown,
    Wmf,
    Emf,
    Pict,
    Jpeg,
    Png,
}

impl Default for ImageFormat {
    fn default() -> Self {
        ImageFormat::Unknown
    }
}

#[derive(Debug, Clone)]
pub struct Image {
    pub format: ImageFormat,
    pub width: i32,
    pub height: i32,
    /// `true` when `width`/`height` came from `\picwgoalN`/`\pichgoalN`
    /// (pixels) rather than `\picwN`/`\pichN` (twips).
    pub dimensions_in_pixels: bool,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct Hyperlink {
    pub url: String,
    pub display_text: String,
    pub runs: Vec<TextRun>,
}

/// A run of text with its formatting.
///
/// `hyperlink_url` is set when this run also appears as the display text of
/// a `Hyperlink` element, so callers scanning the flattened run list don't
/// have to separately walk hyperlinks to notice a link is present.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub text: String,
    pub char_format: CharFormat,
    pub para_format: ParaFormat,
    pub hyperlink_url: Option<String>,
}

#[derive(Debug, Clone)]
pub enum ContentElement {
    TextRun(TextRun),
    ParagraphBreak,
    LineBreak,
    PageBreak,
    Table(Table),
    Image(Image),
    Hyperlink(Hyperlink),
}

#[derive(Debug, Clone, Default)]
pub struct TableCell {
    pub content: Vec<ContentElement>,
    pub width_twips: i32,
    pub border_top: bool,
    pub border_bottom: bool,
    pub border_left: bool,
    pub border_right: bool,
}

#[derive(Debug, Clone, Default)]
pub struct TableRow {
    pub cells: Vec<TableCell>,
    pub height_twips: i32,
}

#[derive(Debug, Clone, Default)]
pub struct Table {
    pub rows: Vec<TableRow>,
}

impl Table {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn cell_count(&self, row: usize) -> usize {
        self.rows.get(row).map_or(0, |r| r.cells.len())
    }
}

#[derive(Debug, Clone)]
pub struct DocumentDefaults {
    pub default_font_id: u16,
    pub default_font_size_half_points: u16,
    pub code_page: u32,
    pub rtf_version: i32,
}

impl Default for DocumentDefaults {
    fn default() -> Self {
        DocumentDefaults {
            default_font_id: 0,
            default_font_size_half_points: 24,
            code_page: 1252,
            rtf_version: 1,
        }
    }
}

/// The root container produced by parsing.
#[derive(Debug, Clone, Default)]
pub struct Document {
    pub(crate) content: Vec<ContentElement>,
    pub(crate) fonts: Vec<FontInfo>,
    pub(crate) colors: Vec<ColorInfo>,
    pub(crate) defaults: DocumentDefaults,
}

impl Document {
    pub(crate) fn new() -> Self {
        Document::default()
    }

    pub fn content(&self) -> &[ContentElement] {
        &self.content
    }

    pub fn fonts(&self) -> &[FontInfo] {
        &self.fonts
    }

    pub fn colors(&self) -> &[ColorInfo] {
        &self.colors
    }

    pub fn defaults(&self) -> &DocumentDefaults {
        &self.defaults
    }

    /// `font(id)` returns `Some` iff `id` appeared in the font table group;
    /// lookups that miss (e.g. a `CharFormat.font_id` with no matching
    /// entry) are left to the caller to treat as "default".
    pub fn font(&self, id: u16) -> Option<&FontInfo> {
        self.fonts.iter().find(|f| f.id == id)
    }

    /// `color(0)` is always the auto color even if `\colortbl` never defined
    /// RGB bytes for it explicitly.
    pub fn color(&self, id: u16) -> Option<&ColorInfo> {
        self.colors.iter().find(|c| c.id == id)
    }

    pub fn table_count(&self) -> usize {
        self.content.iter().filter(|e| matches!(e, ContentElement::Table(_))).count()
    }

    pub fn table(&self, index: usize) -> Option<&Table> {
        self.content
            .iter()
            .filter_map(|e| match e {
                ContentElement::Table(t) => Some(t),
                _ => None,
            })
            .nth(index)
    }

    pub fn image_count(&self) -> usize {
        self.content.iter().filter(|e| matches!(e, ContentElement::Image(_))).count()
    }

    pub fn image(&self, index: usize) -> Option<&Image> {
        self.content
            .iter()
            .filter_map(|e| match e {
                ContentElement::Image(i) => Some(i),
                _ => None,
            })
            .nth(index)
    }

    /// Flattened (text, `CharFormat`, `ParaFormat`) view over tables and
    /// hyperlinks, in document order.
    pub fn text_runs(&self) -> Vec<&TextRun> {
        let mut out = Vec::new();
        collect_text_runs(&self.content, &mut out);
        out
    }

    /// Concatenation of all text runs in document order.
    ///
    /// `\n\n` separates paragraph breaks, `\n` separates line breaks and
    /// (per this crate's resolution of the spec's Open Question) page
    /// breaks, `\t` separates table cells, `\n` follows each table row, and
    /// hyperlink display text is inlined at its position in the flow.
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        render_elements(&self.content, &mut out);
        out
    }
}

fn collect_text_runs<'a>(elements: &'a [ContentElement], out: &mut Vec<&'a TextRun>) {
    for element in elements {
        match element {
            ContentElement::TextRun(run) => out.push(run),
            ContentElement::Table(table) => {
                for row in &table.rows {
                    for cell in &row.cells {
                        collect_text_runs(&cell.content, out);
                    }
                }
            }
            ContentElement::Hyperlink(link) => out.extend(link.runs.iter()),
            ContentElement::ParagraphBreak | ContentElement::LineBreak | ContentElement::PageBreak | ContentElement::Image(_) => {}
        }
    }
}

fn render_elements(elements: &[ContentElement], out: &mut String) {
    for element in elements {
        match element {
            ContentElement::TextRun(run) => out.push_str(&run.text),
            ContentElement::ParagraphBreak => out.push_str("\n\n"),
            ContentElement::LineBreak => out.push('\n'),
            ContentElement::PageBreak => out.push_str("\n\n"),
            ContentElement::Image(_) => {}
            ContentElement::Hyperlink(link) => out.push_str(&link.display_text),
            ContentElement::Table(table) => {
                for row in &table.rows {
                    for (i, cell) in row.cells.iter().enumerate() {
                        if i > 0 {
                            out.push('\t');
                        }
                        render_elements(&cell.content, out);
                    }
                    out.push('\n');
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(text: &str) -> TextRun {
        TextRun {
            text: text.to_string(),
            char_format: CharFormat::default(),
            para_format: ParaFormat::default(),
            hyperlink_url: None,
        }
    }

    #[test]
    fn plain_text_joins_paragraphs() {
        let doc = Document {
            content: vec![
                ContentElement::TextRun(run("First")),
                ContentElement::ParagraphBreak,
                ContentElement::TextRun(run("Second")),
            ],
            ..Document::default()
        };
        assert_eq!(doc.plain_text(), "First\n\nSecond");
    }

    #[test]
    fn plain_text_renders_table_rows() {
        let cell = |t: &str| TableCell { content: vec![ContentElement::TextRun(run(t))], ..Default::default() };
        let table = Table {
            rows: vec![
                TableRow { cells: vec![cell("H1"), cell("H2"), cell("H3")], height_twips: 0 },
                TableRow { cells: vec![cell("D1"), cell("D2"), cell("D3")], height_twips: 0 },
            ],
        };
        let doc = Document { content: vec![ContentElement::Table(table)], ..Document::default() };
        assert_eq!(doc.plain_text(), "H1\tH2\tH3\nD1\tD2\tD3\n");
        assert_eq!(doc.table(0).unwrap().row_count(), 2);
        assert_eq!(doc.table(0).unwrap().cell_count(0), 3);
    }

    #[test]
    fn font_lookup_misses_return_none() {
        let doc = Document::default();
        assert!(doc.font(7).is_none());
    }

    #[test]
    fn text_runs_flatten_tables_and_hyperlinks() {
        let cell_run = run("cell text");
        let table = Table {
            rows: vec![TableRow {
                cells: vec![TableCell { content: vec![ContentElement::TextRun(cell_run.clone())], ..Default::default() }],
                height_twips: 0,
            }],
        };
        let link = Hyperlink { url: "https://example.com".into(), display_text: "link".into(), runs: vec![run("link")] };
        let doc = Document {
            content: vec![ContentElement::Table(table), ContentElement::Hyperlink(link)],
            ..Document::default()
        };
        let runs = doc.text_runs();
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].text, "cell text");
        assert_eq!(runs[1].text, "link");
    }
}
