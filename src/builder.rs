//! Wires a [`Sink`] up to accumulate a [`Document`] as the parser drives it.

use std::cell::RefCell;

use crate::document::{
    ColorInfo, ContentElement, Document, DocumentDefaults, FontFamily, FontInfo, Hyperlink, Image, ImageFormat, Table, TableCell,
    TableRow, TextRun,
};
use crate::events::Sink;
use crate::format::{CharFormat, ParaFormat};

/// A table row under construction: `\cellx` boundaries accumulate before any
/// cell content arrives, then each `\cell` slices the accumulated content off
/// into a `TableCell` sized from the matching boundary pair.
#[derive(Default)]
struct TableRowBuild {
    /// Cumulative right boundary, in twips, of each declared cell.
    boundaries: Vec<i32>,
    cells: Vec<TableCell>,
    current_cell: Vec<ContentElement>,
}

struct Inner {
    document: Document,
    /// Set while inside a `\field` whose `\fldinst` named `HYPERLINK`; runs
    /// accumulated afterward get tagged with this URL until cleared.
    pending_hyperlink_url: Option<String>,
    /// `content` index where the matching `\fldrslt` group started, so its
    /// runs can be sliced off and wrapped once that group closes.
    hyperlink_mark: Option<usize>,
    /// `Some` between `\trowd` and the matching `\row`. Rows accumulate onto
    /// the most recent top-level `Table` element, or start a new one.
    table_row: Option<TableRowBuild>,
}

/// Owns the in-progress [`Document`] behind a `RefCell`, so [`Self::sink`]
/// can hand out a [`Sink`] whose closures only need a shared `&self` —
/// several `FnMut` closures can't each hold an exclusive `&mut` to the same
/// builder at once, but they can each hold a copy of a shared reference into
/// one.
pub struct DocumentBuilder {
    inner: RefCell<Inner>,
}

impl DocumentBuilder {
    pub fn new() -> Self {
        DocumentBuilder {
            inner: RefCell::new(Inner {
                document: Document::new(),
                pending_hyperlink_url: None,
                hyperlink_mark: None,
                table_row: None,
            }),
        }
    }

    /// Record a hyperlink target parsed out of a `\fldinst` destination's
    /// raw text (e.g. `HYPERLINK "https://example.com"`). The document
    /// builder doesn't parse field instructions itself — the caller (the
    /// crate's top-level `parse_*` entry points) extracts the URL and calls
    /// this before the matching `\fldrslt` runs start arriving.
    pub fn set_pending_hyperlink(&self, url: Option<String>) {
        self.inner.borrow_mut().pending_hyperlink_url = url;
    }

    pub fn push_text(&self, text: &str, char_format: &CharFormat, para_format: &ParaFormat) {
        if text.is_empty() {
            return;
        }
        let mut inner = self.inner.borrow_mut();
        let hyperlink_url = inner.pending_hyperlink_url.clone();
        let element = ContentElement::TextRun(TextRun {
            text: text.to_string(),
            char_format: *char_format,
            para_format: *para_format,
            hyperlink_url,
        });
        Self::push_content(&mut *inner, element);
    }

    pub fn push_char(&self, ch: char, char_format: &CharFormat, para_format: &ParaFormat) {
        let element = match ch {
            '\u{2029}' => ContentElement::ParagraphBreak,
            '\n' => ContentElement::LineBreak,
            '\u{000C}' => ContentElement::PageBreak,
            _ => {
                let mut buf = [0u8; 4];
                return self.push_text(ch.encode_utf8(&mut buf), char_format, para_format);
            }
        };
        let mut inner = self.inner.borrow_mut();
        Self::push_content(&mut *inner, element);
    }

    /// Route a content element into the cell under construction, if any,
    /// else append it to the top-level document.
    fn push_content(inner: &mut Inner, element: ContentElement) {
        match &mut inner.table_row {
            Some(row) => row.current_cell.push(element),
            None => inner.document.content.push(element),
        }
    }

    pub fn push_font_table_entry(&self, id: u16, name: String, family: FontFamily, charset: u8) {
        self.inner.borrow_mut().document.fonts.push(FontInfo { id, name, family, charset });
    }

    pub fn push_color_table_entry(&self, id: u16, red: u8, green: u8, blue: u8) {
        self.inner.borrow_mut().document.colors.push(ColorInfo { id, red, green, blue });
    }

    pub fn set_defaults(&self, defaults: DocumentDefaults) {
        self.inner.borrow_mut().document.defaults = defaults;
    }

    /// Wrap the runs pushed since `mark` into a [`Hyperlink`] element,
    /// replacing them in the content list (used once a `\fldrslt` group
    /// closes). Operates on whichever list `mark` was measured against —
    /// the in-progress table cell, if any, else the top-level document.
    pub fn wrap_trailing_runs_as_hyperlink(&self, mark: usize, url: String) {
        let mut inner = self.inner.borrow_mut();
        let target = match &mut inner.table_row {
            Some(row) => &mut row.current_cell,
            None => &mut inner.document.content,
        };
        let tail: Vec<TextRun> = target
            .split_off(mark)
            .into_iter()
            .filter_map(|e| match e {
                ContentElement::TextRun(run) => Some(run),
                _ => None,
            })
            .collect();
        let display_text = tail.iter().map(|r| r.text.as_str()).collect::<String>();
        target.push(ContentElement::Hyperlink(Hyperlink { url, display_text, runs: tail }));
    }

    pub fn content_len(&self) -> usize {
        let inner = self.inner.borrow();
        match &inner.table_row {
            Some(row) => row.current_cell.len(),
            None => inner.document.content.len(),
        }
    }

    /// `\trowd`: begin accumulating a new row's cell boundaries and content.
    pub fn start_table_row(&self) {
        self.inner.borrow_mut().table_row = Some(TableRowBuild::default());
    }

    /// `\cellxN`: record the cumulative right boundary, in twips, of the
    /// next cell. A no-op outside an active row (malformed input).
    pub fn record_cell_boundary(&self, boundary_twips: i32) {
        if let Some(row) = &mut self.inner.borrow_mut().table_row {
            row.boundaries.push(boundary_twips);
        }
    }

    /// `\cell`: close out the cell whose content has been accumulating,
    /// sizing it from the boundary pair at its position in the row.
    pub fn end_table_cell(&self) {
        let mut inner = self.inner.borrow_mut();
        let Some(row) = &mut inner.table_row else { return };
        let index = row.cells.len();
        let left = if index == 0 { 0 } else { row.boundaries.get(index - 1).copied().unwrap_or(0) };
        let right = row.boundaries.get(index).copied().unwrap_or(left);
        let content = std::mem::take(&mut row.current_cell);
        row.cells.push(TableCell {
            content,
            width_twips: (right - left).max(0),
            border_top: false,
            border_bottom: false,
            border_left: false,
            border_right: false,
        });
    }

    /// `\row`: the row is complete. Appends it to the most recent top-level
    /// `Table` element if the content list ends with one (coalescing
    /// consecutive rows into a single table without needing lookahead for
    /// where the table actually ends), else starts a new one.
    pub fn end_table_row(&self) {
        let mut inner = self.inner.borrow_mut();
        let Some(row) = inner.table_row.take() else { return };
        let table_row = TableRow { cells: row.cells, height_twips: 0 };
        match inner.document.content.last_mut() {
            Some(ContentElement::Table(table)) => table.rows.push(table_row),
            _ => inner.document.content.push(ContentElement::Table(Table { rows: vec![table_row] })),
        }
    }

    /// A `\pict` destination's image, once its group closed.
    pub fn push_image(&self, format: ImageFormat, width: i32, height: i32, dimensions_in_pixels: bool, data: &[u8]) {
        let element = ContentElement::Image(Image { format, width, height, dimensions_in_pixels, data: data.to_vec() });
        let mut inner = self.inner.borrow_mut();
        Self::push_content(&mut *inner, element);
    }

    /// Parse a `\fldinst` destination's raw text for a `HYPERLINK "..."`
    /// target and, if found, remember where the matching `\fldrslt` runs
    /// will start.
    pub fn capture_field_instruction(&self, text: &str) {
        let url = extract_hyperlink_url(text);
        let mut inner = self.inner.borrow_mut();
        let mark = match &inner.table_row {
            Some(row) => row.current_cell.len(),
            None => inner.document.content.len(),
        };
        inner.hyperlink_mark = url.is_some().then_some(mark);
        inner.pending_hyperlink_url = url;
    }

    /// A `\fldrslt` group has closed: if the sibling `\fldinst` named a
    /// hyperlink target, wrap the runs it produced into a `Hyperlink`
    /// element.
    pub fn finish_field_result(&self) {
        let (url, mark) = {
            let mut inner = self.inner.borrow_mut();
            (inner.pending_hyperlink_url.take(), inner.hyperlink_mark.take())
        };
        if let (Some(url), Some(mark)) = (url, mark) {
            self.wrap_trailing_runs_as_hyperlink(mark, url);
        }
    }

    /// Consume the builder, handing ownership of the finished document to
    /// the caller.
    pub fn finish(self) -> Document {
        self.inner.into_inner().document
    }

    /// Build the [`Sink`] this builder drives. Borrows `self` for the whole
    /// lifetime of the returned sink.
    pub fn sink(&self) -> Sink<'_> {
        Sink {
            on_text: Box::new(move |t, cf, pf| self.push_text(t, cf, pf)),
            on_character: Box::new(move |c, cf, pf| self.push_char(c, cf, pf)),
            on_font_table_entry: Box::new(move |id, name, family, charset| self.push_font_table_entry(id, name, family, charset)),
            on_color_table_entry: Box::new(move |id, r, g, b| self.push_color_table_entry(id, r, g, b)),
            on_field_instruction: Box::new(move |text| self.capture_field_instruction(text)),
            on_field_result_end: Box::new(move || self.finish_field_result()),
            on_table_row_start: Box::new(move || self.start_table_row()),
            on_table_cell_boundary: Box::new(move |w| self.record_cell_boundary(w)),
            on_table_cell_end: Box::new(move || self.end_table_cell()),
            on_table_row_end: Box::new(move || self.end_table_row()),
            on_image: Box::new(move |format, w, h, px, data| self.push_image(format, w, h, px, data)),
            ..Sink::default()
        }
    }
}

/// Pull the quoted URL out of a `HYPERLINK "url"` field instruction. Returns
/// `None` for any other field type (`PAGEREF`, `REF`, ...) or malformed text.
fn extract_hyperlink_url(text: &str) -> Option<String> {
    let upper = text.to_ascii_uppercase();
    let idx = upper.find("HYPERLINK")?;
    let rest = &text[idx + "HYPERLINK".len()..];
    let start = rest.find('"')? + 1;
    let end = start + rest[start..].find('"')?;
    Some(rest[start..end].to_string())
}

impl Default for DocumentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{Parser, ParserConfig};
    use crate::stream::ByteStream;

    fn parse(input: &[u8]) -> Document {
        let builder = DocumentBuilder::new();
        let mut parser = Parser::new(ByteStream::from_slice(input), ParserConfig::default(), builder.sink());
        parser.run().unwrap();
        builder.finish()
    }

    #[test]
    fn accumulates_text_runs() {
        let builder = DocumentBuilder::new();
        builder.push_text("hello", &CharFormat::default(), &ParaFormat::default());
        let doc = builder.finish();
        assert_eq!(doc.plain_text(), "hello");
    }

    #[test]
    fn paragraph_char_becomes_a_break_element() {
        let builder = DocumentBuilder::new();
        builder.push_text("a", &CharFormat::default(), &ParaFormat::default());
        builder.push_char('\u{2029}', &CharFormat::default(), &ParaFormat::default());
        builder.push_text("b", &CharFormat::default(), &ParaFormat::default());
        let doc = builder.finish();
        assert_eq!(doc.plain_text(), "a\n\nb");
    }

    #[test]
    fn font_and_color_entries_are_queryable() {
        let builder = DocumentBuilder::new();
        builder.push_font_table_entry(0, "Arial".into(), FontFamily::Swiss, 0);
        builder.push_color_table_entry(1, 255, 0, 0);
        let doc = builder.finish();
        assert_eq!(doc.font(0).unwrap().name, "Arial");
        assert_eq!(doc.color(1).unwrap().red, 255);
    }

    #[test]
    fn field_instruction_drives_hyperlink_wrapping() {
        let builder = DocumentBuilder::new();
        builder.push_text("prefix", &CharFormat::default(), &ParaFormat::default());
        builder.capture_field_instruction(r#" HYPERLINK "https://example.com/page" "#);
        builder.push_text("the link", &CharFormat::default(), &ParaFormat::default());
        builder.finish_field_result();
        let doc = builder.finish();
        match &doc.content()[1] {
            ContentElement::Hyperlink(link) => {
                assert_eq!(link.url, "https://example.com/page");
                assert_eq!(link.display_text, "the link");
            }
            other => panic!("expected Hyperlink, got {other:?}"),
        }
    }

    #[test]
    fn non_hyperlink_field_instruction_is_ignored() {
        assert_eq!(extract_hyperlink_url("PAGEREF _Toc1 \\h"), None);
    }

    #[test]
    fn end_to_end_table_row_builds_sized_cells() {
        let doc = parse(br"{\rtf1\trowd\cellx1000\cellx2500\intbl A\cell\intbl BB\cell\row par text}");
        assert_eq!(doc.table_count(), 1);
        let table = doc.table(0).unwrap();
        assert_eq!(table.row_count(), 1);
        assert_eq!(table.cell_count(0), 2);
        assert_eq!(table.rows[0].cells[0].width_twips, 1000);
        assert_eq!(table.rows[0].cells[1].width_twips, 1500);
        match &table.rows[0].cells[0].content[0] {
            ContentElement::TextRun(run) => assert_eq!(run.text, "A"),
            other => panic!("expected TextRun, got {other:?}"),
        }
        assert!(doc.plain_text().ends_with("par text"));
    }

    #[test]
    fn consecutive_rows_coalesce_into_one_table() {
        let doc = parse(br"{\rtf1\trowd\cellx1000\intbl A\cell\row\trowd\cellx1000\intbl B\cell\row}");
        assert_eq!(doc.table_count(), 1);
        assert_eq!(doc.table(0).unwrap().row_count(), 2);
    }

    #[test]
    fn end_to_end_picture_is_captured_as_image() {
        let doc = parse(br"{\rtf1{\pict\pngblip\picw10\pich10 89504e470d0a1a0a}after}");
        assert_eq!(doc.image_count(), 1);
        let image = doc.image(0).unwrap();
        assert_eq!(image.format, ImageFormat::Png);
        assert_eq!(image.width, 10);
        assert_eq!(image.height, 10);
        assert_eq!(image.data, vec![0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a]);
        assert_eq!(doc.plain_text(), "after");
    }

    #[test]
    fn wraps_trailing_runs_as_hyperlink() {
        let builder = DocumentBuilder::new();
        builder.push_text("before", &CharFormat::default(), &ParaFormat::default());
        let mark = builder.content_len();
        builder.push_text("click here", &CharFormat::default(), &ParaFormat::default());
        builder.wrap_trailing_runs_as_hyperlink(mark, "https://example.com".to_string());
        let doc = builder.finish();
        assert_eq!(doc.plain_text(), "beforeclick here");
        match &doc.content()[1] {
            ContentElement::Hyperlink(link) => {
                assert_eq!(link.url, "https://example.com");
                assert_eq!(link.display_text, "click here");
            }
            other => panic!("expected Hyperlink, got {other:?}"),
        }
    }
}
