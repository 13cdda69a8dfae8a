//! The event-driven parser core: drives a [`Tokenizer`], maintains a stack of
//! [`ParserState`] snapshots across group nesting, and calls into a [`Sink`]
//! as content is recognized.

use crate::dispatch::{self, Action, CapturedDestination, CharToggle, SkippedDestination};
use crate::document::{FontFamily, ImageFormat};
use crate::error::{Result, RtfError};
use crate::events::Sink;
use crate::format::CharacterSet;
use crate::position::Position;
use crate::state::ParserState;
use crate::stream::ByteStream;
use crate::token::{Token, TokenKind};
use crate::tokenizer::Tokenizer;

#[derive(Debug, Clone, Default)]
struct FontEntryBuilder {
    id: Option<u16>,
    name: String,
    family: FontFamily,
    charset: u8,
    dirty: bool,
}

#[derive(Debug, Clone, Copy, Default)]
struct ColorEntryBuilder {
    red: u8,
    green: u8,
    blue: u8,
    dirty: bool,
}

/// Which `\fonttbl`/`\colortbl`-style destination, if any, is currently
/// being captured into structured entries rather than just skipped.
enum TableCapture {
    None,
    FontTable { depth: usize, entry: FontEntryBuilder, next_id: u16 },
    ColorTable { depth: usize, entry: ColorEntryBuilder, next_id: u16 },
}

/// Which half of a `\field` (if any) the parser is currently inside.
///
/// `\fldinst` text never reaches `on_text` — it's accumulated here and
/// handed to the sink whole once the destination's group closes, so a
/// consumer can look for `HYPERLINK "..."` without having to reassemble it
/// from chunks itself. `\fldrslt` text is the field's visible rendering and
/// flows to `on_text`/`on_character` as usual; this only brackets it with
/// `on_field_result_start`/`on_field_result_end` so a consumer can tell which
/// runs belong to the field.
enum DestinationCapture {
    None,
    FieldInstruction { depth: usize, text: String },
    FieldResult { depth: usize },
}

/// An in-progress `\pict` destination. `data` accumulates raw bytes from
/// either hex-pair (`\'HH`) or `\bin` encoding — both land here as already
/// decoded bytes.
#[derive(Debug, Clone, Default)]
struct PictureBuild {
    depth: usize,
    format: ImageFormat,
    width: i32,
    height: i32,
    dimensions_in_pixels: bool,
    data: Vec<u8>,
    /// The high nibble of a hex-digit byte pair spanning across Text tokens
    /// (RTF picture data commonly wraps with newlines between pairs).
    pending_nibble: Option<u8>,
}

/// How the parser reacts to recoverable (`Lexical`/`Structural`) errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryMode {
    /// Abort the parse on the first recoverable error.
    Strict,
    /// Skip to the next plausible synchronization point (the next
    /// `}`/`\sect`/`\par` at or above the current depth) and continue.
    Tolerant,
    /// Like `Tolerant`, but never aborts even on repeated failures; used by
    /// callers who would rather get partial output than nothing.
    Permissive,
}

impl Default for RecoveryMode {
    fn default() -> Self {
        RecoveryMode::Tolerant
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserConfig {
    pub recovery: RecoveryMode,
    pub max_group_depth: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        ParserConfig { recovery: RecoveryMode::Tolerant, max_group_depth: 100 }
    }
}

/// Where the skip-destination state machine currently sits.
///
/// `\*` marks the *next* destination control word as ignorable if this
/// crate doesn't otherwise recognize it; `PendingSkip` is the one-token gap
/// between seeing `\*` and seeing the control word that follows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SkipState {
    Neutral,
    PendingSkip,
    SkipUntilGroupEnd { depth_at_skip: usize },
}

pub struct Parser<'a, 'sink> {
    tokenizer: Tokenizer<'a>,
    config: ParserConfig,
    stack: Vec<ParserState>,
    current: ParserState,
    skip: SkipState,
    sink: Sink<'sink>,
    /// One-token pushback, used by Unicode fallback skipping to stop at
    /// group delimiters without consuming them.
    pending: Option<Token>,
    table_capture: TableCapture,
    destination_capture: DestinationCapture,
    picture: Option<PictureBuild>,
}

impl<'a, 'sink> Parser<'a, 'sink> {
    pub fn new(stream: ByteStream<'a>, config: ParserConfig, sink: Sink<'sink>) -> Self {
        Parser {
            tokenizer: Tokenizer::new(stream),
            config,
            stack: Vec::new(),
            current: ParserState::default(),
            skip: SkipState::Neutral,
            sink,
            pending: None,
            table_capture: TableCapture::None,
            destination_capture: DestinationCapture::None,
            picture: None,
        }
    }

    fn next_token(&mut self) -> Token {
        self.pending.take().unwrap_or_else(|| self.tokenizer.next_token())
    }

    /// Drive the tokenizer to completion, calling into the sink as content is
    /// recognized. Returns `Ok(())` on a clean parse (possibly after
    /// recovering from non-fatal errors in tolerant/permissive mode).
    pub fn run(&mut self) -> Result<()> {
        self.expect_header()?;
        loop {
            let token = self.next_token();
            if token.is_eof() {
                if !self.stack.is_empty() {
                    return self.handle_error(RtfError::structural(token.position, "unclosed group at end of input"));
                }
                return Ok(());
            }
            if let Err(e) = self.handle_token(token) {
                self.handle_error(e)?;
            }
        }
    }

    /// RTF documents must open with `{\rtfN`; anything else is a semantic
    /// error regardless of recovery mode (there is no "tolerant" way to
    /// guess that non-RTF input was meant to be RTF).
    fn expect_header(&mut self) -> Result<()> {
        let t1 = self.next_token();
        if !matches!(t1.kind, TokenKind::GroupStart) {
            return Err(RtfError::semantic("document does not start with '{'"));
        }
        self.stack.push(self.current);
        let t2 = self.next_token();
        match t2.kind {
            TokenKind::ControlWord { name, parameter } if name == "rtf" => {
                self.current.format.char_format.font_size_half_points = None;
                if let Action::SetRtfVersion(_) = dispatch::dispatch("rtf", parameter) {}
                Ok(())
            }
            _ => Err(RtfError::semantic("missing \\rtf version declaration")),
        }
    }

    fn handle_token(&mut self, token: Token) -> Result<()> {
        // `\*` only marks a destination ignorable when the control word
        // that names the destination follows it directly; anything else
        // (a group, text, binary data, ...) means `\*` wasn't immediately
        // followed by a destination and the pending mark is stale.
        if self.skip == SkipState::PendingSkip && !matches!(token.kind, TokenKind::ControlWord { .. }) {
            self.skip = SkipState::Neutral;
        }
        match token.kind {
            TokenKind::GroupStart => self.on_group_start(token.position),
            TokenKind::GroupEnd => self.on_group_end(token.position),
            TokenKind::ControlWord { name, parameter } => self.on_control_word(&name, parameter, token.position),
            TokenKind::ControlSymbol { byte } => self.on_control_symbol(byte, token.position),
            TokenKind::Text { bytes } => self.on_text_bytes(&bytes, token.position),
            TokenKind::HexChar { byte } => self.on_hex_char(byte, token.position),
            TokenKind::BinaryData { data, .. } => self.on_binary(&data),
            TokenKind::Eof => Ok(()),
            TokenKind::Error { message } => Err(RtfError::lexical(token.position, message)),
        }
    }

    fn on_group_start(&mut self, position: Position) -> Result<()> {
        if self.stack.len() >= self.config.max_group_depth {
            return Err(RtfError::too_big(format!(
                "group nesting exceeded configured maximum of {}",
                self.config.max_group_depth
            )));
        }
        let _ = position;
        self.stack.push(self.current);
        (self.sink.on_group_start)();
        Ok(())
    }

    fn on_group_end(&mut self, position: Position) -> Result<()> {
        let was_skipping = self.in_skipped_destination();
        let popped_depth = self.stack.len();
        match self.stack.pop() {
            Some(state) => self.current = state,
            None => return Err(RtfError::structural(position, "unmatched '}'")),
        }
        if let SkipState::SkipUntilGroupEnd { depth_at_skip } = self.skip {
            if popped_depth <= depth_at_skip {
                self.skip = SkipState::Neutral;
            }
        }
        self.maybe_finish_table_capture(popped_depth);
        self.maybe_finish_destination_capture(popped_depth);
        self.maybe_finish_picture_capture(popped_depth);
        if !was_skipping || !self.in_skipped_destination() {
            (self.sink.on_group_end)();
        }
        Ok(())
    }

    /// Leaving the group that opened a `\fonttbl`/`\colortbl` destination (or
    /// an ancestor of it, in malformed input) closes out table capture,
    /// flushing a final entry if one was left dangling without a trailing
    /// `;`.
    fn maybe_finish_table_capture(&mut self, popped_depth: usize) {
        let depth = match &self.table_capture {
            TableCapture::FontTable { depth, .. } | TableCapture::ColorTable { depth, .. } => Some(*depth),
            TableCapture::None => None,
        };
        let Some(depth) = depth else { return };
        if popped_depth > depth {
            return;
        }
        let dirty = match &self.table_capture {
            TableCapture::FontTable { entry, .. } => entry.dirty,
            TableCapture::ColorTable { entry, .. } => entry.dirty,
            TableCapture::None => false,
        };
        if dirty {
            self.finish_current_table_entry();
        }
        self.table_capture = TableCapture::None;
    }

    /// Leaving the group that opened a `\fldinst`/`\fldrslt` destination
    /// fires the matching sink callback: the accumulated instruction text
    /// for `\fldinst`, or the closing bracket for `\fldrslt`.
    fn maybe_finish_destination_capture(&mut self, popped_depth: usize) {
        match &self.destination_capture {
            DestinationCapture::FieldInstruction { depth, .. } if popped_depth <= *depth => {
                let DestinationCapture::FieldInstruction { text, .. } = std::mem::replace(&mut self.destination_capture, DestinationCapture::None) else {
                    unreachable!()
                };
                (self.sink.on_field_instruction)(&text);
            }
            DestinationCapture::FieldResult { depth } if popped_depth <= *depth => {
                self.destination_capture = DestinationCapture::None;
                (self.sink.on_field_result_end)();
            }
            _ => {}
        }
    }

    /// Leaving the group that opened a `\pict` destination emits the
    /// accumulated image, if any bytes were captured.
    fn maybe_finish_picture_capture(&mut self, popped_depth: usize) {
        let Some(depth) = self.picture.as_ref().map(|p| p.depth) else { return };
        if popped_depth > depth {
            return;
        }
        if let Some(pic) = self.picture.take() {
            if !pic.data.is_empty() {
                (self.sink.on_image)(pic.format, pic.width, pic.height, pic.dimensions_in_pixels, &pic.data);
            }
        }
    }

    fn in_skipped_destination(&self) -> bool {
        self.current.skip_group || matches!(self.skip, SkipState::SkipUntilGroupEnd { .. })
    }

    fn on_control_word(&mut self, name: &str, parameter: Option<i32>, position: Position) -> Result<()> {
        // `\fldinst`/`\fldrslt` have dedicated capture behavior regardless of
        // a preceding `\*` (which RTF conventionally adds before `\fldinst`
        // so readers without field support fall back to treating it as an
        // ignorable destination) — handle them before the generic
        // pending-skip transition would otherwise swallow them.
        if !self.in_skipped_destination() && (name == "fldinst" || name == "fldrslt") {
            self.skip = SkipState::Neutral;
            if name == "fldinst" {
                self.enter_field_instruction();
            } else {
                self.enter_field_result();
            }
            return Ok(());
        }

        if self.skip == SkipState::PendingSkip {
            self.skip = SkipState::SkipUntilGroupEnd { depth_at_skip: self.stack.len() };
            self.current.skip_group = true;
        }

        if (name == "fonttbl" || name == "colortbl") && !self.in_skipped_destination() {
            if name == "fonttbl" {
                self.enter_font_table();
            } else {
                self.enter_color_table();
            }
            return Ok(());
        }
        if self.capture_font_word(name, parameter) || self.capture_color_word(name, parameter) || self.capture_picture_word(name, parameter) {
            return Ok(());
        }

        if self.in_skipped_destination() {
            return Ok(());
        }

        let action = dispatch::dispatch(name, parameter);
        match action {
            Action::ToggleChar { toggle, parameter } => self.apply_char_toggle(toggle, parameter),
            Action::SetFont(id) => self.current.format.char_format.font_id = Some(id as u16),
            Action::SetFontSizeHalfPoints(v) => self.current.format.char_format.font_size_half_points = Some(v as u16),
            Action::SetForegroundColor(id) => self.current.format.char_format.foreground_color_id = Some(id as u16),
            Action::SetBackgroundColor(id) => self.current.format.char_format.background_color_id = Some(id as u16),
            Action::PlainReset => self.current.format.char_format.reset_toggles(),

            Action::ParagraphReset => self.current.format.para_format = Default::default(),
            Action::SetAlignment(a) => self.current.format.para_format.alignment = a,
            Action::SetLeftIndentTwips(v) => self.current.format.para_format.left_indent_twips = v,
            Action::SetRightIndentTwips(v) => self.current.format.para_format.right_indent_twips = v,
            Action::SetFirstLineIndentTwips(v) => self.current.format.para_format.first_line_indent_twips = v,
            Action::SetSpaceBeforeTwips(v) => self.current.format.para_format.space_before_twips = v.max(0) as u32,
            Action::SetSpaceAfterTwips(v) => self.current.format.para_format.space_after_twips = v.max(0) as u32,

            Action::ParagraphBreak => self.emit_char('\u{2029}', true),
            Action::LineBreak => self.emit_char('\n', false),
            Action::PageBreak => self.emit_char('\u{000C}', true),
            Action::Tab => self.emit_char('\t', false),

            Action::SetAnsi => self.current.character_set = CharacterSet::Ansi,
            Action::SetMac => self.current.character_set = CharacterSet::Mac,
            Action::SetPc => self.current.character_set = CharacterSet::Pc,
            Action::SetPca => self.current.character_set = CharacterSet::Pca,
            Action::SetAnsiCpg(cp) => {
                self.current.character_set = CharacterSet::AnsiCpg(cp.max(0) as u32);
                self.current.code_page = cp.max(0) as u32;
            }
            Action::SetDefaultFont(_) | Action::SetRtfVersion(_) => {}

            Action::SetUnicodeSkipCount(n) => self.current.unicode_skip_count = n.max(0),
            Action::UnicodeChar(code) => return self.emit_unicode(code, position),

            Action::EnterSkippedDestination(which) => self.enter_skipped_destination(which),
            Action::EnterCapturedDestination(which) => self.enter_captured_destination(which),

            Action::TableRowStart => {
                self.current.format.para_format.in_table = true;
                (self.sink.on_table_row_start)();
            }
            Action::TableCellBoundary(twips) => (self.sink.on_table_cell_boundary)(twips),
            Action::TableEnterCell => {}
            Action::TableCellEnd => (self.sink.on_table_cell_end)(),
            Action::TableRowEnd => {
                self.current.format.para_format.in_table = false;
                (self.sink.on_table_row_end)();
            }

            Action::SectionBoundary => {}
            // Only meaningful while `capture_font_word`/`capture_color_word`/
            // `capture_picture_word` intercept them above; reached here only
            // for stray occurrences outside their owning destination, where
            // they're meaningless and safely ignored.
            Action::SetFontFamily(_) | Action::SetFontCharset(_) | Action::SetColorComponent(_, _) => {}
            Action::SetImageFormat(_)
            | Action::SetImageWidthTwips(_)
            | Action::SetImageHeightTwips(_)
            | Action::SetImageWidthGoalPixels(_)
            | Action::SetImageHeightGoalPixels(_) => {}
            Action::Unknown => {}
        }
        Ok(())
    }

    fn enter_font_table(&mut self) {
        self.table_capture = TableCapture::FontTable { depth: self.stack.len(), entry: FontEntryBuilder::default(), next_id: 0 };
        self.current.skip_group = true;
    }

    fn enter_color_table(&mut self) {
        self.table_capture = TableCapture::ColorTable { depth: self.stack.len(), entry: ColorEntryBuilder::default(), next_id: 0 };
        self.current.skip_group = true;
    }

    /// Returns `true` (having consumed the word) iff a `\fonttbl` is
    /// currently being captured, regardless of whether `name` was one this
    /// crate specifically understands.
    fn capture_font_word(&mut self, name: &str, parameter: Option<i32>) -> bool {
        let TableCapture::FontTable { entry, .. } = &mut self.table_capture else { return false };
        match name {
            "f" => {
                entry.id = Some(parameter.unwrap_or(0).max(0) as u16);
                entry.dirty = true;
            }
            "fnil" => {
                entry.family = FontFamily::DontCare;
                entry.dirty = true;
            }
            "froman" => {
                entry.family = FontFamily::Roman;
                entry.dirty = true;
            }
            "fswiss" => {
                entry.family = FontFamily::Swiss;
                entry.dirty = true;
            }
            "fmodern" => {
                entry.family = FontFamily::Modern;
                entry.dirty = true;
            }
            "fscript" => {
                entry.family = FontFamily::Script;
                entry.dirty = true;
            }
            "fdecor" => {
                entry.family = FontFamily::Decorative;
                entry.dirty = true;
            }
            "ftech" | "fbidi" => {
                entry.family = FontFamily::DontCare;
                entry.dirty = true;
            }
            "fcharset" => {
                entry.charset = parameter.unwrap_or(0).clamp(0, 255) as u8;
                entry.dirty = true;
            }
            _ => {}
        }
        true
    }

    /// Returns `true` (having consumed the word) iff a `\colortbl` is
    /// currently being captured.
    fn capture_color_word(&mut self, name: &str, parameter: Option<i32>) -> bool {
        let TableCapture::ColorTable { entry, .. } = &mut self.table_capture else { return false };
        match name {
            "red" => {
                entry.red = parameter.unwrap_or(0).clamp(0, 255) as u8;
                entry.dirty = true;
            }
            "green" => {
                entry.green = parameter.unwrap_or(0).clamp(0, 255) as u8;
                entry.dirty = true;
            }
            "blue" => {
                entry.blue = parameter.unwrap_or(0).clamp(0, 255) as u8;
                entry.dirty = true;
            }
            _ => {}
        }
        true
    }

    /// Returns `true` (having consumed the word) iff it's one of the
    /// picture-property control words this crate tracks and a `\pict`
    /// destination is currently being captured. Other control words inside
    /// an active `\pict` destination (rare, malformed input) fall through to
    /// the normal skip handling.
    fn capture_picture_word(&mut self, name: &str, parameter: Option<i32>) -> bool {
        let Some(pic) = &mut self.picture else { return false };
        match name {
            "wmetafile" => pic.format = ImageFormat::Wmf,
            "emfblip" => pic.format = ImageFormat::Emf,
            "macpict" => pic.format = ImageFormat::Pict,
            "jpegblip" => pic.format = ImageFormat::Jpeg,
            "pngblip" => pic.format = ImageFormat::Png,
            "picw" => pic.width = parameter.unwrap_or(0),
            "pich" => pic.height = parameter.unwrap_or(0),
            "picwgoal" => {
                pic.width = parameter.unwrap_or(0);
                pic.dimensions_in_pixels = true;
            }
            "pichgoal" => {
                pic.height = parameter.unwrap_or(0);
                pic.dimensions_in_pixels = true;
            }
            _ => return false,
        }
        true
    }

    fn finish_current_table_entry(&mut self) {
        match self.table_capture {
            TableCapture::FontTable { .. } => self.finish_font_entry(),
            TableCapture::ColorTable { .. } => self.finish_color_entry(),
            TableCapture::None => {}
        }
    }

    fn finish_font_entry(&mut self) {
        let TableCapture::FontTable { entry, next_id, .. } = &mut self.table_capture else { return };
        let id = entry.id.unwrap_or(*next_id);
        let name = std::mem::take(&mut entry.name).trim().to_string();
        let family = entry.family;
        let charset = entry.charset;
        *next_id = next_id.wrapping_add(1);
        *entry = FontEntryBuilder::default();
        (self.sink.on_font_table_entry)(id, name, family, charset);
    }

    fn finish_color_entry(&mut self) {
        let TableCapture::ColorTable { entry, next_id, .. } = &mut self.table_capture else { return };
        let id = *next_id;
        let (r, g, b) = (entry.red, entry.green, entry.blue);
        *next_id += 1;
        *entry = ColorEntryBuilder::default();
        (self.sink.on_color_table_entry)(id, r, g, b);
    }

    /// Append text belonging to the destination currently being captured,
    /// splitting on `;` entry terminators. Returns `true` iff a table is
    /// being captured at all (in which case the text has been fully
    /// handled and must not also flow to `on_text`).
    fn capture_table_text(&mut self, bytes: &[u8]) -> bool {
        if matches!(self.table_capture, TableCapture::None) {
            return false;
        }
        let decoded = self.decode_bytes(bytes);
        let parts: Vec<&str> = decoded.split(';').collect();
        let last = parts.len() - 1;
        for (i, part) in parts.iter().enumerate() {
            self.append_table_entry_text(part);
            if i != last {
                self.finish_current_table_entry();
            }
        }
        true
    }

    fn append_table_entry_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if let TableCapture::FontTable { entry, .. } = &mut self.table_capture {
            entry.name.push_str(text);
            entry.dirty = true;
        }
    }

    fn apply_char_toggle(&mut self, toggle: CharToggle, parameter: Option<i32>) {
        let on = parameter != Some(0);
        let cf = &mut self.current.format.char_format;
        match toggle {
            CharToggle::Bold => cf.bold = on,
            CharToggle::Italic => cf.italic = on,
            CharToggle::Underline => cf.underline = on,
            CharToggle::Strikethrough => cf.strikethrough = on,
            CharToggle::Superscript => cf.superscript = on,
            CharToggle::Subscript => cf.subscript = on,
            CharToggle::SmallCaps => cf.smallcaps = on,
            CharToggle::AllCaps => cf.allcaps = on,
            CharToggle::Hidden => cf.hidden = on,
            CharToggle::Shadow => cf.shadow = on,
            CharToggle::Emboss => cf.emboss = on,
            CharToggle::Outline => cf.outline = on,
        }
    }

    /// `\*`: mark the next destination control word as skippable if this
    /// crate doesn't recognize it as something worth capturing.
    fn on_control_symbol(&mut self, byte: u8, position: Position) -> Result<()> {
        let _ = position;
        if self.in_skipped_destination() {
            return Ok(());
        }
        match byte {
            b'*' => {
                self.skip = SkipState::PendingSkip;
                Ok(())
            }
            b'~' => self.emit_char('\u{00A0}', false),
            b'-' => Ok(()),
            b'_' => self.emit_char('\u{2011}', false),
            _ => Ok(()),
        }
    }

    fn enter_skipped_destination(&mut self, which: SkippedDestination) {
        // Recognized destinations are still skipped for plain-text purposes;
        // the document builder observes them separately through its own
        // sink wiring (see DESIGN.md) rather than through this flag.
        let _ = which;
        self.skip = SkipState::Neutral;
        self.current.skip_group = true;
    }

    fn enter_captured_destination(&mut self, which: CapturedDestination) {
        match which {
            CapturedDestination::Picture => {
                self.current.destinations.in_pict = true;
                self.current.skip_group = true;
                self.picture = Some(PictureBuild { depth: self.stack.len(), ..PictureBuild::default() });
            }
            CapturedDestination::FieldResult => self.current.destinations.in_field_result = true,
            // Embedded-object data (`\objdata`) is binary we have no format
            // for; skip it like any other destination this crate doesn't
            // otherwise capture.
            CapturedDestination::EmbeddedObject => self.current.skip_group = true,
        }
    }

    /// A `\fldinst` destination's raw text never reaches `on_text`; it's
    /// skipped like any other destination but accumulated separately so it
    /// can be handed to the sink whole once the group closes.
    fn enter_field_instruction(&mut self) {
        self.destination_capture = DestinationCapture::FieldInstruction { depth: self.stack.len(), text: String::new() };
        self.current.skip_group = true;
    }

    /// A `\fldrslt` destination's content is the field's visible rendering
    /// and flows to `on_text`/`on_character` normally; this only brackets it
    /// with `on_field_result_start`/`on_field_result_end`.
    fn enter_field_result(&mut self) {
        self.destination_capture = DestinationCapture::FieldResult { depth: self.stack.len() };
        self.current.destinations.in_field_result = true;
        (self.sink.on_field_result_start)();
    }

    /// Append text belonging to an in-progress `\fldinst` capture. Returns
    /// `true` iff one is active (in which case the text has been fully
    /// handled and must not also flow to `on_text`).
    fn capture_field_instruction_text(&mut self, bytes: &[u8]) -> bool {
        if !matches!(self.destination_capture, DestinationCapture::FieldInstruction { .. }) {
            return false;
        }
        let decoded = self.decode_bytes(bytes);
        if let DestinationCapture::FieldInstruction { text, .. } = &mut self.destination_capture {
            text.push_str(&decoded);
        }
        true
    }

    /// RTF writes `\pict` image data as plain ASCII hex-digit text (not
    /// `\'HH` escapes), possibly wrapped with whitespace/newlines for
    /// readability; decode it two nibbles at a time, carrying a dangling high
    /// nibble across Text tokens.
    fn capture_picture_text(&mut self, bytes: &[u8]) -> bool {
        let Some(pic) = &mut self.picture else { return false };
        for &b in bytes {
            let Some(nibble) = (b as char).to_digit(16) else { continue };
            let nibble = nibble as u8;
            match pic.pending_nibble.take() {
                Some(high) => pic.data.push((high << 4) | nibble),
                None => pic.pending_nibble = Some(nibble),
            }
        }
        true
    }

    fn on_text_bytes(&mut self, bytes: &[u8], position: Position) -> Result<()> {
        if self.capture_picture_text(bytes) {
            return Ok(());
        }
        if self.capture_field_instruction_text(bytes) {
            return Ok(());
        }
        if self.capture_table_text(bytes) {
            return Ok(());
        }
        if self.in_skipped_destination() {
            return Ok(());
        }
        let text = self.decode_bytes(bytes);
        if text.is_empty() {
            return Ok(());
        }
        let _ = position;
        (self.sink.on_text)(&text, &self.current.format.char_format, &self.current.format.para_format);
        Ok(())
    }

    fn on_hex_char(&mut self, byte: u8, position: Position) -> Result<()> {
        if self.in_skipped_destination() {
            return Ok(());
        }
        let ch = self.decode_bytes(&[byte]).chars().next().unwrap_or('\u{FFFD}');
        let _ = position;
        self.emit_char(ch, false)
    }

    /// `\uN`: a Unicode scalar value, optionally negative for values above
    /// `U+7FFF` per the RTF convention of encoding them as `value - 65536`.
    /// Followed by `unicode_skip_count` fallback tokens (ASCII bytes, hex
    /// escapes, or control words) to discard for non-Unicode-aware readers.
    fn emit_unicode(&mut self, code: i32, position: Position) -> Result<()> {
        if self.in_skipped_destination() {
            self.skip_unicode_fallback();
            return Ok(());
        }
        let scalar = if code < 0 { code + 65536 } else { code };
        let ch = char::from_u32(scalar as u32).unwrap_or('\u{FFFD}');
        let _ = position;
        self.emit_char(ch, false)?;
        self.skip_unicode_fallback();
        Ok(())
    }

    /// Discard `unicode_skip_count` fallback units following a `\u`: one
    /// literal byte of text, one hex escape, or one control word/symbol.
    ///
    /// A `Text` token may hold a multi-byte run, so a skip count that lands
    /// inside one only drops that many leading bytes and pushes the
    /// remainder back as a new `Text` token rather than swallowing the
    /// whole run. Group delimiters and EOF are never consumed; a skip count
    /// that runs into one just stops early.
    fn skip_unicode_fallback(&mut self) {
        let mut remaining = self.current.unicode_skip_count;
        while remaining > 0 {
            let token = self.next_token();
            let position = token.position;
            match token.kind {
                TokenKind::GroupStart => {
                    self.pending = Some(Token::new(TokenKind::GroupStart, position));
                    break;
                }
                TokenKind::GroupEnd => {
                    self.pending = Some(Token::new(TokenKind::GroupEnd, position));
                    break;
                }
                TokenKind::Eof => {
                    self.pending = Some(Token::new(TokenKind::Eof, position));
                    break;
                }
                TokenKind::Text { bytes } => {
                    if bytes.len() <= remaining {
                        remaining -= bytes.len();
                    } else {
                        let leftover = bytes[remaining..].to_vec();
                        remaining = 0;
                        self.pending = Some(Token::new(TokenKind::Text { bytes: leftover }, position));
                    }
                }
                _ => {
                    remaining -= 1;
                }
            }
        }
    }

    fn on_binary(&mut self, data: &[u8]) -> Result<()> {
        if let Some(pic) = &mut self.picture {
            pic.data.extend_from_slice(data);
            return Ok(());
        }
        if self.in_skipped_destination() {
            return Ok(());
        }
        (self.sink.on_binary)(data);
        Ok(())
    }

    fn decode_bytes(&self, bytes: &[u8]) -> String {
        match self.current.character_set {
            CharacterSet::Ansi | CharacterSet::Pca => {
                let (cow, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
                cow.into_owned()
            }
            CharacterSet::Mac => {
                let (cow, _, _) = encoding_rs::MACINTOSH.decode(bytes);
                cow.into_owned()
            }
            CharacterSet::Pc => {
                let (cow, _, _) = encoding_rs::IBM866.decode(bytes);
                cow.into_owned()
            }
            CharacterSet::AnsiCpg(cp) => {
                let encoding = codepage_encoding(cp).unwrap_or(encoding_rs::WINDOWS_1252);
                let (cow, _, _) = encoding.decode(bytes);
                cow.into_owned()
            }
        }
    }

    fn emit_char(&mut self, ch: char, is_paragraph_marker: bool) -> Result<()> {
        let _ = is_paragraph_marker;
        (self.sink.on_character)(ch, &self.current.format.char_format, &self.current.format.para_format);
        Ok(())
    }

    fn handle_error(&mut self, err: RtfError) -> Result<()> {
        match self.config.recovery {
            RecoveryMode::Strict => Err(err),
            RecoveryMode::Tolerant if !err.is_recoverable() => Err(err),
            RecoveryMode::Tolerant | RecoveryMode::Permissive => {
                log::warn!("recovered from {err}");
                (self.sink.on_error)(&err);
                Ok(())
            }
        }
    }
}

fn codepage_encoding(cp: u32) -> Option<&'static encoding_rs::Encoding> {
    match cp {
        1252 => Some(encoding_rs::WINDOWS_1252),
        1250 => Some(encoding_rs::WINDOWS_1250),
        1251 => Some(encoding_rs::WINDOWS_1251),
        1253 => Some(encoding_rs::WINDOWS_1253),
        1254 => Some(encoding_rs::WINDOWS_1254),
        1255 => Some(encoding_rs::WINDOWS_1255),
        1256 => Some(encoding_rs::WINDOWS_1256),
        1257 => Some(encoding_rs::WINDOWS_1257),
        1258 => Some(encoding_rs::WINDOWS_1258),
        65001 => Some(encoding_rs::UTF_8),
        _ => None,
    }
}
