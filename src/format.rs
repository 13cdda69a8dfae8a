//! Character- and paragraph-level formatting state.

/// Character-level formatting carried by every emitted text event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharFormat {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strikethrough: bool,
    pub superscript: bool,
    pub subscript: bool,
    pub smallcaps: bool,
    pub allcaps: bool,
    pub hidden: bool,
    /// shadow/emboss/outline toggles: supplemental, several real-world
    /// generators emit them and the data model costs nothing to carry.
    pub shadow: bool,
    pub emboss: bool,
    pub outline: bool,

    pub font_id: Option<u16>,
    /// Half-points, i.e. `\fsN` is stored verbatim.
    pub font_size_half_points: Option<u16>,
    pub foreground_color_id: Option<u16>,
    pub background_color_id: Option<u16>,
}

impl Default for CharFormat {
    fn default() -> Self {
        CharFormat {
            bold: false,
            italic: false,
            underline: false,
            strikethrough: false,
            superscript: false,
            subscript: false,
            smallcaps: false,
            allcaps: false,
            hidden: false,
            shadow: false,
            emboss: false,
            outline: false,
            font_id: None,
            font_size_half_points: None,
            foreground_color_id: None,
            background_color_id: None,
        }
    }
}

impl CharFormat {
    /// `\plain`: clears character toggles but leaves font id, size, and
    /// color untouched. This is the majority-source behavior per the spec's
    /// Open Question; see DESIGN.md.
    pub fn reset_toggles(&mut self) {
        let font_id = self.font_id;
        let font_size_half_points = self.font_size_half_points;
        let foreground_color_id = self.foreground_color_id;
        let background_color_id = self.background_color_id;
        *self = CharFormat::default();
        self.font_id = font_id;
        self.font_size_half_points = font_size_half_points;
        self.foreground_color_id = foreground_color_id;
        self.background_color_id = background_color_id;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    Left,
    Center,
    Right,
    Justify,
}

impl Default for Alignment {
    fn default() -> Self {
        Alignment::Left
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineSpacingMode {
    Single,
    /// `\slN`: exact or "at least" line spacing in twips, per `\slmult`.
    Twips(i32),
    AtLeastTwips(i32),
}

impl Default for LineSpacingMode {
    fn default() -> Self {
        LineSpacingMode::Single
    }
}

/// Paragraph-level formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParaFormat {
    pub alignment: Alignment,
    pub left_indent_twips: i32,
    pub right_indent_twips: i32,
    pub first_line_indent_twips: i32,
    pub space_before_twips: u32,
    pub space_after_twips: u32,
    pub line_spacing: LineSpacingMode,
    /// `true` once `\intbl` has been seen for the current paragraph.
    pub in_table: bool,
}

/// The live (char, para) formatting pair. A `{` pushes a snapshot onto the
/// parser's format stack, a `}` pops it: this is the sole scoping mechanism.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FormatState {
    pub char_format: CharFormat,
    pub para_format: ParaFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharacterSet {
    Ansi,
    Mac,
    Pc,
    Pca,
    AnsiCpg(u32),
}

impl Default for CharacterSet {
    fn default() -> Self {
        CharacterSet::Ansi
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_resets_toggles_but_keeps_font_and_color() {
        let mut cf = CharFormat { bold: true, italic: true, font_id: Some(2), ..Default::default() };
        cf.reset_toggles();
        assert!(!cf.bold);
        assert!(!cf.italic);
        assert_eq!(cf.font_id, Some(2));
    }
}
