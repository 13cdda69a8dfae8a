//! A total function from control-word name to a semantic action.
//!
//! This module only classifies; it never touches parser or document state
//! directly; [`crate::parser::Parser`] applies the returned [`Action`].
//! Unknown control words classify as `Action::Unknown` and are silently
//! ignored by the caller, per spec.

use crate::document::{FontFamily, ImageFormat};
use crate::format::Alignment;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorChannel {
    Red,
    Green,
    Blue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharToggle {
    Bold,
    Italic,
    Underline,
    Strikethrough,
    Superscript,
    Subscript,
    SmallCaps,
    AllCaps,
    Hidden,
    Shadow,
    Emboss,
    Outline,
}

/// Destinations whose whole group is ignored for text extraction, though a
/// sub-parser (the document builder) may still capture structured content
/// from it (font/color tables, `info`, etc).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkippedDestination {
    FontTable,
    ColorTable,
    StyleSheet,
    Info,
    Generator,
    FieldInstruction,
    /// Any destination introduced by `\*\name` this dispatcher doesn't
    /// otherwise recognize.
    Unknown,
}

/// Destinations whose contents are captured but never emitted as plain text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapturedDestination {
    FieldResult,
    Picture,
    EmbeddedObject,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    ToggleChar { toggle: CharToggle, parameter: Option<i32> },
    SetFont(i32),
    SetFontSizeHalfPoints(i32),
    SetForegroundColor(i32),
    SetBackgroundColor(i32),
    PlainReset,

    ParagraphReset,
    SetAlignment(Alignment),
    SetLeftIndentTwips(i32),
    SetRightIndentTwips(i32),
    SetFirstLineIndentTwips(i32),
    SetSpaceBeforeTwips(i32),
    SetSpaceAfterTwips(i32),

    ParagraphBreak,
    LineBreak,
    PageBreak,
    Tab,

    SetAnsi,
    SetMac,
    SetPc,
    SetPca,
    SetAnsiCpg(i32),
    SetDefaultFont(i32),
    SetRtfVersion(i32),

    SetUnicodeSkipCount(i32),
    UnicodeChar(i32),

    EnterSkippedDestination(SkippedDestination),
    EnterCapturedDestination(CapturedDestination),

    /// Only meaningful while the parser is capturing a `\fonttbl` entry.
    SetFontFamily(FontFamily),
    SetFontCharset(i32),
    /// Only meaningful while the parser is capturing a `\colortbl` entry.
    SetColorComponent(ColorChannel, i32),

    /// Only meaningful while the parser is capturing a `\pict` destination.
    SetImageFormat(ImageFormat),
    SetImageWidthTwips(i32),
    SetImageHeightTwips(i32),
    SetImageWidthGoalPixels(i32),
    SetImageHeightGoalPixels(i32),

    TableRowStart,
    TableCellBoundary(i32),
    TableEnterCell,
    TableCellEnd,
    TableRowEnd,

    /// `\sect`/`\sectd`: not rendered, only usable by tolerant-mode recovery
    /// as a synchronization point.
    SectionBoundary,

    Unknown,
}

pub fn dispatch(name: &str, parameter: Option<i32>) -> Action {
    use Action::*;
    use CharToggle::*;

    match name {
        "b" => ToggleChar { toggle: Bold, parameter },
        "i" => ToggleChar { toggle: Italic, parameter },
        "ul" => ToggleChar { toggle: Underline, parameter },
        "ulnone" => ToggleChar { toggle: Underline, parameter: Some(0) },
        "strike" | "striked" => ToggleChar { toggle: Strikethrough, parameter },
        "super" => ToggleChar { toggle: Superscript, parameter },
        "sub" => ToggleChar { toggle: Subscript, parameter },
        "scaps" => ToggleChar { toggle: SmallCaps, parameter },
        "caps" => ToggleChar { toggle: AllCaps, parameter },
        "v" => ToggleChar { toggle: Hidden, parameter },
        "shad" => ToggleChar { toggle: Shadow, parameter },
        "embo" => ToggleChar { toggle: Emboss, parameter },
        "outl" => ToggleChar { toggle: Outline, parameter },

        "f" => SetFont(parameter.unwrap_or(0)),
        "fs" => SetFontSizeHalfPoints(parameter.unwrap_or(24)),
        "cf" => SetForegroundColor(parameter.unwrap_or(0)),
        "cb" => SetBackgroundColor(parameter.unwrap_or(0)),
        "plain" => PlainReset,

        "pard" => ParagraphReset,
        "ql" => SetAlignment(Alignment::Left),
        "qc" => SetAlignment(Alignment::Center),
        "qr" => SetAlignment(Alignment::Right),
        "qj" => SetAlignment(Alignment::Justify),
        "li" => SetLeftIndentTwips(parameter.unwrap_or(0)),
        "ri" => SetRightIndentTwips(parameter.unwrap_or(0)),
        "fi" => SetFirstLineIndentTwips(parameter.unwrap_or(0)),
        "sb" => SetSpaceBeforeTwips(parameter.unwrap_or(0)),
        "sa" => SetSpaceAfterTwips(parameter.unwrap_or(0)),

        "par" => ParagraphBreak,
        "line" => LineBreak,
        "page" => PageBreak,
        "tab" => Tab,

        "ansi" => SetAnsi,
        "mac" => SetMac,
        "pc" => SetPc,
        "pca" => SetPca,
        "ansicpg" => SetAnsiCpg(parameter.unwrap_or(1252)),
        "deff" => SetDefaultFont(parameter.unwrap_or(0)),
        "rtf" => SetRtfVersion(parameter.unwrap_or(1)),

        "uc" => SetUnicodeSkipCount(parameter.unwrap_or(1)),
        "u" => UnicodeChar(parameter.unwrap_or(0)),

        // "fonttbl"/"colortbl"/"fldinst"/"fldrslt" are intercepted by name in
        // the parser before a control word ever reaches `dispatch`, since
        // each drives its own capture state machine; these arms only cover
        // callers that classify control words without running the full
        // parser.
        "fonttbl" => EnterSkippedDestination(SkippedDestination::FontTable),
        "colortbl" => EnterSkippedDestination(SkippedDestination::ColorTable),
        "stylesheet" => EnterSkippedDestination(SkippedDestination::StyleSheet),
        "info" => EnterSkippedDestination(SkippedDestination::Info),
        "generator" => EnterSkippedDestination(SkippedDestination::Generator),
        "fldinst" => EnterSkippedDestination(SkippedDestination::FieldInstruction),

        "fldrslt" => EnterCapturedDestination(CapturedDestination::FieldResult),
        "pict" => EnterCapturedDestination(CapturedDestination::Picture),
        "object" | "objemb" | "objdata" => EnterCapturedDestination(CapturedDestination::EmbeddedObject),

        "trowd" => TableRowStart,
        "cellx" => TableCellBoundary(parameter.unwrap_or(0)),
        "intbl" => TableEnterCell,
        "cell" => TableCellEnd,
        "row" => TableRowEnd,

        "sect" | "sectd" => SectionBoundary,

        "fnil" => SetFontFamily(FontFamily::DontCare),
        "froman" => SetFontFamily(FontFamily::Roman),
        "fswiss" => SetFontFamily(FontFamily::Swiss),
        "fmodern" => SetFontFamily(FontFamily::Modern),
        "fscript" => SetFontFamily(FontFamily::Script),
        "fdecor" => SetFontFamily(FontFamily::Decorative),
        "ftech" | "fbidi" => SetFontFamily(FontFamily::DontCare),
        "fcharset" => SetFontCharset(parameter.unwrap_or(0)),

        "red" => SetColorComponent(ColorChannel::Red, parameter.unwrap_or(0)),
        "green" => SetColorComponent(ColorChannel::Green, parameter.unwrap_or(0)),
        "blue" => SetColorComponent(ColorChannel::Blue, parameter.unwrap_or(0)),

        "wmetafile" => SetImageFormat(ImageFormat::Wmf),
        "emfblip" => SetImageFormat(ImageFormat::Emf),
        "macpict" => SetImageFormat(ImageFormat::Pict),
        "jpegblip" => SetImageFormat(ImageFormat::Jpeg),
        "pngblip" => SetImageFormat(ImageFormat::Png),
        "picw" => SetImageWidthTwips(parameter.unwrap_or(0)),
        "pich" => SetImageHeightTwips(parameter.unwrap_or(0)),
        "picwgoal" => SetImageWidthGoalPixels(parameter.unwrap_or(0)),
        "pichgoal" => SetImageHeightGoalPixels(parameter.unwrap_or(0)),

        _ => Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_bold_toggle() {
        assert_eq!(
            dispatch("b", None),
            Action::ToggleChar { toggle: CharToggle::Bold, parameter: None }
        );
    }

    #[test]
    fn unknown_control_words_are_ignored() {
        assert_eq!(dispatch("someMadeUpWord", Some(5)), Action::Unknown);
    }

    #[test]
    fn font_size_defaults_to_document_default() {
        assert_eq!(dispatch("fs", None), Action::SetFontSizeHalfPoints(24));
    }

    #[test]
    fn recognizes_png_picture_format() {
        assert_eq!(dispatch("pngblip", None), Action::SetImageFormat(ImageFormat::Png));
    }
}
