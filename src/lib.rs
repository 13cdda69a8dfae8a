//! A safe, streaming Rich Text Format (RTF) parser.
//!
//! The parser never holds the whole document in a parse tree of its own —
//! [`parser::Parser`] drives a [`tokenizer::Tokenizer`] over a
//! [`stream::ByteStream`] and calls into an [`events::Sink`] as it recognizes
//! content. [`builder::DocumentBuilder`] is the sink this crate's public API
//! wires up by default, accumulating a [`document::Document`] that owns its
//! text, tables, and images independently of the input bytes.
//!
//! ```
//! let doc = rtf_reader::parse_bytes(br"{\rtf1 Hello, \b world\b0!}").unwrap();
//! assert_eq!(doc.plain_text(), "Hello, world!");
//! ```

mod builder;
mod dispatch;
pub mod document;
mod error;
pub mod events;
mod format;
pub mod ffi;
mod param;
mod parser;
mod position;
mod state;
mod stream;
mod token;
mod tokenizer;

pub use builder::DocumentBuilder;
pub use document::{
    ColorInfo, ContentElement, Document, DocumentDefaults, FontFamily, FontInfo, Hyperlink, Image, ImageFormat, Table, TableCell,
    TableRow, TextRun,
};
pub use error::{Result, RtfError};
pub use format::{Alignment, CharFormat, CharacterSet, LineSpacingMode, ParaFormat};
pub use parser::{ParserConfig, RecoveryMode};
pub use position::Position;
pub use stream::ByteStream;

use std::io::Read;
use std::path::Path;

use parser::Parser;

/// Parse an in-memory RTF document.
///
/// This is the entry point most callers want: no IO, no file handles, just
/// bytes in and a [`Document`] out.
pub fn parse_bytes(bytes: &[u8]) -> Result<Document> {
    parse_bytes_with_config(bytes, ParserConfig::default())
}

/// Like [`parse_bytes`], with an explicit [`ParserConfig`] (recovery mode,
/// max group depth).
pub fn parse_bytes_with_config(bytes: &[u8], config: ParserConfig) -> Result<Document> {
    run(ByteStream::from_slice(bytes), config)
}

/// Parse RTF pulled from any [`Read`]er. The reader need not be seekable;
/// bytes are buffered internally as the tokenizer consumes them.
pub fn parse_reader(reader: impl Read) -> Result<Document> {
    parse_reader_with_config(reader, ParserConfig::default())
}

pub fn parse_reader_with_config(reader: impl Read, config: ParserConfig) -> Result<Document> {
    run(ByteStream::from_reader(reader), config)
}

/// Parse an RTF file at `path`. Files at or above
/// [`stream::DEFAULT_MMAP_THRESHOLD`] are memory-mapped rather than read
/// fully into memory.
pub fn parse_file(path: impl AsRef<Path>) -> Result<Document> {
    parse_file_with_config(path, ParserConfig::default())
}

pub fn parse_file_with_config(path: impl AsRef<Path>, config: ParserConfig) -> Result<Document> {
    run(ByteStream::from_file(path)?, config)
}

fn run(stream: ByteStream<'_>, config: ParserConfig) -> Result<Document> {
    let builder = DocumentBuilder::new();
    let mut parser = Parser::new(stream, config, builder.sink());
    parser.run()?;
    Ok(builder.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_text() {
        let doc = parse_bytes(br"{\rtf1 Hello World!}").unwrap();
        assert_eq!(doc.plain_text(), "Hello World!");
        assert_eq!(doc.text_runs().len(), 1);
        assert!(!doc.text_runs()[0].char_format.bold);
    }

    #[test]
    fn parses_bold_and_italic_runs() {
        let doc = parse_bytes(br"{\rtf1 Hello \b bold\b0  and \i italic\i0  text!}").unwrap();
        assert_eq!(doc.plain_text(), "Hello bold and italic text!");
        let runs = doc.text_runs();
        assert!(runs.len() >= 3);
        assert!(runs.iter().any(|r| r.char_format.bold));
        assert!(runs.iter().any(|r| r.char_format.italic));
    }

    #[test]
    fn parses_paragraph_break() {
        let doc = parse_bytes(br"{\rtf1 First\par Second}").unwrap();
        assert_eq!(doc.plain_text(), "First\n\nSecond");
    }

    #[test]
    fn parses_font_and_color_tables() {
        let input = br"{\rtf1\ansi\deff0 {\fonttbl{\f0\fswiss Arial;}{\f1\froman Times;}}{\colortbl;\red255\green0\blue0;} Hi}";
        let doc = parse_bytes(input).unwrap();
        assert_eq!(doc.plain_text(), "Hi");
        assert_eq!(doc.font(0).unwrap().name, "Arial");
        assert_eq!(doc.font(0).unwrap().family, FontFamily::Swiss);
        assert_eq!(doc.font(1).unwrap().name, "Times");
        let red = doc.color(1).unwrap();
        assert_eq!((red.red, red.green, red.blue), (255, 0, 0));
        assert!(doc.color(0).is_some());
    }

    #[test]
    fn parses_unicode_escape() {
        let doc = parse_bytes("{\\rtf1 A\\u8364?B}".as_bytes()).unwrap();
        assert_eq!(doc.plain_text(), "A\u{20AC}B");
    }

    #[test]
    fn ignorable_destination_is_skipped() {
        let doc = parse_bytes(br"{\rtf1 Before{\*\bin5 XXXXX} After}").unwrap();
        let text = doc.plain_text();
        assert!(text.contains("Before"));
        assert!(text.contains(" After"));
        assert!(!text.contains("XXXXX"));
    }

    #[test]
    fn empty_input_is_a_semantic_error() {
        let err = parse_bytes(b"").unwrap_err();
        assert!(matches!(err, RtfError::Semantic { .. }));
    }

    #[test]
    fn missing_rtf_header_is_a_semantic_error() {
        let err = parse_bytes(b"not rtf").unwrap_err();
        assert!(matches!(err, RtfError::Semantic { .. }));
    }

    #[test]
    fn minimal_document_has_no_content() {
        let doc = parse_bytes(br"{\rtf1}").unwrap();
        assert_eq!(doc.plain_text(), "");
        assert_eq!(doc.text_runs().len(), 0);
        assert_eq!(doc.fonts().len(), 0);
    }

    #[test]
    fn parse_bytes_and_parse_reader_agree() {
        let input: &[u8] = br"{\rtf1 Hello \b World\b0 !}";
        let from_bytes = parse_bytes(input).unwrap();
        let from_reader = parse_reader(std::io::Cursor::new(input.to_vec())).unwrap();
        assert_eq!(from_bytes.plain_text(), from_reader.plain_text());
        assert_eq!(from_bytes.text_runs().len(), from_reader.text_runs().len());
    }

    #[test]
    fn parse_file_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.rtf");
        std::fs::write(&path, br"{\rtf1 From disk}").unwrap();
        let doc = parse_file(&path).unwrap();
        assert_eq!(doc.plain_text(), "From disk");
    }
}
