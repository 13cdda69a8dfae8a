//! The lexical token stream produced by [`crate::tokenizer::Tokenizer`].

use crate::position::Position;

/// A maximum control-word name length. Names past this are either truncated
/// or surfaced as an error (this crate truncates and continues, see
/// `DESIGN.md`).
pub const MAX_CONTROL_WORD_NAME_LEN: usize = 32;

/// One lexical unit of an RTF byte stream.
///
/// Every variant carries the [`Position`] at which it started. Token-level
/// buffers (`name`, `bytes`) are freshly allocated by the tokenizer so callers
/// may hold onto them independently of the source stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    GroupStart,
    GroupEnd,
    ControlWord { name: String, parameter: Option<i32> },
    ControlSymbol { byte: u8 },
    Text { bytes: Vec<u8> },
    HexChar { byte: u8 },
    BinaryData { length: usize, data: Vec<u8>, source_offset: u64 },
    Eof,
    Error { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub position: Position,
}

impl Token {
    pub fn new(kind: TokenKind, position: Position) -> Self {
        Token { kind, position }
    }

    pub fn is_eof(&self) -> bool {
        matches!(self.kind, TokenKind::Eof)
    }

    pub fn is_error(&self) -> bool {
        matches!(self.kind, TokenKind::Error { .. })
    }
}
