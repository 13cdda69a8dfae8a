use crate::position::Position;

/// Crate-wide result alias used by every fallible public function.
pub type Result<T> = std::result::Result<T, RtfError>;

/// Everything that can go wrong while turning bytes into a [`crate::document::Document`].
///
/// Variants map onto the error taxonomy: lexical and structural errors are
/// recoverable in tolerant/permissive parsing modes, semantic and resource
/// errors always abort the parse.
#[derive(Debug, thiserror::Error)]
pub enum RtfError {
    /// Bad hex escape, truncated `\bin`, or an overlong control-word name.
    #[error("lexical error at {position}: {message}")]
    Lexical { position: Position, message: String },

    /// Unclosed group at EOF, unmatched `}`, or nesting beyond the configured max depth.
    #[error("structural error at {position}: {message}")]
    Structural { position: Position, message: String },

    /// Input that cannot be RTF at all: missing `{\rtf` header, empty input, non-brace start.
    #[error("semantic error: {message}")]
    Semantic { message: String },

    /// The document exceeded a configured safety limit (nesting depth, binary length, ...).
    #[error("input too large or too deeply nested: {message}")]
    TooBig { message: String },

    /// Allocation failure while building the document.
    #[error("out of memory")]
    OutOfMemory,

    /// Propagated failure from a pull reader or memory-mapped file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RtfError {
    pub fn lexical(position: Position, message: impl Into<String>) -> Self {
        RtfError::Lexical { position, message: message.into() }
    }

    pub fn structural(position: Position, message: impl Into<String>) -> Self {
        RtfError::Structural { position, message: message.into() }
    }

    pub fn semantic(message: impl Into<String>) -> Self {
        RtfError::Semantic { message: message.into() }
    }

    pub fn too_big(message: impl Into<String>) -> Self {
        RtfError::TooBig { message: message.into() }
    }

    /// True for errors that tolerant-mode parsing may attempt to recover from.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, RtfError::Lexical { .. } | RtfError::Structural { .. })
    }
}
