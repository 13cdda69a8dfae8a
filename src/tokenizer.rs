// RTF document format tokenizer
//
// Written according to the RTF Format Specification 1.9.1, which carries
// the following copyright notice:
//
//     Copyright (c) 2008 Microsoft Corporation.  All Rights reserved.
//
// Converts a ByteStream into a Token stream. Every `Text` and
// `ControlWord.name` buffer is a fresh allocation, copied out of the stream,
// so callers may retain or drop tokens independently of the stream's own
// lifetime.

use crate::param::{decode_hex_pair, saturating_parse_i32};
use crate::position::Position;
use crate::stream::ByteStream;
use crate::token::{Token, TokenKind, MAX_CONTROL_WORD_NAME_LEN};

pub struct Tokenizer<'a> {
    stream: ByteStream<'a>,
}

impl<'a> Tokenizer<'a> {
    pub fn new(stream: ByteStream<'a>) -> Self {
        Tokenizer { stream }
    }

    pub fn position(&self) -> Position {
        self.stream.position()
    }

    /// Pull the next token, returning `Eof` once the stream is drained.
    ///
    /// This never panics on malformed input: anything the tokenizer can't
    /// make sense of becomes `TokenKind::Error` rather than a crash.
    pub fn next_token(&mut self) -> Token {
        let start = self.stream.position();
        match self.stream.peek() {
            None => Token::new(TokenKind::Eof, start),
            Some(b'{') => {
                self.stream.consume();
                Token::new(TokenKind::GroupStart, start)
            }
            Some(b'}') => {
                self.stream.consume();
                Token::new(TokenKind::GroupEnd, start)
            }
            Some(b'\\') => self.read_backslash(start),
            Some(_) => self.read_text(start),
        }
    }

    fn read_text(&mut self, start: Position) -> Token {
        let mut bytes = Vec::new();
        while let Some(b) = self.stream.peek() {
            if matches!(b, b'{' | b'}' | b'\\') {
                break;
            }
            self.stream.consume();
            // literal CR/LF are not significant RTF content; readers ignore them
            if !matches!(b, b'\r' | b'\n') {
                bytes.push(b);
            }
        }
        Token::new(TokenKind::Text { bytes }, start)
    }

    fn read_backslash(&mut self, start: Position) -> Token {
        self.stream.consume(); // the leading backslash
        match self.stream.peek() {
            None => Token::new(
                TokenKind::Error { message: "unexpected end of input after '\\'".into() },
                start,
            ),
            Some(b'\'') => self.read_hex_escape(start),
            Some(b) if b.is_ascii_alphabetic() => self.read_control_word(start),
            Some(b) => {
                self.stream.consume();
                Token::new(TokenKind::ControlSymbol { byte: b }, start)
            }
        }
    }

    fn read_hex_escape(&mut self, start: Position) -> Token {
        self.stream.consume(); // the quote
        let h0 = self.stream.peek();
        let h1 = self.stream.peek_offset(1);
        match (h0, h1) {
            (Some(a), Some(b)) if a.is_ascii_hexdigit() && b.is_ascii_hexdigit() => {
                self.stream.consume();
                self.stream.consume();
                match decode_hex_pair([a, b]) {
                    Some(byte) => Token::new(TokenKind::HexChar { byte }, start),
                    None => Token::new(
                        TokenKind::Error { message: "invalid hex escape digits".into() },
                        start,
                    ),
                }
            }
            _ => Token::new(
                TokenKind::Error { message: "truncated or invalid hex escape".into() },
                start,
            ),
        }
    }

    fn read_control_word(&mut self, start: Position) -> Token {
        let mut name = String::new();
        while let Some(b) = self.stream.peek() {
            if !b.is_ascii_alphabetic() {
                break;
            }
            self.stream.consume();
            if name.len() < MAX_CONTROL_WORD_NAME_LEN {
                name.push(b as char);
            }
            // names beyond the cap are silently truncated but still fully
            // consumed so stream position stays in sync.
        }

        let mut negative = false;
        match self.stream.peek() {
            Some(b'-') => {
                negative = true;
                self.stream.consume();
            }
            Some(b'+') => {
                self.stream.consume();
            }
            _ => {}
        }

        let mut digits = Vec::new();
        while let Some(b) = self.stream.peek() {
            if !b.is_ascii_digit() {
                break;
            }
            digits.push(b);
            self.stream.consume();
        }
        let parameter = if digits.is_empty() {
            None
        } else {
            Some(saturating_parse_i32(negative, &digits))
        };

        // the delimiting space is part of the control word, not of what follows
        self.stream.consume_if(b' ');

        if name == "bin" {
            return self.read_binary_region(start, parameter);
        }

        Token::new(TokenKind::ControlWord { name, parameter }, start)
    }

    /// `\bin` is lexically special: its parameter is a byte count, and that
    /// many raw bytes immediately follow with no further tokenization. When
    /// the stream runs dry before `length` bytes are available, the region
    /// is an `Error` token rather than a silently truncated `BinaryData`, so
    /// strict mode aborts and tolerant/permissive mode can still recover.
    fn read_binary_region(&mut self, start: Position, parameter: Option<i32>) -> Token {
        let length = parameter.unwrap_or(0).max(0) as usize;
        let source_offset = self.stream.position().offset;
        let data = self.stream.consume_n(length);
        if data.len() < length {
            return Token::new(
                TokenKind::Error {
                    message: format!("\\bin region truncated: expected {length} bytes, found {}", data.len()),
                },
                start,
            );
        }
        Token::new(TokenKind::BinaryData { length, data, source_offset }, start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokenize(input: &[u8]) -> Vec<TokenKind> {
        let mut t = Tokenizer::new(ByteStream::from_slice(input));
        let mut out = Vec::new();
        loop {
            let tok = t.next_token();
            let done = tok.is_eof();
            out.push(tok.kind);
            if done {
                break;
            }
        }
        out
    }

    #[test]
    fn groups_and_text() {
        let toks = tokenize(b"{hi}");
        assert_eq!(
            toks,
            vec![
                TokenKind::GroupStart,
                TokenKind::Text { bytes: b"hi".to_vec() },
                TokenKind::GroupEnd,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn control_word_with_parameter_and_space_delimiter() {
        let toks = tokenize(br"\b0 text");
        assert_eq!(toks[0], TokenKind::ControlWord { name: "b".into(), parameter: Some(0) });
        assert_eq!(toks[1], TokenKind::Text { bytes: b"text".to_vec() });
    }

    #[test]
    fn control_word_without_parameter() {
        let toks = tokenize(br"\par");
        assert_eq!(toks[0], TokenKind::ControlWord { name: "par".into(), parameter: None });
    }

    #[test]
    fn negative_parameter() {
        let toks = tokenize(br"\li-360");
        assert_eq!(toks[0], TokenKind::ControlWord { name: "li".into(), parameter: Some(-360) });
    }

    #[test]
    fn control_symbol() {
        let toks = tokenize(br"\~\-\_");
        assert_eq!(
            toks[0..3],
            vec![
                TokenKind::ControlSymbol { byte: b'~' },
                TokenKind::ControlSymbol { byte: b'-' },
                TokenKind::ControlSymbol { byte: b'_' },
            ]
        );
    }

    #[test]
    fn hex_escape() {
        let toks = tokenize(br"\'e9");
        assert_eq!(toks[0], TokenKind::HexChar { byte: 0xe9 });
    }

    #[test]
    fn invalid_hex_escape_is_an_error_token() {
        let toks = tokenize(br"\'zz");
        assert!(matches!(toks[0], TokenKind::Error { .. }));
    }

    #[test]
    fn bin_region_consumes_exact_length() {
        let toks = tokenize(b"\\bin5 XXXXXafter");
        assert_eq!(
            toks[0],
            TokenKind::BinaryData { length: 5, data: b"XXXXX".to_vec(), source_offset: 6 }
        );
        assert_eq!(toks[1], TokenKind::Text { bytes: b"after".to_vec() });
    }

    #[test]
    fn bin_region_errors_when_stream_runs_dry() {
        let toks = tokenize(b"\\bin100 short");
        assert!(matches!(toks[0], TokenKind::Error { .. }), "expected Error, got {:?}", toks[0]);
    }

    #[test]
    fn literal_cr_lf_is_dropped_from_text() {
        let toks = tokenize(b"a\r\nb");
        assert_eq!(toks[0], TokenKind::Text { bytes: b"ab".to_vec() });
    }

    #[test]
    fn overlong_control_word_name_is_truncated_not_errored() {
        let long = "a".repeat(80);
        let input = format!("\\{long} ");
        let toks = tokenize(input.as_bytes());
        match &toks[0] {
            TokenKind::ControlWord { name, .. } => assert_eq!(name.len(), MAX_CONTROL_WORD_NAME_LEN),
            other => panic!("expected ControlWord, got {other:?}"),
        }
    }

    #[test]
    fn saturates_huge_parameter() {
        let toks = tokenize(b"\\foo99999999999999999999999");
        assert_eq!(
            toks[0],
            TokenKind::ControlWord { name: "foo".into(), parameter: Some(i32::MAX) }
        );
    }
}
