/// A location within the source byte stream.
///
/// `line` and `column` are 1-based. A line feed resets `column` to 1 and
/// bumps `line`; a lone carriage return advances the line the same way, and
/// `\r\n` is counted as a single line advance (the `\n` of the pair is a
/// no-op for line tracking since the `\r` already advanced it).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Position {
    pub offset: u64,
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub fn start() -> Self {
        Position { offset: 0, line: 1, column: 1 }
    }

    /// Advance the position by one consumed byte.
    pub(crate) fn advance(&mut self, byte: u8, prev_byte: Option<u8>) {
        self.offset += 1;
        match byte {
            b'\n' if prev_byte == Some(b'\r') => {
                // second half of a \r\n pair: already counted as one line advance
                self.column = 1;
            }
            b'\n' | b'\r' => {
                self.line += 1;
                self.column = 1;
            }
            _ => {
                self.column += 1;
            }
        }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{} (byte {})", self.line, self.column, self.offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_lines_and_columns() {
        let mut pos = Position::start();
        for b in b"ab\ncd" {
            pos.advance(*b, None);
        }
        assert_eq!(pos.line, 2);
        assert_eq!(pos.column, 3);
        assert_eq!(pos.offset, 5);
    }

    #[test]
    fn crlf_counts_as_one_advance() {
        let mut pos = Position::start();
        let bytes = b"a\r\nb";
        let mut prev = None;
        for b in bytes {
            pos.advance(*b, prev);
            prev = Some(*b);
        }
        // a(col2) \r(line2,col1) \n(still line2,col1) b(col2)
        assert_eq!(pos.line, 2);
        assert_eq!(pos.column, 2);
    }

    #[test]
    fn lone_cr_advances_line() {
        let mut pos = Position::start();
        let mut prev = None;
        for b in b"a\rb" {
            pos.advance(*b, prev);
            prev = Some(*b);
        }
        assert_eq!(pos.line, 2);
        assert_eq!(pos.column, 2);
    }
}
