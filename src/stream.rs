//! A uniform, position-tracked byte source over three backings: an
//! in-memory slice, a pull [`Read`]er, or a memory-mapped file.
//!
//! All three expose the same `peek`/`peek_offset`/`consume` contract so the
//! tokenizer never has to know which one it is driving.

use std::io::Read;
use std::path::Path;

use crate::error::{Result, RtfError};
use crate::position::Position;

/// Files at or above this size are memory-mapped by [`ByteStream::from_file`]
/// instead of being read fully into memory.
pub const DEFAULT_MMAP_THRESHOLD: u64 = 1024 * 1024;

/// Minimum number of bytes [`ByteStream::peek_offset`] is guaranteed to make
/// available (when that many remain in the source), regardless of backing.
const MIN_LOOKAHEAD: usize = 4;

/// How much to read from a pull reader at a time when the lookahead buffer
/// runs dry.
const READER_CHUNK: usize = 8 * 1024;

enum FullBytes<'a> {
    Borrowed(&'a [u8]),
    Owned(Vec<u8>),
    Mmap(memmap2::Mmap),
}

impl<'a> FullBytes<'a> {
    fn as_slice(&self) -> &[u8] {
        match self {
            FullBytes::Borrowed(s) => s,
            FullBytes::Owned(v) => v.as_slice(),
            FullBytes::Mmap(m) => &m[..],
        }
    }
}

struct ReaderBacking<'a> {
    reader: Box<dyn Read + 'a>,
    buf: Vec<u8>,
    /// Index into `buf` of the next unconsumed byte.
    buf_pos: usize,
    eof: bool,
}

impl<'a> ReaderBacking<'a> {
    /// Ensure at least `want` unconsumed bytes are buffered (or we've hit EOF).
    fn fill(&mut self, want: usize) -> std::io::Result<()> {
        if self.eof {
            return Ok(());
        }
        // Compact the buffer so we don't grow it forever.
        if self.buf_pos > 0 {
            self.buf.drain(0..self.buf_pos);
            self.buf_pos = 0;
        }
        while self.buf.len() < want && !self.eof {
            let start = self.buf.len();
            self.buf.resize(start + READER_CHUNK, 0);
            let n = self.reader.read(&mut self.buf[start..])?;
            self.buf.truncate(start + n);
            if n == 0 {
                self.eof = true;
            }
        }
        Ok(())
    }

    fn peek_offset(&mut self, n: usize) -> std::io::Result<Option<u8>> {
        if self.buf_pos + n >= self.buf.len() && !self.eof {
            self.fill(self.buf_pos + n + 1)?;
        }
        Ok(self.buf.get(self.buf_pos + n).copied())
    }

    fn consume(&mut self) -> std::io::Result<Option<u8>> {
        let byte = self.peek_offset(0)?;
        if byte.is_some() {
            self.buf_pos += 1;
        }
        Ok(byte)
    }
}

enum Backing<'a> {
    Full { bytes: FullBytes<'a>, cursor: usize },
    Reader(ReaderBacking<'a>),
}

/// A position-tracked byte source.
///
/// Construct with [`ByteStream::from_slice`], [`ByteStream::from_reader`], or
/// [`ByteStream::from_file`].
pub struct ByteStream<'a> {
    backing: Backing<'a>,
    pos: Position,
    prev_byte: Option<u8>,
}

impl<'a> ByteStream<'a> {
    /// Zero-copy stream over a borrowed byte slice.
    pub fn from_slice(data: &'a [u8]) -> Self {
        ByteStream {
            backing: Backing::Full { bytes: FullBytes::Borrowed(data), cursor: 0 },
            pos: Position::start(),
            prev_byte: None,
        }
    }

    /// Stream over an owned buffer (used internally by `from_file` below the
    /// mmap threshold, and available to callers who already have bytes in hand).
    pub fn from_owned(data: Vec<u8>) -> Self {
        ByteStream {
            backing: Backing::Full { bytes: FullBytes::Owned(data), cursor: 0 },
            pos: Position::start(),
            prev_byte: None,
        }
    }

    /// Stream over any pull reader. Buffers internally; never requires the
    /// reader to be seekable.
    pub fn from_reader(reader: impl Read + 'a) -> Self {
        ByteStream {
            backing: Backing::Reader(ReaderBacking {
                reader: Box::new(reader),
                buf: Vec::new(),
                buf_pos: 0,
                eof: false,
            }),
            pos: Position::start(),
            prev_byte: None,
        }
    }

    /// Open a file, memory-mapping it when its size is at or above `threshold`
    /// bytes, otherwise reading it fully into memory.
    pub fn from_file_with_threshold(path: impl AsRef<Path>, threshold: u64) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)?;
        let len = file.metadata()?.len();
        if len >= threshold {
            // SAFETY: the caller is responsible for not mutating the file out
            // from under the mapping for the lifetime of the returned stream;
            // this matches the documented contract of `memmap2::Mmap::map`.
            let mmap = unsafe { memmap2::Mmap::map(&file)? };
            Ok(ByteStream {
                backing: Backing::Full { bytes: FullBytes::Mmap(mmap), cursor: 0 },
                pos: Position::start(),
                prev_byte: None,
            })
        } else {
            let mut file = file;
            let mut data = Vec::with_capacity(len as usize);
            file.read_to_end(&mut data)?;
            Ok(Self::from_owned(data))
        }
    }

    /// Open a file using the default 1 MiB mmap threshold.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_file_with_threshold(path, DEFAULT_MMAP_THRESHOLD)
    }

    pub fn position(&self) -> Position {
        self.pos
    }

    /// The minimum lookahead distance guaranteed to be valid regardless of backing.
    pub fn min_lookahead(&self) -> usize {
        MIN_LOOKAHEAD
    }

    pub fn peek(&mut self) -> Option<u8> {
        self.peek_offset(0)
    }

    pub fn peek_offset(&mut self, n: usize) -> Option<u8> {
        match &mut self.backing {
            Backing::Full { bytes, cursor } => bytes.as_slice().get(*cursor + n).copied(),
            Backing::Reader(r) => r.peek_offset(n).unwrap_or(None),
        }
    }

    /// Like [`Self::peek_offset`], but surfaces reader I/O failures instead of
    /// silently treating them as end-of-stream.
    pub fn try_peek_offset(&mut self, n: usize) -> Result<Option<u8>> {
        match &mut self.backing {
            Backing::Full { bytes, cursor } => Ok(bytes.as_slice().get(*cursor + n).copied()),
            Backing::Reader(r) => r.peek_offset(n).map_err(RtfError::from),
        }
    }

    pub fn consume(&mut self) -> Option<u8> {
        self.try_consume().unwrap_or(None)
    }

    pub fn try_consume(&mut self) -> Result<Option<u8>> {
        let byte = match &mut self.backing {
            Backing::Full { bytes, cursor } => {
                let b = bytes.as_slice().get(*cursor).copied();
                if b.is_some() {
                    *cursor += 1;
                }
                b
            }
            Backing::Reader(r) => r.consume()?,
        };
        if let Some(b) = byte {
            self.pos.advance(b, self.prev_byte);
            self.prev_byte = Some(b);
        }
        Ok(byte)
    }

    pub fn consume_if(&mut self, b: u8) -> bool {
        if self.peek() == Some(b) {
            self.consume();
            true
        } else {
            false
        }
    }

    /// Consume and return exactly `len` bytes, or as many as remain if the
    /// stream runs dry first (the caller decides whether that's an error).
    pub fn consume_n(&mut self, len: usize) -> Vec<u8> {
        let mut out = Vec::with_capacity(len.min(1 << 20));
        for _ in 0..len {
            match self.consume() {
                Some(b) => out.push(b),
                None => break,
            }
        }
        out
    }

    pub fn at_eof(&mut self) -> bool {
        self.peek().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slice_peek_consume() {
        let mut s = ByteStream::from_slice(b"ab");
        assert_eq!(s.peek(), Some(b'a'));
        assert_eq!(s.peek_offset(1), Some(b'b'));
        assert_eq!(s.peek_offset(2), None);
        assert_eq!(s.consume(), Some(b'a'));
        assert_eq!(s.position().column, 2);
        assert_eq!(s.consume(), Some(b'b'));
        assert_eq!(s.consume(), None);
    }

    #[test]
    fn consume_if_only_advances_on_match() {
        let mut s = ByteStream::from_slice(b"x");
        assert!(!s.consume_if(b'y'));
        assert!(s.consume_if(b'x'));
        assert!(s.at_eof());
    }

    #[test]
    fn reader_backing_matches_slice_behavior() {
        let data: &[u8] = b"hello world, this is a moderately long buffer to exercise refills";
        let mut by_slice = ByteStream::from_slice(data);
        let mut by_reader = ByteStream::from_reader(std::io::Cursor::new(data.to_vec()));
        loop {
            let a = by_slice.consume();
            let b = by_reader.consume();
            assert_eq!(a, b);
            if a.is_none() {
                break;
            }
        }
    }

    #[test]
    fn reader_peek_offset_does_not_advance() {
        let mut s = ByteStream::from_reader(std::io::Cursor::new(b"abcd".to_vec()));
        assert_eq!(s.peek_offset(3), Some(b'd'));
        assert_eq!(s.position().offset, 0);
        assert_eq!(s.consume(), Some(b'a'));
    }

    #[test]
    fn owned_file_below_threshold_reads_fully() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("small.rtf");
        std::fs::write(&path, b"{\\rtf1 hi}").unwrap();
        let mut s = ByteStream::from_file_with_threshold(&path, 1024 * 1024).unwrap();
        assert_eq!(s.consume(), Some(b'{'));
    }

    #[test]
    fn mmap_file_above_threshold() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.rtf");
        std::fs::write(&path, b"{\\rtf1 hi}").unwrap();
        let mut s = ByteStream::from_file_with_threshold(&path, 0).unwrap();
        assert_eq!(s.consume(), Some(b'{'));
    }
}
