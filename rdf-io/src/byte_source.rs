//! Pull-based byte source with paging and cursor tracking.

use std::io::{self, Read};

/// Anything the reader can pull bytes from. Any `std::io::Read` qualifies
/// via the blanket impl below — short read (`Ok(0)`) signals EOF exactly as
/// `Read::read` already specifies, which is the idiomatic-Rust rendition of
/// "pull function yielding bytes with an error predicate".
pub trait ByteSource {
    /// Pull up to `buf.len()` bytes. `Ok(0)` signals EOF.
    fn pull(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}

impl<R: Read> ByteSource for R {
    fn pull(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.read(buf)
    }
}

/// Buffers a [`ByteSource`] a page at a time (or one byte at a time, for
/// interactive streams) and maintains a (line, column) cursor: line
/// increments on `\n`, column resets on `\n` and otherwise advances by one
/// per byte regardless of UTF-8 continuation, matching the project's
/// documented editor-convention cursor semantics.
pub struct CursorSource<S> {
    source: S,
    buf: Vec<u8>,
    pos: usize,
    filled: usize,
    page_size: usize,
    eof: bool,
    line: u64,
    column: u64,
}

impl<S: ByteSource> CursorSource<S> {
    pub fn new(source: S, page_size: usize) -> CursorSource<S> {
        let page_size = page_size.max(1);
        CursorSource {
            source,
            buf: vec![0; page_size],
            pos: 0,
            filled: 0,
            page_size,
            eof: false,
            line: 1,
            column: 1,
        }
    }

    pub fn line(&self) -> u64 {
        self.line
    }

    pub fn column(&self) -> u64 {
        self.column
    }

    fn refill(&mut self) -> io::Result<()> {
        if self.pos < self.filled || self.eof {
            return Ok(());
        }
        let n = self.source.pull(&mut self.buf[..self.page_size])?;
        self.pos = 0;
        self.filled = n;
        if n == 0 {
            self.eof = true;
        }
        Ok(())
    }

    /// Peek the next byte without consuming it, or `None` at EOF.
    pub fn peek(&mut self) -> io::Result<Option<u8>> {
        self.refill()?;
        Ok(if self.pos < self.filled { Some(self.buf[self.pos]) } else { None })
    }

    /// Consume and return the next byte, advancing the cursor.
    pub fn next_byte(&mut self) -> io::Result<Option<u8>> {
        self.refill()?;
        if self.pos >= self.filled {
            return Ok(None);
        }
        let byte = self.buf[self.pos];
        self.pos += 1;
        if byte == b'\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Ok(Some(byte))
    }

    pub fn at_eof(&mut self) -> io::Result<bool> {
        Ok(self.peek()?.is_none())
    }
}
