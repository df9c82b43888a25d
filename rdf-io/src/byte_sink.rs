//! Push-based byte sink with optional block-size buffering.

use std::io::{self, Write};

/// Anything the writer can push bytes to. Any `std::io::Write` qualifies
/// via the blanket impl below — a short write is surfaced as an error
/// exactly as `Write::write_all` already does.
pub trait ByteSink {
    /// Push all of `buf`. A short write is an error.
    fn push(&mut self, buf: &[u8]) -> io::Result<()>;

    /// Flush any buffered bytes.
    fn flush(&mut self) -> io::Result<()>;
}

impl<W: Write> ByteSink for W {
    fn push(&mut self, buf: &[u8]) -> io::Result<()> {
        self.write_all(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Write::flush(self)
    }
}

/// Buffers writes into fixed-size blocks before pushing to the underlying
/// sink, mirroring the source library's block-sized page sink.
pub struct BufferedSink<S> {
    sink: S,
    buf: Vec<u8>,
    block_size: usize,
}

impl<S: ByteSink> BufferedSink<S> {
    pub fn new(sink: S, block_size: usize) -> BufferedSink<S> {
        BufferedSink { sink, buf: Vec::with_capacity(block_size.max(1)), block_size: block_size.max(1) }
    }

    pub fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.buf.extend_from_slice(bytes);
        while self.buf.len() >= self.block_size {
            let block: Vec<u8> = self.buf.drain(..self.block_size).collect();
            self.sink.push(&block)?;
        }
        Ok(())
    }

    pub fn finish(mut self) -> io::Result<S> {
        if !self.buf.is_empty() {
            self.sink.push(&self.buf)?;
            self.buf.clear();
        }
        self.sink.flush()?;
        Ok(self.sink)
    }
}
