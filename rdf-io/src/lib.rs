//! Streaming reader and writer for the four RDF syntaxes that share a
//! common lexical core: N-Triples, N-Quads, Turtle, and TriG.
//!
//! Reading and writing are both expressed as an [`Event`](sink::Event)
//! stream: [`Reader`](reader::Reader) produces events from bytes,
//! [`Writer`](writer::Writer) consumes them back into bytes, and anything
//! implementing [`Sink`](sink::Sink) can sit in between (filtering,
//! normalizing, or inserting into a store).

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod byte_sink;
pub mod byte_source;
pub mod expander;
pub mod filter;
pub mod log;
pub mod normalise;
pub mod reader;
pub mod sink;
pub mod writer;

pub use byte_sink::ByteSink;
pub use byte_source::ByteSource;
pub use expander::ExpandingSink;
pub use filter::FilterSink;
pub use normalise::NormalisingSink;
pub use reader::{Reader, ReaderConfig};
pub use sink::{Event, Sink, StatementFlags};
pub use writer::{Writer, WriterConfig};

use rdf_model::Cursor;

/// The four syntaxes this crate reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Syntax {
    /// Flat line-based triple syntax (one statement per line, no graph).
    NTriples,
    /// Flat line-based quad syntax (one statement per line, optional graph).
    NQuads,
    /// Terse abbreviated triple syntax (directives, lists, blank-node sugar).
    Turtle,
    /// Terse abbreviated quad syntax (Turtle plus `{ ... }` graph blocks).
    TriG,
}

impl Syntax {
    /// `true` for the two syntaxes that accept directives, abbreviation,
    /// and blank-node/list sugar.
    pub fn is_terse(self) -> bool {
        matches!(self, Syntax::Turtle | Syntax::TriG)
    }

    /// `true` for the two syntaxes whose statements may carry a graph term.
    pub fn has_graphs(self) -> bool {
        matches!(self, Syntax::NQuads | Syntax::TriG)
    }
}

/// Errors produced while reading a document. Every variant that can occur
/// mid-document carries the [`Cursor`] at which it was detected.
#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    /// Non-fatal: end of input reached at a chunk/document boundary.
    #[error("failure: {0}")]
    Failure(String),

    /// Input violates the grammar.
    #[error("bad syntax at {line}:{col}: {message}")]
    BadSyntax { line: u64, col: u64, message: String },

    /// Caller supplied an invalid term (e.g. a non-absolute `@base`).
    #[error("bad argument at {line}:{col}: {message}")]
    BadArgument { line: u64, col: u64, message: String },

    /// Parse stack arena exhausted.
    #[error("overflow at {line}:{col}")]
    Overflow { line: u64, col: u64 },

    /// Unexpected end of input mid-production.
    #[error("no data at {line}:{col}")]
    NoData { line: u64, col: u64 },

    /// A user-supplied blank label collided with the generator's scheme.
    #[error("id clash at {line}:{col}: {label}")]
    IdClash { line: u64, col: u64, label: String },

    /// Undefined prefix when expanding a CURIE.
    #[error("bad CURIE at {line}:{col}: {message}")]
    BadCurie { line: u64, col: u64, message: String },

    /// Propagated from a downstream sink (e.g. the inserter or writer).
    #[error(transparent)]
    Sink(#[from] rdf_model::Error),

    /// The underlying byte source returned an I/O error.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ReadError {
    /// The document the error occurred in, if one has been associated with
    /// the reader (set on [`ReaderConfig`]).
    pub fn cursor(&self, document: rdf_model::Node) -> Option<Cursor> {
        let (line, col) = match self {
            ReadError::BadSyntax { line, col, .. }
            | ReadError::BadArgument { line, col, .. }
            | ReadError::Overflow { line, col }
            | ReadError::NoData { line, col }
            | ReadError::IdClash { line, col, .. }
            | ReadError::BadCurie { line, col, .. } => (*line, *col),
            _ => return None,
        };
        Some(Cursor::new(document, line, col))
    }

    /// Per §4.F.4/§7: in lax mode, these kinds are reported to the log and
    /// the reader resynchronizes instead of terminating.
    pub fn is_resumable_in_lax_mode(&self) -> bool {
        matches!(self, ReadError::BadSyntax { .. } | ReadError::BadCurie { .. })
    }
}

/// Result type for reader operations.
pub type ReadResult<T> = std::result::Result<T, ReadError>;

/// Errors produced while writing. The writer propagates the first error
/// from its byte sink and refuses further writes until reset.
#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    /// The byte sink accepted fewer bytes than requested.
    #[error("short write")]
    BadWrite,

    /// A write was attempted in the wrong state (e.g. after `finish`).
    #[error("bad call: {0}")]
    BadCall(String),

    /// Propagated from the environment (e.g. CURIE/IRI expansion failure).
    #[error(transparent)]
    Environment(#[from] rdf_model::Error),

    /// The underlying byte sink returned an I/O error.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result type for writer operations.
pub type WriteResult<T> = std::result::Result<T, WriteError>;

impl From<WriteError> for ReadError {
    fn from(e: WriteError) -> ReadError {
        match e {
            WriteError::Environment(err) => ReadError::Sink(err),
            WriteError::Io(err) => ReadError::Io(err),
            other => ReadError::Failure(other.to_string()),
        }
    }
}
