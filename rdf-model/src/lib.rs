//! Node model, URI algebra, and environment for a lightweight RDF syntax
//! library.
//!
//! This crate has no I/O and no allocation beyond what node values
//! themselves need: it is shared by the streaming reader/writer (`rdf-io`)
//! and the statement store (`storage`), neither of which depend on the
//! other.
//!
//! # Example
//!
//! ```
//! use rdf_model::{Environment, Node};
//!
//! let mut env = Environment::new();
//! env.set_base(Node::make_iri("http://example.org/")).unwrap();
//! env.set_prefix("eg", Node::make_iri("http://example.org/")).unwrap();
//!
//! let curie = env.qualify("http://example.org/subject").unwrap();
//! assert_eq!(curie.text(), "eg:subject");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod base64;
mod cursor;
mod env;
mod node;
mod numeric;
mod statement;
pub mod uri;
pub mod vocab;

pub use cursor::Cursor;
pub use env::Environment;
pub use node::{Meta, Node, NodeFlags, NodeKind};
pub use statement::Statement;
pub use uri::Uri;

/// The error-kind taxonomy from §7, shared by every crate in this
/// workspace. Downstream crates add their own I/O- or iterator-specific
/// variants but reuse this enum for the node/URI/environment-level kinds
/// rather than re-declaring them.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Non-fatal, expected alternative outcome (duplicate insert, EOF at a
    /// chunk boundary).
    #[error("failure: {0}")]
    Failure(String),

    /// Caller supplied an invalid term, e.g. a non-absolute base IRI.
    #[error("bad argument: {0}")]
    BadArgument(String),

    /// Undefined prefix when expanding a CURIE.
    #[error("bad CURIE: {0}")]
    BadCurie(String),

    /// Semantic validation failure.
    #[error("invalid: {0}")]
    Invalid(String),

    /// Should-not-happen condition.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type for this crate's operations.
pub type Result<T> = std::result::Result<T, Error>;
