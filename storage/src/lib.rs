//! A single-threaded, in-process multi-indexed statement store (§4.H).
//!
//! A [`QuadStore`] holds RDF statements under as many of the ten index
//! orderings (§4.H.1) as [`IndexConfig`] enables, and answers `add`,
//! `erase`, `erase_range`, `count`, `ask`, `find` and `iter` against a
//! [`pattern::QuadPattern`]. An [`inserter::Inserter`] adapts a store into
//! an `rdf_io::Sink` so a [`rdf_io::Reader`] can load a document straight
//! into it.
//!
//! # Example
//!
//! ```
//! use storage::QuadStore;
//! use storage::pattern::{QuadPattern, NodePattern, GraphPattern};
//! use rdf_model::Node;
//!
//! let mut store = QuadStore::new();
//! store.add(
//!     &Node::make_iri("http://example.org/s"),
//!     &Node::make_iri("http://example.org/p"),
//!     &Node::make_iri("http://example.org/o"),
//!     None,
//! ).unwrap();
//!
//! assert!(store.ask(&QuadPattern {
//!     subject: NodePattern::Exact(Node::make_iri("http://example.org/s")),
//!     predicate: NodePattern::Any,
//!     object: NodePattern::Any,
//!     graph: GraphPattern::Any,
//! }).unwrap());
//! ```

#![deny(unsafe_code)]
#![warn(rust_2018_idioms)]

pub mod error;
pub mod index;
pub mod inserter;
pub mod nodes;
pub mod observability;
pub mod pattern;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use index::{IndexKind, Key, Plan, ScanMode};
pub use inserter::Inserter;
pub use nodes::{NodeId, Nodes};
pub use observability::{track_operation, OperationType};
pub use pattern::{GraphPattern, NodePattern, QuadPattern};
pub use store::{IndexConfig, QuadStore, StatementIter};
