//! Errors the store and inserter can produce (§7).

/// Non-fatal and fatal conditions a [`QuadStore`](crate::QuadStore) or
/// [`Inserter`](crate::Inserter) can report.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Non-fatal: `add` found an equal statement already present, or
    /// `erase`/`erase_range` reached the end of its range.
    #[error("failure: {0}")]
    Failure(String),

    /// An iterator was used after a mutation invalidated it.
    #[error("bad iterator")]
    BadIterator,

    /// A pattern or statement component failed validation (e.g. a literal
    /// subject).
    #[error("invalid: {0}")]
    Invalid(String),

    /// Propagated from node/environment expansion (e.g. an undefined
    /// CURIE prefix or a non-absolute relative IRI).
    #[error(transparent)]
    Model(#[from] rdf_model::Error),
}

/// Result type for store and inserter operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;
