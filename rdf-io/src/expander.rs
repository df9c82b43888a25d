//! Expands a statement's subject/predicate/object/graph through an
//! [`Environment`] before forwarding it — eliminating CURIEs and resolving
//! relative IRIs on the way through a sink chain, ahead of a writer that
//! wants fully-expanded IRIs or independently of [`storage::Inserter`].
//! Grounded in `examples/original_source/src/expander.c`
//! (`serd_expander_new`/`serd_expander_on_event`).

use rdf_model::{Environment, Error as ModelError, Statement};

use crate::sink::{Event, Sink};

/// Wraps `target`, rewriting each `Statement` event's four terms through
/// `env` before forwarding it. Terms that fail to expand (an undefined
/// CURIE prefix, a relative IRI with no base) abort the event with the
/// underlying [`rdf_model::Error`], matching the expansion failure this
/// library's [`storage::Inserter`] applies inline rather than silently
/// leaving the term unexpanded (the C source's `serd_expander_on_event`
/// falls back to the original term on a `NULL` expansion, but this
/// library's `Environment::expand` already distinguishes "pass through
/// unchanged" — blank nodes — from "failed to expand" via its `Result`,
/// so a genuine failure here is propagated rather than swallowed).
pub struct ExpandingSink<'e, T> {
    target: T,
    env: &'e Environment,
}

impl<'e, T: Sink> ExpandingSink<'e, T> {
    pub fn new(target: T, env: &'e Environment) -> ExpandingSink<'e, T> {
        ExpandingSink { target, env }
    }

    /// Unwraps the expander, returning the wrapped sink.
    pub fn into_inner(self) -> T {
        self.target
    }
}

impl<'e, T: Sink> Sink for ExpandingSink<'e, T>
where
    T::Error: From<ModelError>,
{
    type Error = T::Error;

    fn event(&mut self, event: Event<'_>) -> Result<(), T::Error> {
        match event {
            Event::Statement(flags, stmt) => {
                let subject = self.env.expand(&stmt.subject)?;
                let predicate = self.env.expand(&stmt.predicate)?;
                let object = self.env.expand(&stmt.object)?;
                let graph = match &stmt.graph {
                    Some(g) => Some(self.env.expand(g)?),
                    None => None,
                };
                let mut expanded = Statement::new(subject, predicate, object, graph)?;
                expanded.cursor = stmt.cursor.clone();
                self.target.event(Event::Statement(flags, &expanded))
            }
            other => self.target.event(other),
        }
    }
}
