//! A [`Sink`] that loads a parsed document straight into a [`QuadStore`]
//! (§4.I). Sits at the end of a [`Reader`](rdf_io::Reader) pipeline the
//! same way a [`Writer`](rdf_io::Writer) does, but calls
//! [`QuadStore::add`] instead of serializing.

use rdf_io::{Event, Sink, StatementFlags};
use rdf_model::{Environment, Node};

use crate::error::{StoreError, StoreResult};
use crate::store::QuadStore;

/// Feeds base/prefix/statement events into an `Environment` and a
/// `QuadStore`. `Base`/`Prefix` events update the environment; `Statement`
/// events are expanded against it, then interned and added. `End` events
/// carry no information this sink needs (the store holds flat statements,
/// not nested scopes) and are ignored.
pub struct Inserter<'s> {
    store: &'s mut QuadStore,
    env: Environment,
    default_graph: Option<Node>,
    poisoned: bool,
}

impl<'s> Inserter<'s> {
    /// Inserts into the true default graph when a statement carries none.
    pub fn new(store: &'s mut QuadStore) -> Inserter<'s> {
        Inserter { store, env: Environment::new(), default_graph: None, poisoned: false }
    }

    /// Inserts into `default_graph` when a statement carries no graph of
    /// its own, instead of the true default graph.
    pub fn with_default_graph(store: &'s mut QuadStore, default_graph: Node) -> Inserter<'s> {
        Inserter { store, env: Environment::new(), default_graph: Some(default_graph), poisoned: false }
    }

    /// Starts from an environment already seeded with prefixes/base
    /// (e.g. ones shared with a sibling reader or writer).
    pub fn with_environment(store: &'s mut QuadStore, env: Environment) -> Inserter<'s> {
        Inserter { store, env, default_graph: None, poisoned: false }
    }

    pub fn environment(&self) -> &Environment {
        &self.env
    }

    fn insert_statement(&mut self, stmt: &rdf_model::Statement) -> StoreResult<()> {
        let subject = self.env.expand(&stmt.subject)?;
        let predicate = self.env.expand(&stmt.predicate)?;
        let object = self.env.expand(&stmt.object)?;
        let graph = match &stmt.graph {
            Some(g) => Some(self.env.expand(g)?),
            None => self.default_graph.clone(),
        };

        match self.store.add(&subject, &predicate, &object, graph.as_ref()) {
            Ok(()) => Ok(()),
            // A duplicate statement is a non-fatal condition for the
            // store (§4.H.3); a document that happens to repeat a
            // triple is not malformed, so the load continues.
            Err(StoreError::Failure(_)) => Ok(()),
            Err(other) => Err(other),
        }
    }
}

impl<'s> Sink for Inserter<'s> {
    type Error = StoreError;

    fn event(&mut self, event: Event<'_>) -> StoreResult<()> {
        if self.poisoned {
            return Err(StoreError::Invalid("inserter already failed".into()));
        }
        let result = match event {
            Event::Base(node) => self.env.set_base(node.clone()).map_err(StoreError::from),
            Event::Prefix(name, node) => self.env.set_prefix(name, node.clone()).map_err(StoreError::from),
            Event::Statement(_flags, stmt) => self.insert_statement(stmt),
            Event::End(_) => Ok(()),
        };
        if result.is_err() {
            self.poisoned = true;
        }
        result
    }
}
