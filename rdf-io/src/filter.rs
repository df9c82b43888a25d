//! Pattern-filtering sink: forwards every non-`Statement` event unchanged
//! and `Statement` events only when they match a subject/predicate/object/
//! graph pattern. Grounded in `examples/original_source/src/filter.c`
//! (`serd_filter_new`/`serd_filter_on_event`), generalized from the C
//! API's "null pointer is wildcard" convention to `Option<Node>`.

use rdf_model::Node;

use crate::sink::{Event, Sink};

/// Wraps `target`, dropping `Statement` events whose subject, predicate,
/// object, or graph don't match the corresponding pattern field. `None` in
/// any position — including graph — is a wildcard matching anything there.
pub struct FilterSink<T> {
    target: T,
    subject: Option<Node>,
    predicate: Option<Node>,
    object: Option<Node>,
    graph: Option<Node>,
}

impl<T: Sink> FilterSink<T> {
    /// `None` in any position matches unconditionally.
    pub fn new(
        target: T,
        subject: Option<Node>,
        predicate: Option<Node>,
        object: Option<Node>,
        graph: Option<Node>,
    ) -> FilterSink<T> {
        FilterSink { target, subject, predicate, object, graph }
    }

    /// Unwraps the filter, returning the wrapped sink.
    pub fn into_inner(self) -> T {
        self.target
    }
}

impl<T: Sink> Sink for FilterSink<T> {
    type Error = T::Error;

    fn event(&mut self, event: Event<'_>) -> Result<(), T::Error> {
        match &event {
            Event::Statement(_, stmt) => {
                let matches = stmt.matches(
                    self.subject.as_ref(),
                    self.predicate.as_ref(),
                    self.object.as_ref(),
                    self.graph.as_ref(),
                );
                if matches {
                    self.target.event(event)
                } else {
                    Ok(())
                }
            }
            _ => self.target.event(event),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::StatementFlags;
    use rdf_model::Statement;

    #[derive(Default)]
    struct CollectSink {
        statements: Vec<Statement>,
    }

    impl Sink for CollectSink {
        type Error = std::convert::Infallible;
        fn event(&mut self, event: Event<'_>) -> Result<(), Self::Error> {
            if let Event::Statement(_, stmt) = event {
                self.statements.push(stmt.clone());
            }
            Ok(())
        }
    }

    fn iri(s: &str) -> Node {
        Node::make_iri(s)
    }

    fn stmt(s: &str, p: &str, o: &str) -> Statement {
        Statement::new(iri(s), iri(p), iri(o), None).unwrap()
    }

    #[test]
    fn forwards_only_matching_subject() {
        let mut filter =
            FilterSink::new(CollectSink::default(), Some(iri("http://example.org/a")), None, None, None);
        filter.event(Event::Statement(StatementFlags::empty(), &stmt("http://example.org/a", "http://example.org/p", "http://example.org/o1"))).unwrap();
        filter.event(Event::Statement(StatementFlags::empty(), &stmt("http://example.org/b", "http://example.org/p", "http://example.org/o2"))).unwrap();

        let collected = filter.into_inner();
        assert_eq!(collected.statements.len(), 1);
        assert_eq!(collected.statements[0].object.text(), "http://example.org/o1");
    }

    #[test]
    fn no_pattern_fields_forwards_everything() {
        let mut filter = FilterSink::new(CollectSink::default(), None, None, None, None);
        filter.event(Event::Statement(StatementFlags::empty(), &stmt("http://example.org/a", "http://example.org/p", "http://example.org/o"))).unwrap();
        filter.event(Event::Base(&iri("http://example.org/"))).unwrap();

        assert_eq!(filter.into_inner().statements.len(), 1);
    }

    #[test]
    fn graph_wildcard_matches_default_graph_statements() {
        let mut filter = FilterSink::new(CollectSink::default(), None, None, None, None);
        filter.event(Event::Statement(StatementFlags::empty(), &stmt("http://example.org/a", "http://example.org/p", "http://example.org/o"))).unwrap();
        assert_eq!(filter.into_inner().statements.len(), 1);
    }
}
