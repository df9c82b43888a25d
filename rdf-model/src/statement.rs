//! A (subject, predicate, object, graph?) tuple asserting a relationship.

use std::fmt;

use crate::cursor::Cursor;
use crate::node::Node;
use crate::{Error, Result};

/// Subject and predicate must not be literals; object may be any kind;
/// graph absent means the default graph. User-constructed statements own
/// their nodes (the store instead borrows interned nodes by index).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub subject: Node,
    pub predicate: Node,
    pub object: Node,
    pub graph: Option<Node>,
    pub cursor: Option<Cursor>,
}

impl Statement {
    pub fn new(subject: Node, predicate: Node, object: Node, graph: Option<Node>) -> Result<Statement> {
        if subject.is_literal() {
            return Err(Error::BadArgument("subject must not be a literal".into()));
        }
        if !predicate.is_iri() && !predicate.is_curie() {
            return Err(Error::BadArgument("predicate must be an IRI or CURIE".into()));
        }
        if let Some(g) = &graph {
            if g.is_literal() {
                return Err(Error::BadArgument("graph must not be a literal".into()));
            }
        }
        Ok(Statement { subject, predicate, object, graph, cursor: None })
    }

    pub fn with_cursor(mut self, cursor: Cursor) -> Statement {
        self.cursor = Some(cursor);
        self
    }

    pub fn is_default_graph(&self) -> bool {
        self.graph.is_none()
    }

    /// A `None` component is a wildcard matching anything at that position,
    /// including an absent graph — the same convention `storage`'s
    /// `GraphPattern::Any` uses, and the one `serd_statement_matches` uses
    /// for every field (a C `NULL`/variable node in any position is a
    /// wildcard, graph included).
    pub fn matches(&self, s: Option<&Node>, p: Option<&Node>, o: Option<&Node>, g: Option<&Node>) -> bool {
        s.is_none_or(|s| s == &self.subject)
            && p.is_none_or(|p| p == &self.predicate)
            && o.is_none_or(|o| o == &self.object)
            && g.is_none_or(|g| Some(g) == self.graph.as_ref())
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.graph {
            Some(g) => write!(f, "{} {} {} {} .", self.subject, self.predicate, self.object, g),
            None => write!(f, "{} {} {} .", self.subject, self.predicate, self.object),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_literal_subject() {
        let lit = Node::make_string("x");
        let p = Node::make_iri("http://example.org/p");
        let o = Node::make_string("o");
        assert!(Statement::new(lit, p, o, None).is_err());
    }

    #[test]
    fn matches_wildcards() {
        let s = Node::make_iri("http://example.org/s");
        let p = Node::make_iri("http://example.org/p");
        let o = Node::make_string("o");
        let stmt = Statement::new(s.clone(), p, o, None).unwrap();
        assert!(stmt.matches(Some(&s), None, None, None));
        assert!(stmt.matches(None, None, None, None));
    }
}
