//! A single polymorphic event handler composing into filter/normalize/
//! expand/insert/write pipelines, per the §9 design note preferring one
//! event-handler trait over four parallel callback slots.

use rdf_model::{Node, Statement};

/// One bit per abbreviation hint a [`Reader`](crate::reader::Reader) or
/// other producer can attach to a [`Event::Statement`]. The combination is
/// advisory: it tells a writer that the producer already decided to open a
/// bracketed/parenthesized grouping whose scope closes at the matching
/// [`Event::End`] for that blank node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatementFlags(u8);

impl StatementFlags {
    pub const EMPTY_S: StatementFlags = StatementFlags(1 << 0);
    pub const ANON_S_BEGIN: StatementFlags = StatementFlags(1 << 1);
    pub const ANON_O_BEGIN: StatementFlags = StatementFlags(1 << 2);
    pub const LIST_S_BEGIN: StatementFlags = StatementFlags(1 << 3);
    pub const LIST_O_BEGIN: StatementFlags = StatementFlags(1 << 4);
    pub const TERSE_S: StatementFlags = StatementFlags(1 << 5);
    pub const TERSE_O: StatementFlags = StatementFlags(1 << 6);

    pub const fn empty() -> Self {
        StatementFlags(0)
    }

    pub const fn contains(self, other: StatementFlags) -> bool {
        (self.0 & other.0) == other.0
    }
}

impl std::ops::BitOr for StatementFlags {
    type Output = StatementFlags;
    fn bitor(self, rhs: StatementFlags) -> StatementFlags {
        StatementFlags(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for StatementFlags {
    fn bitor_assign(&mut self, rhs: StatementFlags) {
        self.0 |= rhs.0;
    }
}

/// One of the four event kinds a [`Sink`] consumes.
#[derive(Debug, Clone)]
pub enum Event<'a> {
    /// Base IRI change.
    Base(&'a Node),
    /// Prefix binding.
    Prefix(&'a str, &'a Node),
    /// One triple/quad with abbreviation hints.
    Statement(StatementFlags, &'a Statement),
    /// Closes an anonymous/blank-node or list scope previously opened by a
    /// `Statement` carrying an anon-begin or list-begin flag.
    End(&'a Node),
}

/// A consumer of the event stream. Sinks compose: one may filter events,
/// rewrite them (normalize literals, expand CURIEs), or terminate the chain
/// (a writer, a store inserter).
pub trait Sink {
    /// The error type this sink's chain can produce.
    type Error;

    /// Handle one event.
    fn event(&mut self, event: Event<'_>) -> Result<(), Self::Error>;
}
