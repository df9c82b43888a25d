//! (document, line, column) origin recorded on statements during parsing.

use crate::node::Node;

/// A document-identifier node plus a 1-based line and column. Equality is
/// field-wise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor {
    pub document: Node,
    pub line: u64,
    pub column: u64,
}

impl Cursor {
    pub fn new(document: Node, line: u64, column: u64) -> Cursor {
        Cursor { document, line, column }
    }
}
