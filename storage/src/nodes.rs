//! Node interning table (§3.6, §9 design note): every node a store holds
//! lives in one slab, and index entries reference it by a small `Copy`
//! key, giving cheap identity comparison for the index orderings instead
//! of comparing node text. Grounded in the §9 note's preference for
//! "indices into a slab" over a shared-ownership interner — the teacher's
//! `Dictionary` used `Arc<str>` behind a `parking_lot`-guarded table, which
//! this single-threaded design has no need for.

use rustc_hash::FxHashMap;

use rdf_model::Node;

/// A compact reference to a node owned by a [`Nodes`] table. Valid only
/// for the table that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u32);

impl NodeId {
    /// The id immediately after this one, used to build an exclusive
    /// upper bound for a prefix range scan. Saturates at `u32::MAX`
    /// rather than overflowing; a table holding that many distinct nodes
    /// is not a scenario this store is built to reach.
    pub(crate) fn next(self) -> NodeId {
        NodeId(self.0.saturating_add(1))
    }
}

/// The store's node slab: every distinct node referenced by any statement
/// is interned exactly once.
#[derive(Debug, Clone, Default)]
pub struct Nodes {
    slab: Vec<Node>,
    index: FxHashMap<Node, NodeId>,
}

impl Nodes {
    pub fn new() -> Nodes {
        Nodes::default()
    }

    /// Intern `node`, returning its existing id if already present.
    pub fn intern(&mut self, node: Node) -> NodeId {
        if let Some(id) = self.index.get(&node) {
            return *id;
        }
        let id = NodeId(self.slab.len() as u32);
        self.slab.push(node.clone());
        self.index.insert(node, id);
        id
    }

    /// Look up an already-interned node without inserting.
    pub fn lookup(&self, node: &Node) -> Option<NodeId> {
        self.index.get(node).copied()
    }

    /// Resolve an id back to its node.
    pub fn get(&self, id: NodeId) -> &Node {
        &self.slab[id.0 as usize]
    }

    pub fn len(&self) -> usize {
        self.slab.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slab.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_the_same_node_twice_yields_the_same_id() {
        let mut nodes = Nodes::new();
        let a = nodes.intern(Node::make_iri("http://example.org/s"));
        let b = nodes.intern(Node::make_iri("http://example.org/s"));
        assert_eq!(a, b);
        assert_eq!(nodes.len(), 1);
    }

    #[test]
    fn distinct_nodes_get_distinct_ids() {
        let mut nodes = Nodes::new();
        let a = nodes.intern(Node::make_iri("http://example.org/a"));
        let b = nodes.intern(Node::make_iri("http://example.org/b"));
        assert_ne!(a, b);
    }

    #[test]
    fn lookup_does_not_insert() {
        let mut nodes = Nodes::new();
        assert_eq!(nodes.lookup(&Node::make_iri("http://example.org/a")), None);
        let id = nodes.intern(Node::make_iri("http://example.org/a"));
        assert_eq!(nodes.lookup(&Node::make_iri("http://example.org/a")), Some(id));
        assert_eq!(nodes.len(), 1);
    }
}
