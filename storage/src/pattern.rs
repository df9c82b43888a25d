//! Query patterns (§4.H.2-3).
//!
//! A [`QuadPattern`] names, for each of subject/predicate/object/graph,
//! either a wildcard or an exact node to match. Graph follows the
//! already-resolved convention: `GraphPattern::Any` matches every graph
//! including the default graph; to match only the default graph the
//! caller passes `GraphPattern::Exact(None)`.

use rdf_model::Node;

use crate::index::{IndexKind, Key};
use crate::nodes::{NodeId, Nodes};

/// A match rule for a single subject/predicate/object slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodePattern {
    Any,
    Exact(Node),
}

impl NodePattern {
    pub fn is_exact(&self) -> bool {
        matches!(self, NodePattern::Exact(_))
    }
}

/// A match rule for the graph slot. `Exact(None)` matches only the
/// default graph; `Exact(Some(node))` matches only that named graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphPattern {
    Any,
    Exact(Option<Node>),
}

impl GraphPattern {
    pub fn is_exact(&self) -> bool {
        matches!(self, GraphPattern::Exact(_))
    }
}

/// A full quad pattern over subject, predicate, object and graph.
#[derive(Debug, Clone)]
pub struct QuadPattern {
    pub subject: NodePattern,
    pub predicate: NodePattern,
    pub object: NodePattern,
    pub graph: GraphPattern,
}

impl QuadPattern {
    pub fn any() -> QuadPattern {
        QuadPattern {
            subject: NodePattern::Any,
            predicate: NodePattern::Any,
            object: NodePattern::Any,
            graph: GraphPattern::Any,
        }
    }

    /// Resolves this pattern's exact components against an already
    /// populated `Nodes` table. A component that names a node not
    /// present in the table can never match anything; callers should
    /// treat that case as "no results" rather than interning it, since a
    /// read-only pattern lookup must not grow the table.
    pub fn resolve(&self, nodes: &Nodes) -> ResolvedPattern {
        ResolvedPattern {
            subject: resolve_node(&self.subject, nodes),
            predicate: resolve_node(&self.predicate, nodes),
            object: resolve_node(&self.object, nodes),
            graph: resolve_graph(&self.graph, nodes),
        }
    }
}

fn resolve_node(pattern: &NodePattern, nodes: &Nodes) -> Option<Option<NodeId>> {
    match pattern {
        NodePattern::Any => None,
        NodePattern::Exact(node) => Some(nodes.lookup(node)),
    }
}

/// A graph slot resolved against a `Nodes` table. `Missing` is distinct
/// from `Default` so that a query for a named graph absent from the
/// table doesn't get confused with an explicit default-graph query: both
/// would otherwise collapse to the same `None` id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResolvedGraph {
    Any,
    Default,
    Missing,
    Bound(NodeId),
}

fn resolve_graph(pattern: &GraphPattern, nodes: &Nodes) -> ResolvedGraph {
    match pattern {
        GraphPattern::Any => ResolvedGraph::Any,
        GraphPattern::Exact(None) => ResolvedGraph::Default,
        GraphPattern::Exact(Some(node)) => match nodes.lookup(node) {
            Some(id) => ResolvedGraph::Bound(id),
            None => ResolvedGraph::Missing,
        },
    }
}

/// A pattern with exact components already looked up against a `Nodes`
/// table. `Some(None)` for subject/predicate/object means an exact node
/// was named but is absent from the table, which makes the pattern
/// [`ResolvedPattern::is_impossible`].
pub struct ResolvedPattern {
    pub subject: Option<Option<NodeId>>,
    pub predicate: Option<Option<NodeId>>,
    pub object: Option<Option<NodeId>>,
    graph: ResolvedGraph,
}

impl ResolvedPattern {
    /// `true` if any exact slot named a node absent from the table: the
    /// pattern can never match an existing statement. Callers must check
    /// this before calling [`ResolvedPattern::bound_ids`]/
    /// [`ResolvedPattern::matches_key`], which assume every bound slot is
    /// satisfiable.
    pub fn is_impossible(&self) -> bool {
        [&self.subject, &self.predicate, &self.object]
            .into_iter()
            .any(|slot| matches!(slot, Some(None)))
            || self.graph == ResolvedGraph::Missing
    }

    fn slot(&self, which: Slot) -> Option<NodeId> {
        match which {
            Slot::S => self.subject.flatten(),
            Slot::P => self.predicate.flatten(),
            Slot::O => self.object.flatten(),
            Slot::G => match self.graph {
                ResolvedGraph::Bound(id) => Some(id),
                _ => None,
            },
        }
    }

    fn bound(&self, which: Slot) -> bool {
        match which {
            Slot::S => self.subject.is_some(),
            Slot::P => self.predicate.is_some(),
            Slot::O => self.object.is_some(),
            Slot::G => !matches!(self.graph, ResolvedGraph::Any),
        }
    }

    /// The ids in this index's component order, `None` where the
    /// pattern leaves that slot a wildcard. Mirrors
    /// [`IndexKind::make_key`]'s component ordering.
    pub fn bound_ids(&self, kind: IndexKind) -> [Option<NodeId>; 4] {
        let order = self.order_for(kind);
        order.map(|slot| self.slot(slot))
    }

    pub fn binding(&self, kind: IndexKind) -> [bool; 4] {
        let order = self.order_for(kind);
        order.map(|slot| self.bound(slot))
    }

    fn order_for(&self, kind: IndexKind) -> [Slot; 4] {
        use Slot::*;
        match kind {
            IndexKind::Spo => [S, P, O, G],
            IndexKind::Sop => [S, O, P, G],
            IndexKind::Ops => [O, P, S, G],
            IndexKind::Osp => [O, S, P, G],
            IndexKind::Pso => [P, S, O, G],
            IndexKind::Pos => [P, O, S, G],
            IndexKind::Gspo => [G, S, P, O],
            IndexKind::Gsop => [G, S, O, P],
            IndexKind::Gpso => [G, P, S, O],
            IndexKind::Gosp => [G, O, S, P],
        }
    }

    /// Does the full (unwildcarded) key `key` satisfy every bound slot
    /// of this pattern, in `kind`'s ordering? Used to post-filter
    /// candidates from a `Range`/`FilterRange`/`FilterAll` scan.
    pub fn matches_key(&self, kind: IndexKind, key: &Key) -> bool {
        let order = self.order_for(kind);
        let key_slots = [key.0, key.1, key.2, key.3];
        for (slot, key_value) in order.into_iter().zip(key_slots) {
            if self.bound(slot) && self.slot(slot) != key_value {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, Copy)]
enum Slot {
    S,
    P,
    O,
    G,
}
