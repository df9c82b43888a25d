//! Property tests for the store-specific quantified invariants in §8.1:
//! find(wildcard) equals inserted-minus-erased, count agrees with a range
//! scan's size, and ask agrees with count.

use std::collections::HashSet;

use proptest::prelude::*;

use rdf_model::Node;
use storage::pattern::{GraphPattern, NodePattern, QuadPattern};
use storage::QuadStore;

/// A small alphabet of subjects/objects so inserts collide and erases have
/// something to remove, rather than every statement being distinct.
fn arb_node(prefix: &'static str) -> impl Strategy<Value = Node> {
    (0u32..6).prop_map(move |i| Node::make_iri(format!("http://example.org/{prefix}{i}")))
}

fn arb_triple() -> impl Strategy<Value = (Node, Node, Node)> {
    (arb_node("s"), arb_node("p"), arb_node("o"))
}

proptest! {
    #[test]
    fn find_wildcard_equals_inserted_minus_erased(
        inserted in prop::collection::vec(arb_triple(), 1..30),
        erase_subject in 0u32..6,
    ) {
        let mut store = QuadStore::new();
        let mut expected: HashSet<(String, String, String)> = HashSet::new();

        for (s, p, o) in &inserted {
            let key = (s.text().to_string(), p.text().to_string(), o.text().to_string());
            match store.add(s, p, o, None) {
                Ok(()) => { expected.insert(key); }
                Err(storage::StoreError::Failure(_)) => {}
                Err(e) => prop_assert!(false, "unexpected error: {e:?}"),
            }
        }

        let erase_target = Node::make_iri(format!("http://example.org/s{erase_subject}"));
        store.erase(&QuadPattern {
            subject: NodePattern::Exact(erase_target.clone()),
            predicate: NodePattern::Any,
            object: NodePattern::Any,
            graph: GraphPattern::Any,
        }).unwrap();
        expected.retain(|(s, _, _)| s != erase_target.text());

        let found = store.find(&QuadPattern::any()).unwrap();
        let found_set: HashSet<(String, String, String)> = found
            .into_iter()
            .map(|stmt| (
                stmt.subject.text().to_string(),
                stmt.predicate.text().to_string(),
                stmt.object.text().to_string(),
            ))
            .collect();

        prop_assert_eq!(found_set, expected);
    }

    #[test]
    fn count_agrees_with_range_size_and_ask(
        inserted in prop::collection::vec(arb_triple(), 1..30),
        query_subject in 0u32..6,
    ) {
        let mut store = QuadStore::new();
        for (s, p, o) in &inserted {
            let _ = store.add(s, p, o, None);
        }

        let pattern = QuadPattern {
            subject: NodePattern::Exact(Node::make_iri(format!("http://example.org/s{query_subject}"))),
            predicate: NodePattern::Any,
            object: NodePattern::Any,
            graph: GraphPattern::Any,
        };

        let count = store.count(&pattern).unwrap();
        let found = store.find(&pattern).unwrap();
        prop_assert_eq!(count, found.len());

        let ask = store.ask(&pattern).unwrap();
        prop_assert_eq!(ask, count > 0);
    }
}
