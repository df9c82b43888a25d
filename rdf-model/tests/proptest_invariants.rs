//! Property tests for the quantified invariants in §8.1: node/copy equality,
//! flag-vs-naive-scan agreement, and URI resolution's absoluteness,
//! idempotence, and round-trip properties.

use proptest::prelude::*;
use rdf_model::uri::Uri;
use rdf_model::Node;

/// A single path segment: non-empty ASCII alphanumerics, never `.`/`..` so
/// it can never be mistaken for a dot-segment by `remove_dot_segments`.
fn arb_segment() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9]{1,6}".prop_filter("not a dot-segment", |s| s != "." && s != "..")
}

fn arb_path(max_segments: usize) -> impl Strategy<Value = String> {
    prop::collection::vec(arb_segment(), 0..=max_segments)
        .prop_map(|segs| format!("/{}", segs.join("/")))
}

fn arb_absolute_base() -> impl Strategy<Value = String> {
    (prop_oneof![Just("http"), Just("https"), Just("ftp")], "[a-z]{1,8}", arb_path(4))
        .prop_map(|(scheme, authority, path)| format!("{scheme}://{authority}{path}"))
}

proptest! {
    #[test]
    fn node_equals_its_own_copy(text in "[a-zA-Z0-9 :/._-]{0,40}") {
        let n = Node::make_iri(text);
        let c = n.clone();
        prop_assert_eq!(&n, &c);
        prop_assert_eq!(n.cmp(&c), std::cmp::Ordering::Equal);
    }

    #[test]
    fn literal_flags_agree_with_naive_scan(text in "[a-zA-Z0-9 \"\n]{0,40}") {
        let n = Node::make_string(text.clone());
        let naive_newline = text.contains('\n');
        let naive_quote = text.contains('"');
        prop_assert_eq!(n.flags().contains(rdf_model::NodeFlags::HAS_NEWLINE), naive_newline);
        prop_assert_eq!(n.flags().contains(rdf_model::NodeFlags::HAS_QUOTE), naive_quote);
    }

    #[test]
    fn resolve_of_absolute_iri_is_always_absolute(
        base_text in arb_absolute_base(),
        up_levels in 0usize..3,
        tail_segments in prop::collection::vec(arb_segment(), 0..4),
    ) {
        let base = Uri::parse(&base_text).unwrap();
        let reference_path = format!("{}{}", "../".repeat(up_levels), tail_segments.join("/"));
        let reference = Uri::parse(&reference_path).unwrap();

        let resolved = Uri::resolve(&reference, &base);
        prop_assert!(resolved.is_absolute());

        let mut once = String::new();
        resolved.serialize(&mut once);

        // Idempotence: resolving an already-absolute URI against the same
        // base again changes nothing (§8.1).
        let twice_uri = Uri::parse(&once).unwrap();
        let twice_resolved = Uri::resolve(&twice_uri, &base);
        let mut twice = String::new();
        twice_resolved.serialize(&mut twice);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn relative_then_resolved_round_trips(
        base_text in arb_absolute_base(),
        extra_segments in prop::collection::vec(arb_segment(), 1..4),
    ) {
        // Construct a target strictly "under" base's directory (the prefix
        // up to and including base's last `/`, dropping any final
        // non-directory segment) so `make_relative_iri` is guaranteed to
        // emit a relative form rather than falling back to the absolute
        // text. `arb_absolute_base` always produces a `/`-introduced path,
        // so this slash always exists.
        let last_slash = base_text.rfind('/').expect("arb_absolute_base always has a path");
        let base_dir = &base_text[..=last_slash];
        let target_text = format!("{base_dir}{}", extra_segments.join("/"));

        let base_node = Node::make_iri(base_text.clone());
        let target_node = Node::make_iri(target_text.clone());

        let relative = Node::make_relative_iri(target_node.text(), &base_node, None);
        let resolved = Node::make_resolved_iri(relative.text(), &base_node)
            .expect("a relative reference against an absolute base always resolves");

        prop_assert_eq!(resolved.text(), target_node.text());
    }
}
