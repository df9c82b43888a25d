//! Benchmarks for `QuadStore` insertion and pattern lookup.
//!
//! Run with: cargo bench --bench triple_store_benchmark

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use rdf_model::Node;
use storage::pattern::{GraphPattern, NodePattern, QuadPattern};
use storage::QuadStore;

fn subject(i: u64) -> Node {
    Node::make_iri(format!("http://example.org/subject{i}"))
}

fn predicate() -> Node {
    Node::make_iri("http://example.org/predicate")
}

fn object(i: u64) -> Node {
    Node::make_iri(format!("http://example.org/object{i}"))
}

fn benchmark_add(c: &mut Criterion) {
    let mut group = c.benchmark_group("add");

    for size in [100, 1_000, 10_000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            b.iter(|| {
                let mut store = QuadStore::new();
                let p = predicate();
                for i in 0..size {
                    store.add(&subject(i), &p, &object(i), None).unwrap();
                }
                black_box(store)
            });
        });
    }

    group.finish();
}

fn benchmark_ask(c: &mut Criterion) {
    let mut group = c.benchmark_group("ask");

    let mut store = QuadStore::new();
    let p = predicate();
    for i in 0..10_000 {
        store.add(&subject(i), &p, &object(i), None).unwrap();
    }

    group.bench_function("point_lookup_existing", |b| {
        let pattern = QuadPattern {
            subject: NodePattern::Exact(subject(5_000)),
            predicate: NodePattern::Exact(p.clone()),
            object: NodePattern::Exact(object(5_000)),
            graph: GraphPattern::Exact(None),
        };
        b.iter(|| black_box(store.ask(&pattern).unwrap()));
    });

    group.bench_function("subject_only_range", |b| {
        let pattern = QuadPattern {
            subject: NodePattern::Exact(subject(5_000)),
            predicate: NodePattern::Any,
            object: NodePattern::Any,
            graph: GraphPattern::Any,
        };
        b.iter(|| black_box(store.count(&pattern).unwrap()));
    });

    group.finish();
}

fn benchmark_find(c: &mut Criterion) {
    let mut group = c.benchmark_group("find");

    let mut store = QuadStore::new();
    for i in 0..10_000 {
        store.add(&subject(i), &predicate(), &object(i), None).unwrap();
    }

    group.bench_function("predicate_scan", |b| {
        let pattern = QuadPattern {
            subject: NodePattern::Any,
            predicate: NodePattern::Exact(predicate()),
            object: NodePattern::Any,
            graph: GraphPattern::Any,
        };
        b.iter(|| black_box(store.find(&pattern).unwrap()));
    });

    group.finish();
}

criterion_group!(benches, benchmark_add, benchmark_ask, benchmark_find);
criterion_main!(benches);
