//! Benchmarks for parsing and serializing N-Triples/Turtle documents.
//!
//! Run with: cargo bench --bench turtle_benchmark

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use rdf_io::sink::{Event, Sink};
use rdf_io::{Reader, ReaderConfig, Syntax, Writer, WriterConfig};
use rdf_model::Node;

struct CountingSink {
    count: usize,
}

impl Sink for CountingSink {
    type Error = std::convert::Infallible;

    fn event(&mut self, event: Event<'_>) -> Result<(), Self::Error> {
        if let Event::Statement(..) = event {
            self.count += 1;
        }
        Ok(())
    }
}

fn ntriples_document(statements: usize) -> String {
    let mut doc = String::new();
    for i in 0..statements {
        doc.push_str(&format!(
            "<http://example.org/s{i}> <http://example.org/p> <http://example.org/o{i}> .\n"
        ));
    }
    doc
}

fn benchmark_parse_ntriples(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_ntriples");

    for size in [100, 1_000, 10_000].iter() {
        let doc = ntriples_document(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &doc, |b, doc| {
            b.iter(|| {
                let config = ReaderConfig { syntax: Syntax::NTriples, ..ReaderConfig::default() };
                let mut reader = Reader::new(doc.as_bytes(), config);
                let mut sink = CountingSink { count: 0 };
                reader.read_document(&mut sink).unwrap();
                black_box(sink.count)
            });
        });
    }

    group.finish();
}

fn benchmark_write_ntriples(c: &mut Criterion) {
    c.bench_function("write_1000_flat_statements", |b| {
        b.iter(|| {
            let config = WriterConfig { syntax: Syntax::NTriples, ..WriterConfig::default() };
            let mut writer = Writer::new(Vec::new(), config);
            for i in 0..1_000 {
                let stmt = rdf_model::Statement::new(
                    Node::make_iri(format!("http://example.org/s{i}")),
                    Node::make_iri("http://example.org/p"),
                    Node::make_iri(format!("http://example.org/o{i}")),
                    None,
                )
                .unwrap();
                writer
                    .event(Event::Statement(rdf_io::StatementFlags::empty(), &stmt))
                    .unwrap();
            }
            black_box(writer.finish().unwrap())
        });
    });
}

criterion_group!(benches, benchmark_parse_ntriples, benchmark_write_ntriples);
criterion_main!(benches);
