//! Throughput of statement accumulation and serialization.
//!
//! Run with: cargo bench --bench triple_writer

use chrono::{TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use knowledge_connector::geo::{ntm_from_wgs84, Wgs84Coord};
use knowledge_connector::rdf::{RdfSyntax, TripleWriter};

const PREFIXES: &str = "PREFIX car: <http://example.ontology.com/car#>\n\
                        PREFIX xsd: <http://www.w3.org/2001/XMLSchema#>";

fn fill_writer(observations: u32) -> TripleWriter {
    let mut writer = TripleWriter::new().unwrap();
    writer.initiate_triple("WBY11CF080CH470711").unwrap();
    for i in 0..observations {
        let timestamp = Utc.timestamp_opt(1_704_103_200 + i64::from(i), i).unwrap();
        writer
            .add_rdf_object_to_triple(
                PREFIXES,
                (
                    "<http://example.ontology.com/car#Vehicle>",
                    "<http://example.ontology.com/car#hasPart>",
                    "<http://example.ontology.com/car#Powertrain>",
                ),
            )
            .unwrap();
        writer
            .add_rdf_data_to_triple(
                PREFIXES,
                (
                    "<http://example.ontology.com/car#Powertrain>",
                    "<http://example.ontology.com/car#range>",
                    "<http://www.w3.org/2001/XMLSchema#int>",
                ),
                &i.to_string(),
                &timestamp,
                None,
            )
            .unwrap();
    }
    writer
}

fn bench_generate_output(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate_triple_output");
    for observations in [10u32, 100, 1000] {
        let writer = fill_writer(observations);
        group.throughput(Throughput::Elements(u64::from(observations)));
        for syntax in [RdfSyntax::Turtle, RdfSyntax::NTriples] {
            group.bench_with_input(
                BenchmarkId::new(format!("{:?}", syntax), observations),
                &writer,
                |b, writer| b.iter(|| black_box(writer.generate_triple_output(syntax).unwrap())),
            );
        }
    }
    group.finish();
}

fn bench_accumulate(c: &mut Criterion) {
    c.bench_function("accumulate_100_observations", |b| b.iter(|| black_box(fill_writer(100))));
}

fn bench_ntm_projection(c: &mut Criterion) {
    let origin = Wgs84Coord::new(59.91, 10.75);
    let point = Wgs84Coord::new(60.39, 5.32);
    c.bench_function("ntm_from_wgs84", |b| {
        b.iter(|| black_box(ntm_from_wgs84(black_box(&origin), black_box(&point))))
    });
}

criterion_group!(benches, bench_generate_output, bench_accumulate, bench_ntm_projection);
criterion_main!(benches);
