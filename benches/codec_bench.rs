#![allow(missing_docs)]

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use graphcode::{Graphcode, GraphcodeObject};
use std::hint::black_box;
use std::rc::Rc;

#[derive(Clone, GraphcodeObject, Debug)]
struct Tag {
    name: String,
}

#[derive(Clone, GraphcodeObject, Debug)]
struct BenchItem {
    id: u64,
    payload: Vec<u64>,
    tag: Rc<Tag>,
}

#[derive(Clone, GraphcodeObject, Debug)]
struct BenchCollection {
    data: Vec<BenchItem>,
}

// Items cycle through a handful of shared tags, so most tags are back-references.
fn generate_data(count: usize) -> BenchCollection {
    let tags: Vec<Rc<Tag>> = (0..16)
        .map(|i| Rc::new(Tag { name: format!("tag-{i}") }))
        .collect();
    let items = (0..count)
        .map(|i| BenchItem {
            id: i as u64,
            payload: vec![i as u64; 16],
            tag: Rc::clone(&tags[i % tags.len()]),
        })
        .collect();
    BenchCollection { data: items }
}

// --- BENCHMARKS ---

fn bench_serialize(c: &mut Criterion) {
    let item_count = 10_000;
    let data = generate_data(item_count);
    let codec = Graphcode::new();
    let size = codec.serialize(&data).map(|b| b.len()).unwrap_or_default();

    let mut group = c.benchmark_group("Graph Write");
    group.throughput(Throughput::Bytes(size as u64));
    group.bench_function("serialize_shared", |b| {
        b.iter(|| codec.serialize(black_box(&data)).expect("serialization failed"));
    });
    group.finish();
}

fn bench_deserialize(c: &mut Criterion) {
    let codec = Graphcode::new();
    let bytes = codec
        .serialize(&generate_data(10_000))
        .expect("serialization failed");

    let mut group = c.benchmark_group("Graph Read");
    group.throughput(Throughput::Bytes(bytes.len() as u64));
    group.bench_function("deserialize_shared", |b| {
        b.iter(|| {
            codec
                .deserialize::<BenchCollection>(black_box(&bytes))
                .expect("deserialization failed")
        });
    });
    group.finish();
}

fn bench_codec_lookup(c: &mut Criterion) {
    let codec = Graphcode::new();
    let bytes = codec.serialize(&42u32).expect("serialization failed");

    // Dominated by the header, descriptor check and registry hit.
    c.bench_function("small_value_round_trip", |b| {
        b.iter(|| codec.deserialize::<u32>(black_box(&bytes)).expect("deserialization failed"));
    });
}

criterion_group!(benches, bench_serialize, bench_deserialize, bench_codec_lookup);
criterion_main!(benches);
