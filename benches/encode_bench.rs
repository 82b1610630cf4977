//! Benchmarks for table encoding and channel throughput.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::explicit_iter_loop,
    missing_docs
)]

use cosmolink::{
    decode, Channel, Column, FieldValue, IntNarrowing, MemoryTransport, Table, Transcoder,
};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

fn create_points(rows: usize) -> Table {
    #[allow(clippy::cast_possible_wrap)]
    let ids: Vec<i64> = (0..rows as i64).collect();
    let labels: Vec<String> = ids.iter().map(|i| format!("node_{i}")).collect();
    #[allow(clippy::cast_precision_loss)]
    let xs: Vec<f64> = ids.iter().map(|i| *i as f64 * 0.5).collect();

    Table::new(vec![
        Column::new("id", ids),
        Column::new("label", labels),
        Column::new("x", xs),
    ])
    .expect("Failed to create table")
}

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode");

    for size in [100, 1_000, 10_000, 100_000].iter() {
        let table = create_points(*size);
        group.throughput(Throughput::Elements(*size as u64));

        for (name, narrowing) in [
            ("wrapping", IntNarrowing::Wrapping),
            ("preserve", IntNarrowing::Preserve),
        ] {
            let transcoder = Transcoder::new().int_narrowing(narrowing);
            group.bench_with_input(BenchmarkId::new(name, size), &table, |b, table| {
                b.iter(|| transcoder.encode(black_box(table)).unwrap());
            });
        }
    }

    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");

    for size in [1_000, 100_000].iter() {
        let bytes = Transcoder::new().encode(&create_points(*size)).unwrap();
        group.throughput(Throughput::Bytes(bytes.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &bytes, |b, bytes| {
            b.iter(|| decode(black_box(bytes)).unwrap());
        });
    }

    group.finish();
}

fn bench_coalescing(c: &mut Criterion) {
    c.bench_function("push_field_unattached_1000", |b| {
        b.iter(|| {
            let mut channel: Channel<MemoryTransport> = Channel::new();
            for i in 0..1_000 {
                channel
                    .push_field(black_box("space_size"), FieldValue::Int(i))
                    .unwrap();
            }
            channel.pending()
        });
    });
}

criterion_group!(benches, bench_encode, bench_decode, bench_coalescing);
criterion_main!(benches);
