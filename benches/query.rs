//! Benchmarks for index construction and region queries
//!
//! Data is synthesised in memory (a pairs-like 2D file and a BED-like 1D
//! file) so the benchmark needs no external datasets.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use pairdex::formats::index::build_from_reader;
use pairdex::io::{BgzfWriter, SeekableBgzfReader};
use pairdex::{FormatConfig, IndexedReader, Preset};
use std::io::{Cursor, Write};
use std::sync::Arc;

const CHROMS: [&str; 4] = ["chr1", "chr2", "chr3", "chrX"];

/// Deterministic pseudo-random positions (xorshift)
fn positions(seed: u64) -> impl Iterator<Item = u64> {
    let mut state = seed | 1;
    std::iter::from_fn(move || {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        Some(state % 100_000_000)
    })
}

fn pairs_file(records: usize) -> Vec<u8> {
    let mut rows: Vec<(usize, u64, usize, u64)> = positions(7)
        .zip(positions(11))
        .take(records)
        .enumerate()
        .map(|(i, (p1, p2))| (i % CHROMS.len(), p1, (i / 3) % CHROMS.len(), p2))
        .collect();
    rows.sort_unstable();

    let mut writer = BgzfWriter::new(Vec::new());
    writer.write_all(b"## pairs format v1.0\n").unwrap();
    for (i, (c1, p1, c2, p2)) in rows.into_iter().enumerate() {
        writeln!(writer, "r{}\t{}\t{}\t{}\t{}\t+\t-", i, CHROMS[c1], p1 + 1, CHROMS[c2], p2 + 1)
            .unwrap();
    }
    writer.finish().unwrap()
}

fn bed_file(records: usize) -> Vec<u8> {
    let mut rows: Vec<(usize, u64)> = positions(3)
        .take(records)
        .enumerate()
        .map(|(i, p)| (i % CHROMS.len(), p))
        .collect();
    rows.sort_unstable();

    let mut writer = BgzfWriter::new(Vec::new());
    for (c, p) in rows {
        writeln!(writer, "{}\t{}\t{}", CHROMS[c], p, p + 250).unwrap();
    }
    writer.finish().unwrap()
}

fn build(bytes: &[u8], config: FormatConfig) -> pairdex::BinIndex {
    let reader = SeekableBgzfReader::new(Cursor::new(bytes.to_vec())).unwrap();
    build_from_reader(reader, config).unwrap()
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("build");
    group.sample_size(10);

    for records in [10_000usize, 100_000] {
        let pairs = pairs_file(records);
        group.bench_with_input(BenchmarkId::new("pairs", records), &pairs, |b, bytes| {
            b.iter(|| black_box(build(bytes, Preset::Pairs.config())));
        });

        let bed = bed_file(records);
        group.bench_with_input(BenchmarkId::new("bed", records), &bed, |b, bytes| {
            b.iter(|| black_box(build(bytes, Preset::Bed.config())));
        });
    }

    group.finish();
}

fn bench_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("query");

    let pairs = pairs_file(200_000);
    let index = Arc::new(build(&pairs, Preset::Pairs.config()));
    let mut reader = IndexedReader::with_index(index, Cursor::new(pairs)).unwrap();

    for region in [
        "chr1:10,000,000-10,500,000|chr2:20,000,000-30,000,000",
        "chr1:1-100,000,000|chr1:1-1,000,000",
        "chr2:50,000,000-50,100,000",
    ] {
        group.bench_with_input(BenchmarkId::new("pairs", region), region, |b, region| {
            b.iter(|| black_box(reader.query(region).unwrap().count()));
        });
    }

    let bed = bed_file(200_000);
    let index = Arc::new(build(&bed, Preset::Bed.config()));
    let mut reader = IndexedReader::with_index(index, Cursor::new(bed)).unwrap();

    for region in ["chr1:1,000,000-1,010,000", "chrX:40,000,000-60,000,000"] {
        group.bench_with_input(BenchmarkId::new("bed", region), region, |b, region| {
            b.iter(|| black_box(reader.query(region).unwrap().count()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_build, bench_query);
criterion_main!(benches);
