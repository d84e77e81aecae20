use criterion::{black_box, criterion_group, criterion_main, Criterion};

use congestoor::aggregator::table::CongestionTable;
use congestoor::reading::parse_line;

fn build_table(sensors: u16, readings: u32) -> CongestionTable {
    let mut table = CongestionTable::new();
    for i in 0..readings {
        table.record((i % u32::from(sensors) + 1) as u16, i % 50 + 1);
    }
    table
}

fn bench_parse_line(c: &mut Criterion) {
    let line = "04-08-2026 14:03:27 3 17";

    c.bench_function("parse_line/well_formed", |b| {
        b.iter(|| parse_line(black_box(line)).expect("parse record"))
    });
}

fn bench_fold(c: &mut Criterion) {
    c.bench_function("table/fold_10k_readings", |b| {
        b.iter(|| build_table(black_box(512), black_box(10_000)))
    });
}

fn bench_rank(c: &mut Criterion) {
    let table = build_table(512, 10_000);

    c.bench_function("table/ranked_top_5_of_512", |b| {
        b.iter(|| black_box(table.ranked_top(black_box(5))).len())
    });
}

fn bench_suite(c: &mut Criterion) {
    bench_parse_line(c);
    bench_fold(c);
    bench_rank(c);
}

criterion_group!(benches, bench_suite);
criterion_main!(benches);
