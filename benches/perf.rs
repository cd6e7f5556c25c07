use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use alw_scout::config::ConsolidationConfig;
use alw_scout::consolidate::consolidate_workbook;
use alw_scout::feature_table::StandardizedFeatureTable;
use alw_scout::report::build_report;
use alw_scout::similarity::{SimilarityQuery, find_similar};
use alw_scout::synthetic::synthetic_workbook;

const PLAYERS: usize = 400;
const SEED: u64 = 2024;

fn sample_table() -> StandardizedFeatureTable {
    let workbook = synthetic_workbook(PLAYERS, SEED);
    consolidate_workbook(&workbook, &ConsolidationConfig::default())
        .expect("synthetic workbook consolidates")
        .table
}

fn bench_consolidate(c: &mut Criterion) {
    let workbook = synthetic_workbook(PLAYERS, SEED);
    let config = ConsolidationConfig::default();
    c.bench_function("consolidate_400", |b| {
        b.iter(|| {
            let out = consolidate_workbook(black_box(&workbook), &config).unwrap();
            black_box(out.report.features);
        })
    });
}

fn bench_find_similar(c: &mut Criterion) {
    let table = sample_table();
    let query = SimilarityQuery::all_features(&table, "Player 010")
        .with_dimensions(5)
        .with_neighbors(5);
    c.bench_function("find_similar_400", |b| {
        b.iter(|| {
            let result = find_similar(black_box(&table), black_box(&query)).unwrap();
            black_box(result.neighbors.len());
        })
    });
}

fn bench_build_report(c: &mut Criterion) {
    let table = sample_table();
    let features = table.feature_names().to_vec();
    c.bench_function("build_report_400", |b| {
        b.iter(|| {
            let report = build_report(black_box(&table), &features, 5, 5).unwrap();
            black_box(report.results.len());
        })
    });
}

criterion_group!(perf, bench_consolidate, bench_find_similar, bench_build_report);
criterion_main!(perf);
