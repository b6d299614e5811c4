use criterion::{black_box, criterion_group, criterion_main, Criterion};

use teztyt_core::codec;
use teztyt_core::model::{SolutionBook, SolutionEntry, SolutionKey};
use teztyt_core::solution;

fn bench_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("codec");

    let name = codec::encode(120, 14, 3, "integrals-7", 4);

    group.bench_function("encode", |b| {
        b.iter(|| codec::encode(black_box(120), black_box(14), 3, black_box("integrals-7"), 4))
    });

    group.bench_function("decode", |b| b.iter(|| codec::decode(black_box(&name))));

    group.bench_function("decode_malformed", |b| {
        b.iter(|| codec::decode(black_box("120:14:x:integrals-7")))
    });

    group.finish();
}

fn generate_book(tests: u32, problems: u32) -> SolutionBook {
    (1..=tests)
        .map(|t| {
            let key: SolutionKey = (1..=problems)
                .map(|s| {
                    (
                        s,
                        SolutionEntry {
                            file_index: (s % 3 + 1) as usize,
                            problem_id: format!("q{s}"),
                            points: 1.5,
                            correct: [1, (s % 4) + 1].into_iter().collect(),
                        },
                    )
                })
                .collect();
            (t, key)
        })
        .collect()
}

fn bench_solution_file(c: &mut Criterion) {
    let mut group = c.benchmark_group("solution_file");

    let small = solution::serialize(&generate_book(5, 10));
    let large = solution::serialize(&generate_book(200, 30));
    let large_book = generate_book(200, 30);

    group.bench_function("parse_5_tests", |b| {
        b.iter(|| solution::deserialize(black_box(&small)))
    });

    group.bench_function("parse_200_tests", |b| {
        b.iter(|| solution::deserialize(black_box(&large)))
    });

    group.bench_function("serialize_200_tests", |b| {
        b.iter(|| solution::serialize(black_box(&large_book)))
    });

    group.finish();
}

criterion_group!(benches, bench_codec, bench_solution_file);
criterion_main!(benches);
