use std::io::Cursor;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use common::hurdat::HurdatReader;
use common::structs::{Geodesy, Position, Spherical, Vincenty};
use hurdat::summary::{read_tracks, Analyzer, Summary};

const SAMPLE: &str = include_str!("../tests/data/hurdat2-sample.txt");

fn geodesy(c: &mut Criterion) {
    let a = Position::from_degrees(21.6, -64.4).unwrap();
    let b = Position::from_degrees(23.6, -63.4).unwrap();
    c.bench_function("vincenty", |bench| {
        bench.iter(|| Vincenty::WGS84.distance(black_box(&a), black_box(&b)))
    });
    c.bench_function("spherical", |bench| {
        bench.iter(|| Spherical.distance(black_box(&a), black_box(&b)))
    });
}

fn sample(c: &mut Criterion) {
    c.bench_function("parse", |bench| {
        bench.iter(|| {
            let mut reader = HurdatReader::new(Cursor::new(black_box(SAMPLE)));
            read_tracks(&mut reader, &mut Summary::default()).unwrap()
        })
    });

    let mut reader = HurdatReader::new(Cursor::new(SAMPLE));
    let tracks = read_tracks(&mut reader, &mut Summary::default()).unwrap();
    let analyzer = Analyzer::default();
    c.bench_function("analyze", |bench| {
        bench.iter(|| analyzer.analyze_all(black_box(&tracks)))
    });
}

criterion_group!(benches, geodesy, sample);
criterion_main!(benches);
