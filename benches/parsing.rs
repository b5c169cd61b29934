use criterion::{black_box, criterion_group, criterion_main, Criterion};

use dice_notation::parse;

fn bench_parsing(c: &mut Criterion) {
    c.bench_function("parse simple roller", |b| {
        b.iter(|| parse(black_box("2d6+3")))
    });
    c.bench_function("parse modifier chain", |b| {
        b.iter(|| parse(black_box("10d10e[=10]sa")))
    });
    c.bench_function("parse composite validator", |b| {
        b.iter(|| parse(black_box("4d6c[=1|=6]")))
    });
    c.bench_function("parse list roll", |b| {
        b.iter(|| parse(black_box("[1-3,5,7-8]u")))
    });
    c.bench_function("parse multiple instructions", |b| {
        b.iter(|| parse(black_box("1d20;$1+5;2d6+3 # full turn")))
    });
}

criterion_group!(benches, bench_parsing);
criterion_main!(benches);
