//! LineParser 벤치마크 — 정형/비정형 라인 파싱 처리량

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use logward_monitor::LineParser;

fn bench_parse_well_formed(c: &mut Criterion) {
    let parser = LineParser::new().unwrap();
    let line = "2026-02-01T12:34:56.123Z [INFO] service: request handled in 12ms";

    c.bench_function("parse_well_formed", |b| {
        b.iter(|| parser.parse(black_box("good_service"), black_box(line)))
    });
}

fn bench_parse_fallback(c: &mut Criterion) {
    let parser = LineParser::new().unwrap();
    let line = "plain unstructured noise without timestamp or level";

    c.bench_function("parse_fallback", |b| {
        b.iter(|| parser.parse(black_box("noisy_service"), black_box(line)))
    });
}

fn bench_parse_mixed_batch(c: &mut Criterion) {
    let parser = LineParser::new().unwrap();
    let lines: Vec<String> = (0..1000)
        .map(|i| {
            if i % 4 == 0 {
                format!("garbage line number {i}")
            } else {
                format!("2026-02-01T12:00:{:02}Z [WARN] worker {i} slow response", i % 60)
            }
        })
        .collect();

    c.bench_function("parse_mixed_batch_1000", |b| {
        b.iter(|| {
            for line in &lines {
                black_box(parser.parse("svc", line));
            }
        })
    });
}

criterion_group!(
    benches,
    bench_parse_well_formed,
    bench_parse_fallback,
    bench_parse_mixed_batch
);
criterion_main!(benches);
