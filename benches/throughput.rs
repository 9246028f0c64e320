//! Throughput benchmarks

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use hiltest_core::core::reader::DEFAULT_TERMINATION_MARKER;
use hiltest_core::{classify_line, verify, PairingMode, ResultCollector, TestRecord};

fn capture(tests: i64) -> Vec<u8> {
    let mut out = String::from("Supervisor self-test\r\n");
    for id in 0..tests {
        out.push_str(&format!("{},{},{},{}\r\n", id, id * 3, id * 7, id % 5));
        if id % 10 == 0 {
            out.push_str("checking relay bank...\r\n");
        }
    }
    out.push_str("✅ All tests passed\r\n");
    out.into_bytes()
}

fn reader_benchmark(c: &mut Criterion) {
    let data = capture(1000);

    let mut group = c.benchmark_group("reader");
    group.throughput(Throughput::Bytes(data.len() as u64));

    group.bench_function("classify_line", |b| {
        b.iter(|| classify_line(black_box("123,456,789,1011"), DEFAULT_TERMINATION_MARKER))
    });

    group.bench_function("collect_capture", |b| {
        b.iter(|| {
            let mut collector = ResultCollector::new(DEFAULT_TERMINATION_MARKER);
            for line in black_box(&data).split(|&b| b == b'\n') {
                if collector.feed(line) {
                    break;
                }
            }
            black_box(collector.records().len())
        })
    });

    group.finish();
}

fn verifier_benchmark(c: &mut Criterion) {
    let expected: Vec<_> = (0..1000).map(|id| TestRecord::new(vec![id, id * 3, id * 7])).collect();
    let mut received = expected.clone();
    received.reverse();

    let mut group = c.benchmark_group("verifier");

    group.bench_function("positional", |b| {
        b.iter(|| verify(black_box(&received), black_box(&expected), PairingMode::Positional))
    });

    group.bench_function("by_id", |b| {
        b.iter(|| verify(black_box(&received), black_box(&expected), PairingMode::ById))
    });

    group.finish();
}

criterion_group!(benches, reader_benchmark, verifier_benchmark);
criterion_main!(benches);
