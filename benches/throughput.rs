//! Throughput Benchmark for timeserver
//!
//! This benchmark measures the per-request work that does not touch the
//! network: command processing and TCP line framing.

use bytes::BytesMut;
use chrono::{FixedOffset, TimeZone};
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use timeserver::commands::{CommandProcessor, FixedClock};
use timeserver::protocol::LineParser;

/// Benchmark the command processor
fn bench_process(c: &mut Criterion) {
    let system = CommandProcessor::new();
    let instant = FixedOffset::east_opt(3600)
        .unwrap()
        .with_ymd_and_hms(2024, 3, 9, 15, 4, 5)
        .unwrap();
    let fixed = CommandProcessor::with_clock(FixedClock::new(instant));

    let mut group = c.benchmark_group("process");
    group.throughput(Throughput::Elements(1));

    for command in ["date", "time", "datetime", "bogus"] {
        group.bench_function(format!("{}_system_clock", command), |b| {
            b.iter(|| black_box(system.process(black_box(command))));
        });
    }

    group.bench_function("datetime_fixed_clock", |b| {
        b.iter(|| black_box(fixed.process(black_box("datetime"))));
    });

    group.finish();
}

/// Benchmark splitting pipelined command lines off a receive buffer
fn bench_line_parser(c: &mut Criterion) {
    let mut input = Vec::new();
    for _ in 0..100 {
        input.extend_from_slice(b"date\ntime\ndatetime\n");
    }

    let mut group = c.benchmark_group("line_parser");
    group.throughput(Throughput::Elements(300));

    group.bench_function("pipelined_300", |b| {
        b.iter(|| {
            let mut parser = LineParser::new();
            let mut buf = BytesMut::from(&input[..]);
            let mut count = 0;
            while let Ok(Some(line)) = parser.parse(&mut buf) {
                black_box(line);
                count += 1;
            }
            assert_eq!(count, 300);
        });
    });

    group.bench_function("long_partial_line", |b| {
        let partial = vec![b'x'; 32 * 1024];
        b.iter(|| {
            let mut parser = LineParser::new();
            let mut buf = BytesMut::from(&partial[..]);
            black_box(parser.parse(&mut buf).unwrap());
        });
    });

    group.finish();
}

criterion_group!(benches, bench_process, bench_line_parser);
criterion_main!(benches);
