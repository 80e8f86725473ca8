//! Benchmark suite for union encode/decode throughput
//!
//! This benchmark measures:
//! - Binary encode and decode of nullable and multi-member unions
//! - Avro-JSON encode and decode
//! - Plain-JSON heuristic decode
//!
//! # Configuration
//!
//! Benchmark behavior can be configured via environment variables:
//!
//! - `BENCH_SAMPLE_SIZE`: Number of samples to collect (default: 100)
//! - `BENCH_MEASUREMENT_TIME`: Measurement time in seconds (default: 5)
//! - `BENCH_WARM_UP_TIME`: Warm-up time in seconds (default: 3)
//!
//! # Examples
//!
//! ```bash
//! BENCH_SAMPLE_SIZE=50 BENCH_MEASUREMENT_TIME=3 cargo bench
//! ```

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;
use std::time::Duration;

use avro_union::{Codec, PlainJsonStrategy, Value};

const VALUES_PER_ITER: usize = 1_000;

const READING: &str = r#"{
    "type": "record",
    "name": "Reading",
    "namespace": "com.example",
    "fields": [
        {"name": "station", "type": "string"},
        {"name": "temp", "type": ["null", "int", "double"]},
        {"name": "note", "type": ["null", "string"], "default": null}
    ]
}"#;

/// Configure Criterion based on environment variables
fn configure_criterion() -> Criterion {
    let mut criterion = Criterion::default();

    if let Ok(sample_size) = std::env::var("BENCH_SAMPLE_SIZE") {
        if let Ok(size) = sample_size.parse::<usize>() {
            criterion = criterion.sample_size(size);
        } else {
            eprintln!("Warning: Invalid BENCH_SAMPLE_SIZE value: {}", sample_size);
        }
    }

    if let Ok(measurement_time) = std::env::var("BENCH_MEASUREMENT_TIME") {
        if let Ok(secs) = measurement_time.parse::<u64>() {
            criterion = criterion.measurement_time(Duration::from_secs(secs));
        } else {
            eprintln!(
                "Warning: Invalid BENCH_MEASUREMENT_TIME value: {}",
                measurement_time
            );
        }
    }

    if let Ok(warm_up_time) = std::env::var("BENCH_WARM_UP_TIME") {
        if let Ok(secs) = warm_up_time.parse::<u64>() {
            criterion = criterion.warm_up_time(Duration::from_secs(secs));
        } else {
            eprintln!("Warning: Invalid BENCH_WARM_UP_TIME value: {}", warm_up_time);
        }
    }

    criterion
}

/// Readings with every third temperature missing and every other one fractional.
fn readings() -> Vec<Value> {
    (0..VALUES_PER_ITER)
        .map(|i| {
            let temp = match i % 3 {
                0 => Value::Null,
                1 => Value::Int(i as i32),
                _ => Value::Double(i as f64 + 0.5),
            };
            [
                ("station", Value::from(format!("station-{}", i % 17))),
                ("temp", temp),
                ("note", Value::Null),
            ]
            .into_iter()
            .collect()
        })
        .collect()
}

fn encode_all(codec: &Codec, values: &[Value]) -> Vec<u8> {
    let mut buf = Vec::new();
    for value in values {
        codec.encode_binary(&mut buf, value).unwrap();
    }
    buf
}

fn decode_all(codec: &Codec, mut buf: &[u8]) -> usize {
    let mut count = 0;
    while !buf.is_empty() {
        let (value, rest) = codec.decode_binary(buf).unwrap();
        black_box(&value);
        buf = rest;
        count += 1;
    }
    count
}

/// Binary throughput for single unions of growing width
fn bench_binary_unions(c: &mut Criterion) {
    let mut group = c.benchmark_group("binary_union");
    group.throughput(Throughput::Elements(VALUES_PER_ITER as u64));

    let schemas = [
        ("nullable", r#"["null","long"]"#),
        ("numeric", r#"["null","int","long","float","double"]"#),
    ];

    for (name, schema) in schemas {
        let codec = Codec::from_schema(schema).unwrap();
        let values: Vec<Value> = (0..VALUES_PER_ITER)
            .map(|i| if i % 4 == 0 { Value::Null } else { Value::Long(i as i64 * 7919) })
            .collect();
        let encoded = encode_all(&codec, &values);

        group.bench_with_input(BenchmarkId::new("encode", name), &values, |b, values| {
            b.iter(|| encode_all(&codec, black_box(values)));
        });
        group.bench_with_input(BenchmarkId::new("decode", name), &encoded, |b, encoded| {
            b.iter(|| decode_all(&codec, black_box(encoded)));
        });
    }

    group.finish();
}

/// Records with union fields, where branch selection includes numeric coercion
fn bench_records(c: &mut Criterion) {
    let mut group = c.benchmark_group("record_with_unions");
    group.throughput(Throughput::Elements(VALUES_PER_ITER as u64));

    let codec = Codec::from_schema(READING).unwrap();
    let values = readings();
    let encoded = encode_all(&codec, &values);

    group.bench_function("encode_binary", |b| {
        b.iter(|| encode_all(&codec, black_box(&values)));
    });
    group.bench_function("decode_binary", |b| {
        b.iter(|| decode_all(&codec, black_box(&encoded)));
    });
    group.bench_function("encode_textual", |b| {
        b.iter(|| {
            let mut buf = Vec::new();
            for value in &values {
                codec.encode_textual(&mut buf, black_box(value)).unwrap();
            }
            buf
        });
    });

    group.finish();
}

/// Avro-JSON strict decode against plain-JSON heuristic decode
fn bench_text_decoders(c: &mut Criterion) {
    let mut group = c.benchmark_group("text_decode");
    group.throughput(Throughput::Elements(VALUES_PER_ITER as u64));

    let schema = r#"["null","int","long","float","double","string"]"#;
    let strict = Codec::from_schema(schema).unwrap();
    let plain = Codec::from_schema_with(schema, &PlainJsonStrategy::default()).unwrap();

    let tagged: Vec<String> = (0..VALUES_PER_ITER)
        .map(|i| format!(r#"{{"double":{}.25}}"#, i))
        .collect();
    let untagged: Vec<String> = (0..VALUES_PER_ITER).map(|i| format!("{}.25", i)).collect();

    group.bench_function("avro_json", |b| {
        b.iter(|| {
            for text in &tagged {
                black_box(strict.decode_textual(text.as_bytes()).unwrap());
            }
        });
    });
    group.bench_function("plain_json", |b| {
        b.iter(|| {
            for text in &untagged {
                black_box(plain.decode_textual(text.as_bytes()).unwrap());
            }
        });
    });

    group.finish();
}

criterion_group! {
    name = benches;
    config = configure_criterion();
    targets = bench_binary_unions, bench_records, bench_text_decoders
}

criterion_main!(benches);
