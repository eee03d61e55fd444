//! Benchmark suite for generic datum write throughput
//!
//! Measures writing generic records through the binary encoder:
//! - Flat records of primitives
//! - Records with nested arrays and maps of different sizes
//! - Logical type conversion overhead
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
use std::sync::Arc;
use std::time::Duration;

use avro_generic::{
    parse_schema, BinaryEncoder, ConversionRegistry, GenericArray, GenericDatumWriter, GenericMap,
    GenericRecord, GenericValue, Schema,
};
use chrono::DateTime;

const RECORDS_PER_ITER: usize = 1_000;

/// Configure Criterion based on environment variables
fn configure_criterion() -> Criterion {
    let mut criterion = Criterion::default();

    if let Ok(sample_size) = std::env::var("BENCH_SAMPLE_SIZE") {
        match sample_size.parse::<usize>() {
            Ok(size) => criterion = criterion.sample_size(size),
            Err(_) => eprintln!("Warning: Invalid BENCH_SAMPLE_SIZE value: {}", sample_size),
        }
    }

    if let Ok(measurement_time) = std::env::var("BENCH_MEASUREMENT_TIME") {
        match measurement_time.parse::<u64>() {
            Ok(secs) => criterion = criterion.measurement_time(Duration::from_secs(secs)),
            Err(_) => eprintln!(
                "Warning: Invalid BENCH_MEASUREMENT_TIME value: {}",
                measurement_time
            ),
        }
    }

    if let Ok(warm_up_time) = std::env::var("BENCH_WARM_UP_TIME") {
        match warm_up_time.parse::<u64>() {
            Ok(secs) => criterion = criterion.warm_up_time(Duration::from_secs(secs)),
            Err(_) => eprintln!("Warning: Invalid BENCH_WARM_UP_TIME value: {}", warm_up_time),
        }
    }

    criterion
}

/// Write `values` and return the number of bytes produced.
fn write_all(writer: &GenericDatumWriter, values: &[GenericValue]) -> usize {
    let mut encoder = BinaryEncoder::new(Vec::with_capacity(64 * 1024));
    for value in values {
        writer.write(value, &mut encoder).unwrap();
    }
    encoder.into_inner().unwrap().len()
}

fn flat_schema() -> Schema {
    parse_schema(
        r#"{"type": "record", "name": "Flat", "fields": [
            {"name": "id", "type": "long"},
            {"name": "name", "type": "string"},
            {"name": "score", "type": "double"},
            {"name": "active", "type": "boolean"},
            {"name": "note", "type": ["null", "string"]}
        ]}"#,
    )
    .unwrap()
}

fn flat_records(schema: &Schema) -> Vec<GenericValue> {
    (0..RECORDS_PER_ITER)
        .map(|i| {
            let mut record = GenericRecord::new(schema).unwrap();
            record.put("id", i as i64).unwrap();
            record.put("name", format!("user-{}", i)).unwrap();
            record.put("score", i as f64 * 0.5).unwrap();
            record.put("active", i % 2 == 0).unwrap();
            record
                .put("note", (i % 3 == 0).then(|| "note".to_string()))
                .unwrap();
            record.into()
        })
        .collect()
}

fn nested_records(schema: &Schema, width: usize) -> Vec<GenericValue> {
    let items = schema.field("items").unwrap().schema().clone();
    let attrs = schema.field("attrs").unwrap().schema().clone();
    (0..RECORDS_PER_ITER / 10)
        .map(|i| {
            let array = GenericArray::with_capacity(width, &items).unwrap();
            let map = GenericMap::new(&attrs).unwrap();
            for j in 0..width {
                array.push((i * width + j) as i64);
                map.insert(format!("k{}", j), j as i32);
            }
            let mut record = GenericRecord::new(schema).unwrap();
            record.put("items", array).unwrap();
            record.put("attrs", map).unwrap();
            record.into()
        })
        .collect()
}

/// Benchmark writing flat records
fn bench_flat_records(c: &mut Criterion) {
    let mut group = c.benchmark_group("flat_record_throughput");
    let schema = flat_schema();
    let values = flat_records(&schema);
    let writer = GenericDatumWriter::new(&schema);

    group.throughput(Throughput::Elements(values.len() as u64));
    group.bench_function("write", |b| {
        b.iter(|| black_box(write_all(&writer, black_box(&values))));
    });

    group.finish();
}

/// Benchmark writing records holding arrays and maps of different widths
fn bench_collections(c: &mut Criterion) {
    let mut group = c.benchmark_group("collection_throughput");
    let schema = parse_schema(
        r#"{"type": "record", "name": "Nested", "fields": [
            {"name": "items", "type": {"type": "array", "items": "long"}},
            {"name": "attrs", "type": {"type": "map", "values": "int"}}
        ]}"#,
    )
    .unwrap();
    let writer = GenericDatumWriter::new(&schema);

    for width in [1usize, 16, 256] {
        let values = nested_records(&schema, width);
        group.throughput(Throughput::Elements((values.len() * width) as u64));
        group.bench_with_input(BenchmarkId::new("write", width), &values, |b, values| {
            b.iter(|| black_box(write_all(&writer, values)));
        });
    }

    group.finish();
}

/// Benchmark the cost of logical type conversion against writing the physical value
fn bench_conversions(c: &mut Criterion) {
    let mut group = c.benchmark_group("conversion_overhead");
    let schema = parse_schema(r#"{"type": "long", "logicalType": "timestamp-micros"}"#).unwrap();
    let writer =
        GenericDatumWriter::new(&schema).with_registry(Arc::new(ConversionRegistry::standard()));

    let physical: Vec<GenericValue> = (0..RECORDS_PER_ITER as i64)
        .map(|i| GenericValue::Long(i * 1_000_003))
        .collect();
    let logical: Vec<GenericValue> = (0..RECORDS_PER_ITER as i64)
        .filter_map(|i| DateTime::from_timestamp_micros(i * 1_000_003))
        .map(GenericValue::from)
        .collect();

    group.throughput(Throughput::Elements(RECORDS_PER_ITER as u64));
    group.bench_function("physical", |b| {
        b.iter(|| black_box(write_all(&writer, &physical)));
    });
    group.bench_function("timestamp", |b| {
        b.iter(|| black_box(write_all(&writer, &logical)));
    });

    group.finish();
}

criterion_group! {
    name = benches;
    config = configure_criterion();
    targets = bench_flat_records, bench_collections, bench_conversions
}

criterion_main!(benches);
