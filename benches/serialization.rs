use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use serde::{Deserialize, Serialize};
use serde_llsd::{
    from_binary, from_notation, from_value, from_xml, to_binary, to_notation, to_value, to_xml,
    Encoding, FormatOptions, LlsdValue, ParseOptions,
};

#[derive(Serialize, Deserialize, Clone)]
struct Agent {
    id: u32,
    name: String,
    email: String,
    active: bool,
}

#[derive(Serialize, Deserialize, Clone)]
struct Region {
    name: String,
    position: (f64, f64),
    agents: Vec<Agent>,
    tags: Vec<String>,
}

const ENCODINGS: [Encoding; 3] = [Encoding::Binary, Encoding::Xml, Encoding::Notation];

fn agents(count: u32) -> Vec<Agent> {
    (0..count)
        .map(|i| Agent {
            id: i,
            name: format!("Agent{}", i),
            email: format!("agent{}@example.com", i),
            active: i % 2 == 0,
        })
        .collect()
}

fn region() -> LlsdValue {
    to_value(&Region {
        name: "Ahern".to_string(),
        position: (256_000.0, 254_976.0),
        agents: agents(20),
        tags: vec!["mainland".to_string(), "welcome".to_string()],
    })
    .unwrap()
}

fn encode(value: &LlsdValue, encoding: Encoding) -> Vec<u8> {
    let mut out = Vec::new();
    encoding
        .format_to(value, &mut out, &FormatOptions::new())
        .unwrap();
    out
}

fn benchmark_format(c: &mut Criterion) {
    let value = region();
    let mut group = c.benchmark_group("format_region");
    for encoding in ENCODINGS {
        group.bench_with_input(
            BenchmarkId::from_parameter(encoding),
            &value,
            |b, value| b.iter(|| encode(black_box(value), encoding)),
        );
    }
    group.finish();
}

fn benchmark_parse(c: &mut Criterion) {
    let value = region();
    let options = ParseOptions::new();
    let mut group = c.benchmark_group("parse_region");
    for encoding in ENCODINGS {
        let bytes = encode(&value, encoding);
        group.bench_with_input(
            BenchmarkId::from_parameter(encoding),
            &bytes,
            |b, bytes| b.iter(|| encoding.parse_slice(black_box(bytes), &options)),
        );
    }
    group.finish();
}

fn benchmark_parse_array(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_agent_array");
    for size in [10_u32, 100, 1000].iter() {
        let bytes = to_binary(&to_value(&agents(*size)).unwrap()).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(size), &bytes, |b, bytes| {
            b.iter(|| from_binary(black_box(bytes)))
        });
    }
    group.finish();
}

fn benchmark_binary_blobs(c: &mut Criterion) {
    let blob = LlsdValue::binary(vec![0xa5_u8; 64 * 1024]);
    let notation = to_notation(&blob).unwrap();
    let xml = to_xml(&blob).unwrap();
    let binary = to_binary(&blob).unwrap();

    let mut group = c.benchmark_group("binary_blob_64k");
    group.bench_function("notation_base64", |b| {
        b.iter(|| from_notation(black_box(&notation)))
    });
    group.bench_function("xml_base64", |b| b.iter(|| from_xml(black_box(&xml))));
    group.bench_function("binary_raw", |b| b.iter(|| from_binary(black_box(&binary))));
    group.finish();
}

fn benchmark_serde_bridge(c: &mut Criterion) {
    let region = Region {
        name: "Ahern".to_string(),
        position: (256_000.0, 254_976.0),
        agents: agents(20),
        tags: vec!["mainland".to_string()],
    };
    let value = to_value(&region).unwrap();

    let mut group = c.benchmark_group("serde_bridge");
    group.bench_function("to_value", |b| b.iter(|| to_value(black_box(&region))));
    group.bench_function("from_value", |b| {
        b.iter(|| from_value::<Region>(black_box(value.clone())))
    });
    group.finish();
}

criterion_group!(
    benches,
    benchmark_format,
    benchmark_parse,
    benchmark_parse_array,
    benchmark_binary_blobs,
    benchmark_serde_bridge
);
criterion_main!(benches);
