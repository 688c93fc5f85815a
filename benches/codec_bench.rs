use criterion::{black_box, criterion_group, criterion_main, Criterion};

use bsor::{structure, Bindings, Bytes, Registry, ScriptParser, TokenSource};

structure! {
    #[derive(Debug, Clone, PartialEq)]
    pub struct Entry {
        #[bsor(id = 1)]
        pub key: String,
        #[bsor(id = 2)]
        pub value: Option<i64>,
    }
}

structure! {
    #[derive(Debug, Clone, PartialEq)]
    pub struct Batch {
        #[bsor(id = 1)]
        pub height: u64,
        #[bsor(id = 2)]
        pub payload: Bytes,
        #[bsor(id = 3)]
        pub entries: Vec<Option<Entry>>,
        #[bsor(id = 4)]
        pub checksum: [u8; 4],
    }
}

fn sample() -> Batch {
    Batch {
        height: 840_000,
        payload: (0..=255u8).collect(),
        entries: (0..64i64)
            .map(|i| {
                (i % 5 != 0).then(|| Entry {
                    key: format!("entry-{i}"),
                    value: (i % 2 == 0).then_some(i * 1_000_003 - 7),
                })
            })
            .collect(),
        checksum: [0xde, 0xad, 0xbe, 0xef],
    }
}

fn registry() -> Registry {
    let registry = Registry::new(Bindings::new().structure::<Entry>());
    registry.preload::<Batch>().unwrap();
    registry
}

fn encode_bench(c: &mut Criterion) {
    let registry = registry();
    let batch = sample();
    c.bench_function("dumps_batch", |b| {
        b.iter(|| bsor::dumps(black_box(&batch), &registry).unwrap())
    });
    c.bench_function("encoded_len_batch", |b| {
        b.iter(|| bsor::encoded_len(black_box(&batch), &registry).unwrap())
    });
}

fn decode_bench(c: &mut Criterion) {
    let registry = registry();
    let bytes = bsor::dumps(&sample(), &registry).unwrap();
    c.bench_function("loads_batch", |b| {
        b.iter(|| bsor::loads::<Batch>(black_box(&bytes), &registry).unwrap())
    });
    c.bench_function("tokenize_batch", |b| {
        b.iter(|| {
            let mut parser = ScriptParser::new(black_box(&bytes));
            while !parser.is_exhausted() {
                black_box(parser.next_token().unwrap());
            }
        })
    });
}

criterion_group! {
    name = codec_benches;
    config = Criterion::default();
    targets = encode_bench, decode_bench
}

criterion_main!(codec_benches);
