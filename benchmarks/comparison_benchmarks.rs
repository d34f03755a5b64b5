#![allow(
    clippy::unwrap_used,
    clippy::panic,
    clippy::expect_used,
    clippy::print_stdout
)]

//! Benchmarks for the percent-encoding engine and the storage replacement
//! path: the two operations a surrounding parser calls on every component it
//! touches, so their throughput bounds the whole parser's.
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use url_core::{encode_to_string, Sigil, URLStructure, UrlComponent, UrlStorage, COMPONENT, FORM_ENCODED};

fn bench_percent_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("percent_encode");

    let ascii = "the-quick-brown-fox-jumps-over-the-lazy-dog";
    let mixed = "hello, world! this has spaces, commas, and non-ascii: caf\u{e9}";
    let form = "first+name=John Smith&city=New York";

    group.bench_function("component/ascii_only", |b| {
        b.iter(|| encode_to_string(black_box(ascii.as_bytes()), COMPONENT));
    });
    group.bench_function("component/mixed", |b| {
        b.iter(|| encode_to_string(black_box(mixed.as_bytes()), COMPONENT));
    });
    group.bench_function("form_encoded/query_string", |b| {
        b.iter(|| encode_to_string(black_box(form.as_bytes()), FORM_ENCODED));
    });

    group.finish();
}

fn sample_structure() -> URLStructure {
    // "https://example.com:8080/path?query#hash"
    URLStructure {
        scheme_len: 6,
        username_len: 0,
        password_len: 0,
        hostname_len: 11,
        port_len: 5,
        path_len: 5,
        query_len: 6,
        fragment_len: 5,
        sigil: Sigil::Authority,
        scheme_kind: url_core::SchemeKind::Https,
        cannot_be_a_base: false,
    }
}

fn bench_storage_replace(c: &mut Criterion) {
    let mut group = c.benchmark_group("storage_replace_subrange");
    let structure = sample_structure();
    let buffer = b"https://example.com:8080/path?query#hash".to_vec();

    group.bench_function("unique_owner_in_place", |b| {
        b.iter_batched(
            || UrlStorage::new(buffer.clone(), structure),
            |mut storage| {
                let mut new_structure = structure;
                new_structure.fragment_len = 9;
                let range = structure.range(UrlComponent::Fragment).unwrap();
                storage.replace_subrange(range, 9, new_structure, &mut |out| {
                    out.copy_from_slice(b"#new-hash");
                    out.len() as u32
                });
                black_box(storage);
            },
            criterion::BatchSize::SmallInput,
        );
    });

    group.bench_function("shared_owner_forces_rebuild", |b| {
        b.iter_batched(
            || {
                let storage = UrlStorage::new(buffer.clone(), structure);
                let clone = storage.clone();
                (storage, clone)
            },
            |(mut storage, _clone)| {
                let mut new_structure = structure;
                new_structure.fragment_len = 9;
                let range = structure.range(UrlComponent::Fragment).unwrap();
                storage.replace_subrange(range, 9, new_structure, &mut |out| {
                    out.copy_from_slice(b"#new-hash");
                    out.len() as u32
                });
                black_box(storage);
            },
            criterion::BatchSize::SmallInput,
        );
    });

    group.finish();
}

criterion_group!(benches, bench_percent_encode, bench_storage_replace);
criterion_main!(benches);
