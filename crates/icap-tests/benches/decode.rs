use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use icap_decoder::IcapDecoder;
use icap_driver::AdapterKind;
use icap_tests::{host, reqmod_get, reqmod_post, reqmod_preview_ieof, respmod};
use icap_wire::{ChunkedBody, Terminator, chunked, encapsulated};

fn bench_decode_requests(c: &mut Criterion) {
    let captures = [
        ("reqmod_get", reqmod_get()),
        ("reqmod_post", reqmod_post()),
        ("reqmod_preview_ieof", reqmod_preview_ieof()),
        ("respmod", respmod()),
    ];

    let mut group = c.benchmark_group("decode_request");
    for (name, raw) in &captures {
        group.bench_with_input(BenchmarkId::from_parameter(name), raw, |b, raw| {
            b.iter(|| IcapDecoder::decode_request(raw).unwrap());
        });
    }
    group.finish();
}

fn bench_encapsulated_parse(c: &mut Criterion) {
    c.bench_function("encapsulated_parse", |b| {
        b.iter(|| encapsulated::parse("req-hdr=0, res-hdr=137, res-body=296").unwrap());
    });
}

fn bench_chunked_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("chunked_decode");

    for size_kb in [1, 64, 1024] {
        let encoded = chunked::encode(&vec![b'x'; size_kb * 1024], Terminator::Plain);
        #[allow(clippy::cast_possible_truncation)]
        group.throughput(Throughput::Bytes((size_kb * 1024) as u64));
        group.bench_with_input(
            BenchmarkId::new("single_chunk", format!("{size_kb}kb")),
            &encoded,
            |b, encoded| {
                b.iter(|| ChunkedBody::read_from(encoded).unwrap());
            },
        );
    }

    group.finish();
}

fn bench_host_roundtrip(c: &mut Criterion) {
    let host = host(AdapterKind::Echo);
    host.init().unwrap();
    let raw = respmod();

    c.bench_function("host_modify_respmod_echo", |b| {
        b.iter(|| host.modify(&raw).unwrap());
    });
}

criterion_group!(
    benches,
    bench_decode_requests,
    bench_encapsulated_parse,
    bench_chunked_throughput,
    bench_host_roundtrip
);
criterion_main!(benches);
