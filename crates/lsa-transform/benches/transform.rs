use lsa_core::TransformStrategy;
use lsa_transform::{ContainerKey, CounterBlock, KeystreamProvider, TransformProvider};

fn make_data(size: usize) -> Vec<u8> {
    (0..size)
        .map(|i| (i.wrapping_mul(7) ^ (i >> 3)) as u8)
        .collect()
}

fn provider() -> KeystreamProvider {
    KeystreamProvider::new(
        ContainerKey::from_bytes([0x2b; 16]),
        CounterBlock::from_bytes([0xf0; 16]),
        1024,
    )
}

#[divan::bench(args = [1024, 65536, 1048576, 10485760])]
fn reverse_full(bencher: divan::Bencher, size: usize) {
    let provider = provider();
    let data = make_data(size);
    bencher
        .counter(divan::counter::BytesCount::new(size))
        .bench(|| {
            provider
                .reverse(divan::black_box(&data), TransformStrategy::Full)
                .unwrap()
        });
}

#[divan::bench(args = [1024, 65536, 1048576, 10485760])]
fn reverse_header_only(bencher: divan::Bencher, size: usize) {
    let provider = provider();
    let data = make_data(size);
    bencher
        .counter(divan::counter::BytesCount::new(size))
        .bench(|| {
            provider
                .reverse(divan::black_box(&data), TransformStrategy::HeaderOnly)
                .unwrap()
        });
}

fn main() {
    divan::main();
}
