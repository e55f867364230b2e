use criterion::{Criterion, criterion_group, criterion_main};
use domain::{CheckoutMetadata, Customer, LineItem, Money};

fn checkout(items: usize) -> CheckoutMetadata {
    let customer = Customer {
        name: "Bench Customer".to_string(),
        email: "bench@example.com".to_string(),
        address: "1 Bench Street".to_string(),
        city: "Benchville".to_string(),
        postal_code: "00000".to_string(),
        country: "US".to_string(),
    };
    let items: Vec<LineItem> = (0..items)
        .map(|i| {
            LineItem::new(format!("SKU-{i:04}"), "Benchmark Hoodie", 2, Money::from_cents(4500))
                .with_variant("M")
        })
        .collect();
    let total = items.iter().map(LineItem::total_price).sum();
    CheckoutMetadata::new(customer, items, total).unwrap()
}

fn bench_encode(c: &mut Criterion) {
    let small = checkout(3);
    let large = checkout(60);

    c.bench_function("metadata/encode_3_items", |b| {
        b.iter(|| small.encode().unwrap());
    });
    c.bench_function("metadata/encode_60_items", |b| {
        b.iter(|| large.encode().unwrap());
    });
}

fn bench_decode(c: &mut Criterion) {
    let small = checkout(3).encode().unwrap();
    let large = checkout(60).encode().unwrap();

    c.bench_function("metadata/decode_3_items", |b| {
        b.iter(|| CheckoutMetadata::decode(&small).unwrap());
    });
    c.bench_function("metadata/decode_60_items", |b| {
        b.iter(|| CheckoutMetadata::decode(&large).unwrap());
    });
}

criterion_group!(benches, bench_encode, bench_decode);
criterion_main!(benches);
