use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use chrono::NaiveDate;

use stockbook_core::ProductId;
use stockbook_infra::{InMemoryMovementStore, LedgerAggregator, LedgerRequest, MovementStore};
use stockbook_inventory::{MovementAction, MovementDraft};

/// Seed a log of `n` movements spread across products, months, and
/// directions, deterministic per size.
fn seeded_store(n: usize) -> InMemoryMovementStore {
    let store = InMemoryMovementStore::new();
    for i in 0..n {
        let product = (i % 50) as i64 + 1;
        let month = (i % 12) as u32 + 1;
        let day = (i % 28) as u32 + 1;
        let action = if i % 3 == 0 {
            MovementAction::Outbound
        } else {
            MovementAction::Inbound
        };

        store
            .append(MovementDraft {
                product_id: ProductId::new(product),
                product_name: format!("product-{product}"),
                storage_facility_id: Some(((i % 4) as i64 + 1).into()),
                lot_number: Some(((i % 7) as i64 + 1).into()),
                action,
                quantity: (i % 90) as i64 + 1,
                occurred_at: NaiveDate::from_ymd_opt(2024, month, day).expect("seeded date is valid"),
            })
            .expect("seed append");
    }
    store
}

fn bench_compute_ledger(c: &mut Criterion) {
    let mut group = c.benchmark_group("ledger_compute");

    for size in [1_000usize, 10_000, 100_000] {
        let aggregator = LedgerAggregator::new(seeded_store(size));
        let request = LedgerRequest::for_period("2024-06");

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| {
                let rows = aggregator
                    .compute_ledger(black_box(&request))
                    .expect("compute");
                black_box(rows)
            })
        });
    }

    group.finish();
}

fn bench_compute_ledger_filtered(c: &mut Criterion) {
    let mut group = c.benchmark_group("ledger_compute_filtered");

    let aggregator = LedgerAggregator::new(seeded_store(100_000));
    let request = LedgerRequest::for_period("2024-06")
        .with_filter("storage_facility_id", "2")
        .with_filter("lot_number", "3");

    group.throughput(Throughput::Elements(100_000));
    group.bench_function("facility_and_lot", |b| {
        b.iter(|| {
            let rows = aggregator
                .compute_ledger(black_box(&request))
                .expect("compute");
            black_box(rows)
        })
    });

    group.finish();
}

criterion_group!(benches, bench_compute_ledger, bench_compute_ledger_filtered);
criterion_main!(benches);
