use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use stockmaster_core::{ActingPrincipal, ProductId, WarehouseId};
use stockmaster_infra::entity_store::InMemoryEntityStore;
use stockmaster_infra::reconciliation::ReconciliationEngine;
use stockmaster_inventory::{
    CapacityPolicy, DocumentStatus, NewLine, NewReceipt, ProductDetails, ReceiptStatus,
    TransitionRequest, WarehouseDetails,
};
use tokio_util::sync::CancellationToken;

type Engine = ReconciliationEngine<InMemoryEntityStore>;

fn principal() -> ActingPrincipal {
    ActingPrincipal::new("bench").unwrap()
}

fn setup(products: usize) -> (Engine, WarehouseId, Vec<ProductId>) {
    let engine = ReconciliationEngine::new(InMemoryEntityStore::new(), CapacityPolicy::Enforce);
    let warehouse = engine
        .register_warehouse(
            WarehouseDetails {
                name: "Main".to_string(),
                address: "Dock 1".to_string(),
                capacity: i64::MAX / 2,
            },
            &principal(),
        )
        .unwrap()
        .value
        .id_typed();
    let products = (0..products)
        .map(|i| {
            engine
                .register_product(
                    ProductDetails {
                        sku: format!("SKU-{i:05}"),
                        name: format!("Item {i}"),
                        category: "Bench".to_string(),
                        unit: "pcs".to_string(),
                        reorder_level: 0,
                    },
                    &principal(),
                )
                .unwrap()
                .value
                .id_typed()
        })
        .collect();
    (engine, warehouse, products)
}

fn receive(engine: &Engine, warehouse: WarehouseId, products: &[ProductId], qty: i64) {
    let doc = engine
        .create_receipt(
            NewReceipt {
                number: None,
                supplier: "Acme".to_string(),
                warehouse_id: warehouse,
                date: None,
                status: Some(ReceiptStatus::Pending),
                items: products
                    .iter()
                    .map(|product_id| NewLine {
                        product_id: *product_id,
                        quantity: qty,
                    })
                    .collect(),
                notes: None,
            },
            &principal(),
        )
        .unwrap();
    black_box(
        engine
            .transition(
                doc.value.id_typed(),
                TransitionRequest::to(DocumentStatus::Receipt(ReceiptStatus::Received)),
                &principal(),
                &CancellationToken::new(),
            )
            .unwrap(),
    );
}

fn bench_transition_latency(c: &mut Criterion) {
    let mut group = c.benchmark_group("transition_latency");
    group.sample_size(200);

    group.bench_function("single_line_receipt", |b| {
        let (engine, warehouse, products) = setup(1);
        b.iter(|| receive(&engine, warehouse, &products, black_box(3)));
    });

    group.finish();
}

fn bench_lines_per_document(c: &mut Criterion) {
    let mut group = c.benchmark_group("lines_per_document");

    for lines in [1usize, 10, 50].iter() {
        group.throughput(Throughput::Elements(*lines as u64));
        group.bench_with_input(BenchmarkId::new("receipt", lines), lines, |b, &lines| {
            let (engine, warehouse, products) = setup(lines);
            b.iter(|| receive(&engine, warehouse, &products, 1));
        });
    }

    group.finish();
}

fn bench_audit(c: &mut Criterion) {
    let mut group = c.benchmark_group("audit");
    group.sample_size(20);

    for documents in [10usize, 100].iter() {
        group.bench_with_input(
            BenchmarkId::new("ledger_replay", documents),
            documents,
            |b, &documents| {
                let (engine, warehouse, products) = setup(10);
                for _ in 0..documents {
                    receive(&engine, warehouse, &products, 2);
                }
                b.iter(|| black_box(engine.audit().unwrap()));
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_transition_latency, bench_lines_per_document, bench_audit);
criterion_main!(benches);
