use atlas_core::store::{EdgeRow, GraphStore, MemoryStore, StoreQuery, VertexRow};
use atlas_core::world::{ExitAvailability, Location};
use atlas_inspect::detect::detect_candidates;
use atlas_inspect::scan::scan_world;
use criterion::{Criterion, criterion_group, criterion_main};
use std::collections::BTreeSet;
use std::hint::black_box;

/// Ring world with reciprocated passages plus a sprinkling of dangling
/// exits and island locations, so the scanner exercises every check.
fn build_world(size: usize) -> MemoryStore {
    let mut store = MemoryStore::new();
    for i in 0..size {
        store
            .submit(StoreQuery::InsertVertex(VertexRow {
                id: format!("loc:{i:05}"),
                name: format!("Chamber {i}"),
                description: None,
                tags: BTreeSet::new(),
                availability: ExitAvailability::default(),
            }))
            .unwrap();
        if i % 17 == 0 {
            store
                .submit(StoreQuery::InsertVertex(VertexRow {
                    id: format!("loc:island:{i}"),
                    name: format!("Island {i}"),
                    description: None,
                    tags: BTreeSet::new(),
                    availability: ExitAvailability::default(),
                }))
                .unwrap();
        }
    }
    for i in 0..size {
        let here = format!("loc:{i:05}");
        let next = format!("loc:{:05}", (i + 1) % size);
        store
            .submit(StoreQuery::InsertEdge(EdgeRow {
                from: here.clone(),
                direction: "east".to_string(),
                to: next.clone(),
            }))
            .unwrap();
        store
            .submit(StoreQuery::InsertEdge(EdgeRow {
                from: next,
                direction: "west".to_string(),
                to: here.clone(),
            }))
            .unwrap();
        if i % 13 == 0 {
            store
                .submit(StoreQuery::InsertEdge(EdgeRow {
                    from: here,
                    direction: "down".to_string(),
                    to: format!("loc:lost:{i}"),
                }))
                .unwrap();
        }
    }
    store
}

fn build_blueprint(size: usize) -> Vec<Location> {
    let prose = [
        "Sheer cliffs block passage west. To the north, hills rise.",
        "A narrow trail leads north into the pines.",
        "There is no way out. The hazy east shimmers beyond the fence.",
        "To the south, rooftops. The old road runs east toward the gate.",
        "Dust. Nothing else moves here.",
    ];
    (0..size)
        .map(|i| {
            serde_json::from_value(serde_json::json!({
                "id": format!("loc:{i:05}"),
                "name": format!("Chamber {i}"),
                "description": prose[i % prose.len()],
            }))
            .unwrap()
        })
        .collect()
}

fn bench_scan_small(c: &mut Criterion) {
    let mut store = build_world(100);
    let anchors = BTreeSet::new();

    c.bench_function("scan_100_locations", |b| {
        b.iter(|| scan_world(black_box(&mut store), black_box(&anchors)).unwrap())
    });
}

fn bench_scan_large(c: &mut Criterion) {
    let mut store = build_world(2000);
    let anchors = BTreeSet::new();

    c.bench_function("scan_2000_locations", |b| {
        b.iter(|| scan_world(black_box(&mut store), black_box(&anchors)).unwrap())
    });
}

fn bench_detect_medium(c: &mut Criterion) {
    let blueprint = build_blueprint(500);

    c.bench_function("detect_500_descriptions", |b| {
        b.iter(|| detect_candidates(black_box(&blueprint)))
    });
}

criterion_group!(
    benches,
    bench_scan_small,
    bench_scan_large,
    bench_detect_medium,
);
criterion_main!(benches);
