//! Benchmarks for page-break planning.
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use pagefit::model::ItemKind;
use pagefit::surface::SnapshotElement;
use pagefit::{
    export_snapshot_with_options, plan_page_breaks, ExportOptions, ExportRequest,
    LayoutSnapshot, PageGeometry, SectionMeasurement, SettlePolicy,
};

/// Sections with heights cycling through a few typical sizes.
fn sections(count: usize) -> Vec<SectionMeasurement> {
    (0..count)
        .map(|i| {
            let height = [180.0, 420.0, 95.0, 610.0][i % 4];
            SectionMeasurement::new(i, format!("section-{}", i), height)
                .with_item(ItemKind::Experience, height - 40.0)
        })
        .collect()
}

fn snapshot(count: usize) -> LayoutSnapshot {
    let children = (0..count).map(|i| {
        let height = [180.0, 420.0, 95.0, 610.0][i % 4];
        SnapshotElement::new("section")
            .with_class("resume-section")
            .with_height(height)
            .with_child(SnapshotElement::new("h2").with_text(format!("Section {}", i)))
            .with_child(
                SnapshotElement::new("div")
                    .with_class("experience-item")
                    .with_height(height - 40.0),
            )
    });
    LayoutSnapshot::new(
        SnapshotElement::new("body").with_child(
            SnapshotElement::new("div")
                .with_class("resume-container")
                .with_children(children),
        ),
    )
}

/// Benchmark the planner alone at various document sizes.
fn bench_planning(c: &mut Criterion) {
    let usable = PageGeometry::default().usable_height_px;
    let mut group = c.benchmark_group("plan_page_breaks");

    for count in [8, 64, 512].iter() {
        let input = sections(*count);
        group.bench_function(format!("{}_sections", count), |b| {
            b.iter(|| plan_page_breaks(black_box(&input), black_box(120.0), usable));
        });
    }

    group.finish();
}

/// Benchmark a full paged export against a snapshot surface.
fn bench_export(c: &mut Criterion) {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .start_paused(true)
        .build()
        .unwrap();
    let layout = snapshot(24);
    let request = ExportRequest::new(layout.to_html());

    c.bench_function("export_24_sections", |b| {
        b.iter(|| {
            let options = ExportOptions::new().with_settle(SettlePolicy::immediate());
            rt.block_on(export_snapshot_with_options(
                black_box(layout.clone()),
                &request,
                options,
            ))
            .unwrap()
        });
    });
}

criterion_group!(benches, bench_planning, bench_export);
criterion_main!(benches);
