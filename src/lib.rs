//! # pagefit
//!
//! Content-driven pagination for exporting rendered HTML resumes to PDF.
//!
//! The engine measures a live rendering of the resume, decides where page
//! breaks belong so that no section is split across pages, applies those
//! breaks and hands the result to a rasterizer. A continuous mode instead
//! sizes a single page to fit the whole document.
//!
//! ## Quick Start
//!
//! ```no_run
//! use pagefit::{export_snapshot, ExportRequest, LayoutSnapshot};
//!
//! # async fn run() -> pagefit::Result<()> {
//! let snapshot = LayoutSnapshot::from_file("layout.json")?;
//! let request = ExportRequest::from_json(&std::fs::read_to_string("request.json")?)?;
//!
//! let outcome = export_snapshot(snapshot, &request).await?;
//! println!("{} pages planned", outcome.plan.map_or(1, |p| p.page_count()));
//! # Ok(())
//! # }
//! ```
//!
//! ## Components
//!
//! - **Font gate**: waits for the resume font family before measuring
//! - **Structural measurer**: section, header and item heights after layout settles
//! - **Page-break planner**: greedy first-fit over whole sections
//! - **Continuous height resolver**: canvas height for single-page output
//! - **Exporter**: sequences everything with a rasterization timeout and
//!   guaranteed surface cleanup
//!
//! The rendering engine and PDF writer sit behind the
//! [`surface::RenderingSurface`], [`surface::SurfaceProvider`] and
//! [`surface::Rasterizer`] traits. [`surface::SnapshotSurface`] replays a
//! recorded layout and [`export::WireframeRasterizer`] draws a structural
//! PDF, so the whole pipeline runs without a browser.

pub mod error;
pub mod export;
pub mod measure;
pub mod model;
pub mod paginate;
pub mod surface;

// Re-export commonly used types
pub use error::{Error, FailureResponse, Result};
pub use export::{
    ExportOptions, ExportOutcome, ExportRequest, ExportResponse, Exporter, ViewMode,
    WireframeRasterizer,
};
pub use measure::{FontGateConfig, FontReport, SettlePolicy, StructuralMeasurer};
pub use model::{
    Canvas, PageBreakPlan, PageGeometry, PageSize, SectionMeasurement, StructureReport,
};
pub use paginate::plan_page_breaks;
pub use surface::{LayoutSnapshot, Selectors, SnapshotProvider, SnapshotSurface};

use measure::{flush_structure, wait_for_fonts};
use paginate::plan_for_report;

/// Export a request against a recorded layout with the wireframe rasterizer.
///
/// # Example
///
/// ```no_run
/// use pagefit::{export_snapshot, ExportRequest, LayoutSnapshot, ViewMode};
///
/// # async fn run() -> pagefit::Result<()> {
/// let snapshot = LayoutSnapshot::from_file("layout.json")?;
/// let request = ExportRequest::new(snapshot.to_html()).with_view_mode(ViewMode::Continuous);
/// let outcome = export_snapshot(snapshot, &request).await?;
/// std::fs::write("resume.pdf", &outcome.pdf)?;
/// # Ok(())
/// # }
/// ```
pub async fn export_snapshot(
    snapshot: LayoutSnapshot,
    request: &ExportRequest,
) -> Result<ExportOutcome> {
    export_snapshot_with_options(snapshot, request, ExportOptions::default()).await
}

/// Export a request against a recorded layout with custom base options.
pub async fn export_snapshot_with_options(
    snapshot: LayoutSnapshot,
    request: &ExportRequest,
    options: ExportOptions,
) -> Result<ExportOutcome> {
    Exporter::new(SnapshotProvider::new(snapshot), WireframeRasterizer::new())
        .with_options(options)
        .export(request)
        .await
}

/// Measure the structure of a recorded layout.
///
/// Runs the font gate and the layout flush first, exactly as an export
/// would. Returns `None` when the layout has no resume container.
pub async fn measure_snapshot(
    snapshot: &LayoutSnapshot,
    options: &ExportOptions,
) -> Result<Option<StructureReport>> {
    let geometry = PageGeometry::new(options.page_size);
    let mut surface = SnapshotSurface::new(snapshot, geometry.viewport());

    wait_for_fonts(&mut surface, &options.fonts).await;
    flush_structure(&mut surface, &options.selectors).await?;

    StructuralMeasurer::new(&options.selectors, &options.settle)
        .measure(&mut surface, &geometry)
        .await
}

/// Measure a recorded layout and plan its page breaks.
pub async fn plan_snapshot(
    snapshot: &LayoutSnapshot,
    options: &ExportOptions,
) -> Result<Option<PageBreakPlan>> {
    let geometry = PageGeometry::new(options.page_size);
    Ok(measure_snapshot(snapshot, options)
        .await?
        .map(|report| plan_for_report(&report, &geometry)))
}
