//! Data model for pagination.
//!
//! Geometry describes the output page, measurements are snapshots taken
//! from the rendering surface, and plans are the planner's decisions. All of
//! them are request-scoped values; nothing here is persisted.

mod geometry;
mod measurement;
mod plan;

pub use geometry::{
    mm_to_pt, mm_to_px, px_to_mm, Canvas, Margins, PageGeometry, PageSize, Viewport,
    PAGE_MARGIN_MM, PX_PER_MM,
};
pub use measurement::{
    BoxMetrics, DocumentMetrics, ItemHeight, ItemKind, Measurement, SectionMeasurement,
    StructureReport,
};
pub use plan::{BreakDecision, BreakRule, PageBreakPlan};
