//! Measurement of the rendered document.
//!
//! The font gate runs first, then either the structural measurer (paged
//! output) or the continuous height resolver (single-page output).

mod continuous;
mod fonts;
pub mod settle;
mod structure;

pub use continuous::{
    resolve_continuous_height, resolve_height, ContinuousHeight, HeightSource, SAFETY_PADDING_PX,
};
pub use fonts::{wait_for_fonts, FontGateConfig, FontReport};
pub use settle::{flush_structure, SettlePolicy};
pub use structure::StructuralMeasurer;
