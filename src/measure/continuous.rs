//! Continuous height resolver.
//!
//! Continuous mode renders one page exactly as tall as the content. Engines
//! under-report height in some overflow and clipping contexts, so the
//! resolver takes the largest of several redundant signals and adds a fixed
//! padding.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::{px_to_mm, BoxMetrics, DocumentMetrics};
use crate::surface::{RenderingSurface, Selectors};

/// Padding added to the measured content height, in pixels.
pub const SAFETY_PADDING_PX: f64 = 150.0;

/// Which level of the fallback hierarchy produced the height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeightSource {
    /// The resume container
    Container,
    /// Body and document element
    Document,
}

/// Resolved canvas height for continuous output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContinuousHeight {
    pub source: HeightSource,
    /// Height chosen from the metrics, before padding
    pub measured_px: f64,
    /// Height after padding
    pub padded_px: f64,
    /// Padded height in millimetres
    pub height_mm: f64,
}

/// Reduce the available metrics to one canvas height.
///
/// The container wins when it exists and reports any positive height;
/// otherwise only the body/document metrics are consulted.
pub fn resolve_height(
    container: Option<BoxMetrics>,
    document: &DocumentMetrics,
    padding_px: f64,
) -> ContinuousHeight {
    let (source, measured_px) = match container.filter(BoxMetrics::has_height) {
        Some(metrics) => (HeightSource::Container, metrics.max_height()),
        None => (HeightSource::Document, document.max_height()),
    };
    let padded_px = measured_px + padding_px;
    ContinuousHeight {
        source,
        measured_px,
        padded_px,
        height_mm: px_to_mm(padded_px),
    }
}

/// Read the container and document metrics from `surface` and resolve the
/// continuous canvas height.
pub async fn resolve_continuous_height<S: RenderingSurface>(
    surface: &S,
    selectors: &Selectors,
    padding_px: f64,
) -> Result<ContinuousHeight> {
    let container = match surface.query(&selectors.container).await? {
        Some(container) => Some(surface.metrics(container).await?),
        None => None,
    };
    let document = surface.document_metrics().await?;
    let height = resolve_height(container, &document, padding_px);
    log::info!(
        "Continuous height from {:?}: {:.1}px + {:.0}px padding = {:.1}mm",
        height.source,
        height.measured_px,
        padding_px,
        height.height_mm
    );
    Ok(height)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document() -> DocumentMetrics {
        DocumentMetrics {
            body_scroll_height: 1100.0,
            body_offset_height: 1090.0,
            document_scroll_height: 1180.0,
            document_offset_height: 1120.0,
        }
    }

    #[test]
    fn test_container_height() {
        let container = BoxMetrics {
            scroll_height: 1200.0,
            offset_height: 1180.0,
            bounding_rect_height: 0.0,
        };
        let height = resolve_height(Some(container), &document(), SAFETY_PADDING_PX);

        assert_eq!(height.source, HeightSource::Container);
        assert_eq!(height.padded_px, 1350.0);
        assert!((height.height_mm - 1350.0 / 3.779).abs() < 1e-9);
        assert!((height.height_mm - 357.2).abs() < 0.05);
    }

    #[test]
    fn test_bounding_rect_counts() {
        let container = BoxMetrics {
            scroll_height: 1000.0,
            offset_height: 1000.0,
            bounding_rect_height: 1004.5,
        };
        let height = resolve_height(Some(container), &document(), SAFETY_PADDING_PX);
        assert_eq!(height.measured_px, 1004.5);
    }

    #[test]
    fn test_document_fallback_without_container() {
        let height = resolve_height(None, &document(), SAFETY_PADDING_PX);
        assert_eq!(height.source, HeightSource::Document);
        assert_eq!(height.measured_px, 1180.0);
        assert_eq!(height.padded_px, 1330.0);
    }

    #[test]
    fn test_zero_height_container_falls_back() {
        let height = resolve_height(Some(BoxMetrics::default()), &document(), SAFETY_PADDING_PX);
        assert_eq!(height.source, HeightSource::Document);
        assert_eq!(height.measured_px, 1180.0);
    }

    #[test]
    fn test_empty_document_still_padded() {
        let height = resolve_height(None, &DocumentMetrics::default(), SAFETY_PADDING_PX);
        assert_eq!(height.padded_px, 150.0);
    }
}
