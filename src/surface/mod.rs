//! Rendering surface abstraction layer.
//!
//! Provides trait-based interfaces for the two collaborators the pagination
//! engine depends on: a live, queryable rendering of the document and a
//! rasterizer that turns it into PDF bytes. No concrete browser or PDF
//! library types leak through these traits.

mod selectors;
pub mod snapshot;

pub use selectors::Selectors;
pub use snapshot::{LayoutSnapshot, SnapshotElement, SnapshotProvider, SnapshotSurface};

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::{BoxMetrics, Canvas, DocumentMetrics, Margins, Viewport};

/// Opaque handle to an element of a rendering surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub usize);

/// Load state of a font face, as reported by the engine's font registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontLoadStatus {
    #[default]
    Unloaded,
    Loading,
    Loaded,
    Error,
}

/// One entry of the engine's font registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FontFace {
    pub family: String,
    pub weight: u16,
    pub status: FontLoadStatus,
}

impl FontFace {
    /// Check if the face belongs to `family` (quotes and case ignored).
    pub fn is_family(&self, family: &str) -> bool {
        normalize_family(&self.family) == normalize_family(family)
    }

    pub fn is_loaded(&self) -> bool {
        self.status == FontLoadStatus::Loaded
    }
}

/// Strip quotes and whitespace from a CSS font family name and lowercase it.
pub fn normalize_family(family: &str) -> String {
    family
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .trim()
        .to_ascii_lowercase()
}

/// Abstract interface to a rendered, queryable document.
///
/// Reads take `&self`; anything that changes the document or advances
/// layout takes `&mut self`.
#[allow(async_fn_in_trait)]
pub trait RenderingSurface {
    /// First element matching `selector`, in document order.
    async fn query(&self, selector: &str) -> Result<Option<ElementId>>;

    /// All elements matching `selector`, in document order.
    async fn query_all(&self, selector: &str) -> Result<Vec<ElementId>>;

    /// Descendants of `scope` matching `selector`, in document order.
    async fn query_within(&self, scope: ElementId, selector: &str) -> Result<Vec<ElementId>>;

    /// Scroll, offset and bounding-rect heights of an element.
    async fn metrics(&self, element: ElementId) -> Result<BoxMetrics>;

    /// Computed value of a CSS property, `None` when unset.
    async fn computed_style(&self, element: ElementId, property: &str) -> Result<Option<String>>;

    /// Text content of an element.
    async fn text_content(&self, element: ElementId) -> Result<String>;

    /// Body and document-element heights.
    async fn document_metrics(&self) -> Result<DocumentMetrics>;

    /// Resolves once the engine's generic "fonts ready" signal fires.
    async fn fonts_ready(&self) -> Result<()>;

    /// Snapshot of the engine's font registry.
    async fn font_faces(&self) -> Result<Vec<FontFace>>;

    /// Force a synchronous layout flush.
    async fn force_layout(&mut self) -> Result<()>;

    /// Set an inline style property on an element.
    async fn set_style(&mut self, element: ElementId, property: &str, value: &str) -> Result<()>;

    /// Insert an invisible element styled with `font_family`.
    async fn insert_probe(&mut self, font_family: &str) -> Result<ElementId>;

    /// Remove an element from the document.
    async fn remove_element(&mut self, element: ElementId) -> Result<()>;

    /// Wait for a fixed delay. A zero delay still yields once.
    async fn wait(&self, delay: Duration) {
        if delay.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(delay).await;
        }
    }
}

/// Creates and tears down rendering surfaces, one per request.
#[allow(async_fn_in_trait)]
pub trait SurfaceProvider {
    type Surface: RenderingSurface;

    /// Load `html` into a fresh surface with the given viewport.
    async fn acquire(&self, html: &str, viewport: Viewport) -> Result<Self::Surface>;

    /// Release a surface. Called exactly once per acquired surface.
    async fn release(&self, surface: Self::Surface) -> Result<()>;
}

/// Canvas, margin and structure configuration for one rasterization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RasterJob {
    pub canvas: Canvas,
    pub margins: Margins,
    /// Let CSS `@page` rules decide the page size
    pub prefer_css_page_size: bool,
    /// Selectors the document was measured and planned with
    pub selectors: Selectors,
}

/// Turns a live surface into an opaque byte stream.
#[allow(async_fn_in_trait)]
pub trait Rasterizer {
    async fn rasterize<S: RenderingSurface>(&self, surface: &S, job: &RasterJob)
        -> Result<Vec<u8>>;
}

/// Parse a computed CSS length in pixels. Non-pixel or missing values are 0.
pub fn parse_px(value: Option<&str>) -> f64 {
    let Some(value) = value else {
        return 0.0;
    };
    let value = value.trim();
    let number = value.strip_suffix("px").unwrap_or(value).trim();
    number
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// Vertical margins of an element, `(margin-top, margin-bottom)` in pixels.
pub async fn vertical_margins<S: RenderingSurface>(
    surface: &S,
    element: ElementId,
) -> Result<(f64, f64)> {
    let top = surface.computed_style(element, "margin-top").await?;
    let bottom = surface.computed_style(element, "margin-bottom").await?;
    Ok((parse_px(top.as_deref()), parse_px(bottom.as_deref())))
}
