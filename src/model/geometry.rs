//! Page geometry and canvas types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Pixels per millimetre at 96 dpi.
pub const PX_PER_MM: f64 = 3.779;

/// Margin applied to each side of the page, in millimetres.
pub const PAGE_MARGIN_MM: f64 = 10.0;

/// Convert CSS pixels to millimetres.
pub fn px_to_mm(px: f64) -> f64 {
    px / PX_PER_MM
}

/// Convert millimetres to CSS pixels.
pub fn mm_to_px(mm: f64) -> f64 {
    mm * PX_PER_MM
}

/// Convert millimetres to PDF points (1/72 inch).
pub fn mm_to_pt(mm: f64) -> f64 {
    mm * 72.0 / 25.4
}

/// Requested output page size.
///
/// Deserializes leniently from the strings used by the preview UI:
/// `"A4"` and `"US Letter"` (plus `"a4"`, `"letter"`, `"Letter"`). Anything
/// else falls back to A4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PageSize {
    /// ISO A4, 210 x 297 mm
    #[default]
    A4,
    /// US Letter, 215.9 x 279.4 mm
    UsLetter,
}

impl PageSize {
    /// Parse a page size name, returning `None` for unknown names.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "a4" => Some(PageSize::A4),
            "us letter" | "us-letter" | "letter" | "usletter" => Some(PageSize::UsLetter),
            _ => None,
        }
    }

    /// Page dimensions as (width, height) in millimetres.
    pub fn dimensions_mm(&self) -> (f64, f64) {
        match self {
            PageSize::A4 => (210.0, 297.0),
            PageSize::UsLetter => (215.9, 279.4),
        }
    }

    /// Name as accepted by the preview UI.
    pub fn as_str(&self) -> &'static str {
        match self {
            PageSize::A4 => "A4",
            PageSize::UsLetter => "US Letter",
        }
    }
}

impl From<String> for PageSize {
    fn from(name: String) -> Self {
        PageSize::parse(&name).unwrap_or_else(|| {
            log::warn!("Unknown page size {:?}, using A4", name);
            PageSize::A4
        })
    }
}

impl From<PageSize> for String {
    fn from(size: PageSize) -> Self {
        size.as_str().to_string()
    }
}

impl fmt::Display for PageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-side margins in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Margins {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Margins {
    /// Same margin on every side.
    pub fn uniform(mm: f64) -> Self {
        Self {
            top: mm,
            right: mm,
            bottom: mm,
            left: mm,
        }
    }

    /// Combined top and bottom margin.
    pub fn vertical(&self) -> f64 {
        self.top + self.bottom
    }

    /// Combined left and right margin.
    pub fn horizontal(&self) -> f64 {
        self.left + self.right
    }
}

impl Default for Margins {
    fn default() -> Self {
        Self::uniform(PAGE_MARGIN_MM)
    }
}

/// Viewport applied to the rendering surface before content is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    /// Width in CSS pixels
    pub width: u32,
    /// Height in CSS pixels
    pub height: u32,
}

/// Fixed geometry of one output page, computed once per request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageGeometry {
    /// Requested page size
    pub page_size: PageSize,
    /// Page width in millimetres
    pub page_width_mm: f64,
    /// Page height in millimetres
    pub page_height_mm: f64,
    /// Total vertical (and horizontal) margin in millimetres
    pub margin_mm: f64,
    /// Height available for content, in CSS pixels
    pub usable_height_px: f64,
}

impl PageGeometry {
    /// Derive the geometry for a page size with the fixed 10mm margins.
    pub fn new(page_size: PageSize) -> Self {
        let (width, height) = page_size.dimensions_mm();
        let margin_mm = Margins::default().vertical();
        Self {
            page_size,
            page_width_mm: width,
            page_height_mm: height,
            margin_mm,
            usable_height_px: mm_to_px(height - margin_mm),
        }
    }

    /// Full page width in CSS pixels.
    pub fn page_width_px(&self) -> f64 {
        mm_to_px(self.page_width_mm)
    }

    /// Full page height in CSS pixels.
    pub fn page_height_px(&self) -> f64 {
        mm_to_px(self.page_height_mm)
    }

    /// Width available for content, in CSS pixels.
    pub fn usable_width_px(&self) -> f64 {
        mm_to_px(self.page_width_mm - self.margin_mm)
    }

    /// Viewport sized to the usable width of the page.
    pub fn viewport(&self) -> Viewport {
        Viewport {
            width: self.usable_width_px().round() as u32,
            height: self.page_height_px().round() as u32,
        }
    }
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::new(PageSize::default())
    }
}

/// Final output size handed to the rasterizer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Canvas {
    /// Fixed-size pages
    Paged(PageGeometry),
    /// A single page sized to the content
    Continuous {
        /// Canvas width in millimetres
        width_mm: f64,
        /// Canvas height in millimetres
        height_mm: f64,
    },
}

impl Canvas {
    /// Canvas width in millimetres.
    pub fn width_mm(&self) -> f64 {
        match self {
            Canvas::Paged(geometry) => geometry.page_width_mm,
            Canvas::Continuous { width_mm, .. } => *width_mm,
        }
    }

    /// Height of one output page in millimetres.
    pub fn page_height_mm(&self) -> f64 {
        match self {
            Canvas::Paged(geometry) => geometry.page_height_mm,
            Canvas::Continuous { height_mm, .. } => *height_mm,
        }
    }

    /// Check if this is a paged canvas.
    pub fn is_paged(&self) -> bool {
        matches!(self, Canvas::Paged(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_a4_geometry() {
        let geometry = PageGeometry::new(PageSize::A4);
        assert_eq!(geometry.page_width_mm, 210.0);
        assert_eq!(geometry.page_height_mm, 297.0);
        assert_eq!(geometry.margin_mm, 20.0);
        assert!((geometry.usable_height_px - 277.0 * 3.779).abs() < 1e-9);
    }

    #[test]
    fn test_letter_geometry() {
        let geometry = PageGeometry::new(PageSize::UsLetter);
        assert_eq!(geometry.page_width_mm, 215.9);
        assert!((geometry.usable_height_px - (279.4 - 20.0) * 3.779).abs() < 1e-9);
    }

    #[test]
    fn test_viewport_uses_usable_width() {
        let viewport = PageGeometry::new(PageSize::A4).viewport();
        assert_eq!(viewport.width, 718);
        assert_eq!(viewport.height, 1122);
    }

    #[test]
    fn test_page_size_parse() {
        assert_eq!(PageSize::parse("A4"), Some(PageSize::A4));
        assert_eq!(PageSize::parse("US Letter"), Some(PageSize::UsLetter));
        assert_eq!(PageSize::parse("letter"), Some(PageSize::UsLetter));
        assert_eq!(PageSize::parse("B5"), None);
    }

    #[test]
    fn test_page_size_serde() {
        let size: PageSize = serde_json::from_str("\"US Letter\"").unwrap();
        assert_eq!(size, PageSize::UsLetter);

        let unknown: PageSize = serde_json::from_str("\"Tabloid\"").unwrap();
        assert_eq!(unknown, PageSize::A4);

        assert_eq!(serde_json::to_string(&PageSize::UsLetter).unwrap(), "\"US Letter\"");
    }

    #[test]
    fn test_unit_conversions() {
        assert!((px_to_mm(3.779) - 1.0).abs() < 1e-12);
        assert!((mm_to_pt(25.4) - 72.0).abs() < 1e-12);
    }

    #[test]
    fn test_margins() {
        let margins = Margins::default();
        assert_eq!(margins.vertical(), 20.0);
        assert_eq!(margins.horizontal(), 20.0);
    }
}
