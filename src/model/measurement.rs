//! Measurement snapshots of structural units.

use serde::{Deserialize, Serialize};

/// Raw height metrics reported by the rendering surface for one element.
///
/// The three heights may disagree (sub-pixel rounding, overflow clipping);
/// consumers take the maximum rather than trusting any single one.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BoxMetrics {
    pub scroll_height: f64,
    pub offset_height: f64,
    pub bounding_rect_height: f64,
}

impl BoxMetrics {
    /// Metrics where every height agrees.
    pub fn uniform(height: f64) -> Self {
        Self {
            scroll_height: height,
            offset_height: height,
            bounding_rect_height: height,
        }
    }

    /// `max(scrollHeight, offsetHeight)`.
    pub fn block_height(&self) -> f64 {
        self.scroll_height.max(self.offset_height)
    }

    /// `max(scrollHeight, offsetHeight, boundingRectHeight)`.
    pub fn max_height(&self) -> f64 {
        self.block_height().max(self.bounding_rect_height)
    }

    /// Whether any of the heights is positive.
    pub fn has_height(&self) -> bool {
        self.scroll_height > 0.0 || self.offset_height > 0.0 || self.bounding_rect_height > 0.0
    }
}

/// Whole-document metrics used when no container exists.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DocumentMetrics {
    pub body_scroll_height: f64,
    pub body_offset_height: f64,
    pub document_scroll_height: f64,
    pub document_offset_height: f64,
}

impl DocumentMetrics {
    /// Largest of the four height signals.
    pub fn max_height(&self) -> f64 {
        self.body_scroll_height
            .max(self.body_offset_height)
            .max(self.document_scroll_height)
            .max(self.document_offset_height)
    }
}

/// Immutable snapshot of one unit taken at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Measurement {
    pub unit_id: String,
    pub scroll_height: f64,
    pub offset_height: f64,
    pub bounding_rect_height: f64,
    pub margin_top: f64,
    pub margin_bottom: f64,
}

impl Measurement {
    /// Build a measurement from surface metrics and margins.
    pub fn new(unit_id: impl Into<String>, metrics: BoxMetrics, margins: (f64, f64)) -> Self {
        Self {
            unit_id: unit_id.into(),
            scroll_height: metrics.scroll_height,
            offset_height: metrics.offset_height,
            bounding_rect_height: metrics.bounding_rect_height,
            margin_top: margins.0,
            margin_bottom: margins.1,
        }
    }

    /// The raw metrics of this measurement.
    pub fn metrics(&self) -> BoxMetrics {
        BoxMetrics {
            scroll_height: self.scroll_height,
            offset_height: self.offset_height,
            bounding_rect_height: self.bounding_rect_height,
        }
    }

    /// Authoritative height, `max(scrollHeight, offsetHeight)`.
    pub fn height(&self) -> f64 {
        self.metrics().block_height()
    }

    /// Authoritative height plus the vertical margins.
    pub fn outer_height(&self) -> f64 {
        self.height() + self.margin_top + self.margin_bottom
    }
}

/// The five recognized kinds of section entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Experience,
    Education,
    Project,
    Certificate,
    Skill,
}

impl ItemKind {
    /// All kinds in measurement priority order.
    pub const ALL: [ItemKind; 5] = [
        ItemKind::Experience,
        ItemKind::Education,
        ItemKind::Project,
        ItemKind::Certificate,
        ItemKind::Skill,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Experience => "experience",
            ItemKind::Education => "education",
            ItemKind::Project => "project",
            ItemKind::Certificate => "certificate",
            ItemKind::Skill => "skill",
        }
    }
}

/// Measured height of one item inside a section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemHeight {
    pub kind: ItemKind,
    pub height: f64,
}

/// Section-level measurement consumed by the page-break planner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionMeasurement {
    /// Position among the container's sections (0-based)
    pub index: usize,
    /// Heading text, or `section-{index}` when there is none
    pub name: String,
    /// Section height including its vertical margins
    pub total_section_height: f64,
    /// Height of the section's heading element
    pub header_height: f64,
    /// Heights of the section's items, grouped by kind priority
    pub item_heights: Vec<ItemHeight>,
    /// Number of recognized items
    pub item_count: usize,
}

impl SectionMeasurement {
    /// Create a section measurement with no items.
    pub fn new(index: usize, name: impl Into<String>, total_section_height: f64) -> Self {
        Self {
            index,
            name: name.into(),
            total_section_height,
            header_height: 0.0,
            item_heights: Vec::new(),
            item_count: 0,
        }
    }

    /// Add a measured item.
    pub fn with_item(mut self, kind: ItemKind, height: f64) -> Self {
        self.item_heights.push(ItemHeight { kind, height });
        self.item_count = self.item_heights.len();
        self
    }

    /// Whether the section contains at least one recognized item.
    pub fn has_items(&self) -> bool {
        self.item_count > 0
    }
}

/// Output of the structural measurer for one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructureReport {
    pub page_height_px: f64,
    pub page_width_px: f64,
    /// Height of the resume header, 0 when absent
    pub header_height: f64,
    pub sections: Vec<SectionMeasurement>,
    /// Container height, `max(scrollHeight, offsetHeight)`
    pub total_content_height: f64,
}

impl StructureReport {
    /// Total height of the sections.
    pub fn sections_height(&self) -> f64 {
        self.sections.iter().map(|s| s.total_section_height).sum()
    }

    /// Number of items across all sections.
    pub fn item_count(&self) -> usize {
        self.sections.iter().map(|s| s.item_count).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_height_takes_max() {
        let metrics = BoxMetrics {
            scroll_height: 410.0,
            offset_height: 409.5,
            bounding_rect_height: 412.25,
        };
        assert_eq!(metrics.block_height(), 410.0);
        assert_eq!(metrics.max_height(), 412.25);
    }

    #[test]
    fn test_outer_height_adds_margins() {
        let m = Measurement::new("section-0", BoxMetrics::uniform(300.0), (12.0, 8.0));
        assert_eq!(m.height(), 300.0);
        assert_eq!(m.outer_height(), 320.0);
    }

    #[test]
    fn test_has_height() {
        assert!(!BoxMetrics::default().has_height());
        assert!(BoxMetrics {
            bounding_rect_height: 1.0,
            ..Default::default()
        }
        .has_height());
    }

    #[test]
    fn test_document_metrics_max() {
        let doc = DocumentMetrics {
            body_scroll_height: 900.0,
            body_offset_height: 880.0,
            document_scroll_height: 950.0,
            document_offset_height: 940.0,
        };
        assert_eq!(doc.max_height(), 950.0);
    }

    #[test]
    fn test_section_builder() {
        let section = SectionMeasurement::new(0, "Experience", 420.0)
            .with_item(ItemKind::Experience, 180.0)
            .with_item(ItemKind::Experience, 200.0);
        assert!(section.has_items());
        assert_eq!(section.item_count, 2);
    }

    #[test]
    fn test_report_totals() {
        let report = StructureReport {
            page_height_px: 1122.0,
            page_width_px: 793.0,
            header_height: 100.0,
            sections: vec![
                SectionMeasurement::new(0, "Experience", 420.0)
                    .with_item(ItemKind::Experience, 180.0)
                    .with_item(ItemKind::Experience, 200.0),
                SectionMeasurement::new(1, "Skills", 90.5).with_item(ItemKind::Skill, 60.0),
                SectionMeasurement::new(2, "Summary", 40.0),
            ],
            total_content_height: 680.0,
        };
        assert_eq!(report.sections_height(), 550.5);
        assert_eq!(report.item_count(), 3);
    }

    #[test]
    fn test_item_kind_order() {
        let names: Vec<_> = ItemKind::ALL.iter().map(|k| k.as_str()).collect();
        assert_eq!(
            names,
            ["experience", "education", "project", "certificate", "skill"]
        );
    }
}
