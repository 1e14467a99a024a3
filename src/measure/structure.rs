//! Structural measurer.
//!
//! Walks the resume container, its sections and their items, and reports
//! settled heights for each. A document without the container is not an
//! error: the measurer returns `None` and callers fall back to whole-document
//! metrics.

use crate::error::Result;
use crate::model::{ItemKind, Measurement, PageGeometry, SectionMeasurement, StructureReport};
use crate::surface::{vertical_margins, ElementId, RenderingSurface, Selectors};

use super::settle::{read_stable, settle_item, warm_up, SettlePolicy};

/// Measures the structural units of a resume document.
#[derive(Debug, Clone)]
pub struct StructuralMeasurer<'a> {
    selectors: &'a Selectors,
    policy: &'a SettlePolicy,
}

impl<'a> StructuralMeasurer<'a> {
    pub fn new(selectors: &'a Selectors, policy: &'a SettlePolicy) -> Self {
        Self { selectors, policy }
    }

    /// Measure the document, or return `None` when no container exists.
    pub async fn measure<S: RenderingSurface>(
        &self,
        surface: &mut S,
        geometry: &PageGeometry,
    ) -> Result<Option<StructureReport>> {
        let Some(container) = surface.query(&self.selectors.container).await? else {
            log::warn!(
                "No element matches {}, using whole-document metrics",
                self.selectors.container
            );
            return Ok(None);
        };

        let sections = surface
            .query_within(container, &self.selectors.section)
            .await?;
        log::debug!("Found {} sections", sections.len());

        warm_up(surface, self.policy).await?;

        let header_height = self.header_height(surface, container).await?;

        let mut measured = Vec::with_capacity(sections.len());
        for (index, &section) in sections.iter().enumerate() {
            measured.push(self.measure_section(surface, index, section).await?);
        }

        let total_content_height = surface.metrics(container).await?.block_height();

        let report = StructureReport {
            page_height_px: geometry.page_height_px(),
            page_width_px: geometry.page_width_px(),
            header_height,
            sections: measured,
            total_content_height,
        };
        log::debug!(
            "Measured {} sections with {} items: {:.1}px of sections in {:.1}px of content",
            report.sections.len(),
            report.item_count(),
            report.sections_height(),
            report.total_content_height
        );
        Ok(Some(report))
    }

    async fn header_height<S: RenderingSurface>(
        &self,
        surface: &S,
        container: ElementId,
    ) -> Result<f64> {
        let header = match surface
            .query_within(container, &self.selectors.header)
            .await?
            .first()
        {
            Some(&header) => Some(header),
            None => surface.query(&self.selectors.header).await?,
        };
        match header {
            Some(header) => Ok(surface.metrics(header).await?.block_height()),
            None => Ok(0.0),
        }
    }

    async fn measure_section<S: RenderingSurface>(
        &self,
        surface: &mut S,
        index: usize,
        section: ElementId,
    ) -> Result<SectionMeasurement> {
        let heading = surface
            .query_within(section, &self.selectors.heading)
            .await?
            .first()
            .copied();

        let (name, header_height) = match heading {
            Some(heading) => {
                let text = surface.text_content(heading).await?;
                let height = surface.metrics(heading).await?.block_height();
                (text.trim().to_string(), height)
            }
            None => (String::new(), 0.0),
        };
        let name = if name.is_empty() {
            format!("section-{}", index)
        } else {
            name
        };

        let mut result = SectionMeasurement::new(index, name, 0.0);
        result.header_height = header_height;

        // Kind priority order, not visual order. Only used for diagnostics.
        for kind in ItemKind::ALL {
            let items = surface
                .query_within(section, self.selectors.item(kind))
                .await?;
            for item in items {
                settle_item(surface, self.policy).await?;
                let height = surface.metrics(item).await?.block_height();
                log::debug!(
                    "Section {} {} item: {:.1}px",
                    index,
                    kind.as_str(),
                    height
                );
                result = result.with_item(kind, height);
            }
        }

        let metrics = read_stable(surface, section, self.policy).await?;
        let margins = vertical_margins(surface, section).await?;
        let measurement = Measurement::new(format!("section-{}", index), metrics, margins);
        result.total_section_height = measurement.outer_height();

        log::debug!(
            "Section {} ({}): {:.1}px with margins {:.1}/{:.1}, {} items",
            index,
            result.name,
            result.total_section_height,
            measurement.margin_top,
            measurement.margin_bottom,
            result.item_count
        );
        Ok(result)
    }
}
