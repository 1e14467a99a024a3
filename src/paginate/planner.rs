//! Greedy section-level page-break planner.
//!
//! Sections are visited once, in document order. Each one either joins the
//! current page or, when it would overflow a page that already has content,
//! starts a new one. Sections are never reordered or split; a section taller
//! than a page simply overflows its own page.
//!
//! Planning is pure. [`apply_plan`] writes the decisions onto the surface as
//! a separate step.

use crate::error::Result;
use crate::model::{
    BreakDecision, BreakRule, PageBreakPlan, PageGeometry, SectionMeasurement, StructureReport,
};
use crate::surface::{RenderingSurface, Selectors};

/// Plan page breaks for `sections`.
///
/// `header_height` is charged to the first page before any section and is
/// never break-eligible.
pub fn plan_page_breaks(
    sections: &[SectionMeasurement],
    header_height: f64,
    usable_height_px: f64,
) -> PageBreakPlan {
    let mut current_height = header_height;
    let mut page_heights = vec![header_height];
    let mut decisions = Vec::with_capacity(sections.len());

    for section in sections {
        let test_height = current_height + section.total_section_height;
        let fits = test_height <= usable_height_px;

        let rule = if fits && section.has_items() {
            current_height = test_height;
            BreakRule::Fits
        } else if !fits && current_height > 0.0 {
            page_heights.push(0.0);
            current_height = section.total_section_height;
            BreakRule::Overflow
        } else {
            // Overflow onto an empty page, or an itemless section that
            // skipped the fit rule. Both are charged in full.
            current_height = test_height;
            if fits {
                BreakRule::NoItems
            } else {
                BreakRule::OverflowOnEmptyPage
            }
        };

        if let Some(last) = page_heights.last_mut() {
            *last = current_height;
        }

        log::debug!(
            "Section {} ({}): {:.1}px, test {:.1}/{:.1} -> {:?}",
            section.index,
            section.name,
            section.total_section_height,
            test_height,
            usable_height_px,
            rule
        );

        decisions.push(BreakDecision {
            section_index: section.index,
            name: section.name.clone(),
            break_before: rule == BreakRule::Overflow,
            page: page_heights.len(),
            page_height_after: current_height,
            rule,
        });
    }

    PageBreakPlan {
        decisions,
        page_heights,
    }
}

/// Plan page breaks for a measured document.
pub fn plan_for_report(report: &StructureReport, geometry: &PageGeometry) -> PageBreakPlan {
    let plan = plan_page_breaks(
        &report.sections,
        report.header_height,
        geometry.usable_height_px,
    );
    log::info!(
        "Planned {} page breaks over {} sections ({} pages)",
        plan.break_count(),
        report.sections.len(),
        plan.page_count()
    );
    plan
}

/// Mark every section the plan breaks before with page-break styling.
///
/// Sections are matched to decisions by position within the container.
/// Returns the number of sections marked.
pub async fn apply_plan<S: RenderingSurface>(
    surface: &mut S,
    selectors: &Selectors,
    plan: &PageBreakPlan,
) -> Result<usize> {
    let Some(container) = surface.query(&selectors.container).await? else {
        return Ok(0);
    };
    let sections = surface.query_within(container, &selectors.section).await?;
    if sections.len() != plan.decisions.len() {
        log::warn!(
            "Plan has {} decisions but the document has {} sections",
            plan.decisions.len(),
            sections.len()
        );
    }

    let mut marked = 0;
    for decision in plan.decisions.iter().filter(|d| d.break_before) {
        let Some(&section) = sections.get(decision.section_index) else {
            continue;
        };
        surface.set_style(section, "break-before", "page").await?;
        surface.set_style(section, "page-break-before", "always").await?;
        marked += 1;
    }
    Ok(marked)
}
