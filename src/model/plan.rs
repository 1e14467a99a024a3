//! Page-break plan types.

use serde::{Deserialize, Serialize};

/// Which planner rule produced a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakRule {
    /// Section fits on the current page
    Fits,
    /// Section overflows a page that already has content; break before it
    Overflow,
    /// Section overflows an empty page; kept there to avoid a blank page
    OverflowOnEmptyPage,
    /// Section fits but has no items; charged without the fit rule
    NoItems,
}

/// Decision for one section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakDecision {
    pub section_index: usize,
    pub name: String,
    /// Start a new page before this section
    pub break_before: bool,
    /// 1-indexed page the section starts on
    pub page: usize,
    /// Running height of the page after this section was processed
    pub page_height_after: f64,
    pub rule: BreakRule,
}

/// Ordered break decisions, one per section.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageBreakPlan {
    pub decisions: Vec<BreakDecision>,
    /// Accumulated height charged to each page
    pub page_heights: Vec<f64>,
}

impl PageBreakPlan {
    /// Break-before flags indexed by section.
    pub fn break_flags(&self) -> Vec<bool> {
        self.decisions.iter().map(|d| d.break_before).collect()
    }

    /// Indexes of sections that start a new page.
    pub fn breaks(&self) -> Vec<usize> {
        self.decisions
            .iter()
            .filter(|d| d.break_before)
            .map(|d| d.section_index)
            .collect()
    }

    /// Number of inserted breaks.
    pub fn break_count(&self) -> usize {
        self.decisions.iter().filter(|d| d.break_before).count()
    }

    /// Number of pages the plan spans.
    pub fn page_count(&self) -> usize {
        self.page_heights.len()
    }

    /// Check if the plan has no decisions.
    pub fn is_empty(&self) -> bool {
        self.decisions.is_empty()
    }
}
