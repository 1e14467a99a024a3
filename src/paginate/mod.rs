//! Page-break planning for paged output.

mod planner;

pub use planner::{apply_plan, plan_for_report, plan_page_breaks};
