//! Settle protocol for reading heights after content injection.
//!
//! Layout engines apply font metrics, image decode and reflow across
//! several frames, so a single read right after loading is unreliable.
//! Reads are preceded by forced layout flushes separated by short delays,
//! and section heights are polled until two consecutive reads agree.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::{BoxMetrics, ItemKind};
use crate::surface::{ElementId, RenderingSurface, Selectors};

/// Delays and retry budget of the settle protocol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SettlePolicy {
    /// Delay after each warm-up flush
    pub warmup_delays: Vec<Duration>,
    /// Delay after the final warm-up flush
    pub stabilize_delay: Duration,
    /// Delay after each per-item flush
    pub item_delays: Vec<Duration>,
    /// Maximum reads when polling for a stable height
    pub max_attempts: u32,
    /// Delay between polled reads
    pub poll_interval: Duration,
}

impl SettlePolicy {
    /// Create the default policy.
    pub fn new() -> Self {
        Self::default()
    }

    /// A policy with no delays, for surfaces whose layout is synchronous.
    pub fn immediate() -> Self {
        Self {
            warmup_delays: vec![Duration::ZERO],
            stabilize_delay: Duration::ZERO,
            item_delays: vec![Duration::ZERO],
            max_attempts: 2,
            poll_interval: Duration::ZERO,
        }
    }

    /// Set the stable-read retry budget (at least one read).
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }
}

impl Default for SettlePolicy {
    fn default() -> Self {
        Self {
            warmup_delays: vec![Duration::ZERO, Duration::from_millis(20)],
            stabilize_delay: Duration::from_millis(50),
            item_delays: vec![Duration::from_millis(10), Duration::from_millis(5)],
            max_attempts: 3,
            poll_interval: Duration::from_millis(10),
        }
    }
}

/// Consecutive flush-and-delay reads, then one longer stabilization delay.
pub async fn warm_up<S: RenderingSurface>(surface: &mut S, policy: &SettlePolicy) -> Result<()> {
    for &delay in &policy.warmup_delays {
        surface.force_layout().await?;
        surface.wait(delay).await;
    }
    surface.force_layout().await?;
    surface.wait(policy.stabilize_delay).await;
    log::debug!("Warm-up done: {} flushes", policy.warmup_delays.len() + 1);
    Ok(())
}

/// Flush-and-delay cycles run before reading one item.
pub async fn settle_item<S: RenderingSurface>(
    surface: &mut S,
    policy: &SettlePolicy,
) -> Result<()> {
    for &delay in &policy.item_delays {
        surface.force_layout().await?;
        surface.wait(delay).await;
    }
    Ok(())
}

/// Poll an element's metrics until two consecutive reads agree or the retry
/// budget runs out. Returns the last read either way.
pub async fn read_stable<S: RenderingSurface>(
    surface: &mut S,
    element: ElementId,
    policy: &SettlePolicy,
) -> Result<BoxMetrics> {
    let mut last = surface.metrics(element).await?;
    for _ in 1..policy.max_attempts {
        surface.force_layout().await?;
        surface.wait(policy.poll_interval).await;
        let next = surface.metrics(element).await?;
        if next == last {
            return Ok(next);
        }
        last = next;
    }
    if policy.max_attempts > 1 {
        log::warn!(
            "Element {} did not settle after {} reads, using last height {}",
            element.0,
            policy.max_attempts,
            last.block_height()
        );
    }
    Ok(last)
}

/// Force a final layout flush across the container, its sections and items.
pub async fn flush_structure<S: RenderingSurface>(
    surface: &mut S,
    selectors: &Selectors,
) -> Result<()> {
    surface.force_layout().await?;
    let Some(container) = surface.query(&selectors.container).await? else {
        return Ok(());
    };
    let mut touched = vec![container];
    for section in surface.query_within(container, &selectors.section).await? {
        touched.push(section);
        for kind in ItemKind::ALL {
            touched.extend(surface.query_within(section, selectors.item(kind)).await?);
        }
    }
    for &element in &touched {
        surface.metrics(element).await?;
    }
    log::debug!("Final layout flush touched {} elements", touched.len());
    Ok(())
}
