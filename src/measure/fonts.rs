//! Font readiness gate.
//!
//! Layout has to be measured with the resume's real font metrics, so the
//! gate runs before anything else touches the surface. It never fails: when
//! the required faces do not show up in time the pipeline continues with
//! whatever fonts the engine applied.

use std::collections::BTreeSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::surface::{normalize_family, FontFace, RenderingSurface};

/// Which font faces must be loaded, and how long to wait for them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FontGateConfig {
    /// Required font family
    pub family: String,

    /// Required weights of the family
    pub weights: Vec<u16>,

    /// Upper bound for the engine's "fonts ready" signal
    pub ready_timeout: Duration,

    /// Pause before the single re-check of missing weights
    pub grace: Duration,

    /// Pause between inserting the probe element and reading it back
    pub probe_delay: Duration,
}

impl FontGateConfig {
    /// Create the default configuration (Raleway 400/500/700).
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the required family.
    pub fn with_family(mut self, family: impl Into<String>) -> Self {
        self.family = family.into();
        self
    }

    /// Set the required weights.
    pub fn with_weights(mut self, weights: impl Into<Vec<u16>>) -> Self {
        self.weights = weights.into();
        self
    }

    /// Set the grace interval before the re-check.
    pub fn with_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    /// Set the probe stabilization delay.
    pub fn with_probe_delay(mut self, delay: Duration) -> Self {
        self.probe_delay = delay;
        self
    }
}

impl Default for FontGateConfig {
    fn default() -> Self {
        Self {
            family: "Raleway".to_string(),
            weights: vec![400, 500, 700],
            ready_timeout: Duration::from_secs(5),
            grace: Duration::from_millis(1000),
            probe_delay: Duration::from_millis(500),
        }
    }
}

/// Outcome of the font gate.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FontReport {
    pub family: String,
    pub loaded_weights: Vec<u16>,
    pub missing_weights: Vec<u16>,
    /// Whether the grace re-check was needed
    pub rechecked: bool,
    /// Family the probe element actually rendered with
    pub applied_family: Option<String>,
    /// The probe rendered with a substitute family
    pub fallback_detected: bool,
}

impl FontReport {
    /// All required weights were loaded.
    pub fn is_complete(&self) -> bool {
        self.missing_weights.is_empty()
    }
}

/// Wait for the required fonts, then verify they are actually applied.
pub async fn wait_for_fonts<S: RenderingSurface>(
    surface: &mut S,
    config: &FontGateConfig,
) -> FontReport {
    let mut report = FontReport {
        family: config.family.clone(),
        ..Default::default()
    };

    match tokio::time::timeout(config.ready_timeout, surface.fonts_ready()).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => log::warn!("Fonts ready signal failed: {}", e),
        Err(_) => log::warn!(
            "Fonts ready signal did not fire within {}ms",
            config.ready_timeout.as_millis()
        ),
    }

    let mut loaded = loaded_weights(surface, &config.family).await;
    if !config.weights.iter().all(|w| loaded.contains(w)) {
        log::debug!(
            "{} weights loaded so far: {:?}, waiting {}ms",
            config.family,
            loaded,
            config.grace.as_millis()
        );
        report.rechecked = true;
        surface.wait(config.grace).await;
        loaded = loaded_weights(surface, &config.family).await;
    }

    for &weight in &config.weights {
        if loaded.contains(&weight) {
            report.loaded_weights.push(weight);
        } else {
            report.missing_weights.push(weight);
        }
    }
    if !report.is_complete() {
        log::warn!(
            "{} weights {:?} not loaded, continuing with fallback metrics",
            config.family,
            report.missing_weights
        );
    }

    verify_applied(surface, config, &mut report).await;
    report
}

async fn loaded_weights<S: RenderingSurface>(surface: &S, family: &str) -> BTreeSet<u16> {
    match surface.font_faces().await {
        Ok(faces) => faces
            .iter()
            .filter(|f| f.is_family(family) && f.is_loaded())
            .map(|f: &FontFace| f.weight)
            .collect(),
        Err(e) => {
            log::warn!("Could not read font registry: {}", e);
            BTreeSet::new()
        }
    }
}

async fn verify_applied<S: RenderingSurface>(
    surface: &mut S,
    config: &FontGateConfig,
    report: &mut FontReport,
) {
    let probe = match surface.insert_probe(&config.family).await {
        Ok(probe) => probe,
        Err(e) => {
            log::warn!("Could not insert font probe: {}", e);
            return;
        }
    };

    if let Err(e) = surface.force_layout().await {
        log::debug!("Layout flush for font probe failed: {}", e);
    }
    surface.wait(config.probe_delay).await;

    match surface.computed_style(probe, "font-family").await {
        Ok(Some(applied)) => {
            let wanted = normalize_family(&config.family);
            let matches = applied
                .split(',')
                .next()
                .map(normalize_family)
                .is_some_and(|first| first == wanted);
            if !matches {
                log::warn!(
                    "Font probe rendered with {:?} instead of {}",
                    applied,
                    config.family
                );
                report.fallback_detected = true;
            }
            report.applied_family = Some(applied);
        }
        Ok(None) => log::debug!("Font probe reported no font-family"),
        Err(e) => log::warn!("Could not read font probe style: {}", e),
    }

    if let Err(e) = surface.remove_element(probe).await {
        log::warn!("Could not remove font probe: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Viewport;
    use crate::surface::{LayoutSnapshot, SnapshotElement, SnapshotSurface};
    use tokio::time::Instant;

    fn surface(snapshot: LayoutSnapshot) -> SnapshotSurface {
        SnapshotSurface::new(
            &snapshot,
            Viewport {
                width: 718,
                height: 1122,
            },
        )
    }

    fn body() -> SnapshotElement {
        SnapshotElement::new("body")
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_weights_loaded() {
        let snapshot = LayoutSnapshot::new(body())
            .with_font("Raleway", 400)
            .with_font("Raleway", 500)
            .with_font("Raleway", 700);
        let mut surface = surface(snapshot);
        let before = surface.element_count();

        let started = Instant::now();
        let report = wait_for_fonts(&mut surface, &FontGateConfig::default()).await;

        assert!(report.is_complete());
        assert!(!report.rechecked);
        assert!(!report.fallback_detected);
        assert_eq!(report.applied_family.as_deref(), Some("Raleway"));
        // Only the probe stabilization delay was spent.
        assert_eq!(started.elapsed(), Duration::from_millis(500));
        assert_eq!(surface.element_count(), before);
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_weight_found_on_recheck() {
        let snapshot = LayoutSnapshot::new(body())
            .with_font("Raleway", 400)
            .with_font("Raleway", 500)
            .with_late_font("Raleway", 700, 600);
        let mut surface = surface(snapshot);

        let started = Instant::now();
        let report = wait_for_fonts(&mut surface, &FontGateConfig::default()).await;

        assert!(report.rechecked);
        assert!(report.is_complete());
        assert_eq!(report.loaded_weights, vec![400, 500, 700]);
        assert_eq!(started.elapsed(), Duration::from_millis(1500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_font_degrades_silently() {
        let mut surface = surface(LayoutSnapshot::new(body()));

        let report = wait_for_fonts(&mut surface, &FontGateConfig::default()).await;

        assert!(report.rechecked);
        assert_eq!(report.missing_weights, vec![400, 500, 700]);
        assert!(report.fallback_detected);
        assert_eq!(report.applied_family.as_deref(), Some("serif"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_custom_family_and_delays() {
        let snapshot = LayoutSnapshot::new(body())
            .with_font("Inter", 400)
            .with_late_font("Inter", 600, 150);
        let mut surface = surface(snapshot);
        let config = FontGateConfig::new()
            .with_family("Inter")
            .with_weights(vec![400, 600])
            .with_grace(Duration::from_millis(200))
            .with_probe_delay(Duration::from_millis(50));

        let started = Instant::now();
        let report = wait_for_fonts(&mut surface, &config).await;

        assert_eq!(report.family, "Inter");
        assert!(report.rechecked);
        assert_eq!(report.loaded_weights, vec![400, 600]);
        assert_eq!(report.applied_family.as_deref(), Some("Inter"));
        assert_eq!(started.elapsed(), Duration::from_millis(250));
    }

    #[tokio::test(start_paused = true)]
    async fn test_other_family_ignored() {
        let snapshot = LayoutSnapshot::new(body())
            .with_font("Lato", 400)
            .with_font("Raleway", 400);
        let mut surface = surface(snapshot);
        let config = FontGateConfig::default().with_weights(vec![400, 700]);

        let report = wait_for_fonts(&mut surface, &config).await;

        assert_eq!(report.loaded_weights, vec![400]);
        assert_eq!(report.missing_weights, vec![700]);
        // Some Raleway face is loaded, so the probe applies it.
        assert!(!report.fallback_detected);
    }
}
