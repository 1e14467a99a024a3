//! Export pipeline.
//!
//! The [`Exporter`] sequences one request end to end:
//!
//! 1. validate the input and acquire a rendering surface,
//! 2. wait for fonts,
//! 3. flush layout across the resume structure,
//! 4. paged: measure sections, plan and apply breaks;
//!    continuous: resolve the canvas height,
//! 5. rasterize within the timeout budget,
//! 6. release the surface, whatever happened before.
//!
//! # Example
//!
//! ```no_run
//! use pagefit::export::{ExportRequest, Exporter, WireframeRasterizer};
//! use pagefit::surface::{LayoutSnapshot, SnapshotProvider};
//!
//! # async fn run() -> pagefit::Result<()> {
//! let snapshot = LayoutSnapshot::from_file("layout.json")?;
//! let request = ExportRequest::new(snapshot.to_html());
//! let exporter = Exporter::new(SnapshotProvider::new(snapshot), WireframeRasterizer::new());
//!
//! let outcome = exporter.export(&request).await?;
//! std::fs::write("resume.pdf", &outcome.pdf)?;
//! # Ok(())
//! # }
//! ```

mod options;
mod wireframe;

pub use options::{ExportOptions, ExportRequest, ViewMode, RASTER_TIMEOUT};
pub use wireframe::WireframeRasterizer;

use serde::Serialize;

use crate::error::{Error, FailureResponse, Result};
use crate::measure::{
    flush_structure, resolve_continuous_height, wait_for_fonts, ContinuousHeight, FontReport,
    StructuralMeasurer,
};
use crate::model::{Canvas, Margins, PageBreakPlan, PageGeometry, StructureReport};
use crate::paginate::{apply_plan, plan_for_report};
use crate::surface::{RasterJob, Rasterizer, RenderingSurface, SurfaceProvider};

/// Everything produced by a successful export.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportOutcome {
    /// Rasterized output
    #[serde(skip)]
    pub pdf: Vec<u8>,

    /// Canvas handed to the rasterizer
    pub canvas: Canvas,

    /// Font gate result
    pub fonts: FontReport,

    /// Section measurements (paged mode with a container)
    pub structure: Option<StructureReport>,

    /// Break decisions (paged mode with a container)
    pub plan: Option<PageBreakPlan>,

    /// Resolved height (continuous mode)
    pub continuous: Option<ContinuousHeight>,

    /// Template identifier from the request
    pub template_id: Option<String>,
}

impl ExportOutcome {
    /// Size of the output in bytes.
    pub fn pdf_len(&self) -> usize {
        self.pdf.len()
    }
}

/// Result of [`Exporter::respond`].
#[derive(Debug, Clone)]
pub enum ExportResponse {
    /// PDF byte stream
    Pdf(Vec<u8>),
    /// Uniform failure payload
    Failure(FailureResponse),
}

impl ExportResponse {
    pub fn is_success(&self) -> bool {
        matches!(self, ExportResponse::Pdf(_))
    }
}

/// Runs the pagination pipeline against a surface provider and rasterizer.
pub struct Exporter<P, R> {
    provider: P,
    rasterizer: R,
    options: ExportOptions,
}

impl<P, R> Exporter<P, R>
where
    P: SurfaceProvider,
    R: Rasterizer,
{
    /// Create an exporter with default options.
    pub fn new(provider: P, rasterizer: R) -> Self {
        Self {
            provider,
            rasterizer,
            options: ExportOptions::default(),
        }
    }

    /// Set the base options. Request fields override view mode, page size
    /// and template id.
    pub fn with_options(mut self, options: ExportOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &ExportOptions {
        &self.options
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Export a request, converting any failure into the uniform payload.
    pub async fn respond(&self, request: &ExportRequest) -> ExportResponse {
        match self.export(request).await {
            Ok(outcome) => ExportResponse::Pdf(outcome.pdf),
            Err(e) => {
                log::warn!("Export failed: {}", e);
                ExportResponse::Failure(e.to_response())
            }
        }
    }

    /// Export a request.
    pub async fn export(&self, request: &ExportRequest) -> Result<ExportOutcome> {
        let options = self.options.clone().with_request(request);
        self.export_html(&request.html, &options).await
    }

    /// Export `html` with explicit options.
    pub async fn export_html(&self, html: &str, options: &ExportOptions) -> Result<ExportOutcome> {
        if html.trim().is_empty() {
            return Err(Error::InvalidInput("html is required".into()));
        }

        let geometry = PageGeometry::new(options.page_size);
        log::info!(
            "Exporting {} bytes of HTML ({} mode, {})",
            html.len(),
            options.view_mode,
            options.page_size
        );

        let mut surface = self
            .provider
            .acquire(html, geometry.viewport())
            .await
            .map_err(|e| match e {
                Error::SurfaceAcquire(_) => e,
                other => Error::SurfaceAcquire(other.to_string()),
            })?;

        let result = self.run(&mut surface, &geometry, options).await;

        if let Err(e) = self.provider.release(surface).await {
            log::warn!("Failed to release rendering surface: {}", e);
        }

        if let Ok(outcome) = &result {
            log::info!("Export finished: {} bytes", outcome.pdf_len());
        }
        result
    }

    async fn run(
        &self,
        surface: &mut P::Surface,
        geometry: &PageGeometry,
        options: &ExportOptions,
    ) -> Result<ExportOutcome> {
        let fonts = wait_for_fonts(surface, &options.fonts).await;
        flush_structure(surface, &options.selectors).await?;

        let mut structure = None;
        let mut plan = None;
        let mut continuous = None;

        let job = match options.view_mode {
            ViewMode::Paged => {
                let measurer = StructuralMeasurer::new(&options.selectors, &options.settle);
                match measurer.measure(surface, geometry).await? {
                    Some(report) => {
                        let planned = plan_for_report(&report, geometry);
                        apply_plan(surface, &options.selectors, &planned).await?;
                        structure = Some(report);
                        plan = Some(planned);
                    }
                    None => log::warn!("No resume container, rasterizing without planned breaks"),
                }
                RasterJob {
                    canvas: Canvas::Paged(*geometry),
                    margins: Margins::default(),
                    prefer_css_page_size: true,
                    selectors: options.selectors.clone(),
                }
            }
            ViewMode::Continuous => {
                let height = resolve_continuous_height(
                    &*surface,
                    &options.selectors,
                    options.safety_padding_px,
                )
                .await?;
                continuous = Some(height);
                RasterJob {
                    canvas: Canvas::Continuous {
                        width_mm: geometry.page_width_mm,
                        height_mm: height.height_mm,
                    },
                    margins: Margins::default(),
                    prefer_css_page_size: false,
                    selectors: options.selectors.clone(),
                }
            }
        };

        let pdf = self.rasterize(&*surface, &job, options).await?;

        Ok(ExportOutcome {
            pdf,
            canvas: job.canvas,
            fonts,
            structure,
            plan,
            continuous,
            template_id: options.template_id.clone(),
        })
    }

    async fn rasterize<S: RenderingSurface>(
        &self,
        surface: &S,
        job: &RasterJob,
        options: &ExportOptions,
    ) -> Result<Vec<u8>> {
        match tokio::time::timeout(options.raster_timeout, self.rasterizer.rasterize(surface, job))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout(options.raster_timeout)),
        }
    }
}
