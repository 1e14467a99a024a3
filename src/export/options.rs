//! Export options and the incoming request format.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::measure::{FontGateConfig, SettlePolicy, SAFETY_PADDING_PX};
use crate::model::PageSize;
use crate::surface::Selectors;

/// Default budget for a single rasterization.
pub const RASTER_TIMEOUT: Duration = Duration::from_secs(30);

/// How the document is laid out in the output.
///
/// `"page"` selects paged output; any other string is treated as
/// continuous.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ViewMode {
    /// Fixed-size pages with planned section breaks
    #[default]
    Paged,
    /// One page sized to the content
    Continuous,
}

impl ViewMode {
    pub fn parse(name: &str) -> Self {
        if name.trim() == "page" {
            ViewMode::Paged
        } else {
            ViewMode::Continuous
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ViewMode::Paged => "page",
            ViewMode::Continuous => "continuous",
        }
    }
}

impl From<String> for ViewMode {
    fn from(name: String) -> Self {
        ViewMode::parse(&name)
    }
}

impl From<ViewMode> for String {
    fn from(mode: ViewMode) -> Self {
        mode.as_str().to_string()
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An export request as sent by the preview UI.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRequest {
    /// Rendered resume HTML (required)
    #[serde(default)]
    pub html: String,

    /// Template identifier, passed through untouched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_id: Option<String>,

    #[serde(default)]
    pub preview_view_mode: ViewMode,

    #[serde(default)]
    pub preview_page_size: PageSize,
}

impl ExportRequest {
    /// Create a paged A4 request for `html`.
    pub fn new(html: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            ..Default::default()
        }
    }

    /// Parse a request from JSON.
    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_view_mode(mut self, mode: ViewMode) -> Self {
        self.preview_view_mode = mode;
        self
    }

    pub fn with_page_size(mut self, size: PageSize) -> Self {
        self.preview_page_size = size;
        self
    }

    pub fn with_template_id(mut self, id: impl Into<String>) -> Self {
        self.template_id = Some(id.into());
        self
    }
}

/// Options controlling one export.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportOptions {
    /// Paged or continuous output
    pub view_mode: ViewMode,

    /// Output page size
    pub page_size: PageSize,

    /// Opaque template identifier
    pub template_id: Option<String>,

    /// Font readiness requirements
    pub fonts: FontGateConfig,

    /// Structural selector contract
    pub selectors: Selectors,

    /// Settle protocol delays
    pub settle: SettlePolicy,

    /// Padding added to the continuous height, in pixels
    pub safety_padding_px: f64,

    /// Budget for the rasterization call
    pub raster_timeout: Duration,
}

impl ExportOptions {
    /// Create new export options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the view mode.
    pub fn with_view_mode(mut self, mode: ViewMode) -> Self {
        self.view_mode = mode;
        self
    }

    /// Set the page size.
    pub fn with_page_size(mut self, size: PageSize) -> Self {
        self.page_size = size;
        self
    }

    /// Set the font gate configuration.
    pub fn with_fonts(mut self, fonts: FontGateConfig) -> Self {
        self.fonts = fonts;
        self
    }

    /// Set the structural selectors.
    pub fn with_selectors(mut self, selectors: Selectors) -> Self {
        self.selectors = selectors;
        self
    }

    /// Set the settle policy.
    pub fn with_settle(mut self, settle: SettlePolicy) -> Self {
        self.settle = settle;
        self
    }

    /// Set the rasterization timeout.
    pub fn with_raster_timeout(mut self, timeout: Duration) -> Self {
        self.raster_timeout = timeout;
        self
    }

    /// Take view mode, page size and template id from a request.
    pub fn with_request(mut self, request: &ExportRequest) -> Self {
        self.view_mode = request.preview_view_mode;
        self.page_size = request.preview_page_size;
        self.template_id = request.template_id.clone();
        self
    }
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            view_mode: ViewMode::Paged,
            page_size: PageSize::A4,
            template_id: None,
            fonts: FontGateConfig::default(),
            selectors: Selectors::default(),
            settle: SettlePolicy::default(),
            safety_padding_px: SAFETY_PADDING_PX,
            raster_timeout: RASTER_TIMEOUT,
        }
    }
}
