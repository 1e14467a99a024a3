//! In-memory rendering surface that replays a recorded layout.
//!
//! [`SnapshotSurface`] parses the request HTML with `kuchiki` and answers
//! selector queries against that DOM. What a browser would compute (heights,
//! computed styles, font load state) comes from a [`LayoutSnapshot`], a JSON
//! recording of the same document laid out once. Recorded elements are
//! attached to DOM elements by tree position: the snapshot root goes to the
//! first element with its tag, and each recorded child goes to the element
//! child at the same index when the tags agree. Subtrees that do not line up
//! keep zero metrics and no styles.
//!
//! Two pieces of engine behavior are simulated:
//!
//! - **Layout jitter.** An element may carry `frames`, the metrics it reports
//!   before the first, second, ... layout flush. Once the surface has been
//!   flushed `frames.len()` times the element reports its final `metrics`.
//! - **Late fonts.** A font with `loadedAfterMs` reports `loading` until that
//!   much (tokio) time has passed since the surface was created.
//!
//! # Example
//!
//! ```
//! use pagefit::surface::{LayoutSnapshot, SnapshotElement};
//!
//! let snapshot = LayoutSnapshot::new(
//!     SnapshotElement::new("body").with_child(
//!         SnapshotElement::new("div")
//!             .with_class("resume-container")
//!             .with_height(1200.0),
//!     ),
//! );
//! assert_eq!(snapshot.root.children.len(), 1);
//! ```

use std::collections::{BTreeMap, HashMap};
use std::fmt::{self, Write as _};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use kuchiki::traits::TendrilSink;
use kuchiki::NodeRef;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use super::{
    normalize_family, ElementId, FontFace, FontLoadStatus, RenderingSurface, SurfaceProvider,
};
use crate::error::{Error, Result};
use crate::model::{BoxMetrics, DocumentMetrics, Viewport};

/// Recorded layout of a rendered document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutSnapshot {
    /// Body and document-element heights
    #[serde(default)]
    pub document: DocumentMetrics,

    /// Font registry entries
    #[serde(default)]
    pub fonts: Vec<SnapshotFont>,

    /// Family a probe resolves to when the requested family is not loaded
    #[serde(default = "default_fallback_family")]
    pub fallback_family: String,

    /// Element tree, usually rooted at `body`
    pub root: SnapshotElement,
}

fn default_fallback_family() -> String {
    "serif".to_string()
}

impl LayoutSnapshot {
    /// Create a snapshot with the given element tree.
    pub fn new(root: SnapshotElement) -> Self {
        Self {
            document: DocumentMetrics::default(),
            fonts: Vec::new(),
            fallback_family: default_fallback_family(),
            root,
        }
    }

    /// Parse a snapshot from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a snapshot from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// HTML for the recorded element tree, the document a browser would
    /// have rendered to produce this layout.
    pub fn to_html(&self) -> String {
        self.root.to_html()
    }

    /// Set whole-document metrics.
    pub fn with_document(mut self, document: DocumentMetrics) -> Self {
        self.document = document;
        self
    }

    /// Add a loaded font face.
    pub fn with_font(mut self, family: impl Into<String>, weight: u16) -> Self {
        self.fonts.push(SnapshotFont {
            family: family.into(),
            weight,
            status: FontLoadStatus::Loaded,
            loaded_after_ms: None,
        });
        self
    }

    /// Add a font face that finishes loading after `ms` milliseconds.
    pub fn with_late_font(mut self, family: impl Into<String>, weight: u16, ms: u64) -> Self {
        self.fonts.push(SnapshotFont {
            family: family.into(),
            weight,
            status: FontLoadStatus::Loaded,
            loaded_after_ms: Some(ms),
        });
        self
    }
}

/// Font registry entry of a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotFont {
    pub family: String,
    pub weight: u16,
    #[serde(default = "default_font_status")]
    pub status: FontLoadStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loaded_after_ms: Option<u64>,
}

fn default_font_status() -> FontLoadStatus {
    FontLoadStatus::Loaded
}

/// One element of a recorded layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotElement {
    #[serde(default = "default_tag")]
    pub tag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub classes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default)]
    pub metrics: BoxMetrics,
    /// Computed style properties
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub style: BTreeMap<String, String>,
    /// Metrics reported before each of the first layout flushes
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub frames: Vec<BoxMetrics>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<SnapshotElement>,
}

fn default_tag() -> String {
    "div".to_string()
}

impl SnapshotElement {
    /// Create an element with the given tag name.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            id: None,
            classes: Vec::new(),
            text: None,
            metrics: BoxMetrics::default(),
            style: BTreeMap::new(),
            frames: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Set all three heights to `height`.
    pub fn with_height(mut self, height: f64) -> Self {
        self.metrics = BoxMetrics::uniform(height);
        self
    }

    pub fn with_metrics(mut self, metrics: BoxMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn with_style(mut self, property: impl Into<String>, value: impl Into<String>) -> Self {
        self.style.insert(property.into(), value.into());
        self
    }

    /// Set vertical margins in pixels.
    pub fn with_margins(self, top: f64, bottom: f64) -> Self {
        self.with_style("margin-top", format!("{}px", top))
            .with_style("margin-bottom", format!("{}px", bottom))
    }

    pub fn with_frames(mut self, frames: Vec<BoxMetrics>) -> Self {
        self.frames = frames;
        self
    }

    pub fn with_child(mut self, child: SnapshotElement) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = SnapshotElement>) -> Self {
        self.children.extend(children);
        self
    }

    /// Serialize the element, its id, classes, text and children as HTML.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    fn write_html(&self, out: &mut String) {
        let tag = self.tag.to_ascii_lowercase();
        let _ = write!(out, "<{}", tag);
        if let Some(id) = &self.id {
            let _ = write!(out, " id=\"{}\"", escape_html(id));
        }
        if !self.classes.is_empty() {
            let _ = write!(out, " class=\"{}\"", escape_html(&self.classes.join(" ")));
        }
        out.push('>');
        if let Some(text) = &self.text {
            out.push_str(&escape_html(text));
        }
        for child in &self.children {
            child.write_html(out);
        }
        let _ = write!(out, "</{}>", tag);
    }
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Layout state of one DOM element.
struct Entry {
    node: NodeRef,
    metrics: BoxMetrics,
    frames: Vec<BoxMetrics>,
    style: BTreeMap<String, String>,
    probe_family: Option<String>,
    recorded: bool,
    removed: bool,
}

impl Entry {
    fn new(node: NodeRef) -> Self {
        Self {
            node,
            metrics: BoxMetrics::default(),
            frames: Vec::new(),
            style: BTreeMap::new(),
            probe_family: None,
            recorded: false,
            removed: false,
        }
    }
}

type NodeKey = *const kuchiki::Node;

fn node_key(node: &NodeRef) -> NodeKey {
    &**node
}

fn local_name(node: &NodeRef) -> Option<String> {
    node.as_element().map(|e| e.name.local.to_string())
}

/// Rendering surface over a parsed HTML document and a [`LayoutSnapshot`].
pub struct SnapshotSurface {
    document: NodeRef,
    /// Element the snapshot root was attached to; probes are appended here
    anchor: NodeRef,
    entries: Vec<Entry>,
    index: HashMap<NodeKey, usize>,
    metrics: DocumentMetrics,
    fonts: Vec<SnapshotFont>,
    fallback_family: String,
    viewport: Viewport,
    created: Instant,
    flushes: usize,
}

impl fmt::Debug for SnapshotSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnapshotSurface")
            .field("elements", &self.element_count())
            .field("recorded", &self.recorded_count())
            .field("viewport", &self.viewport)
            .field("flushes", &self.flushes)
            .finish_non_exhaustive()
    }
}

impl SnapshotSurface {
    /// Build a surface for the snapshot's own document.
    pub fn new(snapshot: &LayoutSnapshot, viewport: Viewport) -> Self {
        Self::from_html(&snapshot.to_html(), snapshot, viewport)
    }

    /// Parse `html` and attach the recorded layout to it.
    pub fn from_html(html: &str, snapshot: &LayoutSnapshot, viewport: Viewport) -> Self {
        let document = kuchiki::parse_html().one(html);

        let mut entries = Vec::new();
        let mut index = HashMap::new();
        for node in document.descendants() {
            if node.as_element().is_some() {
                index.insert(node_key(&node), entries.len());
                entries.push(Entry::new(node));
            }
        }

        let anchor = document
            .select_first(&snapshot.root.tag)
            .ok()
            .map(|el| el.as_node().clone());

        let mut surface = Self {
            anchor: anchor.clone().unwrap_or_else(|| document.clone()),
            document,
            entries,
            index,
            metrics: snapshot.document,
            fonts: snapshot.fonts.clone(),
            fallback_family: snapshot.fallback_family.clone(),
            viewport,
            created: Instant::now(),
            flushes: 0,
        };
        match anchor {
            Some(anchor) => surface.attach(&snapshot.root, &anchor),
            None => log::warn!(
                "Document has no <{}> element for the recorded layout",
                snapshot.root.tag
            ),
        }
        surface
    }

    fn attach(&mut self, record: &SnapshotElement, node: &NodeRef) {
        let Some(&i) = self.index.get(&node_key(node)) else {
            return;
        };
        let entry = &mut self.entries[i];
        entry.metrics = record.metrics;
        entry.frames = record.frames.clone();
        entry.style = record.style.clone();
        entry.recorded = true;

        let children = node.children().filter(|c| c.as_element().is_some());
        for (child_record, child) in record.children.iter().zip(children) {
            let tag = local_name(&child).unwrap_or_default();
            if tag.eq_ignore_ascii_case(&child_record.tag) {
                self.attach(child_record, &child);
            } else {
                log::debug!(
                    "Recorded <{}> does not match document <{}>, subtree left unmeasured",
                    child_record.tag,
                    tag
                );
            }
        }
    }

    /// Viewport the surface was created with.
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Number of layout flushes performed so far.
    pub fn flush_count(&self) -> usize {
        self.flushes
    }

    /// Number of live (not removed) elements.
    pub fn element_count(&self) -> usize {
        self.entries.iter().filter(|e| !e.removed).count()
    }

    /// Number of elements carrying recorded layout.
    pub fn recorded_count(&self) -> usize {
        self.entries.iter().filter(|e| e.recorded).count()
    }

    /// Inline or computed style value of an element, without probe resolution.
    pub fn style_value(&self, element: ElementId, property: &str) -> Option<&str> {
        self.entries
            .get(element.0)
            .and_then(|e| e.style.get(property))
            .map(String::as_str)
    }

    fn entry(&self, element: ElementId) -> Result<&Entry> {
        self.entries
            .get(element.0)
            .filter(|e| !e.removed)
            .ok_or_else(|| Error::Surface(format!("unknown element {}", element.0)))
    }

    fn entry_mut(&mut self, element: ElementId) -> Result<&mut Entry> {
        self.entries
            .get_mut(element.0)
            .filter(|e| !e.removed)
            .ok_or_else(|| Error::Surface(format!("unknown element {}", element.0)))
    }

    /// Elements under `scope` (excluding `scope`) matching `selector`.
    fn select(&self, scope: &NodeRef, selector: &str) -> Result<Vec<ElementId>> {
        let matches = scope
            .select(selector)
            .map_err(|()| Error::Selector(selector.to_string()))?;
        Ok(matches
            .filter(|el| el.as_node() != scope)
            .filter_map(|el| self.index.get(&node_key(el.as_node())).copied())
            .filter(|&i| !self.entries[i].removed)
            .map(ElementId)
            .collect())
    }

    fn register(&mut self, node: NodeRef) -> ElementId {
        let id = self.entries.len();
        self.index.insert(node_key(&node), id);
        self.entries.push(Entry::new(node));
        ElementId(id)
    }

    fn face_status(&self, font: &SnapshotFont) -> FontLoadStatus {
        match font.loaded_after_ms {
            Some(ms) if self.created.elapsed().as_millis() < u128::from(ms) => {
                FontLoadStatus::Loading
            }
            _ => font.status,
        }
    }

    fn family_loaded(&self, family: &str) -> bool {
        let family = normalize_family(family);
        self.fonts.iter().any(|f| {
            normalize_family(&f.family) == family && self.face_status(f) == FontLoadStatus::Loaded
        })
    }
}

impl RenderingSurface for SnapshotSurface {
    async fn query(&self, selector: &str) -> Result<Option<ElementId>> {
        Ok(self.select(&self.document, selector)?.into_iter().next())
    }

    async fn query_all(&self, selector: &str) -> Result<Vec<ElementId>> {
        self.select(&self.document, selector)
    }

    async fn query_within(&self, scope: ElementId, selector: &str) -> Result<Vec<ElementId>> {
        let scope = self.entry(scope)?.node.clone();
        self.select(&scope, selector)
    }

    async fn metrics(&self, element: ElementId) -> Result<BoxMetrics> {
        let entry = self.entry(element)?;
        Ok(entry.frames.get(self.flushes).copied().unwrap_or(entry.metrics))
    }

    async fn computed_style(&self, element: ElementId, property: &str) -> Result<Option<String>> {
        let entry = self.entry(element)?;
        if property == "font-family" {
            if let Some(family) = &entry.probe_family {
                let applied = if self.family_loaded(family) {
                    family.clone()
                } else {
                    self.fallback_family.clone()
                };
                return Ok(Some(applied));
            }
        }
        Ok(entry.style.get(property).cloned())
    }

    async fn text_content(&self, element: ElementId) -> Result<String> {
        Ok(self.entry(element)?.node.text_contents())
    }

    async fn document_metrics(&self) -> Result<DocumentMetrics> {
        Ok(self.metrics)
    }

    async fn fonts_ready(&self) -> Result<()> {
        Ok(())
    }

    async fn font_faces(&self) -> Result<Vec<FontFace>> {
        Ok(self
            .fonts
            .iter()
            .map(|f| FontFace {
                family: f.family.clone(),
                weight: f.weight,
                status: self.face_status(f),
            })
            .collect())
    }

    async fn force_layout(&mut self) -> Result<()> {
        self.flushes += 1;
        Ok(())
    }

    async fn set_style(&mut self, element: ElementId, property: &str, value: &str) -> Result<()> {
        self.entry_mut(element)?
            .style
            .insert(property.to_string(), value.to_string());
        Ok(())
    }

    async fn insert_probe(&mut self, font_family: &str) -> Result<ElementId> {
        let fragment = kuchiki::parse_html().one("<span>abcdefghijklmnopqrstuvwxyz</span>");
        let span = fragment
            .select_first("span")
            .map_err(|()| Error::Surface("could not create probe element".into()))?
            .as_node()
            .clone();
        span.detach();
        self.anchor.append(span.clone());

        let probe = self.register(span);
        let entry = self.entry_mut(probe)?;
        entry.style.insert("visibility".into(), "hidden".into());
        entry.style.insert("position".into(), "absolute".into());
        entry.probe_family = Some(font_family.to_string());
        Ok(probe)
    }

    async fn remove_element(&mut self, element: ElementId) -> Result<()> {
        let node = self.entry(element)?.node.clone();
        if node.inclusive_descendants().any(|n| n == self.anchor) {
            return Err(Error::Surface("cannot remove the root element".into()));
        }
        for removed in node.inclusive_descendants() {
            if let Some(&i) = self.index.get(&node_key(&removed)) {
                self.entries[i].removed = true;
            }
        }
        node.detach();
        Ok(())
    }
}

/// [`SurfaceProvider`] handing out a fresh [`SnapshotSurface`] per request.
#[derive(Debug)]
pub struct SnapshotProvider {
    snapshot: LayoutSnapshot,
    fail_release: bool,
    acquired: AtomicUsize,
    released: AtomicUsize,
    last_viewport: Mutex<Option<Viewport>>,
}

impl SnapshotProvider {
    /// Create a provider replaying `snapshot`.
    pub fn new(snapshot: LayoutSnapshot) -> Self {
        Self {
            snapshot,
            fail_release: false,
            acquired: AtomicUsize::new(0),
            released: AtomicUsize::new(0),
            last_viewport: Mutex::new(None),
        }
    }

    /// Make every release report an error (the surface is still dropped).
    pub fn with_failing_release(mut self) -> Self {
        self.fail_release = true;
        self
    }

    /// Number of surfaces handed out.
    pub fn acquired(&self) -> usize {
        self.acquired.load(Ordering::SeqCst)
    }

    /// Number of surfaces released.
    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    /// Viewport of the most recent acquisition.
    pub fn last_viewport(&self) -> Option<Viewport> {
        self.last_viewport.lock().ok().and_then(|v| *v)
    }
}

impl SurfaceProvider for SnapshotProvider {
    type Surface = SnapshotSurface;

    async fn acquire(&self, html: &str, viewport: Viewport) -> Result<SnapshotSurface> {
        if html.trim().is_empty() {
            return Err(Error::SurfaceAcquire("document is empty".into()));
        }
        if let Ok(mut last) = self.last_viewport.lock() {
            *last = Some(viewport);
        }
        self.acquired.fetch_add(1, Ordering::SeqCst);
        let surface = SnapshotSurface::from_html(html, &self.snapshot, viewport);
        log::debug!(
            "Snapshot surface acquired ({}x{} viewport, {} bytes of HTML, {} of {} elements recorded)",
            viewport.width,
            viewport.height,
            html.len(),
            surface.recorded_count(),
            surface.element_count()
        );
        Ok(surface)
    }

    async fn release(&self, surface: SnapshotSurface) -> Result<()> {
        self.released.fetch_add(1, Ordering::SeqCst);
        drop(surface);
        if self.fail_release {
            return Err(Error::Surface("surface already closed".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport() -> Viewport {
        Viewport {
            width: 718,
            height: 1122,
        }
    }

    fn sample() -> LayoutSnapshot {
        LayoutSnapshot::new(
            SnapshotElement::new("body").with_child(
                SnapshotElement::new("div")
                    .with_id("preview")
                    .with_class("resume-container")
                    .with_height(900.0)
                    .with_children([
                        SnapshotElement::new("section")
                            .with_class("resume-section")
                            .with_child(SnapshotElement::new("h2").with_text("Experience")),
                        SnapshotElement::new("section")
                            .with_class("resume-section")
                            .with_class("compact")
                            .with_child(SnapshotElement::new("h2").with_text("Skills")),
                    ]),
            ),
        )
    }

    #[test]
    fn test_to_html() {
        let html = SnapshotElement::new("section")
            .with_id("skills")
            .with_class("resume-section")
            .with_class("compact")
            .with_child(SnapshotElement::new("h2").with_text("Tools & <Tech>"))
            .to_html();
        assert_eq!(
            html,
            "<section id=\"skills\" class=\"resume-section compact\">\
             <h2>Tools &amp; &lt;Tech&gt;</h2></section>"
        );
    }

    #[tokio::test]
    async fn test_query_document_order() {
        let surface = SnapshotSurface::new(&sample(), viewport());
        let sections = surface.query_all(".resume-section").await.unwrap();
        assert_eq!(sections.len(), 2);
        assert!(sections[0] < sections[1]);

        let compact = surface.query_all("section.compact").await.unwrap();
        assert_eq!(compact, vec![sections[1]]);
    }

    #[tokio::test]
    async fn test_descendant_query() {
        let surface = SnapshotSurface::new(&sample(), viewport());
        let headings = surface.query_all(".resume-container h2").await.unwrap();
        assert_eq!(headings.len(), 2);
        assert!(surface.query_all("h2 .resume-container").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_full_selector_syntax() {
        let surface = SnapshotSurface::new(&sample(), viewport());
        let sections = surface.query_all(".resume-section").await.unwrap();

        let container = surface.query("body > .resume-container").await.unwrap();
        assert!(container.is_some());
        let first = surface.query(".resume-section:first-child").await.unwrap();
        assert_eq!(first, Some(sections[0]));
        let by_attr = surface.query_all("[class~=compact]").await.unwrap();
        assert_eq!(by_attr, vec![sections[1]]);
    }

    #[tokio::test]
    async fn test_invalid_selector() {
        let surface = SnapshotSurface::new(&sample(), viewport());
        assert!(matches!(
            surface.query("##").await,
            Err(Error::Selector(_))
        ));
    }

    #[tokio::test]
    async fn test_layout_attaches_to_matching_html() {
        let snapshot = sample();
        let surface = SnapshotSurface::from_html(&snapshot.to_html(), &snapshot, viewport());
        let container = surface.query(".resume-container").await.unwrap().unwrap();
        assert_eq!(surface.metrics(container).await.unwrap().block_height(), 900.0);
        // body, container, two sections and two headings
        assert_eq!(surface.recorded_count(), 6);
    }

    #[tokio::test]
    async fn test_divergent_html_is_not_measured_from_layout() {
        let surface = SnapshotSurface::from_html(
            "<p>totally different document</p>",
            &sample(),
            viewport(),
        );
        assert_eq!(surface.query(".resume-container").await.unwrap(), None);
        let p = surface.query("p").await.unwrap().unwrap();
        assert_eq!(surface.metrics(p).await.unwrap().block_height(), 0.0);
        assert_eq!(
            surface.text_content(p).await.unwrap(),
            "totally different document"
        );
        assert_eq!(surface.recorded_count(), 1);
    }

    #[tokio::test]
    async fn test_query_within_scope() {
        let surface = SnapshotSurface::new(&sample(), viewport());
        let sections = surface.query_all(".resume-section").await.unwrap();
        let headings = surface.query_within(sections[1], "h2").await.unwrap();
        assert_eq!(headings.len(), 1);
        assert_eq!(surface.text_content(headings[0]).await.unwrap(), "Skills");
    }

    #[tokio::test]
    async fn test_frames_advance_on_flush() {
        let snapshot = LayoutSnapshot::new(
            SnapshotElement::new("body").with_child(
                SnapshotElement::new("div")
                    .with_class("box")
                    .with_height(300.0)
                    .with_frames(vec![BoxMetrics::uniform(120.0), BoxMetrics::uniform(280.0)]),
            ),
        );
        let mut surface = SnapshotSurface::new(&snapshot, viewport());
        let el = surface.query(".box").await.unwrap().unwrap();

        assert_eq!(surface.metrics(el).await.unwrap().block_height(), 120.0);
        surface.force_layout().await.unwrap();
        assert_eq!(surface.metrics(el).await.unwrap().block_height(), 280.0);
        surface.force_layout().await.unwrap();
        assert_eq!(surface.metrics(el).await.unwrap().block_height(), 300.0);
        assert_eq!(surface.flush_count(), 2);
    }

    #[tokio::test]
    async fn test_probe_resolves_family() {
        let snapshot = sample().with_font("Raleway", 400);
        let mut surface = SnapshotSurface::new(&snapshot, viewport());

        let probe = surface.insert_probe("Raleway").await.unwrap();
        let family = surface.computed_style(probe, "font-family").await.unwrap();
        assert_eq!(family.as_deref(), Some("Raleway"));

        let other = surface.insert_probe("Lato").await.unwrap();
        let family = surface.computed_style(other, "font-family").await.unwrap();
        assert_eq!(family.as_deref(), Some("serif"));
    }

    #[tokio::test]
    async fn test_remove_element() {
        let mut surface = SnapshotSurface::new(&sample(), viewport());
        let before = surface.element_count();
        let probe = surface.insert_probe("Raleway").await.unwrap();
        assert_eq!(surface.element_count(), before + 1);

        surface.remove_element(probe).await.unwrap();
        assert_eq!(surface.element_count(), before);
        assert!(surface.metrics(probe).await.is_err());
    }

    #[tokio::test]
    async fn test_set_style() {
        let mut surface = SnapshotSurface::new(&sample(), viewport());
        let section = surface.query(".resume-section").await.unwrap().unwrap();
        surface.set_style(section, "break-before", "page").await.unwrap();
        assert_eq!(surface.style_value(section, "break-before"), Some("page"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_font_status() {
        let snapshot = sample().with_late_font("Raleway", 700, 800);
        let surface = SnapshotSurface::new(&snapshot, viewport());

        let faces = surface.font_faces().await.unwrap();
        assert_eq!(faces[0].status, FontLoadStatus::Loading);

        tokio::time::sleep(std::time::Duration::from_millis(800)).await;
        let faces = surface.font_faces().await.unwrap();
        assert_eq!(faces[0].status, FontLoadStatus::Loaded);
    }

    #[tokio::test]
    async fn test_provider_rejects_empty_html() {
        let provider = SnapshotProvider::new(sample());
        assert!(provider.acquire("   ", viewport()).await.is_err());
        assert_eq!(provider.acquired(), 0);

        let surface = provider.acquire(&sample().to_html(), viewport()).await.unwrap();
        assert_eq!(provider.last_viewport(), Some(viewport()));
        assert!(surface.query(".compact").await.unwrap().is_some());
        provider.release(surface).await.unwrap();
        assert_eq!(provider.released(), 1);
    }

    #[test]
    fn test_snapshot_json() {
        let json = r#"{
            "document": {"bodyScrollHeight": 1000},
            "fonts": [{"family": "Raleway", "weight": 400}],
            "root": {"tag": "body", "children": [
                {"classes": ["resume-container"], "metrics": {"scrollHeight": 1200}}
            ]}
        }"#;
        let snapshot = LayoutSnapshot::from_json(json).unwrap();
        assert_eq!(snapshot.document.body_scroll_height, 1000.0);
        assert_eq!(snapshot.fonts[0].status, FontLoadStatus::Loaded);
        assert_eq!(snapshot.root.children[0].tag, "div");
        assert_eq!(snapshot.root.children[0].metrics.scroll_height, 1200.0);
        assert_eq!(snapshot.fallback_family, "serif");
    }
}
