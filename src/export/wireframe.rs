//! Wireframe PDF rasterizer.
//!
//! Draws the resume structure as labelled boxes instead of rendering real
//! content. Boxes are laid out the way a print engine fragments the
//! document: units stack top to bottom inside the page margins, a section
//! styled `break-before: page` starts on a fresh page, and anything running
//! past the bottom margin continues on the next page.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};

use crate::error::Result;
use crate::model::{mm_to_pt, px_to_mm, Canvas, Margins, PX_PER_MM};
use crate::surface::{
    vertical_margins, ElementId, RasterJob, Rasterizer, RenderingSurface, Selectors,
};

const LABEL_SIZE: f32 = 8.0;
const LABEL_INSET_PT: f32 = 3.0;

/// One box to draw.
#[derive(Debug, Clone, PartialEq)]
struct Unit {
    label: String,
    height_px: f64,
    break_before: bool,
}

/// A box fragment placed on a page, in pixels from the top of the content area.
#[derive(Debug, Clone, PartialEq)]
struct Placed {
    label: String,
    top_px: f64,
    height_px: f64,
}

/// [`Rasterizer`] that writes a structural wireframe PDF with `lopdf`.
///
/// The structure is located with the job's [`Selectors`], the same set the
/// exporter measured and planned with.
#[derive(Debug, Clone, Copy, Default)]
pub struct WireframeRasterizer;

impl WireframeRasterizer {
    pub fn new() -> Self {
        Self
    }

    async fn collect_units<S: RenderingSurface>(
        &self,
        surface: &S,
        selectors: &Selectors,
    ) -> Result<Vec<Unit>> {
        let Some(container) = surface.query(&selectors.container).await? else {
            let document = surface.document_metrics().await?;
            return Ok(vec![Unit {
                label: "document".into(),
                height_px: document.max_height(),
                break_before: false,
            }]);
        };

        let mut units = Vec::new();
        let header = match surface
            .query_within(container, &selectors.header)
            .await?
            .first()
        {
            Some(&header) => Some(header),
            None => surface.query(&selectors.header).await?,
        };
        if let Some(header) = header {
            units.push(Unit {
                label: "header".into(),
                height_px: outer_height(surface, header).await?,
                break_before: false,
            });
        }

        let sections = surface.query_within(container, &selectors.section).await?;
        for (index, &section) in sections.iter().enumerate() {
            let break_before = surface
                .computed_style(section, "break-before")
                .await?
                .is_some_and(|v| v.trim() == "page");
            units.push(Unit {
                label: section_label(surface, selectors, section, index).await?,
                height_px: outer_height(surface, section).await?,
                break_before,
            });
        }
        Ok(units)
    }
}

async fn section_label<S: RenderingSurface>(
    surface: &S,
    selectors: &Selectors,
    section: ElementId,
    index: usize,
) -> Result<String> {
    let heading = surface.query_within(section, &selectors.heading).await?;
    if let Some(&heading) = heading.first() {
        let text = surface.text_content(heading).await?;
        let text = text.trim();
        if !text.is_empty() {
            return Ok(text.to_string());
        }
    }
    Ok(format!("section-{}", index))
}

async fn outer_height<S: RenderingSurface>(surface: &S, element: ElementId) -> Result<f64> {
    let metrics = surface.metrics(element).await?;
    let (top, bottom) = vertical_margins(surface, element).await?;
    Ok(metrics.block_height() + top + bottom)
}

/// Fragment units onto pages of `usable_px` content height.
fn paginate(units: &[Unit], usable_px: f64) -> Vec<Vec<Placed>> {
    let mut pages: Vec<Vec<Placed>> = vec![Vec::new()];
    let mut cursor = 0.0;

    for unit in units {
        if unit.break_before && cursor > 0.0 {
            pages.push(Vec::new());
            cursor = 0.0;
        }

        let mut remaining = unit.height_px;
        loop {
            let space = usable_px - cursor;
            if remaining <= space || usable_px <= 0.0 {
                push_placed(&mut pages, unit, cursor, remaining);
                cursor += remaining;
                break;
            }
            if space > 0.0 {
                push_placed(&mut pages, unit, cursor, space);
                remaining -= space;
            }
            pages.push(Vec::new());
            cursor = 0.0;
        }
    }
    pages
}

fn push_placed(pages: &mut [Vec<Placed>], unit: &Unit, top_px: f64, height_px: f64) {
    if let Some(page) = pages.last_mut() {
        page.push(Placed {
            label: unit.label.clone(),
            top_px,
            height_px,
        });
    }
}

/// Stack units on one page without fragmentation.
fn stack(units: &[Unit]) -> Vec<Placed> {
    let mut cursor = 0.0;
    units
        .iter()
        .map(|unit| {
            let placed = Placed {
                label: unit.label.clone(),
                top_px: cursor,
                height_px: unit.height_px,
            };
            cursor += unit.height_px;
            placed
        })
        .collect()
}

fn px_to_pt(px: f64) -> f32 {
    mm_to_pt(px_to_mm(px)) as f32
}

fn ascii_label(label: &str) -> String {
    label
        .chars()
        .map(|c| if c.is_ascii() && !c.is_ascii_control() { c } else { '?' })
        .collect()
}

fn page_operations(
    placed: &[Placed],
    width_pt: f32,
    height_pt: f32,
    margins: &Margins,
) -> Vec<Operation> {
    let left = mm_to_pt(margins.left) as f32;
    let top = height_pt - mm_to_pt(margins.top) as f32;
    let box_width = width_pt - left - mm_to_pt(margins.right) as f32;

    let mut ops = vec![Operation::new("w", vec![0.5f32.into()])];
    for item in placed {
        let h = px_to_pt(item.height_px);
        let y = top - px_to_pt(item.top_px) - h;
        ops.push(Operation::new(
            "re",
            vec![left.into(), y.into(), box_width.into(), h.into()],
        ));
        ops.push(Operation::new("S", vec![]));

        if h >= LABEL_SIZE + LABEL_INSET_PT {
            ops.push(Operation::new("BT", vec![]));
            ops.push(Operation::new("Tf", vec!["F1".into(), LABEL_SIZE.into()]));
            ops.push(Operation::new(
                "Td",
                vec![
                    (left + LABEL_INSET_PT).into(),
                    (y + h - LABEL_SIZE - LABEL_INSET_PT).into(),
                ],
            ));
            ops.push(Operation::new(
                "Tj",
                vec![Object::string_literal(ascii_label(&item.label))],
            ));
            ops.push(Operation::new("ET", vec![]));
        }
    }
    ops
}

fn write_pdf(
    pages: &[Vec<Placed>],
    width_mm: f64,
    height_mm: f64,
    margins: &Margins,
) -> Result<Vec<u8>> {
    let width_pt = mm_to_pt(width_mm) as f32;
    let height_pt = mm_to_pt(height_mm) as f32;

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for placed in pages {
        let content = Content {
            operations: page_operations(placed, width_pt, height_pt, margins),
        };
        let content_id: ObjectId =
            doc.add_object(Stream::new(dictionary! {}, content.encode()?));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), width_pt.into(), height_pt.into()],
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)?;
    Ok(bytes)
}

impl Rasterizer for WireframeRasterizer {
    async fn rasterize<S: RenderingSurface>(
        &self,
        surface: &S,
        job: &RasterJob,
    ) -> Result<Vec<u8>> {
        let units = self.collect_units(surface, &job.selectors).await?;
        let margins = job.margins;

        let (pages, width_mm, height_mm) = match job.canvas {
            Canvas::Paged(geometry) => {
                let usable_px = (geometry.page_height_mm - margins.vertical()) * PX_PER_MM;
                (
                    paginate(&units, usable_px),
                    geometry.page_width_mm,
                    geometry.page_height_mm,
                )
            }
            Canvas::Continuous {
                width_mm,
                height_mm,
            } => (vec![stack(&units)], width_mm, height_mm),
        };

        log::debug!(
            "Wireframe: {} units on {} page(s) of {:.1}x{:.1}mm (css page size: {})",
            units.len(),
            pages.len(),
            width_mm,
            height_mm,
            job.prefer_css_page_size
        );
        write_pdf(&pages, width_mm, height_mm, &margins)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(label: &str, height_px: f64) -> Unit {
        Unit {
            label: label.into(),
            height_px,
            break_before: false,
        }
    }

    #[test]
    fn test_paginate_stacks_on_one_page() {
        let pages = paginate(&[unit("header", 100.0), unit("a", 300.0)], 1000.0);
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0][1].top_px, 100.0);
    }

    #[test]
    fn test_paginate_break_before() {
        let mut second = unit("b", 300.0);
        second.break_before = true;
        let pages = paginate(&[unit("a", 300.0), second], 1000.0);
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[1][0].top_px, 0.0);
    }

    #[test]
    fn test_paginate_break_before_on_empty_page_is_ignored() {
        let mut first = unit("a", 300.0);
        first.break_before = true;
        let pages = paginate(&[first], 1000.0);
        assert_eq!(pages.len(), 1);
    }

    #[test]
    fn test_paginate_fragments_overflow() {
        let pages = paginate(&[unit("a", 700.0), unit("b", 600.0)], 1000.0);
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0][1].height_px, 300.0);
        assert_eq!(pages[1][0].height_px, 300.0);
    }

    #[test]
    fn test_paginate_tall_unit_spans_pages() {
        let pages = paginate(&[unit("document", 2500.0)], 1000.0);
        assert_eq!(pages.len(), 3);
        assert_eq!(pages[2][0].height_px, 500.0);
    }

    #[test]
    fn test_ascii_label() {
        assert_eq!(ascii_label("Expérience"), "Exp?rience");
    }

    #[test]
    fn test_write_pdf_page_count() {
        let pages = paginate(&[unit("a", 1500.0)], 1000.0);
        let bytes = write_pdf(&pages, 210.0, 297.0, &Margins::default()).unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 2);
    }
}
