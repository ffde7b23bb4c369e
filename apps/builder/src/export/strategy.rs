//! The three ways a template becomes PDF bytes.
//!
//! - `RasterStrategy`: one screenshot at the template's viewport, one page.
//!   Anything below the page edge is clipped.
//! - `PaginatedStrategy`: one screenshot at a wide viewport, sliced into
//!   page-height bands. Nothing is clipped.
//! - `VectorStrategy`: the paginating emitter, serialized as real text.
//!
//! All CPU-bound work runs inside `tokio::task::spawn_blocking`.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use image::{imageops, DynamicImage, RgbaImage};

use crate::errors::ExportError;
use crate::layout::emitter::pt_to_mm;
use crate::layout::{emit_document, EmitterConfig, PageSize};
use crate::pdf::{write_image_pdf, write_vector_pdf, ImagePage};
use crate::export::capture::CaptureSurface;
use crate::store::Snapshot;
use crate::templates::StrategyKind;

/// Virtual viewport the paginated capture renders at.
pub const PAGINATED_VIEWPORT_PX: f32 = 1200.0;
/// Share of the page width the paginated capture occupies.
pub const PAGINATED_WIDTH_FRACTION: f32 = 0.9;
/// Top (and bottom) page margin of the paginated capture, in points.
pub const PAGINATED_MARGIN_PT: f32 = 20.0;

#[async_trait]
pub trait ExportStrategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    async fn render(&self, snapshot: Snapshot) -> Result<Bytes, ExportError>;
}

async fn run_blocking<F>(label: &'static str, work: F) -> Result<Bytes, ExportError>
where
    F: FnOnce() -> Result<Vec<u8>, ExportError> + Send + 'static,
{
    let bytes = tokio::task::spawn_blocking(work).await.map_err(|e| {
        ExportError::Internal(anyhow::anyhow!("spawn_blocking failed in {label} export: {e}"))
    })??;
    Ok(Bytes::from(bytes))
}

fn flatten(image: RgbaImage) -> image::RgbImage {
    DynamicImage::ImageRgba8(image).to_rgb8()
}

// ────────────────────────────────────────────────────────────────────────────
// Raster
// ────────────────────────────────────────────────────────────────────────────

pub struct RasterStrategy {
    surface: Arc<dyn CaptureSurface>,
    scale: f32,
    page: PageSize,
}

impl RasterStrategy {
    pub fn new(surface: Arc<dyn CaptureSurface>, scale: f32, page: PageSize) -> Self {
        Self {
            surface,
            scale,
            page,
        }
    }
}

#[async_trait]
impl ExportStrategy for RasterStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Raster
    }

    async fn render(&self, snapshot: Snapshot) -> Result<Bytes, ExportError> {
        let surface = Arc::clone(&self.surface);
        let (scale, page) = (self.scale, self.page);
        let viewport = snapshot.template.meta().viewport_width as f32;

        run_blocking("raster", move || {
            let image = surface.capture(&snapshot, viewport, scale)?;
            let (w, h) = image.dimensions();
            if w == 0 || h == 0 {
                return Err(ExportError::Capture("captured image is empty".to_string()));
            }
            let height = page.width * h as f32 / w as f32;
            if height > page.height {
                tracing::warn!(
                    content_mm = height,
                    page_mm = page.height,
                    "Raster export clips content below the first page"
                );
            }
            let pages = [ImagePage {
                image: flatten(image),
                x: 0.0,
                y: 0.0,
                width: page.width,
                height,
            }];
            write_image_pdf(&pages, page)
        })
        .await
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Paginated capture
// ────────────────────────────────────────────────────────────────────────────

pub struct PaginatedStrategy {
    surface: Arc<dyn CaptureSurface>,
    scale: f32,
    page: PageSize,
}

impl PaginatedStrategy {
    pub fn new(surface: Arc<dyn CaptureSurface>, scale: f32, page: PageSize) -> Self {
        Self {
            surface,
            scale,
            page,
        }
    }
}

/// Cuts a capture into page bands. `slice_px` is the band height in pixels.
fn slice_pages(image: &RgbaImage, slice_px: u32) -> Vec<RgbaImage> {
    let (w, h) = image.dimensions();
    (0..h)
        .step_by(slice_px as usize)
        .map(|top| imageops::crop_imm(image, 0, top, w, slice_px.min(h - top)).to_image())
        .collect()
}

#[async_trait]
impl ExportStrategy for PaginatedStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Paginated
    }

    async fn render(&self, snapshot: Snapshot) -> Result<Bytes, ExportError> {
        let surface = Arc::clone(&self.surface);
        let (scale, page) = (self.scale, self.page);

        run_blocking("paginated", move || {
            let image = surface.capture(&snapshot, PAGINATED_VIEWPORT_PX, scale)?;
            let (w, h) = image.dimensions();
            if w == 0 || h == 0 {
                return Err(ExportError::Capture("captured image is empty".to_string()));
            }

            let margin = pt_to_mm(PAGINATED_MARGIN_PT);
            let content_width = page.width * PAGINATED_WIDTH_FRACTION;
            let x = (page.width - content_width) / 2.0;
            let px_per_mm = w as f32 / content_width;
            let slice_px = (((page.height - 2.0 * margin) * px_per_mm).floor() as u32).max(1);

            let pages: Vec<ImagePage> = slice_pages(&image, slice_px)
                .into_iter()
                .map(|band| {
                    let height = band.height() as f32 / px_per_mm;
                    ImagePage {
                        image: flatten(band),
                        x,
                        y: margin,
                        width: content_width,
                        height,
                    }
                })
                .collect();
            tracing::debug!(pages = pages.len(), slice_px, "Capture sliced");
            write_image_pdf(&pages, page)
        })
        .await
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Vector
// ────────────────────────────────────────────────────────────────────────────

pub struct VectorStrategy {
    config: Arc<EmitterConfig>,
}

impl VectorStrategy {
    pub fn new(config: Arc<EmitterConfig>) -> Self {
        Self { config }
    }
}

#[async_trait]
impl ExportStrategy for VectorStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Vector
    }

    async fn render(&self, snapshot: Snapshot) -> Result<Bytes, ExportError> {
        let config = Arc::clone(&self.config);

        run_blocking("vector", move || {
            let paged = emit_document(&snapshot.document, &config)?;
            tracing::debug!(pages = paged.pages.len(), "Document emitted");
            write_vector_pdf(&paged)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::resume::{ExperienceEntry, ResumeDocument};
    use crate::templates::TemplateId;
    use lopdf::Document;

    /// Returns a solid image `height_px` tall at the requested viewport.
    struct SolidSurface {
        height_px: u32,
    }

    impl CaptureSurface for SolidSurface {
        fn capture(
            &self,
            _snapshot: &Snapshot,
            viewport_width: f32,
            scale: f32,
        ) -> Result<RgbaImage, ExportError> {
            let width = (viewport_width * scale) as u32;
            Ok(RgbaImage::from_pixel(
                width,
                self.height_px,
                image::Rgba([30, 60, 90, 255]),
            ))
        }
    }

    fn snapshot(template: TemplateId) -> Snapshot {
        let mut doc = ResumeDocument::default();
        doc.personal.first_name = "Jane".to_string();
        doc.experience.push(ExperienceEntry {
            position: "Engineer".to_string(),
            description: "Maintained the ledger service. ".repeat(300),
            ..ExperienceEntry::default()
        });
        Snapshot {
            document: Arc::new(doc),
            template,
        }
    }

    fn pages(bytes: &[u8]) -> usize {
        Document::load_mem(bytes).unwrap().get_pages().len()
    }

    #[tokio::test]
    async fn test_raster_is_always_one_page() {
        let strategy = RasterStrategy::new(
            Arc::new(SolidSurface { height_px: 20_000 }),
            1.0,
            PageSize::A4,
        );
        let bytes = strategy.render(snapshot(TemplateId::Template1)).await.unwrap();
        assert_eq!(pages(&bytes), 1);
    }

    #[tokio::test]
    async fn test_paginated_slices_tall_captures() {
        // 1200 px over 189 mm is ~6.35 px/mm; a printable band of ~282.9 mm is
        // ~1796 px, so 9000 px needs 6 pages.
        let strategy = PaginatedStrategy::new(
            Arc::new(SolidSurface { height_px: 9000 }),
            1.0,
            PageSize::A4,
        );
        let bytes = strategy.render(snapshot(TemplateId::Template3)).await.unwrap();
        assert_eq!(pages(&bytes), 6);
    }

    #[tokio::test]
    async fn test_paginated_short_capture_is_one_page() {
        let strategy = PaginatedStrategy::new(
            Arc::new(SolidSurface { height_px: 300 }),
            1.0,
            PageSize::A4,
        );
        let bytes = strategy.render(snapshot(TemplateId::Template4)).await.unwrap();
        assert_eq!(pages(&bytes), 1);
    }

    #[test]
    fn test_slices_cover_every_row_once() {
        let image = RgbaImage::new(10, 25);
        let bands = slice_pages(&image, 10);
        let heights: Vec<u32> = bands.iter().map(|b| b.height()).collect();
        assert_eq!(heights, vec![10, 10, 5]);
    }

    #[tokio::test]
    async fn test_vector_output_spans_pages() {
        let strategy = VectorStrategy::new(Arc::new(EmitterConfig::default()));
        let bytes = strategy.render(snapshot(TemplateId::Template6)).await.unwrap();
        assert!(pages(&bytes) >= 2);
    }

    #[tokio::test]
    async fn test_empty_capture_fails() {
        let strategy = RasterStrategy::new(
            Arc::new(SolidSurface { height_px: 0 }),
            1.0,
            PageSize::A4,
        );
        assert!(matches!(
            strategy.render(snapshot(TemplateId::Template1)).await,
            Err(ExportError::Capture(_))
        ));
    }
}
