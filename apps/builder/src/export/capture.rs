//! Capture surfaces: whatever can hand the capture strategies a screenshot of a
//! rendered template.

use std::sync::Arc;

use image::RgbaImage;

use crate::errors::ExportError;
use crate::raster::{rasterize, FontSet};
use crate::store::Snapshot;
use crate::templates::render_preview;

/// Produces a pixel image of the snapshot's template at a viewport width.
///
/// `scale` is device pixels per CSS pixel. Implementations are called from a
/// blocking thread.
pub trait CaptureSurface: Send + Sync {
    fn capture(
        &self,
        snapshot: &Snapshot,
        viewport_width: f32,
        scale: f32,
    ) -> Result<RgbaImage, ExportError>;
}

/// Renders the template preview and rasterizes it in-process.
pub struct PreviewSurface {
    fonts: Arc<FontSet>,
}

impl PreviewSurface {
    pub fn new(fonts: Arc<FontSet>) -> Self {
        Self { fonts }
    }
}

impl CaptureSurface for PreviewSurface {
    fn capture(
        &self,
        snapshot: &Snapshot,
        viewport_width: f32,
        scale: f32,
    ) -> Result<RgbaImage, ExportError> {
        let canvas = render_preview(
            &snapshot.document,
            snapshot.template,
            viewport_width,
            &*self.fonts,
        )?;
        tracing::debug!(
            width = canvas.width,
            height = canvas.height,
            commands = canvas.commands.len(),
            "Preview rendered"
        );
        rasterize(&canvas, scale, &self.fonts)
    }
}
