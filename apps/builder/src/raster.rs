//! Rasterizes a preview `Canvas` into pixels.
//!
//! Shapes go straight to tiny-skia; text is drawn glyph by glyph from
//! TrueType outlines, so a usable font file is required whenever the
//! canvas carries text.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::RgbaImage;
use tiny_skia::{FillRule, Paint, PathBuilder, Pixmap, Rect, Stroke, Transform};
use ttf_parser::{Face, GlyphId, OutlineBuilder};

use crate::errors::ExportError;
use crate::layout::{Canvas, DrawCommand, Rgb, TextStyle};
use crate::templates::preview::TextMeasure;

/// Regular and bold outline fonts used for captured text.
#[derive(Debug, Clone, Default)]
pub struct FontSet {
    regular: Option<Arc<Vec<u8>>>,
    bold: Option<Arc<Vec<u8>>>,
}

const REGULAR_CANDIDATES: &[&str] = &[
    "DejaVuSans.ttf",
    "LiberationSans-Regular.ttf",
    "Arial.ttf",
    "arial.ttf",
    "FreeSans.ttf",
];

const BOLD_CANDIDATES: &[&str] = &[
    "DejaVuSans-Bold.ttf",
    "LiberationSans-Bold.ttf",
    "Arial Bold.ttf",
    "arialbd.ttf",
    "FreeSansBold.ttf",
];

impl FontSet {
    /// Loads the configured font, or searches the platform font directories.
    ///
    /// A configured path that cannot be read or parsed is an error. An empty
    /// set is returned when nothing is found on the system; capturing text
    /// with it fails later.
    pub fn load(configured: Option<&Path>) -> Result<Self, ExportError> {
        if let Some(path) = configured {
            let bytes = std::fs::read(path)?;
            if Face::parse(&bytes, 0).is_err() {
                return Err(ExportError::Capture(format!(
                    "{} is not a usable TrueType font",
                    path.display()
                )));
            }
            tracing::info!("Using capture font {}", path.display());
            let bytes = Arc::new(bytes);
            return Ok(Self {
                regular: Some(bytes.clone()),
                bold: Some(bytes),
            });
        }

        let regular = find_system_font(REGULAR_CANDIDATES);
        let bold = find_system_font(BOLD_CANDIDATES).or_else(|| regular.clone());
        let fonts = Self { regular, bold };
        if fonts.is_empty() {
            tracing::warn!("No system font found; captured templates with text will fail");
        }
        Ok(fonts)
    }

    pub fn is_empty(&self) -> bool {
        self.regular.is_none()
    }

    /// The parsed face that draws `style`.
    fn face_for(&self, style: &TextStyle) -> Result<Face<'_>, ExportError> {
        let chosen = if style.face.is_bold() {
            self.bold.as_ref().or(self.regular.as_ref())
        } else {
            self.regular.as_ref()
        };
        let data = chosen
            .ok_or_else(|| ExportError::Capture("no font available to draw text".to_string()))?;
        Face::parse(data, 0).map_err(|e| ExportError::Capture(format!("font parse failed: {e}")))
    }
}

impl TextMeasure for FontSet {
    /// Sums the same glyph advances `rasterize` moves the pen by.
    fn measure(&self, text: &str, style: &TextStyle) -> Result<f32, ExportError> {
        if text.is_empty() {
            return Ok(0.0);
        }
        let face = self.face_for(style)?;
        let scale = style.size / f32::from(face.units_per_em());
        Ok(text.chars().map(|c| advance(&face, glyph(&face, c)) * scale).sum())
    }
}

fn glyph(face: &Face<'_>, c: char) -> GlyphId {
    face.glyph_index(c).unwrap_or(GlyphId(0))
}

/// Horizontal advance in font units.
fn advance(face: &Face<'_>, glyph: GlyphId) -> f32 {
    f32::from(face.glyph_hor_advance(glyph).unwrap_or(0))
}

fn system_font_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::new();

    #[cfg(target_os = "linux")]
    {
        dirs.push(PathBuf::from("/usr/share/fonts"));
        dirs.push(PathBuf::from("/usr/local/share/fonts"));
    }

    #[cfg(target_os = "macos")]
    {
        dirs.push(PathBuf::from("/System/Library/Fonts"));
        dirs.push(PathBuf::from("/Library/Fonts"));
    }

    #[cfg(target_os = "windows")]
    {
        dirs.push(PathBuf::from(r"C:\Windows\Fonts"));
    }

    if let Ok(home) = std::env::var("HOME") {
        dirs.push(PathBuf::from(&home).join(".fonts"));
        dirs.push(PathBuf::from(home).join(".local/share/fonts"));
    }
    dirs
}

fn find_system_font(candidates: &[&str]) -> Option<Arc<Vec<u8>>> {
    for dir in system_font_dirs() {
        for name in candidates {
            if let Some(path) = find_file(&dir, name, 4) {
                if let Ok(bytes) = std::fs::read(&path) {
                    if Face::parse(&bytes, 0).is_ok() {
                        tracing::debug!("Found system font {}", path.display());
                        return Some(Arc::new(bytes));
                    }
                }
            }
        }
    }
    None
}

fn find_file(dir: &Path, name: &str, depth: usize) -> Option<PathBuf> {
    let direct = dir.join(name);
    if direct.is_file() {
        return Some(direct);
    }
    if depth == 0 {
        return None;
    }
    let entries = std::fs::read_dir(dir).ok()?;
    let mut subdirs: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .collect();
    subdirs.sort();
    subdirs
        .iter()
        .find_map(|sub| find_file(sub, name, depth - 1))
}

// ────────────────────────────────────────────────────────────────────────────
// Rendering
// ────────────────────────────────────────────────────────────────────────────

/// Draws `canvas` at `scale` device pixels per canvas pixel.
pub fn rasterize(canvas: &Canvas, scale: f32, fonts: &FontSet) -> Result<RgbaImage, ExportError> {
    if !(scale > 0.0) {
        return Err(ExportError::Capture(format!("invalid capture scale {scale}")));
    }
    let width_px = (canvas.width * scale).ceil() as u32;
    let height_px = (canvas.height * scale).ceil() as u32;
    let mut pixmap = Pixmap::new(width_px, height_px).ok_or_else(|| {
        ExportError::Capture(format!("invalid capture size {width_px}x{height_px}"))
    })?;
    let Rgb(r, g, b) = canvas.background;
    pixmap.fill(tiny_skia::Color::from_rgba8(r, g, b, 255));

    let transform = Transform::from_scale(scale, scale);
    for command in &canvas.commands {
        match command {
            DrawCommand::FillRect {
                x,
                y,
                width,
                height,
                color,
            } => {
                // Degenerate rects simply draw nothing.
                if let Some(rect) = Rect::from_xywh(*x, *y, *width, *height) {
                    pixmap.fill_rect(rect, &paint_for(*color), transform, None);
                }
            }
            DrawCommand::Line {
                x1,
                y1,
                x2,
                y2,
                width,
                color,
            } => {
                let mut pb = PathBuilder::new();
                pb.move_to(*x1, *y1);
                pb.line_to(*x2, *y2);
                if let Some(path) = pb.finish() {
                    let stroke = Stroke {
                        width: *width,
                        ..Stroke::default()
                    };
                    pixmap.stroke_path(&path, &paint_for(*color), &stroke, transform, None);
                }
            }
            DrawCommand::Text { x, y, text, style } => {
                draw_text(&mut pixmap, *x, *y, text, style, fonts, transform)?;
            }
        }
    }

    let mut image = RgbaImage::new(width_px, height_px);
    for (dst, src) in image.pixels_mut().zip(pixmap.pixels()) {
        let c = src.demultiply();
        *dst = image::Rgba([c.red(), c.green(), c.blue(), c.alpha()]);
    }
    Ok(image)
}

fn paint_for(color: Rgb) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(color.0, color.1, color.2, 255);
    paint.anti_alias = true;
    paint
}

fn draw_text(
    pixmap: &mut Pixmap,
    x: f32,
    baseline: f32,
    text: &str,
    style: &TextStyle,
    fonts: &FontSet,
    transform: Transform,
) -> Result<(), ExportError> {
    if text.is_empty() || style.size <= 0.0 {
        return Ok(());
    }
    let face = fonts.face_for(style)?;

    let scale = style.size / f32::from(face.units_per_em());
    let paint = paint_for(style.color);
    let mut pen_x = x;

    for c in text.chars() {
        let id = glyph(&face, c);
        let mut builder = GlyphPathBuilder::new(pen_x, baseline, scale);
        if face.outline_glyph(id, &mut builder).is_some() {
            if let Some(path) = builder.finish() {
                pixmap.fill_path(&path, &paint, FillRule::Winding, transform, None);
            }
        }
        pen_x += advance(&face, id) * scale;
    }
    Ok(())
}

/// Maps font units (y up) onto canvas pixels (y down) at a glyph origin.
struct GlyphPathBuilder {
    builder: PathBuilder,
    origin_x: f32,
    origin_y: f32,
    scale: f32,
}

impl GlyphPathBuilder {
    fn new(origin_x: f32, origin_y: f32, scale: f32) -> Self {
        Self {
            builder: PathBuilder::new(),
            origin_x,
            origin_y,
            scale,
        }
    }

    fn px(&self, x: f32) -> f32 {
        self.origin_x + x * self.scale
    }

    fn py(&self, y: f32) -> f32 {
        self.origin_y - y * self.scale
    }

    fn finish(self) -> Option<tiny_skia::Path> {
        self.builder.finish()
    }
}

impl OutlineBuilder for GlyphPathBuilder {
    fn move_to(&mut self, x: f32, y: f32) {
        let (x, y) = (self.px(x), self.py(y));
        self.builder.move_to(x, y);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        let (x, y) = (self.px(x), self.py(y));
        self.builder.line_to(x, y);
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        let (x1, y1, x, y) = (self.px(x1), self.py(y1), self.px(x), self.py(y));
        self.builder.quad_to(x1, y1, x, y);
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        let (x1, y1) = (self.px(x1), self.py(y1));
        let (x2, y2) = (self.px(x2), self.py(y2));
        let (x, y) = (self.px(x), self.py(y));
        self.builder.cubic_to(x1, y1, x2, y2, x, y);
    }

    fn close(&mut self) {
        self.builder.close();
    }
}
