//! Intermediate draw-command model shared by the emitter, the preview
//! renderers, the PDF writer and the rasterizer.
//!
//! Coordinates are top-left based with `y` growing downward; text `y` is the
//! baseline. Paged output is in millimetres with font sizes in points; preview
//! canvases are in CSS pixels with font sizes in pixels.

use serde::{Deserialize, Serialize};

use crate::layout::font_metrics::FontFace;

/// An sRGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const WHITE: Rgb = Rgb(0xFF, 0xFF, 0xFF);
    pub const BLACK: Rgb = Rgb(0x00, 0x00, 0x00);

    /// Builds a colour from a `0xRRGGBB` literal.
    pub const fn hex(value: u32) -> Rgb {
        Rgb(
            ((value >> 16) & 0xFF) as u8,
            ((value >> 8) & 0xFF) as u8,
            (value & 0xFF) as u8,
        )
    }

    /// Components scaled to 0.0–1.0, as PDF colour operators expect.
    pub fn to_unit(self) -> [f32; 3] {
        [
            f32::from(self.0) / 255.0,
            f32::from(self.1) / 255.0,
            f32::from(self.2) / 255.0,
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TextStyle {
    pub face: FontFace,
    pub size: f32,
    pub color: Rgb,
}

impl TextStyle {
    pub const fn new(face: FontFace, size: f32, color: Rgb) -> Self {
        Self { face, size, color }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DrawCommand {
    /// Text with its baseline starting at (`x`, `y`).
    Text {
        x: f32,
        y: f32,
        text: String,
        style: TextStyle,
    },
    FillRect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        color: Rgb,
    },
    Line {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        width: f32,
        color: Rgb,
    },
}

impl DrawCommand {
    pub fn text(&self) -> Option<&str> {
        match self {
            DrawCommand::Text { text, .. } => Some(text),
            _ => None,
        }
    }
}

/// Page dimensions in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSize {
    pub width: f32,
    pub height: f32,
}

impl PageSize {
    /// ISO A4 portrait.
    pub const A4: PageSize = PageSize {
        width: 210.0,
        height: 297.0,
    };
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub commands: Vec<DrawCommand>,
}

impl Page {
    /// Text runs on this page in drawing order.
    #[allow(dead_code)]
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().filter_map(DrawCommand::text)
    }
}

/// Fixed-size pages of draw commands, ready for serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PagedDocument {
    pub page_size: PageSize,
    pub pages: Vec<Page>,
}

/// A single unbounded surface, the shape a template preview is drawn on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Canvas {
    pub width: f32,
    pub height: f32,
    pub background: Rgb,
    pub commands: Vec<DrawCommand>,
}
