//! PDF serialization for both export families.
//!
//! - `write_vector_pdf` turns a `PagedDocument` into content-stream operators
//!   using the non-embedded base-14 fonts.
//! - `write_image_pdf` embeds one JPEG per page for the capture strategies.
//!
//! Page coordinates arrive top-left in millimetres; PDF user space is
//! bottom-left in points, so every y is flipped against the page height.

use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream, StringFormat};

use crate::errors::ExportError;
use crate::layout::font_metrics::{get_metrics, FontFace};
use crate::layout::page::{DrawCommand, PageSize, PagedDocument, Rgb, TextStyle};

const PT_PER_MM: f32 = 72.0 / 25.4;
const JPEG_QUALITY: u8 = 92;
const PRODUCER: &str = "builder";

fn pdf_err(err: impl std::fmt::Display) -> ExportError {
    ExportError::Pdf(err.to_string())
}

/// Millimetre → point conversion for one page.
struct PageSpace {
    height_mm: f32,
}

impl PageSpace {
    fn x(&self, mm: f32) -> f32 {
        mm * PT_PER_MM
    }

    /// Flips a top-down millimetre y into bottom-up points.
    fn y(&self, mm: f32) -> f32 {
        (self.height_mm - mm) * PT_PER_MM
    }

    fn len(&self, mm: f32) -> f32 {
        mm * PT_PER_MM
    }
}

/// Skeleton shared by both writers: page tree, catalog and info dictionary.
struct PdfBuilder {
    doc: Document,
    pages_id: ObjectId,
    kids: Vec<Object>,
    media_box: Vec<Object>,
}

impl PdfBuilder {
    fn new(page_size: PageSize) -> Self {
        let mut doc = Document::with_version("1.4");
        let pages_id = doc.new_object_id();
        Self {
            doc,
            pages_id,
            kids: Vec::new(),
            media_box: vec![
                0.into(),
                0.into(),
                (page_size.width * PT_PER_MM).into(),
                (page_size.height * PT_PER_MM).into(),
            ],
        }
    }

    fn add_page(&mut self, ops: Vec<Operation>, resources: ObjectId) -> Result<(), ExportError> {
        let content = Content { operations: ops };
        let bytes = content.encode().map_err(pdf_err)?;
        let content_id = self.doc.add_object(Stream::new(dictionary! {}, bytes));
        let page_id = self.doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "Contents" => content_id,
            "Resources" => resources,
        });
        self.kids.push(page_id.into());
        Ok(())
    }

    fn finish(mut self, compress: bool) -> Result<Vec<u8>, ExportError> {
        let count = self.kids.len() as i64;
        self.doc.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Count" => count,
                "Kids" => self.kids,
                "MediaBox" => self.media_box,
            }),
        );
        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        self.doc.trailer.set("Root", catalog_id);
        let info_id = self.doc.add_object(dictionary! {
            "Title" => Object::string_literal("Resume"),
            "Producer" => Object::string_literal(PRODUCER),
        });
        self.doc.trailer.set("Info", info_id);

        if compress {
            self.doc.compress();
        }
        let mut buffer = Vec::new();
        self.doc.save_to(&mut buffer).map_err(pdf_err)?;
        Ok(buffer)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Vector output
// ────────────────────────────────────────────────────────────────────────────

/// Serializes laid-out pages to PDF bytes. Output is deterministic for equal input.
pub fn write_vector_pdf(paged: &PagedDocument) -> Result<Vec<u8>, ExportError> {
    let mut builder = PdfBuilder::new(paged.page_size);

    let used: Vec<FontFace> = FontFace::ALL
        .into_iter()
        .filter(|face| {
            paged.pages.iter().flat_map(|p| &p.commands).any(
                |c| matches!(c, DrawCommand::Text { style, .. } if style.face == *face),
            )
        })
        .collect();

    let mut fonts = lopdf::Dictionary::new();
    for face in used {
        let font_id = builder.doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => face.base_font(),
            "Encoding" => "WinAnsiEncoding",
        });
        fonts.set(face.resource_name(), font_id);
    }
    let resources = builder.doc.add_object(dictionary! { "Font" => fonts });

    let space = PageSpace {
        height_mm: paged.page_size.height,
    };
    for page in &paged.pages {
        let ops = page_operations(&page.commands, &space)?;
        builder.add_page(ops, resources)?;
    }

    builder.finish(true)
}

/// Graphics-state tracker so colour and font operators are only emitted on change.
#[derive(Default)]
struct GraphicsState {
    fill: Option<Rgb>,
    stroke: Option<Rgb>,
    font: Option<(FontFace, f32)>,
}

impl GraphicsState {
    fn set_fill(&mut self, color: Rgb, ops: &mut Vec<Operation>) {
        if self.fill != Some(color) {
            let [r, g, b] = color.to_unit();
            ops.push(Operation::new("rg", vec![r.into(), g.into(), b.into()]));
            self.fill = Some(color);
        }
    }

    fn set_stroke(&mut self, color: Rgb, ops: &mut Vec<Operation>) {
        if self.stroke != Some(color) {
            let [r, g, b] = color.to_unit();
            ops.push(Operation::new("RG", vec![r.into(), g.into(), b.into()]));
            self.stroke = Some(color);
        }
    }

    fn set_font(&mut self, style: &TextStyle, ops: &mut Vec<Operation>) {
        if self.font != Some((style.face, style.size)) {
            ops.push(Operation::new(
                "Tf",
                vec![style.face.resource_name().into(), style.size.into()],
            ));
            self.font = Some((style.face, style.size));
        }
    }
}

fn page_operations(
    commands: &[DrawCommand],
    space: &PageSpace,
) -> Result<Vec<Operation>, ExportError> {
    let mut ops = Vec::with_capacity(commands.len() * 4);
    let mut state = GraphicsState::default();

    for command in commands {
        match command {
            DrawCommand::FillRect {
                x,
                y,
                width,
                height,
                color,
            } => {
                state.set_fill(*color, &mut ops);
                ops.push(Operation::new(
                    "re",
                    vec![
                        space.x(*x).into(),
                        space.y(y + height).into(),
                        space.len(*width).into(),
                        space.len(*height).into(),
                    ],
                ));
                ops.push(Operation::new("f", vec![]));
            }
            DrawCommand::Line {
                x1,
                y1,
                x2,
                y2,
                width,
                color,
            } => {
                state.set_stroke(*color, &mut ops);
                ops.push(Operation::new("w", vec![space.len(*width).into()]));
                ops.push(Operation::new("m", vec![space.x(*x1).into(), space.y(*y1).into()]));
                ops.push(Operation::new("l", vec![space.x(*x2).into(), space.y(*y2).into()]));
                ops.push(Operation::new("S", vec![]));
            }
            DrawCommand::Text { x, y, text, style } => {
                let encoded = get_metrics(style.face).encode(text)?;
                state.set_fill(style.color, &mut ops);
                ops.push(Operation::new("BT", vec![]));
                state.set_font(style, &mut ops);
                ops.push(Operation::new("Td", vec![space.x(*x).into(), space.y(*y).into()]));
                ops.push(Operation::new(
                    "Tj",
                    vec![Object::String(encoded, StringFormat::Literal)],
                ));
                ops.push(Operation::new("ET", vec![]));
            }
        }
    }
    Ok(ops)
}

// ────────────────────────────────────────────────────────────────────────────
// Image output
// ────────────────────────────────────────────────────────────────────────────

/// One raster placed on a page; placement is top-left based, in millimetres.
pub struct ImagePage {
    pub image: RgbImage,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Embeds each image as a JPEG on its own page.
pub fn write_image_pdf(pages: &[ImagePage], page_size: PageSize) -> Result<Vec<u8>, ExportError> {
    let mut builder = PdfBuilder::new(page_size);
    let space = PageSpace {
        height_mm: page_size.height,
    };

    for page in pages {
        let (w, h) = page.image.dimensions();
        if w == 0 || h == 0 {
            return Err(ExportError::Capture("captured image is empty".to_string()));
        }
        let mut jpeg = Vec::new();
        JpegEncoder::new_with_quality(&mut jpeg, JPEG_QUALITY).encode_image(&page.image)?;

        let image_id = builder.doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => i64::from(w),
                "Height" => i64::from(h),
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
                "Filter" => "DCTDecode",
            },
            jpeg,
        ));
        let resources = builder.doc.add_object(dictionary! {
            "XObject" => dictionary! { "Im1" => image_id },
        });

        let ops = vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    space.len(page.width).into(),
                    0.into(),
                    0.into(),
                    space.len(page.height).into(),
                    space.x(page.x).into(),
                    space.y(page.y + page.height).into(),
                ],
            ),
            Operation::new("Do", vec!["Im1".into()]),
            Operation::new("Q", vec![]),
        ];
        builder.add_page(ops, resources)?;
    }

    builder.finish(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::emitter::{emit_document, EmitterConfig};
    use crate::layout::page::Page;
    use crate::models::resume::{ExperienceEntry, ResumeDocument};

    fn sample() -> ResumeDocument {
        let mut doc = ResumeDocument::default();
        doc.personal.first_name = "Jane".to_string();
        doc.personal.last_name = "Doe".to_string();
        doc.personal.summary = "Systems engineer. ".repeat(40);
        doc.experience.push(ExperienceEntry {
            position: "Engineer".to_string(),
            company: "Acme".to_string(),
            duration: "2020 – 2024".to_string(),
            description: "Shipped things. ".repeat(400),
        });
        doc
    }

    fn page_count(bytes: &[u8]) -> usize {
        Document::load_mem(bytes).unwrap().get_pages().len()
    }

    #[test]
    fn test_vector_pdf_has_one_pdf_page_per_layout_page() {
        let paged = emit_document(&sample(), &EmitterConfig::default()).unwrap();
        assert!(paged.pages.len() >= 2);
        let bytes = write_vector_pdf(&paged).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.4"));
        assert_eq!(page_count(&bytes), paged.pages.len());
    }

    #[test]
    fn test_vector_pdf_is_byte_identical_across_runs() {
        let config = EmitterConfig::default();
        let a = write_vector_pdf(&emit_document(&sample(), &config).unwrap()).unwrap();
        let b = write_vector_pdf(&emit_document(&sample(), &config).unwrap()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_vector_text_is_extractable() {
        let paged = emit_document(&sample(), &EmitterConfig::default()).unwrap();
        let bytes = write_vector_pdf(&paged).unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        let first_page = *doc.get_pages().values().next().unwrap();
        let content = doc.get_and_decode_page_content(first_page).unwrap();
        let shown: Vec<Vec<u8>> = content
            .operations
            .iter()
            .filter(|op| op.operator == "Tj")
            .filter_map(|op| op.operands.first())
            .filter_map(|o| o.as_str().ok().map(<[u8]>::to_vec))
            .collect();
        assert!(shown.iter().any(|s| s == b"Jane Doe"));
        assert!(shown.iter().any(|s| s == b"Experience"));
    }

    #[test]
    fn test_state_tracking_skips_redundant_font_changes() {
        let style = TextStyle::new(FontFace::Helvetica, 10.0, Rgb::BLACK);
        let commands: Vec<DrawCommand> = (0..5)
            .map(|i| DrawCommand::Text {
                x: 10.0,
                y: 10.0 + i as f32 * 5.0,
                text: format!("line {i}"),
                style,
            })
            .collect();
        let ops = page_operations(&commands, &PageSpace { height_mm: 297.0 }).unwrap();
        assert_eq!(ops.iter().filter(|o| o.operator == "Tf").count(), 1);
        assert_eq!(ops.iter().filter(|o| o.operator == "rg").count(), 1);
        assert_eq!(ops.iter().filter(|o| o.operator == "Tj").count(), 5);
    }

    #[test]
    fn test_y_axis_is_flipped_to_points() {
        let space = PageSpace { height_mm: 297.0 };
        assert!((space.y(297.0)).abs() < 1e-3);
        assert!((space.y(0.0) - 841.89).abs() < 0.01);
    }

    #[test]
    fn test_unencodable_text_fails_serialization() {
        let paged = PagedDocument {
            page_size: PageSize::A4,
            pages: vec![Page {
                commands: vec![DrawCommand::Text {
                    x: 0.0,
                    y: 10.0,
                    text: "日本".to_string(),
                    style: TextStyle::new(FontFace::Helvetica, 10.0, Rgb::BLACK),
                }],
            }],
        };
        assert!(matches!(
            write_vector_pdf(&paged),
            Err(ExportError::Emission(_))
        ));
    }

    #[test]
    fn test_image_pdf_embeds_one_image_per_page() {
        let pages: Vec<ImagePage> = (0..3)
            .map(|_| ImagePage {
                image: RgbImage::from_pixel(40, 60, image::Rgb([200, 10, 10])),
                x: 10.0,
                y: 10.0,
                width: 190.0,
                height: 285.0,
            })
            .collect();
        let bytes = write_image_pdf(&pages, PageSize::A4).unwrap();
        assert_eq!(page_count(&bytes), 3);
    }

    #[test]
    fn test_empty_image_is_a_capture_error() {
        let pages = vec![ImagePage {
            image: RgbImage::new(0, 0),
            x: 0.0,
            y: 0.0,
            width: 10.0,
            height: 10.0,
        }];
        assert!(matches!(
            write_image_pdf(&pages, PageSize::A4),
            Err(ExportError::Capture(_))
        ));
    }
}
