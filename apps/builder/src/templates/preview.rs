//! On-screen template layouts.
//!
//! A preview is a single unbounded `Canvas` in CSS pixels at a given viewport
//! width; capture strategies rasterize it. Themes differ in header treatment,
//! colours and whether a sidebar carries contact details and skills.

use crate::errors::ExportError;
use crate::layout::font_metrics::FontFace;
use crate::layout::{Canvas, DrawCommand, Rgb, TextStyle};
use crate::layout::wrap::wrap_with;
use crate::models::resume::ResumeDocument;
use crate::templates::TemplateId;

const PADDING: f32 = 32.0;
const LINE_FACTOR: f32 = 1.45;
const SIDEBAR_FRACTION: f32 = 1.0 / 3.0;

/// Measures text the way the capture rasterizer will draw it.
pub trait TextMeasure {
    /// Advance width of `text` in canvas pixels.
    fn measure(&self, text: &str, style: &TextStyle) -> Result<f32, ExportError>;
}

#[derive(Debug, Clone, Copy)]
enum HeaderKind {
    /// Name and contact on white with a rule underneath.
    Rule,
    /// Full-width coloured band.
    Banner(Rgb),
    /// Centred name and contact.
    Centered,
}

#[derive(Debug, Clone, Copy)]
struct Theme {
    header: HeaderKind,
    sidebar: Option<Rgb>,
    accent: Rgb,
    text: Rgb,
    muted: Rgb,
    heading_face: FontFace,
    body_face: FontFace,
    skill_meters: bool,
}

fn theme(template: TemplateId) -> Theme {
    let base = Theme {
        header: HeaderKind::Rule,
        sidebar: None,
        accent: Rgb::hex(0x2563EB),
        text: Rgb::hex(0x1F2937),
        muted: Rgb::hex(0x6B7280),
        heading_face: FontFace::HelveticaBold,
        body_face: FontFace::Helvetica,
        skill_meters: false,
    };
    match template {
        TemplateId::Template1 => base,
        TemplateId::Template2 => Theme {
            sidebar: Some(Rgb::hex(0x1E293B)),
            ..base
        },
        TemplateId::Template3 => Theme {
            header: HeaderKind::Centered,
            accent: Rgb::hex(0x111827),
            text: Rgb::hex(0x111827),
            ..base
        },
        TemplateId::Template4 => Theme {
            header: HeaderKind::Banner(Rgb::hex(0x334155)),
            accent: Rgb::hex(0x334155),
            heading_face: FontFace::TimesBold,
            body_face: FontFace::TimesRoman,
            ..base
        },
        TemplateId::Template5 => Theme {
            header: HeaderKind::Banner(Rgb::hex(0x15803D)),
            accent: Rgb::hex(0x15803D),
            skill_meters: true,
            ..base
        },
        TemplateId::Template6 => Theme {
            header: HeaderKind::Banner(Rgb::hex(0x2563EB)),
            accent: Rgb::hex(0x0891B2),
            ..base
        },
    }
}

/// A vertical run of content inside one column.
struct Column<'a> {
    x: f32,
    width: f32,
    y: f32,
    fonts: &'a dyn TextMeasure,
    commands: &'a mut Vec<DrawCommand>,
}

impl Column<'_> {
    fn wrap(&self, text: &str, style: &TextStyle, width: f32) -> Result<Vec<String>, ExportError> {
        if !(width > 0.0) {
            return Err(ExportError::Capture(format!(
                "column width {width} leaves no room for text"
            )));
        }
        wrap_with(text, width, |s| self.fonts.measure(s, style))
    }

    fn text(&mut self, text: &str, style: TextStyle, indent: f32) -> Result<(), ExportError> {
        let lines = self.wrap(text, &style, self.width - indent)?;
        for line in lines {
            self.y += style.size;
            self.commands.push(DrawCommand::Text {
                x: self.x + indent,
                y: self.y,
                text: line,
                style,
            });
            self.y += style.size * (LINE_FACTOR - 1.0);
        }
        Ok(())
    }

    fn centered(&mut self, text: &str, style: TextStyle) -> Result<(), ExportError> {
        let lines = self.wrap(text, &style, self.width)?;
        for line in lines {
            let w = self.fonts.measure(&line, &style)?;
            self.y += style.size;
            self.commands.push(DrawCommand::Text {
                x: self.x + (self.width - w) / 2.0,
                y: self.y,
                text: line,
                style,
            });
            self.y += style.size * (LINE_FACTOR - 1.0);
        }
        Ok(())
    }

    fn rule(&mut self, color: Rgb, width: f32) {
        self.commands.push(DrawCommand::Line {
            x1: self.x,
            y1: self.y,
            x2: self.x + self.width,
            y2: self.y,
            width,
            color,
        });
    }

    fn meter(&mut self, level: u8, fill: Rgb) {
        let height = 8.0;
        self.commands.push(DrawCommand::FillRect {
            x: self.x,
            y: self.y,
            width: self.width,
            height,
            color: Rgb::hex(0xE5E7EB),
        });
        self.commands.push(DrawCommand::FillRect {
            x: self.x,
            y: self.y,
            width: self.width * f32::from(level.min(100)) / 100.0,
            height,
            color: fill,
        });
        self.y += height;
    }

    fn gap(&mut self, px: f32) {
        self.y += px;
    }

    fn heading(&mut self, title: &str, theme: &Theme, color: Rgb) -> Result<(), ExportError> {
        self.gap(12.0);
        self.text(title, TextStyle::new(theme.heading_face, 20.0, color), 0.0)?;
        self.gap(2.0);
        self.rule(color, 1.0);
        self.gap(8.0);
        Ok(())
    }
}

fn contact_parts(doc: &ResumeDocument) -> Vec<&str> {
    [
        doc.personal.email.as_str(),
        doc.personal.phone.as_str(),
        doc.personal.location.as_str(),
    ]
    .into_iter()
    .filter(|s| !s.trim().is_empty())
    .collect()
}

/// Renders `doc` with `template`'s layout at `viewport_width` CSS pixels,
/// wrapping text with `fonts`.
///
/// Empty sections are omitted; the canvas grows to fit the content.
pub fn render_preview(
    doc: &ResumeDocument,
    template: TemplateId,
    viewport_width: f32,
    fonts: &dyn TextMeasure,
) -> Result<Canvas, ExportError> {
    if !(viewport_width > PADDING * 4.0) {
        return Err(ExportError::Capture(format!(
            "viewport width {viewport_width} is too narrow for a preview"
        )));
    }
    let theme = theme(template);
    let mut commands = Vec::new();
    let name = doc.full_name().unwrap_or_default();
    let contact = contact_parts(doc).join("  |  ");

    let mut sidebar_end = 0.0;
    let (main_x, main_width) = match theme.sidebar {
        Some(_) => {
            let sidebar_width = viewport_width * SIDEBAR_FRACTION;
            sidebar_end =
                render_sidebar(doc, &theme, sidebar_width, &name, fonts, &mut commands)?;
            (sidebar_width + PADDING, viewport_width - sidebar_width - PADDING * 2.0)
        }
        None => (PADDING, viewport_width - PADDING * 2.0),
    };

    let mut main = Column {
        x: main_x,
        width: main_width,
        y: 0.0,
        fonts,
        commands: &mut commands,
    };

    if theme.sidebar.is_none() {
        render_header(&mut main, &theme, &name, &contact, viewport_width)?;
    } else {
        main.gap(PADDING - 12.0);
    }

    let body = TextStyle::new(theme.body_face, 14.0, theme.text);
    let strong = TextStyle::new(theme.heading_face, 16.0, theme.text);
    let muted = TextStyle::new(theme.body_face, 13.0, theme.muted);
    let accent = TextStyle::new(theme.body_face, 14.0, theme.accent);

    if !doc.personal.summary.trim().is_empty() {
        main.heading("About", &theme, theme.accent)?;
        main.text(&doc.personal.summary, body, 0.0)?;
    }

    if !doc.experience.is_empty() {
        main.heading("Experience", &theme, theme.accent)?;
        for e in &doc.experience {
            main.text(&e.position, strong, 0.0)?;
            main.text(&e.company, accent, 0.0)?;
            main.text(&e.duration, muted, 0.0)?;
            main.text(&e.description, body, 12.0)?;
            main.gap(10.0);
        }
    }

    if !doc.education.is_empty() {
        main.heading("Education", &theme, theme.accent)?;
        for e in &doc.education {
            main.text(&e.degree, strong, 0.0)?;
            main.text(&e.school, accent, 0.0)?;
            main.text(&e.year, muted, 0.0)?;
            main.gap(8.0);
        }
    }

    if theme.sidebar.is_none() && !doc.skills.is_empty() {
        main.heading("Skills", &theme, theme.accent)?;
        render_skills(&mut main, doc, &theme, body)?;
    }

    if !doc.projects.is_empty() {
        main.heading("Projects", &theme, theme.accent)?;
        for p in &doc.projects {
            main.text(&p.name, strong, 0.0)?;
            main.text(&p.description, body, 0.0)?;
            let techs: Vec<&str> = p
                .technologies
                .iter()
                .map(|t| t.trim())
                .filter(|t| !t.is_empty())
                .collect();
            if !techs.is_empty() {
                main.text(&techs.join(" · "), muted, 0.0)?;
            }
            main.gap(8.0);
        }
    }

    if theme.sidebar.is_none() && !doc.certifications.is_empty() {
        main.heading("Certifications", &theme, theme.accent)?;
        render_certifications(&mut main, doc, strong, muted)?;
    }

    let height = f32::max(sidebar_end, main.y + PADDING).ceil();
    if theme.sidebar.is_some() {
        // The sidebar band is always the first command.
        if let Some(DrawCommand::FillRect { height: band, .. }) = commands.first_mut() {
            *band = height;
        }
    }

    Ok(Canvas {
        width: viewport_width,
        height,
        background: Rgb::WHITE,
        commands,
    })
}

fn render_header(
    col: &mut Column<'_>,
    theme: &Theme,
    name: &str,
    contact: &str,
    viewport_width: f32,
) -> Result<(), ExportError> {
    match theme.header {
        HeaderKind::Rule => {
            col.gap(PADDING - 8.0);
            col.text(name, TextStyle::new(theme.heading_face, 32.0, theme.text), 0.0)?;
            col.text(contact, TextStyle::new(theme.body_face, 14.0, theme.muted), 0.0)?;
            col.gap(8.0);
            col.rule(theme.accent, 2.0);
        }
        HeaderKind::Centered => {
            col.gap(PADDING - 8.0);
            col.centered(name, TextStyle::new(theme.heading_face, 34.0, theme.text))?;
            col.centered(contact, TextStyle::new(theme.body_face, 13.0, theme.muted))?;
            col.gap(8.0);
        }
        HeaderKind::Banner(fill) => {
            // The band is pushed first so the text lands on top of it.
            let band_index = col.commands.len();
            col.commands.push(DrawCommand::FillRect {
                x: 0.0,
                y: 0.0,
                width: viewport_width,
                height: 0.0,
                color: fill,
            });
            col.gap(PADDING - 8.0);
            col.text(name, TextStyle::new(theme.heading_face, 32.0, Rgb::WHITE), 0.0)?;
            col.text(contact, TextStyle::new(theme.body_face, 14.0, Rgb::WHITE), 0.0)?;
            col.gap(PADDING - 8.0);
            if let Some(DrawCommand::FillRect { height, .. }) = col.commands.get_mut(band_index) {
                *height = col.y;
            }
        }
    }
    col.gap(8.0);
    Ok(())
}

/// Draws the sidebar column as the first commands; returns where its content ends.
fn render_sidebar(
    doc: &ResumeDocument,
    theme: &Theme,
    width: f32,
    name: &str,
    fonts: &dyn TextMeasure,
    commands: &mut Vec<DrawCommand>,
) -> Result<f32, ExportError> {
    let fill = theme.sidebar.unwrap_or(Rgb::BLACK);
    commands.push(DrawCommand::FillRect {
        x: 0.0,
        y: 0.0,
        width,
        height: 0.0,
        color: fill,
    });

    let mut side = Column {
        x: PADDING * 0.75,
        width: width - PADDING * 1.5,
        y: PADDING - 8.0,
        fonts,
        commands,
    };
    let light = TextStyle::new(theme.body_face, 13.0, Rgb::hex(0xE2E8F0));
    side.text(name, TextStyle::new(theme.heading_face, 26.0, Rgb::WHITE), 0.0)?;
    side.gap(12.0);
    for part in contact_parts(doc) {
        side.text(part, light, 0.0)?;
    }
    if !doc.skills.is_empty() {
        side.heading("Skills", theme, Rgb::WHITE)?;
        render_skills(&mut side, doc, theme, light)?;
    }
    if !doc.certifications.is_empty() {
        side.heading("Certifications", theme, Rgb::WHITE)?;
        let strong = TextStyle::new(theme.heading_face, 14.0, Rgb::WHITE);
        render_certifications(&mut side, doc, strong, light)?;
    }
    // Height is filled in once the main column is known.
    Ok(side.y + PADDING)
}

fn render_skills(
    col: &mut Column<'_>,
    doc: &ResumeDocument,
    theme: &Theme,
    style: TextStyle,
) -> Result<(), ExportError> {
    for skill in &doc.skills {
        col.text(&format!("• {}", skill.name), style, 0.0)?;
        if theme.skill_meters {
            col.gap(2.0);
            col.meter(skill.level, theme.accent);
            col.gap(6.0);
        }
    }
    Ok(())
}

fn render_certifications(
    col: &mut Column<'_>,
    doc: &ResumeDocument,
    strong: TextStyle,
    muted: TextStyle,
) -> Result<(), ExportError> {
    for c in &doc.certifications {
        col.text(&c.name, strong, 0.0)?;
        let issued = [c.issuer.as_str(), c.date.as_str()]
            .into_iter()
            .filter(|s| !s.trim().is_empty())
            .collect::<Vec<_>>()
            .join(", ");
        col.text(&issued, muted, 0.0)?;
        col.gap(6.0);
    }
    Ok(())
}
