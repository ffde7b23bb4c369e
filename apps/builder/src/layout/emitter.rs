//! Paginating document emitter: lays a resume out on fixed A4 pages by
//! direct coordinates, without any reflow engine.
//!
//! # Model
//! Every section is planned as a list of physical lines. Each line carries a
//! `reserve` (the height that must still fit before it is drawn) and an
//! `advance` (how far the cursor moves after it). The cursor checks
//! `y + reserve` against the bottom limit before every line and breaks the
//! page when it would overflow, so long entries split across pages line by
//! line.
//!
//! # Header orphans
//! A section title reserves its own advance plus the reserve of the first
//! line that follows it. If that first line would not fit, the title moves
//! to the next page with it, so a title is never the last thing on a page.

use serde::{Deserialize, Serialize};

use crate::errors::EmissionError;
use crate::layout::font_metrics::{get_metrics, FontFace};
use crate::layout::page::{DrawCommand, Page, PageSize, PagedDocument, Rgb, TextStyle};
use crate::layout::wrap::wrap_text;
use crate::models::resume::{PersonalInfo, ResumeDocument};

// ────────────────────────────────────────────────────────────────────────────
// Configuration
// ────────────────────────────────────────────────────────────────────────────

/// Semantic text roles the emitter draws with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StyleRole {
    Name,
    Contact,
    SectionTitle,
    EntryHeading,
    EntryMeta,
    EntrySubheading,
    Body,
    Label,
}

/// Named text styles, one per `StyleRole`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleSheet {
    pub name: TextStyle,
    pub contact: TextStyle,
    pub section_title: TextStyle,
    pub entry_heading: TextStyle,
    pub entry_meta: TextStyle,
    pub entry_subheading: TextStyle,
    pub body: TextStyle,
    pub label: TextStyle,
}

impl StyleSheet {
    pub fn get(&self, role: StyleRole) -> TextStyle {
        match role {
            StyleRole::Name => self.name,
            StyleRole::Contact => self.contact,
            StyleRole::SectionTitle => self.section_title,
            StyleRole::EntryHeading => self.entry_heading,
            StyleRole::EntryMeta => self.entry_meta,
            StyleRole::EntrySubheading => self.entry_subheading,
            StyleRole::Body => self.body,
            StyleRole::Label => self.label,
        }
    }
}

/// Vertical rhythm, all in millimetres.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spacing {
    pub title_reserve: f32,
    pub title_advance: f32,
    pub body_line: f32,
    pub skill_line: f32,
    pub section_gap: f32,
    pub entry_gap: f32,
    pub experience_reserve: f32,
    pub entry_reserve: f32,
}

/// Page geometry, palette and styles for the vector template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmitterConfig {
    pub page_size: PageSize,
    pub margin_left: f32,
    pub margin_right: f32,
    /// Where the cursor restarts on continuation pages.
    pub margin_top: f32,
    pub margin_bottom: f32,
    /// Text x position for bulleted entries.
    pub bullet_indent: f32,
    /// Offset of the technologies list from the bullet indent.
    pub technologies_offset: f32,
    pub header_height: f32,
    pub header_gap: f32,
    pub header_fill: Rgb,
    pub accent: Rgb,
    pub spacing: Spacing,
    pub styles: StyleSheet,
}

const INK: Rgb = Rgb::hex(0x0D0D0D);
const BLUE: Rgb = Rgb::hex(0x2563EB);
const CYAN: Rgb = Rgb::hex(0x0891B2);

impl Default for EmitterConfig {
    /// A4 portrait, 15 mm side margins, 20 mm top/bottom, blue header band.
    fn default() -> Self {
        Self {
            page_size: PageSize::A4,
            margin_left: 15.0,
            margin_right: 15.0,
            margin_top: 20.0,
            margin_bottom: 20.0,
            bullet_indent: 20.0,
            technologies_offset: 25.0,
            header_height: 35.0,
            header_gap: 15.0,
            header_fill: BLUE,
            accent: CYAN,
            spacing: Spacing {
                title_reserve: 15.0,
                title_advance: 12.0,
                body_line: 5.0,
                skill_line: 6.0,
                section_gap: 5.0,
                entry_gap: 8.0,
                experience_reserve: 20.0,
                entry_reserve: 15.0,
            },
            styles: StyleSheet {
                name: TextStyle::new(FontFace::HelveticaBold, 24.0, Rgb::WHITE),
                contact: TextStyle::new(FontFace::Helvetica, 10.0, Rgb::WHITE),
                section_title: TextStyle::new(FontFace::HelveticaBold, 16.0, CYAN),
                entry_heading: TextStyle::new(FontFace::HelveticaBold, 12.0, INK),
                entry_meta: TextStyle::new(FontFace::Helvetica, 12.0, INK),
                entry_subheading: TextStyle::new(FontFace::Helvetica, 11.0, BLUE),
                body: TextStyle::new(FontFace::Helvetica, 10.0, INK),
                label: TextStyle::new(FontFace::HelveticaBold, 10.0, INK),
            },
        }
    }
}

impl EmitterConfig {
    /// Lowest baseline a line may reach before a page break.
    pub fn bottom_limit(&self) -> f32 {
        self.page_size.height - self.margin_bottom
    }

    pub fn right_edge(&self) -> f32 {
        self.page_size.width - self.margin_right
    }

    fn validate(&self) -> Result<(), EmissionError> {
        if self.margin_top >= self.bottom_limit() {
            return Err(EmissionError::Geometry(format!(
                "top margin {} leaves no printable height on a {}mm page",
                self.margin_top, self.page_size.height
            )));
        }
        if self.bullet_indent >= self.right_edge() {
            return Err(EmissionError::Geometry(
                "bullet indent is past the right margin".to_string(),
            ));
        }
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Planned content
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Align {
    Left,
    Right,
}

/// One text run on a physical line, drawn on the line's baseline.
#[derive(Debug, Clone, PartialEq)]
pub struct Mark {
    pub x: f32,
    pub text: String,
    pub role: StyleRole,
    pub align: Align,
}

impl Mark {
    fn left(x: f32, text: impl Into<String>, role: StyleRole) -> Mark {
        Mark {
            x,
            text: text.into(),
            role,
            align: Align::Left,
        }
    }

    fn right(x: f32, text: impl Into<String>, role: StyleRole) -> Mark {
        Mark {
            x,
            text: text.into(),
            role,
            align: Align::Right,
        }
    }
}

/// A physical line: checked for room, drawn, then advanced past.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedLine {
    pub reserve: f32,
    pub advance: f32,
    pub marks: Vec<Mark>,
}

/// A run of lines that belong together (an entry, a paragraph), plus trailing space.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextBlock {
    pub lines: Vec<PlannedLine>,
    pub gap_after: f32,
}

// ────────────────────────────────────────────────────────────────────────────
// Cursor
// ────────────────────────────────────────────────────────────────────────────

/// Tracks the write position on the current output page.
#[derive(Debug, Clone, PartialEq)]
pub struct Cursor {
    pub y: f32,
    pub page_index: usize,
    bottom_limit: f32,
    restart_y: f32,
}

impl Cursor {
    fn new(config: &EmitterConfig) -> Self {
        Self {
            y: 0.0,
            page_index: 0,
            bottom_limit: config.bottom_limit(),
            restart_y: config.margin_top,
        }
    }

    /// True when `needed` more millimetres would cross the bottom limit.
    pub fn would_overflow(&self, needed: f32) -> bool {
        self.y + needed > self.bottom_limit
    }

    fn next_page(&mut self) {
        self.page_index += 1;
        self.y = self.restart_y;
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Emitter
// ────────────────────────────────────────────────────────────────────────────

pub struct Emitter<'a> {
    config: &'a EmitterConfig,
    cursor: Cursor,
    pages: Vec<Page>,
}

impl<'a> Emitter<'a> {
    pub fn new(config: &'a EmitterConfig) -> Result<Self, EmissionError> {
        config.validate()?;
        Ok(Self {
            config,
            cursor: Cursor::new(config),
            pages: vec![Page::default()],
        })
    }

    /// Draws the coloured name/contact band at the top of the first page.
    pub fn emit_header(&mut self, personal: &PersonalInfo) -> Result<(), EmissionError> {
        let cfg = self.config;
        self.push(DrawCommand::FillRect {
            x: 0.0,
            y: 0.0,
            width: cfg.page_size.width,
            height: cfg.header_height,
            color: cfg.header_fill,
        });
        let (left, name, contact) = (cfg.margin_left, cfg.styles.name, cfg.styles.contact);
        self.place_text(left, 20.0, &display_name(personal), name, Align::Left)?;
        self.place_text(left, 28.0, &contact_line(personal), contact, Align::Left)?;
        self.cursor.y = cfg.header_height + cfg.header_gap;
        Ok(())
    }

    /// Draws a section title followed by its blocks, breaking pages per line.
    pub fn emit_section(&mut self, title: &str, blocks: &[TextBlock]) -> Result<(), EmissionError> {
        let cfg = self.config;
        let first_reserve = blocks
            .iter()
            .flat_map(|b| b.lines.first())
            .next()
            .map_or(0.0, |line| line.reserve);
        let title_reserve = cfg
            .spacing
            .title_reserve
            .max(cfg.spacing.title_advance + first_reserve);

        self.ensure_room(title_reserve);
        let y = self.cursor.y;
        self.push(DrawCommand::FillRect {
            x: cfg.margin_left,
            y: y - 4.0,
            width: 1.5,
            height: 8.0,
            color: cfg.accent,
        });
        let style = cfg.styles.section_title;
        self.place_text(cfg.margin_left + 5.0, y + 2.0, title, style, Align::Left)?;
        self.cursor.y += cfg.spacing.title_advance;

        for block in blocks {
            for line in &block.lines {
                self.emit_line(line)?;
            }
            self.cursor.y += block.gap_after;
        }
        Ok(())
    }

    pub fn finish(self) -> PagedDocument {
        PagedDocument {
            page_size: self.config.page_size,
            pages: self.pages,
        }
    }

    fn emit_line(&mut self, line: &PlannedLine) -> Result<(), EmissionError> {
        self.ensure_room(line.reserve);
        let y = self.cursor.y;
        for mark in &line.marks {
            let style = self.config.styles.get(mark.role);
            self.place_text(mark.x, y, &mark.text, style, mark.align)?;
        }
        self.cursor.y += line.advance;
        Ok(())
    }

    /// Starts a new page when `needed` would not fit below the cursor.
    fn ensure_room(&mut self, needed: f32) {
        if self.cursor.would_overflow(needed) {
            self.cursor.next_page();
            self.pages.push(Page::default());
        }
    }

    /// Measures (which also validates the encoding) and records a text run.
    /// Empty runs are measured but not drawn.
    fn place_text(
        &mut self,
        x: f32,
        y: f32,
        text: &str,
        style: TextStyle,
        align: Align,
    ) -> Result<(), EmissionError> {
        let width_pt = get_metrics(style.face).measure_str(text, style.size)?;
        if text.is_empty() {
            return Ok(());
        }
        let x = match align {
            Align::Left => x,
            Align::Right => x - pt_to_mm(width_pt),
        };
        self.push(DrawCommand::Text {
            x,
            y,
            text: text.to_string(),
            style,
        });
        Ok(())
    }

    fn push(&mut self, command: DrawCommand) {
        let index = self.cursor.page_index;
        self.pages[index].commands.push(command);
    }
}

/// Millimetres per typographic point.
pub const MM_PER_PT: f32 = 25.4 / 72.0;

pub fn pt_to_mm(pt: f32) -> f32 {
    pt * MM_PER_PT
}

// ────────────────────────────────────────────────────────────────────────────
// Document → blocks
// ────────────────────────────────────────────────────────────────────────────

const BULLET: &str = "•";

/// Lays the whole document out on pages.
///
/// Sections appear in fixed order and are skipped when empty; the document is
/// only read.
pub fn emit_document(
    doc: &ResumeDocument,
    config: &EmitterConfig,
) -> Result<PagedDocument, EmissionError> {
    let mut emitter = Emitter::new(config)?;
    emitter.emit_header(&doc.personal)?;

    for (title, blocks) in plan_sections(doc, config)? {
        emitter.emit_section(title, &blocks)?;
    }

    Ok(emitter.finish())
}

/// Builds the non-empty sections in emission order.
pub fn plan_sections(
    doc: &ResumeDocument,
    config: &EmitterConfig,
) -> Result<Vec<(&'static str, Vec<TextBlock>)>, EmissionError> {
    let mut sections = Vec::new();

    if !doc.personal.summary.trim().is_empty() {
        sections.push(("About", vec![about_block(&doc.personal.summary, config)?]));
    }
    if !doc.experience.is_empty() {
        let blocks = doc
            .experience
            .iter()
            .map(|e| {
                entry_block(
                    config,
                    config.spacing.experience_reserve,
                    (e.position.as_str(), e.duration.as_str()),
                    &e.company,
                    6.0,
                    Some(e.description.as_str()),
                    config.spacing.entry_gap,
                )
            })
            .collect::<Result<Vec<_>, _>>()?;
        sections.push(("Experience", blocks));
    }
    if !doc.education.is_empty() {
        let blocks = doc
            .education
            .iter()
            .map(|e| {
                entry_block(
                    config,
                    config.spacing.entry_reserve,
                    (e.degree.as_str(), e.year.as_str()),
                    &e.school,
                    10.0,
                    None,
                    0.0,
                )
            })
            .collect::<Result<Vec<_>, _>>()?;
        sections.push(("Education", blocks));
    }
    if !doc.skills.is_empty() {
        let step = config.spacing.skill_line;
        let block = TextBlock {
            lines: doc
                .skills
                .iter()
                .map(|s| bullet_line(config, step, step, &s.name, StyleRole::Body))
                .collect(),
            gap_after: config.spacing.section_gap,
        };
        sections.push(("Skills", vec![block]));
    }
    if !doc.projects.is_empty() {
        let blocks = doc
            .projects
            .iter()
            .map(|p| project_block(config, &p.name, &p.description, &p.technologies))
            .collect::<Result<Vec<_>, _>>()?;
        sections.push(("Projects", blocks));
    }
    if !doc.certifications.is_empty() {
        let blocks = doc
            .certifications
            .iter()
            .map(|c| {
                entry_block(
                    config,
                    config.spacing.entry_reserve,
                    (c.name.as_str(), c.date.as_str()),
                    &c.issuer,
                    10.0,
                    None,
                    0.0,
                )
            })
            .collect::<Result<Vec<_>, _>>()?;
        sections.push(("Certifications", blocks));
    }

    Ok(sections)
}

fn about_block(summary: &str, config: &EmitterConfig) -> Result<TextBlock, EmissionError> {
    let width = config.right_edge() - config.margin_left;
    let lines = body_lines(summary, config.margin_left, width, config)?;
    Ok(TextBlock {
        lines,
        gap_after: config.spacing.section_gap,
    })
}

/// Bullet + bold heading with a right-aligned meta field, a coloured
/// subheading line, then an optional wrapped description.
fn entry_block(
    config: &EmitterConfig,
    reserve: f32,
    (heading, meta): (&str, &str),
    subheading: &str,
    subheading_advance: f32,
    description: Option<&str>,
    gap_after: f32,
) -> Result<TextBlock, EmissionError> {
    let mut first = bullet_line(config, reserve, 5.0, heading, StyleRole::EntryHeading);
    first
        .marks
        .push(Mark::right(config.right_edge(), meta, StyleRole::EntryMeta));

    let mut lines = vec![
        first,
        PlannedLine {
            reserve: 0.0,
            advance: subheading_advance,
            marks: vec![Mark::left(
                config.bullet_indent,
                subheading,
                StyleRole::EntrySubheading,
            )],
        },
    ];
    if let Some(description) = description {
        let width = config.right_edge() - config.bullet_indent;
        lines.extend(body_lines(description, config.bullet_indent, width, config)?);
    }
    Ok(TextBlock { lines, gap_after })
}

fn project_block(
    config: &EmitterConfig,
    name: &str,
    description: &str,
    technologies: &[String],
) -> Result<TextBlock, EmissionError> {
    let spacing = &config.spacing;
    let mut lines = vec![bullet_line(
        config,
        spacing.entry_reserve,
        6.0,
        name,
        StyleRole::EntryHeading,
    )];
    let width = config.right_edge() - config.bullet_indent;
    lines.extend(body_lines(description, config.bullet_indent, width, config)?);

    let techs: Vec<&str> = technologies
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .collect();
    if !techs.is_empty() {
        let list_x = config.bullet_indent + config.technologies_offset;
        let body = config.styles.body;
        let wrapped = wrap_text(
            &techs.join(", "),
            mm_to_pt(config.right_edge() - list_x),
            body.face,
            body.size,
        )?;
        for (i, chunk) in wrapped.into_iter().enumerate() {
            let mut marks = Vec::with_capacity(2);
            if i == 0 {
                let label = Mark::left(config.bullet_indent, "Technologies:", StyleRole::Label);
                marks.push(label);
            }
            marks.push(Mark::left(list_x, chunk, StyleRole::Body));
            lines.push(PlannedLine {
                reserve: spacing.body_line,
                advance: spacing.body_line,
                marks,
            });
        }
    }

    Ok(TextBlock {
        lines,
        gap_after: spacing.entry_gap,
    })
}

fn bullet_line(
    config: &EmitterConfig,
    reserve: f32,
    advance: f32,
    text: &str,
    role: StyleRole,
) -> PlannedLine {
    PlannedLine {
        reserve,
        advance,
        marks: vec![
            Mark::left(config.margin_left, BULLET, role),
            Mark::left(config.bullet_indent, text, role),
        ],
    }
}

/// Wraps body text to `width` millimetres, one planned line per physical line.
fn body_lines(
    text: &str,
    x: f32,
    width: f32,
    config: &EmitterConfig,
) -> Result<Vec<PlannedLine>, EmissionError> {
    let body = config.styles.body;
    let step = config.spacing.body_line;
    Ok(wrap_text(text, mm_to_pt(width), body.face, body.size)?
        .into_iter()
        .map(|line| PlannedLine {
            reserve: step,
            advance: step,
            marks: vec![Mark::left(x, line, StyleRole::Body)],
        })
        .collect())
}

fn mm_to_pt(mm: f32) -> f32 {
    mm / MM_PER_PT
}

/// Returns `value` trimmed, or `placeholder` when it is blank.
fn or_placeholder<'a>(value: &'a str, placeholder: &'a str) -> &'a str {
    match value.trim() {
        "" => placeholder,
        v => v,
    }
}

fn display_name(personal: &PersonalInfo) -> String {
    format!(
        "{} {}",
        or_placeholder(&personal.first_name, "First"),
        or_placeholder(&personal.last_name, "Last")
    )
}

fn contact_line(personal: &PersonalInfo) -> String {
    [
        or_placeholder(&personal.email, "email@example.com"),
        or_placeholder(&personal.phone, "+1 (555) 123-4567"),
        or_placeholder(&personal.location, "City, State"),
    ]
    .join("  |  ")
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::resume::{
        CertificationEntry, EducationEntry, ExperienceEntry, ProjectEntry, SkillEntry,
    };

    fn jane() -> ResumeDocument {
        let mut doc = ResumeDocument::default();
        doc.personal.first_name = "Jane".to_string();
        doc.personal.last_name = "Doe".to_string();
        doc.personal.email = "jane@example.com".to_string();
        doc
    }

    fn long_description(words: usize) -> String {
        (0..words)
            .map(|i| format!("w{i:03}"))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// A short page: header ends at 50mm, bottom limit at 90mm, so only three
    /// description lines fit under the first entry heading.
    fn short_page_config() -> EmitterConfig {
        EmitterConfig {
            page_size: PageSize {
                width: 210.0,
                height: 110.0,
            },
            ..EmitterConfig::default()
        }
    }

    fn body_texts(doc: &PagedDocument, config: &EmitterConfig) -> Vec<String> {
        doc.pages
            .iter()
            .flat_map(|p| p.commands.iter())
            .filter_map(|c| match c {
                DrawCommand::Text { text, style, .. } if *style == config.styles.body => {
                    Some(text.clone())
                }
                _ => None,
            })
            .collect()
    }

    fn all_texts(doc: &PagedDocument) -> Vec<String> {
        doc.pages
            .iter()
            .flat_map(|p| p.texts().map(str::to_string))
            .collect()
    }

    #[test]
    fn test_personal_only_is_single_header_page() {
        let config = EmitterConfig::default();
        let out = emit_document(&jane(), &config).unwrap();
        assert_eq!(out.pages.len(), 1);
        assert_eq!(
            all_texts(&out),
            vec![
                "Jane Doe".to_string(),
                "jane@example.com  |  +1 (555) 123-4567  |  City, State".to_string()
            ]
        );
        assert!(matches!(out.pages[0].commands[0], DrawCommand::FillRect { x, y, .. } if x == 0.0 && y == 0.0));
    }

    #[test]
    fn test_blank_personal_uses_placeholders() {
        let out = emit_document(&ResumeDocument::default(), &EmitterConfig::default()).unwrap();
        let texts = all_texts(&out);
        assert_eq!(texts[0], "First Last");
        assert_eq!(
            texts[1],
            "email@example.com  |  +1 (555) 123-4567  |  City, State"
        );
    }

    #[test]
    fn test_partial_personal_fills_each_blank_field() {
        let mut doc = ResumeDocument::default();
        doc.personal.first_name = "Jane".to_string();
        doc.personal.email = "jane@example.com".to_string();
        doc.personal.location = "  ".to_string();
        let out = emit_document(&doc, &EmitterConfig::default()).unwrap();
        assert_eq!(
            all_texts(&out),
            vec![
                "Jane Last".to_string(),
                "jane@example.com  |  +1 (555) 123-4567  |  City, State".to_string()
            ]
        );

        doc.personal.last_name = "Doe".to_string();
        doc.personal.first_name.clear();
        doc.personal.phone = "555-0100".to_string();
        let out = emit_document(&doc, &EmitterConfig::default()).unwrap();
        let texts = all_texts(&out);
        assert_eq!(texts[0], "First Doe");
        assert_eq!(texts[1], "jane@example.com  |  555-0100  |  City, State");
    }

    #[test]
    fn test_empty_sections_never_appear() {
        let mut doc = jane();
        doc.skills.push(SkillEntry {
            name: "Rust".to_string(),
            level: 90,
        });
        let out = emit_document(&doc, &EmitterConfig::default()).unwrap();
        let texts = all_texts(&out);
        assert!(texts.contains(&"Skills".to_string()));
        for absent in ["About", "Experience", "Education", "Projects", "Certifications"] {
            assert!(!texts.contains(&absent.to_string()), "{absent} should be skipped");
        }
    }

    #[test]
    fn test_sections_follow_fixed_order() {
        let mut doc = jane();
        doc.personal.summary = "Engineer.".to_string();
        doc.certifications.push(CertificationEntry {
            name: "CKA".to_string(),
            ..Default::default()
        });
        doc.projects.push(ProjectEntry {
            name: "Compiler".to_string(),
            ..Default::default()
        });
        doc.skills.push(SkillEntry::default());
        doc.education.push(EducationEntry {
            degree: "BSc".to_string(),
            ..Default::default()
        });
        doc.experience.push(ExperienceEntry {
            position: "Engineer".to_string(),
            ..Default::default()
        });

        let out = emit_document(&doc, &EmitterConfig::default()).unwrap();
        let texts = all_texts(&out);
        let order: Vec<usize> = ["About", "Experience", "Education", "Skills", "Projects", "Certifications"]
            .iter()
            .map(|t| texts.iter().position(|x| x == t).unwrap())
            .collect();
        assert!(order.windows(2).all(|w| w[0] < w[1]), "order was {order:?}");
    }

    #[test]
    fn test_duration_is_right_aligned_on_heading_baseline() {
        let mut doc = jane();
        doc.experience.push(ExperienceEntry {
            position: "Engineer".to_string(),
            company: "Acme".to_string(),
            duration: "2020 - 2024".to_string(),
            description: String::new(),
        });
        let config = EmitterConfig::default();
        let out = emit_document(&doc, &config).unwrap();

        let find = |needle: &str| {
            out.pages[0]
                .commands
                .iter()
                .find_map(|c| match c {
                    DrawCommand::Text { x, y, text, style } if text == needle => Some((*x, *y, *style)),
                    _ => None,
                })
                .unwrap()
        };
        let (_, pos_y, _) = find("Engineer");
        let (dur_x, dur_y, dur_style) = find("2020 - 2024");
        assert_eq!(pos_y, dur_y, "two fields share one baseline");

        let width = pt_to_mm(get_metrics(dur_style.face).measure_str("2020 - 2024", dur_style.size).unwrap());
        assert!((dur_x + width - config.right_edge()).abs() < 1e-3);

        let (_, company_y, _) = find("Acme");
        assert!((company_y - pos_y - 5.0).abs() < 1e-4);
    }

    #[test]
    fn test_long_description_splits_across_pages_in_order() {
        let config = EmitterConfig::default();
        let mut doc = jane();
        for _ in 0..3 {
            doc.experience.push(ExperienceEntry {
                position: "Engineer".to_string(),
                company: "Acme".to_string(),
                duration: "2020".to_string(),
                description: long_description(900),
            });
        }

        let out = emit_document(&doc, &config).unwrap();

        let body = config.styles.body;
        let width = mm_to_pt(config.right_edge() - config.bullet_indent);
        let expected: Vec<String> = doc
            .experience
            .iter()
            .flat_map(|e| wrap_text(&e.description, width, body.face, body.size).unwrap())
            .collect();

        let lines_per_page =
            ((config.bottom_limit() - config.margin_top) / config.spacing.body_line).floor() as usize;
        let min_pages = (expected.len() + lines_per_page - 1) / lines_per_page;
        assert!(expected.len() > 3 * lines_per_page / 2);
        assert!(out.pages.len() >= min_pages, "{} pages < {min_pages}", out.pages.len());
        assert_eq!(body_texts(&out, &config), expected, "no line dropped or reordered");
    }

    #[test]
    fn test_cursor_never_passes_bottom_limit() {
        let config = EmitterConfig::default();
        let mut doc = jane();
        doc.personal.summary = long_description(400);
        doc.experience.push(ExperienceEntry {
            description: long_description(700),
            ..Default::default()
        });
        for i in 0..40 {
            doc.skills.push(SkillEntry {
                name: format!("skill {i}"),
                level: 50,
            });
        }
        let out = emit_document(&doc, &config).unwrap();
        for page in &out.pages {
            for command in &page.commands {
                if let DrawCommand::Text { y, .. } = command {
                    assert!(*y <= config.bottom_limit(), "baseline {y} below limit");
                }
            }
        }
    }

    #[test]
    fn test_jane_scenario_second_page_continues_description() {
        let config = short_page_config();
        let mut doc = ResumeDocument::default();
        doc.personal.first_name = "Jane".to_string();
        let description = long_description(100);
        assert!(description.len() <= 500);
        doc.experience.push(ExperienceEntry {
            position: "Lead".to_string(),
            company: "Acme".to_string(),
            duration: "2019 - 2024".to_string(),
            description: description.clone(),
        });

        let out = emit_document(&doc, &config).unwrap();
        assert!(out.pages.len() >= 2);

        let body = config.styles.body;
        let wrapped = wrap_text(
            &description,
            mm_to_pt(config.right_edge() - config.bullet_indent),
            body.face,
            body.size,
        )
        .unwrap();
        let on_first_page = out.pages[0]
            .commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Text { style, .. } if *style == body))
            .count();
        assert!(on_first_page > 0 && on_first_page < wrapped.len());

        let first_on_page_two = out.pages[1].texts().next().unwrap();
        assert_eq!(first_on_page_two, wrapped[on_first_page]);
        assert_eq!(all_texts(&out).iter().filter(|t| *t == "Experience").count(), 1);
    }

    #[test]
    fn test_section_title_is_never_orphaned() {
        let config = EmitterConfig::default();
        let mut emitter = Emitter::new(&config).unwrap();
        // Room for the title (15mm) but not title advance + the 20mm entry reserve.
        emitter.cursor.y = config.bottom_limit() - 16.0;

        let block = entry_block(
            &config,
            20.0,
            ("Engineer", "2024"),
            "Acme",
            6.0,
            Some("Did things."),
            8.0,
        )
        .unwrap();
        emitter.emit_section("Experience", &[block]).unwrap();
        let out = emitter.finish();

        assert_eq!(out.pages.len(), 2);
        assert_eq!(out.pages[0].texts().count(), 0, "title must move with its first line");
        let page_two: Vec<&str> = out.pages[1].texts().collect();
        assert_eq!(page_two[0], "Experience");
        assert!(page_two.contains(&"Engineer"));
    }

    #[test]
    fn test_emission_is_deterministic() {
        let mut doc = jane();
        doc.personal.summary = long_description(300);
        doc.projects.push(ProjectEntry {
            name: "Compiler".to_string(),
            description: long_description(120),
            technologies: vec!["Rust".to_string(), "LLVM".to_string()],
        });
        let config = EmitterConfig::default();
        let first = emit_document(&doc, &config).unwrap();
        let second = emit_document(&doc, &config).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_project_technologies_label_and_list() {
        let mut doc = jane();
        doc.projects.push(ProjectEntry {
            name: "Compiler".to_string(),
            description: "A toy compiler.".to_string(),
            technologies: vec!["Rust".to_string(), " ".to_string(), "LLVM".to_string()],
        });
        let out = emit_document(&doc, &EmitterConfig::default()).unwrap();
        let texts = all_texts(&out);
        let label = texts.iter().position(|t| t == "Technologies:").unwrap();
        assert_eq!(texts[label + 1], "Rust, LLVM");
    }

    #[test]
    fn test_unsupported_character_aborts_emission() {
        let mut doc = jane();
        doc.experience.push(ExperienceEntry {
            position: "Engineer 🚀".to_string(),
            ..Default::default()
        });
        let err = emit_document(&doc, &EmitterConfig::default()).unwrap_err();
        assert!(matches!(err, EmissionError::UnsupportedChar { ch: '🚀', .. }));
    }

    #[test]
    fn test_geometry_without_printable_area_is_rejected() {
        let config = EmitterConfig {
            margin_top: 290.0,
            ..EmitterConfig::default()
        };
        assert!(matches!(
            emit_document(&jane(), &config),
            Err(EmissionError::Geometry(_))
        ));
    }
}
