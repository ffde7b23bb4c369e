//! Template catalog and selection ids.
//!
//! Each template pairs a preview layout (see `preview`) with the export
//! strategy that turns it into a PDF.

pub mod preview;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use preview::render_preview;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateId {
    #[default]
    Template1,
    Template2,
    Template3,
    Template4,
    Template5,
    Template6,
}

impl TemplateId {
    pub const ALL: [TemplateId; 6] = [
        TemplateId::Template1,
        TemplateId::Template2,
        TemplateId::Template3,
        TemplateId::Template4,
        TemplateId::Template5,
        TemplateId::Template6,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateId::Template1 => "template1",
            TemplateId::Template2 => "template2",
            TemplateId::Template3 => "template3",
            TemplateId::Template4 => "template4",
            TemplateId::Template5 => "template5",
            TemplateId::Template6 => "template6",
        }
    }

    pub fn meta(&self) -> &'static TemplateMeta {
        // ALL and CATALOG share the same order.
        &CATALOG[*self as usize]
    }

    pub fn strategy(&self) -> StrategyKind {
        self.meta().strategy
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown template id: {0}")]
pub struct UnknownTemplate(pub String);

impl FromStr for TemplateId {
    type Err = UnknownTemplate;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TemplateId::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| UnknownTemplate(s.to_string()))
    }
}

/// How a template's PDF is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// One screenshot, one page, overflow clipped.
    Raster,
    /// Screenshot at a wide viewport, sliced across pages.
    Paginated,
    /// Text and shapes drawn directly by the paginating emitter.
    Vector,
}

#[derive(Debug, Clone, Serialize)]
pub struct TemplateMeta {
    pub id: TemplateId,
    pub name: &'static str,
    pub description: &'static str,
    pub strategy: StrategyKind,
    /// Width of the on-screen preview in CSS pixels.
    pub viewport_width: u32,
}

static CATALOG: [TemplateMeta; 6] = [
    TemplateMeta {
        id: TemplateId::Template1,
        name: "Classic",
        description: "Single column with a ruled header",
        strategy: StrategyKind::Raster,
        viewport_width: 816,
    },
    TemplateMeta {
        id: TemplateId::Template2,
        name: "Sidebar Dark",
        description: "Dark sidebar with contact details and skills",
        strategy: StrategyKind::Raster,
        viewport_width: 816,
    },
    TemplateMeta {
        id: TemplateId::Template3,
        name: "Minimal",
        description: "Light type under a centred header",
        strategy: StrategyKind::Paginated,
        viewport_width: 896,
    },
    TemplateMeta {
        id: TemplateId::Template4,
        name: "Executive",
        description: "Slate header band over a single column",
        strategy: StrategyKind::Paginated,
        viewport_width: 896,
    },
    TemplateMeta {
        id: TemplateId::Template5,
        name: "Fresh Green",
        description: "Green banner with skill meters",
        strategy: StrategyKind::Raster,
        viewport_width: 816,
    },
    TemplateMeta {
        id: TemplateId::Template6,
        name: "Modern Vector",
        description: "Blue banner rendered as selectable vector text",
        strategy: StrategyKind::Vector,
        viewport_width: 794,
    },
];

/// All templates in gallery order.
pub fn catalog() -> &'static [TemplateMeta] {
    &CATALOG
}
