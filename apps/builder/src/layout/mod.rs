// Vector layout: font metrics, word-wrap, the draw-command model and the
// paginating emitter used by the vector template.
// Emission is CPU-bound; export callers run it inside tokio::task::spawn_blocking.

pub mod emitter;
pub mod font_metrics;
pub mod page;
pub mod wrap;

// Re-export the public API consumed by the export and template modules.
pub use emitter::{emit_document, EmitterConfig};
pub use page::{Canvas, DrawCommand, PageSize, Rgb, TextStyle};
