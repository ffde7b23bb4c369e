use thiserror::Error;

/// Message shown to the user for any failed export, whatever the cause.
pub const EXPORT_FAILED_MESSAGE: &str = "Failed to generate PDF. Please try again.";

/// Errors raised at the store's update boundary.
#[derive(Debug, Error, PartialEq)]
pub enum StoreError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unknown field: {0}")]
    UnknownField(String),

    #[error("Entry index {index} out of range for {section} ({len} entries)")]
    IndexOutOfRange {
        section: &'static str,
        index: usize,
        len: usize,
    },
}

/// A text or style primitive failed while laying out vector output.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum EmissionError {
    #[error("Character {ch:?} (U+{code:04X}) cannot be encoded in font {font}")]
    UnsupportedChar {
        ch: char,
        code: u32,
        font: &'static str,
    },

    #[error("Invalid layout geometry: {0}")]
    Geometry(String),
}

/// Export-level error. Every variant collapses to one user-facing message.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Rendering the preview surface to an image failed.
    #[error("Capture failed: {0}")]
    Capture(String),

    #[error("Emission failed: {0}")]
    Emission(#[from] EmissionError),

    #[error("PDF serialization failed: {0}")]
    Pdf(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ExportError {
    /// Logs the error and returns the generic message the shell displays.
    pub fn user_message(&self) -> &'static str {
        match self {
            ExportError::Capture(msg) => tracing::error!("Capture error: {msg}"),
            ExportError::Emission(e) => tracing::error!("Emission error: {e}"),
            ExportError::Pdf(msg) => tracing::error!("PDF error: {msg}"),
            ExportError::Io(e) => tracing::error!("I/O error: {e}"),
            ExportError::Internal(e) => tracing::error!("Internal error: {e:?}"),
        }
        EXPORT_FAILED_MESSAGE
    }
}

impl From<image::ImageError> for ExportError {
    fn from(err: image::ImageError) -> Self {
        ExportError::Pdf(format!("image encoding: {err}"))
    }
}
