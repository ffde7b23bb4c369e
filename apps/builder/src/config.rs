use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::export::ExportSettings;
use crate::layout::page::PageSize;

/// Shell configuration loaded from environment variables (a `.env` file is
/// read first when present). Every variable has a default.
#[derive(Debug, Clone)]
pub struct Config {
    pub output_dir: PathBuf,
    pub filename: String,
    /// TrueType font for capture strategies; system fonts are searched when unset.
    pub font_path: Option<PathBuf>,
    pub raster_scale: f32,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let raster_scale = get("RESUME_RASTER_SCALE")
            .unwrap_or_else(|| "2.0".to_string())
            .parse::<f32>()
            .context("RESUME_RASTER_SCALE must be a number")?;
        if !(raster_scale > 0.0 && raster_scale <= 8.0) {
            anyhow::bail!("RESUME_RASTER_SCALE must be in (0, 8], got {raster_scale}");
        }

        let filename = get("RESUME_FILENAME").unwrap_or_else(|| "resume.pdf".to_string());
        if filename.is_empty() || filename.contains(['/', '\\']) {
            anyhow::bail!("RESUME_FILENAME must be a plain file name, got '{filename}'");
        }

        Ok(Config {
            output_dir: PathBuf::from(get("RESUME_OUTPUT_DIR").unwrap_or_else(|| ".".to_string())),
            filename,
            font_path: get("RESUME_FONT_PATH")
                .filter(|p| !p.is_empty())
                .map(PathBuf::from),
            raster_scale,
            rust_log: get("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }

    pub fn export_settings(&self) -> ExportSettings {
        ExportSettings {
            output_dir: self.output_dir.clone(),
            filename: self.filename.clone(),
            raster_scale: self.raster_scale,
            page_size: PageSize::A4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.output_dir, PathBuf::from("."));
        assert_eq!(config.filename, "resume.pdf");
        assert_eq!(config.font_path, None);
        assert_eq!(config.raster_scale, 2.0);
        assert_eq!(config.rust_log, "info");
        assert_eq!(
            config.export_settings().target_path(),
            PathBuf::from("./resume.pdf")
        );
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("RESUME_OUTPUT_DIR", "/tmp/out"),
            ("RESUME_FILENAME", "cv.pdf"),
            ("RESUME_FONT_PATH", "/fonts/Inter.ttf"),
            ("RESUME_RASTER_SCALE", "1.5"),
        ]))
        .unwrap();
        assert_eq!(config.export_settings().target_path(), PathBuf::from("/tmp/out/cv.pdf"));
        assert_eq!(config.font_path, Some(PathBuf::from("/fonts/Inter.ttf")));
        assert_eq!(config.raster_scale, 1.5);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(Config::from_lookup(lookup(&[("RESUME_RASTER_SCALE", "big")])).is_err());
        assert!(Config::from_lookup(lookup(&[("RESUME_RASTER_SCALE", "0")])).is_err());
        assert!(Config::from_lookup(lookup(&[("RESUME_FILENAME", "../x.pdf")])).is_err());
    }
}
