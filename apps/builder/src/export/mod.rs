//! Export orchestration: busy flag, strategy selection and atomic file output.
//!
//! `Exporter::export` is the only entry point. It refuses to start while a
//! previous export is still running, runs the selected template's strategy,
//! and writes the result through a temp file in the target directory that is
//! renamed into place only once complete.

pub mod capture;
pub mod strategy;

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use tracing::Instrument;
use uuid::Uuid;

use crate::errors::ExportError;
use crate::layout::{EmitterConfig, PageSize};
use crate::store::Snapshot;
use crate::templates::StrategyKind;

pub use capture::{CaptureSurface, PreviewSurface};
pub use strategy::{ExportStrategy, PaginatedStrategy, RasterStrategy, VectorStrategy};

#[derive(Debug, Clone)]
pub struct ExportSettings {
    pub output_dir: PathBuf,
    pub filename: String,
    /// Device pixels per CSS pixel for capture strategies.
    pub raster_scale: f32,
    pub page_size: PageSize,
}

impl ExportSettings {
    pub fn target_path(&self) -> PathBuf {
        self.output_dir.join(&self.filename)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    Written(PathBuf),
    /// Another export held the busy flag; nothing was done.
    AlreadyRunning,
}

/// Holds the busy flag for the lifetime of one export.
struct BusyGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> BusyGuard<'a> {
    fn try_acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| BusyGuard { flag })
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

pub struct Exporter {
    settings: ExportSettings,
    busy: AtomicBool,
    raster: Arc<dyn ExportStrategy>,
    paginated: Arc<dyn ExportStrategy>,
    vector: Arc<dyn ExportStrategy>,
}

impl Exporter {
    pub fn new(
        settings: ExportSettings,
        surface: Arc<dyn CaptureSurface>,
        emitter: EmitterConfig,
    ) -> Self {
        let (scale, page) = (settings.raster_scale, settings.page_size);
        Self {
            raster: Arc::new(RasterStrategy::new(Arc::clone(&surface), scale, page)),
            paginated: Arc::new(PaginatedStrategy::new(surface, scale, page)),
            vector: Arc::new(VectorStrategy::new(Arc::new(emitter))),
            settings,
            busy: AtomicBool::new(false),
        }
    }

    #[allow(dead_code)]
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    pub fn strategy_for(&self, kind: StrategyKind) -> Arc<dyn ExportStrategy> {
        match kind {
            StrategyKind::Raster => Arc::clone(&self.raster),
            StrategyKind::Paginated => Arc::clone(&self.paginated),
            StrategyKind::Vector => Arc::clone(&self.vector),
        }
    }

    /// Runs the snapshot's template strategy and writes the PDF.
    ///
    /// A trigger while another export is running returns `AlreadyRunning`.
    /// On failure no file is created or replaced and the flag is released.
    pub async fn export(&self, snapshot: Snapshot) -> Result<ExportOutcome, ExportError> {
        let Some(_guard) = BusyGuard::try_acquire(&self.busy) else {
            tracing::info!("Export already in progress; ignoring trigger");
            return Ok(ExportOutcome::AlreadyRunning);
        };

        let export_id = Uuid::new_v4();
        let strategy = self.strategy_for(snapshot.template.strategy());
        let span = tracing::info_span!(
            "export",
            %export_id,
            template = %snapshot.template,
            strategy = ?strategy.kind(),
        );

        async move {
            tracing::info!("Export started");
            let bytes = strategy.render(snapshot).await;
            let result = match bytes {
                Ok(bytes) => write_atomic(self.settings.target_path(), bytes).await,
                Err(e) => Err(e),
            };
            match &result {
                Ok(path) => tracing::info!(path = %path.display(), "Export finished"),
                Err(e) => tracing::error!("Export failed: {e}"),
            }
            result.map(ExportOutcome::Written)
        }
        .instrument(span)
        .await
    }
}

/// Writes `bytes` to `target` via a sibling temp file and a rename.
async fn write_atomic(target: PathBuf, bytes: Bytes) -> Result<PathBuf, ExportError> {
    let dir = match target.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    tokio::fs::create_dir_all(&dir).await?;

    tokio::task::spawn_blocking(move || persist_in(&dir, &target, &bytes).map(|()| target))
        .await
        .map_err(|e| {
            ExportError::Internal(anyhow::anyhow!("spawn_blocking failed writing export: {e}"))
        })?
}

fn persist_in(dir: &Path, target: &Path, bytes: &[u8]) -> Result<(), ExportError> {
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(target).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::resume::ResumeDocument;
    use crate::templates::TemplateId;
    use image::RgbaImage;

    struct SolidSurface;

    impl CaptureSurface for SolidSurface {
        fn capture(
            &self,
            _snapshot: &Snapshot,
            viewport_width: f32,
            scale: f32,
        ) -> Result<RgbaImage, ExportError> {
            let width = (viewport_width * scale) as u32;
            Ok(RgbaImage::from_pixel(width, 800, image::Rgba([255, 255, 255, 255])))
        }
    }

    struct BrokenSurface;

    impl CaptureSurface for BrokenSurface {
        fn capture(&self, _: &Snapshot, _: f32, _: f32) -> Result<RgbaImage, ExportError> {
            Err(ExportError::Capture("surface detached".to_string()))
        }
    }

    fn exporter(dir: &Path, surface: Arc<dyn CaptureSurface>) -> Exporter {
        let settings = ExportSettings {
            output_dir: dir.to_path_buf(),
            filename: "resume.pdf".to_string(),
            raster_scale: 1.0,
            page_size: PageSize::A4,
        };
        Exporter::new(settings, surface, EmitterConfig::default())
    }

    fn snapshot(template: TemplateId) -> Snapshot {
        let mut doc = ResumeDocument::default();
        doc.personal.first_name = "Jane".to_string();
        doc.personal.summary = "Backend engineer.".to_string();
        Snapshot {
            document: Arc::new(doc),
            template,
        }
    }

    fn pdf_files(dir: &Path) -> Vec<PathBuf> {
        std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect()
    }

    #[tokio::test]
    async fn test_export_writes_named_file() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = exporter(dir.path(), Arc::new(SolidSurface));
        let outcome = exporter.export(snapshot(TemplateId::Template6)).await.unwrap();
        let target = dir.path().join("resume.pdf");
        assert_eq!(outcome, ExportOutcome::Written(target.clone()));
        assert!(std::fs::read(&target).unwrap().starts_with(b"%PDF"));
        assert!(!exporter.is_busy());
    }

    #[tokio::test]
    async fn test_every_strategy_produces_a_file() {
        for template in [
            TemplateId::Template1,
            TemplateId::Template3,
            TemplateId::Template6,
        ] {
            let dir = tempfile::tempdir().unwrap();
            let exporter = exporter(dir.path(), Arc::new(SolidSurface));
            let outcome = exporter.export(snapshot(template)).await.unwrap();
            assert!(matches!(outcome, ExportOutcome::Written(_)), "{template}");
        }
    }

    #[tokio::test]
    async fn test_double_trigger_writes_exactly_one_file() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = exporter(dir.path(), Arc::new(SolidSurface));
        let (a, b) = tokio::join!(
            exporter.export(snapshot(TemplateId::Template1)),
            exporter.export(snapshot(TemplateId::Template1)),
        );
        let outcomes = [a.unwrap(), b.unwrap()];
        let written = outcomes
            .iter()
            .filter(|o| matches!(o, ExportOutcome::Written(_)))
            .count();
        assert_eq!(written, 1);
        assert!(outcomes.contains(&ExportOutcome::AlreadyRunning));
        assert_eq!(pdf_files(dir.path()).len(), 1);
    }

    #[tokio::test]
    async fn test_capture_failure_leaves_no_file_and_clears_flag() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = exporter(dir.path(), Arc::new(BrokenSurface));
        let err = exporter
            .export(snapshot(TemplateId::Template2))
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), crate::errors::EXPORT_FAILED_MESSAGE);
        assert!(pdf_files(dir.path()).is_empty());
        assert!(!exporter.is_busy());

        // The session stays usable: a vector export still succeeds.
        let outcome = exporter.export(snapshot(TemplateId::Template6)).await.unwrap();
        assert!(matches!(outcome, ExportOutcome::Written(_)));
    }

    #[tokio::test]
    async fn test_emission_failure_keeps_previous_file_intact() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = exporter(dir.path(), Arc::new(SolidSurface));
        exporter.export(snapshot(TemplateId::Template6)).await.unwrap();
        let target = dir.path().join("resume.pdf");
        let before = std::fs::read(&target).unwrap();

        let mut doc = ResumeDocument::default();
        doc.personal.first_name = "李".to_string();
        let bad = Snapshot {
            document: Arc::new(doc),
            template: TemplateId::Template6,
        };
        assert!(matches!(
            exporter.export(bad).await,
            Err(ExportError::Emission(_))
        ));
        assert_eq!(std::fs::read(&target).unwrap(), before);
        assert_eq!(pdf_files(dir.path()).len(), 1);
    }

    #[tokio::test]
    async fn test_missing_output_dir_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("out").join("pdf");
        let exporter = exporter(&nested, Arc::new(SolidSurface));
        exporter.export(snapshot(TemplateId::Template6)).await.unwrap();
        assert!(nested.join("resume.pdf").is_file());
    }
}
