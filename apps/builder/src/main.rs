mod config;
mod errors;
mod export;
mod layout;
mod models;
mod pdf;
mod raster;
mod routes;
mod store;
mod templates;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::export::{ExportOutcome, Exporter, PreviewSurface};
use crate::layout::EmitterConfig;
use crate::models::resume::ResumeDocument;
use crate::raster::FontSet;
use crate::routes::Route;
use crate::store::ResumeStore;

const USAGE: &str = "usage: builder <resume.json> [route]";

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting resume builder v{}", env!("CARGO_PKG_VERSION"));

    let mut args = std::env::args().skip(1);
    let input = args.next().map(PathBuf::from).context(USAGE)?;
    let route = Route::parse(args.next().as_deref().unwrap_or("/builder"));

    let raw = tokio::fs::read_to_string(&input)
        .await
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let document: ResumeDocument = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a valid resume document", input.display()))?;

    let mut store = ResumeStore::new();
    store.update_document(document)?;

    match &route {
        Route::Builder { .. } => {
            route.apply(&mut store);
        }
        Route::Home => {
            for meta in templates::catalog() {
                println!("{:<10} {:<14} {:?}  {}", meta.id, meta.name, meta.strategy, meta.description);
            }
            return Ok(());
        }
        Route::NotFound(path) => anyhow::bail!("No page at '{path}'"),
    }
    info!("Template: {}", store.template());

    let fonts = FontSet::load(config.font_path.as_deref())?;
    let surface = Arc::new(PreviewSurface::new(Arc::new(fonts)));
    let exporter = Exporter::new(config.export_settings(), surface, EmitterConfig::default());

    match exporter.export(store.snapshot()).await {
        Ok(ExportOutcome::Written(path)) => println!("Saved {}", path.display()),
        Ok(ExportOutcome::AlreadyRunning) => println!("An export is already running"),
        Err(e) => {
            eprintln!("{}", e.user_message());
            std::process::exit(1);
        }
    }

    Ok(())
}
