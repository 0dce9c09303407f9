mod artifacts;
mod backend;
mod bundle;
mod catalog;
mod error;
mod events;
mod orchestrator;
mod stage;
#[cfg(test)]
mod testing;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::Parser;
use fr_core::{DEFAULT_GARMENT_COLOR, GarmentSize, Gender, Quality};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::artifacts::AvatarProfile;
use crate::backend::HttpBackend;
use crate::backend::config::ServiceConfig;
use crate::orchestrator::Orchestrator;
use crate::stage::Stage;

/// Turn a photo into a 3D avatar and optionally fit a garment to it
#[derive(Parser, Debug)]
#[command(name = "fitroom", version)]
struct Args {
    /// JPEG or PNG photo of the person
    image: PathBuf,

    /// male, female or neutral
    #[arg(short, long)]
    gender: Gender,

    /// Height in centimetres
    #[arg(long)]
    height: f32,

    /// Weight in kilograms
    #[arg(long)]
    weight: Option<f32>,

    /// Garment to try on, e.g. `hoodie`. Without it only the avatar is generated.
    #[arg(long)]
    garment: Option<String>,

    #[arg(long, default_value_t = GarmentSize::M)]
    size: GarmentSize,

    /// 1 to 10
    #[arg(long, default_value_t = 5, value_parser = clap::value_parser!(u8).range(1..=10))]
    quality: u8,

    #[arg(long, default_value = DEFAULT_GARMENT_COLOR)]
    color: String,

    /// Where the downloaded model is written
    #[arg(short, long, default_value = "outputs")]
    out: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = ServiceConfig::load()?;
    info!(url = %config.base_url, timeout = ?config.timeout, "using generation service");

    let backend = HttpBackend::new(config.clone())?;
    let mut pipeline = Orchestrator::new(Arc::new(backend), config.max_image_bytes);
    info!(session = %pipeline.session(), step = pipeline.step().title(), "pipeline started");

    let bytes = std::fs::read(&args.image)
        .with_context(|| format!("reading {}", args.image.display()))?;
    pipeline.capture_image(bytes, None)?;
    pipeline.set_profile(AvatarProfile::new(args.gender, args.height, args.weight)?)?;

    pipeline.submit_generation()?;
    pipeline.settle().await;
    if let Some(message) = pipeline.error_message(Stage::Generation) {
        bail!("{message}");
    }
    if let Some(scene) = pipeline.display_scene() {
        info!(
            vertices = scene.scene.vertex_count(),
            triangles = scene.scene.triangle_count(),
            extent = scene.max_dimension(),
            "avatar ready"
        );
    }

    if let Some(garment) = &args.garment {
        if let Some(message) = pipeline.error_message(Stage::Catalog) {
            warn!("{message}");
        } else {
            let available: Vec<&str> = pipeline
                .store()
                .catalog()
                .items()
                .iter()
                .map(|item| item.garment.as_str())
                .collect();
            info!(?available, "garment catalog");
        }

        let quality = Quality::new(args.quality).context("quality out of range")?;
        let step = pipeline.next_step()?;
        info!(session = %pipeline.session(), step = step.title(), "choosing garment");
        pipeline.update_selection(|selection| {
            selection.garment = Some(garment.clone());
            selection.size = args.size;
            selection.quality = quality;
            selection.color = args.color.clone();
        })?;

        pipeline.submit_try_on()?;
        pipeline.settle().await;
        if let Some(message) = pipeline.error_message(Stage::TryOn) {
            bail!("{message}");
        }
        info!(garment = %garment, stage = %pipeline.stage(), "garment fitted");
    }

    let Some(bundle) = pipeline.download_bundle()? else {
        bail!("nothing to save");
    };
    let path = bundle.write_to(&args.out)?;
    info!(path = %path.display(), "model saved");

    Ok(())
}
