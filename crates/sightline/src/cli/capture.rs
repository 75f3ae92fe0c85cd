//! The `sightline capture` command.
//!
//! Runs the full pipeline against a file-backed camera device. Ctrl-C while
//! the pipeline runs exercises cooperative cancellation.

use clap::Args;
use sightline_core::{
    CancelToken, CapturePipeline, CaptureRequest, Config, FileCamera, FlashMode, ImageCacheStore,
};
use std::path::PathBuf;
use std::sync::Arc;

/// Arguments for the `capture` command.
#[derive(Args, Debug)]
pub struct CaptureArgs {
    /// Image file standing in for the camera device
    #[arg(short, long)]
    pub input: PathBuf,

    /// Persist the processed photo into the cache under this record id
    #[arg(long)]
    pub record_id: Option<u64>,

    /// Capture with the front-facing camera
    #[arg(long)]
    pub front: bool,

    /// Flash mode: off, on, auto
    #[arg(long, default_value = "off")]
    pub flash: FlashMode,
}

/// Execute the capture command.
pub async fn execute(args: CaptureArgs, config: &Config) -> anyhow::Result<()> {
    let device = Arc::new(FileCamera::new(&args.input));
    let pipeline = CapturePipeline::with_resizer(device, &config.capture);

    let token = CancelToken::new();
    let request = CaptureRequest {
        use_front_facing: args.front,
        flash_mode: args.flash,
        token: token.clone(),
    };

    // Ctrl-C maps to a cooperative cancel, as the capture screen's cancel
    // button would
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            token.cancel();
        }
    });

    let photo = pipeline.capture(&request).await?;
    println!("{}", serde_json::to_string_pretty(&photo)?);

    if let Some(record_id) = args.record_id {
        let cache = ImageCacheStore::new(config.cache_root(), config.cache.clone());
        let bytes = tokio::fs::read(&photo.path).await?;
        let entry = cache.save_bytes(record_id, bytes).await?;
        tracing::info!(
            "Cached record {record_id} at {:?}",
            entry.full_image_path
        );
        println!("{}", serde_json::to_string_pretty(&entry)?);
    }

    Ok(())
}
