use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use futures::future::try_join_all;
use scenesnap::{SceneLibrary, SnapshotConfig, SnapshotTool};

/// Capture off-screen previews of whiteboard scenes
#[derive(Parser, Debug)]
#[command(name = "scenesnap", version)]
struct Args {
    /// Scene library (JSON)
    #[arg(long)]
    scenes: PathBuf,

    /// Scene path to capture, e.g. /lesson/intro (repeatable)
    #[arg(long = "scene", required = true)]
    scene: Vec<String>,

    #[arg(long, default_value_t = 640)]
    width: u32,

    #[arg(long, default_value_t = 360)]
    height: u32,

    /// Snapshot configuration (JSON); flags below override its fields
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output MIME type (image/png or image/jpeg)
    #[arg(long)]
    format: Option<String>,

    /// Lossy encoding quality, 0.0 to 1.0
    #[arg(long)]
    quality: Option<f32>,

    /// Abort a capture after this many milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Directory to write image files into
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// Print data URLs to stdout instead of writing files
    #[arg(long)]
    data_url: bool,
}

/// `/lesson/intro` -> `lesson_intro`
fn file_stem(scene_path: &str) -> String {
    let stem: String = scene_path
        .trim_start_matches('/')
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    if stem.is_empty() { "scene".to_string() } else { stem }
}

/// Load `--config` if given, then apply the per-flag overrides.
fn snapshot_config(args: &Args) -> Result<SnapshotConfig> {
    let mut config = match &args.config {
        Some(path) => SnapshotConfig::from_path(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => SnapshotConfig::default(),
    };
    if args.format.is_some() {
        config.format = args.format.clone();
    }
    if args.quality.is_some() {
        config.quality = args.quality;
    }
    if args.timeout_ms.is_some() {
        config.timeout_ms = args.timeout_ms;
    }
    Ok(config)
}

#[tokio::main]
async fn main() {
    env_logger::init();
    if let Err(e) = run(Args::parse()).await {
        eprintln!("scenesnap: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    let library = SceneLibrary::from_path(&args.scenes)
        .with_context(|| format!("loading scene library {}", args.scenes.display()))?;
    let config = snapshot_config(&args)?;
    let format = config.image_format();
    let tool = SnapshotTool::headless(library, config);

    if args.data_url {
        let urls = try_join_all(
            args.scene
                .iter()
                .map(|s| tool.preview_data_url(s, args.width, args.height)),
        )
        .await?;
        for url in urls {
            println!("{}", url);
        }
        return Ok(());
    }

    let blobs = try_join_all(
        args.scene
            .iter()
            .map(|s| tool.preview_blob(s, args.width, args.height)),
    )
    .await?;

    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("creating {}", args.out_dir.display()))?;
    for (scene, blob) in args.scene.iter().zip(blobs) {
        let Some(blob) = blob else {
            log::warn!("{} produced no image", scene);
            continue;
        };
        let path = args
            .out_dir
            .join(format!("{}.{}", file_stem(scene), format.extension()));
        std::fs::write(&path, &blob.bytes)
            .with_context(|| format!("writing {}", path.display()))?;
        println!("{} -> {} ({} bytes)", scene, path.display(), blob.size());
    }
    Ok(())
}
