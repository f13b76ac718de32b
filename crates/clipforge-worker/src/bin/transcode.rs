//! One-shot transcode tool: runs the curtain rendition against a local file.

use std::path::PathBuf;

use clap::Parser;

use clipforge_media::{FfmpegTranscoder, Transcoder};
use clipforge_models::{TranscodeOptions, WatermarkOptions};

#[derive(Parser)]
#[command(name = "clipforge-transcode", about = "Render the processed rendition of a local video")]
struct Args {
    /// Path to the source video file.
    #[arg(long)]
    input: PathBuf,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if let Err(e) = transcode_file(&args.input).await {
        eprintln!("processing failed: {e}");
        std::process::exit(1);
    }
}

async fn transcode_file(input: &PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let transcoder = FfmpegTranscoder::new(
        std::env::var("FFMPEG_PATH").ok(),
        std::env::var("FFPROBE_PATH").ok(),
        std::env::var("VIDEO_TEMP_DIR").ok().map(PathBuf::from),
    )?;

    let options = TranscodeOptions {
        remove_audio: true,
        watermark: Some(WatermarkOptions {
            text: std::env::var("WATERMARK_TEXT").unwrap_or_default(),
            margin_x: 40,
            margin_y: 40,
            ..Default::default()
        }),
        ..Default::default()
    };

    let raw = tokio::fs::read(input).await?;
    let processed = transcoder.process(&raw, &options).await?;

    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "video".to_string());
    let output = input.with_file_name(format!("{}_processed.{}", stem, processed.format()));

    tokio::fs::copy(processed.path(), &output).await?;
    println!("processed video saved at: {}", output.display());

    Ok(())
}
