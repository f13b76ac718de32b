//! ffmpeg transcoder implementation.

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, warn};
use uuid::Uuid;

use async_trait::async_trait;

use clipforge_models::TranscodeOptions;

use crate::artifact::ProcessedVideo;
use crate::error::{MediaError, MediaResult};
use crate::filter::{build_filter_graph, FilterParams, CURTAIN_SECONDS};
use crate::probe::{probe_duration, probe_frame_rate};
use crate::watermark::normalize;
use crate::Transcoder;

const DEFAULT_CLIP_SECONDS: f64 = 30.0;
const DEFAULT_WIDTH: u32 = 1280;
const DEFAULT_HEIGHT: u32 = 720;
const DEFAULT_FRAME_RATE: &str = "30";

/// Transcoder driving external ffmpeg/ffprobe binaries.
#[derive(Debug, Clone)]
pub struct FfmpegTranscoder {
    ffmpeg: String,
    ffprobe: String,
    temp_dir: PathBuf,
}

impl FfmpegTranscoder {
    /// Resolve tool paths and the temp directory. Empty/None values fall
    /// back to PATH lookup and the system temp dir; a missing binary is a
    /// bootstrap failure.
    pub fn new(
        ffmpeg_path: Option<String>,
        ffprobe_path: Option<String>,
        temp_dir: Option<PathBuf>,
    ) -> MediaResult<Self> {
        let ffmpeg = match ffmpeg_path.filter(|p| !p.is_empty()) {
            Some(path) => path,
            None => which::which("ffmpeg")
                .map_err(|_| MediaError::FfmpegNotFound)?
                .to_string_lossy()
                .into_owned(),
        };
        let ffprobe = match ffprobe_path.filter(|p| !p.is_empty()) {
            Some(path) => path,
            None => which::which("ffprobe")
                .map_err(|_| MediaError::FfprobeNotFound)?
                .to_string_lossy()
                .into_owned(),
        };
        let temp_dir = temp_dir.unwrap_or_else(std::env::temp_dir);

        Ok(Self {
            ffmpeg,
            ffprobe,
            temp_dir,
        })
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    async fn process(&self, input: &[u8], opts: &TranscodeOptions) -> MediaResult<ProcessedVideo> {
        let input_path = self
            .temp_dir
            .join(format!("ffmpeg-input-{}.mp4", Uuid::new_v4()));
        tokio::fs::write(&input_path, input).await?;
        let _input_guard = TempGuard(input_path.clone());

        let probed = match probe_duration(&self.ffprobe, &input_path).await {
            Ok(seconds) => seconds,
            Err(e) => {
                warn!(error = %e, "duration probe failed");
                None
            }
        };

        let frame_rate = match probe_frame_rate(&self.ffprobe, &input_path).await {
            Ok(rate) => rate,
            Err(e) => {
                debug!(error = %e, "frame rate probe failed");
                DEFAULT_FRAME_RATE.to_string()
            }
        };

        let content_seconds = effective_clip_seconds(opts.clip_duration.as_secs_f64(), probed);
        let total_seconds = content_seconds + 2.0 * CURTAIN_SECONDS;

        let width = if opts.target_width == 0 {
            DEFAULT_WIDTH
        } else {
            opts.target_width
        };
        let height = if opts.target_height == 0 {
            DEFAULT_HEIGHT
        } else {
            opts.target_height
        };

        let watermark = opts
            .watermark
            .as_ref()
            .map(|wm| normalize(wm, content_seconds));
        let filter = build_filter_graph(&FilterParams {
            width,
            height,
            frame_rate: &frame_rate,
            content_seconds,
            watermark: watermark.as_ref(),
        });

        let format = normalize_format(&opts.target_format);
        let output_path = self
            .temp_dir
            .join(format!("ffmpeg-output-{}.{}", Uuid::new_v4(), format));

        let mut cmd = Command::new(&self.ffmpeg);
        cmd.arg("-y")
            .arg("-i")
            .arg(&input_path)
            .arg("-filter_complex")
            .arg(&filter)
            .args(["-map", "[vout]"])
            .args(["-c:v", "libx264", "-preset", "veryfast"])
            .args(["-pix_fmt", "yuv420p"])
            .args(["-movflags", "+faststart"]);
        if opts.remove_audio {
            cmd.arg("-an");
        }
        cmd.arg("-t").arg(format!("{total_seconds:.3}"));
        cmd.arg(&output_path);

        debug!(filter = %filter, output = %output_path.display(), "running ffmpeg");

        let output = cmd
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await?;

        if !output.status.success() {
            let _ = tokio::fs::remove_file(&output_path).await;
            return Err(MediaError::ffmpeg_failed(
                "ffmpeg exited with non-zero status",
                Some(String::from_utf8_lossy(&output.stderr).into_owned()),
                output.status.code(),
            ));
        }

        let metadata = HashMap::from([
            (
                "clip_duration_seconds".to_string(),
                format!("{content_seconds:.3}"),
            ),
            (
                "curtain_segment_seconds".to_string(),
                format!("{CURTAIN_SECONDS:.3}"),
            ),
            (
                "total_duration_seconds".to_string(),
                format!("{total_seconds:.3}"),
            ),
            ("frame_rate".to_string(), frame_rate),
            ("target_width".to_string(), width.to_string()),
            ("target_height".to_string(), height.to_string()),
        ]);

        Ok(ProcessedVideo::new(
            output_path,
            format,
            Duration::from_secs_f64(total_seconds),
            metadata,
        ))
    }
}

/// The content length actually rendered: the requested clip bounded by the
/// probed duration, falling back to 30 s when neither is usable.
fn effective_clip_seconds(requested: f64, probed: Option<f64>) -> f64 {
    let mut clip = if requested <= 0.0 {
        DEFAULT_CLIP_SECONDS
    } else {
        requested
    };
    if let Some(duration) = probed {
        if duration > 0.0 && clip > duration {
            clip = duration;
        }
    }
    if clip <= 0.0 {
        clip = DEFAULT_CLIP_SECONDS;
    }
    clip
}

fn normalize_format(format: &str) -> String {
    let trimmed = format.trim().trim_start_matches('.');
    if trimmed.is_empty() {
        "mp4".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Deletes the wrapped path when dropped.
struct TempGuard(PathBuf);

impl Drop for TempGuard {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.0);
    }
}
