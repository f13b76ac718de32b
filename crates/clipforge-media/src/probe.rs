//! ffprobe lookups for duration and frame rate.

use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;

use crate::error::{MediaError, MediaResult};

/// Probe the container duration in seconds. `Ok(None)` means the container
/// reports a non-positive duration; errors mean the probe itself failed.
pub async fn probe_duration(ffprobe: &str, path: &Path) -> MediaResult<Option<f64>> {
    let output = Command::new(ffprobe)
        .args([
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ])
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        return Err(MediaError::ffprobe_failed(format!(
            "duration probe: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    let text = String::from_utf8_lossy(&output.stdout);
    let text = text.trim();
    if text.is_empty() {
        return Err(MediaError::ffprobe_failed("empty duration"));
    }

    let seconds: f64 = text
        .parse()
        .map_err(|e| MediaError::ffprobe_failed(format!("parse duration {text:?}: {e}")))?;

    if seconds <= 0.0 {
        Ok(None)
    } else {
        Ok(Some(seconds))
    }
}

/// Probe the average frame rate of the first video stream, as an ffmpeg rate
/// expression. Unavailable rates ("N/A", "0/0") are errors the caller
/// replaces with a default.
pub async fn probe_frame_rate(ffprobe: &str, path: &Path) -> MediaResult<String> {
    let output = Command::new(ffprobe)
        .args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=avg_frame_rate",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ])
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        return Err(MediaError::ffprobe_failed(format!(
            "frame rate probe: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    let rate = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if rate.is_empty() || rate == "N/A" || rate == "0/0" {
        return Err(MediaError::ffprobe_failed("frame rate unavailable"));
    }

    Ok(rate)
}
