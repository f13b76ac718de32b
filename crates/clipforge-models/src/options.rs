//! Transcoding options handed to the media engine, built once per task.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Corner the watermark text is anchored to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum WatermarkPosition {
    TopLeft,
    TopRight,
    BottomLeft,
    #[default]
    BottomRight,
    Center,
}

/// Text overlay configuration. Unset fields are filled with defaults by the
/// media engine before the filter graph is built.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WatermarkOptions {
    pub text: String,
    pub font_file: Option<String>,
    pub font_color: String,
    pub font_size: u32,
    pub border_width: u32,
    pub border_color: String,
    pub position: WatermarkPosition,
    pub margin_x: u32,
    pub margin_y: u32,
    /// How long the overlay stays visible from the start of the content.
    pub start_duration: Duration,
    /// How long the overlay stays visible before the end of the content.
    pub end_duration: Duration,
}

/// Target shape of one transcoding run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscodeOptions {
    pub clip_duration: Duration,
    pub target_width: u32,
    pub target_height: u32,
    pub target_format: String,
    pub remove_audio: bool,
    pub watermark: Option<WatermarkOptions>,
}

impl Default for TranscodeOptions {
    fn default() -> Self {
        Self {
            clip_duration: Duration::from_secs(30),
            target_width: 1280,
            target_height: 720,
            target_format: "mp4".to_string(),
            remove_audio: false,
            watermark: None,
        }
    }
}
