//! Media transcoding engine.
//!
//! Drives ffmpeg/ffprobe subprocesses to produce the processed rendition of
//! a raw upload: curtains front and back, scaled and padded content, an
//! optional text watermark, and a clamped total duration. The output is
//! handed back as an owning temp-file artifact that cleans up on drop.

pub mod artifact;
pub mod error;
pub mod filter;
pub mod probe;
pub mod transcode;
pub mod watermark;

use async_trait::async_trait;

use clipforge_models::TranscodeOptions;

pub use artifact::ProcessedVideo;
pub use error::{MediaError, MediaResult};
pub use transcode::FfmpegTranscoder;

/// Contract for transforming a raw video into its processed rendition.
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Transform `input` according to `opts`. The returned artifact owns a
    /// temp file that is deleted when the artifact is dropped.
    async fn process(&self, input: &[u8], opts: &TranscodeOptions) -> MediaResult<ProcessedVideo>;
}
