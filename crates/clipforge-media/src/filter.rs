//! Filter-graph construction for the curtain rendition.
//!
//! The graph has three concatenated segments of identical resolution, pixel
//! format, and frame rate: a solid opening curtain, the scaled and padded
//! content, and a closing curtain. The watermark, when present, overlays the
//! content only inside its enable window and both curtains for their whole
//! duration.

use crate::watermark::{drawtext_args, NormalizedWatermark};

/// Seconds of solid color before and after the content.
pub const CURTAIN_SECONDS: f64 = 2.5;

/// Inputs for one graph build.
#[derive(Debug, Clone)]
pub struct FilterParams<'a> {
    pub width: u32,
    pub height: u32,
    /// ffprobe rate expression, e.g. "30" or "30000/1001".
    pub frame_rate: &'a str,
    pub content_seconds: f64,
    pub watermark: Option<&'a NormalizedWatermark>,
}

/// Build the full `-filter_complex` expression, ending in `[vout]`.
pub fn build_filter_graph(params: &FilterParams<'_>) -> String {
    let FilterParams {
        width,
        height,
        frame_rate,
        content_seconds,
        watermark,
    } = params;

    let mut base = vec![
        format!("scale={width}:{height}:force_original_aspect_ratio=decrease"),
        format!("pad={width}:{height}:({width}-iw)/2:({height}-ih)/2"),
        "setsar=1".to_string(),
        "format=yuv420p".to_string(),
        format!("fps={frame_rate}"),
    ];
    if *content_seconds > 0.0 {
        base.push(format!("trim=duration={content_seconds:.3}"));
        base.push("setpts=PTS-STARTPTS".to_string());
    }

    let mut parts = vec![format!("[0:v]{}[vbase]", base.join(","))];

    let mut main_label = "vbase";
    if let Some(wm) = watermark {
        parts.push(format!("[{}]drawtext={}[vmain]", main_label, drawtext_args(wm, true)));
        main_label = "vmain";
    }

    let curtain = format!(
        "color=c=black:size={width}x{height}:rate={frame_rate}:d={CURTAIN_SECONDS:.3},format=yuv420p,setsar=1"
    );
    parts.push(format!("{curtain}[vcurtain_start_base]"));
    parts.push(format!("{curtain}[vcurtain_end_base]"));

    let (mut start_label, mut end_label) = ("vcurtain_start_base", "vcurtain_end_base");
    if let Some(wm) = watermark {
        let curtain_args = drawtext_args(wm, false);
        parts.push(format!("[{start_label}]drawtext={curtain_args}[vcurtain_start]"));
        parts.push(format!("[{end_label}]drawtext={curtain_args}[vcurtain_end]"));
        start_label = "vcurtain_start";
        end_label = "vcurtain_end";
    }

    parts.push(format!(
        "[{start_label}][{main_label}][{end_label}]concat=n=3:v=1:a=0[vout]"
    ));

    parts.join(";")
}
