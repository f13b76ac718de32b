//! Watermark normalization and drawtext argument building.

use clipforge_models::{WatermarkOptions, WatermarkPosition};

const DEFAULT_TEXT: &str = "Watermark";
const DEFAULT_FONT_COLOR: &str = "white";
const DEFAULT_FONT_SIZE: u32 = 48;
const DEFAULT_BORDER_COLOR: &str = "black";

/// Watermark settings with every field resolved against the clip length.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedWatermark {
    pub text: String,
    pub font_file: Option<String>,
    pub font_color: String,
    pub font_size: u32,
    pub border_width: u32,
    pub border_color: String,
    pub position: WatermarkPosition,
    pub margin_x: u32,
    pub margin_y: u32,
    /// Overlay visible from t=0 until this many seconds into the content.
    pub start_seconds: f64,
    /// Overlay visible again from this timestamp until the content ends.
    pub end_trigger_seconds: f64,
}

/// Fill unset fields and derive the enable window from the clip length.
///
/// Fade windows default to min(3 s, max(0.5 s, clip)) and are never longer
/// than the content itself.
pub fn normalize(opts: &WatermarkOptions, clip_seconds: f64) -> NormalizedWatermark {
    let text = if opts.text.is_empty() {
        DEFAULT_TEXT.to_string()
    } else {
        opts.text.clone()
    };

    let font_color = if opts.font_color.is_empty() {
        DEFAULT_FONT_COLOR.to_string()
    } else {
        opts.font_color.clone()
    };

    let font_size = if opts.font_size == 0 {
        DEFAULT_FONT_SIZE
    } else {
        opts.font_size
    };

    let border_color = if opts.border_color.is_empty() {
        DEFAULT_BORDER_COLOR.to_string()
    } else {
        opts.border_color.clone()
    };

    let start = resolve_window(opts.start_duration.as_secs_f64(), clip_seconds);
    let end = resolve_window(opts.end_duration.as_secs_f64(), clip_seconds);
    let end_trigger = (clip_seconds - end).max(0.0);

    NormalizedWatermark {
        text,
        font_file: opts.font_file.clone(),
        font_color,
        font_size,
        border_width: opts.border_width,
        border_color,
        position: opts.position,
        margin_x: opts.margin_x,
        margin_y: opts.margin_y,
        start_seconds: start,
        end_trigger_seconds: end_trigger,
    }
}

fn resolve_window(requested: f64, clip_seconds: f64) -> f64 {
    let mut window = if requested <= 0.0 {
        clip_seconds.max(0.5).min(3.0)
    } else {
        requested
    };
    if clip_seconds > 0.0 {
        window = window.min(clip_seconds);
    }
    window
}

/// drawtext x/y expressions for a corner position with the given margins.
pub fn position_expressions(
    position: WatermarkPosition,
    margin_x: u32,
    margin_y: u32,
) -> (String, String) {
    match position {
        WatermarkPosition::TopLeft => (margin_x.to_string(), margin_y.to_string()),
        WatermarkPosition::TopRight => (format!("w-text_w-{margin_x}"), margin_y.to_string()),
        WatermarkPosition::BottomLeft => (margin_x.to_string(), format!("h-text_h-{margin_y}")),
        WatermarkPosition::Center => ("(w-text_w)/2".to_string(), "(h-text_h)/2".to_string()),
        WatermarkPosition::BottomRight => (
            format!("w-text_w-{margin_x}"),
            format!("h-text_h-{margin_y}"),
        ),
    }
}

/// Build the drawtext filter arguments. With `include_enable` the overlay is
/// limited to the start and end windows; curtains draw it unconditionally.
pub fn drawtext_args(wm: &NormalizedWatermark, include_enable: bool) -> String {
    let (x, y) = position_expressions(wm.position, wm.margin_x, wm.margin_y);

    let mut args = Vec::new();
    if let Some(font_file) = &wm.font_file {
        args.push(format!("fontfile='{}'", escape_font_path(font_file)));
    }
    args.push(format!("text='{}'", escape_drawtext(&wm.text)));
    args.push(format!("fontcolor={}", wm.font_color));
    args.push(format!("fontsize={}", wm.font_size));
    args.push(format!("borderw={}", wm.border_width));
    if wm.border_width > 0 {
        args.push(format!("bordercolor={}", wm.border_color));
    }
    args.push(format!("x={x}"));
    args.push(format!("y={y}"));
    if include_enable {
        args.push(format!(
            "enable='lte(t,{:.3})+gte(t,{:.3})'",
            wm.start_seconds, wm.end_trigger_seconds
        ));
    }

    args.join(":")
}

fn escape_drawtext(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace(':', "\\:")
        .replace('\'', "\\\\'")
        .replace('\n', "\\\\n")
}

fn escape_font_path(value: &str) -> String {
    value.replace('\\', "/").replace('\'', "\\\\'")
}
