use linelab_core::{LineStimulus, StimulusKind, Trial};

/// Stroke width of a stimulus line, in inches.
const STROKE_WIDTH_IN: f32 = 0.1;

const BLACK: [u8; 4] = [0, 0, 0, 255];

/// One stroke instruction in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineDraw {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    pub width: f32,
    pub color: [u8; 4],
}

/// Maps a trial to its two line drawings. Pure: canvas size and the
/// pixels-per-inch calibration arrive as arguments, the anchors sit at a
/// quarter and three quarters of the canvas width on the vertical center.
pub fn layout_trial(
    trial: &Trial,
    kind: StimulusKind,
    canvas_w: f32,
    canvas_h: f32,
    pixels_per_inch: f32,
) -> [LineDraw; 2] {
    let y = canvas_h / 2.0;
    [
        layout_line(&trial.first, kind, canvas_w * 0.25, y, pixels_per_inch),
        layout_line(&trial.second, kind, canvas_w * 0.75, y, pixels_per_inch),
    ]
}

/// Tilt rotates the line about its center; positive angles raise the right
/// end (screen y grows downward).
fn layout_line(
    stimulus: &LineStimulus,
    kind: StimulusKind,
    cx: f32,
    cy: f32,
    pixels_per_inch: f32,
) -> LineDraw {
    let half = stimulus.length as f32 * pixels_per_inch / 2.0;
    let (tilt_deg, color) = match kind {
        StimulusKind::Tilt => (stimulus.attribute.unwrap_or(0.0) as f32, BLACK),
        StimulusKind::Saturation => (0.0, saturation_color(stimulus.attribute.unwrap_or(0.0))),
        StimulusKind::LengthOnly => (0.0, BLACK),
    };
    let radians = tilt_deg.to_radians();

    LineDraw {
        x1: cx - half * radians.cos(),
        y1: cy + half * radians.sin(),
        x2: cx + half * radians.cos(),
        y2: cy - half * radians.sin(),
        width: STROKE_WIDTH_IN * pixels_per_inch,
        color,
    }
}

/// Fixed-hue color scale for saturation stimuli: HSL(0°, s%, 50%) for s in
/// [0, 100], clamped. At this hue and lightness the conversion collapses to
/// r = ½ + s/2, g = b = ½ − s/2.
pub fn saturation_color(saturation_pct: f64) -> [u8; 4] {
    let s = (saturation_pct / 100.0).clamp(0.0, 1.0) as f32;
    let hi = ((0.5 + s / 2.0) * 255.0).round() as u8;
    let lo = ((0.5 - s / 2.0) * 255.0).round() as u8;
    [hi, lo, lo, 255]
}
