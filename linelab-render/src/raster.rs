use crate::layout::{LineDraw, layout_trial};
use anyhow::Result;
use linelab_core::{StimulusKind, Trial};
use tiny_skia::{Color, Paint, PathBuilder, Pixmap, Stroke, Transform};

/// Strokes layout instructions into a pixmap.
pub fn draw_lines(pixmap: &mut Pixmap, draws: &[LineDraw]) -> Result<()> {
    for draw in draws {
        let mut paint = Paint::default();
        paint.set_color(Color::from_rgba8(
            draw.color[0],
            draw.color[1],
            draw.color[2],
            draw.color[3],
        ));
        paint.anti_alias = true;

        let mut builder = PathBuilder::new();
        builder.move_to(draw.x1, draw.y1);
        builder.line_to(draw.x2, draw.y2);
        let path = builder
            .finish()
            .ok_or_else(|| anyhow::anyhow!("degenerate stimulus path"))?;

        let stroke = Stroke {
            width: draw.width,
            ..Stroke::default()
        };
        pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
    }
    Ok(())
}

/// Draws a trial's stimulus pair across the full pixmap.
pub fn render_trial(
    pixmap: &mut Pixmap,
    trial: &Trial,
    kind: StimulusKind,
    pixels_per_inch: f32,
) -> Result<()> {
    let draws = layout_trial(
        trial,
        kind,
        pixmap.width() as f32,
        pixmap.height() as f32,
        pixels_per_inch,
    );
    draw_lines(pixmap, &draws)
}
