//! Text watermark: one shaped line stamped along a 45 degree rotated lattice.

use kurbo::{Affine, Point};

use crate::assets::codec::RasterBuffer;
use crate::assets::color::ColorSpec;
use crate::assets::font::{FontFace, TextBrushRgba8, TextLayoutEngine};
use crate::foundation::error::{WatermarkError, WatermarkResult};
use crate::render::composite::premul_over_in_place;
use crate::render::tile::{TileGrid, text_pitch};

/// Rotation applied to tile placement. Not configurable: [`TileGrid::rotated_text`] sizes its
/// coverage for this angle.
pub const ROTATION_DEGREES: f64 = 45.0;

/// Inputs for [`render_text_tiles`]. `color` already carries the opacity factor.
#[derive(Debug, Clone, Copy)]
pub struct TextParams<'a> {
    pub text: &'a str,
    pub color: ColorSpec,
    pub font_size: f64,
    pub spacing: f64,
}

struct ShapedRun {
    font_size: f32,
    glyphs: Vec<vello_cpu::Glyph>,
}

/// Shaped line, with glyph positions relative to the baseline origin.
struct ShapedLine {
    runs: Vec<ShapedRun>,
    advance: f64,
    height: f64,
}

/// Baseline anchor of the tile whose grid origin is `(x, y)`.
///
/// The anchor is the horizontal center of the run, rotated about the canvas origin and truncated
/// to whole pixels.
pub fn rotated_anchor(x: i64, y: i64, advance: f64) -> (i64, i64) {
    let center = Point::new(x as f64 + advance.round() / 2.0, y as f64);
    let p = Affine::rotate(ROTATION_DEGREES.to_radians()) * center;
    (p.x as i64, p.y as i64)
}

#[tracing::instrument(skip(canvas, face, params), fields(text_len = params.text.len()))]
pub fn render_text_tiles(
    canvas: &mut RasterBuffer,
    face: &FontFace,
    params: TextParams<'_>,
) -> WatermarkResult<()> {
    if params.text.is_empty() {
        return Err(WatermarkError::validation("watermark text must be non-empty"));
    }
    let w: u16 = canvas
        .width()
        .try_into()
        .map_err(|_| WatermarkError::validation("canvas width exceeds 65535px"))?;
    let h: u16 = canvas
        .height()
        .try_into()
        .map_err(|_| WatermarkError::validation("canvas height exceeds 65535px"))?;

    let grid = TileGrid::rotated_text(
        canvas.width(),
        canvas.height(),
        text_pitch(params.font_size, params.spacing),
    )?;
    let line = shape_line(face, params.text, params.font_size as f32)?;
    let font = face.to_render_font();

    let [r, g, b, a] = params.color.to_straight_array();
    let paint = vello_cpu::peniko::Color::from_rgba8(r, g, b, a);

    let mut ctx = vello_cpu::RenderContext::new(w, h);
    ctx.set_paint(paint);

    let (cw, ch) = (i64::from(w), i64::from(h));
    let reach = line.height.ceil() as i64;
    let mut drawn = 0usize;
    for (x, y) in grid.origins() {
        let (bx, by) = rotated_anchor(x, y, line.advance);
        if bx >= cw || bx + (line.advance.ceil() as i64) < 0 || by - reach >= ch || by + reach < 0 {
            continue;
        }
        ctx.set_transform(vello_cpu::kurbo::Affine::translate((bx as f64, by as f64)));
        for run in &line.runs {
            ctx.glyph_run(&font)
                .font_size(run.font_size)
                .fill_glyphs(run.glyphs.iter().map(|g| vello_cpu::Glyph {
                    id: g.id,
                    x: g.x,
                    y: g.y,
                }));
        }
        drawn += 1;
    }
    tracing::debug!(tiles = grid.len(), drawn, "stamped text tiles");

    ctx.flush();
    let mut layer = vello_cpu::Pixmap::new(w, h);
    ctx.render_to_pixmap(&mut layer);
    premul_over_in_place(canvas, layer.data_as_u8_slice())
}

fn shape_line(face: &FontFace, text: &str, size_px: f32) -> WatermarkResult<ShapedLine> {
    let mut engine = TextLayoutEngine::new();
    let layout = engine.layout_line(text, face, size_px, TextBrushRgba8::default())?;

    let mut runs = Vec::new();
    for line in layout.lines() {
        for item in line.items() {
            let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                continue;
            };
            let baseline = run.baseline();
            let glyphs = run
                .positioned_glyphs()
                .map(|g| vello_cpu::Glyph {
                    id: g.id,
                    x: g.x,
                    y: g.y - baseline,
                })
                .collect();
            runs.push(ShapedRun {
                font_size: run.run().font_size(),
                glyphs,
            });
        }
    }

    Ok(ShapedLine {
        runs,
        advance: f64::from(layout.width()),
        height: f64::from(layout.height()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anchor_rotates_about_canvas_origin() {
        // (10, 0) with zero advance lands on the 45 degree diagonal.
        let (x, y) = rotated_anchor(10, 0, 0.0);
        assert_eq!((x, y), (7, 7));

        // (0, 10) rotates to (-sin, cos) * 10.
        let (x, y) = rotated_anchor(0, 10, 0.0);
        assert_eq!((x, y), (-7, 7));
    }

    #[test]
    fn anchor_uses_half_the_rounded_advance() {
        let a = rotated_anchor(0, 0, 19.6);
        let b = rotated_anchor(10, 0, 0.0);
        assert_eq!(a, b);
    }
}
