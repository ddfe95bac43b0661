//! Image watermark: luminance stencil tiled on an axis-aligned grid.

use crate::assets::codec::{self, RasterBuffer};
use crate::foundation::error::WatermarkResult;
use crate::foundation::math::{premultiply_rgba8_in_place, unpremultiply_rgba8_in_place};
use crate::render::composite::blit_over;
use crate::render::resample::{resize, stencil_target_size};
use crate::render::tile::{TileGrid, stencil_gap};

/// Inputs for [`render_image_tiles`]. `opacity` must already be clamped to `[0, 1]`.
#[derive(Debug, Clone, Copy)]
pub struct StencilParams {
    pub opacity: f64,
    pub spacing: f64,
    pub size_percent: f64,
}

/// Desaturate one straight-alpha pixel into `(L, L, L, alpha * opacity)`.
pub fn luminance_px(px: [u8; 4], opacity: f64) -> [u8; 4] {
    let [r, g, b, a] = px;
    let l = 0.299 * f64::from(r) + 0.587 * f64::from(g) + 0.114 * f64::from(b);
    let l = l.clamp(0.0, 255.0) as u8;
    let a = (f64::from(a) * opacity).clamp(0.0, 255.0) as u8;
    [l, l, l, a]
}

/// Whitewash a premultiplied stencil into a translucent neutral mark, still premultiplied.
pub fn luminance_stencil(src: &RasterBuffer, opacity: f64) -> WatermarkResult<RasterBuffer> {
    let mut data = src.pixels().to_vec();
    unpremultiply_rgba8_in_place(&mut data);
    for px in data.chunks_exact_mut(4) {
        let out = luminance_px([px[0], px[1], px[2], px[3]], opacity);
        px.copy_from_slice(&out);
    }
    premultiply_rgba8_in_place(&mut data);
    RasterBuffer::from_premul_rgba8(src.width(), src.height(), src.format(), data)
}

/// Decode, scale, desaturate and tile `stencil_bytes` across `canvas`.
#[tracing::instrument(skip(canvas, stencil_bytes), fields(stencil_len = stencil_bytes.len()))]
pub fn render_image_tiles(
    canvas: &mut RasterBuffer,
    stencil_bytes: &[u8],
    params: StencilParams,
) -> WatermarkResult<()> {
    let stencil = codec::decode(stencil_bytes)?;
    let (tw, th) = stencil_target_size(
        canvas.width(),
        canvas.height(),
        stencil.width(),
        stencil.height(),
        params.size_percent,
    )?;
    let resized = resize(&stencil, tw, th)?;
    let mark = luminance_stencil(&resized, params.opacity)?;

    let grid = TileGrid::stencil(
        canvas.width(),
        canvas.height(),
        tw,
        th,
        stencil_gap(tw, params.spacing),
        stencil_gap(th, params.spacing),
    )?;
    tracing::debug!(tw, th, tiles = grid.len(), "tiling image stencil");

    for (x, y) in grid.origins() {
        blit_over(canvas, &mark, x, y);
    }
    Ok(())
}
