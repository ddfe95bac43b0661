use image::imageops::FilterType;

use crate::assets::codec::RasterBuffer;
use crate::foundation::error::{WatermarkError, WatermarkResult};

/// Largest resized stencil, as a multiple of the canvas area. Tiles are clipped
/// to the canvas, so pixels past this bound are never visible.
pub const MAX_STENCIL_AREA_FACTOR: u64 = 16;

/// Stencil size for a watermark that spans `size_percent` of the canvas width.
///
/// Aspect ratio follows the stencil; both axes truncate to whole pixels.
/// The result never exceeds `MAX_STENCIL_AREA_FACTOR` times the canvas area.
pub fn stencil_target_size(
    canvas_width: u32,
    canvas_height: u32,
    stencil_width: u32,
    stencil_height: u32,
    size_percent: f64,
) -> WatermarkResult<(u32, u32)> {
    if stencil_width == 0 || stencil_height == 0 {
        return Err(WatermarkError::image("watermark image has zero extent"));
    }
    if !size_percent.is_finite() || size_percent <= 0.0 {
        return Err(WatermarkError::validation(format!(
            "size percent must be finite and > 0 (got {size_percent})"
        )));
    }

    let scale = f64::from(canvas_width) * (size_percent / 100.0) / f64::from(stencil_width);
    let w = f64::from(stencil_width) * scale;
    let h = f64::from(stencil_height) * scale;
    if w < 1.0 || h < 1.0 || w > f64::from(u32::MAX) || h > f64::from(u32::MAX) {
        return Err(WatermarkError::validation(format!(
            "watermark scaled to {w:.2}x{h:.2} px is not drawable"
        )));
    }
    let (w, h) = (w as u32, h as u32);

    let budget = (u64::from(canvas_width) * u64::from(canvas_height))
        .max(1)
        .saturating_mul(MAX_STENCIL_AREA_FACTOR);
    let area = u64::from(w) * u64::from(h);
    let fits_memory = usize::try_from(area)
        .ok()
        .and_then(|px| px.checked_mul(4))
        .is_some();
    if area > budget || !fits_memory {
        return Err(WatermarkError::validation(format!(
            "watermark scaled to {w}x{h} px exceeds the {budget} px budget for this canvas"
        )));
    }
    Ok((w, h))
}

/// Lanczos3 resample of a premultiplied raster.
pub fn resize(src: &RasterBuffer, width: u32, height: u32) -> WatermarkResult<RasterBuffer> {
    if width == src.width() && height == src.height() {
        return Ok(src.clone());
    }
    let img = image::RgbaImage::from_raw(src.width(), src.height(), src.pixels().to_vec())
        .ok_or_else(|| WatermarkError::image("raster buffer size mismatch"))?;
    let resized = image::imageops::resize(&img, width, height, FilterType::Lanczos3);

    // Ringing can push a color channel above alpha; premultiplied pixels must not exceed it.
    let mut data = resized.into_raw();
    for px in data.chunks_exact_mut(4) {
        let a = px[3];
        for c in &mut px[..3] {
            *c = (*c).min(a);
        }
    }
    RasterBuffer::from_premul_rgba8(width, height, src.format(), data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::codec::ImageFormatTag;

    fn solid(w: u32, h: u32, px: [u8; 4]) -> RasterBuffer {
        let data = px.repeat((w * h) as usize);
        RasterBuffer::from_premul_rgba8(w, h, ImageFormatTag::Png, data).unwrap()
    }

    #[test]
    fn percent_is_relative_to_canvas_width() {
        assert_eq!(stencil_target_size(100, 100, 50, 50, 25.0).unwrap(), (25, 25));
        assert_eq!(stencil_target_size(400, 300, 200, 100, 50.0).unwrap(), (200, 100));
        assert_eq!(stencil_target_size(1000, 500, 10, 30, 10.0).unwrap(), (100, 300));
    }

    #[test]
    fn collapsed_or_invalid_sizes_are_rejected() {
        assert!(stencil_target_size(10, 10, 1000, 1, 1.0).is_err());
        assert!(stencil_target_size(100, 100, 50, 50, 0.0).is_err());
        assert!(stencil_target_size(100, 100, 50, 50, f64::NAN).is_err());
        assert!(stencil_target_size(100, 100, 0, 50, 25.0).is_err());
    }

    #[test]
    fn oversized_targets_are_rejected_before_allocation() {
        let err = stencil_target_size(100, 100, 1, 1, 4.2e9).unwrap_err();
        assert!(matches!(err, WatermarkError::Validation(_)));

        // 400% of a 100x100 canvas is exactly 16x its area.
        assert_eq!(stencil_target_size(100, 100, 10, 10, 400.0).unwrap(), (400, 400));
        assert!(stencil_target_size(100, 100, 10, 10, 420.0).is_err());
        // Tall stencils may overhang a wide canvas within the budget.
        assert_eq!(stencil_target_size(400, 100, 10, 40, 100.0).unwrap(), (400, 1600));
    }

    #[test]
    fn resize_hits_requested_dimensions() {
        let src = solid(50, 40, [255, 0, 0, 255]);
        let out = resize(&src, 25, 20).unwrap();
        assert_eq!((out.width(), out.height()), (25, 20));
        let [r, g, b, a] = out.pixel(12, 10).unwrap();
        assert!(r >= 254 && a >= 254);
        assert!(g <= 1 && b <= 1);
    }

    #[test]
    fn resize_keeps_premultiplied_invariant() {
        let mut data = Vec::new();
        for i in 0..64u32 {
            let a = if i % 2 == 0 { 255 } else { 0 };
            data.extend_from_slice(&[a, a, a, a]);
        }
        let src = RasterBuffer::from_premul_rgba8(8, 8, ImageFormatTag::Png, data).unwrap();
        let out = resize(&src, 3, 3).unwrap();
        for px in out.pixels().chunks_exact(4) {
            assert!(px[0] <= px[3] && px[1] <= px[3] && px[2] <= px[3]);
        }
    }
}
