use crate::assets::codec::RasterBuffer;
use crate::foundation::error::{WatermarkError, WatermarkResult};
use crate::foundation::math::premul_over_px;

/// Source-over a full-canvas premultiplied layer onto `dst`.
pub(crate) fn premul_over_in_place(dst: &mut RasterBuffer, layer: &[u8]) -> WatermarkResult<()> {
    let dst = dst.pixels_mut();
    if dst.len() != layer.len() || !dst.len().is_multiple_of(4) {
        return Err(WatermarkError::validation(
            "premul_over_in_place expects equal-length rgba8 buffers",
        ));
    }
    for (d, s) in dst.chunks_exact_mut(4).zip(layer.chunks_exact(4)) {
        if s[3] == 0 {
            continue;
        }
        let out = premul_over_px([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]]);
        d.copy_from_slice(&out);
    }
    Ok(())
}

/// Source-over `src` onto `dst` with its top-left corner at `(x, y)`, clipped to `dst`.
pub(crate) fn blit_over(dst: &mut RasterBuffer, src: &RasterBuffer, x: i64, y: i64) {
    let (dw, dh) = (i64::from(dst.width()), i64::from(dst.height()));
    let (sw, sh) = (i64::from(src.width()), i64::from(src.height()));

    let x0 = x.max(0);
    let y0 = y.max(0);
    let x1 = (x + sw).min(dw);
    let y1 = (y + sh).min(dh);
    if x0 >= x1 || y0 >= y1 {
        return;
    }

    let src_px = src.pixels();
    let dst_w = dw as usize;
    let src_w = sw as usize;
    let dst_px = dst.pixels_mut();
    for dy in y0..y1 {
        let sy = (dy - y) as usize;
        for dx in x0..x1 {
            let sx = (dx - x) as usize;
            let si = (sy * src_w + sx) * 4;
            let s = [src_px[si], src_px[si + 1], src_px[si + 2], src_px[si + 3]];
            if s[3] == 0 {
                continue;
            }
            let di = ((dy as usize) * dst_w + dx as usize) * 4;
            let d = &mut dst_px[di..di + 4];
            let out = premul_over_px([d[0], d[1], d[2], d[3]], s);
            d.copy_from_slice(&out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::codec::ImageFormatTag;

    fn solid(w: u32, h: u32, px: [u8; 4]) -> RasterBuffer {
        RasterBuffer::from_premul_rgba8(w, h, ImageFormatTag::Png, px.repeat((w * h) as usize))
            .unwrap()
    }

    #[test]
    fn layer_over_rejects_size_mismatch() {
        let mut dst = solid(2, 2, [0, 0, 0, 255]);
        assert!(premul_over_in_place(&mut dst, &[0u8; 4]).is_err());
    }

    #[test]
    fn layer_over_blends_each_pixel() {
        let mut dst = solid(2, 1, [0, 0, 0, 255]);
        let layer = [255, 255, 255, 255, 0, 0, 0, 0];
        premul_over_in_place(&mut dst, &layer).unwrap();
        assert_eq!(dst.pixel(0, 0).unwrap(), [255, 255, 255, 255]);
        assert_eq!(dst.pixel(1, 0).unwrap(), [0, 0, 0, 255]);
    }

    #[test]
    fn blit_clips_negative_and_overflowing_origins() {
        let mut dst = solid(4, 4, [0, 0, 0, 255]);
        let src = solid(3, 3, [255, 0, 0, 255]);

        blit_over(&mut dst, &src, -2, -2);
        assert_eq!(dst.pixel(0, 0).unwrap(), [255, 0, 0, 255]);
        assert_eq!(dst.pixel(1, 0).unwrap(), [0, 0, 0, 255]);

        blit_over(&mut dst, &src, 3, 3);
        assert_eq!(dst.pixel(3, 3).unwrap(), [255, 0, 0, 255]);
        assert_eq!(dst.pixel(2, 3).unwrap(), [0, 0, 0, 255]);
    }

    #[test]
    fn blit_entirely_outside_is_noop() {
        let mut dst = solid(2, 2, [1, 2, 3, 255]);
        let before = dst.pixels().to_vec();
        let src = solid(2, 2, [255, 255, 255, 255]);
        blit_over(&mut dst, &src, 10, 0);
        blit_over(&mut dst, &src, -2, 0);
        assert_eq!(dst.pixels(), before.as_slice());
    }
}
