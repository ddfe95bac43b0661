use std::io::Cursor;

use tilemark::{ImageFormatTag, WatermarkError, WatermarkSpec};

fn encode(img: image::DynamicImage, format: image::ImageFormat) -> Vec<u8> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), format).unwrap();
    buf
}

fn png_solid(w: u32, h: u32, px: [u8; 4]) -> Vec<u8> {
    encode(
        image::DynamicImage::ImageRgba8(image::RgbaImage::from_pixel(w, h, image::Rgba(px))),
        image::ImageFormat::Png,
    )
}

fn jpeg_gradient(w: u32, h: u32) -> Vec<u8> {
    let img = image::RgbImage::from_fn(w, h, |x, y| {
        image::Rgb([(x * 255 / w) as u8, (y * 255 / h) as u8, 180])
    });
    encode(image::DynamicImage::ImageRgb8(img), image::ImageFormat::Jpeg)
}

fn checker_stencil() -> Vec<u8> {
    let img = image::RgbaImage::from_fn(20, 10, |x, y| {
        if (x / 5 + y / 5) % 2 == 0 {
            image::Rgba([255, 0, 0, 255])
        } else {
            image::Rgba([0, 0, 255, 128])
        }
    });
    encode(image::DynamicImage::ImageRgba8(img), image::ImageFormat::Png)
}

#[test]
fn png_input_stays_png_with_same_dimensions() {
    let input = png_solid(120, 80, [240, 240, 240, 255]);
    let spec = WatermarkSpec::image(checker_stencil(), 25.0, 0.5, 100.0);
    let out = tilemark::apply_detailed(&input, &spec).unwrap();

    assert_eq!(out.format, ImageFormatTag::Png);
    assert_eq!(
        image::guess_format(&out.bytes).unwrap(),
        image::ImageFormat::Png
    );
    let back = image::load_from_memory(&out.bytes).unwrap();
    assert_eq!((back.width(), back.height()), (120, 80));
    assert_ne!(out.bytes, input);
}

#[test]
fn jpeg_input_stays_jpeg_with_same_dimensions() {
    let input = jpeg_gradient(97, 61);
    let out = tilemark::apply_image_watermark(&input, &checker_stencil(), 0.7, 50.0, 40.0).unwrap();

    assert_eq!(
        image::guess_format(&out).unwrap(),
        image::ImageFormat::Jpeg
    );
    let back = image::load_from_memory(&out).unwrap();
    assert_eq!((back.width(), back.height()), (97, 61));
}

#[test]
fn jpeg_stencil_is_accepted() {
    let input = png_solid(64, 64, [255, 255, 255, 255]);
    let out = tilemark::apply_image_watermark(&input, &jpeg_gradient(16, 16), 1.0, 100.0, 50.0)
        .unwrap();
    let back = image::load_from_memory(&out).unwrap().to_rgba8();
    // Top-left tile is the desaturated stencil, no longer pure white.
    assert_ne!(back.get_pixel(1, 1).0, [255, 255, 255, 255]);
}

#[test]
fn bmp_input_is_rejected_without_output() {
    let bmp = encode(
        image::DynamicImage::ImageRgb8(image::RgbImage::from_pixel(4, 4, image::Rgb([1, 2, 3]))),
        image::ImageFormat::Bmp,
    );
    let res = tilemark::apply_image_watermark(&bmp, &checker_stencil(), 0.5, 100.0, 25.0);
    assert!(matches!(res, Err(WatermarkError::UnsupportedOrCorruptImage(_))));
}

#[test]
fn corrupt_stencil_is_rejected() {
    let input = png_solid(32, 32, [255, 255, 255, 255]);
    let stencil = b"\x89PNG\r\n\x1a\n broken";
    let res = tilemark::apply_image_watermark(&input, stencil, 0.5, 100.0, 25.0);
    assert!(matches!(res, Err(WatermarkError::UnsupportedOrCorruptImage(_))));
}

#[test]
fn out_of_range_opacity_is_clamped() {
    let input = png_solid(50, 50, [255, 255, 255, 255]);
    let stencil = checker_stencil();

    let over = tilemark::apply_image_watermark(&input, &stencil, 1.5, 100.0, 25.0).unwrap();
    let one = tilemark::apply_image_watermark(&input, &stencil, 1.0, 100.0, 25.0).unwrap();
    assert_eq!(over, one);

    let under = tilemark::apply_image_watermark(&input, &stencil, -0.3, 100.0, 25.0).unwrap();
    let untouched = image::load_from_memory(&under).unwrap().to_rgba8();
    assert!(untouched.pixels().all(|p| p.0 == [255, 255, 255, 255]));
}

#[test]
fn watermark_alpha_is_bounded_by_opacity() {
    // Fully transparent canvas: every output alpha comes from the stencil alone.
    let input = png_solid(40, 40, [0, 0, 0, 0]);
    let stencil = png_solid(10, 10, [0, 0, 0, 255]);
    let opacity = 0.4;
    let out = tilemark::apply_image_watermark(&input, &stencil, opacity, 100.0, 25.0).unwrap();
    let back = image::load_from_memory(&out).unwrap().to_rgba8();

    let cap = (255.0 * opacity) as u8;
    assert!(back.pixels().all(|p| p.0[3] <= cap));
    assert!(back.pixels().any(|p| p.0[3] == cap));
}

#[test]
fn applying_twice_is_not_idempotent() {
    let input = png_solid(60, 60, [255, 255, 255, 255]);
    let stencil = checker_stencil();
    let once = tilemark::apply_image_watermark(&input, &stencil, 0.5, 100.0, 25.0).unwrap();
    let twice = tilemark::apply_image_watermark(&once, &stencil, 0.5, 100.0, 25.0).unwrap();
    assert_ne!(once, twice);

    let a = image::load_from_memory(&once).unwrap().to_rgba8();
    let b = image::load_from_memory(&twice).unwrap().to_rgba8();
    // Second pass only darkens a white canvas.
    assert!(a.pixels().zip(b.pixels()).all(|(p, q)| q.0[0] <= p.0[0]));
    assert!(a.pixels().zip(b.pixels()).any(|(p, q)| q.0[0] < p.0[0]));
}

#[test]
fn non_positive_spacing_is_a_validation_error() {
    let input = png_solid(16, 16, [255, 255, 255, 255]);
    for spacing in [0.0, -10.0, f64::NAN] {
        let res = tilemark::apply_image_watermark(&input, &checker_stencil(), 0.5, spacing, 25.0);
        assert!(matches!(res, Err(WatermarkError::Validation(_))), "{spacing}");
    }
}

#[test]
fn huge_size_percent_is_a_validation_error() {
    let input = png_solid(100, 100, [255, 255, 255, 255]);
    let stencil = png_solid(1, 1, [0, 0, 0, 255]);
    let res = tilemark::apply_image_watermark(&input, &stencil, 0.5, 100.0, 4.2e9);
    assert!(matches!(res, Err(WatermarkError::Validation(_))));
}
