//! Decode, stamp, encode. One owned raster per call, no state carried between calls.

use crate::assets::codec::{self, ImageFormatTag};
use crate::assets::color::{apply_opacity, parse_color};
use crate::assets::font::FontFace;
use crate::foundation::error::WatermarkResult;
use crate::model::WatermarkSpec;
use crate::render::stencil::{StencilParams, render_image_tiles};
use crate::render::text::{TextParams, render_text_tiles};

/// Encoded output plus the format it was written in (always the input's).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatermarkedImage {
    pub format: ImageFormatTag,
    pub bytes: Vec<u8>,
}

/// Stamp `spec` across `input` and re-encode in the input's format.
pub fn apply(input: &[u8], spec: &WatermarkSpec) -> WatermarkResult<Vec<u8>> {
    apply_detailed(input, spec).map(|out| out.bytes)
}

#[tracing::instrument(skip(input, spec), fields(input_len = input.len(), kind = spec.kind()))]
pub fn apply_detailed(input: &[u8], spec: &WatermarkSpec) -> WatermarkResult<WatermarkedImage> {
    spec.validate()?;
    let opacity = spec.clamped_opacity()?;

    let mut raster = codec::decode(input)?;
    match spec {
        WatermarkSpec::Text(t) => {
            let color = apply_opacity(parse_color(&t.color)?, opacity);
            render_text_tiles(
                &mut raster,
                &t.font,
                TextParams {
                    text: &t.text,
                    color,
                    font_size: t.font_size,
                    spacing: t.spacing,
                },
            )?;
        }
        WatermarkSpec::Image(i) => {
            render_image_tiles(
                &mut raster,
                &i.stencil,
                StencilParams {
                    opacity,
                    spacing: i.spacing,
                    size_percent: i.size_percent,
                },
            )?;
        }
    }

    let bytes = codec::encode(&raster)?;
    tracing::debug!(format = %raster.format(), len = bytes.len(), "watermark applied");
    Ok(WatermarkedImage {
        format: raster.format(),
        bytes,
    })
}

pub fn apply_text_watermark(
    image_bytes: &[u8],
    font: &FontFace,
    text: &str,
    color_hex: &str,
    opacity: f64,
    font_size: f64,
    spacing: f64,
) -> WatermarkResult<Vec<u8>> {
    let spec = WatermarkSpec::text(text, color_hex, font_size, opacity, spacing, font.clone());
    apply(image_bytes, &spec)
}

pub fn apply_image_watermark(
    image_bytes: &[u8],
    stencil_bytes: &[u8],
    opacity: f64,
    spacing: f64,
    size_percent: f64,
) -> WatermarkResult<Vec<u8>> {
    let spec = WatermarkSpec::image(stencil_bytes, size_percent, opacity, spacing);
    apply(image_bytes, &spec)
}
