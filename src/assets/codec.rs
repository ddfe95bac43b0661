use std::io::Cursor;

use anyhow::Context;

use crate::foundation::error::{WatermarkError, WatermarkResult};
use crate::foundation::math::{premultiply_rgba8_in_place, unpremultiply_rgba8_in_place};

/// Encoding the source bytes were detected as. Output always reuses it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageFormatTag {
    Png,
    Jpeg,
}

impl ImageFormatTag {
    /// Sniff the container signature. Anything but PNG or JPEG is rejected.
    pub fn detect(bytes: &[u8]) -> WatermarkResult<Self> {
        let guessed = image::guess_format(bytes)
            .map_err(|e| WatermarkError::image(format!("unrecognized image signature: {e}")))?;
        match guessed {
            image::ImageFormat::Png => Ok(Self::Png),
            image::ImageFormat::Jpeg => Ok(Self::Jpeg),
            other => Err(WatermarkError::image(format!(
                "unsupported image format: {}",
                other.extensions_str().first().copied().unwrap_or("unknown")
            ))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpeg",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
        }
    }

    fn to_image_format(self) -> image::ImageFormat {
        match self {
            Self::Png => image::ImageFormat::Png,
            Self::Jpeg => image::ImageFormat::Jpeg,
        }
    }
}

impl std::fmt::Display for ImageFormatTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decoded raster in row-major premultiplied RGBA8.
///
/// Width and height are fixed at construction; only pixel values are mutated.
#[derive(Clone, Debug)]
pub struct RasterBuffer {
    width: u32,
    height: u32,
    format: ImageFormatTag,
    rgba8_premul: Vec<u8>,
}

impl RasterBuffer {
    pub fn from_premul_rgba8(
        width: u32,
        height: u32,
        format: ImageFormatTag,
        rgba8_premul: Vec<u8>,
    ) -> WatermarkResult<Self> {
        let expected = (width as usize)
            .saturating_mul(height as usize)
            .saturating_mul(4);
        if rgba8_premul.len() != expected {
            return Err(WatermarkError::image(format!(
                "raster byte len {} does not match {width}x{height}",
                rgba8_premul.len()
            )));
        }
        Ok(Self {
            width,
            height,
            format,
            rgba8_premul,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> ImageFormatTag {
        self.format
    }

    pub fn pixels(&self) -> &[u8] {
        &self.rgba8_premul
    }

    pub fn pixels_mut(&mut self) -> &mut [u8] {
        &mut self.rgba8_premul
    }

    /// Premultiplied pixel at `(x, y)`, or `None` outside the canvas.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        let px = &self.rgba8_premul[idx..idx + 4];
        Some([px[0], px[1], px[2], px[3]])
    }
}

/// Decode PNG or JPEG bytes into a premultiplied raster tagged with the detected format.
pub fn decode(bytes: &[u8]) -> WatermarkResult<RasterBuffer> {
    let format = ImageFormatTag::detect(bytes)?;
    let dyn_img = image::load_from_memory_with_format(bytes, format.to_image_format())
        .with_context(|| format!("decode {format} image from memory"))
        .map_err(WatermarkError::image_from)?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();

    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);

    tracing::debug!(%format, width, height, "decoded raster");
    RasterBuffer::from_premul_rgba8(width, height, format, rgba8_premul)
}

/// Encode `raster` with the format it was decoded from.
pub fn encode(raster: &RasterBuffer) -> WatermarkResult<Vec<u8>> {
    encode_as(raster, raster.format())
}

/// Encode with an explicit tag. The pipeline always passes the decode-time tag.
pub fn encode_as(raster: &RasterBuffer, format: ImageFormatTag) -> WatermarkResult<Vec<u8>> {
    let (w, h) = (raster.width(), raster.height());
    let dyn_img = match format {
        ImageFormatTag::Png => {
            let mut straight = raster.pixels().to_vec();
            unpremultiply_rgba8_in_place(&mut straight);
            let img = image::RgbaImage::from_raw(w, h, straight)
                .ok_or_else(|| WatermarkError::image("raster buffer size mismatch"))?;
            image::DynamicImage::ImageRgba8(img)
        }
        ImageFormatTag::Jpeg => {
            // JPEG carries no alpha: premultiplied channels are the color over black.
            let mut rgb = Vec::with_capacity((w as usize) * (h as usize) * 3);
            for px in raster.pixels().chunks_exact(4) {
                rgb.extend_from_slice(&px[..3]);
            }
            let img = image::RgbImage::from_raw(w, h, rgb)
                .ok_or_else(|| WatermarkError::image("raster buffer size mismatch"))?;
            image::DynamicImage::ImageRgb8(img)
        }
    };

    let mut buf = Vec::new();
    dyn_img
        .write_to(&mut Cursor::new(&mut buf), format.to_image_format())
        .with_context(|| format!("encode {format} image"))
        .map_err(WatermarkError::image_from)?;
    tracing::debug!(%format, bytes = buf.len(), "encoded raster");
    Ok(buf)
}
