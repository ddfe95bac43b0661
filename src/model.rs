use crate::assets::font::FontFace;
use crate::foundation::error::{WatermarkError, WatermarkResult};

/// Repeated text stamped along a rotated lattice.
#[derive(Debug, Clone)]
pub struct TextWatermark {
    pub text: String,
    /// Hex color, `#RRGGBB`.
    pub color: String,
    /// Glyph size in pixels (points at 72 DPI).
    pub font_size: f64,
    pub opacity: f64,
    /// Multiplier on a `font_size / 100` pixel unit.
    pub spacing: f64,
    pub font: FontFace,
}

/// Repeated desaturated copy of another image.
#[derive(Debug, Clone)]
pub struct ImageWatermark {
    /// Encoded PNG or JPEG bytes.
    pub stencil: Vec<u8>,
    /// Stencil width as a percentage of the canvas width.
    pub size_percent: f64,
    pub opacity: f64,
    pub spacing: f64,
}

/// Exactly one watermark mode per call.
#[derive(Debug, Clone)]
pub enum WatermarkSpec {
    Text(TextWatermark),
    Image(ImageWatermark),
}

impl WatermarkSpec {
    pub fn text(
        text: impl Into<String>,
        color: impl Into<String>,
        font_size: f64,
        opacity: f64,
        spacing: f64,
        font: FontFace,
    ) -> Self {
        Self::Text(TextWatermark {
            text: text.into(),
            color: color.into(),
            font_size,
            opacity,
            spacing,
            font,
        })
    }

    pub fn image(
        stencil: impl Into<Vec<u8>>,
        size_percent: f64,
        opacity: f64,
        spacing: f64,
    ) -> Self {
        Self::Image(ImageWatermark {
            stencil: stencil.into(),
            size_percent,
            opacity,
            spacing,
        })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Image(_) => "image",
        }
    }

    /// Opacity clamped to `[0, 1]`. Out-of-range values are accepted, NaN is not.
    pub fn clamped_opacity(&self) -> WatermarkResult<f64> {
        let raw = match self {
            Self::Text(t) => t.opacity,
            Self::Image(i) => i.opacity,
        };
        clamp_opacity(raw)
    }

    /// Reject parameters the renderers cannot draw with.
    pub fn validate(&self) -> WatermarkResult<()> {
        self.clamped_opacity()?;
        match self {
            Self::Text(t) => {
                if t.text.is_empty() {
                    return Err(WatermarkError::validation("watermark text must be non-empty"));
                }
                require_positive("font_size", t.font_size)?;
                require_positive("spacing", t.spacing)
            }
            Self::Image(i) => {
                if i.stencil.is_empty() {
                    return Err(WatermarkError::image("watermark image is empty"));
                }
                require_positive("size_percent", i.size_percent)?;
                require_positive("spacing", i.spacing)
            }
        }
    }
}

pub(crate) fn clamp_opacity(raw: f64) -> WatermarkResult<f64> {
    if raw.is_nan() {
        return Err(WatermarkError::validation("opacity must be a number"));
    }
    Ok(raw.clamp(0.0, 1.0))
}

fn require_positive(name: &str, v: f64) -> WatermarkResult<()> {
    if !v.is_finite() || v <= 0.0 {
        return Err(WatermarkError::validation(format!(
            "{name} must be finite and > 0 (got {v})"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opacity_is_clamped_not_rejected() {
        let hi = WatermarkSpec::image(vec![1], 25.0, 1.5, 100.0);
        assert_eq!(hi.clamped_opacity().unwrap(), 1.0);
        let lo = WatermarkSpec::image(vec![1], 25.0, -0.3, 100.0);
        assert_eq!(lo.clamped_opacity().unwrap(), 0.0);
        let nan = WatermarkSpec::image(vec![1], 25.0, f64::NAN, 100.0);
        assert!(nan.clamped_opacity().is_err());
    }

    #[test]
    fn image_spec_validation() {
        assert!(WatermarkSpec::image(vec![1], 25.0, 0.5, 100.0).validate().is_ok());
        assert!(WatermarkSpec::image(vec![1], 0.0, 0.5, 100.0).validate().is_err());
        assert!(WatermarkSpec::image(vec![1], 25.0, 0.5, -1.0).validate().is_err());
        assert!(matches!(
            WatermarkSpec::image(Vec::new(), 25.0, 0.5, 100.0)
                .validate()
                .unwrap_err(),
            WatermarkError::UnsupportedOrCorruptImage(_)
        ));
    }

    #[test]
    fn kind_names_the_variant() {
        assert_eq!(WatermarkSpec::image(vec![1], 25.0, 0.5, 100.0).kind(), "image");
    }
}
