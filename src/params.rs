//! Lenient request parameters and the defaults applied before the engine runs.
//!
//! Callers hand in loosely-typed values (form fields, JSON, CLI flags). Absent or unparsable
//! numbers fall back to defaults here; the engine only ever sees a validated [`WatermarkSpec`].

use std::path::Path;

use anyhow::Context as _;
use serde::Deserialize;

use crate::assets::font::FontFace;
use crate::foundation::error::{WatermarkError, WatermarkResult};
use crate::model::{WatermarkSpec, clamp_opacity};

pub const DEFAULT_OPACITY: f64 = 0.5;
pub const DEFAULT_SPACING: f64 = 100.0;
pub const DEFAULT_FONT_SIZE: f64 = 32.0;
pub const DEFAULT_COLOR: &str = "#000000";
pub const DEFAULT_SIZE_PERCENT: f64 = 25.0;

/// A number that may arrive as JSON number or as text.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum LenientNumber {
    Num(f64),
    Text(String),
}

impl LenientNumber {
    fn parse(&self) -> Option<f64> {
        let v = match self {
            Self::Num(v) => Some(*v),
            Self::Text(s) => s.trim().parse::<f64>().ok(),
        };
        v.filter(|v| !v.is_nan())
    }
}

impl From<f64> for LenientNumber {
    fn from(v: f64) -> Self {
        Self::Num(v)
    }
}

impl From<&str> for LenientNumber {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WatermarkParams {
    pub text: Option<String>,
    pub color: Option<String>,
    pub opacity: Option<LenientNumber>,
    pub spacing: Option<LenientNumber>,
    pub font_size: Option<LenientNumber>,
    #[serde(alias = "sizePercent")]
    pub watermark_size: Option<LenientNumber>,
}

impl WatermarkParams {
    pub fn from_json_str(s: &str) -> WatermarkResult<Self> {
        serde_json::from_str(s)
            .map_err(|e| WatermarkError::validation(format!("invalid watermark params: {e}")))
    }

    pub fn from_path(path: impl AsRef<Path>) -> WatermarkResult<Self> {
        let path = path.as_ref();
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("read watermark params '{}'", path.display()))?;
        Self::from_json_str(&s)
    }

    /// Fill unset fields from `other`. Fields set on `self` win.
    pub fn merged_over(self, other: WatermarkParams) -> Self {
        Self {
            text: self.text.or(other.text),
            color: self.color.or(other.color),
            opacity: self.opacity.or(other.opacity),
            spacing: self.spacing.or(other.spacing),
            font_size: self.font_size.or(other.font_size),
            watermark_size: self.watermark_size.or(other.watermark_size),
        }
    }

    pub fn opacity(&self) -> f64 {
        let raw = number_or("opacity", self.opacity.as_ref(), DEFAULT_OPACITY);
        clamp_opacity(raw).unwrap_or(DEFAULT_OPACITY)
    }

    pub fn spacing(&self) -> f64 {
        number_or("spacing", self.spacing.as_ref(), DEFAULT_SPACING)
    }

    pub fn font_size(&self) -> f64 {
        number_or("fontSize", self.font_size.as_ref(), DEFAULT_FONT_SIZE)
    }

    pub fn size_percent(&self) -> f64 {
        number_or(
            "watermarkSize",
            self.watermark_size.as_ref(),
            DEFAULT_SIZE_PERCENT,
        )
    }

    pub fn color(&self) -> &str {
        match self.color.as_deref() {
            Some(c) if !c.trim().is_empty() => c,
            _ => DEFAULT_COLOR,
        }
    }

    pub fn into_text_spec(self, font: FontFace) -> WatermarkResult<WatermarkSpec> {
        let text = match self.text.as_deref() {
            Some(t) if !t.is_empty() => t.to_owned(),
            _ => {
                return Err(WatermarkError::validation(
                    "no text provided for watermark",
                ));
            }
        };
        let spec = WatermarkSpec::text(
            text,
            self.color(),
            self.font_size(),
            self.opacity(),
            self.spacing(),
            font,
        );
        spec.validate()?;
        Ok(spec)
    }

    pub fn into_image_spec(self, stencil: impl Into<Vec<u8>>) -> WatermarkResult<WatermarkSpec> {
        let spec = WatermarkSpec::image(
            stencil,
            self.size_percent(),
            self.opacity(),
            self.spacing(),
        );
        spec.validate()?;
        Ok(spec)
    }
}

fn number_or(name: &str, value: Option<&LenientNumber>, default: f64) -> f64 {
    match value {
        None => default,
        Some(v) => v.parse().unwrap_or_else(|| {
            tracing::warn!(
                field = name,
                value = ?v,
                default,
                "unparsable parameter, using default"
            );
            default
        }),
    }
}
