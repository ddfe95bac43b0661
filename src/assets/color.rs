use crate::foundation::error::{WatermarkError, WatermarkResult};

/// 8-bit RGBA color derived from a hex string.
///
/// After [`apply_opacity`] the channels are premultiplied by the opacity factor,
/// so the value can be used directly as a premultiplied source color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorSpec {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl ColorSpec {
    pub const BLACK: Self = Self::rgba(0, 0, 0, 255);

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Channels as a premultiplied RGBA8 pixel.
    pub fn to_premul_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Straight-alpha channels, recovered from the premultiplied form.
    pub fn to_straight_array(self) -> [u8; 4] {
        let mut px = self.to_premul_array();
        crate::foundation::math::unpremultiply_rgba8_in_place(&mut px);
        px
    }
}

/// Parse `#RRGGBB`, `#RGB` or `#RRGGBBAA` (the leading `#` is optional).
pub fn parse_color(hex: &str) -> WatermarkResult<ColorSpec> {
    let s = hex.trim();
    let s = s.strip_prefix('#').unwrap_or(s);

    if !s.is_ascii() {
        return Err(WatermarkError::invalid_color(format!(
            "\"{hex}\" is not a hex color"
        )));
    }

    fn hex_byte(pair: &str) -> WatermarkResult<u8> {
        u8::from_str_radix(pair, 16)
            .map_err(|_| WatermarkError::invalid_color(format!("invalid hex byte \"{pair}\"")))
    }

    fn hex_nibble(c: &str) -> WatermarkResult<u8> {
        let v = hex_byte(c)?;
        Ok(v * 17)
    }

    match s.len() {
        3 => Ok(ColorSpec::rgba(
            hex_nibble(&s[0..1])?,
            hex_nibble(&s[1..2])?,
            hex_nibble(&s[2..3])?,
            255,
        )),
        6 => Ok(ColorSpec::rgba(
            hex_byte(&s[0..2])?,
            hex_byte(&s[2..4])?,
            hex_byte(&s[4..6])?,
            255,
        )),
        8 => Ok(ColorSpec::rgba(
            hex_byte(&s[0..2])?,
            hex_byte(&s[2..4])?,
            hex_byte(&s[4..6])?,
            hex_byte(&s[6..8])?,
        )),
        _ => Err(WatermarkError::invalid_color(format!(
            "\"{hex}\" must be #RRGGBB, #RGB or #RRGGBBAA"
        ))),
    }
}

/// Multiply every channel, alpha included, by `factor` and truncate to 8 bits.
///
/// `factor` is expected to be clamped to `[0, 1]` already.
pub fn apply_opacity(color: ColorSpec, factor: f64) -> ColorSpec {
    let scale = |c: u8| -> u8 { (f64::from(c) * factor) as u8 };
    ColorSpec {
        r: scale(color.r),
        g: scale(color.g),
        b: scale(color.b),
        a: scale(color.a),
    }
}
