use std::sync::{Arc, OnceLock};

use crate::foundation::error::{WatermarkError, WatermarkResult};

/// Parsed glyph face, shared read-only between calls.
///
/// Cloning is cheap: the font bytes live behind an `Arc`.
#[derive(Clone)]
pub struct FontFace {
    bytes: Arc<Vec<u8>>,
    index: u32,
    family: String,
}

impl std::fmt::Debug for FontFace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontFace")
            .field("family", &self.family)
            .field("index", &self.index)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// DejaVu Sans Bold, shipped with the crate (Bitstream Vera license, see `assets/fonts`).
static EMBEDDED_BOLD_TTF: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans-Bold.ttf");

static EMBEDDED_BOLD: OnceLock<FontFace> = OnceLock::new();

impl FontFace {
    /// Parse TrueType/OpenType bytes. Face 0 of a collection is used.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> WatermarkResult<Self> {
        Self::from_bytes_with_index(bytes, 0)
    }

    /// Parse face `index` of a font file or collection.
    pub fn from_bytes_with_index(bytes: impl Into<Vec<u8>>, index: u32) -> WatermarkResult<Self> {
        let bytes: Vec<u8> = bytes.into();
        if bytes.is_empty() {
            return Err(WatermarkError::font("font bytes are empty"));
        }

        let mut font_ctx = parley::FontContext::default();
        let family = register_family(&mut font_ctx, &bytes, index)?;

        Ok(Self {
            bytes: Arc::new(bytes),
            index,
            family,
        })
    }

    /// The bold face compiled into the crate. Parsed once, then shared.
    pub fn embedded_bold() -> WatermarkResult<Self> {
        if let Some(face) = EMBEDDED_BOLD.get() {
            return Ok(face.clone());
        }
        let face = Self::from_bytes(EMBEDDED_BOLD_TTF)?;
        Ok(EMBEDDED_BOLD.get_or_init(|| face).clone())
    }

    /// Resolve a bold sans-serif face installed on the host.
    ///
    /// Fails with [`WatermarkError::FontLoadFailure`] when the host has no such face.
    pub fn system_bold_sans() -> WatermarkResult<Self> {
        use usvg::fontdb::{Database, Family, Query, Stretch, Style, Weight};

        let mut db = Database::new();
        db.load_system_fonts();

        let families = [Family::SansSerif];
        let query = Query {
            families: &families,
            weight: Weight::BOLD,
            stretch: Stretch::Normal,
            style: Style::Normal,
        };
        let id = db
            .query(&query)
            .ok_or_else(|| WatermarkError::font("no bold sans-serif system font found"))?;

        let (bytes, index) = db
            .with_face_data(id, |data, index| (data.to_vec(), index))
            .ok_or_else(|| WatermarkError::font("system font data is unreadable"))?;

        tracing::debug!(?id, index, len = bytes.len(), "resolved system font");
        Self::from_bytes_with_index(bytes, index)
    }

    pub fn family_name(&self) -> &str {
        &self.family
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub(crate) fn to_render_font(&self) -> vello_cpu::peniko::FontData {
        vello_cpu::peniko::FontData::new(
            vello_cpu::peniko::Blob::from(self.bytes.as_ref().clone()),
            self.index,
        )
    }
}

/// Register `bytes` and return the family name of face `index`.
fn register_family(
    font_ctx: &mut parley::FontContext,
    bytes: &[u8],
    index: u32,
) -> WatermarkResult<String> {
    let families = font_ctx
        .collection
        .register_fonts(parley::fontique::Blob::from(bytes.to_vec()), None);
    if families.is_empty() {
        return Err(WatermarkError::font("no font families registered from font bytes"));
    }
    let family_id = families
        .iter()
        .find(|(_, faces)| faces.iter().any(|f| f.index() == index))
        .map(|(id, _)| *id)
        .ok_or_else(|| WatermarkError::font(format!("font bytes have no face at index {index}")))?;

    font_ctx
        .collection
        .family_name(family_id)
        .map(|name| name.to_string())
        .ok_or_else(|| WatermarkError::font("registered font family has no name"))
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
/// RGBA8 brush color carried through Parley layout.
pub(crate) struct TextBrushRgba8 {
    pub(crate) r: u8,
    pub(crate) g: u8,
    pub(crate) b: u8,
    pub(crate) a: u8,
}

/// Per-call helper for building Parley layouts from a [`FontFace`].
pub(crate) struct TextLayoutEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrushRgba8>,
}

impl TextLayoutEngine {
    pub(crate) fn new() -> Self {
        Self {
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
        }
    }

    /// Shape `text` as a single unwrapped line.
    pub(crate) fn layout_line(
        &mut self,
        text: &str,
        face: &FontFace,
        size_px: f32,
        brush: TextBrushRgba8,
    ) -> WatermarkResult<parley::Layout<TextBrushRgba8>> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(WatermarkError::validation(
                "font size must be finite and > 0",
            ));
        }

        let family_name = register_family(&mut self.font_ctx, face.bytes(), face.index())?;

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(family_name)),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::Brush(brush));

        let mut layout: parley::Layout<TextBrushRgba8> = builder.build(text);
        layout.break_all_lines(None);
        Ok(layout)
    }
}
