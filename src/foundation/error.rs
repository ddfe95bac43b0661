pub type WatermarkResult<T> = Result<T, WatermarkError>;

/// Every failure the compositing engine can surface to its caller.
#[derive(thiserror::Error, Debug)]
pub enum WatermarkError {
    /// Decode or encode failure on the source image or the stencil.
    #[error("unsupported or corrupt image: {0}")]
    UnsupportedOrCorruptImage(String),

    /// Hex color string that does not parse.
    #[error("invalid color: {0}")]
    InvalidColor(String),

    /// Glyph face bytes that do not parse. Points at a packaging defect.
    #[error("font load failure: {0}")]
    FontLoadFailure(String),

    /// Numeric parameter outside the engine's domain.
    #[error("validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl WatermarkError {
    pub fn image(msg: impl Into<String>) -> Self {
        Self::UnsupportedOrCorruptImage(msg.into())
    }

    pub fn invalid_color(msg: impl Into<String>) -> Self {
        Self::InvalidColor(msg.into())
    }

    pub fn font(msg: impl Into<String>) -> Self {
        Self::FontLoadFailure(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Wrap an `anyhow` chain as an image error, keeping every context frame in the message.
    pub(crate) fn image_from(err: anyhow::Error) -> Self {
        Self::UnsupportedOrCorruptImage(format!("{err:#}"))
    }
}
