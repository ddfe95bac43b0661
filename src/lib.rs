//! Tilemark stamps a repeating watermark across a PNG or JPEG and hands back the same format.
//!
//! Two modes share one pipeline:
//!
//! - text: a shaped line drawn along a 45 degree rotated lattice ([`render::text`])
//! - image: a desaturated, translucent stencil tiled on an axis-aligned grid ([`render::stencil`])
//!
//! Every call decodes once, mutates a single owned [`RasterBuffer`], and encodes once. Nothing is
//! shared between calls except an optional read-only [`FontFace`].
#![forbid(unsafe_code)]

pub mod assets;
pub mod batch;
pub mod foundation;
pub mod model;
pub mod params;
pub mod pipeline;
pub mod render;

pub use assets::codec::{ImageFormatTag, RasterBuffer, decode, encode};
pub use assets::color::{ColorSpec, apply_opacity, parse_color};
pub use assets::font::FontFace;
pub use batch::{BatchItem, BatchOpts, NamedInput, apply_batch};
pub use foundation::error::{WatermarkError, WatermarkResult};
pub use model::{ImageWatermark, TextWatermark, WatermarkSpec};
pub use params::WatermarkParams;
pub use pipeline::{
    WatermarkedImage, apply, apply_detailed, apply_image_watermark, apply_text_watermark,
};
pub use render::tile::{AxisSteps, TileGrid};
