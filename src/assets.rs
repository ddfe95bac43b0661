pub mod codec;
pub mod color;
pub mod font;
