pub(crate) mod composite;
pub mod resample;
pub mod stencil;
pub mod text;
pub mod tile;
