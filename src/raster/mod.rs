/// Gaussian blur over premultiplied RGBA8.
pub mod blur;
/// Color parsing and conversion.
pub mod color;
/// Source-over compositing.
pub mod composite;
/// Rectangle and ellipse primitives.
pub mod draw;
/// The RGBA8 frame type.
pub mod frame;
/// Glyph rasterization, measurement and wrapping.
pub mod text;

pub use color::Rgba8;
pub use frame::FrameRGBA;
pub use text::{TextAnchor, TextRenderer, TextStyle};
