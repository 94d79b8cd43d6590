/// Plot output: an owned [`plot::Figure`] drawn with plotters and written to
/// a bitmap or SVG file.
pub mod font;
pub mod plot;

pub use plot::{Figure, ImageFormat};
