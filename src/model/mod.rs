//! Data models for the annotation editor.

mod object;
mod rect;
mod render;

pub use object::{AnnotatedObject, Direction, Labels, WorkingObject};
pub use rect::{PercentPoint, PercentRect, PixelRect, RenderedBox, RenderedRect};
pub use render::{ImageRenderContext, natural_size_of};
