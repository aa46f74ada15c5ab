//! Render metadata for the displayed image.

use std::path::Path;

use super::rect::RenderedBox;

/// Natural size of the image plus where it currently lands on screen.
///
/// Recomputed whenever the displayed image's layout changes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageRenderContext {
    /// Source width in pixels
    pub natural_width: u32,
    /// Source height in pixels
    pub natural_height: u32,
    /// Area of the container covered by the image
    pub rendered_box: RenderedBox,
}

impl ImageRenderContext {
    pub fn new(natural_width: u32, natural_height: u32, rendered_box: RenderedBox) -> Self {
        Self {
            natural_width,
            natural_height,
            rendered_box,
        }
    }

    /// Natural size as floats for geometry math.
    pub fn natural_size(&self) -> (f64, f64) {
        (f64::from(self.natural_width), f64::from(self.natural_height))
    }
}

/// Read an image's natural size from its header without decoding pixels.
pub fn natural_size_of(path: &Path) -> Result<(u32, u32), image::ImageError> {
    let (width, height) = image::image_dimensions(path)?;
    log::debug!("Natural size of {:?}: {}x{}", path, width, height);
    Ok((width, height))
}
