//! Coordinate conversions between pixel, percent and rendered space.
//!
//! All functions here are pure. Interaction math happens in percent space;
//! pixel rectangles are rounded only when persisting (see
//! [`PixelRect::rounded`]), so many small drags never accumulate drift.

use crate::constants::PERCENT_MAX;
use crate::error::{EditorError, Result};
use crate::model::{PercentPoint, PercentRect, PixelRect, RenderedBox, RenderedRect};

fn check_dimensions(natural_width: f64, natural_height: f64) -> Result<()> {
    if natural_width > 0.0 && natural_height > 0.0 {
        Ok(())
    } else {
        Err(EditorError::invalid_dimensions(natural_width, natural_height))
    }
}

/// Clamp `value` into `[lo, hi]`, collapsing to `lo` when the range is empty.
pub(crate) fn clamp_range(value: f64, lo: f64, hi: f64) -> f64 {
    value.min(hi).max(lo)
}

/// Convert a pixel rectangle to percent of the natural image size.
pub fn pixels_to_percent(
    rect: &PixelRect,
    natural_width: f64,
    natural_height: f64,
) -> Result<PercentRect> {
    check_dimensions(natural_width, natural_height)?;
    Ok(PercentRect::new(
        rect.x / natural_width * PERCENT_MAX,
        rect.y / natural_height * PERCENT_MAX,
        rect.width / natural_width * PERCENT_MAX,
        rect.height / natural_height * PERCENT_MAX,
    ))
}

/// Convert a percent rectangle back to (unrounded) pixels.
pub fn percent_to_pixels(
    rect: &PercentRect,
    natural_width: f64,
    natural_height: f64,
) -> Result<PixelRect> {
    check_dimensions(natural_width, natural_height)?;
    Ok(PixelRect::new(
        rect.x / PERCENT_MAX * natural_width,
        rect.y / PERCENT_MAX * natural_height,
        rect.width / PERCENT_MAX * natural_width,
        rect.height / PERCENT_MAX * natural_height,
    ))
}

/// Translate a raw pointer position into percent space, clamped to `[0, 100]`.
///
/// A pointer outside the image lands on the nearest edge. An empty rendered
/// box maps everything to the origin.
pub fn rendered_to_percent(pointer_x: f64, pointer_y: f64, rendered: &RenderedBox) -> PercentPoint {
    let axis = |pointer: f64, offset: f64, size: f64| {
        if size > 0.0 {
            ((pointer - offset) / size * PERCENT_MAX).clamp(0.0, PERCENT_MAX)
        } else {
            0.0
        }
    };
    PercentPoint::new(
        axis(pointer_x, rendered.offset_x, rendered.width),
        axis(pointer_y, rendered.offset_y, rendered.height),
    )
}

/// Place a percent rectangle in display coordinates.
pub fn percent_to_rendered(rect: &PercentRect, rendered: &RenderedBox) -> RenderedRect {
    let sx = rendered.width / PERCENT_MAX;
    let sy = rendered.height / PERCENT_MAX;
    RenderedRect::new(
        rendered.offset_x + rect.x * sx,
        rendered.offset_y + rect.y * sy,
        rect.width * sx,
        rect.height * sy,
    )
}

/// Aspect-preserving fit of the image into the container.
///
/// A wider-than-container image fills the width and is centered vertically;
/// otherwise it fills the height and is centered horizontally. Margins only
/// ever appear on two opposite sides.
pub fn compute_letterbox(
    natural_width: f64,
    natural_height: f64,
    container_width: f64,
    container_height: f64,
) -> Result<RenderedBox> {
    check_dimensions(natural_width, natural_height)?;
    if container_width <= 0.0 || container_height <= 0.0 {
        return Ok(RenderedBox::default());
    }

    let image_aspect = natural_width / natural_height;
    let container_aspect = container_width / container_height;

    let rendered = if image_aspect > container_aspect {
        let height = container_width / image_aspect;
        RenderedBox::new(
            0.0,
            (container_height - height) / 2.0,
            container_width,
            height,
        )
    } else {
        let width = container_height * image_aspect;
        RenderedBox::new(
            (container_width - width) / 2.0,
            0.0,
            width,
            container_height,
        )
    };
    Ok(rendered)
}
