//! Rectangle and point types for the three coordinate spaces.
//!
//! - **Pixel space**: original image pixels, origin top-left.
//! - **Percent space**: normalized to the image's own size, 0-100 per axis.
//! - **Rendered space**: display/container coordinates after letterboxing.

use serde::{Deserialize, Serialize};

/// A rectangle in original image pixel units.
///
/// Kept as `f64` while editing; rounding happens only when persisting.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl PixelRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Round every component to the nearest integer pixel.
    pub fn rounded(&self) -> Self {
        Self::new(
            self.x.round(),
            self.y.round(),
            self.width.round(),
            self.height.round(),
        )
    }

    /// Clamp the rectangle into `[0, width] x [0, height]` of the image.
    ///
    /// A box lying entirely outside the image is moved back inside rather
    /// than collapsed, so the result always has a size of at least 1 px.
    pub fn clamped_to(&self, image_width: f64, image_height: f64) -> Self {
        let (x, width) = clamp_axis(self.x, self.width, image_width);
        let (y, height) = clamp_axis(self.y, self.height, image_height);
        Self::new(x, y, width, height)
    }

    /// As the `[x, y, w, h]` array used by the sidecar files.
    pub fn to_array(&self) -> [f64; 4] {
        [self.x, self.y, self.width, self.height]
    }

    pub fn from_array(rect: [f64; 4]) -> Self {
        Self::new(rect[0], rect[1], rect[2], rect[3])
    }
}

/// Clamp one axis to `[0, limit]`. A span that would collapse below one
/// pixel is shifted inside instead, keeping its length up to `limit`.
fn clamp_axis(start: f64, len: f64, limit: f64) -> (f64, f64) {
    let limit = limit.max(0.0);
    let lo = start.clamp(0.0, limit);
    let hi = (start + len).clamp(lo, limit);
    if hi - lo >= 1.0 || limit < 1.0 {
        return (lo, hi - lo);
    }
    let len = len.max(1.0).min(limit);
    (start.clamp(0.0, limit - len), len)
}

/// A point in percent space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PercentPoint {
    pub x: f64,
    pub y: f64,
}

impl PercentPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Component-wise difference `self - origin`.
    pub fn delta_from(&self, origin: PercentPoint) -> (f64, f64) {
        (self.x - origin.x, self.y - origin.y)
    }
}

/// A rectangle normalized to the image size, each component in `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PercentRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl PercentRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Normalized rectangle spanning two corner points.
    pub fn from_corners(a: PercentPoint, b: PercentPoint) -> Self {
        Self {
            x: a.x.min(b.x),
            y: a.y.min(b.y),
            width: (b.x - a.x).abs(),
            height: (b.y - a.y).abs(),
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Center of the box, used for index badges.
    pub fn center(&self) -> PercentPoint {
        PercentPoint::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Check if a point is inside the box (edges inclusive).
    pub fn contains(&self, point: PercentPoint) -> bool {
        point.x >= self.x
            && point.x <= self.right()
            && point.y >= self.y
            && point.y <= self.bottom()
    }
}

/// The sub-region of the display container actually covered by the image.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RenderedBox {
    pub offset_x: f64,
    pub offset_y: f64,
    pub width: f64,
    pub height: f64,
}

impl RenderedBox {
    pub fn new(offset_x: f64, offset_y: f64, width: f64, height: f64) -> Self {
        Self {
            offset_x,
            offset_y,
            width,
            height,
        }
    }

    /// Whether the box covers a non-empty area.
    pub fn is_visible(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }
}

/// A rectangle in display coordinates, ready to paint.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RenderedRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl RenderedRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}
