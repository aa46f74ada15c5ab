//! Pointer interactions on the working copy and their pure geometry.
//!
//! Every function here maps a start rectangle plus a pointer delta to a new
//! rectangle. Nothing fails: out-of-bounds input is clamped, and a resize
//! that would shrink a box below [`MIN_BOX_SIZE_PERCENT`] keeps the previous
//! frame on that axis.

use crate::constants::{MIN_BOX_SIZE_PERCENT, PERCENT_MAX};
use crate::geometry::clamp_range;
use crate::model::{PercentPoint, PercentRect};

/// One of the eight resize grips of a selected box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResizeHandle {
    NorthWest,
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
}

impl ResizeHandle {
    /// All handles, clockwise from the top-left corner.
    pub const ALL: [ResizeHandle; 8] = [
        ResizeHandle::NorthWest,
        ResizeHandle::North,
        ResizeHandle::NorthEast,
        ResizeHandle::East,
        ResizeHandle::SouthEast,
        ResizeHandle::South,
        ResizeHandle::SouthWest,
        ResizeHandle::West,
    ];

    /// Short compass name ("nw", "n", ...).
    pub fn name(&self) -> &'static str {
        match self {
            ResizeHandle::NorthWest => "nw",
            ResizeHandle::North => "n",
            ResizeHandle::NorthEast => "ne",
            ResizeHandle::East => "e",
            ResizeHandle::SouthEast => "se",
            ResizeHandle::South => "s",
            ResizeHandle::SouthWest => "sw",
            ResizeHandle::West => "w",
        }
    }

    /// Parse a short compass name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|h| h.name() == name)
    }

    fn moves_left(&self) -> bool {
        matches!(
            self,
            ResizeHandle::NorthWest | ResizeHandle::West | ResizeHandle::SouthWest
        )
    }

    fn moves_right(&self) -> bool {
        matches!(
            self,
            ResizeHandle::NorthEast | ResizeHandle::East | ResizeHandle::SouthEast
        )
    }

    fn moves_top(&self) -> bool {
        matches!(
            self,
            ResizeHandle::NorthWest | ResizeHandle::North | ResizeHandle::NorthEast
        )
    }

    fn moves_bottom(&self) -> bool {
        matches!(
            self,
            ResizeHandle::SouthWest | ResizeHandle::South | ResizeHandle::SouthEast
        )
    }

    /// Where the grip sits on `rect`.
    pub fn anchor(&self, rect: &PercentRect) -> PercentPoint {
        let x = if self.moves_left() {
            rect.x
        } else if self.moves_right() {
            rect.right()
        } else {
            rect.x + rect.width / 2.0
        };
        let y = if self.moves_top() {
            rect.y
        } else if self.moves_bottom() {
            rect.bottom()
        } else {
            rect.y + rect.height / 2.0
        };
        PercentPoint::new(x, y)
    }
}

/// The active pointer interaction of an edit session.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Interaction {
    /// No interaction in progress
    #[default]
    Idle,
    /// Translating the selected box
    Moving {
        start_pointer: PercentPoint,
        start_rect: PercentRect,
        /// Last computed frame
        current: PercentRect,
    },
    /// Dragging one handle of the selected box
    Resizing {
        handle: ResizeHandle,
        start_pointer: PercentPoint,
        start_rect: PercentRect,
        /// Last valid frame
        current: PercentRect,
    },
    /// Rubber-banding a new box
    Drawing {
        start_pointer: PercentPoint,
        current_pointer: PercentPoint,
    },
}

impl Interaction {
    pub fn is_idle(&self) -> bool {
        matches!(self, Interaction::Idle)
    }

    /// Name for log messages.
    pub fn name(&self) -> &'static str {
        match self {
            Interaction::Idle => "idle",
            Interaction::Moving { .. } => "move",
            Interaction::Resizing { .. } => "resize",
            Interaction::Drawing { .. } => "draw",
        }
    }

    /// Rectangle to paint for the interaction in progress.
    pub fn preview(&self) -> Option<PercentRect> {
        match self {
            Interaction::Idle => None,
            Interaction::Moving { current, .. } | Interaction::Resizing { current, .. } => {
                Some(*current)
            }
            Interaction::Drawing {
                start_pointer,
                current_pointer,
            } => Some(drawn_rect(*start_pointer, *current_pointer)),
        }
    }

    /// Advance the interaction to a new pointer position.
    pub fn update(&mut self, pointer: PercentPoint) {
        match self {
            Interaction::Idle => {}
            Interaction::Moving {
                start_pointer,
                start_rect,
                current,
            } => {
                let (dx, dy) = pointer.delta_from(*start_pointer);
                *current = moved_rect(start_rect, dx, dy);
            }
            Interaction::Resizing {
                handle,
                start_pointer,
                start_rect,
                current,
            } => {
                let (dx, dy) = pointer.delta_from(*start_pointer);
                *current = resized_rect(start_rect, current, *handle, dx, dy);
            }
            Interaction::Drawing {
                current_pointer, ..
            } => {
                *current_pointer = clamp_point(pointer);
            }
        }
    }
}

fn clamp_point(point: PercentPoint) -> PercentPoint {
    PercentPoint::new(
        point.x.clamp(0.0, PERCENT_MAX),
        point.y.clamp(0.0, PERCENT_MAX),
    )
}

/// Translate `start` by the delta, keeping it fully inside `[0, 100]`.
pub fn moved_rect(start: &PercentRect, dx: f64, dy: f64) -> PercentRect {
    PercentRect::new(
        clamp_range(start.x + dx, 0.0, PERCENT_MAX - start.width),
        clamp_range(start.y + dy, 0.0, PERCENT_MAX - start.height),
        start.width,
        start.height,
    )
}

/// Resize one axis; `None` when the result would be under the minimum size.
fn resize_axis(
    origin: f64,
    size: f64,
    delta: f64,
    moves_low: bool,
    moves_high: bool,
) -> Option<(f64, f64)> {
    let (new_origin, new_size) = if moves_low {
        // Opposite edge stays fixed
        let far = origin + size;
        let new_origin = (origin + delta).max(0.0);
        (new_origin, far - new_origin)
    } else if moves_high {
        let far = (origin + size + delta).min(PERCENT_MAX);
        (origin, far - origin)
    } else {
        return Some((origin, size));
    };

    (new_size >= MIN_BOX_SIZE_PERCENT).then_some((new_origin, new_size))
}

/// Move the edges named by `handle`; other edges stay where `start` had them.
///
/// An axis whose new size would fall below the minimum keeps `previous`.
pub fn resized_rect(
    start: &PercentRect,
    previous: &PercentRect,
    handle: ResizeHandle,
    dx: f64,
    dy: f64,
) -> PercentRect {
    let (x, width) = resize_axis(start.x, start.width, dx, handle.moves_left(), handle.moves_right())
        .unwrap_or((previous.x, previous.width));
    let (y, height) = resize_axis(start.y, start.height, dy, handle.moves_top(), handle.moves_bottom())
        .unwrap_or((previous.y, previous.height));
    PercentRect::new(x, y, width, height)
}

/// Preview box spanned by the draw start point and the current pointer.
pub fn drawn_rect(start: PercentPoint, current: PercentPoint) -> PercentRect {
    PercentRect::from_corners(start, current)
}

/// Whether a drawn box is large enough to keep.
pub fn meets_min_size(rect: &PercentRect) -> bool {
    rect.width >= MIN_BOX_SIZE_PERCENT && rect.height >= MIN_BOX_SIZE_PERCENT
}
