//! Annotated object data model.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::rect::{PercentRect, PixelRect};
use crate::constants::UNSET_LABEL;

/// Attribute name to value; `None` means unset.
pub type Labels = BTreeMap<String, Option<String>>;

/// Facing direction of an annotated object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Front,
    Back,
}

impl Direction {
    /// Get the display name for this direction.
    pub fn name(&self) -> &'static str {
        match self {
            Direction::Front => "front",
            Direction::Back => "back",
        }
    }
}

/// One annotated entity on an image, in pixel space.
///
/// Identity is the position in the per-image list; there is no stable id.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AnnotatedObject {
    /// Box in original image pixels
    pub rect: PixelRect,
    /// Free-form attributes (color, brand, model, ...)
    pub labels: Labels,
    /// Facing direction
    pub direction: Direction,
    /// Non-string record fields carried through untouched
    pub extras: BTreeMap<String, serde_json::Value>,
}

impl AnnotatedObject {
    /// Create an object with no labels facing front.
    pub fn new(rect: PixelRect) -> Self {
        Self {
            rect,
            ..Default::default()
        }
    }

    pub fn with_label(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(name.into(), Some(value.into()));
        self
    }

    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    /// Label value, if set and non-empty.
    pub fn label(&self, name: &str) -> Option<&str> {
        self.labels
            .get(name)
            .and_then(|v| v.as_deref())
            .filter(|v| !v.is_empty())
    }

    /// Label value as shown to users, `"NULL"` when unset.
    pub fn label_display(&self, name: &str) -> &str {
        self.label(name).unwrap_or(UNSET_LABEL)
    }
}

/// An object in the edit session's working copy.
///
/// `rect_percent` is authoritative while editing; `rect_pixels` is derived
/// from it and left unrounded.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkingObject {
    pub rect_percent: PercentRect,
    pub rect_pixels: PixelRect,
    pub labels: Labels,
    pub direction: Direction,
    pub extras: BTreeMap<String, serde_json::Value>,
}

impl WorkingObject {
    /// Freshly drawn object: empty labels, facing front.
    pub fn drawn(rect_percent: PercentRect, rect_pixels: PixelRect) -> Self {
        Self {
            rect_percent,
            rect_pixels,
            labels: Labels::new(),
            direction: Direction::Front,
            extras: BTreeMap::new(),
        }
    }

    /// Label value, if set and non-empty.
    pub fn label(&self, name: &str) -> Option<&str> {
        self.labels
            .get(name)
            .and_then(|v| v.as_deref())
            .filter(|v| !v.is_empty())
    }

    /// Set a label; an empty value is stored as unset.
    pub fn set_label(&mut self, name: impl Into<String>, value: Option<String>) {
        let value = value.filter(|v| !v.is_empty());
        self.labels.insert(name.into(), value);
    }

    /// Convert back to a persisted object with the given pixel rectangle.
    pub fn to_annotated(&self, rect: PixelRect) -> AnnotatedObject {
        AnnotatedObject {
            rect,
            labels: self.labels.clone(),
            direction: self.direction,
            extras: self.extras.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_display_sentinel() {
        let obj = AnnotatedObject::new(PixelRect::new(0.0, 0.0, 10.0, 10.0))
            .with_label("color", "red")
            .with_label("brand", "");
        assert_eq!(obj.label_display("color"), "red");
        assert_eq!(obj.label_display("brand"), "NULL");
        assert_eq!(obj.label_display("model"), "NULL");
    }

    #[test]
    fn test_set_label_empty_is_unset() {
        let mut obj = WorkingObject::drawn(PercentRect::default(), PixelRect::default());
        obj.set_label("color", Some("blue".to_string()));
        assert_eq!(obj.label("color"), Some("blue"));
        obj.set_label("color", Some(String::new()));
        assert_eq!(obj.labels.get("color"), Some(&None));
    }

    #[test]
    fn test_direction_defaults_to_front() {
        assert_eq!(Direction::default(), Direction::Front);
        assert_eq!(AnnotatedObject::default().direction, Direction::Front);
    }
}
