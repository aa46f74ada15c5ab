//! On-disk record shape for one annotated object.
//!
//! A record is a flat JSON object: `rect` as `[x, y, w, h]`, an optional
//! `direction`, and every label as its own key. String or null values are
//! labels; any other value (e.g. coordinate arrays) is carried through
//! untouched.
//!
//! ```json
//! {"rect": [100, 100, 200, 100], "color": "red", "brand": null, "direction": "front"}
//! ```

use std::collections::BTreeMap;

use serde::ser::SerializeTuple;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use super::error::PersistenceError;
use crate::model::{AnnotatedObject, Direction, Labels, PixelRect};

const DIRECTION_KEY: &str = "direction";

/// Serialized form of an [`AnnotatedObject`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectRecord {
    /// `[x, y, width, height]` in pixels
    #[serde(serialize_with = "serialize_rect")]
    pub rect: [f64; 4],

    /// Labels, direction and pass-through fields
    #[serde(flatten)]
    pub fields: BTreeMap<String, Value>,
}

/// Whole-pixel values are written as integers.
fn serialize_rect<S: Serializer>(rect: &[f64; 4], serializer: S) -> Result<S::Ok, S::Error> {
    let mut seq = serializer.serialize_tuple(4)?;
    for value in rect {
        if value.fract() == 0.0 && value.abs() < 9.0e15 {
            seq.serialize_element(&(*value as i64))?;
        } else {
            seq.serialize_element(value)?;
        }
    }
    seq.end()
}

impl ObjectRecord {
    /// Build the record written for an object; the rect is rounded here.
    pub fn from_object(object: &AnnotatedObject) -> Self {
        let mut fields: BTreeMap<String, Value> = object
            .extras
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        for (name, value) in &object.labels {
            let value = value.clone().map(Value::String).unwrap_or(Value::Null);
            fields.insert(name.clone(), value);
        }
        fields.insert(
            DIRECTION_KEY.to_string(),
            Value::String(object.direction.name().to_string()),
        );

        Self {
            rect: object.rect.rounded().to_array(),
            fields,
        }
    }

    /// Interpret the record; `image`/`index` only feed error messages.
    pub fn into_object(self, image: &str, index: usize) -> Result<AnnotatedObject, PersistenceError> {
        if self.rect.iter().any(|v| !v.is_finite()) {
            return Err(PersistenceError::malformed_record(
                image,
                index,
                "rect contains non-finite values",
            ));
        }
        if self.rect[2] <= 0.0 || self.rect[3] <= 0.0 {
            return Err(PersistenceError::malformed_record(
                image,
                index,
                format!("rect has non-positive size {}x{}", self.rect[2], self.rect[3]),
            ));
        }

        let mut direction = Direction::Front;
        let mut labels = Labels::new();
        let mut extras = BTreeMap::new();

        for (name, value) in self.fields {
            if name == DIRECTION_KEY {
                direction = parse_direction(&value, image, index);
                continue;
            }
            match value {
                Value::String(s) => {
                    labels.insert(name, Some(s));
                }
                Value::Null => {
                    labels.insert(name, None);
                }
                other => {
                    extras.insert(name, other);
                }
            }
        }

        Ok(AnnotatedObject {
            rect: PixelRect::from_array(self.rect),
            labels,
            direction,
            extras,
        })
    }
}

fn parse_direction(value: &Value, image: &str, index: usize) -> Direction {
    match value {
        Value::Null => Direction::Front,
        Value::String(s) if s.eq_ignore_ascii_case("back") => Direction::Back,
        Value::String(s) if s.is_empty() || s.eq_ignore_ascii_case("front") => Direction::Front,
        other => {
            log::warn!(
                "Unknown direction {} on record {} of '{}', using front",
                other,
                index,
                image
            );
            Direction::Front
        }
    }
}

/// Parse a JSON array of records.
pub fn objects_from_json(json: &str, image: &str) -> Result<Vec<AnnotatedObject>, PersistenceError> {
    let records: Vec<ObjectRecord> = serde_json::from_str(json)?;
    records_to_objects(records, image)
}

pub fn records_to_objects(
    records: Vec<ObjectRecord>,
    image: &str,
) -> Result<Vec<AnnotatedObject>, PersistenceError> {
    records
        .into_iter()
        .enumerate()
        .map(|(index, record)| record.into_object(image, index))
        .collect()
}

pub fn objects_to_records(objects: &[AnnotatedObject]) -> Vec<ObjectRecord> {
    objects.iter().map(ObjectRecord::from_object).collect()
}
