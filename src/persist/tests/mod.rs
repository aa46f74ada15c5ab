//! Tests for the storage backends and the background save thread.

mod worker_tests;

use crate::model::{AnnotatedObject, Direction, PixelRect};

/// Two objects with whole-pixel rects, so a save/load cycle is exact.
fn sample_objects() -> Vec<AnnotatedObject> {
    vec![
        AnnotatedObject::new(PixelRect::new(100.0, 100.0, 200.0, 100.0))
            .with_label("color", "red")
            .with_label("brand", "volvo"),
        AnnotatedObject::new(PixelRect::new(10.0, 20.0, 30.0, 40.0))
            .with_label("type", "truck")
            .with_direction(Direction::Back),
    ]
}
