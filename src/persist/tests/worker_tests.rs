//! Tests for the background save thread.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use super::sample_objects;
use crate::model::AnnotatedObject;
use crate::persist::{
    AnnotationStore, ImageKey, PersistenceError, SaveWorker, SidecarStore,
};
use crate::session::{CommitRequest, SessionId};

const WAIT: Duration = Duration::from_secs(5);

/// Store whose saves always fail.
struct FailingStore;

impl AnnotationStore for FailingStore {
    fn id(&self) -> &'static str {
        "failing"
    }

    fn display_name(&self) -> &'static str {
        "Always fails"
    }

    fn load(&self, _image: &ImageKey) -> Result<Vec<AnnotatedObject>, PersistenceError> {
        Ok(Vec::new())
    }

    fn save(&self, image: &ImageKey, _objects: &[AnnotatedObject]) -> Result<(), PersistenceError> {
        Err(PersistenceError::invalid_identifier(image.to_string(), "disk full"))
    }
}

fn request(session: u64, image: PathBuf) -> CommitRequest {
    CommitRequest {
        session_id: SessionId(session),
        image: ImageKey::Path(image),
        objects: sample_objects(),
    }
}

#[test]
fn test_background_save_writes_and_reports() {
    let dir = tempfile::tempdir().expect("tempdir");
    let image = dir.path().join("img.jpg");
    let mut worker = SaveWorker::spawn(Arc::new(SidecarStore::new())).expect("spawn");

    let id = worker.submit(request(7, image.clone())).expect("submit");
    assert_eq!(worker.pending_count(), 1);

    let result = worker.wait_result(WAIT).expect("result");
    assert_eq!(result.request_id, id);
    assert_eq!(result.session_id, SessionId(7));
    assert_eq!(result.image, ImageKey::Path(image.clone()));
    assert!(result.result.is_ok());
    assert_eq!(worker.pending_count(), 0);

    let stored = SidecarStore::new()
        .load(&ImageKey::Path(image))
        .expect("load");
    assert_eq!(stored, sample_objects());
}

#[test]
fn test_failed_save_is_reported_not_dropped() {
    let mut worker = SaveWorker::spawn(Arc::new(FailingStore)).expect("spawn");
    worker.submit(request(1, PathBuf::from("x.jpg"))).expect("submit");

    let result = worker.wait_result(WAIT).expect("result");
    assert!(matches!(result.result, Err(PersistenceError::InvalidIdentifier { .. })));
    assert_eq!(result.objects, sample_objects());
}

#[test]
fn test_results_arrive_in_submission_order() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut worker = SaveWorker::spawn(Arc::new(SidecarStore::new())).expect("spawn");

    let first = worker.submit(request(1, dir.path().join("a.jpg"))).expect("submit a");
    let second = worker.submit(request(2, dir.path().join("b.jpg"))).expect("submit b");

    assert_eq!(worker.wait_result(WAIT).expect("first").request_id, first);
    assert_eq!(worker.wait_result(WAIT).expect("second").request_id, second);
    assert!(worker.take_one_result().is_none());
}

#[test]
fn test_drop_finishes_queued_saves() {
    let dir = tempfile::tempdir().expect("tempdir");
    let image = dir.path().join("img.jpg");
    {
        let mut worker = SaveWorker::spawn(Arc::new(SidecarStore::new())).expect("spawn");
        worker.submit(request(3, image.clone())).expect("submit");
    }
    assert!(dir.path().join("img.json").exists());
}
