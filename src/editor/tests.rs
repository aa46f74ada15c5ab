//! Controller tests against an in-memory store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::*;
use crate::model::PixelRect;

const WAIT: Duration = Duration::from_secs(5);

#[derive(Default)]
struct MemoryStore {
    lists: Mutex<HashMap<ImageKey, Vec<AnnotatedObject>>>,
    fail: AtomicBool,
    saves: AtomicUsize,
}

impl MemoryStore {
    fn stored(&self, image: &ImageKey) -> Option<Vec<AnnotatedObject>> {
        self.lists.lock().expect("lock").get(image).cloned()
    }

    fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl AnnotationStore for MemoryStore {
    fn id(&self) -> &'static str {
        "memory"
    }

    fn display_name(&self) -> &'static str {
        "In-memory"
    }

    fn load(&self, image: &ImageKey) -> std::result::Result<Vec<AnnotatedObject>, PersistenceError> {
        Ok(self.stored(image).unwrap_or_default())
    }

    fn save(
        &self,
        image: &ImageKey,
        objects: &[AnnotatedObject],
    ) -> std::result::Result<(), PersistenceError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(PersistenceError::invalid_identifier(image.to_string(), "backend offline"));
        }
        self.saves.fetch_add(1, Ordering::SeqCst);
        self.lists
            .lock()
            .expect("lock")
            .insert(image.clone(), objects.to_vec());
        Ok(())
    }
}

fn key(name: &str) -> ImageKey {
    ImageKey::path(format!("images/{name}"))
}

fn car() -> AnnotatedObject {
    AnnotatedObject::new(PixelRect::new(100.0, 100.0, 200.0, 100.0)).with_label("color", "red")
}

/// Editor with a 1000x500 image filling a 1000x500 container, so display
/// pixels equal image pixels.
fn editor() -> (AnnotationEditor, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::default());
    let mut editor = AnnotationEditor::new(store.clone());
    editor.on_container_resize(1000.0, 500.0).expect("resize");
    editor.on_image_load(1000, 500).expect("load");
    (editor, store)
}

#[test]
fn test_enter_edit_needs_layout() {
    let mut editor = AnnotationEditor::new(Arc::new(MemoryStore::default()));
    let err = editor.enter_edit(key("a.jpg"), &[car()], None).unwrap_err();
    assert!(matches!(err, EditorError::NoImageContext));
    assert!(!editor.is_editing());
}

#[test]
fn test_drag_then_commit_persists_moved_box() {
    let (mut editor, store) = editor();
    editor.enter_edit(key("a.jpg"), &[car()], None).expect("enter");
    assert!(editor.input_capture().is_some());

    assert_eq!(
        editor.pointer_down(150.0, 150.0).expect("down"),
        PointerAction::Moving { index: 0 }
    );
    assert!(editor.pointer_move(200.0, 150.0).expect("move").is_some());
    let outcome = editor.pointer_up(250.0, 150.0).expect("up");
    assert_eq!(outcome, Some(InteractionOutcome::Updated { index: 0 }));

    assert_eq!(editor.commit().expect("commit"), CommitStatus::Saved);
    assert!(!editor.is_editing());
    assert!(editor.input_capture().is_none());

    let saved = store.stored(&key("a.jpg")).expect("saved");
    assert_eq!(saved[0].rect, PixelRect::new(200.0, 100.0, 200.0, 100.0));
    assert_eq!(saved[0].label("color"), Some("red"));

    let events = editor.take_events();
    assert!(matches!(events.as_slice(), [EditorEvent::CommitSucceeded { .. }]));
}

#[test]
fn test_handle_drag_resizes_selected_box() {
    let (mut editor, store) = editor();
    editor.enter_edit(key("a.jpg"), &[car()], None).expect("enter");
    editor.select_object(Some(0)).expect("select");

    // South-east corner sits at (300, 200)
    assert_eq!(
        editor.pointer_down(303.0, 198.0).expect("down"),
        PointerAction::Resizing {
            index: 0,
            handle: ResizeHandle::SouthEast
        }
    );
    editor.pointer_up(403.0, 248.0).expect("up");
    editor.commit().expect("commit");

    let saved = store.stored(&key("a.jpg")).expect("saved");
    assert_eq!(saved[0].rect, PixelRect::new(100.0, 100.0, 300.0, 150.0));
}

#[test]
fn test_small_draw_is_dropped_with_event() {
    let (mut editor, _store) = editor();
    editor.enter_edit(key("a.jpg"), &[car()], None).expect("enter");

    editor.start_draw().expect("arm");
    assert!(editor.is_draw_armed());
    assert_eq!(editor.pointer_down(100.0, 50.0).expect("down"), PointerAction::Drawing);
    assert!(!editor.is_draw_armed());

    let outcome = editor.pointer_up(110.0, 52.5).expect("up");
    assert!(matches!(outcome, Some(InteractionOutcome::TooSmall { .. })));
    assert_eq!(editor.working_objects().len(), 1);
    assert!(matches!(
        editor.take_events().as_slice(),
        [EditorEvent::TooSmallDraw { .. }]
    ));
}

#[test]
fn test_drawn_box_is_appended_and_selected() {
    let (mut editor, store) = editor();
    editor.enter_edit(key("a.jpg"), &[car()], None).expect("enter");

    editor.start_draw().expect("arm");
    editor.pointer_down(700.0, 400.0).expect("down");
    let outcome = editor.pointer_up(500.0, 250.0).expect("up");
    assert_eq!(outcome, Some(InteractionOutcome::Created { index: 1 }));
    assert_eq!(editor.selected_index(), Some(1));

    editor.set_label(1, "brand", Some("audi".to_string())).expect("label");
    editor.commit().expect("commit");

    let saved = store.stored(&key("a.jpg")).expect("saved");
    assert_eq!(saved.len(), 2);
    assert_eq!(saved[1].rect, PixelRect::new(500.0, 250.0, 200.0, 150.0));
    assert_eq!(saved[1].label("brand"), Some("audi"));
}

#[test]
fn test_click_on_empty_space_deselects() {
    let (mut editor, _store) = editor();
    editor.enter_edit(key("a.jpg"), &[car()], None).expect("enter");
    editor.select_object(Some(0)).expect("select");

    assert_eq!(editor.pointer_down(900.0, 450.0).expect("down"), PointerAction::Deselected);
    assert_eq!(editor.selected_index(), None);
}

#[test]
fn test_pointer_without_session_is_ignored() {
    let (mut editor, _store) = editor();
    assert_eq!(editor.pointer_down(150.0, 150.0).expect("down"), PointerAction::Ignored);
    assert_eq!(editor.pointer_move(160.0, 150.0).expect("move"), None);
    assert_eq!(editor.pointer_up(160.0, 150.0).expect("up"), None);
}

#[test]
fn test_layout_change_updates_pointer_mapping() {
    let (mut editor, _store) = editor();
    editor.enter_edit(key("a.jpg"), &[car()], None).expect("enter");

    // Square container: image is letterboxed to 500x250 at y offset 125
    editor.on_container_resize(500.0, 500.0).expect("resize");
    let rendered = editor.session().expect("session").context().rendered_box;
    assert_eq!(rendered, RenderedBox::new(0.0, 125.0, 500.0, 250.0));

    // (75, 200) is 15%, 30% of the image
    assert_eq!(
        editor.pointer_down(75.0, 200.0).expect("down"),
        PointerAction::Moving { index: 0 }
    );
}

#[test]
fn test_second_session_for_same_image_is_rejected() {
    let (mut editor, _store) = editor();
    let first = editor.enter_edit(key("a.jpg"), &[car()], None).expect("enter");

    let err = editor.enter_edit(key("a.jpg"), &[], None).unwrap_err();
    assert!(matches!(err, EditorError::SessionActive { .. }));
    assert_eq!(editor.session().map(|s| s.id()), Some(first));
    assert_eq!(editor.working_objects().len(), 1);
}

#[test]
fn test_failed_commit_keeps_session_for_retry() {
    let (mut editor, store) = editor();
    editor.enter_edit(key("a.jpg"), &[car()], None).expect("enter");
    editor.select_object(Some(0)).expect("select");
    editor.delete_selected().expect("delete");
    store.set_failing(true);

    let err = editor.commit().unwrap_err();
    assert!(matches!(err, EditorError::Persistence(_)));
    assert!(err.is_recoverable());
    assert!(editor.is_editing());
    assert!(editor.working_objects().is_empty());
    assert!(editor.can_navigate());
    assert!(matches!(
        editor.take_events().as_slice(),
        [EditorEvent::CommitFailed { .. }]
    ));

    store.set_failing(false);
    assert_eq!(editor.commit().expect("retry"), CommitStatus::Saved);
    assert_eq!(store.stored(&key("a.jpg")), Some(Vec::new()));
}

#[test]
fn test_discard_restores_snapshot_without_saving() {
    let (mut editor, store) = editor();
    let original = vec![car(), AnnotatedObject::new(PixelRect::new(600.0, 300.0, 100.0, 50.0))];
    editor.enter_edit(key("a.jpg"), &original, None).expect("enter");

    editor.pointer_down(150.0, 150.0).expect("down");
    editor.pointer_up(900.0, 480.0).expect("up");
    editor.select_object(Some(1)).expect("select");
    editor.delete_selected().expect("delete");
    editor.start_draw().expect("arm");
    editor.pointer_down(10.0, 10.0).expect("down");

    let restored = editor.discard().expect("discard");
    assert_eq!(restored, original);
    assert!(!editor.is_editing());
    assert!(editor.input_capture().is_none());
    assert_eq!(store.save_count(), 0);
}

#[test]
fn test_exit_edit_commits_only_when_modified() {
    let (mut editor, store) = editor();
    editor.enter_edit(key("a.jpg"), &[car()], None).expect("enter");
    assert_eq!(editor.exit_edit().expect("exit"), ExitOutcome::Discarded);
    assert_eq!(store.save_count(), 0);

    editor.enter_edit(key("a.jpg"), &[car()], None).expect("enter");
    editor.set_label(0, "color", None).expect("label");
    assert_eq!(editor.exit_edit().expect("exit"), ExitOutcome::Saved);
    let saved = store.stored(&key("a.jpg")).expect("saved");
    assert_eq!(saved[0].label_display("color"), "NULL");
}

#[test]
fn test_switching_image_commits_previous_session() {
    let (mut editor, store) = editor();
    editor.enter_edit(key("a.jpg"), &[car()], None).expect("enter a");
    editor.select_object(Some(0)).expect("select");
    editor.delete_selected().expect("delete");

    editor.enter_edit(key("b.jpg"), &[], None).expect("enter b");
    assert_eq!(store.stored(&key("a.jpg")), Some(Vec::new()));
    assert_eq!(editor.session().map(|s| s.image().clone()), Some(key("b.jpg")));

    // Unchanged sessions are dropped without a save
    editor.enter_edit(key("c.jpg"), &[], None).expect("enter c");
    assert_eq!(store.save_count(), 1);
}

#[test]
fn test_switch_refused_when_resolving_commit_fails() {
    let (mut editor, store) = editor();
    editor.enter_edit(key("a.jpg"), &[car()], None).expect("enter a");
    editor.set_label(0, "brand", Some("fiat".to_string())).expect("label");
    store.set_failing(true);

    assert!(editor.enter_edit(key("b.jpg"), &[], None).is_err());
    assert!(editor.session().is_some_and(|s| s.is_modified()));
    assert_eq!(editor.session().map(|s| s.image().clone()), Some(key("a.jpg")));
    assert!(editor.input_capture().is_some());
}

#[test]
fn test_switch_with_discard_policy_saves_nothing() {
    let (editor, store) = editor();
    let mut editor = editor.with_switch_policy(ResolvePolicy::Discard);
    editor.enter_edit(key("a.jpg"), &[car()], None).expect("enter a");
    editor.set_label(0, "color", Some("blue".to_string())).expect("label");

    editor.enter_edit(key("b.jpg"), &[], None).expect("enter b");
    assert_eq!(store.save_count(), 0);
}

#[test]
fn test_enter_edit_loaded_reads_store() {
    let (mut editor, store) = editor();
    store.save(&key("a.jpg"), &[car()]).expect("seed");

    editor.enter_edit_loaded(key("a.jpg"), None).expect("enter");
    assert_eq!(editor.working_objects().len(), 1);
    assert_eq!(editor.working_objects()[0].label("color"), Some("red"));
}

#[test]
fn test_background_commit_blocks_navigation_until_applied() {
    let (editor, store) = editor();
    let mut editor = editor.with_background_saves().expect("worker");
    editor.enter_edit(key("a.jpg"), &[car()], None).expect("enter");
    editor.select_object(Some(0)).expect("select");
    editor.delete_selected().expect("delete");

    assert_eq!(editor.commit().expect("commit"), CommitStatus::Pending);
    assert!(!editor.can_navigate());
    assert!(matches!(
        editor.enter_edit(key("b.jpg"), &[], None),
        Err(EditorError::CommitInFlight { .. })
    ));
    assert!(matches!(editor.start_draw(), Err(EditorError::CommitInFlight { .. })));
    assert!(!editor.is_draw_armed());

    assert!(editor.wait_for_save(WAIT));
    assert!(!editor.is_editing());
    assert_eq!(store.stored(&key("a.jpg")), Some(Vec::new()));
    assert!(matches!(
        editor.take_events().as_slice(),
        [EditorEvent::CommitSucceeded { .. }]
    ));
}

#[test]
fn test_stale_background_result_is_ignored() {
    let (editor, _store) = editor();
    let mut editor = editor.with_background_saves().expect("worker");
    editor.enter_edit(key("a.jpg"), &[car()], None).expect("enter");
    editor.set_label(0, "color", Some("green".to_string())).expect("label");
    editor.commit().expect("commit");
    editor.discard().expect("discard");

    let second = editor.enter_edit(key("a.jpg"), &[car()], None).expect("re-enter");
    assert!(editor.wait_for_save(WAIT));

    assert_eq!(editor.session().map(|s| s.id()), Some(second));
    assert!(editor.take_events().is_empty());
}

#[test]
fn test_from_config_uses_configured_store() {
    let editor = AnnotationEditor::from_config(&EditorConfig::default()).expect("editor");
    assert_eq!(editor.store().id(), "sidecar");
}
