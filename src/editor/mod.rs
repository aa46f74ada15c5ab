//! The annotation editor controller.
//!
//! [`AnnotationEditor`] owns at most one [`EditSession`], the overlay layout
//! and the persistence backend. The host feeds it layout changes, pointer
//! events and toolbar actions, paints from its observable state, and drains
//! [`EditorEvent`]s for user feedback.

mod capture;

#[cfg(test)]
mod tests;

use std::sync::Arc;
use std::time::Duration;

pub use capture::InputCapture;

use crate::config::{EditorConfig, ResolvePolicy};
use crate::constants::DEFAULT_HANDLE_HIT_RADIUS_PX;
use crate::error::{EditorError, Result};
use crate::geometry::{percent_to_rendered, rendered_to_percent};
use crate::model::{
    AnnotatedObject, ImageRenderContext, PercentPoint, PercentRect, RenderedBox, WorkingObject,
};
use crate::overlay::OverlayPositioner;
use crate::persist::{AnnotationStore, ImageKey, PersistenceError, SaveResult, SaveWorker};
use crate::session::{CommitRequest, EditSession, InteractionOutcome, ResizeHandle, SessionId};

/// Notifications for the host (status line, toasts).
#[derive(Debug, Clone, PartialEq)]
pub enum EditorEvent {
    /// A commit was saved and its session ended
    CommitSucceeded {
        image: ImageKey,
        /// The list as written
        objects: Vec<AnnotatedObject>,
    },
    /// A commit failed; the session is still open
    CommitFailed { image: ImageKey, reason: String },
    /// A drawn box was under the minimum size and dropped
    TooSmallDraw { width: f64, height: f64 },
}

/// Result of [`AnnotationEditor::commit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitStatus {
    /// Saved and the session ended
    Saved,
    /// Handed to the background save thread; see [`AnnotationEditor::poll`]
    Pending,
}

/// Result of [`AnnotationEditor::exit_edit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitOutcome {
    /// Nothing had changed; the session was dropped
    Discarded,
    Saved,
    Pending,
}

/// What a pointer-down did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerAction {
    /// No session, no capture or no layout yet
    Ignored,
    Drawing,
    Resizing { index: usize, handle: ResizeHandle },
    Moving { index: usize },
    Deselected,
}

enum SaveChannel {
    Direct,
    Background(SaveWorker),
}

/// Top-level orchestrator of the edit mode.
pub struct AnnotationEditor {
    store: Arc<dyn AnnotationStore>,
    saves: SaveChannel,
    overlay: OverlayPositioner,
    session: Option<EditSession>,
    capture: Option<InputCapture>,
    next_session_id: u64,
    /// Next pointer-down starts a draw
    draw_armed: bool,
    handle_hit_radius_px: f64,
    switch_policy: ResolvePolicy,
    events: Vec<EditorEvent>,
}

impl AnnotationEditor {
    /// Editor saving synchronously through `store`.
    pub fn new(store: Arc<dyn AnnotationStore>) -> Self {
        log::debug!("Annotation editor using '{}' store", store.id());
        Self {
            store,
            saves: SaveChannel::Direct,
            overlay: OverlayPositioner::new(),
            session: None,
            capture: None,
            next_session_id: 1,
            draw_armed: false,
            handle_hit_radius_px: DEFAULT_HANDLE_HIT_RADIUS_PX,
            switch_policy: ResolvePolicy::default(),
            events: Vec::new(),
        }
    }

    /// Editor set up from the configuration file.
    pub fn from_config(config: &EditorConfig) -> Result<Self> {
        let prefs = &config.preferences;
        let editor = Self::new(config.build_store())
            .with_handle_hit_radius(prefs.handle_hit_radius_px)
            .with_switch_policy(prefs.resolve_on_switch);
        if prefs.background_saves {
            editor.with_background_saves()
        } else {
            Ok(editor)
        }
    }

    /// Run commits on a background thread.
    pub fn with_background_saves(mut self) -> Result<Self> {
        let worker = SaveWorker::spawn(Arc::clone(&self.store))?;
        self.saves = SaveChannel::Background(worker);
        Ok(self)
    }

    pub fn with_handle_hit_radius(mut self, radius_px: f64) -> Self {
        self.handle_hit_radius_px = radius_px.max(0.0);
        self
    }

    pub fn with_switch_policy(mut self, policy: ResolvePolicy) -> Self {
        self.switch_policy = policy;
        self
    }

    pub fn store(&self) -> &dyn AnnotationStore {
        self.store.as_ref()
    }

    // Layout

    /// A new image finished loading at its natural size.
    pub fn on_image_load(&mut self, natural_width: u32, natural_height: u32) -> Result<Option<RenderedBox>> {
        let rendered = self.overlay.on_image_load(natural_width, natural_height)?;
        self.sync_session_context();
        Ok(rendered)
    }

    pub fn on_container_resize(&mut self, width: f64, height: f64) -> Result<Option<RenderedBox>> {
        let rendered = self.overlay.on_container_resize(width, height)?;
        self.sync_session_context();
        Ok(rendered)
    }

    /// Zoom or modal open/close.
    pub fn on_layout_transition(&mut self) -> Result<Option<RenderedBox>> {
        let rendered = self.overlay.on_transition()?;
        self.sync_session_context();
        Ok(rendered)
    }

    fn sync_session_context(&mut self) {
        if let (Some(session), Some(context)) = (self.session.as_mut(), self.overlay.render_context()) {
            session.update_context(context);
        }
    }

    pub fn overlay(&self) -> &OverlayPositioner {
        &self.overlay
    }

    // Session lifecycle

    /// Enter edit mode for `image` with its current object list.
    ///
    /// Without an explicit `context` the overlay's current layout is used.
    /// A live session for the same image is an error; a live session for
    /// another image is resolved first according to the switch policy, and
    /// if that fails the old session stays.
    pub fn enter_edit(
        &mut self,
        image: ImageKey,
        objects: &[AnnotatedObject],
        context: Option<ImageRenderContext>,
    ) -> Result<SessionId> {
        self.ensure_not_open(&image)?;
        let context = context
            .or_else(|| self.overlay.render_context())
            .ok_or(EditorError::NoImageContext)?;
        self.resolve_for_switch(&image)?;

        let id = SessionId(self.next_session_id);
        let session = EditSession::begin(id, image, objects, Some(context))?;
        self.next_session_id += 1;

        self.session = Some(session);
        self.capture = Some(InputCapture::acquire(id));
        self.draw_armed = false;
        Ok(id)
    }

    /// Enter edit mode with the object list stored for `image`.
    pub fn enter_edit_loaded(
        &mut self,
        image: ImageKey,
        context: Option<ImageRenderContext>,
    ) -> Result<SessionId> {
        self.ensure_not_open(&image)?;
        let objects = self.store.load(&image)?;
        self.enter_edit(image, &objects, context)
    }

    fn ensure_not_open(&self, image: &ImageKey) -> Result<()> {
        match &self.session {
            Some(session) if session.image() == image => Err(EditorError::SessionActive {
                image: image.to_string(),
            }),
            _ => Ok(()),
        }
    }

    fn resolve_for_switch(&mut self, next: &ImageKey) -> Result<()> {
        self.ensure_not_open(next)?;
        let Some(session) = self.session.as_mut() else {
            return Ok(());
        };
        if session.is_commit_in_flight() {
            return Err(EditorError::CommitInFlight {
                image: session.image().to_string(),
            });
        }

        log::warn!(
            "Switching to '{}' with session {} open for '{}', resolving by {:?}",
            next,
            session.id(),
            session.image(),
            self.switch_policy
        );
        session.cancel_interaction();
        if self.switch_policy == ResolvePolicy::Commit && session.is_modified() {
            let request = session.prepare_commit()?;
            // Synchronous even with background saves: the switch needs the outcome
            self.finish_direct(request).map(|_| ())
        } else {
            self.discard().map(|_| ())
        }
    }

    /// Leave edit mode: commit if anything changed, otherwise discard.
    ///
    /// An interaction in progress is cancelled first.
    pub fn exit_edit(&mut self) -> Result<ExitOutcome> {
        let session = self.session.as_mut().ok_or(EditorError::NoSession)?;
        session.cancel_interaction();
        if session.is_modified() {
            Ok(match self.commit()? {
                CommitStatus::Saved => ExitOutcome::Saved,
                CommitStatus::Pending => ExitOutcome::Pending,
            })
        } else {
            self.discard()?;
            Ok(ExitOutcome::Discarded)
        }
    }

    /// Save the working copy and end the session on success.
    ///
    /// Failure keeps the session and its working copy, emits
    /// [`EditorEvent::CommitFailed`] and returns the error.
    pub fn commit(&mut self) -> Result<CommitStatus> {
        let request = self.session_mut()?.prepare_commit()?;

        let worker = match &mut self.saves {
            SaveChannel::Direct => return self.finish_direct(request),
            SaveChannel::Background(worker) => worker,
        };
        let (session_id, image) = (request.session_id, request.image.clone());
        match worker.submit(request) {
            Ok(id) => {
                log::debug!("Commit for '{}' queued as save request {}", image, id);
                Ok(CommitStatus::Pending)
            }
            Err(e) => self
                .apply_commit_result(session_id, image, Vec::new(), Err(e))
                .map(|()| CommitStatus::Pending),
        }
    }

    fn finish_direct(&mut self, request: CommitRequest) -> Result<CommitStatus> {
        let result = self.store.save(&request.image, &request.objects);
        self.apply_commit_result(request.session_id, request.image, request.objects, result)?;
        Ok(CommitStatus::Saved)
    }

    /// Route a save outcome to the session it belongs to.
    fn apply_commit_result(
        &mut self,
        session_id: SessionId,
        image: ImageKey,
        objects: Vec<AnnotatedObject>,
        result: std::result::Result<(), PersistenceError>,
    ) -> Result<()> {
        let Some(session) = self.session.as_mut().filter(|s| s.id() == session_id) else {
            log::warn!(
                "Dropping stale save result for '{}' (session {} is gone): {}",
                image,
                session_id,
                match &result {
                    Ok(()) => "saved".to_string(),
                    Err(e) => e.reason(),
                }
            );
            return Ok(());
        };

        session.finish_commit(&result);
        match result {
            Ok(()) => {
                self.end_session();
                self.events.push(EditorEvent::CommitSucceeded { image, objects });
                Ok(())
            }
            Err(e) => {
                self.events.push(EditorEvent::CommitFailed {
                    image,
                    reason: e.reason(),
                });
                Err(e.into())
            }
        }
    }

    /// Apply finished background saves. Returns how many arrived.
    ///
    /// Results for sessions that have since been discarded are dropped.
    pub fn poll(&mut self) -> usize {
        let mut results = Vec::new();
        if let SaveChannel::Background(worker) = &mut self.saves {
            while let Some(result) = worker.take_one_result() {
                results.push(result);
            }
        }
        let count = results.len();
        for result in results {
            self.apply_save_result(result);
        }
        count
    }

    /// Block up to `timeout` for one background save result and apply it.
    pub fn wait_for_save(&mut self, timeout: Duration) -> bool {
        let result = match &mut self.saves {
            SaveChannel::Background(worker) => worker.wait_result(timeout),
            SaveChannel::Direct => None,
        };
        match result {
            Some(result) => {
                self.apply_save_result(result);
                true
            }
            None => false,
        }
    }

    fn apply_save_result(&mut self, result: SaveResult) {
        let SaveResult {
            session_id,
            image,
            objects,
            result,
            ..
        } = result;
        // Failures are already reported as events
        if let Err(e) = self.apply_commit_result(session_id, image, objects, result) {
            log::debug!("Background commit failed: {}", e);
        }
    }

    /// Drop the session without saving and return the untouched snapshot.
    ///
    /// Always allowed, even mid-interaction or with a commit in flight; a
    /// late commit result for this session is ignored.
    pub fn discard(&mut self) -> Result<Vec<AnnotatedObject>> {
        let session = self.session.take().ok_or(EditorError::NoSession)?;
        let original = session.discard();
        self.capture = None;
        self.draw_armed = false;
        Ok(original)
    }

    fn end_session(&mut self) {
        self.session = None;
        self.capture = None;
        self.draw_armed = false;
    }

    // Toolbar actions

    pub fn select_object(&mut self, index: Option<usize>) -> Result<()> {
        self.session_mut()?.select(index)
    }

    pub fn delete_selected(&mut self) -> Result<usize> {
        self.session_mut()?.delete_selected()
    }

    /// Arm the draw tool: the next pointer-down starts a new box.
    pub fn start_draw(&mut self) -> Result<()> {
        let session = self.session_mut()?;
        if !session.interaction().is_idle() {
            return Err(EditorError::InteractionActive { operation: "draw" });
        }
        if session.is_commit_in_flight() {
            return Err(EditorError::CommitInFlight {
                image: session.image().to_string(),
            });
        }
        self.draw_armed = true;
        log::debug!("Draw tool armed");
        Ok(())
    }

    /// Abandon the current interaction; returns whether one was active.
    pub fn cancel_interaction(&mut self) -> Result<bool> {
        self.draw_armed = false;
        Ok(self.session_mut()?.cancel_interaction())
    }

    pub fn set_label(&mut self, index: usize, name: &str, value: Option<String>) -> Result<()> {
        self.session_mut()?.set_label(index, name, value)
    }

    fn session_mut(&mut self) -> Result<&mut EditSession> {
        self.session.as_mut().ok_or(EditorError::NoSession)
    }

    // Pointer input, in container coordinates

    fn captured_session(&mut self) -> Option<&mut EditSession> {
        self.capture.as_ref()?;
        self.session.as_mut()
    }

    pub fn pointer_down(&mut self, x: f64, y: f64) -> Result<PointerAction> {
        let radius = self.handle_hit_radius_px;
        let draw = std::mem::take(&mut self.draw_armed);
        let Some(session) = self.captured_session() else {
            return Ok(PointerAction::Ignored);
        };
        let rendered = session.context().rendered_box;
        if !rendered.is_visible() {
            return Ok(PointerAction::Ignored);
        }
        let point = rendered_to_percent(x, y, &rendered);

        if draw {
            session.begin_draw(point)?;
            return Ok(PointerAction::Drawing);
        }

        if let Some(index) = session.selected_index() {
            if let Some(rect) = session.display_rect(index) {
                if let Some(handle) = nearest_handle(&rect, &rendered, x, y, radius) {
                    session.begin_resize(index, handle, point)?;
                    return Ok(PointerAction::Resizing { index, handle });
                }
                if rect.contains(point) {
                    session.begin_move(index, point)?;
                    return Ok(PointerAction::Moving { index });
                }
            }
        }

        match session.hit_test(point) {
            Some(index) => {
                session.select(Some(index))?;
                session.begin_move(index, point)?;
                Ok(PointerAction::Moving { index })
            }
            None => {
                session.select(None)?;
                Ok(PointerAction::Deselected)
            }
        }
    }

    /// Returns the rectangle to paint while an interaction is active.
    pub fn pointer_move(&mut self, x: f64, y: f64) -> Result<Option<PercentRect>> {
        let Some(session) = self.captured_session() else {
            return Ok(None);
        };
        if session.interaction().is_idle() {
            return Ok(None);
        }
        let point = rendered_to_percent(x, y, &session.context().rendered_box);
        session.update_interaction(point).map(Some)
    }

    pub fn pointer_up(&mut self, x: f64, y: f64) -> Result<Option<InteractionOutcome>> {
        let Some(session) = self.captured_session() else {
            return Ok(None);
        };
        if session.interaction().is_idle() {
            return Ok(None);
        }
        let point = rendered_to_percent(x, y, &session.context().rendered_box);
        let outcome = session.end_interaction(point)?;
        if let InteractionOutcome::TooSmall { width, height } = outcome {
            self.events.push(EditorEvent::TooSmallDraw { width, height });
        }
        Ok(Some(outcome))
    }

    // Observable state

    pub fn session(&self) -> Option<&EditSession> {
        self.session.as_ref()
    }

    pub fn is_editing(&self) -> bool {
        self.session.is_some()
    }

    /// Objects to paint; empty outside edit mode.
    pub fn working_objects(&self) -> &[WorkingObject] {
        self.session
            .as_ref()
            .map(|s| s.working_objects())
            .unwrap_or_default()
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.session.as_ref().and_then(|s| s.selected_index())
    }

    pub fn input_capture(&self) -> Option<&InputCapture> {
        self.capture.as_ref()
    }

    pub fn is_draw_armed(&self) -> bool {
        self.draw_armed
    }

    /// Navigation to another image is blocked while a commit is in flight.
    pub fn can_navigate(&self) -> bool {
        !self
            .session
            .as_ref()
            .is_some_and(|s| s.is_commit_in_flight())
    }

    pub fn take_events(&mut self) -> Vec<EditorEvent> {
        std::mem::take(&mut self.events)
    }
}

/// Closest handle of `rect` within `radius` display pixels of the pointer.
fn nearest_handle(
    rect: &PercentRect,
    rendered: &RenderedBox,
    x: f64,
    y: f64,
    radius: f64,
) -> Option<ResizeHandle> {
    ResizeHandle::ALL
        .iter()
        .map(|&handle| {
            let anchor: PercentPoint = handle.anchor(rect);
            let placed = percent_to_rendered(&PercentRect::new(anchor.x, anchor.y, 0.0, 0.0), rendered);
            (handle, (placed.x - x).hypot(placed.y - y))
        })
        .filter(|&(_, distance)| distance <= radius)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(handle, _)| handle)
}
