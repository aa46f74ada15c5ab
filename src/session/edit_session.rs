//! The edit session: snapshot, working copy, selection and interaction.
//!
//! A session is created on entering edit mode and consumed on commit or
//! discard. All pointer math runs against the percent-space working copy;
//! the snapshot is never touched so a discard restores it exactly.

use std::fmt;

use web_time::Instant;

use super::interaction::{Interaction, ResizeHandle, meets_min_size};
use crate::constants::MIN_BOX_SIZE_PERCENT;
use crate::error::{EditorError, Result};
use crate::geometry::{percent_to_pixels, pixels_to_percent};
use crate::model::{
    AnnotatedObject, ImageRenderContext, PercentPoint, PercentRect, WorkingObject,
};
use crate::persist::{ImageKey, PersistenceError};

/// Identifier of one edit session, used to match late commit results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Coarse state of a live session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Session active, no interaction in progress
    Editing,
    /// A move, resize or draw is in progress
    Interacting,
}

/// Result of finishing a pointer interaction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InteractionOutcome {
    /// A move or resize was written back to this object
    Updated { index: usize },
    /// A drawn box was appended and selected
    Created { index: usize },
    /// The drawn box was under the minimum size and dropped
    TooSmall { width: f64, height: f64 },
}

/// Everything the persistence layer needs to save a session.
#[derive(Debug, Clone, PartialEq)]
pub struct CommitRequest {
    /// Session the request belongs to
    pub session_id: SessionId,
    /// Image the objects belong to
    pub image: ImageKey,
    /// Rounded pixel-space objects, in working order
    pub objects: Vec<AnnotatedObject>,
}

/// Working state of one image while in edit mode.
#[derive(Debug)]
pub struct EditSession {
    id: SessionId,
    image: ImageKey,
    context: ImageRenderContext,
    original: Vec<AnnotatedObject>,
    working: Vec<WorkingObject>,
    selected: Option<usize>,
    interaction: Interaction,
    modified: bool,
    /// Set while a commit is outstanding
    commit_started: Option<Instant>,
}

impl EditSession {
    /// Start a session from the stored objects of an image.
    ///
    /// Fails with `NoImageContext` when render metadata is missing and with
    /// `InvalidDimensions` when the image has no area.
    pub fn begin(
        id: SessionId,
        image: ImageKey,
        existing: &[AnnotatedObject],
        context: Option<ImageRenderContext>,
    ) -> Result<Self> {
        let context = context.ok_or(EditorError::NoImageContext)?;
        let (w, h) = context.natural_size();

        let working = existing
            .iter()
            .map(|obj| {
                Ok(WorkingObject {
                    rect_percent: pixels_to_percent(&obj.rect, w, h)?,
                    rect_pixels: obj.rect,
                    labels: obj.labels.clone(),
                    direction: obj.direction,
                    extras: obj.extras.clone(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        log::info!(
            "Edit session {} started for '{}' with {} objects",
            id,
            image,
            working.len()
        );

        Ok(Self {
            id,
            image,
            context,
            original: existing.to_vec(),
            working,
            selected: None,
            interaction: Interaction::Idle,
            modified: false,
            commit_started: None,
        })
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn image(&self) -> &ImageKey {
        &self.image
    }

    pub fn context(&self) -> &ImageRenderContext {
        &self.context
    }

    /// Objects as they were when the session started.
    pub fn original_objects(&self) -> &[AnnotatedObject] {
        &self.original
    }

    /// The working copy, the only list displayed while editing.
    pub fn working_objects(&self) -> &[WorkingObject] {
        &self.working
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    pub fn interaction(&self) -> &Interaction {
        &self.interaction
    }

    pub fn state(&self) -> SessionState {
        if self.interaction.is_idle() {
            SessionState::Editing
        } else {
            SessionState::Interacting
        }
    }

    /// Whether the working copy has been changed since the session started.
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn is_commit_in_flight(&self) -> bool {
        self.commit_started.is_some()
    }

    /// Rectangle to paint for object `index`, including a live move/resize.
    pub fn display_rect(&self, index: usize) -> Option<PercentRect> {
        let obj = self.working.get(index)?;
        if self.selected == Some(index) {
            if let Interaction::Moving { current, .. } | Interaction::Resizing { current, .. } =
                &self.interaction
            {
                return Some(*current);
            }
        }
        Some(obj.rect_percent)
    }

    /// Rubber band of a draw in progress.
    pub fn draw_preview(&self) -> Option<PercentRect> {
        match &self.interaction {
            Interaction::Drawing { .. } => self.interaction.preview(),
            _ => None,
        }
    }

    /// Top-most object (last in list order) containing the point.
    pub fn hit_test(&self, point: PercentPoint) -> Option<usize> {
        self.working
            .iter()
            .rposition(|obj| obj.rect_percent.contains(point))
    }

    /// Update the rendered box after a layout change.
    ///
    /// The natural size of an image cannot change mid-session.
    pub fn update_context(&mut self, context: ImageRenderContext) {
        if context.natural_width != self.context.natural_width
            || context.natural_height != self.context.natural_height
        {
            log::warn!(
                "Ignoring render context {}x{} for session {} ({}x{})",
                context.natural_width,
                context.natural_height,
                self.id,
                self.context.natural_width,
                self.context.natural_height
            );
            return;
        }
        self.context = context;
    }

    fn require_idle(&self, operation: &'static str) -> Result<()> {
        if self.interaction.is_idle() {
            Ok(())
        } else {
            Err(EditorError::InteractionActive { operation })
        }
    }

    fn require_no_commit(&self) -> Result<()> {
        if self.is_commit_in_flight() {
            Err(EditorError::CommitInFlight {
                image: self.image.to_string(),
            })
        } else {
            Ok(())
        }
    }

    fn require_index(&self, index: usize) -> Result<()> {
        if index < self.working.len() {
            Ok(())
        } else {
            Err(EditorError::index_out_of_range(index, self.working.len()))
        }
    }

    fn require_selected(&self, index: usize) -> Result<()> {
        self.require_index(index)?;
        if self.selected == Some(index) {
            Ok(())
        } else {
            Err(EditorError::SelectionMismatch {
                requested: index,
                selected: self.selected,
            })
        }
    }

    /// Select an object, or deselect with `None`.
    pub fn select(&mut self, index: Option<usize>) -> Result<()> {
        self.require_idle("select")?;
        if let Some(index) = index {
            self.require_index(index)?;
        }
        if self.selected != index {
            log::debug!("Session {}: selection {:?} -> {:?}", self.id, self.selected, index);
            self.selected = index;
        }
        Ok(())
    }

    /// Start translating the selected object.
    pub fn begin_move(&mut self, index: usize, pointer: PercentPoint) -> Result<()> {
        self.require_idle("move")?;
        self.require_no_commit()?;
        self.require_selected(index)?;
        let start_rect = self.working[index].rect_percent;
        self.interaction = Interaction::Moving {
            start_pointer: pointer,
            start_rect,
            current: start_rect,
        };
        log::debug!("Session {}: move object {}", self.id, index);
        Ok(())
    }

    /// Start dragging one handle of the selected object.
    pub fn begin_resize(
        &mut self,
        index: usize,
        handle: ResizeHandle,
        pointer: PercentPoint,
    ) -> Result<()> {
        self.require_idle("resize")?;
        self.require_no_commit()?;
        self.require_selected(index)?;
        let start_rect = self.working[index].rect_percent;
        self.interaction = Interaction::Resizing {
            handle,
            start_pointer: pointer,
            start_rect,
            current: start_rect,
        };
        log::debug!(
            "Session {}: resize object {} via '{}'",
            self.id,
            index,
            handle.name()
        );
        Ok(())
    }

    /// Start drawing a new box at the pointer.
    pub fn begin_draw(&mut self, pointer: PercentPoint) -> Result<()> {
        self.require_idle("draw")?;
        self.require_no_commit()?;
        let start = PercentPoint::new(pointer.x.clamp(0.0, 100.0), pointer.y.clamp(0.0, 100.0));
        self.interaction = Interaction::Drawing {
            start_pointer: start,
            current_pointer: start,
        };
        log::debug!("Session {}: draw from ({:.2}, {:.2})", self.id, start.x, start.y);
        Ok(())
    }

    /// Feed a pointer move; returns the rectangle to paint.
    ///
    /// Pure geometry: safe to call on every pointer-move event.
    pub fn update_interaction(&mut self, pointer: PercentPoint) -> Result<PercentRect> {
        if self.interaction.is_idle() {
            return Err(EditorError::NotInteracting);
        }
        self.interaction.update(pointer);
        let preview = self.interaction.preview().ok_or(EditorError::NotInteracting)?;
        log::trace!("Session {}: {} -> {:?}", self.id, self.interaction.name(), preview);
        Ok(preview)
    }

    /// Finish the interaction at the pointer and write the result back.
    pub fn end_interaction(&mut self, pointer: PercentPoint) -> Result<InteractionOutcome> {
        self.update_interaction(pointer)?;
        let interaction = std::mem::take(&mut self.interaction);

        match &interaction {
            Interaction::Idle => Err(EditorError::NotInteracting),
            Interaction::Moving { current, .. } | Interaction::Resizing { current, .. } => {
                let current = *current;
                let index = self.selected.ok_or(EditorError::NothingSelected)?;
                self.set_rect(index, current)?;
                log::debug!("Session {}: object {} now {:?}", self.id, index, current);
                Ok(InteractionOutcome::Updated { index })
            }
            Interaction::Drawing { .. } => {
                let rect = interaction.preview().ok_or(EditorError::NotInteracting)?;
                if !meets_min_size(&rect) {
                    log::debug!(
                        "Session {}: drawn box {:.2}x{:.2}% under {}%, dropped",
                        self.id,
                        rect.width,
                        rect.height,
                        MIN_BOX_SIZE_PERCENT
                    );
                    return Ok(InteractionOutcome::TooSmall {
                        width: rect.width,
                        height: rect.height,
                    });
                }
                let (w, h) = self.context.natural_size();
                let pixels = percent_to_pixels(&rect, w, h)?;
                self.working.push(WorkingObject::drawn(rect, pixels));
                let index = self.working.len() - 1;
                self.selected = Some(index);
                self.modified = true;
                log::info!("Session {}: created object {} at {:?}", self.id, index, rect);
                Ok(InteractionOutcome::Created { index })
            }
        }
    }

    /// Abandon the interaction; the working copy is left as it was.
    ///
    /// Returns whether an interaction was active.
    pub fn cancel_interaction(&mut self) -> bool {
        if self.interaction.is_idle() {
            return false;
        }
        log::debug!("Session {}: {} cancelled", self.id, self.interaction.name());
        self.interaction = Interaction::Idle;
        true
    }

    fn set_rect(&mut self, index: usize, rect: PercentRect) -> Result<()> {
        let (w, h) = self.context.natural_size();
        let pixels = percent_to_pixels(&rect, w, h)?;
        let len = self.working.len();
        let obj = self
            .working
            .get_mut(index)
            .ok_or_else(|| EditorError::index_out_of_range(index, len))?;
        if obj.rect_percent != rect {
            obj.rect_percent = rect;
            obj.rect_pixels = pixels;
            self.modified = true;
        }
        Ok(())
    }

    /// Remove the selected object. Later indices shift down by one.
    ///
    /// Returns the removed index.
    pub fn delete_selected(&mut self) -> Result<usize> {
        self.require_idle("delete")?;
        self.require_no_commit()?;
        let index = self.selected.ok_or(EditorError::NothingSelected)?;
        self.working.remove(index);
        self.selected = None;
        self.modified = true;
        log::info!(
            "Session {}: deleted object {} ({} left)",
            self.id,
            index,
            self.working.len()
        );
        Ok(index)
    }

    /// Set or clear one label of a working object.
    pub fn set_label(&mut self, index: usize, name: &str, value: Option<String>) -> Result<()> {
        self.require_idle("edit labels")?;
        self.require_no_commit()?;
        self.require_index(index)?;
        let obj = &mut self.working[index];
        let old = obj.labels.get(name).cloned().flatten();
        obj.set_label(name, value);
        let new = obj.labels.get(name).cloned().flatten();
        if old != new {
            log::info!(
                "Session {}: [{}].{}: {:?} -> {:?}",
                self.id,
                index,
                name,
                old,
                new
            );
            self.modified = true;
        }
        Ok(())
    }

    /// Working copy converted to rounded pixel space, clamped to the image.
    pub fn to_pixel_objects(&self) -> Result<Vec<AnnotatedObject>> {
        let (w, h) = self.context.natural_size();
        self.working
            .iter()
            .map(|obj| {
                let rect = percent_to_pixels(&obj.rect_percent, w, h)?
                    .rounded()
                    .clamped_to(w, h);
                Ok(obj.to_annotated(rect))
            })
            .collect()
    }

    /// Freeze the working copy for saving and mark the commit in flight.
    ///
    /// Only valid with no interaction active and no other commit pending.
    pub fn prepare_commit(&mut self) -> Result<CommitRequest> {
        self.require_idle("commit")?;
        self.require_no_commit()?;
        let objects = self.to_pixel_objects()?;
        self.commit_started = Some(Instant::now());
        log::debug!(
            "Session {}: commit of {} objects for '{}' started",
            self.id,
            objects.len(),
            self.image
        );
        Ok(CommitRequest {
            session_id: self.id,
            image: self.image.clone(),
            objects,
        })
    }

    /// Record the outcome of the outstanding commit.
    ///
    /// On failure the working copy is untouched so the user can retry or
    /// discard.
    pub fn finish_commit(&mut self, result: &std::result::Result<(), PersistenceError>) {
        let elapsed = self.commit_started.take().map(|t| t.elapsed());
        match result {
            Ok(()) => log::info!(
                "Session {}: committed '{}' in {:?}",
                self.id,
                self.image,
                elapsed.unwrap_or_default()
            ),
            Err(e) => log::warn!(
                "Session {}: commit for '{}' failed, session kept: {}",
                self.id,
                self.image,
                e
            ),
        }
    }

    /// End the session without saving, returning the untouched snapshot.
    pub fn discard(self) -> Vec<AnnotatedObject> {
        log::info!(
            "Edit session {} for '{}' discarded ({} interaction abandoned)",
            self.id,
            self.image,
            self.interaction.name()
        );
        self.original
    }
}
