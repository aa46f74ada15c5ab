//! Edit-session state machine.
//!
//! States: no session (owned by the controller as `None`), `Editing`
//! (session live, interaction idle) and `Interacting` (move, resize or draw
//! in progress).

mod edit_session;
mod interaction;

pub use edit_session::{
    CommitRequest, EditSession, InteractionOutcome, SessionId, SessionState,
};
pub use interaction::{
    Interaction, ResizeHandle, drawn_rect, meets_min_size, moved_rect, resized_rect,
};
