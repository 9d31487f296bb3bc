//! Crop interaction model: handle hit-testing and drag updates.

pub mod drag;

pub use drag::{apply_drag, DragController, DragSession, DragState};
pub use hit_test::{resolve_interaction, CursorHint, InteractionMode};
