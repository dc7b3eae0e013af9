//! Interactive polygon creation: the per-polygon session state machine, the
//! input-driven manager around it, and the collaborator interfaces the
//! manager is wired to.

mod interfaces;
mod manager;
mod session;

pub use interfaces::{
    CreationAction, CursorGlyph, FrameTask, HistorySink, InputChord, InputRegistry, ModeState,
    PickingQuery, ScreenProjection, SelectionSink, StatusText,
};
pub use manager::{ManagerState, PolygonCreationManager};
pub use session::{CreationSession, NewVertex};

use crate::topology::DEFAULT_MERGE_TOLERANCE;

/// Settings for polygon creation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CreationSettings {
    /// Color of not-yet-committed freestanding vertices.
    pub pending_vertex_color: [f32; 4],
    /// Color of the preview segment that will become the next diagonal.
    pub pivot_edge_color: [f32; 4],
    /// Color of the other preview segment.
    pub other_edge_color: [f32; 4],
    /// Distance under which two positions resolve to the same merged vertex.
    pub merge_tolerance: f64,
}

impl Default for CreationSettings {
    fn default() -> Self {
        Self {
            pending_vertex_color: [1.0, 1.0, 0.0, 1.0],
            pivot_edge_color: [0.5, 0.5, 0.5, 1.0],
            other_edge_color: [1.0, 1.0, 0.0, 1.0],
            merge_tolerance: DEFAULT_MERGE_TOLERANCE,
        }
    }
}
