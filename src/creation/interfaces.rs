use crate::math::{Plane, Point2, Point3};
use crate::mesh::{ChangeSet, MeshId, SubobjectBatch};
use crate::picking::PickingColor;

/// Input-mode states the manager moves between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModeState {
    Navigation,
    Selection,
    /// Creation mode is on but no polygon is being drawn.
    CreationMode,
    /// A polygon is being drawn.
    Creating,
}

/// Actions the manager binds to input chords and handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CreationAction {
    Navigate,
    ExitCreationMode,
    StartCreation,
    AddVertex,
    RemoveVertex,
    SwitchStartVertex,
    FlipNormal,
    CancelCreation,
}

impl CreationAction {
    /// Human-readable name shown in key-binding listings.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Navigate => "create poly -> navigate",
            Self::ExitCreationMode => "exit poly creation mode",
            Self::StartCreation => "start poly creation",
            Self::AddVertex => "add poly vertex",
            Self::RemoveVertex => "remove poly vertex",
            Self::SwitchStartVertex => "switch poly start vertex",
            Self::FlipNormal => "flip poly normal",
            Self::CancelCreation => "cancel poly creation",
        }
    }
}

/// Keys and mouse buttons the manager binds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputChord {
    Space,
    Escape,
    Backspace,
    Shift,
    Control,
    LeftMouse,
    RightMouseUp,
}

/// Per-frame tasks the manager schedules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameTask {
    /// Tracks whether an existing vertex is under the cursor.
    CheckVertexUnderMouse,
    /// Feeds the live cursor point to the active session.
    UpdatePolygon,
}

impl FrameTask {
    /// Name the task is registered under.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::CheckVertexUnderMouse => "check_vertex_under_mouse",
            Self::UpdatePolygon => "update_polygon",
        }
    }

    /// Order within a frame; lower runs first.
    #[must_use]
    pub fn sort(self) -> i32 {
        match self {
            Self::CheckVertexUnderMouse => 3,
            Self::UpdatePolygon => 4,
        }
    }
}

/// Mouse cursor shown by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorGlyph {
    #[default]
    Main,
    Create,
    Select,
}

/// Status bar message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusText {
    pub mode: &'static str,
    pub info: &'static str,
}

impl StatusText {
    /// Creation mode is on, nothing drawn yet.
    pub const CREATE_POLY: Self = Self {
        mode: "Create polygon",
        info: "LMB to create first vertex; RMB to cancel",
    };

    /// A polygon is being drawn.
    pub const START_POLY_CREATION: Self = Self {
        mode: "Create polygon",
        info: "LMB to add vertex; <Backspace> to undo; \
               click a previously added vertex to finalize; \
               <Ctrl> to flip normal; <Shift> to turn diagonal; RMB to cancel",
    };
}

/// Input and mode registry of the host application.
///
/// Bound actions are dispatched back through
/// [`super::PolygonCreationManager::handle`]; tasks through
/// [`super::PolygonCreationManager::run_task`].
pub trait InputRegistry {
    fn bind(&mut self, state: ModeState, action: CreationAction, chord: InputChord);
    fn enter_state(&mut self, state: ModeState);
    fn exit_state(&mut self, state: ModeState);
    fn add_task(&mut self, task: FrameTask);
    fn remove_task(&mut self, task: FrameTask);
}

/// Maps the cursor into the world.
pub trait ScreenProjection {
    /// Cursor position in normalized screen coordinates, `None` when the
    /// cursor is outside the viewport.
    fn cursor_position(&self) -> Option<Point2>;

    /// World-space near and far points of the view ray through `screen`.
    fn ray_extrude(&self, screen: Point2) -> Option<(Point3, Point3)>;

    /// The active construction grid in world space.
    fn grid_plane(&self) -> Plane;

    /// Point on the grid under `screen`, `None` if the view ray misses it.
    fn point_on_grid(&self, screen: Point2) -> Option<Point3> {
        let (near, far) = self.ray_extrude(screen)?;
        self.grid_plane().intersect_ray(&near, &far)
    }
}

/// Read-back of the picking pass.
pub trait PickingQuery {
    /// Color of the picking-buffer pixel under the cursor.
    fn pixel_under_cursor(&self) -> PickingColor;
}

/// Undo history.
pub trait HistorySink {
    fn record_change(&mut self, description: &str, mesh: MeshId, change: &ChangeSet);
}

/// Selection notifications to the host.
pub trait SelectionSink {
    fn set_selected(&mut self, mesh: MeshId, batch: &SubobjectBatch, selected: bool, notify: bool);
}
