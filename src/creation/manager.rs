use crate::error::{CreationError, PolyeditError, Result};
use crate::math::Point3;
use crate::mesh::{MeshId, PickingLevel};
use crate::picking::{PickableType, PickingColor};
use crate::scene::Scene;
use crate::topology::MergedVertexId;

use super::interfaces::{
    CreationAction, CursorGlyph, FrameTask, HistorySink, InputChord, InputRegistry, ModeState,
    PickingQuery, ScreenProjection, SelectionSink, StatusText,
};
use super::session::{CreationSession, NewVertex};

/// Where the manager is in the creation workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ManagerState {
    /// Creation mode is off.
    #[default]
    Inactive,
    /// Creation mode is on, waiting for the first click.
    Idle,
    /// A polygon is being drawn.
    Active,
}

/// What the picking pixel under the cursor shows.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Hover {
    Nothing,
    /// A vertex of the polygon being drawn; it has no mesh vertex yet.
    Pending,
    Vertex(MeshId, MergedVertexId),
    /// Something that cannot be clicked in this mode.
    Other,
}

struct ActiveCreation {
    mesh: MeshId,
    session: CreationSession,
    /// Existing vertices clicked so far, `None` for grid clicks.
    picked: Vec<Option<(MeshId, MergedVertexId)>>,
}

/// Binds input to polygon creation and drives a [`CreationSession`].
///
/// Only one polygon is drawn at a time; it belongs to the mesh its first
/// vertex was picked on, or to the first editable mesh for a grid click.
pub struct PolygonCreationManager {
    input: Box<dyn InputRegistry>,
    projection: Box<dyn ScreenProjection>,
    picking: Box<dyn PickingQuery>,
    history: Box<dyn HistorySink>,
    selection: Box<dyn SelectionSink>,
    meshes: Vec<MeshId>,
    active: Option<ActiveCreation>,
    pixel_under_mouse: PickingColor,
    vertex_under_mouse: bool,
    cursor: CursorGlyph,
    status: Option<StatusText>,
    mode_on: bool,
}

impl PolygonCreationManager {
    /// Creates a manager wired to the host collaborators; call [`Self::setup`] next.
    #[must_use]
    pub fn new(
        input: Box<dyn InputRegistry>,
        projection: Box<dyn ScreenProjection>,
        picking: Box<dyn PickingQuery>,
        history: Box<dyn HistorySink>,
        selection: Box<dyn SelectionSink>,
    ) -> Self {
        Self {
            input,
            projection,
            picking,
            history,
            selection,
            meshes: Vec::new(),
            active: None,
            pixel_under_mouse: PickingColor::NONE,
            vertex_under_mouse: false,
            cursor: CursorGlyph::Main,
            status: None,
            mode_on: false,
        }
    }

    /// Registers the creation-mode key bindings.
    pub fn setup(&mut self) {
        use CreationAction as A;
        use InputChord as K;
        use ModeState as S;

        let bindings = [
            (S::CreationMode, A::Navigate, K::Space),
            (S::CreationMode, A::ExitCreationMode, K::Escape),
            (S::CreationMode, A::ExitCreationMode, K::RightMouseUp),
            (S::CreationMode, A::StartCreation, K::LeftMouse),
            (S::Creating, A::AddVertex, K::LeftMouse),
            (S::Creating, A::RemoveVertex, K::Backspace),
            (S::Creating, A::SwitchStartVertex, K::Shift),
            (S::Creating, A::FlipNormal, K::Control),
            (S::Creating, A::CancelCreation, K::Escape),
            (S::Creating, A::CancelCreation, K::RightMouseUp),
        ];
        for (state, action, chord) in bindings {
            self.input.bind(state, action, chord);
        }
    }

    /// Where the manager is in the creation workflow.
    #[must_use]
    pub fn state(&self) -> ManagerState {
        if self.active.is_some() {
            ManagerState::Active
        } else if self.mode_on {
            ManagerState::Idle
        } else {
            ManagerState::Inactive
        }
    }

    /// Cursor glyph the host should show.
    #[must_use]
    pub fn cursor(&self) -> CursorGlyph {
        self.cursor
    }

    /// Status bar message, `None` outside creation mode.
    #[must_use]
    pub fn status(&self) -> Option<StatusText> {
        self.status
    }

    /// The polygon being drawn, if any.
    #[must_use]
    pub fn session(&self) -> Option<&CreationSession> {
        self.active.as_ref().map(|a| &a.session)
    }

    /// Mesh the polygon being drawn belongs to.
    #[must_use]
    pub fn active_mesh(&self) -> Option<MeshId> {
        self.active.as_ref().map(|a| a.mesh)
    }

    /// Meshes creation mode was entered for.
    #[must_use]
    pub fn editable_meshes(&self) -> &[MeshId] {
        &self.meshes
    }

    /// Turns creation mode on for `editable` meshes, making their vertices
    /// pickable. Re-entering (e.g. back from navigation) only restores the
    /// status text.
    ///
    /// # Errors
    ///
    /// Returns an error if one of the meshes does not exist.
    pub fn enter_creation_mode(&mut self, scene: &mut Scene, editable: &[MeshId]) -> Result<()> {
        if !self.mode_on {
            for &id in editable {
                scene.mesh_mut(id)?.set_picking_level(PickingLevel::Vertex);
            }
            self.meshes = editable.to_vec();
            self.mode_on = true;
            self.set_cursor(CursorGlyph::Create);
            self.input.add_task(FrameTask::CheckVertexUnderMouse);
            self.input.enter_state(ModeState::CreationMode);
            tracing::info!(meshes = self.meshes.len(), "entered polygon creation mode");
        }
        self.status = Some(if self.active.is_some() {
            StatusText::START_POLY_CREATION
        } else {
            StatusText::CREATE_POLY
        });
        Ok(())
    }

    /// Turns creation mode off, cancelling any polygon in progress.
    pub fn exit_creation_mode(&mut self, scene: &mut Scene) {
        if !self.mode_on {
            return;
        }
        if let Some(active) = self.end_session() {
            active.session.cancel();
        }
        for id in self.meshes.drain(..) {
            // The mesh may have been removed meanwhile.
            if let Ok(mesh) = scene.mesh_mut(id) {
                mesh.set_picking_level(PickingLevel::Polygon);
            }
        }
        self.mode_on = false;
        self.vertex_under_mouse = false;
        self.pixel_under_mouse = PickingColor::NONE;
        self.status = None;
        self.set_cursor(CursorGlyph::Main);
        self.input.remove_task(FrameTask::CheckVertexUnderMouse);
        self.input.exit_state(ModeState::CreationMode);
        tracing::info!("left polygon creation mode");
    }

    /// Handles a bound action.
    ///
    /// Invalid or unprojectable input is skipped silently.
    ///
    /// # Errors
    ///
    /// Returns an error only for broken state, such as a mesh that
    /// disappeared while a polygon was being drawn on it.
    pub fn handle(&mut self, action: CreationAction, scene: &mut Scene) -> Result<()> {
        let result = match action {
            CreationAction::Navigate => {
                self.input.enter_state(ModeState::Navigation);
                Ok(())
            }
            CreationAction::ExitCreationMode => {
                self.exit_creation_mode(scene);
                Ok(())
            }
            CreationAction::StartCreation => self.start(scene),
            CreationAction::AddVertex => self.add(scene),
            CreationAction::RemoveVertex => self.remove(),
            CreationAction::SwitchStartVertex => self
                .active_mut()
                .map(|active| active.session.switch_start_vertex())
                .map_err(Into::into),
            CreationAction::FlipNormal => self
                .active_mut()
                .map(|active| active.session.flip_normal())
                .map_err(Into::into),
            CreationAction::CancelCreation => self.cancel(),
        };
        skip_recoverable(result, action.name())
    }

    /// Runs one frame of a scheduled task.
    ///
    /// # Errors
    ///
    /// Same as [`PolygonCreationManager::handle`].
    pub fn run_task(&mut self, task: FrameTask, scene: &mut Scene) -> Result<()> {
        let result = match task {
            FrameTask::CheckVertexUnderMouse => {
                self.check_vertex_under_mouse();
                Ok(())
            }
            FrameTask::UpdatePolygon => self.update_polygon(scene),
        };
        skip_recoverable(result, task.name())
    }

    fn check_vertex_under_mouse(&mut self) {
        self.pixel_under_mouse = self.picking.pixel_under_cursor();
        let under = self.pixel_under_mouse.is_set();

        if under != self.vertex_under_mouse {
            self.vertex_under_mouse = under;
            self.set_cursor(if under {
                CursorGlyph::Select
            } else {
                CursorGlyph::Create
            });
        }
    }

    fn set_cursor(&mut self, glyph: CursorGlyph) {
        if self.cursor != glyph {
            tracing::trace!(?glyph, "cursor changed");
            self.cursor = glyph;
        }
    }

    fn hover(&self, scene: &Scene) -> Hover {
        if !self.vertex_under_mouse {
            return Hover::Nothing;
        }
        match self.pixel_under_mouse.decode() {
            None => Hover::Pending,
            Some((PickableType::Vertex, id)) => {
                let found = scene.vertex_by_picking_id(id).and_then(|(mesh_id, v)| {
                    let mesh = scene.mesh(mesh_id).ok()?;
                    let merged = mesh.topology().merged_vertex_of(v)?;
                    Some(Hover::Vertex(mesh_id, merged))
                });
                found.unwrap_or_else(|| {
                    tracing::warn!(id, "picking color names no vertex");
                    Hover::Other
                })
            }
            Some((kind, id)) => {
                tracing::warn!(?kind, id, "picked a sub-object that is not a vertex");
                Hover::Other
            }
        }
    }

    fn grid_point(&self) -> std::result::Result<Point3, CreationError> {
        self.projection
            .cursor_position()
            .and_then(|screen| self.projection.point_on_grid(screen))
            .ok_or(CreationError::NoProjection)
    }

    fn active_mut(&mut self) -> std::result::Result<&mut ActiveCreation, CreationError> {
        self.active.as_mut().ok_or(CreationError::NoActiveSession)
    }

    fn start(&mut self, scene: &mut Scene) -> Result<()> {
        if !self.mode_on || self.active.is_some() {
            return Ok(());
        }

        let (mesh_id, first, picked) = match self.hover(scene) {
            Hover::Vertex(mesh_id, merged) => {
                if !self.meshes.contains(&mesh_id) {
                    return Ok(());
                }
                (
                    mesh_id,
                    NewVertex::Existing(merged),
                    Some((mesh_id, merged)),
                )
            }
            Hover::Nothing => {
                let point = self.grid_point()?;
                let Some(&mesh_id) = self.meshes.first() else {
                    return Ok(());
                };
                (mesh_id, NewVertex::Grid(point), None)
            }
            Hover::Pending | Hover::Other => return Ok(()),
        };

        let session = CreationSession::start(scene.mesh(mesh_id)?, first, *scene.settings())?;
        self.active = Some(ActiveCreation {
            mesh: mesh_id,
            session,
            picked: vec![picked],
        });

        self.status = Some(StatusText::START_POLY_CREATION);
        self.input.enter_state(ModeState::Creating);
        self.input.add_task(FrameTask::UpdatePolygon);
        Ok(())
    }

    fn add(&mut self, scene: &mut Scene) -> Result<()> {
        let Some(active) = &self.active else {
            return Err(CreationError::NoActiveSession.into());
        };
        let active_mesh = active.mesh;

        let (vertex, picked) = match self.hover(scene) {
            // Clicking a vertex of this polygon closes it.
            Hover::Pending => return self.finalize(scene),
            Hover::Vertex(mesh_id, merged) => {
                if active.picked.contains(&Some((mesh_id, merged))) {
                    return self.finalize(scene);
                }
                let vertex = if mesh_id == active_mesh {
                    NewVertex::Existing(merged)
                } else {
                    let mesh = scene.mesh(mesh_id)?;
                    NewVertex::Foreign(mesh.to_world(&mesh.merged_vertex_point(merged)?))
                };
                (vertex, Some((mesh_id, merged)))
            }
            Hover::Nothing => (NewVertex::Grid(self.grid_point()?), None),
            Hover::Other => return Ok(()),
        };

        let mesh = scene.mesh(active_mesh)?;
        let active = self.active_mut()?;
        active.session.add_vertex(mesh, vertex)?;
        active.picked.push(picked);
        Ok(())
    }

    fn remove(&mut self) -> Result<()> {
        let active = self.active_mut()?;
        match active.session.remove_last_vertex() {
            Ok(()) => {
                active.picked.pop();
                Ok(())
            }
            Err(CreationError::NoVerticesRemain) => self.cancel(),
            Err(err) => Err(err.into()),
        }
    }

    fn finalize(&mut self, scene: &mut Scene) -> Result<()> {
        let active = self
            .active
            .as_mut()
            .ok_or(CreationError::NoActiveSession)?;
        let mesh_id = active.mesh;
        let (mesh, picking) = scene.mesh_and_picking_mut(mesh_id)?;
        let change = active.session.finalize(mesh, picking)?;

        self.history.record_change("Create polygon", mesh_id, &change);
        for batch in &change.selected {
            self.selection.set_selected(mesh_id, batch, true, false);
        }
        self.end_session();
        Ok(())
    }

    fn cancel(&mut self) -> Result<()> {
        let active = self.end_session().ok_or(CreationError::NoActiveSession)?;
        active.session.cancel();
        Ok(())
    }

    /// Leaves the creating state; the caller decides the session's fate.
    fn end_session(&mut self) -> Option<ActiveCreation> {
        let active = self.active.take()?;
        self.input.remove_task(FrameTask::UpdatePolygon);
        self.input.enter_state(ModeState::CreationMode);
        self.status = Some(StatusText::CREATE_POLY);
        Some(active)
    }

    fn update_polygon(&mut self, scene: &mut Scene) -> Result<()> {
        let Some(mesh_id) = self.active_mesh() else {
            return Ok(());
        };

        let point = match self.hover(scene) {
            Hover::Vertex(hovered, merged) => {
                let mesh = scene.mesh(hovered)?;
                mesh.to_world(&mesh.merged_vertex_point(merged)?)
            }
            Hover::Nothing => self.grid_point()?,
            Hover::Pending | Hover::Other => return Ok(()),
        };

        let mesh = scene.mesh(mesh_id)?;
        self.active_mut()?.session.update(mesh, point);
        Ok(())
    }
}

/// Turns recoverable creation errors into silent no-ops.
fn skip_recoverable(result: Result<()>, what: &str) -> Result<()> {
    match result {
        Err(PolyeditError::Creation(err)) => {
            tracing::debug!(%err, input = what, "skipped creation input");
            Ok(())
        }
        other => other,
    }
}
