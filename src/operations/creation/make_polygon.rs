use std::collections::HashSet;

use crate::creation::{CreationSession, CreationSettings, NewVertex};
use crate::error::{CreationError, OperationError, Result};
use crate::mesh::{ChangeSet, Mesh};
use crate::picking::PickingColorAllocator;

/// Creates a polygon from a list of vertices, as if they had been clicked
/// one after the other.
///
/// The polygon is triangulated as a fan around the first vertex and keeps
/// the winding the vertices are given in.
pub struct MakePolygon {
    vertices: Vec<NewVertex>,
}

impl MakePolygon {
    /// Creates a new `MakePolygon` operation.
    #[must_use]
    pub fn new(vertices: Vec<NewVertex>) -> Self {
        Self { vertices }
    }

    /// Executes the operation, committing the polygon into `mesh`.
    ///
    /// # Errors
    ///
    /// Returns an error if there are fewer than three vertices, if an
    /// existing merged vertex is listed twice or missing from `mesh`, or if
    /// picking ids run out.
    pub fn execute(&self, mesh: &mut Mesh, picking: &mut PickingColorAllocator) -> Result<ChangeSet> {
        let count = self.vertices.len();
        if count < 3 {
            return Err(CreationError::TooFewVertices { count }.into());
        }

        let mut seen = HashSet::new();
        for vertex in &self.vertices {
            if let NewVertex::Existing(merged) = vertex {
                if !seen.insert(*merged) {
                    return Err(OperationError::InvalidInput(
                        "polygon lists an existing vertex twice".into(),
                    )
                    .into());
                }
            }
        }

        let mut session = CreationSession::start(mesh, self.vertices[0], CreationSettings::default())?;
        for &vertex in &self.vertices[1..] {
            session.add_vertex(mesh, vertex)?;
        }
        session.finalize(mesh, picking)
    }
}
