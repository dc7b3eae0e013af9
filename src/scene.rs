//! The set of editable meshes sharing one picking color space.

use slotmap::SlotMap;

use crate::creation::CreationSettings;
use crate::error::{Result, TopologyError};
use crate::math::Isometry3;
use crate::mesh::{Mesh, MeshId};
use crate::picking::PickingColorAllocator;
use crate::topology::{TopologyStore, VertexId};

/// Editable meshes plus the picking allocator their sub-objects draw from.
#[derive(Debug, Default)]
pub struct Scene {
    meshes: SlotMap<MeshId, Mesh>,
    picking: PickingColorAllocator,
    settings: CreationSettings,
}

impl Scene {
    /// Creates an empty scene with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty scene using `settings` for new meshes and sessions.
    #[must_use]
    pub fn with_settings(settings: CreationSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    /// Settings shared by every mesh of the scene.
    #[must_use]
    pub fn settings(&self) -> &CreationSettings {
        &self.settings
    }

    /// Creates an empty mesh using the scene's merge tolerance.
    pub fn create_mesh(&mut self, name: impl Into<String>, origin: Isometry3) -> MeshId {
        let topology = TopologyStore::with_merge_tolerance(self.settings.merge_tolerance);
        self.add_mesh(Mesh::with_topology(name, origin, topology))
    }

    /// Adds an existing mesh and returns its ID.
    pub fn add_mesh(&mut self, mesh: Mesh) -> MeshId {
        let id = self.meshes.insert(mesh);
        tracing::debug!(mesh = ?id, "added mesh");
        id
    }

    /// Removes a mesh. Its picking ids stay retired.
    pub fn remove_mesh(&mut self, id: MeshId) -> Option<Mesh> {
        self.meshes.remove(id)
    }

    /// # Errors
    ///
    /// Returns an error if the mesh does not exist.
    pub fn mesh(&self, id: MeshId) -> Result<&Mesh> {
        self.meshes
            .get(id)
            .ok_or_else(|| TopologyError::EntityNotFound("mesh".into()).into())
    }

    /// # Errors
    ///
    /// Returns an error if the mesh does not exist.
    pub fn mesh_mut(&mut self, id: MeshId) -> Result<&mut Mesh> {
        self.meshes
            .get_mut(id)
            .ok_or_else(|| TopologyError::EntityNotFound("mesh".into()).into())
    }

    /// A mesh together with the allocator, borrowed disjointly for commits.
    ///
    /// # Errors
    ///
    /// Returns an error if the mesh does not exist.
    pub fn mesh_and_picking_mut(
        &mut self,
        id: MeshId,
    ) -> Result<(&mut Mesh, &mut PickingColorAllocator)> {
        let mesh = self
            .meshes
            .get_mut(id)
            .ok_or_else(|| TopologyError::EntityNotFound("mesh".into()))?;
        Ok((mesh, &mut self.picking))
    }

    /// Iterates over all meshes.
    pub fn meshes(&self) -> impl Iterator<Item = (MeshId, &Mesh)> {
        self.meshes.iter()
    }

    /// The allocator every sub-object of the scene draws its id from.
    #[must_use]
    pub fn picking(&self) -> &PickingColorAllocator {
        &self.picking
    }

    /// Finds the mesh vertex a decoded picking id belongs to.
    #[must_use]
    pub fn vertex_by_picking_id(&self, id: u32) -> Option<(MeshId, VertexId)> {
        self.meshes
            .iter()
            .find_map(|(mesh_id, mesh)| mesh.vertex_by_picking_id(id).map(|v| (mesh_id, v)))
    }
}
