//! The editable mesh: topology, packed buffers and selection kept in step.

mod commit;
mod selection;

pub use commit::{boundary_edges, ChangeSet, NewPolygon};
pub use selection::{Selection, Subobject, SubobjectBatch};

use std::collections::HashMap;

use crate::buffers::{EdgeRow, GeometryBuffers};
use crate::error::Result;
use crate::math::{Isometry3, Point3};
use crate::picking::{PickableType, PickingColor};
use crate::topology::{MergedVertexId, TopologyStore, VertexId};

slotmap::new_key_type! {
    /// Unique identifier for a mesh in a [`crate::scene::Scene`].
    pub struct MeshId;
}

/// Sub-object level the picking pass renders for a mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PickingLevel {
    /// Polygons are pickable (regular editing).
    #[default]
    Polygon,
    /// Vertices are pickable; used while creating polygons.
    Vertex,
}

/// An editable polygon mesh placed in the world by `origin`.
#[derive(Debug)]
pub struct Mesh {
    name: String,
    origin: Isometry3,
    topology: TopologyStore,
    buffers: GeometryBuffers,
    selection: Selection,
    picking_level: PickingLevel,
    vertices_by_picking_id: HashMap<u32, VertexId>,
}

impl Mesh {
    /// Creates an empty mesh.
    #[must_use]
    pub fn new(name: impl Into<String>, origin: Isometry3) -> Self {
        Self::with_topology(name, origin, TopologyStore::new())
    }

    /// Creates an empty mesh around a preconfigured (empty) store.
    #[must_use]
    pub fn with_topology(name: impl Into<String>, origin: Isometry3, topology: TopologyStore) -> Self {
        Self {
            name: name.into(),
            origin,
            topology,
            buffers: GeometryBuffers::new(),
            selection: Selection::default(),
            picking_level: PickingLevel::default(),
            vertices_by_picking_id: HashMap::new(),
        }
    }

    /// Display name of the mesh.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Placement of the mesh in world space.
    #[must_use]
    pub fn origin(&self) -> &Isometry3 {
        &self.origin
    }

    /// Converts a world-space point into this mesh's local frame.
    #[must_use]
    pub fn to_local(&self, world: &Point3) -> Point3 {
        self.origin.inverse_transform_point(world)
    }

    /// Converts a local point into world space.
    #[must_use]
    pub fn to_world(&self, local: &Point3) -> Point3 {
        self.origin.transform_point(local)
    }

    /// Topological view of the mesh.
    #[must_use]
    pub fn topology(&self) -> &TopologyStore {
        &self.topology
    }

    /// Packed render and picking buffers.
    #[must_use]
    pub fn buffers(&self) -> &GeometryBuffers {
        &self.buffers
    }

    /// Currently selected sub-objects.
    #[must_use]
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Sub-object level the picking pass renders.
    #[must_use]
    pub fn picking_level(&self) -> PickingLevel {
        self.picking_level
    }

    /// Switches the sub-object level the picking pass renders.
    pub fn set_picking_level(&mut self, level: PickingLevel) {
        self.picking_level = level;
    }

    /// Looks up a vertex by the id decoded from its picking color.
    #[must_use]
    pub fn vertex_by_picking_id(&self, id: u32) -> Option<VertexId> {
        self.vertices_by_picking_id.get(&id).copied()
    }

    /// Position of a merged vertex in mesh-local coordinates.
    ///
    /// # Errors
    ///
    /// Returns an error if the group does not exist.
    pub fn merged_vertex_point(&self, merged: MergedVertexId) -> Result<Point3> {
        Ok(*self.topology.merged_vertex(merged)?.point())
    }

    /// Whether the fan around `merged` is open (see [`TopologyStore::is_border`]).
    ///
    /// # Errors
    ///
    /// Returns an error if the group or one of its members is missing.
    pub fn is_border(&self, merged: MergedVertexId) -> Result<bool> {
        Ok(self.topology.is_border(merged)?)
    }

    /// Selects or deselects `subobj` together with its whole merged group.
    ///
    /// # Errors
    ///
    /// Returns an error if the sub-object does not exist.
    pub fn set_selected(&mut self, subobj: Subobject, selected: bool) -> Result<()> {
        match subobj {
            Subobject::Vertex(v) => {
                self.topology.vertex(v)?;
                let members = match self.topology.merged_vertex_of(v) {
                    Some(m) => self.topology.merged_vertex(m)?.vertices().to_vec(),
                    None => vec![v],
                };
                self.selection
                    .set_batch(&SubobjectBatch::Vertices(members), selected);
            }
            Subobject::Edge(e) => {
                self.topology.edge(e)?;
                let members = match self.topology.merged_edge_of(e) {
                    Some(m) => self.topology.merged_edge(m)?.edges().to_vec(),
                    None => vec![e],
                };
                self.selection.set_batch(&SubobjectBatch::Edges(members), selected);
            }
            Subobject::Polygon(p) => {
                self.topology.polygon(p)?;
                self.selection.set(subobj, selected);
            }
        }
        Ok(())
    }

    /// Applies `selected` to exactly the members of `batch`.
    pub fn select_batch(&mut self, batch: &SubobjectBatch, selected: bool) {
        self.selection.set_batch(batch, selected);
    }

    /// Repacks the edge buffer in polygon order, reversing any edge the
    /// packing had to swap.
    ///
    /// # Errors
    ///
    /// Returns an error if a polygon references a missing edge or vertex.
    pub fn rebuild_edges(&mut self) -> Result<()> {
        let mut order = Vec::new();
        let mut rows = Vec::new();

        for &poly in self.topology.ordered_polygons() {
            for &e in &self.topology.polygon(poly)?.edges {
                let edge = self.topology.edge(e)?;
                rows.push(EdgeRow {
                    start: self.topology.vertex(edge.start)?.row,
                    end: self.topology.vertex(edge.end)?.row,
                    color: PickingColor::encode(PickableType::Edge, edge.picking_id),
                });
                order.push(e);
            }
        }

        let swapped = self.buffers.rebuild_edge_buffer(rows);
        for (e, swap) in order.into_iter().zip(swapped) {
            if swap {
                self.topology.edge_mut(e)?.switch_vertex_order();
            }
        }
        Ok(())
    }

    /// Asserts the buffers hold exactly one row per vertex.
    ///
    /// # Panics
    ///
    /// Panics if buffers and topology have diverged.
    pub fn assert_consistent(&self) {
        self.buffers.assert_rows(self.topology.vertex_count());
    }

    /// Mutable topology; callers keep the buffers in step.
    pub(crate) fn topology_mut(&mut self) -> &mut TopologyStore {
        &mut self.topology
    }

    pub(crate) fn buffers_mut(&mut self) -> &mut GeometryBuffers {
        &mut self.buffers
    }

    pub(crate) fn selection_mut(&mut self) -> &mut Selection {
        &mut self.selection
    }

    /// Makes `vertex` findable by its picking id.
    pub(crate) fn register_picking_vertex(&mut self, picking_id: u32, vertex: VertexId) {
        self.vertices_by_picking_id.insert(picking_id, vertex);
    }

    /// Drops the picking lookup of a removed vertex.
    pub(crate) fn forget_picking_vertex(&mut self, picking_id: u32) {
        self.vertices_by_picking_id.remove(&picking_id);
    }
}
