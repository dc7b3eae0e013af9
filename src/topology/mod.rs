pub mod edge;
pub mod merged;
pub mod polygon;
pub mod position_index;
pub mod vertex;

pub use edge::{EdgeData, EdgeId};
pub use merged::{MergedEdge, MergedEdgeId, MergedVertex, MergedVertexId};
pub use polygon::{PolygonData, PolygonId};
pub use position_index::PositionIndex;
pub use vertex::{VertexData, VertexId};

use std::collections::HashSet;

use slotmap::{SecondaryMap, SlotMap};

use crate::error::TopologyError;
use crate::math::{triangle_normal, Point3, Vector3, TOLERANCE};

/// Default distance below which two positions count as coincident.
pub const DEFAULT_MERGE_TOLERANCE: f64 = 1e-6;

/// Central arena that owns all topological entities of one mesh.
///
/// Entities reference each other via typed IDs (generational indices).
/// Membership in merged groups is owned by the store's lookup tables;
/// a vertex or edge never points at its group.
#[derive(Debug)]
pub struct TopologyStore {
    vertices: SlotMap<VertexId, VertexData>,
    edges: SlotMap<EdgeId, EdgeData>,
    polygons: SlotMap<PolygonId, PolygonData>,
    merged_vertices: SlotMap<MergedVertexId, MergedVertex>,
    merged_edges: SlotMap<MergedEdgeId, MergedEdge>,
    vertex_groups: SecondaryMap<VertexId, MergedVertexId>,
    edge_groups: SecondaryMap<EdgeId, MergedEdgeId>,
    ordered_polygons: Vec<PolygonId>,
    positions: PositionIndex,
}

impl Default for TopologyStore {
    fn default() -> Self {
        Self::with_merge_tolerance(DEFAULT_MERGE_TOLERANCE)
    }
}

impl TopologyStore {
    /// Creates a new, empty topology store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store whose position index treats points closer
    /// than `tolerance` as coincident.
    #[must_use]
    pub fn with_merge_tolerance(tolerance: f64) -> Self {
        Self {
            vertices: SlotMap::with_key(),
            edges: SlotMap::with_key(),
            polygons: SlotMap::with_key(),
            merged_vertices: SlotMap::with_key(),
            merged_edges: SlotMap::with_key(),
            vertex_groups: SecondaryMap::new(),
            edge_groups: SecondaryMap::new(),
            ordered_polygons: Vec::new(),
            positions: PositionIndex::new(tolerance),
        }
    }

    // --- Vertex operations ---

    /// Inserts a vertex and returns its ID.
    pub fn add_vertex(&mut self, data: VertexData) -> VertexId {
        self.vertices.insert(data)
    }

    /// Returns a reference to the vertex data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn vertex(&self, id: VertexId) -> Result<&VertexData, TopologyError> {
        self.vertices
            .get(id)
            .ok_or_else(|| TopologyError::EntityNotFound("vertex".into()))
    }

    /// Returns a mutable reference to the vertex data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn vertex_mut(&mut self, id: VertexId) -> Result<&mut VertexData, TopologyError> {
        self.vertices
            .get_mut(id)
            .ok_or_else(|| TopologyError::EntityNotFound("vertex".into()))
    }

    /// Removes a vertex and drops it from its merged group.
    ///
    /// # Errors
    ///
    /// Returns an error if the vertex is not found.
    pub fn remove_vertex(&mut self, id: VertexId) -> Result<VertexData, TopologyError> {
        self.leave_merged_vertex(id);
        self.vertices
            .remove(id)
            .ok_or_else(|| TopologyError::EntityNotFound("vertex".into()))
    }

    /// Iterates over all vertices.
    pub fn vertices(&self) -> impl Iterator<Item = (VertexId, &VertexData)> {
        self.vertices.iter()
    }

    /// Number of vertices in the store.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    // --- Edge operations ---

    /// Inserts an edge, registers it with both endpoints and returns its ID.
    ///
    /// # Errors
    ///
    /// Returns an error if either endpoint is not in the store.
    pub fn add_edge(&mut self, data: EdgeData) -> Result<EdgeId, TopologyError> {
        let [start, end] = data.vertices();
        self.vertex(start)?;
        self.vertex(end)?;
        let id = self.edges.insert(data);
        self.vertex_mut(start)?.edges.push(id);
        self.vertex_mut(end)?.edges.push(id);
        Ok(id)
    }

    /// Returns a reference to the edge data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn edge(&self, id: EdgeId) -> Result<&EdgeData, TopologyError> {
        self.edges
            .get(id)
            .ok_or_else(|| TopologyError::EntityNotFound("edge".into()))
    }

    /// Returns a mutable reference to the edge data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn edge_mut(&mut self, id: EdgeId) -> Result<&mut EdgeData, TopologyError> {
        self.edges
            .get_mut(id)
            .ok_or_else(|| TopologyError::EntityNotFound("edge".into()))
    }

    /// Removes an edge, detaching it from its endpoints and merged group.
    ///
    /// # Errors
    ///
    /// Returns an error if the edge is not found.
    pub fn remove_edge(&mut self, id: EdgeId) -> Result<EdgeData, TopologyError> {
        self.leave_merged_edge(id);
        let data = self
            .edges
            .remove(id)
            .ok_or_else(|| TopologyError::EntityNotFound("edge".into()))?;
        for vertex in data.vertices() {
            if let Some(v) = self.vertices.get_mut(vertex) {
                v.edges.retain(|e| *e != id);
            }
        }
        Ok(data)
    }

    /// Iterates over all edges.
    pub fn edges(&self) -> impl Iterator<Item = (EdgeId, &EdgeData)> {
        self.edges.iter()
    }

    /// Number of edges in the store.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    // --- Polygon operations ---

    /// Inserts a polygon, appends it to the polygon order and claims its
    /// vertices and edges.
    ///
    /// # Errors
    ///
    /// Returns an error if a referenced vertex or edge is missing.
    pub fn add_polygon(&mut self, data: PolygonData) -> Result<PolygonId, TopologyError> {
        for &v in &data.vertices {
            self.vertex(v)?;
        }
        for &e in &data.edges {
            self.edge(e)?;
        }
        let vertices = data.vertices.clone();
        let edges = data.edges.clone();
        let id = self.polygons.insert(data);
        for v in vertices {
            self.vertex_mut(v)?.polygon = Some(id);
        }
        for e in edges {
            self.edge_mut(e)?.polygon = Some(id);
        }
        self.ordered_polygons.push(id);
        Ok(id)
    }

    /// Returns a reference to the polygon data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn polygon(&self, id: PolygonId) -> Result<&PolygonData, TopologyError> {
        self.polygons
            .get(id)
            .ok_or_else(|| TopologyError::EntityNotFound("polygon".into()))
    }

    /// Returns a mutable reference to the polygon data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn polygon_mut(&mut self, id: PolygonId) -> Result<&mut PolygonData, TopologyError> {
        self.polygons
            .get_mut(id)
            .ok_or_else(|| TopologyError::EntityNotFound("polygon".into()))
    }

    /// Removes a polygon record (but not its vertices or edges).
    ///
    /// # Errors
    ///
    /// Returns an error if the polygon is not found.
    pub fn remove_polygon(&mut self, id: PolygonId) -> Result<PolygonData, TopologyError> {
        let data = self
            .polygons
            .remove(id)
            .ok_or_else(|| TopologyError::EntityNotFound("polygon".into()))?;
        self.ordered_polygons.retain(|p| *p != id);
        Ok(data)
    }

    /// Polygons in commit order; buffer rows follow this order.
    #[must_use]
    pub fn ordered_polygons(&self) -> &[PolygonId] {
        &self.ordered_polygons
    }

    /// Number of polygons in the store.
    #[must_use]
    pub fn polygon_count(&self) -> usize {
        self.polygons.len()
    }

    /// Recomputes a polygon's center and normal from its vertices.
    ///
    /// A degenerate triangulation keeps the previous normal.
    ///
    /// # Errors
    ///
    /// Returns an error if the polygon or one of its vertices is missing.
    #[allow(clippy::cast_precision_loss)]
    pub fn refresh_polygon(&mut self, id: PolygonId) -> Result<(), TopologyError> {
        let poly = self.polygon(id)?;

        let mut sum = Vector3::zeros();
        for &v in &poly.vertices {
            sum += self.vertex(v)?.point.coords;
        }
        let center = Point3::from(sum / poly.vertices.len().max(1) as f64);

        let mut normal = Vector3::zeros();
        for tri in &poly.triangles {
            let [a, b, c] = tri.map(|v| self.vertices.get(v).map(|d| d.point));
            let (Some(a), Some(b), Some(c)) = (a, b, c) else {
                return Err(TopologyError::EntityNotFound("vertex".into()));
            };
            normal += triangle_normal(&a, &b, &c);
        }

        let poly = self.polygon_mut(id)?;
        poly.center = center;
        if normal.norm() > TOLERANCE {
            poly.normal = normal.normalize();
        }
        Ok(())
    }

    // --- Merged topology ---

    /// Creates an empty merged vertex at `point` and indexes its position.
    pub fn create_merged_vertex(&mut self, point: Point3) -> MergedVertexId {
        let id = self.merged_vertices.insert(MergedVertex::new(point));
        self.positions.insert(point, id);
        id
    }

    /// Creates an empty merged edge.
    pub fn create_merged_edge(&mut self) -> MergedEdgeId {
        self.merged_edges.insert(MergedEdge::new())
    }

    /// Returns the merged vertex at `point`, creating an empty one if no
    /// group lies within the merge tolerance.
    pub fn find_or_create_merged_vertex(&mut self, point: Point3) -> MergedVertexId {
        match self.positions.find(&point) {
            Some(id) => id,
            None => self.create_merged_vertex(point),
        }
    }

    /// Returns the merged vertex within the merge tolerance of `point`.
    #[must_use]
    pub fn merged_vertex_at(&self, point: &Point3) -> Option<MergedVertexId> {
        self.positions.find(point)
    }

    /// Returns a reference to the merged vertex, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn merged_vertex(&self, id: MergedVertexId) -> Result<&MergedVertex, TopologyError> {
        self.merged_vertices
            .get(id)
            .ok_or_else(|| TopologyError::EntityNotFound("merged vertex".into()))
    }

    /// Returns a reference to the merged edge, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn merged_edge(&self, id: MergedEdgeId) -> Result<&MergedEdge, TopologyError> {
        self.merged_edges
            .get(id)
            .ok_or_else(|| TopologyError::EntityNotFound("merged edge".into()))
    }

    /// Iterates over all merged vertices.
    pub fn merged_vertices(&self) -> impl Iterator<Item = (MergedVertexId, &MergedVertex)> {
        self.merged_vertices.iter()
    }

    /// Iterates over all merged edges.
    pub fn merged_edges(&self) -> impl Iterator<Item = (MergedEdgeId, &MergedEdge)> {
        self.merged_edges.iter()
    }

    /// The group `vertex` belongs to.
    #[must_use]
    pub fn merged_vertex_of(&self, vertex: VertexId) -> Option<MergedVertexId> {
        self.vertex_groups.get(vertex).copied()
    }

    /// The group `edge` belongs to.
    #[must_use]
    pub fn merged_edge_of(&self, edge: EdgeId) -> Option<MergedEdgeId> {
        self.edge_groups.get(edge).copied()
    }

    /// Adds `vertex` to `merged`. Joining a group the vertex is already in
    /// is a no-op; a vertex in another group is moved.
    ///
    /// # Errors
    ///
    /// Returns an error if the vertex or the group is missing.
    pub fn join_merged_vertex(
        &mut self,
        merged: MergedVertexId,
        vertex: VertexId,
    ) -> Result<(), TopologyError> {
        self.vertex(vertex)?;
        self.merged_vertex(merged)?;
        if self.merged_vertex_of(vertex).is_some_and(|current| current != merged) {
            self.leave_merged_vertex(vertex);
        }
        if let Some(group) = self.merged_vertices.get_mut(merged) {
            group.push(vertex);
        }
        self.vertex_groups.insert(vertex, merged);
        Ok(())
    }

    /// Adds `edge` to `merged`.
    ///
    /// # Errors
    ///
    /// Returns an error if the edge or the group is missing.
    pub fn join_merged_edge(
        &mut self,
        merged: MergedEdgeId,
        edge: EdgeId,
    ) -> Result<(), TopologyError> {
        self.edge(edge)?;
        self.merged_edge(merged)?;
        if self.merged_edge_of(edge).is_some_and(|current| current != merged) {
            self.leave_merged_edge(edge);
        }
        if let Some(group) = self.merged_edges.get_mut(merged) {
            group.push(edge);
        }
        self.edge_groups.insert(edge, merged);
        Ok(())
    }

    /// Drops `vertex` from its group; an emptied group is deleted.
    fn leave_merged_vertex(&mut self, vertex: VertexId) {
        let Some(merged) = self.vertex_groups.remove(vertex) else {
            return;
        };
        let Some(group) = self.merged_vertices.get_mut(merged) else {
            return;
        };
        group.remove(vertex);
        if group.is_empty() {
            let point = *group.point();
            self.merged_vertices.remove(merged);
            self.positions.remove(&point, merged);
        }
    }

    /// Drops `edge` from its group; an emptied group is deleted.
    fn leave_merged_edge(&mut self, edge: EdgeId) {
        let Some(merged) = self.edge_groups.remove(edge) else {
            return;
        };
        if let Some(group) = self.merged_edges.get_mut(merged) {
            group.remove(edge);
            if group.is_empty() {
                self.merged_edges.remove(merged);
            }
        }
    }

    /// Returns `true` if the fan of polygons around `merged` is open.
    ///
    /// Each member vertex belongs to one polygon, and coincident edges of
    /// neighbouring polygons share one merged edge. A closed fan has as many
    /// polygons as distinct incident edges; an open fan has fewer.
    ///
    /// # Errors
    ///
    /// Returns an error if the group or one of its members is missing.
    pub fn is_border(&self, merged: MergedVertexId) -> Result<bool, TopologyError> {
        let group = self.merged_vertex(merged)?;

        let mut polygons = HashSet::new();
        let mut merged_edges = HashSet::new();
        let mut loose_edges = HashSet::new();

        for &v in group.vertices() {
            let vertex = self.vertex(v)?;
            if let Some(poly) = vertex.polygon {
                polygons.insert(poly);
            }
            for &e in &vertex.edges {
                match self.merged_edge_of(e) {
                    Some(me) => merged_edges.insert(me),
                    None => loose_edges.insert(e),
                };
            }
        }

        Ok(polygons.len() < merged_edges.len() + loose_edges.len())
    }
}
