use crate::math::{Point3, Vector3};

use super::edge::EdgeId;
use super::polygon::PolygonId;

slotmap::new_key_type! {
    /// Unique identifier for a vertex in the topology store.
    pub struct VertexId;
}

/// Data associated with a mesh vertex.
///
/// Every vertex belongs to exactly one polygon; coincident vertices of
/// neighbouring polygons are grouped by a merged vertex instead of being
/// shared.
#[derive(Debug, Clone)]
pub struct VertexData {
    /// Position in mesh-local coordinates.
    pub point: Point3,
    /// Shading normal (the owning polygon's normal).
    pub normal: Vector3,
    /// Row of this vertex in the mesh's geometry buffers.
    pub row: usize,
    /// Edges having this vertex as an endpoint.
    pub edges: Vec<EdgeId>,
    /// Owning polygon, set once the polygon is committed.
    pub polygon: Option<PolygonId>,
    /// Picking id (see [`crate::picking`]).
    pub picking_id: u32,
}

impl VertexData {
    /// Creates a vertex at `point` that is not yet part of any polygon.
    #[must_use]
    pub fn new(point: Point3, normal: Vector3, picking_id: u32) -> Self {
        Self {
            point,
            normal,
            row: 0,
            edges: Vec::new(),
            polygon: None,
            picking_id,
        }
    }
}
