use crate::math::{Point3, Vector3};

use super::edge::EdgeId;
use super::vertex::VertexId;

slotmap::new_key_type! {
    /// Unique identifier for a polygon in the topology store.
    pub struct PolygonId;
}

/// Data associated with a polygon.
///
/// A polygon is stored as its triangulation. The winding of each triangle
/// determines the front face; all triangles of a polygon wind the same way.
#[derive(Debug, Clone)]
pub struct PolygonData {
    /// Triangles in winding order.
    pub triangles: Vec<[VertexId; 3]>,
    /// Boundary edges.
    pub edges: Vec<EdgeId>,
    /// Vertices in creation order.
    pub vertices: Vec<VertexId>,
    /// Unit normal (area-weighted average of the triangle normals).
    pub normal: Vector3,
    /// Average of the vertex positions.
    pub center: Point3,
    /// Picking id (see [`crate::picking`]).
    pub picking_id: u32,
}

impl PolygonData {
    /// Creates a polygon; center and normal are refined by the store.
    #[must_use]
    pub fn new(
        triangles: Vec<[VertexId; 3]>,
        edges: Vec<EdgeId>,
        vertices: Vec<VertexId>,
        normal: Vector3,
        picking_id: u32,
    ) -> Self {
        Self {
            triangles,
            edges,
            vertices,
            normal,
            center: Point3::origin(),
            picking_id,
        }
    }

    /// Number of vertices, which equals the number of buffer rows the
    /// polygon occupies.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }
}
