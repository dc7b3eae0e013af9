use std::collections::HashSet;

use crate::mesh::Mesh;

/// Validates that a mesh's topology, merged groups and buffers agree.
#[derive(Default)]
pub struct IsValid;

impl IsValid {
    /// Creates a new `IsValid` query.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Executes the validation, returning `true` if the mesh is valid.
    #[must_use]
    pub fn execute(&self, mesh: &Mesh) -> bool {
        match Self::first_violation(mesh) {
            Some(reason) => {
                tracing::debug!(mesh = mesh.name(), reason, "mesh is invalid");
                false
            }
            None => true,
        }
    }

    fn first_violation(mesh: &Mesh) -> Option<&'static str> {
        let topo = mesh.topology();
        let rows = mesh.buffers().row_count();

        if rows != topo.vertex_count() {
            return Some("row count differs from vertex count");
        }

        let mut used_rows = HashSet::new();
        for (id, vertex) in topo.vertices() {
            if vertex.row >= rows || !used_rows.insert(vertex.row) {
                return Some("vertex rows must be unique and in range");
            }
            if topo.merged_vertex_of(id).is_none() {
                return Some("vertex outside any merged vertex");
            }
            let Some(poly) = vertex.polygon else {
                return Some("vertex without polygon");
            };
            if !topo
                .polygon(poly)
                .is_ok_and(|data| data.vertices.contains(&id))
            {
                return Some("vertex not listed by its polygon");
            }
        }

        for &poly in topo.ordered_polygons() {
            let Ok(data) = topo.polygon(poly) else {
                return Some("ordered polygon missing");
            };
            if data
                .triangles
                .iter()
                .flatten()
                .any(|v| !data.vertices.contains(v))
            {
                return Some("triangle uses a vertex of another polygon");
            }
            for &e in &data.edges {
                let Ok(edge) = topo.edge(e) else {
                    return Some("polygon edge missing");
                };
                if edge.vertices().iter().any(|v| !data.vertices.contains(v)) {
                    return Some("edge endpoint outside its polygon");
                }
            }
        }

        for (merged, group) in topo.merged_vertices() {
            let members: HashSet<_> = group.vertices().iter().collect();
            if group.is_empty() || members.len() != group.len() {
                return Some("merged vertex empty or with duplicate members");
            }
            if group
                .vertices()
                .iter()
                .any(|&v| topo.merged_vertex_of(v) != Some(merged))
            {
                return Some("merged vertex member points elsewhere");
            }
        }

        for (merged, group) in topo.merged_edges() {
            let members: HashSet<_> = group.edges().iter().collect();
            if group.is_empty() || members.len() != group.len() {
                return Some("merged edge empty or with duplicate members");
            }
            if group
                .edges()
                .iter()
                .any(|&e| topo.merged_edge_of(e) != Some(merged))
            {
                return Some("merged edge member points elsewhere");
            }
        }

        None
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::creation::NewVertex;
    use crate::math::{Isometry3, Point3};
    use crate::operations::creation::MakePolygon;
    use crate::picking::PickingColorAllocator;

    #[test]
    fn empty_mesh_is_valid() {
        let mesh = Mesh::new("m", Isometry3::identity());
        assert!(IsValid::new().execute(&mesh));
    }

    #[test]
    fn committed_polygon_is_valid() {
        let mut mesh = Mesh::new("m", Isometry3::identity());
        let mut picking = PickingColorAllocator::new();
        let pts = [(0.0, 0.0), (2.0, 0.0), (2.0, 1.0), (1.0, 2.0), (0.0, 1.0)];
        let vertices = pts
            .iter()
            .map(|&(x, y)| NewVertex::Grid(Point3::new(x, y, 0.0)))
            .collect();
        MakePolygon::new(vertices).execute(&mut mesh, &mut picking).unwrap();
        assert!(IsValid::new().execute(&mesh));
    }

    #[test]
    fn detects_stray_vertex() {
        use crate::math::Vector3;
        use crate::topology::VertexData;

        let mut mesh = Mesh::new("m", Isometry3::identity());
        mesh.topology_mut()
            .add_vertex(VertexData::new(Point3::origin(), Vector3::z(), 1));
        assert!(!IsValid::new().execute(&mesh));
    }
}
