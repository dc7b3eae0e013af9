use crate::error::{OperationError, Result, TopologyError};
use crate::mesh::{Mesh, Subobject};
use crate::topology::{PolygonId, VertexId};

/// Removes a polygon together with its vertices and edges.
///
/// Merged groups the polygon took part in shrink; groups left empty are
/// deleted. The buffer rows of the removed vertices are compacted away and
/// every remaining vertex is moved to its new row.
pub struct DeletePolygon {
    polygon: PolygonId,
}

impl DeletePolygon {
    /// Creates a new `DeletePolygon` operation.
    #[must_use]
    pub fn new(polygon: PolygonId) -> Self {
        Self { polygon }
    }

    /// Executes the operation.
    ///
    /// # Errors
    ///
    /// Returns an error if the polygon is not in `mesh` or references
    /// sub-objects that are missing.
    ///
    /// # Panics
    ///
    /// Panics if the buffers end up out of sync with the topology.
    pub fn execute(&self, mesh: &mut Mesh) -> Result<()> {
        let poly = mesh
            .topology()
            .polygon(self.polygon)
            .map_err(|_| OperationError::InvalidInput("polygon is not in the mesh".into()))?
            .clone();

        let mut keep = vec![true; mesh.buffers().row_count()];

        for &e in &poly.edges {
            mesh.selection_mut().set(Subobject::Edge(e), false);
            mesh.topology_mut().remove_edge(e)?;
        }
        for &v in &poly.vertices {
            mesh.selection_mut().set(Subobject::Vertex(v), false);
            let data = mesh.topology_mut().remove_vertex(v)?;
            mesh.forget_picking_vertex(data.picking_id);
            if let Some(slot) = keep.get_mut(data.row) {
                *slot = false;
            }
        }
        mesh.selection_mut().set(Subobject::Polygon(self.polygon), false);
        mesh.topology_mut().remove_polygon(self.polygon)?;

        let remap = mesh.buffers_mut().compact(&keep);
        let remaining: Vec<VertexId> = mesh.topology().vertices().map(|(id, _)| id).collect();
        for id in remaining {
            let vertex = mesh.topology_mut().vertex_mut(id)?;
            vertex.row = remap.get(vertex.row).ok_or_else(|| {
                TopologyError::InvalidTopology("remaining vertex lost its row".into())
            })?;
        }

        mesh.rebuild_edges()?;
        mesh.assert_consistent();

        tracing::debug!(
            mesh = mesh.name(),
            vertices = poly.vertices.len(),
            rows = remap.kept(),
            "deleted polygon"
        );
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::creation::NewVertex;
    use crate::math::{Isometry3, Point3};
    use crate::operations::creation::{BoxConfig, MakeBox, MakePolygon};
    use crate::operations::query::IsValid;
    use crate::picking::PickingColorAllocator;

    fn grid(x: f64, y: f64) -> NewVertex {
        NewVertex::Grid(Point3::new(x, y, 0.0))
    }

    /// Two triangles sharing the diagonal from (0, 0) to (1, 1).
    fn two_triangles() -> (Mesh, PolygonId, PolygonId) {
        let mut mesh = Mesh::new("m", Isometry3::identity());
        let mut picking = PickingColorAllocator::new();
        let first = MakePolygon::new(vec![grid(0.0, 0.0), grid(1.0, 0.0), grid(1.0, 1.0)])
            .execute(&mut mesh, &mut picking)
            .unwrap();
        let a = mesh.topology().merged_vertex_at(&Point3::new(0.0, 0.0, 0.0)).unwrap();
        let c = mesh.topology().merged_vertex_at(&Point3::new(1.0, 1.0, 0.0)).unwrap();
        let second = MakePolygon::new(vec![NewVertex::Existing(a), NewVertex::Existing(c), grid(0.0, 1.0)])
            .execute(&mut mesh, &mut picking)
            .unwrap();
        (mesh, first.created_polygons[0], second.created_polygons[0])
    }

    #[test]
    fn delete_first_of_two() {
        let (mut mesh, first, second) = two_triangles();

        DeletePolygon::new(first).execute(&mut mesh).unwrap();

        let topo = mesh.topology();
        assert_eq!(topo.polygon_count(), 1);
        assert_eq!(topo.vertex_count(), 3);
        assert_eq!(topo.edge_count(), 3);
        assert_eq!(topo.merged_vertices().count(), 3);
        assert_eq!(topo.merged_edges().count(), 3);
        assert_eq!(topo.ordered_polygons(), &[second]);
        for (_, group) in topo.merged_vertices() {
            assert_eq!(group.len(), 1);
        }

        let buffers = mesh.buffers();
        assert_eq!(buffers.row_count(), 3);
        assert_eq!(buffers.triangles().len(), 1);
        let mut rows: Vec<usize> = topo.vertices().map(|(_, v)| v.row).collect();
        rows.sort_unstable();
        assert_eq!(rows, vec![0, 1, 2]);
        assert!(IsValid::new().execute(&mesh));
    }

    #[test]
    fn deleted_vertices_leave_picking_lookup() {
        let (mut mesh, first, _) = two_triangles();
        let ids: Vec<u32> = mesh
            .topology()
            .polygon(first)
            .unwrap()
            .vertices
            .iter()
            .map(|&v| mesh.topology().vertex(v).unwrap().picking_id)
            .collect();

        DeletePolygon::new(first).execute(&mut mesh).unwrap();

        for id in ids {
            assert!(mesh.vertex_by_picking_id(id).is_none());
        }
    }

    #[test]
    fn delete_last_polygon_empties_mesh() {
        let (mut mesh, first, second) = two_triangles();
        DeletePolygon::new(second).execute(&mut mesh).unwrap();
        DeletePolygon::new(first).execute(&mut mesh).unwrap();

        assert_eq!(mesh.topology().vertex_count(), 0);
        assert_eq!(mesh.topology().merged_vertices().count(), 0);
        assert_eq!(mesh.topology().merged_edges().count(), 0);
        assert_eq!(mesh.buffers().row_count(), 0);
        assert!(mesh.buffers().bounds().is_none());
    }

    #[test]
    fn opening_a_box_creates_border() {
        let mut mesh = Mesh::new("box", Isometry3::identity());
        let mut picking = PickingColorAllocator::new();
        let change = MakeBox::new(BoxConfig::default())
            .execute(&mut mesh, &mut picking)
            .unwrap();

        DeletePolygon::new(change.created_polygons[0]).execute(&mut mesh).unwrap();

        let topo = mesh.topology();
        assert_eq!(topo.polygon_count(), 5);
        assert_eq!(topo.merged_vertices().count(), 8);
        let borders = topo
            .merged_vertices()
            .filter(|(m, _)| mesh.is_border(*m).unwrap())
            .count();
        assert_eq!(borders, 4);
        assert!(IsValid::new().execute(&mesh));
    }

    #[test]
    fn deselects_removed_subobjects() {
        let (mut mesh, first, _) = two_triangles();
        let v = mesh.topology().polygon(first).unwrap().vertices[1];
        mesh.set_selected(Subobject::Vertex(v), true).unwrap();

        DeletePolygon::new(first).execute(&mut mesh).unwrap();

        assert!(!mesh.selection().contains(Subobject::Vertex(v)));
    }

    #[test]
    fn unknown_polygon_is_rejected() {
        let (mut mesh, first, _) = two_triangles();
        DeletePolygon::new(first).execute(&mut mesh).unwrap();
        assert!(DeletePolygon::new(first).execute(&mut mesh).is_err());
    }
}
