use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use crate::buffers::RowData;
use crate::error::{Result, TopologyError};
use crate::math::{Point3, Vector3};
use crate::picking::{PickableType, PickingColor, PickingColorAllocator};
use crate::topology::{
    EdgeData, EdgeId, MergedEdgeId, MergedVertexId, PolygonData, PolygonId, VertexData, VertexId,
};

use super::{Mesh, Subobject, SubobjectBatch};

/// A triangulated polygon ready to be committed into a mesh.
#[derive(Debug, Clone)]
pub struct NewPolygon {
    /// Candidate positions in mesh-local coordinates.
    pub positions: Vec<Point3>,
    /// Triangles as indices into `positions`, already in final winding.
    pub triangles: Vec<[usize; 3]>,
    /// Unit normal written to every new vertex.
    pub normal: Vector3,
    /// Positions that join an existing merged vertex instead of starting
    /// a new one.
    pub owned: BTreeMap<usize, MergedVertexId>,
}

/// Everything one committed polygon created, for history and selection.
#[derive(Debug, Clone, Default)]
pub struct ChangeSet {
    pub created_vertices: Vec<VertexId>,
    pub created_edges: Vec<EdgeId>,
    pub created_polygons: Vec<PolygonId>,
    /// New sub-objects that inherited selection from the groups they joined,
    /// one batch per type.
    pub selected: Vec<SubobjectBatch>,
}

impl ChangeSet {
    /// Appends everything `other` created, e.g. when one operation commits
    /// several polygons.
    pub fn merge(&mut self, other: ChangeSet) {
        self.created_vertices.extend(other.created_vertices);
        self.created_edges.extend(other.created_edges);
        self.created_polygons.extend(other.created_polygons);
        self.selected.extend(other.selected);
    }
}

/// Boundary of a triangulated polygon.
///
/// Every undirected vertex pair of every triangle is toggled in and out of
/// the result, so a diagonal shared by two triangles cancels while edges used
/// once survive. Survivors keep the direction they have in their triangle
/// and the order in which they were first seen.
#[must_use]
pub fn boundary_edges(triangles: &[[usize; 3]]) -> Vec<(usize, usize)> {
    let mut edges: Vec<(usize, usize)> = Vec::new();

    for &[a, b, c] in triangles {
        for (from, to) in [(a, b), (b, c), (c, a)] {
            let same = |&(x, y): &(usize, usize)| (x, y) == (from, to) || (x, y) == (to, from);
            match edges.iter().position(same) {
                Some(index) => {
                    edges.remove(index);
                }
                None => edges.push((from, to)),
            }
        }
    }

    edges
}

fn allocate_ids(
    picking: &mut PickingColorAllocator,
    kind: PickableType,
    count: usize,
) -> Result<Vec<u32>> {
    let mut ids = Vec::with_capacity(count);
    for _ in 0..count {
        ids.push(picking.allocate(kind)?.0);
    }
    Ok(ids)
}

fn sorted_pair<T: Ord>(a: T, b: T) -> (T, T) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

impl Mesh {
    /// Commits `polygon`: creates its vertices, edges and merged-group
    /// memberships, appends its rows to the buffers, repacks the edge buffer
    /// and propagates selection from the groups it joined.
    ///
    /// # Errors
    ///
    /// Returns an error if a triangle indexes past `positions`, if an owned
    /// merged vertex is missing, or if picking ids run out.
    ///
    /// # Panics
    ///
    /// Panics if the buffers end up out of sync with the topology.
    pub fn commit_polygon(
        &mut self,
        polygon: &NewPolygon,
        picking: &mut PickingColorAllocator,
    ) -> Result<ChangeSet> {
        let NewPolygon {
            positions,
            triangles,
            normal,
            owned,
        } = polygon;

        if triangles.is_empty() || triangles.iter().flatten().any(|&i| i >= positions.len()) {
            return Err(TopologyError::InvalidTopology(
                "polygon triangles must index its positions".into(),
            )
            .into());
        }
        for &merged in owned.values() {
            self.topology.merged_vertex(merged)?;
        }

        // All ids are drawn before the store is touched, so running out of
        // ids leaves the mesh unchanged.
        let used: BTreeSet<usize> = triangles.iter().flatten().copied().collect();
        let boundary = boundary_edges(triangles);
        let (poly_picking_id, poly_color) = picking.allocate(PickableType::Polygon)?;
        let vertex_ids = allocate_ids(picking, PickableType::Vertex, used.len())?;
        let edge_ids = allocate_ids(picking, PickableType::Edge, boundary.len())?;
        let mut vertex_ids = vertex_ids.into_iter();

        // Existing edges between owned groups, keyed by their group pair.
        let owned_groups: HashSet<MergedVertexId> = owned.values().copied().collect();
        let mut shared_edges: HashMap<(MergedVertexId, MergedVertexId), MergedEdgeId> =
            HashMap::new();
        for &merged in &owned_groups {
            for &v in self.topology.merged_vertex(merged)?.vertices() {
                for &e in &self.topology.vertex(v)?.edges {
                    let edge = self.topology.edge(e)?;
                    let ends = edge.vertices().map(|v| self.topology.merged_vertex_of(v));
                    let [Some(m1), Some(m2)] = ends else { continue };
                    if !owned_groups.contains(&m1) || !owned_groups.contains(&m2) {
                        continue;
                    }
                    if let Some(group) = self.topology.merged_edge_of(e) {
                        shared_edges.insert(sorted_pair(m1, m2), group);
                    }
                }
            }
        }

        // Vertices, one per candidate position actually used.
        let mut vertex_at: Vec<Option<VertexId>> = vec![None; positions.len()];
        let mut poly_verts = Vec::new();
        let mut verts_to_select = Vec::new();
        let mut tri_verts = Vec::with_capacity(triangles.len());

        for tri in triangles {
            let mut ids = [VertexId::default(); 3];
            for (slot, &index) in tri.iter().enumerate() {
                if let Some(v) = vertex_at[index] {
                    ids[slot] = v;
                    continue;
                }

                let point = positions[index];
                let picking_id = vertex_ids.next().ok_or_else(|| {
                    TopologyError::InvalidTopology("vertex picking ids miscounted".into())
                })?;
                let v = self
                    .topology
                    .add_vertex(VertexData::new(point, *normal, picking_id));
                self.register_picking_vertex(picking_id, v);

                let merged = match owned.get(&index) {
                    Some(&merged) => {
                        let group = self.topology.merged_vertex(merged)?;
                        if group
                            .vertices()
                            .iter()
                            .any(|&m| self.selection.contains(Subobject::Vertex(m)))
                        {
                            verts_to_select.push(v);
                        }
                        merged
                    }
                    None => self.topology.create_merged_vertex(point),
                };
                self.topology.join_merged_vertex(merged, v)?;

                vertex_at[index] = Some(v);
                poly_verts.push(v);
                ids[slot] = v;
            }
            tri_verts.push(ids);
        }

        // Edges along the boundary, joined to coincident existing edges.
        let mut poly_edges = Vec::new();
        let mut edges_to_select = Vec::new();

        for ((from, to), picking_id) in boundary.into_iter().zip(edge_ids) {
            let (Some(start), Some(end)) = (vertex_at[from], vertex_at[to]) else {
                continue;
            };
            let e = self.topology.add_edge(EdgeData::new(start, end, picking_id))?;

            let ends = (
                self.topology.merged_vertex_of(start),
                self.topology.merged_vertex_of(end),
            );
            let shared = match ends {
                (Some(m1), Some(m2)) => shared_edges.get(&sorted_pair(m1, m2)).copied(),
                _ => None,
            };
            let group = match shared {
                Some(group) => {
                    let first = self.topology.merged_edge(group)?.first();
                    if first.is_some_and(|f| self.selection.contains(Subobject::Edge(f))) {
                        edges_to_select.push(e);
                    }
                    group
                }
                None => self.topology.create_merged_edge(),
            };
            self.topology.join_merged_edge(group, e)?;
            poly_edges.push(e);
        }

        let poly = self.topology.add_polygon(PolygonData::new(
            tri_verts.clone(),
            poly_edges.clone(),
            poly_verts.clone(),
            *normal,
            poly_picking_id,
        ))?;

        // Buffers: rows first, then everything that depends on them.
        let first_row = self.buffers.row_count();
        let mut rows = Vec::with_capacity(poly_verts.len());
        for (i, &v) in poly_verts.iter().enumerate() {
            let vertex = self.topology.vertex_mut(v)?;
            vertex.row = first_row + i;
            rows.push(RowData {
                position: vertex.point,
                normal: vertex.normal,
                vertex_color: PickingColor::encode(PickableType::Vertex, vertex.picking_id),
                polygon_color: poly_color,
            });
        }
        self.buffers.append_vertices(&rows);

        let mut tri_rows = Vec::with_capacity(tri_verts.len());
        for tri in &tri_verts {
            let mut r = [0; 3];
            for (slot, &v) in tri.iter().enumerate() {
                r[slot] = self.topology.vertex(v)?.row;
            }
            tri_rows.push(r);
        }
        self.buffers.append_triangles(&tri_rows);
        self.rebuild_edges()?;

        self.topology.refresh_polygon(poly)?;

        let mut selected = Vec::new();
        if !verts_to_select.is_empty() {
            let batch = SubobjectBatch::Vertices(verts_to_select);
            self.select_batch(&batch, true);
            selected.push(batch);
        }
        if !edges_to_select.is_empty() {
            let batch = SubobjectBatch::Edges(edges_to_select);
            self.select_batch(&batch, true);
            selected.push(batch);
        }

        self.assert_consistent();

        tracing::info!(
            mesh = %self.name,
            vertices = poly_verts.len(),
            edges = poly_edges.len(),
            triangles = tri_verts.len(),
            "committed polygon"
        );

        Ok(ChangeSet {
            created_vertices: poly_verts,
            created_edges: poly_edges,
            created_polygons: vec![poly],
            selected,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::{Isometry3, TOLERANCE};

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn undirected(edges: &[(usize, usize)]) -> HashSet<(usize, usize)> {
        edges.iter().map(|&(a, b)| sorted_pair(a, b)).collect()
    }

    fn triangle(positions: [Point3; 3]) -> NewPolygon {
        NewPolygon {
            positions: positions.to_vec(),
            triangles: vec![[0, 1, 2]],
            normal: Vector3::z(),
            owned: BTreeMap::new(),
        }
    }

    #[test]
    fn single_triangle_boundary_is_all_three_edges() {
        let edges = boundary_edges(&[[0, 1, 2]]);
        assert_eq!(edges, vec![(0, 1), (1, 2), (2, 0)]);
    }

    #[test]
    fn fan_boundary_drops_shared_diagonals() {
        // Fan around hub 0 over rim 1..4: four triangles, three shared spokes.
        let fan = [[0, 1, 2], [0, 2, 3], [0, 3, 4], [0, 4, 5]];
        let edges = boundary_edges(&fan);

        let expected: HashSet<(usize, usize)> =
            [(0, 1), (1, 2), (2, 3), (3, 4), (4, 5), (0, 5)].into_iter().collect();
        assert_eq!(undirected(&edges), expected);
        for spoke in [(0, 2), (0, 3), (0, 4)] {
            assert!(!undirected(&edges).contains(&spoke));
        }
    }

    #[test]
    fn boundary_edges_form_a_directed_cycle() {
        let strip = [[0, 1, 2], [0, 2, 3], [3, 2, 4]];
        let edges = boundary_edges(&strip);
        assert_eq!(edges.len(), 5);

        let mut outgoing = HashMap::new();
        let mut incoming = HashMap::new();
        for &(a, b) in &edges {
            *outgoing.entry(a).or_insert(0) += 1;
            *incoming.entry(b).or_insert(0) += 1;
        }
        for v in 0..5 {
            assert_eq!(outgoing[&v], 1);
            assert_eq!(incoming[&v], 1);
        }
    }

    #[test]
    fn commit_creates_vertices_edges_and_rows() {
        let mut mesh = Mesh::new("m", Isometry3::identity());
        let mut picking = PickingColorAllocator::new();
        let change = mesh
            .commit_polygon(
                &triangle([p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(1.0, 1.0, 0.0)]),
                &mut picking,
            )
            .unwrap();

        assert_eq!(change.created_vertices.len(), 3);
        assert_eq!(change.created_edges.len(), 3);
        assert_eq!(change.created_polygons.len(), 1);
        assert!(change.selected.is_empty());

        assert_eq!(mesh.buffers().row_count(), 3);
        assert_eq!(mesh.buffers().triangles(), &[[0, 1, 2]]);
        assert_eq!(mesh.buffers().lines().len(), 3);
        assert_eq!(mesh.topology().merged_vertices().count(), 3);
        assert_eq!(mesh.topology().merged_edges().count(), 3);

        let poly = mesh.topology().polygon(change.created_polygons[0]).unwrap();
        assert!((poly.normal - Vector3::z()).norm() < TOLERANCE);
        assert!((poly.center - p(2.0 / 3.0, 1.0 / 3.0, 0.0)).norm() < 1e-9);
    }

    #[test]
    fn exhausted_ids_leave_mesh_untouched() {
        use crate::picking::MAX_PICKING_ID;

        let mut mesh = Mesh::new("m", Isometry3::identity());
        // Two vertex ids left; a triangle needs three.
        let mut picking = PickingColorAllocator::with_next([MAX_PICKING_ID - 1, 1, 1]);
        let result = mesh.commit_polygon(
            &triangle([p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(1.0, 1.0, 0.0)]),
            &mut picking,
        );

        assert!(result.is_err());
        assert_eq!(mesh.topology().vertex_count(), 0);
        assert_eq!(mesh.topology().edge_count(), 0);
        assert_eq!(mesh.topology().polygon_count(), 0);
        assert_eq!(mesh.topology().merged_vertices().count(), 0);
        assert_eq!(mesh.buffers().row_count(), 0);
    }

    #[test]
    fn second_polygon_merges_shared_edge() {
        let mut mesh = Mesh::new("m", Isometry3::identity());
        let mut picking = PickingColorAllocator::new();
        let a = p(0.0, 0.0, 0.0);
        let b = p(1.0, 0.0, 0.0);
        let c = p(0.0, 1.0, 0.0);
        let d = p(1.0, 1.0, 0.0);
        mesh.commit_polygon(&triangle([a, b, c]), &mut picking).unwrap();

        let mb = mesh.topology().merged_vertex_at(&b).unwrap();
        let mc = mesh.topology().merged_vertex_at(&c).unwrap();
        let mut second = triangle([c, b, d]);
        second.owned = BTreeMap::from([(0, mc), (1, mb)]);
        mesh.commit_polygon(&second, &mut picking).unwrap();

        assert_eq!(mesh.topology().vertex_count(), 6);
        assert_eq!(mesh.topology().merged_vertices().count(), 4);
        assert_eq!(mesh.topology().merged_vertex(mb).unwrap().len(), 2);
        // b-c is shared: 6 edges in 5 groups.
        assert_eq!(mesh.topology().edge_count(), 6);
        assert_eq!(mesh.topology().merged_edges().count(), 5);
        assert_eq!(mesh.buffers().row_count(), 6);
        mesh.assert_consistent();
    }

    #[test]
    fn joining_a_selected_group_selects_the_new_vertex_once() {
        let mut mesh = Mesh::new("m", Isometry3::identity());
        let mut picking = PickingColorAllocator::new();
        let a = p(0.0, 0.0, 0.0);
        let b = p(1.0, 0.0, 0.0);
        let c = p(0.0, 1.0, 0.0);
        let first = mesh.commit_polygon(&triangle([a, b, c]), &mut picking).unwrap();
        mesh.set_selected(Subobject::Vertex(first.created_vertices[1]), true)
            .unwrap();
        mesh.set_selected(Subobject::Edge(first.created_edges[1]), true)
            .unwrap();

        let mb = mesh.topology().merged_vertex_at(&b).unwrap();
        let mc = mesh.topology().merged_vertex_at(&c).unwrap();
        let mut second = triangle([c, b, p(1.0, 1.0, 0.0)]);
        second.owned = BTreeMap::from([(0, mc), (1, mb)]);
        let change = mesh.commit_polygon(&second, &mut picking).unwrap();

        assert_eq!(change.selected.len(), 2);
        assert_eq!(change.selected[0], SubobjectBatch::Vertices(vec![change.created_vertices[1]]));
        assert_eq!(change.selected[1].len(), 1);
        assert_eq!(mesh.selection().count(PickableType::Vertex), 2);
        assert_eq!(mesh.selection().count(PickableType::Edge), 2);
    }

    #[test]
    fn out_of_range_triangle_is_rejected() {
        let mut mesh = Mesh::new("m", Isometry3::identity());
        let mut picking = PickingColorAllocator::new();
        let mut bad = triangle([p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(1.0, 1.0, 0.0)]);
        bad.triangles = vec![[0, 1, 3]];
        assert!(mesh.commit_polygon(&bad, &mut picking).is_err());
        assert_eq!(mesh.topology().vertex_count(), 0);
    }
}
