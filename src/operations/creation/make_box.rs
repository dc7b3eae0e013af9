use std::collections::BTreeMap;

use crate::error::{OperationError, Result};
use crate::math::{Point3, Vector3, TOLERANCE};
use crate::mesh::{ChangeSet, Mesh, NewPolygon};
use crate::picking::PickingColorAllocator;

use super::BoxConfig;

/// In-plane axes `(u, v)` of the side facing `+axis`, with `u × v = axis`.
const SIDE_AXES: [(usize, usize); 3] = [(1, 2), (2, 0), (0, 1)];

/// Creates a closed box, one quad polygon per segment cell.
///
/// Cells are committed one by one; coincident corners join the merged
/// vertices of cells committed before them, so seams between cells and
/// sides share merged vertices and merged edges.
pub struct MakeBox {
    config: BoxConfig,
}

impl MakeBox {
    /// Creates a new `MakeBox` operation.
    #[must_use]
    pub fn new(config: BoxConfig) -> Self {
        Self { config }
    }

    /// Executes the operation, committing the box into `mesh`.
    ///
    /// # Errors
    ///
    /// Returns an error if a size is not positive, a segment count is zero,
    /// or picking ids run out.
    pub fn execute(&self, mesh: &mut Mesh, picking: &mut PickingColorAllocator) -> Result<ChangeSet> {
        let BoxConfig { size, segments } = self.config;
        if size.iter().any(|&s| s < TOLERANCE) {
            return Err(OperationError::InvalidInput("box size must be positive".into()).into());
        }
        if (0..3).any(|axis| segments.along(axis) == 0) {
            return Err(
                OperationError::InvalidInput("box needs at least one segment per axis".into())
                    .into(),
            );
        }

        let min = Point3::new(-0.5 * size.x, -0.5 * size.y, 0.0);
        // The same (axis, step) always yields the same float, so seams
        // between sides meet exactly.
        let coord = |axis: usize, step: usize| {
            #[allow(clippy::cast_precision_loss)]
            let t = step as f64 / segments.along(axis) as f64;
            min[axis] + size[axis] * t
        };

        let mut change = ChangeSet::default();
        for axis in 0..3 {
            for sign in [-1.0, 1.0] {
                let (u, v) = if sign > 0.0 {
                    SIDE_AXES[axis]
                } else {
                    let (u, v) = SIDE_AXES[axis];
                    (v, u)
                };
                let level = if sign > 0.0 { segments.along(axis) } else { 0 };
                let mut normal = Vector3::zeros();
                normal[axis] = sign;

                for j in 0..segments.along(v) {
                    for i in 0..segments.along(u) {
                        let corner = |di: usize, dj: usize| {
                            let mut p = Point3::origin();
                            p[axis] = coord(axis, level);
                            p[u] = coord(u, i + di);
                            p[v] = coord(v, j + dj);
                            p
                        };
                        let positions = vec![corner(0, 0), corner(1, 0), corner(1, 1), corner(0, 1)];
                        let owned: BTreeMap<_, _> = positions
                            .iter()
                            .enumerate()
                            .filter_map(|(k, p)| mesh.topology().merged_vertex_at(p).map(|m| (k, m)))
                            .collect();

                        let quad = NewPolygon {
                            positions,
                            triangles: vec![[0, 1, 2], [0, 2, 3]],
                            normal,
                            owned,
                        };
                        change.merge(mesh.commit_polygon(&quad, picking)?);
                    }
                }
            }
        }

        tracing::debug!(
            mesh = mesh.name(),
            polygons = change.created_polygons.len(),
            size = ?size,
            "built box"
        );
        Ok(change)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::math::Isometry3;
    use crate::operations::creation::BoxSegments;
    use crate::operations::query::IsValid;

    fn build(config: BoxConfig) -> Mesh {
        let mut mesh = Mesh::new("box", Isometry3::identity());
        let mut picking = PickingColorAllocator::new();
        MakeBox::new(config).execute(&mut mesh, &mut picking).unwrap();
        mesh
    }

    #[test]
    fn unit_box_counts() {
        let mesh = build(BoxConfig::default());
        let topo = mesh.topology();

        assert_eq!(topo.polygon_count(), 6);
        assert_eq!(topo.vertex_count(), 24);
        assert_eq!(topo.edge_count(), 24);
        assert_eq!(topo.merged_vertices().count(), 8);
        assert_eq!(topo.merged_edges().count(), 12);
        assert_eq!(mesh.buffers().row_count(), 24);
        assert_eq!(mesh.buffers().triangles().len(), 12);
        assert!(IsValid::new().execute(&mesh));
    }

    #[test]
    fn unit_box_is_closed() {
        let mesh = build(BoxConfig::default());
        for (merged, group) in mesh.topology().merged_vertices() {
            assert_eq!(group.len(), 3);
            assert!(!mesh.is_border(merged).unwrap());
        }
        for (_, group) in mesh.topology().merged_edges() {
            assert_eq!(group.len(), 2);
        }
    }

    #[test]
    fn base_is_centered_and_rises_from_zero() {
        let mesh = build(BoxConfig {
            size: Vector3::new(2.0, 4.0, 3.0),
            segments: BoxSegments::default(),
        });
        let bounds = mesh.buffers().bounds().unwrap();
        assert_relative_eq!(bounds.min, Point3::new(-1.0, -2.0, 0.0));
        assert_relative_eq!(bounds.max, Point3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn normals_point_outwards() {
        let mesh = build(BoxConfig::default());
        let topo = mesh.topology();
        let center = Vector3::new(0.0, 0.0, 0.5);
        for &poly in topo.ordered_polygons() {
            let data = topo.polygon(poly).unwrap();
            let outward = data.center.coords - center;
            assert!(data.normal.dot(&outward) > 0.0);
            assert_relative_eq!(data.normal.norm(), 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn segmented_box_merges_seams() {
        let mesh = build(BoxConfig {
            size: Vector3::new(1.0, 1.0, 1.0),
            segments: BoxSegments { x: 2, y: 1, z: 1 },
        });
        let topo = mesh.topology();

        assert_eq!(topo.polygon_count(), 10);
        assert_eq!(topo.vertex_count(), 40);
        assert_eq!(topo.merged_vertices().count(), 12);
        assert_eq!(topo.merged_edges().count(), 20);
        for (merged, _) in topo.merged_vertices() {
            assert!(!mesh.is_border(merged).unwrap());
        }
        assert!(IsValid::new().execute(&mesh));
    }

    #[test]
    fn zero_size_is_rejected() {
        let mut mesh = Mesh::new("box", Isometry3::identity());
        let mut picking = PickingColorAllocator::new();
        let config = BoxConfig {
            size: Vector3::new(1.0, 0.0, 1.0),
            segments: BoxSegments::default(),
        };
        assert!(MakeBox::new(config).execute(&mut mesh, &mut picking).is_err());
        assert_eq!(mesh.topology().vertex_count(), 0);
    }

    #[test]
    fn zero_segments_are_rejected() {
        let mut mesh = Mesh::new("box", Isometry3::identity());
        let mut picking = PickingColorAllocator::new();
        let config = BoxConfig {
            size: Vector3::new(1.0, 1.0, 1.0),
            segments: BoxSegments { x: 1, y: 0, z: 1 },
        };
        assert!(MakeBox::new(config).execute(&mut mesh, &mut picking).is_err());
    }
}
