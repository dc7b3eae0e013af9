use std::collections::BTreeMap;

use crate::buffers::PreviewGeometry;
use crate::error::{CreationError, Result, TopologyError};
use crate::math::{triangle_normal, Plane, Point3, Vector3, TOLERANCE};
use crate::mesh::{ChangeSet, Mesh, NewPolygon};
use crate::picking::PickingColorAllocator;
use crate::topology::MergedVertexId;

use super::CreationSettings;

/// Where a clicked candidate vertex comes from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NewVertex {
    /// A world-space point on the construction grid.
    Grid(Point3),
    /// An existing merged vertex of the mesh being edited.
    Existing(MergedVertexId),
    /// A world-space vertex position picked on another mesh; never merges.
    Foreign(Point3),
}

/// A polygon being drawn vertex by vertex.
///
/// Committed candidates are indexed `0..n`; index `n` is the live vertex that
/// follows the cursor. `triangles` always ends with the live triangle, which
/// is dropped when the polygon is finalized.
#[derive(Debug, Clone)]
pub struct CreationSession {
    settings: CreationSettings,
    positions: Vec<Point3>,
    triangles: Vec<[usize; 3]>,
    /// Running sums of unnormalized triangle normals, one per committed triangle.
    normals: Vec<Vector3>,
    /// `(start, start_prev)` as they were before each add.
    shared_verts: Vec<(usize, usize)>,
    owned: BTreeMap<usize, MergedVertexId>,
    /// Candidates that have a row in the pending-vertex point cloud.
    point_rows: Vec<usize>,
    start_index: usize,
    start_index_prev: usize,
    flipped: bool,
    preview: PreviewGeometry,
}

impl CreationSession {
    /// Starts a polygon at `first`.
    ///
    /// # Errors
    ///
    /// Returns an error if `first` names a merged vertex `mesh` doesn't have.
    pub fn start(mesh: &Mesh, first: NewVertex, settings: CreationSettings) -> Result<Self> {
        let mut session = Self {
            settings,
            positions: Vec::new(),
            triangles: vec![[0, 1, 2]],
            normals: vec![Vector3::zeros()],
            shared_verts: Vec::new(),
            owned: BTreeMap::new(),
            point_rows: Vec::new(),
            start_index: 0,
            start_index_prev: 0,
            flipped: false,
            preview: PreviewGeometry::new(),
        };
        session.add_vertex(mesh, first)?;
        tracing::debug!(mesh = mesh.name(), "started polygon creation");
        Ok(session)
    }

    /// Number of committed candidate vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Committed candidate positions, mesh-local.
    #[must_use]
    pub fn positions(&self) -> &[Point3] {
        &self.positions
    }

    /// Committed triangles in unflipped winding; excludes the live triangle.
    #[must_use]
    pub fn triangles(&self) -> &[[usize; 3]] {
        &self.triangles[..self.triangles.len() - 1]
    }

    /// Pivot of the next triangle.
    #[must_use]
    pub fn start_index(&self) -> usize {
        self.start_index
    }

    /// The other end of the live triangle's committed edge.
    #[must_use]
    pub fn start_index_prev(&self) -> usize {
        self.start_index_prev
    }

    /// Returns `true` if the winding will be reversed on commit.
    #[must_use]
    pub fn is_flipped(&self) -> bool {
        self.flipped
    }

    /// Candidates that will join an existing merged vertex.
    #[must_use]
    pub fn owned(&self) -> &BTreeMap<usize, MergedVertexId> {
        &self.owned
    }

    /// Temporary geometry drawn while the polygon is open.
    #[must_use]
    pub fn preview(&self) -> &PreviewGeometry {
        &self.preview
    }

    /// Unit normal the polygon would get if finalized now; zero while the
    /// committed triangles have no area.
    #[must_use]
    pub fn normal(&self) -> Vector3 {
        let sum = self.normals.last().copied().unwrap_or_else(Vector3::zeros);
        self.oriented(sum.try_normalize(TOLERANCE).unwrap_or_else(Vector3::zeros))
    }

    /// Commits `vertex` as the next candidate and returns its index.
    ///
    /// # Errors
    ///
    /// Returns an error if `vertex` names a merged vertex `mesh` doesn't
    /// have. The session is unchanged in that case.
    pub fn add_vertex(&mut self, mesh: &Mesh, vertex: NewVertex) -> Result<usize> {
        let (pos, owned, has_point) = resolve(mesh, vertex)?;
        let n = self.positions.len();

        let next = if n > 1 {
            let prev = self.triangles[self.triangles.len() - 1];
            Some((prev, next_triangle(prev, self.start_index, n)?))
        } else {
            None
        };

        if let Some(merged) = owned {
            self.owned.insert(n, merged);
        }
        if has_point {
            self.preview.push_point(pos, self.settings.pending_vertex_color);
            self.point_rows.push(n);
        }
        self.positions.push(pos);
        self.preview.commit_row(n, pos);

        if n >= 1 {
            self.shared_verts.push((self.start_index, self.start_index_prev));
        }
        if n == 1 {
            self.push_preview_triangle([0, 1, 2]);
        }
        if let Some((prev, tri)) = next {
            self.triangles.push(tri);
            self.push_preview_triangle(tri);

            let [a, b, c] = prev.map(|i| self.positions[i]);
            let sum = triangle_normal(&a, &b, &c)
                + self.normals.last().copied().unwrap_or_else(Vector3::zeros);
            self.normals.push(sum);

            let normal = self.normal();
            for row in 0..n {
                self.preview.set_row_normal(row, normal);
            }
        }

        if n == 0 {
            self.preview.push_segment(pos, pos, self.settings.other_edge_color);
        } else {
            let pivot = self.positions[self.start_index];
            self.preview
                .push_segment(pivot, pos, self.settings.pivot_edge_color);
            self.preview.push_segment(pos, pos, self.settings.other_edge_color);
            self.start_index_prev = n;
        }

        tracing::debug!(
            index = n,
            start = self.start_index,
            owned = owned.is_some(),
            "added polygon vertex"
        );
        Ok(n)
    }

    /// Undoes the most recent [`CreationSession::add_vertex`].
    ///
    /// # Errors
    ///
    /// Returns [`CreationError::NoVerticesRemain`] when only the first vertex
    /// is left; the caller should cancel instead.
    pub fn remove_last_vertex(&mut self) -> std::result::Result<(), CreationError> {
        let last = self.positions.len().saturating_sub(1);
        if last == 0 {
            return Err(CreationError::NoVerticesRemain);
        }

        if last > 1 {
            self.normals.pop();
        }
        self.positions.pop();
        if self.point_rows.last() == Some(&last) {
            self.point_rows.pop();
            self.preview.pop_point();
        }
        self.owned.remove(&last);

        self.preview.truncate_rows(last + 1);
        if last > 1 {
            self.triangles.pop();
            self.preview.pop_triangle();
        } else {
            self.preview.clear_triangles();
        }

        if let Some((start, prev)) = self.shared_verts.pop() {
            self.start_index = start;
            self.start_index_prev = prev;
        }
        self.preview
            .truncate_lines(self.preview.line_rows().saturating_sub(4));

        tracing::debug!(index = last, start = self.start_index, "removed polygon vertex");
        Ok(())
    }

    /// Picks the other vertex of the live triangle's committed edge as the
    /// pivot of the next triangle, i.e. turns the diagonal of the current quad.
    pub fn switch_start_vertex(&mut self) {
        let last = self.positions.len().saturating_sub(1);
        if last == 0 {
            return;
        }

        if self.start_index == last {
            std::mem::swap(&mut self.start_index, &mut self.start_index_prev);
        } else {
            self.start_index_prev = self.start_index;
            self.start_index = last;
        }

        let row = self.preview.line_rows().saturating_sub(4);
        let (first, second) =
            if self.preview.segment_color(row) == Some(self.settings.other_edge_color) {
                (self.settings.pivot_edge_color, self.settings.other_edge_color)
            } else {
                (self.settings.other_edge_color, self.settings.pivot_edge_color)
            };
        self.preview.set_segment_color(row, first);
        self.preview.set_segment_color(row + 2, second);

        tracing::debug!(
            start = self.start_index,
            start_prev = self.start_index_prev,
            "switched start vertex"
        );
    }

    /// Inverts the winding and normal of the polygon. Needs two vertices.
    pub fn flip_normal(&mut self) {
        if self.positions.len() < 2 {
            return;
        }
        self.flipped = !self.flipped;
        self.preview.flip();
        tracing::debug!(flipped = self.flipped, "flipped polygon normal");
    }

    /// Moves the live vertex to the world-space `point`.
    pub fn update(&mut self, mesh: &Mesh, point: Point3) {
        let pos = mesh.to_local(&point);
        let last = self.positions.len().saturating_sub(1);

        if last > 0 {
            self.preview.set_row_position(last + 1, pos);

            if last == 1 {
                let tri = self.triangles[self.triangles.len() - 1];
                let (a, b) = (self.positions[tri[0]], self.positions[tri[1]]);
                if let Some(plane) = Plane::from_points(&a, &b, &pos) {
                    let normal = self.oriented(*plane.normal());
                    for row in tri {
                        self.preview.set_row_normal(row, normal);
                    }
                }
            }
        }

        let rows = self.preview.line_rows();
        self.preview.set_line_position(rows.saturating_sub(1), pos);
        if last > 0 {
            self.preview.set_line_position(rows.saturating_sub(3), pos);
        }
    }

    /// The polygon as it would be committed now.
    ///
    /// # Errors
    ///
    /// Returns [`CreationError::TooFewVertices`] below three vertices.
    pub fn to_polygon(&self) -> std::result::Result<NewPolygon, CreationError> {
        let count = self.positions.len();
        if count < 3 {
            return Err(CreationError::TooFewVertices { count });
        }

        let triangles = self
            .triangles()
            .iter()
            .map(|&tri| {
                if self.flipped {
                    [tri[2], tri[1], tri[0]]
                } else {
                    tri
                }
            })
            .collect();

        Ok(NewPolygon {
            positions: self.positions.clone(),
            triangles,
            normal: self.normal(),
            owned: self.owned.clone(),
        })
    }

    /// Commits the polygon into `mesh`.
    ///
    /// With fewer than three vertices nothing happens and the session stays
    /// usable; otherwise the caller drops the session afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`CreationError::TooFewVertices`] below three vertices, or any
    /// error raised while committing.
    pub fn finalize(
        &mut self,
        mesh: &mut Mesh,
        picking: &mut PickingColorAllocator,
    ) -> Result<ChangeSet> {
        let polygon = self.to_polygon()?;
        let change = mesh.commit_polygon(&polygon, picking)?;
        tracing::debug!(
            vertices = polygon.positions.len(),
            triangles = polygon.triangles.len(),
            flipped = self.flipped,
            "finalized polygon creation"
        );
        Ok(change)
    }

    /// Drops the polygon without touching the mesh.
    pub fn cancel(self) {
        tracing::debug!(vertices = self.positions.len(), "cancelled polygon creation");
    }

    fn oriented(&self, normal: Vector3) -> Vector3 {
        if self.flipped {
            -normal
        } else {
            normal
        }
    }

    fn push_preview_triangle(&mut self, tri: [usize; 3]) {
        if self.flipped {
            self.preview.push_triangle([tri[2], tri[1], tri[0]]);
        } else {
            self.preview.push_triangle(tri);
        }
    }
}

/// Position, ownership and point-cloud membership of a new candidate.
fn resolve(mesh: &Mesh, vertex: NewVertex) -> Result<(Point3, Option<MergedVertexId>, bool)> {
    Ok(match vertex {
        NewVertex::Grid(point) => (mesh.to_local(&point), None, true),
        NewVertex::Existing(merged) => {
            let pos = mesh.merged_vertex_point(merged)?;
            let owned = mesh.is_border(merged)?.then_some(merged);
            (pos, owned, false)
        }
        NewVertex::Foreign(point) => (mesh.to_local(&point), None, false),
    })
}

/// Triangle built on the edge `pivot`-`newest` of `prev`, opposite to it.
///
/// The shared edge runs the other way than in `prev`. Adjacent list
/// positions are reversed; the wrapping pair of a 3-element list is
/// already reversed.
fn next_triangle(prev: [usize; 3], pivot: usize, newest: usize) -> Result<[usize; 3]> {
    let find = |index: usize| {
        prev.iter().position(|&i| i == index).ok_or_else(|| {
            TopologyError::InvalidTopology(format!("vertex {index} is not on the live triangle"))
        })
    };
    let (i1, i2) = (find(pivot)?, find(newest)?);
    let (lo, hi) = (i1.min(i2), i1.max(i2));

    Ok(if hi - lo == 1 {
        [prev[hi], prev[lo], newest + 1]
    } else {
        [prev[lo], prev[hi], newest + 1]
    })
}
