//! Packed vertex buffers of a mesh.
//!
//! A mesh keeps four parallel views of its vertex rows:
//!
//! - `top`: the shaded render buffer (position, normal, polygon picking color),
//! - `vertex`: one point per row, colored with the vertex picking color,
//! - `polygon`: same rows colored with the polygon picking color,
//! - `edge`: every position twice. Row `r` of the first half carries the
//!   color of the edge *starting* at `r`; row `r + row_count` of the second
//!   half carries the color of the edge *ending* at `r`. A line primitive
//!   `[start, end + row_count]` therefore gets a uniform color while the
//!   positions are shared with the other views.
//!
//! Rows are only ever appended or removed from the end; anything else goes
//! through [`GeometryBuffers::compact`], which returns a [`RowRemap`].

mod preview;

pub use preview::PreviewGeometry;

use std::ops::Range;

use crate::math::{Aabb, Point3, Vector3};
use crate::picking::PickingColor;

/// One row's worth of data for [`GeometryBuffers::append_vertices`].
#[derive(Debug, Clone, Copy)]
pub struct RowData {
    pub position: Point3,
    pub normal: Vector3,
    pub vertex_color: PickingColor,
    pub polygon_color: PickingColor,
}

/// An edge to pack into the edge buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeRow {
    pub start: usize,
    pub end: usize,
    pub color: PickingColor,
}

/// Columns of one buffer view.
#[derive(Debug, Clone, Default)]
pub struct VertexArray {
    pub positions: Vec<Point3>,
    /// Only filled for the shaded view.
    pub normals: Vec<Vector3>,
    pub colors: Vec<PickingColor>,
}

impl VertexArray {
    /// Number of rows in this view.
    #[must_use]
    pub fn rows(&self) -> usize {
        self.positions.len()
    }

    fn truncate(&mut self, rows: usize) {
        self.positions.truncate(rows);
        self.normals.truncate(rows);
        self.colors.truncate(rows);
    }
}

/// Old row → new row mapping produced by [`GeometryBuffers::compact`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowRemap {
    map: Vec<Option<usize>>,
}

impl RowRemap {
    /// New row of `old`, or `None` if the row was dropped.
    #[must_use]
    pub fn get(&self, old: usize) -> Option<usize> {
        self.map.get(old).copied().flatten()
    }

    /// Number of rows kept.
    #[must_use]
    pub fn kept(&self) -> usize {
        self.map.iter().flatten().count()
    }
}

/// The four parallel views plus their index primitives.
#[derive(Debug, Clone, Default)]
pub struct GeometryBuffers {
    row_count: usize,
    top: VertexArray,
    vertex: VertexArray,
    polygon: VertexArray,
    edge: VertexArray,
    triangles: Vec<[usize; 3]>,
    lines: Vec<[usize; 2]>,
    points: Vec<usize>,
    bounds: Option<Aabb>,
}

impl GeometryBuffers {
    /// Creates empty buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of vertex rows; the edge view holds twice as many.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// Shaded view: positions, normals and vertex colors.
    #[must_use]
    pub fn top(&self) -> &VertexArray {
        &self.top
    }

    /// Vertex picking view.
    #[must_use]
    pub fn vertex_view(&self) -> &VertexArray {
        &self.vertex
    }

    /// Polygon picking view.
    #[must_use]
    pub fn polygon_view(&self) -> &VertexArray {
        &self.polygon
    }

    /// Edge picking view, two rows per vertex.
    #[must_use]
    pub fn edge_view(&self) -> &VertexArray {
        &self.edge
    }

    /// Triangle primitive shared by the shaded and polygon views.
    #[must_use]
    pub fn triangles(&self) -> &[[usize; 3]] {
        &self.triangles
    }

    /// Line primitive of the edge view (`[start, end + row_count]`).
    #[must_use]
    pub fn lines(&self) -> &[[usize; 2]] {
        &self.lines
    }

    /// Point primitive of the vertex view.
    #[must_use]
    pub fn points(&self) -> &[usize] {
        &self.points
    }

    /// Bounding-volume hint for the owning node.
    #[must_use]
    pub fn bounds(&self) -> Option<Aabb> {
        self.bounds
    }

    /// Appends `rows` to every view and returns the new, contiguous row
    /// range. Rows issued earlier keep their indices.
    pub fn append_vertices(&mut self, rows: &[RowData]) -> Range<usize> {
        let old = self.row_count;
        let new = old + rows.len();

        for row in rows {
            self.top.positions.push(row.position);
            self.top.normals.push(row.normal);
            self.top.colors.push(row.polygon_color);
            self.vertex.positions.push(row.position);
            self.vertex.colors.push(row.vertex_color);
            self.polygon.positions.push(row.position);
            self.polygon.colors.push(row.polygon_color);
        }
        self.points.extend(old..new);

        self.resize_edge_view(old, new);
        self.row_count = new;

        for row in rows {
            match &mut self.bounds {
                Some(aabb) => aabb.include(&row.position),
                None => self.bounds = Some(Aabb::from_point(row.position)),
            }
        }

        tracing::trace!(old, new, "appended buffer rows");
        self.check();
        old..new
    }

    /// Appends triangles given in row indices.
    pub fn append_triangles(&mut self, triangles: &[[usize; 3]]) {
        assert!(
            triangles.iter().flatten().all(|&r| r < self.row_count),
            "triangle references a row past the end of the buffers"
        );
        self.triangles.extend_from_slice(triangles);
    }

    /// Drops the last `count` rows from every view, along with any primitive
    /// that referenced them.
    pub fn remove_trailing_rows(&mut self, count: usize) {
        let old = self.row_count;
        let new = old.saturating_sub(count);

        self.top.truncate(new);
        self.vertex.truncate(new);
        self.polygon.truncate(new);
        self.triangles.retain(|tri| tri.iter().all(|&r| r < new));
        self.points.retain(|&r| r < new);
        self.lines.retain(|&[s, e]| s < new && e - old < new);

        self.resize_edge_view(old, new);
        self.row_count = new;
        self.bounds = Aabb::from_points(&self.top.positions);
        self.check();
    }

    /// Repacks the edge view from `edges`, in order.
    ///
    /// An edge whose start row already starts another edge, or whose end row
    /// already ends one, is packed reversed. The returned flags mark those
    /// edges so the caller can reverse its own record.
    ///
    /// # Panics
    ///
    /// Panics if an edge collides in both directions, or references a row
    /// past the end of the buffers. Both mean the topology is corrupt.
    pub fn rebuild_edge_buffer(&mut self, edges: impl IntoIterator<Item = EdgeRow>) -> Vec<bool> {
        let rows = self.row_count;
        self.edge.colors.clear();
        self.edge.colors.resize(rows * 2, PickingColor::NONE);
        self.lines.clear();

        let mut starts = vec![false; rows];
        let mut ends = vec![false; rows];
        let mut swapped = Vec::new();

        for EdgeRow { start, end, color } in edges {
            assert!(start < rows && end < rows, "edge references a missing row");

            let (start, end, swap) = if starts[start] || ends[end] {
                (end, start, true)
            } else {
                (start, end, false)
            };
            assert!(
                !starts[start] && !ends[end],
                "edge rows {start}/{end} collide in the packed edge buffer"
            );

            starts[start] = true;
            ends[end] = true;
            self.edge.colors[start] = color;
            self.edge.colors[end + rows] = color;
            self.lines.push([start, end + rows]);
            swapped.push(swap);
        }

        swapped
    }

    /// Keeps only the rows with `keep[row] == true`, preserving their order.
    ///
    /// Triangles and points are remapped; triangles touching a dropped row
    /// are dropped. The edge view is cleared and must be rebuilt with
    /// [`GeometryBuffers::rebuild_edge_buffer`].
    ///
    /// # Panics
    ///
    /// Panics if `keep` does not have one entry per row.
    pub fn compact(&mut self, keep: &[bool]) -> RowRemap {
        assert_eq!(keep.len(), self.row_count, "keep mask must cover every row");

        let mut next = 0;
        let map: Vec<Option<usize>> = keep
            .iter()
            .map(|&k| {
                k.then(|| {
                    next += 1;
                    next - 1
                })
            })
            .collect();
        let remap = RowRemap { map };

        for view in [&mut self.top, &mut self.vertex, &mut self.polygon] {
            let positions = std::mem::take(&mut view.positions);
            let normals = std::mem::take(&mut view.normals);
            let colors = std::mem::take(&mut view.colors);
            view.positions = retain_rows(positions, keep);
            view.normals = if normals.is_empty() {
                normals
            } else {
                retain_rows(normals, keep)
            };
            view.colors = retain_rows(colors, keep);
        }

        self.triangles = self
            .triangles
            .iter()
            .filter_map(|tri| {
                let [a, b, c] = tri.map(|r| remap.get(r));
                Some([a?, b?, c?])
            })
            .collect();
        self.points = (0..next).collect();

        self.row_count = next;
        self.edge.positions = self.doubled_positions();
        self.edge.colors = vec![PickingColor::NONE; next * 2];
        self.lines.clear();
        self.bounds = Aabb::from_points(&self.top.positions);

        self.check();
        remap
    }

    /// Asserts that every view holds exactly `vertex_count` rows.
    ///
    /// # Panics
    ///
    /// Panics on any mismatch; the buffers and the topology have diverged.
    pub fn assert_rows(&self, vertex_count: usize) {
        assert_eq!(
            self.row_count, vertex_count,
            "buffer rows out of sync with vertex count"
        );
        self.check();
    }

    fn check(&self) {
        let rows = self.row_count;
        for (name, view) in [
            ("top", &self.top),
            ("vertex", &self.vertex),
            ("polygon", &self.polygon),
        ] {
            assert_eq!(view.positions.len(), rows, "{name} positions out of sync");
            assert_eq!(view.colors.len(), rows, "{name} colors out of sync");
        }
        assert_eq!(self.top.normals.len(), rows, "top normals out of sync");
        assert_eq!(self.edge.positions.len(), rows * 2, "edge positions out of sync");
        assert_eq!(self.edge.colors.len(), rows * 2, "edge colors out of sync");
    }

    fn doubled_positions(&self) -> Vec<Point3> {
        let mut doubled = Vec::with_capacity(self.top.positions.len() * 2);
        doubled.extend_from_slice(&self.top.positions);
        doubled.extend_from_slice(&self.top.positions);
        doubled
    }

    /// Re-splits the edge view from `old` to `new` rows per half, keeping the
    /// colors of surviving rows and re-offsetting the line end indices.
    fn resize_edge_view(&mut self, old: usize, new: usize) {
        let kept = old.min(new);
        let colors = std::mem::take(&mut self.edge.colors);
        let mut resized = vec![PickingColor::NONE; new * 2];
        resized[..kept].copy_from_slice(&colors[..kept]);
        resized[new..new + kept].copy_from_slice(&colors[old..old + kept]);
        self.edge.colors = resized;

        for line in &mut self.lines {
            line[1] = line[1] - old + new;
        }

        self.edge.positions = self.doubled_positions();
    }
}

fn retain_rows<T>(items: Vec<T>, keep: &[bool]) -> Vec<T> {
    items
        .into_iter()
        .zip(keep)
        .filter_map(|(item, &k)| k.then_some(item))
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::picking::PickableType;

    fn row(x: f64, id: u32) -> RowData {
        RowData {
            position: Point3::new(x, 0.0, 0.0),
            normal: Vector3::z(),
            vertex_color: PickingColor::encode(PickableType::Vertex, id),
            polygon_color: PickingColor::encode(PickableType::Polygon, 1),
        }
    }

    fn edge(start: usize, end: usize, id: u32) -> EdgeRow {
        EdgeRow {
            start,
            end,
            color: PickingColor::encode(PickableType::Edge, id),
        }
    }

    fn triangle_buffers() -> GeometryBuffers {
        let mut buffers = GeometryBuffers::new();
        buffers.append_vertices(&[row(0.0, 1), row(1.0, 2), row(2.0, 3)]);
        buffers.append_triangles(&[[0, 1, 2]]);
        buffers.rebuild_edge_buffer([edge(0, 1, 1), edge(1, 2, 2), edge(2, 0, 3)]);
        buffers
    }

    #[test]
    fn appended_rows_are_contiguous_and_stable() {
        let mut buffers = triangle_buffers();
        let first_color = buffers.vertex_view().colors[1];

        let range = buffers.append_vertices(&[row(5.0, 4), row(6.0, 5)]);
        assert_eq!(range, 3..5);
        assert_eq!(buffers.row_count(), 5);
        assert_eq!(buffers.vertex_view().colors[1], first_color);
        assert_eq!(buffers.top().positions[4], Point3::new(6.0, 0.0, 0.0));
        assert_eq!(buffers.points(), &[0, 1, 2, 3, 4]);
        buffers.assert_rows(5);
    }

    #[test]
    fn edge_packing_offsets_end_rows() {
        let buffers = triangle_buffers();
        assert_eq!(buffers.lines(), &[[0, 4], [1, 5], [2, 3]]);

        let colors = &buffers.edge_view().colors;
        let c1 = PickingColor::encode(PickableType::Edge, 1);
        assert_eq!(colors[0], c1);
        assert_eq!(colors[1 + 3], c1);
        assert_eq!(buffers.edge_view().positions.len(), 6);
    }

    #[test]
    fn append_keeps_lines_pointing_at_end_rows() {
        let mut buffers = triangle_buffers();
        buffers.append_vertices(&[row(9.0, 4)]);
        assert_eq!(buffers.lines(), &[[0, 5], [1, 6], [2, 4]]);

        let c1 = PickingColor::encode(PickableType::Edge, 1);
        assert_eq!(buffers.edge_view().colors[1 + 4], c1);
        for [s, e] in buffers.lines() {
            let color = buffers.edge_view().colors[*s];
            assert_eq!(buffers.edge_view().colors[*e], color);
        }
    }

    #[test]
    fn colliding_edge_is_packed_reversed() {
        let mut buffers = GeometryBuffers::new();
        buffers.append_vertices(&[row(0.0, 1), row(1.0, 2), row(2.0, 3)]);
        // 0->1 then 0->2 would start twice at row 0.
        let swapped = buffers.rebuild_edge_buffer([edge(0, 1, 1), edge(0, 2, 2), edge(1, 2, 3)]);
        assert_eq!(swapped, vec![false, true, false]);
        assert_eq!(buffers.lines()[1], [2, 3]);
    }

    #[test]
    #[should_panic(expected = "collide")]
    fn double_collision_is_fatal() {
        let mut buffers = GeometryBuffers::new();
        buffers.append_vertices(&[row(0.0, 1), row(1.0, 2)]);
        buffers.rebuild_edge_buffer([edge(0, 1, 1), edge(1, 0, 2), edge(0, 1, 3)]);
    }

    #[test]
    fn removing_trailing_rows_restores_previous_state() {
        let mut buffers = triangle_buffers();
        let before_lines = buffers.lines().to_vec();
        let before_colors = buffers.edge_view().colors.clone();

        buffers.append_vertices(&[row(5.0, 4), row(6.0, 5)]);
        buffers.append_triangles(&[[2, 3, 4]]);
        buffers.remove_trailing_rows(2);

        assert_eq!(buffers.row_count(), 3);
        assert_eq!(buffers.triangles(), &[[0, 1, 2]]);
        assert_eq!(buffers.lines(), before_lines.as_slice());
        assert_eq!(buffers.edge_view().colors, before_colors);
        assert_eq!(buffers.bounds().unwrap().max, Point3::new(2.0, 0.0, 0.0));
    }

    #[test]
    fn compaction_remaps_rows() {
        let mut buffers = GeometryBuffers::new();
        buffers.append_vertices(&[row(0.0, 1), row(1.0, 2), row(2.0, 3), row(3.0, 4)]);
        buffers.append_triangles(&[[0, 1, 2], [1, 2, 3]]);

        let remap = buffers.compact(&[false, true, true, true]);
        assert_eq!(remap.get(0), None);
        assert_eq!(remap.get(3), Some(2));
        assert_eq!(remap.kept(), 3);
        assert_eq!(buffers.triangles(), &[[0, 1, 2]]);
        assert_eq!(buffers.top().positions[0], Point3::new(1.0, 0.0, 0.0));
        assert!(buffers.lines().is_empty());
        buffers.assert_rows(3);
    }

    #[test]
    fn bounds_follow_appends() {
        let mut buffers = GeometryBuffers::new();
        assert!(buffers.bounds().is_none());
        buffers.append_vertices(&[row(-1.0, 1), row(4.0, 2)]);
        let aabb = buffers.bounds().unwrap();
        assert_eq!(aabb.min.x, -1.0);
        assert_eq!(aabb.max.x, 4.0);
    }
}
