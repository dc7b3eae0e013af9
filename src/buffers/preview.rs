use crate::math::{Point3, Vector3};

/// Render-only geometry of a polygon that is still being drawn.
///
/// Holds a point cloud for freestanding new vertices, a line list for the
/// triangulation edges and a triangle list with one row per committed
/// vertex plus one trailing row that follows the cursor.
#[derive(Debug, Clone, Default)]
pub struct PreviewGeometry {
    points: Vec<Point3>,
    point_colors: Vec<[f32; 4]>,
    line_positions: Vec<Point3>,
    line_colors: Vec<[f32; 4]>,
    tri_positions: Vec<Point3>,
    tri_normals: Vec<Vector3>,
    triangles: Vec<[usize; 3]>,
}

impl PreviewGeometry {
    /// Creates the preview with the single cursor row at the origin.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tri_positions: vec![Point3::origin()],
            tri_normals: vec![Vector3::zeros()],
            ..Self::default()
        }
    }

    /// Positions of the freestanding pending vertices.
    #[must_use]
    pub fn points(&self) -> &[Point3] {
        &self.points
    }

    /// Colors of the pending vertices, parallel to [`PreviewGeometry::points`].
    #[must_use]
    pub fn point_colors(&self) -> &[[f32; 4]] {
        &self.point_colors
    }

    /// Line list vertex positions, two per segment.
    #[must_use]
    pub fn line_positions(&self) -> &[Point3] {
        &self.line_positions
    }

    /// Line list vertex colors, parallel to the positions.
    #[must_use]
    pub fn line_colors(&self) -> &[[f32; 4]] {
        &self.line_colors
    }

    /// Triangle rows: one per committed vertex plus the cursor row.
    #[must_use]
    pub fn tri_positions(&self) -> &[Point3] {
        &self.tri_positions
    }

    /// Shading normals of the triangle rows.
    #[must_use]
    pub fn tri_normals(&self) -> &[Vector3] {
        &self.tri_normals
    }

    /// Triangles as rendered, i.e. reversed while the normal is flipped.
    #[must_use]
    pub fn triangles(&self) -> &[[usize; 3]] {
        &self.triangles
    }

    // --- point cloud ---

    /// Adds a pending vertex drawn in `color`.
    pub fn push_point(&mut self, point: Point3, color: [f32; 4]) {
        self.points.push(point);
        self.point_colors.push(color);
    }

    /// Drops the most recent pending vertex.
    pub fn pop_point(&mut self) {
        self.points.pop();
        self.point_colors.pop();
    }

    // --- line list ---

    /// Appends a segment; returns the row of its first vertex.
    pub fn push_segment(&mut self, from: Point3, to: Point3, color: [f32; 4]) -> usize {
        let row = self.line_positions.len();
        self.line_positions.extend([from, to]);
        self.line_colors.extend([color, color]);
        row
    }

    /// Number of line list vertices.
    #[must_use]
    pub fn line_rows(&self) -> usize {
        self.line_positions.len()
    }

    /// Keeps the first `rows` line list vertices.
    pub fn truncate_lines(&mut self, rows: usize) {
        self.line_positions.truncate(rows);
        self.line_colors.truncate(rows);
    }

    /// Moves one line list vertex; out-of-range rows are ignored.
    pub fn set_line_position(&mut self, row: usize, point: Point3) {
        if let Some(slot) = self.line_positions.get_mut(row) {
            *slot = point;
        }
    }

    /// Colors both vertices of the segment starting at `row`.
    pub fn set_segment_color(&mut self, row: usize, color: [f32; 4]) {
        for slot in self.line_colors.iter_mut().skip(row).take(2) {
            *slot = color;
        }
    }

    /// Color of the line list vertex at `row`.
    #[must_use]
    pub fn segment_color(&self, row: usize) -> Option<[f32; 4]> {
        self.line_colors.get(row).copied()
    }

    // --- triangle list ---

    /// Writes the committed row `row` and appends a fresh cursor row after it.
    pub fn commit_row(&mut self, row: usize, point: Point3) {
        self.tri_positions.truncate(row);
        self.tri_normals.truncate(row);
        self.tri_positions.extend([point, point]);
        self.tri_normals.extend([Vector3::zeros(), Vector3::zeros()]);
    }

    /// Keeps the first `rows` triangle rows.
    pub fn truncate_rows(&mut self, rows: usize) {
        self.tri_positions.truncate(rows);
        self.tri_normals.truncate(rows);
    }

    /// Moves a triangle row; out-of-range rows are ignored.
    pub fn set_row_position(&mut self, row: usize, point: Point3) {
        if let Some(slot) = self.tri_positions.get_mut(row) {
            *slot = point;
        }
    }

    /// Sets the shading normal of a triangle row.
    pub fn set_row_normal(&mut self, row: usize, normal: Vector3) {
        if let Some(slot) = self.tri_normals.get_mut(row) {
            *slot = normal;
        }
    }

    /// Appends a triangle in rendered winding.
    pub fn push_triangle(&mut self, triangle: [usize; 3]) {
        self.triangles.push(triangle);
    }

    /// Drops the most recent triangle.
    pub fn pop_triangle(&mut self) {
        self.triangles.pop();
    }

    /// Drops every triangle.
    pub fn clear_triangles(&mut self) {
        self.triangles.clear();
    }

    /// Reverses the winding of every triangle and negates every normal.
    pub fn flip(&mut self) {
        for tri in &mut self.triangles {
            tri.reverse();
        }
        for normal in &mut self.tri_normals {
            *normal = -*normal;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn committing_rows_keeps_one_cursor_row() {
        let mut preview = PreviewGeometry::new();
        preview.commit_row(0, Point3::new(1.0, 0.0, 0.0));
        preview.commit_row(1, Point3::new(2.0, 0.0, 0.0));
        assert_eq!(preview.tri_positions().len(), 3);
        assert_eq!(preview.tri_positions()[2], Point3::new(2.0, 0.0, 0.0));
    }

    #[test]
    fn flipping_twice_is_identity() {
        let mut preview = PreviewGeometry::new();
        preview.commit_row(0, Point3::origin());
        preview.set_row_normal(0, Vector3::z());
        preview.push_triangle([0, 1, 2]);

        preview.flip();
        assert_eq!(preview.triangles(), &[[2, 1, 0]]);
        assert_eq!(preview.tri_normals()[0], -Vector3::z());

        preview.flip();
        assert_eq!(preview.triangles(), &[[0, 1, 2]]);
        assert_eq!(preview.tri_normals()[0], Vector3::z());
    }

    #[test]
    fn points_carry_their_color() {
        let mut preview = PreviewGeometry::new();
        preview.push_point(Point3::origin(), [1.0, 0.0, 0.0, 1.0]);
        preview.push_point(Point3::new(1.0, 0.0, 0.0), [0.0, 1.0, 0.0, 1.0]);
        assert_eq!(preview.point_colors().len(), 2);

        preview.pop_point();
        assert_eq!(preview.points().len(), 1);
        assert_eq!(preview.point_colors(), &[[1.0, 0.0, 0.0, 1.0]]);
    }

    #[test]
    fn segments_recolor_and_truncate() {
        let mut preview = PreviewGeometry::new();
        let row = preview.push_segment(Point3::origin(), Point3::origin(), [1.0; 4]);
        preview.push_segment(Point3::origin(), Point3::origin(), [0.5; 4]);
        preview.set_segment_color(row, [0.0; 4]);
        assert_eq!(preview.line_colors()[..2], [[0.0; 4], [0.0; 4]]);
        assert_eq!(preview.segment_color(2), Some([0.5; 4]));

        preview.truncate_lines(2);
        assert_eq!(preview.line_rows(), 2);
    }
}
