use std::collections::HashMap;

use crate::math::Point3;

use super::merged::MergedVertexId;

/// Spatial hash from quantized positions to merged vertices.
///
/// Points closer than `tolerance` resolve to the same group; neighbouring
/// cells are searched so points straddling a cell boundary still match.
#[derive(Debug, Clone)]
pub struct PositionIndex {
    tolerance: f64,
    inv_cell: f64,
    cells: HashMap<[i64; 3], Vec<(Point3, MergedVertexId)>>,
}

impl PositionIndex {
    /// Creates an empty index. Non-positive tolerances are clamped to a tiny
    /// positive value.
    #[must_use]
    pub fn new(tolerance: f64) -> Self {
        let tolerance = tolerance.max(1e-12);
        Self {
            tolerance,
            inv_cell: 1.0 / tolerance,
            cells: HashMap::new(),
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn key(&self, point: &Point3) -> [i64; 3] {
        [point.x, point.y, point.z].map(|c| (c * self.inv_cell).floor() as i64)
    }

    /// Indexes `id` at `point`.
    pub fn insert(&mut self, point: Point3, id: MergedVertexId) {
        let key = self.key(&point);
        self.cells.entry(key).or_default().push((point, id));
    }

    /// Removes the entry of `id` at `point`.
    pub fn remove(&mut self, point: &Point3, id: MergedVertexId) {
        let key = self.key(point);
        if let Some(bucket) = self.cells.get_mut(&key) {
            bucket.retain(|(_, entry)| *entry != id);
            if bucket.is_empty() {
                self.cells.remove(&key);
            }
        }
    }

    /// Finds the group closest to `point` within the tolerance.
    #[must_use]
    pub fn find(&self, point: &Point3) -> Option<MergedVertexId> {
        let [kx, ky, kz] = self.key(point);
        let mut best: Option<(f64, MergedVertexId)> = None;

        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    let Some(bucket) = self.cells.get(&[kx + dx, ky + dy, kz + dz]) else {
                        continue;
                    };
                    for (candidate, id) in bucket {
                        let dist = (candidate - point).norm();
                        if dist <= self.tolerance && best.is_none_or(|(d, _)| dist < d) {
                            best = Some((dist, *id));
                        }
                    }
                }
            }
        }

        best.map(|(_, id)| id)
    }

    /// Number of indexed groups.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.values().map(Vec::len).sum()
    }

    /// Returns `true` if nothing is indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use slotmap::SlotMap;

    use super::*;
    use crate::topology::MergedVertex;

    #[test]
    fn finds_points_across_cell_boundaries() {
        let mut groups: SlotMap<MergedVertexId, MergedVertex> = SlotMap::with_key();
        let id = groups.insert(MergedVertex::new(Point3::origin()));
        let mut index = PositionIndex::new(1e-6);
        index.insert(Point3::new(-1e-7, 0.0, 0.0), id);

        assert_eq!(index.find(&Point3::new(1e-7, 0.0, 0.0)), Some(id));
        assert_eq!(index.find(&Point3::new(1e-3, 0.0, 0.0)), None);
    }

    #[test]
    fn prefers_the_closest_group() {
        let mut groups: SlotMap<MergedVertexId, MergedVertex> = SlotMap::with_key();
        let far = groups.insert(MergedVertex::new(Point3::origin()));
        let near = groups.insert(MergedVertex::new(Point3::origin()));
        let mut index = PositionIndex::new(1.0);
        index.insert(Point3::new(0.9, 0.0, 0.0), far);
        index.insert(Point3::new(0.1, 0.0, 0.0), near);

        assert_eq!(index.find(&Point3::origin()), Some(near));
    }

    #[test]
    fn removal_forgets_the_group() {
        let mut groups: SlotMap<MergedVertexId, MergedVertex> = SlotMap::with_key();
        let id = groups.insert(MergedVertex::new(Point3::origin()));
        let mut index = PositionIndex::new(1e-6);
        let point = Point3::new(3.0, 4.0, 5.0);
        index.insert(point, id);
        assert_eq!(index.len(), 1);

        index.remove(&point, id);
        assert!(index.is_empty());
        assert_eq!(index.find(&point), None);
    }
}
