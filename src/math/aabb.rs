use super::Point3;

/// An axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner of the bounding box.
    pub min: Point3,
    /// Maximum corner of the bounding box.
    pub max: Point3,
}

impl Aabb {
    /// Box around a single point.
    #[must_use]
    pub fn from_point(point: Point3) -> Self {
        Self {
            min: point,
            max: point,
        }
    }

    /// Smallest box containing all `points`, or `None` if there are none.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point3>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut aabb = Self::from_point(*first);
        for point in iter {
            aabb.include(point);
        }
        Some(aabb)
    }

    /// Grows the box to contain `point`.
    pub fn include(&mut self, point: &Point3) {
        self.min = self.min.inf(point);
        self.max = self.max.sup(point);
    }

    /// Returns `true` if `point` lies inside or on the box.
    #[must_use]
    pub fn contains(&self, point: &Point3) -> bool {
        (0..3).all(|i| point[i] >= self.min[i] && point[i] <= self.max[i])
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn grows_to_fit_points() {
        let points = [
            Point3::new(1.0, -2.0, 0.0),
            Point3::new(-1.0, 3.0, 0.5),
            Point3::new(0.0, 0.0, -4.0),
        ];
        let aabb = Aabb::from_points(&points).unwrap();
        assert_eq!(aabb.min, Point3::new(-1.0, -2.0, -4.0));
        assert_eq!(aabb.max, Point3::new(1.0, 3.0, 0.5));
        assert!(points.iter().all(|p| aabb.contains(p)));
        assert!(!aabb.contains(&Point3::new(2.0, 0.0, 0.0)));
    }

    #[test]
    fn empty_input_has_no_box() {
        assert!(Aabb::from_points(&[]).is_none());
    }
}
