use super::{Point3, Vector3, TOLERANCE};

/// An infinite plane through `origin` with unit `normal`.
#[derive(Debug, Clone)]
pub struct Plane {
    origin: Point3,
    normal: Vector3,
}

/// Relationship of a line with a plane.
#[derive(Debug)]
pub enum LinePlaneRelation {
    /// Line intersects the plane at a single point.
    Point { point: Point3, t: f64 },
    /// Line is parallel to the plane (does not intersect).
    Parallel,
    /// Line lies entirely on the plane.
    OnPlane,
}

impl Plane {
    /// Creates a plane from an origin and a normal vector.
    ///
    /// Returns `None` if the normal is zero-length.
    #[must_use]
    pub fn from_normal(origin: Point3, normal: Vector3) -> Option<Self> {
        let len = normal.norm();
        if len < TOLERANCE {
            return None;
        }
        Some(Self {
            origin,
            normal: normal / len,
        })
    }

    /// Fits a plane through three points, oriented by the right-hand rule
    /// `(b - a) x (c - b)`.
    ///
    /// Returns `None` for collinear or coincident points.
    #[must_use]
    pub fn from_points(a: &Point3, b: &Point3, c: &Point3) -> Option<Self> {
        Self::from_normal(*a, super::triangle_normal(a, b, c))
    }

    /// Returns the origin point of the plane.
    #[must_use]
    pub fn origin(&self) -> &Point3 {
        &self.origin
    }

    /// Returns the unit normal of the plane.
    #[must_use]
    pub fn normal(&self) -> &Vector3 {
        &self.normal
    }

    /// Signed distance from a point to the plane.
    /// Positive = on the normal side, negative = opposite.
    #[must_use]
    pub fn signed_distance(&self, point: &Point3) -> f64 {
        self.normal.dot(&(point - self.origin))
    }

    /// Computes the intersection of the line `origin + t * dir` with this plane.
    #[must_use]
    pub fn intersect_line(&self, origin: &Point3, dir: &Vector3) -> LinePlaneRelation {
        let denom = self.normal.dot(dir);
        let numer = self.normal.dot(&(self.origin - origin));

        if denom.abs() < TOLERANCE {
            if numer.abs() < TOLERANCE {
                LinePlaneRelation::OnPlane
            } else {
                LinePlaneRelation::Parallel
            }
        } else {
            let t = numer / denom;
            LinePlaneRelation::Point {
                point: origin + dir * t,
                t,
            }
        }
    }

    /// Intersects the segment-defined ray `near -> far` with the plane.
    ///
    /// Only hits in front of `near` count; a ray running parallel to the
    /// plane never hits.
    #[must_use]
    pub fn intersect_ray(&self, near: &Point3, far: &Point3) -> Option<Point3> {
        match self.intersect_line(near, &(far - near)) {
            LinePlaneRelation::Point { point, t } if t >= 0.0 => Some(point),
            _ => None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    #[test]
    fn three_point_fit_follows_winding() {
        let up = Plane::from_points(&p(0.0, 0.0, 0.0), &p(1.0, 0.0, 0.0), &p(0.0, 1.0, 0.0))
            .unwrap();
        assert!((up.normal().z - 1.0).abs() < TOLERANCE);

        let down = Plane::from_points(&p(0.0, 0.0, 0.0), &p(0.0, 1.0, 0.0), &p(1.0, 0.0, 0.0))
            .unwrap();
        assert!((down.normal().z + 1.0).abs() < TOLERANCE);
    }

    #[test]
    fn collinear_points_have_no_plane() {
        assert!(Plane::from_points(&p(0.0, 0.0, 0.0), &p(1.0, 0.0, 0.0), &p(2.0, 0.0, 0.0))
            .is_none());
    }

    #[test]
    fn ray_hits_ground_plane() {
        let ground = Plane::from_normal(Point3::origin(), Vector3::z()).unwrap();
        let hit = ground.intersect_ray(&p(1.0, 2.0, 5.0), &p(1.0, 2.0, -5.0)).unwrap();
        assert!((hit - p(1.0, 2.0, 0.0)).norm() < TOLERANCE);
    }

    #[test]
    fn ray_pointing_away_misses() {
        let ground = Plane::from_normal(Point3::origin(), Vector3::z()).unwrap();
        assert!(ground.intersect_ray(&p(0.0, 0.0, 5.0), &p(0.0, 0.0, 10.0)).is_none());
    }

    #[test]
    fn parallel_ray_misses() {
        let ground = Plane::from_normal(Point3::origin(), Vector3::z()).unwrap();
        assert!(ground.intersect_ray(&p(0.0, 0.0, 1.0), &p(5.0, 0.0, 1.0)).is_none());
        assert!(matches!(
            ground.intersect_line(&p(0.0, 0.0, 0.0), &Vector3::x()),
            LinePlaneRelation::OnPlane
        ));
    }
}
