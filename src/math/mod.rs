pub mod aabb;
pub mod plane;

pub use aabb::Aabb;
pub use plane::{LinePlaneRelation, Plane};

/// 2D point type (normalized screen coordinates).
pub type Point2 = nalgebra::Point2<f64>;

/// 3D point type.
pub type Point3 = nalgebra::Point3<f64>;

/// 3D vector type.
pub type Vector3 = nalgebra::Vector3<f64>;

/// Rigid transform placing a mesh in world space.
pub type Isometry3 = nalgebra::Isometry3<f64>;

/// Global geometric tolerance for floating-point comparisons.
pub const TOLERANCE: f64 = 1e-10;

/// Unnormalized face normal of the triangle `a, b, c` (right-hand rule).
///
/// Its length is twice the triangle area, so summing these gives an
/// area-weighted normal.
#[must_use]
pub fn triangle_normal(a: &Point3, b: &Point3, c: &Point3) -> Vector3 {
    (b - a).cross(&(c - b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ccw_triangle_in_xy_plane_points_up() {
        let n = triangle_normal(
            &Point3::new(0.0, 0.0, 0.0),
            &Point3::new(1.0, 0.0, 0.0),
            &Point3::new(1.0, 1.0, 0.0),
        );
        assert!((n - Vector3::new(0.0, 0.0, 1.0)).norm() < TOLERANCE);
    }

    #[test]
    fn length_is_twice_the_area() {
        let n = triangle_normal(
            &Point3::new(0.0, 0.0, 0.0),
            &Point3::new(2.0, 0.0, 0.0),
            &Point3::new(0.0, 2.0, 0.0),
        );
        assert!((n.norm() - 4.0).abs() < TOLERANCE);
    }
}
