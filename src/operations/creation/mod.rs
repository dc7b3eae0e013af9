mod make_box;
mod make_polygon;

pub use make_box::MakeBox;
pub use make_polygon::MakePolygon;

use crate::error::Result;
use crate::math::Vector3;
use crate::mesh::{ChangeSet, Mesh};
use crate::picking::PickingColorAllocator;

/// Number of cells along each axis of a box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoxSegments {
    pub x: usize,
    pub y: usize,
    pub z: usize,
}

impl BoxSegments {
    pub(crate) fn along(&self, axis: usize) -> usize {
        match axis {
            0 => self.x,
            1 => self.y,
            _ => self.z,
        }
    }
}

impl Default for BoxSegments {
    fn default() -> Self {
        Self { x: 1, y: 1, z: 1 }
    }
}

/// Parameters of a box primitive.
///
/// The base is centered on the local origin in x and y; the box rises from
/// `z = 0` to `z = size.z`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxConfig {
    pub size: Vector3,
    pub segments: BoxSegments,
}

impl Default for BoxConfig {
    fn default() -> Self {
        Self {
            size: Vector3::new(1.0, 1.0, 1.0),
            segments: BoxSegments::default(),
        }
    }
}

/// Typed parameters of the primitives that can be built into a mesh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PrimitiveConfig {
    Box(BoxConfig),
}

impl PrimitiveConfig {
    /// Builds the primitive into `mesh`.
    ///
    /// # Errors
    ///
    /// Returns an error if the parameters are invalid or picking ids run out.
    pub fn build(&self, mesh: &mut Mesh, picking: &mut PickingColorAllocator) -> Result<ChangeSet> {
        match self {
            Self::Box(config) => MakeBox::new(*config).execute(mesh, picking),
        }
    }
}
