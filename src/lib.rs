pub mod buffers;
pub mod creation;
pub mod error;
pub mod math;
pub mod mesh;
pub mod operations;
pub mod picking;
pub mod scene;
pub mod topology;

pub use error::{PolyeditError, Result};
