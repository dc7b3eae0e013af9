use thiserror::Error;

use crate::picking::PickableType;

/// Top-level error type for the polygon editing core.
#[derive(Debug, Error)]
pub enum PolyeditError {
    #[error(transparent)]
    Topology(#[from] TopologyError),

    #[error(transparent)]
    Creation(#[from] CreationError),

    #[error(transparent)]
    Picking(#[from] PickingError),

    #[error(transparent)]
    Operation(#[from] OperationError),
}

/// Errors related to the mesh topology store.
#[derive(Debug, Error)]
pub enum TopologyError {
    #[error("entity not found: {0}")]
    EntityNotFound(String),

    #[error("invalid topology: {0}")]
    InvalidTopology(String),
}

/// Errors raised by interactive polygon creation.
///
/// All of these are recoverable: the caller skips the input event
/// (or cancels the session for [`CreationError::NoVerticesRemain`]).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CreationError {
    #[error("a polygon needs at least 3 vertices, {count} placed")]
    TooFewVertices { count: usize },

    #[error("removing the only vertex would leave the polygon empty")]
    NoVerticesRemain,

    #[error("screen point does not project onto the grid")]
    NoProjection,

    #[error("no polygon is being created")]
    NoActiveSession,
}

/// Errors related to picking color allocation and decoding.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PickingError {
    #[error("picking colors exhausted for {kind:?}")]
    Exhausted { kind: PickableType },

    #[error("unknown pickable type tag {0}")]
    UnknownType(u8),
}

/// Errors related to non-interactive mesh operations.
#[derive(Debug, Error)]
pub enum OperationError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Convenience type alias for results using [`PolyeditError`].
pub type Result<T> = std::result::Result<T, PolyeditError>;
