use super::polygon::PolygonId;
use super::vertex::VertexId;

slotmap::new_key_type! {
    /// Unique identifier for an edge in the topology store.
    pub struct EdgeId;
}

/// Data associated with a polygon boundary edge.
///
/// The direction is significant only for buffer packing: the start vertex's
/// row carries the edge's picking color in the first half of the edge
/// buffer, the end vertex's row in the second half.
#[derive(Debug, Clone)]
pub struct EdgeData {
    /// Start vertex of the edge.
    pub start: VertexId,
    /// End vertex of the edge.
    pub end: VertexId,
    /// Owning polygon, set once the polygon is committed.
    pub polygon: Option<PolygonId>,
    /// Picking id (see [`crate::picking`]).
    pub picking_id: u32,
}

impl EdgeData {
    /// Creates an edge from `start` to `end`.
    #[must_use]
    pub fn new(start: VertexId, end: VertexId, picking_id: u32) -> Self {
        Self {
            start,
            end,
            polygon: None,
            picking_id,
        }
    }

    /// Both endpoints, start first.
    #[must_use]
    pub fn vertices(&self) -> [VertexId; 2] {
        [self.start, self.end]
    }

    /// Reverses the edge direction.
    pub fn switch_vertex_order(&mut self) {
        std::mem::swap(&mut self.start, &mut self.end);
    }

    /// Returns `true` if `vertex` is one of the endpoints.
    #[must_use]
    pub fn has_vertex(&self, vertex: VertexId) -> bool {
        self.start == vertex || self.end == vertex
    }
}
