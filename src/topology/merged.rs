use crate::math::Point3;

use super::edge::EdgeId;
use super::vertex::VertexId;

slotmap::new_key_type! {
    /// Unique identifier for a merged vertex.
    pub struct MergedVertexId;

    /// Unique identifier for a merged edge.
    pub struct MergedEdgeId;
}

/// Group of coincident vertices that are selected and moved as one.
#[derive(Debug, Clone)]
pub struct MergedVertex {
    point: Point3,
    vertices: Vec<VertexId>,
}

impl MergedVertex {
    /// Creates an empty group at `point`.
    #[must_use]
    pub fn new(point: Point3) -> Self {
        Self {
            point,
            vertices: Vec::new(),
        }
    }

    /// The shared position of the members.
    #[must_use]
    pub fn point(&self) -> &Point3 {
        &self.point
    }

    /// Member vertices, in joining order.
    #[must_use]
    pub fn vertices(&self) -> &[VertexId] {
        &self.vertices
    }

    /// Returns `true` if `vertex` is a member.
    #[must_use]
    pub fn contains(&self, vertex: VertexId) -> bool {
        self.vertices.contains(&vertex)
    }

    /// Number of member vertices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// Returns `true` if the group has no members left.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Adds `vertex`; returns `false` if it was already a member.
    pub(crate) fn push(&mut self, vertex: VertexId) -> bool {
        push_unique(&mut self.vertices, vertex)
    }

    /// Drops `vertex`; returns `true` if it was a member.
    pub(crate) fn remove(&mut self, vertex: VertexId) -> bool {
        remove_item(&mut self.vertices, vertex)
    }
}

/// Group of coincident edges.
#[derive(Debug, Clone, Default)]
pub struct MergedEdge {
    edges: Vec<EdgeId>,
}

impl MergedEdge {
    /// Creates an empty merged edge.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Member edges, in joining order.
    #[must_use]
    pub fn edges(&self) -> &[EdgeId] {
        &self.edges
    }

    /// The edge that represents the group in selection state.
    #[must_use]
    pub fn first(&self) -> Option<EdgeId> {
        self.edges.first().copied()
    }

    /// Returns `true` if `edge` is a member.
    #[must_use]
    pub fn contains(&self, edge: EdgeId) -> bool {
        self.edges.contains(&edge)
    }

    /// Number of member edges.
    #[must_use]
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    /// Returns `true` if the group has no members left.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Adds `edge`; returns `false` if it was already a member.
    pub(crate) fn push(&mut self, edge: EdgeId) -> bool {
        push_unique(&mut self.edges, edge)
    }

    /// Drops `edge`; returns `true` if it was a member.
    pub(crate) fn remove(&mut self, edge: EdgeId) -> bool {
        remove_item(&mut self.edges, edge)
    }
}

fn push_unique<T: PartialEq>(items: &mut Vec<T>, item: T) -> bool {
    if items.contains(&item) {
        return false;
    }
    items.push(item);
    true
}

fn remove_item<T: PartialEq>(items: &mut Vec<T>, item: T) -> bool {
    match items.iter().position(|i| *i == item) {
        Some(index) => {
            items.remove(index);
            true
        }
        None => false,
    }
}
