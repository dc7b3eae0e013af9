use std::collections::HashSet;

use crate::picking::PickableType;
use crate::topology::{EdgeId, PolygonId, VertexId};

/// A single sub-object of a mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subobject {
    Vertex(VertexId),
    Edge(EdgeId),
    Polygon(PolygonId),
}

/// Sub-objects of one type whose selection changes together.
///
/// Plays the role of a temporary merged group: selecting a batch touches
/// exactly its members, never the rest of their merged groups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubobjectBatch {
    Vertices(Vec<VertexId>),
    Edges(Vec<EdgeId>),
}

impl SubobjectBatch {
    /// Number of sub-objects in the batch.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Vertices(v) => v.len(),
            Self::Edges(e) => e.len(),
        }
    }

    /// Returns `true` if the batch has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Selected sub-objects of a mesh.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    vertices: HashSet<VertexId>,
    edges: HashSet<EdgeId>,
    polygons: HashSet<PolygonId>,
}

impl Selection {
    /// Returns `true` if `subobj` is selected.
    #[must_use]
    pub fn contains(&self, subobj: Subobject) -> bool {
        match subobj {
            Subobject::Vertex(v) => self.vertices.contains(&v),
            Subobject::Edge(e) => self.edges.contains(&e),
            Subobject::Polygon(p) => self.polygons.contains(&p),
        }
    }

    /// Marks `subobj`; returns `true` if its state changed.
    pub fn set(&mut self, subobj: Subobject, selected: bool) -> bool {
        match (subobj, selected) {
            (Subobject::Vertex(v), true) => self.vertices.insert(v),
            (Subobject::Vertex(v), false) => self.vertices.remove(&v),
            (Subobject::Edge(e), true) => self.edges.insert(e),
            (Subobject::Edge(e), false) => self.edges.remove(&e),
            (Subobject::Polygon(p), true) => self.polygons.insert(p),
            (Subobject::Polygon(p), false) => self.polygons.remove(&p),
        }
    }

    /// Applies `selected` to every member of `batch`.
    pub fn set_batch(&mut self, batch: &SubobjectBatch, selected: bool) {
        match batch {
            SubobjectBatch::Vertices(ids) => {
                for &v in ids {
                    self.set(Subobject::Vertex(v), selected);
                }
            }
            SubobjectBatch::Edges(ids) => {
                for &e in ids {
                    self.set(Subobject::Edge(e), selected);
                }
            }
        }
    }

    /// Number of selected sub-objects of `kind`.
    #[must_use]
    pub fn count(&self, kind: PickableType) -> usize {
        match kind {
            PickableType::Vertex => self.vertices.len(),
            PickableType::Edge => self.edges.len(),
            PickableType::Polygon => self.polygons.len(),
        }
    }

    /// Selected vertices, in no particular order.
    pub fn vertices(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.vertices.iter().copied()
    }

    /// Selected edges, in no particular order.
    pub fn edges(&self) -> impl Iterator<Item = EdgeId> + '_ {
        self.edges.iter().copied()
    }
}
