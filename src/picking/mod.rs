//! Picking colors for GPU-based hit testing.
//!
//! Every pickable sub-object gets a color whose RGB channels carry a 24-bit id
//! and whose alpha channel carries the [`PickableType`]. The picking pass
//! renders these colors; reading back the pixel under the cursor and
//! decoding it yields the object.

use crate::error::PickingError;

/// Largest id that fits into the three color channels.
pub const MAX_PICKING_ID: u32 = 0x00FF_FFFF;

/// Kind of sub-object a picking color refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PickableType {
    Vertex,
    Edge,
    Polygon,
}

impl PickableType {
    /// All pickable types, in tag order.
    pub const ALL: [PickableType; 3] = [Self::Vertex, Self::Edge, Self::Polygon];

    /// Alpha-channel tag of this type.
    #[must_use]
    pub fn tag(self) -> u8 {
        match self {
            Self::Vertex => 1,
            Self::Edge => 2,
            Self::Polygon => 3,
        }
    }

    /// Inverse of [`PickableType::tag`].
    ///
    /// # Errors
    ///
    /// Returns [`PickingError::UnknownType`] for tags that name no type.
    pub fn from_tag(tag: u8) -> Result<Self, PickingError> {
        match tag {
            1 => Ok(Self::Vertex),
            2 => Ok(Self::Edge),
            3 => Ok(Self::Polygon),
            other => Err(PickingError::UnknownType(other)),
        }
    }

    fn slot(self) -> usize {
        usize::from(self.tag() - 1)
    }
}

/// An 8-bit RGBA color as read back from the picking buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PickingColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl PickingColor {
    /// Background: nothing under the cursor.
    pub const NONE: Self = Self::new(0, 0, 0, 0);

    /// Color of the session's not-yet-committed vertices. It is visible in
    /// the picking pass but decodes to no object.
    pub const PENDING_VERTEX: Self = Self::new(255, 255, 0, 255);

    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Encodes `id` for the given type.
    ///
    /// Ids above [`MAX_PICKING_ID`] are truncated to 24 bits; the allocator
    /// never hands those out.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn encode(kind: PickableType, id: u32) -> Self {
        Self::new((id >> 16) as u8, (id >> 8) as u8, id as u8, kind.tag())
    }

    /// The 24-bit id stored in the RGB channels.
    #[must_use]
    pub fn id(self) -> u32 {
        u32::from(self.r) << 16 | u32::from(self.g) << 8 | u32::from(self.b)
    }

    /// Decodes the color back into `(type, id)`.
    ///
    /// Returns `None` for the background, for [`PickingColor::PENDING_VERTEX`]
    /// and for any color with an unknown type tag.
    #[must_use]
    pub fn decode(self) -> Option<(PickableType, u32)> {
        let kind = PickableType::from_tag(self.a).ok()?;
        let id = self.id();
        (id != 0).then_some((kind, id))
    }

    /// Returns `true` unless this is the background color.
    #[must_use]
    pub fn is_set(self) -> bool {
        self != Self::NONE
    }

    /// Normalized float channels, as written into vertex color columns.
    #[must_use]
    pub fn to_rgba(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a].map(|c| f32::from(c) / 255.0)
    }

    /// Quantizes normalized float channels read back from a framebuffer.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn from_rgba(rgba: [f32; 4]) -> Self {
        let [r, g, b, a] = rgba.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8);
        Self::new(r, g, b, a)
    }
}

/// Hands out picking ids, one monotonic counter per [`PickableType`].
///
/// Ids are never reused, so a color read back from a stale frame can never
/// name a different object than the one it was rendered for.
#[derive(Debug, Clone)]
pub struct PickingColorAllocator {
    next: [u32; 3],
}

impl Default for PickingColorAllocator {
    fn default() -> Self {
        Self { next: [1; 3] }
    }
}

impl PickingColorAllocator {
    /// Creates an allocator whose first id of every type is 1.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates the next id of `kind` together with its color.
    ///
    /// # Errors
    ///
    /// Returns [`PickingError::Exhausted`] once all 24-bit ids of `kind`
    /// have been handed out.
    pub fn allocate(&mut self, kind: PickableType) -> Result<(u32, PickingColor), PickingError> {
        let next = &mut self.next[kind.slot()];
        if *next > MAX_PICKING_ID {
            return Err(PickingError::Exhausted { kind });
        }
        let id = *next;
        *next += 1;
        Ok((id, PickingColor::encode(kind, id)))
    }

    /// Allocator whose next ids are `next`, indexed by tag order.
    #[cfg(test)]
    pub(crate) fn with_next(next: [u32; 3]) -> Self {
        Self { next }
    }

    /// Number of ids of `kind` allocated so far.
    #[must_use]
    pub fn allocated(&self, kind: PickableType) -> u32 {
        self.next[kind.slot()] - 1
    }

    /// Decodes a color into its id, if it was encoded for a known type.
    #[must_use]
    pub fn decode(color: PickingColor) -> Option<u32> {
        color.decode().map(|(_, id)| id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn ids_are_unique_per_type() {
        let mut alloc = PickingColorAllocator::new();
        let mut seen = HashSet::new();
        for kind in PickableType::ALL {
            for _ in 0..100 {
                let (_, color) = alloc.allocate(kind).unwrap();
                assert!(seen.insert(color));
            }
        }
        assert_eq!(alloc.allocated(PickableType::Edge), 100);
    }

    #[test]
    fn same_id_differs_by_type() {
        let mut alloc = PickingColorAllocator::new();
        let (v_id, v_color) = alloc.allocate(PickableType::Vertex).unwrap();
        let (p_id, p_color) = alloc.allocate(PickableType::Polygon).unwrap();
        assert_eq!(v_id, p_id);
        assert_ne!(v_color, p_color);
    }

    #[test]
    fn decode_recovers_type_and_id() {
        let color = PickingColor::encode(PickableType::Edge, 0x12_3456);
        assert_eq!(color, PickingColor::new(0x12, 0x34, 0x56, 2));
        assert_eq!(color.decode(), Some((PickableType::Edge, 0x12_3456)));
        assert_eq!(PickingColorAllocator::decode(color), Some(0x12_3456));
    }

    #[test]
    fn background_and_pending_decode_to_nothing() {
        assert_eq!(PickingColor::NONE.decode(), None);
        assert!(!PickingColor::NONE.is_set());
        assert_eq!(PickingColor::PENDING_VERTEX.decode(), None);
        assert!(PickingColor::PENDING_VERTEX.is_set());
    }

    #[test]
    fn float_channels_round_trip_through_framebuffer() {
        let color = PickingColor::encode(PickableType::Vertex, 70_000);
        assert_eq!(PickingColor::from_rgba(color.to_rgba()), color);
    }

    #[test]
    fn exhausted_counter_is_an_error() {
        let mut alloc = PickingColorAllocator {
            next: [MAX_PICKING_ID, 1, 1],
        };
        let (id, _) = alloc.allocate(PickableType::Vertex).unwrap();
        assert_eq!(id, MAX_PICKING_ID);
        assert_eq!(
            alloc.allocate(PickableType::Vertex),
            Err(PickingError::Exhausted {
                kind: PickableType::Vertex
            })
        );
        assert!(alloc.allocate(PickableType::Edge).is_ok());
    }
}
