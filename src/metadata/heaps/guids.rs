//! GUID Heap (`#GUID`) builder.
//!
//! The GUID heap is a sequence of raw 16-byte GUIDs referenced by 1-based slot
//! index (not byte offset). Module version ids, EnC ids and portable-PDB document
//! language/hash-algorithm ids live here.
//!
//! # Reference
//! - [ECMA-335 II.24.2.5](https://ecma-international.org/wp-content/uploads/ECMA-335_6th_edition_june_2012.pdf)

use std::collections::HashMap;

use uguid::Guid;

use crate::metadata::heaps::GuidHandle;

/// A reserved, not yet filled `#GUID` heap slot.
///
/// Produced by [`GuidHeapBuilder::reserve`]; must be passed back to
/// [`GuidHeapBuilder::fill`] exactly once before the heaps are frozen.
#[derive(Debug)]
pub struct GuidFixup {
    slot: usize,
}

/// Interning builder for the `#GUID` heap.
///
/// GUIDs are deduplicated by value and appended in first-seen order. The all-zero
/// GUID always maps to the nil handle and is never stored.
pub struct GuidHeapBuilder {
    guids: HashMap<Guid, GuidHandle>,
    slots: Vec<Guid>,
    start_index: u32,
    pending_fixups: usize,
}

impl GuidHeapBuilder {
    /// Creates a builder for a first-generation heap.
    #[must_use]
    pub fn new() -> Self {
        Self::with_start_offset(0)
    }

    /// Creates a builder whose slots begin after `start_offset` bytes of
    /// previous-generation GUIDs (EnC deltas).
    ///
    /// # Panics
    /// Panics if `start_offset` is not a multiple of 16; a previous generation
    /// can only end on a whole GUID slot.
    #[must_use]
    pub fn with_start_offset(start_offset: u32) -> Self {
        assert!(
            start_offset % 16 == 0,
            "#GUID start offset must be a multiple of 16"
        );

        GuidHeapBuilder {
            guids: HashMap::new(),
            slots: Vec::new(),
            start_index: start_offset / 16,
            pending_fixups: 0,
        }
    }

    /// Interns a GUID and returns its 1-based slot handle.
    ///
    /// The all-zero GUID maps to the nil handle.
    #[allow(clippy::cast_possible_truncation)]
    pub fn get_or_add(&mut self, guid: Guid) -> GuidHandle {
        if guid == Guid::ZERO {
            return GuidHandle(0);
        }

        if let Some(handle) = self.guids.get(&guid) {
            return *handle;
        }

        self.slots.push(guid);
        let handle = GuidHandle(self.start_index + self.slots.len() as u32);
        self.guids.insert(guid, handle);
        handle
    }

    /// Reserves a slot whose GUID is not yet known.
    ///
    /// Used when the module version id is derived from the serialized content
    /// and assigned after emission is otherwise complete. The returned fixup
    /// must be resolved via [`GuidHeapBuilder::fill`] before freezing.
    #[allow(clippy::cast_possible_truncation)]
    pub fn reserve(&mut self) -> (GuidHandle, GuidFixup) {
        self.slots.push(Guid::ZERO);
        self.pending_fixups += 1;

        (
            GuidHandle(self.start_index + self.slots.len() as u32),
            GuidFixup {
                slot: self.slots.len() - 1,
            },
        )
    }

    /// Fills a reserved slot with its final GUID.
    pub fn fill(&mut self, fixup: GuidFixup, guid: Guid) {
        self.slots[fixup.slot] = guid;
        self.pending_fixups -= 1;
    }

    /// Produces the final heap image.
    ///
    /// # Panics
    /// Panics if any reserved slot has not been filled.
    #[must_use]
    pub(crate) fn freeze(self) -> GuidHeap {
        assert_eq!(
            self.pending_fixups, 0,
            "unfilled GUID reservations at freeze"
        );

        let mut data = Vec::with_capacity(self.slots.len() * 16);
        for guid in &self.slots {
            data.extend_from_slice(&guid.to_bytes());
        }

        GuidHeap {
            data,
            start_index: self.start_index,
        }
    }
}

impl Default for GuidHeapBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// The frozen `#GUID` heap image.
pub struct GuidHeap {
    data: Vec<u8>,
    start_index: u32,
}

impl GuidHeap {
    /// This generation's heap bytes (excluding previous generations).
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Total addressable heap size including previous generations, unaligned.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn unaligned_size(&self) -> u32 {
        self.start_index * 16 + self.data.len() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uguid::guid;

    #[test]
    fn zero_guid_is_nil() {
        let mut builder = GuidHeapBuilder::new();
        assert!(builder.get_or_add(Guid::ZERO).is_nil());

        let heap = builder.freeze();
        assert!(heap.data().is_empty());
        assert_eq!(heap.unaligned_size(), 0);
    }

    #[test]
    fn dedup_and_first_seen_order() {
        let mut builder = GuidHeapBuilder::new();
        let a = builder.get_or_add(guid!("d437908e-65e6-487c-9735-7bdff699bea5"));
        let b = builder.get_or_add(guid!("aaaaaaaa-aaaa-aaaa-aaaa-aaaaaaaaaaaa"));
        let a_again = builder.get_or_add(guid!("d437908e-65e6-487c-9735-7bdff699bea5"));

        assert_eq!(a.index(), 1);
        assert_eq!(b.index(), 2);
        assert_eq!(a, a_again);

        let heap = builder.freeze();
        assert_eq!(heap.data().len(), 32);
        assert_eq!(
            &heap.data()[..16],
            &[
                0x8e, 0x90, 0x37, 0xd4, 0xe6, 0x65, 0x7c, 0x48, 0x97, 0x35, 0x7b, 0xdf, 0xf6,
                0x99, 0xbe, 0xa5
            ]
        );
    }

    #[test]
    fn reserve_then_fill() {
        let mut builder = GuidHeapBuilder::new();
        let (handle, fixup) = builder.reserve();
        assert_eq!(handle.index(), 1);

        builder.fill(fixup, guid!("aaaaaaaa-aaaa-aaaa-aaaa-aaaaaaaaaaaa"));
        let heap = builder.freeze();
        assert_eq!(heap.data(), &[0xAA; 16]);
    }

    #[test]
    fn start_offset_shifts_indices() {
        let mut builder = GuidHeapBuilder::with_start_offset(32);
        let handle = builder.get_or_add(guid!("aaaaaaaa-aaaa-aaaa-aaaa-aaaaaaaaaaaa"));
        assert_eq!(handle.index(), 3);

        let heap = builder.freeze();
        assert_eq!(heap.data().len(), 16);
        assert_eq!(heap.unaligned_size(), 48);
    }

    #[test]
    #[should_panic(expected = "unfilled GUID reservations")]
    fn unfilled_reservation_panics_at_freeze() {
        let mut builder = GuidHeapBuilder::new();
        let _ = builder.reserve();
        let _ = builder.freeze();
    }
}
