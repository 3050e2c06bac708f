//! # Metadata Builder
//!
//! [`MetadataBuilder`] is the single owned accumulation value of the emission
//! pipeline: the upstream compiler interns heap content and appends table rows in
//! arbitrary order, on one thread, and then freezes the builder exactly once.
//!
//! The freeze is a type-level state change: [`MetadataBuilder::freeze`] consumes the
//! builder and returns a [`FrozenMetadata`], so any attempt to mutate heaps or tables
//! after the freeze fails to compile instead of corrupting output at runtime. The
//! frozen value is what the serializers in [`crate::metadata::serializer`] consume.
//!
//! Heap operations live in `heaps.rs`, the per-table `add_*` operations in
//! `tables.rs`; both are inherent impls of [`MetadataBuilder`].

mod heaps;
mod tables;

pub(crate) use tables::TableData;

use crate::metadata::{
    heaps::{
        BlobHeap, BlobHeapBuilder, GuidHeap, GuidHeapBuilder, StringHeap, StringHeapBuilder,
        UserStringHeap, UserStringHeapBuilder,
    },
    sizes::HeapSizes,
    tables::{TableId, TABLE_COUNT},
};

/// Accumulates heap entries and table rows for one metadata generation.
///
/// All `get_or_add_*`, `reserve_*` and `add_*` operations live on this type; see
/// the module documentation for the accumulation/freeze lifecycle. A builder that
/// is no longer needed can simply be dropped - there is no partial output to
/// clean up.
///
/// # Examples
///
/// ```rust
/// use dotemit::{MetadataBuilder, TypeSystemMetadataSerializer};
///
/// let mut builder = MetadataBuilder::new();
/// let name = builder.get_or_add_string("Program");
/// # let _ = name;
/// let frozen = builder.freeze();
/// let serializer = TypeSystemMetadataSerializer::new(frozen, "v4.0.30319", false)?;
/// let blob = serializer.serialize(0, 0)?;
/// assert_eq!(&blob[0..4], &0x424A_5342u32.to_le_bytes());
/// # Ok::<(), dotemit::Error>(())
/// ```
pub struct MetadataBuilder {
    pub(crate) strings: StringHeapBuilder,
    pub(crate) user_strings: UserStringHeapBuilder,
    pub(crate) blobs: BlobHeapBuilder,
    pub(crate) guids: GuidHeapBuilder,
    pub(crate) tables: TableData,
}

impl MetadataBuilder {
    /// Creates a builder for a first-generation (non-delta) module.
    #[must_use]
    pub fn new() -> Self {
        Self::with_heap_offsets(0, 0, 0, 0)
    }

    /// Creates a builder for an edit-and-continue delta generation.
    ///
    /// The offsets are the accumulated heap sizes of all previous generations;
    /// handles issued by this builder stay valid in the logical concatenation of
    /// all generations' heaps.
    ///
    /// ## Arguments
    /// * `string_heap_offset` - Prior `#Strings` content size in bytes
    /// * `user_string_heap_offset` - Prior `#US` content size in bytes
    /// * `blob_heap_offset` - Prior `#Blob` content size in bytes
    /// * `guid_heap_offset` - Prior `#GUID` content size in bytes (multiple of 16)
    #[must_use]
    pub fn with_heap_offsets(
        string_heap_offset: u32,
        user_string_heap_offset: u32,
        blob_heap_offset: u32,
        guid_heap_offset: u32,
    ) -> Self {
        MetadataBuilder {
            strings: StringHeapBuilder::with_start_offset(string_heap_offset),
            user_strings: UserStringHeapBuilder::with_start_offset(user_string_heap_offset),
            blobs: BlobHeapBuilder::with_start_offset(blob_heap_offset),
            guids: GuidHeapBuilder::with_start_offset(guid_heap_offset),
            tables: TableData::default(),
        }
    }

    /// Completes the heaps and freezes the builder.
    ///
    /// This is the single freeze event of the lifecycle: the `#Strings` heap runs
    /// its suffix-folding pass and every heap produces its final byte image.
    /// Because the builder is consumed, later mutation is a compile-time error.
    ///
    /// # Panics
    /// Panics if a `reserve_guid` or `reserve_user_string` reservation was never
    /// filled - an emitter bug that would otherwise produce corrupt output.
    #[must_use]
    pub fn freeze(self) -> FrozenMetadata {
        FrozenMetadata {
            strings: self.strings.freeze(),
            user_strings: self.user_strings.freeze(),
            blobs: self.blobs.freeze(),
            guids: self.guids.freeze(),
            tables: self.tables,
        }
    }
}

impl Default for MetadataBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// The frozen shape of one metadata generation.
///
/// Heap layouts and row counts are final; the only remaining work is
/// serialization. Produced by [`MetadataBuilder::freeze`], consumed by
/// [`crate::TypeSystemMetadataSerializer`] or
/// [`crate::StandaloneDebugMetadataSerializer`].
pub struct FrozenMetadata {
    pub(crate) strings: StringHeap,
    pub(crate) user_strings: UserStringHeap,
    pub(crate) blobs: BlobHeap,
    pub(crate) guids: GuidHeap,
    pub(crate) tables: TableData,
}

impl FrozenMetadata {
    /// Final row count of every table, indexed by table index.
    #[must_use]
    pub fn row_counts(&self) -> [u32; TABLE_COUNT] {
        self.tables.row_counts()
    }

    /// Final row count of a single table.
    #[must_use]
    pub fn row_count(&self, table: TableId) -> u32 {
        self.tables.row_counts()[table as usize]
    }

    /// Total addressable heap sizes (unaligned, including prior generations).
    #[must_use]
    pub fn heap_sizes(&self) -> HeapSizes {
        HeapSizes {
            string: self.strings.unaligned_size(),
            user_string: self.user_strings.unaligned_size(),
            blob: self.blobs.unaligned_size(),
            guid: self.guids.unaligned_size(),
        }
    }

    /// Heap byte sizes of this generation only (unaligned stream content).
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub(crate) fn heap_stream_sizes(&self) -> HeapSizes {
        HeapSizes {
            string: self.strings.data().len() as u32,
            user_string: self.user_strings.data().len() as u32,
            blob: self.blobs.data().len() as u32,
            guid: self.guids.data().len() as u32,
        }
    }
}
