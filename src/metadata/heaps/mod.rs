//! # Metadata Heap Builders
//!
//! The four ECMA-335 heaps are append-only byte regions referenced from table rows by
//! fixed-width offsets:
//!
//! - `#Strings` - NUL-terminated UTF-8 identifier strings, suffix-folded at freeze time
//! - `#US` - length-prefixed UTF-16 user string literals addressed by IL `ldstr` tokens
//! - `#Blob` - length-prefixed binary blobs (signatures, constants, hashes)
//! - `#GUID` - raw 16-byte GUID slots
//!
//! Every builder deduplicates: interning equal content twice yields the same handle,
//! and exactly one physical copy ends up in the heap. Handle value 0 is reserved for
//! the nil/empty entry of each heap, so a zero reference in a table row never points
//! at real data.
//!
//! For edit-and-continue deltas each builder accepts a start offset so that handles
//! remain valid when a generation's heap is logically concatenated onto the previous
//! generations.
//!
//! ## Reference
//! * [ECMA-335 Partition II, Section 24.2](https://ecma-international.org/wp-content/uploads/ECMA-335_6th_edition_june_2012.pdf)

mod blobs;
mod guids;
mod strings;
mod userstrings;

pub use blobs::{BlobHeap, BlobHeapBuilder};
pub use guids::{GuidFixup, GuidHeap, GuidHeapBuilder};
pub use strings::{StringHeap, StringHeapBuilder};
pub use userstrings::{
    UserStringFixup, UserStringHeap, UserStringHeapBuilder, USER_STRING_HEAP_SIZE_LIMIT,
};

/// Handle to an interned `#Strings` heap entry.
///
/// Until the heaps are frozen this is a virtual index; the actual byte offset is
/// assigned by the suffix-folding pass and resolved through [`StringHeap`] during
/// serialization. Value 0 is the empty string.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct StringHandle(pub(crate) u32);

impl StringHandle {
    /// The handle of the empty string (offset 0 in every generation)
    pub const EMPTY: StringHandle = StringHandle(0);

    /// Returns true if this handle refers to the empty string
    #[must_use]
    pub fn is_nil(&self) -> bool {
        self.0 == 0
    }
}

/// Handle to an interned `#US` heap entry, carrying the final byte offset.
///
/// User string offsets are fixed at intern time and never shift. Value 0 is the
/// empty user string.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct UserStringHandle(pub(crate) u32);

impl UserStringHandle {
    /// Returns true if this handle refers to the empty user string
    #[must_use]
    pub fn is_nil(&self) -> bool {
        self.0 == 0
    }

    /// The byte offset of this entry from the start of the `#US` heap
    #[must_use]
    pub fn offset(&self) -> u32 {
        self.0
    }
}

/// Handle to an interned `#Blob` heap entry, carrying the final byte offset.
///
/// Blob offsets are fixed at intern time and never shift. Value 0 is the empty
/// blob.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct BlobHandle(pub(crate) u32);

impl BlobHandle {
    /// Returns true if this handle refers to the empty blob
    #[must_use]
    pub fn is_nil(&self) -> bool {
        self.0 == 0
    }

    /// The byte offset of this entry from the start of the `#Blob` heap
    #[must_use]
    pub fn offset(&self) -> u32 {
        self.0
    }
}

/// Handle to a `#GUID` heap slot.
///
/// GUID references are 1-based slot indices, not byte offsets; slot `n` occupies
/// bytes `(n-1)*16..n*16`. Value 0 is the nil GUID reference.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct GuidHandle(pub(crate) u32);

impl GuidHandle {
    /// Returns true if this handle is the nil GUID reference
    #[must_use]
    pub fn is_nil(&self) -> bool {
        self.0 == 0
    }

    /// The 1-based slot index of this entry in the `#GUID` heap
    #[must_use]
    pub fn index(&self) -> u32 {
        self.0
    }
}
