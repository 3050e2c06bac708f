//! Heap operations of [`MetadataBuilder`].
//!
//! Thin delegation onto the four heap builders, plus the constant-blob entry point
//! used by the `Constant` table.

use uguid::Guid;

use crate::{
    metadata::{
        builder::MetadataBuilder,
        constant::Constant,
        heaps::{
            BlobHandle, GuidFixup, GuidHandle, StringHandle, UserStringFixup, UserStringHandle,
        },
    },
    Result,
};

impl MetadataBuilder {
    /// Interns an identifier string into the `#Strings` heap.
    ///
    /// The empty string maps to the nil handle; equal input always returns the
    /// same handle. The actual byte offset is assigned at freeze time by the
    /// suffix-folding pass.
    pub fn get_or_add_string(&mut self, value: &str) -> StringHandle {
        self.strings.get_or_add(value)
    }

    /// Interns a byte sequence into the `#Blob` heap.
    ///
    /// Content-addressed; the returned offset never changes as the heap grows.
    pub fn get_or_add_blob(&mut self, bytes: &[u8]) -> BlobHandle {
        self.blobs.get_or_add(bytes)
    }

    /// Interns a constant value's encoded payload into the `#Blob` heap.
    ///
    /// Strings are stored as their raw UTF-16LE bytes; all other primitives go
    /// through the little-endian constant encoding (see
    /// [`crate::metadata::constant::Constant::encode`]).
    pub fn get_or_add_constant_blob(&mut self, value: &Constant) -> BlobHandle {
        self.blobs.get_or_add(&value.encode())
    }

    /// Interns a GUID into the `#GUID` heap.
    ///
    /// The all-zero GUID maps to the nil handle; others are deduplicated and
    /// appended in first-seen order.
    pub fn get_or_add_guid(&mut self, guid: Guid) -> GuidHandle {
        self.guids.get_or_add(guid)
    }

    /// Reserves a `#GUID` slot whose value is supplied later via
    /// [`MetadataBuilder::fill_guid`].
    pub fn reserve_guid(&mut self) -> (GuidHandle, GuidFixup) {
        self.guids.reserve()
    }

    /// Fills a reserved `#GUID` slot.
    pub fn fill_guid(&mut self, fixup: GuidFixup, guid: Guid) {
        self.guids.fill(fixup, guid);
    }

    /// Interns a user string literal into the `#US` heap.
    ///
    /// # Errors
    /// Returns [`crate::Error::HeapSizeLimitExceeded`] if the heap would exceed
    /// its 24-bit addressable range.
    pub fn get_or_add_user_string(&mut self, value: &str) -> Result<UserStringHandle> {
        self.user_strings.get_or_add(value)
    }

    /// Reserves a `#US` entry for a string of `length` UTF-16 code units whose
    /// content is supplied later via [`MetadataBuilder::fill_user_string`].
    ///
    /// # Errors
    /// Returns [`crate::Error::HeapSizeLimitExceeded`] if the heap would exceed
    /// its 24-bit addressable range.
    pub fn reserve_user_string(
        &mut self,
        length: usize,
    ) -> Result<(UserStringHandle, UserStringFixup)> {
        self.user_strings.reserve(length)
    }

    /// Fills a reserved `#US` entry.
    ///
    /// # Panics
    /// Panics if the string's UTF-16 length differs from the reserved length.
    pub fn fill_user_string(&mut self, fixup: UserStringFixup, value: &str) {
        self.user_strings.fill(fixup, value);
    }
}
