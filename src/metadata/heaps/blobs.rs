//! Blob Heap (`#Blob`) builder.
//!
//! The blob heap stores length-prefixed binary data: signatures, constant values,
//! public keys, hash values, debug records. Entries are content-addressed - equal
//! byte sequences intern to one physical copy - and each entry's offset is fixed
//! the moment it is interned, so growing the heap never invalidates handles that
//! were already given out.
//!
//! # Reference
//! - [ECMA-335 II.24.2.4](https://ecma-international.org/wp-content/uploads/ECMA-335_6th_edition_june_2012.pdf)

use std::collections::HashMap;

use crate::{
    io::{compressed_uint_size, write_compressed_uint},
    metadata::heaps::BlobHandle,
};

/// Interning builder for the `#Blob` heap.
///
/// Offsets account for each entry's compressed length prefix. The empty blob is
/// pre-registered at construction as the nil handle.
pub struct BlobHeapBuilder {
    blobs: HashMap<Vec<u8>, BlobHandle>,
    next_offset: u32,
    start_offset: u32,
}

impl BlobHeapBuilder {
    /// Creates a builder for a first-generation heap (start offset 0).
    #[must_use]
    pub fn new() -> Self {
        Self::with_start_offset(0)
    }

    /// Creates a builder whose offsets begin at `start_offset` (EnC deltas).
    #[must_use]
    pub fn with_start_offset(start_offset: u32) -> Self {
        let mut blobs = HashMap::new();
        blobs.insert(Vec::new(), BlobHandle(0));

        BlobHeapBuilder {
            blobs,
            // Generation zero starts past the single 0x00 byte of the empty blob;
            // continuations inherit it from a previous generation.
            next_offset: if start_offset == 0 { 1 } else { start_offset },
            start_offset,
        }
    }

    /// Interns a byte sequence and returns its stable heap offset handle.
    ///
    /// Content-addressed: structurally equal bytes always yield the same handle,
    /// and the offset returned for a blob never changes as the heap grows.
    #[allow(clippy::cast_possible_truncation)]
    pub fn get_or_add(&mut self, bytes: &[u8]) -> BlobHandle {
        if let Some(handle) = self.blobs.get(bytes) {
            return *handle;
        }

        let handle = BlobHandle(self.next_offset);
        let length = bytes.len() as u32;
        self.next_offset += compressed_uint_size(length) + length;
        self.blobs.insert(bytes.to_vec(), handle);
        handle
    }

    /// Total addressable heap size including previous generations, unaligned.
    #[must_use]
    pub fn unaligned_size(&self) -> u32 {
        self.next_offset
    }

    /// Materializes the heap image, writing every entry at its pre-assigned offset.
    ///
    /// Offsets were fixed at intern time; this pass only lays bytes down, it never
    /// recomputes positions.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub(crate) fn freeze(self) -> BlobHeap {
        let base = if self.start_offset == 0 {
            0
        } else {
            self.start_offset
        };
        let mut data = vec![0u8; (self.next_offset - base) as usize];

        for (bytes, handle) in &self.blobs {
            if handle.0 == 0 {
                // The empty blob is the zero byte at the heap start (generation zero)
                // or lives in a previous generation.
                continue;
            }

            let mut entry = Vec::with_capacity(bytes.len() + 4);
            write_compressed_uint(bytes.len() as u32, &mut entry);
            entry.extend_from_slice(bytes);

            let position = (handle.0 - base) as usize;
            data[position..position + entry.len()].copy_from_slice(&entry);
        }

        BlobHeap {
            data,
            start_offset: self.start_offset,
        }
    }
}

impl Default for BlobHeapBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// The frozen `#Blob` heap image.
pub struct BlobHeap {
    data: Vec<u8>,
    start_offset: u32,
}

impl BlobHeap {
    /// This generation's heap bytes (excluding previous generations).
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Total addressable heap size including previous generations, unaligned.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn unaligned_size(&self) -> u32 {
        self.start_offset + self.data.len() as u32
    }
}
