//! User String Heap (`#US`) builder.
//!
//! The user string heap contains the UTF-16 literals referenced by IL `ldstr`
//! instructions. Each entry is a compressed byte length, the UTF-16LE code units,
//! and one trailing kind byte that flags strings requiring special handling
//! (non-ASCII or control characters).
//!
//! `ldstr` tokens embed the heap offset in their low 24 bits, so the heap content
//! is capped at 0x0100_0000 bytes; exceeding the cap is the one recoverable
//! failure of the accumulation phase.
//!
//! # Reference
//! - [ECMA-335 II.24.2.4](https://ecma-international.org/wp-content/uploads/ECMA-335_6th_edition_june_2012.pdf)

use std::collections::HashMap;

use widestring::U16String;

use crate::{
    io::{compressed_uint_size, write_compressed_uint},
    metadata::heaps::UserStringHandle,
    Error, Result,
};

/// Addressable size limit of the `#US` heap (24-bit `ldstr` offsets).
pub const USER_STRING_HEAP_SIZE_LIMIT: u32 = 0x0100_0000;

/// A reserved, not yet filled `#US` heap region.
///
/// Produced by [`UserStringHeapBuilder::reserve`]; must be passed back to
/// [`UserStringHeapBuilder::fill`] exactly once before the heaps are frozen.
#[derive(Debug)]
pub struct UserStringFixup {
    data_offset: usize,
    length: usize,
}

/// Interning builder for the `#US` heap.
///
/// Unlike the `#Strings` heap, user string bytes are written eagerly: each entry's
/// offset is assigned at intern time and never shifts. Deduplication is by exact
/// string value.
pub struct UserStringHeapBuilder {
    strings: HashMap<String, UserStringHandle>,
    data: Vec<u8>,
    start_offset: u32,
    pending_fixups: usize,
}

impl UserStringHeapBuilder {
    /// Creates a builder for a first-generation heap (start offset 0).
    #[must_use]
    pub fn new() -> Self {
        Self::with_start_offset(0)
    }

    /// Creates a builder whose offsets begin at `start_offset` (EnC deltas).
    #[must_use]
    pub fn with_start_offset(start_offset: u32) -> Self {
        UserStringHeapBuilder {
            strings: HashMap::new(),
            data: if start_offset == 0 { vec![0] } else { Vec::new() },
            start_offset,
            pending_fixups: 0,
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn next_offset(&self) -> u32 {
        self.start_offset + self.data.len() as u32
    }

    fn ensure_capacity(&self, additional: u32) -> Result<()> {
        if self.next_offset().saturating_add(additional) > USER_STRING_HEAP_SIZE_LIMIT {
            return Err(Error::HeapSizeLimitExceeded {
                heap: "#US",
                limit: USER_STRING_HEAP_SIZE_LIMIT,
            });
        }

        Ok(())
    }

    /// Interns a user string and returns its heap offset handle.
    ///
    /// # Errors
    /// Returns [`Error::HeapSizeLimitExceeded`] if appending the entry would push
    /// the heap past its 24-bit addressable range.
    #[allow(clippy::cast_possible_truncation)]
    pub fn get_or_add(&mut self, value: &str) -> Result<UserStringHandle> {
        if let Some(handle) = self.strings.get(value) {
            return Ok(*handle);
        }

        let units = U16String::from_str(value).into_vec();
        let byte_length = units.len() as u32 * 2 + 1;
        self.ensure_capacity(compressed_uint_size(byte_length) + byte_length)?;

        let handle = UserStringHandle(self.next_offset());
        write_compressed_uint(byte_length, &mut self.data);
        for unit in &units {
            self.data.extend_from_slice(&unit.to_le_bytes());
        }
        self.data.push(u8::from(requires_marker(&units)));

        self.strings.insert(value.to_string(), handle);
        Ok(handle)
    }

    /// Reserves a zero-filled entry for a string of `length` UTF-16 code units.
    ///
    /// The handle is valid immediately and may be referenced before the content
    /// is known (self-referential module-id strings in EnC scenarios). The
    /// returned fixup must be resolved via [`UserStringHeapBuilder::fill`]
    /// before freezing.
    ///
    /// # Errors
    /// Returns [`Error::HeapSizeLimitExceeded`] if the reservation would push the
    /// heap past its 24-bit addressable range.
    #[allow(clippy::cast_possible_truncation)]
    pub fn reserve(&mut self, length: usize) -> Result<(UserStringHandle, UserStringFixup)> {
        let byte_length = length as u32 * 2 + 1;
        self.ensure_capacity(compressed_uint_size(byte_length) + byte_length)?;

        let handle = UserStringHandle(self.next_offset());
        write_compressed_uint(byte_length, &mut self.data);

        let data_offset = self.data.len();
        self.data.resize(self.data.len() + byte_length as usize, 0);
        self.pending_fixups += 1;

        Ok((
            handle,
            UserStringFixup {
                data_offset,
                length,
            },
        ))
    }

    /// Fills a reserved entry with its final content.
    ///
    /// # Panics
    /// Panics if the string's UTF-16 length differs from the reserved length;
    /// a mismatch is an emitter bug, not an input error.
    pub fn fill(&mut self, fixup: UserStringFixup, value: &str) {
        let units = U16String::from_str(value).into_vec();
        assert_eq!(
            units.len(),
            fixup.length,
            "reserved user string length mismatch"
        );

        let mut position = fixup.data_offset;
        for unit in &units {
            self.data[position..position + 2].copy_from_slice(&unit.to_le_bytes());
            position += 2;
        }
        self.data[position] = u8::from(requires_marker(&units));

        self.pending_fixups -= 1;
    }

    /// Produces the final heap image.
    ///
    /// # Panics
    /// Panics if any reservation has not been filled.
    #[must_use]
    pub(crate) fn freeze(self) -> UserStringHeap {
        assert_eq!(
            self.pending_fixups, 0,
            "unfilled user string reservations at freeze"
        );

        UserStringHeap {
            data: self.data,
            start_offset: self.start_offset,
        }
    }
}

impl Default for UserStringHeapBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Whether a string needs its trailing kind byte set.
///
/// Set for any code unit at or above 0x7F, and for the control characters the
/// runtime treats specially (0x01-0x08, 0x0E-0x1F, 0x27, 0x2D).
fn requires_marker(units: &[u16]) -> bool {
    units
        .iter()
        .any(|&unit| unit >= 0x7F || matches!(unit, 0x01..=0x08 | 0x0E..=0x1F | 0x27 | 0x2D))
}

/// The frozen `#US` heap image.
pub struct UserStringHeap {
    data: Vec<u8>,
    start_offset: u32,
}

impl UserStringHeap {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedup_is_idempotent() {
        let mut builder = UserStringHeapBuilder::new();
        let a = builder.get_or_add("Hello").unwrap();
        let b = builder.get_or_add("Hello").unwrap();
        assert_eq!(a, b);

        let heap = builder.freeze();
        // nil byte + prefix(11) + 5 UTF-16 units + kind byte
        assert_eq!(heap.data().len(), 1 + 1 + 10 + 1);
    }

    #[test]
    fn entry_layout() {
        let mut builder = UserStringHeapBuilder::new();
        let handle = builder.get_or_add("Hi").unwrap();
        assert_eq!(handle.offset(), 1);

        let heap = builder.freeze();
        assert_eq!(heap.data(), &[0x00, 0x05, b'H', 0x00, b'i', 0x00, 0x00]);
    }

    #[test]
    fn kind_byte_for_special_characters() {
        let mut builder = UserStringHeapBuilder::new();
        builder.get_or_add("\u{00e9}").unwrap();
        let heap = builder.freeze();
        assert_eq!(heap.data().last(), Some(&1));

        let mut builder = UserStringHeapBuilder::new();
        builder.get_or_add("'").unwrap();
        let heap = builder.freeze();
        assert_eq!(heap.data().last(), Some(&1));

        let mut builder = UserStringHeapBuilder::new();
        builder.get_or_add("plain").unwrap();
        let heap = builder.freeze();
        assert_eq!(heap.data().last(), Some(&0));
    }

    #[test]
    fn surrogate_pairs_count_as_two_units() {
        let mut builder = UserStringHeapBuilder::new();
        builder.get_or_add("\u{1F600}").unwrap();
        let heap = builder.freeze();
        // nil byte + prefix(5) + 2 units + kind byte
        assert_eq!(heap.data().len(), 1 + 1 + 4 + 1);
        assert_eq!(heap.data()[1], 5);
    }

    #[test]
    fn reserve_then_fill() {
        let mut builder = UserStringHeapBuilder::new();
        let (handle, fixup) = builder.reserve(3).unwrap();
        assert_eq!(handle.offset(), 1);

        // The region is addressable before its content exists.
        let interned_after = builder.get_or_add("next").unwrap();
        assert_eq!(interned_after.offset(), 1 + 1 + 7);

        builder.fill(fixup, "abc");
        let heap = builder.freeze();
        assert_eq!(&heap.data()[1..9], &[0x07, b'a', 0, b'b', 0, b'c', 0, 0x00]);
    }

    #[test]
    #[should_panic(expected = "unfilled user string reservations")]
    fn unfilled_reservation_panics_at_freeze() {
        let mut builder = UserStringHeapBuilder::new();
        let _ = builder.reserve(2).unwrap();
        let _ = builder.freeze();
    }

    #[test]
    fn heap_limit_is_reported() {
        let mut builder = UserStringHeapBuilder::with_start_offset(USER_STRING_HEAP_SIZE_LIMIT - 4);
        let err = builder.get_or_add("too big").unwrap_err();
        match err {
            Error::HeapSizeLimitExceeded { heap, limit } => {
                assert_eq!(heap, "#US");
                assert_eq!(limit, USER_STRING_HEAP_SIZE_LIMIT);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
