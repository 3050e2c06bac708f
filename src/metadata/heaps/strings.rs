//! String Heap (`#Strings`) builder.
//!
//! Identifier strings are interned with virtual handles during accumulation; no heap
//! bytes exist until the builder is frozen. The freeze pass sorts all distinct strings
//! so that a string is followed immediately by every string that is a suffix of it,
//! then folds each suffix into the tail of the previously written string, reusing its
//! NUL terminator. `Foo` interned next to `BarFoo` costs no additional bytes.
//!
//! # Reference
//! - [ECMA-335 II.24.2.3](https://ecma-international.org/wp-content/uploads/ECMA-335_6th_edition_june_2012.pdf)

use std::{cmp::Ordering, collections::HashMap};

use crate::metadata::heaps::StringHandle;

/// Interning builder for the `#Strings` heap.
///
/// Handles returned before the freeze are virtual: equal input always yields the
/// same handle, but byte offsets are only assigned once [`StringHeapBuilder::freeze`]
/// runs the suffix-folding pass. The empty string always maps to the nil handle.
pub struct StringHeapBuilder {
    strings: HashMap<String, StringHandle>,
    start_offset: u32,
}

impl StringHeapBuilder {
    /// Creates a builder for a first-generation heap (start offset 0).
    #[must_use]
    pub fn new() -> Self {
        Self::with_start_offset(0)
    }

    /// Creates a builder whose resolved offsets begin at `start_offset`.
    ///
    /// Used for edit-and-continue deltas, where this generation's heap is
    /// logically appended to the previous generations' heaps and handles must
    /// stay valid across the whole concatenation.
    #[must_use]
    pub fn with_start_offset(start_offset: u32) -> Self {
        StringHeapBuilder {
            strings: HashMap::new(),
            start_offset,
        }
    }

    /// Interns a string and returns its stable handle.
    ///
    /// The empty string maps to [`StringHandle::EMPTY`]. No bytes are written
    /// here; equal input returns an identical handle across calls.
    pub fn get_or_add(&mut self, value: &str) -> StringHandle {
        if value.is_empty() {
            return StringHandle::EMPTY;
        }

        if let Some(handle) = self.strings.get(value) {
            return *handle;
        }

        // Virtual index; the u32 space is never exhausted before the heap itself is.
        #[allow(clippy::cast_possible_truncation)]
        let handle = StringHandle(self.strings.len() as u32 + 1);
        self.strings.insert(value.to_string(), handle);
        handle
    }

    /// Number of distinct non-empty strings interned so far.
    #[must_use]
    pub fn count(&self) -> usize {
        self.strings.len()
    }

    /// Runs the suffix-folding pass and produces the final heap image.
    ///
    /// Executed exactly once; afterwards every virtual handle resolves to its
    /// byte offset through the returned [`StringHeap`].
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub(crate) fn freeze(self) -> StringHeap {
        let mut sorted: Vec<(String, StringHandle)> = self.strings.into_iter().collect();
        sorted.sort_by(|a, b| suffix_order(&a.0, &b.0));

        let mut offsets = vec![0u32; sorted.len() + 1];
        let mut data = Vec::new();
        if self.start_offset == 0 {
            // Slot for the empty string.
            data.push(0);
        }

        let mut prev: &str = "";
        for (value, handle) in &sorted {
            let position = self.start_offset + data.len() as u32;

            // A fold point in UTF-8 is always a character boundary, so reusing the
            // tail of `prev` can never split an encoded character.
            if prev.ends_with(value.as_str()) {
                // Map over the tail of prev. Watch for the NUL terminator of prev.
                offsets[handle.0 as usize] = position - (value.len() as u32 + 1);
            } else {
                offsets[handle.0 as usize] = position;
                data.extend_from_slice(value.as_bytes());
                data.push(0);
            }

            prev = value;
        }

        StringHeap {
            offsets,
            data,
            start_offset: self.start_offset,
        }
    }
}

impl Default for StringHeapBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Sorts strings such that a string is followed immediately by all strings
/// that are a suffix of it.
///
/// Characters are compared from the end of each string backward; equal-suffix
/// ties put the longer string first.
fn suffix_order(x: &str, y: &str) -> Ordering {
    let xb = x.as_bytes();
    let yb = y.as_bytes();

    let mut i = xb.len();
    let mut j = yb.len();
    while i > 0 && j > 0 {
        i -= 1;
        j -= 1;

        match xb[i].cmp(&yb[j]) {
            Ordering::Equal => {}
            other => return other,
        }
    }

    yb.len().cmp(&xb.len())
}

/// The frozen `#Strings` heap: final bytes plus the virtual-to-offset map.
pub struct StringHeap {
    offsets: Vec<u32>,
    data: Vec<u8>,
    start_offset: u32,
}

impl StringHeap {
    /// Resolves a virtual handle to its byte offset in the heap.
    #[must_use]
    pub fn offset_of(&self, handle: StringHandle) -> u32 {
        self.offsets[handle.0 as usize]
    }

    /// This generation's heap bytes (excluding previous generations).
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Total addressable heap size including previous generations, unaligned.
    ///
    /// Drives the 2-vs-4-byte width decision for string columns.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn unaligned_size(&self) -> u32 {
        self.start_offset + self.data.len() as u32
    }
}
