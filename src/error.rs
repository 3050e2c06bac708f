use thiserror::Error;

/// The generic Error type, covering every failure this library can report to a caller.
///
/// Emission is designed so that, given a well-formed model from an upstream compiler,
/// interning and row-appending cannot fail. The failures that remain are format
/// limitations of the ECMA-335 container itself, which a caller can react to (for
/// example by splitting a module), plus the bounds-check guard of the low-level
/// buffer writers.
///
/// Bugs in the upstream emitter (mutating after freeze, handing a coded index an
/// inadmissible token kind, filling a reservation with mismatched content) are
/// contract violations and panic instead of surfacing here.
#[derive(Error, Debug)]
pub enum Error {
    /// A metadata heap grew past its addressable range.
    ///
    /// The `#US` heap is addressed by 24-bit offsets embedded in IL `ldstr`
    /// tokens, so its content may not exceed 0x0100_0000 bytes. The offending
    /// heap is named so the caller can report which limit was hit.
    #[error("The '{heap}' heap exceeds its addressable size limit of {limit:#x} bytes")]
    HeapSizeLimitExceeded {
        /// Stream name of the heap that overflowed (e.g. `#US`)
        heap: &'static str,
        /// The addressable limit that was exceeded, in bytes
        limit: u32,
    },

    /// The metadata version string does not fit the root header.
    ///
    /// The padded version field of the `BSJB` root header is limited to 255
    /// bytes, leaving at most 254 bytes for the UTF-8 string itself.
    #[error("Metadata version string is longer than {0} bytes")]
    VersionTooLong(usize),

    /// An out of bound write would have occurred!
    ///
    /// The serializer preallocates its output buffer from the computed stream
    /// sizes; this error indicates a write past the end of that buffer and is
    /// not reachable when the size computation and the writers agree.
    #[error("Out of Bound access would have occurred!")]
    OutOfBounds,
}

/// Result alias used throughout this crate.
pub type Result<T> = std::result::Result<T, Error>;
