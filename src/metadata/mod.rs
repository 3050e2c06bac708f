//! # Metadata Emission
//!
//! Everything needed to turn an in-memory module model into the ECMA-335 metadata
//! byte stream lives under this module:
//!
//! - [`builder`] - the accumulation surface ([`crate::MetadataBuilder`]) and the
//!   frozen form produced by the one-shot freeze transition
//! - [`heaps`] - interning builders for the `#Strings`, `#US`, `#Blob` and `#GUID` heaps
//! - [`tables`] - table identifiers, coded-index schemes and row records
//! - [`sizes`] - the derived layout facts (reference widths, bitmasks, stream sizes)
//! - [`serializer`] - the writers producing the final `BSJB` blob
//! - [`token`] - the 32-bit entity handle shared by all table operations
//! - [`constant`] - typed constant values and their blob encodings

pub mod builder;
pub mod constant;
pub mod heaps;
pub mod serializer;
pub mod sizes;
pub mod tables;

/// The 32-bit entity handle shared by all table operations.
pub mod token;

/// A four-part assembly version number (major.minor.build.revision).
///
/// Serialized as four consecutive little-endian `u16` columns in the `Assembly`
/// and `AssemblyRef` tables.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Version {
    /// Major version component
    pub major: u16,
    /// Minor version component
    pub minor: u16,
    /// Build number component
    pub build: u16,
    /// Revision number component
    pub revision: u16,
}

impl Version {
    /// Creates a version from its four components.
    #[must_use]
    pub fn new(major: u16, minor: u16, build: u16, revision: u16) -> Self {
        Version {
            major,
            minor,
            build,
            revision,
        }
    }
}
