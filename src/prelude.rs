//! # dotemit Prelude
//!
//! Convenient single import for the types almost every emitter touches: the
//! builder, the serializers, handles, tokens and table identifiers.

pub use crate::{Error, Result};

pub use crate::{
    FrozenMetadata, MetadataBuilder, StandaloneDebugMetadataSerializer,
    TypeSystemMetadataSerializer,
};

pub use crate::metadata::constant::Constant;
pub use crate::metadata::heaps::{
    BlobHandle, GuidFixup, GuidHandle, StringHandle, UserStringFixup, UserStringHandle,
};
pub use crate::metadata::sizes::{HeapIndex, HeapSizeFlags, HeapSizes, MetadataSizes};
pub use crate::metadata::tables::{CodedIndexType, TableId, TABLE_COUNT};
pub use crate::metadata::token::Token;
pub use crate::metadata::Version;
