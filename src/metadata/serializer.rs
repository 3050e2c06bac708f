//! # Metadata Serialization
//!
//! The serializers turn a [`FrozenMetadata`] into the final `BSJB` byte blob. They are
//! the terminal state of the emission lifecycle: construction computes the
//! [`MetadataSizes`] (exactly once, strictly after the freeze), and `serialize`
//! consumes the serializer, so a blob can only be produced once per builder.
//!
//! The output buffer is preallocated to the exact total size derived from the sizes,
//! filled front to back with the bounds-checked writers from [`crate::io`], and
//! cross-checked with debug assertions at every stream boundary.
//!
//! Two emission modes exist:
//!
//! - [`TypeSystemMetadataSerializer`] - metadata embedded in an executable, including
//!   edit-and-continue delta generations (uncompressed `#-` tables stream plus the
//!   zero-length `#JTD` marker stream)
//! - [`StandaloneDebugMetadataSerializer`] - a standalone portable-PDB blob, whose
//!   `#Pdb` stream is written first so a reader can recover the debug-metadata ID
//!   from the first page, and whose 20-byte ID is derived from the serialized content
//!   by a caller-supplied hash function
//!
//! # Reference
//! - [ECMA-335 II.24.2](https://ecma-international.org/wp-content/uploads/ECMA-335_6th_edition_june_2012.pdf)
//! - [Portable PDB format](https://github.com/dotnet/runtime/blob/main/docs/design/specs/PortablePdb-Metadata.md)

use crate::{
    io::{align_4, write_bytes_at, write_le_at, write_le_at_dyn},
    metadata::{
        builder::FrozenMetadata,
        sizes::{HeapIndex, MetadataSizes, DEBUG_TABLES},
        tables::{CodedIndexType, TableId, TABLE_COUNT},
        token::Token,
    },
    Error, Result,
};

/// Magic signature of the metadata root header (`BSJB`).
pub const METADATA_SIGNATURE: u32 = 0x424A_5342;

/// Maximum UTF-8 byte length of the metadata version string.
pub const MAX_METADATA_VERSION_LENGTH: usize = 254;

/// Size of the `#Pdb` stream's content-derived ID, in bytes.
pub const PDB_ID_SIZE: usize = 20;

/// Serializer for metadata embedded in an executable image.
///
/// Consumes the frozen builder output; `serialize` is the one-shot transition to
/// the terminal Written state.
pub struct TypeSystemMetadataSerializer {
    metadata: FrozenMetadata,
    sizes: MetadataSizes,
    version: String,
    is_minimal_delta: bool,
}

impl TypeSystemMetadataSerializer {
    /// Computes the layout for a type-system metadata blob.
    ///
    /// ## Arguments
    /// * `metadata` - The frozen builder output
    /// * `version` - The runtime version string of the root header (e.g. `v4.0.30319`)
    /// * `is_minimal_delta` - True for a minimal EnC delta generation; selects the
    ///   uncompressed `#-` tables stream, wide references and the `#JTD` marker
    ///
    /// # Errors
    /// Returns [`Error::VersionTooLong`] if the version string exceeds
    /// [`MAX_METADATA_VERSION_LENGTH`] bytes.
    pub fn new(
        metadata: FrozenMetadata,
        version: &str,
        is_minimal_delta: bool,
    ) -> Result<Self> {
        if version.len() > MAX_METADATA_VERSION_LENGTH {
            return Err(Error::VersionTooLong(MAX_METADATA_VERSION_LENGTH));
        }

        let sizes = MetadataSizes::new(
            metadata.row_counts(),
            metadata.heap_sizes(),
            metadata.heap_stream_sizes(),
            is_minimal_delta,
            false,
        );

        Ok(TypeSystemMetadataSerializer {
            metadata,
            sizes,
            version: version.to_string(),
            is_minimal_delta,
        })
    }

    /// The layout facts computed for this emission.
    #[must_use]
    pub fn sizes(&self) -> &MetadataSizes {
        &self.sizes
    }

    /// Serializes the complete metadata blob.
    ///
    /// ## Arguments
    /// * `method_body_stream_rva` - RVA of the IL stream; added to every method's
    ///   body offset to form the `MethodDef` RVA column
    /// * `mapped_field_data_stream_rva` - RVA of the mapped field data stream;
    ///   added to every `FieldRVA` offset
    ///
    /// # Errors
    /// Returns [`Error::OutOfBounds`] if a writer runs past the preallocated
    /// buffer, which indicates an internal size-computation bug.
    pub fn serialize(
        self,
        method_body_stream_rva: u32,
        mapped_field_data_stream_rva: u32,
    ) -> Result<Vec<u8>> {
        let tables_stream_name = if self.is_minimal_delta { "#-" } else { "#~" };

        let mut streams: Vec<(&str, u32)> = vec![
            (tables_stream_name, self.sizes.table_stream_size()),
            ("#Strings", self.sizes.aligned_heap_size(HeapIndex::String)),
            ("#US", self.sizes.aligned_heap_size(HeapIndex::UserString)),
            ("#GUID", self.sizes.aligned_heap_size(HeapIndex::Guid)),
            ("#Blob", self.sizes.aligned_heap_size(HeapIndex::Blob)),
        ];
        if self.is_minimal_delta {
            streams.push(("#JTD", 0));
        }

        let header_size = metadata_header_size(&self.version, &streams);
        let total_size = header_size + streams.iter().map(|(_, size)| size).sum::<u32>();

        let mut data = vec![0u8; total_size as usize];
        let mut offset = 0;

        serialize_metadata_header(&mut data, &mut offset, &self.version, &streams, header_size)?;
        serialize_tables(
            &mut data,
            &mut offset,
            &self.metadata,
            &self.sizes,
            method_body_stream_rva,
            mapped_field_data_stream_rva,
        )?;
        serialize_heaps(&mut data, &mut offset, &self.metadata, &self.sizes)?;

        debug_assert_eq!(offset, total_size as usize);
        Ok(data)
    }
}

/// Serializer for standalone portable-PDB metadata.
///
/// The `#Pdb` stream is emitted first after the root header; its 20-byte ID is
/// computed from the complete serialized blob by the caller-supplied provider and
/// patched into the reserved region before the blob is returned, making the output
/// fully content-deterministic.
pub struct StandaloneDebugMetadataSerializer {
    metadata: FrozenMetadata,
    sizes: MetadataSizes,
    version: String,
    entry_point: Token,
    external_row_counts: [u32; TABLE_COUNT],
}

impl StandaloneDebugMetadataSerializer {
    /// Computes the layout for a standalone debug-metadata blob.
    ///
    /// ## Arguments
    /// * `metadata` - The frozen builder output; must contain only debug tables
    /// * `version` - The root header version string (e.g. `PDB v1.0`)
    /// * `external_row_counts` - Row counts of the type-system module this PDB
    ///   describes, written into the `#Pdb` stream
    /// * `entry_point` - The module's entry-point method, or `None`
    ///
    /// # Errors
    /// Returns [`Error::VersionTooLong`] if the version string exceeds
    /// [`MAX_METADATA_VERSION_LENGTH`] bytes.
    pub fn new(
        metadata: FrozenMetadata,
        version: &str,
        external_row_counts: [u32; TABLE_COUNT],
        entry_point: Option<Token>,
    ) -> Result<Self> {
        if version.len() > MAX_METADATA_VERSION_LENGTH {
            return Err(Error::VersionTooLong(MAX_METADATA_VERSION_LENGTH));
        }

        let entry_point = entry_point.unwrap_or_else(Token::nil);
        debug_assert!(
            entry_point.is_null() || entry_point.table_id() == Some(TableId::MethodDef),
            "entry point must be a MethodDef token"
        );

        let sizes = MetadataSizes::new(
            metadata.row_counts(),
            metadata.heap_sizes(),
            metadata.heap_stream_sizes(),
            false,
            true,
        );
        debug_assert_eq!(
            sizes.present_tables() & !DEBUG_TABLES,
            0,
            "standalone debug metadata must only carry debug tables"
        );

        Ok(StandaloneDebugMetadataSerializer {
            metadata,
            sizes,
            version: version.to_string(),
            entry_point,
            external_row_counts,
        })
    }

    /// The layout facts computed for this emission.
    #[must_use]
    pub fn sizes(&self) -> &MetadataSizes {
        &self.sizes
    }

    /// Size of the `#Pdb` stream: ID, entry point, external mask and row counts.
    #[must_use]
    pub fn pdb_stream_size(&self) -> u32 {
        let external_count = self
            .external_row_counts
            .iter()
            .filter(|count| **count > 0)
            .count() as u32;

        PDB_ID_SIZE as u32 + 4 + 8 + 4 * external_count
    }

    /// Serializes the complete debug-metadata blob.
    ///
    /// The `id_provider` receives the full serialized content (with a zeroed ID
    /// region) and returns the 20-byte content ID that is patched into the
    /// `#Pdb` stream. Hashing the exact bytes that were just written keeps the
    /// output deterministic and reproducible.
    ///
    /// # Errors
    /// Returns [`Error::OutOfBounds`] if a writer runs past the preallocated
    /// buffer, which indicates an internal size-computation bug.
    pub fn serialize<F>(self, id_provider: F) -> Result<Vec<u8>>
    where
        F: FnOnce(&[u8]) -> [u8; PDB_ID_SIZE],
    {
        let streams: Vec<(&str, u32)> = vec![
            // First after the root header: only one page must be read to find the ID.
            ("#Pdb", self.pdb_stream_size()),
            ("#~", self.sizes.table_stream_size()),
            ("#Strings", self.sizes.aligned_heap_size(HeapIndex::String)),
            ("#US", self.sizes.aligned_heap_size(HeapIndex::UserString)),
            ("#GUID", self.sizes.aligned_heap_size(HeapIndex::Guid)),
            ("#Blob", self.sizes.aligned_heap_size(HeapIndex::Blob)),
        ];

        let header_size = metadata_header_size(&self.version, &streams);
        let total_size = header_size + streams.iter().map(|(_, size)| size).sum::<u32>();

        let mut data = vec![0u8; total_size as usize];
        let mut offset = 0;

        serialize_metadata_header(&mut data, &mut offset, &self.version, &streams, header_size)?;
        let id_offset = serialize_pdb_stream(
            &mut data,
            &mut offset,
            self.entry_point,
            &self.external_row_counts,
        )?;
        serialize_tables(&mut data, &mut offset, &self.metadata, &self.sizes, 0, 0)?;
        serialize_heaps(&mut data, &mut offset, &self.metadata, &self.sizes)?;

        debug_assert_eq!(offset, total_size as usize);

        let id = id_provider(&data);
        data[id_offset..id_offset + PDB_ID_SIZE].copy_from_slice(&id);

        Ok(data)
    }
}

fn stream_header_size(name: &str) -> u32 {
    // offset + size + NUL-terminated name padded to a 4-byte boundary
    8 + align_4(name.len() as u32 + 1)
}

fn metadata_header_size(version: &str, streams: &[(&str, u32)]) -> u32 {
    16 + align_4(version.len() as u32 + 1)
        + 4
        + streams
            .iter()
            .map(|(name, _)| stream_header_size(name))
            .sum::<u32>()
}

fn serialize_metadata_header(
    data: &mut [u8],
    offset: &mut usize,
    version: &str,
    streams: &[(&str, u32)],
    header_size: u32,
) -> Result<()> {
    let start = *offset;

    write_le_at::<u32>(data, offset, METADATA_SIGNATURE)?;
    write_le_at::<u16>(data, offset, 1)?; // major version
    write_le_at::<u16>(data, offset, 1)?; // minor version
    write_le_at::<u32>(data, offset, 0)?; // reserved

    let padded_version_length = align_4(version.len() as u32 + 1);
    write_le_at::<u32>(data, offset, padded_version_length)?;
    write_bytes_at(data, offset, version.as_bytes())?;
    // NUL-filled tail up to the padded length; the buffer is pre-zeroed.
    *offset += (padded_version_length as usize) - version.len();

    write_le_at::<u16>(data, offset, 0)?; // reserved
    #[allow(clippy::cast_possible_truncation)]
    write_le_at::<u16>(data, offset, streams.len() as u16)?;

    let mut stream_offset = header_size;
    for (name, size) in streams {
        write_le_at::<u32>(data, offset, stream_offset)?;
        write_le_at::<u32>(data, offset, *size)?;
        write_bytes_at(data, offset, name.as_bytes())?;
        *offset += (align_4(name.len() as u32 + 1) as usize) - name.len();
        stream_offset += size;
    }

    debug_assert_eq!(*offset - start, header_size as usize);
    Ok(())
}

fn serialize_pdb_stream(
    data: &mut [u8],
    offset: &mut usize,
    entry_point: Token,
    external_row_counts: &[u32; TABLE_COUNT],
) -> Result<usize> {
    // The ID region stays zeroed here; it is patched once the whole blob exists.
    let id_offset = *offset;
    *offset += PDB_ID_SIZE;

    write_le_at::<u32>(data, offset, entry_point.value())?;

    let mut external_tables = 0u64;
    for (index, count) in external_row_counts.iter().enumerate() {
        if *count > 0 {
            external_tables |= 1u64 << index;
        }
    }
    write_le_at::<u64>(data, offset, external_tables)?;

    for count in external_row_counts.iter().filter(|count| **count > 0) {
        write_le_at::<u32>(data, offset, *count)?;
    }

    Ok(id_offset)
}

fn serialize_heaps(
    data: &mut [u8],
    offset: &mut usize,
    metadata: &FrozenMetadata,
    sizes: &MetadataSizes,
) -> Result<()> {
    for (heap, bytes) in [
        (HeapIndex::String, metadata.strings.data()),
        (HeapIndex::UserString, metadata.user_strings.data()),
        (HeapIndex::Guid, metadata.guids.data()),
        (HeapIndex::Blob, metadata.blobs.data()),
    ] {
        let start = *offset;
        write_bytes_at(data, offset, bytes)?;
        // Zero padding to the aligned stream size; the buffer is pre-zeroed.
        *offset = start + sizes.aligned_heap_size(heap) as usize;
    }

    Ok(())
}

#[allow(clippy::cast_possible_truncation)]
fn serialize_tables(
    data: &mut [u8],
    offset: &mut usize,
    metadata: &FrozenMetadata,
    sizes: &MetadataSizes,
    method_body_stream_rva: u32,
    mapped_field_data_stream_rva: u32,
) -> Result<()> {
    let start = *offset;

    // Tables-stream header.
    write_le_at::<u32>(data, offset, 0)?; // reserved
    write_le_at::<u8>(data, offset, 2)?; // format major version
    write_le_at::<u8>(data, offset, 0)?; // format minor version
    write_le_at::<u8>(data, offset, sizes.heap_size_flags().bits())?;
    write_le_at::<u8>(data, offset, 1)?; // reserved
    write_le_at::<u64>(data, offset, sizes.present_tables())?;
    write_le_at::<u64>(data, offset, sizes.sorted_tables())?;

    for index in 0..TABLE_COUNT {
        if sizes.present_tables() & (1u64 << index) != 0 {
            let table = TableId::from_tag(index as u8).expect("present table has a known id");
            write_le_at::<u32>(data, offset, sizes.row_count(table))?;
        }
    }
    debug_assert_eq!(*offset - start, sizes.table_stream_header_size() as usize);

    let tables = &metadata.tables;

    for row in &tables.module {
        write_le_at::<u16>(data, offset, row.generation)?;
        write_str(data, offset, metadata, sizes, row.name)?;
        write_le_at_dyn(data, offset, row.mvid.index(), sizes.is_large_guid())?;
        write_le_at_dyn(data, offset, row.enc_id.index(), sizes.is_large_guid())?;
        write_le_at_dyn(data, offset, row.enc_base_id.index(), sizes.is_large_guid())?;
    }

    for row in &tables.type_ref {
        write_coded(data, offset, sizes, CodedIndexType::ResolutionScope, row.resolution_scope)?;
        write_str(data, offset, metadata, sizes, row.name)?;
        write_str(data, offset, metadata, sizes, row.namespace)?;
    }

    for row in &tables.type_def {
        write_le_at::<u32>(data, offset, row.flags)?;
        write_str(data, offset, metadata, sizes, row.name)?;
        write_str(data, offset, metadata, sizes, row.namespace)?;
        write_coded(data, offset, sizes, CodedIndexType::TypeDefOrRef, row.extends)?;
        write_row(data, offset, sizes, TableId::Field, row.field_list)?;
        write_row(data, offset, sizes, TableId::MethodDef, row.method_list)?;
    }

    for row in &tables.field {
        write_le_at::<u16>(data, offset, row.flags)?;
        write_str(data, offset, metadata, sizes, row.name)?;
        write_blob(data, offset, sizes, row.signature.offset())?;
    }

    for row in &tables.method_def {
        match row.body_offset {
            Some(body_offset) => {
                write_le_at::<u32>(data, offset, method_body_stream_rva + body_offset)?;
            }
            None => write_le_at::<u32>(data, offset, 0)?,
        }
        write_le_at::<u16>(data, offset, row.impl_flags)?;
        write_le_at::<u16>(data, offset, row.flags)?;
        write_str(data, offset, metadata, sizes, row.name)?;
        write_blob(data, offset, sizes, row.signature.offset())?;
        write_row(data, offset, sizes, TableId::Param, row.param_list)?;
    }

    for row in &tables.param {
        write_le_at::<u16>(data, offset, row.flags)?;
        write_le_at::<u16>(data, offset, row.sequence)?;
        write_str(data, offset, metadata, sizes, row.name)?;
    }

    for row in &tables.interface_impl {
        write_row(data, offset, sizes, TableId::TypeDef, row.class)?;
        write_coded(data, offset, sizes, CodedIndexType::TypeDefOrRef, row.interface)?;
    }

    for row in &tables.member_ref {
        write_coded(data, offset, sizes, CodedIndexType::MemberRefParent, row.class)?;
        write_str(data, offset, metadata, sizes, row.name)?;
        write_blob(data, offset, sizes, row.signature.offset())?;
    }

    // The six parent-ordered tables are stably sorted here, not before: nothing
    // references their rows, so the deferred reorder cannot invalidate a handle.
    let mut constants: Vec<_> = tables.constant.iter().collect();
    if tables.constant_needs_sorting {
        constants.sort_by_key(|row| row.parent);
    }
    for row in constants {
        write_le_at::<u8>(data, offset, row.type_code)?;
        write_le_at::<u8>(data, offset, 0)?; // padding
        write_coded(data, offset, sizes, CodedIndexType::HasConstant, row.parent)?;
        write_blob(data, offset, sizes, row.value.offset())?;
    }

    let mut custom_attributes: Vec<_> = tables.custom_attribute.iter().collect();
    if tables.custom_attribute_needs_sorting {
        custom_attributes.sort_by_key(|row| row.parent);
    }
    for row in custom_attributes {
        write_coded(data, offset, sizes, CodedIndexType::HasCustomAttribute, row.parent)?;
        write_coded(data, offset, sizes, CodedIndexType::CustomAttributeType, row.constructor)?;
        write_blob(data, offset, sizes, row.value.offset())?;
    }

    let mut field_marshals: Vec<_> = tables.field_marshal.iter().collect();
    if tables.field_marshal_needs_sorting {
        field_marshals.sort_by_key(|row| row.parent);
    }
    for row in field_marshals {
        write_coded(data, offset, sizes, CodedIndexType::HasFieldMarshal, row.parent)?;
        write_blob(data, offset, sizes, row.native_type.offset())?;
    }

    let mut decl_securities: Vec<_> = tables.decl_security.iter().collect();
    if tables.decl_security_needs_sorting {
        decl_securities.sort_by_key(|row| row.parent);
    }
    for row in decl_securities {
        write_le_at::<u16>(data, offset, row.action)?;
        write_coded(data, offset, sizes, CodedIndexType::HasDeclSecurity, row.parent)?;
        write_blob(data, offset, sizes, row.permission_set.offset())?;
    }

    #[cfg(debug_assertions)]
    for window in tables.class_layout.windows(2) {
        debug_assert!(window[0].parent < window[1].parent, "ClassLayout order");
    }
    for row in &tables.class_layout {
        write_le_at::<u16>(data, offset, row.packing_size)?;
        write_le_at::<u32>(data, offset, row.class_size)?;
        write_row(data, offset, sizes, TableId::TypeDef, row.parent)?;
    }

    #[cfg(debug_assertions)]
    for window in tables.field_layout.windows(2) {
        debug_assert!(window[0].field < window[1].field, "FieldLayout order");
    }
    for row in &tables.field_layout {
        write_le_at::<u32>(data, offset, row.offset)?;
        write_row(data, offset, sizes, TableId::Field, row.field)?;
    }

    for row in &tables.stand_alone_sig {
        write_blob(data, offset, sizes, row.signature.offset())?;
    }

    for row in &tables.event_map {
        write_row(data, offset, sizes, TableId::TypeDef, row.parent)?;
        write_row(data, offset, sizes, TableId::Event, row.event_list)?;
    }

    for row in &tables.event {
        write_le_at::<u16>(data, offset, row.flags)?;
        write_str(data, offset, metadata, sizes, row.name)?;
        write_coded(data, offset, sizes, CodedIndexType::TypeDefOrRef, row.event_type)?;
    }

    for row in &tables.property_map {
        write_row(data, offset, sizes, TableId::TypeDef, row.parent)?;
        write_row(data, offset, sizes, TableId::Property, row.property_list)?;
    }

    for row in &tables.property {
        write_le_at::<u16>(data, offset, row.flags)?;
        write_str(data, offset, metadata, sizes, row.name)?;
        write_blob(data, offset, sizes, row.signature.offset())?;
    }

    let mut method_semantics: Vec<_> = tables.method_semantics.iter().collect();
    if tables.method_semantics_needs_sorting {
        method_semantics.sort_by_key(|row| row.association);
    }
    for row in method_semantics {
        write_le_at::<u16>(data, offset, row.semantics)?;
        write_row(data, offset, sizes, TableId::MethodDef, row.method)?;
        write_coded(data, offset, sizes, CodedIndexType::HasSemantics, row.association)?;
    }

    #[cfg(debug_assertions)]
    for window in tables.method_impl.windows(2) {
        debug_assert!(window[0].class <= window[1].class, "MethodImpl order");
    }
    for row in &tables.method_impl {
        write_row(data, offset, sizes, TableId::TypeDef, row.class)?;
        write_coded(data, offset, sizes, CodedIndexType::MethodDefOrRef, row.method_body)?;
        write_coded(data, offset, sizes, CodedIndexType::MethodDefOrRef, row.method_decl)?;
    }

    for row in &tables.module_ref {
        write_str(data, offset, metadata, sizes, row.name)?;
    }

    for row in &tables.type_spec {
        write_blob(data, offset, sizes, row.signature.offset())?;
    }

    #[cfg(debug_assertions)]
    for window in tables.impl_map.windows(2) {
        debug_assert!(
            window[0].member_forwarded < window[1].member_forwarded,
            "ImplMap order"
        );
    }
    for row in &tables.impl_map {
        write_le_at::<u16>(data, offset, row.mapping_flags)?;
        write_coded(data, offset, sizes, CodedIndexType::MemberForwarded, row.member_forwarded)?;
        write_str(data, offset, metadata, sizes, row.import_name)?;
        write_row(data, offset, sizes, TableId::ModuleRef, row.import_scope)?;
    }

    #[cfg(debug_assertions)]
    for window in tables.field_rva.windows(2) {
        debug_assert!(window[0].field < window[1].field, "FieldRVA order");
    }
    for row in &tables.field_rva {
        write_le_at::<u32>(data, offset, mapped_field_data_stream_rva + row.offset)?;
        write_row(data, offset, sizes, TableId::Field, row.field)?;
    }

    for row in &tables.enc_log {
        write_le_at::<u32>(data, offset, row.token)?;
        write_le_at::<u32>(data, offset, row.func_code)?;
    }

    for row in &tables.enc_map {
        write_le_at::<u32>(data, offset, row.token)?;
    }

    for row in &tables.assembly {
        write_le_at::<u32>(data, offset, row.hash_algorithm)?;
        write_le_at::<u16>(data, offset, row.version.major)?;
        write_le_at::<u16>(data, offset, row.version.minor)?;
        write_le_at::<u16>(data, offset, row.version.build)?;
        write_le_at::<u16>(data, offset, row.version.revision)?;
        write_le_at::<u32>(data, offset, row.flags)?;
        write_blob(data, offset, sizes, row.public_key.offset())?;
        write_str(data, offset, metadata, sizes, row.name)?;
        write_str(data, offset, metadata, sizes, row.culture)?;
    }

    for row in &tables.assembly_ref {
        write_le_at::<u16>(data, offset, row.version.major)?;
        write_le_at::<u16>(data, offset, row.version.minor)?;
        write_le_at::<u16>(data, offset, row.version.build)?;
        write_le_at::<u16>(data, offset, row.version.revision)?;
        write_le_at::<u32>(data, offset, row.flags)?;
        write_blob(data, offset, sizes, row.public_key_or_token.offset())?;
        write_str(data, offset, metadata, sizes, row.name)?;
        write_str(data, offset, metadata, sizes, row.culture)?;
        write_blob(data, offset, sizes, row.hash_value.offset())?;
    }

    for row in &tables.file {
        write_le_at::<u32>(data, offset, row.flags)?;
        write_str(data, offset, metadata, sizes, row.name)?;
        write_blob(data, offset, sizes, row.hash_value.offset())?;
    }

    for row in &tables.exported_type {
        write_le_at::<u32>(data, offset, row.flags)?;
        write_le_at::<u32>(data, offset, row.type_def_id)?;
        write_str(data, offset, metadata, sizes, row.name)?;
        write_str(data, offset, metadata, sizes, row.namespace)?;
        write_coded(data, offset, sizes, CodedIndexType::Implementation, row.implementation)?;
    }

    for row in &tables.manifest_resource {
        write_le_at::<u32>(data, offset, row.offset)?;
        write_le_at::<u32>(data, offset, row.flags)?;
        write_str(data, offset, metadata, sizes, row.name)?;
        write_coded(data, offset, sizes, CodedIndexType::Implementation, row.implementation)?;
    }

    #[cfg(debug_assertions)]
    for window in tables.nested_class.windows(2) {
        debug_assert!(
            window[0].nested_class <= window[1].nested_class,
            "NestedClass order"
        );
    }
    for row in &tables.nested_class {
        write_row(data, offset, sizes, TableId::TypeDef, row.nested_class)?;
        write_row(data, offset, sizes, TableId::TypeDef, row.enclosing_class)?;
    }

    #[cfg(debug_assertions)]
    for window in tables.generic_param.windows(2) {
        debug_assert!(
            window[0].owner < window[1].owner
                || (window[0].owner == window[1].owner && window[0].number < window[1].number),
            "GenericParam order"
        );
    }
    for row in &tables.generic_param {
        write_le_at::<u16>(data, offset, row.number)?;
        write_le_at::<u16>(data, offset, row.flags)?;
        write_coded(data, offset, sizes, CodedIndexType::TypeOrMethodDef, row.owner)?;
        write_str(data, offset, metadata, sizes, row.name)?;
    }

    for row in &tables.method_spec {
        write_coded(data, offset, sizes, CodedIndexType::MethodDefOrRef, row.method)?;
        write_blob(data, offset, sizes, row.instantiation.offset())?;
    }

    #[cfg(debug_assertions)]
    for window in tables.generic_param_constraint.windows(2) {
        debug_assert!(
            window[0].owner <= window[1].owner,
            "GenericParamConstraint order"
        );
    }
    for row in &tables.generic_param_constraint {
        write_row(data, offset, sizes, TableId::GenericParam, row.owner)?;
        write_coded(data, offset, sizes, CodedIndexType::TypeDefOrRef, row.constraint)?;
    }

    for row in &tables.document {
        write_blob(data, offset, sizes, row.name.offset())?;
        write_le_at_dyn(data, offset, row.hash_algorithm.index(), sizes.is_large_guid())?;
        write_blob(data, offset, sizes, row.hash.offset())?;
        write_le_at_dyn(data, offset, row.language.index(), sizes.is_large_guid())?;
    }

    for row in &tables.method_debug_information {
        write_row(data, offset, sizes, TableId::Document, row.document)?;
        write_blob(data, offset, sizes, row.sequence_points.offset())?;
    }

    #[cfg(debug_assertions)]
    for window in tables.local_scope.windows(2) {
        debug_assert!(window[0].method <= window[1].method, "LocalScope order");
        if window[0].method == window[1].method {
            debug_assert!(
                window[0].start_offset <= window[1].start_offset,
                "LocalScope start order"
            );
            if window[0].start_offset == window[1].start_offset {
                debug_assert!(window[0].length >= window[1].length, "LocalScope length order");
            }
        }
    }
    for row in &tables.local_scope {
        write_row(data, offset, sizes, TableId::MethodDef, row.method)?;
        write_row(data, offset, sizes, TableId::ImportScope, row.import_scope)?;
        write_row(data, offset, sizes, TableId::LocalVariable, row.variable_list)?;
        write_row(data, offset, sizes, TableId::LocalConstant, row.constant_list)?;
        write_le_at::<u32>(data, offset, row.start_offset)?;
        write_le_at::<u32>(data, offset, row.length)?;
    }

    for row in &tables.local_variable {
        write_le_at::<u16>(data, offset, row.attributes)?;
        write_le_at::<u16>(data, offset, row.index)?;
        write_str(data, offset, metadata, sizes, row.name)?;
    }

    for row in &tables.local_constant {
        write_str(data, offset, metadata, sizes, row.name)?;
        write_blob(data, offset, sizes, row.signature.offset())?;
    }

    for row in &tables.import_scope {
        write_row(data, offset, sizes, TableId::ImportScope, row.parent)?;
        write_blob(data, offset, sizes, row.imports.offset())?;
    }

    #[cfg(debug_assertions)]
    for window in tables.state_machine_method.windows(2) {
        debug_assert!(
            window[0].move_next_method < window[1].move_next_method,
            "StateMachineMethod order"
        );
    }
    for row in &tables.state_machine_method {
        write_row(data, offset, sizes, TableId::MethodDef, row.move_next_method)?;
        write_row(data, offset, sizes, TableId::MethodDef, row.kickoff_method)?;
    }

    let mut custom_debug: Vec<_> = tables.custom_debug_information.iter().collect();
    if tables.custom_debug_information_needs_sorting {
        custom_debug.sort_by_key(|row| (row.parent, row.kind.index()));
    }
    for row in custom_debug {
        write_coded(
            data,
            offset,
            sizes,
            CodedIndexType::HasCustomDebugInformation,
            row.parent,
        )?;
        write_le_at_dyn(data, offset, row.kind.index(), sizes.is_large_guid())?;
        write_blob(data, offset, sizes, row.value.offset())?;
    }

    // Terminator byte, then zero padding to a 4-byte boundary.
    write_le_at::<u8>(data, offset, 0)?;
    *offset = start + sizes.table_stream_size() as usize;

    Ok(())
}

fn write_str(
    data: &mut [u8],
    offset: &mut usize,
    metadata: &FrozenMetadata,
    sizes: &MetadataSizes,
    handle: crate::metadata::heaps::StringHandle,
) -> Result<()> {
    write_le_at_dyn(
        data,
        offset,
        metadata.strings.offset_of(handle),
        sizes.is_large_str(),
    )
}

fn write_blob(data: &mut [u8], offset: &mut usize, sizes: &MetadataSizes, value: u32) -> Result<()> {
    write_le_at_dyn(data, offset, value, sizes.is_large_blob())
}

fn write_row(
    data: &mut [u8],
    offset: &mut usize,
    sizes: &MetadataSizes,
    target: TableId,
    value: u32,
) -> Result<()> {
    write_le_at_dyn(data, offset, value, sizes.is_large(target))
}

fn write_coded(
    data: &mut [u8],
    offset: &mut usize,
    sizes: &MetadataSizes,
    scheme: CodedIndexType,
    value: u32,
) -> Result<()> {
    write_le_at_dyn(data, offset, value, sizes.is_large_coded(scheme))
}
