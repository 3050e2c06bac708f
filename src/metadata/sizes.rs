//! Derived layout facts for one frozen metadata generation.
//!
//! [`MetadataSizes`] is computed exactly once, after the heaps and tables are frozen,
//! and is immutable thereafter. It answers every layout question the serializer has:
//! which tables are present, how wide each reference column is, how large each stream
//! is, and which bits go into the header bitmasks.
//!
//! The width rule is uniform: a row-number or coded-index column is 2 bytes when the
//! maximum row count among the column's possible target tables fits in 16 bits, and
//! a heap column is 2 bytes when the heap's total addressable size fits in 16 bits.
//! Minimal edit-and-continue deltas force 4-byte references throughout, because a
//! delta's rows must stay binary-compatible with later generations.

use bitflags::bitflags;

use crate::{
    io::align_4,
    metadata::tables::{CodedIndexType, TableId, TABLE_COUNT},
};

/// Always-sorted type-system tables advertised in the tables-stream header.
///
/// InterfaceImpl, Constant, CustomAttribute, FieldMarshal, DeclSecurity,
/// ClassLayout, FieldLayout, MethodSemantics, MethodImpl, ImplMap, FieldRVA,
/// NestedClass, GenericParam and GenericParamConstraint. The mask is advertised
/// independently of whether this particular instance had anything to sort.
pub const SORTED_TYPE_SYSTEM_TABLES: u64 = 0x1600_3301_FA00;

/// Sorted debug tables: LocalScope, StateMachineMethod, CustomDebugInformation.
pub const SORTED_DEBUG_TABLES: u64 = (1 << TableId::LocalScope as u8)
    | (1 << TableId::StateMachineMethod as u8)
    | (1 << TableId::CustomDebugInformation as u8);

/// Debug (portable PDB) table subset of the presence bitmask.
pub const DEBUG_TABLES: u64 = (1 << TableId::Document as u8)
    | (1 << TableId::MethodDebugInformation as u8)
    | (1 << TableId::LocalScope as u8)
    | (1 << TableId::LocalVariable as u8)
    | (1 << TableId::LocalConstant as u8)
    | (1 << TableId::ImportScope as u8)
    | (1 << TableId::StateMachineMethod as u8)
    | (1 << TableId::CustomDebugInformation as u8);

bitflags! {
    /// The heap-size flag byte of the tables-stream header.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct HeapSizeFlags: u8 {
        /// `#Strings` columns are 4 bytes wide
        const STRING_LARGE = 0x01;
        /// `#GUID` columns are 4 bytes wide
        const GUID_LARGE = 0x02;
        /// `#Blob` columns are 4 bytes wide
        const BLOB_LARGE = 0x04;
        /// Stream contains only EnC deltas
        const ENC_DELTAS = 0x20;
        /// Rows may be marked deleted
        const DELETED_MARKS = 0x80;
    }
}

/// Unaligned byte sizes of the four heaps.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HeapSizes {
    /// `#Strings` heap size in bytes
    pub string: u32,
    /// `#US` heap size in bytes
    pub user_string: u32,
    /// `#Blob` heap size in bytes
    pub blob: u32,
    /// `#GUID` heap size in bytes
    pub guid: u32,
}

/// The four heap streams, in their fixed serialization order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HeapIndex {
    /// `#Strings`
    String,
    /// `#US`
    UserString,
    /// `#GUID`
    Guid,
    /// `#Blob`
    Blob,
}

/// Immutable layout facts derived from final row counts and heap sizes.
///
/// Constructed once per emission, strictly after the builder freeze; the
/// serializer only reads from it.
pub struct MetadataSizes {
    row_counts: [u32; TABLE_COUNT],
    heap_sizes: HeapSizes,
    stream_sizes: HeapSizes,
    present_tables: u64,
    sorted_tables: u64,
    is_minimal_delta: bool,
    is_standalone_debug: bool,
    table_stream_size: u32,
}

impl MetadataSizes {
    /// Derives the layout facts for one generation.
    ///
    /// ## Arguments
    /// * `row_counts` - Final row count per table index
    /// * `heap_sizes` - Total addressable heap sizes (including prior generations)
    /// * `stream_sizes` - This generation's heap content sizes (what gets written)
    /// * `is_minimal_delta` - True for a minimal EnC delta generation
    /// * `is_standalone_debug` - True when emitting standalone portable-PDB metadata
    #[must_use]
    pub fn new(
        row_counts: [u32; TABLE_COUNT],
        heap_sizes: HeapSizes,
        stream_sizes: HeapSizes,
        is_minimal_delta: bool,
        is_standalone_debug: bool,
    ) -> Self {
        let mut present_tables = 0u64;
        for (index, count) in row_counts.iter().enumerate() {
            if *count > 0 {
                present_tables |= 1u64 << index;
            }
        }

        let sorted_debug = present_tables & SORTED_DEBUG_TABLES;
        let sorted_tables = sorted_debug
            | if is_standalone_debug {
                0
            } else {
                SORTED_TYPE_SYSTEM_TABLES
            };

        let mut sizes = MetadataSizes {
            row_counts,
            heap_sizes,
            stream_sizes,
            present_tables,
            sorted_tables,
            is_minimal_delta,
            is_standalone_debug,
            table_stream_size: 0,
        };
        sizes.table_stream_size = sizes.compute_table_stream_size();
        sizes
    }

    fn reference_bytes(&self, max_row_count: u32) -> u32 {
        if max_row_count <= 0xFFFF && !self.is_minimal_delta {
            2
        } else {
            4
        }
    }

    /// Row count of a table.
    #[must_use]
    pub fn row_count(&self, table: TableId) -> u32 {
        self.row_counts[table as usize]
    }

    /// True if the table has at least one row.
    #[must_use]
    pub fn is_present(&self, table: TableId) -> bool {
        self.present_tables & table.bit() != 0
    }

    /// The 64-bit present-table bitmask of the tables-stream header.
    #[must_use]
    pub fn present_tables(&self) -> u64 {
        self.present_tables
    }

    /// The 64-bit sorted-table bitmask of the tables-stream header.
    #[must_use]
    pub fn sorted_tables(&self) -> u64 {
        self.sorted_tables
    }

    /// True when emitting a minimal EnC delta.
    #[must_use]
    pub fn is_minimal_delta(&self) -> bool {
        self.is_minimal_delta
    }

    /// True when emitting standalone portable-PDB metadata.
    #[must_use]
    pub fn is_standalone_debug(&self) -> bool {
        self.is_standalone_debug
    }

    /// True if row-number columns targeting `table` are 4 bytes wide.
    #[must_use]
    pub fn is_large(&self, table: TableId) -> bool {
        self.table_index_bytes(table) == 4
    }

    /// Byte width of row-number columns targeting `table`.
    #[must_use]
    pub fn table_index_bytes(&self, table: TableId) -> u32 {
        self.reference_bytes(self.row_counts[table as usize])
    }

    /// True if columns of the given coded-index scheme are 4 bytes wide.
    #[must_use]
    pub fn is_large_coded(&self, scheme: CodedIndexType) -> bool {
        self.coded_index_bytes(scheme) == 4
    }

    /// Byte width of columns of the given coded-index scheme.
    ///
    /// Decided by the maximum row count among the scheme's candidate tables.
    #[must_use]
    pub fn coded_index_bytes(&self, scheme: CodedIndexType) -> u32 {
        let max_rows = scheme
            .tables()
            .iter()
            .map(|table| self.row_counts[*table as usize])
            .max()
            .unwrap_or(0);

        self.reference_bytes(max_rows)
    }

    /// True if `#Strings` columns are 4 bytes wide.
    #[must_use]
    pub fn is_large_str(&self) -> bool {
        self.str_bytes() == 4
    }

    /// Byte width of `#Strings` columns.
    #[must_use]
    pub fn str_bytes(&self) -> u32 {
        self.reference_bytes(self.heap_sizes.string)
    }

    /// True if `#GUID` columns are 4 bytes wide.
    #[must_use]
    pub fn is_large_guid(&self) -> bool {
        self.guid_bytes() == 4
    }

    /// Byte width of `#GUID` columns.
    #[must_use]
    pub fn guid_bytes(&self) -> u32 {
        self.reference_bytes(self.heap_sizes.guid)
    }

    /// True if `#Blob` columns are 4 bytes wide.
    #[must_use]
    pub fn is_large_blob(&self) -> bool {
        self.blob_bytes() == 4
    }

    /// Byte width of `#Blob` columns.
    #[must_use]
    pub fn blob_bytes(&self) -> u32 {
        self.reference_bytes(self.heap_sizes.blob)
    }

    /// The heap-size flag byte of the tables-stream header.
    #[must_use]
    pub fn heap_size_flags(&self) -> HeapSizeFlags {
        let mut flags = HeapSizeFlags::empty();
        if self.is_large_str() {
            flags |= HeapSizeFlags::STRING_LARGE;
        }
        if self.is_large_guid() {
            flags |= HeapSizeFlags::GUID_LARGE;
        }
        if self.is_large_blob() {
            flags |= HeapSizeFlags::BLOB_LARGE;
        }
        if self.is_minimal_delta {
            flags |= HeapSizeFlags::ENC_DELTAS | HeapSizeFlags::DELETED_MARKS;
        }
        flags
    }

    /// Serialized (4-byte aligned) size of a heap stream.
    #[must_use]
    pub fn aligned_heap_size(&self, heap: HeapIndex) -> u32 {
        let unaligned = match heap {
            HeapIndex::String => self.stream_sizes.string,
            HeapIndex::UserString => self.stream_sizes.user_string,
            HeapIndex::Guid => self.stream_sizes.guid,
            HeapIndex::Blob => self.stream_sizes.blob,
        };

        align_4(unaligned)
    }

    /// Size of the tables-stream header: fixed fields plus one row count per
    /// present table.
    #[must_use]
    pub fn table_stream_header_size(&self) -> u32 {
        24 + 4 * self.present_tables.count_ones()
    }

    /// Total size of the `#~`/`#-` stream (header, rows, terminator, alignment).
    #[must_use]
    pub fn table_stream_size(&self) -> u32 {
        self.table_stream_size
    }

    #[allow(clippy::cast_possible_truncation)]
    fn compute_table_stream_size(&self) -> u32 {
        let mut size = self.table_stream_header_size();
        for (index, count) in self.row_counts.iter().enumerate() {
            if *count > 0 {
                let table = TableId::from_tag(index as u8)
                    .expect("row count recorded for a reserved table index");
                size += count * self.row_size(table);
            }
        }

        // Trailing terminator byte, then padding to a 4-byte boundary.
        align_4(size + 1)
    }

    /// Serialized size of one row of `table` under this generation's widths.
    #[must_use]
    pub fn row_size(&self, table: TableId) -> u32 {
        let str_b = self.str_bytes();
        let guid_b = self.guid_bytes();
        let blob_b = self.blob_bytes();

        match table {
            TableId::Module => 2 + str_b + 3 * guid_b,
            TableId::TypeRef => {
                self.coded_index_bytes(CodedIndexType::ResolutionScope) + 2 * str_b
            }
            TableId::TypeDef => {
                4 + 2 * str_b
                    + self.coded_index_bytes(CodedIndexType::TypeDefOrRef)
                    + self.table_index_bytes(TableId::Field)
                    + self.table_index_bytes(TableId::MethodDef)
            }
            TableId::Field => 2 + str_b + blob_b,
            TableId::MethodDef => {
                4 + 2 + 2 + str_b + blob_b + self.table_index_bytes(TableId::Param)
            }
            TableId::Param => 2 + 2 + str_b,
            TableId::InterfaceImpl => {
                self.table_index_bytes(TableId::TypeDef)
                    + self.coded_index_bytes(CodedIndexType::TypeDefOrRef)
            }
            TableId::MemberRef => {
                self.coded_index_bytes(CodedIndexType::MemberRefParent) + str_b + blob_b
            }
            TableId::Constant => {
                1 + 1 + self.coded_index_bytes(CodedIndexType::HasConstant) + blob_b
            }
            TableId::CustomAttribute => {
                self.coded_index_bytes(CodedIndexType::HasCustomAttribute)
                    + self.coded_index_bytes(CodedIndexType::CustomAttributeType)
                    + blob_b
            }
            TableId::FieldMarshal => {
                self.coded_index_bytes(CodedIndexType::HasFieldMarshal) + blob_b
            }
            TableId::DeclSecurity => {
                2 + self.coded_index_bytes(CodedIndexType::HasDeclSecurity) + blob_b
            }
            TableId::ClassLayout => 2 + 4 + self.table_index_bytes(TableId::TypeDef),
            TableId::FieldLayout => 4 + self.table_index_bytes(TableId::Field),
            TableId::StandAloneSig => blob_b,
            TableId::EventMap => {
                self.table_index_bytes(TableId::TypeDef) + self.table_index_bytes(TableId::Event)
            }
            TableId::Event => 2 + str_b + self.coded_index_bytes(CodedIndexType::TypeDefOrRef),
            TableId::PropertyMap => {
                self.table_index_bytes(TableId::TypeDef)
                    + self.table_index_bytes(TableId::Property)
            }
            TableId::Property => 2 + str_b + blob_b,
            TableId::MethodSemantics => {
                2 + self.table_index_bytes(TableId::MethodDef)
                    + self.coded_index_bytes(CodedIndexType::HasSemantics)
            }
            TableId::MethodImpl => {
                self.table_index_bytes(TableId::TypeDef)
                    + 2 * self.coded_index_bytes(CodedIndexType::MethodDefOrRef)
            }
            TableId::ModuleRef => str_b,
            TableId::TypeSpec => blob_b,
            TableId::ImplMap => {
                2 + self.coded_index_bytes(CodedIndexType::MemberForwarded)
                    + str_b
                    + self.table_index_bytes(TableId::ModuleRef)
            }
            TableId::FieldRVA => 4 + self.table_index_bytes(TableId::Field),
            TableId::EncLog => 4 + 4,
            TableId::EncMap => 4,
            TableId::Assembly => 4 + 8 + 4 + blob_b + 2 * str_b,
            TableId::AssemblyRef => 8 + 4 + 2 * blob_b + 2 * str_b,
            TableId::File => 4 + str_b + blob_b,
            TableId::ExportedType => {
                4 + 4 + 2 * str_b + self.coded_index_bytes(CodedIndexType::Implementation)
            }
            TableId::ManifestResource => {
                4 + 4 + str_b + self.coded_index_bytes(CodedIndexType::Implementation)
            }
            TableId::NestedClass => 2 * self.table_index_bytes(TableId::TypeDef),
            TableId::GenericParam => {
                2 + 2 + self.coded_index_bytes(CodedIndexType::TypeOrMethodDef) + str_b
            }
            TableId::MethodSpec => {
                self.coded_index_bytes(CodedIndexType::MethodDefOrRef) + blob_b
            }
            TableId::GenericParamConstraint => {
                self.table_index_bytes(TableId::GenericParam)
                    + self.coded_index_bytes(CodedIndexType::TypeDefOrRef)
            }
            TableId::Document => 2 * blob_b + 2 * guid_b,
            TableId::MethodDebugInformation => {
                self.table_index_bytes(TableId::Document) + blob_b
            }
            TableId::LocalScope => {
                self.table_index_bytes(TableId::MethodDef)
                    + self.table_index_bytes(TableId::ImportScope)
                    + self.table_index_bytes(TableId::LocalVariable)
                    + self.table_index_bytes(TableId::LocalConstant)
                    + 4
                    + 4
            }
            TableId::LocalVariable => 2 + 2 + str_b,
            TableId::LocalConstant => str_b + blob_b,
            TableId::ImportScope => self.table_index_bytes(TableId::ImportScope) + blob_b,
            TableId::StateMachineMethod => 2 * self.table_index_bytes(TableId::MethodDef),
            TableId::CustomDebugInformation => {
                self.coded_index_bytes(CodedIndexType::HasCustomDebugInformation)
                    + guid_b
                    + blob_b
            }

            TableId::FieldPtr
            | TableId::MethodPtr
            | TableId::ParamPtr
            | TableId::EventPtr
            | TableId::PropertyPtr
            | TableId::AssemblyProcessor
            | TableId::AssemblyOS
            | TableId::AssemblyRefProcessor
            | TableId::AssemblyRefOS => {
                unreachable!("table {table:?} is never emitted")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sizes_with(rows: &[(TableId, u32)]) -> MetadataSizes {
        let mut row_counts = [0u32; TABLE_COUNT];
        for (table, count) in rows {
            row_counts[*table as usize] = *count;
        }
        MetadataSizes::new(row_counts, HeapSizes::default(), HeapSizes::default(), false, false)
    }

    #[test]
    fn width_boundary_at_16_bits() {
        let small = sizes_with(&[(TableId::Field, 0xFFFF)]);
        assert!(!small.is_large(TableId::Field));
        assert_eq!(small.table_index_bytes(TableId::Field), 2);
        assert!(!small.is_large_coded(CodedIndexType::HasConstant));
        assert!(!small.is_large_coded(CodedIndexType::HasCustomAttribute));

        let large = sizes_with(&[(TableId::Field, 0x10000)]);
        assert!(large.is_large(TableId::Field));
        assert_eq!(large.table_index_bytes(TableId::Field), 4);
        // Every scheme that can target Field widens with it.
        assert!(large.is_large_coded(CodedIndexType::HasConstant));
        assert!(large.is_large_coded(CodedIndexType::HasCustomAttribute));
        assert!(large.is_large_coded(CodedIndexType::HasFieldMarshal));
        assert!(large.is_large_coded(CodedIndexType::MemberForwarded));
        // Schemes that cannot target Field stay narrow.
        assert!(!large.is_large_coded(CodedIndexType::MethodDefOrRef));
    }

    #[test]
    fn heap_width_boundary() {
        let sizes = MetadataSizes::new(
            [0; TABLE_COUNT],
            HeapSizes {
                string: 0xFFFF,
                user_string: 0,
                blob: 0x10000,
                guid: 16,
            },
            HeapSizes::default(),
            false,
            false,
        );

        assert!(!sizes.is_large_str());
        assert!(sizes.is_large_blob());
        assert!(!sizes.is_large_guid());
        assert_eq!(
            sizes.heap_size_flags(),
            HeapSizeFlags::BLOB_LARGE
        );
    }

    #[test]
    fn minimal_delta_forces_wide_references() {
        let sizes = MetadataSizes::new(
            [0; TABLE_COUNT],
            HeapSizes::default(),
            HeapSizes::default(),
            true,
            false,
        );

        assert!(sizes.is_large(TableId::TypeDef));
        assert!(sizes.is_large_coded(CodedIndexType::TypeDefOrRef));
        assert!(sizes.is_large_str());
        assert!(sizes
            .heap_size_flags()
            .contains(HeapSizeFlags::ENC_DELTAS | HeapSizeFlags::DELETED_MARKS));
    }

    #[test]
    fn presence_and_sorted_masks() {
        let sizes = sizes_with(&[(TableId::Module, 1), (TableId::LocalScope, 2)]);
        assert_eq!(
            sizes.present_tables(),
            TableId::Module.bit() | TableId::LocalScope.bit()
        );
        assert_eq!(
            sizes.sorted_tables(),
            SORTED_TYPE_SYSTEM_TABLES | TableId::LocalScope.bit()
        );
        assert!(sizes.is_present(TableId::Module));
        assert!(!sizes.is_present(TableId::TypeDef));
    }

    #[test]
    fn standalone_debug_drops_type_system_sort_mask() {
        let mut row_counts = [0u32; TABLE_COUNT];
        row_counts[TableId::Document as usize] = 1;
        row_counts[TableId::CustomDebugInformation as usize] = 1;
        let sizes = MetadataSizes::new(
            row_counts,
            HeapSizes::default(),
            HeapSizes::default(),
            false,
            true,
        );

        assert_eq!(sizes.sorted_tables(), TableId::CustomDebugInformation.bit());
    }

    #[test]
    fn empty_table_stream_size() {
        let sizes = sizes_with(&[]);
        // 24-byte header, no row counts, one terminator byte, aligned to 4.
        assert_eq!(sizes.table_stream_size(), 28);
    }

    #[test]
    fn row_sizes_with_narrow_references() {
        let sizes = sizes_with(&[(TableId::TypeDef, 3), (TableId::MethodDef, 10)]);
        assert_eq!(sizes.row_size(TableId::Module), 2 + 2 + 3 * 2);
        assert_eq!(sizes.row_size(TableId::TypeDef), 4 + 2 + 2 + 2 + 2 + 2);
        assert_eq!(sizes.row_size(TableId::Constant), 1 + 1 + 2 + 2);
        assert_eq!(sizes.row_size(TableId::EncLog), 8);
        assert_eq!(sizes.row_size(TableId::Assembly), 4 + 8 + 4 + 2 + 2 + 2);
    }
}
