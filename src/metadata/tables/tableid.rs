use strum::{EnumCount, EnumIter};

/// Identifiers for the metadata tables defined in the ECMA-335 specification.
///
/// Each variant carries the table index used in tokens, the presence bitmask and
/// the fixed serialization order of the `#~` stream. The type-system tables span
/// 0x00-0x2C; the portable-PDB debug tables span 0x30-0x37.
///
/// The indirection tables (`FieldPtr`, `MethodPtr`, `ParamPtr`, `EventPtr`,
/// `PropertyPtr`) and the `AssemblyOS`/`AssemblyProcessor` group are listed for
/// completeness because their indices participate in token tags, but they are
/// never emitted by this library.
///
/// ## Reference
/// * [ECMA-335 Partition II, Section 22](https://ecma-international.org/wp-content/uploads/ECMA-335_6th_edition_june_2012.pdf) - Metadata Tables
#[derive(Clone, Copy, PartialEq, Debug, EnumIter, EnumCount, Eq, Hash)]
#[repr(u8)]
pub enum TableId {
    /// `Module` table (0x00) - Information about the current module.
    Module = 0x00,
    /// `TypeRef` table (0x01) - References to types in external scopes.
    TypeRef = 0x01,
    /// `TypeDef` table (0x02) - Type definitions within this module.
    TypeDef = 0x02,
    /// `FieldPtr` table (0x03) - Field indirection; not emitted.
    FieldPtr = 0x03,
    /// `Field` table (0x04) - Field definitions within types.
    Field = 0x04,
    /// `MethodPtr` table (0x05) - Method indirection; not emitted.
    MethodPtr = 0x05,
    /// `MethodDef` table (0x06) - Method definitions within types.
    MethodDef = 0x06,
    /// `ParamPtr` table (0x07) - Parameter indirection; not emitted.
    ParamPtr = 0x07,
    /// `Param` table (0x08) - Method parameter definitions.
    Param = 0x08,
    /// `InterfaceImpl` table (0x09) - Interface implementations by types.
    InterfaceImpl = 0x09,
    /// `MemberRef` table (0x0A) - References to members of external types.
    MemberRef = 0x0A,
    /// `Constant` table (0x0B) - Compile-time constant values; ordered by parent.
    Constant = 0x0B,
    /// `CustomAttribute` table (0x0C) - Custom attribute applications; ordered by parent.
    CustomAttribute = 0x0C,
    /// `FieldMarshal` table (0x0D) - Marshalling descriptors; ordered by parent.
    FieldMarshal = 0x0D,
    /// `DeclSecurity` table (0x0E) - Declarative security attributes; ordered by parent.
    DeclSecurity = 0x0E,
    /// `ClassLayout` table (0x0F) - Explicit memory layout of types.
    ClassLayout = 0x0F,
    /// `FieldLayout` table (0x10) - Explicit field offsets within types.
    FieldLayout = 0x10,
    /// `StandAloneSig` table (0x11) - Standalone signatures (locals, indirect calls).
    StandAloneSig = 0x11,
    /// `EventMap` table (0x12) - Type-to-event list mapping.
    EventMap = 0x12,
    /// `EventPtr` table (0x13) - Event indirection; not emitted.
    EventPtr = 0x13,
    /// `Event` table (0x14) - Event definitions.
    Event = 0x14,
    /// `PropertyMap` table (0x15) - Type-to-property list mapping.
    PropertyMap = 0x15,
    /// `PropertyPtr` table (0x16) - Property indirection; not emitted.
    PropertyPtr = 0x16,
    /// `Property` table (0x17) - Property definitions.
    Property = 0x17,
    /// `MethodSemantics` table (0x18) - Accessor associations; ordered by association.
    MethodSemantics = 0x18,
    /// `MethodImpl` table (0x19) - Explicit method implementation overrides.
    MethodImpl = 0x19,
    /// `ModuleRef` table (0x1A) - References to external modules.
    ModuleRef = 0x1A,
    /// `TypeSpec` table (0x1B) - Instantiated/constructed type signatures.
    TypeSpec = 0x1B,
    /// `ImplMap` table (0x1C) - P/Invoke implementation mappings.
    ImplMap = 0x1C,
    /// `FieldRVA` table (0x1D) - Relative virtual addresses of mapped field data.
    FieldRVA = 0x1D,
    /// `EncLog` table (0x1E) - Edit-and-continue operation log.
    EncLog = 0x1E,
    /// `EncMap` table (0x1F) - Edit-and-continue token remapping.
    EncMap = 0x1F,
    /// `Assembly` table (0x20) - The assembly manifest of this module.
    Assembly = 0x20,
    /// `AssemblyProcessor` table (0x21) - Processor-specific info; not emitted.
    AssemblyProcessor = 0x21,
    /// `AssemblyOS` table (0x22) - OS-specific info; not emitted.
    AssemblyOS = 0x22,
    /// `AssemblyRef` table (0x23) - References to external assemblies.
    AssemblyRef = 0x23,
    /// `AssemblyRefProcessor` table (0x24) - Processor-specific info; not emitted.
    AssemblyRefProcessor = 0x24,
    /// `AssemblyRefOS` table (0x25) - OS-specific info; not emitted.
    AssemblyRefOS = 0x25,
    /// `File` table (0x26) - Files belonging to this assembly.
    File = 0x26,
    /// `ExportedType` table (0x27) - Types exported from other modules of the assembly.
    ExportedType = 0x27,
    /// `ManifestResource` table (0x28) - Embedded or linked resources.
    ManifestResource = 0x28,
    /// `NestedClass` table (0x29) - Nested type relationships.
    NestedClass = 0x29,
    /// `GenericParam` table (0x2A) - Generic parameter definitions.
    GenericParam = 0x2A,
    /// `MethodSpec` table (0x2B) - Instantiated generic method signatures.
    MethodSpec = 0x2B,
    /// `GenericParamConstraint` table (0x2C) - Generic parameter constraints.
    GenericParamConstraint = 0x2C,
    /// `Document` table (0x30) - Source documents (portable PDB).
    Document = 0x30,
    /// `MethodDebugInformation` table (0x31) - Sequence points (portable PDB).
    MethodDebugInformation = 0x31,
    /// `LocalScope` table (0x32) - Local variable scopes (portable PDB).
    LocalScope = 0x32,
    /// `LocalVariable` table (0x33) - Local variables (portable PDB).
    LocalVariable = 0x33,
    /// `LocalConstant` table (0x34) - Local constants (portable PDB).
    LocalConstant = 0x34,
    /// `ImportScope` table (0x35) - Import scopes (portable PDB).
    ImportScope = 0x35,
    /// `StateMachineMethod` table (0x36) - State machine mappings (portable PDB).
    StateMachineMethod = 0x36,
    /// `CustomDebugInformation` table (0x37) - Custom debug records; ordered by parent.
    CustomDebugInformation = 0x37,
}

/// Number of table slots addressed by the presence bitmask and row count arrays.
///
/// Table indices run 0x00 through 0x37; the gap 0x2D-0x2F is reserved and always
/// carries zero rows.
pub const TABLE_COUNT: usize = 0x38;

impl TableId {
    /// Resolves a raw token table tag to its `TableId`.
    ///
    /// Returns `None` for the reserved indices 0x2D-0x2F and anything past 0x37.
    ///
    /// ## Arguments
    /// * `tag` - The table tag, as found in the high byte of a token
    #[must_use]
    pub fn from_tag(tag: u8) -> Option<TableId> {
        match tag {
            0x00 => Some(TableId::Module),
            0x01 => Some(TableId::TypeRef),
            0x02 => Some(TableId::TypeDef),
            0x03 => Some(TableId::FieldPtr),
            0x04 => Some(TableId::Field),
            0x05 => Some(TableId::MethodPtr),
            0x06 => Some(TableId::MethodDef),
            0x07 => Some(TableId::ParamPtr),
            0x08 => Some(TableId::Param),
            0x09 => Some(TableId::InterfaceImpl),
            0x0A => Some(TableId::MemberRef),
            0x0B => Some(TableId::Constant),
            0x0C => Some(TableId::CustomAttribute),
            0x0D => Some(TableId::FieldMarshal),
            0x0E => Some(TableId::DeclSecurity),
            0x0F => Some(TableId::ClassLayout),
            0x10 => Some(TableId::FieldLayout),
            0x11 => Some(TableId::StandAloneSig),
            0x12 => Some(TableId::EventMap),
            0x13 => Some(TableId::EventPtr),
            0x14 => Some(TableId::Event),
            0x15 => Some(TableId::PropertyMap),
            0x16 => Some(TableId::PropertyPtr),
            0x17 => Some(TableId::Property),
            0x18 => Some(TableId::MethodSemantics),
            0x19 => Some(TableId::MethodImpl),
            0x1A => Some(TableId::ModuleRef),
            0x1B => Some(TableId::TypeSpec),
            0x1C => Some(TableId::ImplMap),
            0x1D => Some(TableId::FieldRVA),
            0x1E => Some(TableId::EncLog),
            0x1F => Some(TableId::EncMap),
            0x20 => Some(TableId::Assembly),
            0x21 => Some(TableId::AssemblyProcessor),
            0x22 => Some(TableId::AssemblyOS),
            0x23 => Some(TableId::AssemblyRef),
            0x24 => Some(TableId::AssemblyRefProcessor),
            0x25 => Some(TableId::AssemblyRefOS),
            0x26 => Some(TableId::File),
            0x27 => Some(TableId::ExportedType),
            0x28 => Some(TableId::ManifestResource),
            0x29 => Some(TableId::NestedClass),
            0x2A => Some(TableId::GenericParam),
            0x2B => Some(TableId::MethodSpec),
            0x2C => Some(TableId::GenericParamConstraint),
            0x30 => Some(TableId::Document),
            0x31 => Some(TableId::MethodDebugInformation),
            0x32 => Some(TableId::LocalScope),
            0x33 => Some(TableId::LocalVariable),
            0x34 => Some(TableId::LocalConstant),
            0x35 => Some(TableId::ImportScope),
            0x36 => Some(TableId::StateMachineMethod),
            0x37 => Some(TableId::CustomDebugInformation),
            _ => None,
        }
    }

    /// Returns this table's bit in the 64-bit presence and sorted bitmasks.
    #[must_use]
    pub fn bit(&self) -> u64 {
        1u64 << (*self as u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn tag_roundtrip() {
        for id in TableId::iter() {
            assert_eq!(TableId::from_tag(id as u8), Some(id));
        }
    }

    #[test]
    fn reserved_tags_unmapped() {
        for tag in [0x2Du8, 0x2E, 0x2F, 0x38, 0xFF] {
            assert_eq!(TableId::from_tag(tag), None);
        }
    }

    #[test]
    fn iteration_is_index_ordered() {
        let mut prev = None;
        for id in TableId::iter() {
            if let Some(p) = prev {
                assert!((id as u8) > p, "TableId must be declared in index order");
            }
            prev = Some(id as u8);
        }
    }
}
