//! In-memory row records for every emitted metadata table.
//!
//! Each struct mirrors one table's column layout: literals are stored verbatim,
//! heap references as handles, same-table foreign keys as 1-based row numbers,
//! and heterogeneous foreign keys as pre-encoded coded-index values (the encoding
//! happens at insertion time, since every `add_*` operation statically knows the
//! scheme of its parameters).

use crate::metadata::{
    heaps::{BlobHandle, GuidHandle, StringHandle},
    Version,
};

pub(crate) struct ModuleRow {
    pub generation: u16,
    pub name: StringHandle,
    pub mvid: GuidHandle,
    pub enc_id: GuidHandle,
    pub enc_base_id: GuidHandle,
}

pub(crate) struct TypeRefRow {
    pub resolution_scope: u32,
    pub name: StringHandle,
    pub namespace: StringHandle,
}

pub(crate) struct TypeDefRow {
    pub flags: u32,
    pub name: StringHandle,
    pub namespace: StringHandle,
    pub extends: u32,
    pub field_list: u32,
    pub method_list: u32,
}

pub(crate) struct FieldDefRow {
    pub flags: u16,
    pub name: StringHandle,
    pub signature: BlobHandle,
}

pub(crate) struct MethodDefRow {
    pub body_offset: Option<u32>,
    pub impl_flags: u16,
    pub flags: u16,
    pub name: StringHandle,
    pub signature: BlobHandle,
    pub param_list: u32,
}

pub(crate) struct ParamRow {
    pub flags: u16,
    pub sequence: u16,
    pub name: StringHandle,
}

pub(crate) struct InterfaceImplRow {
    pub class: u32,
    pub interface: u32,
}

pub(crate) struct MemberRefRow {
    pub class: u32,
    pub name: StringHandle,
    pub signature: BlobHandle,
}

pub(crate) struct ConstantRow {
    pub type_code: u8,
    pub parent: u32,
    pub value: BlobHandle,
}

pub(crate) struct CustomAttributeRow {
    pub parent: u32,
    pub constructor: u32,
    pub value: BlobHandle,
}

pub(crate) struct FieldMarshalRow {
    pub parent: u32,
    pub native_type: BlobHandle,
}

pub(crate) struct DeclSecurityRow {
    pub action: u16,
    pub parent: u32,
    pub permission_set: BlobHandle,
}

pub(crate) struct ClassLayoutRow {
    pub packing_size: u16,
    pub class_size: u32,
    pub parent: u32,
}

pub(crate) struct FieldLayoutRow {
    pub offset: u32,
    pub field: u32,
}

pub(crate) struct StandAloneSigRow {
    pub signature: BlobHandle,
}

pub(crate) struct EventMapRow {
    pub parent: u32,
    pub event_list: u32,
}

pub(crate) struct EventRow {
    pub flags: u16,
    pub name: StringHandle,
    pub event_type: u32,
}

pub(crate) struct PropertyMapRow {
    pub parent: u32,
    pub property_list: u32,
}

pub(crate) struct PropertyRow {
    pub flags: u16,
    pub name: StringHandle,
    pub signature: BlobHandle,
}

pub(crate) struct MethodSemanticsRow {
    pub semantics: u16,
    pub method: u32,
    pub association: u32,
}

pub(crate) struct MethodImplRow {
    pub class: u32,
    pub method_body: u32,
    pub method_decl: u32,
}

pub(crate) struct ModuleRefRow {
    pub name: StringHandle,
}

pub(crate) struct TypeSpecRow {
    pub signature: BlobHandle,
}

pub(crate) struct ImplMapRow {
    pub mapping_flags: u16,
    pub member_forwarded: u32,
    pub import_name: StringHandle,
    pub import_scope: u32,
}

pub(crate) struct FieldRvaRow {
    pub offset: u32,
    pub field: u32,
}

pub(crate) struct EncLogRow {
    pub token: u32,
    pub func_code: u32,
}

pub(crate) struct EncMapRow {
    pub token: u32,
}

pub(crate) struct AssemblyRow {
    pub hash_algorithm: u32,
    pub version: Version,
    pub flags: u32,
    pub public_key: BlobHandle,
    pub name: StringHandle,
    pub culture: StringHandle,
}

pub(crate) struct AssemblyRefRow {
    pub version: Version,
    pub flags: u32,
    pub public_key_or_token: BlobHandle,
    pub name: StringHandle,
    pub culture: StringHandle,
    pub hash_value: BlobHandle,
}

pub(crate) struct FileRow {
    pub flags: u32,
    pub name: StringHandle,
    pub hash_value: BlobHandle,
}

pub(crate) struct ExportedTypeRow {
    pub flags: u32,
    pub type_def_id: u32,
    pub name: StringHandle,
    pub namespace: StringHandle,
    pub implementation: u32,
}

pub(crate) struct ManifestResourceRow {
    pub offset: u32,
    pub flags: u32,
    pub name: StringHandle,
    pub implementation: u32,
}

pub(crate) struct NestedClassRow {
    pub nested_class: u32,
    pub enclosing_class: u32,
}

pub(crate) struct GenericParamRow {
    pub number: u16,
    pub flags: u16,
    pub owner: u32,
    pub name: StringHandle,
}

pub(crate) struct MethodSpecRow {
    pub method: u32,
    pub instantiation: BlobHandle,
}

pub(crate) struct GenericParamConstraintRow {
    pub owner: u32,
    pub constraint: u32,
}

pub(crate) struct DocumentRow {
    pub name: BlobHandle,
    pub hash_algorithm: GuidHandle,
    pub hash: BlobHandle,
    pub language: GuidHandle,
}

pub(crate) struct MethodDebugInformationRow {
    pub document: u32,
    pub sequence_points: BlobHandle,
}

pub(crate) struct LocalScopeRow {
    pub method: u32,
    pub import_scope: u32,
    pub variable_list: u32,
    pub constant_list: u32,
    pub start_offset: u32,
    pub length: u32,
}

pub(crate) struct LocalVariableRow {
    pub attributes: u16,
    pub index: u16,
    pub name: StringHandle,
}

pub(crate) struct LocalConstantRow {
    pub name: StringHandle,
    pub signature: BlobHandle,
}

pub(crate) struct ImportScopeRow {
    pub parent: u32,
    pub imports: BlobHandle,
}

pub(crate) struct StateMachineMethodRow {
    pub move_next_method: u32,
    pub kickoff_method: u32,
}

pub(crate) struct CustomDebugInformationRow {
    pub parent: u32,
    pub kind: GuidHandle,
    pub value: BlobHandle,
}
