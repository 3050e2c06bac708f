//! Table operations of [`MetadataBuilder`].
//!
//! One `add_*` operation per emitted table kind. Every operation appends a row in
//! insertion order and, for tables that other tables reference, returns the 1-based
//! row [`Token`]. Insertion order *is* the row number - with the exception of the six
//! parent-ordered tables (Constant, CustomAttribute, DeclSecurity, FieldMarshal,
//! MethodSemantics, CustomDebugInformation), which may be stably reordered at
//! serialization time. Nothing else ever references those tables' rows, so deferred
//! reordering cannot invalidate a handle that was already issued.
//!
//! Coded indices are computed here, at insertion time: each operation statically
//! knows which scheme is legal for its parameters, so an inadmissible token kind is
//! a caller bug and panics inside the encoder.

use crate::metadata::{
    builder::MetadataBuilder,
    constant::Constant,
    heaps::{BlobHandle, GuidHandle, StringHandle},
    tables::{rows::*, CodedIndexType, TableId, TABLE_COUNT},
    token::Token,
    Version,
};

/// Row storage for every emitted table, plus the deferred-sort bookkeeping of the
/// six parent-ordered tables.
#[derive(Default)]
pub(crate) struct TableData {
    pub module: Vec<ModuleRow>,
    pub type_ref: Vec<TypeRefRow>,
    pub type_def: Vec<TypeDefRow>,
    pub field: Vec<FieldDefRow>,
    pub method_def: Vec<MethodDefRow>,
    pub param: Vec<ParamRow>,
    pub interface_impl: Vec<InterfaceImplRow>,
    pub member_ref: Vec<MemberRefRow>,

    pub constant: Vec<ConstantRow>,
    pub constant_last_parent: u32,
    pub constant_needs_sorting: bool,

    pub custom_attribute: Vec<CustomAttributeRow>,
    pub custom_attribute_last_parent: u32,
    pub custom_attribute_needs_sorting: bool,

    pub field_marshal: Vec<FieldMarshalRow>,
    pub field_marshal_last_parent: u32,
    pub field_marshal_needs_sorting: bool,

    pub decl_security: Vec<DeclSecurityRow>,
    pub decl_security_last_parent: u32,
    pub decl_security_needs_sorting: bool,

    pub class_layout: Vec<ClassLayoutRow>,
    pub field_layout: Vec<FieldLayoutRow>,
    pub stand_alone_sig: Vec<StandAloneSigRow>,
    pub event_map: Vec<EventMapRow>,
    pub event: Vec<EventRow>,
    pub property_map: Vec<PropertyMapRow>,
    pub property: Vec<PropertyRow>,

    pub method_semantics: Vec<MethodSemanticsRow>,
    pub method_semantics_last_association: u32,
    pub method_semantics_needs_sorting: bool,

    pub method_impl: Vec<MethodImplRow>,
    pub module_ref: Vec<ModuleRefRow>,
    pub type_spec: Vec<TypeSpecRow>,
    pub impl_map: Vec<ImplMapRow>,
    pub field_rva: Vec<FieldRvaRow>,
    pub enc_log: Vec<EncLogRow>,
    pub enc_map: Vec<EncMapRow>,
    pub assembly: Vec<AssemblyRow>,
    pub assembly_ref: Vec<AssemblyRefRow>,
    pub file: Vec<FileRow>,
    pub exported_type: Vec<ExportedTypeRow>,
    pub manifest_resource: Vec<ManifestResourceRow>,
    pub nested_class: Vec<NestedClassRow>,
    pub generic_param: Vec<GenericParamRow>,
    pub method_spec: Vec<MethodSpecRow>,
    pub generic_param_constraint: Vec<GenericParamConstraintRow>,

    pub document: Vec<DocumentRow>,
    pub method_debug_information: Vec<MethodDebugInformationRow>,
    pub local_scope: Vec<LocalScopeRow>,
    pub local_variable: Vec<LocalVariableRow>,
    pub local_constant: Vec<LocalConstantRow>,
    pub import_scope: Vec<ImportScopeRow>,
    pub state_machine_method: Vec<StateMachineMethodRow>,

    pub custom_debug_information: Vec<CustomDebugInformationRow>,
    pub custom_debug_information_last_parent: u32,
    pub custom_debug_information_needs_sorting: bool,
}

impl TableData {
    /// Final row count per table index.
    #[allow(clippy::cast_possible_truncation)]
    pub(crate) fn row_counts(&self) -> [u32; TABLE_COUNT] {
        let mut counts = [0u32; TABLE_COUNT];

        counts[TableId::Module as usize] = self.module.len() as u32;
        counts[TableId::TypeRef as usize] = self.type_ref.len() as u32;
        counts[TableId::TypeDef as usize] = self.type_def.len() as u32;
        counts[TableId::Field as usize] = self.field.len() as u32;
        counts[TableId::MethodDef as usize] = self.method_def.len() as u32;
        counts[TableId::Param as usize] = self.param.len() as u32;
        counts[TableId::InterfaceImpl as usize] = self.interface_impl.len() as u32;
        counts[TableId::MemberRef as usize] = self.member_ref.len() as u32;
        counts[TableId::Constant as usize] = self.constant.len() as u32;
        counts[TableId::CustomAttribute as usize] = self.custom_attribute.len() as u32;
        counts[TableId::FieldMarshal as usize] = self.field_marshal.len() as u32;
        counts[TableId::DeclSecurity as usize] = self.decl_security.len() as u32;
        counts[TableId::ClassLayout as usize] = self.class_layout.len() as u32;
        counts[TableId::FieldLayout as usize] = self.field_layout.len() as u32;
        counts[TableId::StandAloneSig as usize] = self.stand_alone_sig.len() as u32;
        counts[TableId::EventMap as usize] = self.event_map.len() as u32;
        counts[TableId::Event as usize] = self.event.len() as u32;
        counts[TableId::PropertyMap as usize] = self.property_map.len() as u32;
        counts[TableId::Property as usize] = self.property.len() as u32;
        counts[TableId::MethodSemantics as usize] = self.method_semantics.len() as u32;
        counts[TableId::MethodImpl as usize] = self.method_impl.len() as u32;
        counts[TableId::ModuleRef as usize] = self.module_ref.len() as u32;
        counts[TableId::TypeSpec as usize] = self.type_spec.len() as u32;
        counts[TableId::ImplMap as usize] = self.impl_map.len() as u32;
        counts[TableId::FieldRVA as usize] = self.field_rva.len() as u32;
        counts[TableId::EncLog as usize] = self.enc_log.len() as u32;
        counts[TableId::EncMap as usize] = self.enc_map.len() as u32;
        counts[TableId::Assembly as usize] = self.assembly.len() as u32;
        counts[TableId::AssemblyRef as usize] = self.assembly_ref.len() as u32;
        counts[TableId::File as usize] = self.file.len() as u32;
        counts[TableId::ExportedType as usize] = self.exported_type.len() as u32;
        counts[TableId::ManifestResource as usize] = self.manifest_resource.len() as u32;
        counts[TableId::NestedClass as usize] = self.nested_class.len() as u32;
        counts[TableId::GenericParam as usize] = self.generic_param.len() as u32;
        counts[TableId::MethodSpec as usize] = self.method_spec.len() as u32;
        counts[TableId::GenericParamConstraint as usize] =
            self.generic_param_constraint.len() as u32;
        counts[TableId::Document as usize] = self.document.len() as u32;
        counts[TableId::MethodDebugInformation as usize] =
            self.method_debug_information.len() as u32;
        counts[TableId::LocalScope as usize] = self.local_scope.len() as u32;
        counts[TableId::LocalVariable as usize] = self.local_variable.len() as u32;
        counts[TableId::LocalConstant as usize] = self.local_constant.len() as u32;
        counts[TableId::ImportScope as usize] = self.import_scope.len() as u32;
        counts[TableId::StateMachineMethod as usize] = self.state_machine_method.len() as u32;
        counts[TableId::CustomDebugInformation as usize] =
            self.custom_debug_information.len() as u32;

        counts
    }
}

#[allow(clippy::cast_possible_truncation)]
fn row_token(table: TableId, len: usize) -> Token {
    Token::from_parts(table, len as u32)
}

fn row_of(token: Token, expected: TableId) -> u32 {
    debug_assert!(
        token.is_null() || token.table_id() == Some(expected),
        "expected a {expected:?} token, got {token}"
    );
    token.row()
}

impl MetadataBuilder {
    /// Pre-reserves row storage for a table.
    ///
    /// # Panics
    /// Panics for the indirection (`*Ptr`) tables and the
    /// `AssemblyOS`/`AssemblyProcessor` group, which this library never emits.
    pub fn set_capacity(&mut self, table: TableId, capacity: usize) {
        match table {
            TableId::Module => self.tables.module.reserve(capacity),
            TableId::TypeRef => self.tables.type_ref.reserve(capacity),
            TableId::TypeDef => self.tables.type_def.reserve(capacity),
            TableId::Field => self.tables.field.reserve(capacity),
            TableId::MethodDef => self.tables.method_def.reserve(capacity),
            TableId::Param => self.tables.param.reserve(capacity),
            TableId::InterfaceImpl => self.tables.interface_impl.reserve(capacity),
            TableId::MemberRef => self.tables.member_ref.reserve(capacity),
            TableId::Constant => self.tables.constant.reserve(capacity),
            TableId::CustomAttribute => self.tables.custom_attribute.reserve(capacity),
            TableId::FieldMarshal => self.tables.field_marshal.reserve(capacity),
            TableId::DeclSecurity => self.tables.decl_security.reserve(capacity),
            TableId::ClassLayout => self.tables.class_layout.reserve(capacity),
            TableId::FieldLayout => self.tables.field_layout.reserve(capacity),
            TableId::StandAloneSig => self.tables.stand_alone_sig.reserve(capacity),
            TableId::EventMap => self.tables.event_map.reserve(capacity),
            TableId::Event => self.tables.event.reserve(capacity),
            TableId::PropertyMap => self.tables.property_map.reserve(capacity),
            TableId::Property => self.tables.property.reserve(capacity),
            TableId::MethodSemantics => self.tables.method_semantics.reserve(capacity),
            TableId::MethodImpl => self.tables.method_impl.reserve(capacity),
            TableId::ModuleRef => self.tables.module_ref.reserve(capacity),
            TableId::TypeSpec => self.tables.type_spec.reserve(capacity),
            TableId::ImplMap => self.tables.impl_map.reserve(capacity),
            TableId::FieldRVA => self.tables.field_rva.reserve(capacity),
            TableId::EncLog => self.tables.enc_log.reserve(capacity),
            TableId::EncMap => self.tables.enc_map.reserve(capacity),
            TableId::Assembly => self.tables.assembly.reserve(capacity),
            TableId::AssemblyRef => self.tables.assembly_ref.reserve(capacity),
            TableId::File => self.tables.file.reserve(capacity),
            TableId::ExportedType => self.tables.exported_type.reserve(capacity),
            TableId::ManifestResource => self.tables.manifest_resource.reserve(capacity),
            TableId::NestedClass => self.tables.nested_class.reserve(capacity),
            TableId::GenericParam => self.tables.generic_param.reserve(capacity),
            TableId::MethodSpec => self.tables.method_spec.reserve(capacity),
            TableId::GenericParamConstraint => {
                self.tables.generic_param_constraint.reserve(capacity);
            }
            TableId::Document => self.tables.document.reserve(capacity),
            TableId::MethodDebugInformation => {
                self.tables.method_debug_information.reserve(capacity);
            }
            TableId::LocalScope => self.tables.local_scope.reserve(capacity),
            TableId::LocalVariable => self.tables.local_variable.reserve(capacity),
            TableId::LocalConstant => self.tables.local_constant.reserve(capacity),
            TableId::ImportScope => self.tables.import_scope.reserve(capacity),
            TableId::StateMachineMethod => self.tables.state_machine_method.reserve(capacity),
            TableId::CustomDebugInformation => {
                self.tables.custom_debug_information.reserve(capacity);
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
                panic!("table {table:?} is not supported for emission")
            }
        }
    }

    /// Appends the `Module` row describing this module.
    pub fn add_module(
        &mut self,
        generation: u16,
        name: StringHandle,
        mvid: GuidHandle,
        enc_id: GuidHandle,
        enc_base_id: GuidHandle,
    ) -> Token {
        self.tables.module.push(ModuleRow {
            generation,
            name,
            mvid,
            enc_id,
            enc_base_id,
        });

        row_token(TableId::Module, self.tables.module.len())
    }

    /// Appends the `Assembly` manifest row.
    pub fn add_assembly(
        &mut self,
        name: StringHandle,
        version: Version,
        culture: StringHandle,
        public_key: BlobHandle,
        flags: u32,
        hash_algorithm: u32,
    ) -> Token {
        self.tables.assembly.push(AssemblyRow {
            hash_algorithm,
            version,
            flags,
            public_key,
            name,
            culture,
        });

        row_token(TableId::Assembly, self.tables.assembly.len())
    }

    /// Appends an `AssemblyRef` row for an external assembly.
    pub fn add_assembly_reference(
        &mut self,
        name: StringHandle,
        version: Version,
        culture: StringHandle,
        public_key_or_token: BlobHandle,
        flags: u32,
        hash_value: BlobHandle,
    ) -> Token {
        self.tables.assembly_ref.push(AssemblyRefRow {
            version,
            flags,
            public_key_or_token,
            name,
            culture,
            hash_value,
        });

        row_token(TableId::AssemblyRef, self.tables.assembly_ref.len())
    }

    /// Appends a `TypeDef` row.
    ///
    /// `extends` is any of TypeDef/TypeRef/TypeSpec (nil for interfaces and
    /// `<Module>`); `field_list` and `method_list` point at the first owned row
    /// of the respective table.
    pub fn add_type_definition(
        &mut self,
        flags: u32,
        namespace: StringHandle,
        name: StringHandle,
        extends: Token,
        field_list: Token,
        method_list: Token,
    ) -> Token {
        self.tables.type_def.push(TypeDefRow {
            flags,
            name,
            namespace,
            extends: CodedIndexType::TypeDefOrRef.encode(extends),
            field_list: row_of(field_list, TableId::Field),
            method_list: row_of(method_list, TableId::MethodDef),
        });

        row_token(TableId::TypeDef, self.tables.type_def.len())
    }

    /// Appends a `ClassLayout` row; rows must arrive ordered by type.
    pub fn add_type_layout(&mut self, type_def: Token, packing_size: u16, class_size: u32) {
        self.tables.class_layout.push(ClassLayoutRow {
            packing_size,
            class_size,
            parent: row_of(type_def, TableId::TypeDef),
        });
    }

    /// Appends an `InterfaceImpl` row.
    pub fn add_interface_implementation(
        &mut self,
        type_def: Token,
        implemented_interface: Token,
    ) -> Token {
        self.tables.interface_impl.push(InterfaceImplRow {
            class: row_of(type_def, TableId::TypeDef),
            interface: CodedIndexType::TypeDefOrRef.encode(implemented_interface),
        });

        row_token(TableId::InterfaceImpl, self.tables.interface_impl.len())
    }

    /// Appends a `NestedClass` row; rows must arrive ordered by nested type.
    pub fn add_nested_type(&mut self, type_def: Token, enclosing_type: Token) {
        self.tables.nested_class.push(NestedClassRow {
            nested_class: row_of(type_def, TableId::TypeDef),
            enclosing_class: row_of(enclosing_type, TableId::TypeDef),
        });
    }

    /// Appends a `TypeRef` row.
    pub fn add_type_reference(
        &mut self,
        resolution_scope: Token,
        namespace: StringHandle,
        name: StringHandle,
    ) -> Token {
        self.tables.type_ref.push(TypeRefRow {
            resolution_scope: CodedIndexType::ResolutionScope.encode(resolution_scope),
            name,
            namespace,
        });

        row_token(TableId::TypeRef, self.tables.type_ref.len())
    }

    /// Appends a `TypeSpec` row.
    pub fn add_type_specification(&mut self, signature: BlobHandle) -> Token {
        self.tables.type_spec.push(TypeSpecRow { signature });

        row_token(TableId::TypeSpec, self.tables.type_spec.len())
    }

    /// Appends a `StandAloneSig` row.
    pub fn add_standalone_signature(&mut self, signature: BlobHandle) -> Token {
        self.tables.stand_alone_sig.push(StandAloneSigRow { signature });

        row_token(TableId::StandAloneSig, self.tables.stand_alone_sig.len())
    }

    /// Appends a `Property` row.
    pub fn add_property(&mut self, flags: u16, name: StringHandle, signature: BlobHandle) -> Token {
        self.tables.property.push(PropertyRow {
            flags,
            name,
            signature,
        });

        row_token(TableId::Property, self.tables.property.len())
    }

    /// Appends a `PropertyMap` row tying a type to its first property.
    pub fn add_property_map(&mut self, declaring_type: Token, property_list: Token) {
        self.tables.property_map.push(PropertyMapRow {
            parent: row_of(declaring_type, TableId::TypeDef),
            property_list: row_of(property_list, TableId::Property),
        });
    }

    /// Appends an `Event` row.
    pub fn add_event(&mut self, flags: u16, name: StringHandle, event_type: Token) -> Token {
        self.tables.event.push(EventRow {
            flags,
            name,
            event_type: CodedIndexType::TypeDefOrRef.encode(event_type),
        });

        row_token(TableId::Event, self.tables.event.len())
    }

    /// Appends an `EventMap` row tying a type to its first event.
    pub fn add_event_map(&mut self, declaring_type: Token, event_list: Token) {
        self.tables.event_map.push(EventMapRow {
            parent: row_of(declaring_type, TableId::TypeDef),
            event_list: row_of(event_list, TableId::Event),
        });
    }

    /// Appends a `Constant` row; the value is interned into the `#Blob` heap.
    ///
    /// The table is required to be ordered by parent; out-of-order appends set
    /// the deferred-sorting flag instead of failing.
    pub fn add_constant(&mut self, parent: Token, value: &Constant) -> Token {
        let parent_coded = CodedIndexType::HasConstant.encode(parent);

        self.tables.constant_needs_sorting |= parent_coded < self.tables.constant_last_parent;
        self.tables.constant_last_parent = parent_coded;

        let blob = self.get_or_add_constant_blob(value);
        self.tables.constant.push(ConstantRow {
            type_code: value.type_code(),
            parent: parent_coded,
            value: blob,
        });

        row_token(TableId::Constant, self.tables.constant.len())
    }

    /// Appends a `MethodSemantics` row associating an accessor method with an
    /// event or property.
    ///
    /// The table is required to be ordered by association; out-of-order appends
    /// set the deferred-sorting flag instead of failing.
    pub fn add_method_semantics(&mut self, association: Token, semantics: u16, method: Token) {
        let association_coded = CodedIndexType::HasSemantics.encode(association);

        self.tables.method_semantics_needs_sorting |=
            association_coded < self.tables.method_semantics_last_association;
        self.tables.method_semantics_last_association = association_coded;

        self.tables.method_semantics.push(MethodSemanticsRow {
            semantics,
            method: row_of(method, TableId::MethodDef),
            association: association_coded,
        });
    }

    /// Appends a `CustomAttribute` row.
    ///
    /// The table is required to be ordered by parent; out-of-order appends set
    /// the deferred-sorting flag instead of failing.
    pub fn add_custom_attribute(
        &mut self,
        parent: Token,
        constructor: Token,
        value: BlobHandle,
    ) -> Token {
        let parent_coded = CodedIndexType::HasCustomAttribute.encode(parent);

        self.tables.custom_attribute_needs_sorting |=
            parent_coded < self.tables.custom_attribute_last_parent;
        self.tables.custom_attribute_last_parent = parent_coded;

        self.tables.custom_attribute.push(CustomAttributeRow {
            parent: parent_coded,
            constructor: CodedIndexType::CustomAttributeType.encode(constructor),
            value,
        });

        row_token(TableId::CustomAttribute, self.tables.custom_attribute.len())
    }

    /// Appends a `MethodSpec` row instantiating a generic method.
    pub fn add_method_specification(&mut self, method: Token, instantiation: BlobHandle) -> Token {
        self.tables.method_spec.push(MethodSpecRow {
            method: CodedIndexType::MethodDefOrRef.encode(method),
            instantiation,
        });

        row_token(TableId::MethodSpec, self.tables.method_spec.len())
    }

    /// Appends a `ModuleRef` row.
    pub fn add_module_reference(&mut self, name: StringHandle) -> Token {
        self.tables.module_ref.push(ModuleRefRow { name });

        row_token(TableId::ModuleRef, self.tables.module_ref.len())
    }

    /// Appends a `Param` row.
    pub fn add_parameter(&mut self, flags: u16, name: StringHandle, sequence: u16) -> Token {
        self.tables.param.push(ParamRow {
            flags,
            sequence,
            name,
        });

        row_token(TableId::Param, self.tables.param.len())
    }

    /// Appends a `GenericParam` row; rows must arrive ordered by owner, then number.
    pub fn add_generic_parameter(
        &mut self,
        parent: Token,
        flags: u16,
        name: StringHandle,
        number: u16,
    ) -> Token {
        self.tables.generic_param.push(GenericParamRow {
            number,
            flags,
            owner: CodedIndexType::TypeOrMethodDef.encode(parent),
            name,
        });

        row_token(TableId::GenericParam, self.tables.generic_param.len())
    }

    /// Appends a `GenericParamConstraint` row; rows must arrive ordered by owner.
    pub fn add_generic_parameter_constraint(
        &mut self,
        generic_parameter: Token,
        constraint: Token,
    ) -> Token {
        self.tables
            .generic_param_constraint
            .push(GenericParamConstraintRow {
                owner: row_of(generic_parameter, TableId::GenericParam),
                constraint: CodedIndexType::TypeDefOrRef.encode(constraint),
            });

        row_token(
            TableId::GenericParamConstraint,
            self.tables.generic_param_constraint.len(),
        )
    }

    /// Appends a `Field` row.
    pub fn add_field_definition(
        &mut self,
        flags: u16,
        name: StringHandle,
        signature: BlobHandle,
    ) -> Token {
        self.tables.field.push(FieldDefRow {
            flags,
            name,
            signature,
        });

        row_token(TableId::Field, self.tables.field.len())
    }

    /// Appends a `FieldLayout` row; rows must arrive ordered by field.
    pub fn add_field_layout(&mut self, field: Token, offset: u32) {
        self.tables.field_layout.push(FieldLayoutRow {
            offset,
            field: row_of(field, TableId::Field),
        });
    }

    /// Appends a `FieldMarshal` row.
    ///
    /// The table is required to be ordered by parent; out-of-order appends set
    /// the deferred-sorting flag instead of failing.
    pub fn add_marshalling_descriptor(&mut self, parent: Token, descriptor: BlobHandle) {
        let parent_coded = CodedIndexType::HasFieldMarshal.encode(parent);

        self.tables.field_marshal_needs_sorting |=
            parent_coded < self.tables.field_marshal_last_parent;
        self.tables.field_marshal_last_parent = parent_coded;

        self.tables.field_marshal.push(FieldMarshalRow {
            parent: parent_coded,
            native_type: descriptor,
        });
    }

    /// Appends a `FieldRVA` row; rows must arrive ordered by field.
    ///
    /// The stored offset is relative to the mapped field data stream; the
    /// stream's RVA is added at serialization time.
    pub fn add_field_relative_virtual_address(&mut self, field: Token, offset: u32) {
        self.tables.field_rva.push(FieldRvaRow {
            offset,
            field: row_of(field, TableId::Field),
        });
    }

    /// Appends a `MethodDef` row.
    ///
    /// `body_offset` is the method body's offset within the IL stream (or `None`
    /// for abstract/extern methods); the stream's RVA is added at serialization
    /// time.
    pub fn add_method_definition(
        &mut self,
        flags: u16,
        impl_flags: u16,
        name: StringHandle,
        signature: BlobHandle,
        body_offset: Option<u32>,
        param_list: Token,
    ) -> Token {
        self.tables.method_def.push(MethodDefRow {
            body_offset,
            impl_flags,
            flags,
            name,
            signature,
            param_list: row_of(param_list, TableId::Param),
        });

        row_token(TableId::MethodDef, self.tables.method_def.len())
    }

    /// Appends an `ImplMap` row for a P/Invoke import; rows must arrive ordered
    /// by the forwarded member.
    pub fn add_method_import(
        &mut self,
        member: Token,
        mapping_flags: u16,
        import_name: StringHandle,
        module: Token,
    ) {
        self.tables.impl_map.push(ImplMapRow {
            mapping_flags,
            member_forwarded: CodedIndexType::MemberForwarded.encode(member),
            import_name,
            import_scope: row_of(module, TableId::ModuleRef),
        });
    }

    /// Appends a `MethodImpl` row; rows must arrive ordered by class.
    pub fn add_method_implementation(
        &mut self,
        type_def: Token,
        method_body: Token,
        method_declaration: Token,
    ) -> Token {
        self.tables.method_impl.push(MethodImplRow {
            class: row_of(type_def, TableId::TypeDef),
            method_body: CodedIndexType::MethodDefOrRef.encode(method_body),
            method_decl: CodedIndexType::MethodDefOrRef.encode(method_declaration),
        });

        row_token(TableId::MethodImpl, self.tables.method_impl.len())
    }

    /// Appends a `MemberRef` row.
    pub fn add_member_reference(
        &mut self,
        parent: Token,
        name: StringHandle,
        signature: BlobHandle,
    ) -> Token {
        self.tables.member_ref.push(MemberRefRow {
            class: CodedIndexType::MemberRefParent.encode(parent),
            name,
            signature,
        });

        row_token(TableId::MemberRef, self.tables.member_ref.len())
    }

    /// Appends a `ManifestResource` row (`implementation` nil for an embedded
    /// resource).
    pub fn add_manifest_resource(
        &mut self,
        flags: u32,
        name: StringHandle,
        implementation: Token,
        offset: u32,
    ) -> Token {
        self.tables.manifest_resource.push(ManifestResourceRow {
            offset,
            flags,
            name,
            implementation: CodedIndexType::Implementation.encode(implementation),
        });

        row_token(TableId::ManifestResource, self.tables.manifest_resource.len())
    }

    /// Appends a `File` row.
    pub fn add_assembly_file(
        &mut self,
        name: StringHandle,
        hash_value: BlobHandle,
        contains_metadata: bool,
    ) -> Token {
        self.tables.file.push(FileRow {
            flags: if contains_metadata { 0 } else { 1 },
            name,
            hash_value,
        });

        row_token(TableId::File, self.tables.file.len())
    }

    /// Appends an `ExportedType` row.
    pub fn add_exported_type(
        &mut self,
        flags: u32,
        namespace: StringHandle,
        name: StringHandle,
        implementation: Token,
        type_definition_id: u32,
    ) -> Token {
        self.tables.exported_type.push(ExportedTypeRow {
            flags,
            type_def_id: type_definition_id,
            name,
            namespace,
            implementation: CodedIndexType::Implementation.encode(implementation),
        });

        row_token(TableId::ExportedType, self.tables.exported_type.len())
    }

    /// Appends a `DeclSecurity` row.
    ///
    /// The table is required to be ordered by parent; out-of-order appends set
    /// the deferred-sorting flag instead of failing.
    pub fn add_declarative_security_attribute(
        &mut self,
        parent: Token,
        action: u16,
        permission_set: BlobHandle,
    ) -> Token {
        let parent_coded = CodedIndexType::HasDeclSecurity.encode(parent);

        self.tables.decl_security_needs_sorting |=
            parent_coded < self.tables.decl_security_last_parent;
        self.tables.decl_security_last_parent = parent_coded;

        self.tables.decl_security.push(DeclSecurityRow {
            action,
            parent: parent_coded,
            permission_set,
        });

        row_token(TableId::DeclSecurity, self.tables.decl_security.len())
    }

    /// Appends an `EncLog` row recording an edit-and-continue operation.
    pub fn add_enc_log_entry(&mut self, entity: Token, func_code: u32) {
        self.tables.enc_log.push(EncLogRow {
            token: entity.value(),
            func_code,
        });
    }

    /// Appends an `EncMap` row.
    pub fn add_enc_map_entry(&mut self, entity: Token) {
        self.tables.enc_map.push(EncMapRow {
            token: entity.value(),
        });
    }

    /// Appends a `Document` row (portable PDB).
    pub fn add_document(
        &mut self,
        name: BlobHandle,
        hash_algorithm: GuidHandle,
        hash: BlobHandle,
        language: GuidHandle,
    ) -> Token {
        self.tables.document.push(DocumentRow {
            name,
            hash_algorithm,
            hash,
            language,
        });

        row_token(TableId::Document, self.tables.document.len())
    }

    /// Appends a `MethodDebugInformation` row (portable PDB).
    pub fn add_method_debug_information(
        &mut self,
        document: Token,
        sequence_points: BlobHandle,
    ) -> Token {
        self.tables
            .method_debug_information
            .push(MethodDebugInformationRow {
                document: row_of(document, TableId::Document),
                sequence_points,
            });

        row_token(
            TableId::MethodDebugInformation,
            self.tables.method_debug_information.len(),
        )
    }

    /// Appends a `LocalScope` row (portable PDB); rows must arrive ordered by
    /// method, then start offset, then decreasing length.
    pub fn add_local_scope(
        &mut self,
        method: Token,
        import_scope: Token,
        variable_list: Token,
        constant_list: Token,
        start_offset: u32,
        length: u32,
    ) -> Token {
        self.tables.local_scope.push(LocalScopeRow {
            method: row_of(method, TableId::MethodDef),
            import_scope: row_of(import_scope, TableId::ImportScope),
            variable_list: row_of(variable_list, TableId::LocalVariable),
            constant_list: row_of(constant_list, TableId::LocalConstant),
            start_offset,
            length,
        });

        row_token(TableId::LocalScope, self.tables.local_scope.len())
    }

    /// Appends a `LocalVariable` row (portable PDB).
    pub fn add_local_variable(&mut self, attributes: u16, index: u16, name: StringHandle) -> Token {
        self.tables.local_variable.push(LocalVariableRow {
            attributes,
            index,
            name,
        });

        row_token(TableId::LocalVariable, self.tables.local_variable.len())
    }

    /// Appends a `LocalConstant` row (portable PDB).
    pub fn add_local_constant(&mut self, name: StringHandle, signature: BlobHandle) -> Token {
        self.tables.local_constant.push(LocalConstantRow { name, signature });

        row_token(TableId::LocalConstant, self.tables.local_constant.len())
    }

    /// Appends an `ImportScope` row (portable PDB).
    pub fn add_import_scope(&mut self, parent: Token, imports: BlobHandle) -> Token {
        self.tables.import_scope.push(ImportScopeRow {
            parent: row_of(parent, TableId::ImportScope),
            imports,
        });

        row_token(TableId::ImportScope, self.tables.import_scope.len())
    }

    /// Appends a `StateMachineMethod` row (portable PDB); rows must arrive
    /// ordered by the MoveNext method.
    pub fn add_state_machine_method(&mut self, move_next_method: Token, kickoff_method: Token) {
        self.tables.state_machine_method.push(StateMachineMethodRow {
            move_next_method: row_of(move_next_method, TableId::MethodDef),
            kickoff_method: row_of(kickoff_method, TableId::MethodDef),
        });
    }

    /// Appends a `CustomDebugInformation` row (portable PDB).
    ///
    /// The table is required to be ordered by parent, then kind; out-of-order
    /// appends set the deferred-sorting flag instead of failing.
    pub fn add_custom_debug_information(
        &mut self,
        parent: Token,
        kind: GuidHandle,
        value: BlobHandle,
    ) -> Token {
        let parent_coded = CodedIndexType::HasCustomDebugInformation.encode(parent);

        self.tables.custom_debug_information_needs_sorting |=
            parent_coded < self.tables.custom_debug_information_last_parent;
        self.tables.custom_debug_information_last_parent = parent_coded;

        self.tables
            .custom_debug_information
            .push(CustomDebugInformationRow {
                parent: parent_coded,
                kind,
                value,
            });

        row_token(
            TableId::CustomDebugInformation,
            self.tables.custom_debug_information.len(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insertion_order_is_row_number() {
        let mut builder = MetadataBuilder::new();
        let name = builder.get_or_add_string("A");
        let sig = builder.get_or_add_blob(&[0x06, 0x08]);

        let first = builder.add_field_definition(0x0006, name, sig);
        let second = builder.add_field_definition(0x0006, name, sig);
        assert_eq!(first.row(), 1);
        assert_eq!(second.row(), 2);
        assert_eq!(first.table_id(), Some(TableId::Field));
    }

    #[test]
    fn monotonic_parents_do_not_set_sort_flag() {
        let mut builder = MetadataBuilder::new();
        for row in 1..=3 {
            let parent = Token::from_parts(TableId::Field, row);
            builder.add_constant(parent, &Constant::I4(0));
        }
        assert!(!builder.tables.constant_needs_sorting);
    }

    #[test]
    fn out_of_order_parent_sets_sort_flag_once() {
        let mut builder = MetadataBuilder::new();
        builder.add_constant(Token::from_parts(TableId::Field, 5), &Constant::I4(0));
        builder.add_constant(Token::from_parts(TableId::Field, 3), &Constant::I4(1));
        assert!(builder.tables.constant_needs_sorting);

        // Later in-order appends never clear the flag.
        builder.add_constant(Token::from_parts(TableId::Field, 7), &Constant::I4(2));
        assert!(builder.tables.constant_needs_sorting);
    }

    #[test]
    fn equal_parents_do_not_set_sort_flag() {
        let mut builder = MetadataBuilder::new();
        let parent = Token::from_parts(TableId::Field, 3);
        builder.add_constant(parent, &Constant::I4(0));
        builder.add_constant(parent, &Constant::I4(1));
        assert!(!builder.tables.constant_needs_sorting);
    }

    #[test]
    #[should_panic(expected = "not supported for emission")]
    fn ptr_table_capacity_is_unsupported() {
        let mut builder = MetadataBuilder::new();
        builder.set_capacity(TableId::FieldPtr, 16);
    }

    #[test]
    fn row_counts_reflect_appends() {
        let mut builder = MetadataBuilder::new();
        let name = builder.get_or_add_string("M");
        builder.add_module(0, name, Default::default(), Default::default(), Default::default());
        builder.add_module_reference(name);
        builder.add_module_reference(name);

        let counts = builder.tables.row_counts();
        assert_eq!(counts[TableId::Module as usize], 1);
        assert_eq!(counts[TableId::ModuleRef as usize], 2);
        assert_eq!(counts[TableId::TypeDef as usize], 0);
    }
}
