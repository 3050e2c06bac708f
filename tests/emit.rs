//! Integration tests for complete metadata emission.
//!
//! These tests drive the public builder/serializer API end to end and decode the
//! produced blobs: root header, stream directory, tables stream and heap content.

use std::collections::HashMap;

use dotemit::{
    io::{read_le_at, read_le_at_dyn},
    metadata::sizes::SORTED_TYPE_SYSTEM_TABLES,
    prelude::*,
};
use uguid::guid;

const METADATA_SIGNATURE: u32 = 0x424A_5342;

/// Decodes the root header and returns each stream's (offset, size) by name.
fn stream_directory(blob: &[u8]) -> (HashMap<String, (usize, u32)>, Vec<String>) {
    let mut offset = 0;
    assert_eq!(
        read_le_at::<u32>(blob, &mut offset).unwrap(),
        METADATA_SIGNATURE
    );
    assert_eq!(read_le_at::<u16>(blob, &mut offset).unwrap(), 1);
    assert_eq!(read_le_at::<u16>(blob, &mut offset).unwrap(), 1);
    assert_eq!(read_le_at::<u32>(blob, &mut offset).unwrap(), 0);

    let padded_version_length = read_le_at::<u32>(blob, &mut offset).unwrap();
    assert_eq!(padded_version_length % 4, 0);
    offset += padded_version_length as usize;

    assert_eq!(read_le_at::<u16>(blob, &mut offset).unwrap(), 0);
    let stream_count = read_le_at::<u16>(blob, &mut offset).unwrap();

    let mut streams = HashMap::new();
    let mut order = Vec::new();
    for _ in 0..stream_count {
        let stream_offset = read_le_at::<u32>(blob, &mut offset).unwrap();
        let stream_size = read_le_at::<u32>(blob, &mut offset).unwrap();

        let name_start = offset;
        let name_end = blob[name_start..]
            .iter()
            .position(|byte| *byte == 0)
            .map(|position| name_start + position)
            .unwrap();
        let name = String::from_utf8(blob[name_start..name_end].to_vec()).unwrap();
        let name_length = name.len() + 1;
        offset += (name_length + 3) & !3;

        streams.insert(name.clone(), (stream_offset as usize, stream_size));
        order.push(name);
    }

    (streams, order)
}

fn read_heap_string(blob: &[u8], strings_offset: usize, index: u32) -> String {
    let start = strings_offset + index as usize;
    let end = blob[start..]
        .iter()
        .position(|byte| *byte == 0)
        .map(|position| start + position)
        .unwrap();
    String::from_utf8(blob[start..end].to_vec()).unwrap()
}

#[test]
fn empty_module_layout() {
    let builder = MetadataBuilder::new();
    let serializer =
        TypeSystemMetadataSerializer::new(builder.freeze(), "v4.0.30319", false).unwrap();
    let blob = serializer.serialize(0, 0).unwrap();

    // header(108) + tables(24 header + terminator, aligned: 28)
    // + #Strings(4) + #US(4) + #GUID(0) + #Blob(4)
    assert_eq!(blob.len(), 148);

    let (streams, order) = stream_directory(&blob);
    assert_eq!(order, ["#~", "#Strings", "#US", "#GUID", "#Blob"]);
    assert_eq!(streams["#~"], (108, 28));
    assert_eq!(streams["#Strings"], (136, 4));
    assert_eq!(streams["#US"], (140, 4));
    assert_eq!(streams["#GUID"], (144, 0));
    assert_eq!(streams["#Blob"], (144, 4));

    // Each heap carries only its reserved zero-th entry plus alignment.
    assert_eq!(&blob[136..148], &[0u8; 12]);

    // Tables-stream header: no present tables, standard sorted mask.
    let mut offset = streams["#~"].0;
    assert_eq!(read_le_at::<u32>(&blob, &mut offset).unwrap(), 0);
    assert_eq!(read_le_at::<u8>(&blob, &mut offset).unwrap(), 2);
    assert_eq!(read_le_at::<u8>(&blob, &mut offset).unwrap(), 0);
    assert_eq!(read_le_at::<u8>(&blob, &mut offset).unwrap(), 0);
    assert_eq!(read_le_at::<u8>(&blob, &mut offset).unwrap(), 1);
    assert_eq!(read_le_at::<u64>(&blob, &mut offset).unwrap(), 0);
    assert_eq!(
        read_le_at::<u64>(&blob, &mut offset).unwrap(),
        SORTED_TYPE_SYSTEM_TABLES
    );
}

#[test]
fn small_module_rows_and_heaps() {
    let mut builder = MetadataBuilder::new();

    let module_name = builder.get_or_add_string("test.dll");
    let mvid = builder.get_or_add_guid(guid!("d437908e-65e6-487c-9735-7bdff699bea5"));
    builder.add_module(
        0,
        module_name,
        mvid,
        GuidHandle::default(),
        GuidHandle::default(),
    );

    let assembly_name = builder.get_or_add_string("test");
    builder.add_assembly(
        assembly_name,
        Version::new(1, 0, 0, 0),
        StringHandle::EMPTY,
        BlobHandle::default(),
        0,
        0x8004, // SHA1
    );

    let corlib_name = builder.get_or_add_string("mscorlib");
    let corlib_token = builder.get_or_add_blob(&[0xB7, 0x7A, 0x5C, 0x56, 0x19, 0x34, 0xE0, 0x89]);
    let corlib = builder.add_assembly_reference(
        corlib_name,
        Version::new(4, 0, 0, 0),
        StringHandle::EMPTY,
        corlib_token,
        0,
        BlobHandle::default(),
    );

    let object_name = builder.get_or_add_string("Object");
    let system_ns = builder.get_or_add_string("System");
    let object_ref = builder.add_type_reference(corlib, system_ns, object_name);

    let field_sig = builder.get_or_add_blob(&[0x06, 0x08]);
    let field_name = builder.get_or_add_string("value");
    let first_field = builder.add_field_definition(0x0001, field_name, field_sig);

    let method_sig = builder.get_or_add_blob(&[0x00, 0x01, 0x01, 0x0E]);
    let method_name = builder.get_or_add_string("Main");
    let first_param = Token::from_parts(TableId::Param, 1);
    let first_method = builder.add_method_definition(
        0x0096,
        0,
        method_name,
        method_sig,
        Some(4),
        first_param,
    );

    let param_name = builder.get_or_add_string("args");
    builder.add_parameter(0, param_name, 1);

    let type_name = builder.get_or_add_string("Program");
    let type_ns = builder.get_or_add_string("Test");
    builder.add_type_definition(
        0x0010_0001,
        type_ns,
        type_name,
        object_ref,
        first_field,
        first_method,
    );

    let serializer =
        TypeSystemMetadataSerializer::new(builder.freeze(), "v4.0.30319", false).unwrap();
    let blob = serializer.serialize(0x2000, 0).unwrap();

    let (streams, _) = stream_directory(&blob);
    let (tables_offset, _) = streams["#~"];
    let (strings_offset, _) = streams["#Strings"];
    let (guid_offset, guid_size) = streams["#GUID"];

    // One GUID slot.
    assert_eq!(guid_size, 16);
    assert_eq!(blob[guid_offset], 0x8e);

    // Header: present mask covers the eight populated tables.
    let mut offset = tables_offset + 8;
    let present = read_le_at::<u64>(&blob, &mut offset).unwrap();
    let expected_present = TableId::Module.bit()
        | TableId::TypeRef.bit()
        | TableId::TypeDef.bit()
        | TableId::Field.bit()
        | TableId::MethodDef.bit()
        | TableId::Param.bit()
        | TableId::Assembly.bit()
        | TableId::AssemblyRef.bit();
    assert_eq!(present, expected_present);

    // Row counts follow in table-index order, one u32 each.
    let mut offset = tables_offset + 24;
    for _ in 0..8 {
        assert_eq!(read_le_at::<u32>(&blob, &mut offset).unwrap(), 1);
    }

    // Module row: generation, name, mvid slot 1, nil EnC ids.
    // Rows begin after the 24 + 8*4 = 56 byte header; all references are narrow.
    let mut offset = tables_offset + 56;
    assert_eq!(read_le_at::<u16>(&blob, &mut offset).unwrap(), 0);
    let module_name_index = read_le_at::<u16>(&blob, &mut offset).unwrap();
    assert_eq!(
        read_heap_string(&blob, strings_offset, u32::from(module_name_index)),
        "test.dll"
    );
    assert_eq!(read_le_at::<u16>(&blob, &mut offset).unwrap(), 1);
    assert_eq!(read_le_at::<u16>(&blob, &mut offset).unwrap(), 0);
    assert_eq!(read_le_at::<u16>(&blob, &mut offset).unwrap(), 0);

    // TypeRef row: resolution scope = AssemblyRef(1) under ResolutionScope (tag 2).
    let scope = read_le_at::<u16>(&blob, &mut offset).unwrap();
    assert_eq!(scope, (1 << 2) | 2);
    let type_ref_name = read_le_at::<u16>(&blob, &mut offset).unwrap();
    assert_eq!(
        read_heap_string(&blob, strings_offset, u32::from(type_ref_name)),
        "Object"
    );
    let type_ref_ns = read_le_at::<u16>(&blob, &mut offset).unwrap();
    assert_eq!(
        read_heap_string(&blob, strings_offset, u32::from(type_ref_ns)),
        "System"
    );

    // TypeDef row: extends = TypeRef(1) under TypeDefOrRef (tag 1), lists point at row 1.
    assert_eq!(read_le_at::<u32>(&blob, &mut offset).unwrap(), 0x0010_0001);
    let _name = read_le_at::<u16>(&blob, &mut offset).unwrap();
    let _ns = read_le_at::<u16>(&blob, &mut offset).unwrap();
    assert_eq!(read_le_at::<u16>(&blob, &mut offset).unwrap(), (1 << 2) | 1);
    assert_eq!(read_le_at::<u16>(&blob, &mut offset).unwrap(), 1);
    assert_eq!(read_le_at::<u16>(&blob, &mut offset).unwrap(), 1);

    // Field row, then the MethodDef row whose RVA is stream RVA + body offset.
    offset += 6;
    assert_eq!(read_le_at::<u32>(&blob, &mut offset).unwrap(), 0x2004);
}

#[test]
fn deferred_sort_is_stable() {
    let mut builder = MetadataBuilder::new();

    // Parents arrive out of order: 5, 3, 3, 7. The two rows with parent 3 carry
    // distinct values so their relative order is observable.
    builder.add_constant(Token::from_parts(TableId::Field, 5), &Constant::I1(10));
    builder.add_constant(Token::from_parts(TableId::Field, 3), &Constant::I1(20));
    builder.add_constant(Token::from_parts(TableId::Field, 3), &Constant::I1(30));
    builder.add_constant(Token::from_parts(TableId::Field, 7), &Constant::I1(40));

    let serializer =
        TypeSystemMetadataSerializer::new(builder.freeze(), "v4.0.30319", false).unwrap();
    let blob = serializer.serialize(0, 0).unwrap();

    let (streams, _) = stream_directory(&blob);
    let (tables_offset, _) = streams["#~"];
    let (blob_heap_offset, _) = streams["#Blob"];

    // Header is 24 bytes + one row count (Constant, 4 rows).
    let mut offset = tables_offset + 24;
    assert_eq!(read_le_at::<u32>(&blob, &mut offset).unwrap(), 4);

    let mut rows = Vec::new();
    for _ in 0..4 {
        let type_code = read_le_at::<u8>(&blob, &mut offset).unwrap();
        assert_eq!(type_code, 0x04); // ELEMENT_TYPE_I1
        assert_eq!(read_le_at::<u8>(&blob, &mut offset).unwrap(), 0);
        let parent = read_le_at::<u16>(&blob, &mut offset).unwrap();
        let value_offset = read_le_at::<u16>(&blob, &mut offset).unwrap();
        let value = blob[blob_heap_offset + value_offset as usize + 1];
        rows.push((parent >> 2, value));
    }

    // Stable by parent: [3 (first), 3 (second), 5, 7].
    assert_eq!(rows, vec![(3, 20), (3, 30), (5, 10), (7, 40)]);
}

#[test]
fn suffix_folding_in_serialized_strings() {
    let mut builder = MetadataBuilder::new();

    let barfoo = builder.get_or_add_string("BarFoo");
    let foo = builder.get_or_add_string("Foo");
    builder.add_type_reference(Token::nil(), StringHandle::EMPTY, barfoo);
    builder.add_type_reference(Token::nil(), StringHandle::EMPTY, foo);

    let serializer =
        TypeSystemMetadataSerializer::new(builder.freeze(), "v4.0.30319", false).unwrap();
    let blob = serializer.serialize(0, 0).unwrap();

    let (streams, _) = stream_directory(&blob);
    let (tables_offset, _) = streams["#~"];
    let (strings_offset, strings_size) = streams["#Strings"];

    // Only one physical copy: "\0BarFoo\0" + one alignment byte.
    assert_eq!(strings_size, 8);
    assert_eq!(&blob[strings_offset..strings_offset + 8], b"\0BarFoo\0");

    // TypeRef rows (header 24 + one row count): name offsets 1 and 4.
    let mut offset = tables_offset + 24;
    assert_eq!(read_le_at::<u32>(&blob, &mut offset).unwrap(), 2);

    let _scope = read_le_at::<u16>(&blob, &mut offset).unwrap();
    let first_name = read_le_at::<u16>(&blob, &mut offset).unwrap();
    let _ns = read_le_at::<u16>(&blob, &mut offset).unwrap();
    let _scope = read_le_at::<u16>(&blob, &mut offset).unwrap();
    let second_name = read_le_at::<u16>(&blob, &mut offset).unwrap();

    assert_eq!(first_name, 1);
    assert_eq!(second_name, 4);
    assert_eq!(u32::from(second_name), u32::from(first_name) + 3);
    assert_eq!(
        read_heap_string(&blob, strings_offset, u32::from(second_name)),
        "Foo"
    );
}

#[test]
fn reference_width_boundary() {
    // 0xFFFF rows keep every reference to Field narrow; one more row widens
    // every column that can target the table.
    for (field_rows, parent_is_wide) in [(0xFFFFu32, false), (0x1_0000, true)] {
        let mut builder = MetadataBuilder::new();
        let name = builder.get_or_add_string("f");
        let signature = builder.get_or_add_blob(&[0x06, 0x08]);
        for _ in 0..field_rows {
            builder.add_field_definition(0x0006, name, signature);
        }
        builder.add_constant(Token::from_parts(TableId::Field, 1), &Constant::I4(0));

        let serializer =
            TypeSystemMetadataSerializer::new(builder.freeze(), "v4.0.30319", false).unwrap();
        let blob = serializer.serialize(0, 0).unwrap();

        let (streams, _) = stream_directory(&blob);
        let (tables_offset, _) = streams["#~"];

        // Header (24 bytes) + two row counts, then the Field rows. A Field row's
        // own size (flags, name, signature) does not depend on the row count.
        let mut offset = tables_offset + 24;
        assert_eq!(read_le_at::<u32>(&blob, &mut offset).unwrap(), field_rows);
        assert_eq!(read_le_at::<u32>(&blob, &mut offset).unwrap(), 1);
        offset += field_rows as usize * 6;

        // Constant row: type code, padding, then the HasConstant parent whose
        // width tracks the Field row count.
        assert_eq!(read_le_at::<u8>(&blob, &mut offset).unwrap(), 0x08);
        assert_eq!(read_le_at::<u8>(&blob, &mut offset).unwrap(), 0);
        let parent = read_le_at_dyn(&blob, &mut offset, parent_is_wide).unwrap();
        assert_eq!(parent, 1 << 2, "Field(1) under HasConstant tag 0");
    }
}

#[test]
fn user_strings_in_serialized_heap() {
    let mut builder = MetadataBuilder::new();
    let hello = builder.get_or_add_user_string("Hi").unwrap();
    assert_eq!(hello.offset(), 1);

    let serializer =
        TypeSystemMetadataSerializer::new(builder.freeze(), "v4.0.30319", false).unwrap();
    let blob = serializer.serialize(0, 0).unwrap();

    let (streams, _) = stream_directory(&blob);
    let (us_offset, us_size) = streams["#US"];

    assert_eq!(us_size, 8);
    assert_eq!(
        &blob[us_offset..us_offset + 7],
        &[0x00, 0x05, b'H', 0x00, b'i', 0x00, 0x00]
    );
}

#[test]
fn minimal_delta_streams_and_flags() {
    let mut builder = MetadataBuilder::new();
    let name = builder.get_or_add_string("delta.dll");
    builder.add_module(
        1,
        name,
        GuidHandle::default(),
        GuidHandle::default(),
        GuidHandle::default(),
    );

    let serializer =
        TypeSystemMetadataSerializer::new(builder.freeze(), "v4.0.30319", true).unwrap();
    let blob = serializer.serialize(0, 0).unwrap();

    let (streams, order) = stream_directory(&blob);
    assert_eq!(order, ["#-", "#Strings", "#US", "#GUID", "#Blob", "#JTD"]);

    // The marker stream is empty and sits at the very end of the blob.
    let (jtd_offset, jtd_size) = streams["#JTD"];
    assert_eq!(jtd_size, 0);
    assert_eq!(jtd_offset, blob.len());

    // Heap-size flags: all heaps wide + EnC deltas + deleted marks.
    let (tables_offset, _) = streams["#-"];
    assert_eq!(blob[tables_offset + 6], 0xA7);

    // Wide references: the Module row is 2 + 4 + 3*4 = 18 bytes.
    let mut offset = tables_offset + 24;
    assert_eq!(read_le_at::<u32>(&blob, &mut offset).unwrap(), 1);
    assert_eq!(read_le_at::<u16>(&blob, &mut offset).unwrap(), 1);
    let name_index = read_le_at::<u32>(&blob, &mut offset).unwrap();
    assert_eq!(name_index, 1);
}

#[test]
fn standalone_debug_metadata_with_content_id() {
    let mut builder = MetadataBuilder::new();

    let doc_name = builder.get_or_add_blob(b"/src/main.cs");
    let hash_algorithm = builder.get_or_add_guid(guid!("8829d00f-11b8-4213-878b-770e8597ac16"));
    let hash = builder.get_or_add_blob(&[0xDE, 0xAD]);
    let language = builder.get_or_add_guid(guid!("3f5162f8-07c6-11d3-9053-00c04fa302a1"));
    let document = builder.add_document(doc_name, hash_algorithm, hash, language);

    let points = builder.get_or_add_blob(&[0x01, 0x02]);
    builder.add_method_debug_information(document, points);

    let mut external_row_counts = [0u32; TABLE_COUNT];
    external_row_counts[TableId::TypeDef as usize] = 3;
    external_row_counts[TableId::MethodDef as usize] = 2;

    let serializer = StandaloneDebugMetadataSerializer::new(
        builder.freeze(),
        "PDB v1.0",
        external_row_counts,
        Some(Token::from_parts(TableId::MethodDef, 2)),
    )
    .unwrap();

    let mut seen_zeroed_id = false;
    let blob = serializer
        .serialize(|content| {
            // The provider sees the exact serialized bytes with a zeroed ID region.
            let (streams, _) = stream_directory(content);
            let (pdb_offset, _) = streams["#Pdb"];
            seen_zeroed_id = content[pdb_offset..pdb_offset + 20].iter().all(|b| *b == 0);
            [0xAB; 20]
        })
        .unwrap();
    assert!(seen_zeroed_id);

    let (streams, order) = stream_directory(&blob);
    assert_eq!(order[0], "#Pdb");
    assert_eq!(order[1], "#~");

    let (pdb_offset, pdb_size) = streams["#Pdb"];
    // id(20) + entry point(4) + external mask(8) + two external row counts(8)
    assert_eq!(pdb_size, 40);
    assert_eq!(&blob[pdb_offset..pdb_offset + 20], &[0xAB; 20]);

    let mut offset = pdb_offset + 20;
    assert_eq!(read_le_at::<u32>(&blob, &mut offset).unwrap(), 0x0600_0002);
    assert_eq!(
        read_le_at::<u64>(&blob, &mut offset).unwrap(),
        TableId::TypeDef.bit() | TableId::MethodDef.bit()
    );
    assert_eq!(read_le_at::<u32>(&blob, &mut offset).unwrap(), 3);
    assert_eq!(read_le_at::<u32>(&blob, &mut offset).unwrap(), 2);

    // A standalone PDB never advertises the type-system sorted mask.
    let (tables_offset, _) = streams["#~"];
    let mut offset = tables_offset + 16;
    assert_eq!(read_le_at::<u64>(&blob, &mut offset).unwrap(), 0);
}

#[test]
fn version_string_length_is_validated() {
    let builder = MetadataBuilder::new();
    let long_version = "v".repeat(255);
    let result = TypeSystemMetadataSerializer::new(builder.freeze(), &long_version, false);
    assert!(matches!(result, Err(Error::VersionTooLong(_))));
}
