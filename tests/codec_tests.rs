//! End-to-end tests for compiled codecs: round trips, tag elision on
//! the wire, and evolution decoding.

use avrocast::binary::AvroValue;
use avrocast::codec::{compile, compile_with_evolution, Evolution};
use avrocast::error::CodecError;
use avrocast::ir::{self, TAG_FIELD};

// ============================================================================
// Fixtures
// ============================================================================

fn user_class() -> ir::Node {
    ir::class(
        "User",
        vec![
            ir::field("id", ir::int()),
            ir::field("name", ir::string()),
            ir::field("email", ir::string()),
        ],
    )
}

fn post_class() -> ir::Node {
    ir::class(
        "Post",
        vec![ir::field("id", ir::int()), ir::field("author", user_class())],
    )
}

fn user_value(id: i32, name: &str, email: &str) -> AvroValue {
    AvroValue::record(vec![
        (TAG_FIELD, AvroValue::String("User".into())),
        ("id", AvroValue::Int(id)),
        ("name", AvroValue::String(name.into())),
        ("email", AvroValue::String(email.into())),
    ])
}

fn post_value(id: i32) -> AvroValue {
    AvroValue::record(vec![
        (TAG_FIELD, AvroValue::String("Post".into())),
        ("id", AvroValue::Int(id)),
        ("author", user_value(1, "John Doe", "john.doe@example.com")),
    ])
}

// ============================================================================
// Round Trips
// ============================================================================

#[test]
fn test_scalar_round_trip() {
    let codec = compile(&ir::long()).unwrap();
    let bytes = codec.encode(&AvroValue::Long(-42)).unwrap();
    assert_eq!(codec.decode(&bytes).unwrap(), AvroValue::Long(-42));
}

#[test]
fn test_nested_record_round_trip() {
    let codec = compile(&post_class()).unwrap();
    let post = post_value(7);

    let bytes = codec.encode(&post).unwrap();
    assert_eq!(codec.decode(&bytes).unwrap(), post);
}

#[test]
fn test_record_with_literal_field_round_trip() {
    let codec = compile(&ir::class(
        "Task",
        vec![
            ir::field("status", ir::literal("open")),
            ir::field("title", ir::string()),
        ],
    ))
    .unwrap();

    let task = AvroValue::record(vec![
        (TAG_FIELD, AvroValue::String("Task".into())),
        ("status", AvroValue::String("open".into())),
        ("title", AvroValue::String("write tests".into())),
    ]);

    let bytes = codec.encode(&task).unwrap();
    assert_eq!(codec.decode(&bytes).unwrap(), task);
}

// ============================================================================
// Tag Elision
// ============================================================================

#[test]
fn test_tagged_empty_struct_encodes_to_zero_bytes() {
    let codec = compile(&ir::tagged_class("TestStruct", vec![])).unwrap();

    let value = AvroValue::record(vec![(
        TAG_FIELD,
        AvroValue::String("TestStruct".into()),
    )]);

    let bytes = codec.encode(&value).unwrap();
    assert!(bytes.is_empty());

    let decoded = codec.decode(&bytes).unwrap();
    assert_eq!(
        decoded.field(TAG_FIELD),
        Some(&AvroValue::String("TestStruct".into()))
    );
}

#[test]
fn test_decoded_discriminant_always_equals_struct_name() {
    let codec = compile(&post_class()).unwrap();
    let bytes = codec.encode(&post_value(3)).unwrap();

    let decoded = codec.decode(&bytes).unwrap();
    assert_eq!(
        decoded.field(TAG_FIELD),
        Some(&AvroValue::String("Post".into()))
    );
    assert_eq!(
        decoded.field("author").unwrap().field(TAG_FIELD),
        Some(&AvroValue::String("User".into()))
    );
}

// ============================================================================
// Unions
// ============================================================================

#[test]
fn test_union_of_classes_round_trip() {
    let codec = compile(&ir::union(vec![post_class(), user_class()])).unwrap();

    let post = post_value(1);
    let bytes = codec.encode(&post).unwrap();
    assert_eq!(codec.decode(&bytes).unwrap(), post);

    let user = user_value(2, "Ada", "ada@example.com");
    let bytes = codec.encode(&user).unwrap();
    assert_eq!(codec.decode(&bytes).unwrap(), user);
}

#[test]
fn test_literal_union_round_trip() {
    let codec = compile(&ir::with_identifier(
        &ir::union(vec![ir::literal("A"), ir::literal("B")]),
        "Letter",
    ))
    .unwrap();

    let bytes = codec.encode(&AvroValue::String("B".into())).unwrap();
    assert_eq!(bytes, vec![0x02]);
    assert_eq!(
        codec.decode(&bytes).unwrap(),
        AvroValue::String("B".into())
    );
}

// ============================================================================
// Recursive Types
// ============================================================================

fn category() -> ir::Node {
    ir::tagged_class(
        "Category",
        vec![
            ir::field("name", ir::string()),
            ir::field(
                "parent",
                ir::union(vec![ir::literal("root"), ir::suspend(category)]),
            ),
        ],
    )
}

#[test]
fn test_recursive_value_round_trip() {
    let codec = compile(&category()).unwrap();

    let leaf = AvroValue::record(vec![
        (TAG_FIELD, AvroValue::String("Category".into())),
        ("name", AvroValue::String("tools".into())),
        ("parent", AvroValue::String("root".into())),
    ]);
    let node = AvroValue::record(vec![
        (TAG_FIELD, AvroValue::String("Category".into())),
        ("name", AvroValue::String("compilers".into())),
        ("parent", leaf),
    ]);

    let bytes = codec.encode(&node).unwrap();
    assert_eq!(codec.decode(&bytes).unwrap(), node);
}

// ============================================================================
// Evolution
// ============================================================================

fn heavy_post() -> ir::Node {
    ir::class(
        "Article",
        vec![ir::field("id", ir::int()), ir::field("name", ir::string())],
    )
}

fn light_post() -> ir::Node {
    ir::with_identifier(
        &ir::struct_of(vec![ir::field("id", ir::int())]),
        "ArticleId",
    )
}

fn article(id: i32, name: &str) -> AvroValue {
    AvroValue::record(vec![
        (TAG_FIELD, AvroValue::String("Article".into())),
        ("id", AvroValue::Int(id)),
        ("name", AvroValue::String(name.into())),
    ])
}

fn evolving_codec() -> avrocast::AvroCodec {
    compile_with_evolution(
        &heavy_post(),
        Evolution::new(light_post(), |value| {
            value.field("id").and_then(AvroValue::as_i32) == Some(1)
        }),
    )
    .unwrap()
}

#[test]
fn test_evolution_accepted_payload_decodes_fully() {
    let codec = evolving_codec();
    let original = article(1, "x");

    let bytes = codec.encode(&original).unwrap();
    let decoded = codec.decode(&bytes).unwrap();

    // The full heavy value comes back, not the light projection.
    assert_eq!(decoded, original);
}

#[test]
fn test_evolution_rejected_payload_fails_validation() {
    let codec = evolving_codec();
    let bytes = codec.encode(&article(2, "y")).unwrap();

    assert!(matches!(
        codec.decode(&bytes),
        Err(CodecError::EvolutionValidation)
    ));
}

#[test]
fn test_evolution_encoding_always_uses_heavy_schema() {
    let plain = compile(&heavy_post()).unwrap();
    let evolving = evolving_codec();

    let value = article(1, "same bytes");
    assert_eq!(
        plain.encode(&value).unwrap(),
        evolving.encode(&value).unwrap()
    );
}

// ============================================================================
// Decode Errors
// ============================================================================

#[test]
fn test_malformed_bytes_fail_with_decode_error() {
    let codec = compile(&heavy_post()).unwrap();
    // A valid id varint followed by a truncated string.
    let err = codec.decode(&[0x02]).unwrap_err();
    assert!(matches!(err, CodecError::Decode(_)));
}

#[test]
fn test_malformed_bytes_fail_with_decode_error_under_evolution() {
    let codec = evolving_codec();
    let err = codec.decode(&[0x02]).unwrap_err();
    assert!(matches!(err, CodecError::Decode(_)));
}

#[test]
fn test_trailing_bytes_are_rejected() {
    let codec = compile(&heavy_post()).unwrap();
    let mut bytes = codec.encode(&article(1, "x")).unwrap();
    bytes.push(0x00);

    assert!(matches!(codec.decode(&bytes), Err(CodecError::Decode(_))));
}
