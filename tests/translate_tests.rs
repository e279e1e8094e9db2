//! Tests for the Avro translation ruleset.

use std::sync::Arc;

use avrocast::error::CompileError;
use avrocast::ir::{self, Annotations, IrNode, ScalarKind, ScalarNode};
use avrocast::schema::AvroSchema;
use avrocast::translate::{avro_compiler, CompilerState};

fn compile_node(node: &ir::Node) -> Result<(AvroSchema, CompilerState), CompileError> {
    avro_compiler().run(node, CompilerState::new())
}

fn compile_schema(node: &ir::Node) -> AvroSchema {
    compile_node(node).expect("compile should succeed").0
}

// ============================================================================
// Scalars
// ============================================================================

#[test]
fn test_scalar_mapping() {
    assert_eq!(compile_schema(&ir::string()), AvroSchema::String);
    assert_eq!(compile_schema(&ir::boolean()), AvroSchema::Boolean);
}

#[test]
fn test_number_sub_kind_selection() {
    assert_eq!(compile_schema(&ir::int()), AvroSchema::Int);
    assert_eq!(compile_schema(&ir::float()), AvroSchema::Float);
    assert_eq!(compile_schema(&ir::long()), AvroSchema::Long);
    // No annotation defaults to double.
    assert_eq!(compile_schema(&ir::double()), AvroSchema::Double);
}

#[test]
fn test_unsupported_scalars_fail() {
    for kind in [
        ScalarKind::Undefined,
        ScalarKind::Never,
        ScalarKind::Unknown,
        ScalarKind::Any,
    ] {
        let node = Arc::new(IrNode::Scalar(ScalarNode {
            kind,
            annotations: Annotations::new(),
        }));
        assert!(matches!(
            compile_node(&node),
            Err(CompileError::UnsupportedNode(_))
        ));
    }
}

// ============================================================================
// Byte Buffers and Literals
// ============================================================================

#[test]
fn test_byte_buffer_declaration_compiles_to_bytes() {
    assert_eq!(compile_schema(&ir::bytes()), AvroSchema::Bytes);
}

#[test]
fn test_literal_compiles_to_single_symbol_enum() {
    match compile_schema(&ir::literal("open")) {
        AvroSchema::Enum(e) => {
            assert_eq!(e.name, "open");
            assert_eq!(e.symbols, vec!["open"]);
        }
        other => panic!("expected enum, got {:?}", other),
    }
}

// ============================================================================
// Structs and Classes
// ============================================================================

#[test]
fn test_identified_struct_compiles_to_record() {
    let node = ir::with_identifier(
        &ir::struct_of(vec![
            ir::field("x", ir::double()),
            ir::field("y", ir::double()),
        ]),
        "Point",
    );

    match compile_schema(&node) {
        AvroSchema::Record(r) => {
            assert_eq!(r.name, "Point");
            assert_eq!(r.logical_type.as_deref(), Some("Tag_Point"));
            assert_eq!(r.fields.len(), 2);
            assert_eq!(r.fields[0].name, "x");
            assert_eq!(r.fields[0].schema, AvroSchema::Double);
        }
        other => panic!("expected record, got {:?}", other),
    }
}

#[test]
fn test_anonymous_struct_fails_with_missing_identifier() {
    let node = ir::struct_of(vec![ir::field("x", ir::double())]);
    assert!(matches!(
        compile_node(&node),
        Err(CompileError::MissingIdentifier(_))
    ));
}

#[test]
fn test_class_names_its_body_struct() {
    let node = ir::class(
        "User",
        vec![
            ir::field("id", ir::int()),
            ir::field("name", ir::string()),
        ],
    );

    match compile_schema(&node) {
        AvroSchema::Record(r) => {
            assert_eq!(r.name, "User");
            assert_eq!(r.fields.len(), 2);
            assert_eq!(r.fields[0].schema, AvroSchema::Int);
            assert_eq!(r.fields[1].schema, AvroSchema::String);
        }
        other => panic!("expected record, got {:?}", other),
    }
}

#[test]
fn test_tag_field_is_elided() {
    let node = ir::tagged_class("TestStruct", vec![]);
    match compile_schema(&node) {
        AvroSchema::Record(r) => {
            assert_eq!(r.name, "TestStruct");
            assert!(r.fields.is_empty());
        }
        other => panic!("expected record, got {:?}", other),
    }
}

#[test]
fn test_non_literal_tag_field_is_kept() {
    // Only a literal-typed discriminant is elided; a string-typed field
    // that happens to share the name stays.
    let node = ir::class("Odd", vec![ir::field("_tag", ir::string())]);
    match compile_schema(&node) {
        AvroSchema::Record(r) => {
            assert_eq!(r.fields.len(), 1);
            assert_eq!(r.fields[0].name, "_tag");
        }
        other => panic!("expected record, got {:?}", other),
    }
}

#[test]
fn test_nested_class_keeps_its_own_name() {
    let author = ir::class("Author", vec![ir::field("name", ir::string())]);
    let post = ir::class(
        "Post",
        vec![ir::field("id", ir::int()), ir::field("author", author)],
    );

    match compile_schema(&post) {
        AvroSchema::Record(r) => {
            assert_eq!(r.name, "Post");
            match &r.fields[1].schema {
                AvroSchema::Record(inner) => assert_eq!(inner.name, "Author"),
                other => panic!("expected nested record, got {:?}", other),
            }
        }
        other => panic!("expected record, got {:?}", other),
    }
}

// ============================================================================
// Named-Type Memoization
// ============================================================================

#[test]
fn test_named_struct_compiled_once_first_wins() {
    // Two class nodes share a name but disagree on fields; the first
    // compile is cached and reused verbatim for the second reference.
    let first = ir::class("Shared", vec![ir::field("a", ir::int())]);
    let second = ir::class("Shared", vec![ir::field("b", ir::string())]);
    let holder = ir::class(
        "Holder",
        vec![ir::field("x", first), ir::field("y", second)],
    );

    match compile_schema(&holder) {
        AvroSchema::Record(r) => {
            assert_eq!(r.fields[0].schema, r.fields[1].schema);
            match &r.fields[0].schema {
                AvroSchema::Record(shared) => {
                    assert_eq!(shared.fields.len(), 1);
                    assert_eq!(shared.fields[0].name, "a");
                }
                other => panic!("expected record, got {:?}", other),
            }
        }
        other => panic!("expected record, got {:?}", other),
    }
}

#[test]
fn test_registry_shared_across_paired_runs() {
    let user = ir::class("User", vec![ir::field("id", ir::int())]);
    let compiler = avro_compiler();

    let (heavy, state) = compiler.run(&user, CompilerState::new()).unwrap();
    // A second run against the final state reuses the cached definition
    // even though this class node disagrees on fields.
    let altered = ir::class("User", vec![ir::field("renamed", ir::string())]);
    let (light, _) = compiler.run(&altered, state).unwrap();

    assert_eq!(heavy, light);
}

// ============================================================================
// Unions
// ============================================================================

#[test]
fn test_literal_union_compiles_to_enum() {
    let node = ir::with_identifier(
        &ir::union(vec![ir::literal("A"), ir::literal("B")]),
        "Letter",
    );
    match compile_schema(&node) {
        AvroSchema::Enum(e) => {
            assert_eq!(e.name, "Letter");
            assert_eq!(e.symbols, vec!["A", "B"]);
        }
        other => panic!("expected enum, got {:?}", other),
    }
}

#[test]
fn test_literal_union_without_identifier_fails() {
    let node = ir::union(vec![ir::literal("A"), ir::literal("B")]);
    assert!(matches!(
        compile_node(&node),
        Err(CompileError::MissingIdentifier(_))
    ));
}

#[test]
fn test_mixed_union_compiles_members_independently() {
    let node = ir::union(vec![
        ir::class("Left", vec![ir::field("l", ir::int())]),
        ir::class("Right", vec![ir::field("r", ir::string())]),
    ]);
    match compile_schema(&node) {
        AvroSchema::Union(members) => {
            assert_eq!(members.len(), 2);
            assert_eq!(members[0].name(), Some("Left"));
            assert_eq!(members[1].name(), Some("Right"));
        }
        other => panic!("expected union, got {:?}", other),
    }
}

#[test]
fn test_nested_union_is_rejected() {
    let inner = ir::union(vec![
        ir::class("A", vec![ir::field("a", ir::int())]),
        ir::class("B", vec![ir::field("b", ir::int())]),
    ]);
    let outer = ir::union(vec![
        inner,
        ir::class("C", vec![ir::field("c", ir::int())]),
    ]);
    assert!(matches!(
        compile_node(&outer),
        Err(CompileError::NestedUnion)
    ));
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
                ir::union(vec![ir::literal("none"), ir::suspend(category)]),
            ),
        ],
    )
}

#[test]
fn test_recursive_type_terminates() {
    let (schema, state) = compile_node(&category()).unwrap();

    match &schema {
        AvroSchema::Record(r) => {
            assert_eq!(r.name, "Category");
            match &r.fields[1].schema {
                AvroSchema::Union(members) => {
                    assert_eq!(members[1], AvroSchema::Ref("Category".to_string()));
                }
                other => panic!("expected union, got {:?}", other),
            }
        }
        other => panic!("expected record, got {:?}", other),
    }

    // The registry holds exactly one full definition for the name.
    let registry = state.registry.borrow();
    assert!(registry.named_types.contains_key("Category"));
    assert!(registry.in_progress.is_empty());
}
