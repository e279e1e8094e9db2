//! The Avro translation ruleset.
//!
//! Registers the domain handlers into the matching engine: scalar
//! mapping, record/field compilation with discriminant elision, named
//! class declarations, lazy recursion, byte buffers, literal enums, and
//! unions. The output of a run is an [`AvroSchema`] plus, in the final
//! state, the named-type and logical-type registries the binary engine
//! needs.

mod state;

pub use state::{CompilerState, DeclarationContext, TypeRegistry};

use tracing::debug;

use crate::binary::ambient_tag;
use crate::compiler::{
    match_declaration, match_literal, match_scalar, match_struct, match_suspend,
    match_transformation, match_union, Compiler, Harness,
};
use crate::error::CompileError;
use crate::ir::{
    IrNode, LiteralNode, Node, NumberHint, ScalarKind, ScalarNode, StructNode, SuspendNode,
    TransformationKind, TransformationNode, UnionNode, BYTE_BUFFER_ID, TAG_FIELD,
};
use crate::schema::{AvroSchema, EnumSchema, FieldSchema, RecordSchema};

type AvroHarness<'a> = Harness<'a, AvroSchema, CompilerState>;

/// Build the full translation ruleset.
///
/// Registration order matters: dispatch is most-recent-first, so the
/// byte-buffer declaration, literal, and union rules override the
/// general struct and class handling where their matchers apply.
pub fn avro_compiler() -> Compiler<AvroSchema, CompilerState> {
    Compiler::new()
        .with_rule(match_scalar, compile_scalar)
        .with_rule(match_struct, compile_struct)
        .with_rule(
            match_transformation(
                TransformationKind::Identity,
                |node: &Node| match_struct(node).map(|_| node.clone()),
                match_identified_class_declaration,
            ),
            compile_class,
        )
        .with_rule(match_suspend, compile_suspend)
        .with_rule(match_byte_buffer, |_, _: &mut AvroHarness<'_>| {
            Ok(AvroSchema::Bytes)
        })
        .with_rule(match_literal, compile_literal)
        .with_rule(match_union, compile_union)
}

/// Match a declaration carrying the reserved byte-buffer identifier.
fn match_byte_buffer(node: &Node) -> Option<Node> {
    match_declaration(node)
        .filter(|decl| decl.annotations.identifier() == Some(BYTE_BUFFER_ID))
        .map(|_| node.clone())
}

/// Match a declaration carrying an identifier whose sole type parameter
/// is a struct, returning the identifier.
fn match_identified_class_declaration(node: &Node) -> Option<String> {
    let decl = match_declaration(node)?;
    let id = decl.annotations.identifier()?.to_string();
    let first = decl.type_parameters.first()?;
    match_struct(first).map(|_| id)
}

fn compile_scalar(
    scalar: ScalarNode,
    _harness: &mut AvroHarness<'_>,
) -> Result<AvroSchema, CompileError> {
    match scalar.kind {
        ScalarKind::String => Ok(AvroSchema::String),
        ScalarKind::Boolean => Ok(AvroSchema::Boolean),
        ScalarKind::Number => Ok(match scalar.annotations.number_hint() {
            Some(NumberHint::Int) => AvroSchema::Int,
            Some(NumberHint::Float) => AvroSchema::Float,
            Some(NumberHint::Long) => AvroSchema::Long,
            None => AvroSchema::Double,
        }),
        other => Err(CompileError::UnsupportedNode(format!(
            "unsupported scalar: {:?}",
            other
        ))),
    }
}

fn compile_struct(
    node: StructNode,
    harness: &mut AvroHarness<'_>,
) -> Result<AvroSchema, CompileError> {
    let decl_id = harness
        .state()
        .declared_id()
        .or_else(|| node.annotations.identifier().map(str::to_string))
        .ok_or_else(|| CompileError::MissingIdentifier("struct requires a name".to_string()))?;

    // Register the ambient-tag codec for this name before any field is
    // compiled; registration is idempotent.
    let logical_name = harness.modify_state(|state| {
        let codec = ambient_tag(decl_id.as_str());
        let name = codec.name().to_string();
        state.registry.borrow_mut().logical_types.register(codec);
        name
    });

    {
        let state = harness.state();
        let registry = state.registry.borrow();
        if let Some(existing) = registry.named_types.get(&decl_id) {
            return Ok(existing.clone());
        }
        if registry.in_progress.contains(&decl_id) {
            // Mid-compile self-reference; the registry will hold the
            // full definition once the outer compile finishes.
            return Ok(AvroSchema::Ref(decl_id));
        }
    }

    harness.modify_state(|state| {
        state
            .registry
            .borrow_mut()
            .in_progress
            .insert(decl_id.clone());
    });

    // Field types compile without the enclosing declaration context, so
    // a named struct nested in a class resolves its own name.
    let fields = harness.with_state(
        |state| state.without_declaration(),
        |h| {
            let mut fields = Vec::with_capacity(node.fields.len());
            for sig in &node.fields {
                if sig.name == TAG_FIELD && matches!(&*sig.ty, IrNode::Literal(_)) {
                    // The discriminant never hits the wire.
                    continue;
                }
                let schema = h.compile(&sig.ty)?;
                fields.push(FieldSchema::new(sig.name.clone(), schema));
            }
            Ok(fields)
        },
    );

    harness.modify_state(|state| {
        state
            .registry
            .borrow_mut()
            .in_progress
            .remove(&decl_id);
    });
    let fields = fields?;

    let record = AvroSchema::Record(
        RecordSchema::new(decl_id.clone(), fields).with_logical_type(logical_name),
    );
    debug!(name = %decl_id, "compiled record");

    // First compile wins; later passes reuse the registered definition.
    Ok(harness.modify_state(|state| {
        let mut registry = state.registry.borrow_mut();
        registry
            .named_types
            .entry(decl_id.clone())
            .or_insert_with(|| record.clone())
            .clone()
    }))
}

#[allow(clippy::type_complexity)]
fn compile_class(
    (_, body, class_id): (TransformationNode, Node, String),
    harness: &mut AvroHarness<'_>,
) -> Result<AvroSchema, CompileError> {
    harness.with_state(
        |state| state.with_declaration(class_id.clone()),
        |h| h.compile(&body),
    )
}

fn compile_suspend(
    node: SuspendNode,
    harness: &mut AvroHarness<'_>,
) -> Result<AvroSchema, CompileError> {
    harness.compile(&node.force())
}

fn compile_literal(
    node: LiteralNode,
    _harness: &mut AvroHarness<'_>,
) -> Result<AvroSchema, CompileError> {
    let symbol = node.value.to_string();
    Ok(AvroSchema::Enum(EnumSchema::new(
        symbol.clone(),
        vec![symbol],
    )))
}

fn compile_union(
    node: UnionNode,
    harness: &mut AvroHarness<'_>,
) -> Result<AvroSchema, CompileError> {
    let literal_symbols: Option<Vec<String>> = node
        .members
        .iter()
        .map(|member| match &**member {
            IrNode::Literal(lit) => Some(lit.value.to_string()),
            _ => None,
        })
        .collect();

    if let Some(symbols) = literal_symbols {
        let name = node.annotations.identifier().ok_or_else(|| {
            CompileError::MissingIdentifier("literal union requires an identifier".to_string())
        })?;
        return Ok(AvroSchema::Enum(EnumSchema::new(name, symbols)));
    }

    let members = harness.compile_all(&node.members)?;
    if members.iter().any(AvroSchema::is_union) {
        return Err(CompileError::NestedUnion);
    }
    Ok(AvroSchema::Union(members))
}
