//! Schema IR: the tagged-node tree describing types to be compiled.
//!
//! The IR is supplied by an external schema library; this module models
//! it at the interface the compiler needs (tags, children, annotations)
//! and provides the small construction surface used by callers and
//! tests.

mod annotations;
mod node;

pub use annotations::{AnnotationKey, AnnotationValue, Annotations, NumberHint};
pub use node::{
    DeclarationNode, FieldSignature, IndexSignature, IrNode, LiteralNode, LiteralValue, Node,
    NodeTag, RefinementNode, ScalarKind, ScalarNode, StructNode, SuspendNode, TemplateLiteralNode,
    TemplateSpan, TransformationKind, TransformationNode, TupleElement, TupleNode, UnionNode,
};

use std::sync::Arc;

/// Reserved identifier marking the byte-buffer declaration.
pub const BYTE_BUFFER_ID: &str = "ByteBuffer";

/// Name of the discriminant field elided from the Avro wire format.
pub const TAG_FIELD: &str = "_tag";

fn scalar(kind: ScalarKind) -> Node {
    Arc::new(IrNode::Scalar(ScalarNode {
        kind,
        annotations: Annotations::new(),
    }))
}

fn number_with_hint(hint: NumberHint) -> Node {
    Arc::new(IrNode::Scalar(ScalarNode {
        kind: ScalarKind::Number,
        annotations: Annotations::new().with(
            AnnotationKey::NumberKind,
            AnnotationValue::Number(hint),
        ),
    }))
}

/// A UTF-8 string scalar.
pub fn string() -> Node {
    scalar(ScalarKind::String)
}

/// A boolean scalar.
pub fn boolean() -> Node {
    scalar(ScalarKind::Boolean)
}

/// An untagged number; compiles to Avro `double`.
pub fn double() -> Node {
    scalar(ScalarKind::Number)
}

/// A number tagged as a 32-bit integer.
pub fn int() -> Node {
    number_with_hint(NumberHint::Int)
}

/// A number tagged as a 64-bit integer.
pub fn long() -> Node {
    number_with_hint(NumberHint::Long)
}

/// A number tagged as a 32-bit float.
pub fn float() -> Node {
    number_with_hint(NumberHint::Float)
}

/// The opaque byte-buffer declaration; compiles to Avro `bytes`.
pub fn bytes() -> Node {
    Arc::new(IrNode::Declaration(DeclarationNode {
        type_parameters: Vec::new(),
        annotations: Annotations::new().with_identifier(BYTE_BUFFER_ID),
    }))
}

/// A literal node.
pub fn literal(value: impl Into<LiteralValue>) -> Node {
    Arc::new(IrNode::Literal(LiteralNode {
        value: value.into(),
        annotations: Annotations::new(),
    }))
}

/// A named field of a struct.
pub fn field(name: impl Into<String>, ty: Node) -> FieldSignature {
    FieldSignature {
        name: name.into(),
        ty,
        is_optional: false,
        is_readonly: false,
        annotations: Annotations::new(),
    }
}

/// An anonymous struct. Compiling it requires a name from an identifier
/// annotation or an enclosing declaration context.
pub fn struct_of(fields: Vec<FieldSignature>) -> Node {
    Arc::new(IrNode::Struct(StructNode {
        fields,
        index_signatures: Vec::new(),
        annotations: Annotations::new(),
    }))
}

/// A union of member nodes.
pub fn union(members: Vec<Node>) -> Node {
    Arc::new(IrNode::Union(UnionNode {
        members,
        annotations: Annotations::new(),
    }))
}

/// Return a copy of `node` carrying an identifier annotation.
pub fn with_identifier(node: &Node, id: impl Into<String>) -> Node {
    Arc::new(node.with_annotation(
        AnnotationKey::Identifier,
        AnnotationValue::Text(id.into()),
    ))
}

/// A named class declaration: an identity transformation whose `to` side
/// is an identified declaration wrapping the body struct, and whose
/// `from` side is the body struct itself.
pub fn class(name: impl Into<String>, fields: Vec<FieldSignature>) -> Node {
    let name = name.into();
    let body = struct_of(fields);
    Arc::new(IrNode::Transformation(TransformationNode {
        from: body.clone(),
        to: Arc::new(IrNode::Declaration(DeclarationNode {
            type_parameters: vec![body],
            annotations: Annotations::new().with_identifier(name),
        })),
        kind: TransformationKind::Identity,
        annotations: Annotations::new(),
    }))
}

/// A named class whose body carries a literal discriminant field equal
/// to the class name.
pub fn tagged_class(name: impl Into<String>, fields: Vec<FieldSignature>) -> Node {
    let name = name.into();
    let mut all = vec![field(TAG_FIELD, literal(name.as_str()))];
    all.extend(fields);
    class(name, all)
}

/// A lazily evaluated node; the only legal way to express a cycle.
pub fn suspend(thunk: impl Fn() -> Node + Send + Sync + 'static) -> Node {
    Arc::new(IrNode::Suspend(SuspendNode::new(thunk)))
}
