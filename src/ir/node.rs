//! Schema IR node types.
//!
//! The IR is a tree of tagged, annotated, immutable nodes supplied by an
//! external schema library. The compiler only requires read access to
//! node tags, children, and annotations; construction beyond the helpers
//! in [`crate::ir`] is out of scope.

use std::fmt;
use std::sync::Arc;

use super::annotations::Annotations;

/// A shared, immutable IR node.
pub type Node = Arc<IrNode>;

/// Node kind tags, used by the engine's tag matchers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeTag {
    Scalar,
    Literal,
    Declaration,
    Refinement,
    Suspend,
    TemplateLiteral,
    Transformation,
    Tuple,
    Struct,
    Union,
}

impl fmt::Display for NodeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Scalar kinds. Only `String`, `Number`, and `Boolean` are
/// representable in Avro; the rest exist so unsupported inputs fail
/// with a tag-accurate error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    String,
    Number,
    Boolean,
    Undefined,
    Never,
    Unknown,
    Any,
}

/// A literal value carried by a `Literal` node.
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    Str(String),
    Num(f64),
    Bool(bool),
    Null,
}

impl fmt::Display for LiteralValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LiteralValue::Str(s) => f.write_str(s),
            LiteralValue::Num(n) => write!(f, "{}", n),
            LiteralValue::Bool(b) => write!(f, "{}", b),
            LiteralValue::Null => f.write_str("null"),
        }
    }
}

impl From<&str> for LiteralValue {
    fn from(s: &str) -> Self {
        LiteralValue::Str(s.to_string())
    }
}

impl From<String> for LiteralValue {
    fn from(s: String) -> Self {
        LiteralValue::Str(s)
    }
}

impl From<f64> for LiteralValue {
    fn from(n: f64) -> Self {
        LiteralValue::Num(n)
    }
}

impl From<i32> for LiteralValue {
    fn from(n: i32) -> Self {
        LiteralValue::Num(n as f64)
    }
}

impl From<bool> for LiteralValue {
    fn from(b: bool) -> Self {
        LiteralValue::Bool(b)
    }
}

/// How a `Transformation` pairs its two sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformationKind {
    /// Associates a plain structural shape with a named identity.
    Identity,
    /// Composes two codecs end to end.
    Compose,
    /// Field-by-field transformation of a struct.
    Structural,
}

/// A scalar node.
#[derive(Debug, Clone)]
pub struct ScalarNode {
    pub kind: ScalarKind,
    pub annotations: Annotations,
}

/// A literal node.
#[derive(Debug, Clone)]
pub struct LiteralNode {
    pub value: LiteralValue,
    pub annotations: Annotations,
}

/// A branded/opaque declaration wrapping its type parameters.
#[derive(Debug, Clone)]
pub struct DeclarationNode {
    pub type_parameters: Vec<Node>,
    pub annotations: Annotations,
}

/// A refinement of a base node. The predicate is opaque to compilation
/// and not modeled at this interface.
#[derive(Debug, Clone)]
pub struct RefinementNode {
    pub from: Node,
    pub annotations: Annotations,
}

/// A lazily evaluated node, the only legal way to express a cycle.
#[derive(Clone)]
pub struct SuspendNode {
    thunk: Arc<dyn Fn() -> Node + Send + Sync>,
    pub annotations: Annotations,
}

impl SuspendNode {
    pub fn new(thunk: impl Fn() -> Node + Send + Sync + 'static) -> Self {
        Self {
            thunk: Arc::new(thunk),
            annotations: Annotations::new(),
        }
    }

    /// Force the thunk, yielding the underlying node. Not invoked until
    /// dispatch actually reaches this node.
    pub fn force(&self) -> Node {
        (self.thunk)()
    }
}

impl fmt::Debug for SuspendNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SuspendNode").finish_non_exhaustive()
    }
}

/// One span of a template literal.
#[derive(Debug, Clone)]
pub struct TemplateSpan {
    pub ty: Node,
    pub literal: String,
}

/// A template literal node.
#[derive(Debug, Clone)]
pub struct TemplateLiteralNode {
    pub head: String,
    pub spans: Vec<TemplateSpan>,
    pub annotations: Annotations,
}

/// A bidirectional codec pairing between two nodes.
#[derive(Debug, Clone)]
pub struct TransformationNode {
    pub from: Node,
    pub to: Node,
    pub kind: TransformationKind,
    pub annotations: Annotations,
}

/// One fixed element of a tuple.
#[derive(Debug, Clone)]
pub struct TupleElement {
    pub ty: Node,
    pub is_optional: bool,
}

/// A tuple node.
#[derive(Debug, Clone)]
pub struct TupleNode {
    pub elements: Vec<TupleElement>,
    pub rest: Vec<Node>,
    pub is_readonly: bool,
    pub annotations: Annotations,
}

/// One named field of a struct.
#[derive(Debug, Clone)]
pub struct FieldSignature {
    pub name: String,
    pub ty: Node,
    pub is_optional: bool,
    pub is_readonly: bool,
    pub annotations: Annotations,
}

/// An index signature of a struct.
#[derive(Debug, Clone)]
pub struct IndexSignature {
    pub parameter: Node,
    pub ty: Node,
    pub is_readonly: bool,
}

/// A structural type with named fields.
#[derive(Debug, Clone)]
pub struct StructNode {
    pub fields: Vec<FieldSignature>,
    pub index_signatures: Vec<IndexSignature>,
    pub annotations: Annotations,
}

/// A union of member nodes.
#[derive(Debug, Clone)]
pub struct UnionNode {
    pub members: Vec<Node>,
    pub annotations: Annotations,
}

/// A schema IR node.
#[derive(Debug, Clone)]
pub enum IrNode {
    Scalar(ScalarNode),
    Literal(LiteralNode),
    Declaration(DeclarationNode),
    Refinement(RefinementNode),
    Suspend(SuspendNode),
    TemplateLiteral(TemplateLiteralNode),
    Transformation(TransformationNode),
    Tuple(TupleNode),
    Struct(StructNode),
    Union(UnionNode),
}

impl IrNode {
    /// The node's kind tag.
    pub fn tag(&self) -> NodeTag {
        match self {
            IrNode::Scalar(_) => NodeTag::Scalar,
            IrNode::Literal(_) => NodeTag::Literal,
            IrNode::Declaration(_) => NodeTag::Declaration,
            IrNode::Refinement(_) => NodeTag::Refinement,
            IrNode::Suspend(_) => NodeTag::Suspend,
            IrNode::TemplateLiteral(_) => NodeTag::TemplateLiteral,
            IrNode::Transformation(_) => NodeTag::Transformation,
            IrNode::Tuple(_) => NodeTag::Tuple,
            IrNode::Struct(_) => NodeTag::Struct,
            IrNode::Union(_) => NodeTag::Union,
        }
    }

    /// The node's annotation map.
    pub fn annotations(&self) -> &Annotations {
        match self {
            IrNode::Scalar(n) => &n.annotations,
            IrNode::Literal(n) => &n.annotations,
            IrNode::Declaration(n) => &n.annotations,
            IrNode::Refinement(n) => &n.annotations,
            IrNode::Suspend(n) => &n.annotations,
            IrNode::TemplateLiteral(n) => &n.annotations,
            IrNode::Transformation(n) => &n.annotations,
            IrNode::Tuple(n) => &n.annotations,
            IrNode::Struct(n) => &n.annotations,
            IrNode::Union(n) => &n.annotations,
        }
    }

    /// The identifier annotation, if any.
    pub fn identifier(&self) -> Option<&str> {
        self.annotations().identifier()
    }

    /// Return a copy of this node with an extra annotation applied.
    pub fn with_annotation(
        &self,
        key: super::annotations::AnnotationKey,
        value: super::annotations::AnnotationValue,
    ) -> IrNode {
        let mut node = self.clone();
        let annotations = match &mut node {
            IrNode::Scalar(n) => &mut n.annotations,
            IrNode::Literal(n) => &mut n.annotations,
            IrNode::Declaration(n) => &mut n.annotations,
            IrNode::Refinement(n) => &mut n.annotations,
            IrNode::Suspend(n) => &mut n.annotations,
            IrNode::TemplateLiteral(n) => &mut n.annotations,
            IrNode::Transformation(n) => &mut n.annotations,
            IrNode::Tuple(n) => &mut n.annotations,
            IrNode::Struct(n) => &mut n.annotations,
            IrNode::Union(n) => &mut n.annotations,
        };
        *annotations = std::mem::take(annotations).with(key, value);
        node
    }
}
