//! Matching helpers for compiler rules.
//!
//! A matcher is any `Fn(&Node) -> Option<T>`: it decides whether a rule
//! applies and extracts the value its handler consumes. Compound shapes
//! are matched in one predicate via [`match_transformation`] instead of
//! manual nested inspection.

use crate::ir::{
    DeclarationNode, IrNode, LiteralNode, Node, NodeTag, ScalarNode, StructNode, SuspendNode,
    TransformationKind, TransformationNode, UnionNode,
};

/// Match any node whose tag is in `tags`, returning the node itself.
pub fn match_tags(tags: &'static [NodeTag]) -> impl Fn(&Node) -> Option<Node> {
    move |node| tags.contains(&node.tag()).then(|| node.clone())
}

/// Match a scalar node.
pub fn match_scalar(node: &Node) -> Option<ScalarNode> {
    match &**node {
        IrNode::Scalar(s) => Some(s.clone()),
        _ => None,
    }
}

/// Match a literal node.
pub fn match_literal(node: &Node) -> Option<LiteralNode> {
    match &**node {
        IrNode::Literal(l) => Some(l.clone()),
        _ => None,
    }
}

/// Match a declaration node.
pub fn match_declaration(node: &Node) -> Option<DeclarationNode> {
    match &**node {
        IrNode::Declaration(d) => Some(d.clone()),
        _ => None,
    }
}

/// Match a struct node.
pub fn match_struct(node: &Node) -> Option<StructNode> {
    match &**node {
        IrNode::Struct(s) => Some(s.clone()),
        _ => None,
    }
}

/// Match a union node.
pub fn match_union(node: &Node) -> Option<UnionNode> {
    match &**node {
        IrNode::Union(u) => Some(u.clone()),
        _ => None,
    }
}

/// Match a suspend node.
pub fn match_suspend(node: &Node) -> Option<SuspendNode> {
    match &**node {
        IrNode::Suspend(s) => Some(s.clone()),
        _ => None,
    }
}

/// Match a transformation of the given kind, ignoring its structure.
pub fn match_transformation_kind(
    kind: TransformationKind,
) -> impl Fn(&Node) -> Option<TransformationNode> {
    move |node| match &**node {
        IrNode::Transformation(t) if t.kind == kind => Some(t.clone()),
        _ => None,
    }
}

/// Match a transformation of the given kind whose `from` and `to` sides
/// both satisfy the supplied matchers, returning the extracted values
/// alongside the transformation itself.
pub fn match_transformation<F, T>(
    kind: TransformationKind,
    from: impl Fn(&Node) -> Option<F>,
    to: impl Fn(&Node) -> Option<T>,
) -> impl Fn(&Node) -> Option<(TransformationNode, F, T)> {
    move |node| match &**node {
        IrNode::Transformation(t) if t.kind == kind => {
            let from_value = from(&t.from)?;
            let to_value = to(&t.to)?;
            Some((t.clone(), from_value, to_value))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{self};

    #[test]
    fn test_match_tags() {
        let matcher = match_tags(&[NodeTag::Scalar, NodeTag::Literal]);
        assert!(matcher(&ir::string()).is_some());
        assert!(matcher(&ir::literal("a")).is_some());
        assert!(matcher(&ir::union(vec![])).is_none());
    }

    #[test]
    fn test_match_transformation_requires_both_sides() {
        let class = ir::class("User", vec![ir::field("id", ir::int())]);
        let matcher = match_transformation(
            TransformationKind::Identity,
            match_struct,
            match_declaration,
        );
        let (_, from, to) = matcher(&class).expect("class shape should match");
        assert_eq!(from.fields.len(), 1);
        assert_eq!(to.annotations.identifier(), Some("User"));

        // Wrong kind does not match.
        let matcher = match_transformation(
            TransformationKind::Compose,
            match_struct,
            match_declaration,
        );
        assert!(matcher(&class).is_none());
    }
}
