//! Annotation maps attached to schema IR nodes.
//!
//! Every node carries a key→value map used for identifiers, titles, and
//! numeric sub-kind hints. The compiler only ever reads annotations; it
//! never writes them back into the tree.

use std::collections::HashMap;

/// Keys an annotation map can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnnotationKey {
    /// The name a declaration, struct, or union compiles under.
    Identifier,
    /// Human-readable title, not used for naming.
    Title,
    /// Numeric sub-kind hint for `Scalar(Number)` nodes.
    NumberKind,
}

/// Numeric sub-kind hints, resolved in a fixed priority order by the
/// scalar rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberHint {
    /// 32-bit signed integer
    Int,
    /// 32-bit IEEE 754 floating-point
    Float,
    /// 64-bit signed integer
    Long,
}

/// Values an annotation map can hold.
#[derive(Debug, Clone, PartialEq)]
pub enum AnnotationValue {
    /// Free-form text (identifiers, titles)
    Text(String),
    /// Numeric sub-kind hint
    Number(NumberHint),
}

/// An immutable key→value annotation map.
#[derive(Debug, Clone, Default)]
pub struct Annotations {
    entries: HashMap<AnnotationKey, AnnotationValue>,
}

impl Annotations {
    /// Create an empty annotation map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insertion.
    pub fn with(mut self, key: AnnotationKey, value: AnnotationValue) -> Self {
        self.entries.insert(key, value);
        self
    }

    /// Builder-style identifier annotation.
    pub fn with_identifier(self, id: impl Into<String>) -> Self {
        self.with(AnnotationKey::Identifier, AnnotationValue::Text(id.into()))
    }

    /// Look up an annotation by key.
    pub fn get(&self, key: AnnotationKey) -> Option<&AnnotationValue> {
        self.entries.get(&key)
    }

    /// The identifier annotation, if present and textual.
    pub fn identifier(&self) -> Option<&str> {
        match self.get(AnnotationKey::Identifier) {
            Some(AnnotationValue::Text(s)) => Some(s),
            _ => None,
        }
    }

    /// The numeric sub-kind hint, if present.
    pub fn number_hint(&self) -> Option<NumberHint> {
        match self.get(AnnotationKey::NumberKind) {
            Some(AnnotationValue::Number(h)) => Some(*h),
            _ => None,
        }
    }
}
