//! Mutable compiler state threaded through a translation run.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use crate::binary::LogicalTypeRegistry;
use crate::schema::AvroSchema;

/// The named-type and logical-type registries of one compile run.
///
/// Named-struct compilation is memoized first-compile-wins; the
/// in-progress set breaks cycles by letting a re-entrant reference
/// resolve to [`AvroSchema::Ref`] while its own body is still being
/// compiled.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    /// Fully compiled named types.
    pub named_types: HashMap<String, AvroSchema>,
    /// Names whose bodies are currently being compiled.
    pub in_progress: HashSet<String>,
    /// Logical-type codecs requested during compilation.
    pub logical_types: LogicalTypeRegistry,
}

/// The name to use for the struct currently being compiled.
#[derive(Debug, Clone)]
pub struct DeclarationContext {
    pub id: String,
}

/// Compiler state: a shared registry plus an optional declaration
/// context.
///
/// The registry is shared by reference across scoped state frames, so
/// types and codecs registered inside a scope outlive it. The
/// declaration context is plain data: a pushed frame's context is
/// dropped exactly when the frame is restored.
#[derive(Debug, Clone)]
pub struct CompilerState {
    pub registry: Rc<RefCell<TypeRegistry>>,
    pub declaration: Option<DeclarationContext>,
}

impl Default for CompilerState {
    fn default() -> Self {
        Self::new()
    }
}

impl CompilerState {
    /// Fresh state with an empty registry and no declaration context.
    pub fn new() -> Self {
        Self {
            registry: Rc::new(RefCell::new(TypeRegistry::default())),
            declaration: None,
        }
    }

    /// The same registry, with the declaration context set.
    pub fn with_declaration(&self, id: impl Into<String>) -> Self {
        Self {
            registry: Rc::clone(&self.registry),
            declaration: Some(DeclarationContext { id: id.into() }),
        }
    }

    /// The same registry, with the declaration context cleared.
    pub fn without_declaration(&self) -> Self {
        Self {
            registry: Rc::clone(&self.registry),
            declaration: None,
        }
    }

    /// The active declaration name, if any.
    pub fn declared_id(&self) -> Option<String> {
        self.declaration.as_ref().map(|d| d.id.clone())
    }
}
