//! Named-type resolution for `Ref` schemas.
//!
//! The compiler memoizes named records and breaks cycles by emitting
//! [`AvroSchema::Ref`] for re-entrant references. Before the binary
//! engine can encode or decode, every `Ref` must resolve to a full
//! definition; the index holds those definitions.

use std::collections::HashMap;

use crate::error::SchemaError;
use crate::schema::AvroSchema;

/// A registry of named types (records, enums, fixed) used to resolve
/// `Ref` schemas during encoding and decoding.
#[derive(Debug, Clone, Default)]
pub struct NamedTypeIndex {
    named_types: HashMap<String, AvroSchema>,
}

impl NamedTypeIndex {
    /// Create a new empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an index from a map of named types.
    pub fn from_named_types(named_types: HashMap<String, AvroSchema>) -> Self {
        Self { named_types }
    }

    /// Register a named type.
    pub fn register(&mut self, name: String, schema: AvroSchema) {
        self.named_types.insert(name, schema);
    }

    /// Get a named type.
    pub fn get(&self, name: &str) -> Option<&AvroSchema> {
        self.named_types.get(name)
    }

    /// Check whether a named type exists.
    pub fn contains(&self, name: &str) -> bool {
        self.named_types.contains_key(name)
    }

    /// Resolve a schema: a `Ref` is replaced by its definition, anything
    /// else is returned as-is.
    pub fn resolve<'a>(&'a self, schema: &'a AvroSchema) -> Result<&'a AvroSchema, SchemaError> {
        match schema {
            AvroSchema::Ref(name) => self
                .get(name)
                .ok_or_else(|| SchemaError::UnresolvedReference(name.clone())),
            other => Ok(other),
        }
    }

    /// Build an index by extracting all named types reachable from a
    /// schema.
    pub fn build_from_schema(schema: &AvroSchema) -> Self {
        let mut index = Self::new();
        index.extract_named_types(schema);
        index
    }

    /// Extract and register all named types from a schema.
    pub fn extract_named_types(&mut self, schema: &AvroSchema) {
        match schema {
            AvroSchema::Record(record) => {
                if self.named_types.contains_key(&record.fullname()) {
                    return;
                }
                self.named_types
                    .insert(record.fullname(), schema.clone());
                for field in &record.fields {
                    self.extract_named_types(&field.schema);
                }
            }
            AvroSchema::Enum(e) => {
                self.named_types.insert(e.fullname(), schema.clone());
            }
            AvroSchema::Fixed(f) => {
                self.named_types.insert(f.name.clone(), schema.clone());
            }
            AvroSchema::Array(items) => self.extract_named_types(items),
            AvroSchema::Map(values) => self.extract_named_types(values),
            AvroSchema::Union(variants) => {
                for variant in variants {
                    self.extract_named_types(variant);
                }
            }
            _ => {}
        }
    }

    /// Verify that every `Ref` reachable from `schema` resolves.
    pub fn validate_refs(&self, schema: &AvroSchema) -> Result<(), SchemaError> {
        self.validate_refs_inner(schema, &mut Vec::new())
    }

    fn validate_refs_inner(
        &self,
        schema: &AvroSchema,
        visiting: &mut Vec<String>,
    ) -> Result<(), SchemaError> {
        match schema {
            AvroSchema::Ref(name) => {
                if visiting.iter().any(|n| n == name) {
                    return Ok(());
                }
                let definition = self
                    .get(name)
                    .ok_or_else(|| SchemaError::UnresolvedReference(name.clone()))?;
                visiting.push(name.clone());
                let result = self.validate_refs_inner(definition, visiting);
                visiting.pop();
                result
            }
            AvroSchema::Record(record) => {
                if visiting.iter().any(|n| *n == record.fullname()) {
                    return Ok(());
                }
                visiting.push(record.fullname());
                for field in &record.fields {
                    self.validate_refs_inner(&field.schema, visiting)?;
                }
                visiting.pop();
                Ok(())
            }
            AvroSchema::Array(items) => self.validate_refs_inner(items, visiting),
            AvroSchema::Map(values) => self.validate_refs_inner(values, visiting),
            AvroSchema::Union(variants) => {
                for variant in variants {
                    self.validate_refs_inner(variant, visiting)?;
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldSchema, RecordSchema};

    #[test]
    fn test_build_from_schema_registers_nested_records() {
        let inner = AvroSchema::Record(RecordSchema::new(
            "Inner",
            vec![FieldSchema::new("x", AvroSchema::Int)],
        ));
        let outer = AvroSchema::Record(RecordSchema::new(
            "Outer",
            vec![FieldSchema::new("inner", inner)],
        ));

        let index = NamedTypeIndex::build_from_schema(&outer);
        assert!(index.contains("Outer"));
        assert!(index.contains("Inner"));
    }

    #[test]
    fn test_validate_refs_detects_missing_definition() {
        let schema = AvroSchema::Record(RecordSchema::new(
            "Node",
            vec![FieldSchema::new("next", AvroSchema::Ref("Missing".into()))],
        ));
        let index = NamedTypeIndex::build_from_schema(&schema);
        assert!(matches!(
            index.validate_refs(&schema),
            Err(SchemaError::UnresolvedReference(name)) if name == "Missing"
        ));
    }

    #[test]
    fn test_validate_refs_accepts_self_reference() {
        let schema = AvroSchema::Record(RecordSchema::new(
            "Node",
            vec![FieldSchema::new(
                "next",
                AvroSchema::Union(vec![AvroSchema::Null, AvroSchema::Ref("Node".into())]),
            )],
        ));
        let index = NamedTypeIndex::build_from_schema(&schema);
        assert!(index.validate_refs(&schema).is_ok());
    }
}
