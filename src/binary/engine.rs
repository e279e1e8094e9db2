//! The executable Avro type: schema + named-type index + logical codecs.
//!
//! [`AvroType`] is the unit the rest of the crate programs against:
//! given a schema definition and a logical-type registry it exposes
//! `to_buffer`, `from_buffer`, and `create_resolver`.

use std::collections::HashMap;

use tracing::debug;

use crate::binary::decode::{decode_value, DecodeContext};
use crate::binary::encode::{encode_value, EncodeContext};
use crate::binary::logical::LogicalTypeRegistry;
use crate::binary::resolver::Resolver;
use crate::binary::value::AvroValue;
use crate::error::{DecodeError, EncodeError, SchemaError};
use crate::schema::{AvroSchema, NamedTypeIndex};

/// An executable Avro type.
#[derive(Debug, Clone)]
pub struct AvroType {
    schema: AvroSchema,
    index: NamedTypeIndex,
    logical: LogicalTypeRegistry,
}

impl AvroType {
    /// Build an executable type from a schema definition.
    ///
    /// Named types reachable from the schema are indexed and every
    /// `Ref` is checked to resolve.
    pub fn for_schema(
        schema: AvroSchema,
        logical: LogicalTypeRegistry,
    ) -> Result<Self, SchemaError> {
        Self::for_schema_with_types(schema, &HashMap::new(), logical)
    }

    /// Build an executable type, seeding the named-type index with
    /// definitions from an external registry (the compiler's named-type
    /// registry, when a compile run produced this schema).
    pub fn for_schema_with_types(
        schema: AvroSchema,
        named_types: &HashMap<String, AvroSchema>,
        logical: LogicalTypeRegistry,
    ) -> Result<Self, SchemaError> {
        let mut index = NamedTypeIndex::from_named_types(named_types.clone());
        index.extract_named_types(&schema);
        index.validate_refs(&schema)?;
        debug!(schema = %schema.to_json(), "built avro type");
        Ok(Self {
            schema,
            index,
            logical,
        })
    }

    /// The schema definition.
    pub fn schema(&self) -> &AvroSchema {
        &self.schema
    }

    /// The schema definition as Avro JSON.
    pub fn json_schema(&self) -> serde_json::Value {
        self.schema.to_json_value()
    }

    /// The named-type index backing `Ref` resolution.
    pub fn named_types(&self) -> &NamedTypeIndex {
        &self.index
    }

    /// The logical-type registry this type applies on encode/decode.
    pub fn logical_types(&self) -> &LogicalTypeRegistry {
        &self.logical
    }

    /// Encode a value to Avro binary.
    pub fn to_buffer(&self, value: &AvroValue) -> Result<Vec<u8>, EncodeError> {
        let ctx = EncodeContext {
            index: &self.index,
            logical: &self.logical,
        };
        let mut buf = Vec::new();
        encode_value(&mut buf, &self.schema, value, &ctx)?;
        Ok(buf)
    }

    /// Decode Avro binary to a value. Trailing bytes are an error.
    pub fn from_buffer(&self, bytes: &[u8]) -> Result<AvroValue, DecodeError> {
        let ctx = DecodeContext {
            index: &self.index,
            logical: &self.logical,
        };
        let mut cursor = bytes;
        let value = decode_value(&mut cursor, &self.schema, &ctx)?;
        if !cursor.is_empty() {
            return Err(DecodeError::TrailingBytes(cursor.len()));
        }
        Ok(value)
    }

    /// Decode bytes written under `resolver`'s writer schema into this
    /// type's shape. With `no_check` set, trailing bytes are ignored.
    pub fn from_buffer_resolved(
        &self,
        bytes: &[u8],
        resolver: &Resolver,
        no_check: bool,
    ) -> Result<AvroValue, DecodeError> {
        resolver.read(bytes, no_check)
    }

    /// Build a resolver that reads bytes written by `writer` into this
    /// type's shape.
    pub fn create_resolver(&self, writer: &AvroType) -> Result<Resolver, SchemaError> {
        Resolver::new(
            self.schema.clone(),
            self.index.clone(),
            self.logical.clone(),
            writer.schema.clone(),
            writer.index.clone(),
        )
    }
}
