//! Avro binary encoder for primitive and complex types.
//!
//! Mirror image of [`crate::binary::decode`]: values are written against
//! a schema, with logical-type codecs applied to records before their
//! fields are encoded and union branches selected by a conformance test.

use crate::binary::logical::LogicalTypeRegistry;
use crate::binary::value::AvroValue;
use crate::binary::varint;
use crate::error::EncodeError;
use crate::ir::TAG_FIELD;
use crate::schema::{AvroSchema, NamedTypeIndex};

/// Shared context for schema-driven encoding.
#[derive(Debug, Clone, Copy)]
pub struct EncodeContext<'a> {
    /// Named-type definitions for `Ref` resolution.
    pub index: &'a NamedTypeIndex,
    /// Logical-type codecs applied to records before encoding.
    pub logical: &'a LogicalTypeRegistry,
}

impl<'a> EncodeContext<'a> {
    fn resolve(&self, schema: &'a AvroSchema) -> Result<&'a AvroSchema, EncodeError> {
        match schema {
            AvroSchema::Ref(name) => self
                .index
                .get(name)
                .ok_or_else(|| EncodeError::UnresolvedReference(name.clone())),
            other => Ok(other),
        }
    }
}

/// Encode a boolean as a single byte.
#[inline]
pub fn encode_boolean(buf: &mut Vec<u8>, value: bool) {
    buf.push(value as u8);
}

/// Encode a long as a zigzag varint.
#[inline]
pub fn encode_long(buf: &mut Vec<u8>, value: i64) {
    varint::encode_zigzag(buf, value);
}

/// Encode a float as little-endian IEEE 754.
#[inline]
pub fn encode_float(buf: &mut Vec<u8>, value: f32) {
    buf.extend_from_slice(&value.to_le_bytes());
}

/// Encode a double as little-endian IEEE 754.
#[inline]
pub fn encode_double(buf: &mut Vec<u8>, value: f64) {
    buf.extend_from_slice(&value.to_le_bytes());
}

/// Encode a byte array (length-prefixed).
#[inline]
pub fn encode_bytes(buf: &mut Vec<u8>, value: &[u8]) {
    encode_long(buf, value.len() as i64);
    buf.extend_from_slice(value);
}

/// Encode a UTF-8 string (length-prefixed).
#[inline]
pub fn encode_string(buf: &mut Vec<u8>, value: &str) {
    encode_bytes(buf, value.as_bytes());
}

fn type_mismatch(schema: &AvroSchema, value: &AvroValue) -> EncodeError {
    EncodeError::TypeMismatch(format!("cannot encode {:?} as {:?}", value, schema))
}

/// Encode a value according to a schema, appending to `buf`.
///
/// Records pass through their logical-type codec first (stripping the
/// discriminant field), then encode fields in schema order; value fields
/// the schema does not name are ignored. Narrower integer values are
/// accepted where the schema is wider (`int` values encode fine as
/// `long` or `double`).
pub fn encode_value(
    buf: &mut Vec<u8>,
    schema: &AvroSchema,
    value: &AvroValue,
    ctx: &EncodeContext<'_>,
) -> Result<(), EncodeError> {
    match ctx.resolve(schema)? {
        AvroSchema::Null => match value {
            AvroValue::Null => Ok(()),
            _ => Err(type_mismatch(schema, value)),
        },
        AvroSchema::Boolean => match value {
            AvroValue::Boolean(b) => {
                encode_boolean(buf, *b);
                Ok(())
            }
            _ => Err(type_mismatch(schema, value)),
        },
        AvroSchema::Int => match value {
            AvroValue::Int(v) => {
                encode_long(buf, *v as i64);
                Ok(())
            }
            _ => Err(type_mismatch(schema, value)),
        },
        AvroSchema::Long => match value {
            AvroValue::Long(v) => {
                encode_long(buf, *v);
                Ok(())
            }
            AvroValue::Int(v) => {
                encode_long(buf, *v as i64);
                Ok(())
            }
            _ => Err(type_mismatch(schema, value)),
        },
        AvroSchema::Float => match value {
            AvroValue::Float(v) => {
                encode_float(buf, *v);
                Ok(())
            }
            AvroValue::Int(v) => {
                encode_float(buf, *v as f32);
                Ok(())
            }
            _ => Err(type_mismatch(schema, value)),
        },
        AvroSchema::Double => match value {
            AvroValue::Double(v) => {
                encode_double(buf, *v);
                Ok(())
            }
            AvroValue::Float(v) => {
                encode_double(buf, *v as f64);
                Ok(())
            }
            AvroValue::Int(v) => {
                encode_double(buf, *v as f64);
                Ok(())
            }
            AvroValue::Long(v) => {
                encode_double(buf, *v as f64);
                Ok(())
            }
            _ => Err(type_mismatch(schema, value)),
        },
        AvroSchema::Bytes => match value {
            AvroValue::Bytes(b) => {
                encode_bytes(buf, b);
                Ok(())
            }
            _ => Err(type_mismatch(schema, value)),
        },
        AvroSchema::String => match value {
            AvroValue::String(s) => {
                encode_string(buf, s);
                Ok(())
            }
            _ => Err(type_mismatch(schema, value)),
        },

        AvroSchema::Record(record) => {
            let stripped = match record
                .logical_type
                .as_deref()
                .and_then(|name| ctx.logical.get(name))
            {
                Some(codec) => codec.strip(value.clone()),
                None => value.clone(),
            };
            let fields = stripped
                .as_record()
                .ok_or_else(|| type_mismatch(schema, value))?;

            for field_schema in &record.fields {
                let field_value = fields
                    .iter()
                    .find(|(name, _)| *name == field_schema.name)
                    .map(|(_, v)| v)
                    .ok_or_else(|| EncodeError::MissingField(field_schema.name.clone()))?;
                encode_value(buf, &field_schema.schema, field_value, ctx)?;
            }
            Ok(())
        }

        AvroSchema::Enum(e) => match value {
            AvroValue::String(symbol) => {
                let index = e
                    .symbol_index(symbol)
                    .ok_or_else(|| EncodeError::UnknownEnumSymbol(symbol.clone()))?;
                encode_long(buf, index as i64);
                Ok(())
            }
            _ => Err(type_mismatch(schema, value)),
        },

        AvroSchema::Array(items) => match value {
            AvroValue::Array(elements) => {
                if !elements.is_empty() {
                    encode_long(buf, elements.len() as i64);
                    for element in elements {
                        encode_value(buf, items, element, ctx)?;
                    }
                }
                encode_long(buf, 0);
                Ok(())
            }
            _ => Err(type_mismatch(schema, value)),
        },

        AvroSchema::Map(values) => match value {
            AvroValue::Map(entries) => {
                if !entries.is_empty() {
                    encode_long(buf, entries.len() as i64);
                    for (key, entry) in entries {
                        encode_string(buf, key);
                        encode_value(buf, values, entry, ctx)?;
                    }
                }
                encode_long(buf, 0);
                Ok(())
            }
            _ => Err(type_mismatch(schema, value)),
        },

        AvroSchema::Union(variants) => {
            let index = variants
                .iter()
                .position(|variant| schema_accepts(variant, value, ctx))
                .ok_or_else(|| {
                    EncodeError::NoMatchingUnionVariant(format!("{:?}", value))
                })?;
            encode_long(buf, index as i64);
            encode_value(buf, &variants[index], value, ctx)
        }

        AvroSchema::Fixed(f) => match value {
            AvroValue::Fixed(b) | AvroValue::Bytes(b) if b.len() == f.size => {
                buf.extend_from_slice(b);
                Ok(())
            }
            _ => Err(type_mismatch(schema, value)),
        },

        // resolve() already replaced Ref
        AvroSchema::Ref(name) => Err(EncodeError::UnresolvedReference(name.clone())),
    }
}

/// Shallow conformance test used to pick a union branch for a value.
///
/// Records match primarily by discriminant: a value carrying a `_tag`
/// field matches the record whose name equals the tag. Untagged record
/// values match when every schema field is present in the value.
pub fn schema_accepts(schema: &AvroSchema, value: &AvroValue, ctx: &EncodeContext<'_>) -> bool {
    let schema = match ctx.resolve(schema) {
        Ok(schema) => schema,
        Err(_) => return false,
    };

    match (schema, value) {
        (AvroSchema::Null, AvroValue::Null) => true,
        (AvroSchema::Boolean, AvroValue::Boolean(_)) => true,
        (AvroSchema::Int, AvroValue::Int(_)) => true,
        (AvroSchema::Long, AvroValue::Long(_) | AvroValue::Int(_)) => true,
        (AvroSchema::Float, AvroValue::Float(_) | AvroValue::Int(_)) => true,
        (
            AvroSchema::Double,
            AvroValue::Double(_) | AvroValue::Float(_) | AvroValue::Int(_) | AvroValue::Long(_),
        ) => true,
        (AvroSchema::Bytes, AvroValue::Bytes(_)) => true,
        (AvroSchema::String, AvroValue::String(_)) => true,
        (AvroSchema::Record(record), AvroValue::Record(fields)) => {
            if let Some(AvroValue::String(tag)) = value.field(TAG_FIELD) {
                return *tag == record.name;
            }
            record.fields.iter().all(|field_schema| {
                fields.iter().any(|(name, _)| *name == field_schema.name)
            })
        }
        (AvroSchema::Enum(e), AvroValue::String(symbol)) => e.symbol_index(symbol).is_some(),
        (AvroSchema::Array(_), AvroValue::Array(_)) => true,
        (AvroSchema::Map(_), AvroValue::Map(_)) => true,
        (AvroSchema::Union(variants), _) => variants
            .iter()
            .any(|variant| schema_accepts(variant, value, ctx)),
        (AvroSchema::Fixed(f), AvroValue::Fixed(b) | AvroValue::Bytes(b)) => b.len() == f.size,
        _ => false,
    }
}
