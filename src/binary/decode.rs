//! Avro binary decoder for primitive and complex types.
//!
//! The decoder follows the Avro specification for binary encoding:
//! - Varints use zigzag encoding for signed integers
//! - Floats and doubles are little-endian IEEE 754
//! - Bytes and strings are length-prefixed

use crate::binary::logical::LogicalTypeRegistry;
use crate::binary::value::AvroValue;
use crate::binary::varint;
use crate::error::DecodeError;
use crate::schema::{AvroSchema, NamedTypeIndex};

/// Shared context for schema-driven decoding: resolves named references
/// and applies logical-type codecs to decoded records.
#[derive(Debug, Clone, Copy)]
pub struct DecodeContext<'a> {
    /// Named-type definitions for `Ref` resolution.
    pub index: &'a NamedTypeIndex,
    /// Logical-type codecs applied to freshly decoded records.
    pub logical: &'a LogicalTypeRegistry,
}

impl<'a> DecodeContext<'a> {
    fn resolve(&self, schema: &'a AvroSchema) -> Result<&'a AvroSchema, DecodeError> {
        match schema {
            AvroSchema::Ref(name) => self.index.get(name).ok_or_else(|| {
                DecodeError::InvalidData(format!("unresolved type reference: {}", name))
            }),
            other => Ok(other),
        }
    }
}

/// Decode a null value (no-op, consumes no bytes).
#[inline]
pub fn decode_null(_data: &mut &[u8]) -> Result<(), DecodeError> {
    Ok(())
}

/// Decode a boolean value.
///
/// Avro booleans are encoded as a single byte: 0x00 for false, 0x01 for true.
#[inline]
pub fn decode_boolean(data: &mut &[u8]) -> Result<bool, DecodeError> {
    if data.is_empty() {
        return Err(DecodeError::UnexpectedEof);
    }
    let byte = data[0];
    *data = &data[1..];
    match byte {
        0 => Ok(false),
        1 => Ok(true),
        _ => Err(DecodeError::InvalidData(format!(
            "invalid boolean value: {}, expected 0 or 1",
            byte
        ))),
    }
}

/// Decode a 32-bit signed integer (zigzag varint encoded).
#[inline]
pub fn decode_int(data: &mut &[u8]) -> Result<i32, DecodeError> {
    let long = decode_long(data)?;
    if long < i32::MIN as i64 || long > i32::MAX as i64 {
        return Err(DecodeError::InvalidData(format!(
            "integer overflow: {} does not fit in i32",
            long
        )));
    }
    Ok(long as i32)
}

/// Decode a 64-bit signed integer (zigzag varint encoded).
#[inline]
pub fn decode_long(data: &mut &[u8]) -> Result<i64, DecodeError> {
    varint::decode_zigzag(data)
}

/// Decode a 32-bit IEEE 754 floating-point number (little-endian).
#[inline]
pub fn decode_float(data: &mut &[u8]) -> Result<f32, DecodeError> {
    if data.len() < 4 {
        return Err(DecodeError::UnexpectedEof);
    }
    let bytes: [u8; 4] = [data[0], data[1], data[2], data[3]];
    *data = &data[4..];
    Ok(f32::from_le_bytes(bytes))
}

/// Decode a 64-bit IEEE 754 floating-point number (little-endian).
#[inline]
pub fn decode_double(data: &mut &[u8]) -> Result<f64, DecodeError> {
    if data.len() < 8 {
        return Err(DecodeError::UnexpectedEof);
    }
    let bytes: [u8; 8] = [
        data[0], data[1], data[2], data[3], data[4], data[5], data[6], data[7],
    ];
    *data = &data[8..];
    Ok(f64::from_le_bytes(bytes))
}

/// Decode a byte array (length-prefixed).
#[inline]
pub fn decode_bytes(data: &mut &[u8]) -> Result<Vec<u8>, DecodeError> {
    let len = decode_long(data)?;
    if len < 0 {
        return Err(DecodeError::InvalidData(format!(
            "negative bytes length: {}",
            len
        )));
    }
    let len = len as usize;

    if data.len() < len {
        return Err(DecodeError::UnexpectedEof);
    }

    let bytes = data[..len].to_vec();
    *data = &data[len..];
    Ok(bytes)
}

/// Decode a UTF-8 string (length-prefixed).
#[inline]
pub fn decode_string(data: &mut &[u8]) -> Result<String, DecodeError> {
    let bytes = decode_bytes(data)?;
    String::from_utf8(bytes).map_err(DecodeError::from)
}

/// Decode a fixed-size byte array.
#[inline]
pub fn decode_fixed(data: &mut &[u8], size: usize) -> Result<Vec<u8>, DecodeError> {
    if data.len() < size {
        return Err(DecodeError::UnexpectedEof);
    }
    let bytes = data[..size].to_vec();
    *data = &data[size..];
    Ok(bytes)
}

/// Decode an enum value, returning just the index.
#[inline]
pub fn decode_enum_index(data: &mut &[u8], num_symbols: usize) -> Result<i32, DecodeError> {
    let index = decode_int(data)?;

    if index < 0 || index as usize >= num_symbols {
        return Err(DecodeError::InvalidData(format!(
            "enum index {} out of range (0..{})",
            index, num_symbols
        )));
    }

    Ok(index)
}

/// Decode a union branch index.
#[inline]
pub fn decode_union_index(data: &mut &[u8], num_variants: usize) -> Result<i32, DecodeError> {
    let index = decode_int(data)?;

    if index < 0 || index as usize >= num_variants {
        return Err(DecodeError::InvalidData(format!(
            "union index {} out of range (0..{})",
            index, num_variants
        )));
    }

    Ok(index)
}

/// Decode an array of values.
///
/// Avro arrays are encoded as a series of blocks: a long item count
/// (negative means a byte-size prefix follows), the items, and a zero
/// count terminator.
pub fn decode_array(
    data: &mut &[u8],
    item_schema: &AvroSchema,
    ctx: &DecodeContext<'_>,
) -> Result<Vec<AvroValue>, DecodeError> {
    let mut items = Vec::new();

    loop {
        let count = decode_long(data)?;

        if count == 0 {
            break;
        }

        let item_count = if count < 0 {
            // Negative count means the block has a byte size prefix
            let _byte_size = decode_long(data)?;
            (-count) as usize
        } else {
            count as usize
        };

        items.reserve(item_count);

        for _ in 0..item_count {
            items.push(decode_value(data, item_schema, ctx)?);
        }
    }

    Ok(items)
}

/// Decode a map with string keys. Block structure matches arrays.
pub fn decode_map(
    data: &mut &[u8],
    value_schema: &AvroSchema,
    ctx: &DecodeContext<'_>,
) -> Result<Vec<(String, AvroValue)>, DecodeError> {
    let mut entries = Vec::new();

    loop {
        let count = decode_long(data)?;

        if count == 0 {
            break;
        }

        let entry_count = if count < 0 {
            let _byte_size = decode_long(data)?;
            (-count) as usize
        } else {
            count as usize
        };

        entries.reserve(entry_count);

        for _ in 0..entry_count {
            let key = decode_string(data)?;
            let value = decode_value(data, value_schema, ctx)?;
            entries.push((key, value));
        }
    }

    Ok(entries)
}

/// Decode a value according to a schema.
///
/// Records are decoded field-by-field in schema order and then passed
/// through their logical-type codec if one is registered. Union values
/// are returned unwrapped; enum values surface as their symbol string.
pub fn decode_value(
    data: &mut &[u8],
    schema: &AvroSchema,
    ctx: &DecodeContext<'_>,
) -> Result<AvroValue, DecodeError> {
    match ctx.resolve(schema)? {
        AvroSchema::Null => {
            decode_null(data)?;
            Ok(AvroValue::Null)
        }
        AvroSchema::Boolean => Ok(AvroValue::Boolean(decode_boolean(data)?)),
        AvroSchema::Int => Ok(AvroValue::Int(decode_int(data)?)),
        AvroSchema::Long => Ok(AvroValue::Long(decode_long(data)?)),
        AvroSchema::Float => Ok(AvroValue::Float(decode_float(data)?)),
        AvroSchema::Double => Ok(AvroValue::Double(decode_double(data)?)),
        AvroSchema::Bytes => Ok(AvroValue::Bytes(decode_bytes(data)?)),
        AvroSchema::String => Ok(AvroValue::String(decode_string(data)?)),

        AvroSchema::Record(record) => {
            let mut fields = Vec::with_capacity(record.fields.len());
            for field in &record.fields {
                let value = decode_value(data, &field.schema, ctx)?;
                fields.push((field.name.clone(), value));
            }
            let mut value = AvroValue::Record(fields);
            if let Some(codec) = record
                .logical_type
                .as_deref()
                .and_then(|name| ctx.logical.get(name))
            {
                value = codec.attach(value);
            }
            Ok(value)
        }

        AvroSchema::Enum(e) => {
            let index = decode_enum_index(data, e.symbols.len())?;
            Ok(AvroValue::String(e.symbols[index as usize].clone()))
        }

        AvroSchema::Array(items) => Ok(AvroValue::Array(decode_array(data, items, ctx)?)),
        AvroSchema::Map(values) => Ok(AvroValue::Map(decode_map(data, values, ctx)?)),

        AvroSchema::Union(variants) => {
            let index = decode_union_index(data, variants.len())?;
            decode_value(data, &variants[index as usize], ctx)
        }

        AvroSchema::Fixed(f) => Ok(AvroValue::Fixed(decode_fixed(data, f.size)?)),

        // resolve() already replaced Ref
        AvroSchema::Ref(name) => Err(DecodeError::InvalidData(format!(
            "unresolved type reference: {}",
            name
        ))),
    }
}

/// Skip over a value without materializing it.
///
/// Used by the evolution resolver to pass over writer fields the reader
/// schema does not contain.
pub fn skip_value(
    data: &mut &[u8],
    schema: &AvroSchema,
    ctx: &DecodeContext<'_>,
) -> Result<(), DecodeError> {
    match ctx.resolve(schema)? {
        AvroSchema::Null => Ok(()),
        AvroSchema::Boolean => {
            if data.is_empty() {
                return Err(DecodeError::UnexpectedEof);
            }
            *data = &data[1..];
            Ok(())
        }
        AvroSchema::Int | AvroSchema::Long => varint::skip_varint(data),
        AvroSchema::Float => {
            if data.len() < 4 {
                return Err(DecodeError::UnexpectedEof);
            }
            *data = &data[4..];
            Ok(())
        }
        AvroSchema::Double => {
            if data.len() < 8 {
                return Err(DecodeError::UnexpectedEof);
            }
            *data = &data[8..];
            Ok(())
        }
        AvroSchema::Bytes | AvroSchema::String => {
            let len = decode_long(data)?;
            if len < 0 {
                return Err(DecodeError::InvalidData(format!(
                    "negative length: {}",
                    len
                )));
            }
            if data.len() < len as usize {
                return Err(DecodeError::UnexpectedEof);
            }
            *data = &data[len as usize..];
            Ok(())
        }
        AvroSchema::Record(record) => {
            for field in &record.fields {
                skip_value(data, &field.schema, ctx)?;
            }
            Ok(())
        }
        AvroSchema::Enum(_) => varint::skip_varint(data),
        AvroSchema::Array(items) => {
            loop {
                let count = decode_long(data)?;
                if count == 0 {
                    return Ok(());
                }
                if count < 0 {
                    // Negative count: the byte size lets us skip the block whole
                    let byte_size = decode_long(data)?;
                    if byte_size < 0 || data.len() < byte_size as usize {
                        return Err(DecodeError::UnexpectedEof);
                    }
                    *data = &data[byte_size as usize..];
                } else {
                    for _ in 0..count {
                        skip_value(data, items, ctx)?;
                    }
                }
            }
        }
        AvroSchema::Map(values) => {
            loop {
                let count = decode_long(data)?;
                if count == 0 {
                    return Ok(());
                }
                if count < 0 {
                    let byte_size = decode_long(data)?;
                    if byte_size < 0 || data.len() < byte_size as usize {
                        return Err(DecodeError::UnexpectedEof);
                    }
                    *data = &data[byte_size as usize..];
                } else {
                    for _ in 0..count {
                        let len = decode_long(data)?;
                        if len < 0 || data.len() < len as usize {
                            return Err(DecodeError::UnexpectedEof);
                        }
                        *data = &data[len as usize..];
                        skip_value(data, values, ctx)?;
                    }
                }
            }
        }
        AvroSchema::Union(variants) => {
            let index = decode_union_index(data, variants.len())?;
            skip_value(data, &variants[index as usize], ctx)
        }
        AvroSchema::Fixed(f) => {
            if data.len() < f.size {
                return Err(DecodeError::UnexpectedEof);
            }
            *data = &data[f.size..];
            Ok(())
        }
        AvroSchema::Ref(name) => Err(DecodeError::InvalidData(format!(
            "unresolved type reference: {}",
            name
        ))),
    }
}
