//! Reader/writer schema resolution.
//!
//! A [`Resolver`] decodes bytes written under one schema (the writer)
//! into a value shaped by a compatible but different schema (the
//! reader), per the Avro resolution rules:
//! - fields present in both schemas decode with optional type promotion
//! - writer-only fields are skipped
//! - reader-only fields are filled from their defaults
//! - enum symbols are re-mapped, union branches re-resolved
//!
//! Compatibility is validated at construction; the remaining errors a
//! `read` can produce are data errors.

use std::collections::HashSet;

use serde_json::Value;

use crate::binary::decode::{self, DecodeContext};
use crate::binary::logical::LogicalTypeRegistry;
use crate::binary::value::AvroValue;
use crate::error::{DecodeError, SchemaError};
use crate::schema::{AvroSchema, NamedTypeIndex, RecordSchema};

/// Type promotions supported by Avro schema resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypePromotion {
    /// int → long
    IntToLong,
    /// int → float
    IntToFloat,
    /// int → double
    IntToDouble,
    /// long → float
    LongToFloat,
    /// long → double
    LongToDouble,
    /// float → double
    FloatToDouble,
    /// string → bytes
    StringToBytes,
    /// bytes → string
    BytesToString,
}

impl TypePromotion {
    /// Determine the promotion needed between primitive writer and
    /// reader types. `Ok(None)` means the types are identical;
    /// an error means they are incompatible.
    pub fn from_schemas(
        writer: &AvroSchema,
        reader: &AvroSchema,
    ) -> Result<Option<Self>, SchemaError> {
        match (writer, reader) {
            (AvroSchema::Null, AvroSchema::Null)
            | (AvroSchema::Boolean, AvroSchema::Boolean)
            | (AvroSchema::Int, AvroSchema::Int)
            | (AvroSchema::Long, AvroSchema::Long)
            | (AvroSchema::Float, AvroSchema::Float)
            | (AvroSchema::Double, AvroSchema::Double)
            | (AvroSchema::Bytes, AvroSchema::Bytes)
            | (AvroSchema::String, AvroSchema::String) => Ok(None),

            (AvroSchema::Int, AvroSchema::Long) => Ok(Some(TypePromotion::IntToLong)),
            (AvroSchema::Int, AvroSchema::Float) => Ok(Some(TypePromotion::IntToFloat)),
            (AvroSchema::Int, AvroSchema::Double) => Ok(Some(TypePromotion::IntToDouble)),
            (AvroSchema::Long, AvroSchema::Float) => Ok(Some(TypePromotion::LongToFloat)),
            (AvroSchema::Long, AvroSchema::Double) => Ok(Some(TypePromotion::LongToDouble)),
            (AvroSchema::Float, AvroSchema::Double) => Ok(Some(TypePromotion::FloatToDouble)),
            (AvroSchema::String, AvroSchema::Bytes) => Ok(Some(TypePromotion::StringToBytes)),
            (AvroSchema::Bytes, AvroSchema::String) => Ok(Some(TypePromotion::BytesToString)),

            (writer, reader) => Err(SchemaError::IncompatibleSchemas(format!(
                "cannot resolve writer {:?} against reader {:?}",
                writer, reader
            ))),
        }
    }
}

/// Apply a type promotion to a decoded value.
pub fn apply_promotion(
    value: AvroValue,
    promotion: TypePromotion,
) -> Result<AvroValue, DecodeError> {
    match (value, promotion) {
        (AvroValue::Int(v), TypePromotion::IntToLong) => Ok(AvroValue::Long(v as i64)),
        (AvroValue::Int(v), TypePromotion::IntToFloat) => Ok(AvroValue::Float(v as f32)),
        (AvroValue::Int(v), TypePromotion::IntToDouble) => Ok(AvroValue::Double(v as f64)),
        (AvroValue::Long(v), TypePromotion::LongToFloat) => Ok(AvroValue::Float(v as f32)),
        (AvroValue::Long(v), TypePromotion::LongToDouble) => Ok(AvroValue::Double(v as f64)),
        (AvroValue::Float(v), TypePromotion::FloatToDouble) => Ok(AvroValue::Double(v as f64)),
        (AvroValue::String(s), TypePromotion::StringToBytes) => {
            Ok(AvroValue::Bytes(s.into_bytes()))
        }
        (AvroValue::Bytes(b), TypePromotion::BytesToString) => {
            let s = String::from_utf8(b).map_err(|e| {
                DecodeError::InvalidData(format!("cannot convert bytes to string: {}", e))
            })?;
            Ok(AvroValue::String(s))
        }
        (value, promotion) => Err(DecodeError::TypeMismatch(format!(
            "cannot apply {:?} promotion to {:?}",
            promotion, value
        ))),
    }
}

/// Convert a JSON default value to an AvroValue.
///
/// Used when a reader field has a default and the writer did not record
/// the field.
pub fn json_to_avro_value(json: &Value, schema: &AvroSchema) -> Result<AvroValue, DecodeError> {
    match (json, schema) {
        (Value::Null, AvroSchema::Null) => Ok(AvroValue::Null),
        (Value::Bool(b), AvroSchema::Boolean) => Ok(AvroValue::Boolean(*b)),
        (Value::Number(n), AvroSchema::Int) => {
            let v = n
                .as_i64()
                .ok_or_else(|| DecodeError::InvalidData(format!("cannot convert {} to int", n)))?;
            if v < i32::MIN as i64 || v > i32::MAX as i64 {
                return Err(DecodeError::InvalidData(format!(
                    "value {} out of range for int",
                    v
                )));
            }
            Ok(AvroValue::Int(v as i32))
        }
        (Value::Number(n), AvroSchema::Long) => {
            let v = n
                .as_i64()
                .ok_or_else(|| DecodeError::InvalidData(format!("cannot convert {} to long", n)))?;
            Ok(AvroValue::Long(v))
        }
        (Value::Number(n), AvroSchema::Float) => {
            let v = n.as_f64().ok_or_else(|| {
                DecodeError::InvalidData(format!("cannot convert {} to float", n))
            })?;
            Ok(AvroValue::Float(v as f32))
        }
        (Value::Number(n), AvroSchema::Double) => {
            let v = n.as_f64().ok_or_else(|| {
                DecodeError::InvalidData(format!("cannot convert {} to double", n))
            })?;
            Ok(AvroValue::Double(v))
        }
        (Value::String(s), AvroSchema::String) => Ok(AvroValue::String(s.clone())),
        // Avro encodes bytes defaults as ISO-8859-1 strings in JSON
        (Value::String(s), AvroSchema::Bytes) => Ok(AvroValue::Bytes(s.bytes().collect())),
        (Value::String(s), AvroSchema::Enum(e)) => {
            if e.symbol_index(s).is_none() {
                return Err(DecodeError::InvalidData(format!(
                    "default symbol {} not in enum {}",
                    s, e.name
                )));
            }
            Ok(AvroValue::String(s.clone()))
        }
        // For unions, the default applies to the first variant
        (json, AvroSchema::Union(variants)) => match variants.first() {
            Some(first) => json_to_avro_value(json, first),
            None => Err(DecodeError::InvalidData("empty union".to_string())),
        },
        (json, schema) => Err(DecodeError::InvalidData(format!(
            "cannot use default {} for schema {:?}",
            json, schema
        ))),
    }
}

/// A compiled reader/writer resolution.
///
/// Holds both schemas plus the named-type indexes needed to chase
/// references on either side, and the reader's logical-type registry so
/// decoded records pass through their codecs.
#[derive(Debug, Clone)]
pub struct Resolver {
    reader: AvroSchema,
    writer: AvroSchema,
    reader_index: NamedTypeIndex,
    writer_index: NamedTypeIndex,
    reader_logical: LogicalTypeRegistry,
}

impl Resolver {
    /// Build a resolver, validating that writer-shaped data can be
    /// resolved into the reader shape.
    pub fn new(
        reader: AvroSchema,
        reader_index: NamedTypeIndex,
        reader_logical: LogicalTypeRegistry,
        writer: AvroSchema,
        writer_index: NamedTypeIndex,
    ) -> Result<Self, SchemaError> {
        let resolver = Self {
            reader,
            writer,
            reader_index,
            writer_index,
            reader_logical,
        };
        resolver.check_compatible(&resolver.writer, &resolver.reader, &mut HashSet::new())?;
        Ok(resolver)
    }

    /// Decode writer-shaped bytes into a reader-shaped value.
    ///
    /// With `no_check` set, trailing bytes after the value are ignored
    /// (the non-strict decode the evolution path uses).
    pub fn read(&self, bytes: &[u8], no_check: bool) -> Result<AvroValue, DecodeError> {
        let mut cursor = bytes;
        let value = self.resolve_value(&mut cursor, &self.writer, &self.reader)?;
        if !no_check && !cursor.is_empty() {
            return Err(DecodeError::TrailingBytes(cursor.len()));
        }
        Ok(value)
    }

    fn resolve_writer<'a>(&'a self, schema: &'a AvroSchema) -> Result<&'a AvroSchema, SchemaError> {
        self.writer_index.resolve(schema)
    }

    fn resolve_reader<'a>(&'a self, schema: &'a AvroSchema) -> Result<&'a AvroSchema, SchemaError> {
        self.reader_index.resolve(schema)
    }

    fn check_compatible(
        &self,
        writer: &AvroSchema,
        reader: &AvroSchema,
        visiting: &mut HashSet<(String, String)>,
    ) -> Result<(), SchemaError> {
        let writer = self.resolve_writer(writer)?;
        let reader = self.resolve_reader(reader)?;

        match (writer, reader) {
            (AvroSchema::Record(w), AvroSchema::Record(r)) => {
                let pair = (w.fullname(), r.fullname());
                if !visiting.insert(pair) {
                    return Ok(());
                }
                for reader_field in &r.fields {
                    match w.fields.iter().find(|f| f.name == reader_field.name) {
                        Some(writer_field) => self.check_compatible(
                            &writer_field.schema,
                            &reader_field.schema,
                            visiting,
                        )?,
                        None => {
                            if reader_field.default.is_none() {
                                return Err(SchemaError::IncompatibleSchemas(format!(
                                    "reader field '{}' not in writer schema and has no default",
                                    reader_field.name
                                )));
                            }
                        }
                    }
                }
                Ok(())
            }
            (AvroSchema::Enum(_), AvroSchema::Enum(_)) => Ok(()),
            (AvroSchema::Array(w), AvroSchema::Array(r)) => self.check_compatible(w, r, visiting),
            (AvroSchema::Map(w), AvroSchema::Map(r)) => self.check_compatible(w, r, visiting),
            (AvroSchema::Fixed(w), AvroSchema::Fixed(r)) => {
                if w.size == r.size {
                    Ok(())
                } else {
                    Err(SchemaError::IncompatibleSchemas(format!(
                        "fixed size mismatch: writer {} vs reader {}",
                        w.size, r.size
                    )))
                }
            }
            (AvroSchema::Union(variants), reader) => {
                // Every writer branch must resolve against the reader
                for variant in variants {
                    self.check_compatible(variant, reader, visiting)?;
                }
                Ok(())
            }
            (writer, AvroSchema::Union(variants)) => {
                if variants
                    .iter()
                    .any(|variant| self.check_compatible(writer, variant, &mut visiting.clone()).is_ok())
                {
                    Ok(())
                } else {
                    Err(SchemaError::IncompatibleSchemas(format!(
                        "no reader union variant accepts writer {:?}",
                        writer
                    )))
                }
            }
            (writer, reader) => TypePromotion::from_schemas(writer, reader).map(|_| ()),
        }
    }

    fn resolve_value(
        &self,
        data: &mut &[u8],
        writer: &AvroSchema,
        reader: &AvroSchema,
    ) -> Result<AvroValue, DecodeError> {
        let writer = self
            .resolve_writer(writer)
            .map_err(|e| DecodeError::InvalidData(e.to_string()))?;
        let reader = self
            .resolve_reader(reader)
            .map_err(|e| DecodeError::InvalidData(e.to_string()))?;

        match (writer, reader) {
            (AvroSchema::Record(w), AvroSchema::Record(r)) => {
                self.resolve_record(data, w, r)
            }
            (AvroSchema::Enum(w), AvroSchema::Enum(r)) => {
                let index = decode::decode_enum_index(data, w.symbols.len())?;
                let symbol = &w.symbols[index as usize];
                if r.symbol_index(symbol).is_none() {
                    return Err(DecodeError::InvalidData(format!(
                        "writer symbol {} not in reader enum {}",
                        symbol, r.name
                    )));
                }
                Ok(AvroValue::String(symbol.clone()))
            }
            (AvroSchema::Array(w), AvroSchema::Array(r)) => {
                let mut items = Vec::new();
                loop {
                    let count = decode::decode_long(data)?;
                    if count == 0 {
                        break;
                    }
                    let item_count = if count < 0 {
                        let _byte_size = decode::decode_long(data)?;
                        (-count) as usize
                    } else {
                        count as usize
                    };
                    items.reserve(item_count);
                    for _ in 0..item_count {
                        items.push(self.resolve_value(data, w, r)?);
                    }
                }
                Ok(AvroValue::Array(items))
            }
            (AvroSchema::Map(w), AvroSchema::Map(r)) => {
                let mut entries = Vec::new();
                loop {
                    let count = decode::decode_long(data)?;
                    if count == 0 {
                        break;
                    }
                    let entry_count = if count < 0 {
                        let _byte_size = decode::decode_long(data)?;
                        (-count) as usize
                    } else {
                        count as usize
                    };
                    entries.reserve(entry_count);
                    for _ in 0..entry_count {
                        let key = decode::decode_string(data)?;
                        entries.push((key, self.resolve_value(data, w, r)?));
                    }
                }
                Ok(AvroValue::Map(entries))
            }
            (AvroSchema::Fixed(w), AvroSchema::Fixed(r)) => {
                if w.size != r.size {
                    return Err(DecodeError::TypeMismatch(format!(
                        "fixed size mismatch: writer {} vs reader {}",
                        w.size, r.size
                    )));
                }
                Ok(AvroValue::Fixed(decode::decode_fixed(data, w.size)?))
            }
            (AvroSchema::Union(variants), reader) => {
                let index = decode::decode_union_index(data, variants.len())?;
                self.resolve_value(data, &variants[index as usize], reader)
            }
            (writer, AvroSchema::Union(variants)) => {
                let matching = variants
                    .iter()
                    .find(|variant| {
                        self.check_compatible(writer, variant, &mut HashSet::new()).is_ok()
                    })
                    .ok_or_else(|| {
                        DecodeError::TypeMismatch(format!(
                            "no reader union variant accepts writer {:?}",
                            writer
                        ))
                    })?;
                self.resolve_value(data, writer, matching)
            }
            (writer, reader) => {
                // Primitive (or fixed) position: decode as written, then
                // promote into the reader type.
                let writer_ctx = DecodeContext {
                    index: &self.writer_index,
                    logical: &self.reader_logical,
                };
                let value = decode::decode_value(data, writer, &writer_ctx)?;
                match TypePromotion::from_schemas(writer, reader)
                    .map_err(|e| DecodeError::TypeMismatch(e.to_string()))?
                {
                    Some(promotion) => apply_promotion(value, promotion),
                    None => Ok(value),
                }
            }
        }
    }

    /// Decode one record, skipping writer-only fields, promoting shared
    /// fields, and materializing reader-only defaults, then pass the
    /// result through the reader's logical-type codec.
    fn resolve_record(
        &self,
        data: &mut &[u8],
        writer: &RecordSchema,
        reader: &RecordSchema,
    ) -> Result<AvroValue, DecodeError> {
        let writer_ctx = DecodeContext {
            index: &self.writer_index,
            logical: &self.reader_logical,
        };

        // Decode all writer fields in writer order, keeping the ones the
        // reader wants.
        let mut writer_values: Vec<Option<AvroValue>> = vec![None; writer.fields.len()];
        for (idx, field) in writer.fields.iter().enumerate() {
            match reader.fields.iter().find(|r| r.name == field.name) {
                Some(reader_field) => {
                    writer_values[idx] =
                        Some(self.resolve_value(data, &field.schema, &reader_field.schema)?);
                }
                None => decode::skip_value(data, &field.schema, &writer_ctx)?,
            }
        }

        // Assemble in reader field order.
        let mut fields = Vec::with_capacity(reader.fields.len());
        for reader_field in &reader.fields {
            let value = match writer
                .fields
                .iter()
                .position(|w| w.name == reader_field.name)
            {
                Some(writer_idx) => writer_values[writer_idx].take().ok_or_else(|| {
                    DecodeError::InvalidData(format!(
                        "writer field {} was not decoded",
                        reader_field.name
                    ))
                })?,
                None => match &reader_field.default {
                    Some(default) => json_to_avro_value(default, &reader_field.schema)?,
                    None => {
                        return Err(DecodeError::InvalidData(format!(
                            "reader field '{}' not in writer schema and has no default",
                            reader_field.name
                        )))
                    }
                },
            };
            fields.push((reader_field.name.clone(), value));
        }

        let mut value = AvroValue::Record(fields);
        if let Some(codec) = reader
            .logical_type
            .as_deref()
            .and_then(|name| self.reader_logical.get(name))
        {
            value = codec.attach(value);
        }
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binary::encode::{encode_value, EncodeContext};
    use crate::schema::FieldSchema;
    use serde_json::json;

    fn plain_resolver(reader: AvroSchema, writer: AvroSchema) -> Result<Resolver, SchemaError> {
        Resolver::new(
            reader.clone(),
            NamedTypeIndex::build_from_schema(&reader),
            LogicalTypeRegistry::new(),
            writer.clone(),
            NamedTypeIndex::build_from_schema(&writer),
        )
    }

    fn encode_record(schema: &AvroSchema, value: &AvroValue) -> Vec<u8> {
        let index = NamedTypeIndex::build_from_schema(schema);
        let logical = LogicalTypeRegistry::new();
        let ctx = EncodeContext {
            index: &index,
            logical: &logical,
        };
        let mut buf = Vec::new();
        encode_value(&mut buf, schema, value, &ctx).unwrap();
        buf
    }

    #[test]
    fn test_promotion_table() {
        assert_eq!(
            TypePromotion::from_schemas(&AvroSchema::Int, &AvroSchema::Long).unwrap(),
            Some(TypePromotion::IntToLong)
        );
        assert_eq!(
            TypePromotion::from_schemas(&AvroSchema::Float, &AvroSchema::Double).unwrap(),
            Some(TypePromotion::FloatToDouble)
        );
        assert!(TypePromotion::from_schemas(&AvroSchema::Long, &AvroSchema::Int).is_err());
    }

    #[test]
    fn test_resolver_skips_writer_only_fields() {
        let writer = AvroSchema::Record(RecordSchema::new(
            "Item",
            vec![
                FieldSchema::new("id", AvroSchema::Int),
                FieldSchema::new("name", AvroSchema::String),
            ],
        ));
        let reader = AvroSchema::Record(RecordSchema::new(
            "Item",
            vec![FieldSchema::new("id", AvroSchema::Int)],
        ));

        let value = AvroValue::record(vec![
            ("id", AvroValue::Int(7)),
            ("name", AvroValue::String("x".into())),
        ]);
        let bytes = encode_record(&writer, &value);

        let resolver = plain_resolver(reader, writer).unwrap();
        let decoded = resolver.read(&bytes, false).unwrap();
        assert_eq!(decoded, AvroValue::record(vec![("id", AvroValue::Int(7))]));
    }

    #[test]
    fn test_resolver_applies_defaults_and_promotions() {
        let writer = AvroSchema::Record(RecordSchema::new(
            "Item",
            vec![FieldSchema::new("count", AvroSchema::Int)],
        ));
        let reader = AvroSchema::Record(RecordSchema::new(
            "Item",
            vec![
                FieldSchema::new("count", AvroSchema::Long),
                FieldSchema::new("label", AvroSchema::String).with_default(json!("none")),
            ],
        ));

        let bytes = encode_record(
            &writer,
            &AvroValue::record(vec![("count", AvroValue::Int(3))]),
        );

        let resolver = plain_resolver(reader, writer).unwrap();
        let decoded = resolver.read(&bytes, false).unwrap();
        assert_eq!(
            decoded,
            AvroValue::record(vec![
                ("count", AvroValue::Long(3)),
                ("label", AvroValue::String("none".into())),
            ])
        );
    }

    #[test]
    fn test_resolver_rejects_missing_field_without_default() {
        let writer = AvroSchema::Record(RecordSchema::new(
            "Item",
            vec![FieldSchema::new("id", AvroSchema::Int)],
        ));
        let reader = AvroSchema::Record(RecordSchema::new(
            "Item",
            vec![
                FieldSchema::new("id", AvroSchema::Int),
                FieldSchema::new("name", AvroSchema::String),
            ],
        ));

        assert!(matches!(
            plain_resolver(reader, writer),
            Err(SchemaError::IncompatibleSchemas(_))
        ));
    }

    #[test]
    fn test_resolver_no_check_ignores_trailing_bytes() {
        let writer = AvroSchema::Record(RecordSchema::new(
            "Item",
            vec![FieldSchema::new("id", AvroSchema::Int)],
        ));
        let reader = writer.clone();

        let mut bytes = encode_record(
            &writer,
            &AvroValue::record(vec![("id", AvroValue::Int(1))]),
        );
        bytes.push(0xFF);

        let resolver = plain_resolver(reader.clone(), writer.clone()).unwrap();
        assert!(matches!(
            resolver.read(&bytes, false),
            Err(DecodeError::TrailingBytes(1))
        ));
        assert!(resolver.read(&bytes, true).is_ok());
    }
}
