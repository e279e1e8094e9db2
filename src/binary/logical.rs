//! Logical-type codecs applied transparently by the binary engine.
//!
//! A logical type pairs two pure conversions keyed by the identifier a
//! record carries in its `logicalType` field: `attach` runs after a
//! record is decoded, `strip` runs before a record is encoded. The only
//! codec the translation ruleset registers is the ambient tag, which
//! removes a record's discriminant field on the wire and restores it on
//! read.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::binary::AvroValue;
use crate::ir::TAG_FIELD;

type Conversion = Arc<dyn Fn(AvroValue) -> AvroValue + Send + Sync>;

/// A pure `attach`/`strip` conversion pair.
#[derive(Clone)]
pub struct TagCodec {
    name: String,
    attach: Conversion,
    strip: Conversion,
}

impl TagCodec {
    /// Create a codec from its name and conversion pair.
    pub fn new(
        name: impl Into<String>,
        attach: impl Fn(AvroValue) -> AvroValue + Send + Sync + 'static,
        strip: impl Fn(AvroValue) -> AvroValue + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            attach: Arc::new(attach),
            strip: Arc::new(strip),
        }
    }

    /// The identifier records reference this codec by.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Conversion applied to a freshly decoded record value.
    pub fn attach(&self, value: AvroValue) -> AvroValue {
        (self.attach)(value)
    }

    /// Conversion applied to a record value before encoding.
    pub fn strip(&self, value: AvroValue) -> AvroValue {
        (self.strip)(value)
    }
}

impl fmt::Debug for TagCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TagCodec").field("name", &self.name).finish()
    }
}

/// The ambient-tag codec for a named record: decoding re-attaches the
/// discriminant field with the record's name as its value, encoding
/// strips it.
pub fn ambient_tag(tag: impl Into<String>) -> TagCodec {
    let tag = tag.into();
    let name = format!("Tag_{}", tag);
    let attach_tag = tag.clone();
    TagCodec::new(
        name,
        move |value| match value {
            AvroValue::Record(mut fields) => {
                fields.retain(|(name, _)| name != TAG_FIELD);
                fields.insert(0, (TAG_FIELD.to_string(), AvroValue::String(attach_tag.clone())));
                AvroValue::Record(fields)
            }
            other => other,
        },
        |value| match value {
            AvroValue::Record(mut fields) => {
                fields.retain(|(name, _)| name != TAG_FIELD);
                AvroValue::Record(fields)
            }
            other => other,
        },
    )
}

/// Registry mapping logical-type identifiers to codecs.
#[derive(Debug, Clone, Default)]
pub struct LogicalTypeRegistry {
    codecs: HashMap<String, TagCodec>,
}

impl LogicalTypeRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a codec under its own name. Registration is idempotent:
    /// the first codec for a name wins.
    pub fn register(&mut self, codec: TagCodec) {
        self.codecs.entry(codec.name().to_string()).or_insert(codec);
    }

    /// Look up a codec by name.
    pub fn get(&self, name: &str) -> Option<&TagCodec> {
        self.codecs.get(name)
    }

    /// Check whether a codec is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.codecs.contains_key(name)
    }
}
