//! Avro schema types and named-type resolution.

mod index;
mod types;

pub use index::NamedTypeIndex;
pub use types::{AvroSchema, EnumSchema, FieldSchema, FixedSchema, RecordSchema};
