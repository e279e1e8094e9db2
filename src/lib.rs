//! Compiles structural type-schema trees into Apache Avro binary codecs.
//!
//! A schema IR tree (records, tagged unions, recursive types, annotated
//! scalars) is translated by an extensible matching compiler into an
//! Avro schema, which is then paired with the binary engine to produce
//! an executable codec. Discriminant fields are elided on the wire and
//! restored on read; an optional evolution configuration decodes bytes
//! written by the current schema through an older schema plus a
//! validity check before committing to a full decode.

pub mod binary;
pub mod codec;
pub mod compiler;
pub mod error;
pub mod ir;
pub mod schema;
pub mod translate;

// Re-export main types
pub use binary::{AvroType, AvroValue, LogicalTypeRegistry, Resolver, TagCodec, TypePromotion};
pub use codec::{compile, compile_with_evolution, AvroCodec, Evolution};
pub use compiler::{Compiler, Harness};
pub use error::{CodecError, CompileError, DecodeError, EncodeError, SchemaError};
pub use schema::{AvroSchema, EnumSchema, FieldSchema, FixedSchema, NamedTypeIndex, RecordSchema};
pub use translate::{avro_compiler, CompilerState, TypeRegistry};
