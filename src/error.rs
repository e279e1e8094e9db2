//! Error types for schema compilation and the binary codec.

use thiserror::Error;

/// Errors raised while compiling a schema IR tree to an Avro type.
///
/// These are schema-authoring errors: the input tree uses a shape the
/// ruleset does not support, or omits a name Avro requires.
#[derive(Debug, Error)]
pub enum CompileError {
    /// No rule matched the node.
    #[error("no rule matched node: {0}")]
    UnsupportedNode(String),
    /// A struct or union required a name and none was found via
    /// declaration context or annotation.
    #[error("missing identifier: {0}")]
    MissingIdentifier(String),
    /// A compiled union member was itself a union.
    #[error("union types cannot be directly nested")]
    NestedUnion,
}

/// Errors that can occur while constructing or resolving Avro schemas.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// Invalid schema shape
    #[error("invalid schema: {0}")]
    InvalidSchema(String),
    /// A named type reference with no definition in scope
    #[error("unresolved type reference: {0}")]
    UnresolvedReference(String),
    /// Reader and writer schemas cannot be resolved against each other
    #[error("incompatible schemas: {0}")]
    IncompatibleSchemas(String),
}

/// Errors that can occur while decoding Avro binary data.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Invalid Avro data
    #[error("invalid data: {0}")]
    InvalidData(String),
    /// Unexpected end of data
    #[error("unexpected end of buffer")]
    UnexpectedEof,
    /// Type mismatch
    #[error("type mismatch: {0}")]
    TypeMismatch(String),
    /// Invalid varint encoding
    #[error("invalid varint encoding")]
    InvalidVarint,
    /// String is not valid UTF-8
    #[error("invalid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
    /// Bytes left over after a strict decode
    #[error("{0} trailing bytes after value")]
    TrailingBytes(usize),
}

/// Errors that can occur while encoding a value against a schema.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// Value does not conform to the schema
    #[error("type mismatch: {0}")]
    TypeMismatch(String),
    /// Enum value is not one of the schema's symbols
    #[error("unknown enum symbol: {0}")]
    UnknownEnumSymbol(String),
    /// No union branch accepts the value
    #[error("no union variant matches value: {0}")]
    NoMatchingUnionVariant(String),
    /// Record value is missing a field the schema requires
    #[error("missing record field: {0}")]
    MissingField(String),
    /// A named type reference with no definition in scope
    #[error("unresolved type reference: {0}")]
    UnresolvedReference(String),
}

/// Top-level error type for compiled codecs.
///
/// The first two variants are programmer/schema-authoring errors; the
/// rest are data errors surfaced by encode/decode calls. None are retried
/// internally.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Compilation of a schema IR tree failed
    #[error("compile error: {0}")]
    Compile(#[from] CompileError),

    /// Schema construction or resolver construction failed
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    /// Encoding a value failed
    #[error("encode error: {0}")]
    Encode(#[from] EncodeError),

    /// Decoding bytes failed
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// The light-decoded value failed the caller's acceptance test
    #[error("value failed evolution validity check")]
    EvolutionValidation,
}
