//! The Avro binary engine: wire-format encode/decode, logical-type
//! codecs, and reader/writer schema resolution.

pub mod decode;
pub mod encode;
mod engine;
mod logical;
mod resolver;
mod value;
pub mod varint;

pub use decode::{decode_value, skip_value, DecodeContext};
pub use encode::{encode_value, schema_accepts, EncodeContext};
pub use engine::AvroType;
pub use logical::{ambient_tag, LogicalTypeRegistry, TagCodec};
pub use resolver::{apply_promotion, json_to_avro_value, Resolver, TypePromotion};
pub use value::AvroValue;
