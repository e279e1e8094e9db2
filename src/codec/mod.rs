//! Compiled codec artifacts and the evolution resolver.
//!
//! [`compile`] turns a schema IR root into an [`AvroCodec`]: an
//! immutable, reusable pairing of an Avro schema definition with
//! `encode`/`decode`. [`compile_with_evolution`] additionally compiles
//! an older ("light") schema against the same named-type registry and
//! decodes with an attempt→validate→fallback protocol: a non-strict
//! light decode feeds the caller's validity predicate, and only an
//! accepted payload is decoded in full with the current ("heavy")
//! schema.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::binary::{AvroType, AvroValue, Resolver};
use crate::error::{CodecError, SchemaError};
use crate::ir::Node;
use crate::schema::AvroSchema;
use crate::translate::{avro_compiler, CompilerState};

/// An evolution configuration: the older schema IR and the acceptance
/// predicate run against its (partially) decoded values.
#[derive(Clone)]
pub struct Evolution {
    schema: Node,
    accept: Arc<dyn Fn(&AvroValue) -> bool + Send + Sync>,
}

impl Evolution {
    /// Pair a light schema with its validity predicate.
    pub fn new(schema: Node, accept: impl Fn(&AvroValue) -> bool + Send + Sync + 'static) -> Self {
        Self {
            schema,
            accept: Arc::new(accept),
        }
    }
}

impl fmt::Debug for Evolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Evolution").finish_non_exhaustive()
    }
}

struct CompiledEvolution {
    light: AvroType,
    resolver: Resolver,
    accept: Arc<dyn Fn(&AvroValue) -> bool + Send + Sync>,
}

impl fmt::Debug for CompiledEvolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledEvolution")
            .field("light", &self.light)
            .finish_non_exhaustive()
    }
}

/// A compiled codec: an Avro schema definition plus executable
/// encode/decode. Immutable and reusable for many calls.
#[derive(Debug)]
pub struct AvroCodec {
    heavy: AvroType,
    evolution: Option<CompiledEvolution>,
}

/// Compile a schema IR root into a codec with a fresh compiler state.
pub fn compile(root: &Node) -> Result<AvroCodec, CodecError> {
    let (schema, state) = avro_compiler().run(root, CompilerState::new())?;
    let heavy = executable_type(schema, &state)?;
    Ok(AvroCodec {
        heavy,
        evolution: None,
    })
}

/// Compile a current schema IR root plus an older schema for evolution
/// decoding.
///
/// The light schema compiles against the heavy compile's final state,
/// so named types shared between the two are not redefined.
pub fn compile_with_evolution(
    root: &Node,
    evolution: Evolution,
) -> Result<AvroCodec, CodecError> {
    let compiler = avro_compiler();
    let (heavy_schema, state) = compiler.run(root, CompilerState::new())?;
    let (light_schema, state) = compiler.run(&evolution.schema, state)?;

    let heavy = executable_type(heavy_schema, &state)?;
    let light = executable_type(light_schema, &state)?;
    let resolver = light.create_resolver(&heavy)?;

    Ok(AvroCodec {
        heavy,
        evolution: Some(CompiledEvolution {
            light,
            resolver,
            accept: evolution.accept,
        }),
    })
}

fn executable_type(schema: AvroSchema, state: &CompilerState) -> Result<AvroType, SchemaError> {
    let registry = state.registry.borrow();
    AvroType::for_schema_with_types(schema, &registry.named_types, registry.logical_types.clone())
}

impl AvroCodec {
    /// Encode a value. Always uses the current (heavy) schema.
    pub fn encode(&self, value: &AvroValue) -> Result<Vec<u8>, CodecError> {
        Ok(self.heavy.to_buffer(value)?)
    }

    /// Decode a byte payload.
    ///
    /// Without evolution this is a plain decode with the current
    /// schema. With evolution, the payload is first decoded
    /// non-strictly through the light resolver; the caller's predicate
    /// decides whether the payload belongs to this codec version. An
    /// accepted payload is decoded in full with the current schema; a
    /// rejected one fails with [`CodecError::EvolutionValidation`] and
    /// is not retried or coerced.
    pub fn decode(&self, bytes: &[u8]) -> Result<AvroValue, CodecError> {
        match &self.evolution {
            None => Ok(self.heavy.from_buffer(bytes)?),
            Some(evolution) => {
                let partial =
                    evolution
                        .light
                        .from_buffer_resolved(bytes, &evolution.resolver, true)?;
                if (evolution.accept)(&partial) {
                    debug!("light decode accepted, running full decode");
                    Ok(self.heavy.from_buffer(bytes)?)
                } else {
                    Err(CodecError::EvolutionValidation)
                }
            }
        }
    }

    /// The current schema definition.
    pub fn schema(&self) -> &AvroSchema {
        self.heavy.schema()
    }

    /// The current schema definition as Avro JSON.
    pub fn json_schema(&self) -> serde_json::Value {
        self.heavy.json_schema()
    }

    /// The executable type backing this codec.
    pub fn avro_type(&self) -> &AvroType {
        &self.heavy
    }
}
