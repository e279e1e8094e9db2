//! The extensible, stateful AST-matching compiler engine.
//!
//! [`Compiler`] is generic over its output and state types; the Avro
//! translation ruleset in [`crate::translate`] is one instantiation.

mod engine;
mod matchers;

pub use engine::{Compiler, Harness};
pub use matchers::{
    match_declaration, match_literal, match_scalar, match_struct, match_suspend, match_tags,
    match_transformation, match_transformation_kind, match_union,
};
