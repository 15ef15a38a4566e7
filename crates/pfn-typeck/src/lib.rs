//! Pfn type checker: Hindley-Milner inference with extensions.
//!
//! Assigns a principal type to every expression of a parsed module,
//! generalizes at let bindings (value-restricted), and layers on:
//!
//! - qualified types (type-class constraints) with a prelude class
//!   context and built-in instances
//! - higher-rank checking via skolemisation
//! - row-polymorphic record unification
//! - match exhaustiveness and redundancy checking
//! - effect-set inference as a parallel annotation
//!
//! # Architecture
//!
//! - [`ty`]: the semantic type algebra, constraints, and schemes
//! - [`subst`]: substitutions (`apply`, `compose`, occurs check)
//! - [`unify`]: structural unification including rows
//! - [`env`]: the persistent type environment
//! - [`classes`]: class context, instances, dictionaries
//! - [`exhaustiveness`]: pattern covering and missing-pattern synthesis
//! - [`effects`]: effect atoms and the effect inference walker
//! - [`infer`]: the Algorithm W core
//! - [`error`]: located type errors

pub mod classes;
pub mod effects;
pub mod env;
pub mod error;
pub mod exhaustiveness;
pub mod infer;
pub mod subst;
pub mod ty;
mod unify;

use pfn_parser::ast::Module;

pub use crate::error::TypeError;
pub use crate::infer::{ModuleTypes, TypeChecker};

/// Type-check a parsed module.
///
/// Returns each top-level definition's inferred scheme in source order.
/// The first type error aborts checking; redundant-case findings are
/// collected as warnings on the result.
pub fn check_module(module: &Module) -> Result<ModuleTypes, TypeError> {
    TypeChecker::new().check_module(module)
}
