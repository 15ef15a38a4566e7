//! Substitutions: finite mappings from type-variable names to types.
//!
//! `apply` is idempotent after one full application (values are applied
//! recursively on lookup), and `compose` implements `s1 ∘ s2`: apply `s1`
//! to each target of `s2`, then union with the entries of `s1` not
//! shadowed by `s2`.

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;

use crate::env::TypeEnv;
use crate::ty::{Constraint, Scheme, Type};

/// A substitution over type variables.
#[derive(Debug, Clone, Default)]
pub struct Subst {
    pub mapping: FxHashMap<String, Type>,
}

impl Subst {
    /// The empty substitution.
    pub fn new() -> Self {
        Self::default()
    }

    /// A substitution with a single binding.
    pub fn singleton(name: impl Into<String>, ty: Type) -> Self {
        let mut mapping = FxHashMap::default();
        mapping.insert(name.into(), ty);
        Self { mapping }
    }

    pub fn is_empty(&self) -> bool {
        self.mapping.is_empty()
    }

    /// Apply this substitution to a type, replacing every mapped `Var`
    /// (recursively, so chains resolve in one call). Bound variables of
    /// `Forall`/`Exists` are removed from the domain before descending.
    pub fn apply(&self, ty: &Type) -> Type {
        match ty {
            Type::Int | Type::Float | Type::String | Type::Bool | Type::Char | Type::Unit => {
                ty.clone()
            }
            Type::Var(name) => match self.mapping.get(name) {
                Some(target) => self.apply(target),
                None => ty.clone(),
            },
            Type::Fun(param, result) => Type::Fun(
                Box::new(self.apply(param)),
                Box::new(self.apply(result)),
            ),
            Type::List(elem) => Type::List(Box::new(self.apply(elem))),
            Type::Tuple(elements) => {
                Type::Tuple(elements.iter().map(|e| self.apply(e)).collect())
            }
            Type::Record(fields) => Type::Record(
                fields
                    .iter()
                    .map(|(name, t)| (name.clone(), self.apply(t)))
                    .collect(),
            ),
            Type::Con(name, args) => Type::Con(
                name.clone(),
                args.iter().map(|a| self.apply(a)).collect(),
            ),
            Type::Forall(bound, inner) => {
                let trimmed = self.without(bound);
                Type::Forall(bound.clone(), Box::new(trimmed.apply(inner)))
            }
            Type::Exists(bound, inner) => {
                let trimmed = self.without(bound);
                Type::Exists(bound.clone(), Box::new(trimmed.apply(inner)))
            }
            Type::Constraint(class_name, inner) => {
                Type::Constraint(class_name.clone(), Box::new(self.apply(inner)))
            }
            Type::Qualified(constraints, inner) => Type::Qualified(
                constraints
                    .iter()
                    .map(|c| Constraint::new(c.class_name.clone(), self.apply(&c.ty)))
                    .collect(),
                Box::new(self.apply(inner)),
            ),
            Type::RowPoly(fields, rest) => self.apply_row(fields, rest.as_deref()),
        }
    }

    /// Apply to a row, merging in fields when the rest variable is mapped
    /// to another row.
    fn apply_row(&self, fields: &BTreeMap<String, Type>, rest: Option<&str>) -> Type {
        let mut new_fields: BTreeMap<String, Type> = fields
            .iter()
            .map(|(name, t)| (name.clone(), self.apply(t)))
            .collect();

        let mut new_rest = rest.map(str::to_string);
        while let Some(rest_name) = new_rest.clone() {
            match self.mapping.get(&rest_name) {
                Some(Type::RowPoly(more_fields, more_rest)) => {
                    for (name, t) in more_fields {
                        new_fields.entry(name.clone()).or_insert_with(|| self.apply(t));
                    }
                    new_rest = more_rest.clone();
                    if new_rest.as_deref() == Some(rest_name.as_str()) {
                        break;
                    }
                }
                Some(Type::Var(renamed)) => {
                    if *renamed == rest_name {
                        break;
                    }
                    new_rest = Some(renamed.clone());
                }
                _ => break,
            }
        }

        Type::RowPoly(new_fields, new_rest)
    }

    /// Apply to a scheme, skipping its quantified variables.
    pub fn apply_scheme(&self, scheme: &Scheme) -> Scheme {
        let trimmed = self.without(&scheme.vars);
        Scheme {
            vars: scheme.vars.clone(),
            ty: trimmed.apply(&scheme.ty),
            constraints: scheme
                .constraints
                .iter()
                .map(|c| Constraint::new(c.class_name.clone(), trimmed.apply(&c.ty)))
                .collect(),
        }
    }

    /// Apply to every scheme in an environment.
    pub fn apply_env(&self, env: &TypeEnv) -> TypeEnv {
        env.map_schemes(|scheme| self.apply_scheme(scheme))
    }

    /// A copy of this substitution with the given names removed from its
    /// domain.
    fn without(&self, names: &[String]) -> Subst {
        let mapping = self
            .mapping
            .iter()
            .filter(|(name, _)| !names.contains(name))
            .map(|(name, t)| (name.clone(), t.clone()))
            .collect();
        Subst { mapping }
    }

    /// `self ∘ other`: the substitution equivalent to applying `other`
    /// first, then `self`.
    pub fn compose(&self, other: &Subst) -> Subst {
        let mut mapping: FxHashMap<String, Type> = other
            .mapping
            .iter()
            .map(|(name, t)| (name.clone(), self.apply(t)))
            .collect();
        for (name, t) in &self.mapping {
            mapping.entry(name.clone()).or_insert_with(|| t.clone());
        }
        Subst { mapping }
    }

    /// Whether `var` occurs free in `ty` (after applying this
    /// substitution). The occurs check keeping unification from building
    /// infinite types.
    pub fn occurs_in(&self, var: &str, ty: &Type) -> bool {
        self.apply(ty).free_vars().contains(var)
    }
}
