//! Persistent type environment.
//!
//! Maps identifiers to schemes. `extend` copies on write and returns a
//! new environment, leaving the original untouched -- generalization
//! needs the pre-extension environment's free variables, so the
//! environment is a value, not a scope stack.

use std::collections::BTreeSet;

use rustc_hash::FxHashMap;

use crate::ty::Scheme;

/// A persistent mapping from identifier to type scheme.
#[derive(Debug, Clone, Default)]
pub struct TypeEnv {
    bindings: FxHashMap<String, Scheme>,
}

impl TypeEnv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a name's scheme.
    pub fn lookup(&self, name: &str) -> Option<&Scheme> {
        self.bindings.get(name)
    }

    /// A new environment with `name` bound to `scheme`.
    pub fn extend(&self, name: impl Into<String>, scheme: Scheme) -> TypeEnv {
        let mut bindings = self.bindings.clone();
        bindings.insert(name.into(), scheme);
        TypeEnv { bindings }
    }

    /// A new environment without `name`.
    pub fn remove(&self, name: &str) -> TypeEnv {
        let mut bindings = self.bindings.clone();
        bindings.remove(name);
        TypeEnv { bindings }
    }

    /// Iterate over the bound schemes.
    pub fn schemes(&self) -> impl Iterator<Item = &Scheme> {
        self.bindings.values()
    }

    /// A new environment with every scheme transformed.
    pub fn map_schemes(&self, f: impl Fn(&Scheme) -> Scheme) -> TypeEnv {
        TypeEnv {
            bindings: self
                .bindings
                .iter()
                .map(|(name, scheme)| (name.clone(), f(scheme)))
                .collect(),
        }
    }

    /// The union of the free variables of every bound scheme.
    pub fn free_vars(&self) -> BTreeSet<String> {
        let mut vars = BTreeSet::new();
        for scheme in self.bindings.values() {
            vars.extend(scheme.free_vars());
        }
        vars
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ty::Type;

    #[test]
    fn extend_is_persistent() {
        let env = TypeEnv::new();
        let extended = env.extend("x", Scheme::mono(Type::Int));

        assert!(env.lookup("x").is_none());
        assert!(extended.lookup("x").is_some());
    }

    #[test]
    fn extend_shadows() {
        let env = TypeEnv::new().extend("x", Scheme::mono(Type::Int));
        let shadowed = env.extend("x", Scheme::mono(Type::String));

        assert_eq!(env.lookup("x").unwrap().ty, Type::Int);
        assert_eq!(shadowed.lookup("x").unwrap().ty, Type::String);
    }

    #[test]
    fn remove_drops_binding() {
        let env = TypeEnv::new().extend("x", Scheme::mono(Type::Int));
        let removed = env.remove("x");
        assert!(removed.lookup("x").is_none());
        assert!(env.lookup("x").is_some());
    }

    #[test]
    fn free_vars_skip_quantified() {
        let env = TypeEnv::new()
            .extend(
                "id",
                Scheme::poly(
                    vec!["a".into()],
                    Type::fun(vec![Type::Var("a".into())], Type::Var("a".into())),
                ),
            )
            .extend("x", Scheme::mono(Type::Var("b".into())));

        let vars = env.free_vars();
        assert!(!vars.contains("a"));
        assert!(vars.contains("b"));
    }
}
