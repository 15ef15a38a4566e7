//! Type representation for the Pfn type system.
//!
//! Defines the semantic [`Type`] algebra, class [`Constraint`]s, and
//! polymorphic [`Scheme`]s. These are the terms the substitution and
//! unification engine operates on; surface `TypeRef`s from the parser are
//! resolved into them by the checker.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// A semantic Pfn type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Type {
    Int,
    Float,
    String,
    Bool,
    Char,
    Unit,
    /// A type variable, named `t0`, `t1`, ... by the checker's fresh
    /// counter (skolem constants use the reserved `%sk` prefix as `Con`s).
    Var(String),
    /// A function type; right-associative and curried.
    Fun(Box<Type>, Box<Type>),
    List(Box<Type>),
    Tuple(Vec<Type>),
    /// A closed record type with fields in declaration order.
    Record(Vec<(String, Type)>),
    /// A named type constructor applied to arguments.
    Con(String, Vec<Type>),
    /// Explicit universal quantification, for higher-rank checking.
    Forall(Vec<String>, Box<Type>),
    /// Explicit existential quantification.
    Exists(Vec<String>, Box<Type>),
    /// A single class constraint used as a type term: `C τ`.
    Constraint(String, Box<Type>),
    /// `(C1, ..., Cn) => τ`.
    Qualified(Vec<Constraint>, Box<Type>),
    /// A record row with optional open rest variable.
    RowPoly(BTreeMap<String, Type>, Option<String>),
}

/// A class constraint `C τ` as carried by schemes and qualified types.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Constraint {
    pub class_name: String,
    pub ty: Type,
}

impl Constraint {
    pub fn new(class_name: impl Into<String>, ty: Type) -> Self {
        Self {
            class_name: class_name.into(),
            ty,
        }
    }
}

impl Type {
    /// Shorthand for a curried function type over several parameters.
    pub fn fun(params: Vec<Type>, result: Type) -> Type {
        params
            .into_iter()
            .rev()
            .fold(result, |acc, p| Type::Fun(Box::new(p), Box::new(acc)))
    }

    /// Shorthand for a nullary constructor.
    pub fn con(name: impl Into<String>) -> Type {
        Type::Con(name.into(), Vec::new())
    }

    /// The free type variables of this type, minus variables bound by
    /// `Forall`/`Exists`. Row rest variables count as free.
    pub fn free_vars(&self) -> BTreeSet<String> {
        let mut vars = BTreeSet::new();
        self.collect_free_vars(&mut vars);
        vars
    }

    fn collect_free_vars(&self, out: &mut BTreeSet<String>) {
        match self {
            Type::Int | Type::Float | Type::String | Type::Bool | Type::Char | Type::Unit => {}
            Type::Var(name) => {
                out.insert(name.clone());
            }
            Type::Fun(param, result) => {
                param.collect_free_vars(out);
                result.collect_free_vars(out);
            }
            Type::List(elem) => elem.collect_free_vars(out),
            Type::Tuple(elements) => {
                for e in elements {
                    e.collect_free_vars(out);
                }
            }
            Type::Record(fields) => {
                for (_, t) in fields {
                    t.collect_free_vars(out);
                }
            }
            Type::Con(_, args) => {
                for a in args {
                    a.collect_free_vars(out);
                }
            }
            Type::Forall(bound, inner) | Type::Exists(bound, inner) => {
                let mut inner_vars = BTreeSet::new();
                inner.collect_free_vars(&mut inner_vars);
                for v in bound {
                    inner_vars.remove(v);
                }
                out.extend(inner_vars);
            }
            Type::Constraint(_, inner) => inner.collect_free_vars(out),
            Type::Qualified(constraints, inner) => {
                for c in constraints {
                    c.ty.collect_free_vars(out);
                }
                inner.collect_free_vars(out);
            }
            Type::RowPoly(fields, rest) => {
                for t in fields.values() {
                    t.collect_free_vars(out);
                }
                if let Some(rest) = rest {
                    out.insert(rest.clone());
                }
            }
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Int => write!(f, "Int"),
            Type::Float => write!(f, "Float"),
            Type::String => write!(f, "String"),
            Type::Bool => write!(f, "Bool"),
            Type::Char => write!(f, "Char"),
            Type::Unit => write!(f, "()"),
            Type::Var(name) => write!(f, "{name}"),
            Type::Fun(param, result) => {
                // Parenthesise a function-typed parameter.
                if matches!(**param, Type::Fun(..)) {
                    write!(f, "({param}) -> {result}")
                } else {
                    write!(f, "{param} -> {result}")
                }
            }
            Type::List(elem) => write!(f, "[{elem}]"),
            Type::Tuple(elements) => {
                write!(f, "(")?;
                for (i, e) in elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{e}")?;
                }
                write!(f, ")")
            }
            Type::Record(fields) => {
                write!(f, "{{")?;
                for (i, (name, t)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{name}: {t}")?;
                }
                write!(f, "}}")
            }
            Type::Con(name, args) => {
                write!(f, "{name}")?;
                for a in args {
                    if matches!(a, Type::Fun(..) | Type::Con(_, _) if !a.is_atomic_display()) {
                        write!(f, " ({a})")?;
                    } else {
                        write!(f, " {a}")?;
                    }
                }
                Ok(())
            }
            Type::Forall(vars, inner) => {
                write!(f, "forall {}. {inner}", vars.join(" "))
            }
            Type::Exists(vars, inner) => {
                write!(f, "exists {}. {inner}", vars.join(" "))
            }
            Type::Constraint(class_name, ty) => write!(f, "{class_name} {ty}"),
            Type::Qualified(constraints, inner) => {
                write!(f, "(")?;
                for (i, c) in constraints.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{} {}", c.class_name, c.ty)?;
                }
                write!(f, ") => {inner}")
            }
            Type::RowPoly(fields, rest) => {
                write!(f, "{{")?;
                for (i, (name, t)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{name}: {t}")?;
                }
                if let Some(rest) = rest {
                    write!(f, " | {rest}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl Type {
    /// Whether the `Display` form needs no parentheses as a constructor
    /// argument.
    fn is_atomic_display(&self) -> bool {
        matches!(
            self,
            Type::Int
                | Type::Float
                | Type::String
                | Type::Bool
                | Type::Char
                | Type::Unit
                | Type::Var(_)
                | Type::List(_)
                | Type::Tuple(_)
                | Type::Record(_)
        ) || matches!(self, Type::Con(_, args) if args.is_empty())
    }
}

/// A polymorphic type scheme: quantified variables, the underlying type,
/// and the class constraints its instantiations must satisfy.
///
/// `vars` is lexicographically ordered (the generalizer sorts it) and has
/// no duplicates.
#[derive(Debug, Clone, PartialEq)]
pub struct Scheme {
    pub vars: Vec<String>,
    pub ty: Type,
    pub constraints: Vec<Constraint>,
}

impl Scheme {
    /// Create a monomorphic scheme (no quantified variables).
    pub fn mono(ty: Type) -> Self {
        Scheme {
            vars: Vec::new(),
            ty,
            constraints: Vec::new(),
        }
    }

    /// Create a polymorphic scheme without constraints.
    pub fn poly(vars: Vec<String>, ty: Type) -> Self {
        Scheme {
            vars,
            ty,
            constraints: Vec::new(),
        }
    }

    /// The scheme's free variables: free vars of the type minus the
    /// quantified ones.
    pub fn free_vars(&self) -> BTreeSet<String> {
        let mut vars = self.ty.free_vars();
        for c in &self.constraints {
            vars.extend(c.ty.free_vars());
        }
        for v in &self.vars {
            vars.remove(v);
        }
        vars
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.vars.is_empty() {
            write!(f, "{}", self.ty)
        } else {
            write!(f, "forall {}. {}", self.vars.join(" "), self.ty)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fun_builds_curried_chains() {
        let t = Type::fun(vec![Type::Int, Type::Bool], Type::String);
        assert_eq!(
            t,
            Type::Fun(
                Box::new(Type::Int),
                Box::new(Type::Fun(Box::new(Type::Bool), Box::new(Type::String)))
            )
        );
    }

    #[test]
    fn display_forms() {
        assert_eq!(Type::Int.to_string(), "Int");
        assert_eq!(Type::Unit.to_string(), "()");
        assert_eq!(
            Type::fun(vec![Type::Int, Type::Int], Type::Int).to_string(),
            "Int -> Int -> Int"
        );
        assert_eq!(
            Type::Fun(
                Box::new(Type::fun(vec![Type::Int], Type::Int)),
                Box::new(Type::Bool)
            )
            .to_string(),
            "(Int -> Int) -> Bool"
        );
        assert_eq!(Type::List(Box::new(Type::Int)).to_string(), "[Int]");
        assert_eq!(
            Type::Con("Option".into(), vec![Type::Int]).to_string(),
            "Option Int"
        );
        assert_eq!(
            Type::Tuple(vec![Type::Int, Type::Bool]).to_string(),
            "(Int, Bool)"
        );
    }

    #[test]
    fn display_qualified() {
        let t = Type::Qualified(
            vec![Constraint::new("Eq", Type::Var("a".into()))],
            Box::new(Type::fun(
                vec![Type::Var("a".into()), Type::Var("a".into())],
                Type::Bool,
            )),
        );
        assert_eq!(t.to_string(), "(Eq a) => a -> a -> Bool");
    }

    #[test]
    fn free_vars_skip_quantified() {
        let t = Type::Forall(
            vec!["a".into()],
            Box::new(Type::Fun(
                Box::new(Type::Var("a".into())),
                Box::new(Type::Var("b".into())),
            )),
        );
        let vars = t.free_vars();
        assert!(!vars.contains("a"));
        assert!(vars.contains("b"));
    }

    #[test]
    fn row_rest_var_is_free() {
        let mut fields = BTreeMap::new();
        fields.insert("x".to_string(), Type::Int);
        let t = Type::RowPoly(fields, Some("r".into()));
        assert!(t.free_vars().contains("r"));
    }

    #[test]
    fn scheme_free_vars_subtract_bound() {
        let scheme = Scheme::poly(
            vec!["a".into()],
            Type::Fun(
                Box::new(Type::Var("a".into())),
                Box::new(Type::Var("b".into())),
            ),
        );
        let vars = scheme.free_vars();
        assert!(!vars.contains("a"));
        assert!(vars.contains("b"));
    }

    #[test]
    fn scheme_display() {
        let scheme = Scheme::poly(
            vec!["a".into()],
            Type::Fun(
                Box::new(Type::Var("a".into())),
                Box::new(Type::Var("a".into())),
            ),
        );
        assert_eq!(scheme.to_string(), "forall a. a -> a");
    }
}
