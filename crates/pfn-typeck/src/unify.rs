//! Unification: computing the most general substitution that makes two
//! types syntactically equal.
//!
//! `Subst::unify` first applies the current substitution to both sides,
//! then compares structurally. The returned substitution is the unifier
//! on top of the current one; callers compose it as `new ∘ current`.
//! The occurs check rejects bindings that would build infinite types.

use std::collections::BTreeMap;

use crate::subst::Subst;
use crate::ty::Type;

impl Subst {
    /// Unify two types under this substitution.
    ///
    /// Returns `None` on mismatch or occurs-check failure.
    pub fn unify(&self, t1: &Type, t2: &Type) -> Option<Subst> {
        let t1 = self.apply(t1);
        let t2 = self.apply(t2);

        match (&t1, &t2) {
            (Type::Int, Type::Int)
            | (Type::Float, Type::Float)
            | (Type::String, Type::String)
            | (Type::Bool, Type::Bool)
            | (Type::Char, Type::Char)
            | (Type::Unit, Type::Unit) => Some(Subst::new()),

            (Type::Var(a), Type::Var(b)) if a == b => Some(Subst::new()),

            (Type::Var(a), other) | (other, Type::Var(a)) => {
                if self.occurs_in(a, other) {
                    None
                } else {
                    Some(Subst::singleton(a.clone(), other.clone()))
                }
            }

            (Type::Fun(p1, r1), Type::Fun(p2, r2)) => {
                let s1 = self.unify(p1, p2)?;
                let s1 = s1.compose(self);
                let s2 = s1.unify(&s1.apply(r1), &s1.apply(r2))?;
                Some(s2.compose(&s1))
            }

            (Type::List(e1), Type::List(e2)) => self.unify(e1, e2),

            (Type::Tuple(e1), Type::Tuple(e2)) => {
                if e1.len() != e2.len() {
                    return None;
                }
                Self::unify_pairwise(e1.iter().zip(e2.iter()))
            }

            (Type::Con(n1, a1), Type::Con(n2, a2)) => {
                if n1 != n2 || a1.len() != a2.len() {
                    return None;
                }
                Self::unify_pairwise(a1.iter().zip(a2.iter()))
            }

            (Type::Record(f1), Type::Record(f2)) => {
                let m1: BTreeMap<&String, &Type> = f1.iter().map(|(n, t)| (n, t)).collect();
                let m2: BTreeMap<&String, &Type> = f2.iter().map(|(n, t)| (n, t)).collect();
                if m1.len() != f1.len() || m2.len() != f2.len() {
                    return None;
                }
                if m1.keys().ne(m2.keys()) {
                    return None;
                }
                Self::unify_pairwise(m1.values().copied().zip(m2.values().copied()))
            }

            (Type::RowPoly(f1, r1), Type::RowPoly(f2, r2)) => {
                self.unify_rows(f1, r1.as_deref(), f2, r2.as_deref())
            }

            // A closed record against a row: treat the record as a row
            // with no rest variable.
            (Type::Record(fields), Type::RowPoly(row_fields, rest))
            | (Type::RowPoly(row_fields, rest), Type::Record(fields)) => {
                let closed: BTreeMap<String, Type> = fields.iter().cloned().collect();
                self.unify_rows(&closed, None, row_fields, rest.as_deref())
            }

            (Type::Constraint(c1, i1), Type::Constraint(c2, i2)) => {
                if c1 != c2 {
                    return None;
                }
                self.unify(i1, i2)
            }

            // Qualified types unify through their underlying type; the
            // constraint obligations are tracked by the checker.
            (Type::Qualified(_, inner), other) | (other, Type::Qualified(_, inner)) => {
                self.unify(inner, other)
            }

            _ => None,
        }
    }

    /// Unify a sequence of type pairs, threading intermediate
    /// substitutions left to right.
    fn unify_pairwise<'a>(
        pairs: impl Iterator<Item = (&'a Type, &'a Type)>,
    ) -> Option<Subst> {
        let mut acc = Subst::new();
        for (a, b) in pairs {
            let s = acc.unify(a, b)?;
            acc = s.compose(&acc);
        }
        Some(acc)
    }

    /// Row unification: common labels unify pairwise; labels present on
    /// only one side must be absorbed by the other side's rest variable.
    /// Missing fields against a closed row fail. When both rows are open
    /// with different rest variables, both are rewritten through a shared
    /// fresh row whose name is derived from the two rest names (`.` keeps
    /// it outside the user-writable namespace).
    fn unify_rows(
        &self,
        f1: &BTreeMap<String, Type>,
        r1: Option<&str>,
        f2: &BTreeMap<String, Type>,
        r2: Option<&str>,
    ) -> Option<Subst> {
        let mut acc = Subst::new();
        for (label, t1) in f1 {
            if let Some(t2) = f2.get(label) {
                let s = acc.unify(&self.apply(t1), &self.apply(t2))?;
                acc = s.compose(&acc);
            }
        }

        let only1: BTreeMap<String, Type> = f1
            .iter()
            .filter(|(label, _)| !f2.contains_key(*label))
            .map(|(label, t)| (label.clone(), acc.apply(&self.apply(t))))
            .collect();
        let only2: BTreeMap<String, Type> = f2
            .iter()
            .filter(|(label, _)| !f1.contains_key(*label))
            .map(|(label, t)| (label.clone(), acc.apply(&self.apply(t))))
            .collect();

        match (r1, r2) {
            (None, None) => {
                if only1.is_empty() && only2.is_empty() {
                    Some(acc)
                } else {
                    None
                }
            }
            (Some(r1), None) => {
                if !only1.is_empty() {
                    return None;
                }
                let binding = Subst::singleton(r1, Type::RowPoly(only2, None));
                Some(binding.compose(&acc))
            }
            (None, Some(r2)) => {
                if !only2.is_empty() {
                    return None;
                }
                let binding = Subst::singleton(r2, Type::RowPoly(only1, None));
                Some(binding.compose(&acc))
            }
            (Some(r1), Some(r2)) if r1 == r2 => {
                if only1.is_empty() && only2.is_empty() {
                    Some(acc)
                } else {
                    None
                }
            }
            (Some(r1), Some(r2)) => {
                let shared = format!("{r1}.{r2}");
                let mut binding = Subst::singleton(r1, Type::RowPoly(only2, Some(shared.clone())));
                binding.mapping.insert(
                    r2.to_string(),
                    Type::RowPoly(only1, Some(shared)),
                );
                Some(binding.compose(&acc))
            }
        }
    }
}
