//! Match exhaustiveness and redundancy checking.
//!
//! AST patterns are reduced to a compact [`Pat`] form, then the checker
//! walks the case list in order: a case covered by an earlier one is
//! redundant; afterwards missing patterns are synthesized by constructor
//! completion (Bool, declared sum types, and the built-in
//! `Option`/`Result`/`Ordering`) or by a wildcard witness for unbounded
//! domains.

use rustc_hash::FxHashMap;

use pfn_parser::ast::{Pattern as AstPattern, PatternKind};

use crate::ty::Type;

/// Compact pattern form used by the checker.
#[derive(Debug, Clone, PartialEq)]
pub enum Pat {
    Wild,
    Var(String),
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    Char(char),
    List(Vec<Pat>),
    Cons(Box<Pat>, Box<Pat>),
    Tuple(Vec<Pat>),
    Con { name: String, args: Vec<Pat> },
}

/// Constructors of user-declared sum types, keyed by type name.
/// Each entry is the ordered list of `(constructor, arity)` pairs.
pub type SumTypeRegistry = FxHashMap<String, Vec<(String, usize)>>;

/// The outcome of checking one match expression.
#[derive(Debug, Clone, PartialEq)]
pub struct ExhaustivenessResult {
    pub exhaustive: bool,
    pub missing_patterns: Vec<Pat>,
    pub redundant_patterns: Vec<usize>,
}

/// Reduce an AST pattern to the compact form. List patterns with a rest
/// binder become cons chains; record and unknown forms widen to
/// wildcards.
pub fn convert_pattern(p: &AstPattern) -> Pat {
    match &p.kind {
        PatternKind::Int(v) => Pat::Int(*v),
        PatternKind::Float(v) => Pat::Float(*v),
        PatternKind::Str(v) => Pat::Str(v.clone()),
        PatternKind::Char(v) => Pat::Char(*v),
        PatternKind::Bool(v) => Pat::Bool(*v),
        PatternKind::Var(name) => Pat::Var(name.clone()),
        PatternKind::Wildcard => Pat::Wild,
        PatternKind::List { elements, rest } => match rest {
            None => Pat::List(elements.iter().map(convert_pattern).collect()),
            Some(rest) => {
                let mut tail = convert_pattern(rest);
                for elem in elements.iter().rev() {
                    tail = Pat::Cons(Box::new(convert_pattern(elem)), Box::new(tail));
                }
                tail
            }
        },
        PatternKind::Cons { head, tail } => Pat::Cons(
            Box::new(convert_pattern(head)),
            Box::new(convert_pattern(tail)),
        ),
        PatternKind::Tuple(elements) => {
            Pat::Tuple(elements.iter().map(convert_pattern).collect())
        }
        PatternKind::Constructor { name, args } => Pat::Con {
            name: name.clone(),
            args: args.iter().map(convert_pattern).collect(),
        },
        PatternKind::Record(_) => Pat::Wild,
    }
}

/// A wildcard or variable covers anything.
fn is_wild(p: &Pat) -> bool {
    matches!(p, Pat::Wild | Pat::Var(_))
}

/// Whether `p1` covers `p2`: every value matched by `p2` is matched by
/// `p1`.
pub fn pattern_covers(p1: &Pat, p2: &Pat) -> bool {
    if is_wild(p1) {
        return true;
    }
    if is_wild(p2) {
        return false;
    }

    match (p1, p2) {
        (Pat::Int(a), Pat::Int(b)) => a == b,
        (Pat::Float(a), Pat::Float(b)) => a == b,
        (Pat::Str(a), Pat::Str(b)) => a == b,
        (Pat::Bool(a), Pat::Bool(b)) => a == b,
        (Pat::Char(a), Pat::Char(b)) => a == b,
        (Pat::List(e1), Pat::List(e2)) => {
            e1.len() == e2.len() && e1.iter().zip(e2).all(|(a, b)| pattern_covers(a, b))
        }
        (Pat::Cons(h1, t1), Pat::Cons(h2, t2)) => {
            pattern_covers(h1, h2) && pattern_covers(t1, t2)
        }
        (Pat::Tuple(e1), Pat::Tuple(e2)) => {
            e1.len() == e2.len() && e1.iter().zip(e2).all(|(a, b)| pattern_covers(a, b))
        }
        (
            Pat::Con { name: n1, args: a1 },
            Pat::Con { name: n2, args: a2 },
        ) => {
            n1 == n2
                && a1.len() == a2.len()
                && a1.iter().zip(a2).all(|(a, b)| pattern_covers(a, b))
        }
        _ => false,
    }
}

/// The enumerable constructors of a type, or empty for unbounded
/// domains.
fn constructors_for_type(ty: &Type, sum_types: &SumTypeRegistry) -> Vec<(String, usize)> {
    match ty {
        Type::Bool => vec![("True".to_string(), 0), ("False".to_string(), 0)],
        Type::Con(name, _) => match name.as_str() {
            "Option" => vec![("Some".to_string(), 1), ("None".to_string(), 0)],
            "Result" => vec![("Ok".to_string(), 1), ("Err".to_string(), 1)],
            "Ordering" => vec![
                ("LT".to_string(), 0),
                ("EQ".to_string(), 0),
                ("GT".to_string(), 0),
            ],
            _ => sum_types.get(name).cloned().unwrap_or_default(),
        },
        _ => Vec::new(),
    }
}

/// Synthesize the patterns a covered set is missing for a scrutinee
/// type: constructor completion for enumerable types, a wildcard witness
/// otherwise.
fn generate_missing(ty: Option<&Type>, covered: &[Pat], sum_types: &SumTypeRegistry) -> Vec<Pat> {
    // Lists have two shapes: empty and cons. Covering both (or a
    // wildcard) is complete.
    if let Some(Type::List(_)) = ty {
        if covered.iter().any(is_wild) {
            return Vec::new();
        }
        let mut missing = Vec::new();
        let empty = Pat::List(Vec::new());
        if !covered.iter().any(|p| pattern_covers(p, &empty)) {
            missing.push(empty);
        }
        let cons = Pat::Cons(Box::new(Pat::Wild), Box::new(Pat::Wild));
        if !covered.iter().any(|p| pattern_covers(p, &cons)) {
            missing.push(cons);
        }
        return missing;
    }

    let constructors = ty
        .map(|t| constructors_for_type(t, sum_types))
        .unwrap_or_default();

    if constructors.is_empty() {
        if covered.iter().any(is_wild) {
            return Vec::new();
        }
        return vec![Pat::Wild];
    }

    let mut missing = Vec::new();
    for (name, arity) in constructors {
        let witness = Pat::Con {
            name: name.clone(),
            args: vec![Pat::Wild; arity],
        };
        // Bool constructors are matched by literal patterns.
        let covered_here = covered.iter().any(|p| {
            pattern_covers(p, &witness)
                || matches!((p, name.as_str()), (Pat::Bool(true), "True"))
                || matches!((p, name.as_str()), (Pat::Bool(false), "False"))
        });
        if !covered_here {
            missing.push(witness);
        }
    }
    missing
}

/// Check a match's pattern list for redundancy and completeness.
pub fn check_exhaustiveness(
    patterns: &[Pat],
    scrutinee_type: Option<&Type>,
    sum_types: &SumTypeRegistry,
) -> ExhaustivenessResult {
    if patterns.is_empty() {
        return ExhaustivenessResult {
            exhaustive: false,
            missing_patterns: vec![Pat::Wild],
            redundant_patterns: Vec::new(),
        };
    }

    let mut covered: Vec<Pat> = Vec::new();
    let mut redundant = Vec::new();

    for (i, p) in patterns.iter().enumerate() {
        if covered.iter().any(|prev| pattern_covers(prev, p)) {
            redundant.push(i);
        } else {
            covered.push(p.clone());
        }
    }

    let missing = match scrutinee_type {
        Some(ty) => generate_missing(Some(ty), &covered, sum_types),
        None => {
            if covered.iter().any(is_wild) {
                Vec::new()
            } else {
                vec![Pat::Wild]
            }
        }
    };

    ExhaustivenessResult {
        exhaustive: missing.is_empty(),
        missing_patterns: missing,
        redundant_patterns: redundant,
    }
}

/// Check a match's AST cases directly.
pub fn check_match_exhaustiveness(
    cases: &[AstPattern],
    scrutinee_type: Option<&Type>,
    sum_types: &SumTypeRegistry,
) -> ExhaustivenessResult {
    let patterns: Vec<Pat> = cases.iter().map(convert_pattern).collect();
    check_exhaustiveness(&patterns, scrutinee_type, sum_types)
}

/// Render a pattern back to surface syntax for diagnostics.
pub fn pattern_to_string(p: &Pat) -> String {
    match p {
        Pat::Wild => "_".to_string(),
        Pat::Var(name) => name.clone(),
        Pat::Int(v) => v.to_string(),
        Pat::Float(v) => v.to_string(),
        Pat::Str(v) => format!("{v:?}"),
        Pat::Bool(v) => if *v { "True" } else { "False" }.to_string(),
        Pat::Char(v) => format!("'{v}'"),
        Pat::List(elements) => {
            let elems: Vec<_> = elements.iter().map(pattern_to_string).collect();
            format!("[{}]", elems.join(", "))
        }
        Pat::Cons(head, tail) => {
            format!("{} :: {}", pattern_to_string(head), pattern_to_string(tail))
        }
        Pat::Tuple(elements) => {
            let elems: Vec<_> = elements.iter().map(pattern_to_string).collect();
            format!("({})", elems.join(", "))
        }
        Pat::Con { name, args } => {
            if args.is_empty() {
                name.clone()
            } else {
                let args: Vec<_> = args.iter().map(pattern_to_string).collect();
                format!("{name} {}", args.join(" "))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> SumTypeRegistry {
        let mut reg = SumTypeRegistry::default();
        reg.insert(
            "Shape".to_string(),
            vec![("Circle".to_string(), 1), ("Point".to_string(), 0)],
        );
        reg
    }

    fn con(name: &str, args: Vec<Pat>) -> Pat {
        Pat::Con {
            name: name.to_string(),
            args,
        }
    }

    #[test]
    fn wildcard_covers_everything() {
        assert!(pattern_covers(&Pat::Wild, &Pat::Int(3)));
        assert!(pattern_covers(&Pat::Var("x".into()), &con("Some", vec![Pat::Wild])));
        assert!(!pattern_covers(&Pat::Int(3), &Pat::Wild));
    }

    #[test]
    fn literals_cover_only_equal_literals() {
        assert!(pattern_covers(&Pat::Int(3), &Pat::Int(3)));
        assert!(!pattern_covers(&Pat::Int(3), &Pat::Int(4)));
    }

    #[test]
    fn cons_covers_pairwise() {
        let p1 = Pat::Cons(Box::new(Pat::Wild), Box::new(Pat::Wild));
        let p2 = Pat::Cons(Box::new(Pat::Int(1)), Box::new(Pat::List(vec![])));
        assert!(pattern_covers(&p1, &p2));
        assert!(!pattern_covers(&p2, &p1));
    }

    #[test]
    fn bool_match_missing_false() {
        let result = check_exhaustiveness(
            &[Pat::Bool(true)],
            Some(&Type::Bool),
            &SumTypeRegistry::default(),
        );
        assert!(!result.exhaustive);
        assert_eq!(result.missing_patterns.len(), 1);
        assert_eq!(pattern_to_string(&result.missing_patterns[0]), "False");
    }

    #[test]
    fn bool_match_complete() {
        let result = check_exhaustiveness(
            &[Pat::Bool(true), Pat::Bool(false)],
            Some(&Type::Bool),
            &SumTypeRegistry::default(),
        );
        assert!(result.exhaustive);
    }

    #[test]
    fn option_match_missing_none() {
        let result = check_exhaustiveness(
            &[con("Some", vec![Pat::Wild])],
            Some(&Type::Con("Option".into(), vec![Type::Int])),
            &SumTypeRegistry::default(),
        );
        assert!(!result.exhaustive);
        assert_eq!(pattern_to_string(&result.missing_patterns[0]), "None");
    }

    #[test]
    fn result_match_missing_err() {
        let result_ty = Type::Con("Result".into(), vec![Type::String, Type::Int]);
        let result = check_exhaustiveness(
            &[con("Ok", vec![Pat::Wild])],
            Some(&result_ty),
            &SumTypeRegistry::default(),
        );
        assert!(!result.exhaustive);
        assert_eq!(pattern_to_string(&result.missing_patterns[0]), "Err _");

        let complete = check_exhaustiveness(
            &[con("Ok", vec![Pat::Wild]), con("Err", vec![Pat::Wild])],
            Some(&result_ty),
            &SumTypeRegistry::default(),
        );
        assert!(complete.exhaustive);
    }

    #[test]
    fn declared_sum_type_completion() {
        let result = check_exhaustiveness(
            &[con("Circle", vec![Pat::Wild])],
            Some(&Type::con("Shape")),
            &registry(),
        );
        assert!(!result.exhaustive);
        assert_eq!(pattern_to_string(&result.missing_patterns[0]), "Point");

        let complete = check_exhaustiveness(
            &[con("Circle", vec![Pat::Wild]), con("Point", vec![])],
            Some(&Type::con("Shape")),
            &registry(),
        );
        assert!(complete.exhaustive);
    }

    #[test]
    fn unbounded_domain_needs_wildcard() {
        let no_wild =
            check_exhaustiveness(&[Pat::Int(0)], Some(&Type::Int), &SumTypeRegistry::default());
        assert!(!no_wild.exhaustive);
        assert_eq!(no_wild.missing_patterns, vec![Pat::Wild]);

        let with_wild = check_exhaustiveness(
            &[Pat::Int(0), Pat::Wild],
            Some(&Type::Int),
            &SumTypeRegistry::default(),
        );
        assert!(with_wild.exhaustive);
    }

    #[test]
    fn redundant_case_after_wildcard() {
        let result = check_exhaustiveness(
            &[Pat::Wild, Pat::Int(1)],
            Some(&Type::Int),
            &SumTypeRegistry::default(),
        );
        assert!(result.exhaustive);
        assert_eq!(result.redundant_patterns, vec![1]);
    }

    #[test]
    fn duplicate_literal_is_redundant() {
        let result = check_exhaustiveness(
            &[Pat::Int(1), Pat::Int(1), Pat::Wild],
            Some(&Type::Int),
            &SumTypeRegistry::default(),
        );
        assert_eq!(result.redundant_patterns, vec![1]);
    }

    #[test]
    fn empty_plus_cons_covers_lists() {
        let list_ty = Type::List(Box::new(Type::Int));
        let covered = [
            Pat::List(vec![]),
            Pat::Cons(Box::new(Pat::Var("x".into())), Box::new(Pat::Wild)),
        ];
        let result = check_exhaustiveness(&covered, Some(&list_ty), &SumTypeRegistry::default());
        assert!(result.exhaustive);

        let only_empty = check_exhaustiveness(
            &[Pat::List(vec![])],
            Some(&list_ty),
            &SumTypeRegistry::default(),
        );
        assert!(!only_empty.exhaustive);
        assert_eq!(pattern_to_string(&only_empty.missing_patterns[0]), "_ :: _");
    }

    #[test]
    fn empty_match_is_not_exhaustive() {
        let result =
            check_exhaustiveness(&[], Some(&Type::Int), &SumTypeRegistry::default());
        assert!(!result.exhaustive);
    }

    #[test]
    fn list_rest_pattern_converts_to_cons_chain() {
        use pfn_common::span::Span;
        let span = Span::new(0, 0, 1, 1);
        let ast = AstPattern::new(
            PatternKind::List {
                elements: vec![AstPattern::new(PatternKind::Var("x".into()), span)],
                rest: Some(Box::new(AstPattern::new(
                    PatternKind::Var("rest".into()),
                    span,
                ))),
            },
            span,
        );
        let pat = convert_pattern(&ast);
        assert_eq!(
            pat,
            Pat::Cons(
                Box::new(Pat::Var("x".into())),
                Box::new(Pat::Var("rest".into()))
            )
        );
    }
}
