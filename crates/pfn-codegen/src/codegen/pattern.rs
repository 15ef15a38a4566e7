//! Pattern compilation: each pattern becomes a `(check, bindings)` pair.
//!
//! `check` is a Python boolean expression over a scrutinee variable;
//! `bindings` maps each bound source name to the scrutinee-subterm path
//! that carries its value (`__m0[0]`, `__m0._field1`, ...). Bindings are
//! applied to case bodies through the generator's rename scopes, so no
//! textual substitution ever happens.

use pfn_parser::ast::{Pattern, PatternKind};

use super::{python_safe_name, CodeGenerator};

impl CodeGenerator {
    /// Compile a pattern against the given scrutinee path.
    pub(crate) fn compile_pattern(
        &mut self,
        pattern: &Pattern,
        path: &str,
    ) -> (String, Vec<(String, String)>) {
        let mut bindings = Vec::new();
        let check = self.compile_pattern_into(pattern, path, &mut bindings);
        (check, bindings)
    }

    fn compile_pattern_into(
        &mut self,
        pattern: &Pattern,
        path: &str,
        bindings: &mut Vec<(String, String)>,
    ) -> String {
        match &pattern.kind {
            PatternKind::Int(value) => format!("{path} == {value}"),
            PatternKind::Float(value) => format!("{path} == {value:?}"),
            PatternKind::Str(value) => format!("{path} == {value:?}"),
            PatternKind::Char(value) => {
                format!("{path} == {:?}", value.to_string())
            }
            PatternKind::Bool(value) => {
                format!("{path} is {}", if *value { "True" } else { "False" })
            }

            PatternKind::Var(name) => {
                bindings.push((name.clone(), path.to_string()));
                "True".to_string()
            }
            PatternKind::Wildcard => "True".to_string(),

            PatternKind::List { elements, rest } => {
                if elements.is_empty() && rest.is_none() {
                    return format!("{path} == []");
                }
                let mut checks = match rest {
                    // `[p1, ..., pN]` matches exactly N-length lists;
                    // a rest binder relaxes that to at-least-N.
                    None => vec![format!(
                        "isinstance({path}, list) and len({path}) == {}",
                        elements.len()
                    )],
                    Some(_) => vec![format!(
                        "isinstance({path}, list) and len({path}) >= {}",
                        elements.len()
                    )],
                };
                for (i, elem) in elements.iter().enumerate() {
                    let sub = self.compile_pattern_into(elem, &format!("{path}[{i}]"), bindings);
                    if sub != "True" {
                        checks.push(sub);
                    }
                }
                if let Some(rest) = rest {
                    let sub = self.compile_pattern_into(
                        rest,
                        &format!("{path}[{}:]", elements.len()),
                        bindings,
                    );
                    if sub != "True" {
                        checks.push(sub);
                    }
                }
                checks.join(" and ")
            }

            PatternKind::Cons { head, tail } => {
                let mut checks = vec![format!("isinstance({path}, list) and len({path}) > 0")];
                let head_check = self.compile_pattern_into(head, &format!("{path}[0]"), bindings);
                if head_check != "True" {
                    checks.push(head_check);
                }
                let tail_check = self.compile_pattern_into(tail, &format!("{path}[1:]"), bindings);
                if tail_check != "True" {
                    checks.push(tail_check);
                }
                checks.join(" and ")
            }

            PatternKind::Tuple(elements) => {
                // `()` is the unit pattern; unit lowers to None.
                if elements.is_empty() {
                    return format!("{path} is None");
                }
                let mut checks = vec![format!(
                    "isinstance({path}, tuple) and len({path}) == {}",
                    elements.len()
                )];
                for (i, elem) in elements.iter().enumerate() {
                    let sub = self.compile_pattern_into(elem, &format!("{path}[{i}]"), bindings);
                    if sub != "True" {
                        checks.push(sub);
                    }
                }
                checks.join(" and ")
            }

            PatternKind::Record(fields) => {
                let mut checks = Vec::new();
                for (name, field_pattern) in fields {
                    let field_path = format!("{path}.{}", python_safe_name(name));
                    let sub = self.compile_pattern_into(field_pattern, &field_path, bindings);
                    if sub != "True" {
                        checks.push(sub);
                    }
                }
                if checks.is_empty() {
                    "True".to_string()
                } else {
                    checks.join(" and ")
                }
            }

            PatternKind::Constructor { name, args } => {
                let class_name = python_safe_name(name);
                if args.is_empty() {
                    // Zero-arg constructors are singleton instances.
                    return format!("{path} is {class_name}");
                }
                let mut checks = vec![format!("isinstance({path}, {class_name})")];
                for (i, arg) in args.iter().enumerate() {
                    let sub =
                        self.compile_pattern_into(arg, &format!("{path}._field{i}"), bindings);
                    if sub != "True" {
                        checks.push(sub);
                    }
                }
                checks.join(" and ")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pfn_common::span::Span;

    fn pat(kind: PatternKind) -> Pattern {
        Pattern::new(kind, Span::new(0, 0, 1, 1))
    }

    fn compile(kind: PatternKind) -> (String, Vec<(String, String)>) {
        CodeGenerator::new().compile_pattern(&pat(kind), "__m0")
    }

    #[test]
    fn literal_patterns_compare_for_equality() {
        let (check, bindings) = compile(PatternKind::Int(42));
        assert_eq!(check, "__m0 == 42");
        assert!(bindings.is_empty());
    }

    #[test]
    fn bool_patterns_use_identity() {
        let (check, _) = compile(PatternKind::Bool(true));
        assert_eq!(check, "__m0 is True");
    }

    #[test]
    fn var_pattern_binds_scrutinee() {
        let (check, bindings) = compile(PatternKind::Var("x".to_string()));
        assert_eq!(check, "True");
        assert_eq!(bindings, vec![("x".to_string(), "__m0".to_string())]);
    }

    #[test]
    fn empty_list_pattern() {
        let (check, _) = compile(PatternKind::List {
            elements: vec![],
            rest: None,
        });
        assert_eq!(check, "__m0 == []");
    }

    #[test]
    fn fixed_list_pattern_checks_length() {
        let (check, bindings) = compile(PatternKind::List {
            elements: vec![
                pat(PatternKind::Var("a".to_string())),
                pat(PatternKind::Int(2)),
            ],
            rest: None,
        });
        assert_eq!(
            check,
            "isinstance(__m0, list) and len(__m0) == 2 and __m0[1] == 2"
        );
        assert_eq!(bindings, vec![("a".to_string(), "__m0[0]".to_string())]);
    }

    #[test]
    fn cons_pattern_splits_head_and_tail() {
        let (check, bindings) = compile(PatternKind::Cons {
            head: Box::new(pat(PatternKind::Var("x".to_string()))),
            tail: Box::new(pat(PatternKind::Var("rest".to_string()))),
        });
        assert_eq!(check, "isinstance(__m0, list) and len(__m0) > 0");
        assert_eq!(
            bindings,
            vec![
                ("x".to_string(), "__m0[0]".to_string()),
                ("rest".to_string(), "__m0[1:]".to_string()),
            ]
        );
    }

    #[test]
    fn tuple_pattern_checks_arity() {
        let (check, bindings) = compile(PatternKind::Tuple(vec![
            pat(PatternKind::Var("a".to_string())),
            pat(PatternKind::Var("b".to_string())),
        ]));
        assert_eq!(check, "isinstance(__m0, tuple) and len(__m0) == 2");
        assert_eq!(bindings.len(), 2);
        assert_eq!(bindings[1], ("b".to_string(), "__m0[1]".to_string()));
    }

    #[test]
    fn unit_pattern_is_none_check() {
        let (check, _) = compile(PatternKind::Tuple(vec![]));
        assert_eq!(check, "__m0 is None");
    }

    #[test]
    fn nullary_constructor_uses_identity() {
        let (check, _) = compile(PatternKind::Constructor {
            name: "Point".to_string(),
            args: vec![],
        });
        assert_eq!(check, "__m0 is Point");
    }

    #[test]
    fn constructor_args_use_field_accessors() {
        let (check, bindings) = compile(PatternKind::Constructor {
            name: "Circle".to_string(),
            args: vec![pat(PatternKind::Var("r".to_string()))],
        });
        assert_eq!(check, "isinstance(__m0, Circle)");
        assert_eq!(bindings, vec![("r".to_string(), "__m0._field0".to_string())]);
    }

    #[test]
    fn reserved_constructor_names_are_renamed() {
        let (check, _) = compile(PatternKind::Constructor {
            name: "None".to_string(),
            args: vec![],
        });
        assert_eq!(check, "__m0 is _None_");
    }

    #[test]
    fn rest_pattern_relaxes_length_check() {
        let (check, bindings) = compile(PatternKind::List {
            elements: vec![pat(PatternKind::Var("a".to_string()))],
            rest: Some(Box::new(pat(PatternKind::Var("more".to_string())))),
        });
        assert_eq!(check, "isinstance(__m0, list) and len(__m0) >= 1");
        assert_eq!(
            bindings,
            vec![
                ("a".to_string(), "__m0[0]".to_string()),
                ("more".to_string(), "__m0[1:]".to_string()),
            ]
        );
    }
}
