//! Exhaustiveness and redundancy checking through whole-module runs.

use pfn_typeck::{check_module, TypeError};

fn check(source: &str) -> Result<pfn_typeck::ModuleTypes, TypeError> {
    let tokens = pfn_lexer::tokenize(source).unwrap();
    let module = pfn_parser::parse(tokens).unwrap();
    check_module(&module)
}

#[test]
fn bool_match_requires_both_arms() {
    let err = check("def f b = match b with | True -> 1").unwrap_err();
    match err {
        TypeError::NonExhaustiveMatch { missing, .. } => {
            assert_eq!(missing, vec!["False".to_string()]);
        }
        other => panic!("expected non-exhaustive, got {other:?}"),
    }

    assert!(check("def f b = match b with | True -> 1 | False -> 0").is_ok());
}

#[test]
fn wildcard_completes_any_domain() {
    assert!(check("def f n = match n with | 0 -> 1 | _ -> 2").is_ok());
    assert!(check("def f s = match s with | \"a\" -> 1 | other -> 2").is_ok());
}

#[test]
fn int_literals_alone_are_incomplete() {
    let err = check("def f n = match n with | 0 -> 1 | 1 -> 2").unwrap_err();
    match err {
        TypeError::NonExhaustiveMatch { missing, .. } => {
            assert_eq!(missing, vec!["_".to_string()]);
        }
        other => panic!("expected non-exhaustive, got {other:?}"),
    }
}

#[test]
fn declared_sum_types_enumerate_constructors() {
    let source = "type Color | Red | Green | Blue\n\
                  def f c = match c with | Red -> 1 | Blue -> 3";
    let err = check(source).unwrap_err();
    match err {
        TypeError::NonExhaustiveMatch { missing, .. } => {
            assert_eq!(missing, vec!["Green".to_string()]);
        }
        other => panic!("expected non-exhaustive, got {other:?}"),
    }

    let complete = "type Color | Red | Green | Blue\n\
                    def f c = match c with | Red -> 1 | Green -> 2 | Blue -> 3";
    assert!(check(complete).is_ok());
}

#[test]
fn option_scrutinee_uses_builtin_constructors() {
    let err = check("def f o = match o with | Some x -> x").unwrap_err();
    match err {
        TypeError::NonExhaustiveMatch { missing, .. } => {
            assert_eq!(missing, vec!["None".to_string()]);
        }
        other => panic!("expected non-exhaustive, got {other:?}"),
    }
}

#[test]
fn ordering_has_three_constructors() {
    let err = check("def f o = match compare 1 2 with | LT -> \"lt\" | GT -> \"gt\"")
        .unwrap_err();
    match err {
        TypeError::NonExhaustiveMatch { missing, .. } => {
            assert_eq!(missing, vec!["EQ".to_string()]);
        }
        other => panic!("expected non-exhaustive, got {other:?}"),
    }
}

#[test]
fn redundancy_reports_covered_arm_index() {
    let types = check(
        "type Color | Red | Green\n\
         def f c = match c with | Red -> 1 | Red -> 2 | Green -> 3",
    )
    .unwrap();
    assert_eq!(types.warnings.len(), 1);
    assert!(matches!(
        types.warnings[0],
        TypeError::RedundantCase { index: 1, .. }
    ));
}

#[test]
fn redundancy_is_not_an_error() {
    // A redundant arm still typechecks; it only warns.
    let types = check("def f n = match n with | _ -> 0 | 5 -> 1").unwrap();
    assert_eq!(types.schemes.len(), 1);
    assert_eq!(types.warnings.len(), 1);
}

#[test]
fn constructor_argument_refinement_needs_a_wildcard() {
    // The covering rule compares argument-wise: `Some True` does not
    // cover the `Some _` witness, so literal refinements under a
    // constructor still need a catch-all.
    let err = check(
        "def f o = match o with | Some True -> 1 | Some False -> 2 | None -> 0",
    )
    .unwrap_err();
    assert!(matches!(err, TypeError::NonExhaustiveMatch { .. }));

    assert!(check(
        "def f o = match o with | Some True -> 1 | Some b -> 2 | None -> 0"
    )
    .is_ok());
}

#[test]
fn tuple_patterns_cover_via_wildcards() {
    assert!(check("def f p = match p with | (a, b) -> a").is_ok());
    assert!(check("def f p = match p with | (1, _) -> 1 | _ -> 0").is_ok());
}

#[test]
fn empty_and_cons_cover_lists() {
    assert!(check("def f xs = match xs with | [] -> 0 | x :: _ -> x").is_ok());
}

#[test]
fn fixed_length_lists_do_not_cover() {
    let err = check("def f xs = match xs with | [] -> 0 | [x] -> x").unwrap_err();
    assert!(matches!(err, TypeError::NonExhaustiveMatch { .. }));
}
