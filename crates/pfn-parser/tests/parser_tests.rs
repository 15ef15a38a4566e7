//! Integration tests for the Pfn parser: whole-module parses, the
//! precedence ladder, and grammar tie-breaks.

use pfn_parser::ast::{BinOpKind, DeclKind, ExprKind, Module, PatternKind, UnaryOpKind};
use pfn_parser::{parse, parse_expr};
use pretty_assertions::assert_eq;

fn parse_source(source: &str) -> Module {
    let tokens = pfn_lexer::tokenize(source).unwrap();
    parse(tokens).unwrap()
}

fn expr(source: &str) -> pfn_parser::ast::Expr {
    let tokens = pfn_lexer::tokenize(source).unwrap();
    parse_expr(tokens).unwrap()
}

// ── Declarations ───────────────────────────────────────────────────────

#[test]
fn declarations_preserve_source_order() {
    let module = parse_source(
        "def a = 1\n\
         type Shape | Circle Float | Point\n\
         def b = 2\n\
         import python math as m\n\
         def c = 3",
    );
    let kinds: Vec<&str> = module
        .declarations
        .iter()
        .map(|d| match &d.kind {
            DeclKind::Def(def) => def.name.as_str(),
            DeclKind::Type(_) => "<type>",
            DeclKind::Import(_) => "<import>",
            _ => "<other>",
        })
        .collect();
    assert_eq!(kinds, vec!["a", "<type>", "b", "<import>", "c"]);
}

#[test]
fn module_header_is_recorded() {
    let module = parse_source("module Geo.Shapes\n\ndef area = 1");
    assert_eq!(module.name.as_deref(), Some("Geo.Shapes"));

    let anonymous = parse_source("def area = 1");
    assert_eq!(anonymous.name, None);
}

#[test]
fn def_with_juxtaposed_params() {
    // Scenario: `def add x y = x + y` has name "add" and two params.
    let module = parse_source("def add x y = x + y");
    let DeclKind::Def(def) = &module.declarations[0].kind else {
        panic!("expected def");
    };
    assert_eq!(def.name, "add");
    assert_eq!(def.params.len(), 2);
    assert_eq!(def.params[0].name, "x");
    assert_eq!(def.params[1].name, "y");
    assert!(matches!(
        def.body.kind,
        ExprKind::BinOp {
            op: BinOpKind::Add,
            ..
        }
    ));
}

#[test]
fn def_with_annotated_params_and_return_type() {
    let module = parse_source("def scale (x: Float) (factor: Float) : Float = x * factor");
    let DeclKind::Def(def) = &module.declarations[0].kind else {
        panic!("expected def");
    };
    assert!(def.params.iter().all(|p| p.type_annotation.is_some()));
    assert!(def.return_type.is_some());
}

#[test]
fn py_export_decorator_marks_def() {
    let module = parse_source("@py.export(\"entry\")\ndef main = 0");
    let DeclKind::Def(def) = &module.declarations[0].kind else {
        panic!("expected def");
    };
    assert!(def.is_exported);
    assert_eq!(def.export_name.as_deref(), Some("entry"));

    let bare = parse_source("@py.export\ndef main = 0");
    let DeclKind::Def(def) = &bare.declarations[0].kind else {
        panic!("expected def");
    };
    assert!(def.is_exported);
    assert_eq!(def.export_name, None);
}

#[test]
fn sum_type_declaration() {
    let module = parse_source("type Option a | Some a | None");
    let DeclKind::Type(decl) = &module.declarations[0].kind else {
        panic!("expected type");
    };
    assert_eq!(decl.name, "Option");
    assert_eq!(decl.params, vec!["a"]);
    let names: Vec<&str> = decl.constructors.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Some", "None"]);
    assert_eq!(decl.constructors[0].fields.len(), 1);
    assert_eq!(decl.constructors[1].fields.len(), 0);
}

#[test]
fn record_type_declaration() {
    let module = parse_source("type Point = {x: Float, y: Float}");
    let DeclKind::Type(decl) = &module.declarations[0].kind else {
        panic!("expected type");
    };
    assert!(decl.is_record);
    assert_eq!(decl.record_fields.len(), 2);
}

#[test]
fn type_alias_declaration() {
    let module = parse_source("type Name = String");
    assert!(matches!(
        &module.declarations[0].kind,
        DeclKind::TypeAlias(alias) if alias.name == "Name"
    ));
}

#[test]
fn gadt_declaration() {
    let module = parse_source("gadt Expr a where { IntLit Int (Expr Int), BoolLit Bool (Expr Bool) }");
    let DeclKind::Type(decl) = &module.declarations[0].kind else {
        panic!("expected type");
    };
    assert!(decl.is_gadt);
    assert_eq!(decl.constructors.len(), 2);
}

#[test]
fn interface_and_impl_declarations() {
    let module = parse_source(
        "interface Pretty a where { pretty: a -> String }\n\
         impl Pretty Bool where { pretty b = if b then \"yes\" else \"no\" }",
    );
    let DeclKind::Interface(interface) = &module.declarations[0].kind else {
        panic!("expected interface");
    };
    assert_eq!(interface.name, "Pretty");
    assert_eq!(interface.methods.len(), 1);

    let DeclKind::Impl(impl_decl) = &module.declarations[1].kind else {
        panic!("expected impl");
    };
    assert_eq!(impl_decl.class_name, "Pretty");
    assert_eq!(impl_decl.methods.len(), 1);
    assert_eq!(impl_decl.methods[0].params.len(), 1);
}

#[test]
fn interface_superclasses() {
    let module = parse_source("interface MyOrd a : Eq where { cmp: a -> a -> Int }");
    let DeclKind::Interface(interface) = &module.declarations[0].kind else {
        panic!("expected interface");
    };
    assert_eq!(interface.superclasses, vec!["Eq"]);
}

#[test]
fn effect_and_handler_declarations() {
    let module = parse_source(
        "effect State s { get: Unit -> s, put: s -> Unit }\n\
         handler counter : State { get resume -> resume 0 }",
    );
    let DeclKind::Effect(effect) = &module.declarations[0].kind else {
        panic!("expected effect");
    };
    assert_eq!(effect.name, "State");
    assert_eq!(effect.operations.len(), 2);

    let DeclKind::Handler(handler) = &module.declarations[1].kind else {
        panic!("expected handler");
    };
    assert_eq!(handler.name, "counter");
    assert_eq!(handler.effect_name, "State");
    assert_eq!(handler.cases[0].resume_param.as_deref(), Some("resume"));
}

#[test]
fn import_forms() {
    let module = parse_source(
        "import python numpy as np\n\
         import Geo.Shapes (area, perimeter)",
    );
    let DeclKind::Import(py) = &module.declarations[0].kind else {
        panic!("expected import");
    };
    assert!(py.is_python);
    assert_eq!(py.module, "numpy");
    assert_eq!(py.alias.as_deref(), Some("np"));

    let DeclKind::Import(pfn) = &module.declarations[1].kind else {
        panic!("expected import");
    };
    assert!(!pfn.is_python);
    assert_eq!(
        pfn.exposing,
        Some(vec!["area".to_string(), "perimeter".to_string()])
    );
}

#[test]
fn export_declaration() {
    let module = parse_source("export area, volume");
    assert!(matches!(
        &module.declarations[0].kind,
        DeclKind::Export(e) if e.names == vec!["area".to_string(), "volume".to_string()]
    ));
}

// ── Precedence and associativity ───────────────────────────────────────

#[test]
fn multiplication_binds_tighter_than_addition() {
    // 1 + 2 * 3 parses as 1 + (2 * 3).
    let e = expr("1 + 2 * 3");
    let ExprKind::BinOp { op, right, .. } = &e.kind else {
        panic!("expected binop");
    };
    assert_eq!(*op, BinOpKind::Add);
    assert!(matches!(
        right.kind,
        ExprKind::BinOp {
            op: BinOpKind::Mul,
            ..
        }
    ));
}

#[test]
fn comparison_binds_looser_than_arithmetic() {
    let e = expr("a + 1 < b * 2");
    assert!(matches!(
        e.kind,
        ExprKind::BinOp {
            op: BinOpKind::Lt,
            ..
        }
    ));
}

#[test]
fn cons_is_right_associative() {
    // 1 :: 2 :: [] is 1 :: (2 :: []).
    let e = expr("1 :: 2 :: []");
    let ExprKind::BinOp { op, right, .. } = &e.kind else {
        panic!("expected binop");
    };
    assert_eq!(*op, BinOpKind::Cons);
    assert!(matches!(
        right.kind,
        ExprKind::BinOp {
            op: BinOpKind::Cons,
            ..
        }
    ));
}

#[test]
fn logical_operators_nest_or_over_and() {
    let e = expr("a || b && c");
    let ExprKind::BinOp { op, right, .. } = &e.kind else {
        panic!("expected binop");
    };
    assert_eq!(*op, BinOpKind::Or);
    assert!(matches!(
        right.kind,
        ExprKind::BinOp {
            op: BinOpKind::And,
            ..
        }
    ));
}

#[test]
fn unary_minus_in_atom_position() {
    // `-x + y` is (-x) + y; `x - y` is binary.
    let e = expr("-x + y");
    let ExprKind::BinOp { op, left, .. } = &e.kind else {
        panic!("expected binop");
    };
    assert_eq!(*op, BinOpKind::Add);
    assert!(matches!(
        left.kind,
        ExprKind::UnaryOp {
            op: UnaryOpKind::Neg,
            ..
        }
    ));

    assert!(matches!(
        expr("x - y").kind,
        ExprKind::BinOp {
            op: BinOpKind::Sub,
            ..
        }
    ));
}

// ── Application ────────────────────────────────────────────────────────

#[test]
fn juxtaposed_application_is_curried() {
    // f x y = App(App(f, [x]), [y]).
    let e = expr("f x y");
    let ExprKind::App { func, args } = &e.kind else {
        panic!("expected app");
    };
    assert_eq!(args.len(), 1);
    assert!(matches!(args[0].kind, ExprKind::Var(ref n) if n == "y"));
    let ExprKind::App { func, args } = &func.kind else {
        panic!("expected inner app");
    };
    assert_eq!(args.len(), 1);
    assert!(matches!(args[0].kind, ExprKind::Var(ref n) if n == "x"));
    assert!(matches!(func.kind, ExprKind::Var(ref n) if n == "f"));
}

#[test]
fn parenthesised_arguments_curry_identically() {
    // `f(x, y)` and `f x y` produce the same curried shape.
    fn shape(e: &pfn_parser::ast::Expr) -> String {
        match &e.kind {
            ExprKind::Var(name) => name.clone(),
            ExprKind::App { func, args } => {
                format!("({} {})", shape(func), shape(&args[0]))
            }
            other => panic!("unexpected node {other:?}"),
        }
    }
    assert_eq!(shape(&expr("f(x, y)")), "((f x) y)");
    assert_eq!(shape(&expr("f x y")), "((f x) y)");
}

#[test]
fn application_stops_before_next_binding() {
    // The parenthesised group before `=` belongs to the next binding,
    // not to `f` as an argument.
    let e = expr("let g = f let (a, b) = pair in a");
    let ExprKind::Let { name, value, body } = &e.kind else {
        panic!("expected let");
    };
    assert_eq!(name, "g");
    assert!(matches!(value.kind, ExprKind::Var(ref n) if n == "f"));
    assert!(matches!(body.kind, ExprKind::LetPattern { .. }));
}

#[test]
fn field_and_index_postfix() {
    let e = expr("user.name");
    assert!(matches!(e.kind, ExprKind::FieldAccess { ref field, .. } if field == "name"));

    let e = expr("xs[0]");
    assert!(matches!(e.kind, ExprKind::IndexAccess { .. }));

    // A detached bracket is a list-literal argument, not an index.
    let e = expr("f [1]");
    assert!(matches!(e.kind, ExprKind::App { .. }));
}

#[test]
fn slice_forms() {
    assert!(matches!(
        expr("xs[1:3]").kind,
        ExprKind::Slice {
            start: Some(_),
            end: Some(_),
            step: None,
            ..
        }
    ));
    assert!(matches!(
        expr("xs[:3]").kind,
        ExprKind::Slice { start: None, .. }
    ));
    assert!(matches!(
        expr("xs[1:10:2]").kind,
        ExprKind::Slice { step: Some(_), .. }
    ));
}

// ── Bindings ───────────────────────────────────────────────────────────

#[test]
fn let_function_sugar() {
    // `let f x = v` collects params into a LetFunc.
    let e = expr("let twice x = x * 2 in twice 4");
    let ExprKind::LetFunc { name, params, .. } = &e.kind else {
        panic!("expected let func");
    };
    assert_eq!(name, "twice");
    assert_eq!(params.len(), 1);
}

#[test]
fn let_without_in() {
    // `in` is optional; a sequence of bindings shares the final body.
    let e = expr("let x = 1 let y = 2 in x + y");
    let ExprKind::Let { name, body, .. } = &e.kind else {
        panic!("expected let");
    };
    assert_eq!(name, "x");
    assert!(matches!(body.kind, ExprKind::Let { .. }));
}

#[test]
fn let_pattern_binding() {
    let e = expr("let (a, b) = pair in a + b");
    let ExprKind::LetPattern { pattern, .. } = &e.kind else {
        panic!("expected let pattern");
    };
    assert!(matches!(pattern.kind, PatternKind::Tuple(_)));
}

#[test]
fn do_notation() {
    let e = expr("do x <- f 1 y <- g x in x + y");
    let ExprKind::DoNotation { bindings, .. } = &e.kind else {
        panic!("expected do");
    };
    assert_eq!(bindings.len(), 2);
    assert_eq!(bindings[0].name, "x");
    assert_eq!(bindings[1].name, "y");
}

// ── Lambdas ────────────────────────────────────────────────────────────

#[test]
fn fn_lambda_and_backslash_lambda() {
    let e = expr("fn x y => x + y");
    let ExprKind::Lambda { params, .. } = &e.kind else {
        panic!("expected lambda");
    };
    assert_eq!(params.len(), 2);

    let e = expr(r"\x -> x");
    assert!(matches!(e.kind, ExprKind::Lambda { ref params, .. } if params.len() == 1));
}

// ── Match ──────────────────────────────────────────────────────────────

#[test]
fn match_with_guards_and_pipes() {
    let e = expr("match n with | 0 -> \"zero\" | x if x > 0 -> \"pos\" | _ -> \"neg\"");
    let ExprKind::Match { cases, .. } = &e.kind else {
        panic!("expected match");
    };
    assert_eq!(cases.len(), 3);
    assert!(cases[0].guard.is_none());
    assert!(cases[1].guard.is_some());
    assert!(matches!(cases[2].pattern.kind, PatternKind::Wildcard));
}

#[test]
fn match_case_without_leading_pipe() {
    // A fresh pattern followed by `->` continues the match.
    let e = expr("match n with | 0 -> 1 _ -> 2");
    let ExprKind::Match { cases, .. } = &e.kind else {
        panic!("expected match");
    };
    assert_eq!(cases.len(), 2);
}

#[test]
fn match_stops_at_non_case_material() {
    let module = parse_source(
        "def f n = match n with | 0 -> 1 | _ -> 2\n\
         def g = 3",
    );
    assert_eq!(module.declarations.len(), 2);
}

#[test]
fn constructor_patterns() {
    let e = expr("match opt with | Some x -> x | None -> 0");
    let ExprKind::Match { cases, .. } = &e.kind else {
        panic!("expected match");
    };
    assert!(matches!(
        &cases[0].pattern.kind,
        PatternKind::Constructor { name, args } if name == "Some" && args.len() == 1
    ));
    assert!(matches!(
        &cases[1].pattern.kind,
        PatternKind::Constructor { name, args } if name == "None" && args.is_empty()
    ));
}

#[test]
fn cons_pattern_is_right_associative() {
    let e = expr("match xs with | a :: b :: rest -> a | _ -> 0");
    let ExprKind::Match { cases, .. } = &e.kind else {
        panic!("expected match");
    };
    let PatternKind::Cons { tail, .. } = &cases[0].pattern.kind else {
        panic!("expected cons");
    };
    assert!(matches!(tail.kind, PatternKind::Cons { .. }));
}

#[test]
fn list_pattern_with_rest() {
    let e = expr("match xs with | [a, b | rest] -> a | _ -> 0");
    let ExprKind::Match { cases, .. } = &e.kind else {
        panic!("expected match");
    };
    assert!(matches!(
        &cases[0].pattern.kind,
        PatternKind::List { elements, rest } if elements.len() == 2 && rest.is_some()
    ));
}

// ── Records, handle, perform ───────────────────────────────────────────

#[test]
fn record_literal_and_update() {
    let e = expr("{x: 1, y: 2}");
    assert!(matches!(e.kind, ExprKind::RecordLit(ref fields) if fields.len() == 2));

    let e = expr("{p with x = 3}");
    assert!(matches!(e.kind, ExprKind::RecordUpdate { ref updates, .. } if updates.len() == 1));
}

#[test]
fn handle_expression_forms() {
    let e = expr("handle action with | get resume -> resume 1");
    assert!(matches!(
        e.kind,
        ExprKind::Handle { ref cases, handler_name: None, .. } if cases.len() == 1
    ));

    let e = expr("handle action with counter");
    assert!(matches!(
        e.kind,
        ExprKind::Handle { ref handler_name, .. } if handler_name.as_deref() == Some("counter")
    ));
}

#[test]
fn perform_is_a_soft_keyword() {
    let e = expr("perform State.get(1)");
    assert!(matches!(
        e.kind,
        ExprKind::Perform { ref effect, ref op, ref args }
            if effect == "State" && op == "get" && args.len() == 1
    ));

    // Anywhere else `perform` is an ordinary identifier.
    let e = expr("perform + 1");
    assert!(matches!(
        e.kind,
        ExprKind::BinOp { ref left, .. } if matches!(left.kind, ExprKind::Var(ref n) if n == "perform")
    ));
}

#[test]
fn soft_keywords_usable_as_names() {
    let module = parse_source("def handle x = x\ndef data = 1");
    assert!(matches!(
        &module.declarations[0].kind,
        DeclKind::Def(def) if def.name == "handle"
    ));
    assert!(matches!(
        &module.declarations[1].kind,
        DeclKind::Def(def) if def.name == "data"
    ));
}

// ── Failure semantics ──────────────────────────────────────────────────

#[test]
fn first_error_is_surfaced_with_its_token() {
    let tokens = pfn_lexer::tokenize("def f = if 1 then 2").unwrap();
    let err = parse(tokens).unwrap_err();
    assert!(err.message.contains("Expected 'else'"), "got {}", err.message);
}

#[test]
fn unexpected_top_level_token_fails() {
    let tokens = pfn_lexer::tokenize("42").unwrap();
    assert!(parse(tokens).is_err());
}

#[test]
fn missing_closing_bracket_fails() {
    let tokens = pfn_lexer::tokenize("def f = [1, 2").unwrap();
    let err = parse(tokens).unwrap_err();
    assert!(err.message.contains("Expected ']'"));
}
