//! Integration tests for the code generator: the emission contract,
//! the lowering table, and determinism.

use pfn_codegen::{generate_expr, generate_module};

fn module(source: &str) -> pfn_parser::ast::Module {
    let tokens = pfn_lexer::tokenize(source).unwrap();
    pfn_parser::parse(tokens).unwrap()
}

fn expr(source: &str) -> pfn_parser::ast::Expr {
    let tokens = pfn_lexer::tokenize(source).unwrap();
    pfn_parser::parse_expr(tokens).unwrap()
}

// ── Definitions ────────────────────────────────────────────────────────

#[test]
fn two_param_def_curries() {
    // Scenario: a one-arg function returning a one-arg lambda whose
    // body is `x + y`.
    let code = generate_module(&module("def add x y = x + y"));
    assert!(
        code.contains("def add(x): return lambda y: x + y"),
        "got:\n{code}"
    );
}

#[test]
fn zero_param_def_binds_value() {
    let code = generate_module(&module("def answer = 42"));
    assert!(code.contains("answer = 42"));
}

#[test]
fn one_param_def_is_a_plain_function() {
    let code = generate_module(&module("def double x = x * 2"));
    assert!(code.contains("def double(x): return x * 2"));
}

#[test]
fn recursive_def_emits_knot_tying_cell() {
    // Scenario: factorial must go through the one-slot cell.
    let code = generate_module(&module(
        "def fact n = if n == 0 then 1 else n * fact (n - 1)",
    ));
    assert!(code.contains("__cell0.__setitem__(0,"), "got:\n{code}");
    assert!(code.contains("__cell0[0](n - 1)"), "got:\n{code}");
    assert!(code.contains("([None])"));
}

#[test]
fn exported_def_gets_alias_binding() {
    let code = generate_module(&module("@py.export(\"entry\")\ndef main = 0"));
    assert!(code.contains("main = 0"));
    assert!(code.contains("entry = main"));
}

#[test]
fn reserved_word_names_are_renamed() {
    let code = generate_module(&module("def class x = x"));
    assert!(code.contains("def _class_(x): return x"));
}

// ── Types ──────────────────────────────────────────────────────────────

#[test]
fn sum_type_emits_classes_union_and_singletons() {
    // Scenario: Some with _field0, a singleton for the nullary
    // constructor, and the union alias.
    let code = generate_module(&module("type Option2 a | Some2 a | None2"));
    assert!(code.contains("@dataclass\nclass Some2:\n    _field0:"));
    assert!(code.contains("class None2:\n    pass"));
    assert!(code.contains("Option2 = Union[Some2, None2]"));
    assert!(code.contains("None2 = None2()"));

    // The alias must precede the singleton rebinding.
    let alias_at = code.find("Option2 = Union").unwrap();
    let singleton_at = code.find("None2 = None2()").unwrap();
    assert!(alias_at < singleton_at);
}

#[test]
fn record_type_emits_dataclass() {
    let code = generate_module(&module("type Point = {x: Float, y: Float}"));
    assert!(code.contains("@dataclass\nclass Point:\n    x: float\n    y: float"));
}

#[test]
fn type_alias_maps_to_host_type() {
    let code = generate_module(&module("type Name = String"));
    assert!(code.contains("Name = str"));
}

// ── Imports and exports ────────────────────────────────────────────────

#[test]
fn import_forms() {
    let code = generate_module(&module(
        "import python numpy as np\n\
         import Geo.Shapes",
    ));
    assert!(code.contains("import numpy as np"));
    assert!(code.contains("from Geo.Shapes import *"));
}

#[test]
fn export_decl_sets_all() {
    let code = generate_module(&module("export area, volume"));
    assert!(code.contains("__all__ = [\"area\", \"volume\"]"));
}

// ── Expression lowering ────────────────────────────────────────────────

#[test]
fn literal_lowering() {
    assert_eq!(generate_expr(&expr("42")), "42");
    assert_eq!(generate_expr(&expr("3.0")), "3.0");
    assert_eq!(generate_expr(&expr("True")), "True");
    assert_eq!(generate_expr(&expr("()")), "None");
    assert_eq!(generate_expr(&expr("\"hi\\n\"")), "\"hi\\n\"");
}

#[test]
fn operator_lowering() {
    assert_eq!(generate_expr(&expr("1 :: [2]")), "[1] + [2]");
    assert_eq!(generate_expr(&expr("[1] ++ [2]")), "[1] + [2]");
    assert_eq!(generate_expr(&expr("a && b")), "a and b");
    assert_eq!(generate_expr(&expr("a || b")), "a or b");
    assert_eq!(generate_expr(&expr("!a")), "not a");
    assert_eq!(generate_expr(&expr("-a + b")), "(-a) + b");
    assert_eq!(generate_expr(&expr("1 + 2 * 3")), "1 + (2 * 3)");
}

#[test]
fn lambda_lowering_chains() {
    assert_eq!(
        generate_expr(&expr("fn x y => x + y")),
        "lambda x: lambda y: x + y"
    );
}

#[test]
fn application_is_single_argument_calls() {
    assert_eq!(generate_expr(&expr("f x y")), "f(x)(y)");
    assert_eq!(generate_expr(&expr("(fn x => x) 1")), "(lambda x: x)(1)");
}

#[test]
fn let_lowering_is_an_iife() {
    assert_eq!(
        generate_expr(&expr("let x = 1 in x + 2")),
        "(lambda x: x + 2)(1)"
    );
}

#[test]
fn if_lowering_is_conditional_expression() {
    assert_eq!(generate_expr(&expr("if c then 1 else 2")), "1 if c else 2");
}

#[test]
fn match_chain_shape() {
    // Scenario: the empty-list/cons chain over a fresh scrutinee var.
    let code = generate_expr(&expr("match xs with | [] -> 0 | x :: _ -> x"));
    assert_eq!(
        code,
        "(lambda __m0: (0 if __m0 == [] else (__m0[0] if isinstance(__m0, list) and len(__m0) > 0 else None)))(xs)"
    );
}

#[test]
fn match_guard_joins_check() {
    let code = generate_expr(&expr("match n with | x if x > 0 -> x | _ -> 0"));
    assert!(code.contains("if (__m0 > 0) else"), "got {code}");
}

#[test]
fn match_bindings_use_subterm_paths() {
    let code = generate_expr(&expr("match p with | (a, b) -> a + b"));
    assert!(code.contains("__m0[0] + __m0[1]"), "got {code}");
}

#[test]
fn nested_matches_get_distinct_scrutinee_vars() {
    let code = generate_expr(&expr(
        "match a with | 1 -> match b with | 2 -> 3 | _ -> 4 | _ -> 5",
    ));
    assert!(code.contains("__m0") && code.contains("__m1"), "got {code}");
}

#[test]
fn recursive_let_func_in_expression_position() {
    let code = generate_expr(&expr(
        "let go n = if n == 0 then 0 else go (n - 1) in go 3",
    ));
    assert!(code.contains("__cell0.__setitem__(0,"), "got {code}");
    assert!(code.contains("or __cell0[0](3)"), "got {code}");
}

#[test]
fn non_recursive_let_func_is_plain_iife() {
    assert_eq!(
        generate_expr(&expr("let twice x = x * 2 in twice 4")),
        "(lambda twice: twice(4))(lambda x: x * 2)"
    );
}

#[test]
fn shadowing_inside_knot_scope_is_respected() {
    // The lambda's own `f` shadows the recursive binding; only the
    // outer reference goes through the cell.
    let code = generate_expr(&expr("let f x = g (fn f => f x) (f x) in f 1"));
    assert!(code.contains("lambda f: f(x)"), "got {code}");
    assert!(code.contains("__cell0[0](x)"), "got {code}");
}

#[test]
fn do_notation_chains_right_to_left() {
    assert_eq!(
        generate_expr(&expr("do x <- 1 y <- 2 in x + y")),
        "(lambda x: (lambda y: x + y)(2))(1)"
    );
}

#[test]
fn records_and_updates_use_the_shim() {
    assert_eq!(
        generate_expr(&expr("{x: 1, y: 2}")),
        "Record({\"x\": 1, \"y\": 2})"
    );
    assert_eq!(
        generate_expr(&expr("{p with x = 3}")),
        "Record({**p, \"x\": 3})"
    );
    assert_eq!(generate_expr(&expr("p.x")), "p.x");
}

#[test]
fn slices_and_indexing() {
    assert_eq!(generate_expr(&expr("xs[0]")), "xs[0]");
    assert_eq!(generate_expr(&expr("xs[1:3]")), "xs[1:3]");
    assert_eq!(generate_expr(&expr("xs[::2]")), "xs[::2]");
}

#[test]
fn handle_and_perform_lower_to_runtime_calls() {
    assert_eq!(
        generate_expr(&expr("perform State.get(1)")),
        "_perform(\"State\", \"get\", [1])"
    );
    let code = generate_expr(&expr("handle body with | get resume -> resume 1"));
    assert!(code.starts_with("_handle(lambda: body, {\"get\":"), "got {code}");
}

#[test]
fn builtin_result_patterns_reference_prelude_classes() {
    let code = generate_module(&module(
        "def fallback r = match r with | Ok x -> x | Err e -> 0",
    ));
    // The prelude defines the built-in constructors the checks refer to.
    assert!(code.contains("class Ok:"), "got:\n{code}");
    assert!(code.contains("class Err:"), "got:\n{code}");
    assert!(code.contains("isinstance(__m0, Ok)"), "got:\n{code}");
    assert!(code.contains("isinstance(__m0, Err)"), "got:\n{code}");
}

// ── Impl dictionaries ──────────────────────────────────────────────────

#[test]
fn impl_emits_method_dictionary() {
    let code = generate_module(&module(
        "impl Show Bool where { show b = if b then \"True\" else \"False\" }",
    ));
    assert!(code.contains("Show_Bool = {\"show\": lambda b:"), "got:\n{code}");
}

// ── Determinism ────────────────────────────────────────────────────────

#[test]
fn generation_is_deterministic() {
    let source = "type Shape | Circle Float | Point\n\
                  def area s = match s with | Circle r -> r * r | Point -> 0.0\n\
                  def main = area (Circle 2.0)";
    let first = generate_module(&module(source));
    let second = generate_module(&module(source));
    assert_eq!(first, second);
}

#[test]
fn module_snapshot() {
    let source = "type Shape | Circle Float | Point\n\
                  def area s = match s with | Circle r -> r * r | Point -> 0.0\n\
                  @py.export(\"shape_area\")\n\
                  def main = area (Circle 2.0)";
    insta::assert_snapshot!(generate_module(&module(source)));
}
