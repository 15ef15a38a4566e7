//! End-to-end pipeline tests: source files in, Python files out.

use std::fs;

use pfnc::{compile_source, typecheck_source};

const SHAPES: &str = "type Shape | Circle Float | Point\n\
                      def area s = match s with | Circle r -> r * r | Point -> 0.0\n\
                      def main = area (Circle 2.0)";

#[test]
fn compile_to_output_file() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("shapes.pfn");
    let output = dir.path().join("shapes.py");
    fs::write(&input, SHAPES).unwrap();

    let source = fs::read_to_string(&input).unwrap();
    let python = compile_source(&source, true).unwrap();
    fs::write(&output, &python).unwrap();

    let written = fs::read_to_string(&output).unwrap();
    assert_eq!(written, python);
    assert!(written.contains("def area(s):"));
    assert!(written.contains("class Circle:"));
}

#[test]
fn check_prints_signatures_in_order() {
    let (ok, message) = typecheck_source(SHAPES);
    assert!(ok, "{message}");
    let lines: Vec<&str> = message.lines().collect();
    assert_eq!(lines[0], "area : Shape -> Float");
    assert_eq!(lines[1], "main : Float");
}

#[test]
fn type_errors_fail_the_pipeline() {
    let bad = "def area s = match s with | 1 -> \"one\" | _ -> 2";
    let (ok, message) = typecheck_source(bad);
    assert!(!ok);
    assert!(message.starts_with("Type error: "));

    // Without --typecheck, codegen still runs: the error is a typing
    // matter, not a syntactic one.
    assert!(compile_source(bad, false).is_ok());
}

#[test]
fn generated_program_is_loadable_python() {
    // Sanity-check the emitted module's surface: balanced delimiters
    // and no leaking internal placeholders.
    let python = compile_source(SHAPES, true).unwrap();
    let opens = python.matches('(').count();
    let closes = python.matches(')').count();
    assert_eq!(opens, closes);
    assert!(!python.contains("%sk"));
}

#[test]
fn knot_tied_factorial_end_to_end() {
    let source = "def fact n = if n == 0 then 1 else n * fact (n - 1)\n\
                  def main = fact 5";
    let python = compile_source(source, true).unwrap();
    assert!(python.contains("__cell0"));
    assert!(python.contains("main = fact(5)"));

    // If a python3 interpreter is available, the program must print
    // nothing on import and compute 120 through main.
    if let Ok(status) = std::process::Command::new("python3")
        .arg("-c")
        .arg(format!("{python}\nassert fact(5) == 120, fact(5)"))
        .status()
    {
        assert!(status.success(), "generated factorial did not compute 120");
    }
}
