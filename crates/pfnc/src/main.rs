//! The Pfn compiler CLI.
//!
//! Subcommands:
//!
//! - `pfnc compile <in> [-o out] [--typecheck] [--dump-ast]` - compile a
//!   `.pfn` file to Python source (stdout unless `-o` is given)
//! - `pfnc run <in> [--typecheck]` - compile and execute through the
//!   host `python3` interpreter
//! - `pfnc check <in>` - typecheck and print the inferred signatures
//!
//! Exit code 0 on success, non-zero on error. Errors print to stderr;
//! signatures and generated code print to stdout.

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};

use pfnc::{compile_source, parse_source, typecheck_source, CompileError};

#[derive(Parser)]
#[command(name = "pfnc", version, about = "The Pfn compiler")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a Pfn file to Python source
    Compile {
        /// Input .pfn file
        input: PathBuf,

        /// Output .py file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Run the type checker before compilation
        #[arg(long)]
        typecheck: bool,

        /// Dump the parsed module as JSON instead of compiling
        #[arg(long = "dump-ast")]
        dump_ast: bool,
    },

    /// Compile and run a Pfn file
    Run {
        /// Input .pfn file
        input: PathBuf,

        /// Run the type checker before running
        #[arg(long)]
        typecheck: bool,
    },

    /// Type check a Pfn file
    Check {
        /// Input .pfn file
        input: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    let code = match cli.command {
        Commands::Compile {
            input,
            output,
            typecheck,
            dump_ast,
        } => compile(&input, output.as_deref(), typecheck, dump_ast),
        Commands::Run { input, typecheck } => run(&input, typecheck),
        Commands::Check { input } => check(&input),
    };
    process::exit(code);
}

fn read_source(input: &Path) -> Result<String, String> {
    std::fs::read_to_string(input)
        .map_err(|e| format!("Failed to read '{}': {e}", input.display()))
}

fn compile(input: &Path, output: Option<&Path>, typecheck: bool, dump_ast: bool) -> i32 {
    let source = match read_source(input) {
        Ok(source) => source,
        Err(message) => {
            eprintln!("error: {message}");
            return 1;
        }
    };

    if dump_ast {
        match parse_source(&source) {
            Ok(module) => {
                let json = serde_json::to_string_pretty(&module)
                    .expect("module AST serializes to JSON");
                println!("{json}");
                return 0;
            }
            Err(err) => {
                report_error(&source, input, &err);
                return 1;
            }
        }
    }

    match compile_source(&source, typecheck) {
        Ok(python) => match output {
            Some(path) => match std::fs::write(path, python) {
                Ok(()) => 0,
                Err(e) => {
                    eprintln!("error: Failed to write '{}': {e}", path.display());
                    1
                }
            },
            None => {
                println!("{python}");
                0
            }
        },
        Err(err) => {
            report_error(&source, input, &err);
            1
        }
    }
}

fn run(input: &Path, typecheck: bool) -> i32 {
    let source = match read_source(input) {
        Ok(source) => source,
        Err(message) => {
            eprintln!("error: {message}");
            return 1;
        }
    };

    let python = match compile_source(&source, typecheck) {
        Ok(python) => python,
        Err(err) => {
            report_error(&source, input, &err);
            return 1;
        }
    };

    // Entry-point shim: call `main` if the module defines one and print
    // a non-None result, as the reference runtime does.
    const RUN_SHIM: &str = r#"
_main = globals().get("main")
if _main is not None:
    _result = _main() if callable(_main) else _main
    if _result is not None:
        print(_result)
"#;
    let script = format!("{python}\n{RUN_SHIM}");

    let status = process::Command::new("python3")
        .arg("-c")
        .arg(&script)
        .status();
    match status {
        Ok(status) if status.success() => 0,
        Ok(status) => status.code().unwrap_or(1),
        Err(e) => {
            eprintln!("error: failed to launch python3: {e}");
            1
        }
    }
}

fn check(input: &Path) -> i32 {
    let source = match read_source(input) {
        Ok(source) => source,
        Err(message) => {
            eprintln!("error: {message}");
            return 1;
        }
    };

    let (ok, message) = typecheck_source(&source);
    if ok {
        println!("{message}");
        0
    } else {
        eprintln!("{message}");
        1
    }
}

/// Render a pipeline error as an ariadne report over the source.
fn report_error(source: &str, path: &Path, error: &CompileError) {
    use ariadne::{Label, Report, ReportKind, Source};

    let span = error.span();
    let start = span.start as usize;
    let end = (span.end as usize).max(start + 1).min(source.len().max(start + 1));
    let _ = Report::<std::ops::Range<usize>>::build(ReportKind::Error, start..end)
        .with_message(error.to_string())
        .with_label(Label::new(start..end).with_message(error.to_string()))
        .finish()
        .eprint(Source::from(source));
    eprintln!("  in {}", path.display());
}
