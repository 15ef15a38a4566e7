//! The code generator core: declaration emission and shared state.
//!
//! Expression lowering lives in [`expr`], pattern compilation in
//! [`pattern`], and type-annotation mapping in [`types`].

mod expr;
mod pattern;
mod types;

use rustc_hash::FxHashMap;

use pfn_parser::ast::{
    Decl, DeclKind, DefDecl, Expr, HandlerCase, ImplDecl, ImportDecl, Module, TypeAliasDecl,
    TypeDecl, TypeRef, TypeRefKind,
};
use pfn_typeck::classes::{build_dictionary, default_context, ClassContext};
use pfn_typeck::ty::Type;

use self::types::type_ref_annotation;

/// Runtime prelude prepended to every emitted module. Provides the
/// record shim, the built-in `Option`/`Result`/`Ordering` constructors
/// (in the same class/union/singleton shape user sum types emit), and
/// the shallow effect entry points the lowered code links against.
const PRELUDE: &str = r#"from dataclasses import dataclass
from typing import Union


class Record:
    def __init__(self, fields):
        self.__dict__.update(fields)

    def keys(self):
        return self.__dict__.keys()

    def __getitem__(self, key):
        return self.__dict__[key]

    def __iter__(self):
        return iter(self.__dict__.items())

    def __eq__(self, other):
        return isinstance(other, Record) and vars(self) == vars(other)

    def __repr__(self):
        fields = ", ".join(f"{k}: {v!r}" for k, v in self.__dict__.items())
        return "{" + fields + "}"


@dataclass
class Some:
    _field0: object


class _None_:
    pass


Option = Union[Some, _None_]

_None_ = _None_()


@dataclass
class Ok:
    _field0: object


@dataclass
class Err:
    _field0: object


Result = Union[Ok, Err]


class LT:
    pass


class EQ:
    pass


class GT:
    pass


Ordering = Union[LT, EQ, GT]

LT = LT()

EQ = EQ()

GT = GT()


_handlers = []


def _handle(body, cases):
    _handlers.append(cases)
    try:
        return body()
    finally:
        _handlers.pop()


def _perform(effect, op, args):
    for cases in reversed(_handlers):
        if op in cases:
            fn = cases[op]
            for arg in args:
                fn = fn(arg)
            return fn
    raise RuntimeError("unhandled effect " + effect + "." + op)"#;

/// Python reserved words (plus the literal singletons). A source name
/// colliding with one is emitted as `_<name>_`.
const PYTHON_RESERVED: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global",
    "if", "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return",
    "try", "while", "with", "yield",
];

/// Rename a source identifier that collides with a host reserved word.
pub(crate) fn python_safe_name(name: &str) -> String {
    if PYTHON_RESERVED.contains(&name) {
        format!("_{name}_")
    } else {
        name.to_string()
    }
}

/// The Pfn code generator.
///
/// Carries a monotonically increasing counter for generated helper
/// variables (`__m0`, `__cell1`, ...) and a scope stack of renames that
/// routes pattern bindings and recursive knots to their generated
/// expressions.
pub struct CodeGenerator {
    fresh_counter: u32,
    /// Scope stack: source name -> generated expression text.
    rename: Vec<FxHashMap<String, String>>,
    /// Class context for dictionary construction on impl declarations.
    class_ctx: ClassContext,
}

impl CodeGenerator {
    pub fn new() -> Self {
        Self {
            fresh_counter: 0,
            rename: Vec::new(),
            class_ctx: default_context(),
        }
    }

    /// Emit a whole module: the runtime prelude, then each declaration
    /// in source order.
    pub fn generate_module(&mut self, module: &Module) -> String {
        let mut parts = vec![PRELUDE.to_string()];
        for decl in &module.declarations {
            let code = self.gen_decl(decl);
            if !code.is_empty() {
                parts.push(code);
            }
        }
        let mut out = parts.join("\n\n");
        out.push('\n');
        out
    }

    /// Emit a single expression.
    pub fn generate(&mut self, expr: &Expr) -> String {
        self.gen_expr(expr)
    }

    // ── Fresh helpers and scopes ───────────────────────────────────────

    /// The next generated helper name with the given stem, e.g. `__m3`.
    pub(crate) fn fresh_name(&mut self, stem: &str) -> String {
        let name = format!("__{stem}{}", self.fresh_counter);
        self.fresh_counter += 1;
        name
    }

    pub(crate) fn push_scope(&mut self, bindings: FxHashMap<String, String>) {
        self.rename.push(bindings);
    }

    pub(crate) fn pop_scope(&mut self) {
        self.rename.pop();
    }

    /// The generated text for a variable: the innermost rename if one is
    /// active, else the (reserved-word-safe) name itself.
    pub(crate) fn lookup_name(&self, name: &str) -> String {
        for scope in self.rename.iter().rev() {
            if let Some(replacement) = scope.get(name) {
                return replacement.clone();
            }
        }
        python_safe_name(name)
    }

    // ── Declarations ───────────────────────────────────────────────────

    fn gen_decl(&mut self, decl: &Decl) -> String {
        match &decl.kind {
            DeclKind::Def(def) => self.gen_def_decl(def),
            DeclKind::Type(ty) => self.gen_type_decl(ty),
            DeclKind::TypeAlias(alias) => self.gen_type_alias(alias),
            DeclKind::Import(import) => gen_import_decl(import),
            DeclKind::Export(export) => {
                let names: Vec<String> = export
                    .names
                    .iter()
                    .map(|n| format!("{:?}", python_safe_name(n)))
                    .collect();
                format!("__all__ = [{}]", names.join(", "))
            }
            // Interfaces and effects are typing-level declarations; the
            // emitted program needs no code for them.
            DeclKind::Interface(_) | DeclKind::Effect(_) => String::new(),
            DeclKind::Impl(impl_decl) => self.gen_impl_decl(impl_decl),
            DeclKind::Handler(handler) => {
                let cases = self.gen_handler_cases(&handler.cases);
                format!("{} = {cases}", python_safe_name(&handler.name))
            }
        }
    }

    /// A function definition. Zero parameters bind the name directly;
    /// one parameter emits a plain `def`; more parameters curry through
    /// a nested lambda chain. Recursive definitions tie the knot through
    /// a one-slot cell.
    fn gen_def_decl(&mut self, def: &DefDecl) -> String {
        let name = python_safe_name(&def.name);
        let recursive = def.body.refers_to(&def.name);

        let code = if recursive {
            let cell = self.fresh_name("cell");
            let mut bindings = FxHashMap::default();
            bindings.insert(def.name.clone(), format!("{cell}[0]"));
            self.push_scope(bindings);
            let value = self.gen_curried_lambda(&def.params, &def.body);
            self.pop_scope();
            format!(
                "{name} = (lambda {cell}: ({cell}.__setitem__(0, ({value})) or {cell}[0]))([None])"
            )
        } else if def.params.is_empty() {
            let body = self.gen_expr(&def.body);
            format!("{name} = {body}")
        } else {
            let body = self.gen_expr(&def.body);
            let first = python_safe_name(&def.params[0].name);
            let mut inner = body;
            for param in def.params[1..].iter().rev() {
                inner = format!("lambda {}: {inner}", python_safe_name(&param.name));
            }
            format!("def {name}({first}): return {inner}")
        };

        if def.is_exported {
            let export_name = def.export_name.clone().unwrap_or_else(|| def.name.clone());
            format!("{code}\n\n{} = {name}", python_safe_name(&export_name))
        } else {
            code
        }
    }

    /// The fully curried lambda chain for a parameter list and body.
    /// Parameters mask any outer rename of the same name (a lambda's own
    /// binder shadows a recursive cell, for instance).
    pub(crate) fn gen_curried_lambda(
        &mut self,
        params: &[pfn_parser::ast::Param],
        body: &Expr,
    ) -> String {
        self.push_mask(params.iter().map(|p| p.name.as_str()));
        let mut code = self.gen_expr(body);
        self.pop_scope();
        for param in params.iter().rev() {
            code = format!("lambda {}: {code}", python_safe_name(&param.name));
        }
        code
    }

    /// Push a scope that maps each name to its own (reserved-word-safe)
    /// spelling, masking outer renames.
    pub(crate) fn push_mask<'a>(&mut self, names: impl Iterator<Item = &'a str>) {
        let bindings: FxHashMap<String, String> = names
            .map(|name| (name.to_string(), python_safe_name(name)))
            .collect();
        self.rename.push(bindings);
    }

    /// A `type` declaration: a dataclass for the record form, one class
    /// per constructor plus a union alias for the sum form. Zero-arg
    /// constructors are rebound to singleton instances after the alias
    /// so pattern checks can use identity.
    fn gen_type_decl(&mut self, decl: &TypeDecl) -> String {
        if decl.is_record {
            let mut lines = vec![
                "@dataclass".to_string(),
                format!("class {}:", python_safe_name(&decl.name)),
            ];
            if decl.record_fields.is_empty() {
                lines.push("    pass".to_string());
            }
            for (field_name, field_ty) in &decl.record_fields {
                lines.push(format!(
                    "    {}: {}",
                    python_safe_name(field_name),
                    type_ref_annotation(field_ty)
                ));
            }
            return lines.join("\n");
        }

        let mut parts = Vec::new();
        let mut singletons = Vec::new();
        for ctor in &decl.constructors {
            let class_name = python_safe_name(&ctor.name);
            // GADT constructors carry their result type as the last
            // field; only the argument fields become class fields.
            let fields: &[TypeRef] = if decl.is_gadt && !ctor.fields.is_empty() {
                &ctor.fields[..ctor.fields.len() - 1]
            } else {
                &ctor.fields
            };

            if fields.is_empty() {
                parts.push(format!("class {class_name}:\n    pass"));
                singletons.push(class_name);
            } else {
                let mut lines = vec!["@dataclass".to_string(), format!("class {class_name}:")];
                for (i, field_ty) in fields.iter().enumerate() {
                    lines.push(format!("    _field{i}: {}", type_ref_annotation(field_ty)));
                }
                parts.push(lines.join("\n"));
            }
        }

        let ctor_names: Vec<String> = decl
            .constructors
            .iter()
            .map(|c| python_safe_name(&c.name))
            .collect();
        parts.push(format!(
            "{} = Union[{}]",
            python_safe_name(&decl.name),
            ctor_names.join(", ")
        ));

        // Rebind zero-arg constructors to singleton instances (after the
        // union alias, which needs the classes themselves).
        for class_name in singletons {
            parts.push(format!("{class_name} = {class_name}()"));
        }

        parts.join("\n\n")
    }

    fn gen_type_alias(&mut self, alias: &TypeAliasDecl) -> String {
        format!(
            "{} = {}",
            python_safe_name(&alias.name),
            type_ref_annotation(&alias.aliased)
        )
    }

    /// An `impl` block lowers to a method dictionary. The class context
    /// merges in class defaults for omitted methods.
    fn gen_impl_decl(&mut self, impl_decl: &ImplDecl) -> String {
        let ty = type_ref_to_type(&impl_decl.type_ref);

        let methods: Vec<(String, String)> = impl_decl
            .methods
            .iter()
            .map(|m| {
                let code = self.gen_curried_lambda(&m.params, &m.body);
                (m.name.clone(), code)
            })
            .collect();

        let method_refs: Vec<(&str, &str)> = methods
            .iter()
            .map(|(n, c)| (n.as_str(), c.as_str()))
            .collect();
        self.class_ctx.add_instance(
            impl_decl.class_name.clone(),
            ty.clone(),
            method_refs,
            vec![],
        );

        let dict = build_dictionary(&self.class_ctx, &impl_decl.class_name, &ty)
            .unwrap_or_default();
        let mut entries: Vec<(String, String)> = dict.into_iter().collect();
        entries.sort();
        let body: Vec<String> = entries
            .iter()
            .map(|(name, code)| format!("{name:?}: {code}"))
            .collect();

        format!(
            "{}_{} = {{{}}}",
            impl_decl.class_name,
            type_dict_suffix(&impl_decl.type_ref),
            body.join(", ")
        )
    }

    /// The `{"op": <curried lambda>, ...}` dictionary for handler cases.
    /// A parameter named `resume` is pre-bound to the identity
    /// continuation; the effect runtime supplies richer resumptions.
    pub(crate) fn gen_handler_cases(&mut self, cases: &[HandlerCase]) -> String {
        let mut entries = Vec::new();
        for case in cases {
            let mut bindings = FxHashMap::default();
            for param in &case.params {
                bindings.insert(param.name.clone(), python_safe_name(&param.name));
            }
            if case.resume_param.is_some() {
                bindings.insert("resume".to_string(), "(lambda __r: __r)".to_string());
            }
            self.push_scope(bindings);
            let body = self.gen_expr(&case.body);
            self.pop_scope();

            let mut code = body;
            for param in case.params.iter().rev() {
                if param.name == "resume" {
                    continue;
                }
                code = format!("lambda {}: {code}", python_safe_name(&param.name));
            }
            entries.push(format!("{:?}: {code}", case.op_name));
        }
        format!("{{{}}}", entries.join(", "))
    }
}

impl Default for CodeGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Imports: host imports verbatim, Pfn-internal imports as star imports.
fn gen_import_decl(import: &ImportDecl) -> String {
    if import.is_python {
        if let Some(exposing) = &import.exposing {
            return format!("from {} import {}", import.module, exposing.join(", "));
        }
        return match &import.alias {
            Some(alias) => format!("import {} as {alias}", import.module),
            None => format!("import {}", import.module),
        };
    }
    format!("from {} import *", import.module)
}

/// Resolve a surface type reference into a semantic type for instance
/// bookkeeping.
fn type_ref_to_type(type_ref: &TypeRef) -> Type {
    match &type_ref.kind {
        TypeRefKind::Simple { name, args } => match (name.as_str(), args.len()) {
            ("Int", 0) => Type::Int,
            ("Float", 0) => Type::Float,
            ("String", 0) => Type::String,
            ("Bool", 0) => Type::Bool,
            ("Char", 0) => Type::Char,
            ("List", 1) => Type::List(Box::new(type_ref_to_type(&args[0]))),
            _ => Type::Con(name.clone(), args.iter().map(type_ref_to_type).collect()),
        },
        TypeRefKind::Fun { param, result } => Type::Fun(
            Box::new(type_ref_to_type(param)),
            Box::new(type_ref_to_type(result)),
        ),
        TypeRefKind::Tuple(elements) => {
            if elements.is_empty() {
                Type::Unit
            } else {
                Type::Tuple(elements.iter().map(type_ref_to_type).collect())
            }
        }
        TypeRefKind::Record(fields) => Type::Record(
            fields
                .iter()
                .map(|(n, t)| (n.clone(), type_ref_to_type(t)))
                .collect(),
        ),
    }
}

/// A flat identifier suffix naming the impl'd type: `List_Int`, `Shape`.
fn type_dict_suffix(type_ref: &TypeRef) -> String {
    match &type_ref.kind {
        TypeRefKind::Simple { name, args } => {
            let mut parts = vec![name.clone()];
            parts.extend(args.iter().map(type_dict_suffix));
            parts.join("_")
        }
        TypeRefKind::Fun { .. } => "Fun".to_string(),
        TypeRefKind::Tuple(_) => "Tuple".to_string(),
        TypeRefKind::Record(_) => "Record".to_string(),
    }
}
