//! Algorithm W inference with let-generalization.
//!
//! Bottom-up inference returning `(substitution, type)` pairs, threading
//! the substitution left to right. The checker owns a mutable fresh
//! counter and the current environment; previously produced schemes are
//! never mutated. Generalization is value-restricted and orders
//! quantified variables lexicographically.

use std::collections::BTreeSet;

use rustc_hash::FxHashMap;

use pfn_common::span::Span;
use pfn_parser::ast::{
    Decl, DeclKind, DefDecl, Expr, ExprKind, Module, Pattern, PatternKind, TypeRef, TypeRefKind,
};

use crate::classes::{check_constraint, default_context, ClassContext};
use crate::effects::{EffectInferer, EffectSet};
use crate::env::TypeEnv;
use crate::error::TypeError;
use crate::exhaustiveness::{check_match_exhaustiveness, pattern_to_string, SumTypeRegistry};
use crate::subst::Subst;
use crate::ty::{Constraint, Scheme, Type};

/// Prefix of skolem constants. Outside the identifier grammar, so user
/// programs can never collide with it.
const SKOLEM_PREFIX: &str = "%sk";

/// The result of checking a module: every top-level definition's scheme,
/// in source order, plus warning-class diagnostics.
#[derive(Debug, Clone)]
pub struct ModuleTypes {
    pub schemes: Vec<(String, Scheme)>,
    pub warnings: Vec<TypeError>,
}

/// The Pfn type checker.
pub struct TypeChecker {
    /// The current environment. Swapped in and out during traversal;
    /// schemes inside are never mutated.
    pub env: TypeEnv,
    pub class_ctx: ClassContext,
    /// Declared sum types, for exhaustiveness completion.
    pub sum_types: SumTypeRegistry,
    /// Constructor name -> owning type name.
    ctor_owner: FxHashMap<String, String>,
    /// Type aliases: name -> (params, aliased type).
    aliases: FxHashMap<String, (Vec<String>, Type)>,
    effects: EffectInferer,
    var_counter: u32,
    skolem_counter: u32,
    /// Class constraints accumulated while inferring the current
    /// definition.
    constraints: Vec<Constraint>,
    /// Warning-class diagnostics (redundant match cases).
    pub warnings: Vec<TypeError>,
}

impl TypeChecker {
    pub fn new() -> Self {
        let mut checker = TypeChecker {
            env: TypeEnv::new(),
            class_ctx: default_context(),
            sum_types: SumTypeRegistry::default(),
            ctor_owner: FxHashMap::default(),
            aliases: FxHashMap::default(),
            effects: EffectInferer::new(),
            var_counter: 0,
            skolem_counter: 0,
            constraints: Vec::new(),
            warnings: Vec::new(),
        };
        checker.register_builtin_constructors();
        checker.register_class_methods();
        checker
    }

    // ── Setup ──────────────────────────────────────────────────────────

    /// Register `Option`/`Result`/`Ordering` constructors.
    fn register_builtin_constructors(&mut self) {
        let a = || Type::Var("a".to_string());
        let e = || Type::Var("e".to_string());

        let option = Type::Con("Option".into(), vec![a()]);
        self.bind_constructor("Some", vec!["a".into()], Type::fun(vec![a()], option.clone()));
        self.bind_constructor("None", vec!["a".into()], option);

        let result = Type::Con("Result".into(), vec![e(), a()]);
        self.bind_constructor(
            "Ok",
            vec!["a".into(), "e".into()],
            Type::fun(vec![a()], result.clone()),
        );
        self.bind_constructor(
            "Err",
            vec!["a".into(), "e".into()],
            Type::fun(vec![e()], result),
        );

        let ordering = Type::con("Ordering");
        for name in ["LT", "EQ", "GT"] {
            self.bind_constructor(name, vec![], ordering.clone());
        }

        self.ctor_owner.insert("Some".into(), "Option".into());
        self.ctor_owner.insert("None".into(), "Option".into());
        self.ctor_owner.insert("Ok".into(), "Result".into());
        self.ctor_owner.insert("Err".into(), "Result".into());
        for name in ["LT", "EQ", "GT"] {
            self.ctor_owner.insert(name.into(), "Ordering".into());
        }
    }

    fn bind_constructor(&mut self, name: &str, vars: Vec<String>, ty: Type) {
        self.env = self.env.extend(name, Scheme::poly(vars, ty));
    }

    /// Bind every prelude class method as a qualified scheme, e.g.
    /// `show : forall a. Show a => a -> String`.
    fn register_class_methods(&mut self) {
        let mut bindings: Vec<(String, Scheme)> = Vec::new();
        for class_name in [
            "Eq",
            "Ord",
            "Show",
            "Read",
            "Num",
            "Fractional",
            "Functor",
            "Applicative",
            "Monad",
            "Foldable",
            "Traversable",
            "Semigroup",
            "Monoid",
        ] {
            let Some(class) = self.class_ctx.lookup_class(class_name) else {
                continue;
            };
            for (method, ty) in &class.methods {
                let vars: Vec<String> = ty.free_vars().into_iter().collect();
                let constraints = class
                    .params
                    .iter()
                    .map(|p| Constraint::new(class.name.clone(), Type::Var(p.clone())))
                    .collect();
                bindings.push((
                    method.clone(),
                    Scheme {
                        vars,
                        ty: ty.clone(),
                        constraints,
                    },
                ));
            }
        }
        // Deterministic insertion order for shadowed duplicates.
        bindings.sort_by(|(a, _), (b, _)| a.cmp(b));
        for (name, scheme) in bindings {
            self.env = self.env.extend(name, scheme);
        }
    }

    // ── Fresh variables and schemes ────────────────────────────────────

    /// A fresh type variable: `t0`, `t1`, ...
    pub fn fresh(&mut self) -> Type {
        let name = format!("t{}", self.var_counter);
        self.var_counter += 1;
        Type::Var(name)
    }

    /// A fresh skolem constant, opaque to unification.
    pub fn fresh_skolem(&mut self) -> Type {
        let name = format!("{SKOLEM_PREFIX}{}", self.skolem_counter);
        self.skolem_counter += 1;
        Type::Con(name, Vec::new())
    }

    /// Instantiate a scheme with fresh variables, queueing its
    /// constraints for the current definition.
    pub fn instantiate(&mut self, scheme: &Scheme) -> Type {
        if scheme.vars.is_empty() {
            for c in &scheme.constraints {
                self.constraints.push(c.clone());
            }
            return scheme.ty.clone();
        }
        let mut subst = Subst::new();
        for var in &scheme.vars {
            let fresh = self.fresh();
            subst.mapping.insert(var.clone(), fresh);
        }
        for c in &scheme.constraints {
            self.constraints
                .push(Constraint::new(c.class_name.clone(), subst.apply(&c.ty)));
        }
        subst.apply(&scheme.ty)
    }

    /// Generalize a type over the variables free in it but not in the
    /// environment. Quantified variables come out lexicographically
    /// ordered; constraints mentioning them move into the scheme.
    pub fn generalize(&mut self, env: &TypeEnv, ty: &Type) -> Scheme {
        let env_vars = env.free_vars();
        let ty_vars = ty.free_vars();
        let gen_vars: Vec<String> = ty_vars.difference(&env_vars).cloned().collect();

        let gen_set: BTreeSet<&String> = gen_vars.iter().collect();
        let constraints: Vec<Constraint> = self
            .constraints
            .iter()
            .filter(|c| c.ty.free_vars().iter().any(|v| gen_set.contains(v)))
            .cloned()
            .collect();

        Scheme {
            vars: gen_vars,
            ty: ty.clone(),
            constraints,
        }
    }

    // ── Entry points ───────────────────────────────────────────────────

    /// Infer the principal type of an expression in the current
    /// environment.
    pub fn infer(&mut self, expr: &Expr) -> Result<Type, TypeError> {
        let (subst, ty) = self.infer_expr(expr, &Subst::new())?;
        Ok(subst.apply(&ty))
    }

    /// Infer a type together with the expression's effect set. Results
    /// carrying IO atoms are wrapped in `IO τ`.
    pub fn infer_with_effects(&mut self, expr: &Expr) -> Result<(Type, EffectSet), TypeError> {
        let ty = self.infer(expr)?;
        let effects = self.effects.infer(expr);
        let ty = if effects.contains_io() {
            Type::Con("IO".into(), vec![ty])
        } else {
            ty
        };
        Ok((ty, effects))
    }

    /// Check a whole module, returning each definition's scheme in
    /// source order.
    pub fn check_module(&mut self, module: &Module) -> Result<ModuleTypes, TypeError> {
        let mut schemes = Vec::new();
        for decl in &module.declarations {
            if let Some((name, scheme)) = self.check_decl(decl)? {
                schemes.push((name, scheme));
            }
        }
        Ok(ModuleTypes {
            schemes,
            warnings: self.warnings.clone(),
        })
    }

    // ── Declarations ───────────────────────────────────────────────────

    fn check_decl(&mut self, decl: &Decl) -> Result<Option<(String, Scheme)>, TypeError> {
        match &decl.kind {
            DeclKind::Def(def) => {
                let scheme = self.check_def(def, decl.span)?;
                Ok(Some((def.name.clone(), scheme)))
            }
            DeclKind::Type(ty_decl) => {
                self.register_type_decl(ty_decl)?;
                Ok(None)
            }
            DeclKind::TypeAlias(alias) => {
                let resolved = self.resolve_type_ref(&alias.aliased)?;
                self.aliases
                    .insert(alias.name.clone(), (alias.params.clone(), resolved));
                Ok(None)
            }
            DeclKind::Import(import) => {
                // Imported modules are dynamically typed on the host
                // side; bind the accessible name to a fresh variable.
                let bound = import
                    .alias
                    .clone()
                    .unwrap_or_else(|| {
                        import
                            .module
                            .split('.')
                            .next_back()
                            .unwrap_or(&import.module)
                            .to_string()
                    });
                let fresh = self.fresh();
                self.env = self.env.extend(bound, Scheme::mono(fresh));
                if let Some(exposing) = &import.exposing {
                    for name in exposing {
                        let fresh = self.fresh();
                        self.env = self.env.extend(name.clone(), Scheme::mono(fresh));
                    }
                }
                Ok(None)
            }
            DeclKind::Export(_) => Ok(None),
            DeclKind::Interface(interface) => {
                self.register_interface(interface)?;
                Ok(None)
            }
            DeclKind::Impl(impl_decl) => {
                self.register_impl(impl_decl)?;
                Ok(None)
            }
            DeclKind::Effect(effect) => {
                self.effects.register_effect(
                    effect.name.clone(),
                    effect.operations.iter().map(|op| op.name.clone()).collect(),
                );
                Ok(None)
            }
            DeclKind::Handler(handler) => {
                // Handler case bodies must themselves typecheck.
                for case in &handler.cases {
                    let saved = self.env.clone();
                    for param in &case.params {
                        let fresh = self.fresh();
                        self.env = self.env.extend(&param.name, Scheme::mono(fresh));
                    }
                    let result = self.infer(&case.body);
                    self.env = saved;
                    result?;
                }
                Ok(None)
            }
        }
    }

    /// Check a top-level definition: pre-bind its own name for
    /// recursion, skolemize annotation variables, infer, unify, solve
    /// class constraints, and generalize against the global environment.
    fn check_def(&mut self, def: &DefDecl, span: Span) -> Result<Scheme, TypeError> {
        self.constraints.clear();
        let outer_env = self.env.clone();

        // Shared scope for annotation type variables across params and
        // return type: each becomes one skolem constant.
        let mut annot_skolems: FxHashMap<String, Type> = FxHashMap::default();

        let fn_var = self.fresh();
        let mut inner_env = self.env.extend(&def.name, Scheme::mono(fn_var.clone()));

        let mut param_types = Vec::new();
        for param in &def.params {
            let ty = match &param.type_annotation {
                Some(annot) => {
                    let resolved = self.resolve_type_ref(annot)?;
                    self.skolemize_annotation(&resolved, &mut annot_skolems)
                }
                None => self.fresh(),
            };
            inner_env = inner_env.extend(&param.name, Scheme::mono(ty.clone()));
            param_types.push(ty);
        }

        let saved = std::mem::replace(&mut self.env, inner_env);
        let result = self.infer_expr(&def.body, &Subst::new());
        self.env = saved;
        let (mut subst, body_ty) = result?;

        if let Some(ret_annot) = &def.return_type {
            let resolved = self.resolve_type_ref(ret_annot)?;
            let expected = self.skolemize_annotation(&resolved, &mut annot_skolems);
            subst = self.unify_at(&subst, &body_ty, &expected, span)?;
        }

        let applied_params: Vec<Type> = param_types.iter().map(|t| subst.apply(t)).collect();
        let fun_ty = Type::fun(applied_params, subst.apply(&body_ty));
        subst = self.unify_at(&subst, &fun_ty, &fn_var, span)?;

        let final_ty = unskolemize(&subst.apply(&fun_ty), &annot_skolems);

        // Resolve accumulated class constraints; constraints over
        // still-generalizable variables are deferred into the scheme.
        self.constraints = self
            .constraints
            .iter()
            .map(|c| Constraint::new(c.class_name.clone(), subst.apply(&c.ty)))
            .collect();
        for c in &self.constraints {
            if !check_constraint(&self.class_ctx, c, &Subst::new()) {
                return Err(TypeError::UnsatisfiedConstraint {
                    class_name: c.class_name.clone(),
                    ty: c.ty.clone(),
                    span,
                });
            }
        }

        let generalizable = !def.params.is_empty() || is_syntactic_value(&def.body);
        let scheme = if generalizable {
            self.generalize(&outer_env, &final_ty)
        } else {
            Scheme::mono(final_ty)
        };

        self.env = outer_env.extend(&def.name, scheme.clone());
        Ok(scheme)
    }

    /// Register a `type` declaration's constructors (sum, record, or
    /// GADT form).
    fn register_type_decl(
        &mut self,
        decl: &pfn_parser::ast::TypeDecl,
    ) -> Result<(), TypeError> {
        let param_vars: Vec<Type> = decl.params.iter().map(|p| Type::Var(p.clone())).collect();
        let result_ty = Type::Con(decl.name.clone(), param_vars);
        let mut scheme_vars: Vec<String> = decl.params.clone();
        scheme_vars.sort();

        if decl.is_record {
            let mut fields = Vec::new();
            for (field_name, field_ref) in &decl.record_fields {
                fields.push((field_name.clone(), self.resolve_type_ref(field_ref)?));
            }
            // The record's constructor takes its fields in declaration
            // order.
            let field_types: Vec<Type> = fields.iter().map(|(_, t)| t.clone()).collect();
            let ctor_ty = Type::fun(field_types, result_ty);
            let name = decl.name.clone();
            self.bind_constructor(&name, scheme_vars, ctor_ty);
            return Ok(());
        }

        let mut ctors = Vec::new();
        for ctor in &decl.constructors {
            let mut fields = Vec::new();
            for field_ref in &ctor.fields {
                fields.push(self.resolve_type_ref(field_ref)?);
            }

            let ctor_ty = if decl.is_gadt {
                // GADT form: the last field is the constructor's result
                // type.
                match fields.split_last() {
                    Some((result, params)) => Type::fun(params.to_vec(), result.clone()),
                    None => result_ty.clone(),
                }
            } else {
                Type::fun(fields.clone(), result_ty.clone())
            };

            let arity = if decl.is_gadt {
                fields.len().saturating_sub(1)
            } else {
                fields.len()
            };
            let mut vars: Vec<String> = ctor_ty.free_vars().into_iter().collect();
            vars.sort();
            self.bind_constructor(&ctor.name, vars, ctor_ty);
            self.ctor_owner
                .insert(ctor.name.clone(), decl.name.clone());
            ctors.push((ctor.name.clone(), arity));
        }
        self.sum_types.insert(decl.name.clone(), ctors);
        Ok(())
    }

    /// Register an `interface` declaration as a class and bind its
    /// methods as qualified schemes.
    fn register_interface(
        &mut self,
        interface: &pfn_parser::ast::InterfaceDecl,
    ) -> Result<(), TypeError> {
        let mut methods = Vec::new();
        for method in &interface.methods {
            let ty = self.resolve_type_ref(&method.ty)?;
            methods.push((method.name.clone(), ty));
        }

        self.class_ctx.add_class(
            interface.name.clone(),
            interface.params.clone(),
            methods.iter().map(|(n, t)| (n.as_str(), t.clone())).collect(),
            interface.superclasses.clone(),
        );

        for (name, ty) in methods {
            let vars: Vec<String> = ty.free_vars().into_iter().collect();
            let constraints = interface
                .params
                .iter()
                .map(|p| Constraint::new(interface.name.clone(), Type::Var(p.clone())))
                .collect();
            self.env = self.env.extend(
                name,
                Scheme {
                    vars,
                    ty,
                    constraints,
                },
            );
        }
        Ok(())
    }

    /// Check an `impl` block's method bodies and register the instance.
    fn register_impl(&mut self, impl_decl: &pfn_parser::ast::ImplDecl) -> Result<(), TypeError> {
        let ty = self.resolve_type_ref(&impl_decl.type_ref)?;

        for method in &impl_decl.methods {
            let saved = self.env.clone();
            let mut env = self.env.clone();
            for param in &method.params {
                let fresh = self.fresh();
                env = env.extend(&param.name, Scheme::mono(fresh));
            }
            self.env = env;
            let result = self.infer(&method.body);
            self.env = saved;
            result?;
        }

        // Method bodies live in the AST; the instance records presence
        // for constraint solving (codegen reads the AST directly).
        let method_names: Vec<(&str, &str)> = impl_decl
            .methods
            .iter()
            .map(|m| (m.name.as_str(), ""))
            .collect();
        self.class_ctx
            .add_instance(impl_decl.class_name.clone(), ty, method_names, vec![]);
        Ok(())
    }

    // ── Type reference resolution ──────────────────────────────────────

    /// Resolve a surface type reference to a semantic type. Lower-case
    /// nullary names are type variables; aliases expand; `List` is the
    /// built-in list.
    pub fn resolve_type_ref(&mut self, type_ref: &TypeRef) -> Result<Type, TypeError> {
        match &type_ref.kind {
            TypeRefKind::Simple { name, args } => {
                let mut resolved_args = Vec::new();
                for arg in args {
                    resolved_args.push(self.resolve_type_ref(arg)?);
                }
                Ok(self.resolve_named_type(name, resolved_args))
            }
            TypeRefKind::Fun { param, result } => Ok(Type::Fun(
                Box::new(self.resolve_type_ref(param)?),
                Box::new(self.resolve_type_ref(result)?),
            )),
            TypeRefKind::Tuple(elements) => {
                if elements.is_empty() {
                    return Ok(Type::Unit);
                }
                let mut resolved = Vec::new();
                for e in elements {
                    resolved.push(self.resolve_type_ref(e)?);
                }
                Ok(Type::Tuple(resolved))
            }
            TypeRefKind::Record(fields) => {
                let mut resolved = Vec::new();
                for (name, field_ref) in fields {
                    resolved.push((name.clone(), self.resolve_type_ref(field_ref)?));
                }
                Ok(Type::Record(resolved))
            }
        }
    }

    fn resolve_named_type(&self, name: &str, args: Vec<Type>) -> Type {
        match (name, args.len()) {
            ("Int", 0) => Type::Int,
            ("Float", 0) => Type::Float,
            ("String", 0) => Type::String,
            ("Bool", 0) => Type::Bool,
            ("Char", 0) => Type::Char,
            ("Unit", 0) => Type::Unit,
            ("List", 1) => Type::List(Box::new(args.into_iter().next().unwrap())),
            _ => {
                if let Some((params, aliased)) = self.aliases.get(name) {
                    let mut subst = Subst::new();
                    for (param, arg) in params.iter().zip(args.iter()) {
                        subst.mapping.insert(param.clone(), arg.clone());
                    }
                    return subst.apply(aliased);
                }
                if args.is_empty() && name.chars().next().is_some_and(char::is_lowercase) {
                    return Type::Var(name.to_string());
                }
                Type::Con(name.to_string(), args)
            }
        }
    }

    /// Replace annotation type variables with per-definition skolem
    /// constants so the definition cannot specialise them.
    fn skolemize_annotation(
        &mut self,
        ty: &Type,
        skolems: &mut FxHashMap<String, Type>,
    ) -> Type {
        let vars = ty.free_vars();
        let mut subst = Subst::new();
        for var in vars {
            let skolem = skolems
                .entry(var.clone())
                .or_insert_with(|| self.fresh_skolem())
                .clone();
            subst.mapping.insert(var, skolem);
        }
        subst.apply(ty)
    }

    // ── Higher-rank checking ───────────────────────────────────────────

    /// Replace a `Forall`'s bound variables with fresh skolem constants.
    /// Non-quantified types pass through.
    pub fn skolemize(&mut self, ty: &Type) -> Type {
        match ty {
            Type::Forall(vars, inner) => {
                let mut subst = Subst::new();
                for var in vars {
                    let skolem = self.fresh_skolem();
                    subst.mapping.insert(var.clone(), skolem);
                }
                subst.apply(inner)
            }
            other => other.clone(),
        }
    }

    /// Check `actual ≤ expected`: a quantified expected type is
    /// skolemized, a quantified actual type is instantiated, then the
    /// two sides unify. A skolem leaking into the ambient environment
    /// fails the check.
    pub fn subsumes(
        &mut self,
        actual: &Type,
        expected: &Type,
        span: Span,
    ) -> Result<Subst, TypeError> {
        if matches!(expected, Type::Forall(..)) {
            let skolemized = self.skolemize(expected);
            let subst = self.subsumes(actual, &skolemized, span)?;
            // Skolem escape: no environment variable may now mention a
            // skolem constant.
            let env_vars = self.env.free_vars();
            for var in env_vars {
                let resolved = subst.apply(&Type::Var(var));
                if contains_skolem(&resolved) {
                    return Err(TypeError::SkolemEscape { ty: resolved, span });
                }
            }
            return Ok(subst);
        }

        let actual = match actual {
            Type::Forall(..) => {
                let scheme = match actual {
                    Type::Forall(vars, inner) => Scheme::poly(vars.clone(), (**inner).clone()),
                    _ => unreachable!(),
                };
                self.instantiate(&scheme)
            }
            other => other.clone(),
        };

        self.unify_at(&Subst::new(), &actual, expected, span)
    }

    // ── Expression inference ───────────────────────────────────────────

    /// Unify under the current substitution, translating failure into a
    /// located type error.
    fn unify_at(
        &self,
        subst: &Subst,
        t1: &Type,
        t2: &Type,
        span: Span,
    ) -> Result<Subst, TypeError> {
        match subst.unify(t1, t2) {
            Some(new) => Ok(new.compose(subst)),
            None => {
                let a = subst.apply(t1);
                let b = subst.apply(t2);
                if let Type::Var(v) = &a {
                    if b.free_vars().contains(v) {
                        return Err(TypeError::InfiniteType {
                            var: v.clone(),
                            ty: b,
                            span,
                        });
                    }
                }
                if let Type::Var(v) = &b {
                    if a.free_vars().contains(v) {
                        return Err(TypeError::InfiniteType {
                            var: v.clone(),
                            ty: a,
                            span,
                        });
                    }
                }
                Err(TypeError::Mismatch {
                    expected: a,
                    found: b,
                    span,
                })
            }
        }
    }

    fn infer_expr(&mut self, expr: &Expr, subst: &Subst) -> Result<(Subst, Type), TypeError> {
        let span = expr.span;
        match &expr.kind {
            ExprKind::Int(_) => Ok((subst.clone(), Type::Int)),
            ExprKind::Float(_) => Ok((subst.clone(), Type::Float)),
            ExprKind::Str(_) => Ok((subst.clone(), Type::String)),
            ExprKind::Char(_) => Ok((subst.clone(), Type::Char)),
            ExprKind::Bool(_) => Ok((subst.clone(), Type::Bool)),
            ExprKind::Unit => Ok((subst.clone(), Type::Unit)),

            ExprKind::Var(name) => {
                let scheme = self
                    .env
                    .lookup(name)
                    .cloned()
                    .ok_or_else(|| TypeError::UnboundVariable {
                        name: name.clone(),
                        span,
                    })?;
                Ok((subst.clone(), self.instantiate(&scheme)))
            }

            ExprKind::Lambda { params, body } => {
                let mut param_types = Vec::new();
                let mut new_env = self.env.clone();
                for param in params {
                    let ty = match &param.type_annotation {
                        Some(annot) => self.resolve_type_ref(annot)?,
                        None => self.fresh(),
                    };
                    new_env = new_env.extend(&param.name, Scheme::mono(ty.clone()));
                    param_types.push(ty);
                }

                let saved = std::mem::replace(&mut self.env, new_env);
                let result = self.infer_expr(body, subst);
                self.env = saved;
                let (subst, body_ty) = result?;

                Ok((subst.clone(), Type::fun(param_types, body_ty)))
            }

            ExprKind::App { func, args } => {
                let (mut subst, mut func_ty) = self.infer_expr(func, subst)?;
                for arg in args {
                    let (next, arg_ty) = self.infer_expr(arg, &subst)?;
                    subst = next;
                    let result_ty = self.fresh();
                    let expected = Type::Fun(Box::new(arg_ty), Box::new(result_ty.clone()));
                    subst = self.unify_at(&subst, &func_ty, &expected, span)?;
                    func_ty = subst.apply(&result_ty);
                }
                Ok((subst, func_ty))
            }

            ExprKind::BinOp { left, op, right } => {
                let (subst, left_ty) = self.infer_expr(left, subst)?;
                let (subst, right_ty) = self.infer_expr(right, &subst)?;
                self.infer_binop(*op, left_ty, right_ty, subst, span)
            }

            ExprKind::UnaryOp { op, operand } => {
                let (subst, operand_ty) = self.infer_expr(operand, subst)?;
                match op {
                    pfn_parser::ast::UnaryOpKind::Neg => {
                        let subst = self.unify_numeric(&subst, &operand_ty, span)?;
                        Ok((subst.clone(), subst.apply(&operand_ty)))
                    }
                    pfn_parser::ast::UnaryOpKind::Not => {
                        let subst = self.unify_at(&subst, &operand_ty, &Type::Bool, span)?;
                        Ok((subst, Type::Bool))
                    }
                }
            }

            ExprKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                let (subst, cond_ty) = self.infer_expr(cond, subst)?;
                let subst = self.unify_at(&subst, &cond_ty, &Type::Bool, cond.span)?;

                let (subst, then_ty) = self.infer_expr(then_branch, &subst)?;
                let (subst, else_ty) = self.infer_expr(else_branch, &subst)?;

                let subst = self.unify_at(&subst, &then_ty, &else_ty, span)?;
                let ty = subst.apply(&then_ty);
                Ok((subst, ty))
            }

            ExprKind::Let { name, value, body } => {
                let (subst, value_ty) = self.infer_expr(value, subst)?;
                let value_ty = subst.apply(&value_ty);

                // Value restriction: only syntactic values generalize.
                let scheme = if is_syntactic_value(value) {
                    let env = subst.apply_env(&self.env);
                    self.generalize(&env, &value_ty)
                } else {
                    Scheme::mono(value_ty)
                };

                let saved = self.env.clone();
                self.env = self.env.extend(name, scheme);
                let result = self.infer_expr(body, &subst);
                self.env = saved;
                result
            }

            ExprKind::LetPattern {
                pattern,
                value,
                body,
            } => {
                let (subst, value_ty) = self.infer_expr(value, subst)?;
                let mut case_env = self.env.clone();
                let mut seen = BTreeSet::new();
                let (subst, pattern_ty) =
                    self.infer_pattern(pattern, &subst, &mut case_env, &mut seen)?;
                let subst = self.unify_at(&subst, &value_ty, &pattern_ty, pattern.span)?;

                let saved = std::mem::replace(&mut self.env, case_env);
                let result = self.infer_expr(body, &subst);
                self.env = saved;
                result
            }

            ExprKind::LetFunc {
                name,
                params,
                value,
                body,
            } => {
                // Pre-bind the function's own name so the value can
                // recurse, then tie the knot by unification.
                let fn_var = self.fresh();
                let mut inner_env = self.env.extend(name, Scheme::mono(fn_var.clone()));

                let mut param_types = Vec::new();
                for param in params {
                    let ty = match &param.type_annotation {
                        Some(annot) => self.resolve_type_ref(annot)?,
                        None => self.fresh(),
                    };
                    inner_env = inner_env.extend(&param.name, Scheme::mono(ty.clone()));
                    param_types.push(ty);
                }

                let saved = std::mem::replace(&mut self.env, inner_env);
                let result = self.infer_expr(value, subst);
                self.env = saved;
                let (subst, value_ty) = result?;

                let applied: Vec<Type> = param_types.iter().map(|t| subst.apply(t)).collect();
                let fun_ty = Type::fun(applied, subst.apply(&value_ty));
                let subst = self.unify_at(&subst, &fun_ty, &fn_var, span)?;
                let fun_ty = subst.apply(&fun_ty);

                let env = subst.apply_env(&self.env);
                let scheme = self.generalize(&env, &fun_ty);

                let saved = self.env.clone();
                self.env = self.env.extend(name, scheme);
                let result = self.infer_expr(body, &subst);
                self.env = saved;
                result
            }

            ExprKind::Match { scrutinee, cases } => {
                let (mut subst, scrutinee_ty) = self.infer_expr(scrutinee, subst)?;

                if cases.is_empty() {
                    return Ok((subst, self.fresh()));
                }

                let mut result_ty = self.fresh();
                for case in cases {
                    let mut case_env = self.env.clone();
                    let mut seen = BTreeSet::new();
                    let (next, pattern_ty) =
                        self.infer_pattern(&case.pattern, &subst, &mut case_env, &mut seen)?;
                    subst = next;
                    subst =
                        self.unify_at(&subst, &scrutinee_ty, &pattern_ty, case.pattern.span)?;

                    if let Some(guard) = &case.guard {
                        let saved = std::mem::replace(&mut self.env, case_env.clone());
                        let result = self.infer_expr(guard, &subst);
                        self.env = saved;
                        let (next, guard_ty) = result?;
                        subst = self.unify_at(&next, &guard_ty, &Type::Bool, guard.span)?;
                    }

                    let saved = std::mem::replace(&mut self.env, case_env);
                    let result = self.infer_expr(&case.body, &subst);
                    self.env = saved;
                    let (next, body_ty) = result?;
                    subst = next;

                    subst = self.unify_at(&subst, &result_ty, &body_ty, case.body.span)?;
                    result_ty = subst.apply(&result_ty);
                }

                // Exhaustiveness over the resolved scrutinee type.
                let resolved = subst.apply(&scrutinee_ty);
                let patterns: Vec<Pattern> =
                    cases.iter().map(|c| c.pattern.clone()).collect();
                let scrutinee_info = match resolved {
                    Type::Var(_) => None,
                    other => Some(other),
                };
                let outcome = check_match_exhaustiveness(
                    &patterns,
                    scrutinee_info.as_ref(),
                    &self.sum_types,
                );
                if !outcome.exhaustive {
                    // Guarded cases weaken coverage; a guard on the only
                    // covering case means the match can still fall
                    // through, but mirroring the reference we only
                    // report missing constructors.
                    return Err(TypeError::NonExhaustiveMatch {
                        missing: outcome
                            .missing_patterns
                            .iter()
                            .map(pattern_to_string)
                            .collect(),
                        span,
                    });
                }
                for index in outcome.redundant_patterns {
                    self.warnings.push(TypeError::RedundantCase {
                        index,
                        span: cases[index].pattern.span,
                    });
                }

                Ok((subst, result_ty))
            }

            ExprKind::DoNotation { bindings, body } => {
                let saved = self.env.clone();
                let mut subst = subst.clone();
                for binding in bindings {
                    let (next, value_ty) = self.infer_expr(&binding.value, &subst)?;
                    subst = next;
                    self.env = self.env.extend(&binding.name, Scheme::mono(value_ty));
                }
                let result = self.infer_expr(body, &subst);
                self.env = saved;
                result
            }

            ExprKind::ListLit(elements) => {
                if elements.is_empty() {
                    let elem = self.fresh();
                    return Ok((subst.clone(), Type::List(Box::new(elem))));
                }
                let (mut subst, first_ty) = self.infer_expr(&elements[0], subst)?;
                let mut elem_ty = first_ty;
                for elem in &elements[1..] {
                    let (next, ty) = self.infer_expr(elem, &subst)?;
                    subst = self.unify_at(&next, &elem_ty, &ty, elem.span)?;
                    elem_ty = subst.apply(&elem_ty);
                }
                Ok((subst, Type::List(Box::new(elem_ty))))
            }

            ExprKind::TupleLit(elements) => {
                let mut subst = subst.clone();
                let mut types = Vec::new();
                for elem in elements {
                    let (next, ty) = self.infer_expr(elem, &subst)?;
                    subst = next;
                    types.push(ty);
                }
                Ok((subst, Type::Tuple(types)))
            }

            ExprKind::RecordLit(fields) => {
                let mut subst = subst.clone();
                let mut field_types = Vec::new();
                for field in fields {
                    let (next, ty) = self.infer_expr(&field.value, &subst)?;
                    subst = next;
                    field_types.push((field.name.clone(), ty));
                }
                Ok((subst, Type::Record(field_types)))
            }

            // Field access stays a fresh variable pending row solving.
            ExprKind::FieldAccess { expr, .. } => {
                let (subst, _) = self.infer_expr(expr, subst)?;
                Ok((subst, self.fresh()))
            }

            ExprKind::RecordUpdate { record, updates } => {
                let (mut subst, record_ty) = self.infer_expr(record, subst)?;
                for field in updates {
                    let (next, _) = self.infer_expr(&field.value, &subst)?;
                    subst = next;
                }
                Ok((subst.clone(), subst.apply(&record_ty)))
            }

            ExprKind::IndexAccess { expr, index } => {
                let (subst, _) = self.infer_expr(expr, subst)?;
                let (subst, index_ty) = self.infer_expr(index, &subst)?;
                let subst = self.unify_at(&subst, &index_ty, &Type::Int, index.span)?;
                Ok((subst, self.fresh()))
            }

            ExprKind::Slice {
                expr,
                start,
                end,
                step,
            } => {
                let (mut subst, expr_ty) = self.infer_expr(expr, subst)?;
                for part in [start, end, step].into_iter().flatten() {
                    let (next, part_ty) = self.infer_expr(part, &subst)?;
                    subst = self.unify_at(&next, &part_ty, &Type::Int, part.span)?;
                }
                // Slicing preserves the sequence's type.
                Ok((subst.clone(), subst.apply(&expr_ty)))
            }

            ExprKind::Handle { expr, cases, .. } => {
                let (mut subst, inner_ty) = self.infer_expr(expr, subst)?;
                for case in cases {
                    let saved = self.env.clone();
                    let mut env = self.env.clone();
                    for param in &case.params {
                        let fresh = self.fresh();
                        env = env.extend(&param.name, Scheme::mono(fresh));
                    }
                    self.env = env;
                    let result = self.infer_expr(&case.body, &subst);
                    self.env = saved;
                    let (next, body_ty) = result?;
                    subst = self.unify_at(&next, &inner_ty, &body_ty, case.span)?;
                }
                Ok((subst.clone(), subst.apply(&inner_ty)))
            }

            ExprKind::Perform { args, .. } => {
                let mut subst = subst.clone();
                for arg in args {
                    let (next, _) = self.infer_expr(arg, &subst)?;
                    subst = next;
                }
                Ok((subst, self.fresh()))
            }
        }
    }

    fn infer_binop(
        &mut self,
        op: pfn_parser::ast::BinOpKind,
        left_ty: Type,
        right_ty: Type,
        subst: Subst,
        span: Span,
    ) -> Result<(Subst, Type), TypeError> {
        use pfn_parser::ast::BinOpKind;

        if op.is_arithmetic() {
            let subst = self.unify_numeric(&subst, &left_ty, span)?;
            let subst = self.unify_at(&subst, &right_ty, &left_ty, span)?;
            let ty = subst.apply(&left_ty);
            return Ok((subst, ty));
        }

        if op.is_comparison() {
            let subst = self.unify_numeric(&subst, &left_ty, span)?;
            let subst = self.unify_at(&subst, &right_ty, &left_ty, span)?;
            return Ok((subst, Type::Bool));
        }

        if op.is_equality() {
            let subst = self.unify_at(&subst, &left_ty, &right_ty, span)?;
            return Ok((subst, Type::Bool));
        }

        match op {
            BinOpKind::And | BinOpKind::Or => {
                let subst = self.unify_at(&subst, &left_ty, &Type::Bool, span)?;
                let subst = self.unify_at(&subst, &right_ty, &Type::Bool, span)?;
                Ok((subst, Type::Bool))
            }
            BinOpKind::Concat => {
                let elem = self.fresh();
                let subst =
                    self.unify_at(&subst, &left_ty, &Type::List(Box::new(elem.clone())), span)?;
                let subst = self.unify_at(
                    &subst,
                    &right_ty,
                    &Type::List(Box::new(subst.apply(&elem))),
                    span,
                )?;
                let elem = subst.apply(&elem);
                Ok((subst, Type::List(Box::new(elem))))
            }
            BinOpKind::Cons => {
                let subst = self.unify_at(
                    &subst,
                    &right_ty,
                    &Type::List(Box::new(left_ty.clone())),
                    span,
                )?;
                let elem = subst.apply(&left_ty);
                Ok((subst, Type::List(Box::new(elem))))
            }
            _ => unreachable!("operator {op} handled by an earlier class"),
        }
    }

    /// Constrain a type to `Int` or `Float` (trying `Int` first, as the
    /// reference does).
    fn unify_numeric(&self, subst: &Subst, ty: &Type, span: Span) -> Result<Subst, TypeError> {
        if let Ok(subst) = self.unify_at(subst, ty, &Type::Int, span) {
            return Ok(subst);
        }
        self.unify_at(subst, ty, &Type::Float, span)
    }

    // ── Pattern inference ──────────────────────────────────────────────

    /// Infer a pattern's type, extending `env` with its bindings.
    /// Duplicate binders within one pattern are rejected.
    fn infer_pattern(
        &mut self,
        pattern: &Pattern,
        subst: &Subst,
        env: &mut TypeEnv,
        seen: &mut BTreeSet<String>,
    ) -> Result<(Subst, Type), TypeError> {
        let span = pattern.span;
        match &pattern.kind {
            PatternKind::Int(_) => Ok((subst.clone(), Type::Int)),
            PatternKind::Float(_) => Ok((subst.clone(), Type::Float)),
            PatternKind::Str(_) => Ok((subst.clone(), Type::String)),
            PatternKind::Char(_) => Ok((subst.clone(), Type::Char)),
            PatternKind::Bool(_) => Ok((subst.clone(), Type::Bool)),

            PatternKind::Var(name) => {
                if !seen.insert(name.clone()) {
                    return Err(TypeError::DuplicateBinding {
                        name: name.clone(),
                        span,
                    });
                }
                let ty = self.fresh();
                *env = env.extend(name, Scheme::mono(ty.clone()));
                Ok((subst.clone(), ty))
            }

            PatternKind::Wildcard => Ok((subst.clone(), self.fresh())),

            PatternKind::List { elements, rest } => {
                if elements.is_empty() && rest.is_none() {
                    let elem = self.fresh();
                    return Ok((subst.clone(), Type::List(Box::new(elem))));
                }

                let mut subst = subst.clone();
                let mut elem_ty = None;
                for elem in elements {
                    let (next, ty) = self.infer_pattern(elem, &subst, env, seen)?;
                    subst = next;
                    match &elem_ty {
                        None => elem_ty = Some(ty),
                        Some(prev) => {
                            subst = self.unify_at(&subst, prev, &ty, elem.span)?;
                            elem_ty = Some(subst.apply(prev));
                        }
                    }
                }
                let elem_ty = elem_ty.unwrap_or_else(|| self.fresh());
                let list_ty = Type::List(Box::new(elem_ty));

                if let Some(rest) = rest {
                    let (next, rest_ty) = self.infer_pattern(rest, &subst, env, seen)?;
                    subst = self.unify_at(&next, &rest_ty, &list_ty, rest.span)?;
                }
                Ok((subst.clone(), subst.apply(&list_ty)))
            }

            PatternKind::Cons { head, tail } => {
                let (subst, head_ty) = self.infer_pattern(head, subst, env, seen)?;
                let (subst, tail_ty) = self.infer_pattern(tail, &subst, env, seen)?;
                let subst = self.unify_at(
                    &subst,
                    &tail_ty,
                    &Type::List(Box::new(head_ty.clone())),
                    span,
                )?;
                let elem = subst.apply(&head_ty);
                Ok((subst, Type::List(Box::new(elem))))
            }

            PatternKind::Tuple(elements) => {
                if elements.is_empty() {
                    return Ok((subst.clone(), Type::Unit));
                }
                let mut subst = subst.clone();
                let mut types = Vec::new();
                for elem in elements {
                    let (next, ty) = self.infer_pattern(elem, &subst, env, seen)?;
                    subst = next;
                    types.push(ty);
                }
                Ok((subst, Type::Tuple(types)))
            }

            PatternKind::Record(fields) => {
                let mut subst = subst.clone();
                let mut field_types = std::collections::BTreeMap::new();
                for (name, field_pattern) in fields {
                    let (next, ty) = self.infer_pattern(field_pattern, &subst, env, seen)?;
                    subst = next;
                    field_types.insert(name.clone(), ty);
                }
                // Open row: the pattern matches any record carrying at
                // least these fields.
                let rest = match self.fresh() {
                    Type::Var(name) => name,
                    _ => unreachable!(),
                };
                Ok((subst, Type::RowPoly(field_types, Some(rest))))
            }

            PatternKind::Constructor { name, args } => {
                if !self.ctor_owner.contains_key(name) {
                    return Err(TypeError::UnknownConstructor {
                        name: name.clone(),
                        span,
                    });
                }
                let scheme = self
                    .env
                    .lookup(name)
                    .cloned()
                    .ok_or_else(|| TypeError::UnknownConstructor {
                        name: name.clone(),
                        span,
                    })?;
                let ctor_ty = self.instantiate(&scheme);

                let arity = fun_arity(&ctor_ty);
                if args.len() != arity {
                    return Err(TypeError::ConstructorArity {
                        name: name.clone(),
                        expected: arity,
                        found: args.len(),
                        span,
                    });
                }

                let mut subst = subst.clone();
                let mut remaining = ctor_ty;
                for arg in args {
                    let (next, arg_ty) = self.infer_pattern(arg, &subst, env, seen)?;
                    subst = next;
                    match subst.apply(&remaining) {
                        Type::Fun(param, result) => {
                            subst = self.unify_at(&subst, &arg_ty, &param, arg.span)?;
                            remaining = *result;
                        }
                        other => {
                            return Err(TypeError::Mismatch {
                                expected: Type::Fun(
                                    Box::new(arg_ty),
                                    Box::new(self.fresh()),
                                ),
                                found: other,
                                span: arg.span,
                            })
                        }
                    }
                }
                Ok((subst.clone(), subst.apply(&remaining)))
            }
        }
    }
}

impl Default for TypeChecker {
    fn default() -> Self {
        Self::new()
    }
}

// ── Helpers ────────────────────────────────────────────────────────────

/// Number of parameters in a curried function type.
fn fun_arity(ty: &Type) -> usize {
    match ty {
        Type::Fun(_, result) => 1 + fun_arity(result),
        _ => 0,
    }
}

/// Whether a type mentions a skolem constant.
fn contains_skolem(ty: &Type) -> bool {
    match ty {
        Type::Con(name, args) => {
            name.starts_with(SKOLEM_PREFIX) || args.iter().any(contains_skolem)
        }
        Type::Fun(param, result) => contains_skolem(param) || contains_skolem(result),
        Type::List(elem) => contains_skolem(elem),
        Type::Tuple(elements) => elements.iter().any(contains_skolem),
        Type::Record(fields) => fields.iter().any(|(_, t)| contains_skolem(t)),
        Type::Forall(_, inner) | Type::Exists(_, inner) | Type::Constraint(_, inner) => {
            contains_skolem(inner)
        }
        Type::Qualified(constraints, inner) => {
            constraints.iter().any(|c| contains_skolem(&c.ty)) || contains_skolem(inner)
        }
        Type::RowPoly(fields, _) => fields.values().any(contains_skolem),
        _ => false,
    }
}

/// Map annotation skolems back to their variable names after checking.
fn unskolemize(ty: &Type, skolems: &FxHashMap<String, Type>) -> Type {
    let reverse: FxHashMap<&str, &str> = skolems
        .iter()
        .filter_map(|(var, sk)| match sk {
            Type::Con(name, _) => Some((name.as_str(), var.as_str())),
            _ => None,
        })
        .collect();
    unskolemize_with(ty, &reverse)
}

fn unskolemize_with(ty: &Type, reverse: &FxHashMap<&str, &str>) -> Type {
    match ty {
        Type::Con(name, args) if args.is_empty() => match reverse.get(name.as_str()) {
            Some(var) => Type::Var(var.to_string()),
            None => ty.clone(),
        },
        Type::Con(name, args) => Type::Con(
            name.clone(),
            args.iter().map(|a| unskolemize_with(a, reverse)).collect(),
        ),
        Type::Fun(param, result) => Type::Fun(
            Box::new(unskolemize_with(param, reverse)),
            Box::new(unskolemize_with(result, reverse)),
        ),
        Type::List(elem) => Type::List(Box::new(unskolemize_with(elem, reverse))),
        Type::Tuple(elements) => Type::Tuple(
            elements
                .iter()
                .map(|e| unskolemize_with(e, reverse))
                .collect(),
        ),
        Type::Record(fields) => Type::Record(
            fields
                .iter()
                .map(|(n, t)| (n.clone(), unskolemize_with(t, reverse)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// The value restriction: a binding generalizes only when its right-hand
/// side is syntactically a value.
pub fn is_syntactic_value(expr: &Expr) -> bool {
    match &expr.kind {
        ExprKind::Int(_)
        | ExprKind::Float(_)
        | ExprKind::Str(_)
        | ExprKind::Char(_)
        | ExprKind::Bool(_)
        | ExprKind::Unit
        | ExprKind::Var(_)
        | ExprKind::Lambda { .. } => true,
        ExprKind::ListLit(elements) | ExprKind::TupleLit(elements) => {
            elements.iter().all(is_syntactic_value)
        }
        ExprKind::RecordLit(fields) => fields.iter().all(|f| is_syntactic_value(&f.value)),
        // Constructor applications of values are values.
        ExprKind::App { func, args } => {
            is_constructor_spine(func) && args.iter().all(is_syntactic_value)
        }
        _ => false,
    }
}

fn is_constructor_spine(expr: &Expr) -> bool {
    match &expr.kind {
        ExprKind::Var(name) => name.chars().next().is_some_and(char::is_uppercase),
        ExprKind::App { func, args } => {
            is_constructor_spine(func) && args.iter().all(is_syntactic_value)
        }
        _ => false,
    }
}
