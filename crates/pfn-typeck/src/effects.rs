//! Effect inference: a parallel traversal assigning an effect set to
//! each expression.
//!
//! Effects form a small closed vocabulary (`IO`, `State τ`, `Throw ε`,
//! `Read`); union is commutative and idempotent, so sets are ordered
//! B-tree sets. Pure expressions carry the empty set. Handlers pushed on
//! a stack discharge the effects they name.

use std::collections::BTreeSet;

use rustc_hash::FxHashMap;

use pfn_parser::ast::{Expr, ExprKind, Pattern};

use crate::ty::Type;

/// One effect atom.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Effect {
    IO,
    State(Option<Type>),
    Throw(Option<Type>),
    Read,
}

impl Effect {
    /// The effect's name, as used by effect declarations and handlers.
    pub fn name(&self) -> &'static str {
        match self {
            Effect::IO => "IO",
            Effect::State(_) => "State",
            Effect::Throw(_) => "Throw",
            Effect::Read => "Read",
        }
    }

    /// The effect atom an operation of the named effect performs.
    /// Unknown (user-declared) effects default to `IO`, the coarsest
    /// atom.
    pub fn from_effect_name(name: &str) -> Effect {
        match name {
            "State" => Effect::State(None),
            "Throw" => Effect::Throw(None),
            "Read" => Effect::Read,
            _ => Effect::IO,
        }
    }
}

/// A set of effect atoms. The empty set is purity.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EffectSet {
    atoms: BTreeSet<Effect>,
}

impl EffectSet {
    /// The pure (empty) effect set.
    pub fn pure() -> Self {
        Self::default()
    }

    pub fn singleton(effect: Effect) -> Self {
        let mut atoms = BTreeSet::new();
        atoms.insert(effect);
        Self { atoms }
    }

    pub fn is_pure(&self) -> bool {
        self.atoms.is_empty()
    }

    /// Set union; commutative and idempotent.
    pub fn union(&self, other: &EffectSet) -> EffectSet {
        let mut atoms = self.atoms.clone();
        atoms.extend(other.atoms.iter().cloned());
        EffectSet { atoms }
    }

    pub fn contains_io(&self) -> bool {
        self.atoms.contains(&Effect::IO)
    }

    /// Remove every atom belonging to the named effect.
    pub fn discharge(&self, effect_name: &str) -> EffectSet {
        EffectSet {
            atoms: self
                .atoms
                .iter()
                .filter(|e| e.name() != effect_name)
                .cloned()
                .collect(),
        }
    }

    /// The distinct effect names in this set, sorted.
    pub fn names(&self) -> BTreeSet<&'static str> {
        self.atoms.iter().map(Effect::name).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Effect> {
        self.atoms.iter()
    }
}

/// Effect environment: which effects each bound name carries.
#[derive(Debug, Clone, Default)]
pub struct EffectEnv {
    bindings: FxHashMap<String, EffectSet>,
}

impl EffectEnv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend(&self, name: impl Into<String>, effects: EffectSet) -> EffectEnv {
        let mut bindings = self.bindings.clone();
        bindings.insert(name.into(), effects);
        EffectEnv { bindings }
    }

    pub fn lookup(&self, name: &str) -> Option<&EffectSet> {
        self.bindings.get(name)
    }
}

/// The effect inference walker.
pub struct EffectInferer {
    env: EffectEnv,
    effect_decls: FxHashMap<String, Vec<String>>,
    handler_stack: Vec<String>,
}

impl EffectInferer {
    pub fn new() -> Self {
        Self {
            env: EffectEnv::new(),
            effect_decls: FxHashMap::default(),
            handler_stack: Vec::new(),
        }
    }

    /// Register a declared effect and its operation names.
    pub fn register_effect(&mut self, name: impl Into<String>, operations: Vec<String>) {
        self.effect_decls.insert(name.into(), operations);
    }

    pub fn push_handler(&mut self, effect_name: impl Into<String>) {
        self.handler_stack.push(effect_name.into());
    }

    pub fn pop_handler(&mut self) -> Option<String> {
        self.handler_stack.pop()
    }

    /// Infer the effect set of an expression.
    pub fn infer(&mut self, expr: &Expr) -> EffectSet {
        match &expr.kind {
            ExprKind::Int(_)
            | ExprKind::Float(_)
            | ExprKind::Str(_)
            | ExprKind::Char(_)
            | ExprKind::Bool(_)
            | ExprKind::Unit => EffectSet::pure(),

            ExprKind::Var(name) => self
                .env
                .lookup(name)
                .cloned()
                .unwrap_or_else(EffectSet::pure),

            ExprKind::Lambda { params, body } => {
                let saved = self.env.clone();
                for param in params {
                    self.env = self.env.extend(&param.name, EffectSet::pure());
                }
                let effects = self.infer(body);
                self.env = saved;
                effects
            }

            ExprKind::App { func, args } => {
                let mut combined = self.infer(func);
                for arg in args {
                    combined = combined.union(&self.infer(arg));
                }
                combined
            }

            ExprKind::BinOp { left, right, .. } => self.infer(left).union(&self.infer(right)),
            ExprKind::UnaryOp { operand, .. } => self.infer(operand),

            ExprKind::If {
                cond,
                then_branch,
                else_branch,
            } => self
                .infer(cond)
                .union(&self.infer(then_branch))
                .union(&self.infer(else_branch)),

            ExprKind::Let { name, value, body } => {
                let value_effects = self.infer(value);
                let saved = self.env.clone();
                self.env = self.env.extend(name, value_effects.clone());
                let body_effects = self.infer(body);
                self.env = saved;
                value_effects.union(&body_effects)
            }

            ExprKind::LetPattern {
                pattern,
                value,
                body,
            } => {
                let value_effects = self.infer(value);
                let saved = self.env.clone();
                for name in pattern.bound_names() {
                    self.env = self.env.extend(name, EffectSet::pure());
                }
                let body_effects = self.infer(body);
                self.env = saved;
                value_effects.union(&body_effects)
            }

            ExprKind::LetFunc {
                name,
                params,
                value,
                body,
            } => {
                let saved = self.env.clone();
                for param in params {
                    self.env = self.env.extend(&param.name, EffectSet::pure());
                }
                let value_effects = self.infer(value);
                self.env = saved.extend(name, value_effects.clone());
                let body_effects = self.infer(body);
                self.env = saved;
                value_effects.union(&body_effects)
            }

            ExprKind::Match { scrutinee, cases } => {
                let mut combined = self.infer(scrutinee);
                for case in cases {
                    let saved = self.env.clone();
                    for name in pattern_names(&case.pattern) {
                        self.env = self.env.extend(name, EffectSet::pure());
                    }
                    if let Some(guard) = &case.guard {
                        combined = combined.union(&self.infer(guard));
                    }
                    combined = combined.union(&self.infer(&case.body));
                    self.env = saved;
                }
                combined
            }

            ExprKind::DoNotation { bindings, body } => {
                let saved = self.env.clone();
                let mut combined = EffectSet::pure();
                for binding in bindings {
                    let binding_effects = self.infer(&binding.value);
                    combined = combined.union(&binding_effects);
                    self.env = self.env.extend(&binding.name, binding_effects);
                }
                combined = combined.union(&self.infer(body));
                self.env = saved;
                combined
            }

            ExprKind::ListLit(elements) | ExprKind::TupleLit(elements) => {
                let mut combined = EffectSet::pure();
                for elem in elements {
                    combined = combined.union(&self.infer(elem));
                }
                combined
            }

            ExprKind::RecordLit(fields) => {
                let mut combined = EffectSet::pure();
                for field in fields {
                    combined = combined.union(&self.infer(&field.value));
                }
                combined
            }

            ExprKind::FieldAccess { expr, .. } => self.infer(expr),
            ExprKind::RecordUpdate { record, updates } => {
                let mut combined = self.infer(record);
                for field in updates {
                    combined = combined.union(&self.infer(&field.value));
                }
                combined
            }
            ExprKind::IndexAccess { expr, index } => self.infer(expr).union(&self.infer(index)),
            ExprKind::Slice {
                expr,
                start,
                end,
                step,
            } => {
                let mut combined = self.infer(expr);
                for part in [start, end, step].into_iter().flatten() {
                    combined = combined.union(&self.infer(part));
                }
                combined
            }

            ExprKind::Perform { effect, args, .. } => {
                let mut combined = EffectSet::singleton(Effect::from_effect_name(effect));
                for arg in args {
                    combined = combined.union(&self.infer(arg));
                }
                combined
            }

            ExprKind::Handle {
                expr,
                cases,
                handler_name,
            } => {
                // The handled effect's atoms are discharged from the
                // inner expression's set.
                let effect_name = handler_name
                    .clone()
                    .or_else(|| self.effect_for_ops(cases.iter().map(|c| c.op_name.as_str())))
                    .unwrap_or_else(|| "IO".to_string());
                self.push_handler(effect_name.clone());
                let inner = self.infer(expr);
                self.pop_handler();

                let mut combined = inner.discharge(&effect_name);
                for case in cases {
                    let saved = self.env.clone();
                    for param in &case.params {
                        self.env = self.env.extend(&param.name, EffectSet::pure());
                    }
                    combined = combined.union(&self.infer(&case.body));
                    self.env = saved;
                }
                combined
            }
        }
    }

    /// Find the declared effect owning all the given operation names.
    fn effect_for_ops<'a>(&self, ops: impl Iterator<Item = &'a str>) -> Option<String> {
        let ops: Vec<&str> = ops.collect();
        if ops.is_empty() {
            return None;
        }
        let mut candidates: Vec<&String> = self
            .effect_decls
            .iter()
            .filter(|(_, decl_ops)| ops.iter().all(|op| decl_ops.iter().any(|d| d == op)))
            .map(|(name, _)| name)
            .collect();
        candidates.sort();
        candidates.first().map(|s| s.to_string())
    }
}

impl Default for EffectInferer {
    fn default() -> Self {
        Self::new()
    }
}

fn pattern_names(pattern: &Pattern) -> Vec<String> {
    pattern.bound_names()
}

/// Infer the effect set of an expression under an empty environment.
pub fn infer_effects(expr: &Expr) -> EffectSet {
    EffectInferer::new().infer(expr)
}

/// Whether an expression is pure.
pub fn is_pure(expr: &Expr) -> bool {
    infer_effects(expr).is_pure()
}
