//! Type-class environment: class definitions, instances, superclass
//! closure, constraint solving, and dictionary construction.
//!
//! Instances are keyed on a structural type key so `List Int` and
//! `List String` resolve independently. Method implementations are stored
//! as host-code snippets; `build_dictionary` hands them to the code
//! generator for dictionary passing.

use std::collections::BTreeSet;

use rustc_hash::FxHashMap;

use crate::subst::Subst;
use crate::ty::{Constraint, Type};

/// A type-class definition.
#[derive(Debug, Clone)]
pub struct ClassInfo {
    pub name: String,
    pub params: Vec<String>,
    /// Method name -> method type (over the class parameters).
    pub methods: FxHashMap<String, Type>,
    pub superclasses: Vec<String>,
    /// Default method bodies as host-code snippets.
    pub defaults: FxHashMap<String, String>,
}

/// A type-class instance.
#[derive(Debug, Clone)]
pub struct InstanceInfo {
    pub class_name: String,
    pub ty: Type,
    /// Method name -> host-code implementation snippet.
    pub methods: FxHashMap<String, String>,
    /// Constraints the instance itself requires (`Eq a => Eq (List a)`).
    pub constraints: Vec<Constraint>,
}

/// The class context: every known class and instance.
#[derive(Debug, Clone, Default)]
pub struct ClassContext {
    classes: FxHashMap<String, ClassInfo>,
    instances: FxHashMap<(String, String), InstanceInfo>,
}

impl ClassContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a class definition.
    pub fn add_class(
        &mut self,
        name: impl Into<String>,
        params: Vec<String>,
        methods: Vec<(&str, Type)>,
        superclasses: Vec<String>,
    ) {
        let name = name.into();
        self.classes.insert(
            name.clone(),
            ClassInfo {
                name,
                params,
                methods: methods
                    .into_iter()
                    .map(|(n, t)| (n.to_string(), t))
                    .collect(),
                superclasses,
                defaults: FxHashMap::default(),
            },
        );
    }

    /// Register an instance, keyed structurally on its type.
    pub fn add_instance(
        &mut self,
        class_name: impl Into<String>,
        ty: Type,
        methods: Vec<(&str, &str)>,
        constraints: Vec<Constraint>,
    ) {
        let class_name = class_name.into();
        let key = (class_name.clone(), type_key(&ty));
        self.instances.insert(
            key,
            InstanceInfo {
                class_name,
                ty,
                methods: methods
                    .into_iter()
                    .map(|(n, body)| (n.to_string(), body.to_string()))
                    .collect(),
                constraints,
            },
        );
    }

    pub fn lookup_class(&self, name: &str) -> Option<&ClassInfo> {
        self.classes.get(name)
    }

    pub fn lookup_instance(&self, class_name: &str, ty: &Type) -> Option<&InstanceInfo> {
        self.instances
            .get(&(class_name.to_string(), type_key(ty)))
    }

    /// A method implementation from an instance, falling back to the
    /// class's default.
    pub fn get_method(&self, class_name: &str, ty: &Type, method_name: &str) -> Option<&str> {
        if let Some(inst) = self.lookup_instance(class_name, ty) {
            if let Some(body) = inst.methods.get(method_name) {
                return Some(body);
            }
        }
        self.classes
            .get(class_name)
            .and_then(|cls| cls.defaults.get(method_name))
            .map(String::as_str)
    }

    /// The declared type of a class method.
    pub fn get_method_type(&self, class_name: &str, method_name: &str) -> Option<&Type> {
        self.classes
            .get(class_name)
            .and_then(|cls| cls.methods.get(method_name))
    }

    /// Find the class declaring a method, with the method's type.
    pub fn find_method(&self, method_name: &str) -> Option<(&ClassInfo, &Type)> {
        let mut found: Vec<_> = self
            .classes
            .values()
            .filter_map(|cls| cls.methods.get(method_name).map(|ty| (cls, ty)))
            .collect();
        // Deterministic pick when several classes share a method name.
        found.sort_by(|(a, _), (b, _)| a.name.cmp(&b.name));
        found.into_iter().next()
    }

    /// Whether every named superclass of `class_name` is defined.
    pub fn check_superclasses(&self, class_name: &str) -> bool {
        match self.classes.get(class_name) {
            None => false,
            Some(cls) => cls
                .superclasses
                .iter()
                .all(|name| self.classes.contains_key(name)),
        }
    }

    /// All superclasses, transitively.
    pub fn get_all_superclasses(&self, class_name: &str) -> BTreeSet<String> {
        let mut result = BTreeSet::new();
        if let Some(cls) = self.classes.get(class_name) {
            for super_name in &cls.superclasses {
                result.insert(super_name.clone());
                result.extend(self.get_all_superclasses(super_name));
            }
        }
        result
    }
}

/// Structural key for instance lookup.
fn type_key(ty: &Type) -> String {
    match ty {
        Type::Int => "Int".to_string(),
        Type::Float => "Float".to_string(),
        Type::String => "String".to_string(),
        Type::Bool => "Bool".to_string(),
        Type::Char => "Char".to_string(),
        Type::Unit => "()".to_string(),
        Type::Var(name) => format!("var:{name}"),
        Type::List(elem) => format!("List[{}]", type_key(elem)),
        Type::Con(name, args) => {
            if args.is_empty() {
                name.clone()
            } else {
                let args: Vec<_> = args.iter().map(type_key).collect();
                format!("{name}[{}]", args.join(","))
            }
        }
        other => other.to_string(),
    }
}

/// Check that a single constraint is satisfiable under a substitution.
pub fn check_constraint(ctx: &ClassContext, constraint: &Constraint, subst: &Subst) -> bool {
    let ty = subst.apply(&constraint.ty);
    // Constraints on still-unresolved variables are deferred, not failed.
    if matches!(ty, Type::Var(_)) {
        return true;
    }
    ctx.lookup_instance(&constraint.class_name, &ty).is_some()
}

/// Check that every constraint is satisfiable.
pub fn solve_constraints(ctx: &ClassContext, constraints: &[Constraint], subst: &Subst) -> bool {
    constraints
        .iter()
        .all(|c| check_constraint(ctx, c, subst))
}

/// The method table for a class/type pair, for dictionary passing.
/// Instance methods win; class defaults fill the gaps.
pub fn build_dictionary(
    ctx: &ClassContext,
    class_name: &str,
    ty: &Type,
) -> Option<FxHashMap<String, String>> {
    if let Some(inst) = ctx.lookup_instance(class_name, ty) {
        let mut dict = inst.methods.clone();
        if let Some(cls) = ctx.lookup_class(class_name) {
            for (name, body) in &cls.defaults {
                dict.entry(name.clone()).or_insert_with(|| body.clone());
            }
        }
        return Some(dict);
    }
    ctx.lookup_class(class_name).map(|cls| cls.defaults.clone())
}

/// Build the default class context: the prelude classes and the built-in
/// instances for the primitive types.
pub fn default_context() -> ClassContext {
    let mut ctx = ClassContext::new();

    let a = || Type::Var("a".to_string());
    let b = || Type::Var("b".to_string());
    let f_of = |t: Type| Type::Con("f".to_string(), vec![t]);
    let m_of = |t: Type| Type::Con("m".to_string(), vec![t]);
    let t_of = |t: Type| Type::Con("t".to_string(), vec![t]);

    ctx.add_class(
        "Eq",
        vec!["a".into()],
        vec![
            ("eq", Type::fun(vec![a(), a()], Type::Bool)),
            ("neq", Type::fun(vec![a(), a()], Type::Bool)),
        ],
        vec![],
    );
    ctx.add_class(
        "Ord",
        vec!["a".into()],
        vec![
            ("compare", Type::fun(vec![a(), a()], Type::con("Ordering"))),
            ("lt", Type::fun(vec![a(), a()], Type::Bool)),
            ("gt", Type::fun(vec![a(), a()], Type::Bool)),
            ("le", Type::fun(vec![a(), a()], Type::Bool)),
            ("ge", Type::fun(vec![a(), a()], Type::Bool)),
        ],
        vec!["Eq".into()],
    );
    ctx.add_class(
        "Show",
        vec!["a".into()],
        vec![("show", Type::fun(vec![a()], Type::String))],
        vec![],
    );
    ctx.add_class(
        "Read",
        vec!["a".into()],
        vec![("read", Type::fun(vec![Type::String], a()))],
        vec![],
    );
    ctx.add_class(
        "Num",
        vec!["a".into()],
        vec![
            ("add", Type::fun(vec![a(), a()], a())),
            ("sub", Type::fun(vec![a(), a()], a())),
            ("mul", Type::fun(vec![a(), a()], a())),
            ("negate", Type::fun(vec![a()], a())),
            ("zero", a()),
        ],
        vec![],
    );
    ctx.add_class(
        "Fractional",
        vec!["a".into()],
        vec![
            ("div", Type::fun(vec![a(), a()], a())),
            ("recip", Type::fun(vec![a()], a())),
            ("one", a()),
        ],
        vec!["Num".into()],
    );
    ctx.add_class(
        "Functor",
        vec!["f".into()],
        vec![(
            "fmap",
            Type::fun(vec![Type::fun(vec![a()], b()), f_of(a())], f_of(b())),
        )],
        vec![],
    );
    ctx.add_class(
        "Applicative",
        vec!["f".into()],
        vec![
            ("pure", Type::fun(vec![a()], f_of(a()))),
            (
                "ap",
                Type::fun(vec![f_of(Type::fun(vec![a()], b())), f_of(a())], f_of(b())),
            ),
        ],
        vec!["Functor".into()],
    );
    ctx.add_class(
        "Monad",
        vec!["m".into()],
        vec![
            ("return", Type::fun(vec![a()], m_of(a()))),
            (
                "bind",
                Type::fun(
                    vec![m_of(a()), Type::fun(vec![a()], m_of(b()))],
                    m_of(b()),
                ),
            ),
        ],
        vec!["Applicative".into()],
    );
    ctx.add_class(
        "Foldable",
        vec!["t".into()],
        vec![
            (
                "foldl",
                Type::fun(
                    vec![Type::fun(vec![b(), a()], b()), b(), t_of(a())],
                    b(),
                ),
            ),
            (
                "foldr",
                Type::fun(
                    vec![Type::fun(vec![a(), b()], b()), b(), t_of(a())],
                    b(),
                ),
            ),
        ],
        vec![],
    );
    ctx.add_class(
        "Traversable",
        vec!["t".into()],
        vec![(
            "traverse",
            Type::fun(
                vec![Type::fun(vec![a()], f_of(b())), t_of(a())],
                f_of(t_of(b())),
            ),
        )],
        vec!["Functor".into(), "Foldable".into()],
    );
    ctx.add_class(
        "Semigroup",
        vec!["a".into()],
        vec![("append", Type::fun(vec![a(), a()], a()))],
        vec![],
    );
    ctx.add_class(
        "Monoid",
        vec!["a".into()],
        vec![("empty", a())],
        vec!["Semigroup".into()],
    );

    add_builtin_instances(&mut ctx);
    ctx
}

/// Built-in instances for the primitive types. Implementations are host
/// lambdas handed verbatim to the code generator's dictionary builder.
fn add_builtin_instances(ctx: &mut ClassContext) {
    let eq_methods = vec![
        ("eq", "lambda x: lambda y: x == y"),
        ("neq", "lambda x: lambda y: x != y"),
    ];
    for ty in [Type::Int, Type::Float, Type::Bool, Type::String] {
        ctx.add_instance("Eq", ty, eq_methods.clone(), vec![]);
    }

    let ord_methods = vec![
        (
            "compare",
            "lambda x: lambda y: LT if x < y else (EQ if x == y else GT)",
        ),
        ("lt", "lambda x: lambda y: x < y"),
        ("gt", "lambda x: lambda y: x > y"),
        ("le", "lambda x: lambda y: x <= y"),
        ("ge", "lambda x: lambda y: x >= y"),
    ];
    for ty in [Type::Int, Type::Float, Type::String] {
        ctx.add_instance("Ord", ty, ord_methods.clone(), vec![]);
    }

    for ty in [Type::Int, Type::Float, Type::Bool] {
        ctx.add_instance("Show", ty, vec![("show", "lambda x: str(x)")], vec![]);
    }
    ctx.add_instance("Show", Type::String, vec![("show", "lambda x: x")], vec![]);

    let num_methods = |zero: &'static str| {
        vec![
            ("add", "lambda x: lambda y: x + y"),
            ("sub", "lambda x: lambda y: x - y"),
            ("mul", "lambda x: lambda y: x * y"),
            ("negate", "lambda x: -x"),
            ("zero", zero),
        ]
    };
    ctx.add_instance("Num", Type::Int, num_methods("0"), vec![]);
    ctx.add_instance("Num", Type::Float, num_methods("0.0"), vec![]);

    ctx.add_instance(
        "Fractional",
        Type::Float,
        vec![
            ("div", "lambda x: lambda y: x / y"),
            ("recip", "lambda x: 1.0 / x"),
            ("one", "1.0"),
        ],
        vec![],
    );

    ctx.add_instance(
        "Semigroup",
        Type::String,
        vec![("append", "lambda x: lambda y: x + y")],
        vec![],
    );
    ctx.add_instance("Monoid", Type::String, vec![("empty", "\"\"")], vec![]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_context_has_prelude_classes() {
        let ctx = default_context();
        for name in [
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
            assert!(ctx.lookup_class(name).is_some(), "missing class {name}");
        }
    }

    #[test]
    fn superclass_closure_is_transitive() {
        let ctx = default_context();
        let supers = ctx.get_all_superclasses("Monad");
        assert!(supers.contains("Applicative"));
        assert!(supers.contains("Functor"));

        let traversable = ctx.get_all_superclasses("Traversable");
        assert!(traversable.contains("Functor"));
        assert!(traversable.contains("Foldable"));
    }

    #[test]
    fn instances_are_keyed_structurally() {
        let mut ctx = default_context();
        ctx.add_instance(
            "Eq",
            Type::List(Box::new(Type::Int)),
            vec![("eq", "lambda x: lambda y: x == y")],
            vec![],
        );

        assert!(ctx
            .lookup_instance("Eq", &Type::List(Box::new(Type::Int)))
            .is_some());
        assert!(ctx
            .lookup_instance("Eq", &Type::List(Box::new(Type::String)))
            .is_none());
    }

    #[test]
    fn check_constraint_resolves_through_subst() {
        let ctx = default_context();
        let subst = Subst::singleton("a", Type::Int);
        let good = Constraint::new("Eq", Type::Var("a".into()));
        assert!(check_constraint(&ctx, &good, &subst));

        let subst = Subst::singleton("a", Type::Unit);
        assert!(!check_constraint(&ctx, &good, &subst));
    }

    #[test]
    fn unresolved_constraints_are_deferred() {
        let ctx = default_context();
        let constraint = Constraint::new("Eq", Type::Var("a".into()));
        assert!(check_constraint(&ctx, &constraint, &Subst::new()));
    }

    #[test]
    fn solve_constraints_requires_every_instance() {
        let ctx = default_context();
        let subst = Subst::singleton("a", Type::Int);
        let constraints = [
            Constraint::new("Eq", Type::Var("a".into())),
            Constraint::new("Num", Type::Var("a".into())),
        ];
        assert!(solve_constraints(&ctx, &constraints, &subst));

        let with_bad = [
            Constraint::new("Eq", Type::Var("a".into())),
            Constraint::new("Fractional", Type::Var("a".into())), // no Fractional Int
        ];
        assert!(!solve_constraints(&ctx, &with_bad, &subst));
    }

    #[test]
    fn build_dictionary_returns_instance_methods() {
        let ctx = default_context();
        let dict = build_dictionary(&ctx, "Num", &Type::Int).unwrap();
        assert!(dict.contains_key("add"));
        assert!(dict.contains_key("zero"));
    }

    #[test]
    fn check_superclasses_of_known_classes() {
        let ctx = default_context();
        assert!(ctx.check_superclasses("Ord"));
        assert!(!ctx.check_superclasses("Nope"));
    }
}
