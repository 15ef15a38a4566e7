use serde::Serialize;

use pfn_common::span::Span;

/// A pattern in a match case or binding position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pattern {
    pub kind: PatternKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum PatternKind {
    Int(i64),
    Float(f64),
    Str(String),
    Char(char),
    Bool(bool),
    /// A variable binder. Introduces the name exactly once per pattern;
    /// the checker rejects duplicates.
    Var(String),
    /// `_` -- matches anything, binds nothing.
    Wildcard,
    /// `head :: tail`; right-associative.
    Cons {
        head: Box<Pattern>,
        tail: Box<Pattern>,
    },
    /// `[p1, ..., pN]`, matching exactly N-length lists, or
    /// `[p1, ..., pN | rest]` with a rest binder.
    List {
        elements: Vec<Pattern>,
        rest: Option<Box<Pattern>>,
    },
    /// `(p1, ..., pN)`. The empty tuple is the unit pattern `()`.
    Tuple(Vec<Pattern>),
    /// `{ field: p, ... }`.
    Record(Vec<(String, Pattern)>),
    /// `Ctor p1 ... pN`. A capitalised identifier in pattern position.
    Constructor { name: String, args: Vec<Pattern> },
}

impl Pattern {
    pub fn new(kind: PatternKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Collect the names bound by this pattern, in left-to-right order.
    pub fn bound_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        self.collect_bound_names(&mut names);
        names
    }

    fn collect_bound_names(&self, out: &mut Vec<String>) {
        match &self.kind {
            PatternKind::Var(name) => out.push(name.clone()),
            PatternKind::Cons { head, tail } => {
                head.collect_bound_names(out);
                tail.collect_bound_names(out);
            }
            PatternKind::List { elements, rest } => {
                for elem in elements {
                    elem.collect_bound_names(out);
                }
                if let Some(rest) = rest {
                    rest.collect_bound_names(out);
                }
            }
            PatternKind::Tuple(elements) => {
                for elem in elements {
                    elem.collect_bound_names(out);
                }
            }
            PatternKind::Record(fields) => {
                for (_, pat) in fields {
                    pat.collect_bound_names(out);
                }
            }
            PatternKind::Constructor { args, .. } => {
                for arg in args {
                    arg.collect_bound_names(out);
                }
            }
            _ => {}
        }
    }
}
