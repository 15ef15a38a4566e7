//! Expression lowering: each AST node to one Python expression.

use rustc_hash::FxHashMap;

use pfn_parser::ast::{BinOpKind, Expr, ExprKind, UnaryOpKind};

use super::{python_safe_name, CodeGenerator};

impl CodeGenerator {
    pub(crate) fn gen_expr(&mut self, expr: &Expr) -> String {
        match &expr.kind {
            ExprKind::Int(value) => value.to_string(),
            ExprKind::Float(value) => float_literal(*value),
            ExprKind::Str(value) => string_literal(value),
            ExprKind::Char(value) => string_literal(&value.to_string()),
            ExprKind::Bool(value) => if *value { "True" } else { "False" }.to_string(),
            ExprKind::Unit => "None".to_string(),

            ExprKind::Var(name) => self.lookup_name(name),

            ExprKind::Lambda { params, body } => self.gen_curried_lambda(params, body),

            ExprKind::App { func, args } => {
                let func_code = self.gen_callee(func);
                let mut code = func_code;
                for arg in args {
                    let arg_code = self.gen_expr(arg);
                    code = format!("{code}({arg_code})");
                }
                code
            }

            ExprKind::BinOp { left, op, right } => {
                let left_code = self.gen_operand(left);
                let right_code = self.gen_operand(right);
                match op {
                    BinOpKind::Cons => format!("[{left_code}] + {right_code}"),
                    BinOpKind::Concat => format!("{left_code} + {right_code}"),
                    BinOpKind::And => format!("{left_code} and {right_code}"),
                    BinOpKind::Or => format!("{left_code} or {right_code}"),
                    other => format!("{left_code} {other} {right_code}"),
                }
            }

            ExprKind::UnaryOp { op, operand } => {
                let operand_code = self.gen_operand(operand);
                match op {
                    UnaryOpKind::Neg => format!("-{operand_code}"),
                    UnaryOpKind::Not => format!("not {operand_code}"),
                }
            }

            ExprKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                let cond_code = self.gen_operand(cond);
                let then_code = self.gen_operand(then_branch);
                let else_code = self.gen_operand(else_branch);
                format!("{then_code} if {cond_code} else {else_code}")
            }

            ExprKind::Let { name, value, body } => {
                let value_code = self.gen_expr(value);
                self.push_mask(std::iter::once(name.as_str()));
                let body_code = self.gen_expr(body);
                self.pop_scope();
                format!("(lambda {}: {body_code})({value_code})", python_safe_name(name))
            }

            ExprKind::LetPattern {
                pattern,
                value,
                body,
            } => {
                let value_code = self.gen_expr(value);
                let scrutinee = self.fresh_name("m");
                let (_, bindings) = self.compile_pattern(pattern, &scrutinee);
                self.push_scope(bindings.into_iter().collect());
                let body_code = self.gen_expr(body);
                self.pop_scope();
                format!("(lambda {scrutinee}: {body_code})({value_code})")
            }

            ExprKind::LetFunc {
                name,
                params,
                value,
                body,
            } => {
                // A let-bound function may reference its own name; a
                // recursive one ties the knot through a one-slot cell.
                if value.refers_to(name) {
                    let cell = self.fresh_name("cell");
                    let mut bindings = FxHashMap::default();
                    bindings.insert(name.clone(), format!("{cell}[0]"));
                    self.push_scope(bindings);
                    let value_code = self.gen_curried_lambda(params, value);
                    let body_code = self.gen_expr(body);
                    self.pop_scope();
                    format!(
                        "(lambda {cell}: ({cell}.__setitem__(0, ({value_code})) or {body_code}))([None])"
                    )
                } else {
                    let value_code = self.gen_curried_lambda(params, value);
                    self.push_mask(std::iter::once(name.as_str()));
                    let body_code = self.gen_expr(body);
                    self.pop_scope();
                    format!(
                        "(lambda {}: {body_code})({value_code})",
                        python_safe_name(name)
                    )
                }
            }

            ExprKind::Match { scrutinee, cases } => {
                let scrutinee_code = self.gen_expr(scrutinee);
                if cases.is_empty() {
                    return "None".to_string();
                }

                let scrutinee_var = self.fresh_name("m");

                // Build the chain back to front so each case falls
                // through to the rest. The final fallback is None: an
                // unmatched scrutinee yields None, as in the reference
                // runtime (the exhaustiveness checker makes this
                // unreachable for checked programs).
                let mut chain: Option<String> = None;
                for case in cases.iter().rev() {
                    let (check, bindings) = self.compile_pattern(&case.pattern, &scrutinee_var);
                    self.push_scope(bindings.into_iter().collect());
                    let body_code = self.gen_operand(&case.body);
                    let check = match &case.guard {
                        Some(guard) => {
                            let guard_code = self.gen_operand(guard);
                            if check == "True" {
                                guard_code
                            } else {
                                format!("{check} and {guard_code}")
                            }
                        }
                        None => check,
                    };
                    self.pop_scope();

                    chain = Some(if check == "True" {
                        // An always-matching case ends the chain; later
                        // cases are unreachable.
                        body_code
                    } else {
                        match chain {
                            None => format!("{body_code} if {check} else None"),
                            Some(rest) => format!("{body_code} if {check} else ({rest})"),
                        }
                    });
                }

                format!(
                    "(lambda {scrutinee_var}: ({}))({scrutinee_code})",
                    chain.expect("non-empty match produces a chain")
                )
            }

            ExprKind::DoNotation { bindings, body } => {
                // Lower right to left: each binding becomes an
                // immediately invoked lambda over its name.
                if bindings.is_empty() {
                    let code = self.gen_expr(body);
                    return format!("({code})");
                }
                // Each binding's name is in scope for everything to its
                // right, masking any outer rename.
                for binding in bindings {
                    self.push_mask(std::iter::once(binding.name.as_str()));
                }
                let mut code = self.gen_expr(body);
                for binding in bindings.iter().rev() {
                    self.pop_scope();
                    let value_code = self.gen_expr(&binding.value);
                    code = format!(
                        "(lambda {}: {code})({value_code})",
                        python_safe_name(&binding.name)
                    );
                }
                code
            }

            ExprKind::ListLit(elements) => {
                let elems: Vec<String> = elements.iter().map(|e| self.gen_expr(e)).collect();
                format!("[{}]", elems.join(", "))
            }

            ExprKind::TupleLit(elements) => {
                let elems: Vec<String> = elements.iter().map(|e| self.gen_expr(e)).collect();
                if elems.len() == 1 {
                    format!("({},)", elems[0])
                } else {
                    format!("({})", elems.join(", "))
                }
            }

            ExprKind::RecordLit(fields) => {
                let entries: Vec<String> = fields
                    .iter()
                    .map(|f| format!("{:?}: {}", f.name, self.gen_expr(&f.value)))
                    .collect();
                format!("Record({{{}}})", entries.join(", "))
            }

            ExprKind::RecordUpdate { record, updates } => {
                let record_code = self.gen_operand(record);
                let entries: Vec<String> = updates
                    .iter()
                    .map(|f| format!("{:?}: {}", f.name, self.gen_expr(&f.value)))
                    .collect();
                format!("Record({{**{record_code}, {}}})", entries.join(", "))
            }

            ExprKind::FieldAccess { expr, field } => {
                let expr_code = self.gen_operand(expr);
                format!("{expr_code}.{}", python_safe_name(field))
            }

            ExprKind::IndexAccess { expr, index } => {
                let expr_code = self.gen_operand(expr);
                let index_code = self.gen_expr(index);
                format!("{expr_code}[{index_code}]")
            }

            ExprKind::Slice {
                expr,
                start,
                end,
                step,
            } => {
                let expr_code = self.gen_operand(expr);
                let start_code = start.as_ref().map(|e| self.gen_expr(e)).unwrap_or_default();
                let end_code = end.as_ref().map(|e| self.gen_expr(e)).unwrap_or_default();
                match step {
                    Some(step) => {
                        let step_code = self.gen_expr(step);
                        format!("{expr_code}[{start_code}:{end_code}:{step_code}]")
                    }
                    None => format!("{expr_code}[{start_code}:{end_code}]"),
                }
            }

            ExprKind::Handle {
                expr,
                cases,
                handler_name,
            } => {
                let body_code = self.gen_expr(expr);
                let handler = match handler_name {
                    Some(name) => self.lookup_name(name),
                    None => self.gen_handler_cases(cases),
                };
                format!("_handle(lambda: {body_code}, {handler})")
            }

            ExprKind::Perform { effect, op, args } => {
                let arg_codes: Vec<String> = args.iter().map(|a| self.gen_expr(a)).collect();
                format!(
                    "_perform({effect:?}, {op:?}, [{}])",
                    arg_codes.join(", ")
                )
            }
        }
    }

    /// An expression in operand position: compound forms get wrapped so
    /// the emitted code follows the host's precedence, simple forms pass
    /// through bare.
    pub(crate) fn gen_operand(&mut self, expr: &Expr) -> String {
        let code = self.gen_expr(expr);
        if matches!(
            expr.kind,
            ExprKind::Int(_)
                | ExprKind::Float(_)
                | ExprKind::Str(_)
                | ExprKind::Char(_)
                | ExprKind::Bool(_)
                | ExprKind::Unit
                | ExprKind::Var(_)
                | ExprKind::App { .. }
                | ExprKind::ListLit(_)
                | ExprKind::TupleLit(_)
                | ExprKind::RecordLit(_)
                | ExprKind::RecordUpdate { .. }
                | ExprKind::FieldAccess { .. }
                | ExprKind::IndexAccess { .. }
                | ExprKind::Slice { .. }
                | ExprKind::Perform { .. }
                | ExprKind::Match { .. }
                | ExprKind::Let { .. }
                | ExprKind::LetPattern { .. }
                | ExprKind::LetFunc { .. }
                | ExprKind::DoNotation { .. }
                | ExprKind::Handle { .. }
        ) {
            code
        } else {
            format!("({code})")
        }
    }

    /// A callee: anything that is not already callable syntax gets
    /// parenthesised (`(lambda x: x)(1)`).
    fn gen_callee(&mut self, expr: &Expr) -> String {
        let code = self.gen_expr(expr);
        if matches!(
            expr.kind,
            ExprKind::Var(_)
                | ExprKind::App { .. }
                | ExprKind::FieldAccess { .. }
                | ExprKind::IndexAccess { .. }
        ) {
            code
        } else {
            format!("({code})")
        }
    }
}

/// A Python float literal. Whole floats keep a trailing `.0` so the
/// emitted token stays a float.
fn float_literal(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}

/// A double-quoted Python string literal with the escapes the lexer
/// decodes.
fn string_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn float_literals_keep_decimal_point() {
        assert_eq!(float_literal(3.0), "3.0");
        assert_eq!(float_literal(3.25), "3.25");
        assert_eq!(float_literal(-2.0), "-2.0");
    }

    #[test]
    fn string_literals_escape() {
        assert_eq!(string_literal("a\"b"), "\"a\\\"b\"");
        assert_eq!(string_literal("line\n"), "\"line\\n\"");
        assert_eq!(string_literal("back\\slash"), "\"back\\\\slash\"");
    }
}
