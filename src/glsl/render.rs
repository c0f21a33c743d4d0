//! Single-pass text rendering of the GLSL tree

use std::fmt::Write;

use super::ir::{Expr, Function, Item, Stmt, TranslationUnit};

const INDENT: &str = "  ";

/// Postfix operators (call, swizzle, subscript) bind tighter than any binary op.
const POSTFIX_PRECEDENCE: u8 = 12;
const UNARY_PRECEDENCE: u8 = 11;

/// Render a whole translation unit; items are separated by a blank line.
pub fn render_unit(unit: &TranslationUnit) -> String {
    let mut out = String::new();
    for (i, item) in unit.items.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        render_item(&mut out, item);
    }
    out
}

fn render_item(out: &mut String, item: &Item) {
    match item {
        Item::Const { ty, name, value } => {
            let _ = writeln!(out, "const {ty} {name} = {};", render_expr(value));
        }
        Item::Function(function) => render_function(out, function),
    }
}

/// Render one function definition.
pub fn render_function(out: &mut String, function: &Function) {
    let params = function
        .params
        .iter()
        .map(|p| format!("{} {}", p.ty, p.name))
        .collect::<Vec<_>>()
        .join(", ");
    let _ = writeln!(out, "{} {}({params}) {{", function.ret, function.name);
    render_block(out, &function.body, 1);
    out.push_str("}\n");
}

/// Render statements at the given indentation depth.
pub fn render_block(out: &mut String, stmts: &[Stmt], depth: usize) {
    for stmt in stmts {
        render_stmt(out, stmt, depth);
    }
}

fn pad(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push_str(INDENT);
    }
}

fn render_stmt(out: &mut String, stmt: &Stmt, depth: usize) {
    match stmt {
        Stmt::Declare { ty, name, init } => {
            pad(out, depth);
            match init {
                Some(init) => {
                    let _ = writeln!(out, "{ty} {name} = {};", render_expr(init));
                }
                None => {
                    let _ = writeln!(out, "{ty} {name};");
                }
            }
        }
        Stmt::Assign { target, op, value } => {
            pad(out, depth);
            let _ = writeln!(
                out,
                "{} {} {};",
                render_expr(target),
                op.token(),
                render_expr(value)
            );
        }
        Stmt::Expr(expr) => {
            pad(out, depth);
            let _ = writeln!(out, "{};", render_expr(expr));
        }
        Stmt::If {
            cond,
            then,
            otherwise,
        } => {
            pad(out, depth);
            let _ = writeln!(out, "if ({}) {{", render_expr(cond));
            render_block(out, then, depth + 1);
            pad(out, depth);
            if otherwise.is_empty() {
                out.push_str("}\n");
            } else {
                out.push_str("} else {\n");
                render_block(out, otherwise, depth + 1);
                pad(out, depth);
                out.push_str("}\n");
            }
        }
        Stmt::For {
            var,
            start,
            end,
            step,
            body,
        } => {
            pad(out, depth);
            let increment = if *step == 1 {
                format!("{var}++")
            } else {
                format!("{var} += {step}")
            };
            let _ = writeln!(
                out,
                "for (int {var} = {start}; {var} < {}; {increment}) {{",
                render_expr(end)
            );
            render_block(out, body, depth + 1);
            pad(out, depth);
            out.push_str("}\n");
        }
        Stmt::Return(expr) => {
            pad(out, depth);
            let _ = writeln!(out, "return {};", render_expr(expr));
        }
        Stmt::Raw(text) => {
            for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
                pad(out, depth);
                out.push_str(line);
                out.push('\n');
            }
        }
    }
}

/// Render an expression with the minimum parentheses needed.
pub fn render_expr(expr: &Expr) -> String {
    let mut out = String::new();
    write_expr(&mut out, expr);
    out
}

fn precedence(expr: &Expr) -> u8 {
    match expr {
        Expr::Binary { op, .. } => op.precedence(),
        Expr::Neg(_) => UNARY_PRECEDENCE,
        _ => POSTFIX_PRECEDENCE,
    }
}

fn write_operand(out: &mut String, expr: &Expr, min_precedence: u8) {
    if precedence(expr) < min_precedence {
        out.push('(');
        write_expr(out, expr);
        out.push(')');
    } else {
        write_expr(out, expr);
    }
}

fn write_args(out: &mut String, args: &[Expr]) {
    out.push('(');
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        write_expr(out, arg);
    }
    out.push(')');
}

fn write_expr(out: &mut String, expr: &Expr) {
    match expr {
        Expr::Ident(name) => out.push_str(name),
        Expr::Int(value) => {
            let _ = write!(out, "{value}");
        }
        Expr::Float(value) => out.push_str(&float_literal(*value)),
        Expr::Call { name, args } => {
            out.push_str(name);
            write_args(out, args);
        }
        Expr::Construct { ty, args } => {
            out.push_str(ty.as_str());
            write_args(out, args);
        }
        Expr::Binary { op, lhs, rhs } => {
            let p = op.precedence();
            // Left-associative: an equal-precedence right operand needs parens.
            write_operand(out, lhs, p);
            let _ = write!(out, " {} ", op.token());
            write_operand(out, rhs, p + 1);
        }
        Expr::Neg(inner) => {
            out.push('-');
            write_operand(out, inner, UNARY_PRECEDENCE);
        }
        Expr::Swizzle { base, components } => {
            write_operand(out, base, POSTFIX_PRECEDENCE);
            out.push('.');
            out.push_str(components);
        }
        Expr::Index { base, index } => {
            write_operand(out, base, POSTFIX_PRECEDENCE);
            out.push('[');
            write_expr(out, index);
            out.push(']');
        }
    }
}

/// GLSL float literal: Rust's shortest round-trip form, forced to carry a `.`.
///
/// `Display` for `f64` never switches to exponent notation, so the
/// accumulator epsilon renders as `0.000000000000001`.
pub fn float_literal(value: f64) -> String {
    let mut text = format!("{value}");
    if !text.contains('.') && !text.contains("inf") && !text.contains("NaN") {
        text.push_str(".0");
    }
    text
}
