//! Append-only statement accumulator
//!
//! One builder is owned by a single synthesis call. Nested blocks are built
//! by child builders handed to closures, so statement order in the output is
//! exactly call order.

use super::ir::{AssignOp, Expr, Stmt, Ty};

/// Accumulates GLSL statements in order
#[derive(Debug, Default)]
pub struct SnippetBuilder {
    stmts: Vec<Stmt>,
}

impl SnippetBuilder {
    /// Empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a prepared statement.
    pub fn push(&mut self, stmt: Stmt) -> &mut Self {
        self.stmts.push(stmt);
        self
    }

    /// Append every statement from `stmts`.
    pub fn extend(&mut self, stmts: impl IntoIterator<Item = Stmt>) -> &mut Self {
        self.stmts.extend(stmts);
        self
    }

    /// `ty name;`
    pub fn declare(&mut self, ty: Ty, name: impl Into<String>) -> &mut Self {
        self.push(Stmt::Declare {
            ty,
            name: name.into(),
            init: None,
        })
    }

    /// `ty name = init;`
    pub fn declare_init(&mut self, ty: Ty, name: impl Into<String>, init: Expr) -> &mut Self {
        self.push(Stmt::Declare {
            ty,
            name: name.into(),
            init: Some(init),
        })
    }

    /// `target = value;`
    pub fn assign(&mut self, target: impl Into<Expr>, value: Expr) -> &mut Self {
        self.push(Stmt::Assign {
            target: target.into(),
            op: AssignOp::Set,
            value,
        })
    }

    /// `target += value;`
    pub fn add_assign(&mut self, target: impl Into<Expr>, value: Expr) -> &mut Self {
        self.push(Stmt::Assign {
            target: target.into(),
            op: AssignOp::Add,
            value,
        })
    }

    /// `target -= value;`
    pub fn sub_assign(&mut self, target: impl Into<Expr>, value: Expr) -> &mut Self {
        self.push(Stmt::Assign {
            target: target.into(),
            op: AssignOp::Sub,
            value,
        })
    }

    /// Expression statement, typically a call.
    pub fn eval(&mut self, expr: Expr) -> &mut Self {
        self.push(Stmt::Expr(expr))
    }

    /// `return value;`
    pub fn ret(&mut self, value: Expr) -> &mut Self {
        self.push(Stmt::Return(value))
    }

    /// Verbatim caller-supplied GLSL.
    pub fn raw(&mut self, text: impl Into<String>) -> &mut Self {
        self.push(Stmt::Raw(text.into()))
    }

    /// `if (cond) { then }`
    pub fn if_then(&mut self, cond: Expr, then: impl FnOnce(&mut SnippetBuilder)) -> &mut Self {
        let then = Self::nested(then);
        self.push(Stmt::If {
            cond,
            then,
            otherwise: Vec::new(),
        })
    }

    /// `if (cond) { then } else { otherwise }`
    pub fn if_else(
        &mut self,
        cond: Expr,
        then: impl FnOnce(&mut SnippetBuilder),
        otherwise: impl FnOnce(&mut SnippetBuilder),
    ) -> &mut Self {
        let then = Self::nested(then);
        let otherwise = Self::nested(otherwise);
        self.push(Stmt::If {
            cond,
            then,
            otherwise,
        })
    }

    /// `for (int var = 0; var < end; var += step) { body }`
    pub fn for_range(
        &mut self,
        var: impl Into<String>,
        end: Expr,
        step: i32,
        body: impl FnOnce(&mut SnippetBuilder),
    ) -> &mut Self {
        let body = Self::nested(body);
        self.push(Stmt::For {
            var: var.into(),
            start: 0,
            end,
            step,
            body,
        })
    }

    fn nested(build: impl FnOnce(&mut SnippetBuilder)) -> Vec<Stmt> {
        let mut child = SnippetBuilder::new();
        build(&mut child);
        child.finish()
    }

    /// Number of top-level statements so far
    pub fn len(&self) -> usize {
        self.stmts.len()
    }

    /// Whether nothing has been appended
    pub fn is_empty(&self) -> bool {
        self.stmts.is_empty()
    }

    /// Consume the builder, yielding statements in append order.
    pub fn finish(self) -> Vec<Stmt> {
        self.stmts
    }
}
