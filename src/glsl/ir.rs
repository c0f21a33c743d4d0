//! Typed GLSL ES tree emitted by the kernel programs
//!
//! The tree covers exactly the subset of GLSL the packed kernels need.
//! Caller-supplied snippets (activation and unary-op bodies) are carried
//! verbatim as [`Stmt::Raw`].

use std::fmt;

/// GLSL value types used by the packed kernels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ty {
    /// `void`
    Void,
    /// `bool`
    Bool,
    /// `int`
    Int,
    /// `float`
    Float,
    /// `vec2`
    Vec2,
    /// `vec3`
    Vec3,
    /// `vec4`
    Vec4,
    /// `ivec2`
    IVec2,
    /// `ivec3`
    IVec3,
    /// `ivec4`
    IVec4,
}

impl Ty {
    /// GLSL spelling of the type
    pub fn as_str(self) -> &'static str {
        match self {
            Ty::Void => "void",
            Ty::Bool => "bool",
            Ty::Int => "int",
            Ty::Float => "float",
            Ty::Vec2 => "vec2",
            Ty::Vec3 => "vec3",
            Ty::Vec4 => "vec4",
            Ty::IVec2 => "ivec2",
            Ty::IVec3 => "ivec3",
            Ty::IVec4 => "ivec4",
        }
    }

    /// Integer vector type holding `rank` coordinates (`int` for rank 1).
    pub fn int_coords(rank: usize) -> Ty {
        match rank {
            0 | 1 => Ty::Int,
            2 => Ty::IVec2,
            3 => Ty::IVec3,
            _ => Ty::IVec4,
        }
    }
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Binary operators, ordered by nothing in particular; see [`BinOp::precedence`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinOp {
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `&&`
    And,
    /// `||`
    Or,
}

impl BinOp {
    /// GLSL operator token
    pub fn token(self) -> &'static str {
        match self {
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::And => "&&",
            BinOp::Or => "||",
        }
    }

    /// Binding strength; higher binds tighter. Mirrors the GLSL ES 1.00 table.
    pub fn precedence(self) -> u8 {
        match self {
            BinOp::Mul | BinOp::Div => 10,
            BinOp::Add | BinOp::Sub => 9,
            BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => 7,
            BinOp::Eq | BinOp::Ne => 6,
            BinOp::And => 4,
            BinOp::Or => 3,
        }
    }
}

/// Assignment operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssignOp {
    /// `=`
    Set,
    /// `+=`
    Add,
    /// `-=`
    Sub,
}

impl AssignOp {
    /// GLSL operator token
    pub fn token(self) -> &'static str {
        match self {
            AssignOp::Set => "=",
            AssignOp::Add => "+=",
            AssignOp::Sub => "-=",
        }
    }
}

/// GLSL expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Variable, uniform or parameter reference
    Ident(String),
    /// Integer literal
    Int(i32),
    /// Float literal, always rendered with a decimal point
    Float(f64),
    /// Function call (user functions and built-ins)
    Call {
        /// Callee name
        name: String,
        /// Arguments in order
        args: Vec<Expr>,
    },
    /// Type constructor such as `vec4(a.zw, b.xy)`
    Construct {
        /// Constructed type
        ty: Ty,
        /// Constructor arguments
        args: Vec<Expr>,
    },
    /// Binary operation
    Binary {
        /// Operator
        op: BinOp,
        /// Left operand
        lhs: Box<Expr>,
        /// Right operand
        rhs: Box<Expr>,
    },
    /// Arithmetic negation
    Neg(Box<Expr>),
    /// Component selection (`.xy`, `.xxzz`)
    Swizzle {
        /// Vector expression
        base: Box<Expr>,
        /// Components, drawn from `xyzw`
        components: &'static str,
    },
    /// Array or vector subscript
    Index {
        /// Indexed expression
        base: Box<Expr>,
        /// Subscript
        index: Box<Expr>,
    },
}

/// Shorthand for [`Expr::Ident`]
pub fn ident(name: impl Into<String>) -> Expr {
    Expr::Ident(name.into())
}

/// Shorthand for [`Expr::Int`]
pub fn int(value: i32) -> Expr {
    Expr::Int(value)
}

/// Shorthand for [`Expr::Float`]
pub fn float(value: f64) -> Expr {
    Expr::Float(value)
}

/// Shorthand for [`Expr::Call`]
pub fn call(name: impl Into<String>, args: Vec<Expr>) -> Expr {
    Expr::Call {
        name: name.into(),
        args,
    }
}

/// Shorthand for [`Expr::Construct`]
pub fn construct(ty: Ty, args: Vec<Expr>) -> Expr {
    Expr::Construct { ty, args }
}

/// `vec4(v)` splat of a float literal
pub fn vec4_splat(value: f64) -> Expr {
    construct(Ty::Vec4, vec![float(value)])
}

#[allow(clippy::should_implement_trait)]
impl Expr {
    fn binary(self, op: BinOp, rhs: Expr) -> Expr {
        Expr::Binary {
            op,
            lhs: Box::new(self),
            rhs: Box::new(rhs),
        }
    }

    /// `self + rhs`
    pub fn add(self, rhs: Expr) -> Expr {
        self.binary(BinOp::Add, rhs)
    }

    /// `self - rhs`
    pub fn sub(self, rhs: Expr) -> Expr {
        self.binary(BinOp::Sub, rhs)
    }

    /// `self * rhs`
    pub fn mul(self, rhs: Expr) -> Expr {
        self.binary(BinOp::Mul, rhs)
    }

    /// `self / rhs`
    pub fn div(self, rhs: Expr) -> Expr {
        self.binary(BinOp::Div, rhs)
    }

    /// `self < rhs`
    pub fn lt(self, rhs: Expr) -> Expr {
        self.binary(BinOp::Lt, rhs)
    }

    /// `self >= rhs`
    pub fn ge(self, rhs: Expr) -> Expr {
        self.binary(BinOp::Ge, rhs)
    }

    /// `self == rhs`
    pub fn equals(self, rhs: Expr) -> Expr {
        self.binary(BinOp::Eq, rhs)
    }

    /// `self && rhs`
    pub fn and(self, rhs: Expr) -> Expr {
        self.binary(BinOp::And, rhs)
    }

    /// `-self`
    pub fn neg(self) -> Expr {
        Expr::Neg(Box::new(self))
    }

    /// `self.<components>`
    pub fn swizzle(self, components: &'static str) -> Expr {
        debug_assert!(
            !components.is_empty()
                && components.len() <= 4
                && components.chars().all(|c| "xyzw".contains(c)),
            "bad swizzle {components:?}"
        );
        Expr::Swizzle {
            base: Box::new(self),
            components,
        }
    }

    /// `self[index]`
    pub fn at(self, index: Expr) -> Expr {
        Expr::Index {
            base: Box::new(self),
            index: Box::new(index),
        }
    }

    /// Visit this expression and every sub-expression, parents first.
    pub fn walk<'a>(&'a self, f: &mut impl FnMut(&'a Expr)) {
        f(self);
        match self {
            Expr::Ident(_) | Expr::Int(_) | Expr::Float(_) => {}
            Expr::Call { args, .. } | Expr::Construct { args, .. } => {
                for arg in args {
                    arg.walk(f);
                }
            }
            Expr::Binary { lhs, rhs, .. } => {
                lhs.walk(f);
                rhs.walk(f);
            }
            Expr::Neg(inner) => inner.walk(f),
            Expr::Swizzle { base, .. } => base.walk(f),
            Expr::Index { base, index } => {
                base.walk(f);
                index.walk(f);
            }
        }
    }

    /// Whether any identifier in this expression is named `name`.
    pub fn mentions(&self, name: &str) -> bool {
        let mut found = false;
        self.walk(&mut |e| {
            if matches!(e, Expr::Ident(n) if n == name) {
                found = true;
            }
        });
        found
    }

    /// Name of the called function if this is a call expression.
    pub fn callee(&self) -> Option<&str> {
        match self {
            Expr::Call { name, .. } => Some(name),
            _ => None,
        }
    }
}

impl From<&str> for Expr {
    fn from(name: &str) -> Self {
        ident(name)
    }
}

impl From<String> for Expr {
    fn from(name: String) -> Self {
        Expr::Ident(name)
    }
}

impl From<i32> for Expr {
    fn from(value: i32) -> Self {
        Expr::Int(value)
    }
}

/// GLSL statement
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// `ty name;` or `ty name = init;`
    Declare {
        /// Declared type
        ty: Ty,
        /// Variable name
        name: String,
        /// Optional initializer
        init: Option<Expr>,
    },
    /// `target op value;`
    Assign {
        /// Assigned l-value
        target: Expr,
        /// Assignment operator
        op: AssignOp,
        /// Assigned value
        value: Expr,
    },
    /// Expression evaluated for its side effect (`setOutput(result);`)
    Expr(Expr),
    /// `if (cond) { .. } else { .. }`
    If {
        /// Condition
        cond: Expr,
        /// Taken branch
        then: Vec<Stmt>,
        /// Else branch, omitted from output when empty
        otherwise: Vec<Stmt>,
    },
    /// `for (int var = start; var < end; var += step) { .. }`
    For {
        /// Loop counter
        var: String,
        /// Initial value
        start: i32,
        /// Exclusive bound; must be a constant expression for GLSL ES 1.00
        end: Expr,
        /// Increment
        step: i32,
        /// Loop body
        body: Vec<Stmt>,
    },
    /// `return value;`
    Return(Expr),
    /// Verbatim caller-supplied GLSL, re-indented line by line
    Raw(String),
}

impl Stmt {
    /// Visit this statement and all nested statements, parents first.
    pub fn walk<'a>(&'a self, f: &mut impl FnMut(&'a Stmt)) {
        f(self);
        match self {
            Stmt::If {
                then, otherwise, ..
            } => {
                for stmt in then.iter().chain(otherwise) {
                    stmt.walk(f);
                }
            }
            Stmt::For { body, .. } => {
                for stmt in body {
                    stmt.walk(f);
                }
            }
            _ => {}
        }
    }

    /// Expressions directly owned by this statement (not nested statements).
    pub fn exprs(&self) -> Vec<&Expr> {
        match self {
            Stmt::Declare { init, .. } => init.iter().collect(),
            Stmt::Assign { target, value, .. } => vec![target, value],
            Stmt::Expr(e) | Stmt::Return(e) => vec![e],
            Stmt::If { cond, .. } => vec![cond],
            Stmt::For { end, .. } => vec![end],
            Stmt::Raw(_) => Vec::new(),
        }
    }
}

/// Function parameter
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    /// Parameter type
    pub ty: Ty,
    /// Parameter name
    pub name: String,
}

impl Param {
    /// Create a parameter
    pub fn new(ty: Ty, name: impl Into<String>) -> Self {
        Self {
            ty,
            name: name.into(),
        }
    }
}

/// Function definition
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    /// Return type
    pub ret: Ty,
    /// Function name
    pub name: String,
    /// Parameters in order
    pub params: Vec<Param>,
    /// Body statements
    pub body: Vec<Stmt>,
}

impl Function {
    /// Create a function definition
    pub fn new(ret: Ty, name: impl Into<String>, params: Vec<Param>, body: Vec<Stmt>) -> Self {
        Self {
            ret,
            name: name.into(),
            params,
            body,
        }
    }

    /// `void main()` with the given body
    pub fn main(body: Vec<Stmt>) -> Self {
        Self::new(Ty::Void, "main", Vec::new(), body)
    }
}

/// Top-level declaration
#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    /// `const ty name = value;`
    Const {
        /// Constant type
        ty: Ty,
        /// Constant name
        name: String,
        /// Constant value
        value: Expr,
    },
    /// Function definition
    Function(Function),
}

/// Ordered top-level items forming a program's user code
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TranslationUnit {
    /// Items in emission order
    pub items: Vec<Item>,
}

impl TranslationUnit {
    /// Empty unit
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a function definition.
    pub fn function(&mut self, function: Function) -> &mut Self {
        self.items.push(Item::Function(function));
        self
    }

    /// Append a constant declaration.
    pub fn constant(&mut self, ty: Ty, name: impl Into<String>, value: Expr) -> &mut Self {
        self.items.push(Item::Const {
            ty,
            name: name.into(),
            value,
        });
        self
    }

    /// Functions in emission order
    pub fn functions(&self) -> impl Iterator<Item = &Function> {
        self.items.iter().filter_map(|item| match item {
            Item::Function(f) => Some(f),
            Item::Const { .. } => None,
        })
    }

    /// Look up a function by name
    pub fn find_function(&self, name: &str) -> Option<&Function> {
        self.functions().find(|f| f.name == name)
    }

    /// Number of `main` definitions
    pub fn main_count(&self) -> usize {
        self.functions().filter(|f| f.name == "main").count()
    }

    /// Names of every function called anywhere in the unit's structured code.
    pub fn called_functions(&self) -> Vec<&str> {
        let mut names = Vec::new();
        for function in self.functions() {
            for stmt in &function.body {
                stmt.walk(&mut |s| {
                    for expr in s.exprs() {
                        expr.walk(&mut |e| {
                            if let Some(name) = e.callee() {
                                names.push(name);
                            }
                        });
                    }
                });
            }
        }
        names
    }
}
