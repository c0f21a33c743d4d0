//! GLSL ES source representation for synthesized kernels
//!
//! Kernels are built as a typed tree ([`ir`]) through a [`SnippetBuilder`]
//! and turned into text once, by [`render_unit`].
//!
//! # Architecture
//!
//! ```text
//! kernel program ──► SnippetBuilder ──► TranslationUnit ──► render_unit ──► source
//!                       (Stmt tree)        (functions)
//! ```
//!
//! Keeping the tree around makes structural properties checkable without
//! parsing GLSL: which texel slots are fetched, which sampling functions
//! are called, how many `main` definitions exist.

pub mod builder;
pub mod ir;
pub mod render;

pub use builder::SnippetBuilder;
pub use ir::{
    AssignOp, BinOp, Expr, Function, Item, Param, Stmt, TranslationUnit, Ty, call, construct,
    float, ident, int, vec4_splat,
};
pub use render::{float_literal, render_expr, render_unit};
