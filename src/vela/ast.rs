//! AST definitions for the vela language.
//!
//! Two node families live side by side and are deliberately kept as
//! separate types:
//!
//! - `declarative` — the structure of a vela module: declarations,
//!   instantiations, attribute declarations and bindings.
//! - `expr` — the embedded expression language that appears inside
//!   bindings, type annotations, and raw code blocks.
//!
//! The only connection between the families is the [`Code`] wrapper,
//! which carries one embedded sub-tree plus the line it starts at. Every
//! node of either family carries a 1-based source line; constructors
//! take it as a required argument so a node without a position cannot be
//! built.

pub mod declarative;
pub mod expr;

pub use declarative::{
    AttributeBinding, AttributeDeclaration, BodyItem, BoundExpression, Code, CodeUnit,
    Declaration, Instantiation, Module, ModuleItem,
};
pub use expr::{
    Alias, Arguments, BoolOperator, CmpOperator, Comprehension, Expr, ExprContext, ExprKind,
    Keyword, Number, Operator, Slice, Stmt, StmtKind, UnaryOperator,
};
