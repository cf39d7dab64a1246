//! Declarative tree nodes.
//!
//! These nodes describe UI structure: a module of imports, type
//! declarations, and raw code blocks; declaration bodies of attribute
//! declarations, attribute bindings, and nested instantiations. They
//! never hold expression structure directly; embedded sub-trees are
//! always behind a [`Code`] wrapper.
//!
//! Nodes are immutable value objects built bottom-up during the parse.
//! A docstring is the empty string when absent, mirroring the fact that
//! a present-but-empty docstring and a missing one are not distinguished
//! anywhere downstream.

use super::expr::{Expr, Stmt};

/// An embedded-language sub-tree plus the line it starts at.
#[derive(Debug, Clone, PartialEq)]
pub struct Code {
    pub unit: CodeUnit,
    pub line: usize,
}

/// The payload of a [`Code`] wrapper: a single expression or a suite of
/// simple statements.
#[derive(Debug, Clone, PartialEq)]
pub enum CodeUnit {
    Expression(Expr),
    Suite(Vec<Stmt>),
}

impl Code {
    pub fn expression(expr: Expr, line: usize) -> Self {
        Code {
            unit: CodeUnit::Expression(expr),
            line,
        }
    }

    pub fn suite(stmts: Vec<Stmt>, line: usize) -> Self {
        Code {
            unit: CodeUnit::Suite(stmts),
            line,
        }
    }

    /// The wrapped expression, when the unit is a single expression.
    pub fn as_expression(&self) -> Option<&Expr> {
        match &self.unit {
            CodeUnit::Expression(expr) => Some(expr),
            CodeUnit::Suite(_) => None,
        }
    }

    /// The wrapped statements, when the unit is a suite.
    pub fn as_suite(&self) -> Option<&[Stmt]> {
        match &self.unit {
            CodeUnit::Expression(_) => None,
            CodeUnit::Suite(stmts) => Some(stmts),
        }
    }
}

/// The root of a parsed vela source file.
#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    pub docstring: String,
    pub items: Vec<ModuleItem>,
    pub line: usize,
}

impl Module {
    pub fn new(docstring: String, items: Vec<ModuleItem>, line: usize) -> Self {
        Module {
            docstring,
            items,
            line,
        }
    }

    pub fn iter_declarations(&self) -> impl Iterator<Item = &Declaration> {
        self.items.iter().filter_map(|item| match item {
            ModuleItem::Declaration(decl) => Some(decl),
            _ => None,
        })
    }
}

/// One top-level item of a module.
#[derive(Debug, Clone, PartialEq)]
pub enum ModuleItem {
    /// An import statement, wrapped as a one-statement suite.
    Import(Code),
    /// A new declarative type.
    Declaration(Declaration),
    /// A raw block of embedded-language statements.
    CodeBlock(Code),
}

/// `Name(Base):` — defines a new declarative type extending a base.
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub name: String,
    pub base: Code,
    pub identifier: Option<String>,
    pub docstring: String,
    pub items: Vec<BodyItem>,
    pub line: usize,
}

/// `TypeName:` — one node of the UI object tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Instantiation {
    pub name: String,
    pub identifier: Option<String>,
    pub items: Vec<BodyItem>,
    pub line: usize,
}

/// One element of a declaration or instantiation body.
#[derive(Debug, Clone, PartialEq)]
pub enum BodyItem {
    Instantiation(Instantiation),
    AttributeDeclaration(AttributeDeclaration),
    AttributeBinding(AttributeBinding),
}

impl BodyItem {
    pub fn line(&self) -> usize {
        match self {
            BodyItem::Instantiation(node) => node.line,
            BodyItem::AttributeDeclaration(node) => node.line,
            BodyItem::AttributeBinding(node) => node.line,
        }
    }
}

/// `attr name: Type = expr` / `event name` — declares an attribute on
/// the enclosing type. `is_event` distinguishes event attributes, which
/// are fired rather than read as stored values.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeDeclaration {
    pub name: String,
    pub type_expr: Option<Code>,
    pub default: Option<AttributeBinding>,
    pub is_event: bool,
    pub line: usize,
}

/// `name OP expr` — binds an attribute to an expression.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeBinding {
    pub name: String,
    pub binding: BoundExpression,
    pub line: usize,
}

/// The right-hand side of a binding: the binding-kind identifier plus
/// the bound code.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundExpression {
    pub operator: String,
    pub code: Code,
    pub line: usize,
}
