//! Abstract Syntax Tree for the Cinder language
//!
//! Everything is an expression; the parser produces a single `Expr` per
//! program (wrapping multi-expression files in an implicit block). Nodes
//! are immutable once produced.

use crate::common::Span;
use serde::{Deserialize, Serialize};
use std::rc::Rc;

/// An expression with its source span
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// Expression kinds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ExprKind {
    /// Numeric literal (all numbers are f64)
    Number(f64),
    /// String literal, quotes stripped, escapes kept verbatim
    Str(String),
    /// Variable reference
    Name(String),
    /// Call with ordered arguments
    Call { callee: Box<Expr>, args: Vec<Expr> },
    /// Attribute access `base.name`
    Attr { base: Box<Expr>, name: String },
    /// `do ... end`
    Block(Vec<Expr>),
    /// `if cond then [else otherwise]`
    If {
        cond: Box<Expr>,
        then: Box<Expr>,
        otherwise: Option<Box<Expr>>,
    },
    /// `while cond body`
    While { cond: Box<Expr>, body: Box<Expr> },
    /// `for var in iterable body`
    For {
        var: String,
        iterable: Box<Expr>,
        body: Box<Expr>,
    },
    /// `let [mut] name = value` and bare re-declaration `name = value`
    Let {
        name: String,
        mutable: bool,
        value: Box<Expr>,
    },
    /// `def (params) body`; the body is shared with the closure value
    Def { params: Vec<String>, body: Rc<Expr> },
    /// `module (exports) body`
    ModuleDef { exports: Vec<String>, body: Box<Expr> },
    /// `try body except handler`
    Try {
        body: Box<Expr>,
        handler: Box<Expr>,
    },
    /// `break`
    Break,
    /// `return value`
    Return(Box<Expr>),
}
