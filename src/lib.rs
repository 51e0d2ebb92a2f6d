//! Cinder — a tree-walking interpreter for a small dynamic expression
//! language
//!
//! Everything is an expression, every value carries a mutable attribute
//! dictionary, and all arithmetic goes through method dispatch: there are
//! no operators, no classes, and no bytecode.
//!
//! # Architecture
//!
//! ```text
//! Source → Lexer → Parser → AST → Evaluator(AST, Environment) → Value
//! ```
//!
//! # Example
//!
//! ```cinder
//! let mut i = 0
//! while (i.lt(3)) do
//!     i = i.add(1)
//!     i
//! end
//! # evaluates to [1, 2, 3]
//! ```

#![allow(dead_code)]

pub mod ast;
pub mod builtins;
pub mod common;
pub mod diagnostics;
pub mod host;
pub mod interp;
pub mod lexer;
pub mod parser;

// Re-exports for convenience
pub use diagnostics::{RuntimeError, SourceFile, SyntaxError};
pub use interp::{Interpreter, Value};

/// Interpreter version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Parse source code to an AST
pub fn parse(source: &str) -> miette::Result<ast::Expr> {
    let file = SourceFile::new("<input>", source);
    let tokens = lexer::lex(&file)?;
    Ok(parser::parse(&tokens, &file)?)
}

/// Evaluate source code in a fresh interpreter
pub fn evaluate(source: &str) -> miette::Result<Value> {
    let file = SourceFile::new("<input>", source);
    let mut interpreter = Interpreter::new();
    interpreter.evaluate_program(&file)
}
