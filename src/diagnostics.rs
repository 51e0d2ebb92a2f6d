//! Diagnostic reporting with source locations
//!
//! Parse-time diagnostics carry source spans and are rendered through
//! miette; runtime errors are span-free (the evaluator works on the AST,
//! not the source text) but share the same reporting pipeline.

use crate::common::Span;
use miette::{Diagnostic, NamedSource, SourceSpan};
use std::sync::Arc;
use thiserror::Error;

/// Source file for error reporting
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name: String,
    pub content: Arc<str>,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: Arc::from(content.into()),
        }
    }

    pub fn to_named_source(&self) -> NamedSource<String> {
        NamedSource::new(self.name.clone(), self.content.to_string())
    }
}

/// Convert our Span to miette's SourceSpan
impl From<Span> for SourceSpan {
    fn from(span: Span) -> Self {
        SourceSpan::new(span.start.into(), span.len())
    }
}

/// Syntax diagnostic produced by the lexer or parser
#[derive(Error, Debug, Diagnostic, Clone)]
pub enum SyntaxError {
    #[error("Unexpected character")]
    #[diagnostic(code(syntax::unexpected_char))]
    UnexpectedChar {
        #[label("not a valid token")]
        span: SourceSpan,
        #[source_code]
        src: NamedSource<String>,
    },

    #[error("Unexpected token: expected {expected}, found {found}")]
    #[diagnostic(code(syntax::unexpected_token))]
    UnexpectedToken {
        expected: String,
        found: String,
        #[label("unexpected token here")]
        span: SourceSpan,
        #[source_code]
        src: NamedSource<String>,
    },

    #[error("Unexpected end of input")]
    #[diagnostic(code(syntax::unexpected_eof))]
    UnexpectedEof {
        #[label("expected more input")]
        span: SourceSpan,
        #[source_code]
        src: NamedSource<String>,
    },
}

/// Runtime error taxonomy
///
/// Break and Return are not represented here: they travel on the
/// dedicated unwinding channel (`interp::value::Unwind`) and only turn
/// into a TypeError when they escape evaluation entirely.
#[derive(Error, Debug, Diagnostic, Clone)]
pub enum RuntimeError {
    #[error("No such variable `{name}`")]
    #[diagnostic(code(runtime::name_error))]
    Name { name: String },

    #[error("{value} has no attribute `{attribute}`")]
    #[diagnostic(code(runtime::attribute_error))]
    Attribute { value: String, attribute: String },

    #[error("{message}")]
    #[diagnostic(code(runtime::type_error))]
    Type { message: String },

    #[error("{message}")]
    #[diagnostic(code(runtime::index_error))]
    Index { message: String },

    #[error("Cannot re-declare immutable binding `{name}`")]
    #[diagnostic(
        code(runtime::immutability_error),
        help("declare the binding with `let mut` to allow re-assignment")
    )]
    Immutability { name: String },

    #[error("Division by zero")]
    #[diagnostic(code(runtime::zero_division))]
    ZeroDivision,

    /// Designated iterator-exhaustion signal; ordinary in every other way
    #[error("Iterator exhausted")]
    #[diagnostic(code(runtime::stop_iteration))]
    StopIteration,

    #[error("{message}")]
    #[diagnostic(code(runtime::syntax_error))]
    Syntax { message: String },

    #[error("{message}")]
    #[diagnostic(code(runtime::io_error))]
    Io { message: String },

    /// Raised from language code via the `error` builtin
    #[error("{message}")]
    #[diagnostic(code(runtime::raised))]
    Raised { message: String },
}

impl RuntimeError {
    pub fn name(name: impl Into<String>) -> Self {
        RuntimeError::Name { name: name.into() }
    }

    pub fn attribute(value: impl Into<String>, attribute: impl Into<String>) -> Self {
        RuntimeError::Attribute {
            value: value.into(),
            attribute: attribute.into(),
        }
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        RuntimeError::Type {
            message: message.into(),
        }
    }

    pub fn index(message: impl Into<String>) -> Self {
        RuntimeError::Index {
            message: message.into(),
        }
    }

    pub fn immutability(name: impl Into<String>) -> Self {
        RuntimeError::Immutability { name: name.into() }
    }

    pub fn syntax(message: impl Into<String>) -> Self {
        RuntimeError::Syntax {
            message: message.into(),
        }
    }

    pub fn io(message: impl Into<String>) -> Self {
        RuntimeError::Io {
            message: message.into(),
        }
    }

    pub fn raised(message: impl Into<String>) -> Self {
        RuntimeError::Raised {
            message: message.into(),
        }
    }
}
