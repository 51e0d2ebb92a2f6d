//! Lexer for the Cinder language
//!
//! A thin wrapper over a logos-generated tokenizer that materializes the
//! token stream (with spans and text) and appends an EOF sentinel.

pub mod tokens;

pub use tokens::{Token, TokenKind};

use crate::common::Span;
use crate::diagnostics::{SourceFile, SyntaxError};
use logos::Logos;

/// Tokenize source text into a vector of tokens ending with EOF
pub fn lex(file: &SourceFile) -> Result<Vec<Token>, SyntaxError> {
    let source: &str = &file.content;
    let mut lexer = TokenKind::lexer(source);
    let mut tokens = Vec::new();

    while let Some(result) = lexer.next() {
        let span: Span = lexer.span().into();
        match result {
            Ok(kind) => tokens.push(Token {
                kind,
                span,
                text: lexer.slice().to_string(),
            }),
            Err(()) => {
                return Err(SyntaxError::UnexpectedChar {
                    span: span.into(),
                    src: file.to_named_source(),
                });
            }
        }
    }

    let end = Span::new(source.len(), source.len());
    tokens.push(Token {
        kind: TokenKind::Eof,
        span: end,
        text: String::new(),
    });

    tracing::debug!("lexed {} tokens from {}", tokens.len(), file.name);
    Ok(tokens)
}
