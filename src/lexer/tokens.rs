//! Token definitions for the Cinder lexer

use crate::common::Span;
use logos::Logos;
use serde::{Deserialize, Serialize};

/// A token with its kind, span, and text
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    pub text: String,
}

/// Token kinds recognized by the lexer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Logos, Serialize, Deserialize)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(skip r"#[^\n]*")]
pub enum TokenKind {
    // Keywords
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("do")]
    Do,
    #[token("end")]
    End,
    #[token("while")]
    While,
    #[token("for")]
    For,
    #[token("in")]
    In,
    #[token("def")]
    Def,
    #[token("let")]
    Let,
    #[token("mut")]
    Mut,
    #[token("module")]
    Module,
    #[token("try")]
    Try,
    #[token("except")]
    Except,
    #[token("break")]
    Break,
    #[token("return")]
    Return,

    // Literals
    #[regex(r"[0-9]+\.[0-9]+")]
    Float,
    #[regex(r"[0-9]+")]
    Int,
    #[regex(r#""[^"]*""#)]
    Str,

    // Identifiers
    #[regex(r"[A-Za-z_$][A-Za-z_0-9$]*")]
    Ident,

    // Punctuation
    #[token(".")]
    Dot,
    #[token(",")]
    Comma,
    #[token("!")]
    Bang,
    #[token("=")]
    Eq,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token(";")]
    Semi,

    /// End of input sentinel appended by the lexer
    Eof,
}

impl TokenKind {
    /// Human-readable name used in diagnostics
    pub fn describe(&self) -> &'static str {
        match self {
            TokenKind::If => "`if`",
            TokenKind::Else => "`else`",
            TokenKind::Do => "`do`",
            TokenKind::End => "`end`",
            TokenKind::While => "`while`",
            TokenKind::For => "`for`",
            TokenKind::In => "`in`",
            TokenKind::Def => "`def`",
            TokenKind::Let => "`let`",
            TokenKind::Mut => "`mut`",
            TokenKind::Module => "`module`",
            TokenKind::Try => "`try`",
            TokenKind::Except => "`except`",
            TokenKind::Break => "`break`",
            TokenKind::Return => "`return`",
            TokenKind::Float => "a float literal",
            TokenKind::Int => "an integer literal",
            TokenKind::Str => "a string literal",
            TokenKind::Ident => "an identifier",
            TokenKind::Dot => "`.`",
            TokenKind::Comma => "`,`",
            TokenKind::Bang => "`!`",
            TokenKind::Eq => "`=`",
            TokenKind::LParen => "`(`",
            TokenKind::RParen => "`)`",
            TokenKind::Semi => "`;`",
            TokenKind::Eof => "end of input",
        }
    }
}
