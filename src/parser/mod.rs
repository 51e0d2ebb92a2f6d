//! Parser for the Cinder language
//!
//! A recursive descent parser that produces an AST from a token stream.
//! There are no binary operators: arithmetic and comparison are method
//! calls, so the grammar needs no precedence climbing. The only postfix
//! forms are calls `f(a, b)`, the zero-argument call `f!`, and attribute
//! access `x.name`.

use crate::ast::{Expr, ExprKind};
use crate::common::Span;
use crate::diagnostics::{SourceFile, SyntaxError};
use crate::lexer::{Token, TokenKind};
use std::rc::Rc;

/// Parse a token stream into a single program expression
///
/// A file containing several top-level expressions is wrapped in an
/// implicit block; optional `;` separators between expressions are
/// accepted and ignored.
pub fn parse(tokens: &[Token], file: &SourceFile) -> Result<Expr, SyntaxError> {
    let mut parser = Parser::new(tokens, file);
    parser.parse_program()
}

/// Parser state
struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    file: &'a SourceFile,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token], file: &'a SourceFile) -> Self {
        Self {
            tokens,
            pos: 0,
            file,
        }
    }

    fn current(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or_else(|| {
            self.tokens
                .last()
                .expect("token stream should have at least EOF")
        })
    }

    fn peek(&self) -> TokenKind {
        self.current().kind
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.peek() == kind
    }

    fn advance(&mut self) -> &Token {
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        &self.tokens[self.pos.saturating_sub(1)]
    }

    fn expect(&mut self, kind: TokenKind) -> Result<&Token, SyntaxError> {
        if self.at(kind) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(kind.describe()))
        }
    }

    fn span(&self) -> Span {
        self.current().span
    }

    fn unexpected(&self, expected: &str) -> SyntaxError {
        let token = self.current();
        if token.kind == TokenKind::Eof {
            SyntaxError::UnexpectedEof {
                span: token.span.into(),
                src: self.file.to_named_source(),
            }
        } else {
            SyntaxError::UnexpectedToken {
                expected: expected.to_string(),
                found: token.kind.describe().to_string(),
                span: token.span.into(),
                src: self.file.to_named_source(),
            }
        }
    }

    fn skip_separators(&mut self) {
        while self.at(TokenKind::Semi) {
            self.advance();
        }
    }

    // ==================== PROGRAM ====================

    fn parse_program(&mut self) -> Result<Expr, SyntaxError> {
        let start = self.span();
        let mut exprs = Vec::new();

        self.skip_separators();
        while !self.at(TokenKind::Eof) {
            exprs.push(self.parse_expr()?);
            self.skip_separators();
        }

        if exprs.len() == 1 {
            Ok(exprs.into_iter().next().expect("length checked"))
        } else {
            let span = start.to(self.span());
            Ok(Expr::new(ExprKind::Block(exprs), span))
        }
    }

    // ==================== EXPRESSIONS ====================

    fn parse_expr(&mut self) -> Result<Expr, SyntaxError> {
        match self.peek() {
            TokenKind::Break => {
                let span = self.advance().span;
                Ok(Expr::new(ExprKind::Break, span))
            }
            TokenKind::Return => {
                let start = self.advance().span;
                let value = self.parse_expr()?;
                let span = start.to(value.span);
                Ok(Expr::new(ExprKind::Return(Box::new(value)), span))
            }
            TokenKind::Let => self.parse_let(),
            TokenKind::If => self.parse_if(),
            TokenKind::While => self.parse_while(),
            TokenKind::For => self.parse_for(),
            TokenKind::Def => self.parse_def(),
            TokenKind::Module => self.parse_module(),
            TokenKind::Try => self.parse_try(),
            TokenKind::Do => self.parse_block(),
            TokenKind::Ident if self.tokens.get(self.pos + 1).map(|t| t.kind) == Some(TokenKind::Eq) => {
                self.parse_assignment()
            }
            _ => self.parse_postfix(),
        }
    }

    fn parse_let(&mut self) -> Result<Expr, SyntaxError> {
        let start = self.expect(TokenKind::Let)?.span;
        let mutable = if self.at(TokenKind::Mut) {
            self.advance();
            true
        } else {
            false
        };
        let name = self.expect(TokenKind::Ident)?.text.clone();
        self.expect(TokenKind::Eq)?;
        let value = self.parse_expr()?;
        let span = start.to(value.span);
        Ok(Expr::new(
            ExprKind::Let {
                name,
                mutable,
                value: Box::new(value),
            },
            span,
        ))
    }

    /// Bare `name = expr`: same node kind as `let`, so re-declaration
    /// semantics (mutability checks) are decided by the environment.
    fn parse_assignment(&mut self) -> Result<Expr, SyntaxError> {
        let name_token = self.expect(TokenKind::Ident)?;
        let start = name_token.span;
        let name = name_token.text.clone();
        self.expect(TokenKind::Eq)?;
        let value = self.parse_expr()?;
        let span = start.to(value.span);
        Ok(Expr::new(
            ExprKind::Let {
                name,
                mutable: false,
                value: Box::new(value),
            },
            span,
        ))
    }

    fn parse_if(&mut self) -> Result<Expr, SyntaxError> {
        let start = self.expect(TokenKind::If)?.span;
        let cond = self.parse_expr()?;
        let then = self.parse_expr()?;
        let otherwise = if self.at(TokenKind::Else) {
            self.advance();
            Some(Box::new(self.parse_expr()?))
        } else {
            None
        };
        let end = otherwise.as_ref().map(|e| e.span).unwrap_or(then.span);
        Ok(Expr::new(
            ExprKind::If {
                cond: Box::new(cond),
                then: Box::new(then),
                otherwise,
            },
            start.to(end),
        ))
    }

    fn parse_while(&mut self) -> Result<Expr, SyntaxError> {
        let start = self.expect(TokenKind::While)?.span;
        let cond = self.parse_expr()?;
        let body = self.parse_expr()?;
        let span = start.to(body.span);
        Ok(Expr::new(
            ExprKind::While {
                cond: Box::new(cond),
                body: Box::new(body),
            },
            span,
        ))
    }

    fn parse_for(&mut self) -> Result<Expr, SyntaxError> {
        let start = self.expect(TokenKind::For)?.span;
        let var = self.expect(TokenKind::Ident)?.text.clone();
        self.expect(TokenKind::In)?;
        let iterable = self.parse_expr()?;
        let body = self.parse_expr()?;
        let span = start.to(body.span);
        Ok(Expr::new(
            ExprKind::For {
                var,
                iterable: Box::new(iterable),
                body: Box::new(body),
            },
            span,
        ))
    }

    fn parse_def(&mut self) -> Result<Expr, SyntaxError> {
        let start = self.expect(TokenKind::Def)?.span;
        self.expect(TokenKind::LParen)?;
        let mut params = Vec::new();
        if !self.at(TokenKind::RParen) {
            params.push(self.expect(TokenKind::Ident)?.text.clone());
            while self.at(TokenKind::Comma) {
                self.advance();
                params.push(self.expect(TokenKind::Ident)?.text.clone());
            }
        }
        self.expect(TokenKind::RParen)?;
        let body = self.parse_expr()?;
        let span = start.to(body.span);
        Ok(Expr::new(
            ExprKind::Def {
                params,
                body: Rc::new(body),
            },
            span,
        ))
    }

    fn parse_module(&mut self) -> Result<Expr, SyntaxError> {
        let start = self.expect(TokenKind::Module)?.span;
        self.expect(TokenKind::LParen)?;
        let mut exports = Vec::new();
        if !self.at(TokenKind::RParen) {
            exports.push(self.expect(TokenKind::Ident)?.text.clone());
            while self.at(TokenKind::Comma) {
                self.advance();
                exports.push(self.expect(TokenKind::Ident)?.text.clone());
            }
        }
        self.expect(TokenKind::RParen)?;
        let body = self.parse_expr()?;
        let span = start.to(body.span);
        Ok(Expr::new(
            ExprKind::ModuleDef {
                exports,
                body: Box::new(body),
            },
            span,
        ))
    }

    fn parse_try(&mut self) -> Result<Expr, SyntaxError> {
        let start = self.expect(TokenKind::Try)?.span;
        let body = self.parse_expr()?;
        self.expect(TokenKind::Except)?;
        let handler = self.parse_expr()?;
        let span = start.to(handler.span);
        Ok(Expr::new(
            ExprKind::Try {
                body: Box::new(body),
                handler: Box::new(handler),
            },
            span,
        ))
    }

    fn parse_block(&mut self) -> Result<Expr, SyntaxError> {
        let start = self.expect(TokenKind::Do)?.span;
        let mut exprs = Vec::new();
        self.skip_separators();
        while !self.at(TokenKind::End) {
            if self.at(TokenKind::Eof) {
                return Err(self.unexpected("`end`"));
            }
            exprs.push(self.parse_expr()?);
            self.skip_separators();
        }
        let end = self.expect(TokenKind::End)?.span;
        Ok(Expr::new(ExprKind::Block(exprs), start.to(end)))
    }

    // ==================== POSTFIX / PRIMARY ====================

    fn parse_postfix(&mut self) -> Result<Expr, SyntaxError> {
        let mut expr = self.parse_primary()?;

        loop {
            match self.peek() {
                TokenKind::LParen => {
                    self.advance();
                    let mut args = Vec::new();
                    if !self.at(TokenKind::RParen) {
                        args.push(self.parse_expr()?);
                        while self.at(TokenKind::Comma) {
                            self.advance();
                            args.push(self.parse_expr()?);
                        }
                    }
                    let end = self.expect(TokenKind::RParen)?.span;
                    let span = expr.span.to(end);
                    expr = Expr::new(
                        ExprKind::Call {
                            callee: Box::new(expr),
                            args,
                        },
                        span,
                    );
                }
                TokenKind::Bang => {
                    let end = self.advance().span;
                    let span = expr.span.to(end);
                    expr = Expr::new(
                        ExprKind::Call {
                            callee: Box::new(expr),
                            args: Vec::new(),
                        },
                        span,
                    );
                }
                TokenKind::Dot => {
                    self.advance();
                    let name_token = self.expect(TokenKind::Ident)?;
                    let span = expr.span.to(name_token.span);
                    let name = name_token.text.clone();
                    expr = Expr::new(
                        ExprKind::Attr {
                            base: Box::new(expr),
                            name,
                        },
                        span,
                    );
                }
                _ => break,
            }
        }

        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expr, SyntaxError> {
        match self.peek() {
            TokenKind::Int | TokenKind::Float => {
                let token = self.advance();
                let value = token.text.parse::<f64>().unwrap_or(f64::NAN);
                Ok(Expr::new(ExprKind::Number(value), token.span))
            }
            TokenKind::Str => {
                let token = self.advance();
                // Strip the surrounding quotes; escapes stay verbatim
                let text = token.text[1..token.text.len() - 1].to_string();
                Ok(Expr::new(ExprKind::Str(text), token.span))
            }
            TokenKind::Ident => {
                let token = self.advance();
                Ok(Expr::new(ExprKind::Name(token.text.clone()), token.span))
            }
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_expr()?;
                self.expect(TokenKind::RParen)?;
                Ok(expr)
            }
            _ => Err(self.unexpected("an expression")),
        }
    }
}
