//! Lexer integration tests

use cinder::SourceFile;
use cinder::lexer::{TokenKind, lex};

fn kinds(source: &str) -> Vec<TokenKind> {
    let file = SourceFile::new("<test>", source);
    lex(&file)
        .expect("lexing should succeed")
        .into_iter()
        .map(|t| t.kind)
        .collect()
}

#[test]
fn test_keywords() {
    assert_eq!(
        kinds("if else do end while for in def let mut module try except break return"),
        vec![
            TokenKind::If,
            TokenKind::Else,
            TokenKind::Do,
            TokenKind::End,
            TokenKind::While,
            TokenKind::For,
            TokenKind::In,
            TokenKind::Def,
            TokenKind::Let,
            TokenKind::Mut,
            TokenKind::Module,
            TokenKind::Try,
            TokenKind::Except,
            TokenKind::Break,
            TokenKind::Return,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn test_keyword_prefix_is_an_ident() {
    // `iffy` starts with a keyword but is one identifier
    assert_eq!(kinds("iffy"), vec![TokenKind::Ident, TokenKind::Eof]);
}

#[test]
fn test_dollar_idents() {
    assert_eq!(kinds("$tmp_1"), vec![TokenKind::Ident, TokenKind::Eof]);
}

#[test]
fn test_numbers_and_method_calls() {
    // a dot needs digits on both sides to be part of a float
    assert_eq!(
        kinds("1.5.add(1.add(2))"),
        vec![
            TokenKind::Float,
            TokenKind::Dot,
            TokenKind::Ident,
            TokenKind::LParen,
            TokenKind::Int,
            TokenKind::Dot,
            TokenKind::Ident,
            TokenKind::LParen,
            TokenKind::Int,
            TokenKind::RParen,
            TokenKind::RParen,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn test_bang_call() {
    assert_eq!(
        kinds("f!"),
        vec![TokenKind::Ident, TokenKind::Bang, TokenKind::Eof]
    );
}

#[test]
fn test_string_keeps_escapes_verbatim() {
    let file = SourceFile::new("<test>", r#""a\nb""#);
    let tokens = lex(&file).expect("lexing should succeed");
    assert_eq!(tokens[0].kind, TokenKind::Str);
    assert_eq!(tokens[0].text, r#""a\nb""#);
}

#[test]
fn test_comments_and_whitespace_are_skipped() {
    assert_eq!(
        kinds("# leading comment\n1 # trailing\n# another\n2"),
        vec![TokenKind::Int, TokenKind::Int, TokenKind::Eof]
    );
}

#[test]
fn test_spans_cover_the_source() {
    let file = SourceFile::new("<test>", "let x = 12");
    let tokens = lex(&file).expect("lexing should succeed");
    assert_eq!(tokens[0].span.start, 0);
    assert_eq!(tokens[0].span.end, 3);
    let last = &tokens[tokens.len() - 2];
    assert_eq!(last.text, "12");
    assert_eq!(last.span.end, 10);
}

#[test]
fn test_unknown_character_is_rejected() {
    let file = SourceFile::new("<test>", "1 @ 2");
    assert!(lex(&file).is_err());
}

#[test]
fn test_eof_is_always_appended() {
    let file = SourceFile::new("<test>", "");
    let tokens = lex(&file).expect("lexing should succeed");
    assert_eq!(tokens.len(), 1);
    assert_eq!(tokens[0].kind, TokenKind::Eof);
}
