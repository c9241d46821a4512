//! Units file token definitions using logos

use crate::common::Span;
use logos::Logos;
use std::fmt;

/// A units file token with its kind and source location
#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\n\r\f]+")]
#[logos(skip r"//[^\n]*")]
#[logos(skip r"#[^\n]*")]
pub enum TokenKind {
    // Declarations
    #[token("base")]
    Base,
    #[token("unit")]
    Unit,
    #[token("convert")]
    Convert,
    #[token("class")]
    Class,

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice().to_string())]
    Identifier(String),

    /// `[km]`, stored without the brackets
    #[regex(r"\[[^\]\s]+\]", |lex| {
        let s = lex.slice();
        s[1..s.len() - 1].to_string()
    })]
    Symbol(String),

    #[regex(r"[0-9]+(\.[0-9]+)?([eE][+-]?[0-9]+)?", |lex| lex.slice().parse::<f64>().ok())]
    Number(f64),

    // Punctuation
    #[token("->")]
    Arrow,
    #[token("<-")]
    BackArrow,
    #[token("=")]
    Eq,
    #[token(":")]
    Colon,
    #[token(";")]
    Semi,
    #[token(",")]
    Comma,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("^")]
    Caret,
    #[token("-")]
    Minus,

    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Base => write!(f, "'base'"),
            TokenKind::Unit => write!(f, "'unit'"),
            TokenKind::Convert => write!(f, "'convert'"),
            TokenKind::Class => write!(f, "'class'"),
            TokenKind::Identifier(s) => write!(f, "identifier '{s}'"),
            TokenKind::Symbol(s) => write!(f, "symbol [{s}]"),
            TokenKind::Number(n) => write!(f, "number {n}"),
            TokenKind::Arrow => write!(f, "'->'"),
            TokenKind::BackArrow => write!(f, "'<-'"),
            TokenKind::Eq => write!(f, "'='"),
            TokenKind::Colon => write!(f, "':'"),
            TokenKind::Semi => write!(f, "';'"),
            TokenKind::Comma => write!(f, "','"),
            TokenKind::Star => write!(f, "'*'"),
            TokenKind::Slash => write!(f, "'/'"),
            TokenKind::Caret => write!(f, "'^'"),
            TokenKind::Minus => write!(f, "'-'"),
            TokenKind::Eof => write!(f, "end of file"),
        }
    }
}
