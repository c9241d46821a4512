//! Units file scanner over the logos token stream

use super::token::{Token, TokenKind};
use crate::common::{Span, UnitsError, UnitsResult};
use logos::Logos;

/// Lexer for units description files
pub struct Lexer<'a> {
    inner: logos::Lexer<'a, TokenKind>,
    peeked: Option<Token>,
    at_eof: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            inner: TokenKind::lexer(source),
            peeked: None,
            at_eof: false,
        }
    }

    pub fn next_token(&mut self) -> UnitsResult<Token> {
        match self.peeked.take() {
            Some(token) => Ok(token),
            None => self.scan_token(),
        }
    }

    fn scan_token(&mut self) -> UnitsResult<Token> {
        if self.at_eof {
            let len = self.inner.source().len();
            return Ok(Token::new(TokenKind::Eof, Span::new(len, len)));
        }

        match self.inner.next() {
            Some(Ok(kind)) => {
                let span = self.inner.span();
                Ok(Token::new(kind, Span::new(span.start, span.end)))
            }
            Some(Err(())) => {
                let span = self.inner.span();
                Err(UnitsError::syntax(
                    format!("unexpected input '{}'", self.inner.slice()),
                    Span::new(span.start, span.end),
                ))
            }
            None => {
                self.at_eof = true;
                let len = self.inner.source().len();
                Ok(Token::new(TokenKind::Eof, Span::new(len, len)))
            }
        }
    }

    pub fn peek(&mut self) -> UnitsResult<&Token> {
        let token = match self.peeked.take() {
            Some(token) => token,
            None => self.scan_token()?,
        };
        Ok(self.peeked.insert(token))
    }

    pub fn check(&mut self, expected: &TokenKind) -> UnitsResult<bool> {
        Ok(std::mem::discriminant(&self.peek()?.kind) == std::mem::discriminant(expected))
    }

    /// Consume the next token if it matches
    pub fn match_token(&mut self, expected: &TokenKind) -> UnitsResult<bool> {
        if self.check(expected)? {
            self.next_token()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    pub fn expect(&mut self, expected: TokenKind) -> UnitsResult<Token> {
        let token = self.next_token()?;
        if std::mem::discriminant(&token.kind) == std::mem::discriminant(&expected) {
            Ok(token)
        } else {
            Err(UnitsError::syntax(
                format!("expected {}, found {}", expected, token.kind),
                token.span,
            ))
        }
    }

    pub fn tokenize_all(mut self) -> UnitsResult<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let is_eof = matches!(token.kind, TokenKind::Eof);
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        Ok(tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keywords_and_names() {
        let tokens = Lexer::new("base meter [m]; unit kilometer").tokenize_all().unwrap();

        assert!(matches!(tokens[0].kind, TokenKind::Base));
        assert!(matches!(&tokens[1].kind, TokenKind::Identifier(s) if s == "meter"));
        assert!(matches!(&tokens[2].kind, TokenKind::Symbol(s) if s == "m"));
        assert!(matches!(tokens[3].kind, TokenKind::Semi));
        assert!(matches!(tokens[4].kind, TokenKind::Unit));
        assert!(matches!(&tokens[5].kind, TokenKind::Identifier(s) if s == "kilometer"));
        assert!(matches!(tokens[6].kind, TokenKind::Eof));
    }

    #[test]
    fn test_keyword_prefix_is_identifier() {
        let tokens = Lexer::new("units baseline").tokenize_all().unwrap();
        assert!(matches!(&tokens[0].kind, TokenKind::Identifier(s) if s == "units"));
        assert!(matches!(&tokens[1].kind, TokenKind::Identifier(s) if s == "baseline"));
    }

    #[test]
    fn test_numbers() {
        let tokens = Lexer::new("1000 1.609344 2.5e-3").tokenize_all().unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Number(1000.0));
        assert_eq!(tokens[1].kind, TokenKind::Number(1.609344));
        assert_eq!(tokens[2].kind, TokenKind::Number(0.0025));
    }

    #[test]
    fn test_punctuation() {
        let tokens = Lexer::new("-> <- = : ; , * / ^ -").tokenize_all().unwrap();
        let kinds: Vec<TokenKind> = tokens.into_iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Arrow,
                TokenKind::BackArrow,
                TokenKind::Eq,
                TokenKind::Colon,
                TokenKind::Semi,
                TokenKind::Comma,
                TokenKind::Star,
                TokenKind::Slash,
                TokenKind::Caret,
                TokenKind::Minus,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_comments_skipped() {
        let source = "# header\nbase meter [m]; // trailing\n";
        let tokens = Lexer::new(source).tokenize_all().unwrap();
        assert_eq!(tokens.len(), 5);
        assert!(matches!(tokens[0].kind, TokenKind::Base));
    }

    #[test]
    fn test_unexpected_character() {
        let err = Lexer::new("base meter @").tokenize_all().unwrap_err();
        assert!(matches!(err, UnitsError::Syntax { span, .. } if span == Span::new(11, 12)));
    }

    #[test]
    fn test_expect_reports_found_token() {
        let mut lexer = Lexer::new("meter");
        let err = lexer.expect(TokenKind::Semi).unwrap_err();
        assert_eq!(
            err.to_string(),
            "syntax error at 0..5: expected ';', found identifier 'meter'"
        );
    }
}
