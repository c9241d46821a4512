//! Recursive descent parser for units description files

use std::io;
use std::path::Path;

use tracing::debug;

use super::description::{
    ClassDecl, CompoundTerm, ConversionDecl, Direction, UnitDecl, UnitDefinition,
    UnitsDescription,
};
use super::lexer::{Lexer, Token, TokenKind};
use crate::common::{Span, UnitsError, UnitsResult};

/// Parse units file text
pub fn parse_units(source: &str) -> UnitsResult<UnitsDescription> {
    Parser::new(source)?.parse()
}

/// Read and parse a units file, keeping "missing" and "unreadable" apart
pub fn load_units_file(path: &Path) -> UnitsResult<(String, UnitsDescription)> {
    let source = std::fs::read_to_string(path).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => UnitsError::NotFound {
            path: path.to_path_buf(),
        },
        _ => UnitsError::Unreadable {
            path: path.to_path_buf(),
            source,
        },
    })?;
    debug!(path = %path.display(), bytes = source.len(), "read units file");

    let description = parse_units(&source)?;
    Ok((source, description))
}

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str) -> UnitsResult<Self> {
        let mut lexer = Lexer::new(source);
        let current = lexer.next_token()?;
        Ok(Self { lexer, current })
    }

    pub fn parse(&mut self) -> UnitsResult<UnitsDescription> {
        let mut description = UnitsDescription::new();

        while !self.at_end() {
            match &self.current.kind {
                TokenKind::Base => description.units.push(self.parse_base()?),
                TokenKind::Unit => description.units.push(self.parse_unit()?),
                TokenKind::Convert => description.conversions.push(self.parse_convert()?),
                TokenKind::Class => description.classes.push(self.parse_class()?),
                other => {
                    return Err(UnitsError::syntax(
                        format!("expected 'base', 'unit', 'convert' or 'class', found {other}"),
                        self.current.span,
                    ));
                }
            }
        }

        debug!(
            units = description.units.len(),
            conversions = description.conversions.len(),
            classes = description.classes.len(),
            "parsed units description"
        );
        Ok(description)
    }

    // =========================================================================
    // Helper methods
    // =========================================================================

    fn at_end(&self) -> bool {
        matches!(self.current.kind, TokenKind::Eof)
    }

    fn advance(&mut self) -> UnitsResult<Token> {
        let prev = std::mem::replace(&mut self.current, self.lexer.next_token()?);
        Ok(prev)
    }

    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.current.kind) == std::mem::discriminant(kind)
    }

    fn match_token(&mut self, kind: &TokenKind) -> UnitsResult<bool> {
        if self.check(kind) {
            self.advance()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn expect(&mut self, kind: TokenKind) -> UnitsResult<Token> {
        if self.check(&kind) {
            self.advance()
        } else {
            Err(UnitsError::syntax(
                format!("expected {}, found {}", kind, self.current.kind),
                self.current.span,
            ))
        }
    }

    fn expect_identifier(&mut self) -> UnitsResult<String> {
        let token = self.expect(TokenKind::Identifier(String::new()))?;
        match token.kind {
            TokenKind::Identifier(name) => Ok(name),
            _ => Err(UnitsError::syntax("expected identifier", token.span)),
        }
    }

    fn expect_symbol(&mut self) -> UnitsResult<String> {
        let token = self.expect(TokenKind::Symbol(String::new()))?;
        match token.kind {
            TokenKind::Symbol(symbol) => Ok(symbol),
            _ => Err(UnitsError::syntax("expected unit symbol", token.span)),
        }
    }

    fn expect_number(&mut self) -> UnitsResult<(f64, Span)> {
        let token = self.expect(TokenKind::Number(0.0))?;
        match token.kind {
            TokenKind::Number(value) => Ok((value, token.span)),
            _ => Err(UnitsError::syntax("expected number", token.span)),
        }
    }

    /// `->` reads "1 child = factor parent", `<-` reads "1 parent = factor child"
    fn parse_direction(&mut self) -> UnitsResult<Direction> {
        if self.match_token(&TokenKind::Arrow)? {
            Ok(Direction::ChildToParent)
        } else if self.match_token(&TokenKind::BackArrow)? {
            Ok(Direction::ParentToChild)
        } else {
            Err(UnitsError::syntax(
                format!("expected '->' or '<-', found {}", self.current.kind),
                self.current.span,
            ))
        }
    }

    /// Closes a declaration and returns its full span
    fn finish(&mut self, start: Span) -> UnitsResult<Span> {
        let semi = self.expect(TokenKind::Semi)?;
        Ok(start.merge(semi.span))
    }

    // =========================================================================
    // Declarations
    // =========================================================================

    fn parse_base(&mut self) -> UnitsResult<UnitDecl> {
        let start = self.expect(TokenKind::Base)?.span;
        let name = self.expect_identifier()?;
        let symbol = self.expect_symbol()?;
        let span = self.finish(start)?;
        Ok(UnitDecl::new(&name, &symbol, UnitDefinition::Base).with_span(span))
    }

    fn parse_unit(&mut self) -> UnitsResult<UnitDecl> {
        let start = self.expect(TokenKind::Unit)?.span;
        let name = self.expect_identifier()?;
        let symbol = self.expect_symbol()?;

        let definition = if self.match_token(&TokenKind::Eq)? {
            UnitDefinition::Compound {
                terms: self.parse_compound()?,
            }
        } else {
            let direction = self.parse_direction()?;
            let parent = self.expect_identifier()?;
            self.expect(TokenKind::Colon)?;
            let (factor, _) = self.expect_number()?;
            UnitDefinition::Scaled {
                parent,
                factor,
                direction,
            }
        };

        let span = self.finish(start)?;
        Ok(UnitDecl::new(&name, &symbol, definition).with_span(span))
    }

    /// `kilogram * meter / second^2`
    fn parse_compound(&mut self) -> UnitsResult<Vec<CompoundTerm>> {
        let mut terms = vec![self.parse_term(1)?];
        loop {
            let sign = if self.match_token(&TokenKind::Star)? {
                1
            } else if self.match_token(&TokenKind::Slash)? {
                -1
            } else {
                break;
            };
            terms.push(self.parse_term(sign)?);
        }
        Ok(terms)
    }

    fn parse_term(&mut self, sign: i32) -> UnitsResult<CompoundTerm> {
        let unit = self.expect_identifier()?;
        let mut exponent = 1;

        if self.match_token(&TokenKind::Caret)? {
            let negative = self.match_token(&TokenKind::Minus)?;
            let (value, span) = self.expect_number()?;
            if value.fract() != 0.0 || value > f64::from(i32::MAX) {
                return Err(UnitsError::syntax(
                    format!("exponent {value} must be an integer"),
                    span,
                ));
            }
            exponent = value as i32;
            if negative {
                exponent = -exponent;
            }
        }

        Ok(CompoundTerm {
            unit,
            exponent: sign * exponent,
        })
    }

    fn parse_convert(&mut self) -> UnitsResult<ConversionDecl> {
        let start = self.expect(TokenKind::Convert)?.span;
        let child = self.expect_identifier()?;
        let direction = self.parse_direction()?;
        let parent = self.expect_identifier()?;
        self.expect(TokenKind::Colon)?;
        let (factor, _) = self.expect_number()?;
        let span = self.finish(start)?;

        Ok(ConversionDecl {
            child,
            parent,
            factor,
            direction,
            span,
        })
    }

    fn parse_class(&mut self) -> UnitsResult<ClassDecl> {
        let start = self.expect(TokenKind::Class)?.span;
        let name = self.expect_identifier()?;
        self.expect(TokenKind::Colon)?;

        let mut members = vec![self.expect_identifier()?];
        while self.match_token(&TokenKind::Comma)? {
            members.push(self.expect_identifier()?);
        }
        let span = self.finish(start)?;

        Ok(ClassDecl {
            name,
            members,
            span,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_and_scaled() {
        let description = parse_units(
            "base meter [m];\n\
             unit kilometer [km] -> meter : 1000;\n\
             unit centimeter [cm] <- meter : 100;",
        )
        .unwrap();

        assert_eq!(description.units.len(), 3);
        assert_eq!(description.units[0].name, "meter");
        assert_eq!(description.units[0].symbol, "m");
        assert_eq!(description.units[0].definition, UnitDefinition::Base);
        assert_eq!(description.units[0].span, Span::new(0, 15));

        assert_eq!(
            description.units[1].definition,
            UnitDefinition::Scaled {
                parent: "meter".into(),
                factor: 1000.0,
                direction: Direction::ChildToParent,
            }
        );
        assert!(matches!(
            description.units[2].definition,
            UnitDefinition::Scaled {
                direction: Direction::ParentToChild,
                ..
            }
        ));
    }

    #[test]
    fn test_compound_terms() {
        let description =
            parse_units("unit newton [N] = kilogram * meter / second^2;").unwrap();
        let UnitDefinition::Compound { terms } = &description.units[0].definition else {
            panic!("expected compound unit");
        };
        let terms: Vec<(&str, i32)> = terms.iter().map(|t| (t.unit.as_str(), t.exponent)).collect();
        assert_eq!(terms, vec![("kilogram", 1), ("meter", 1), ("second", -2)]);
    }

    #[test]
    fn test_negative_exponent() {
        let description = parse_units("unit hertz [Hz] = second^-1;").unwrap();
        let UnitDefinition::Compound { terms } = &description.units[0].definition else {
            panic!("expected compound unit");
        };
        assert_eq!(terms[0].exponent, -1);
    }

    #[test]
    fn test_convert_and_class() {
        let description = parse_units(
            "convert mile -> kilometer : 1.609344;\n\
             class length : meter, kilometer, mile;",
        )
        .unwrap();

        assert_eq!(description.conversions[0].child, "mile");
        assert_eq!(description.conversions[0].parent, "kilometer");
        assert_eq!(description.conversions[0].factor, 1.609344);
        assert_eq!(description.classes[0].name, "length");
        assert_eq!(description.classes[0].members, vec!["meter", "kilometer", "mile"]);
    }

    #[test]
    fn test_syntax_errors() {
        for source in [
            "base meter;",
            "base meter [m]",
            "unit kilometer [km] meter : 1000;",
            "unit newton [N] = kilogram * ;",
            "unit area [a] = meter^2.5;",
            "meter;",
        ] {
            let err = parse_units(source).unwrap_err();
            assert!(matches!(err, UnitsError::Syntax { .. }), "{source}: {err}");
        }
    }

    #[test]
    fn test_missing_file() {
        let err = load_units_file(Path::new("/nonexistent/unitc/si.units")).unwrap_err();
        assert!(matches!(err, UnitsError::NotFound { .. }));
    }
}
