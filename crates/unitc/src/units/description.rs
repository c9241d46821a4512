//! Parsed form of a units description
//!
//! This is what the catalog is built from. It can come from a units file
//! (see [`super::parser`]) or be assembled in code.

use crate::common::Span;

/// Everything declared in one units source
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnitsDescription {
    pub units: Vec<UnitDecl>,
    pub conversions: Vec<ConversionDecl>,
    pub classes: Vec<ClassDecl>,
}

impl UnitsDescription {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn base(mut self, name: &str, symbol: &str) -> Self {
        self.units.push(UnitDecl::new(name, symbol, UnitDefinition::Base));
        self
    }

    /// Declare `name` relative to `parent`, e.g. `scaled("kilometer", "km",
    /// "meter", 1000.0, Direction::ChildToParent)` for 1 km = 1000 m.
    pub fn scaled(
        mut self,
        name: &str,
        symbol: &str,
        parent: &str,
        factor: f64,
        direction: Direction,
    ) -> Self {
        self.units.push(UnitDecl::new(
            name,
            symbol,
            UnitDefinition::Scaled {
                parent: parent.to_string(),
                factor,
                direction,
            },
        ));
        self
    }

    pub fn compound(mut self, name: &str, symbol: &str, terms: &[(&str, i32)]) -> Self {
        let terms = terms
            .iter()
            .map(|&(unit, exponent)| CompoundTerm {
                unit: unit.to_string(),
                exponent,
            })
            .collect();
        self.units
            .push(UnitDecl::new(name, symbol, UnitDefinition::Compound { terms }));
        self
    }

    pub fn conversion(mut self, child: &str, parent: &str, factor: f64, direction: Direction) -> Self {
        self.conversions.push(ConversionDecl {
            child: child.to_string(),
            parent: parent.to_string(),
            factor,
            direction,
            span: Span::default(),
        });
        self
    }

    pub fn class(mut self, name: &str, members: &[&str]) -> Self {
        self.classes.push(ClassDecl {
            name: name.to_string(),
            members: members.iter().map(|m| (*m).to_string()).collect(),
            span: Span::default(),
        });
        self
    }
}

/// Which way a raw conversion factor reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// 1 child = factor × parent
    ChildToParent,
    /// 1 parent = factor × child
    ParentToChild,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnitDecl {
    pub name: String,
    pub symbol: String,
    pub definition: UnitDefinition,
    pub span: Span,
}

impl UnitDecl {
    pub fn new(name: &str, symbol: &str, definition: UnitDefinition) -> Self {
        Self {
            name: name.to_string(),
            symbol: symbol.to_string(),
            definition,
            span: Span::default(),
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum UnitDefinition {
    /// Owns a dimension slot
    Base,
    /// Same dimension as `parent`, related by a conversion edge
    Scaled {
        parent: String,
        factor: f64,
        direction: Direction,
    },
    /// Product of powers of earlier coherent units
    Compound { terms: Vec<CompoundTerm> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompoundTerm {
    pub unit: String,
    pub exponent: i32,
}

/// An explicit edge between two already declared units
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionDecl {
    pub child: String,
    pub parent: String,
    pub factor: f64,
    pub direction: Direction,
    pub span: Span,
}

/// Named group of units; the name is reserved like a unit name
#[derive(Debug, Clone, PartialEq)]
pub struct ClassDecl {
    pub name: String,
    pub members: Vec<String>,
    pub span: Span,
}
