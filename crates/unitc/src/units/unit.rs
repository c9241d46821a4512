use std::fmt;

use super::Dimension;

/// A unit of measurement known to the analysis
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Unit {
    pub name: String,
    pub symbol: String,
    pub dimension: Dimension,
    /// Owns a dimension slot
    pub is_base: bool,
}

impl Unit {
    pub fn new(name: impl Into<String>, symbol: impl Into<String>, dimension: Dimension) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into(),
            dimension,
            is_base: false,
        }
    }

    pub fn base(name: impl Into<String>, symbol: impl Into<String>, dimension: Dimension) -> Self {
        Self {
            is_base: true,
            ..Self::new(name, symbol, dimension)
        }
    }

    /// Coherent unit produced by arithmetic that matches no declared unit.
    /// Name and symbol are both the rendered dimension, e.g. `m/s^2`.
    pub fn anonymous(rendered: String, dimension: Dimension) -> Self {
        Self::new(rendered.clone(), rendered, dimension)
    }

    pub fn is_dimensionless(&self) -> bool {
        self.dimension.is_dimensionless()
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.symbol.is_empty() || self.symbol == self.name {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{} [{}]", self.name, self.symbol)
        }
    }
}
