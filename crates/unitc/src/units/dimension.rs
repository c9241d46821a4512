//! Dimension vectors
//!
//! A dimension is an integer exponent per declared base unit. Every vector in
//! one catalog has the same arity, so elementwise operations never need to
//! pad.

use std::fmt;

/// Exponent vector over the base units of a catalog
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Dimension(Vec<i32>);

impl Dimension {
    /// The dimensionless identity for a catalog with `arity` base units
    pub fn dimensionless(arity: usize) -> Self {
        Self(vec![0; arity])
    }

    /// Vector of the base unit occupying `slot`
    pub fn base(arity: usize, slot: usize) -> Self {
        let mut exponents = vec![0; arity];
        exponents[slot] = 1;
        Self(exponents)
    }

    pub fn from_exponents(exponents: Vec<i32>) -> Self {
        Self(exponents)
    }

    pub fn arity(&self) -> usize {
        self.0.len()
    }

    pub fn exponents(&self) -> &[i32] {
        &self.0
    }

    pub fn is_dimensionless(&self) -> bool {
        self.0.iter().all(|&e| e == 0)
    }

    /// Vector of a product: exponents add
    pub fn mul(&self, other: &Dimension) -> Dimension {
        debug_assert_eq!(self.arity(), other.arity());
        Dimension(self.0.iter().zip(&other.0).map(|(a, b)| a + b).collect())
    }

    /// Vector of a quotient: exponents subtract
    pub fn div(&self, other: &Dimension) -> Dimension {
        debug_assert_eq!(self.arity(), other.arity());
        Dimension(self.0.iter().zip(&other.0).map(|(a, b)| a - b).collect())
    }

    /// Vector of a power: exponents scale
    pub fn pow(&self, n: i32) -> Dimension {
        Dimension(self.0.iter().map(|e| e * n).collect())
    }

    /// Render with the given base symbols, e.g. `kg*m/s^2`
    pub fn display_with<'a>(&'a self, symbols: &'a [String]) -> DimensionDisplay<'a> {
        DimensionDisplay {
            dimension: self,
            symbols,
        }
    }
}

/// Formatter returned by [`Dimension::display_with`]
pub struct DimensionDisplay<'a> {
    dimension: &'a Dimension,
    symbols: &'a [String],
}

impl fmt::Display for DimensionDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let term = |symbol: &str, exp: i32| {
            if exp == 1 {
                symbol.to_string()
            } else {
                format!("{symbol}^{exp}")
            }
        };

        let mut numerator = Vec::new();
        let mut denominator = Vec::new();
        for (symbol, &exp) in self.symbols.iter().zip(self.dimension.exponents()) {
            if exp > 0 {
                numerator.push(term(symbol, exp));
            } else if exp < 0 {
                denominator.push(term(symbol, -exp));
            }
        }

        let numerator = if numerator.is_empty() {
            "1".to_string()
        } else {
            numerator.join("*")
        };
        if denominator.is_empty() {
            write!(f, "{numerator}")
        } else {
            write!(f, "{numerator}/{}", denominator.join("*"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn symbols() -> Vec<String> {
        vec!["m".into(), "s".into(), "kg".into()]
    }

    #[test]
    fn test_mul_div_pow() {
        let m = Dimension::base(3, 0);
        let s = Dimension::base(3, 1);

        let speed = m.div(&s);
        assert_eq!(speed.exponents(), &[1, -1, 0]);

        let accel = speed.div(&s);
        assert_eq!(accel.exponents(), &[1, -2, 0]);

        assert_eq!(m.mul(&m), m.pow(2));
        assert!(m.div(&m).is_dimensionless());
        assert!(m.pow(0).is_dimensionless());
    }

    #[test]
    fn test_display() {
        let symbols = symbols();
        let newton = Dimension::from_exponents(vec![1, -2, 1]);
        assert_eq!(newton.display_with(&symbols).to_string(), "m*kg/s^2");

        let hertz = Dimension::from_exponents(vec![0, -1, 0]);
        assert_eq!(hertz.display_with(&symbols).to_string(), "1/s");

        let none = Dimension::dimensionless(3);
        assert_eq!(none.display_with(&symbols).to_string(), "1");
    }
}
