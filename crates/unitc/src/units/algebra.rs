//! Arithmetic over (dimension, value) pairs
//!
//! These rules only propagate shapes during analysis. Scale handling between
//! differently sized units of one dimension is done by the caller before
//! values reach this module.

use thiserror::Error;

use super::Dimension;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AlgebraError {
    #[error("operand dimensions are incompatible")]
    IncompatibleUnits,

    #[error("division by zero")]
    DivisionByZero,

    #[error("exponent {0} is not an integer")]
    NonIntegerExponent(f64),

    #[error("exponent is not a constant")]
    UnknownExponent,
}

pub type AlgebraResult<T> = Result<T, AlgebraError>;

/// A value together with its dimension vector
#[derive(Debug, Clone, PartialEq)]
pub struct Magnitude {
    pub dimension: Dimension,
    pub value: f64,
}

impl Magnitude {
    pub fn new(dimension: Dimension, value: f64) -> Self {
        Self { dimension, value }
    }
}

pub fn add(a: &Magnitude, b: &Magnitude) -> AlgebraResult<Magnitude> {
    if a.dimension != b.dimension {
        return Err(AlgebraError::IncompatibleUnits);
    }
    Ok(Magnitude::new(a.dimension.clone(), a.value + b.value))
}

pub fn subtract(a: &Magnitude, b: &Magnitude) -> AlgebraResult<Magnitude> {
    if a.dimension != b.dimension {
        return Err(AlgebraError::IncompatibleUnits);
    }
    Ok(Magnitude::new(a.dimension.clone(), a.value - b.value))
}

pub fn multiply(a: &Magnitude, b: &Magnitude) -> Magnitude {
    Magnitude::new(a.dimension.mul(&b.dimension), a.value * b.value)
}

pub fn divide(a: &Magnitude, b: &Magnitude) -> AlgebraResult<Magnitude> {
    if b.value == 0.0 {
        return Err(AlgebraError::DivisionByZero);
    }
    Ok(Magnitude::new(a.dimension.div(&b.dimension), a.value / b.value))
}

/// `base ^ exponent`. The exponent must be dimensionless; unless the base is
/// dimensionless too, its value must also be integral.
pub fn power(base: &Magnitude, exponent: &Magnitude) -> AlgebraResult<Magnitude> {
    if !exponent.dimension.is_dimensionless() {
        return Err(AlgebraError::IncompatibleUnits);
    }
    if base.dimension.is_dimensionless() {
        return Ok(Magnitude::new(
            base.dimension.clone(),
            base.value.powf(exponent.value),
        ));
    }

    let n = exponent.value;
    if n.fract() != 0.0 || !n.is_finite() || n.abs() > f64::from(i32::MAX) {
        return Err(AlgebraError::NonIntegerExponent(n));
    }
    let n = n as i32;
    Ok(Magnitude::new(base.dimension.pow(n), base.value.powi(n)))
}

pub fn modulus(a: &Magnitude, b: &Magnitude) -> AlgebraResult<Magnitude> {
    if !b.dimension.is_dimensionless() {
        return Err(AlgebraError::IncompatibleUnits);
    }
    if b.value == 0.0 {
        return Err(AlgebraError::DivisionByZero);
    }
    Ok(Magnitude::new(a.dimension.clone(), a.value % b.value))
}
