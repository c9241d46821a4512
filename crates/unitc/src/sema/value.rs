//! Values flowing through analysis
//!
//! A [`Value`] is either a text or flag marker or a unit-tagged
//! [`TypedValue`]. Every operation returns a new value.
//!
//! A measurement is *known* when its value follows from literals along
//! straight-line code. Call results, parameters and anything assigned under
//! control flow are unknown and carry [`PLACEHOLDER`]; value-dependent checks
//! (zero divisors, exponents) only trust known values.

use std::fmt;

use crate::units::algebra::{self, AlgebraError, AlgebraResult, Magnitude};
use crate::units::{Unit, UnitCatalog};

/// Value carried by every unknown measurement
pub const PLACEHOLDER: f64 = 1.0;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text,
    Flag,
    Measurement(TypedValue),
}

impl Value {
    pub fn measurement(unit: Unit, value: f64) -> Self {
        Value::Measurement(TypedValue::new(unit, value))
    }

    /// A measurement in `unit` whose value cannot be known statically
    pub fn unknown(unit: Unit) -> Self {
        Value::Measurement(TypedValue::unknown(unit))
    }

    pub fn as_measurement(&self) -> Option<&TypedValue> {
        match self {
            Value::Measurement(m) => Some(m),
            Value::Text | Value::Flag => None,
        }
    }

    /// Same shape with any measurement value forgotten
    pub fn forgotten(&self) -> Value {
        match self {
            Value::Measurement(m) => Value::Measurement(m.forgotten()),
            Value::Text => Value::Text,
            Value::Flag => Value::Flag,
        }
    }

    /// Name of the value's category as written in declarations
    pub fn describe(&self) -> String {
        match self {
            Value::Text => "string".to_string(),
            Value::Flag => "boolean".to_string(),
            Value::Measurement(m) => m.unit.name.clone(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text => write!(f, "string"),
            Value::Flag => write!(f, "boolean"),
            Value::Measurement(m) => write!(f, "{m}"),
        }
    }
}

/// A numeric value tagged with a specific unit
#[derive(Debug, Clone, PartialEq)]
pub struct TypedValue {
    pub unit: Unit,
    pub value: f64,
    /// `value` is a compile-time constant
    pub known: bool,
}

impl TypedValue {
    pub fn new(unit: Unit, value: f64) -> Self {
        Self {
            unit,
            value,
            known: true,
        }
    }

    pub fn unknown(unit: Unit) -> Self {
        Self {
            unit,
            value: PLACEHOLDER,
            known: false,
        }
    }

    /// Result of an operation; unknown results drop their value
    fn derived(unit: Unit, value: f64, known: bool) -> Self {
        if known {
            Self::new(unit, value)
        } else {
            Self::unknown(unit)
        }
    }

    pub fn forgotten(&self) -> TypedValue {
        Self::unknown(self.unit.clone())
    }

    fn magnitude(&self) -> Magnitude {
        Magnitude::new(self.unit.dimension.clone(), self.value)
    }

    pub fn is_dimensionless(&self) -> bool {
        self.unit.is_dimensionless()
    }

    fn is_known_zero(&self) -> bool {
        self.known && self.value == 0.0
    }

    /// Same dimension vector, or a conversion path between the two units
    pub fn type_is_compatible(&self, other: &TypedValue, catalog: &UnitCatalog) -> bool {
        self.unit.dimension == other.unit.dimension
            || catalog.factor(&self.unit.name, &other.unit.name).is_some()
    }

    /// Re-express this value in `target`.
    ///
    /// Identical units are the identity, a table factor rescales, equal
    /// dimensions retag. Anything else is `None`.
    pub fn convert_type_to(&self, target: &Unit, catalog: &UnitCatalog) -> Option<TypedValue> {
        if self.unit == *target {
            return Some(self.clone());
        }
        if let Some(factor) = catalog.factor(&self.unit.name, &target.name) {
            return Some(Self::derived(target.clone(), self.value * factor, self.known));
        }
        if self.unit.dimension == target.dimension {
            return Some(Self::derived(target.clone(), self.value, self.known));
        }
        None
    }

    /// Keep the value, change the unit
    pub fn retagged(&self, unit: Unit) -> TypedValue {
        Self::derived(unit, self.value, self.known)
    }

    /// This value expressed in the coherent unit of its unit
    fn to_coherent(&self, catalog: &UnitCatalog) -> TypedValue {
        let coherent = catalog.coherent_unit(&self.unit);
        self.convert_type_to(&coherent, catalog)
            .unwrap_or_else(|| self.retagged(coherent))
    }

    fn tagged(magnitude: Magnitude, known: bool, catalog: &UnitCatalog) -> TypedValue {
        Self::derived(
            catalog.unit_for_dimension(&magnitude.dimension),
            magnitude.value,
            known,
        )
    }

    /// Sum in the unit of `self`
    pub fn add(&self, other: &TypedValue, catalog: &UnitCatalog) -> AlgebraResult<TypedValue> {
        let other = self.aligned(other, catalog)?;
        let sum = algebra::add(&self.magnitude(), &other.magnitude())?;
        Ok(Self::derived(self.unit.clone(), sum.value, self.known && other.known))
    }

    /// Difference in the unit of `self`
    pub fn sub(&self, other: &TypedValue, catalog: &UnitCatalog) -> AlgebraResult<TypedValue> {
        let other = self.aligned(other, catalog)?;
        let diff = algebra::subtract(&self.magnitude(), &other.magnitude())?;
        Ok(Self::derived(self.unit.clone(), diff.value, self.known && other.known))
    }

    fn aligned(&self, other: &TypedValue, catalog: &UnitCatalog) -> AlgebraResult<TypedValue> {
        if !self.type_is_compatible(other, catalog) {
            return Err(AlgebraError::IncompatibleUnits);
        }
        other
            .convert_type_to(&self.unit, catalog)
            .ok_or(AlgebraError::IncompatibleUnits)
    }

    pub fn mul(&self, other: &TypedValue, catalog: &UnitCatalog) -> TypedValue {
        let known = self.known && other.known;
        if other.is_dimensionless() {
            return Self::derived(self.unit.clone(), self.value * other.value, known);
        }
        if self.is_dimensionless() {
            return Self::derived(other.unit.clone(), self.value * other.value, known);
        }
        let product = algebra::multiply(
            &self.to_coherent(catalog).magnitude(),
            &other.to_coherent(catalog).magnitude(),
        );
        Self::tagged(product, known, catalog)
    }

    /// Quotient; only a known zero divisor is an error
    pub fn div(&self, other: &TypedValue, catalog: &UnitCatalog) -> AlgebraResult<TypedValue> {
        if other.is_known_zero() {
            return Err(AlgebraError::DivisionByZero);
        }
        let known = self.known && other.known;
        if self.unit == other.unit {
            return Ok(Self::derived(
                catalog.number().clone(),
                self.value / other.value,
                known,
            ));
        }
        if other.is_dimensionless() {
            return Ok(Self::derived(self.unit.clone(), self.value / other.value, known));
        }
        let quotient = algebra::divide(
            &self.to_coherent(catalog).magnitude(),
            &other.to_coherent(catalog).magnitude(),
        )?;
        Ok(Self::tagged(quotient, known, catalog))
    }

    /// Raise to a dimensionless exponent. A base with a unit needs a known
    /// exponent, since the exponent scales its dimension.
    pub fn pow(&self, exponent: &TypedValue, catalog: &UnitCatalog) -> AlgebraResult<TypedValue> {
        if !exponent.is_dimensionless() {
            return Err(AlgebraError::IncompatibleUnits);
        }
        let known = self.known && exponent.known;
        if self.is_dimensionless() {
            let raised = algebra::power(&self.magnitude(), &exponent.magnitude())?;
            return Ok(Self::derived(self.unit.clone(), raised.value, known));
        }
        if !exponent.known {
            return Err(AlgebraError::UnknownExponent);
        }
        if exponent.value == 1.0 {
            return Ok(self.clone());
        }
        let raised = algebra::power(&self.to_coherent(catalog).magnitude(), &exponent.magnitude())?;
        Ok(Self::tagged(raised, known, catalog))
    }

    /// Remainder by a dimensionless divisor, in the unit of `self`
    pub fn modulus(&self, other: &TypedValue) -> AlgebraResult<TypedValue> {
        if !other.is_dimensionless() {
            return Err(AlgebraError::IncompatibleUnits);
        }
        if other.is_known_zero() {
            return Err(AlgebraError::DivisionByZero);
        }
        let rem = algebra::modulus(&self.magnitude(), &other.magnitude())?;
        Ok(Self::derived(self.unit.clone(), rem.value, self.known && other.known))
    }

    pub fn negate(&self) -> TypedValue {
        Self::derived(self.unit.clone(), -self.value, self.known)
    }
}

impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.known, self.unit.symbol.is_empty()) {
            (true, true) => write!(f, "{}", self.value),
            (true, false) => write!(f, "{} {}", self.value, self.unit.symbol),
            (false, true) => write!(f, "?"),
            (false, false) => write!(f, "? {}", self.unit.symbol),
        }
    }
}
