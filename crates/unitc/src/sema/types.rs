//! Operator, cast and coercion rules over [`Value`]

use thiserror::Error;

use super::value::{TypedValue, Value};
use crate::ast::{BinaryOp, TypeRef, UnaryOp};
use crate::common::DiagnosticKind;
use crate::units::algebra::AlgebraError;
use crate::units::{Unit, UnitCatalog, NUMBER};

/// A failed rule, already classified for reporting
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct TypeError {
    pub kind: DiagnosticKind,
    pub message: String,
}

impl TypeError {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    fn operands(op: BinaryOp, left: &Value, right: &Value) -> Self {
        Self::new(
            DiagnosticKind::IncompatibleOperandTypes,
            format!(
                "operator '{op}' cannot be applied to {} and {}",
                left.describe(),
                right.describe()
            ),
        )
    }

    fn from_algebra(err: AlgebraError, op: BinaryOp, left: &TypedValue, right: &TypedValue) -> Self {
        match err {
            AlgebraError::IncompatibleUnits => Self::new(
                DiagnosticKind::UnitNotConvertible,
                format!(
                    "operator '{op}' cannot combine '{}' with '{}'",
                    left.unit.name, right.unit.name
                ),
            ),
            AlgebraError::DivisionByZero => {
                Self::new(DiagnosticKind::DivisionByZero, format!("'{op}' by zero"))
            }
            AlgebraError::NonIntegerExponent(n) => Self::new(
                DiagnosticKind::IncompatibleOperandTypes,
                format!("'{}' cannot be raised to the non-integer power {n}", left.unit.name),
            ),
            AlgebraError::UnknownExponent => Self::new(
                DiagnosticKind::IncompatibleOperandTypes,
                format!(
                    "the exponent of '{}' must be a constant, since it scales the unit",
                    left.unit.name
                ),
            ),
        }
    }
}

pub type TypeResult<T> = Result<T, TypeError>;

/// A declared shape with its unit resolved against the catalog
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Text,
    Flag,
    /// Any measurement
    Number,
    Unit(Unit),
}

/// Result of a cast that succeeded
#[derive(Debug, Clone, PartialEq)]
pub struct CastOutcome {
    pub value: Value,
    /// Set when a cast to `number` dropped this unit
    pub discarded: Option<Unit>,
}

/// Type checker bound to one catalog
pub struct TypeChecker<'c> {
    catalog: &'c UnitCatalog,
}

impl<'c> TypeChecker<'c> {
    pub fn new(catalog: &'c UnitCatalog) -> Self {
        Self { catalog }
    }

    /// Resolve a declared type; `None` if it names an unknown unit
    pub fn resolve(&self, ty: &TypeRef) -> Option<Shape> {
        match ty {
            TypeRef::Text => Some(Shape::Text),
            TypeRef::Flag => Some(Shape::Flag),
            TypeRef::Number => Some(Shape::Number),
            TypeRef::Unit(name) => self.catalog.lookup(name).cloned().map(Shape::Unit),
        }
    }

    /// Stand-in value of a shape when the real one cannot be known
    pub fn placeholder(&self, shape: &Shape) -> Value {
        match shape {
            Shape::Text => Value::Text,
            Shape::Flag => Value::Flag,
            Shape::Number => Value::unknown(self.catalog.number().clone()),
            Shape::Unit(unit) => Value::unknown(unit.clone()),
        }
    }

    pub fn binary(&self, op: BinaryOp, left: &Value, right: &Value) -> TypeResult<Value> {
        match (left, right) {
            (Value::Measurement(a), Value::Measurement(b)) => self.measurement_binary(op, a, b),
            (Value::Text, Value::Text) => match op {
                BinaryOp::Add | BinaryOp::Sub => Ok(Value::Text),
                _ if op.is_comparison() => Ok(Value::Flag),
                _ => Err(TypeError::operands(op, left, right)),
            },
            (Value::Text, Value::Measurement(count)) | (Value::Measurement(count), Value::Text)
                if op == BinaryOp::Mul =>
            {
                if count.is_dimensionless() {
                    Ok(Value::Text)
                } else {
                    Err(TypeError::new(
                        DiagnosticKind::IncompatibleOperandTypes,
                        format!(
                            "a string can only be repeated a dimensionless number of times, not '{}'",
                            count.unit.name
                        ),
                    ))
                }
            }
            (Value::Flag, Value::Flag) => match op {
                BinaryOp::Eq | BinaryOp::Ne => Ok(Value::Flag),
                _ if op.is_logical() => Ok(Value::Flag),
                _ => Err(TypeError::operands(op, left, right)),
            },
            _ => Err(TypeError::operands(op, left, right)),
        }
    }

    fn measurement_binary(&self, op: BinaryOp, a: &TypedValue, b: &TypedValue) -> TypeResult<Value> {
        let catalog = self.catalog;
        let result = match op {
            BinaryOp::Add => a.add(b, catalog),
            BinaryOp::Sub => a.sub(b, catalog),
            BinaryOp::Mul => Ok(a.mul(b, catalog)),
            BinaryOp::Div => a.div(b, catalog),
            BinaryOp::Mod => a.modulus(b),
            BinaryOp::Pow => a.pow(b, catalog),
            _ if op.is_comparison() => {
                return if a.type_is_compatible(b, catalog) {
                    Ok(Value::Flag)
                } else {
                    Err(TypeError::from_algebra(AlgebraError::IncompatibleUnits, op, a, b))
                };
            }
            _ => {
                return Err(TypeError::operands(
                    op,
                    &Value::Measurement(a.clone()),
                    &Value::Measurement(b.clone()),
                ));
            }
        };
        result
            .map(Value::Measurement)
            .map_err(|err| TypeError::from_algebra(err, op, a, b))
    }

    pub fn unary(&self, op: UnaryOp, operand: &Value) -> TypeResult<Value> {
        match (op, operand) {
            (UnaryOp::Neg, Value::Measurement(m)) => Ok(Value::Measurement(m.negate())),
            (UnaryOp::Not, Value::Flag) => Ok(Value::Flag),
            _ => Err(TypeError::new(
                DiagnosticKind::IncompatibleOperandTypes,
                format!("operator '{op}' cannot be applied to {}", operand.describe()),
            )),
        }
    }

    /// `(target) value`
    pub fn cast(&self, target: &Unit, value: &Value) -> TypeResult<CastOutcome> {
        match value {
            Value::Flag => Err(TypeError::new(
                DiagnosticKind::IncompatibleOperandTypes,
                format!("a boolean cannot be cast to '{}'", target.name),
            )),
            Value::Text => Ok(CastOutcome {
                value: Value::unknown(target.clone()),
                discarded: None,
            }),
            Value::Measurement(m) => {
                if let Some(converted) = m.convert_type_to(target, self.catalog) {
                    return Ok(CastOutcome {
                        value: Value::Measurement(converted),
                        discarded: None,
                    });
                }
                if target.name == NUMBER {
                    return Ok(CastOutcome {
                        value: Value::Measurement(m.retagged(target.clone())),
                        discarded: Some(m.unit.clone()),
                    });
                }
                Err(TypeError::new(
                    DiagnosticKind::UnitNotConvertible,
                    format!("'{}' cannot be cast to '{}'", m.unit.name, target.name),
                ))
            }
        }
    }

    /// Fit `value` into a declared shape, converting measurements into a
    /// declared unit
    pub fn coerce(&self, shape: &Shape, value: &Value) -> TypeResult<Value> {
        match (shape, value) {
            (Shape::Text, Value::Text) => Ok(Value::Text),
            (Shape::Flag, Value::Flag) => Ok(Value::Flag),
            (Shape::Number, Value::Measurement(_)) => Ok(value.clone()),
            (Shape::Unit(unit), Value::Measurement(m)) => m
                .convert_type_to(unit, self.catalog)
                .map(Value::Measurement)
                .ok_or_else(|| {
                    TypeError::new(
                        DiagnosticKind::UnitNotConvertible,
                        format!("'{}' cannot be converted to '{}'", m.unit.name, unit.name),
                    )
                }),
            _ => Err(TypeError::new(
                DiagnosticKind::IncompatibleOperandTypes,
                format!("expected {}, found {}", shape_name(shape), value.describe()),
            )),
        }
    }
}

pub fn shape_name(shape: &Shape) -> String {
    match shape {
        Shape::Text => "string".to_string(),
        Shape::Flag => "boolean".to_string(),
        Shape::Number => NUMBER.to_string(),
        Shape::Unit(unit) => unit.name.clone(),
    }
}
