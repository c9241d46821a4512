//! Recoverable diagnostics produced by semantic analysis

use std::fmt;

use super::Span;

/// How serious a diagnostic is. Only errors make a program invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

/// Locally recovered problems. The offending node is marked invalid and the
/// walk continues with the next independent node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    UndeclaredVariable,
    UndeclaredFunction,
    DuplicateDeclaration,
    ReservedWordViolation,
    UnknownUnit,
    IncompatibleOperandTypes,
    IncompatibleReturnType,
    ArgumentArityMismatch,
    ArgumentTypeMismatch,
    DivisionByZero,
    UnitNotConvertible,
    /// A cast to `number` dropped the unit of its operand
    DiscardedUnit,
}

impl DiagnosticKind {
    pub fn code(self) -> &'static str {
        match self {
            Self::UndeclaredVariable => "E001",
            Self::UndeclaredFunction => "E002",
            Self::DuplicateDeclaration => "E003",
            Self::ReservedWordViolation => "E004",
            Self::UnknownUnit => "E005",
            Self::IncompatibleOperandTypes => "E006",
            Self::IncompatibleReturnType => "E007",
            Self::ArgumentArityMismatch => "E008",
            Self::ArgumentTypeMismatch => "E009",
            Self::DivisionByZero => "E010",
            Self::UnitNotConvertible => "E011",
            Self::DiscardedUnit => "W001",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::UndeclaredVariable => "undeclared variable",
            Self::UndeclaredFunction => "undeclared function",
            Self::DuplicateDeclaration => "duplicate declaration",
            Self::ReservedWordViolation => "reserved word used as identifier",
            Self::UnknownUnit => "unknown unit",
            Self::IncompatibleOperandTypes => "incompatible operand types",
            Self::IncompatibleReturnType => "incompatible return type",
            Self::ArgumentArityMismatch => "wrong number of arguments",
            Self::ArgumentTypeMismatch => "argument type mismatch",
            Self::DivisionByZero => "division by zero",
            Self::UnitNotConvertible => "unit not convertible",
            Self::DiscardedUnit => "unit discarded by cast",
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// One finding, tied to a source position
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub severity: Severity,
    pub span: Span,
    pub message: String,
}

impl Diagnostic {
    pub fn error(kind: DiagnosticKind, message: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            severity: Severity::Error,
            span,
            message: message.into(),
        }
    }

    pub fn warning(kind: DiagnosticKind, message: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            severity: Severity::Warning,
            span,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(
            f,
            "{level}[{}] at {}: {}",
            self.kind.code(),
            self.span,
            self.message
        )
    }
}

/// Receiver for analysis diagnostics
pub trait DiagnosticSink {
    fn emit(&mut self, diagnostic: &Diagnostic);
}

impl DiagnosticSink for Vec<Diagnostic> {
    fn emit(&mut self, diagnostic: &Diagnostic) {
        self.push(diagnostic.clone());
    }
}

/// Writes one line per diagnostic to stderr
#[derive(Debug, Default)]
pub struct StderrSink;

impl DiagnosticSink for StderrSink {
    fn emit(&mut self, diagnostic: &Diagnostic) {
        eprintln!("{diagnostic}");
    }
}
