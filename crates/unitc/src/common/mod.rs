//! Common infrastructure shared across the units engine and the analyzer

mod diagnostic;
mod error;
mod span;

pub use diagnostic::{Diagnostic, DiagnosticKind, DiagnosticSink, Severity, StderrSink};
pub use error::{DiagnosticReporter, FileSink, SemaError, SemaResult, UnitsError, UnitsResult};
pub use span::Span;
