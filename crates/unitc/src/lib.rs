//! unitc - semantic analysis for a language whose numbers carry units
//!
//! Every numeric value is tagged with a unit of measurement. Units come from
//! a description file that declares base units, scaled units, compound units
//! and explicit conversions; the analyzer walks a program tree, folds the
//! value of every expression it can, and reports unit misuse.
//!
//! ## Architecture
//!
//! - **Units** (`units/`): description parser, dimension algebra, conversion
//!   graph and the read-only [`units::UnitCatalog`]
//! - **AST** (`ast/`): the program tree handed to the analyzer
//! - **Sema** (`sema/`): typed values, scopes, signatures and the analyzer
//! - **Common** (`common/`): spans, diagnostics and error reporting
//! - **Driver** (`driver/`): file loading and exit status

pub mod ast;
pub mod common;
pub mod driver;
pub mod sema;
pub mod units;

// Re-exports for convenience
pub use common::{Diagnostic, DiagnosticKind, DiagnosticReporter, SemaError, Span, UnitsError};
pub use driver::{DriverConfig, ExitStatus, Pipeline};
pub use sema::{Analysis, SemanticAnalyzer, TypedValue, Value};
pub use units::{UnitCatalog, Unit};
