//! Semantic analysis of unit-aware programs

mod analyzer;
mod scope;
mod signatures;
mod types;
mod value;

pub use analyzer::{Analysis, NodeResults, SemanticAnalyzer};
pub use scope::{HasScopes, ScopeError, ScopeGuard, ScopeKind, ScopeResult, ScopeStack};
pub use signatures::{FunctionSignature, FunctionSignatureTable};
pub use types::{shape_name, CastOutcome, Shape, TypeChecker, TypeError, TypeResult};
pub use value::{TypedValue, Value};
