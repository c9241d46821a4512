//! Top-level items

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{Block, NodeId, Stmt};
use crate::common::Span;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Item {
    Global(Stmt),
    Function(FunctionDecl),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDecl {
    pub id: NodeId,
    pub name: String,
    #[serde(default)]
    pub params: Vec<Param>,
    /// `None` for functions without a return value
    #[serde(default)]
    pub ret: Option<TypeRef>,
    pub body: Block,
    /// Tagged as the program entry point
    #[serde(default)]
    pub is_entry: bool,
    #[serde(default)]
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub ty: TypeRef,
    #[serde(default)]
    pub span: Span,
}

/// Declared shape of a variable, parameter or return value
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeRef {
    #[serde(rename = "string")]
    Text,
    #[serde(rename = "boolean")]
    Flag,
    /// Any measurement; keeps the unit of whatever it receives
    Number,
    /// A unit name or symbol
    Unit(String),
}

impl TypeRef {
    pub fn unit(name: &str) -> Self {
        TypeRef::Unit(name.to_string())
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Text => write!(f, "string"),
            TypeRef::Flag => write!(f, "boolean"),
            TypeRef::Number => write!(f, "number"),
            TypeRef::Unit(name) => write!(f, "{name}"),
        }
    }
}
