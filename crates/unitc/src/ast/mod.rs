//! Program tree consumed by the analyzer
//!
//! The tree is produced by an external parser and handed over either in
//! memory or as JSON. It is never mutated; analysis results are kept in a
//! side table keyed by [`NodeId`].

mod build;
mod expr;
mod item;
mod stmt;

pub use build::TreeBuilder;
pub use expr::{BinaryOp, Expr, ExprKind, UnaryOp};
pub use item::{FunctionDecl, Item, Param, TypeRef};
pub use stmt::{Block, CondBranch, Stmt, StmtKind};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identity of a tree node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A whole program: global statements and function declarations in
/// textual order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub items: Vec<Item>,
}

impl Program {
    pub fn new(items: Vec<Item>) -> Self {
        Self { items }
    }

    pub fn from_json(source: &str) -> serde_json::Result<Self> {
        serde_json::from_str(source)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn functions(&self) -> impl Iterator<Item = &FunctionDecl> {
        self.items.iter().filter_map(|item| match item {
            Item::Function(f) => Some(f),
            Item::Global(_) => None,
        })
    }

    pub fn globals(&self) -> impl Iterator<Item = &Stmt> {
        self.items.iter().filter_map(|item| match item {
            Item::Global(s) => Some(s),
            Item::Function(_) => None,
        })
    }
}
