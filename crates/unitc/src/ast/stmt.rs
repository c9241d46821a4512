//! Statement nodes

use serde::{Deserialize, Serialize};

use super::{Expr, NodeId, TypeRef};
use crate::common::Span;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Block {
    #[serde(default)]
    pub stmts: Vec<Stmt>,
    #[serde(default)]
    pub span: Span,
}

impl Block {
    pub fn new(stmts: Vec<Stmt>, span: Span) -> Self {
        Self { stmts, span }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stmt {
    pub id: NodeId,
    #[serde(default)]
    pub span: Span,
    pub kind: StmtKind,
}

impl Stmt {
    pub fn new(id: NodeId, kind: StmtKind, span: Span) -> Self {
        Self { id, span, kind }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StmtKind {
    /// `number x = 5 km;`
    VarDecl {
        ty: TypeRef,
        name: String,
        #[serde(default)]
        init: Option<Expr>,
    },
    Assign {
        target: String,
        value: Expr,
    },
    /// `if` / `else if` chain with an optional trailing `else`
    If {
        branches: Vec<CondBranch>,
        #[serde(default)]
        otherwise: Option<Block>,
    },
    While {
        condition: Expr,
        body: Block,
    },
    For {
        #[serde(default)]
        init: Option<Box<Stmt>>,
        #[serde(default)]
        condition: Option<Expr>,
        #[serde(default)]
        update: Option<Box<Stmt>>,
        body: Block,
    },
    Return {
        #[serde(default)]
        value: Option<Expr>,
    },
    Print {
        value: Expr,
    },
    Expr {
        expr: Expr,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CondBranch {
    pub condition: Expr,
    pub body: Block,
}
