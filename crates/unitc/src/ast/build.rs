//! Hand-built trees for tests and embedding
//!
//! Every node gets the next id and the one-byte span `id..id + 1`, so
//! diagnostics can be matched back to the node that produced them.

use super::{
    BinaryOp, Block, CondBranch, Expr, ExprKind, FunctionDecl, Item, NodeId, Param, Program, Stmt,
    StmtKind, TypeRef, UnaryOp,
};
use crate::common::Span;

#[derive(Debug, Default)]
pub struct TreeBuilder {
    next: u32,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&mut self) -> (NodeId, Span) {
        let id = self.next;
        self.next += 1;
        (NodeId(id), Span::new(id as usize, id as usize + 1))
    }

    fn expr(&mut self, kind: ExprKind) -> Expr {
        let (id, span) = self.next_id();
        Expr::new(id, kind, span)
    }

    fn stmt(&mut self, kind: StmtKind) -> Stmt {
        let (id, span) = self.next_id();
        Stmt::new(id, kind, span)
    }

    // ===== expressions

    pub fn number(&mut self, value: f64) -> Expr {
        self.expr(ExprKind::Number { value, unit: None })
    }

    /// `5 km`
    pub fn measure(&mut self, value: f64, unit: &str) -> Expr {
        self.expr(ExprKind::Number {
            value,
            unit: Some(unit.to_string()),
        })
    }

    pub fn text(&mut self, value: &str) -> Expr {
        self.expr(ExprKind::Text {
            value: value.to_string(),
        })
    }

    pub fn flag(&mut self, value: bool) -> Expr {
        self.expr(ExprKind::Flag { value })
    }

    pub fn var(&mut self, name: &str) -> Expr {
        self.expr(ExprKind::Var {
            name: name.to_string(),
        })
    }

    pub fn unary(&mut self, op: UnaryOp, operand: Expr) -> Expr {
        self.expr(ExprKind::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    pub fn binary(&mut self, op: BinaryOp, left: Expr, right: Expr) -> Expr {
        self.expr(ExprKind::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    pub fn cast(&mut self, unit: &str, expr: Expr) -> Expr {
        self.expr(ExprKind::Cast {
            unit: unit.to_string(),
            expr: Box::new(expr),
        })
    }

    pub fn call(&mut self, callee: &str, args: Vec<Expr>) -> Expr {
        self.expr(ExprKind::Call {
            callee: callee.to_string(),
            args,
        })
    }

    // ===== statements

    pub fn declare(&mut self, ty: TypeRef, name: &str, init: Option<Expr>) -> Stmt {
        self.stmt(StmtKind::VarDecl {
            ty,
            name: name.to_string(),
            init,
        })
    }

    pub fn assign(&mut self, target: &str, value: Expr) -> Stmt {
        self.stmt(StmtKind::Assign {
            target: target.to_string(),
            value,
        })
    }

    pub fn if_chain(&mut self, branches: Vec<(Expr, Block)>, otherwise: Option<Block>) -> Stmt {
        let branches = branches
            .into_iter()
            .map(|(condition, body)| CondBranch { condition, body })
            .collect();
        self.stmt(StmtKind::If {
            branches,
            otherwise,
        })
    }

    pub fn while_loop(&mut self, condition: Expr, body: Block) -> Stmt {
        self.stmt(StmtKind::While { condition, body })
    }

    pub fn for_loop(
        &mut self,
        init: Option<Stmt>,
        condition: Option<Expr>,
        update: Option<Stmt>,
        body: Block,
    ) -> Stmt {
        self.stmt(StmtKind::For {
            init: init.map(Box::new),
            condition,
            update: update.map(Box::new),
            body,
        })
    }

    pub fn ret(&mut self, value: Option<Expr>) -> Stmt {
        self.stmt(StmtKind::Return { value })
    }

    pub fn print(&mut self, value: Expr) -> Stmt {
        self.stmt(StmtKind::Print { value })
    }

    pub fn expr_stmt(&mut self, expr: Expr) -> Stmt {
        self.stmt(StmtKind::Expr { expr })
    }

    pub fn block(&mut self, stmts: Vec<Stmt>) -> Block {
        let span = match (stmts.first(), stmts.last()) {
            (Some(first), Some(last)) => first.span.merge(last.span),
            _ => Span::default(),
        };
        Block::new(stmts, span)
    }

    // ===== items

    pub fn function(
        &mut self,
        name: &str,
        params: &[(&str, TypeRef)],
        ret: Option<TypeRef>,
        body: Vec<Stmt>,
    ) -> FunctionDecl {
        let params = params
            .iter()
            .map(|(name, ty)| {
                let (_, span) = self.next_id();
                Param {
                    name: (*name).to_string(),
                    ty: ty.clone(),
                    span,
                }
            })
            .collect();
        let body = self.block(body);
        let (id, span) = self.next_id();
        FunctionDecl {
            id,
            name: name.to_string(),
            params,
            ret,
            body,
            is_entry: false,
            span,
        }
    }

    /// An entry point without parameters or return value
    pub fn entry(&mut self, name: &str, body: Vec<Stmt>) -> FunctionDecl {
        FunctionDecl {
            is_entry: true,
            ..self.function(name, &[], None, body)
        }
    }
}

impl Program {
    /// Assemble a program from global statements followed by functions
    pub fn from_parts(globals: Vec<Stmt>, functions: Vec<FunctionDecl>) -> Self {
        let items = globals
            .into_iter()
            .map(Item::Global)
            .chain(functions.into_iter().map(Item::Function))
            .collect();
        Program::new(items)
    }
}
