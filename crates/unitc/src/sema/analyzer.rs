//! Semantic analyzer
//!
//! One bottom-up walk over the program tree. Every node's children are
//! visited first (left to right); when all of them are valid the node's own
//! rules run and the first failing rule records one diagnostic. Sibling
//! statements are always visited, so a single run reports every independent
//! problem.
//!
//! Function bodies other than the entry point are analyzed at their call
//! sites, with the parameters bound to the converted arguments. Each
//! distinct argument shape instantiates the body once and recursive
//! re-entry is cut off.

use std::collections::{HashMap, HashSet};
use std::mem;

use tracing::{debug, trace};

use super::scope::{HasScopes, ScopeError, ScopeGuard, ScopeKind, ScopeStack};
use super::signatures::FunctionSignatureTable;
use super::types::{shape_name, Shape, TypeChecker, TypeError};
use super::value::Value;
use crate::ast::{
    Block, Expr, ExprKind, FunctionDecl, Item, NodeId, Program, Stmt, StmtKind, TypeRef,
};
use crate::common::{Diagnostic, DiagnosticKind, DiagnosticSink, SemaResult, Span};
use crate::units::UnitCatalog;

/// Values computed for expression and declaration nodes
#[derive(Debug, Clone, Default)]
pub struct NodeResults(HashMap<NodeId, Value>);

impl NodeResults {
    pub fn get(&self, id: NodeId) -> Option<&Value> {
        self.0.get(&id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// All results ordered by node id
    pub fn sorted(&self) -> Vec<(NodeId, &Value)> {
        let mut entries: Vec<(NodeId, &Value)> = self.0.iter().map(|(id, v)| (*id, v)).collect();
        entries.sort_by_key(|(id, _)| *id);
        entries
    }
}

/// Outcome of one analysis run
#[derive(Debug, Clone)]
pub struct Analysis {
    pub valid: bool,
    pub diagnostics: Vec<Diagnostic>,
    pub results: NodeResults,
}

impl Analysis {
    pub fn report(&self, sink: &mut impl DiagnosticSink) {
        for diagnostic in &self.diagnostics {
            sink.emit(diagnostic);
        }
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_error()).count()
    }

    pub fn kinds(&self) -> Vec<DiagnosticKind> {
        self.diagnostics.iter().map(|d| d.kind).collect()
    }
}

/// What a `return` inside the current body must produce
#[derive(Debug, Clone)]
enum Expected {
    Void,
    Value(Shape),
    /// The declared return type names an unknown unit
    Unchecked,
}

#[derive(Debug, Clone)]
struct ReturnFrame {
    function: String,
    expected: Expected,
    /// First valid value returned from a `number` function
    inferred: Option<Value>,
}

enum CallResult {
    Invalid,
    Void,
    Value(Value),
}

/// Instantiation key: callee declaration plus argument shapes
type InstanceKey = (NodeId, Vec<String>);

pub struct SemanticAnalyzer<'a> {
    catalog: &'a UnitCatalog,
    types: TypeChecker<'a>,
    scopes: ScopeStack,
    signatures: FunctionSignatureTable,
    functions: HashMap<NodeId, &'a FunctionDecl>,
    results: HashMap<NodeId, Value>,
    diagnostics: Vec<Diagnostic>,
    expected_return: Option<ReturnFrame>,
    active_calls: Vec<NodeId>,
    instances: HashMap<InstanceKey, Option<Value>>,
    reported: HashSet<(Span, DiagnosticKind, String)>,
}

impl HasScopes for SemanticAnalyzer<'_> {
    fn scopes_mut(&mut self) -> &mut ScopeStack {
        &mut self.scopes
    }
}

impl<'a> SemanticAnalyzer<'a> {
    pub fn new(catalog: &'a UnitCatalog) -> Self {
        Self {
            catalog,
            types: TypeChecker::new(catalog),
            scopes: ScopeStack::with_reserved(catalog.reserved_words()),
            signatures: FunctionSignatureTable::default(),
            functions: HashMap::new(),
            results: HashMap::new(),
            diagnostics: Vec::new(),
            expected_return: None,
            active_calls: Vec::new(),
            instances: HashMap::new(),
            reported: HashSet::new(),
        }
    }

    /// Analyze a whole program.
    ///
    /// Entry point problems are fatal and returned as errors; everything
    /// else ends up in [`Analysis::diagnostics`].
    pub fn analyze(mut self, program: &'a Program) -> SemaResult<Analysis> {
        self.signatures = FunctionSignatureTable::collect(program)?;
        for decl in program.functions() {
            if self.signatures.owns(decl) {
                self.functions.insert(decl.id, decl);
            }
        }

        for item in &program.items {
            if let Item::Global(stmt) = item {
                self.visit_stmt(stmt);
            }
        }
        for decl in program.functions() {
            self.visit_function_decl(decl);
        }

        debug_assert_eq!(self.scopes.depth(), 1, "scope stack not balanced");

        let valid = !self.diagnostics.iter().any(Diagnostic::is_error);
        debug!(
            valid,
            diagnostics = self.diagnostics.len(),
            instances = self.instances.len(),
            "analysis finished"
        );

        Ok(Analysis {
            valid,
            diagnostics: self.diagnostics,
            results: NodeResults(self.results),
        })
    }

    // ===== diagnostics

    fn error(&mut self, kind: DiagnosticKind, message: impl Into<String>, span: Span) {
        self.push_diagnostic(Diagnostic::error(kind, message, span));
    }

    fn warning(&mut self, kind: DiagnosticKind, message: impl Into<String>, span: Span) {
        self.push_diagnostic(Diagnostic::warning(kind, message, span));
    }

    /// Function bodies are revisited once per argument shape; a problem that
    /// does not depend on the shape is reported only the first time.
    fn push_diagnostic(&mut self, diagnostic: Diagnostic) {
        let key = (diagnostic.span, diagnostic.kind, diagnostic.message.clone());
        if !self.reported.insert(key) {
            trace!(%diagnostic, "already reported");
            return;
        }
        trace!(%diagnostic, "recorded");
        self.diagnostics.push(diagnostic);
    }

    fn type_error(&mut self, err: TypeError, span: Span) {
        self.error(err.kind, err.message, span);
    }

    fn scope_error(&mut self, err: &ScopeError, span: Span) {
        let kind = match err {
            ScopeError::Duplicate(_) => DiagnosticKind::DuplicateDeclaration,
            ScopeError::Reserved(_) => DiagnosticKind::ReservedWordViolation,
            ScopeError::Undeclared(_) => DiagnosticKind::UndeclaredVariable,
        };
        self.error(kind, err.to_string(), span);
    }

    fn record(&mut self, id: NodeId, value: Value) -> Value {
        self.results.insert(id, value.clone());
        value
    }

    // ===== functions

    fn visit_function_decl(&mut self, decl: &'a FunctionDecl) -> bool {
        let mut valid = true;

        if !self.signatures.owns(decl) {
            self.error(
                DiagnosticKind::DuplicateDeclaration,
                format!("function '{}' is already declared", decl.name),
                decl.span,
            );
            return false;
        }
        if self.catalog.is_reserved(&decl.name) {
            self.error(
                DiagnosticKind::ReservedWordViolation,
                format!("'{}' is a reserved word and cannot name a function", decl.name),
                decl.span,
            );
            valid = false;
        }

        let mut seen = HashSet::new();
        for param in &decl.params {
            if self.catalog.is_reserved(&param.name) {
                self.error(
                    DiagnosticKind::ReservedWordViolation,
                    format!("'{}' is a reserved word and cannot name a parameter", param.name),
                    param.span,
                );
                valid = false;
            } else if !seen.insert(param.name.as_str()) {
                self.error(
                    DiagnosticKind::DuplicateDeclaration,
                    format!("parameter '{}' is declared twice", param.name),
                    param.span,
                );
                valid = false;
            }
            if self.types.resolve(&param.ty).is_none() {
                self.error(
                    DiagnosticKind::UnknownUnit,
                    format!("unknown unit '{}'", param.ty),
                    param.span,
                );
                valid = false;
            }
        }

        if let Some(ret) = &decl.ret {
            if self.types.resolve(ret).is_none() {
                self.error(
                    DiagnosticKind::UnknownUnit,
                    format!("unknown return unit '{ret}'"),
                    decl.span,
                );
                valid = false;
            }
        }

        if decl.is_entry {
            let bindings = decl
                .params
                .iter()
                .map(|p| (p.name.clone(), self.placeholder_for(&p.ty)))
                .collect();
            self.active_calls.push(decl.id);
            self.visit_function_body(decl, bindings);
            self.active_calls.pop();
        }
        valid
    }

    fn placeholder_for(&self, ty: &TypeRef) -> Value {
        let shape = self.types.resolve(ty).unwrap_or(Shape::Number);
        self.types.placeholder(&shape)
    }

    /// Analyze a body in a fresh function scope; yields the inferred return
    /// value of `number` functions
    fn visit_function_body(
        &mut self,
        decl: &'a FunctionDecl,
        bindings: Vec<(String, Value)>,
    ) -> Option<Value> {
        let expected = match &decl.ret {
            None => Expected::Void,
            Some(ty) => self
                .types
                .resolve(ty)
                .map_or(Expected::Unchecked, Expected::Value),
        };
        let frame = ReturnFrame {
            function: decl.name.clone(),
            expected,
            inferred: None,
        };
        let saved = mem::replace(&mut self.expected_return, Some(frame));

        {
            let mut this = ScopeGuard::enter(self, ScopeKind::Function);
            for (name, value) in bindings {
                this.scopes.bind(&name, value.forgotten());
            }
            this.visit_stmts(&decl.body.stmts);
        }

        let frame = mem::replace(&mut self.expected_return, saved);
        frame.and_then(|f| f.inferred)
    }

    // ===== statements

    fn visit_stmts(&mut self, stmts: &[Stmt]) -> bool {
        let mut valid = true;
        for stmt in stmts {
            valid &= self.visit_stmt(stmt);
        }
        valid
    }

    /// A control-flow body in its own block scope
    fn visit_scoped_block(&mut self, block: &Block) -> bool {
        let mut this = ScopeGuard::enter(self, ScopeKind::Block);
        this.visit_stmts(&block.stmts)
    }

    fn visit_stmt(&mut self, stmt: &Stmt) -> bool {
        match &stmt.kind {
            StmtKind::VarDecl { ty, name, init } => self.visit_var_decl(stmt, ty, name, init.as_ref()),
            StmtKind::Assign { target, value } => self.visit_assign(stmt, target, value),
            StmtKind::If {
                branches,
                otherwise,
            } => {
                let mut valid = true;
                for branch in branches {
                    valid &= self.visit_condition(&branch.condition);
                    valid &= self.visit_scoped_block(&branch.body);
                }
                if let Some(block) = otherwise {
                    valid &= self.visit_scoped_block(block);
                }
                valid
            }
            StmtKind::While { condition, body } => {
                let condition_ok = self.visit_condition(condition);
                self.visit_scoped_block(body) && condition_ok
            }
            StmtKind::For {
                init,
                condition,
                update,
                body,
            } => {
                let mut outer = ScopeGuard::enter(self, ScopeKind::Block);
                let mut valid = true;
                if let Some(init) = init {
                    valid &= outer.visit_stmt(init);
                }
                // condition, update and body repeat
                let mut this = ScopeGuard::enter(&mut *outer, ScopeKind::Block);
                if let Some(condition) = condition {
                    valid &= this.visit_condition(condition);
                }
                if let Some(update) = update {
                    valid &= this.visit_stmt(update);
                }
                valid &= this.visit_stmts(&body.stmts);
                valid
            }
            StmtKind::Return { value } => self.visit_return(stmt, value.as_ref()),
            StmtKind::Print { value } => self.visit_expr(value).is_some(),
            StmtKind::Expr { expr } => match &expr.kind {
                ExprKind::Call { callee, args } => {
                    !matches!(self.visit_call(expr, callee, args), CallResult::Invalid)
                }
                _ => self.visit_expr(expr).is_some(),
            },
        }
    }

    fn visit_condition(&mut self, condition: &Expr) -> bool {
        match self.visit_expr(condition) {
            Some(Value::Flag) => true,
            Some(other) => {
                self.error(
                    DiagnosticKind::IncompatibleOperandTypes,
                    format!("condition must be a boolean, found {}", other.describe()),
                    condition.span,
                );
                false
            }
            None => false,
        }
    }

    fn visit_var_decl(&mut self, stmt: &Stmt, ty: &TypeRef, name: &str, init: Option<&Expr>) -> bool {
        let init_value = init.map(|expr| self.visit_expr(expr));
        if matches!(init_value, Some(None)) {
            self.bind_placeholder(name, ty);
            return false;
        }

        let Some(shape) = self.types.resolve(ty) else {
            self.error(
                DiagnosticKind::UnknownUnit,
                format!("unknown unit '{ty}'"),
                stmt.span,
            );
            self.bind_placeholder(name, ty);
            return false;
        };

        let value = match init_value.flatten() {
            Some(value) => match self.types.coerce(&shape, &value) {
                Ok(value) => value,
                Err(err) => {
                    self.type_error(err, stmt.span);
                    self.bind_placeholder(name, ty);
                    return false;
                }
            },
            None => self.types.placeholder(&shape),
        };

        match self.scopes.declare(name, value.clone()) {
            Ok(()) => {
                self.record(stmt.id, value);
                true
            }
            Err(err) => {
                self.scope_error(&err, stmt.span);
                false
            }
        }
    }

    /// Keep a failed declaration visible so later statements can be checked
    fn bind_placeholder(&mut self, name: &str, ty: &TypeRef) {
        let placeholder = self.placeholder_for(ty);
        // the declaration already has an error; a bad name is not reported twice
        if let Err(err) = self.scopes.declare(name, placeholder) {
            trace!(%err, name, "placeholder not bound");
        }
    }

    fn visit_assign(&mut self, stmt: &Stmt, target: &str, value: &Expr) -> bool {
        let Some(value) = self.visit_expr(value) else {
            return false;
        };
        let Some(current) = self.scopes.get(target) else {
            self.error(
                DiagnosticKind::UndeclaredVariable,
                format!("variable '{target}' is not declared"),
                stmt.span,
            );
            return false;
        };

        let shape = match current {
            Value::Text => Shape::Text,
            Value::Flag => Shape::Flag,
            Value::Measurement(m) => Shape::Unit(m.unit.clone()),
        };
        let value = match self.types.coerce(&shape, &value) {
            Ok(value) => value,
            Err(err) => {
                self.type_error(err, stmt.span);
                return false;
            }
        };

        match self.scopes.assign(target, value.clone()) {
            Ok(()) => {
                self.record(stmt.id, value);
                true
            }
            Err(err) => {
                self.scope_error(&err, stmt.span);
                false
            }
        }
    }

    fn visit_return(&mut self, stmt: &Stmt, value: Option<&Expr>) -> bool {
        let value = match value {
            Some(expr) => match self.visit_expr(expr) {
                Some(value) => Some(value),
                None => return false,
            },
            None => None,
        };

        let Some(frame) = &self.expected_return else {
            self.error(
                DiagnosticKind::IncompatibleReturnType,
                "return outside of a function",
                stmt.span,
            );
            return false;
        };
        let function = frame.function.clone();

        let checked = match (frame.expected.clone(), value) {
            (Expected::Unchecked, _) | (Expected::Void, None) => return true,
            (Expected::Void, Some(value)) => Err(format!(
                "function '{function}' does not return a value, found {}",
                value.describe()
            )),
            (Expected::Value(shape), None) => Err(format!(
                "function '{function}' must return {}",
                shape_name(&shape)
            )),
            (Expected::Value(shape), Some(value)) => self
                .types
                .coerce(&shape, &value)
                .map(|converted| (shape, converted))
                .map_err(|err| format!("in function '{function}': {err}")),
        };

        match checked {
            Ok((shape, value)) => {
                if shape == Shape::Number {
                    if let Some(frame) = self.expected_return.as_mut() {
                        frame.inferred.get_or_insert(value);
                    }
                }
                true
            }
            Err(message) => {
                self.error(DiagnosticKind::IncompatibleReturnType, message, stmt.span);
                false
            }
        }
    }

    // ===== expressions

    fn visit_expr(&mut self, expr: &Expr) -> Option<Value> {
        let value = match &expr.kind {
            ExprKind::Number { value, unit } => {
                let unit = match unit {
                    None => self.catalog.number().clone(),
                    Some(name) => match self.catalog.lookup(name) {
                        Some(unit) => unit.clone(),
                        None => {
                            self.error(
                                DiagnosticKind::UnknownUnit,
                                format!("unknown unit '{name}'"),
                                expr.span,
                            );
                            return None;
                        }
                    },
                };
                Value::measurement(unit, *value)
            }
            ExprKind::Text { .. } => Value::Text,
            ExprKind::Flag { .. } => Value::Flag,
            ExprKind::Var { name } => match self.scopes.get(name) {
                Some(value) => value.clone(),
                None => {
                    self.error(
                        DiagnosticKind::UndeclaredVariable,
                        format!("variable '{name}' is not declared"),
                        expr.span,
                    );
                    return None;
                }
            },
            ExprKind::Unary { op, operand } => {
                let operand = self.visit_expr(operand)?;
                match self.types.unary(*op, &operand) {
                    Ok(value) => value,
                    Err(err) => {
                        self.type_error(err, expr.span);
                        return None;
                    }
                }
            }
            ExprKind::Binary { op, left, right } => {
                let left = self.visit_expr(left);
                let right = self.visit_expr(right);
                let (left, right) = (left?, right?);
                match self.types.binary(*op, &left, &right) {
                    Ok(value) => value,
                    Err(err) => {
                        self.type_error(err, expr.span);
                        return None;
                    }
                }
            }
            ExprKind::Cast { unit, expr: inner } => {
                let operand = self.visit_expr(inner)?;
                let Some(target) = self.catalog.lookup(unit) else {
                    self.error(
                        DiagnosticKind::UnknownUnit,
                        format!("unknown unit '{unit}'"),
                        expr.span,
                    );
                    return None;
                };
                match self.types.cast(target, &operand) {
                    Ok(outcome) => {
                        if let Some(lost) = outcome.discarded {
                            self.warning(
                                DiagnosticKind::DiscardedUnit,
                                format!("cast to '{}' discards unit '{}'", target.name, lost.name),
                                expr.span,
                            );
                        }
                        outcome.value
                    }
                    Err(err) => {
                        self.type_error(err, expr.span);
                        return None;
                    }
                }
            }
            ExprKind::Call { callee, args } => match self.visit_call(expr, callee, args) {
                CallResult::Value(value) => value,
                CallResult::Void => {
                    self.error(
                        DiagnosticKind::IncompatibleOperandTypes,
                        format!("function '{callee}' does not return a value"),
                        expr.span,
                    );
                    return None;
                }
                CallResult::Invalid => return None,
            },
        };
        Some(self.record(expr.id, value))
    }

    fn visit_call(&mut self, expr: &Expr, callee: &str, args: &[Expr]) -> CallResult {
        let values: Vec<Option<Value>> = args.iter().map(|arg| self.visit_expr(arg)).collect();
        let Some(values) = values.into_iter().collect::<Option<Vec<Value>>>() else {
            return CallResult::Invalid;
        };

        let Some(signature) = self.signatures.lookup(callee).cloned() else {
            self.error(
                DiagnosticKind::UndeclaredFunction,
                format!("function '{callee}' is not declared"),
                expr.span,
            );
            return CallResult::Invalid;
        };

        if signature.arity() != values.len() {
            self.error(
                DiagnosticKind::ArgumentArityMismatch,
                format!(
                    "function '{callee}' takes {} argument(s) but {} were given",
                    signature.arity(),
                    values.len()
                ),
                expr.span,
            );
            return CallResult::Invalid;
        }

        let mut bindings = Vec::with_capacity(values.len());
        for (position, ((name, ty), (value, arg))) in signature
            .params
            .iter()
            .zip(values.iter().zip(args))
            .enumerate()
        {
            // unknown parameter units are reported on the declaration
            let Some(shape) = self.types.resolve(ty) else {
                return CallResult::Invalid;
            };
            match self.types.coerce(&shape, value) {
                Ok(converted) => bindings.push((name.clone(), converted)),
                Err(err) => {
                    self.error(
                        DiagnosticKind::ArgumentTypeMismatch,
                        format!("argument {} of '{callee}': {err}", position + 1),
                        arg.span,
                    );
                    return CallResult::Invalid;
                }
            }
        }

        let inferred = self.instantiate(signature.decl, bindings);

        match &signature.ret {
            None => CallResult::Void,
            Some(ty) => match self.types.resolve(ty) {
                None => CallResult::Invalid,
                Some(Shape::Number) => {
                    let unit = match inferred {
                        Some(Value::Measurement(m)) => m.unit,
                        _ => self.catalog.number().clone(),
                    };
                    CallResult::Value(Value::unknown(unit))
                }
                Some(shape) => CallResult::Value(self.types.placeholder(&shape)),
            },
        }
    }

    /// Visit the callee body once per argument shape
    fn instantiate(&mut self, decl_id: NodeId, bindings: Vec<(String, Value)>) -> Option<Value> {
        let decl = *self.functions.get(&decl_id)?;
        if self.active_calls.contains(&decl_id) {
            trace!(function = %decl.name, "recursive call not re-entered");
            return None;
        }

        let key: InstanceKey = (decl_id, bindings.iter().map(|(_, v)| v.describe()).collect());
        if let Some(inferred) = self.instances.get(&key) {
            return inferred.clone();
        }

        debug!(function = %decl.name, shapes = ?key.1, "instantiating function body");
        self.active_calls.push(decl_id);
        let inferred = self.visit_function_body(decl, bindings);
        self.active_calls.pop();

        self.instances.insert(key, inferred.clone());
        inferred
    }
}
