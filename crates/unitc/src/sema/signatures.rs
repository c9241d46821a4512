//! Function signatures collected before the main walk

use std::collections::HashMap;

use tracing::debug;

use crate::ast::{FunctionDecl, NodeId, Program, TypeRef};
use crate::common::{SemaError, SemaResult, Span};

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionSignature {
    pub name: String,
    pub params: Vec<(String, TypeRef)>,
    /// `None` when the function returns nothing
    pub ret: Option<TypeRef>,
    pub decl: NodeId,
    pub span: Span,
    pub is_entry: bool,
}

impl FunctionSignature {
    pub fn from_decl(decl: &FunctionDecl) -> Self {
        Self {
            name: decl.name.clone(),
            params: decl
                .params
                .iter()
                .map(|p| (p.name.clone(), p.ty.clone()))
                .collect(),
            ret: decl.ret.clone(),
            decl: decl.id,
            span: decl.span,
            is_entry: decl.is_entry,
        }
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

#[derive(Debug, Clone, Default)]
pub struct FunctionSignatureTable {
    signatures: HashMap<String, FunctionSignature>,
    entry: Option<String>,
}

impl FunctionSignatureTable {
    /// Scan every function declaration, in any textual order.
    ///
    /// The first declaration of a name wins; later ones are left for the
    /// walk to report.
    pub fn collect(program: &Program) -> SemaResult<Self> {
        let mut table = Self::default();

        for decl in program.functions() {
            if decl.is_entry {
                if let Some(first) = &table.entry {
                    return Err(SemaError::DuplicateEntryPoint {
                        first: first.clone(),
                        second: decl.name.clone(),
                        span: decl.span,
                    });
                }
                table.entry = Some(decl.name.clone());
            }
            table
                .signatures
                .entry(decl.name.clone())
                .or_insert_with(|| FunctionSignature::from_decl(decl));
        }

        if table.entry.is_none() {
            return Err(SemaError::MissingEntryPoint);
        }

        debug!(
            functions = table.signatures.len(),
            entry = table.entry.as_deref().unwrap_or_default(),
            "collected function signatures"
        );
        Ok(table)
    }

    pub fn lookup(&self, name: &str) -> Option<&FunctionSignature> {
        self.signatures.get(name)
    }

    /// Whether `decl` is the declaration the table kept for its name
    pub fn owns(&self, decl: &FunctionDecl) -> bool {
        self.lookup(&decl.name).is_some_and(|sig| sig.decl == decl.id)
    }

    pub fn entry_point(&self) -> Option<&FunctionSignature> {
        self.entry.as_deref().and_then(|name| self.lookup(name))
    }

    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }
}
