//! Scope stack with copy-on-enter semantics
//!
//! Entering a scope snapshots the visible bindings instead of chaining to a
//! parent, so lookups only ever inspect the innermost scope. Scope 0 is the
//! global scope and is never popped.
//!
//! Function bodies and control-flow blocks may run any number of times, so
//! the snapshot a new scope starts from forgets measurement values. An
//! assignment inside a block leaves the variable unknown in every enclosing
//! scope up to the function.

use std::collections::{HashMap, HashSet};
use std::ops::{Deref, DerefMut};

use thiserror::Error;

use super::value::Value;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScopeError {
    #[error("'{0}' is already declared in this scope")]
    Duplicate(String),

    #[error("'{0}' is a reserved word")]
    Reserved(String),

    #[error("variable '{0}' is not declared")]
    Undeclared(String),
}

pub type ScopeResult<T> = Result<T, ScopeError>;

#[derive(Debug, Clone)]
struct Scope {
    kind: ScopeKind,
    bindings: HashMap<String, Value>,
}

impl Scope {
    fn root() -> Self {
        Self {
            kind: ScopeKind::Function,
            bindings: HashMap::new(),
        }
    }
}

#[derive(Debug)]
pub struct ScopeStack {
    scopes: Vec<Scope>,
    reserved: HashSet<String>,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope::root()],
            reserved: HashSet::new(),
        }
    }

    /// A stack that refuses to declare any of `reserved`
    pub fn with_reserved<I, S>(reserved: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            scopes: vec![Scope::root()],
            reserved: reserved.into_iter().map(Into::into).collect(),
        }
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    fn current(&self) -> &Scope {
        &self.scopes[self.scopes.len() - 1]
    }

    fn current_mut(&mut self) -> &mut Scope {
        let last = self.scopes.len() - 1;
        &mut self.scopes[last]
    }

    /// Open a function scope seeded with the global bindings only
    pub fn push_function(&mut self) {
        let bindings = forget_all(&self.scopes[0].bindings);
        self.scopes.push(Scope {
            kind: ScopeKind::Function,
            bindings,
        });
    }

    /// Open a block scope seeded with everything currently visible, with
    /// measurement values forgotten
    pub fn push_block(&mut self) {
        let bindings = forget_all(&self.current().bindings);
        self.scopes.push(Scope {
            kind: ScopeKind::Block,
            bindings,
        });
    }

    /// Discard the innermost scope. The global scope stays.
    pub fn pop(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    /// Pop back down to `depth` scopes
    pub fn truncate(&mut self, depth: usize) {
        self.scopes.truncate(depth.max(1));
    }

    pub fn declare(&mut self, name: &str, value: Value) -> ScopeResult<()> {
        if self.reserved.contains(name) {
            return Err(ScopeError::Reserved(name.to_string()));
        }
        let scope = self.current_mut();
        if scope.bindings.contains_key(name) {
            return Err(ScopeError::Duplicate(name.to_string()));
        }
        scope.bindings.insert(name.to_string(), value);
        Ok(())
    }

    pub fn assign(&mut self, name: &str, value: Value) -> ScopeResult<()> {
        match self.current_mut().bindings.get_mut(name) {
            Some(slot) => *slot = value,
            None => return Err(ScopeError::Undeclared(name.to_string())),
        }

        let mut index = self.scopes.len() - 1;
        while index > 0 && self.scopes[index].kind == ScopeKind::Block {
            index -= 1;
            if let Some(slot) = self.scopes[index].bindings.get_mut(name) {
                *slot = slot.forgotten();
            }
        }
        Ok(())
    }

    /// Insert without checks; used to seed parameters
    pub fn bind(&mut self, name: &str, value: Value) {
        self.current_mut().bindings.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.current().bindings.get(name)
    }

    pub fn is_reserved(&self, name: &str) -> bool {
        self.reserved.contains(name)
    }
}

impl Default for ScopeStack {
    fn default() -> Self {
        Self::new()
    }
}

/// Anything that owns a [`ScopeStack`] and can be guarded
pub trait HasScopes {
    fn scopes_mut(&mut self) -> &mut ScopeStack;
}

fn forget_all(bindings: &HashMap<String, Value>) -> HashMap<String, Value> {
    bindings
        .iter()
        .map(|(name, value)| (name.clone(), value.forgotten()))
        .collect()
}

impl HasScopes for ScopeStack {
    fn scopes_mut(&mut self) -> &mut ScopeStack {
        self
    }
}

/// Which kind of scope a guard opens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Function,
    Block,
}

/// Restores the scope depth of its owner when dropped
pub struct ScopeGuard<'a, T: HasScopes> {
    owner: &'a mut T,
    depth: usize,
}

impl<'a, T: HasScopes> ScopeGuard<'a, T> {
    pub fn enter(owner: &'a mut T, kind: ScopeKind) -> Self {
        let scopes = owner.scopes_mut();
        let depth = scopes.depth();
        match kind {
            ScopeKind::Function => scopes.push_function(),
            ScopeKind::Block => scopes.push_block(),
        }
        Self { owner, depth }
    }
}

impl<T: HasScopes> Deref for ScopeGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.owner
    }
}

impl<T: HasScopes> DerefMut for ScopeGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        self.owner
    }
}

impl<T: HasScopes> Drop for ScopeGuard<'_, T> {
    fn drop(&mut self) {
        self.owner.scopes_mut().truncate(self.depth);
    }
}
