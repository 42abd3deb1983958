//! Scoped symbol table
//!
//! A stack of scopes, each an [`IndexMap`] from name to [`Symbol`]:
//! - [`SymbolTable`]: the scope stack; index 0 is the global scope
//! - [`Scope`]: one lexical block's bindings, iterated in insertion order
//! - [`Symbol`]: a [`VariableRecord`] or a [`FunctionRecord`]
//! - [`SymbolHandle`]: an index-based reference to one record
//!
//! # Scoping rules
//!
//! Functions always live in the global scope. Variables live in whatever scope
//! is on top when they are declared, and [`SymbolTable::find_variable`] walks
//! the stack from the innermost scope outwards so nearer bindings shadow outer
//! ones. Popping a scope drops every record it owns.
//!
//! # Handles
//!
//! A handle records the depth, the scope serial number and the slot of a
//! record. Every pushed scope gets a fresh serial, so a handle into a popped
//! scope never resolves, even after another scope is pushed at the same depth.
//!
//! ```
//! # use tealfront::parser::ast::{DataType, SourceLocation};
//! # use tealfront::parser::symtable::{ScopeKind, SymbolTable, VariableRecord};
//! let mut table = SymbolTable::new();
//! table.push_scope(ScopeKind::While);
//! let x = VariableRecord::new("x", DataType::Integer, SourceLocation::new(1, 1));
//! let handle = table.insert_variable(x).unwrap();
//! assert_eq!(table.find_variable("x"), Some(handle));
//! table.pop_scope().unwrap();
//! assert_eq!(table.find_variable("x"), None);
//! assert!(table.get(handle).is_none());
//! ```

use super::ast::{DataType, SourceLocation};
use indexmap::{map::Entry, IndexMap};
use rustc_hash::FxBuildHasher;
use std::fmt;
use thiserror::Error;

/// Errors raised by scope and record operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SymbolError {
    /// The target scope already binds this name.
    #[error("'{name}' is already defined in this scope")]
    DuplicateSymbol { name: String },
    /// `pop_scope` was called with only the global scope left.
    #[error("cannot pop the global scope")]
    ScopeUnderflow,
    #[error("scope {0} is not on the scope stack")]
    UnknownScope(ScopeId),
}

/// Serial number of a scope, unique for the lifetime of one table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(u32);

impl ScopeId {
    pub const GLOBAL: ScopeId = ScopeId(0);

    pub fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The construct that opened a scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeKind {
    Global,
    Function(String),
    If,
    Else,
    While,
}

impl fmt::Display for ScopeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScopeKind::Global => write!(f, "global"),
            ScopeKind::Function(name) => write!(f, "function {}", name),
            ScopeKind::If => write!(f, "if"),
            ScopeKind::Else => write!(f, "else"),
            ScopeKind::While => write!(f, "while"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariableRecord {
    pub name: String,
    pub data_type: DataType,
    pub declared_at: SourceLocation,
    /// Set once the variable has been given a value.
    pub initialized: bool,
    /// Owning scope; filled in on insertion.
    pub scope: ScopeId,
}

impl VariableRecord {
    pub fn new(name: &str, data_type: DataType, declared_at: SourceLocation) -> Self {
        Self {
            name: name.to_string(),
            data_type,
            declared_at,
            initialized: false,
            scope: ScopeId::GLOBAL,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionRecord {
    pub name: String,
    pub params: Vec<DataType>,
    /// Accepts any number of arguments of any type (`write`).
    pub variadic: bool,
    pub returns: Vec<DataType>,
    /// A body has been seen (always true for built-ins).
    pub defined: bool,
    pub builtin: bool,
    /// `None` for built-ins.
    pub declared_at: Option<SourceLocation>,
}

impl FunctionRecord {
    pub fn new(name: &str, params: Vec<DataType>, returns: Vec<DataType>) -> Self {
        Self {
            name: name.to_string(),
            params,
            variadic: false,
            returns,
            defined: false,
            builtin: false,
            declared_at: None,
        }
    }

    pub fn declared_at(mut self, location: SourceLocation) -> Self {
        self.declared_at = Some(location);
        self
    }

    pub fn defined(mut self) -> Self {
        self.defined = true;
        self
    }

    fn builtin(name: &str, params: Vec<DataType>, returns: Vec<DataType>) -> Self {
        Self {
            defined: true,
            builtin: true,
            ..Self::new(name, params, returns)
        }
    }

    /// Same parameter and return types, in order.
    pub fn signature_matches(&self, params: &[DataType], returns: &[DataType]) -> bool {
        self.params == params && self.returns == returns
    }
}

/// A record in one scope.
#[derive(Debug, Clone, PartialEq)]
pub enum Symbol {
    Variable(VariableRecord),
    Function(FunctionRecord),
}

impl Symbol {
    pub fn name(&self) -> &str {
        match self {
            Symbol::Variable(var) => &var.name,
            Symbol::Function(func) => &func.name,
        }
    }

    pub fn as_variable(&self) -> Option<&VariableRecord> {
        match self {
            Symbol::Variable(var) => Some(var),
            Symbol::Function(_) => None,
        }
    }

    pub fn as_function(&self) -> Option<&FunctionRecord> {
        match self {
            Symbol::Function(func) => Some(func),
            Symbol::Variable(_) => None,
        }
    }
}

/// Reference to a record: scope depth, scope serial, clear epoch and slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SymbolHandle {
    depth: usize,
    scope: ScopeId,
    epoch: u32,
    slot: usize,
}

impl SymbolHandle {
    pub fn scope(&self) -> ScopeId {
        self.scope
    }

    pub fn depth(&self) -> usize {
        self.depth
    }
}

/// One lexical scope.
#[derive(Debug, Clone)]
pub struct Scope {
    id: ScopeId,
    kind: ScopeKind,
    /// Bumped by `clear` so handles taken before it go stale.
    epoch: u32,
    records: IndexMap<String, Symbol, FxBuildHasher>,
}

impl Scope {
    fn new(id: ScopeId, kind: ScopeKind) -> Self {
        Self {
            id,
            kind,
            epoch: 0,
            records: IndexMap::default(),
        }
    }

    pub fn id(&self) -> ScopeId {
        self.id
    }

    pub fn kind(&self) -> &ScopeKind {
        &self.kind
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.records.get(name)
    }

    /// Records in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Symbol)> {
        self.records.iter().map(|(name, sym)| (name.as_str(), sym))
    }
}

/// Stack of scopes; the bottom one is the global scope and is never popped.
#[derive(Debug, Clone)]
pub struct SymbolTable {
    scopes: Vec<Scope>,
    next_id: u32,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    /// Create a table holding only an empty global scope.
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope::new(ScopeId::GLOBAL, ScopeKind::Global)],
            next_id: 1,
        }
    }

    /// Create a table whose global scope already holds the runtime functions
    /// `reads`, `readi`, `readn`, `write`, `tointeger`, `substr`, `ord` and `chr`.
    pub fn with_builtins() -> Self {
        use DataType::{Integer, Number, String};

        let mut table = Self::new();
        let mut write = FunctionRecord::builtin("write", Vec::new(), Vec::new());
        write.variadic = true;
        let builtins = [
            FunctionRecord::builtin("reads", vec![], vec![String]),
            FunctionRecord::builtin("readi", vec![], vec![Integer]),
            FunctionRecord::builtin("readn", vec![], vec![Number]),
            write,
            FunctionRecord::builtin("tointeger", vec![Number], vec![Integer]),
            FunctionRecord::builtin("substr", vec![String, Number, Number], vec![String]),
            FunctionRecord::builtin("ord", vec![String, Integer], vec![Integer]),
            FunctionRecord::builtin("chr", vec![Integer], vec![String]),
        ];
        for record in builtins {
            let name = record.name.clone();
            table.scopes[0].records.insert(name, Symbol::Function(record));
        }
        table
    }

    /// Open a new empty scope on top of the stack.
    pub fn push_scope(&mut self, kind: ScopeKind) -> ScopeId {
        let id = ScopeId(self.next_id);
        self.next_id += 1;
        tracing::debug!(scope = %id, kind = %kind, depth = self.scopes.len(), "push scope");
        self.scopes.push(Scope::new(id, kind));
        id
    }

    /// Close the innermost scope and hand back its records.
    pub fn pop_scope(&mut self) -> Result<Scope, SymbolError> {
        if self.scopes.len() <= 1 {
            return Err(SymbolError::ScopeUnderflow);
        }
        let scope = self.scopes.pop().ok_or(SymbolError::ScopeUnderflow)?;
        tracing::debug!(scope = %scope.id, kind = %scope.kind, records = scope.len(), "pop scope");
        Ok(scope)
    }

    /// Number of scopes above the global one.
    pub fn depth(&self) -> usize {
        self.scopes.len() - 1
    }

    pub fn current_scope(&self) -> &Scope {
        &self.scopes[self.scopes.len() - 1]
    }

    pub fn global_scope(&self) -> &Scope {
        &self.scopes[0]
    }

    /// An active scope by id.
    pub fn scope(&self, id: ScopeId) -> Option<&Scope> {
        self.scopes.iter().find(|scope| scope.id == id)
    }

    /// Active scopes, global first.
    pub fn scopes(&self) -> impl Iterator<Item = &Scope> {
        self.scopes.iter()
    }

    /// Declare a variable in the innermost scope.
    pub fn insert_variable(
        &mut self,
        mut record: VariableRecord,
    ) -> Result<SymbolHandle, SymbolError> {
        let depth = self.scopes.len() - 1;
        record.scope = self.scopes[depth].id;
        let name = record.name.clone();
        self.insert_at(depth, name, Symbol::Variable(record))
    }

    /// Declare a function in the global scope.
    pub fn insert_function(&mut self, record: FunctionRecord) -> Result<SymbolHandle, SymbolError> {
        let name = record.name.clone();
        self.insert_at(0, name, Symbol::Function(record))
    }

    fn insert_at(
        &mut self,
        depth: usize,
        name: String,
        symbol: Symbol,
    ) -> Result<SymbolHandle, SymbolError> {
        let scope = &mut self.scopes[depth];
        match scope.records.entry(name) {
            Entry::Occupied(o) => Err(SymbolError::DuplicateSymbol {
                name: o.key().clone(),
            }),
            Entry::Vacant(v) => {
                let slot = v.index();
                tracing::trace!(name = %v.key(), scope = %scope.id, slot, "insert symbol");
                v.insert(symbol);
                Ok(SymbolHandle {
                    depth,
                    scope: scope.id,
                    epoch: scope.epoch,
                    slot,
                })
            }
        }
    }

    /// Innermost variable named `name`; functions are skipped.
    pub fn find_variable(&self, name: &str) -> Option<SymbolHandle> {
        (0..self.scopes.len())
            .rev()
            .find_map(|depth| self.lookup_at(depth, name, |sym| sym.as_variable().is_some()))
    }

    /// Variable named `name` in the innermost scope only.
    pub fn find_variable_local(&self, name: &str) -> Option<SymbolHandle> {
        self.lookup_at(self.scopes.len() - 1, name, |sym| {
            sym.as_variable().is_some()
        })
    }

    /// Function named `name`; only the global scope is searched.
    pub fn find_function(&self, name: &str) -> Option<SymbolHandle> {
        self.lookup_at(0, name, |sym| sym.as_function().is_some())
    }

    fn lookup_at(
        &self,
        depth: usize,
        name: &str,
        accept: impl Fn(&Symbol) -> bool,
    ) -> Option<SymbolHandle> {
        let scope = &self.scopes[depth];
        let (slot, _, symbol) = scope.records.get_full(name)?;
        accept(symbol).then_some(SymbolHandle {
            depth,
            scope: scope.id,
            epoch: scope.epoch,
            slot,
        })
    }

    /// Remove every record from an active scope, keeping the scope itself.
    pub fn clear(&mut self, id: ScopeId) -> Result<(), SymbolError> {
        let scope = self
            .scopes
            .iter_mut()
            .find(|scope| scope.id == id)
            .ok_or(SymbolError::UnknownScope(id))?;
        scope.records.clear();
        scope.epoch += 1;
        Ok(())
    }

    /// Resolve a handle. Handles into popped or cleared scopes give `None`.
    pub fn get(&self, handle: SymbolHandle) -> Option<&Symbol> {
        let scope = self.scopes.get(handle.depth)?;
        if scope.id != handle.scope || scope.epoch != handle.epoch {
            return None;
        }
        scope.records.get_index(handle.slot).map(|(_, sym)| sym)
    }

    pub fn get_mut(&mut self, handle: SymbolHandle) -> Option<&mut Symbol> {
        let scope = self.scopes.get_mut(handle.depth)?;
        if scope.id != handle.scope || scope.epoch != handle.epoch {
            return None;
        }
        scope.records.get_index_mut(handle.slot).map(|(_, sym)| sym)
    }

    pub fn variable(&self, handle: SymbolHandle) -> Option<&VariableRecord> {
        self.get(handle).and_then(Symbol::as_variable)
    }

    pub fn function(&self, handle: SymbolHandle) -> Option<&FunctionRecord> {
        self.get(handle).and_then(Symbol::as_function)
    }

    /// Mark a variable as holding a value. Returns false for stale handles
    /// and for function records.
    pub fn mark_initialized(&mut self, handle: SymbolHandle) -> bool {
        match self.get_mut(handle) {
            Some(Symbol::Variable(var)) => {
                var.initialized = true;
                true
            }
            _ => false,
        }
    }
}
