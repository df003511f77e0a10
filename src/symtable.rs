use std::collections::HashMap;

use crate::{ast::Type, error::ParseError};

/// The compile-time symbol table: a stack of scopes mapping names to their
/// declared [`Type`].
///
/// The parser pushes a scope on every block boundary and pops it on exit,
/// mirroring the frame structure the evaluator builds at runtime. Lookups
/// walk from the innermost scope outward; declarations always target the
/// innermost scope and reject duplicates within it.
///
/// # Example
/// ```
/// use minipar::{ast::Type, symtable::SymTable};
///
/// let mut symbols = SymTable::new();
/// symbols.declare("x", Type::Number, 1).unwrap();
///
/// symbols.push_scope();
/// symbols.declare("x", Type::Str, 2).unwrap(); // shadows the outer `x`
/// assert_eq!(symbols.lookup("x"), Some(&Type::Str));
///
/// symbols.pop_scope();
/// assert_eq!(symbols.lookup("x"), Some(&Type::Number));
/// ```
#[derive(Debug)]
pub struct SymTable {
    scopes: Vec<HashMap<String, Type>>,
}

#[allow(clippy::new_without_default)]
impl SymTable {
    /// Creates a table with a single (global) scope.
    #[must_use]
    pub fn new() -> Self {
        Self { scopes: vec![HashMap::new()], }
    }

    /// Opens a new innermost scope.
    pub fn push_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    /// Closes the innermost scope, dropping its declarations.
    pub fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    /// Declares `name` in the innermost scope.
    ///
    /// # Errors
    /// Returns `ParseError::Redeclaration` if the innermost scope already
    /// holds a declaration for `name`. Shadowing an outer scope is allowed.
    pub fn declare(&mut self, name: &str, ty: Type, line: usize) -> Result<(), ParseError> {
        let scope = self.scopes.last_mut().expect("at least the global scope");
        if scope.contains_key(name) {
            return Err(ParseError::Redeclaration { name: name.to_string(),
                                                   line });
        }
        scope.insert(name.to_string(), ty);
        Ok(())
    }

    /// Looks up `name`, walking from the innermost scope outward.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&Type> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name))
    }
}
