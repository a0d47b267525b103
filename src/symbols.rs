use std::collections::HashMap;

use crate::{
    builtins,
    token::Span,
    types::Type,
    util::intern::{Interner, Name},
};

/// Handle to a variable in a [`SymbolTable`]. Expression nodes hold these
/// rather than owning the symbol.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct SymbolId(u32);

/// Handle to a user-defined function in a [`SymbolTable`].
/// Handles are ordered by declaration.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FunctionId(u32);

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Qualifier {
    None,
    /// Compile time constant; must be initialized and is never written.
    Const,
    /// Effect parameter, supplied by the runtime for each invocation.
    Param,
    /// Read-only built-in input, such as `pos0`.
    Input,
    /// The writable built-in output, `color`.
    Output,
}

impl Qualifier {
    pub fn is_writable(self) -> bool {
        matches!(self, Qualifier::None | Qualifier::Output)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Symbol {
    pub name: Name,
    pub ty: Type,
    pub qualifier: Qualifier,
    /// Element count, for array parameters.
    pub array_len: Option<u32>,
    /// Scope depth of the declaration; `0` is the global scope.
    pub depth: u32,
    /// Declaration site. Built-ins use [`BUILTIN_SPAN`].
    pub span: Span,
}

impl Symbol {
    pub fn is_builtin(&self) -> bool {
        matches!(self.qualifier, Qualifier::Input | Qualifier::Output)
    }

    pub fn is_global(&self) -> bool {
        self.depth == 0
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Signature {
    pub params: Vec<Type>,
    pub ret: Type,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Function {
    pub name: Name,
    pub signature: Signature,
    pub span: Span,
}

/// A variable about to be declared. Built with [`VarDecl::new`] and the
/// chained setters.
#[derive(Copy, Clone, Debug)]
pub struct VarDecl<'a> {
    pub name: &'a str,
    pub ty: Type,
    pub qualifier: Qualifier,
    pub array_len: Option<u32>,
    pub span: Span,
}

impl<'a> VarDecl<'a> {
    pub fn new(name: &'a str, ty: Type) -> VarDecl<'a> {
        VarDecl {
            name,
            ty,
            qualifier: Qualifier::None,
            array_len: None,
            span: BUILTIN_SPAN,
        }
    }

    pub fn qualifier(self, qualifier: Qualifier) -> Self {
        VarDecl { qualifier, ..self }
    }

    pub fn array_len(self, array_len: Option<u32>) -> Self {
        VarDecl { array_len, ..self }
    }

    pub fn span(self, span: Span) -> Self {
        VarDecl { span, ..self }
    }
}

pub const BUILTIN_SPAN: Span = Span::new_of_length(0, 0);

/// Maps identifiers to their declarations, following lexical scoping.
///
/// Scopes form a stack; a name declared in an inner scope hides the same name
/// of an enclosing scope until the inner scope is popped. The global scope
/// (depth 0) is never popped and starts with the built-in variables.
pub struct SymbolTable {
    idents: Interner,
    symbols: Vec<Symbol>,
    scopes: Vec<HashMap<Name, SymbolId>>,
    functions: Vec<Function>,
    functions_by_name: HashMap<Name, Vec<FunctionId>>,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    pub fn new() -> SymbolTable {
        let mut table = SymbolTable {
            idents: Interner::with_capacity(64),
            symbols: Vec::with_capacity(64),
            scopes: vec![HashMap::with_capacity(32)],
            functions: Vec::with_capacity(8),
            functions_by_name: HashMap::with_capacity(8),
        };
        for var in builtins::VARIABLES {
            let decl = VarDecl::new(var.name, var.ty).qualifier(var.qualifier);
            table
                .declare_variable(decl)
                .expect("built-in variable names are unique");
        }
        table
    }

    pub fn intern(&mut self, name: &str) -> Name {
        self.idents.intern(name)
    }

    pub fn idents(&self) -> &Interner {
        &self.idents
    }

    pub fn name(&self, name: Name) -> &str {
        self.idents.get(name)
    }

    /// Current scope depth; `0` is the global scope.
    pub fn depth(&self) -> u32 {
        u32::try_from(self.scopes.len() - 1).expect("scope depth fits u32")
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    pub fn pop_scope(&mut self) {
        assert!(self.scopes.len() > 1, "can't pop the global scope");
        self.scopes.pop();
    }

    /// Declares a variable in the current scope.
    ///
    /// Fails if the name is already declared in the *current* scope. The same
    /// name in an enclosing scope is shadowed instead.
    pub fn declare_variable(&mut self, decl: VarDecl<'_>) -> Result<SymbolId, Error> {
        let name = self.intern(decl.name);
        let depth = self.depth();
        let scope = self.scopes.last().expect("global scope always exists");
        if let Some(&previous) = scope.get(&name) {
            return Err(Error::DuplicateDeclaration {
                name,
                previous: self.get(previous).span,
                depth,
            });
        }

        let id = SymbolId(u32::try_from(self.symbols.len()).expect("too many symbols"));
        self.symbols.push(Symbol {
            name,
            ty: decl.ty,
            qualifier: decl.qualifier,
            array_len: decl.array_len,
            depth,
            span: decl.span,
        });
        self.scopes
            .last_mut()
            .expect("global scope always exists")
            .insert(name, id);
        Ok(id)
    }

    /// Finds the innermost visible declaration of `name`.
    pub fn resolve(&self, name: Name) -> Result<SymbolId, Error> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(&name).copied())
            .ok_or(Error::UnknownIdentifier {
                name,
                depth: self.depth(),
            })
    }

    /// Convenience over [`Self::resolve`] taking a plain string.
    pub fn resolve_str(&mut self, name: &str) -> Result<SymbolId, Error> {
        let name = self.intern(name);
        self.resolve(name)
    }

    pub fn get(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.0 as usize]
    }

    /// Declares a user function. Overloads must differ in their parameter
    /// types, and built-in function names can't be reused.
    pub fn declare_function(
        &mut self,
        name: Name,
        signature: Signature,
        span: Span,
    ) -> Result<FunctionId, Error> {
        if builtins::function(self.name(name)).is_some() {
            return Err(Error::DuplicateDeclaration {
                name,
                previous: BUILTIN_SPAN,
                depth: self.depth(),
            });
        }
        if let Some((_, previous)) = self
            .functions(name)
            .find(|(_, f)| f.signature.params == signature.params)
        {
            return Err(Error::DuplicateDeclaration {
                name,
                previous: previous.span,
                depth: self.depth(),
            });
        }

        let id = FunctionId(u32::try_from(self.functions.len()).expect("too many functions"));
        self.functions.push(Function {
            name,
            signature,
            span,
        });
        self.functions_by_name.entry(name).or_default().push(id);
        Ok(id)
    }

    /// All user overloads named `name`, in declaration order.
    pub fn functions(&self, name: Name) -> impl Iterator<Item = (FunctionId, &Function)> + '_ {
        self.functions_by_name
            .get(&name)
            .into_iter()
            .flatten()
            .map(|&id| (id, self.function(id)))
    }

    pub fn function(&self, id: FunctionId) -> &Function {
        &self.functions[id.0 as usize]
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    DuplicateDeclaration {
        name: Name,
        /// Where the clashing declaration was made.
        previous: Span,
        depth: u32,
    },
    UnknownIdentifier {
        name: Name,
        depth: u32,
    },
}
