use crate::symbols::SymbolTable;

pub mod error;
pub mod tree;

pub struct Context<'sym> {
    pub symbols: &'sym SymbolTable,
}

impl Context<'_> {
    pub fn name(&self, name: impl Into<crate::util::intern::Name>) -> &str {
        self.symbols.name(name.into())
    }
}

/// Analogous to [`std::fmt::Display`], but also contains the program context,
/// such as the [`SymbolTable`] names resolve against.
pub trait Show {
    fn show(&self, f: &mut std::fmt::Formatter<'_>, ctx: &Context<'_>) -> std::fmt::Result;

    /// Returns a type which can be displayed.
    fn display<'a>(&'a self, ctx: &'a Context<'_>) -> impl std::fmt::Display + 'a
    where
        Self: Sized,
    {
        Display(self, ctx)
    }
}

struct Display<'this, 'ctx, 'sym, T: Show>(pub &'this T, pub &'ctx Context<'sym>);

impl<T> std::fmt::Display for Display<'_, '_, '_, T>
where
    T: Show,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let Display(this, ctx) = self;
        this.show(f, ctx)
    }
}
