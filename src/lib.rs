/// The lexer takes the source input, mapping it into a sequence of tokens.
pub mod lexer;

/// The parser takes a sequence of tokens, mapping it into an AST. Variable
/// references are resolved against the symbol table while parsing.
pub mod parser;

/// The type checker takes an untyped AST, checks the soundness of its types,
/// and maps it into a typed AST.
pub mod type_checker;

/// The code generators take a typed AST, mapping it into GLSL, HLSL or
/// interpreter bytecode.
pub mod codegen;

/// Runs the phases above in order, reporting positioned diagnostics.
pub mod pipeline;

pub mod ast;
pub mod builtins;
pub mod symbols;
pub mod token;
pub mod types;

pub mod util {
    pub mod fmt;
    pub mod intern;
    pub mod lines;
    #[cfg(test)]
    pub(crate) mod test_utils;
}
