use crate::{
    ast::{Program, Typed},
    codegen::dialect::{Glsl, Hlsl},
    symbols::SymbolTable,
    token::Spanned,
};

pub mod bytecode;
pub mod dialect;
mod fold;
mod text;

/// Emits `program` for `target`.
///
/// Constructs the target can't express are collected, and the output is
/// only returned if there were none.
pub fn generate(
    target: Target,
    symbols: &SymbolTable,
    program: &Program<Typed>,
) -> Result<String, Vec<Spanned<Error>>> {
    tracing::debug!(backend = %target, "generating code");
    let result = match target {
        Target::Glsl => text::Generator::<Glsl>::new(symbols).generate(program),
        Target::Hlsl => text::Generator::<Hlsl>::new(symbols).generate(program),
        Target::Bytecode => bytecode::Generator::new(symbols).generate(program),
    };
    if let Err(errors) = &result {
        tracing::debug!(backend = %target, unsupported = errors.len(), "generation failed");
    }
    result
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Target {
    Glsl,
    Hlsl,
    Bytecode,
}

impl Target {
    pub const ALL: &[Target] = &[Target::Glsl, Target::Hlsl, Target::Bytecode];

    pub const fn name(self) -> &'static str {
        match self {
            Target::Glsl => "glsl",
            Target::Hlsl => "hlsl",
            Target::Bytecode => "bytecode",
        }
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    Unsupported {
        target: Target,
        construct: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{parser, type_checker::Checker};

    #[test]
    fn every_target_accepts_the_effects() {
        for src in [
            include_str!("../../effects/brightpass.jsl"),
            include_str!("../../effects/box_blur.jsl"),
            include_str!("../../effects/color_adjust.jsl"),
        ] {
            let mut symbols = SymbolTable::new();
            let program =
                parser::parse_program(src, &mut Vec::new(), &mut symbols, parser::DEFAULT_MAX_DEPTH)
                    .unwrap();
            let program = Checker::new(&symbols).check(program).unwrap();
            for &target in Target::ALL {
                let out = generate(target, &symbols, &program);
                assert!(out.is_ok(), "{target}: {out:?}");
            }
        }
    }
}
