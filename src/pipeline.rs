//! Runs every phase over a source string and reports failures with line and
//! column positions.

use std::fmt::{self, Write};

use crate::{
    ast::{Program, Typed},
    codegen::{self, Target},
    lexer,
    parser::{self, DEFAULT_MAX_DEPTH},
    symbols::SymbolTable,
    token::{Span, Spanned},
    type_checker::Checker,
    util::{
        fmt::{error::lexical_message, tree, Context, Show},
        lines::LineIndex,
    },
};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Options {
    /// Bound on how deeply statements and expressions may nest.
    pub max_depth: usize,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// The phase that rejected a program.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Phase {
    Lexical,
    Syntax,
    /// Duplicate declarations and unknown identifiers.
    Name,
    Semantic,
    Codegen,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Lexical => "lexical",
            Phase::Syntax => "syntax",
            Phase::Name => "name",
            Phase::Semantic => "semantic",
            Phase::Codegen => "codegen",
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub phase: Phase,
    pub message: String,
    /// 1-based.
    pub line: u32,
    /// 1-based, in bytes.
    pub column: u32,
    pub span: Span,
}

impl Diagnostic {
    fn new(lines: &LineIndex, phase: Phase, span: Span, message: String) -> Diagnostic {
        let (line, column) = lines.line_col(span.lo);
        Diagnostic {
            phase,
            message,
            line,
            column,
            span,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Diagnostic {
            phase,
            message,
            line,
            column,
            ..
        } = self;
        write!(f, "{line}:{column}: {phase} error: {message}")
    }
}

type Result<T> = std::result::Result<T, Vec<Diagnostic>>;

/// Compiles `src` for `target`.
///
/// The front end stops at the first error; code generation reports every
/// construct the target lacks.
pub fn compile(src: &str, target: Target, options: &Options) -> Result<String> {
    let mut symbols = SymbolTable::new();
    let program = front_end(src, &mut symbols, options)?;
    codegen::generate(target, &symbols, &program).map_err(|errors| {
        let lines = LineIndex::new(src);
        let ctx = Context { symbols: &symbols };
        errors
            .iter()
            .map(|e| Diagnostic::new(&lines, Phase::Codegen, e.span, show(e, &ctx)))
            .collect()
    })
}

/// Lists the significant tokens of `src`, one per line.
pub fn dump_tokens(src: &str) -> Result<String> {
    let lines = LineIndex::new(src);
    let tokens = lexer::tokenize(src).map_err(|error| {
        let span = error.span;
        vec![Diagnostic::new(&lines, Phase::Lexical, span, lexical(src, error))]
    })?;

    let mut out = String::with_capacity(tokens.len() * 16);
    for token in tokens {
        let (line, column) = lines.line_col(token.span().lo);
        let (kind, lexeme) = (token.kind, token.lexeme(src));
        writeln!(out, "{line}:{column} {kind:?} {lexeme:?}")
            .expect("writing to a String can't fail");
    }
    Ok(out)
}

/// Prints the decorated tree of `src`.
pub fn dump_tree(src: &str, options: &Options) -> Result<String> {
    let mut symbols = SymbolTable::new();
    let program = front_end(src, &mut symbols, options)?;
    Ok(tree::print_program_string(&symbols, &program))
}

fn front_end(src: &str, symbols: &mut SymbolTable, options: &Options) -> Result<Program<Typed>> {
    let lines = LineIndex::new(src);
    let mut tokens = Vec::with_capacity(lexer::SUGGESTED_TOKENS_CAPACITY);

    let program = match parser::parse_program(src, &mut tokens, symbols, options.max_depth) {
        Ok(program) => program,
        Err(error) => {
            let (phase, message) = match error.inner {
                parser::Error::Lexical(inner) => {
                    (Phase::Lexical, lexical(src, error.span.wrap(inner)))
                }
                parser::Error::Symbol(_) => (Phase::Name, show(&error, &Context { symbols })),
                _ => (Phase::Syntax, show(&error, &Context { symbols })),
            };
            return Err(vec![Diagnostic::new(&lines, phase, error.span, message)]);
        }
    };

    let symbols = &*symbols;
    Checker::new(symbols).check(program).map_err(|error| {
        let message = show(&error, &Context { symbols });
        vec![Diagnostic::new(&lines, Phase::Semantic, error.span, message)]
    })
}

/// The message of a lexical error quotes the offending text.
fn lexical(src: &str, error: Spanned<lexer::Error>) -> String {
    let message = lexical_message(error.inner);
    format!("{message} `{}`", error.span.substr(src))
}

fn show(error: &impl Show, ctx: &Context<'_>) -> String {
    error.display(ctx).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    fn first_error(src: &str, target: Target, options: &Options) -> Diagnostic {
        let mut errors = compile(src, target, options).unwrap_err();
        assert_eq!(errors.len(), 1, "{errors:?}");
        errors.remove(0)
    }

    #[test]
    fn effects_compile_for_every_target() {
        let src = include_str!("../effects/color_adjust.jsl");
        for &target in Target::ALL {
            assert!(compile(src, target, &Options::default()).is_ok(), "{target}");
        }
    }

    #[test]
    fn lexical_errors_quote_the_text() {
        let src = "void main() {\n    color = pos0.xyxy;\n    %###\n}\n";
        let error = first_error(src, Target::Glsl, &Options::default());
        assert_eq!(error.phase, Phase::Lexical);
        assert_eq!((error.line, error.column), (3, 5));
        assert_eq!(error.to_string(), "3:5: lexical error: unexpected character `%###`");
    }

    #[test]
    fn unknown_operator_is_a_syntax_error() {
        let src = "void main() {\n    color = pos0.xyxy @ 1;\n}\n";
        let error = first_error(src, Target::Glsl, &Options::default());
        assert_eq!(error.phase, Phase::Syntax);
        assert_eq!((error.line, error.column), (2, 23));
    }

    #[test]
    fn name_errors() {
        let src = "param float k;\nparam float k;\nvoid main() {}\n";
        let error = first_error(src, Target::Hlsl, &Options::default());
        assert_eq!(error.phase, Phase::Name);
        assert_eq!(
            error.to_string(),
            "2:13: name error: k is already declared in this scope, at 12..13"
        );

        let src = "void main() { color = nope; }";
        let error = first_error(src, Target::Hlsl, &Options::default());
        assert_eq!(error.to_string(), "1:23: name error: nope is not declared");
    }

    #[test]
    fn semantic_errors() {
        let src = "void main() {\n    color = true;\n}\n";
        let error = first_error(src, Target::Bytecode, &Options::default());
        assert_eq!(error.phase, Phase::Semantic);
        assert_eq!(error.line, 2);
    }

    #[test]
    fn every_unsupported_construct_is_reported() {
        let src = indoc! {"
            void main() {
                while (false) {}
                do {} while (false);
            }
        "};
        let errors = compile(src, Target::Glsl, &Options::default()).unwrap_err();
        let errors: Vec<_> = errors.iter().map(ToString::to_string).collect();
        assert_eq!(
            errors,
            [
                "2:5: codegen error: while loops is not supported by the glsl backend",
                "3:5: codegen error: do-while loops is not supported by the glsl backend",
            ]
        );
        assert!(compile(src, Target::Hlsl, &Options::default()).is_ok());
    }

    #[test]
    fn nesting_is_bounded() {
        let src = "void main() { color = float4(((((1.0))))); }";
        assert!(compile(src, Target::Glsl, &Options::default()).is_ok());
        let error = first_error(src, Target::Glsl, &Options { max_depth: 3 });
        assert_eq!(error.phase, Phase::Syntax);
    }

    #[test]
    fn deep_nesting_fails_cleanly_on_a_small_stack() {
        let parens = |levels: usize| {
            let (open, close) = ("(".repeat(levels), ")".repeat(levels));
            format!("void main() {{ color = float4({open}pos0.x{close}); }}")
        };
        let blocks = |levels: usize| {
            let (open, close) = ("{".repeat(levels), "}".repeat(levels));
            format!("void main() {open}{close}")
        };
        let phases = std::thread::Builder::new()
            .stack_size(2 << 20)
            .spawn(move || {
                let mut phases = Vec::new();
                for src in [parens(100), blocks(100), parens(100_000), blocks(100_000)] {
                    for &target in Target::ALL {
                        let result = compile(&src, target, &Options::default());
                        phases.push(result.map(drop).map_err(|errors| errors[0].phase));
                    }
                }
                phases
            })
            .unwrap()
            .join()
            .unwrap();
        let (accepted, rejected) = phases.split_at(6);
        assert!(accepted.iter().all(std::result::Result::is_ok), "{accepted:?}");
        assert!(rejected.iter().all(|r| *r == Err(Phase::Syntax)), "{rejected:?}");
    }

    #[test]
    fn nul_does_not_end_the_input() {
        let src = "void main() {}\0 this is %%% not JSL";
        let error = first_error(src, Target::Glsl, &Options::default());
        assert_eq!(error.phase, Phase::Lexical);
        assert_eq!((error.line, error.column), (1, 15));
    }

    #[test]
    fn token_dump() {
        let expected = indoc! {r#"
            1:1 Identifier "a"
            1:2 Plus "+"
            2:1 Int "1"
            2:2 Eof ""
        "#};
        assert_eq!(dump_tokens("a+\n1").unwrap(), expected);

        let errors = dump_tokens("a # b").unwrap_err();
        assert_eq!(errors[0].to_string(), "1:3: lexical error: unexpected character `#`");
    }

    #[test]
    fn tree_dump() {
        let tree = dump_tree("void main() { color = pos0.xyxy; }", &Options::default()).unwrap();
        let expected = indoc! {"
            function void main() (0..34)
              block (12..34)
                assign = (14..32)
                  var color (14..19 %: float4)
                  swizzle xyxy (22..31 %: float4)
                    var pos0 (22..26 %: float2)
        "};
        assert_eq!(tree, expected);
    }
}
