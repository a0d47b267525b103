#![allow(clippy::items_after_statements)]

use crate::{
    codegen, lexer, parser, symbols,
    token::{Span, Spanned},
    type_checker,
    util::fmt::{Context, Show},
};

fn write_span(f: &mut std::fmt::Formatter<'_>, span: Span) -> std::fmt::Result {
    if f.alternate() {
        write!(f, "{span}: ")?;
    }
    Ok(())
}

pub fn lexical_message(error: lexer::Error) -> &'static str {
    match error {
        lexer::Error::UnexpectedChar => "unexpected character",
        lexer::Error::MalformedNumber => "malformed number",
        lexer::Error::UnclosedComment => "unclosed comment",
    }
}

impl Show for Spanned<parser::Error> {
    fn show(&self, f: &mut std::fmt::Formatter<'_>, ctx: &Context<'_>) -> std::fmt::Result {
        let Spanned { span, inner: error } = self;
        write_span(f, *span)?;

        use parser::Error::*;
        match error {
            Lexical(error) => f.write_str(lexical_message(*error)),
            UnexpectedTokenInExpr { token, expected } => write!(
                f,
                "unexpected token {token:?} in expression, expected a type or one of {expected:?}"
            ),
            Unexpected { actual, expected } => {
                write!(f, "expected token {expected:?}, but got {actual:?}")
            }
            UnexpectedAny { actual, expected } => {
                write!(f, "expected one of {expected:?}, but got {actual:?}")
            }
            ExpectedType { actual } => write!(f, "expected a type, but got {actual:?}"),
            ParseInt => write!(f, "integer literal out of range"),
            ParseFloat => write!(f, "float literal out of range"),
            InvalidSwizzle => write!(f, "invalid component selection"),
            InvalidArrayLength => write!(f, "array length must be a positive integer"),
            NestingTooDeep { max } => {
                write!(f, "nesting exceeds the maximum depth of {max}")
            }
            Symbol(symbols::Error::UnknownIdentifier { name, .. }) => {
                write!(f, "{} is not declared", ctx.name(*name))
            }
            Symbol(symbols::Error::DuplicateDeclaration { name, previous, .. }) => {
                let name = ctx.name(*name);
                if previous.len == 0 {
                    write!(f, "{name} is already declared as a built-in")
                } else {
                    write!(f, "{name} is already declared in this scope, at {previous}")
                }
            }
        }
    }
}

impl Show for Spanned<type_checker::Error> {
    fn show(&self, f: &mut std::fmt::Formatter<'_>, ctx: &Context<'_>) -> std::fmt::Result {
        let Spanned { span, inner: error } = self;
        write_span(f, *span)?;

        use type_checker::Error::*;
        match error {
            InvalidBinary { op, lhs, rhs } => {
                let op = op.symbol();
                write!(f, "operator {op} can't be applied to {lhs} and {rhs}")
            }
            InvalidUnary { op, operand } => {
                let op = op.symbol();
                write!(f, "operator {op} can't be applied to {operand}")
            }
            Mismatch { expected, actual } => {
                write!(f, "expected type {expected}, but got {actual}")
            }
            ArmsDiffer { then_arm, else_arm } => write!(
                f,
                "conditional arms have different types {then_arm} and {else_arm}"
            ),
            InvalidAssignmentTarget => write!(f, "invalid assignment target"),
            ReadOnly { name } => write!(f, "{} can't be assigned", ctx.name(*name)),
            RepeatedSwizzleComponent => write!(
                f,
                "can't assign through a component selection with repeated components"
            ),
            VoidVariable { name } => write!(f, "{} can't have type void", ctx.name(*name)),
            LocalParam { name } => {
                let name = ctx.name(*name);
                write!(f, "param {name} must be declared at the top level")
            }
            ParamInitializer { name } => {
                write!(f, "param {} can't have an initializer", ctx.name(*name))
            }
            MissingConstInitializer { name } => {
                write!(f, "const {} must be initialized", ctx.name(*name))
            }
            NonConstantInitializer { name } => {
                write!(f, "global {} must be initialized by a constant", ctx.name(*name))
            }
            ArrayNotParam { name } => write!(f, "array {} must be a param", ctx.name(*name)),
            SamplerNotParam { name } => {
                write!(f, "sampler {} must be a param", ctx.name(*name))
            }
            ArrayUsedAsValue { name } => write!(f, "array {} must be indexed", ctx.name(*name)),
            NotIndexable { ty } => write!(f, "type {ty} can't be indexed"),
            IndexOutOfBounds { index, len } => {
                write!(f, "index {index} is out of bounds for length {len}")
            }
            InvalidSwizzle { ty, swizzle } => write!(f, "type {ty} has no component .{swizzle}"),
            InvalidConstructor { ty } => write!(f, "type {ty} has no constructor"),
            ConstructorArgument { ty, arg } => {
                write!(f, "type {arg} can't be used to construct {ty}")
            }
            ConstructorArity {
                ty,
                expected,
                actual,
            } => write!(
                f,
                "constructor {ty} needs {expected} components, but got {actual}"
            ),
            UnknownFunction { name } => {
                write!(f, "function {} is not declared", ctx.name(*name))
            }
            RecursiveCall { name } => write!(f, "function {} can't call itself", ctx.name(*name)),
            CallBeforeDefinition { name } => {
                let name = ctx.name(*name);
                write!(f, "function {name} is called before its definition")
            }
            NoMatchingOverload { name, args } => {
                write!(f, "no overload of {} takes (", ctx.name(*name))?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ")")
            }
            AmbiguousCall { name } => write!(f, "call to {} is ambiguous", ctx.name(*name)),
            BreakOutsideLoop => write!(f, "break outside of a loop"),
            ContinueOutsideLoop => write!(f, "continue outside of a loop"),
            MissingReturnValue { expected } => {
                write!(f, "missing return value of type {expected}")
            }
            VoidReturnValue => write!(f, "void function can't return a value"),
            MissingMain => write!(f, "no void main() function defined"),
        }
    }
}

impl Show for Spanned<codegen::Error> {
    fn show(&self, f: &mut std::fmt::Formatter<'_>, _: &Context<'_>) -> std::fmt::Result {
        let Spanned { span, inner: error } = self;
        write_span(f, *span)?;

        match error {
            codegen::Error::Unsupported { target, construct } => {
                write!(f, "{construct} is not supported by the {target} backend")
            }
        }
    }
}
