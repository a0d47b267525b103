use crate::{
    parser,
    symbols::{SymbolTable, VarDecl},
    token::Spanned,
    type_checker::Checker,
    types::Type,
    util::fmt::{tree, Context, Show},
};

/// Nesting bound used by the tree tests, low enough to be hit by hand.
pub const TEST_MAX_DEPTH: usize = 16;

/// Variables visible to the expression tests.
const EXPR_VARIABLES: &[(&str, Type)] = &[
    ("foo", Type::Int),
    ("i", Type::Int),
    ("a", Type::Float),
    ("b", Type::Float),
    ("c", Type::Float),
    ("d", Type::Float),
    ("flag", Type::Bool),
    ("u", Type::Float2),
    ("v", Type::Float4),
    ("m", Type::Float3x3),
    ("tex", Type::Sampler),
];

pub fn format_errors<E>(symbols: &SymbolTable, e: &[Spanned<E>]) -> Vec<String>
where
    Spanned<E>: Show,
{
    let ctx = Context { symbols };
    e.iter().map(|e| format!("{:#}", e.display(&ctx))).collect()
}

/// Each variant contains the input.
pub enum Test {
    ParserProgram(&'static str),
    ParserExpr(&'static str),
    CheckerProgram(&'static str),
    CheckerExpr(&'static str),
}

pub enum Assertion {
    TreeOk(&'static str),
    ExpectedErrors(&'static [&'static str]),
}

#[track_caller]
pub fn run_pipeline(test: Test) -> (String, Vec<String>) {
    let tokens_buf = &mut Vec::with_capacity(1024);
    let symbols = &mut SymbolTable::new();

    match test {
        Test::ParserProgram(input) => {
            match parser::parse_program(input, tokens_buf, symbols, TEST_MAX_DEPTH) {
                Ok(prog) => (tree::print_program_string(symbols, &prog), vec![]),
                Err(error) => (String::new(), format_errors(symbols, &[error])),
            }
        }
        Test::ParserExpr(input) => {
            declare_expr_variables(symbols);
            match parser::parse_expr(input, tokens_buf, symbols, TEST_MAX_DEPTH) {
                Ok(expr) => (tree::print_expr_string(symbols, &expr), vec![]),
                Err(error) => (String::new(), format_errors(symbols, &[error])),
            }
        }
        Test::CheckerProgram(input) => {
            let prog = match parser::parse_program(input, tokens_buf, symbols, TEST_MAX_DEPTH) {
                Ok(prog) => prog,
                Err(error) => return (String::new(), format_errors(symbols, &[error])),
            };
            match Checker::new(symbols).check(prog) {
                Ok(prog) => (tree::print_program_string(symbols, &prog), vec![]),
                Err(error) => (String::new(), format_errors(symbols, &[error])),
            }
        }
        Test::CheckerExpr(input) => {
            declare_expr_variables(symbols);
            let expr = match parser::parse_expr(input, tokens_buf, symbols, TEST_MAX_DEPTH) {
                Ok(expr) => expr,
                Err(error) => return (String::new(), format_errors(symbols, &[error])),
            };
            match Checker::new(symbols).check_expr(expr) {
                Ok(expr) => (tree::print_expr_string(symbols, &expr), vec![]),
                Err(error) => (String::new(), format_errors(symbols, &[error])),
            }
        }
    }
}

fn declare_expr_variables(symbols: &mut SymbolTable) {
    for &(name, ty) in EXPR_VARIABLES {
        symbols
            .declare_variable(VarDecl::new(name, ty))
            .expect("test variables are unique");
    }
}

#[track_caller]
pub fn run_assertion(
    assertion: Assertion,
    formatted_actual_tree: &str,
    formatted_actual_errors: &[String],
) {
    match assertion {
        Assertion::TreeOk(expected_tree) => {
            let expected_errors: &[&str] = &[];
            ::pretty_assertions::assert_eq!(formatted_actual_errors, expected_errors);
            ::pretty_assertions::assert_eq!(formatted_actual_tree.trim(), expected_tree.trim());
        }
        Assertion::ExpectedErrors(expected_errors) => {
            ::pretty_assertions::assert_eq!(formatted_actual_errors, expected_errors)
        }
    }
}

macro_rules! tree_tests {
    (
        use $test_kind:ident;

        $(
            fn $test_name:ident() {
                let $source_kind:ident = $source:expr;
                $($assertions_tt:tt)*
            }
        )*
    ) => {
        $(
            #[test]
            fn $test_name() {
                let test: crate::util::test_utils::Test =
                    tree_tests!(@@get_test($test_kind, $source_kind), $source);
                let (formatted_actual_tree, formatted_actual_errors) =
                    crate::util::test_utils::run_pipeline(test);
                let ctx = (&formatted_actual_tree, &formatted_actual_errors);
                tree_tests!(@@expand_assertions, ctx, [$($assertions_tt)*]);
            }
        )*
    };

    (@@expand_assertions, $ctx:expr, []) => {};
    (@@expand_assertions, $ctx:expr, [
        let $assertion:ident = $assertion_expected:expr;
        $($rest_assertions_tt:tt)*
    ]) => {
        crate::util::test_utils::run_assertion(
            tree_tests!(@@assertion, $assertion, $assertion_expected),
            $ctx.0,
            $ctx.1,
        );
        tree_tests!(@@expand_assertions, $ctx, [$($rest_assertions_tt)*]);
    };

    (@@assertion, tree_ok, $expected:expr) => {
        crate::util::test_utils::Assertion::TreeOk(::indoc::indoc! { $expected })
    };
    (@@assertion, expected_errors, $expected:expr) => {
        crate::util::test_utils::Assertion::ExpectedErrors($expected)
    };

    (@@get_test(parser, program), $source:expr) => {
        crate::util::test_utils::Test::ParserProgram($source)
    };
    (@@get_test(parser, expr), $source:expr) => {
        crate::util::test_utils::Test::ParserExpr($source)
    };
    (@@get_test(checker, program), $source:expr) => {
        crate::util::test_utils::Test::CheckerProgram($source)
    };
    (@@get_test(checker, expr), $source:expr) => {
        crate::util::test_utils::Test::CheckerExpr($source)
    };
}
pub(crate) use tree_tests;
