//! Constant folding of literal-only expressions, applied while emitting.

use crate::ast::{BinaryOp, Expr, ExprKind, Literal, Typed, UnaryOp};

/// Evaluates `expr` if it is built from literals and foldable operators only.
///
/// Operations that would trap or lose their meaning (integer division by
/// zero, overflow, non-finite floats) are left alone.
#[expect(clippy::cast_precision_loss)]
pub fn fold(expr: &Expr<Typed>) -> Option<Literal> {
    match &expr.kind {
        ExprKind::Literal(literal) => Some(*literal),
        ExprKind::Paren(inner) => fold(inner),
        ExprKind::Widen(inner) => match fold(inner)? {
            Literal::Int(i) => Some(Literal::Float(i as f32)),
            _ => None,
        },
        ExprKind::Unary { op, operand } => unary(*op, fold(operand)?),
        ExprKind::Binary { op, lhs, rhs } => binary(*op, fold(lhs)?, fold(rhs)?),
        _ => None,
    }
}

/// Whether the emitters should try [`fold`] on this node.
pub fn is_foldable(expr: &Expr<Typed>) -> bool {
    matches!(
        expr.kind,
        ExprKind::Unary { .. } | ExprKind::Binary { .. } | ExprKind::Widen(_)
    )
}

fn unary(op: UnaryOp, operand: Literal) -> Option<Literal> {
    match (op, operand) {
        (UnaryOp::Plus, literal) => Some(literal),
        (UnaryOp::Neg, Literal::Int(i)) => i.checked_neg().map(Literal::Int),
        (UnaryOp::Neg, Literal::Float(x)) => Some(Literal::Float(-x)),
        (UnaryOp::Not, Literal::Bool(b)) => Some(Literal::Bool(!b)),
        _ => None,
    }
}

fn binary(op: BinaryOp, lhs: Literal, rhs: Literal) -> Option<Literal> {
    use Literal::{Bool, Float, Int};
    let folded = match (lhs, rhs) {
        (Int(a), Int(b)) => match op {
            BinaryOp::Add => Int(a.checked_add(b)?),
            BinaryOp::Sub => Int(a.checked_sub(b)?),
            BinaryOp::Mul => Int(a.checked_mul(b)?),
            BinaryOp::Div => Int(a.checked_div(b)?),
            _ => Bool(compare(op, &a, &b)?),
        },
        (Float(a), Float(b)) => match op {
            BinaryOp::Add => Float(a + b),
            BinaryOp::Sub => Float(a - b),
            BinaryOp::Mul => Float(a * b),
            BinaryOp::Div => Float(a / b),
            _ => Bool(compare(op, &a, &b)?),
        },
        (Bool(a), Bool(b)) => match op {
            BinaryOp::And => Bool(a && b),
            BinaryOp::Or => Bool(a || b),
            BinaryOp::Xor | BinaryOp::NotEq => Bool(a != b),
            BinaryOp::EqEq => Bool(a == b),
            _ => return None,
        },
        _ => return None,
    };
    match folded {
        Float(x) if !x.is_finite() => None,
        folded => Some(folded),
    }
}

fn compare<T: PartialOrd>(op: BinaryOp, a: &T, b: &T) -> Option<bool> {
    let result = match op {
        BinaryOp::EqEq => a == b,
        BinaryOp::NotEq => a != b,
        BinaryOp::Less => a < b,
        BinaryOp::LessEq => a <= b,
        BinaryOp::Greater => a > b,
        BinaryOp::GreaterEq => a >= b,
        _ => return None,
    };
    Some(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{parser, symbols::SymbolTable, type_checker::Checker};

    fn fold_src(src: &str) -> Option<Literal> {
        let mut symbols = SymbolTable::new();
        let expr =
            parser::parse_expr(src, &mut Vec::new(), &mut symbols, parser::DEFAULT_MAX_DEPTH)
                .unwrap();
        let expr = Checker::new(&symbols).check_expr(expr).unwrap();
        fold(&expr)
    }

    #[test]
    fn folds_literal_trees() {
        assert_eq!(fold_src("2 == 2"), Some(Literal::Bool(true)));
        assert_eq!(fold_src("1 + 2 * 3"), Some(Literal::Int(7)));
        assert_eq!(fold_src("(1 - 3) * 2"), Some(Literal::Int(-4)));
        assert_eq!(fold_src("1.5 * 2"), Some(Literal::Float(3.0)));
        assert_eq!(fold_src("!true ^^ true"), Some(Literal::Bool(true)));
        assert_eq!(fold_src("-(2.5)"), Some(Literal::Float(-2.5)));
        assert_eq!(fold_src("3 < 2.5"), Some(Literal::Bool(false)));
    }

    #[test]
    fn leaves_the_rest_alone() {
        assert_eq!(fold_src("1 / 0"), None);
        assert_eq!(fold_src("2147483647 + 1"), None);
        assert_eq!(fold_src("1.0 + pos0.x"), None);
        assert_eq!(fold_src("true ? 1 : 2"), None);
    }
}
