use std::io::Write;

use crate::{
    ast::*,
    symbols::{Qualifier, SymbolId, SymbolTable},
    types::Type,
};

const INDENT_WIDTH: usize = 2;

pub fn print_program_string<I: InfoWriter>(symbols: &SymbolTable, program: &Program<I>) -> String {
    let mut buf = Vec::with_capacity(1024);
    print_program(&mut buf, symbols, program).expect("writing to a Vec can't fail");
    String::from_utf8(buf).expect("tree output is UTF-8")
}

pub fn print_expr_string<I: InfoWriter>(symbols: &SymbolTable, expr: &Expr<I>) -> String {
    let mut buf = Vec::with_capacity(512);
    print_expr(&mut buf, symbols, 0, expr).expect("writing to a Vec can't fail");
    String::from_utf8(buf).expect("tree output is UTF-8")
}

pub fn print_program<I: InfoWriter>(
    w: &mut impl Write,
    symbols: &SymbolTable,
    program: &Program<I>,
) -> std::io::Result<()> {
    for item in &program.items {
        match item {
            Item::Global(decl) => print_declaration(w, symbols, 0, decl)?,
            Item::Function(function) => print_function(w, symbols, 0, function)?,
        }
    }
    Ok(())
}

fn print_function<I: InfoWriter>(
    w: &mut impl Write,
    symbols: &SymbolTable,
    i: usize,
    function: &FunctionDef<I>,
) -> std::io::Result<()> {
    sp(w, i)?;
    let name = symbols.name(function.name.name);
    write!(w, "function {} {name}(", function.ret)?;
    for (idx, &param) in function.params.iter().enumerate() {
        if idx > 0 {
            write!(w, ", ")?;
        }
        let symbol = symbols.get(param);
        write!(w, "{} {}", symbol.ty, symbols.name(symbol.name))?;
    }
    writeln!(w, ") ({})", function.span)?;
    print_block(w, symbols, i + 1, &function.body)
}

fn print_declaration<I: InfoWriter>(
    w: &mut impl Write,
    symbols: &SymbolTable,
    i: usize,
    decl: &Declaration<I>,
) -> std::io::Result<()> {
    sp(w, i)?;
    let symbol = symbols.get(decl.symbol);
    write!(w, "declare ")?;
    match symbol.qualifier {
        Qualifier::Const => write!(w, "const ")?,
        Qualifier::Param => write!(w, "param ")?,
        Qualifier::None | Qualifier::Input | Qualifier::Output => (),
    }
    write!(w, "{} {}", symbol.ty, symbols.name(symbol.name))?;
    if let Some(len) = symbol.array_len {
        write!(w, "[{len}]")?;
    }
    writeln!(w, " ({})", decl.span)?;
    if let Some(initializer) = &decl.initializer {
        print_expr(w, symbols, i + 1, initializer)?;
    }
    Ok(())
}

fn print_block<I: InfoWriter>(
    w: &mut impl Write,
    symbols: &SymbolTable,
    i: usize,
    block: &Block<I>,
) -> std::io::Result<()> {
    sp(w, i)?;
    writeln!(w, "block ({})", block.span)?;
    for stmt in &block.stmts {
        print_stmt(w, symbols, i + 1, stmt)?;
    }
    Ok(())
}

pub fn print_stmt<I: InfoWriter>(
    w: &mut impl Write,
    symbols: &SymbolTable,
    i: usize,
    stmt: &Stmt<I>,
) -> std::io::Result<()> {
    let span = stmt.span;
    match &stmt.kind {
        StmtKind::Declaration(decl) => print_declaration(w, symbols, i, decl)?,
        StmtKind::Block(block) => print_block(w, symbols, i, block)?,
        StmtKind::Assignment { target, op, value } => {
            sp(w, i)?;
            writeln!(w, "assign {} ({span})", op.symbol())?;
            print_expr(w, symbols, i + 1, target)?;
            print_expr(w, symbols, i + 1, value)?;
        }
        StmtKind::Expr(expr) => {
            sp(w, i)?;
            writeln!(w, "expr ({span})")?;
            print_expr(w, symbols, i + 1, expr)?;
        }
        StmtKind::If {
            condition,
            then_branch,
            else_branch,
        } => {
            sp(w, i)?;
            writeln!(w, "if ({span})")?;
            print_expr(w, symbols, i + 1, condition)?;
            print_stmt(w, symbols, i + 1, then_branch)?;
            if let Some(else_branch) = else_branch {
                print_stmt(w, symbols, i + 1, else_branch)?;
            }
        }
        StmtKind::While { condition, body } => {
            sp(w, i)?;
            writeln!(w, "while ({span})")?;
            print_expr(w, symbols, i + 1, condition)?;
            print_stmt(w, symbols, i + 1, body)?;
        }
        StmtKind::DoWhile { body, condition } => {
            sp(w, i)?;
            writeln!(w, "do-while ({span})")?;
            print_stmt(w, symbols, i + 1, body)?;
            print_expr(w, symbols, i + 1, condition)?;
        }
        StmtKind::For {
            init,
            condition,
            step,
            body,
        } => {
            sp(w, i)?;
            writeln!(w, "for ({span})")?;
            if let Some(init) = init {
                label(w, i + 1, "init")?;
                print_stmt(w, symbols, i + 2, init)?;
            }
            if let Some(condition) = condition {
                label(w, i + 1, "condition")?;
                print_expr(w, symbols, i + 2, condition)?;
            }
            if let Some(step) = step {
                label(w, i + 1, "step")?;
                print_stmt(w, symbols, i + 2, step)?;
            }
            label(w, i + 1, "body")?;
            print_stmt(w, symbols, i + 2, body)?;
        }
        StmtKind::Break => {
            sp(w, i)?;
            writeln!(w, "break ({span})")?;
        }
        StmtKind::Continue => {
            sp(w, i)?;
            writeln!(w, "continue ({span})")?;
        }
        StmtKind::Discard => {
            sp(w, i)?;
            writeln!(w, "discard ({span})")?;
        }
        StmtKind::Return(value) => {
            sp(w, i)?;
            writeln!(w, "return ({span})")?;
            if let Some(value) = value {
                print_expr(w, symbols, i + 1, value)?;
            }
        }
    }
    Ok(())
}

pub fn print_expr<I: InfoWriter>(
    w: &mut impl Write,
    symbols: &SymbolTable,
    i: usize,
    expr: &Expr<I>,
) -> std::io::Result<()> {
    sp(w, i)?;
    let info = I::write_ty(&expr.info); // inferred type, for typed ASTs
    let span = expr.span;
    match &expr.kind {
        ExprKind::Literal(literal) => {
            let kind = match literal {
                Literal::Int(_) => "int",
                Literal::Float(_) => "float",
                Literal::Bool(_) => "bool",
            };
            writeln!(w, "{kind} {literal} ({span}{info})")?;
        }
        ExprKind::Var(symbol) => {
            writeln!(w, "var {} ({span}{info})", var_name(symbols, *symbol))?;
        }
        ExprKind::Unary { op, operand } => {
            writeln!(w, "unary {op:?} ({span}{info})")?;
            print_expr(w, symbols, i + 1, operand)?;
        }
        ExprKind::Binary { op, lhs, rhs } => {
            writeln!(w, "binary {op:?} ({span}{info})")?;
            print_expr(w, symbols, i + 1, lhs)?;
            print_expr(w, symbols, i + 1, rhs)?;
        }
        ExprKind::Call { name, args, .. } => {
            writeln!(w, "call {} ({span}{info})", symbols.name(name.name))?;
            for arg in args {
                print_expr(w, symbols, i + 1, arg)?;
            }
        }
        ExprKind::Constructor { ty, args } => {
            writeln!(w, "constructor {ty} ({span}{info})")?;
            for arg in args {
                print_expr(w, symbols, i + 1, arg)?;
            }
        }
        ExprKind::Index { base, index } => {
            writeln!(w, "index ({span}{info})")?;
            print_expr(w, symbols, i + 1, base)?;
            print_expr(w, symbols, i + 1, index)?;
        }
        ExprKind::Swizzle { base, swizzle } => {
            writeln!(w, "swizzle {swizzle} ({span}{info})")?;
            print_expr(w, symbols, i + 1, base)?;
        }
        ExprKind::Conditional {
            condition,
            then_arm,
            else_arm,
        } => {
            writeln!(w, "conditional ({span}{info})")?;
            print_expr(w, symbols, i + 1, condition)?;
            print_expr(w, symbols, i + 1, then_arm)?;
            print_expr(w, symbols, i + 1, else_arm)?;
        }
        ExprKind::Paren(inner) => {
            writeln!(w, "paren ({span}{info})")?;
            print_expr(w, symbols, i + 1, inner)?;
        }
        ExprKind::Widen(inner) => {
            writeln!(w, "widen ({span}{info})")?;
            print_expr(w, symbols, i + 1, inner)?;
        }
    }
    Ok(())
}

fn var_name(symbols: &SymbolTable, symbol: SymbolId) -> &str {
    symbols.name(symbols.get(symbol).name)
}

fn label(w: &mut impl Write, i: usize, label: &str) -> std::io::Result<()> {
    sp(w, i)?;
    writeln!(w, "{label}")
}

fn sp(w: &mut impl Write, i: usize) -> std::io::Result<()> {
    write!(w, "{:width$}", "", width = i * INDENT_WIDTH)
}

/// Prints the decoration of each tree kind.
pub trait InfoWriter: Info {
    fn write_ty(ty: &Self::Ty) -> impl std::fmt::Display;
}

impl InfoWriter for Untyped {
    fn write_ty(_: &()) -> impl std::fmt::Display {
        ""
    }
}

impl InfoWriter for Typed {
    fn write_ty(ty: &Type) -> impl std::fmt::Display {
        struct TypeWriter(Type);

        impl std::fmt::Display for TypeWriter {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, " %: {}", self.0)
            }
        }

        TypeWriter(*ty)
    }
}
