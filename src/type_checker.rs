use crate::{
    ast::{
        BinaryOp, Block, Callee, Declaration, Expr, ExprKind, FunctionDef, Ident, Info, Item,
        Literal, Program, Stmt, StmtKind, Swizzle, Typed, UnaryOp,
    },
    builtins,
    symbols::{FunctionId, Qualifier, Signature, Symbol, SymbolId, SymbolTable},
    token::{Span, Spanned},
    types::{BaseType, Type},
    util::intern::Name,
};

type Result<T, E = Spanned<Error>> = std::result::Result<T, E>;

/// Checks a parsed program and decorates it with types.
///
/// The checker accepts trees of any [`Info`], so an already typed program can
/// be checked again; doing so yields the same program.
pub struct Checker<'sym> {
    symbols: &'sym SymbolTable,
    function: Option<FunctionContext>,
    loops: u32,
}

#[derive(Copy, Clone)]
struct FunctionContext {
    id: FunctionId,
    ret: Type,
}

impl<'sym> Checker<'sym> {
    pub fn new(symbols: &'sym SymbolTable) -> Checker<'sym> {
        Checker {
            symbols,
            function: None,
            loops: 0,
        }
    }

    pub fn check<I: Info>(mut self, program: Program<I>) -> Result<Program<Typed>> {
        let mut items = Vec::with_capacity(program.items.len());
        for item in program.items {
            let item = match item {
                Item::Global(decl) => Item::Global(self.check_declaration(decl)?),
                Item::Function(function) => Item::Function(self.check_function(function)?),
            };
            items.push(item);
        }
        let program = Program { items };
        self.check_main(&program)?;
        tracing::debug!(functions = program.functions().count(), "checked program");
        Ok(program)
    }

    fn check_main(&self, program: &Program<Typed>) -> Result<()> {
        let found = program.functions().any(|f| {
            self.symbols.name(f.name.name) == "main" && f.params.is_empty() && f.ret == Type::Void
        });
        if found {
            Ok(())
        } else {
            Err(Span::new_of_length(0, 0).wrap(Error::MissingMain))
        }
    }

    fn check_function<I: Info>(&mut self, function: FunctionDef<I>) -> Result<FunctionDef<Typed>> {
        for &param in &function.params {
            let symbol = self.symbols.get(param);
            if symbol.ty == Type::Void {
                let name = symbol.name;
                return Err(symbol.span.wrap(Error::VoidVariable { name }));
            }
        }

        self.function = Some(FunctionContext {
            id: function.id,
            ret: function.ret,
        });
        let body = self.check_block(function.body)?;
        self.function = None;

        Ok(FunctionDef {
            name: function.name,
            id: function.id,
            ret: function.ret,
            params: function.params,
            body,
            span: function.span,
        })
    }

    fn check_declaration<I: Info>(&mut self, decl: Declaration<I>) -> Result<Declaration<Typed>> {
        let symbol = self.symbols.get(decl.symbol);
        let name = symbol.name;
        let error = |e: Error| Err(symbol.span.wrap(e));

        if symbol.ty == Type::Void {
            return error(Error::VoidVariable { name });
        }
        match symbol.qualifier {
            Qualifier::Param if !symbol.is_global() => return error(Error::LocalParam { name }),
            Qualifier::Param if decl.initializer.is_some() => {
                return error(Error::ParamInitializer { name });
            }
            Qualifier::Const if decl.initializer.is_none() => {
                return error(Error::MissingConstInitializer { name });
            }
            _ => (),
        }
        if symbol.qualifier != Qualifier::Param {
            if symbol.array_len.is_some() {
                return error(Error::ArrayNotParam { name });
            }
            if symbol.ty.is_sampler() {
                return error(Error::SamplerNotParam { name });
            }
        }

        let ty = symbol.ty;
        let initializer = match decl.initializer {
            Some(expr) => {
                let expr = self.check_expr(expr)?;
                if symbol.is_global() {
                    if let Some(span) = self.non_constant(&expr) {
                        return Err(span.wrap(Error::NonConstantInitializer { name }));
                    }
                }
                Some(coerce(expr, ty)?)
            }
            None => None,
        };
        Ok(Declaration {
            symbol: decl.symbol,
            initializer,
            span: decl.span,
        })
    }

    /// Finds the first part of `expr` that can't be evaluated before the
    /// effect runs: reads of anything but `const` globals, calls to user
    /// functions, samples and increments.
    fn non_constant(&self, expr: &Expr<Typed>) -> Option<Span> {
        let mut parts: Vec<&Expr<Typed>> = Vec::new();
        match &expr.kind {
            ExprKind::Literal(_) => (),
            ExprKind::Var(id) => {
                let symbol = self.symbols.get(*id);
                if symbol.qualifier != Qualifier::Const || !symbol.is_global() {
                    return Some(expr.span);
                }
            }
            ExprKind::Unary { op, .. } if op.is_increment() => return Some(expr.span),
            ExprKind::Unary { operand, .. } => parts.push(operand),
            ExprKind::Binary { lhs, rhs, .. } => parts.extend([&**lhs, &**rhs]),
            ExprKind::Call {
                callee: Callee::Builtin(builtin),
                args,
                ..
            } if builtin.name != "sample" => parts.extend(args),
            ExprKind::Call { .. } => return Some(expr.span),
            ExprKind::Constructor { args, .. } => parts.extend(args),
            ExprKind::Index { base, index } => parts.extend([&**base, &**index]),
            ExprKind::Conditional {
                condition,
                then_arm,
                else_arm,
            } => parts.extend([&**condition, &**then_arm, &**else_arm]),
            ExprKind::Swizzle { base: inner, .. }
            | ExprKind::Paren(inner)
            | ExprKind::Widen(inner) => parts.push(inner),
        }
        parts.into_iter().find_map(|part| self.non_constant(part))
    }

    fn check_block<I: Info>(&mut self, block: Block<I>) -> Result<Block<Typed>> {
        let stmts = block
            .stmts
            .into_iter()
            .map(|stmt| self.check_stmt(stmt))
            .collect::<Result<_>>()?;
        Ok(Block {
            stmts,
            span: block.span,
        })
    }

    fn check_sub_stmt<I: Info>(&mut self, stmt: Stmt<I>) -> Result<Box<Stmt<Typed>>> {
        self.check_stmt(stmt).map(Box::new)
    }

    fn check_loop_body<I: Info>(&mut self, body: Stmt<I>) -> Result<Box<Stmt<Typed>>> {
        self.loops += 1;
        let body = self.check_sub_stmt(body);
        self.loops -= 1;
        body
    }

    fn check_stmt<I: Info>(&mut self, stmt: Stmt<I>) -> Result<Stmt<Typed>> {
        let span = stmt.span;
        let kind = match stmt.kind {
            StmtKind::Declaration(decl) => StmtKind::Declaration(self.check_declaration(decl)?),
            StmtKind::Assignment { target, op, value } => {
                let target = self.check_expr(target)?;
                self.check_lvalue(&target)?;
                let value = self.check_expr(value)?;
                let value = match op.binary() {
                    None => coerce(value, target.info)?,
                    Some(bin) => {
                        let invalid = || {
                            span.wrap(Error::InvalidBinary {
                                op: bin,
                                lhs: target.info,
                                rhs: value.info,
                            })
                        };
                        let (lhs, rhs) = widened_operands(bin, target.info, value.info);
                        if lhs != target.info || binary_result(bin, lhs, rhs) != Some(target.info) {
                            return Err(invalid());
                        }
                        coerce(value, rhs)?
                    }
                };
                StmtKind::Assignment { target, op, value }
            }
            StmtKind::Expr(expr) => StmtKind::Expr(self.check_expr(expr)?),
            StmtKind::If {
                condition,
                then_branch,
                else_branch,
            } => StmtKind::If {
                condition: self.check_condition(condition)?,
                then_branch: self.check_sub_stmt(*then_branch)?,
                else_branch: match else_branch {
                    Some(stmt) => Some(self.check_sub_stmt(*stmt)?),
                    None => None,
                },
            },
            StmtKind::While { condition, body } => StmtKind::While {
                condition: self.check_condition(condition)?,
                body: self.check_loop_body(*body)?,
            },
            StmtKind::DoWhile { body, condition } => StmtKind::DoWhile {
                body: self.check_loop_body(*body)?,
                condition: self.check_condition(condition)?,
            },
            StmtKind::For {
                init,
                condition,
                step,
                body,
            } => StmtKind::For {
                init: match init {
                    Some(stmt) => Some(self.check_sub_stmt(*stmt)?),
                    None => None,
                },
                condition: match condition {
                    Some(expr) => Some(self.check_condition(expr)?),
                    None => None,
                },
                step: match step {
                    Some(stmt) => Some(self.check_sub_stmt(*stmt)?),
                    None => None,
                },
                body: self.check_loop_body(*body)?,
            },
            StmtKind::Break if self.loops == 0 => {
                return Err(span.wrap(Error::BreakOutsideLoop));
            }
            StmtKind::Continue if self.loops == 0 => {
                return Err(span.wrap(Error::ContinueOutsideLoop));
            }
            StmtKind::Break => StmtKind::Break,
            StmtKind::Continue => StmtKind::Continue,
            StmtKind::Discard => StmtKind::Discard,
            StmtKind::Return(value) => {
                let ret = self.function.map_or(Type::Void, |f| f.ret);
                let value = match (value, ret) {
                    (None, Type::Void) => None,
                    (None, expected) => {
                        return Err(span.wrap(Error::MissingReturnValue { expected }));
                    }
                    (Some(value), Type::Void) => {
                        return Err(value.span.wrap(Error::VoidReturnValue));
                    }
                    (Some(value), ret) => {
                        let value = self.check_expr(value)?;
                        Some(coerce(value, ret)?)
                    }
                };
                StmtKind::Return(value)
            }
            StmtKind::Block(block) => StmtKind::Block(self.check_block(block)?),
        };
        Ok(Stmt { kind, span })
    }

    fn check_condition<I: Info>(&mut self, expr: Expr<I>) -> Result<Expr<Typed>> {
        let expr = self.check_expr(expr)?;
        if expr.info == Type::Bool {
            Ok(expr)
        } else {
            Err(expr.span.wrap(Error::Mismatch {
                expected: Type::Bool,
                actual: expr.info,
            }))
        }
    }

    /// Checks that `expr` denotes a writable location.
    fn check_lvalue(&self, expr: &Expr<Typed>) -> Result<()> {
        match &expr.kind {
            ExprKind::Var(id) => {
                let symbol = self.symbols.get(*id);
                if symbol.array_len.is_none() && symbol.qualifier.is_writable() {
                    Ok(())
                } else {
                    let name = symbol.name;
                    Err(expr.span.wrap(Error::ReadOnly { name }))
                }
            }
            ExprKind::Index { base, .. } => self.check_lvalue(base),
            ExprKind::Swizzle { base, swizzle } => {
                if !swizzle.is_distinct() {
                    return Err(expr.span.wrap(Error::RepeatedSwizzleComponent));
                }
                self.check_lvalue(base)
            }
            ExprKind::Paren(inner) => self.check_lvalue(inner),
            _ => Err(expr.span.wrap(Error::InvalidAssignmentTarget)),
        }
    }

    /// Types an expression, making implicit widening explicit.
    pub fn check_expr<I: Info>(&mut self, expr: Expr<I>) -> Result<Expr<Typed>> {
        let span = expr.span;
        let (kind, ty) = match expr.kind {
            ExprKind::Literal(literal) => (ExprKind::Literal(literal), literal.ty()),

            ExprKind::Var(id) => {
                let symbol = self.symbols.get(id);
                if symbol.array_len.is_some() {
                    let name = symbol.name;
                    return Err(span.wrap(Error::ArrayUsedAsValue { name }));
                }
                (ExprKind::Var(id), symbol.ty)
            }

            ExprKind::Unary { op, operand } => {
                let operand = self.check_expr(*operand)?;
                if op.is_increment() {
                    self.check_lvalue(&operand)?;
                }
                let Some(ty) = unary_result(op, operand.info) else {
                    let operand = operand.info;
                    return Err(span.wrap(Error::InvalidUnary { op, operand }));
                };
                let operand = Box::new(operand);
                (ExprKind::Unary { op, operand }, ty)
            }

            ExprKind::Binary { op, lhs, rhs } => {
                let lhs = self.check_expr(*lhs)?;
                let rhs = self.check_expr(*rhs)?;
                let (lhs_ty, rhs_ty) = widened_operands(op, lhs.info, rhs.info);
                let Some(ty) = binary_result(op, lhs_ty, rhs_ty) else {
                    let (lhs, rhs) = (lhs.info, rhs.info);
                    return Err(span.wrap(Error::InvalidBinary { op, lhs, rhs }));
                };
                let lhs = Box::new(coerce(lhs, lhs_ty)?);
                let rhs = Box::new(coerce(rhs, rhs_ty)?);
                (ExprKind::Binary { op, lhs, rhs }, ty)
            }

            ExprKind::Call { name, args, .. } => {
                let args = args
                    .into_iter()
                    .map(|arg| self.check_expr(arg))
                    .collect::<Result<Vec<_>>>()?;
                let arg_types: Vec<Type> = args.iter().map(|arg| arg.info).collect();
                let (callee, signature) = self.resolve_call(name, span, &arg_types)?;
                let args = args
                    .into_iter()
                    .zip(&signature.params)
                    .map(|(arg, &param)| coerce(arg, param))
                    .collect::<Result<_>>()?;
                (ExprKind::Call { name, args, callee }, signature.ret)
            }

            ExprKind::Constructor { ty, args } => {
                let args = args
                    .into_iter()
                    .map(|arg| self.check_expr(arg))
                    .collect::<Result<Vec<_>>>()?;
                check_constructor(ty, span, &args)?;
                (ExprKind::Constructor { ty, args }, ty)
            }

            ExprKind::Index { base, index } => {
                let index = self.check_expr(*index)?;
                if index.info != Type::Int {
                    return Err(index.span.wrap(Error::Mismatch {
                        expected: Type::Int,
                        actual: index.info,
                    }));
                }

                // Arrays can only be indexed, so they are typed by their
                // element type.
                let (base, len, ty) = match self.array_var(&base) {
                    Some((id, symbol, len)) => {
                        let base = Expr {
                            kind: ExprKind::Var(id),
                            span: base.span,
                            info: symbol.ty,
                        };
                        (base, len, symbol.ty)
                    }
                    None => {
                        let base = self.check_expr(*base)?;
                        let Some(element) = base.info.element() else {
                            let ty = base.info;
                            return Err(base.span.wrap(Error::NotIndexable { ty }));
                        };
                        let len = base.info.vector_len().or(base.info.matrix_dim());
                        (base, u32::from(len.unwrap_or(0)), element)
                    }
                };

                if let ExprKind::Literal(Literal::Int(value)) = index.kind {
                    if u32::try_from(value).map_or(true, |value| value >= len) {
                        return Err(index.span.wrap(Error::IndexOutOfBounds { index: value, len }));
                    }
                }

                let kind = ExprKind::Index {
                    base: Box::new(base),
                    index: Box::new(index),
                };
                (kind, ty)
            }

            ExprKind::Swizzle { base, swizzle } => {
                let base = self.check_expr(*base)?;
                let ty = match base.info.vector_len() {
                    Some(len @ 2..=4) if swizzle.max_lane() < len => {
                        Type::vector(base.info.base(), swizzle.len())
                    }
                    _ => None,
                };
                let Some(ty) = ty else {
                    let base = base.info;
                    return Err(span.wrap(Error::InvalidSwizzle { ty: base, swizzle }));
                };
                let base = Box::new(base);
                (ExprKind::Swizzle { base, swizzle }, ty)
            }

            ExprKind::Conditional {
                condition,
                then_arm,
                else_arm,
            } => {
                let condition = self.check_condition(*condition)?;
                let then_arm = self.check_expr(*then_arm)?;
                let else_arm = self.check_expr(*else_arm)?;
                let Some(ty) = Type::unify(then_arm.info, else_arm.info) else {
                    return Err(span.wrap(Error::ArmsDiffer {
                        then_arm: then_arm.info,
                        else_arm: else_arm.info,
                    }));
                };
                let kind = ExprKind::Conditional {
                    condition: Box::new(condition),
                    then_arm: Box::new(coerce(then_arm, ty)?),
                    else_arm: Box::new(coerce(else_arm, ty)?),
                };
                (kind, ty)
            }

            ExprKind::Paren(inner) => {
                let inner = self.check_expr(*inner)?;
                let ty = inner.info;
                (ExprKind::Paren(Box::new(inner)), ty)
            }

            ExprKind::Widen(inner) => {
                let inner = self.check_expr(*inner)?;
                let widened = inner
                    .info
                    .vector_len()
                    .filter(|_| inner.info.base() == BaseType::Int)
                    .and_then(|len| Type::vector(BaseType::Float, len));
                let Some(ty) = widened else {
                    return Err(inner.span.wrap(Error::Mismatch {
                        expected: Type::Int,
                        actual: inner.info,
                    }));
                };
                (ExprKind::Widen(Box::new(inner)), ty)
            }
        };
        Ok(Expr {
            kind,
            span,
            info: ty,
        })
    }

    /// If `expr` names an array variable, returns it with its length.
    fn array_var<I: Info>(&self, expr: &Expr<I>) -> Option<(SymbolId, &'sym Symbol, u32)> {
        let ExprKind::Var(id) = expr.kind else {
            return None;
        };
        let symbol = self.symbols.get(id);
        symbol.array_len.map(|len| (id, symbol, len))
    }

    /// Picks the overload of `name` for the given argument types. An exact
    /// match wins; otherwise exactly one overload must accept the arguments
    /// after widening.
    fn resolve_call(&self, name: Ident, span: Span, args: &[Type]) -> Result<(Callee, Signature)> {
        let candidates: Vec<(Callee, Signature)> =
            match builtins::function(self.symbols.name(name.name)) {
                Some(builtin) => builtin
                    .overloads()
                    .into_iter()
                    .map(|signature| (Callee::Builtin(builtin), signature))
                    .collect(),
                None => self
                    .symbols
                    .functions(name.name)
                    .filter(|&(id, _)| self.is_visible(id))
                    .map(|(id, function)| (Callee::User(id), function.signature.clone()))
                    .collect(),
            };
        if candidates.is_empty() {
            let name = name.name;
            let current = self.function.map(|f| f.id);
            let mut defined = self.symbols.functions(name).map(|(id, _)| Some(id)).peekable();
            let error = if defined.peek().is_none() {
                Error::UnknownFunction { name }
            } else if defined.any(|id| id == current) {
                Error::RecursiveCall { name }
            } else {
                Error::CallBeforeDefinition { name }
            };
            return Err(span.wrap(error));
        }

        if let Some(exact) = candidates.iter().find(|(_, s)| s.params == args) {
            return Ok(exact.clone());
        }
        let mut accepting = candidates.into_iter().filter(|(_, s)| {
            s.params.len() == args.len() && args.iter().zip(&s.params).all(|(a, p)| a.widens_to(*p))
        });
        match (accepting.next(), accepting.next()) {
            (Some(found), None) => Ok(found),
            (Some(_), Some(_)) => Err(span.wrap(Error::AmbiguousCall { name: name.name })),
            (None, _) => Err(span.wrap(Error::NoMatchingOverload {
                name: name.name,
                args: args.into(),
            })),
        }
    }

    /// A function can only call the functions defined before it.
    fn is_visible(&self, id: FunctionId) -> bool {
        self.function.is_none_or(|current| id < current.id)
    }
}

fn check_constructor(ty: Type, span: Span, args: &[Expr<Typed>]) -> Result<()> {
    if ty.components() == 0 {
        return Err(span.wrap(Error::InvalidConstructor { ty }));
    }
    if let Some(arg) = args.iter().find(|arg| arg.info.vector_len().is_none()) {
        let error = Error::ConstructorArgument { ty, arg: arg.info };
        return Err(arg.span.wrap(error));
    }
    let splat = args.len() == 1 && args[0].info.is_scalar() && !ty.is_matrix();
    let actual: u32 = args.iter().map(|arg| u32::from(arg.info.components())).sum();
    let expected = u32::from(ty.components());
    if splat || actual == expected {
        Ok(())
    } else {
        Err(span.wrap(Error::ConstructorArity {
            ty,
            expected,
            actual,
        }))
    }
}

/// Wraps `expr` in a widening conversion if needed to make it a `to`.
fn coerce(expr: Expr<Typed>, to: Type) -> Result<Expr<Typed>> {
    if expr.info == to {
        Ok(expr)
    } else if expr.info.widens_to(to) {
        Ok(Expr {
            span: expr.span,
            info: to,
            kind: ExprKind::Widen(Box::new(expr)),
        })
    } else {
        Err(expr.span.wrap(Error::Mismatch {
            expected: to,
            actual: expr.info,
        }))
    }
}

/// The operand types of `op` after int to float widening: an int-based
/// operand meeting a float-based one is widened lane by lane.
pub fn widened_operands(op: BinaryOp, lhs: Type, rhs: Type) -> (Type, Type) {
    if op.is_logical() {
        return (lhs, rhs);
    }
    let widen = |ty: Type| {
        ty.vector_len()
            .and_then(|len| Type::vector(BaseType::Float, len))
            .unwrap_or(ty)
    };
    match (lhs.base(), rhs.base()) {
        (BaseType::Int, BaseType::Float) => (widen(lhs), rhs),
        (BaseType::Float, BaseType::Int) => (lhs, widen(rhs)),
        _ => (lhs, rhs),
    }
}

/// Result type of a binary operator over operands that were already
/// widened. `None` if the combination is invalid.
pub fn binary_result(op: BinaryOp, lhs: Type, rhs: Type) -> Option<Type> {
    use BinaryOp::*;
    match op {
        Add | Sub | Mul | Div => {
            if !lhs.is_numeric() || !rhs.is_numeric() || lhs.base() != rhs.base() {
                return None;
            }
            if lhs == rhs {
                return Some(lhs);
            }
            match (lhs.matrix_dim(), rhs.matrix_dim()) {
                _ if lhs.is_scalar() => Some(rhs),
                _ if rhs.is_scalar() => Some(lhs),
                // Matrix times column vector, and row vector times matrix.
                (Some(dim), None) if op == Mul && rhs.vector_len() == Some(dim) => Some(rhs),
                (None, Some(dim)) if op == Mul && lhs.vector_len() == Some(dim) => Some(lhs),
                _ => None,
            }
        }
        Less | LessEq | Greater | GreaterEq => {
            (lhs == rhs && lhs.is_scalar() && lhs.is_numeric()).then_some(Type::Bool)
        }
        EqEq | NotEq => (lhs == rhs && lhs != Type::Void).then_some(Type::Bool),
        And | Or | Xor => (lhs == Type::Bool && rhs == Type::Bool).then_some(Type::Bool),
    }
}

/// Result type of a unary operator, `None` if `operand` doesn't support it.
pub fn unary_result(op: UnaryOp, operand: Type) -> Option<Type> {
    let valid = match op {
        UnaryOp::Neg | UnaryOp::Plus => operand.is_numeric(),
        UnaryOp::Not => operand == Type::Bool,
        UnaryOp::PreInc | UnaryOp::PreDec | UnaryOp::PostInc | UnaryOp::PostDec => {
            operand.is_numeric() && !operand.is_matrix()
        }
    };
    valid.then_some(operand)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    InvalidBinary {
        op: BinaryOp,
        lhs: Type,
        rhs: Type,
    },
    InvalidUnary {
        op: UnaryOp,
        operand: Type,
    },
    Mismatch {
        expected: Type,
        actual: Type,
    },
    ArmsDiffer {
        then_arm: Type,
        else_arm: Type,
    },
    InvalidAssignmentTarget,
    ReadOnly {
        name: Name,
    },
    RepeatedSwizzleComponent,
    VoidVariable {
        name: Name,
    },
    LocalParam {
        name: Name,
    },
    ParamInitializer {
        name: Name,
    },
    MissingConstInitializer {
        name: Name,
    },
    NonConstantInitializer {
        name: Name,
    },
    ArrayNotParam {
        name: Name,
    },
    SamplerNotParam {
        name: Name,
    },
    ArrayUsedAsValue {
        name: Name,
    },
    NotIndexable {
        ty: Type,
    },
    IndexOutOfBounds {
        index: i32,
        len: u32,
    },
    InvalidSwizzle {
        ty: Type,
        swizzle: Swizzle,
    },
    InvalidConstructor {
        ty: Type,
    },
    ConstructorArgument {
        ty: Type,
        arg: Type,
    },
    ConstructorArity {
        ty: Type,
        expected: u32,
        actual: u32,
    },
    UnknownFunction {
        name: Name,
    },
    RecursiveCall {
        name: Name,
    },
    CallBeforeDefinition {
        name: Name,
    },
    NoMatchingOverload {
        name: Name,
        args: Box<[Type]>,
    },
    AmbiguousCall {
        name: Name,
    },
    BreakOutsideLoop,
    ContinueOutsideLoop,
    MissingReturnValue {
        expected: Type,
    },
    VoidReturnValue,
    MissingMain,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{parser, util::test_utils::tree_tests};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_operator_table() {
        use Type::*;
        let cases = [
            (BinaryOp::Add, Float4, Float4, Some(Float4)),
            (BinaryOp::Mul, Float, Float3, Some(Float3)),
            (BinaryOp::Div, Float2, Float, Some(Float2)),
            (BinaryOp::Mul, Float3x3, Float3, Some(Float3)),
            (BinaryOp::Mul, Float4, Float4x4, Some(Float4)),
            (BinaryOp::Mul, Float2x2, Float2x2, Some(Float2x2)),
            (BinaryOp::Add, Float2x2, Float2, None),
            (BinaryOp::Add, Float2, Float3, None),
            (BinaryOp::Add, Int2, Int, Some(Int2)),
            (BinaryOp::Add, Bool, Bool, None),
            (BinaryOp::Less, Float, Float, Some(Bool)),
            (BinaryOp::Less, Float2, Float2, None),
            (BinaryOp::EqEq, Float3, Float3, Some(Bool)),
            (BinaryOp::EqEq, Sampler, Sampler, Some(Bool)),
            (BinaryOp::EqEq, Sampler, FSampler, None),
            (BinaryOp::Xor, Bool, Bool, Some(Bool)),
            (BinaryOp::And, Bool2, Bool2, None),
        ];
        for (op, lhs, rhs, expected) in cases {
            assert_eq!(binary_result(op, lhs, rhs), expected, "{lhs} {op:?} {rhs}");
        }

        assert_eq!(widened_operands(BinaryOp::Mul, Int, Float4), (Float, Float4));
        assert_eq!(widened_operands(BinaryOp::Add, Float2, Int2), (Float2, Float2));
        assert_eq!(widened_operands(BinaryOp::Add, Float2, Int3), (Float2, Float3));
        assert_eq!(unary_result(UnaryOp::Not, Float), None);
        assert_eq!(unary_result(UnaryOp::Neg, Float3x3), Some(Float3x3));
        assert_eq!(unary_result(UnaryOp::PostInc, Float3x3), None);
    }

    #[test]
    fn test_checking_is_idempotent() {
        let src = include_str!("../effects/color_adjust.jsl");
        let mut symbols = SymbolTable::new();
        let program =
            parser::parse_program(src, &mut Vec::new(), &mut symbols, parser::DEFAULT_MAX_DEPTH)
                .unwrap();
        let once = Checker::new(&symbols).check(program).unwrap();
        let twice = Checker::new(&symbols).check(once.clone()).unwrap();
        assert_eq!(once, twice);
    }

    tree_tests!(
        use checker;

        fn test_int_widens_to_float() {
            let expr = "a + i";
            let tree_ok = "
                binary Add (0..5 %: float)
                  var a (0..1 %: float)
                  widen (4..5 %: float)
                    var i (4..5 %: int)
            ";
        }

        fn test_scalar_times_vector() {
            let expr = "v * 2";
            let tree_ok = "
                binary Mul (0..5 %: float4)
                  var v (0..1 %: float4)
                  widen (4..5 %: float)
                    int 2 (4..5 %: int)
            ";
        }

        fn test_equality_is_bool() {
            let expr = "foo == 3";
            let tree_ok = "
                binary EqEq (0..8 %: bool)
                  var foo (0..3 %: int)
                  int 3 (7..8 %: int)
            ";
        }

        fn test_matrix_times_vector() {
            let expr = "m * v.xyz";
            let tree_ok = "
                binary Mul (0..9 %: float3)
                  var m (0..1 %: float3x3)
                  swizzle xyz (4..9 %: float3)
                    var v (4..5 %: float4)
            ";
        }

        fn test_overload_with_widening() {
            let expr = "max(v, 0)";
            let tree_ok = "
                call max (0..9 %: float4)
                  var v (4..5 %: float4)
                  widen (7..8 %: float)
                    int 0 (7..8 %: int)
            ";
        }

        fn test_sample() {
            let expr = "sample(tex, pos0)";
            let tree_ok = "
                call sample (0..17 %: float4)
                  var tex (7..10 %: sampler)
                  var pos0 (12..16 %: float2)
            ";
        }

        fn test_conditional_unifies_arms() {
            let expr = "flag ? a : i";
            let tree_ok = "
                conditional (0..12 %: float)
                  var flag (0..4 %: bool)
                  var a (7..8 %: float)
                  widen (11..12 %: float)
                    var i (11..12 %: int)
            ";
        }

        fn test_constructor_from_parts() {
            let expr = "float4(u, 0, 1.0)";
            let tree_ok = "
                constructor float4 (0..17 %: float4)
                  var u (7..8 %: float2)
                  int 0 (10..11 %: int)
                  float 1.0 (13..16 %: float)
            ";
        }

        fn test_logical_needs_bool() {
            let expr = "flag && a";
            let expected_errors = &["0..9: operator && can't be applied to bool and float"];
        }

        fn test_relational_needs_scalars() {
            let expr = "u < u";
            let expected_errors = &["0..5: operator < can't be applied to float2 and float2"];
        }

        fn test_negating_bool() {
            let expr = "-flag";
            let expected_errors = &["0..5: operator - can't be applied to bool"];
        }

        fn test_swizzle_out_of_range() {
            let expr = "u.z";
            let expected_errors = &["0..3: type float2 has no component .z"];
        }

        fn test_no_matching_overload() {
            let expr = "mix(a, b)";
            let expected_errors = &["0..9: no overload of mix takes (float, float)"];
        }

        fn test_unknown_function() {
            let expr = "nope(a)";
            let expected_errors = &["0..7: function nope is not declared"];
        }

        fn test_arms_differ() {
            let expr = "flag ? a : flag";
            let expected_errors = &["0..15: conditional arms have different types float and bool"];
        }

        fn test_constructor_arity() {
            let expr = "float3(u)";
            let expected_errors = &["0..9: constructor float3 needs 3 components, but got 2"];
        }

        fn test_constant_index_out_of_bounds() {
            let expr = "v[4]";
            let expected_errors = &["2..3: index 4 is out of bounds for length 4"];
        }

        fn test_scalar_is_not_indexable() {
            let expr = "a[0]";
            let expected_errors = &["0..1: type float can't be indexed"];
        }

        fn test_increment_needs_lvalue() {
            let expr = "pos0++";
            let expected_errors = &["0..4: pos0 can't be assigned"];
        }

        fn test_program_is_decorated() {
            let program = "
param float4 tint;
float4 scale(float4 c, float k) { return c * k; }
void main() {
    color = scale(tint, 2);
}
";
            let tree_ok = "
                declare param float4 tint (1..18)
                function float4 scale(float4 c, float k) (20..69)
                  block (52..69)
                    return (54..67)
                      binary Mul (61..66 %: float4)
                        var c (61..62 %: float4)
                        var k (65..66 %: float)
                function void main() (70..113)
                  block (82..113)
                    assign = (88..111)
                      var color (88..93 %: float4)
                      call scale (96..110 %: float4)
                        var tint (102..106 %: float4)
                        widen (108..109 %: float)
                          int 2 (108..109 %: int)
            ";
        }

        fn test_outer_variable_after_block() {
            let program = "
void main() {
    int x = 1;
    { float x = 2.0; }
    color = float4(x);
}
";
            let tree_ok = "
                function void main() (1..77)
                  block (13..77)
                    declare int x (19..28)
                      int 1 (27..28 %: int)
                    block (34..52)
                      declare float x (36..49)
                        float 2.0 (46..49 %: float)
                    assign = (57..75)
                      var color (57..62 %: float4)
                      constructor float4 (65..73 %: float4)
                        var x (72..73 %: int)
            ";
        }

        fn test_missing_main() {
            let program = "float f() { return 1.0; }";
            let expected_errors = &["0..0: no void main() function defined"];
        }

        fn test_global_reads_an_input() {
            let program = "float g = pos0.x; void main() {}";
            let expected_errors = &["10..14: global g must be initialized by a constant"];
        }

        fn test_global_calls_a_function() {
            let program = "float f() { return 1.0; } float g = f(); void main() {}";
            let expected_errors = &["36..39: global g must be initialized by a constant"];
        }

        fn test_global_from_constants() {
            let program = "const float k = 2.0; const float2 h = float2(k, sqrt(k)); void main() {}";
            let expected_errors = &[];
        }

        fn test_recursion_is_rejected() {
            let program = "float f(float x) { return f(x); } void main() {}";
            let expected_errors = &["26..30: function f can't call itself"];
        }

        fn test_param_is_read_only() {
            let program = "param float k; void main() { k = 1.0; }";
            let expected_errors = &["29..30: k can't be assigned"];
        }

        fn test_break_outside_loop() {
            let program = "void main() { break; }";
            let expected_errors = &["14..20: break outside of a loop"];
        }

        fn test_return_type_mismatch() {
            let program = "float f() { return true; } void main() {}";
            let expected_errors = &["19..23: expected type float, but got bool"];
        }

        fn test_const_needs_initializer() {
            let program = "const float k; void main() {}";
            let expected_errors = &["12..13: const k must be initialized"];
        }

        fn test_param_must_be_global() {
            let program = "void main() { param float k; }";
            let expected_errors = &["26..27: param k must be declared at the top level"];
        }

        fn test_calls_only_see_earlier_functions() {
            let program = "void main() { color = g(); } float4 g() { return color; }";
            let expected_errors = &["22..25: function g is called before its definition"];
        }

        fn test_condition_must_be_bool() {
            let program = "void main() { if (1) discard; }";
            let expected_errors = &["18..19: expected type bool, but got int"];
        }

        fn test_compound_assignment_keeps_target_type() {
            let program = "void main() { float x = 1.0; x *= color; }";
            let expected_errors = &["29..40: operator * can't be applied to float and float4"];
        }
    );
}
