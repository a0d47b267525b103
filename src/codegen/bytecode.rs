//! Listing for the software interpreter's stack machine.
//!
//! Every instruction pops its operands and pushes its result. Binary
//! operators take their left operand from below the right one, and a scalar
//! operand of an arithmetic instruction is broadcast over a vector one.

use std::{collections::HashMap, fmt, fmt::Write};

use crate::{
    ast::{
        BinaryOp, Callee, Declaration, Expr, ExprKind, FunctionDef, Item, Literal, Program, Stmt,
        StmtKind, Swizzle, Typed, UnaryOp,
    },
    builtins,
    codegen::{fold, Error, Target},
    symbols::{FunctionId, Qualifier, SymbolId, SymbolTable},
    token::{Span, Spanned},
    types::{BaseType, Type},
};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Slot {
    Global(u32),
    Local(u32),
    Builtin(&'static str),
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::Global(i) => write!(f, "g{i}"),
            Slot::Local(i) => write!(f, "l{i}"),
            Slot::Builtin(name) => write!(f, "@{name}"),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Label(u32);

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Op {
    Push(Literal),
    Load(Slot),
    Store(Slot),
    /// Pops an index and loads that element of an array.
    LoadElem(Slot),
    /// Pops an index, then the value to store at it.
    StoreElem(Slot),
    /// Pops an index, then a vector, and pushes that lane.
    Extract,
    /// Pops an index, a vector and a value; pushes the vector with the lane
    /// replaced.
    InsertLane,
    Swizzle(Swizzle),
    /// Pops a vector, then a value; pushes the vector with the selected
    /// lanes replaced.
    InsertSwizzle(Swizzle),
    Dup,
    Pop,
    Neg,
    Not,
    Binary(BinaryOp),
    /// Int to float conversion, lane by lane.
    ToFloat,
    Construct(Type, usize),
    Sample,
    CallBuiltin(&'static str, usize),
    Call(String, usize),
    Jump(Label),
    JumpIf(Label),
    JumpUnless(Label),
    Label(Label),
    Discard,
    Ret,
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Op::Push(literal) => write!(f, "push {literal}"),
            Op::Load(slot) => write!(f, "load {slot}"),
            Op::Store(slot) => write!(f, "store {slot}"),
            Op::LoadElem(slot) => write!(f, "load_elem {slot}"),
            Op::StoreElem(slot) => write!(f, "store_elem {slot}"),
            Op::Extract => f.write_str("extract"),
            Op::InsertLane => f.write_str("insert_lane"),
            Op::Swizzle(swizzle) => write!(f, "swizzle {swizzle}"),
            Op::InsertSwizzle(swizzle) => write!(f, "insert_swizzle {swizzle}"),
            Op::Dup => f.write_str("dup"),
            Op::Pop => f.write_str("pop"),
            Op::Neg => f.write_str("neg"),
            Op::Not => f.write_str("not"),
            Op::Binary(op) => f.write_str(mnemonic(*op)),
            Op::ToFloat => f.write_str("to_float"),
            Op::Construct(ty, argc) => write!(f, "construct {ty} {argc}"),
            Op::Sample => f.write_str("sample"),
            Op::CallBuiltin(name, argc) => write!(f, "call_builtin {name} {argc}"),
            Op::Call(label, argc) => write!(f, "call {label} {argc}"),
            Op::Jump(label) => write!(f, "jump {label}"),
            Op::JumpIf(label) => write!(f, "jump_if {label}"),
            Op::JumpUnless(label) => write!(f, "jump_unless {label}"),
            Op::Label(label) => write!(f, "{label}:"),
            Op::Discard => f.write_str("discard"),
            Op::Ret => f.write_str("ret"),
        }
    }
}

fn mnemonic(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Add => "add",
        BinaryOp::Sub => "sub",
        BinaryOp::Mul => "mul",
        BinaryOp::Div => "div",
        BinaryOp::EqEq => "eq",
        BinaryOp::NotEq => "ne",
        BinaryOp::Less => "lt",
        BinaryOp::LessEq => "le",
        BinaryOp::Greater => "gt",
        BinaryOp::GreaterEq => "ge",
        BinaryOp::And => "and",
        BinaryOp::Or => "or",
        BinaryOp::Xor => "xor",
    }
}

pub struct Generator<'sym> {
    symbols: &'sym SymbolTable,
    out: String,
    code: Vec<Op>,
    slots: HashMap<SymbolId, Slot>,
    functions: HashMap<FunctionId, String>,
    globals: u32,
    locals: u32,
    labels: u32,
    /// `(continue, break)` targets of the enclosing loops.
    loops: Vec<(Label, Label)>,
    errors: Vec<Spanned<Error>>,
}

impl<'sym> Generator<'sym> {
    pub fn new(symbols: &'sym SymbolTable) -> Generator<'sym> {
        Generator {
            symbols,
            out: String::with_capacity(4096),
            code: Vec::with_capacity(256),
            slots: HashMap::new(),
            functions: HashMap::new(),
            globals: 0,
            locals: 0,
            labels: 0,
            loops: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn generate(mut self, program: &Program<Typed>) -> Result<String, Vec<Spanned<Error>>> {
        self.out("; jsl bytecode");

        for (i, function) in program.functions().enumerate() {
            let name = self.symbols.name(function.name.name);
            self.functions.insert(function.id, format!("{name}#{i}"));
        }

        for decl in program.globals() {
            self.g_global(decl);
        }
        let init = std::mem::take(&mut self.code);
        if !init.is_empty() {
            self.out(".init");
            self.flush(init);
            self.out(".end");
        }

        let mut entry = None;
        for item in &program.items {
            if let Item::Function(function) = item {
                self.g_function(function);
                if self.symbols.name(function.name.name) == "main" && function.params.is_empty() {
                    entry = self.functions.get(&function.id).cloned();
                }
            }
        }
        if let Some(entry) = entry {
            self.out(format_args!(".entry {entry}"));
        }

        if self.errors.is_empty() {
            Ok(self.out)
        } else {
            Err(self.errors)
        }
    }

    fn g_global(&mut self, decl: &Declaration<Typed>) {
        let symbol = self.symbols.get(decl.symbol);
        let slot = Slot::Global(self.globals);
        self.globals += 1;
        self.slots.insert(decl.symbol, slot);

        let qualifier = match symbol.qualifier {
            Qualifier::Param => "param ",
            Qualifier::Const => "const ",
            _ => "",
        };
        let name = self.symbols.name(symbol.name);
        let len = symbol.array_len.map(|len| format!("[{len}]")).unwrap_or_default();
        self.out(format_args!(".global {slot} {qualifier}{} {name}{len}", symbol.ty));

        if self.check_type(symbol.ty, decl.span) {
            if let Some(initializer) = &decl.initializer {
                self.g_expr(initializer);
                self.emit(Op::Store(slot));
            }
        }
    }

    fn g_function(&mut self, function: &FunctionDef<Typed>) {
        self.locals = 0;
        let label = self.functions[&function.id].clone();
        self.check_type(function.ret, function.span);

        let mut header = vec![format!(".func {label} -> {}", function.ret)];
        for &param in &function.params {
            let symbol = self.symbols.get(param);
            self.check_type(symbol.ty, symbol.span);
            let slot = self.local(param);
            let name = self.symbols.name(symbol.name);
            header.push(format!(".param {slot} {} {name}", symbol.ty));
        }

        for stmt in &function.body.stmts {
            self.g_stmt(stmt);
        }
        if self.code.last() != Some(&Op::Ret) {
            self.emit(Op::Ret);
        }

        for line in header {
            self.out(line);
        }
        let locals = self.locals;
        self.out(format_args!(".locals {locals}"));
        let code = std::mem::take(&mut self.code);
        self.flush(code);
        self.out(".end");
    }

    fn g_stmt(&mut self, stmt: &Stmt<Typed>) {
        match &stmt.kind {
            StmtKind::Declaration(decl) => {
                let symbol = self.symbols.get(decl.symbol);
                let slot = self.local(decl.symbol);
                if self.check_type(symbol.ty, decl.span) {
                    if let Some(initializer) = &decl.initializer {
                        self.g_expr(initializer);
                        self.emit(Op::Store(slot));
                    }
                }
            }
            StmtKind::Assignment { target, op, value } => {
                if let Some(op) = op.binary() {
                    let place = self.g_place(target);
                    self.g_load(&place);
                    self.g_expr(value);
                    self.emit(Op::Binary(op));
                    self.g_store(&place);
                } else {
                    self.g_expr(value);
                    let place = self.g_place(target);
                    self.g_store(&place);
                }
            }
            StmtKind::Expr(expr) => {
                self.g_expr(expr);
                if expr.info != Type::Void {
                    self.emit(Op::Pop);
                }
            }
            StmtKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                let otherwise = self.label();
                self.g_expr(condition);
                self.emit(Op::JumpUnless(otherwise));
                self.g_stmt(then_branch);
                if let Some(else_branch) = else_branch {
                    let end = self.label();
                    self.emit(Op::Jump(end));
                    self.emit(Op::Label(otherwise));
                    self.g_stmt(else_branch);
                    self.emit(Op::Label(end));
                } else {
                    self.emit(Op::Label(otherwise));
                }
            }
            StmtKind::While { condition, body } => {
                let (start, end) = (self.label(), self.label());
                self.emit(Op::Label(start));
                self.g_expr(condition);
                self.emit(Op::JumpUnless(end));
                self.g_loop_body(body, start, end);
                self.emit(Op::Jump(start));
                self.emit(Op::Label(end));
            }
            StmtKind::DoWhile { body, condition } => {
                let (start, next, end) = (self.label(), self.label(), self.label());
                self.emit(Op::Label(start));
                self.g_loop_body(body, next, end);
                self.emit(Op::Label(next));
                self.g_expr(condition);
                self.emit(Op::JumpIf(start));
                self.emit(Op::Label(end));
            }
            StmtKind::For {
                init,
                condition,
                step,
                body,
            } => {
                if let Some(init) = init {
                    self.g_stmt(init);
                }
                let (start, next, end) = (self.label(), self.label(), self.label());
                self.emit(Op::Label(start));
                if let Some(condition) = condition {
                    self.g_expr(condition);
                    self.emit(Op::JumpUnless(end));
                }
                self.g_loop_body(body, next, end);
                self.emit(Op::Label(next));
                if let Some(step) = step {
                    self.g_stmt(step);
                }
                self.emit(Op::Jump(start));
                self.emit(Op::Label(end));
            }
            StmtKind::Break => {
                if let Some(&(_, end)) = self.loops.last() {
                    self.emit(Op::Jump(end));
                }
            }
            StmtKind::Continue => {
                if let Some(&(next, _)) = self.loops.last() {
                    self.emit(Op::Jump(next));
                }
            }
            StmtKind::Discard => self.emit(Op::Discard),
            StmtKind::Return(value) => {
                if let Some(value) = value {
                    self.g_expr(value);
                }
                self.emit(Op::Ret);
            }
            StmtKind::Block(block) => {
                for stmt in &block.stmts {
                    self.g_stmt(stmt);
                }
            }
        }
    }

    fn g_loop_body(&mut self, body: &Stmt<Typed>, next: Label, end: Label) {
        self.loops.push((next, end));
        self.g_stmt(body);
        self.loops.pop();
    }

    fn g_expr(&mut self, expr: &Expr<Typed>) {
        if !self.check_type(expr.info, expr.span) {
            return;
        }
        if fold::is_foldable(expr) {
            if let Some(literal) = fold::fold(expr) {
                return self.emit(Op::Push(literal));
            }
        }

        match &expr.kind {
            ExprKind::Literal(literal) => self.emit(Op::Push(*literal)),
            ExprKind::Var(id) => {
                let slot = self.slot(*id);
                self.emit(Op::Load(slot));
            }
            ExprKind::Unary { op, operand } if op.is_increment() => {
                let place = self.g_place(operand);
                self.g_load(&place);
                if matches!(op, UnaryOp::PreInc | UnaryOp::PreDec) {
                    self.g_step(*op, operand.info);
                    self.emit(Op::Dup);
                } else {
                    self.emit(Op::Dup);
                    self.g_step(*op, operand.info);
                }
                self.g_store(&place);
            }
            ExprKind::Unary { op, operand } => {
                self.g_expr(operand);
                match op {
                    UnaryOp::Neg => self.emit(Op::Neg),
                    UnaryOp::Not => self.emit(Op::Not),
                    _ => (),
                }
            }
            ExprKind::Binary {
                op: op @ (BinaryOp::And | BinaryOp::Or),
                lhs,
                rhs,
            } => {
                // Short circuit: the left operand is the result if it decides.
                let end = self.label();
                self.g_expr(lhs);
                self.emit(Op::Dup);
                if *op == BinaryOp::And {
                    self.emit(Op::JumpUnless(end));
                } else {
                    self.emit(Op::JumpIf(end));
                }
                self.emit(Op::Pop);
                self.g_expr(rhs);
                self.emit(Op::Label(end));
            }
            ExprKind::Binary { op, lhs, rhs } => {
                self.g_expr(lhs);
                self.g_expr(rhs);
                self.emit(Op::Binary(*op));
            }
            ExprKind::Call { args, callee, .. } => {
                for arg in args {
                    self.g_expr(arg);
                }
                match callee {
                    Callee::Builtin(builtin) if builtin.name == "sample" => self.emit(Op::Sample),
                    Callee::Builtin(builtin) => {
                        self.emit(Op::CallBuiltin(builtin.name, args.len()));
                    }
                    Callee::User(id) => {
                        let label = self.functions[id].clone();
                        self.emit(Op::Call(label, args.len()));
                    }
                }
            }
            ExprKind::Constructor { ty, args } => {
                for arg in args {
                    self.g_expr(arg);
                }
                self.emit(Op::Construct(*ty, args.len()));
            }
            ExprKind::Index { base, index } => {
                if let Some(slot) = self.array_slot(base) {
                    self.g_expr(index);
                    self.emit(Op::LoadElem(slot));
                } else {
                    self.g_expr(base);
                    self.g_expr(index);
                    self.emit(Op::Extract);
                }
            }
            ExprKind::Swizzle { base, swizzle } => {
                self.g_expr(base);
                self.emit(Op::Swizzle(*swizzle));
            }
            ExprKind::Conditional {
                condition,
                then_arm,
                else_arm,
            } => {
                let (otherwise, end) = (self.label(), self.label());
                self.g_expr(condition);
                self.emit(Op::JumpUnless(otherwise));
                self.g_expr(then_arm);
                self.emit(Op::Jump(end));
                self.emit(Op::Label(otherwise));
                self.g_expr(else_arm);
                self.emit(Op::Label(end));
            }
            ExprKind::Paren(inner) => self.g_expr(inner),
            ExprKind::Widen(inner) => {
                self.g_expr(inner);
                self.emit(Op::ToFloat);
            }
        }
    }

    /// Adds or subtracts one from the value on top of the stack.
    fn g_step(&mut self, op: UnaryOp, ty: Type) {
        let one = if ty.base() == BaseType::Int {
            Literal::Int(1)
        } else {
            Literal::Float(1.0)
        };
        self.emit(Op::Push(one));
        let op = match op {
            UnaryOp::PreInc | UnaryOp::PostInc => BinaryOp::Add,
            _ => BinaryOp::Sub,
        };
        self.emit(Op::Binary(op));
    }

    /// Resolves an assignment target. Index operands other than literals and
    /// variables are evaluated here, once, into temporaries.
    fn g_place<'e>(&mut self, target: &'e Expr<Typed>) -> Place<'e> {
        match &target.kind {
            ExprKind::Var(id) => {
                self.check_type(target.info, target.span);
                Place::Var(self.slot(*id))
            }
            ExprKind::Paren(inner) => self.g_place(inner),
            ExprKind::Swizzle { base, swizzle } => {
                Place::Swizzle(Box::new(self.g_place(base)), *swizzle)
            }
            ExprKind::Index { base, index } => match self.array_slot(base) {
                Some(slot) => Place::Elem(slot, self.g_pin(index)),
                None => {
                    let base = self.g_place(base);
                    Place::Lane(Box::new(base), self.g_pin(index))
                }
            },
            _ => unreachable!("assignment to a non-location: {target:?}"),
        }
    }

    fn g_pin<'e>(&mut self, index: &'e Expr<Typed>) -> Operand<'e> {
        match index.kind {
            ExprKind::Literal(_) | ExprKind::Var(_) => Operand::Expr(index),
            _ => {
                let temp = self.temp();
                self.g_expr(index);
                self.emit(Op::Store(temp));
                Operand::Temp(temp)
            }
        }
    }

    fn g_load(&mut self, place: &Place<'_>) {
        match place {
            Place::Var(slot) => self.emit(Op::Load(*slot)),
            Place::Swizzle(base, swizzle) => {
                self.g_load(base);
                self.emit(Op::Swizzle(*swizzle));
            }
            Place::Lane(base, index) => {
                self.g_load(base);
                self.g_operand(index);
                self.emit(Op::Extract);
            }
            Place::Elem(slot, index) => {
                self.g_operand(index);
                self.emit(Op::LoadElem(*slot));
            }
        }
    }

    /// Stores the value on top of the stack into `place`. Partial writes
    /// rebuild the enclosing value and store that.
    fn g_store(&mut self, place: &Place<'_>) {
        match place {
            Place::Var(slot) => self.emit(Op::Store(*slot)),
            Place::Swizzle(base, swizzle) => {
                self.g_load(base);
                self.emit(Op::InsertSwizzle(*swizzle));
                self.g_store(base);
            }
            Place::Lane(base, index) => {
                self.g_load(base);
                self.g_operand(index);
                self.emit(Op::InsertLane);
                self.g_store(base);
            }
            Place::Elem(slot, index) => {
                self.g_operand(index);
                self.emit(Op::StoreElem(*slot));
            }
        }
    }

    fn g_operand(&mut self, operand: &Operand<'_>) {
        match operand {
            Operand::Expr(expr) => self.g_expr(expr),
            Operand::Temp(slot) => self.emit(Op::Load(*slot)),
        }
    }
}

/// An assignable location.
enum Place<'e> {
    Var(Slot),
    Swizzle(Box<Place<'e>>, Swizzle),
    /// A lane of a vector.
    Lane(Box<Place<'e>>, Operand<'e>),
    /// An element of an array.
    Elem(Slot, Operand<'e>),
}

enum Operand<'e> {
    Expr(&'e Expr<Typed>),
    Temp(Slot),
}

/// Utility functions.
impl Generator<'_> {
    fn emit(&mut self, op: Op) {
        self.code.push(op);
    }

    fn label(&mut self) -> Label {
        let label = Label(self.labels);
        self.labels += 1;
        label
    }

    fn local(&mut self, id: SymbolId) -> Slot {
        let slot = Slot::Local(self.locals);
        self.locals += 1;
        self.slots.insert(id, slot);
        slot
    }

    /// A local slot with no name, for values computed once and read again.
    fn temp(&mut self) -> Slot {
        let slot = Slot::Local(self.locals);
        self.locals += 1;
        slot
    }

    fn slot(&self, id: SymbolId) -> Slot {
        if let Some(&slot) = self.slots.get(&id) {
            return slot;
        }
        let name = self.symbols.name(self.symbols.get(id).name);
        match builtins::variable(name) {
            Some(builtin) => Slot::Builtin(builtin.name),
            None => unreachable!("{name} has no slot"),
        }
    }

    fn array_slot(&self, expr: &Expr<Typed>) -> Option<Slot> {
        match expr.kind {
            ExprKind::Var(id) if self.symbols.get(id).array_len.is_some() => Some(self.slot(id)),
            _ => None,
        }
    }

    /// Reports matrix types, which the interpreter lacks. Returns whether
    /// `ty` is supported.
    fn check_type(&mut self, ty: Type, span: Span) -> bool {
        if ty.is_matrix() {
            tracing::trace!(%span, "matrix type");
            let target = Target::Bytecode;
            let construct = "matrix types";
            self.errors
                .push(span.wrap(Error::Unsupported { target, construct }));
            return false;
        }
        true
    }

    fn flush(&mut self, code: Vec<Op>) {
        for op in code {
            match op {
                Op::Label(_) => self.out(op),
                op => self.out(format_args!("    {op}")),
            }
        }
    }

    /// Prints a line.
    fn out(&mut self, line: impl fmt::Display) {
        writeln!(self.out, "{line}").expect("writing to a String can't fail");
    }
}
