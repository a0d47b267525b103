// program ::= item* EOF
// item ::= ['param'] ['const'] TYPE ID ['[' INT ']'] ['=' expr] ';'
//        | TYPE ID '(' [TYPE ID (',' TYPE ID)*] ')' block
// block ::= '{' stmt* '}'
// stmt ::= block
//        | 'if' '(' expr ')' stmt ['else' stmt]
//        | 'while' '(' expr ')' stmt
//        | 'do' stmt 'while' '(' expr ')' ';'
//        | 'for' '(' [decl | simple] ';' [expr] ';' [simple] ')' stmt
//        | 'break' ';' | 'continue' ';' | 'discard' ';'
//        | 'return' [expr] ';'
//        | decl ';'
//        | simple ';'
// decl ::= ['const'] TYPE ID ['[' INT ']'] ['=' expr]
// simple ::= expr [('=' | '+=' | '-=' | '*=' | '/=') expr]
// expr ::= or ['?' expr ':' expr]
// or ::= xor ('||' xor)*
// xor ::= and ('^^' and)*
// and ::= equality ('&&' equality)*
// equality ::= relational (('==' | '!=') relational)*
// relational ::= additive (('<' | '<=' | '>' | '>=') additive)*
// additive ::= multiplicative (('+' | '-') multiplicative)*
// multiplicative ::= unary (('*' | '/') unary)*
// unary ::= ('-' | '+' | '!' | '++' | '--') unary | postfix
// postfix ::= primary ('[' expr ']' | '.' ID | '++' | '--')*
// primary ::= INT | FLOAT | 'true' | 'false'
//           | ID | ID '(' [expr (',' expr)*] ')'
//           | TYPE '(' [expr (',' expr)*] ')'
//           | '(' expr ')'

use std::fmt;

use crate::{
    builtins::Builtin,
    symbols::{FunctionId, SymbolId},
    token::Span,
    types::Type,
    util::intern::Name,
};

/// Decorations carried by a tree. The parser builds [`Untyped`] trees; the
/// type checker turns them into [`Typed`] ones.
pub trait Info: Clone + fmt::Debug + PartialEq {
    /// Type of each expression.
    type Ty: Clone + fmt::Debug + PartialEq;
    /// Resolved target of each call.
    type Callee: Clone + fmt::Debug + PartialEq;
}

#[derive(Clone, Debug, PartialEq)]
pub struct Untyped;

impl Info for Untyped {
    type Ty = ();
    type Callee = ();
}

#[derive(Clone, Debug, PartialEq)]
pub struct Typed;

impl Info for Typed {
    type Ty = Type;
    type Callee = Callee;
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Callee {
    Builtin(&'static Builtin),
    User(FunctionId),
}

#[derive(Clone, Debug, PartialEq, Default)]
pub struct Program<I: Info> {
    pub items: Vec<Item<I>>,
}

impl<I: Info> Program<I> {
    pub fn functions(&self) -> impl Iterator<Item = &FunctionDef<I>> {
        self.items.iter().filter_map(|item| match item {
            Item::Function(f) => Some(f),
            Item::Global(_) => None,
        })
    }

    pub fn globals(&self) -> impl Iterator<Item = &Declaration<I>> {
        self.items.iter().filter_map(|item| match item {
            Item::Global(decl) => Some(decl),
            Item::Function(_) => None,
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Item<I: Info> {
    Global(Declaration<I>),
    Function(FunctionDef<I>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct FunctionDef<I: Info> {
    pub name: Ident,
    pub id: FunctionId,
    pub ret: Type,
    pub params: Vec<SymbolId>,
    pub body: Block<I>,
    pub span: Span,
}

/// A variable declaration. The declared type and qualifiers live in the
/// symbol table entry.
#[derive(Clone, Debug, PartialEq)]
pub struct Declaration<I: Info> {
    pub symbol: SymbolId,
    pub initializer: Option<Expr<I>>,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Block<I: Info> {
    pub stmts: Vec<Stmt<I>>,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Stmt<I: Info> {
    pub kind: StmtKind<I>,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq)]
pub enum StmtKind<I: Info> {
    Declaration(Declaration<I>),
    Assignment {
        target: Expr<I>,
        op: AssignOp,
        value: Expr<I>,
    },
    Expr(Expr<I>),
    If {
        condition: Expr<I>,
        then_branch: Box<Stmt<I>>,
        else_branch: Option<Box<Stmt<I>>>,
    },
    While {
        condition: Expr<I>,
        body: Box<Stmt<I>>,
    },
    DoWhile {
        body: Box<Stmt<I>>,
        condition: Expr<I>,
    },
    For {
        init: Option<Box<Stmt<I>>>,
        condition: Option<Expr<I>>,
        step: Option<Box<Stmt<I>>>,
        body: Box<Stmt<I>>,
    },
    Break,
    Continue,
    Discard,
    Return(Option<Expr<I>>),
    Block(Block<I>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Expr<I: Info> {
    pub kind: ExprKind<I>,
    pub span: Span,
    pub info: I::Ty,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ExprKind<I: Info> {
    Literal(Literal),
    Var(SymbolId),
    Unary {
        op: UnaryOp,
        operand: Box<Expr<I>>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr<I>>,
        rhs: Box<Expr<I>>,
    },
    Call {
        name: Ident,
        args: Vec<Expr<I>>,
        callee: I::Callee,
    },
    /// `float4(...)` and friends.
    Constructor {
        ty: Type,
        args: Vec<Expr<I>>,
    },
    Index {
        base: Box<Expr<I>>,
        index: Box<Expr<I>>,
    },
    Swizzle {
        base: Box<Expr<I>>,
        swizzle: Swizzle,
    },
    Conditional {
        condition: Box<Expr<I>>,
        then_arm: Box<Expr<I>>,
        else_arm: Box<Expr<I>>,
    },
    Paren(Box<Expr<I>>),
    /// Implicit int to float conversion, made explicit by the type checker.
    Widen(Box<Expr<I>>),
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Literal {
    Int(i32),
    Float(f32),
    Bool(bool),
}

impl Literal {
    pub fn ty(self) -> Type {
        match self {
            Literal::Int(_) => Type::Int,
            Literal::Float(_) => Type::Float,
            Literal::Bool(_) => Type::Bool,
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Int(i) => write!(f, "{i}"),
            // Always print a decimal point so the text lexes back as a float.
            Literal::Float(x) if x.fract() == 0.0 && x.abs() < 1e9 => write!(f, "{x:.1}"),
            Literal::Float(x) => write!(f, "{x:?}"),
            Literal::Bool(b) => write!(f, "{b}"),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Plus,
    Not,
    PreInc,
    PreDec,
    PostInc,
    PostDec,
}

impl UnaryOp {
    pub fn is_increment(self) -> bool {
        matches!(
            self,
            UnaryOp::PreInc | UnaryOp::PreDec | UnaryOp::PostInc | UnaryOp::PostDec
        )
    }

    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Plus => "+",
            UnaryOp::Not => "!",
            UnaryOp::PreInc | UnaryOp::PostInc => "++",
            UnaryOp::PreDec | UnaryOp::PostDec => "--",
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    EqEq,
    NotEq,
    Less,
    LessEq,
    Greater,
    GreaterEq,
    And,
    Or,
    Xor,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::EqEq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::Less => "<",
            BinaryOp::LessEq => "<=",
            BinaryOp::Greater => ">",
            BinaryOp::GreaterEq => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::Xor => "^^",
        }
    }

    pub fn is_arithmetic(self) -> bool {
        matches!(
            self,
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div
        )
    }

    pub fn is_relational(self) -> bool {
        matches!(
            self,
            BinaryOp::Less | BinaryOp::LessEq | BinaryOp::Greater | BinaryOp::GreaterEq
        )
    }

    pub fn is_equality(self) -> bool {
        matches!(self, BinaryOp::EqEq | BinaryOp::NotEq)
    }

    pub fn is_logical(self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or | BinaryOp::Xor)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    Add,
    Sub,
    Mul,
    Div,
}

impl AssignOp {
    /// The arithmetic performed by a compound assignment.
    pub fn binary(self) -> Option<BinaryOp> {
        match self {
            AssignOp::Assign => None,
            AssignOp::Add => Some(BinaryOp::Add),
            AssignOp::Sub => Some(BinaryOp::Sub),
            AssignOp::Mul => Some(BinaryOp::Mul),
            AssignOp::Div => Some(BinaryOp::Div),
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            AssignOp::Assign => "=",
            AssignOp::Add => "+=",
            AssignOp::Sub => "-=",
            AssignOp::Mul => "*=",
            AssignOp::Div => "/=",
        }
    }
}

/// Component selection such as `.xy` or `.bgra`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Swizzle {
    pub set: SwizzleSet,
    lanes: [u8; 4],
    len: u8,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SwizzleSet {
    Xyzw,
    Rgba,
}

impl SwizzleSet {
    fn letters(self) -> &'static [u8; 4] {
        match self {
            SwizzleSet::Xyzw => b"xyzw",
            SwizzleSet::Rgba => b"rgba",
        }
    }
}

impl Swizzle {
    /// Parses a selector. All letters must come from the same set and there
    /// may be at most four of them.
    pub fn parse(selector: &str) -> Option<Swizzle> {
        let bytes = selector.as_bytes();
        if bytes.is_empty() || bytes.len() > 4 {
            return None;
        }
        let set = [SwizzleSet::Xyzw, SwizzleSet::Rgba]
            .into_iter()
            .find(|set| set.letters().contains(&bytes[0]))?;
        let mut lanes = [0; 4];
        for (lane, c) in lanes.iter_mut().zip(bytes) {
            let pos = set.letters().iter().position(|l| l == c)?;
            *lane = u8::try_from(pos).ok()?;
        }
        Some(Swizzle {
            set,
            lanes,
            len: u8::try_from(bytes.len()).ok()?,
        })
    }

    pub fn lanes(&self) -> &[u8] {
        &self.lanes[..self.len as usize]
    }

    pub fn len(&self) -> u8 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Highest lane referenced.
    pub fn max_lane(&self) -> u8 {
        self.lanes().iter().copied().max().unwrap_or(0)
    }

    /// Whether no lane is selected twice, which is required to assign
    /// through the swizzle.
    pub fn is_distinct(&self) -> bool {
        let lanes = self.lanes();
        lanes
            .iter()
            .enumerate()
            .all(|(i, l)| !lanes[i + 1..].contains(l))
    }
}

impl fmt::Display for Swizzle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letters = self.set.letters();
        for &lane in self.lanes() {
            write!(f, "{}", letters[lane as usize] as char)?;
        }
        Ok(())
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Ident {
    pub name: Name,
    pub span: Span,
}

impl From<Ident> for Name {
    fn from(value: Ident) -> Self {
        value.name
    }
}

impl From<&Ident> for Name {
    fn from(value: &Ident) -> Self {
        value.name
    }
}
