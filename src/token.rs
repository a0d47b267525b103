use std::{fmt, ops::Range};

use crate::{lexer, types::Type};

#[derive(Copy, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    lo: usize,
    len: u32,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Token {
        Token {
            kind,
            len: span.len,
            lo: span.lo,
        }
    }

    /// Returns the end-of-stream token positioned at the end of `src`.
    pub fn eof_for(src: &str) -> Token {
        Token::new(TokenKind::Eof, Span::new_of_length(src.len(), 0))
    }

    pub fn span(&self) -> Span {
        Span {
            len: self.len,
            lo: self.lo,
        }
    }

    /// The source substring matched by this token.
    pub fn lexeme<'src>(&self, src: &'src str) -> &'src str {
        self.span().substr(src)
    }

    pub fn is_eof(&self) -> bool {
        self.kind == TokenKind::Eof
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Token({:?}, {})", self.kind, self.span())
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct Span {
    pub len: u32,
    pub lo: usize,
}

impl Span {
    pub fn new_of_bounds(Range { start: lo, end: hi }: Range<usize>) -> Span {
        debug_assert!(hi >= lo);
        let len = u32::try_from(hi - lo).expect("token longer than u32::MAX bytes");
        Self::new_of_length(lo, len)
    }

    pub const fn new_of_length(lo: usize, len: u32) -> Span {
        Span { len, lo }
    }

    pub fn hi(&self) -> usize {
        self.lo + self.len as usize
    }

    /// Returns a span which covers both `self` and `other`.
    pub fn to(self, other: Span) -> Span {
        let lo = self.lo.min(other.lo);
        let hi = self.hi().max(other.hi());
        Span::new_of_bounds(lo..hi)
    }

    pub fn substr(self, src: &str) -> &str {
        &src[self.lo..self.hi()]
    }

    pub fn wrap<T>(self, inner: T) -> Spanned<T> {
        Spanned { span: self, inner }
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Span({self}, len: {})", self.len)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lo = self.lo;
        let hi = self.hi();
        write!(f, "{lo}..{hi}")
    }
}

/// Some value (usually an error) tagged with the source region it refers to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Spanned<T> {
    pub span: Span,
    pub inner: T,
}

impl<T> Spanned<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Spanned<U> {
        Spanned {
            span: self.span,
            inner: f(self.inner),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TokenKind {
    If,
    Else,
    While,
    Do,
    For,
    Break,
    Continue,
    Discard,
    Return,
    Const,
    Param,
    True,
    False,
    /// A built-in type name, such as `float4` or `sampler`.
    Type(Type),

    Plus,
    Minus,
    Star,
    Slash,
    /// `!`
    Bang,
    /// `=`
    Assign,
    PlusAssign,
    MinusAssign,
    StarAssign,
    SlashAssign,
    PlusPlus,
    MinusMinus,
    EqEq,
    NotEq,
    Less,
    LessEq,
    Greater,
    GreaterEq,
    AndAnd,
    OrOr,
    /// `^^`, logical exclusive or.
    XorXor,
    Question,
    Colon,
    Semicolon,
    Comma,
    Dot,
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,

    Identifier,
    Int,
    Float,

    Whitespace,
    LineComment,
    BlockComment,
    Eof,
    Error(lexer::Error),
}

impl TokenKind {
    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            TokenKind::Whitespace | TokenKind::LineComment | TokenKind::BlockComment
        )
    }

    pub fn is_error(self) -> bool {
        matches!(self, TokenKind::Error(_))
    }
}

pub static KEYWORDS: phf::Map<&'static str, TokenKind> = phf::phf_map! {
    "if" => TokenKind::If,
    "else" => TokenKind::Else,
    "while" => TokenKind::While,
    "do" => TokenKind::Do,
    "for" => TokenKind::For,
    "break" => TokenKind::Break,
    "continue" => TokenKind::Continue,
    "discard" => TokenKind::Discard,
    "return" => TokenKind::Return,
    "const" => TokenKind::Const,
    "param" => TokenKind::Param,
    "true" => TokenKind::True,
    "false" => TokenKind::False,

    "void" => TokenKind::Type(Type::Void),
    "float" => TokenKind::Type(Type::Float),
    "float2" => TokenKind::Type(Type::Float2),
    "float3" => TokenKind::Type(Type::Float3),
    "float4" => TokenKind::Type(Type::Float4),
    "int" => TokenKind::Type(Type::Int),
    "int2" => TokenKind::Type(Type::Int2),
    "int3" => TokenKind::Type(Type::Int3),
    "int4" => TokenKind::Type(Type::Int4),
    "bool" => TokenKind::Type(Type::Bool),
    "bool2" => TokenKind::Type(Type::Bool2),
    "bool3" => TokenKind::Type(Type::Bool3),
    "bool4" => TokenKind::Type(Type::Bool4),
    "float2x2" => TokenKind::Type(Type::Float2x2),
    "float3x3" => TokenKind::Type(Type::Float3x3),
    "float4x4" => TokenKind::Type(Type::Float4x4),
    "sampler" => TokenKind::Type(Type::Sampler),
    "lsampler" => TokenKind::Type(Type::LSampler),
    "fsampler" => TokenKind::Type(Type::FSampler),
};
