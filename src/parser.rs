use crate::{
    ast::{
        AssignOp, BinaryOp, Block, Declaration, Expr, ExprKind, FunctionDef, Ident, Item, Literal,
        Program, Stmt, StmtKind, Swizzle, UnaryOp, Untyped,
    },
    lexer::{self, extract},
    symbols::{self, Qualifier, Signature, SymbolId, SymbolTable, VarDecl},
    token::{Span, Spanned, Token, TokenKind},
    types::Type,
};

type Result<T, E = Spanned<Error>> = std::result::Result<T, E>;

pub type ParseResult<T> = Result<T>;

/// Default bound on how deeply statements and expressions may nest. Every
/// phase recurses once per level, and the bound keeps the deepest accepted
/// program within a 2 MiB stack.
pub const DEFAULT_MAX_DEPTH: usize = 128;

pub fn parse_program(
    src: &str,
    tokens: &mut Vec<Token>,
    symbols: &mut SymbolTable,
    max_depth: usize,
) -> ParseResult<Program<Untyped>> {
    parse(src, tokens, symbols, max_depth, Parser::parse_program)
}

/// Parses a single expression, which must span the whole input.
pub fn parse_expr(
    src: &str,
    tokens: &mut Vec<Token>,
    symbols: &mut SymbolTable,
    max_depth: usize,
) -> ParseResult<Expr<Untyped>> {
    parse(src, tokens, symbols, max_depth, |p| {
        let expr = p.parse_expr()?;
        p.consume(TokenKind::Eof)?;
        Ok(expr)
    })
}

fn parse<'src, 'tok, 'sym, T>(
    src: &'src str,
    tokens: &'tok mut Vec<Token>,
    symbols: &'sym mut SymbolTable,
    max_depth: usize,
    f: impl for<'a> FnOnce(&'a mut Parser<'src, 'tok, 'sym>) -> Result<T>,
) -> ParseResult<T> {
    assert!(tokens.is_empty());

    lexer::lex(src, tokens);
    let tokens: &'tok Vec<Token> = tokens;
    let scope_depth = symbols.depth();
    let mut p = Parser::new(src, tokens, symbols, max_depth);
    let result = f(&mut p);
    debug_assert_eq!(p.symbols.depth(), scope_depth, "unbalanced scopes");
    result
}

struct Parser<'src, 'tok, 'sym> {
    src: &'src str,
    tokens: &'tok [Token],
    symbols: &'sym mut SymbolTable,
    cursor: usize,
    depth: usize,
    max_depth: usize,
}

impl Parser<'_, '_, '_> {
    fn parse_program(&mut self) -> Result<Program<Untyped>> {
        let mut items = Vec::with_capacity(8);
        while self.except([]) {
            items.push(self.parse_item()?);
        }
        self.consume(TokenKind::Eof)?;
        tracing::debug!(items = items.len(), "parsed program");
        Ok(Program { items })
    }

    fn parse_item(&mut self) -> Result<Item<Untyped>> {
        let start = self.peek().span();
        let qualifier = self.parse_qualifier();
        let ty = self.parse_type()?;
        let name = self.consume(TokenKind::Identifier)?;

        if qualifier == Qualifier::None && self.is(TokenKind::LParen) {
            return self.parse_function(start, ty, name).map(Item::Function);
        }

        let decl = self.parse_declaration_rest(start, qualifier, ty, name)?;
        self.consume(TokenKind::Semicolon)?;
        Ok(Item::Global(decl))
    }

    fn parse_function(&mut self, start: Span, ret: Type, name: Token) -> Result<FunctionDef<Untyped>> {
        let name = self.parse_ident(name);
        self.consume(TokenKind::LParen)?;

        // Parameters and the outermost locals of the body share a scope.
        self.scoped(|p| {
            let params = if p.is(TokenKind::Type(Type::Void)) {
                p.advance();
                p.consume(TokenKind::RParen)?;
                Vec::new()
            } else {
                let (params, _) =
                    p.parse_list(TokenKind::RParen, TokenKind::Comma, Parser::parse_param)?;
                params
            };
            let body = p.parse_block_in_current_scope()?;

            let signature = Signature {
                params: params.iter().map(|&id| p.symbols.get(id).ty).collect(),
                ret,
            };
            let id = p
                .symbols
                .declare_function(name.name, signature, name.span)
                .map_err(|e| name.span.wrap(Error::Symbol(e)))?;

            let span = start.to(body.span);
            Ok(FunctionDef {
                name,
                id,
                ret,
                params,
                body,
                span,
            })
        })
    }

    fn parse_param(&mut self) -> Result<SymbolId> {
        let ty = self.parse_type()?;
        let name = self.consume(TokenKind::Identifier)?;
        self.declare(VarDecl::new(extract::ident(name, self.src), ty).span(name.span()))
    }

    fn parse_qualifier(&mut self) -> Qualifier {
        if self.take(TokenKind::Param) {
            Qualifier::Param
        } else if self.take(TokenKind::Const) {
            Qualifier::Const
        } else {
            Qualifier::None
        }
    }

    /// Parses what follows `qualifier type name` in a variable declaration and
    /// declares the variable. The initializer is parsed before the
    /// declaration, so `float x = x;` refers to an outer `x`.
    fn parse_declaration_rest(
        &mut self,
        start: Span,
        qualifier: Qualifier,
        ty: Type,
        name: Token,
    ) -> Result<Declaration<Untyped>> {
        let mut end = name.span();

        let array_len = if self.take(TokenKind::LBracket) {
            let len = self.consume(TokenKind::Int)?;
            let parsed = extract::int(len, self.src)
                .ok()
                .and_then(|n| u32::try_from(n).ok())
                .filter(|&n| n > 0)
                .ok_or(len.span().wrap(Error::InvalidArrayLength))?;
            end = self.consume(TokenKind::RBracket)?.span();
            Some(parsed)
        } else {
            None
        };

        let initializer = if self.take(TokenKind::Assign) {
            let expr = self.parse_expr()?;
            end = expr.span;
            Some(expr)
        } else {
            None
        };

        let decl = VarDecl::new(extract::ident(name, self.src), ty)
            .qualifier(qualifier)
            .array_len(array_len)
            .span(name.span());
        let symbol = self.declare(decl)?;

        Ok(Declaration {
            symbol,
            initializer,
            span: start.to(end),
        })
    }

    fn parse_type(&mut self) -> Result<Type> {
        let token = self.peek();
        match token.kind {
            TokenKind::Type(ty) => {
                self.advance();
                Ok(ty)
            }
            TokenKind::Error(error) => Err(token.span().wrap(Error::Lexical(error))),
            actual => Err(token.span().wrap(Error::ExpectedType { actual })),
        }
    }

    fn parse_ident(&mut self, token: Token) -> Ident {
        Ident {
            name: self.symbols.intern(extract::ident(token, self.src)),
            span: token.span(),
        }
    }

    fn parse_block(&mut self) -> Result<Block<Untyped>> {
        self.scoped(Parser::parse_block_in_current_scope)
    }

    fn parse_block_in_current_scope(&mut self) -> Result<Block<Untyped>> {
        let open = self.consume(TokenKind::LBrace)?;
        let mut stmts = Vec::new();
        while self.except([TokenKind::RBrace]) {
            stmts.push(self.parse_stmt()?);
        }
        let close = self.consume(TokenKind::RBrace)?;
        Ok(Block {
            stmts,
            span: open.span().to(close.span()),
        })
    }

    fn parse_stmt(&mut self) -> Result<Stmt<Untyped>> {
        self.nested(Parser::parse_stmt_inner)
    }

    fn parse_stmt_inner(&mut self) -> Result<Stmt<Untyped>> {
        let token = self.peek();
        let start = token.span();
        let (kind, end) = match token.kind {
            TokenKind::LBrace => {
                let block = self.parse_block()?;
                let span = block.span;
                (StmtKind::Block(block), span)
            }

            TokenKind::If => {
                self.advance();
                let condition = self.parse_condition()?;
                let then_branch = self.parse_sub_stmt()?;
                let mut end = then_branch.span;
                let else_branch = if self.take(TokenKind::Else) {
                    let else_branch = self.parse_sub_stmt()?;
                    end = else_branch.span;
                    Some(else_branch)
                } else {
                    None
                };
                let kind = StmtKind::If {
                    condition,
                    then_branch,
                    else_branch,
                };
                (kind, end)
            }

            TokenKind::While => {
                self.advance();
                let condition = self.parse_condition()?;
                let body = self.parse_sub_stmt()?;
                let end = body.span;
                (StmtKind::While { condition, body }, end)
            }

            TokenKind::Do => {
                self.advance();
                let body = self.parse_sub_stmt()?;
                self.consume(TokenKind::While)?;
                let condition = self.parse_condition()?;
                let end = self.consume(TokenKind::Semicolon)?.span();
                (StmtKind::DoWhile { body, condition }, end)
            }

            TokenKind::For => {
                self.advance();
                self.consume(TokenKind::LParen)?;
                // The init declaration is only visible inside the loop.
                self.scoped(|p| {
                    let init = if p.is(TokenKind::Semicolon) {
                        None
                    } else {
                        Some(Box::new(p.parse_simple_or_declaration()?))
                    };
                    p.consume(TokenKind::Semicolon)?;
                    let condition = if p.is(TokenKind::Semicolon) {
                        None
                    } else {
                        Some(p.parse_expr()?)
                    };
                    p.consume(TokenKind::Semicolon)?;
                    let step = if p.is(TokenKind::RParen) {
                        None
                    } else {
                        Some(Box::new(p.parse_simple()?))
                    };
                    p.consume(TokenKind::RParen)?;
                    let body = p.parse_sub_stmt()?;
                    let end = body.span;
                    let kind = StmtKind::For {
                        init,
                        condition,
                        step,
                        body,
                    };
                    Ok((kind, end))
                })?
            }

            kind @ (TokenKind::Break | TokenKind::Continue | TokenKind::Discard) => {
                self.advance();
                let end = self.consume(TokenKind::Semicolon)?.span();
                let kind = match kind {
                    TokenKind::Break => StmtKind::Break,
                    TokenKind::Continue => StmtKind::Continue,
                    TokenKind::Discard => StmtKind::Discard,
                    _ => unreachable!(),
                };
                (kind, end)
            }

            TokenKind::Return => {
                self.advance();
                let value = if self.is(TokenKind::Semicolon) {
                    None
                } else {
                    Some(self.parse_expr()?)
                };
                let end = self.consume(TokenKind::Semicolon)?.span();
                (StmtKind::Return(value), end)
            }

            _ => {
                let stmt = self.parse_simple_or_declaration()?;
                let end = self.consume(TokenKind::Semicolon)?.span();
                (stmt.kind, end)
            }
        };

        Ok(Stmt {
            kind,
            span: start.to(end),
        })
    }

    /// Parses the statement under an `if`, a loop or an `else`, in a scope of
    /// its own.
    fn parse_sub_stmt(&mut self) -> Result<Box<Stmt<Untyped>>> {
        self.scoped(Parser::parse_stmt).map(Box::new)
    }

    /// `'(' expr ')'`
    fn parse_condition(&mut self) -> Result<Expr<Untyped>> {
        self.consume(TokenKind::LParen)?;
        let condition = self.parse_expr()?;
        self.consume(TokenKind::RParen)?;
        Ok(condition)
    }

    /// A declaration or a simple statement, without the trailing semicolon.
    fn parse_simple_or_declaration(&mut self) -> Result<Stmt<Untyped>> {
        match self.peek().kind {
            TokenKind::Type(_) | TokenKind::Const | TokenKind::Param => {
                let start = self.peek().span();
                let qualifier = self.parse_qualifier();
                let ty = self.parse_type()?;
                let name = self.consume(TokenKind::Identifier)?;
                let decl = self.parse_declaration_rest(start, qualifier, ty, name)?;
                Ok(Stmt {
                    span: decl.span,
                    kind: StmtKind::Declaration(decl),
                })
            }
            _ => self.parse_simple(),
        }
    }

    /// An assignment or an expression statement, without the trailing
    /// semicolon.
    fn parse_simple(&mut self) -> Result<Stmt<Untyped>> {
        let target = self.parse_expr()?;
        let op = match self.peek().kind {
            TokenKind::Assign => AssignOp::Assign,
            TokenKind::PlusAssign => AssignOp::Add,
            TokenKind::MinusAssign => AssignOp::Sub,
            TokenKind::StarAssign => AssignOp::Mul,
            TokenKind::SlashAssign => AssignOp::Div,
            _ => {
                return Ok(Stmt {
                    span: target.span,
                    kind: StmtKind::Expr(target),
                });
            }
        };
        self.advance();
        let value = self.parse_expr()?;
        Ok(Stmt {
            span: target.span.to(value.span),
            kind: StmtKind::Assignment { target, op, value },
        })
    }

    fn parse_expr(&mut self) -> Result<Expr<Untyped>> {
        self.nested(Parser::parse_conditional)
    }

    fn parse_conditional(&mut self) -> Result<Expr<Untyped>> {
        let condition = self.parse_binary(0)?;
        if !self.take(TokenKind::Question) {
            return Ok(condition);
        }
        let then_arm = self.parse_expr()?;
        self.consume(TokenKind::Colon)?;
        let else_arm = self.parse_expr()?;

        let span = condition.span.to(else_arm.span);
        let kind = ExprKind::Conditional {
            condition: Box::new(condition),
            then_arm: Box::new(then_arm),
            else_arm: Box::new(else_arm),
        };
        Ok(expr(kind, span))
    }

    /// Parses binary operators by binding power. Every binary operator is
    /// left associative.
    fn parse_binary(&mut self, min_bp: u8) -> Result<Expr<Untyped>> {
        let mut lhs = self.parse_unary()?;
        while let Some((op, (lbp, rbp))) = Self::infix_binding_power(self.peek().kind) {
            if lbp < min_bp {
                break;
            }
            self.advance();
            let rhs = self.parse_binary(rbp)?;
            let span = lhs.span.to(rhs.span);
            let kind = ExprKind::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
            lhs = expr(kind, span);
        }
        Ok(lhs)
    }

    fn infix_binding_power(kind: TokenKind) -> Option<(BinaryOp, (u8, u8))> {
        use BinaryOp::*;
        let op_bp = match kind {
            TokenKind::OrOr => (Or, (1, 2)),
            TokenKind::XorXor => (Xor, (3, 4)),
            TokenKind::AndAnd => (And, (5, 6)),
            TokenKind::EqEq => (EqEq, (7, 8)),
            TokenKind::NotEq => (NotEq, (7, 8)),
            TokenKind::Less => (Less, (9, 10)),
            TokenKind::LessEq => (LessEq, (9, 10)),
            TokenKind::Greater => (Greater, (9, 10)),
            TokenKind::GreaterEq => (GreaterEq, (9, 10)),
            TokenKind::Plus => (Add, (11, 12)),
            TokenKind::Minus => (Sub, (11, 12)),
            TokenKind::Star => (Mul, (13, 14)),
            TokenKind::Slash => (Div, (13, 14)),
            _ => return None,
        };
        Some(op_bp)
    }

    fn parse_unary(&mut self) -> Result<Expr<Untyped>> {
        let token = self.peek();
        let op = match token.kind {
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Plus => UnaryOp::Plus,
            TokenKind::Bang => UnaryOp::Not,
            TokenKind::PlusPlus => UnaryOp::PreInc,
            TokenKind::MinusMinus => UnaryOp::PreDec,
            _ => return self.parse_postfix(),
        };
        self.advance();
        let operand = self.nested(Parser::parse_unary)?;
        let span = token.span().to(operand.span);
        let kind = ExprKind::Unary {
            op,
            operand: Box::new(operand),
        };
        Ok(expr(kind, span))
    }

    fn parse_postfix(&mut self) -> Result<Expr<Untyped>> {
        let mut base = self.parse_primary()?;
        loop {
            let start = base.span;
            let token = self.peek();
            let (kind, end) = match token.kind {
                TokenKind::LBracket => {
                    self.advance();
                    let index = self.parse_expr()?;
                    let end = self.consume(TokenKind::RBracket)?.span();
                    let kind = ExprKind::Index {
                        base: Box::new(base),
                        index: Box::new(index),
                    };
                    (kind, end)
                }
                TokenKind::Dot => {
                    self.advance();
                    let field = self.consume(TokenKind::Identifier)?;
                    let Some(swizzle) = Swizzle::parse(extract::ident(field, self.src)) else {
                        return Err(field.span().wrap(Error::InvalidSwizzle));
                    };
                    let kind = ExprKind::Swizzle {
                        base: Box::new(base),
                        swizzle,
                    };
                    (kind, field.span())
                }
                kind @ (TokenKind::PlusPlus | TokenKind::MinusMinus) => {
                    self.advance();
                    let op = if kind == TokenKind::PlusPlus {
                        UnaryOp::PostInc
                    } else {
                        UnaryOp::PostDec
                    };
                    let kind = ExprKind::Unary {
                        op,
                        operand: Box::new(base),
                    };
                    (kind, token.span())
                }
                _ => break,
            };
            base = expr(kind, start.to(end));
        }
        Ok(base)
    }

    fn parse_primary(&mut self) -> Result<Expr<Untyped>> {
        let token = self.advance();
        let span = token.span();
        let (kind, span) = match token.kind {
            TokenKind::Int => {
                let Ok(parsed) = extract::int(token, self.src) else {
                    return Err(span.wrap(Error::ParseInt));
                };
                (ExprKind::Literal(Literal::Int(parsed)), span)
            }
            TokenKind::Float => {
                let parsed = extract::float(token, self.src)
                    .ok()
                    .filter(|f| f.is_finite())
                    .ok_or(span.wrap(Error::ParseFloat))?;
                (ExprKind::Literal(Literal::Float(parsed)), span)
            }
            TokenKind::True => (ExprKind::Literal(Literal::Bool(true)), span),
            TokenKind::False => (ExprKind::Literal(Literal::Bool(false)), span),

            // Call: ID ( [expr [, expr]*] ), resolved by the type checker.
            TokenKind::Identifier if self.is(TokenKind::LParen) => {
                let name = self.parse_ident(token);
                self.advance();
                let (args, end) =
                    self.parse_list(TokenKind::RParen, TokenKind::Comma, Parser::parse_expr)?;
                let call = ExprKind::Call {
                    name,
                    args,
                    callee: (),
                };
                (call, span.to(end.span()))
            }

            // Variable reference, resolved right away.
            TokenKind::Identifier => {
                let name = self.parse_ident(token);
                let symbol = self
                    .symbols
                    .resolve(name.name)
                    .map_err(|e| span.wrap(Error::Symbol(e)))?;
                (ExprKind::Var(symbol), span)
            }

            // Constructor: TYPE ( [expr [, expr]*] )
            TokenKind::Type(ty) => {
                self.consume(TokenKind::LParen)?;
                let (args, end) =
                    self.parse_list(TokenKind::RParen, TokenKind::Comma, Parser::parse_expr)?;
                (ExprKind::Constructor { ty, args }, span.to(end.span()))
            }

            TokenKind::LParen => {
                let inner = self.parse_expr()?;
                let end = self.consume(TokenKind::RParen)?;
                (ExprKind::Paren(Box::new(inner)), span.to(end.span()))
            }

            TokenKind::Error(error) => return Err(span.wrap(Error::Lexical(error))),

            other => {
                let error = Error::UnexpectedTokenInExpr {
                    token: other,
                    expected: OPERAND_START,
                };
                return Err(span.wrap(error));
            }
        };
        Ok(expr(kind, span))
    }

    /// Parses `item (separator item)*` followed by `end`, which is consumed
    /// and returned.
    fn parse_list<T>(
        &mut self,
        end: TokenKind,
        separator: TokenKind,
        parse_item: impl Fn(&mut Self) -> Result<T>,
    ) -> Result<(Vec<T>, Token)> {
        debug_assert_ne!(end, separator);

        let mut items = Vec::new();
        if !self.is(end) {
            loop {
                items.push(parse_item(self)?);
                if self.take(separator) {
                    continue;
                }
                if self.is(end) {
                    break;
                }
                let c = self.peek();
                return Err(c.span().wrap(Error::UnexpectedAny {
                    actual: c.kind,
                    expected: Box::from([separator, end]),
                }));
            }
        }
        let end = self.consume(end)?;
        Ok((items, end))
    }
}

impl Parser<'_, '_, '_> {
    fn new<'src, 'tok, 'sym>(
        src: &'src str,
        tokens: &'tok [Token],
        symbols: &'sym mut SymbolTable,
        max_depth: usize,
    ) -> Parser<'src, 'tok, 'sym> {
        let mut p = Parser {
            src,
            tokens,
            symbols,
            cursor: 0,
            depth: 0,
            max_depth,
        };
        p.setup();
        p
    }

    /// Setups the parser, skipping any trivia if necessary.
    fn setup(&mut self) {
        while self.peek().kind.is_trivia() {
            self.advance();
        }
    }

    /// Runs `f` inside a new scope. The scope is popped on every exit path,
    /// so a failed production leaves the table as it found it.
    fn scoped<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        self.symbols.push_scope();
        let result = f(self);
        self.symbols.pop_scope();
        result
    }

    /// Runs `f` one nesting level deeper, failing once the maximum depth is
    /// exceeded.
    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        if self.depth >= self.max_depth {
            let max = self.max_depth;
            return Err(self.peek().span().wrap(Error::NestingTooDeep { max }));
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    fn declare(&mut self, decl: VarDecl<'_>) -> Result<SymbolId> {
        let span = decl.span;
        self.symbols
            .declare_variable(decl)
            .map_err(|e| span.wrap(Error::Symbol(e)))
    }

    /// Returns the current token.
    #[inline]
    fn peek(&self) -> Token {
        match self.tokens.get(self.cursor) {
            Some(token) => *token,
            None => Token::eof_for(self.src),
        }
    }

    /// Returns the current token and advances. Skips any trivia.
    fn advance(&mut self) -> Token {
        let c = self.peek(); // Before any advancement
        while {
            self.cursor += 1;
            self.peek().kind.is_trivia()
        } {}
        c
    }

    /// Checks whether the current token matches the given one.
    fn is(&self, expect: TokenKind) -> bool {
        self.peek().kind == expect
    }

    /// Advances if the current token matches the provided one, returning true.
    /// If not, returns false and doesn't advance.
    fn take(&mut self, expect: TokenKind) -> bool {
        if self.is(expect) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Advances if the current token matches the provided one. If not, fails
    /// with the offending token.
    fn consume(&mut self, expect: TokenKind) -> Result<Token> {
        let c = self.peek();
        if self.is(expect) {
            self.advance();
            Ok(c)
        } else {
            Err(c.span().wrap(Error::Unexpected {
                actual: c.kind,
                expected: expect,
            }))
        }
    }

    /// Returns true while the current token does *not* match one of the
    /// provided ones. [`TokenKind::Eof`] is implicitly included in the list.
    ///
    /// This won't advance the cursor.
    fn except(&self, except: impl IntoIterator<Item = TokenKind>) -> bool {
        let c = self.peek().kind;
        c != TokenKind::Eof && except.into_iter().all(|e| c != e)
    }
}

/// Tokens which may start an operand, other than types.
const OPERAND_START: &[TokenKind] = &[
    TokenKind::Identifier,
    TokenKind::Int,
    TokenKind::Float,
    TokenKind::True,
    TokenKind::False,
    TokenKind::LParen,
    TokenKind::Minus,
    TokenKind::Plus,
    TokenKind::Bang,
    TokenKind::PlusPlus,
    TokenKind::MinusMinus,
];

fn expr(kind: ExprKind<Untyped>, span: Span) -> Expr<Untyped> {
    Expr {
        kind,
        span,
        info: (),
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// An error token in a position where an operand, a type or a statement
    /// was expected.
    Lexical(lexer::Error),
    UnexpectedTokenInExpr {
        token: TokenKind,
        /// Besides any type, which starts a constructor.
        expected: &'static [TokenKind],
    },
    Unexpected {
        actual: TokenKind,
        expected: TokenKind,
    },
    UnexpectedAny {
        actual: TokenKind,
        expected: Box<[TokenKind]>,
    },
    ExpectedType {
        actual: TokenKind,
    },
    ParseInt,
    ParseFloat,
    InvalidSwizzle,
    InvalidArrayLength,
    NestingTooDeep {
        max: usize,
    },
    Symbol(symbols::Error),
}

#[cfg(test)]
mod tests {
    use crate::util::test_utils::tree_tests;

    tree_tests!(
        use parser;

        fn test_equality_is_eqeq() {
            let expr = "foo == 3";
            let tree_ok = "
                binary EqEq (0..8)
                  var foo (0..3)
                  int 3 (7..8)
            ";
        }

        fn test_inequality_is_noteq() {
            let expr = "foo != 3";
            let tree_ok = "
                binary NotEq (0..8)
                  var foo (0..3)
                  int 3 (7..8)
            ";
        }

        fn test_illegal_operator_is_a_syntax_error() {
            let expr = "foo @ 3";
            let expected_errors = &["4..5: expected token Eof, but got Error(UnexpectedChar)"];
        }

        fn test_equality_folds_left() {
            let expr = "a == b != flag";
            let tree_ok = "
                binary NotEq (0..14)
                  binary EqEq (0..6)
                    var a (0..1)
                    var b (5..6)
                  var flag (10..14)
            ";
        }

        fn test_precedence_ladder() {
            let expr = "a + b * c < d || flag && !flag";
            let tree_ok = "
                binary Or (0..30)
                  binary Less (0..13)
                    binary Add (0..9)
                      var a (0..1)
                      binary Mul (4..9)
                        var b (4..5)
                        var c (8..9)
                    var d (12..13)
                  binary And (17..30)
                    var flag (17..21)
                    unary Not (25..30)
                      var flag (26..30)
            ";
        }

        fn test_xor_binds_between_or_and_and() {
            let expr = "flag || flag ^^ flag && flag";
            let tree_ok = "
                binary Or (0..28)
                  var flag (0..4)
                  binary Xor (8..28)
                    var flag (8..12)
                    binary And (16..28)
                      var flag (16..20)
                      var flag (24..28)
            ";
        }

        fn test_conditional_is_right_associative() {
            let expr = "flag ? a : flag ? b : c";
            let tree_ok = "
                conditional (0..23)
                  var flag (0..4)
                  var a (7..8)
                  conditional (11..23)
                    var flag (11..15)
                    var b (18..19)
                    var c (22..23)
            ";
        }

        fn test_comma_is_not_an_operator() {
            let expr = "(1, 2.5)";
            let expected_errors = &["2..3: expected token RParen, but got Comma"];
        }

        fn test_float_literal_forms() {
            let expr = "float3(.5, 1., 2e1)";
            let tree_ok = "
                constructor float3 (0..19)
                  float 0.5 (7..9)
                  float 1.0 (11..13)
                  float 20.0 (15..18)
            ";
        }

        fn test_postfix_chain() {
            let expr = "v.xy[i]++";
            let tree_ok = "
                unary PostInc (0..9)
                  index (0..7)
                    swizzle xy (0..4)
                      var v (0..1)
                    var i (5..6)
            ";
        }

        fn test_prefix_operators() {
            let expr = "-++i";
            let tree_ok = "
                unary Neg (0..4)
                  unary PreInc (1..4)
                    var i (3..4)
            ";
        }

        fn test_call_is_not_resolved_while_parsing() {
            let expr = "mix(v, sample(tex, pos0), 0.5)";
            let tree_ok = "
                call mix (0..30)
                  var v (4..5)
                  call sample (7..24)
                    var tex (14..17)
                    var pos0 (19..23)
                  float 0.5 (26..29)
            ";
        }

        fn test_unknown_variable() {
            let expr = "a + nope";
            let expected_errors = &["4..8: nope is not declared"];
        }

        fn test_invalid_swizzle() {
            let expr = "v.xg";
            let expected_errors = &["2..4: invalid component selection"];
        }

        fn test_error_token_as_operand_is_lexical() {
            let expr = "a + 6foo";
            let expected_errors = &["4..8: malformed number"];
        }

        fn test_unexpected_token_in_expr() {
            let expr = "a + ;";
            let expected_errors = &[
                "4..5: unexpected token Semicolon in expression, expected a type or one of \
                 [Identifier, Int, Float, True, False, LParen, Minus, Plus, Bang, PlusPlus, \
                 MinusMinus]",
            ];
        }

        fn test_unclosed_paren() {
            let expr = "(a + b";
            let expected_errors = &["6..6: expected token RParen, but got Eof"];
        }

        fn test_argument_list_separator() {
            let expr = "max(a b)";
            let expected_errors = &["6..7: expected one of [Comma, RParen], but got Identifier"];
        }

        fn test_integer_out_of_range() {
            let expr = "99999999999";
            let expected_errors = &["0..11: integer literal out of range"];
        }

        fn test_globals_and_function() {
            let program = "
param float amount;
const float3 weights = float3(0.3, 0.59, 0.11);
void main() {
    float4 src = sample(img, pos0);
    color = src * amount;
}
";
            let expected_errors = &["107..110: img is not declared"];
        }

        fn test_program_tree() {
            let program = "
param sampler img;
param float t[2];
void main() {
    float4 c = sample(img, pos0);
    if (c.a > t[0]) c.rgb *= t[1]; else discard;
    color = c;
}
";
            let tree_ok = "
                declare param sampler img (1..18)
                declare param float t[2] (20..36)
                function void main() (38..151)
                  block (50..151)
                    declare float4 c (56..84)
                      call sample (67..84)
                        var img (74..77)
                        var pos0 (79..83)
                    if (90..134)
                      binary Greater (94..104)
                        swizzle a (94..97)
                          var c (94..95)
                        index (100..104)
                          var t (100..101)
                          int 0 (102..103)
                      assign *= (106..120)
                        swizzle rgb (106..111)
                          var c (106..107)
                        index (115..119)
                          var t (115..116)
                          int 1 (117..118)
                      discard (126..134)
                    assign = (139..149)
                      var color (139..144)
                      var c (147..148)
            ";
        }

        fn test_loops_and_jumps() {
            let program = "
float f(int n) {
    float acc = 0.0;
    for (int i = 0; i < n; i++) {
        if (i == 3) continue;
        acc += 1.0;
    }
    while (acc > 1.0) { acc -= 1.0; break; }
    do acc++; while (acc < 0.5);
    return acc;
}
";
            let tree_ok = "
                function float f(int n) (1..224)
                  block (16..224)
                    declare float acc (22..37)
                      float 0.0 (34..37)
                    for (43..128)
                      init
                        declare int i (48..57)
                          int 0 (56..57)
                      condition
                        binary Less (59..64)
                          var i (59..60)
                          var n (63..64)
                      step
                        expr (66..69)
                          unary PostInc (66..69)
                            var i (66..67)
                      body
                        block (71..128)
                          if (81..102)
                            binary EqEq (85..91)
                              var i (85..86)
                              int 3 (90..91)
                            continue (93..102)
                          assign += (111..122)
                            var acc (111..114)
                            float 1.0 (118..121)
                    while (133..173)
                      binary Greater (140..149)
                        var acc (140..143)
                        float 1.0 (146..149)
                      block (151..173)
                        assign -= (153..164)
                          var acc (153..156)
                          float 1.0 (160..163)
                        break (165..171)
                    do-while (178..206)
                      expr (181..187)
                        unary PostInc (181..186)
                          var acc (181..184)
                      binary Less (195..204)
                        var acc (195..198)
                        float 0.5 (201..204)
                    return (211..222)
                      var acc (218..221)
            ";
        }

        fn test_for_scope_ends_with_loop() {
            let program = "
void main() {
    for (int i = 0; i < 4; i++) {}
    color.r = float(i);
}
";
            let expected_errors = &["70..71: i is not declared"];
        }

        fn test_block_scope_is_popped() {
            let program = "
void main() {
    int x = 1;
    { float x = 2.0; }
    { bool y = true; }
    color.r = float(x) + float(y);
}
";
            let expected_errors = &["107..108: y is not declared"];
        }

        fn test_duplicate_local() {
            let program = "
void main() {
    float x = 1.0;
    float x = 2.0;
}
";
            let expected_errors = &["44..45: x is already declared in this scope, at 25..26"];
        }

        fn test_builtin_redeclared() {
            let program = "float4 color;";
            let expected_errors = &["7..12: color is already declared as a built-in"];
        }

        fn test_function_missing_type() {
            let program = "main() {}";
            let expected_errors = &["0..4: expected a type, but got Identifier"];
        }

        fn test_garbage_program_is_lexical() {
            let program = "%###";
            let expected_errors = &["0..4: unexpected character"];
        }

        fn test_missing_semicolon() {
            let program = "
void main() {
    color = pos0.xyxy
}
";
            let expected_errors = &["37..38: expected token Semicolon, but got RBrace"];
        }

        fn test_nesting_limit() {
            let expr = "((((((((((((((((((((a))))))))))))))))))))";
            let expected_errors = &["16..17: nesting exceeds the maximum depth of 16"];
        }
    );
}
