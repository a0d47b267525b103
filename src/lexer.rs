use std::{iter::Peekable, num::ParseFloatError, num::ParseIntError};

use crate::token::{Span, Spanned, Token, TokenKind, KEYWORDS};

pub const SUGGESTED_TOKENS_CAPACITY: usize = 4_096;

/// Lexes the provided string, producing the tokens into the provided buffer.
///
/// Lexing never fails at this level: malformed input is represented by
/// [`TokenKind::Error`] tokens, which the parser reports when it reaches them.
pub fn lex(src: &str, tokens: &mut Vec<Token>) {
    Lexer::new(src, tokens).lex();
    tracing::trace!(tokens = tokens.len(), bytes = src.len(), "lexed");
}

/// A convenience function that allocates a new buffer per lexed input and
/// returns it.
pub fn lex_in_new(src: &str) -> Vec<Token> {
    let mut tokens = Vec::with_capacity(SUGGESTED_TOKENS_CAPACITY);
    lex(src, &mut tokens);
    tokens
}

/// Lexes the whole input and returns its significant tokens (trivia is
/// dropped), terminated by a single [`TokenKind::Eof`].
///
/// Fails with the first lexical error found.
pub fn tokenize(src: &str) -> Result<Vec<Token>, Spanned<Error>> {
    let mut tokens = lex_in_new(src);
    if let Some(token) = tokens.iter().find(|t| t.kind.is_error()) {
        let TokenKind::Error(error) = token.kind else {
            unreachable!()
        };
        return Err(token.span().wrap(error));
    }
    tokens.retain(|t| !t.kind.is_trivia());
    Ok(tokens)
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Error {
    /// A run of characters which can't start any token.
    UnexpectedChar,
    /// A numeric literal immediately followed by identifier characters, such
    /// as `6foo`.
    MalformedNumber,
    UnclosedComment,
}

/// The JSL lexer
struct Lexer<'src, 'tok> {
    src: &'src str,
    iter: Peekable<std::str::Chars<'src>>,
    cursor: usize,
    current_lo: usize,
    tokens: &'tok mut Vec<Token>,
}

impl Lexer<'_, '_> {
    /// Scans the source string until the input is exhausted.
    ///
    /// Tokens are written into the provided tokens buffer.
    fn lex(mut self) {
        assert_eq!(self.tokens.len(), 0, "must pass clean tokens buffer");
        loop {
            let next = self.scan_token_kind();
            let is_eof = matches!(next, TokenKind::Eof);
            self.produce(next);
            if is_eof {
                break;
            }
        }
    }

    /// Tries to scan the current character.
    fn scan_token_kind(&mut self) -> TokenKind {
        use TokenKind::*;
        if self.is_at_end() {
            self.current_lo = self.cursor;
            return Eof;
        }
        match self.mark_advance() {
            '+' => match self.peek() {
                '+' => self.advance_with(PlusPlus),
                '=' => self.advance_with(PlusAssign),
                _ => Plus,
            },
            '-' => match self.peek() {
                '-' => self.advance_with(MinusMinus),
                '=' => self.advance_with(MinusAssign),
                _ => Minus,
            },
            '*' => match self.peek() {
                '=' => self.advance_with(StarAssign),
                _ => Star,
            },
            '/' => match self.peek() {
                '/' => self.line_comment(),
                '*' => self.block_comment(),
                '=' => self.advance_with(SlashAssign),
                _ => Slash,
            },
            '=' => match self.peek() {
                '=' => self.advance_with(EqEq),
                _ => Assign,
            },
            '!' => match self.peek() {
                '=' => self.advance_with(NotEq),
                _ => Bang,
            },
            '<' => match self.peek() {
                '=' => self.advance_with(LessEq),
                _ => Less,
            },
            '>' => match self.peek() {
                '=' => self.advance_with(GreaterEq),
                _ => Greater,
            },
            '&' => match self.peek() {
                '&' => self.advance_with(AndAnd),
                _ => self.unexpected_run(),
            },
            '|' => match self.peek() {
                '|' => self.advance_with(OrOr),
                _ => self.unexpected_run(),
            },
            '^' => match self.peek() {
                '^' => self.advance_with(XorXor),
                _ => self.unexpected_run(),
            },
            '?' => Question,
            ':' => Colon,
            ';' => Semicolon,
            ',' => Comma,
            '.' => match self.peek() {
                c if c.is_ascii_digit() => self.fraction(),
                _ => Dot,
            },
            '(' => LParen,
            ')' => RParen,
            '[' => LBracket,
            ']' => RBracket,
            '{' => LBrace,
            '}' => RBrace,
            c if is_identifier_start(c) => self.identifier_or_keyword(),
            c if c.is_ascii_digit() => self.number(),
            c if c.is_ascii_whitespace() => self.whitespace(),
            _ => self.unexpected_run(),
        }
    }

    fn identifier_or_keyword(&mut self) -> TokenKind {
        while is_identifier_continue(self.peek()) {
            self.advance();
        }
        KEYWORDS
            .get(self.substr())
            .copied()
            .unwrap_or(TokenKind::Identifier)
    }

    /// Lexes an integer or float literal whose first digit was already
    /// consumed.
    fn number(&mut self) -> TokenKind {
        self.digits();
        if self.peek() == '.' {
            self.advance();
            return self.fraction();
        }
        if self.exponent() {
            return self.number_suffix(TokenKind::Float);
        }
        self.number_suffix(TokenKind::Int)
    }

    /// Lexes the digits after the decimal point, and the exponent if any.
    fn fraction(&mut self) -> TokenKind {
        self.digits();
        self.exponent();
        self.number_suffix(TokenKind::Float)
    }

    fn digits(&mut self) {
        while self.peek().is_ascii_digit() {
            self.advance();
        }
    }

    /// Consumes an exponent part (`e10`, `E-3`), returning whether there was
    /// one. An `e` not followed by digits is left for [`Self::number_suffix`]
    /// to reject.
    fn exponent(&mut self) -> bool {
        if !matches!(self.peek(), 'e' | 'E') {
            return false;
        }
        let mut rest = self.src[self.cursor..].chars().skip(1);
        let has_digits = match rest.next() {
            Some('+' | '-') => rest.next().is_some_and(|c| c.is_ascii_digit()),
            Some(c) => c.is_ascii_digit(),
            None => false,
        };
        if !has_digits {
            return false;
        }
        self.advance(); // e
        if matches!(self.peek(), '+' | '-') {
            self.advance();
        }
        self.digits();
        true
    }

    /// A number may not run into an identifier. If it does, the whole run is
    /// consumed as a single error token.
    fn number_suffix(&mut self, kind: TokenKind) -> TokenKind {
        if !is_identifier_continue(self.peek()) {
            return kind;
        }
        while is_identifier_continue(self.peek()) {
            self.advance();
        }
        TokenKind::Error(Error::MalformedNumber)
    }

    fn whitespace(&mut self) -> TokenKind {
        while self.peek().is_ascii_whitespace() {
            self.advance();
        }
        TokenKind::Whitespace
    }

    fn line_comment(&mut self) -> TokenKind {
        assert_eq!(self.advance(), '/');
        while !self.is_at_end() && self.peek() != '\n' {
            self.advance();
        }
        TokenKind::LineComment
    }

    fn block_comment(&mut self) -> TokenKind {
        assert_eq!(self.advance(), '*');
        while !self.is_at_end() {
            if self.advance() == '*' && self.peek() == '/' {
                self.advance();
                return TokenKind::BlockComment;
            }
        }
        TokenKind::Error(Error::UnclosedComment)
    }

    /// Consumes every following character that can't start a token, so that
    /// `%###` is reported once instead of four times.
    fn unexpected_run(&mut self) -> TokenKind {
        while !self.is_at_end() && !can_start_token(self.peek()) {
            self.advance();
        }
        TokenKind::Error(Error::UnexpectedChar)
    }
}

impl Lexer<'_, '_> {
    /// Constructs a new lexer with the default state.
    fn new<'src, 'tok>(src: &'src str, tokens: &'tok mut Vec<Token>) -> Lexer<'src, 'tok> {
        Lexer {
            src,
            iter: src.chars().peekable(),
            cursor: 0,
            current_lo: 0,
            tokens,
        }
    }

    /// Starts a new token "mark" and advances the iterator.
    fn mark_advance(&mut self) -> char {
        self.current_lo = self.cursor;
        self.advance()
    }

    fn is_at_end(&mut self) -> bool {
        self.iter.peek().is_none()
    }

    /// Returns the next char and advances the iterator. Past the end of the
    /// input, returns `'\0'`, which no rule accepts; check [`Self::is_at_end`]
    /// to tell the two apart.
    fn advance(&mut self) -> char {
        self.iter
            .next()
            .inspect(|c| self.cursor += c.len_utf8())
            .unwrap_or('\0')
    }

    /// Advances and returns the provided value.
    fn advance_with<T>(&mut self, value: T) -> T {
        self.advance();
        value
    }

    /// Returns the next char without advancing the iterator.
    fn peek(&mut self) -> char {
        self.iter.peek().copied().unwrap_or('\0')
    }

    /// Returns the current span.
    fn span(&self) -> Span {
        Span::new_of_bounds(self.current_lo..self.cursor)
    }

    /// Returns the substring of the current marked bounds.
    fn substr(&self) -> &str {
        self.span().substr(self.src)
    }

    /// Produces a token using the marked bounds.
    fn produce(&mut self, kind: TokenKind) {
        let span = self.span();
        self.tokens.push(Token::new(kind, span));
    }
}

fn is_identifier_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '$'
}

fn is_identifier_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}

fn can_start_token(c: char) -> bool {
    const PUNCTUATION: &str = "+-*/=!<>&|^?:;,.()[]{}";
    is_identifier_continue(c)
        || c.is_ascii_whitespace()
        || PUNCTUATION.contains(c)
}

pub mod extract {
    use super::*;

    pub fn int(token: Token, src: &str) -> Result<i32, ParseIntError> {
        debug_assert_eq!(token.kind, TokenKind::Int);
        token.lexeme(src).parse()
    }

    pub fn float(token: Token, src: &str) -> Result<f32, ParseFloatError> {
        debug_assert_eq!(token.kind, TokenKind::Float);
        token.lexeme(src).parse()
    }

    pub fn ident(token: Token, src: &str) -> &str {
        debug_assert_eq!(token.kind, TokenKind::Identifier);
        token.lexeme(src)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_effects_have_no_errors() {
        for input in [
            include_str!("../effects/brightpass.jsl"),
            include_str!("../effects/box_blur.jsl"),
            include_str!("../effects/color_adjust.jsl"),
        ] {
            assert!(tokenize(input).is_ok());
        }
    }

    #[test]
    fn identifiers_are_single_tokens() {
        for input in ["foo", "aAbBCCdd", "aA29", "$aA___29", "_", "$$", "__x$1"] {
            let tokens = tokenize(input).unwrap();
            let expected = [
                Token::new(TokenKind::Identifier, Span::new_of_bounds(0..input.len())),
                Token::new(TokenKind::Eof, Span::new_of_length(input.len(), 0)),
            ];
            assert_eq!(tokens, expected, "input: {input:?}");
        }
    }

    #[test]
    fn digit_led_identifier_is_an_error() {
        let error = tokenize("6foo").unwrap_err();
        assert_eq!(error, Span::new_of_bounds(0..4).wrap(Error::MalformedNumber));

        let error = tokenize("x = 1.5e;").unwrap_err();
        assert_eq!(error, Span::new_of_bounds(4..8).wrap(Error::MalformedNumber));
    }

    #[test]
    fn illegal_symbols_are_an_error() {
        let error = tokenize("%###").unwrap_err();
        assert_eq!(error, Span::new_of_bounds(0..4).wrap(Error::UnexpectedChar));

        let error = tokenize("a & b").unwrap_err();
        assert_eq!(error, Span::new_of_bounds(2..3).wrap(Error::UnexpectedChar));

        let error = tokenize("/* open").unwrap_err();
        assert_eq!(error, Span::new_of_bounds(0..7).wrap(Error::UnclosedComment));
    }

    #[test]
    fn nul_is_an_ordinary_character() {
        let error = tokenize("a\0%###").unwrap_err();
        assert_eq!(error, Span::new_of_bounds(1..6).wrap(Error::UnexpectedChar));

        let error = tokenize("a \x07 b").unwrap_err();
        assert_eq!(error, Span::new_of_bounds(2..3).wrap(Error::UnexpectedChar));

        let tokens = tokenize("// a\0b\nc /* \0 */").unwrap();
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(kinds, [TokenKind::Identifier, TokenKind::Eof]);
    }

    #[test]
    fn tests_with_span() {
        use TokenKind::*;
        let cases = cases!(match .. {
            "+-*/" => [
                (Plus, 0..1),
                (Minus, 1..2),
                (Star, 2..3),
                (Slash, 3..4),
                (Eof, 4..4),
            ],
            "== != = ! < <= > >=" => [
                (EqEq, 0..2),
                (Whitespace, 2..3),
                (NotEq, 3..5),
                (Whitespace, 5..6),
                (Assign, 6..7),
                (Whitespace, 7..8),
                (Bang, 8..9),
                (Whitespace, 9..10),
                (Less, 10..11),
                (Whitespace, 11..12),
                (LessEq, 12..14),
                (Whitespace, 14..15),
                (Greater, 15..16),
                (Whitespace, 16..17),
                (GreaterEq, 17..19),
                (Eof, 19..19),
            ],
            "a+=b++--c&&d||e^^f" => [
                (Identifier, 0..1),
                (PlusAssign, 1..3),
                (Identifier, 3..4),
                (PlusPlus, 4..6),
                (MinusMinus, 6..8),
                (Identifier, 8..9),
                (AndAnd, 9..11),
                (Identifier, 11..12),
                (OrOr, 12..14),
                (Identifier, 14..15),
                (XorXor, 15..17),
                (Identifier, 17..18),
                (Eof, 18..18),
            ],
            "1/11/.5/1./2.25/3e2/4.0e-1" => [
                (Int, 0..1),
                (Slash, 1..2),
                (Int, 2..4),
                (Slash, 4..5),
                (Float, 5..7),
                (Slash, 7..8),
                (Float, 8..10),
                (Slash, 10..11),
                (Float, 11..15),
                (Slash, 15..16),
                (Float, 16..19),
                (Slash, 19..20),
                (Float, 20..26),
                (Eof, 26..26),
            ],
            "float4 color; if else while" => [
                (Type(crate::types::Type::Float4), 0..6),
                (Whitespace, 6..7),
                (Identifier, 7..12),
                (Semicolon, 12..13),
                (Whitespace, 13..14),
                (If, 14..16),
                (Whitespace, 16..17),
                (Else, 17..21),
                (Whitespace, 21..22),
                (While, 22..27),
                (Eof, 27..27),
            ],
            "v.xy[0]" => [
                (Identifier, 0..1),
                (Dot, 1..2),
                (Identifier, 2..4),
                (LBracket, 4..5),
                (Int, 5..6),
                (RBracket, 6..7),
                (Eof, 7..7),
            ],
            "a // line\n/* block\n */b" => [
                (Identifier, 0..1),
                (Whitespace, 1..2),
                (LineComment, 2..9),
                (Whitespace, 9..10),
                (BlockComment, 10..22),
                (Identifier, 22..23),
                (Eof, 23..23),
            ],
            "foo @ 3" => [
                (Identifier, 0..3),
                (Whitespace, 3..4),
                (Error(self::Error::UnexpectedChar), 4..5),
                (Whitespace, 5..6),
                (Int, 6..7),
                (Eof, 7..7),
            ],
        });

        for (input, tokens) in cases {
            let lexed = lex_in_new(input);
            assert_eq!(lexed, tokens.as_slice(), "input: {input:?}");
        }
    }

    #[test]
    fn keywords_are_case_sensitive() {
        let kinds: Vec<_> = tokenize("Float4 IF float4")
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect();
        assert_eq!(
            kinds,
            [
                TokenKind::Identifier,
                TokenKind::Identifier,
                TokenKind::Type(crate::types::Type::Float4),
                TokenKind::Eof,
            ]
        );
    }

    macro_rules! cases {
        (match .. {
            $($str:expr => [$(($kind:expr, $range:expr)),* $(,)?]),* $(,)?
        }) => {{
            &[$((
                $str,
                vec![
                    $(Token::new($kind, Span::new_of_bounds($range.start..$range.end))),*
                ],
            )),*]
        }};
    }
    use cases;
}
