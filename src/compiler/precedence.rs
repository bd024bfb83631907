//! Operator precedence and the parse rule table for Pratt parsing.

use crate::lexer::TokenKind;

/// Operator precedence levels (higher = tighter binding).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
    None = 0,
    Assignment = 1, // =
    Or = 2,         // or
    And = 3,        // and
    Equality = 4,   // == !=
    Comparison = 5, // < > <= >=
    Term = 6,       // + -
    Factor = 7,     // * /
    Unary = 8,      // -
    Call = 9,       // . ()
    Primary = 10,
}

impl Precedence {
    pub fn next(self) -> Precedence {
        match self {
            Precedence::None => Precedence::Assignment,
            Precedence::Assignment => Precedence::Or,
            Precedence::Or => Precedence::And,
            Precedence::And => Precedence::Equality,
            Precedence::Equality => Precedence::Comparison,
            Precedence::Comparison => Precedence::Term,
            Precedence::Term => Precedence::Factor,
            Precedence::Factor => Precedence::Unary,
            Precedence::Unary => Precedence::Call,
            Precedence::Call => Precedence::Primary,
            Precedence::Primary => Precedence::Primary,
        }
    }
}

/// A grammar production the compiler can run for a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseFn {
    Grouping,
    Unary,
    Binary,
    Number,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseRule {
    pub prefix: Option<ParseFn>,
    pub infix: Option<ParseFn>,
    pub precedence: Precedence,
}

impl ParseRule {
    const fn new(prefix: Option<ParseFn>, infix: Option<ParseFn>, precedence: Precedence) -> Self {
        Self {
            prefix,
            infix,
            precedence,
        }
    }

    const fn none() -> Self {
        Self::new(None, None, Precedence::None)
    }
}

/// Look up the parse rule for a token kind.
///
/// Every kind is listed explicitly so that adding a token forces a decision
/// here. Operators without an infix production keep `Precedence::None`, which
/// stops the precedence loop in front of them.
pub fn rule(kind: TokenKind) -> ParseRule {
    use ParseFn::*;

    match kind {
        TokenKind::LeftParen => ParseRule::new(Some(Grouping), None, Precedence::None),
        TokenKind::Minus => ParseRule::new(Some(Unary), Some(Binary), Precedence::Term),
        TokenKind::Plus => ParseRule::new(None, Some(Binary), Precedence::Term),
        TokenKind::Slash => ParseRule::new(None, Some(Binary), Precedence::Factor),
        TokenKind::Star => ParseRule::new(None, Some(Binary), Precedence::Factor),
        TokenKind::Number => ParseRule::new(Some(Number), None, Precedence::None),

        TokenKind::RightParen
        | TokenKind::LeftBrace
        | TokenKind::RightBrace
        | TokenKind::LeftBracket
        | TokenKind::RightBracket
        | TokenKind::Comma
        | TokenKind::Dot
        | TokenKind::Semicolon
        | TokenKind::Bang
        | TokenKind::BangBang
        | TokenKind::BangEqual
        | TokenKind::Equal
        | TokenKind::EqualEqual
        | TokenKind::Greater
        | TokenKind::GreaterEqual
        | TokenKind::Less
        | TokenKind::LessEqual
        | TokenKind::Identifier
        | TokenKind::String
        | TokenKind::And
        | TokenKind::Class
        | TokenKind::Else
        | TokenKind::False
        | TokenKind::For
        | TokenKind::Fun
        | TokenKind::If
        | TokenKind::Nil
        | TokenKind::Or
        | TokenKind::Print
        | TokenKind::Return
        | TokenKind::Super
        | TokenKind::This
        | TokenKind::True
        | TokenKind::Var
        | TokenKind::While
        | TokenKind::Error
        | TokenKind::Eof => ParseRule::none(),
    }
}
