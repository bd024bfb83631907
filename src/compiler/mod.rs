//! Single-pass compiler from source text to bytecode.
//!
//! The compiler is a Pratt parser that emits bytecode while it recognizes each
//! production; no syntax tree is built. Errors are collected as
//! [`SyntaxError`]s and, once one has been reported, panic mode suppresses the
//! rest until a synchronization point. The expression grammar has none, so at
//! most one diagnostic comes out of a compilation.

pub mod precedence;

use tracing::debug;

use crate::bytecode::{Chunk, OpCode, Value};
use crate::error::{ChunkError, CompileError, ErrorLocation, SyntaxError};
use crate::lexer::{Scanner, Token, TokenKind};

pub use precedence::{rule, ParseFn, ParseRule, Precedence};

/// Deepest chain of nested sub-expressions the parser will descend into.
pub const MAX_NESTING: usize = 1024;

/// Compile source text into a fresh chunk.
pub fn compile(source: &str) -> Result<Chunk, CompileError> {
    Compiler::new(source).compile()
}

/// Compiles one unit of source into one chunk.
pub struct Compiler<'src> {
    scanner: Scanner<'src>,
    chunk: Chunk,
    previous: Token<'src>,
    current: Token<'src>,
    had_error: bool,
    panic_mode: bool,
    errors: Vec<SyntaxError>,
    /// A chunk growth failure; compilation output is abandoned.
    fatal: Option<ChunkError>,
    /// Line of the last UPDATE_LINE emitted.
    marked_line: Option<usize>,
    /// Active `parse_precedence` calls.
    depth: usize,
}

impl<'src> Compiler<'src> {
    pub fn new(source: &'src str) -> Self {
        let placeholder = Token::eof(0, 1, 1);
        Self {
            scanner: Scanner::new(source),
            chunk: Chunk::new(),
            previous: placeholder,
            current: placeholder,
            had_error: false,
            panic_mode: false,
            errors: Vec::new(),
            fatal: None,
            marked_line: None,
            depth: 0,
        }
    }

    /// Compile the whole source as a single expression.
    ///
    /// On failure the partially built chunk is dropped, so it can never be
    /// executed.
    pub fn compile(mut self) -> Result<Chunk, CompileError> {
        self.advance();
        self.expression();
        self.consume(TokenKind::Eof, "Expect end of expression.");
        self.emit_op(OpCode::Return);

        if let Some(fatal) = self.fatal {
            return Err(CompileError::Chunk(fatal));
        }
        if self.had_error {
            debug!(errors = self.errors.len(), "compilation failed");
            return Err(CompileError::Syntax(self.errors));
        }

        debug!(
            bytes = self.chunk.len(),
            constants = self.chunk.constants().len(),
            "chunk compiled"
        );
        Ok(self.chunk)
    }

    // ============ Token stream ============

    fn advance(&mut self) {
        self.previous = self.current;
        loop {
            self.current = self.scanner.scan_token();
            if self.current.kind != TokenKind::Error {
                break;
            }
            let message = self.current.lexeme;
            self.error_at_current(message);
        }
    }

    fn consume(&mut self, kind: TokenKind, message: &str) {
        if self.current.kind == kind {
            self.advance();
            return;
        }
        self.error_at_current(message);
    }

    // ============ Pratt parser ============

    fn expression(&mut self) {
        self.parse_precedence(Precedence::Assignment);
    }

    fn parse_precedence(&mut self, precedence: Precedence) {
        if self.depth >= MAX_NESTING {
            self.error("Expression nests too deeply.");
            return;
        }
        self.depth += 1;
        self.parse_operand(precedence);
        self.depth -= 1;
    }

    fn parse_operand(&mut self, precedence: Precedence) {
        self.advance();
        let Some(prefix) = rule(self.previous.kind).prefix else {
            self.error("Expect expression.");
            return;
        };
        self.apply(prefix);

        while precedence <= rule(self.current.kind).precedence {
            self.advance();
            if let Some(infix) = rule(self.previous.kind).infix {
                self.apply(infix);
            }
        }
    }

    fn apply(&mut self, parse_fn: ParseFn) {
        match parse_fn {
            ParseFn::Grouping => self.grouping(),
            ParseFn::Unary => self.unary(),
            ParseFn::Binary => self.binary(),
            ParseFn::Number => self.number(),
        }
    }

    fn grouping(&mut self) {
        self.expression();
        self.consume(TokenKind::RightParen, "Expect ')' after expression.");
    }

    fn unary(&mut self) {
        let operator = self.previous.kind;
        self.parse_precedence(Precedence::Unary);

        if operator == TokenKind::Minus {
            self.emit_op(OpCode::Negate);
        }
    }

    fn binary(&mut self) {
        let operator = self.previous.kind;
        // Right operand binds one level tighter: equal operators associate left.
        self.parse_precedence(rule(operator).precedence.next());

        let op = match operator {
            TokenKind::Plus => OpCode::Add,
            TokenKind::Minus => OpCode::Subtract,
            TokenKind::Star => OpCode::Multiply,
            TokenKind::Slash => OpCode::Divide,
            _ => return,
        };
        self.emit_op(op);
    }

    fn number(&mut self) {
        match self.previous.lexeme.parse::<f64>() {
            Ok(value) => self.emit_constant(Value::Number(value)),
            Err(_) => self.error("Invalid number literal."),
        }
    }

    // ============ Emission ============

    fn emit_byte(&mut self, byte: u8) {
        let line = self.previous.line();
        self.emit_with(|chunk| chunk.write(byte, line));
    }

    fn emit_opcode(&mut self, op: OpCode) {
        let line = self.previous.line();
        self.emit_with(|chunk| chunk.write_op(op, line));
    }

    fn emit_with(&mut self, write: impl FnOnce(&mut Chunk) -> Result<(), ChunkError>) {
        if self.fatal.is_some() {
            return;
        }
        if let Err(e) = write(&mut self.chunk) {
            self.fatal = Some(e);
        }
    }

    /// Emit an opcode, preceded by UPDATE_LINE when the source line changed.
    fn emit_op(&mut self, op: OpCode) {
        let line = self.previous.line();
        if self.marked_line != Some(line) {
            if let Ok(marker) = u8::try_from(line) {
                self.marked_line = Some(line);
                self.emit_opcode(OpCode::UpdateLine);
                self.emit_byte(marker);
            }
        }
        self.emit_opcode(op);
    }

    fn emit_constant(&mut self, value: Value) {
        let index = self.make_constant(value);
        self.emit_op(OpCode::Constant);
        self.emit_byte(index);
    }

    fn make_constant(&mut self, value: Value) -> u8 {
        match self.chunk.add_constant(value) {
            Ok(index) => index,
            Err(ChunkError::TooManyConstants { .. }) => {
                self.error("Too many constants in one chunk.");
                0
            }
            Err(e) => {
                self.fatal.get_or_insert(e);
                0
            }
        }
    }

    // ============ Error reporting ============

    fn error(&mut self, message: &str) {
        let token = self.previous;
        self.error_at(token, message);
    }

    fn error_at_current(&mut self, message: &str) {
        let token = self.current;
        self.error_at(token, message);
    }

    fn error_at(&mut self, token: Token<'src>, message: &str) {
        if self.panic_mode {
            return;
        }
        self.panic_mode = true;
        self.had_error = true;

        let location = match token.kind {
            TokenKind::Eof => ErrorLocation::AtEnd,
            TokenKind::Error => ErrorLocation::Unlocated,
            _ => ErrorLocation::At(token.lexeme.to_string()),
        };
        let error = SyntaxError::new(token.line(), location, message);
        debug!(%error, "syntax error");
        self.errors.push(error);
    }
}
