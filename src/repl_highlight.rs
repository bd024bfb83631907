use colored::Colorize;

use crate::lexer::{Scanner, Token, TokenKind};

/// Colours REPL input using the scanner's own tokens.
#[derive(Debug, Clone, Default)]
pub struct SyntaxHighlighter;

impl SyntaxHighlighter {
    pub fn new() -> Self {
        Self
    }

    pub fn highlight(&self, source: &str) -> String {
        let mut result = String::new();
        let mut last_end = 0;

        for token in Scanner::new(source) {
            if token.kind == TokenKind::Eof {
                break;
            }

            // Error tokens carry a message as lexeme; the span still covers the source.
            let token_text = &source[token.span.start..token.span.end];
            result.push_str(&source[last_end..token.span.start]);
            result.push_str(&self.colorize_token(&token, token_text));
            last_end = token.span.end;
        }

        result.push_str(&source[last_end..]);
        result
    }

    fn colorize_token(&self, token: &Token, text: &str) -> String {
        use TokenKind::*;

        match token.kind {
            Number => text.bright_blue().to_string(),
            String => text.bright_green().to_string(),
            True | False => text.bright_magenta().to_string(),
            Nil => text.cyan().to_string(),

            And | Class | Else | For | Fun | If | Or | Print | Return | Super | This | Var
            | While => text.bright_yellow().bold().to_string(),

            Plus | Minus | Star | Slash | Equal | EqualEqual | Bang | BangBang | BangEqual
            | Less | LessEqual | Greater | GreaterEqual => text.red().to_string(),

            LeftParen | RightParen | LeftBrace | RightBrace | LeftBracket | RightBracket
            | Comma | Dot | Semicolon => text.white().bold().to_string(),

            Identifier => text.white().to_string(),
            Error => text.red().underline().to_string(),
            Eof => text.to_string(),
        }
    }
}
