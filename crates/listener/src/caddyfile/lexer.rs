//! Tokenizer for block-structured configuration text
//!
//! Words are separated by whitespace. A newline outside of quotes ends the
//! current line. `"…"` strings support `\"` and `\\` escapes, `` `…` ``
//! strings are taken verbatim, and `#` at the start of a word comments out
//! the rest of the line. Quoted strings may span lines.

use crate::error::{SyntaxError, SyntaxErrorKind};
use std::iter::Peekable;
use std::str::Chars;

/// A single word of input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    /// Set for `"…"` and `` `…` `` tokens, which never act as braces
    pub quoted: bool,
}

impl Token {
    fn is_bare(&self, text: &str) -> bool {
        !self.quoted && self.text == text
    }

    pub fn opens_block(&self) -> bool {
        self.is_bare("{")
    }

    pub fn closes_block(&self) -> bool {
        self.is_bare("}")
    }

    pub fn is_empty_block(&self) -> bool {
        self.is_bare("{}")
    }

    pub fn is_brace(&self) -> bool {
        self.opens_block() || self.closes_block() || self.is_empty_block()
    }
}

/// The tokens of one logical line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    /// 1-based line the first token starts on
    pub number: usize,
    pub tokens: Vec<Token>,
}

struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    line: usize,
}

/// Split input into non-empty logical lines of tokens
pub fn tokenize(input: &str) -> Result<Vec<Line>, SyntaxError> {
    let mut lexer = Lexer {
        chars: input.chars().peekable(),
        line: 1,
    };
    let mut lines = Vec::new();
    let mut current = Line {
        number: 1,
        tokens: Vec::new(),
    };

    while let Some(&c) = lexer.chars.peek() {
        match c {
            '\n' => {
                lexer.chars.next();
                lexer.line += 1;
                if !current.tokens.is_empty() {
                    lines.push(std::mem::replace(
                        &mut current,
                        Line {
                            number: lexer.line,
                            tokens: Vec::new(),
                        },
                    ));
                }
                current.number = lexer.line;
            }
            c if c.is_whitespace() => {
                lexer.chars.next();
            }
            '#' => lexer.skip_comment(),
            '"' | '`' => {
                let token = lexer.quoted(c)?;
                current.tokens.push(token);
            }
            _ => {
                let token = lexer.word();
                current.tokens.push(token);
            }
        }
    }

    if !current.tokens.is_empty() {
        lines.push(current);
    }
    Ok(lines)
}

impl Lexer<'_> {
    fn skip_comment(&mut self) {
        while let Some(&c) = self.chars.peek() {
            if c == '\n' {
                break;
            }
            self.chars.next();
        }
    }

    fn word(&mut self) -> Token {
        let mut text = String::new();
        while let Some(&c) = self.chars.peek() {
            if c.is_whitespace() {
                break;
            }
            text.push(c);
            self.chars.next();
        }
        Token {
            text,
            quoted: false,
        }
    }

    fn quoted(&mut self, delimiter: char) -> Result<Token, SyntaxError> {
        let start = self.line;
        let unterminated = || SyntaxError::new(SyntaxErrorKind::UnterminatedQuote, start);
        self.chars.next();

        let mut text = String::new();
        loop {
            let c = self.chars.next().ok_or_else(unterminated)?;
            match c {
                c if c == delimiter => break,
                '\\' if delimiter == '"' => {
                    let escaped = self.chars.next().ok_or_else(unterminated)?;
                    match escaped {
                        '"' | '\\' => text.push(escaped),
                        other => {
                            if other == '\n' {
                                self.line += 1;
                            }
                            text.push('\\');
                            text.push(other);
                        }
                    }
                }
                '\n' => {
                    self.line += 1;
                    text.push(c);
                }
                _ => text.push(c),
            }
        }

        Ok(Token { text, quoted: true })
    }
}
