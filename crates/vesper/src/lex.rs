//! Tokenizer for Scheme source text.
//!
//! Source is treated as a byte stream. Every token carries the mark of its
//! first byte; syntax errors point at the same mark. Numbers are kept as raw
//! lexemes so the reader and `string->number` share one conversion routine
//! (`crate::number::parse_number`).

use std::rc::Rc;

use crate::{
    error::{Error, EvalResult},
    mark::Mark,
};

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Identifier(String),
    Bool(bool),
    /// Raw numeric lexeme, radix-prefix and all; converted later.
    Number(String),
    Char(u8),
    Str(Vec<u8>),
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `#(`
    OpenVector,
    /// `'`
    Quote,
    /// `` ` ``
    Quasiquote,
    /// `,`
    Unquote,
    /// `,@`
    UnquoteSplicing,
    /// `.` standing alone
    Dot,
    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub mark: Mark,
}

/// Whitespace and `( ) " ;` end a token.
fn is_delimiter(b: u8) -> bool {
    b.is_ascii_whitespace() || matches!(b, b'(' | b')' | b'"' | b';')
}

fn is_initial(b: u8) -> bool {
    b.is_ascii_alphabetic() || matches!(b, b'!' | b'$' | b'%' | b'&' | b'*' | b'/' | b':' | b'<' | b'=' | b'>' | b'?' | b'^' | b'_' | b'~')
}

fn is_subsequent(b: u8) -> bool {
    is_initial(b) || b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.' | b'@')
}

pub struct Lexer<'src> {
    bytes: &'src [u8],
    pos: usize,
    path: Rc<str>,
    line: u32,
    col: u32,
}

impl<'src> Lexer<'src> {
    #[must_use]
    pub fn new(source: &'src str, path: &str) -> Self {
        Self {
            bytes: source.as_bytes(),
            pos: 0,
            path: Rc::from(path),
            line: 1,
            col: 1,
        }
    }

    fn mark(&self) -> Mark {
        Mark::new(Rc::clone(&self.path), self.line, self.col)
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn get(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.pos += 1;
        if b == b'\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(b)
    }

    fn skip_atmosphere(&mut self) {
        while let Some(b) = self.peek() {
            if b.is_ascii_whitespace() {
                self.get();
            } else if b == b';' {
                while let Some(c) = self.get() {
                    if c == b'\n' {
                        break;
                    }
                }
            } else {
                break;
            }
        }
    }

    fn take_until_delimiter(&mut self, buf: &mut String) {
        while let Some(b) = self.peek() {
            if is_delimiter(b) {
                break;
            }
            self.get();
            buf.push(b as char);
        }
    }

    /// Produces the next token, or `Eof` forever once input is exhausted.
    pub fn next_token(&mut self) -> EvalResult<Token> {
        self.skip_atmosphere();
        let mark = self.mark();
        let Some(b) = self.get() else {
            return Ok(Token { kind: TokenKind::Eof, mark });
        };

        let kind = match b {
            b'(' => TokenKind::LParen,
            b')' => TokenKind::RParen,
            b'\'' => TokenKind::Quote,
            b'`' => TokenKind::Quasiquote,
            b',' => {
                if self.peek() == Some(b'@') {
                    self.get();
                    TokenKind::UnquoteSplicing
                } else {
                    TokenKind::Unquote
                }
            }
            b'"' => self.lex_string(&mark)?,
            b'#' => self.lex_hash(&mark)?,
            b'.' => {
                if self.peek().is_none_or(is_delimiter) {
                    TokenKind::Dot
                } else {
                    let mut lexeme = String::from(".");
                    self.take_until_delimiter(&mut lexeme);
                    if lexeme == "..." {
                        TokenKind::Identifier(lexeme)
                    } else {
                        TokenKind::Number(lexeme)
                    }
                }
            }
            b'+' | b'-' => {
                if self.peek().is_none_or(is_delimiter) {
                    TokenKind::Identifier((b as char).to_string())
                } else {
                    let mut lexeme = (b as char).to_string();
                    self.take_until_delimiter(&mut lexeme);
                    TokenKind::Number(lexeme)
                }
            }
            b'0'..=b'9' => {
                let mut lexeme = (b as char).to_string();
                self.take_until_delimiter(&mut lexeme);
                TokenKind::Number(lexeme)
            }
            _ if is_initial(b) => {
                let mut name = (b as char).to_string();
                self.take_until_delimiter(&mut name);
                if let Some(bad) = name.bytes().find(|&c| !is_subsequent(c)) {
                    return Err(Error::syntax(
                        format!("invalid character '{}' in identifier", bad as char),
                        mark,
                    ));
                }
                TokenKind::Identifier(name)
            }
            _ => {
                return Err(Error::syntax(format!("unexpected character '{}'", b as char), mark));
            }
        };

        Ok(Token { kind, mark })
    }

    /// After the opening `"`. Escapes cover `\"` and `\\` only.
    fn lex_string(&mut self, mark: &Mark) -> EvalResult<TokenKind> {
        let mut bytes = Vec::new();
        loop {
            let Some(b) = self.get() else {
                return Err(Error::syntax("unterminated string literal", mark.clone()));
            };
            match b {
                b'"' => return Ok(TokenKind::Str(bytes)),
                b'\\' => match self.get() {
                    Some(c @ (b'"' | b'\\')) => bytes.push(c),
                    Some(c) => {
                        return Err(Error::syntax(
                            format!("invalid escape '\\{}' in string literal", c as char),
                            mark.clone(),
                        ));
                    }
                    None => {
                        return Err(Error::syntax("unterminated string literal", mark.clone()));
                    }
                },
                _ => bytes.push(b),
            }
        }
    }

    /// After `#`: vector open, boolean, character, or a number prefix.
    fn lex_hash(&mut self, mark: &Mark) -> EvalResult<TokenKind> {
        match self.peek() {
            Some(b'(') => {
                self.get();
                Ok(TokenKind::OpenVector)
            }
            Some(b'\\') => {
                self.get();
                self.lex_char(mark)
            }
            _ => {
                let mut rest = String::new();
                self.take_until_delimiter(&mut rest);
                match rest.as_str() {
                    "t" | "T" => Ok(TokenKind::Bool(true)),
                    "f" | "F" => Ok(TokenKind::Bool(false)),
                    _ => {
                        let first = rest.bytes().next().map(|c| c.to_ascii_lowercase());
                        if matches!(first, Some(b'b' | b'o' | b'd' | b'x' | b'e' | b'i')) {
                            Ok(TokenKind::Number(format!("#{rest}")))
                        } else {
                            Err(Error::syntax(
                                format!("invalid token '#{rest}'"),
                                mark.clone(),
                            ))
                        }
                    }
                }
            }
        }
    }

    /// After `#\`: one literal byte, or a character name.
    fn lex_char(&mut self, mark: &Mark) -> EvalResult<TokenKind> {
        let Some(first) = self.get() else {
            return Err(Error::syntax("expected character after '#\\'", mark.clone()));
        };
        let mut name = (first as char).to_string();
        self.take_until_delimiter(&mut name);
        if name.len() == 1 {
            return Ok(TokenKind::Char(first));
        }
        match name.as_str() {
            "space" => Ok(TokenKind::Char(b' ')),
            "newline" => Ok(TokenKind::Char(b'\n')),
            _ => Err(Error::syntax(
                format!("invalid character literal '#\\{name}'"),
                mark.clone(),
            )),
        }
    }
}
