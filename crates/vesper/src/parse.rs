//! Datum reader: token stream → rooted values.
//!
//! Literal structure (pairs and vectors) is allocated read-only; mutating a
//! quoted constant is an error. The quote family desugars to its list form
//! here, so the evaluator only ever sees `(quote x)` and friends.

use crate::{
    error::{Error, EvalResult},
    heap::{Heap, Root},
    lex::{Lexer, Token, TokenKind},
    number::parse_number,
    value::Value,
};

pub struct Reader<'h, 'src> {
    heap: &'h Heap,
    lexer: Lexer<'src>,
}

/// Reads every datum in `source`. Convenience wrapper over [`Reader`].
pub fn read_source<'h>(heap: &'h Heap, source: &str, path: &str) -> EvalResult<Vec<Root<'h>>> {
    Reader::new(heap, source, path).read_all()
}

impl<'h, 'src> Reader<'h, 'src> {
    #[must_use]
    pub fn new(heap: &'h Heap, source: &'src str, path: &str) -> Self {
        Self {
            heap,
            lexer: Lexer::new(source, path),
        }
    }

    fn next_token(&mut self) -> EvalResult<Token> {
        self.lexer.next_token()
    }

    /// Reads the next datum, or `None` at end of input.
    pub fn read(&mut self) -> EvalResult<Option<Root<'h>>> {
        let token = self.next_token()?;
        if token.kind == TokenKind::Eof {
            return Ok(None);
        }
        self.parse_datum(token).map(Some)
    }

    pub fn read_all(&mut self) -> EvalResult<Vec<Root<'h>>> {
        let mut datums = Vec::new();
        while let Some(datum) = self.read()? {
            datums.push(datum);
        }
        Ok(datums)
    }

    fn require_datum(&mut self) -> EvalResult<Root<'h>> {
        let token = self.next_token()?;
        if token.kind == TokenKind::Eof {
            return Err(Error::syntax("unexpected end of input", token.mark));
        }
        self.parse_datum(token)
    }

    fn parse_datum(&mut self, token: Token) -> EvalResult<Root<'h>> {
        match token.kind {
            TokenKind::Identifier(name) => Ok(self.heap.intern(&name)),
            TokenKind::Bool(b) => Ok(self.heap.root(Value::Bool(b))),
            TokenKind::Number(lexeme) => match parse_number(&lexeme, 10) {
                Some(n) => Ok(self.heap.root(n.value())),
                None => Err(Error::syntax(
                    format!("malformed number literal '{lexeme}'"),
                    token.mark,
                )),
            },
            TokenKind::Char(c) => Ok(self.heap.root(Value::Char(c))),
            TokenKind::Str(bytes) => Ok(self.heap.alloc_string(bytes, false)),
            TokenKind::LParen => self.parse_list(&token),
            TokenKind::OpenVector => self.parse_vector(&token),
            TokenKind::Quote => self.wrap_quoted("quote"),
            TokenKind::Quasiquote => self.wrap_quoted("quasiquote"),
            TokenKind::Unquote => self.wrap_quoted("unquote"),
            TokenKind::UnquoteSplicing => self.wrap_quoted("unquote-splicing"),
            TokenKind::Dot => Err(Error::syntax("unexpected '.'", token.mark)),
            TokenKind::RParen => Err(Error::syntax("unexpected ')'", token.mark)),
            TokenKind::Eof => Err(Error::syntax("unexpected end of input", token.mark)),
        }
    }

    /// After `(`. Elements accumulate until `)`; a `.` takes exactly one more
    /// datum as the improper tail.
    fn parse_list(&mut self, open: &Token) -> EvalResult<Root<'h>> {
        let mut items: Vec<Root<'h>> = Vec::new();
        let mut tail: Option<Root<'h>> = None;
        loop {
            let token = self.next_token()?;
            match token.kind {
                TokenKind::RParen => break,
                TokenKind::Eof => {
                    return Err(Error::syntax("expected ')' before end of input", open.mark.clone()));
                }
                TokenKind::Dot => {
                    if items.is_empty() {
                        return Err(Error::syntax("expected expression before '.'", token.mark));
                    }
                    tail = Some(self.require_datum()?);
                    let close = self.next_token()?;
                    if close.kind != TokenKind::RParen {
                        return Err(Error::syntax("expected ')' after dotted tail", close.mark));
                    }
                    break;
                }
                _ => items.push(self.parse_datum(token)?),
            }
        }

        let mut list = tail.unwrap_or_else(|| self.heap.root(Value::EmptyList));
        for item in items.iter().rev() {
            list = self.heap.cons_read_only(item, &list);
        }
        Ok(list)
    }

    fn parse_vector(&mut self, open: &Token) -> EvalResult<Root<'h>> {
        let mut items: Vec<Root<'h>> = Vec::new();
        loop {
            let token = self.next_token()?;
            match token.kind {
                TokenKind::RParen => break,
                TokenKind::Eof => {
                    return Err(Error::syntax("expected ')' before end of input", open.mark.clone()));
                }
                TokenKind::Dot => {
                    return Err(Error::syntax("unexpected '.' in vector literal", token.mark));
                }
                _ => items.push(self.parse_datum(token)?),
            }
        }
        Ok(self.heap.alloc_vector(&items, true))
    }

    /// `'x` → `(quote x)`, and likewise for the rest of the quote family.
    fn wrap_quoted(&mut self, header: &str) -> EvalResult<Root<'h>> {
        let datum = self.require_datum()?;
        let symbol = self.heap.intern(header);
        let nil = self.heap.root(Value::EmptyList);
        let tail = self.heap.cons_read_only(&datum, &nil);
        Ok(self.heap.cons_read_only(&symbol, &tail))
    }
}
