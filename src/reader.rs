use crate::interner::Symbol;
use crate::strings::{self, StringMode};
use crate::tokens::{LineSource, Token, TokenSource, TokenizerError};
use crate::types::Value;
use num_complex::Complex64;
use std::fmt;

#[derive(Debug)]
pub enum Error {
    Tokenizer(TokenizerError),
    UnexpectedClosingBracket,
    UnterminatedList,
    BadStringLiteral(strings::BuildError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Tokenizer(e) => write!(f, "{}", e),
            Error::UnexpectedClosingBracket => write!(f, "unexpected 】 with no 【 to match"),
            Error::UnterminatedList => write!(f, "end of input inside an unterminated 【…】"),
            Error::BadStringLiteral(e) => write!(f, "bad string literal: {}", e),
        }
    }
}

/// Reads one top-level expression. `Ok(None)` is the normal end of input
/// between forms; end of input *inside* a form is `UnterminatedList`.
pub fn read_expression<S: LineSource>(
    tokens: &mut TokenSource<S>,
    mode: StringMode,
) -> Result<Option<Value>, Error> {
    match tokens.next_token().map_err(Error::Tokenizer)? {
        None => Ok(None),
        Some(Token::Close) => Err(Error::UnexpectedClosingBracket),
        Some(token) => read_form(tokens, token, mode).map(Some),
    }
}

fn read_form<S: LineSource>(
    tokens: &mut TokenSource<S>,
    token: Token,
    mode: StringMode,
) -> Result<Value, Error> {
    match token {
        Token::Open => read_sequence(tokens, mode),
        // A close may only ever be consumed by read_sequence.
        Token::Close => Err(Error::UnexpectedClosingBracket),
        Token::StringLiteral(raw) => strings::build_string(&raw, mode)
            .map(Value::Str)
            .map_err(Error::BadStringLiteral),
        Token::PlainChars(chars) => Ok(parse_atom(&chars)),
    }
}

fn read_sequence<S: LineSource>(
    tokens: &mut TokenSource<S>,
    mode: StringMode,
) -> Result<Value, Error> {
    let mut elements = Vec::new();
    loop {
        match tokens.next_token().map_err(Error::Tokenizer)? {
            None => return Err(Error::UnterminatedList),
            Some(Token::Close) => return Ok(Value::wrap_seq(elements)),
            Some(token) => elements.push(read_form(tokens, token, mode)?),
        }
    }
}

/// Classifies a bare token. Every numeric reading is tried in order; only
/// when all of them fail does the token become a symbol.
pub(crate) fn parse_atom(token: &str) -> Value {
    match token {
        "#t" => return Value::Bool(true),
        "#f" => return Value::Bool(false),
        _ => {}
    }
    if let Ok(n) = token.parse::<i64>() {
        return Value::Int(n);
    }
    if let Ok(x) = token.parse::<f64>() {
        return Value::Float(x);
    }
    if let Ok(z) = token.parse::<Complex64>() {
        return Value::Complex(z);
    }
    Value::Symbol(Symbol::intern(token))
}
