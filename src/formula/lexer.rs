use std::fmt;

use winnow::combinator::alt;
use winnow::error::ModalResult;
use winnow::prelude::*;

use super::error::FormulaError;
use crate::parse::{char_offset, ident, number_value, string_literal, unsigned_number};
use crate::Value;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Tok {
    Number(Value),
    Str(String),
    Ident(String),
    True,
    False,
    Null,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Bang,
    EqEq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    AndAnd,
    OrOr,
    Question,
    Colon,
    LParen,
    RParen,
    Comma,
    Eof,
}

impl fmt::Display for Tok {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tok::Number(v) => write!(f, "number {v}"),
            Tok::Str(s) => write!(f, "string {s:?}"),
            Tok::Ident(name) => write!(f, "identifier '{name}'"),
            Tok::True => f.write_str("'true'"),
            Tok::False => f.write_str("'false'"),
            Tok::Null => f.write_str("'null'"),
            Tok::Plus => f.write_str("'+'"),
            Tok::Minus => f.write_str("'-'"),
            Tok::Star => f.write_str("'*'"),
            Tok::Slash => f.write_str("'/'"),
            Tok::Percent => f.write_str("'%'"),
            Tok::Bang => f.write_str("'!'"),
            Tok::EqEq => f.write_str("'=='"),
            Tok::Neq => f.write_str("'!='"),
            Tok::Gt => f.write_str("'>'"),
            Tok::Gte => f.write_str("'>='"),
            Tok::Lt => f.write_str("'<'"),
            Tok::Lte => f.write_str("'<='"),
            Tok::AndAnd => f.write_str("'&&'"),
            Tok::OrOr => f.write_str("'||'"),
            Tok::Question => f.write_str("'?'"),
            Tok::Colon => f.write_str("':'"),
            Tok::LParen => f.write_str("'('"),
            Tok::RParen => f.write_str("')'"),
            Tok::Comma => f.write_str("','"),
            Tok::Eof => f.write_str("end of formula"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Spanned {
    pub tok: Tok,
    pub offset: usize,
}

/// Tokenize a formula. Identifiers, string escapes and number syntax are
/// shared with the condition language; `-` is always an operator here, so
/// `a-1` reads as subtraction.
pub(crate) fn lex(source: &str) -> Result<Vec<Spanned>, FormulaError> {
    let mut out = Vec::new();
    let mut input = source.trim_start();

    loop {
        let offset = char_offset(source, input);
        let Some(c) = input.chars().next() else {
            out.push(Spanned {
                tok: Tok::Eof,
                offset,
            });
            return Ok(out);
        };

        let tok = match c {
            '"' | '\'' => string_literal
                .parse_next(&mut input)
                .map(Tok::Str)
                .map_err(|_| syntax(offset, "unterminated string literal"))?,
            c if c.is_ascii_digit() => {
                let text = unsigned_number
                    .parse_next(&mut input)
                    .map_err(|_| syntax(offset, "malformed number"))?;
                number_value(text)
                    .map(Tok::Number)
                    .ok_or_else(|| syntax(offset, format!("number '{text}' is out of range")))?
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let word = ident
                    .parse_next(&mut input)
                    .map_err(|_| syntax(offset, format!("unexpected character '{c}'")))?;
                match word {
                    "true" => Tok::True,
                    "false" => Tok::False,
                    "null" => Tok::Null,
                    other => Tok::Ident(other.to_owned()),
                }
            }
            c => symbol
                .parse_next(&mut input)
                .map_err(|_| syntax(offset, format!("unexpected character '{c}'")))?,
        };

        out.push(Spanned { tok, offset });
        input = input.trim_start();
    }
}

fn syntax(offset: usize, message: impl Into<String>) -> FormulaError {
    FormulaError::Syntax {
        offset,
        message: message.into(),
    }
}

fn symbol(input: &mut &str) -> ModalResult<Tok> {
    alt((
        alt((
            "&&".value(Tok::AndAnd),
            "||".value(Tok::OrOr),
            "==".value(Tok::EqEq),
            "!=".value(Tok::Neq),
            ">=".value(Tok::Gte),
            "<=".value(Tok::Lte),
        )),
        alt((
            '>'.value(Tok::Gt),
            '<'.value(Tok::Lt),
            '!'.value(Tok::Bang),
            '+'.value(Tok::Plus),
            '-'.value(Tok::Minus),
            '*'.value(Tok::Star),
            '/'.value(Tok::Slash),
            '%'.value(Tok::Percent),
            '?'.value(Tok::Question),
            ':'.value(Tok::Colon),
            '('.value(Tok::LParen),
            ')'.value(Tok::RParen),
            ','.value(Tok::Comma),
        )),
    ))
    .parse_next(input)
}
