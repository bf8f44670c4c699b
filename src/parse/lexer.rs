use std::fmt;

use winnow::ascii::digit1;
use winnow::combinator::{alt, opt, repeat};
use winnow::error::ModalResult;
use winnow::prelude::*;
use winnow::token::{any, one_of, take_while};

use super::error::{ParseError, ParseErrorKind};
use crate::Value;

/// A lexical token of the condition language.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    /// A field path; dotted segments (`address.country`) form one identifier.
    Ident(String),
    In,
    Not,
    Is,
    Empty,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    AndAnd,
    OrOr,
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    Eof,
}

/// A token together with the character offset where it starts.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub offset: usize,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::String(s) => write!(f, "string {s:?}"),
            TokenKind::Int(v) => write!(f, "number {v}"),
            TokenKind::Float(v) => write!(f, "number {v}"),
            TokenKind::Bool(v) => write!(f, "'{v}'"),
            TokenKind::Ident(name) => write!(f, "identifier '{name}'"),
            TokenKind::In => write!(f, "'in'"),
            TokenKind::Not => write!(f, "'not'"),
            TokenKind::Is => write!(f, "'is'"),
            TokenKind::Empty => write!(f, "'empty'"),
            TokenKind::LParen => write!(f, "'('"),
            TokenKind::RParen => write!(f, "')'"),
            TokenKind::LBracket => write!(f, "'['"),
            TokenKind::RBracket => write!(f, "']'"),
            TokenKind::Comma => write!(f, "','"),
            TokenKind::AndAnd => write!(f, "'&&'"),
            TokenKind::OrOr => write!(f, "'||'"),
            TokenKind::Eq => write!(f, "'=='"),
            TokenKind::Neq => write!(f, "'!='"),
            TokenKind::Gt => write!(f, "'>'"),
            TokenKind::Gte => write!(f, "'>='"),
            TokenKind::Lt => write!(f, "'<'"),
            TokenKind::Lte => write!(f, "'<='"),
            TokenKind::Eof => write!(f, "end of input"),
        }
    }
}

/// Split a condition expression into tokens, ending with [`TokenKind::Eof`].
///
/// # Errors
///
/// Returns [`ParseError`] on an unterminated string literal, a malformed
/// number, or any character outside the language.
pub fn tokenize(expression: &str) -> Result<Vec<Token>, ParseError> {
    lex(expression).map_err(|e| e.in_expression(expression))
}

fn lex(source: &str) -> Result<Vec<Token>, ParseError> {
    let mut tokens = Vec::new();
    let mut input = source.trim_start();

    loop {
        let offset = char_offset(source, input);
        let Some(c) = input.chars().next() else {
            tokens.push(Token {
                kind: TokenKind::Eof,
                offset,
            });
            return Ok(tokens);
        };

        let kind = match c {
            '"' | '\'' => string_literal
                .parse_next(&mut input)
                .map(TokenKind::String)
                .map_err(|_| ParseError::new(ParseErrorKind::UnterminatedString, offset))?,
            c if c.is_ascii_digit() || (c == '-' && starts_with_digit(&input[1..])) => {
                let text = number
                    .parse_next(&mut input)
                    .map_err(|_| ParseError::new(ParseErrorKind::UnexpectedCharacter(c), offset))?;
                numeric_token(text, offset)?
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let word = ident
                    .parse_next(&mut input)
                    .map_err(|_| ParseError::new(ParseErrorKind::UnexpectedCharacter(c), offset))?;
                keyword_or_ident(word)
            }
            c => symbol
                .parse_next(&mut input)
                .map_err(|_| ParseError::new(ParseErrorKind::UnexpectedCharacter(c), offset))?,
        };

        tokens.push(Token { kind, offset });
        input = input.trim_start();
    }
}

fn starts_with_digit(s: &str) -> bool {
    s.chars().next().is_some_and(|c| c.is_ascii_digit())
}

/// Character offset of `rest` within `source`, where `rest` is a suffix of `source`.
pub(crate) fn char_offset(source: &str, rest: &str) -> usize {
    source[..source.len() - rest.len()].chars().count()
}

// -- Identifiers ------------------------------------------------------------

fn segment<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    (
        one_of(|c: char| c.is_ascii_alphabetic() || c == '_'),
        take_while(0.., |c: char| c.is_ascii_alphanumeric() || c == '_'),
    )
        .take()
        .parse_next(input)
}

pub(crate) fn ident<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    (segment, repeat::<_, _, (), _, _>(0.., ('.', segment)))
        .take()
        .parse_next(input)
}

fn keyword_or_ident(word: &str) -> TokenKind {
    match word {
        "true" => TokenKind::Bool(true),
        "false" => TokenKind::Bool(false),
        "in" => TokenKind::In,
        "not" => TokenKind::Not,
        "is" => TokenKind::Is,
        "empty" => TokenKind::Empty,
        other => TokenKind::Ident(other.to_owned()),
    }
}

// -- Literals ---------------------------------------------------------------

pub(crate) fn string_literal(input: &mut &str) -> ModalResult<String> {
    let quote = one_of(['"', '\'']).parse_next(input)?;
    let mut s = String::new();
    loop {
        let ch = any.parse_next(input)?;
        match ch {
            c if c == quote => return Ok(s),
            '\\' => {
                let esc = any.parse_next(input)?;
                s.push(match esc {
                    'n' => '\n',
                    't' => '\t',
                    'r' => '\r',
                    other => other,
                });
            }
            c => s.push(c),
        }
    }
}

pub(crate) fn unsigned_number<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    (digit1, opt(('.', digit1))).take().parse_next(input)
}

fn number<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    (opt('-'), unsigned_number).take().parse_next(input)
}

/// Decimal text to a number value: `Float` when it has a fractional part.
/// `None` when an integer does not fit in 64 bits.
pub(crate) fn number_value(text: &str) -> Option<Value> {
    if text.contains('.') {
        text.parse::<f64>().ok().map(Value::Float)
    } else {
        text.parse::<i64>().ok().map(Value::Int)
    }
}

fn numeric_token(text: &str, offset: usize) -> Result<TokenKind, ParseError> {
    match number_value(text) {
        Some(Value::Int(v)) => Ok(TokenKind::Int(v)),
        Some(Value::Float(v)) => Ok(TokenKind::Float(v)),
        _ => Err(ParseError::new(
            ParseErrorKind::InvalidNumber(text.to_owned()),
            offset,
        )),
    }
}

// -- Operators & punctuation ------------------------------------------------

fn symbol(input: &mut &str) -> ModalResult<TokenKind> {
    alt((
        "&&".value(TokenKind::AndAnd),
        "||".value(TokenKind::OrOr),
        "==".value(TokenKind::Eq),
        "!=".value(TokenKind::Neq),
        ">=".value(TokenKind::Gte),
        ">".value(TokenKind::Gt),
        "<=".value(TokenKind::Lte),
        "<".value(TokenKind::Lt),
        '('.value(TokenKind::LParen),
        ')'.value(TokenKind::RParen),
        '['.value(TokenKind::LBracket),
        ']'.value(TokenKind::RBracket),
        ','.value(TokenKind::Comma),
    ))
    .parse_next(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        tokenize(input)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn simple_comparison() {
        assert_eq!(
            kinds("age >= 18"),
            vec![
                TokenKind::Ident("age".into()),
                TokenKind::Gte,
                TokenKind::Int(18),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn offsets_point_at_token_start() {
        let tokens = tokenize("  a == 'x'").unwrap();
        let offsets: Vec<usize> = tokens.iter().map(|t| t.offset).collect();
        assert_eq!(offsets, vec![2, 4, 7, 10]);
    }

    #[test]
    fn dotted_path_is_one_identifier() {
        assert_eq!(
            kinds("address.country"),
            vec![TokenKind::Ident("address.country".into()), TokenKind::Eof]
        );
    }

    #[test]
    fn keywords() {
        assert_eq!(
            kinds("x not in is empty true false"),
            vec![
                TokenKind::Ident("x".into()),
                TokenKind::Not,
                TokenKind::In,
                TokenKind::Is,
                TokenKind::Empty,
                TokenKind::Bool(true),
                TokenKind::Bool(false),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn keyword_prefix_stays_identifier() {
        assert_eq!(
            kinds("index isActive"),
            vec![
                TokenKind::Ident("index".into()),
                TokenKind::Ident("isActive".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn numbers() {
        assert_eq!(
            kinds("1 2.5 -3 -0.25"),
            vec![
                TokenKind::Int(1),
                TokenKind::Float(2.5),
                TokenKind::Int(-3),
                TokenKind::Float(-0.25),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn string_literals_with_escapes() {
        assert_eq!(
            kinds(r#"'it\'s' "say \"hi\"\n""#),
            vec![
                TokenKind::String("it's".into()),
                TokenKind::String("say \"hi\"\n".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn punctuation_and_logic() {
        assert_eq!(
            kinds("( [ , ] ) && || != < <="),
            vec![
                TokenKind::LParen,
                TokenKind::LBracket,
                TokenKind::Comma,
                TokenKind::RBracket,
                TokenKind::RParen,
                TokenKind::AndAnd,
                TokenKind::OrOr,
                TokenKind::Neq,
                TokenKind::Lt,
                TokenKind::Lte,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn empty_input_is_just_eof() {
        assert_eq!(kinds("   "), vec![TokenKind::Eof]);
    }

    #[test]
    fn unterminated_string() {
        let err = tokenize("name == 'bob").unwrap_err();
        assert_eq!(err.kind(), &ParseErrorKind::UnterminatedString);
        assert_eq!(err.offset(), 8);
        assert_eq!(err.expression(), "name == 'bob");
    }

    #[test]
    fn unknown_character() {
        let err = tokenize("a = 1").unwrap_err();
        assert_eq!(err.kind(), &ParseErrorKind::UnexpectedCharacter('='));
        assert_eq!(err.offset(), 2);
    }

    #[test]
    fn lone_minus_is_rejected() {
        let err = tokenize("a - b").unwrap_err();
        assert_eq!(err.kind(), &ParseErrorKind::UnexpectedCharacter('-'));
    }

    #[test]
    fn integer_overflow_is_invalid_number() {
        let err = tokenize("x == 99999999999999999999").unwrap_err();
        assert!(matches!(err.kind(), ParseErrorKind::InvalidNumber(_)));
    }

    #[test]
    fn offsets_count_characters_not_bytes() {
        let err = tokenize("name == 'é' $").unwrap_err();
        assert_eq!(err.offset(), 12);
    }
}
