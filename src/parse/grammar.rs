//! Recursive-descent parser over the token stream.
//!
//! ```text
//! Expr       := Or
//! Or         := And ('||' And)*
//! And        := Primary ('&&' Primary)*
//! Primary    := '(' Expr ')' | Comparison
//! Comparison := Identifier Operator Value?
//! Operator   := '==' | '!=' | '>' | '>=' | '<' | '<=' | 'in'
//!             | 'not' 'in' | 'not' 'empty' | 'is' 'empty' | 'is' 'not' 'empty'
//! Value      := String | Number | Boolean | '[' (Value (',' Value)*)? ']'
//! ```

use crate::{ConditionOperator, Rule, Value};

use super::error::{ParseError, ParseErrorKind};
use super::lexer::{Token, TokenKind};

/// Deepest parenthesised nesting accepted before the parser gives up.
pub(crate) const MAX_DEPTH: usize = 256;

pub(crate) fn parse_tokens(tokens: &[Token]) -> Result<Rule, ParseError> {
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let rule = parser.expr()?;
    parser.expect_end()?;
    Ok(rule)
}

struct Parser<'t> {
    tokens: &'t [Token],
    pos: usize,
    depth: usize,
}

impl Parser<'_> {
    fn peek(&self) -> &TokenKind {
        self.tokens
            .get(self.pos)
            .map_or(&TokenKind::Eof, |t| &t.kind)
    }

    fn offset(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map_or(0, |t| t.offset)
    }

    fn advance(&mut self) -> TokenKind {
        let kind = self.peek().clone();
        if kind != TokenKind::Eof {
            self.pos += 1;
        }
        kind
    }

    fn unexpected(&self, expected: &'static str) -> ParseError {
        ParseError::new(
            ParseErrorKind::UnexpectedToken {
                expected,
                found: self.peek().to_string(),
            },
            self.offset(),
        )
    }

    fn expect_end(&self) -> Result<(), ParseError> {
        match self.peek() {
            TokenKind::Eof => Ok(()),
            _ => Err(self.unexpected("end of input")),
        }
    }

    // -- Expressions (precedence: OR < AND < primary) -----------------------

    fn expr(&mut self) -> Result<Rule, ParseError> {
        self.or_expr()
    }

    fn or_expr(&mut self) -> Result<Rule, ParseError> {
        let mut children = vec![self.and_expr()?];
        while *self.peek() == TokenKind::OrOr {
            self.advance();
            children.push(self.and_expr()?);
        }
        Ok(collapse(children, Rule::Or))
    }

    fn and_expr(&mut self) -> Result<Rule, ParseError> {
        let mut children = vec![self.primary()?];
        while *self.peek() == TokenKind::AndAnd {
            self.advance();
            children.push(self.primary()?);
        }
        Ok(collapse(children, Rule::And))
    }

    fn primary(&mut self) -> Result<Rule, ParseError> {
        if *self.peek() == TokenKind::LParen {
            if self.depth == MAX_DEPTH {
                return Err(ParseError::new(
                    ParseErrorKind::TooDeep(MAX_DEPTH),
                    self.offset(),
                ));
            }
            self.advance();
            self.depth += 1;
            let inner = self.expr()?;
            self.depth -= 1;
            if *self.peek() != TokenKind::RParen {
                return Err(self.unexpected("')'"));
            }
            self.advance();
            return Ok(inner);
        }
        self.comparison()
    }

    fn comparison(&mut self) -> Result<Rule, ParseError> {
        let TokenKind::Ident(field) = self.peek().clone() else {
            return Err(self.unexpected("field name or '('"));
        };
        self.advance();

        let operator = self.operator()?;
        let value = if operator.takes_value() {
            Some(self.value()?)
        } else {
            None
        };

        Ok(Rule::Condition {
            field,
            operator,
            value,
        })
    }

    fn operator(&mut self) -> Result<ConditionOperator, ParseError> {
        let op = match self.peek() {
            TokenKind::Eq => ConditionOperator::Equals,
            TokenKind::Neq => ConditionOperator::NotEquals,
            TokenKind::Gt => ConditionOperator::GreaterThan,
            TokenKind::Gte => ConditionOperator::GreaterThanOrEqual,
            TokenKind::Lt => ConditionOperator::LessThan,
            TokenKind::Lte => ConditionOperator::LessThanOrEqual,
            TokenKind::In => ConditionOperator::In,
            TokenKind::Not => {
                self.advance();
                return match self.peek() {
                    TokenKind::In => {
                        self.advance();
                        Ok(ConditionOperator::NotIn)
                    }
                    TokenKind::Empty => {
                        self.advance();
                        Ok(ConditionOperator::IsNotEmpty)
                    }
                    _ => Err(self.unexpected("'in' or 'empty' after 'not'")),
                };
            }
            TokenKind::Is => {
                self.advance();
                if *self.peek() == TokenKind::Not {
                    self.advance();
                    if *self.peek() != TokenKind::Empty {
                        return Err(self.unexpected("'empty' after 'is not'"));
                    }
                    self.advance();
                    return Ok(ConditionOperator::IsNotEmpty);
                }
                if *self.peek() != TokenKind::Empty {
                    return Err(self.unexpected("'empty' after 'is'"));
                }
                self.advance();
                return Ok(ConditionOperator::IsEmpty);
            }
            _ => return Err(self.unexpected("comparison operator")),
        };
        self.advance();
        Ok(op)
    }

    fn value(&mut self) -> Result<Value, ParseError> {
        let value = match self.peek() {
            TokenKind::String(s) => Value::String(s.clone()),
            TokenKind::Int(v) => Value::Int(*v),
            TokenKind::Float(v) => Value::Float(*v),
            TokenKind::Bool(v) => Value::Bool(*v),
            TokenKind::LBracket => return self.array(),
            _ => return Err(self.unexpected("value")),
        };
        self.advance();
        Ok(value)
    }

    fn array(&mut self) -> Result<Value, ParseError> {
        self.advance();
        let mut items = Vec::new();
        if *self.peek() == TokenKind::RBracket {
            self.advance();
            return Ok(Value::Array(items));
        }
        loop {
            items.push(self.value()?);
            match self.peek() {
                TokenKind::Comma => {
                    self.advance();
                }
                TokenKind::RBracket => {
                    self.advance();
                    return Ok(Value::Array(items));
                }
                _ => return Err(self.unexpected("',' or ']'")),
            }
        }
    }
}

/// A single operand is returned as-is rather than wrapped in a one-element combinator.
fn collapse(mut children: Vec<Rule>, wrap: fn(Vec<Rule>) -> Rule) -> Rule {
    if children.len() == 1 {
        if let Some(only) = children.pop() {
            return only;
        }
    }
    wrap(children)
}
