//! Formula grammar, lowest precedence first:
//!
//! ```text
//! Ternary        := Or ('?' Ternary ':' Ternary)?
//! Or             := And ('||' And)*
//! And            := Equality ('&&' Equality)*
//! Equality       := Comparison (('==' | '!=') Comparison)*
//! Comparison     := Additive (('>' | '>=' | '<' | '<=') Additive)*
//! Additive       := Multiplicative (('+' | '-') Multiplicative)*
//! Multiplicative := Unary (('*' | '/' | '%') Unary)*
//! Unary          := ('!' | '-') Unary | Primary
//! Primary        := Number | String | 'true' | 'false' | 'null'
//!                 | Identifier | Identifier '(' Args ')' | '(' Ternary ')'
//! ```

use super::error::FormulaError;
use super::lexer::{Spanned, Tok};
use crate::Value;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Expr {
    Literal(Value),
    Field(String),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Conditional {
        condition: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },
    Call(Function, Box<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UnaryOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    And,
    Or,
}

impl BinaryOp {
    pub(crate) fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Eq => "==",
            BinaryOp::Neq => "!=",
            BinaryOp::Gt => ">",
            BinaryOp::Gte => ">=",
            BinaryOp::Lt => "<",
            BinaryOp::Lte => "<=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }
}

/// The whitelisted numeric functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Function {
    Round,
    Floor,
    Ceil,
    Abs,
}

impl Function {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "round" => Some(Function::Round),
            "floor" => Some(Function::Floor),
            "ceil" => Some(Function::Ceil),
            "abs" => Some(Function::Abs),
            _ => None,
        }
    }

    pub(crate) fn name(self) -> &'static str {
        match self {
            Function::Round => "round",
            Function::Floor => "floor",
            Function::Ceil => "ceil",
            Function::Abs => "abs",
        }
    }
}

/// Deepest expression tree the parser builds. Parentheses, nested ternaries,
/// stacked unary operators and each extra operand of a binary chain all count.
const MAX_DEPTH: usize = 128;

/// Parse a token stream into an expression tree, resolving every identifier
/// against `allowed`. Returns the tree and the referenced fields in
/// first-seen order.
pub(crate) fn parse<S: AsRef<str>>(
    tokens: &[Spanned],
    allowed: &[S],
) -> Result<(Expr, Vec<String>), FormulaError> {
    let mut parser = Parser {
        tokens,
        pos: 0,
        allowed,
        fields: Vec::new(),
        depth: 0,
    };
    let expr = parser.ternary()?;
    if *parser.peek() != Tok::Eof {
        return Err(parser.unexpected("operator or end of formula"));
    }
    Ok((expr, parser.fields))
}

struct Parser<'t, 'a, S> {
    tokens: &'t [Spanned],
    pos: usize,
    allowed: &'a [S],
    fields: Vec<String>,
    depth: usize,
}

impl<S: AsRef<str>> Parser<'_, '_, S> {
    fn peek(&self) -> &Tok {
        self.tokens.get(self.pos).map_or(&Tok::Eof, |t| &t.tok)
    }

    fn offset(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map_or(0, |t| t.offset)
    }

    fn advance(&mut self) -> Tok {
        let tok = self.peek().clone();
        if tok != Tok::Eof {
            self.pos += 1;
        }
        tok
    }

    fn unexpected(&self, expected: &str) -> FormulaError {
        FormulaError::Syntax {
            offset: self.offset(),
            message: format!("expected {expected}, found {}", self.peek()),
        }
    }

    fn expect(&mut self, tok: Tok, expected: &str) -> Result<(), FormulaError> {
        if *self.peek() != tok {
            return Err(self.unexpected(expected));
        }
        self.advance();
        Ok(())
    }

    fn descend(&mut self) -> Result<(), FormulaError> {
        if self.depth == MAX_DEPTH {
            return Err(FormulaError::Syntax {
                offset: self.offset(),
                message: format!("expression nested deeper than {MAX_DEPTH} levels"),
            });
        }
        self.depth += 1;
        Ok(())
    }

    fn ternary(&mut self) -> Result<Expr, FormulaError> {
        self.descend()?;
        let expr = self.conditional();
        self.depth -= 1;
        expr
    }

    fn conditional(&mut self) -> Result<Expr, FormulaError> {
        let condition = self.or_expr()?;
        if *self.peek() != Tok::Question {
            return Ok(condition);
        }
        self.advance();
        let then = self.ternary()?;
        self.expect(Tok::Colon, "':'")?;
        let otherwise = self.ternary()?;
        Ok(Expr::Conditional {
            condition: Box::new(condition),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        })
    }

    /// One left-associative precedence level.
    fn binary_level(
        &mut self,
        next: fn(&mut Self) -> Result<Expr, FormulaError>,
        op_for: fn(&Tok) -> Option<BinaryOp>,
    ) -> Result<Expr, FormulaError> {
        let depth = self.depth;
        let mut left = next(self)?;
        while let Some(op) = op_for(self.peek()) {
            self.descend()?;
            self.advance();
            let right = next(self)?;
            left = Expr::Binary(op, Box::new(left), Box::new(right));
        }
        self.depth = depth;
        Ok(left)
    }

    fn or_expr(&mut self) -> Result<Expr, FormulaError> {
        self.binary_level(Self::and_expr, |t| match t {
            Tok::OrOr => Some(BinaryOp::Or),
            _ => None,
        })
    }

    fn and_expr(&mut self) -> Result<Expr, FormulaError> {
        self.binary_level(Self::equality, |t| match t {
            Tok::AndAnd => Some(BinaryOp::And),
            _ => None,
        })
    }

    fn equality(&mut self) -> Result<Expr, FormulaError> {
        self.binary_level(Self::comparison, |t| match t {
            Tok::EqEq => Some(BinaryOp::Eq),
            Tok::Neq => Some(BinaryOp::Neq),
            _ => None,
        })
    }

    fn comparison(&mut self) -> Result<Expr, FormulaError> {
        self.binary_level(Self::additive, |t| match t {
            Tok::Gt => Some(BinaryOp::Gt),
            Tok::Gte => Some(BinaryOp::Gte),
            Tok::Lt => Some(BinaryOp::Lt),
            Tok::Lte => Some(BinaryOp::Lte),
            _ => None,
        })
    }

    fn additive(&mut self) -> Result<Expr, FormulaError> {
        self.binary_level(Self::multiplicative, |t| match t {
            Tok::Plus => Some(BinaryOp::Add),
            Tok::Minus => Some(BinaryOp::Sub),
            _ => None,
        })
    }

    fn multiplicative(&mut self) -> Result<Expr, FormulaError> {
        self.binary_level(Self::unary, |t| match t {
            Tok::Star => Some(BinaryOp::Mul),
            Tok::Slash => Some(BinaryOp::Div),
            Tok::Percent => Some(BinaryOp::Rem),
            _ => None,
        })
    }

    fn unary(&mut self) -> Result<Expr, FormulaError> {
        let op = match self.peek() {
            Tok::Bang => UnaryOp::Not,
            Tok::Minus => UnaryOp::Neg,
            _ => return self.primary(),
        };
        self.descend()?;
        self.advance();
        let operand = self.unary()?;
        self.depth -= 1;
        Ok(Expr::Unary(op, Box::new(operand)))
    }

    fn primary(&mut self) -> Result<Expr, FormulaError> {
        let expr = match self.peek().clone() {
            Tok::Number(v) => Expr::Literal(v),
            Tok::Str(s) => Expr::Literal(Value::String(s)),
            Tok::True => Expr::Literal(Value::Bool(true)),
            Tok::False => Expr::Literal(Value::Bool(false)),
            Tok::Null => Expr::Literal(Value::Null),
            Tok::LParen => {
                self.advance();
                let inner = self.ternary()?;
                self.expect(Tok::RParen, "')'")?;
                return Ok(inner);
            }
            Tok::Ident(name) => {
                self.advance();
                return if *self.peek() == Tok::LParen {
                    self.call(&name)
                } else {
                    self.field(name)
                };
            }
            _ => return Err(self.unexpected("operand")),
        };
        self.advance();
        Ok(expr)
    }

    fn field(&mut self, name: String) -> Result<Expr, FormulaError> {
        if !self.allowed.iter().any(|a| a.as_ref() == name) {
            return Err(FormulaError::UnknownIdentifier(name));
        }
        if !self.fields.contains(&name) {
            self.fields.push(name.clone());
        }
        Ok(Expr::Field(name))
    }

    fn call(&mut self, name: &str) -> Result<Expr, FormulaError> {
        let function =
            Function::from_name(name).ok_or_else(|| FormulaError::UnknownFunction(name.to_owned()))?;
        self.advance();

        let mut args = Vec::new();
        if *self.peek() != Tok::RParen {
            loop {
                args.push(self.ternary()?);
                if *self.peek() != Tok::Comma {
                    break;
                }
                self.advance();
            }
        }
        self.expect(Tok::RParen, "')'")?;

        let found = args.len();
        match args.pop() {
            Some(arg) if found == 1 => Ok(Expr::Call(function, Box::new(arg))),
            _ => Err(FormulaError::Arity {
                function: function.name(),
                expected: 1,
                found,
            }),
        }
    }
}
