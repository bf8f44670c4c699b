mod error;
mod grammar;
mod lexer;

pub use error::{ParseError, ParseErrorKind};
pub use lexer::{tokenize, Token, TokenKind};
pub(crate) use lexer::{char_offset, ident, number_value, string_literal, unsigned_number};

use crate::Rule;

/// Parse a condition expression such as `age >= 18 && country in ['NZ', 'AU']`
/// into a [`Rule`].
///
/// # Errors
///
/// Returns [`ParseError`] if the expression is not valid syntax. The error
/// carries the expression and the character offset of the failure.
pub fn parse(expression: &str) -> Result<Rule, ParseError> {
    let tokens = tokenize(expression)?;
    grammar::parse_tokens(&tokens).map_err(|e| e.in_expression(expression))
}

impl std::str::FromStr for Rule {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s)
    }
}

/// Whether `expression` parses.
#[must_use]
pub fn validate(expression: &str) -> bool {
    parse(expression).is_ok()
}

/// Field paths referenced by `expression`, de-duplicated, in first-seen order.
///
/// Returns an empty list when the expression does not parse.
#[must_use]
pub fn extract_dependencies(expression: &str) -> Vec<String> {
    parse(expression)
        .map(|rule| {
            rule.referenced_fields()
                .into_iter()
                .map(str::to_owned)
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_reports_success() {
        assert!(validate("a == 1"));
        assert!(!validate("a =="));
    }

    #[test]
    fn extract_dependencies_walks_whole_tree() {
        assert_eq!(
            extract_dependencies("a == 1 && (b > 2 || a < 0) && c.d is empty"),
            vec!["a", "b", "c.d"]
        );
    }

    #[test]
    fn extract_dependencies_of_invalid_expression_is_empty() {
        assert!(extract_dependencies("a == 'unterminated").is_empty());
    }

    #[test]
    fn rule_from_str() {
        let rule: Rule = "flag == true".parse().unwrap();
        assert_eq!(rule, crate::field("flag").eq(true));
    }

    #[test]
    fn parse_error_carries_expression() {
        let err = parse("x >").unwrap_err();
        assert_eq!(err.expression(), "x >");
        assert_eq!(err.offset(), 3);
    }
}
