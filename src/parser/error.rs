use crate::lexer::Token;
use compact_str::CompactString;
use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum ParserError {
    #[error("expected {expected} but found {actual}")]
    UnexpectedToken {
        expected: &'static str,
        actual: Token,
    },
    #[error("expected an expression but found {0}")]
    NonExpression(Token),
    #[error("expected a statement but found {0}")]
    InvalidStatement(Token),
    #[error("unknown class `{0}`")]
    UnknownClass(CompactString),
    #[error("`str` expects exactly one argument but got {0}")]
    StringifyArity(usize),
}
