pub mod ast;
pub mod lexer;
pub mod parser;
pub mod runtime;

use lexer::{LexicalError, TokenStream};
use parser::{Parser, ParserError};
use runtime::{RuntimeError, SymbolTable, SystemContext};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Lex(#[from] LexicalError),
    #[error(transparent)]
    Parse(#[from] ParserError),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

/// Runs a complete program: lexes `source`, parses the token sequence and
/// executes the root compound statement against a fresh root symbol table,
/// writing all output through `context`.
pub fn run_program<C: SystemContext>(source: &str, context: &mut C) -> Result<(), Error> {
    let tokens = TokenStream::lex(source)?;
    let program = Parser::new(tokens).parse()?;
    let mut globals = SymbolTable::new();
    program.execute(&mut globals, context)?;
    Ok(())
}
