mod error;

pub use error::ParserError;

use crate::ast::{ArithmeticOp, ComparisonOp, Statement};
use crate::lexer::{Token, TokenStream};
use crate::runtime::{Class, Method, Value};
use compact_str::CompactString;
use std::collections::HashMap;
use std::sync::Arc;

/// Recursive-descent parser over the materialized token sequence.
///
/// Classes are resolved at parse time: a call of a bare name builds a
/// `NewInstance` node holding the class descriptor declared earlier in the
/// program, so `class B(A):` requires `A` to already be known.
pub struct Parser {
    tokens: TokenStream,
    classes: HashMap<CompactString, Arc<Class>>,
}

impl Parser {
    pub fn new(tokens: TokenStream) -> Self {
        Self {
            tokens,
            classes: HashMap::new(),
        }
    }

    /// Parses a whole program into its root compound statement.
    pub fn parse(mut self) -> Result<Statement, ParserError> {
        let mut statements = Vec::new();
        while *self.tokens.current() != Token::Eof {
            let statement = match self.tokens.current() {
                Token::Class => self.parse_class_definition()?,
                _ => self.parse_statement()?,
            };
            statements.push(statement);
        }
        Ok(Statement::Compound(statements))
    }
}

// Token plumbing
impl Parser {
    fn take(&mut self) -> Token {
        let token = self.tokens.current().clone();
        self.tokens.advance();
        token
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.tokens.current() == expected {
            self.tokens.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: Token, description: &'static str) -> Result<(), ParserError> {
        if *self.tokens.current() == expected {
            self.tokens.advance();
            Ok(())
        } else {
            Err(ParserError::UnexpectedToken {
                expected: description,
                actual: self.tokens.current().clone(),
            })
        }
    }

    fn expect_identifier(&mut self) -> Result<CompactString, ParserError> {
        match self.take() {
            Token::Id(name) => Ok(name),
            token => Err(ParserError::UnexpectedToken {
                expected: "an identifier",
                actual: token,
            }),
        }
    }
}

// Statements
impl Parser {
    /// A statement valid both at top level and inside a suite.
    fn parse_statement(&mut self) -> Result<Statement, ParserError> {
        match self.tokens.current() {
            Token::If => self.parse_if_else(),
            Token::Class => Err(ParserError::InvalidStatement(Token::Class)),
            _ => {
                let statement = self.parse_simple_statement()?;
                self.expect(Token::Newline, "end of line")?;
                Ok(statement)
            }
        }
    }

    fn parse_simple_statement(&mut self) -> Result<Statement, ParserError> {
        match self.tokens.current() {
            Token::Return => {
                self.tokens.advance();
                let value = if *self.tokens.current() == Token::Newline {
                    Statement::Constant(Value::None)
                } else {
                    self.parse_expression()?
                };
                Ok(Statement::Return {
                    value: Box::new(value),
                })
            }
            Token::Print => {
                self.tokens.advance();
                let mut args = Vec::new();
                if *self.tokens.current() != Token::Newline {
                    loop {
                        args.push(self.parse_expression()?);
                        if !self.eat(&Token::Char(',')) {
                            break;
                        }
                    }
                }
                Ok(Statement::Print { args })
            }
            Token::Id(_) => self.parse_assignment_or_expression(),
            _ => self.parse_expression(),
        }
    }

    /// Disambiguates `target = expr` from a bare expression by trying the
    /// dotted target first and rewinding when no `=` follows.
    fn parse_assignment_or_expression(&mut self) -> Result<Statement, ParserError> {
        let start = self.tokens.position();
        let mut path = self.parse_dotted_path()?;
        if !self.eat(&Token::Char('=')) {
            self.tokens.rewind(start);
            return self.parse_expression();
        }
        let value = Box::new(self.parse_expression()?);
        let field = path.pop().expect("dotted paths are never empty");
        if path.is_empty() {
            Ok(Statement::Assignment { name: field, value })
        } else {
            Ok(Statement::FieldAssignment {
                object: Box::new(Statement::VariableValue { path }),
                field,
                value,
            })
        }
    }

    fn parse_dotted_path(&mut self) -> Result<Vec<CompactString>, ParserError> {
        let mut path = vec![self.expect_identifier()?];
        while self.eat(&Token::Char('.')) {
            path.push(self.expect_identifier()?);
        }
        Ok(path)
    }

    fn parse_if_else(&mut self) -> Result<Statement, ParserError> {
        self.expect(Token::If, "`if`")?;
        let condition = Box::new(self.parse_expression()?);
        let then_branch = Box::new(self.parse_suite()?);
        let else_branch = if self.eat(&Token::Else) {
            Some(Box::new(self.parse_suite()?))
        } else {
            None
        };
        Ok(Statement::IfElse {
            condition,
            then_branch,
            else_branch,
        })
    }

    /// `":" Newline Indent statement+ Dedent`, the body of an `if`, `else`
    /// or `def`.
    fn parse_suite(&mut self) -> Result<Statement, ParserError> {
        self.expect(Token::Char(':'), "`:`")?;
        self.expect(Token::Newline, "end of line")?;
        self.expect(Token::Indent, "an indented block")?;
        let mut statements = Vec::new();
        while !self.eat(&Token::Dedent) {
            statements.push(self.parse_statement()?);
        }
        Ok(Statement::Compound(statements))
    }

    fn parse_class_definition(&mut self) -> Result<Statement, ParserError> {
        self.expect(Token::Class, "`class`")?;
        let name = self.expect_identifier()?;
        let parent = if self.eat(&Token::Char('(')) {
            let parent_name = self.expect_identifier()?;
            self.expect(Token::Char(')'), "`)`")?;
            let parent = self
                .classes
                .get(&parent_name)
                .cloned()
                .ok_or(ParserError::UnknownClass(parent_name))?;
            Some(parent)
        } else {
            None
        };
        self.expect(Token::Char(':'), "`:`")?;
        self.expect(Token::Newline, "end of line")?;
        self.expect(Token::Indent, "an indented block")?;
        let mut methods = Vec::new();
        while !self.eat(&Token::Dedent) {
            methods.push(self.parse_method()?);
        }
        let class = Arc::new(Class::new(name.clone(), methods, parent));
        self.classes.insert(name, Arc::clone(&class));
        Ok(Statement::ClassDefinition { class })
    }

    fn parse_method(&mut self) -> Result<Method, ParserError> {
        self.expect(Token::Def, "`def`")?;
        let name = self.expect_identifier()?;
        self.expect(Token::Char('('), "`(`")?;
        let mut params = Vec::new();
        if !self.eat(&Token::Char(')')) {
            loop {
                params.push(self.expect_identifier()?);
                if self.eat(&Token::Char(',')) {
                    continue;
                }
                self.expect(Token::Char(')'), "`)` or `,`")?;
                break;
            }
        }
        let body = self.parse_suite()?;
        Ok(Method {
            name,
            params,
            body: Statement::MethodBody {
                body: Box::new(body),
            },
        })
    }
}

// Expressions
impl Parser {
    fn parse_expression(&mut self) -> Result<Statement, ParserError> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<Statement, ParserError> {
        let mut lhs = self.parse_and()?;
        while self.eat(&Token::Or) {
            let rhs = self.parse_and()?;
            lhs = Statement::Or {
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Statement, ParserError> {
        let mut lhs = self.parse_not()?;
        while self.eat(&Token::And) {
            let rhs = self.parse_not()?;
            lhs = Statement::And {
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn parse_not(&mut self) -> Result<Statement, ParserError> {
        if self.eat(&Token::Not) {
            let arg = Box::new(self.parse_not()?);
            Ok(Statement::Not { arg })
        } else {
            self.parse_comparison()
        }
    }

    fn parse_comparison(&mut self) -> Result<Statement, ParserError> {
        let lhs = self.parse_arithmetic()?;
        let op = match self.tokens.current() {
            Token::Eq => Some(ComparisonOp::Equal),
            Token::NotEq => Some(ComparisonOp::NotEqual),
            Token::LessOrEq => Some(ComparisonOp::LessOrEqual),
            Token::GreaterOrEq => Some(ComparisonOp::GreaterOrEqual),
            Token::Char('<') => Some(ComparisonOp::Less),
            Token::Char('>') => Some(ComparisonOp::Greater),
            _ => None,
        };
        let Some(op) = op else {
            return Ok(lhs);
        };
        self.tokens.advance();
        let rhs = self.parse_arithmetic()?;
        Ok(Statement::Comparison {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        })
    }

    fn parse_arithmetic(&mut self) -> Result<Statement, ParserError> {
        let mut lhs = self.parse_term()?;
        loop {
            let op = match self.tokens.current() {
                Token::Char('+') => ArithmeticOp::Add,
                Token::Char('-') => ArithmeticOp::Sub,
                _ => break,
            };
            self.tokens.advance();
            let rhs = self.parse_term()?;
            lhs = Statement::Arithmetic {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn parse_term(&mut self) -> Result<Statement, ParserError> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.tokens.current() {
                Token::Char('*') => ArithmeticOp::Mult,
                Token::Char('/') => ArithmeticOp::Div,
                _ => break,
            };
            self.tokens.advance();
            let rhs = self.parse_unary()?;
            lhs = Statement::Arithmetic {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Statement, ParserError> {
        if !self.eat(&Token::Char('-')) {
            return self.parse_primary();
        }
        // A minus directly on a number literal folds into the constant.
        if let Token::Number(value) = self.tokens.current() {
            let value = *value;
            self.tokens.advance();
            return Ok(Statement::Constant(Value::Number(-value)));
        }
        let rhs = self.parse_unary()?;
        Ok(Statement::Arithmetic {
            op: ArithmeticOp::Sub,
            lhs: Box::new(Statement::Constant(Value::Number(0))),
            rhs: Box::new(rhs),
        })
    }

    fn parse_primary(&mut self) -> Result<Statement, ParserError> {
        match self.take() {
            Token::Number(value) => Ok(Statement::Constant(Value::Number(value))),
            Token::String(value) => Ok(Statement::Constant(Value::String(value))),
            Token::True => Ok(Statement::Constant(Value::Bool(true))),
            Token::False => Ok(Statement::Constant(Value::Bool(false))),
            Token::None => Ok(Statement::Constant(Value::None)),
            Token::Char('(') => {
                let inner = self.parse_expression()?;
                self.expect(Token::Char(')'), "`)`")?;
                Ok(inner)
            }
            Token::Id(name) => self.parse_postfix(name),
            token => Err(ParserError::NonExpression(token)),
        }
    }

    /// A dotted name, optionally called: a plain lookup, a `str(..)`
    /// stringification, an instantiation of a declared class, or a method
    /// call on the object named by all but the last segment.
    fn parse_postfix(&mut self, first: CompactString) -> Result<Statement, ParserError> {
        let mut path = vec![first];
        while self.eat(&Token::Char('.')) {
            path.push(self.expect_identifier()?);
        }
        if *self.tokens.current() != Token::Char('(') {
            return Ok(Statement::VariableValue { path });
        }
        let args = self.parse_arguments()?;
        if path.len() > 1 {
            let method = path.pop().expect("dotted paths are never empty");
            return Ok(Statement::MethodCall {
                object: Box::new(Statement::VariableValue { path }),
                method,
                args,
            });
        }
        let name = path.pop().expect("dotted paths are never empty");
        if name == "str" {
            if args.len() != 1 {
                return Err(ParserError::StringifyArity(args.len()));
            }
            let arg = args.into_iter().next().expect("arity was just checked");
            return Ok(Statement::Stringify { arg: Box::new(arg) });
        }
        match self.classes.get(&name) {
            Some(class) => Ok(Statement::NewInstance {
                class: Arc::clone(class),
                args,
            }),
            None => Err(ParserError::UnknownClass(name)),
        }
    }

    fn parse_arguments(&mut self) -> Result<Vec<Statement>, ParserError> {
        self.expect(Token::Char('('), "`(`")?;
        let mut args = Vec::new();
        if self.eat(&Token::Char(')')) {
            return Ok(args);
        }
        loop {
            args.push(self.parse_expression()?);
            if self.eat(&Token::Char(',')) {
                continue;
            }
            self.expect(Token::Char(')'), "`)` or `,`")?;
            break;
        }
        Ok(args)
    }
}
