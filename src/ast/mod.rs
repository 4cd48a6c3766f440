use crate::runtime::{
    equal, greater, greater_or_equal, less, less_or_equal, not_equal, Class, Instance,
    RuntimeError, SymbolTable, SystemContext, Value, ADD_METHOD, INIT_METHOD,
};
use compact_str::CompactString;
use std::sync::Arc;

/// Outcome of executing a node: either a plain value, or an in-flight
/// `return` travelling up to the enclosing method body.
///
/// Every node except `MethodBody` propagates `Return` upward unchanged;
/// `MethodBody` collapses it into the call's result.
#[derive(Debug)]
pub enum Flow {
    Value(Value),
    Return(Value),
}

impl Flow {
    pub fn into_value(self) -> Value {
        match self {
            Flow::Value(value) | Flow::Return(value) => value,
        }
    }
}

/// Evaluates a child node to a plain value, forwarding an in-flight
/// `return` out of the calling node.
macro_rules! eval {
    ($node:expr, $table:expr, $context:expr) => {
        match $node.execute($table, $context)? {
            Flow::Value(value) => value,
            flow @ Flow::Return(_) => return Ok(flow),
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticOp {
    Add,
    Sub,
    Mult,
    Div,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOp {
    Equal,
    NotEqual,
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
}

/// The executable node set. Statements and expressions share one type; an
/// expression is simply a node whose result the enclosing statement uses.
#[derive(Debug)]
pub enum Statement {
    /// A literal number, string, boolean or `None`.
    Constant(Value),
    /// A dotted identifier sequence, e.g. `self.counter.value`. The first
    /// segment resolves in the current symbol table, every further segment
    /// in the field table of the instance reached so far.
    VariableValue { path: Vec<CompactString> },
    /// `name = value`, binding into the current symbol table.
    Assignment {
        name: CompactString,
        value: Box<Statement>,
    },
    /// `object.field = value`, mutating the instance's field table.
    FieldAssignment {
        object: Box<Statement>,
        field: CompactString,
        value: Box<Statement>,
    },
    /// Allocation of a fresh instance, invoking a matching `__init__`.
    NewInstance {
        class: Arc<Class>,
        args: Vec<Statement>,
    },
    Print { args: Vec<Statement> },
    MethodCall {
        object: Box<Statement>,
        method: CompactString,
        args: Vec<Statement>,
    },
    /// `str(arg)`: the printed form of the argument as a string value.
    Stringify { arg: Box<Statement> },
    Arithmetic {
        op: ArithmeticOp,
        lhs: Box<Statement>,
        rhs: Box<Statement>,
    },
    Comparison {
        op: ComparisonOp,
        lhs: Box<Statement>,
        rhs: Box<Statement>,
    },
    Or {
        lhs: Box<Statement>,
        rhs: Box<Statement>,
    },
    And {
        lhs: Box<Statement>,
        rhs: Box<Statement>,
    },
    Not { arg: Box<Statement> },
    Compound(Vec<Statement>),
    IfElse {
        condition: Box<Statement>,
        then_branch: Box<Statement>,
        else_branch: Option<Box<Statement>>,
    },
    Return { value: Box<Statement> },
    /// The outermost node of every method, catching the `return` of its
    /// body. Nothing else stops an in-flight `return`.
    MethodBody { body: Box<Statement> },
    /// Binds the class descriptor under its name.
    ClassDefinition { class: Arc<Class> },
}

impl Statement {
    pub fn execute<C: SystemContext>(
        &self,
        table: &mut SymbolTable,
        context: &mut C,
    ) -> Result<Flow, RuntimeError> {
        match self {
            Statement::Constant(value) => Ok(Flow::Value(value.clone())),
            Statement::VariableValue { path } => execute_variable(path, table),
            Statement::Assignment { name, value } => {
                let value = eval!(value, table, context);
                table.insert(name.clone(), value.clone());
                Ok(Flow::Value(value))
            }
            Statement::FieldAssignment {
                object,
                field,
                value,
            } => execute_field_assignment(object, field, value, table, context),
            Statement::NewInstance { class, args } => {
                execute_new_instance(class, args, table, context)
            }
            Statement::Print { args } => execute_print(args, table, context),
            Statement::MethodCall {
                object,
                method,
                args,
            } => execute_method_call(object, method, args, table, context),
            Statement::Stringify { arg } => {
                let value = eval!(arg, table, context);
                Ok(Flow::Value(Value::String(value.repr(context)?)))
            }
            Statement::Arithmetic { op, lhs, rhs } => {
                execute_arithmetic(*op, lhs, rhs, table, context)
            }
            Statement::Comparison { op, lhs, rhs } => {
                execute_comparison(*op, lhs, rhs, table, context)
            }
            Statement::Or { lhs, rhs } => {
                let lhs = eval!(lhs, table, context);
                if lhs.is_true() {
                    return Ok(Flow::Value(Value::Bool(true)));
                }
                let rhs = eval!(rhs, table, context);
                Ok(Flow::Value(Value::Bool(rhs.is_true())))
            }
            Statement::And { lhs, rhs } => {
                let lhs = eval!(lhs, table, context);
                if !lhs.is_true() {
                    return Ok(Flow::Value(Value::Bool(false)));
                }
                let rhs = eval!(rhs, table, context);
                Ok(Flow::Value(Value::Bool(rhs.is_true())))
            }
            Statement::Not { arg } => {
                let arg = eval!(arg, table, context);
                Ok(Flow::Value(Value::Bool(!arg.is_true())))
            }
            Statement::Compound(statements) => {
                for statement in statements {
                    match statement.execute(table, context)? {
                        Flow::Value(_) => {}
                        flow @ Flow::Return(_) => return Ok(flow),
                    }
                }
                Ok(Flow::Value(Value::None))
            }
            Statement::IfElse {
                condition,
                then_branch,
                else_branch,
            } => {
                let condition = eval!(condition, table, context);
                if condition.is_true() {
                    then_branch.execute(table, context)
                } else if let Some(else_branch) = else_branch {
                    else_branch.execute(table, context)
                } else {
                    Ok(Flow::Value(Value::None))
                }
            }
            Statement::Return { value } => {
                let value = eval!(value, table, context);
                Ok(Flow::Return(value))
            }
            Statement::MethodBody { body } => {
                Ok(Flow::Value(body.execute(table, context)?.into_value()))
            }
            Statement::ClassDefinition { class } => {
                table.insert(class.name().into(), Value::Class(Arc::clone(class)));
                Ok(Flow::Value(Value::None))
            }
        }
    }
}

fn execute_variable(path: &[CompactString], table: &SymbolTable) -> Result<Flow, RuntimeError> {
    let (first, rest) = path
        .split_first()
        .expect("variable paths have at least one segment");
    let mut value = table
        .get(first)
        .cloned()
        .ok_or_else(|| RuntimeError::UndefinedVariable(first.clone()))?;
    for field in rest {
        value = match value {
            Value::Instance(instance) => {
                instance
                    .field(field)
                    .ok_or_else(|| RuntimeError::UndefinedField {
                        class: instance.class().name().into(),
                        field: field.clone(),
                    })?
            }
            other => return Err(RuntimeError::NotAnInstance(other)),
        };
    }
    Ok(Flow::Value(value))
}

fn execute_field_assignment<C: SystemContext>(
    object: &Statement,
    field: &CompactString,
    value: &Statement,
    table: &mut SymbolTable,
    context: &mut C,
) -> Result<Flow, RuntimeError> {
    let object = eval!(object, table, context);
    match object {
        Value::Instance(instance) => {
            let value = eval!(value, table, context);
            instance.set_field(field.clone(), value.clone());
            Ok(Flow::Value(value))
        }
        // Assigning through a non-instance is a silent no-op.
        _ => Ok(Flow::Value(Value::None)),
    }
}

fn execute_new_instance<C: SystemContext>(
    class: &Arc<Class>,
    args: &[Statement],
    table: &mut SymbolTable,
    context: &mut C,
) -> Result<Flow, RuntimeError> {
    let instance = Instance::new(Arc::clone(class));
    if class.method_with_arity(INIT_METHOD, args.len()).is_some() {
        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            values.push(eval!(arg, table, context));
        }
        instance.call(INIT_METHOD, &values, context)?;
    }
    Ok(Flow::Value(Value::Instance(instance)))
}

fn execute_print<C: SystemContext>(
    args: &[Statement],
    table: &mut SymbolTable,
    context: &mut C,
) -> Result<Flow, RuntimeError> {
    let mut line = String::new();
    for (index, arg) in args.iter().enumerate() {
        if index > 0 {
            line.push(' ');
        }
        let value = eval!(arg, table, context);
        line.push_str(&value.repr(context)?);
    }
    context.writeln(&line);
    Ok(Flow::Value(Value::None))
}

fn execute_method_call<C: SystemContext>(
    object: &Statement,
    method: &str,
    args: &[Statement],
    table: &mut SymbolTable,
    context: &mut C,
) -> Result<Flow, RuntimeError> {
    let receiver = eval!(object, table, context);
    match receiver {
        Value::Instance(instance) => {
            let mut values = Vec::with_capacity(args.len());
            for arg in args {
                values.push(eval!(arg, table, context));
            }
            Ok(Flow::Value(instance.call(method, &values, context)?))
        }
        // Calling through a non-instance quietly yields `None`.
        _ => Ok(Flow::Value(Value::None)),
    }
}

fn execute_arithmetic<C: SystemContext>(
    op: ArithmeticOp,
    lhs: &Statement,
    rhs: &Statement,
    table: &mut SymbolTable,
    context: &mut C,
) -> Result<Flow, RuntimeError> {
    let lhs = eval!(lhs, table, context);
    let rhs = eval!(rhs, table, context);
    let result = match (op, lhs, rhs) {
        (ArithmeticOp::Add, Value::Number(lhs), Value::Number(rhs)) => {
            Value::Number(lhs.wrapping_add(rhs))
        }
        (ArithmeticOp::Add, Value::String(lhs), Value::String(rhs)) => {
            let mut joined = lhs;
            joined.push_str(&rhs);
            Value::String(joined)
        }
        (ArithmeticOp::Add, Value::Instance(instance), rhs) => {
            instance.call(ADD_METHOD, &[rhs], context)?
        }
        (ArithmeticOp::Add, lhs, rhs) => return Err(RuntimeError::NonAddable(lhs, rhs)),
        (ArithmeticOp::Sub, Value::Number(lhs), Value::Number(rhs)) => {
            Value::Number(lhs.wrapping_sub(rhs))
        }
        (ArithmeticOp::Mult, Value::Number(lhs), Value::Number(rhs)) => {
            Value::Number(lhs.wrapping_mul(rhs))
        }
        (ArithmeticOp::Div, Value::Number(_), Value::Number(0)) => {
            return Err(RuntimeError::DivisionByZero)
        }
        (ArithmeticOp::Div, Value::Number(lhs), Value::Number(rhs)) => {
            Value::Number(lhs.wrapping_div(rhs))
        }
        (_, lhs, rhs) => return Err(RuntimeError::NonNumerics(lhs, rhs)),
    };
    Ok(Flow::Value(result))
}

fn execute_comparison<C: SystemContext>(
    op: ComparisonOp,
    lhs: &Statement,
    rhs: &Statement,
    table: &mut SymbolTable,
    context: &mut C,
) -> Result<Flow, RuntimeError> {
    let lhs = eval!(lhs, table, context);
    let rhs = eval!(rhs, table, context);
    let verdict = match op {
        ComparisonOp::Equal => equal(&lhs, &rhs, context)?,
        ComparisonOp::NotEqual => not_equal(&lhs, &rhs, context)?,
        ComparisonOp::Less => less(&lhs, &rhs, context)?,
        ComparisonOp::LessOrEqual => less_or_equal(&lhs, &rhs, context)?,
        ComparisonOp::Greater => greater(&lhs, &rhs, context)?,
        ComparisonOp::GreaterOrEqual => greater_or_equal(&lhs, &rhs, context)?,
    };
    Ok(Flow::Value(Value::Bool(verdict)))
}
