use super::Value;
use compact_str::CompactString;
use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum RuntimeError {
    #[error("undefined name `{0}`")]
    UndefinedVariable(CompactString),
    #[error("`{class}` instance has no field `{field}`")]
    UndefinedField {
        class: CompactString,
        field: CompactString,
    },
    #[error("{0} is not an instance")]
    NotAnInstance(Value),
    #[error("`{class}` has no method `{method}` taking {arity} argument(s)")]
    UnknownMethod {
        class: CompactString,
        method: CompactString,
        arity: usize,
    },
    #[error("cannot add {0} and {1}")]
    NonAddable(Value, Value),
    #[error("expected two numbers but got {0} and {1}")]
    NonNumerics(Value, Value),
    #[error("division by zero")]
    DivisionByZero,
    #[error("cannot compare {0} and {1}")]
    NotComparable(Value, Value),
}
