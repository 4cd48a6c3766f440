pub mod context;
pub mod error;

pub use context::{BufferedContext, StdioContext, SystemContext};
pub use error::RuntimeError;

use crate::ast::Statement;
use compact_str::{format_compact, CompactString, ToCompactString};
use std::collections::HashMap;
use std::fmt::Display;
use std::sync::{Arc, Mutex};

pub const INIT_METHOD: &str = "__init__";
pub const STR_METHOD: &str = "__str__";
pub const EQ_METHOD: &str = "__eq__";
pub const LT_METHOD: &str = "__lt__";
pub const ADD_METHOD: &str = "__add__";

/// Name bound to the receiver in every method call frame.
pub const SELF_NAME: &str = "self";

/// Mapping from identifier to value. The root table holds globals; a fresh
/// table is created for every method call; every instance owns one as its
/// field table.
pub type SymbolTable = HashMap<CompactString, Value>;

/// The universe of runtime values.
///
/// Scalars behave as value types; `Instance` values are reference-shared, so
/// cloning a binding aliases the same mutable field table.
#[derive(Debug, Clone)]
pub enum Value {
    None,
    Number(i32),
    String(CompactString),
    Bool(bool),
    Class(Arc<Class>),
    Instance(Arc<Instance>),
}

impl Value {
    pub fn is_true(&self) -> bool {
        match self {
            Value::None => false,
            Value::Number(value) => *value != 0,
            Value::String(value) => !value.is_empty(),
            Value::Bool(value) => *value,
            Value::Class(_) | Value::Instance(_) => true,
        }
    }

    /// The printed form of the value. An instance whose class defines a
    /// zero-argument `__str__` is shown through that method; otherwise an
    /// address-like token identifies it.
    pub fn repr<C: SystemContext>(&self, context: &mut C) -> Result<CompactString, RuntimeError> {
        match self {
            Value::Instance(instance) => {
                if instance.has_method(STR_METHOD, 0) {
                    let shown = instance.call(STR_METHOD, &[], context)?;
                    shown.repr(context)
                } else {
                    Ok(format_compact!(
                        "<{} instance at {:p}>",
                        instance.class().name(),
                        Arc::as_ptr(instance)
                    ))
                }
            }
            other => Ok(other.to_compact_string()),
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::None => write!(f, "None"),
            Value::Number(value) => write!(f, "{value}"),
            Value::String(value) => write!(f, "{value}"),
            Value::Bool(true) => write!(f, "True"),
            Value::Bool(false) => write!(f, "False"),
            Value::Class(class) => write!(f, "Class {}", class.name()),
            Value::Instance(instance) => write!(f, "<{} instance>", instance.class().name()),
        }
    }
}

/// A method of a class: its name, the ordered formal parameter names and the
/// executable body. The implicit `self` receiver is not listed among the
/// parameters.
#[derive(Debug)]
pub struct Method {
    pub name: CompactString,
    pub params: Vec<CompactString>,
    pub body: Statement,
}

/// An immutable class descriptor with single inheritance.
#[derive(Debug)]
pub struct Class {
    name: CompactString,
    methods: Vec<Method>,
    parent: Option<Arc<Class>>,
}

impl Class {
    pub fn new(
        name: impl Into<CompactString>,
        methods: Vec<Method>,
        parent: Option<Arc<Class>>,
    ) -> Self {
        Self {
            name: name.into(),
            methods,
            parent,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The first method with the given name, searching this class in
    /// declaration order and then its ancestors. A later method of the same
    /// name never shadows an earlier one.
    pub fn method(&self, name: &str) -> Option<&Method> {
        if let Some(method) = self.methods.iter().find(|method| method.name == name) {
            return Some(method);
        }
        self.parent.as_deref().and_then(|parent| parent.method(name))
    }

    /// Resolves a method by name first; the arity of that single candidate
    /// must then match.
    pub fn method_with_arity(&self, name: &str, arity: usize) -> Option<&Method> {
        self.method(name).filter(|method| method.params.len() == arity)
    }
}

/// A live object: a reference to its class descriptor plus a mutable field
/// table. Bindings share the instance, so mutations through one alias are
/// observed through every other.
#[derive(Debug)]
pub struct Instance {
    class: Arc<Class>,
    fields: Mutex<SymbolTable>,
}

impl Instance {
    pub fn new(class: Arc<Class>) -> Arc<Self> {
        Arc::new(Self {
            class,
            fields: Mutex::new(SymbolTable::new()),
        })
    }

    pub fn class(&self) -> &Arc<Class> {
        &self.class
    }

    pub fn field(&self, name: &str) -> Option<Value> {
        self.fields.lock().unwrap().get(name).cloned()
    }

    pub fn set_field(&self, name: impl Into<CompactString>, value: Value) {
        self.fields.lock().unwrap().insert(name.into(), value);
    }

    pub fn has_method(&self, name: &str, arity: usize) -> bool {
        self.class.method_with_arity(name, arity).is_some()
    }

    /// Invokes a method on this instance: resolves it by (name, arity),
    /// builds a fresh call frame binding `self` and the formal parameters,
    /// and executes the body against the caller's context.
    pub fn call<C: SystemContext>(
        self: &Arc<Self>,
        name: &str,
        args: &[Value],
        context: &mut C,
    ) -> Result<Value, RuntimeError> {
        let method = self.class.method_with_arity(name, args.len()).ok_or_else(|| {
            RuntimeError::UnknownMethod {
                class: self.class.name.clone(),
                method: name.to_compact_string(),
                arity: args.len(),
            }
        })?;
        let mut locals = SymbolTable::new();
        locals.insert(SELF_NAME.into(), Value::Instance(Arc::clone(self)));
        for (param, arg) in method.params.iter().zip(args) {
            locals.insert(param.clone(), arg.clone());
        }
        Ok(method.body.execute(&mut locals, context)?.into_value())
    }
}

/// Equality. `None` equals only `None`; an instance whose class defines a
/// one-argument `__eq__` decides for itself, coerced through `is_true`;
/// scalars of the same kind compare by value. Everything else fails.
pub fn equal<C: SystemContext>(
    lhs: &Value,
    rhs: &Value,
    context: &mut C,
) -> Result<bool, RuntimeError> {
    if let (Value::None, Value::None) = (lhs, rhs) {
        return Ok(true);
    }
    if let Value::Instance(instance) = lhs {
        if instance.has_method(EQ_METHOD, 1) {
            let verdict = instance.call(EQ_METHOD, std::slice::from_ref(rhs), context)?;
            return Ok(verdict.is_true());
        }
    }
    match (lhs, rhs) {
        (Value::Number(lhs), Value::Number(rhs)) => Ok(lhs == rhs),
        (Value::String(lhs), Value::String(rhs)) => Ok(lhs == rhs),
        (Value::Bool(lhs), Value::Bool(rhs)) => Ok(lhs == rhs),
        _ => Err(RuntimeError::NotComparable(lhs.clone(), rhs.clone())),
    }
}

/// Strict ordering. An instance whose class defines a one-argument `__lt__`
/// decides for itself; scalars of the same kind use their natural order,
/// strings byte-wise and `False < True`. `None` has no order at all.
pub fn less<C: SystemContext>(
    lhs: &Value,
    rhs: &Value,
    context: &mut C,
) -> Result<bool, RuntimeError> {
    if let Value::Instance(instance) = lhs {
        if instance.has_method(LT_METHOD, 1) {
            let verdict = instance.call(LT_METHOD, std::slice::from_ref(rhs), context)?;
            return Ok(verdict.is_true());
        }
    }
    match (lhs, rhs) {
        (Value::Number(lhs), Value::Number(rhs)) => Ok(lhs < rhs),
        (Value::String(lhs), Value::String(rhs)) => Ok(lhs < rhs),
        (Value::Bool(lhs), Value::Bool(rhs)) => Ok(lhs < rhs),
        _ => Err(RuntimeError::NotComparable(lhs.clone(), rhs.clone())),
    }
}

pub fn not_equal<C: SystemContext>(
    lhs: &Value,
    rhs: &Value,
    context: &mut C,
) -> Result<bool, RuntimeError> {
    Ok(!equal(lhs, rhs, context)?)
}

pub fn greater<C: SystemContext>(
    lhs: &Value,
    rhs: &Value,
    context: &mut C,
) -> Result<bool, RuntimeError> {
    Ok(!less(lhs, rhs, context)? && !equal(lhs, rhs, context)?)
}

pub fn less_or_equal<C: SystemContext>(
    lhs: &Value,
    rhs: &Value,
    context: &mut C,
) -> Result<bool, RuntimeError> {
    Ok(!greater(lhs, rhs, context)?)
}

pub fn greater_or_equal<C: SystemContext>(
    lhs: &Value,
    rhs: &Value,
    context: &mut C,
) -> Result<bool, RuntimeError> {
    Ok(!less(lhs, rhs, context)?)
}
