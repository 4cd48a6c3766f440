use proptest::prelude::*;
use pythox::ast::Statement;
use pythox::runtime::{
    equal, greater, greater_or_equal, less, less_or_equal, not_equal, BufferedContext, Class,
    Instance, Method, RuntimeError, SymbolTable, Value,
};
use std::sync::Arc;

fn constant(value: Value) -> Statement {
    Statement::Constant(value)
}

fn variable(path: &[&str]) -> Statement {
    Statement::VariableValue {
        path: path.iter().map(|segment| (*segment).into()).collect(),
    }
}

/// A method body that evaluates `body` and returns its value.
fn returning(body: Statement) -> Statement {
    Statement::MethodBody {
        body: Box::new(Statement::Return {
            value: Box::new(body),
        }),
    }
}

fn method(name: &str, params: &[&str], body: Statement) -> Method {
    Method {
        name: name.into(),
        params: params.iter().map(|param| (*param).into()).collect(),
        body,
    }
}

fn set_self_field(field: &str, value: Statement) -> Statement {
    Statement::FieldAssignment {
        object: Box::new(variable(&["self"])),
        field: field.into(),
        value: Box::new(value),
    }
}

/// A class whose `__eq__` and `__lt__` answer with fixed booleans.
fn comparing_class(eq: bool, lt: bool) -> Arc<Class> {
    Arc::new(Class::new(
        "Point",
        vec![
            method("__eq__", &["other"], returning(constant(Value::Bool(eq)))),
            method("__lt__", &["other"], returning(constant(Value::Bool(lt)))),
        ],
        None,
    ))
}

#[test]
fn truthiness_of_each_value_kind() {
    let class = Arc::new(Class::new("Base", Vec::new(), None));

    assert!(!Value::None.is_true());
    assert!(!Value::Number(0).is_true());
    assert!(Value::Number(10).is_true());
    assert!(Value::Number(-1).is_true());
    assert!(!Value::String("".into()).is_true());
    assert!(Value::String("Yup".into()).is_true());
    assert!(!Value::Bool(false).is_true());
    assert!(Value::Bool(true).is_true());
    assert!(Value::Instance(Instance::new(Arc::clone(&class))).is_true());
    assert!(Value::Class(class).is_true());
}

#[test]
fn logical_not_inverts_truthiness() {
    let class = Arc::new(Class::new("Base", Vec::new(), None));
    let samples = vec![
        Value::None,
        Value::Number(0),
        Value::Number(57),
        Value::String("".into()),
        Value::String("text".into()),
        Value::Bool(false),
        Value::Bool(true),
        Value::Instance(Instance::new(Arc::clone(&class))),
        Value::Class(class),
    ];

    let mut table = SymbolTable::new();
    let mut context = BufferedContext::new();
    for value in samples {
        let node = Statement::Not {
            arg: Box::new(constant(value.clone())),
        };
        let result = node
            .execute(&mut table, &mut context)
            .expect("negation never fails")
            .into_value();
        match result {
            Value::Bool(negated) => assert_eq!(negated, !value.is_true()),
            other => panic!("expected a boolean but got {other}"),
        }
    }
}

#[test]
fn equality_of_scalars() {
    let mut ctx = BufferedContext::new();

    assert!(equal(&Value::Number(1), &Value::Number(1), &mut ctx).unwrap());
    assert!(!equal(&Value::Number(1), &Value::Number(2), &mut ctx).unwrap());
    assert!(equal(
        &Value::String("Yuppy".into()),
        &Value::String("Yuppy".into()),
        &mut ctx
    )
    .unwrap());
    assert!(!equal(
        &Value::String("Yuppy".into()),
        &Value::String("Crappy".into()),
        &mut ctx
    )
    .unwrap());
    assert!(equal(&Value::Bool(true), &Value::Bool(true), &mut ctx).unwrap());
    assert!(!equal(&Value::Bool(true), &Value::Bool(false), &mut ctx).unwrap());
    assert!(equal(&Value::None, &Value::None, &mut ctx).unwrap());
    assert!(!not_equal(&Value::None, &Value::None, &mut ctx).unwrap());

    assert!(matches!(
        equal(&Value::Number(3), &Value::Bool(true), &mut ctx),
        Err(RuntimeError::NotComparable(_, _))
    ));
    assert!(matches!(
        equal(&Value::None, &Value::Number(3), &mut ctx),
        Err(RuntimeError::NotComparable(_, _))
    ));
}

#[test]
fn ordering_of_scalars() {
    let mut ctx = BufferedContext::new();
    let one = Value::Number(1);
    let fifteen = Value::Number(15);

    assert!(less(&one, &fifteen, &mut ctx).unwrap());
    assert!(less_or_equal(&one, &fifteen, &mut ctx).unwrap());
    assert!(less_or_equal(&fifteen, &fifteen, &mut ctx).unwrap());
    assert!(greater(&fifteen, &one, &mut ctx).unwrap());
    assert!(greater_or_equal(&fifteen, &one, &mut ctx).unwrap());
    assert!(greater_or_equal(&fifteen, &fifteen, &mut ctx).unwrap());

    let a = Value::String("a".into());
    let b = Value::String("b".into());
    assert!(less(&a, &b, &mut ctx).unwrap());
    assert!(greater(&b, &a, &mut ctx).unwrap());

    // Booleans order as 0 and 1.
    assert!(less(&Value::Bool(false), &Value::Bool(true), &mut ctx).unwrap());
    assert!(!less(&Value::Bool(true), &Value::Bool(true), &mut ctx).unwrap());
}

#[test]
fn none_has_no_order() {
    let mut ctx = BufferedContext::new();
    assert!(less(&Value::None, &Value::None, &mut ctx).is_err());
    assert!(less_or_equal(&Value::None, &Value::None, &mut ctx).is_err());
    assert!(greater(&Value::None, &Value::None, &mut ctx).is_err());
    assert!(greater_or_equal(&Value::None, &Value::None, &mut ctx).is_err());
    assert!(less(&Value::None, &Value::Number(3), &mut ctx).is_err());
}

#[test]
fn comparison_dunders_decide_for_instances() {
    let mut ctx = BufferedContext::new();
    let rhs = Value::Number(3);

    let lhs = Value::Instance(Instance::new(comparing_class(true, false)));
    assert!(equal(&lhs, &rhs, &mut ctx).unwrap());
    assert!(!not_equal(&lhs, &rhs, &mut ctx).unwrap());
    assert!(!less(&lhs, &rhs, &mut ctx).unwrap());
    assert!(!greater(&lhs, &rhs, &mut ctx).unwrap());
    assert!(less_or_equal(&lhs, &rhs, &mut ctx).unwrap());
    assert!(greater_or_equal(&lhs, &rhs, &mut ctx).unwrap());

    let lhs = Value::Instance(Instance::new(comparing_class(false, true)));
    assert!(!equal(&lhs, &rhs, &mut ctx).unwrap());
    assert!(not_equal(&lhs, &rhs, &mut ctx).unwrap());
    assert!(less(&lhs, &rhs, &mut ctx).unwrap());
    assert!(!greater(&lhs, &rhs, &mut ctx).unwrap());
    assert!(less_or_equal(&lhs, &rhs, &mut ctx).unwrap());
    assert!(!greater_or_equal(&lhs, &rhs, &mut ctx).unwrap());

    let lhs = Value::Instance(Instance::new(comparing_class(false, false)));
    assert!(!equal(&lhs, &rhs, &mut ctx).unwrap());
    assert!(not_equal(&lhs, &rhs, &mut ctx).unwrap());
    assert!(!less(&lhs, &rhs, &mut ctx).unwrap());
    assert!(greater(&lhs, &rhs, &mut ctx).unwrap());
    assert!(!less_or_equal(&lhs, &rhs, &mut ctx).unwrap());
    assert!(greater_or_equal(&lhs, &rhs, &mut ctx).unwrap());
}

#[test]
fn instances_without_dunders_are_not_comparable() {
    let mut ctx = BufferedContext::new();
    let class = Arc::new(Class::new("Bare", Vec::new(), None));
    let lhs = Value::Instance(Instance::new(class));
    let rhs = Value::Number(3);

    assert!(equal(&lhs, &rhs, &mut ctx).is_err());
    assert!(not_equal(&lhs, &rhs, &mut ctx).is_err());
    assert!(less(&lhs, &rhs, &mut ctx).is_err());
    assert!(less_or_equal(&lhs, &rhs, &mut ctx).is_err());
    assert!(greater(&lhs, &rhs, &mut ctx).is_err());
    assert!(greater_or_equal(&lhs, &rhs, &mut ctx).is_err());
}

#[test]
fn dunder_results_are_coerced_by_truthiness() {
    let mut ctx = BufferedContext::new();

    let class = Arc::new(Class::new(
        "Loose",
        vec![method(
            "__eq__",
            &["other"],
            returning(constant(Value::Number(1))),
        )],
        None,
    ));
    let lhs = Value::Instance(Instance::new(class));
    assert!(equal(&lhs, &Value::None, &mut ctx).unwrap());

    let class = Arc::new(Class::new(
        "Loose",
        vec![method(
            "__eq__",
            &["other"],
            returning(constant(Value::String("".into()))),
        )],
        None,
    ));
    let lhs = Value::Instance(Instance::new(class));
    assert!(!equal(&lhs, &Value::None, &mut ctx).unwrap());
}

#[test]
fn dunders_with_wrong_arity_do_not_resolve() {
    let mut ctx = BufferedContext::new();
    let class = Arc::new(Class::new(
        "Odd",
        vec![method(
            "__eq__",
            &["a", "b"],
            returning(constant(Value::Bool(true))),
        )],
        None,
    ));
    let lhs = Value::Instance(Instance::new(class));
    assert!(equal(&lhs, &Value::Number(3), &mut ctx).is_err());
}

#[test]
fn method_invocation_binds_self_and_parameters() {
    let mut ctx = BufferedContext::new();
    let class = Arc::new(Class::new(
        "Pair",
        vec![method(
            "store",
            &["first", "second"],
            Statement::MethodBody {
                body: Box::new(Statement::Compound(vec![
                    set_self_field("first", variable(&["first"])),
                    set_self_field("second", variable(&["second"])),
                    Statement::Return {
                        value: Box::new(variable(&["self"])),
                    },
                ])),
            },
        )],
        None,
    ));
    let instance = Instance::new(class);

    assert!(instance.has_method("store", 2));
    assert!(!instance.has_method("store", 1));

    let result = instance
        .call(
            "store",
            &[Value::Number(1), Value::String("abc".into())],
            &mut ctx,
        )
        .unwrap();

    // The call returned `self`, i.e. the very same instance.
    match result {
        Value::Instance(returned) => assert!(Arc::ptr_eq(&returned, &instance)),
        other => panic!("expected the instance back but got {other}"),
    }
    assert!(matches!(instance.field("first"), Some(Value::Number(1))));
    assert!(matches!(instance.field("second"), Some(Value::String(s)) if s == "abc"));
}

#[test]
fn inherited_methods_bind_the_child_instance() {
    let mut ctx = BufferedContext::new();
    let base = Arc::new(Class::new(
        "Base",
        vec![method(
            "tag",
            &[],
            Statement::MethodBody {
                body: Box::new(set_self_field("origin", constant(Value::Number(784)))),
            },
        )],
        None,
    ));
    let child = Arc::new(Class::new("Child", Vec::new(), Some(base)));
    let instance = Instance::new(child);

    instance.call("tag", &[], &mut ctx).unwrap();
    assert!(matches!(instance.field("origin"), Some(Value::Number(784))));
}

#[test]
fn overriding_methods_shadow_the_parent() {
    let mut ctx = BufferedContext::new();
    let base = Arc::new(Class::new(
        "Base",
        vec![method("answer", &[], returning(constant(Value::Number(1))))],
        None,
    ));
    let child = Arc::new(Class::new(
        "Child",
        vec![method("answer", &[], returning(constant(Value::Number(2))))],
        Some(Arc::clone(&base)),
    ));

    let result = Instance::new(child).call("answer", &[], &mut ctx).unwrap();
    assert!(matches!(result, Value::Number(2)));
    let result = Instance::new(base).call("answer", &[], &mut ctx).unwrap();
    assert!(matches!(result, Value::Number(1)));
}

#[test]
fn first_method_of_a_name_wins() {
    let mut ctx = BufferedContext::new();
    let class = Arc::new(Class::new(
        "Twice",
        vec![
            method("speak", &[], returning(constant(Value::Number(1)))),
            method("speak", &[], returning(constant(Value::Number(2)))),
        ],
        None,
    ));
    let result = Instance::new(class).call("speak", &[], &mut ctx).unwrap();
    assert!(matches!(result, Value::Number(1)));
}

#[test]
fn name_resolution_never_falls_past_the_first_match() {
    // The child's `test` takes two arguments; the parent's single-argument
    // variant is unreachable because lookup stops at the first name match.
    let base = Arc::new(Class::new(
        "Base",
        vec![method("test", &["a"], returning(constant(Value::None)))],
        None,
    ));
    let child = Arc::new(Class::new(
        "Child",
        vec![method("test", &["a", "b"], returning(constant(Value::None)))],
        Some(base),
    ));
    let instance = Instance::new(child);

    assert!(instance.has_method("test", 2));
    assert!(!instance.has_method("test", 1));
}

#[test]
fn unknown_methods_and_arity_mismatches_fail() {
    let mut ctx = BufferedContext::new();
    let class = Arc::new(Class::new(
        "Small",
        vec![method("only", &["x"], returning(constant(Value::None)))],
        None,
    ));
    let instance = Instance::new(class);

    assert!(matches!(
        instance.call("missing", &[], &mut ctx),
        Err(RuntimeError::UnknownMethod { .. })
    ));
    assert!(matches!(
        instance.call("only", &[], &mut ctx),
        Err(RuntimeError::UnknownMethod { .. })
    ));
}

#[test]
fn instance_bindings_alias_one_field_table() {
    let class = Arc::new(Class::new("Counter", Vec::new(), None));
    let x = Value::Instance(Instance::new(class));
    let y = x.clone();

    let Value::Instance(ref first) = x else {
        unreachable!()
    };
    let Value::Instance(ref second) = y else {
        unreachable!()
    };

    first.set_field("value", Value::Number(1));
    assert!(matches!(second.field("value"), Some(Value::Number(1))));
    second.set_field("value", Value::Number(2));
    assert!(matches!(first.field("value"), Some(Value::Number(2))));
}

#[test]
fn a_return_stops_at_the_method_body() {
    let mut ctx = BufferedContext::new();
    let class = Arc::new(Class::new(
        "Early",
        vec![method(
            "get",
            &[],
            Statement::MethodBody {
                body: Box::new(Statement::Compound(vec![
                    Statement::Return {
                        value: Box::new(constant(Value::Number(7))),
                    },
                    set_self_field("after", constant(Value::Number(1))),
                ])),
            },
        )],
        None,
    ));
    let instance = Instance::new(class);

    let result = instance.call("get", &[], &mut ctx).unwrap();
    assert!(matches!(result, Value::Number(7)));
    // The statement after the return never ran.
    assert!(instance.field("after").is_none());
}

#[test]
fn printed_forms() {
    let mut ctx = BufferedContext::new();

    assert_eq!(Value::Number(127).repr(&mut ctx).unwrap(), "127");
    assert_eq!(Value::Number(-8).repr(&mut ctx).unwrap(), "-8");
    assert_eq!(Value::String("hello!".into()).repr(&mut ctx).unwrap(), "hello!");
    assert_eq!(Value::Bool(true).repr(&mut ctx).unwrap(), "True");
    assert_eq!(Value::Bool(false).repr(&mut ctx).unwrap(), "False");
    assert_eq!(Value::None.repr(&mut ctx).unwrap(), "None");

    let bare = Arc::new(Class::new("Opaque", Vec::new(), None));
    assert_eq!(
        Value::Class(Arc::clone(&bare)).repr(&mut ctx).unwrap(),
        "Class Opaque"
    );

    // No `__str__`: an address-like token that is never empty.
    let shown = Value::Instance(Instance::new(bare)).repr(&mut ctx).unwrap();
    assert!(shown.starts_with("<Opaque instance at"));

    let pretty = Arc::new(Class::new(
        "Pretty",
        vec![method(
            "__str__",
            &[],
            returning(constant(Value::String("pretty".into()))),
        )],
        None,
    ));
    assert_eq!(
        Value::Instance(Instance::new(pretty)).repr(&mut ctx).unwrap(),
        "pretty"
    );
}

// Property-based tests

proptest! {
    #[test]
    fn number_comparisons_are_trichotomous(a in any::<i32>(), b in any::<i32>()) {
        let mut ctx = BufferedContext::new();
        let lhs = Value::Number(a);
        let rhs = Value::Number(b);

        let eq = equal(&lhs, &rhs, &mut ctx).unwrap();
        let lt = less(&lhs, &rhs, &mut ctx).unwrap();
        let gt = greater(&lhs, &rhs, &mut ctx).unwrap();
        prop_assert_eq!(1, [eq, lt, gt].iter().filter(|v| **v).count());

        prop_assert_eq!(less_or_equal(&lhs, &rhs, &mut ctx).unwrap(), !gt);
        prop_assert_eq!(greater_or_equal(&lhs, &rhs, &mut ctx).unwrap(), !lt);
    }

    #[test]
    fn string_comparisons_are_trichotomous(a in "[a-z]{0,8}", b in "[a-z]{0,8}") {
        let mut ctx = BufferedContext::new();
        let lhs = Value::String(a.as_str().into());
        let rhs = Value::String(b.as_str().into());

        let eq = equal(&lhs, &rhs, &mut ctx).unwrap();
        let lt = less(&lhs, &rhs, &mut ctx).unwrap();
        let gt = greater(&lhs, &rhs, &mut ctx).unwrap();
        prop_assert_eq!(1, [eq, lt, gt].iter().filter(|v| **v).count());
        prop_assert_eq!(less_or_equal(&lhs, &rhs, &mut ctx).unwrap(), !gt);
    }

    #[test]
    fn string_addition_concatenates(a in "[a-z ]{0,10}", b in "[a-z ]{0,10}") {
        let mut table = SymbolTable::new();
        let mut ctx = BufferedContext::new();
        let node = Statement::Arithmetic {
            op: pythox::ast::ArithmeticOp::Add,
            lhs: Box::new(constant(Value::String(a.as_str().into()))),
            rhs: Box::new(constant(Value::String(b.as_str().into()))),
        };
        let result = node.execute(&mut table, &mut ctx).unwrap().into_value();
        match result {
            Value::String(joined) => prop_assert_eq!(joined.as_str(), format!("{a}{b}")),
            other => prop_assert!(false, "expected a string but got {}", other),
        }
    }
}
