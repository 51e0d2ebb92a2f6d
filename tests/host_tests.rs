//! Host interop boundary tests

use std::sync::Arc;

use cinder::host::{HostValue, register_builtin, to_host_value, to_runtime_value};
use cinder::interp::env::Environment;
use cinder::interp::value::{Value, values_equal};

#[test]
fn test_round_trip_for_core_variants() {
    let samples = vec![
        Value::number(0.0),
        Value::number(42.0),
        Value::number(-3.5),
        Value::string("plain"),
        Value::bytes(vec![1, 2, 3]),
        Value::list(vec![]),
        Value::list(vec![
            Value::number(1.0),
            Value::string("two"),
            Value::number(3.0),
        ]),
    ];
    for value in samples {
        let host = to_host_value(&value).expect("conversion succeeds");
        let back = to_runtime_value(host);
        assert!(
            values_equal(&value, &back),
            "round trip changed {:?}",
            value
        );
    }
}

#[test]
fn test_nested_list_round_trip() {
    let value = Value::list(vec![
        Value::list(vec![Value::number(1.0)]),
        Value::list(vec![]),
    ]);
    let back = to_runtime_value(to_host_value(&value).expect("conversion succeeds"));
    assert!(values_equal(&value, &back));
}

#[test]
fn test_integral_numbers_become_host_integers() {
    assert!(matches!(
        to_host_value(&Value::number(7.0)).expect("conversion succeeds"),
        HostValue::Int(7)
    ));
    assert!(matches!(
        to_host_value(&Value::number(7.25)).expect("conversion succeeds"),
        HostValue::Float(f) if f == 7.25
    ));
}

#[test]
fn test_string_escapes_decode_on_the_way_out() {
    let host = to_host_value(&Value::string("a\\nb")).expect("conversion succeeds");
    match host {
        HostValue::Text(s) => assert_eq!(s, "a\nb"),
        other => panic!("expected text, got {}", other),
    }
}

#[test]
fn test_booleans_and_unit_map_to_singletons() {
    assert!(values_equal(
        &to_runtime_value(HostValue::Bool(true)),
        &Value::number(1.0)
    ));
    assert!(values_equal(
        &to_runtime_value(HostValue::Bool(false)),
        &Value::number(0.0)
    ));
    assert!(values_equal(&to_runtime_value(HostValue::Unit), &Value::unit()));
}

#[test]
fn test_host_callable_wraps_into_a_native_function() {
    let double: cinder::host::HostFn = Arc::new(|args| match args.as_slice() {
        [HostValue::Int(n)] => Ok(HostValue::Int(n * 2)),
        _ => Err(cinder::RuntimeError::type_error("expected one integer")),
    });
    let value = to_runtime_value(HostValue::Callable {
        name: "double".to_string(),
        f: double,
    });
    assert_eq!(value.type_name(), "function");
    assert_eq!(value.to_string(), "<fn double>");
}

#[test]
fn test_record_mirrors_into_a_plain_object() {
    let value = to_runtime_value(HostValue::Record(vec![
        ("a".to_string(), HostValue::Int(1)),
        ("b".to_string(), HostValue::Text("two".to_string())),
    ]));
    assert_eq!(value.type_name(), "object");
    assert!(values_equal(
        &value.dict_get("a").expect("field a"),
        &Value::number(1.0)
    ));
    assert!(values_equal(
        &value.dict_get("b").expect("field b"),
        &Value::string("two")
    ));
}

#[test]
fn test_register_builtin_is_idempotent() {
    let mut env = Environment::new();
    register_builtin(&mut env, "answer", Value::number(41.0));
    // re-registration replaces the binding despite immutability
    register_builtin(&mut env, "answer", Value::number(42.0));
    let value = env.lookup("answer").expect("builtin resolves");
    assert!(values_equal(&value, &Value::number(42.0)));
}

#[test]
fn test_registered_builtins_are_immutable_for_user_code() {
    let mut env = Environment::new();
    register_builtin(&mut env, "answer", Value::number(42.0));
    assert!(env.declare("answer", false, Value::number(0.0)).is_err());
}
