//! Built-in methods, bound to their receiver at lookup time
//!
//! Each variant owns a name-keyed method table. `lookup_builtin` binds the
//! receiver into a fresh native function; user dictionary entries of the
//! same name shadow these (see `Interpreter::get_attribute`).

use std::cell::{Cell, RefCell};
use std::sync::Arc;

use crate::diagnostics::RuntimeError;
use crate::host::{HostValue, ResourceHandle};
use crate::interp::value::{Payload, Value, values_equal};

/// Resolve a built-in method on `value`, binding the receiver
pub fn lookup_builtin(value: &Value, name: &str) -> Option<Value> {
    let specific = match value.payload() {
        Payload::Number(n) => number_method(*n, name),
        Payload::Str(s) => string_method(s, name),
        Payload::Bytes(b) => bytes_method(b, name),
        Payload::List(_) => list_method(value, name),
        Payload::Native(_) => native_method(value, name),
        Payload::Resource(handle) => resource_method(handle, name),
        Payload::Unit | Payload::Object | Payload::Module => None,
    };
    specific.or_else(|| universal_method(value, name))
}

// ==================== HELPERS ====================

pub(crate) fn check_arity(method: &str, args: &[Value], expected: usize) -> Result<(), RuntimeError> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(RuntimeError::type_error(format!(
            "`{}` expects {} argument(s), got {}",
            method,
            expected,
            args.len()
        )))
    }
}

pub(crate) fn number_arg(method: &str, arg: &Value) -> Result<f64, RuntimeError> {
    match arg.payload() {
        Payload::Number(n) => Ok(*n),
        _ => Err(RuntimeError::type_error(format!(
            "`{}` expects a number, got {}",
            method,
            arg.type_name()
        ))),
    }
}

pub(crate) fn string_arg(method: &str, arg: &Value) -> Result<String, RuntimeError> {
    match arg.payload() {
        Payload::Str(s) => Ok(s.clone()),
        _ => Err(RuntimeError::type_error(format!(
            "`{}` expects a string, got {}",
            method,
            arg.type_name()
        ))),
    }
}

fn bytes_arg(method: &str, arg: &Value) -> Result<Vec<u8>, RuntimeError> {
    match arg.payload() {
        Payload::Bytes(b) => Ok(b.clone()),
        _ => Err(RuntimeError::type_error(format!(
            "`{}` expects bytes, got {}",
            method,
            arg.type_name()
        ))),
    }
}

fn expect_list(recv: &Value) -> &RefCell<Vec<Value>> {
    match recv.payload() {
        Payload::List(items) => items,
        _ => unreachable!("receiver is a list by construction"),
    }
}

/// Float index resolution: truncate toward zero, negative counts from the
/// end, out-of-range is an IndexError
fn resolve_index(method: &str, raw: f64, len: usize) -> Result<usize, RuntimeError> {
    let mut index = raw.trunc() as i64;
    if index < 0 {
        index += len as i64;
    }
    if index < 0 || index as usize >= len {
        return Err(RuntimeError::index(format!(
            "`{}` index {} out of range for length {}",
            method,
            crate::interp::value::format_number(raw),
            len
        )));
    }
    Ok(index as usize)
}

/// Count argument for `repeat`/`take`/`drop`: truncated, clamped at zero
fn count_arg(method: &str, arg: &Value) -> Result<usize, RuntimeError> {
    let n = number_arg(method, arg)?;
    Ok(n.trunc().max(0.0) as usize)
}

// ==================== NUMBERS ====================

fn number_method(n: f64, name: &str) -> Option<Value> {
    fn binary(
        n: f64,
        method: &'static str,
        f: fn(f64, f64) -> Result<f64, RuntimeError>,
    ) -> Value {
        Value::native(method, move |_, args| {
            check_arity(method, &args, 1)?;
            let other = number_arg(method, &args[0])?;
            Ok(Value::number(f(n, other)?))
        })
    }

    fn shift_amount(b: f64) -> u32 {
        (b.trunc() as i64).clamp(0, 63) as u32
    }

    Some(match name {
        "add" => binary(n, "add", |a, b| Ok(a + b)),
        "sub" => binary(n, "sub", |a, b| Ok(a - b)),
        "mul" => binary(n, "mul", |a, b| Ok(a * b)),
        "div" => binary(n, "div", |a, b| {
            if b == 0.0 {
                Err(RuntimeError::ZeroDivision)
            } else {
                Ok(a / b)
            }
        }),
        "mod" => binary(n, "mod", |a, b| {
            if b == 0.0 {
                Err(RuntimeError::ZeroDivision)
            } else {
                Ok(a % b)
            }
        }),
        "pow" => binary(n, "pow", |a, b| Ok(a.powf(b))),
        "gt" => binary(n, "gt", |a, b| Ok(if a > b { 1.0 } else { 0.0 })),
        "lt" => binary(n, "lt", |a, b| Ok(if a < b { 1.0 } else { 0.0 })),
        "xor" => binary(n, "xor", |a, b| {
            Ok(((a.trunc() as i64) ^ (b.trunc() as i64)) as f64)
        }),
        "shl" => binary(n, "shl", move |a, b| {
            Ok(((a.trunc() as i64) << shift_amount(b)) as f64)
        }),
        "shr" => binary(n, "shr", move |a, b| {
            Ok(((a.trunc() as i64) >> shift_amount(b)) as f64)
        }),
        // `or`/`and` accept any value and test truthiness, like the
        // surrounding protocol, not just numbers
        "or" => Value::native("or", move |_, args| {
            check_arity("or", &args, 1)?;
            Ok(Value::bool(n != 0.0 || args[0].is_truthy()))
        }),
        "and" => Value::native("and", move |_, args| {
            check_arity("and", &args, 1)?;
            Ok(Value::bool(n != 0.0 && args[0].is_truthy()))
        }),
        "not" => Value::native("not", move |_, args| {
            check_arity("not", &args, 0)?;
            Ok(Value::bool(n == 0.0))
        }),
        "int" => Value::native("int", move |_, args| {
            check_arity("int", &args, 0)?;
            Ok(Value::number(n.trunc()))
        }),
        _ => return None,
    })
}

// ==================== STRINGS ====================

fn string_method(s: &str, name: &str) -> Option<Value> {
    let s = s.to_string();
    Some(match name {
        "len" => Value::native("len", move |_, args| {
            check_arity("len", &args, 0)?;
            Ok(Value::number(s.chars().count() as f64))
        }),
        "num" => Value::native("num", move |_, args| {
            check_arity("num", &args, 0)?;
            s.trim().parse::<f64>().map(Value::number).map_err(|_| {
                RuntimeError::type_error(format!("cannot parse \"{}\" as a number", s)).into()
            })
        }),
        "split" => Value::native("split", move |_, args| {
            check_arity("split", &args, 1)?;
            let separator = string_arg("split", &args[0])?;
            if separator.is_empty() {
                return Err(RuntimeError::type_error("`split` separator is empty").into());
            }
            Ok(Value::list(
                s.split(&separator).map(Value::string).collect(),
            ))
        }),
        "concat" => Value::native("concat", move |_, args| {
            check_arity("concat", &args, 1)?;
            let other = string_arg("concat", &args[0])?;
            Ok(Value::string(format!("{}{}", s, other)))
        }),
        "repeat" => Value::native("repeat", move |_, args| {
            check_arity("repeat", &args, 1)?;
            let count = count_arg("repeat", &args[0])?;
            Ok(Value::string(s.repeat(count)))
        }),
        "chars" => Value::native("chars", move |_, args| {
            check_arity("chars", &args, 0)?;
            Ok(Value::list(
                s.chars().map(|c| Value::string(c.to_string())).collect(),
            ))
        }),
        "encode" => Value::native("encode", move |_, args| {
            check_arity("encode", &args, 0)?;
            Ok(Value::bytes(s.clone().into_bytes()))
        }),
        _ => return None,
    })
}

// ==================== BYTES ====================

fn bytes_method(b: &[u8], name: &str) -> Option<Value> {
    let b = b.to_vec();
    Some(match name {
        "len" => Value::native("len", move |_, args| {
            check_arity("len", &args, 0)?;
            Ok(Value::number(b.len() as f64))
        }),
        "concat" => Value::native("concat", move |_, args| {
            check_arity("concat", &args, 1)?;
            let other = bytes_arg("concat", &args[0])?;
            let mut joined = b.clone();
            joined.extend_from_slice(&other);
            Ok(Value::bytes(joined))
        }),
        "repeat" => Value::native("repeat", move |_, args| {
            check_arity("repeat", &args, 1)?;
            let count = count_arg("repeat", &args[0])?;
            Ok(Value::bytes(b.repeat(count)))
        }),
        "list" => Value::native("list", move |_, args| {
            check_arity("list", &args, 0)?;
            Ok(Value::list(
                b.iter().map(|byte| Value::number(*byte as f64)).collect(),
            ))
        }),
        "decode" => Value::native("decode", move |_, args| {
            check_arity("decode", &args, 0)?;
            String::from_utf8(b.clone())
                .map(Value::string)
                .map_err(|_| RuntimeError::type_error("bytes are not valid UTF-8").into())
        }),
        _ => return None,
    })
}

// ==================== LISTS ====================

fn list_method(value: &Value, name: &str) -> Option<Value> {
    let recv = value.clone();
    Some(match name {
        "get" => Value::native("get", move |_, args| {
            check_arity("get", &args, 1)?;
            let raw = number_arg("get", &args[0])?;
            let items = expect_list(&recv).borrow();
            let index = resolve_index("get", raw, items.len())?;
            Ok(items[index].clone())
        }),
        "set" => Value::native("set", move |_, args| {
            check_arity("set", &args, 2)?;
            let raw = number_arg("set", &args[0])?;
            let mut items = expect_list(&recv).borrow_mut();
            let index = resolve_index("set", raw, items.len())?;
            items[index] = args[1].clone();
            Ok(args[1].clone())
        }),
        "append" => Value::native("append", move |_, args| {
            check_arity("append", &args, 1)?;
            expect_list(&recv).borrow_mut().push(args[0].clone());
            Ok(args[0].clone())
        }),
        "pop" => Value::native("pop", move |_, args| {
            check_arity("pop", &args, 0)?;
            expect_list(&recv)
                .borrow_mut()
                .pop()
                .ok_or_else(|| RuntimeError::index("`pop` from empty list").into())
        }),
        "len" => Value::native("len", move |_, args| {
            check_arity("len", &args, 0)?;
            Ok(Value::number(expect_list(&recv).borrow().len() as f64))
        }),
        "join" => Value::native("join", move |_, args| {
            check_arity("join", &args, 1)?;
            let separator = string_arg("join", &args[0])?;
            let items = expect_list(&recv).borrow();
            let parts: Vec<String> = items
                .iter()
                .map(|v| match v.payload() {
                    Payload::Str(s) => s.clone(),
                    _ => v.to_string(),
                })
                .collect();
            Ok(Value::string(parts.join(&separator)))
        }),
        "map" => Value::native("map", move |interp, args| {
            check_arity("map", &args, 1)?;
            let snapshot: Vec<Value> = expect_list(&recv).borrow().clone();
            let mut mapped = Vec::with_capacity(snapshot.len());
            for item in snapshot {
                mapped.push(interp.call_value(&args[0], vec![item])?);
            }
            Ok(Value::list(mapped))
        }),
        "filter" => Value::native("filter", move |interp, args| {
            check_arity("filter", &args, 1)?;
            let snapshot: Vec<Value> = expect_list(&recv).borrow().clone();
            let mut kept = Vec::new();
            for item in snapshot {
                if interp.call_value(&args[0], vec![item.clone()])?.is_truthy() {
                    kept.push(item);
                }
            }
            Ok(Value::list(kept))
        }),
        "reverse" => Value::native("reverse", move |_, args| {
            check_arity("reverse", &args, 0)?;
            let mut items: Vec<Value> = expect_list(&recv).borrow().clone();
            items.reverse();
            Ok(Value::list(items))
        }),
        "index" => Value::native("index", move |_, args| {
            check_arity("index", &args, 1)?;
            let items = expect_list(&recv).borrow();
            items
                .iter()
                .position(|v| values_equal(v, &args[0]))
                .map(|i| Value::number(i as f64))
                .ok_or_else(|| RuntimeError::index("value not found in list").into())
        }),
        "take" => Value::native("take", move |_, args| {
            check_arity("take", &args, 1)?;
            let count = count_arg("take", &args[0])?;
            let items = expect_list(&recv).borrow();
            Ok(Value::list(items.iter().take(count).cloned().collect()))
        }),
        "drop" => Value::native("drop", move |_, args| {
            check_arity("drop", &args, 1)?;
            let count = count_arg("drop", &args[0])?;
            let items = expect_list(&recv).borrow();
            Ok(Value::list(items.iter().skip(count).cloned().collect()))
        }),
        "enumerate" => Value::native("enumerate", move |_, args| {
            check_arity("enumerate", &args, 0)?;
            let source = recv.clone();
            let pairs = Value::object();
            pairs.dict_insert(
                "__iter__",
                Value::native("__iter__", move |_, args| {
                    check_arity("__iter__", &args, 0)?;
                    Ok(pair_iterator(source.clone()))
                }),
            );
            Ok(pairs)
        }),
        "__iter__" => Value::native("__iter__", move |_, args| {
            check_arity("__iter__", &args, 0)?;
            Ok(element_iterator(recv.clone()))
        }),
        _ => return None,
    })
}

/// Stateful iterator over list elements; exhaustion is the designated
/// stop signal, distinguishable from ordinary errors
fn element_iterator(source: Value) -> Value {
    let cursor = Cell::new(0usize);
    Value::native("<iterator>", move |_, args| {
        check_arity("<iterator>", &args, 0)?;
        let items = expect_list(&source).borrow();
        let index = cursor.get();
        if index < items.len() {
            cursor.set(index + 1);
            Ok(items[index].clone())
        } else {
            Err(RuntimeError::StopIteration.into())
        }
    })
}

/// Stateful iterator yielding `[index, element]` pairs
fn pair_iterator(source: Value) -> Value {
    let cursor = Cell::new(0usize);
    Value::native("<iterator>", move |_, args| {
        check_arity("<iterator>", &args, 0)?;
        let items = expect_list(&source).borrow();
        let index = cursor.get();
        if index < items.len() {
            cursor.set(index + 1);
            Ok(Value::list(vec![
                Value::number(index as f64),
                items[index].clone(),
            ]))
        } else {
            Err(RuntimeError::StopIteration.into())
        }
    })
}

// ==================== FUNCTIONS ====================

fn native_method(value: &Value, name: &str) -> Option<Value> {
    match name {
        // A function's `__call__` is itself; binding happens lazily, so
        // no self-referential dictionary entry is needed
        "__call__" => Some(value.clone()),
        _ => None,
    }
}

// ==================== RESOURCES ====================

fn resource_method(handle: &Arc<ResourceHandle>, name: &str) -> Option<Value> {
    let handle = handle.clone();
    Some(match name {
        "read" => Value::native_host(
            "read",
            Arc::new(move |args: Vec<HostValue>| {
                let limit = match args.as_slice() {
                    [] => None,
                    [HostValue::Int(n)] if *n >= 0 => Some(*n as u64),
                    [HostValue::Int(_)] => None,
                    [HostValue::Float(f)] if *f >= 0.0 => Some(f.trunc() as u64),
                    [HostValue::Float(_)] => None,
                    [_] => {
                        return Err(RuntimeError::type_error("`read` expects a number"));
                    }
                    _ => {
                        return Err(RuntimeError::type_error(format!(
                            "`read` expects 0 or 1 argument(s), got {}",
                            args.len()
                        )));
                    }
                };
                let data = handle.read(limit)?;
                if handle.is_binary() {
                    Ok(HostValue::Binary(data))
                } else {
                    String::from_utf8(data)
                        .map(HostValue::Text)
                        .map_err(|_| RuntimeError::io("file contents are not valid UTF-8"))
                }
            }),
        ),
        "write" => Value::native_host(
            "write",
            Arc::new(move |mut args: Vec<HostValue>| {
                if args.len() != 1 {
                    return Err(RuntimeError::type_error(format!(
                        "`write` expects 1 argument(s), got {}",
                        args.len()
                    )));
                }
                let data = args.pop().unwrap_or(HostValue::Unit);
                match &data {
                    HostValue::Text(s) => handle.write(s.as_bytes())?,
                    HostValue::Binary(b) => handle.write(b)?,
                    _ => {
                        return Err(RuntimeError::type_error(
                            "`write` expects a string or bytes",
                        ));
                    }
                }
                Ok(data)
            }),
        ),
        "close" => Value::native_host(
            "close",
            Arc::new(move |args: Vec<HostValue>| {
                if !args.is_empty() {
                    return Err(RuntimeError::type_error(format!(
                        "`close` expects 0 argument(s), got {}",
                        args.len()
                    )));
                }
                handle.close()?;
                Ok(HostValue::Unit)
            }),
        ),
        _ => return None,
    })
}

// ==================== UNIVERSAL ====================

fn universal_method(value: &Value, name: &str) -> Option<Value> {
    let recv = value.clone();
    Some(match name {
        "setattr" => Value::native("setattr", move |_, args| {
            check_arity("setattr", &args, 2)?;
            let attribute = string_arg("setattr", &args[0])?;
            recv.dict_set(attribute, args[1].clone())?;
            Ok(Value::unit())
        }),
        "getattr" => Value::native("getattr", move |_, args| {
            check_arity("getattr", &args, 1)?;
            let attribute = string_arg("getattr", &args[0])?;
            recv.dict_get(&attribute)
                .or_else(|| lookup_builtin(&recv, &attribute))
                .ok_or_else(|| {
                    RuntimeError::attribute(recv.to_string(), attribute).into()
                })
        }),
        "equals" => Value::native("equals", move |_, args| {
            check_arity("equals", &args, 1)?;
            Ok(Value::bool(values_equal(&recv, &args[0])))
        }),
        "apply" => Value::native("apply", move |interp, args| {
            check_arity("apply", &args, 1)?;
            interp.call_value(&args[0], vec![recv.clone()])
        }),
        "str" => Value::native("str", move |_, args| {
            check_arity("str", &args, 0)?;
            match recv.payload() {
                Payload::Str(s) => Ok(Value::string(s.clone())),
                _ => Ok(Value::string(recv.to_string())),
            }
        }),
        _ => return None,
    })
}
