//! Native-thread builtin: `spawn`
//!
//! The evaluator is single-threaded; the only concurrency surface is
//! shipping host-kind work to a detached native thread. Arguments are
//! deep-converted to owned host values first, so the spawned work never
//! touches a live runtime value, and interpreter-defined functions are
//! rejected outright.

use crate::diagnostics::RuntimeError;
use crate::host::{register_builtin, spawn_detached, to_host_value};
use crate::interp::env::Environment;
use crate::interp::methods::check_arity;
use crate::interp::value::{NativeImpl, Payload, Value};

pub fn register(env: &mut Environment) {
    register_builtin(
        env,
        "spawn",
        Value::native("spawn", |_, args| {
            check_arity("spawn", &args, 2)?;
            let Payload::Native(nf) = args[0].payload() else {
                return Err(RuntimeError::type_error("`spawn` expects a function").into());
            };
            let NativeImpl::Host(f) = &nf.imp else {
                return Err(RuntimeError::type_error(
                    "`spawn` runs host functions only; interpreter-defined \
                     functions share state with the evaluator",
                )
                .into());
            };
            let Payload::List(items) = args[1].payload() else {
                return Err(
                    RuntimeError::type_error("`spawn` expects a list of arguments").into(),
                );
            };

            let mut host_args = Vec::new();
            for item in items.borrow().iter() {
                host_args.push(to_host_value(item)?);
            }

            let f = f.clone();
            let name = nf.name.to_string();
            spawn_detached(move || {
                if let Err(error) = f(host_args) {
                    tracing::warn!("spawned `{}` failed: {}", name, error);
                }
            });
            Ok(Value::unit())
        }),
    );
}
