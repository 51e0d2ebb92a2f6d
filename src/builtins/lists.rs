//! List builtins: `list`, `sum`, `range`

use crate::diagnostics::RuntimeError;
use crate::host::register_builtin;
use crate::interp::env::Environment;
use crate::interp::methods::{check_arity, number_arg};
use crate::interp::value::{Payload, Value};

pub fn register(env: &mut Environment) {
    register_builtin(
        env,
        "list",
        Value::native("list", |_, args| Ok(Value::list(args))),
    );

    register_builtin(
        env,
        "sum",
        Value::native("sum", |_, args| {
            check_arity("sum", &args, 1)?;
            let Payload::List(items) = args[0].payload() else {
                return Err(RuntimeError::type_error("`sum` expects a list").into());
            };
            let mut total = 0.0;
            for item in items.borrow().iter() {
                total += number_arg("sum", item)?;
            }
            Ok(Value::number(total))
        }),
    );

    register_builtin(
        env,
        "range",
        Value::native("range", |_, args| {
            let (start, stop, step) = match args.as_slice() {
                [stop] => (0, number_arg("range", stop)?.trunc() as i64, 1),
                [start, stop] => (
                    number_arg("range", start)?.trunc() as i64,
                    number_arg("range", stop)?.trunc() as i64,
                    1,
                ),
                [start, stop, step] => (
                    number_arg("range", start)?.trunc() as i64,
                    number_arg("range", stop)?.trunc() as i64,
                    number_arg("range", step)?.trunc() as i64,
                ),
                _ => {
                    return Err(RuntimeError::type_error(format!(
                        "`range` expects 1 to 3 argument(s), got {}",
                        args.len()
                    ))
                    .into());
                }
            };
            if step == 0 {
                return Err(RuntimeError::type_error("`range` step must not be zero").into());
            }
            let mut values = Vec::new();
            let mut cursor = start;
            while (step > 0 && cursor < stop) || (step < 0 && cursor > stop) {
                values.push(Value::number(cursor as f64));
                cursor += step;
            }
            Ok(Value::list(values))
        }),
    );
}
