//! I/O builtins: `print`, `input`, `quit`, `open`
//!
//! All host-kind: they work over converted host values and never touch
//! the evaluator, which also makes them shippable to spawned threads.

use std::io::Write;
use std::sync::Arc;

use crate::diagnostics::RuntimeError;
use crate::host::{HostValue, ResourceHandle, register_builtin};
use crate::interp::env::Environment;
use crate::interp::value::Value;

pub fn register(env: &mut Environment) {
    register_builtin(
        env,
        "print",
        Value::native_host(
            "print",
            Arc::new(|args: Vec<HostValue>| {
                let line = args
                    .iter()
                    .map(|a| a.to_string())
                    .collect::<Vec<_>>()
                    .join(" ");
                println!("{}", line);
                Ok(HostValue::Unit)
            }),
        ),
    );

    register_builtin(
        env,
        "input",
        Value::native_host(
            "input",
            Arc::new(|args: Vec<HostValue>| {
                match args.as_slice() {
                    [] => {}
                    [prompt] => {
                        print!("{}", prompt);
                        std::io::stdout()
                            .flush()
                            .map_err(|e| RuntimeError::io(format!("cannot flush stdout: {}", e)))?;
                    }
                    _ => {
                        return Err(RuntimeError::type_error(format!(
                            "`input` expects 0 or 1 argument(s), got {}",
                            args.len()
                        )));
                    }
                }
                let mut line = String::new();
                std::io::stdin()
                    .read_line(&mut line)
                    .map_err(|e| RuntimeError::io(format!("cannot read stdin: {}", e)))?;
                while line.ends_with('\n') || line.ends_with('\r') {
                    line.pop();
                }
                Ok(HostValue::Text(line))
            }),
        ),
    );

    register_builtin(
        env,
        "quit",
        Value::native_host(
            "quit",
            Arc::new(|_args: Vec<HostValue>| std::process::exit(0)),
        ),
    );

    register_builtin(
        env,
        "open",
        Value::native_host(
            "open",
            Arc::new(|args: Vec<HostValue>| match args.as_slice() {
                [HostValue::Text(path), HostValue::Text(mode)] => {
                    let handle = ResourceHandle::open(path, mode)?;
                    Ok(HostValue::Resource(handle))
                }
                _ => Err(RuntimeError::type_error(
                    "`open` expects a path string and a mode string",
                )),
            }),
        ),
    );
}
