//! Core builtins: constants, identity, user errors, objects, `eval`

use crate::diagnostics::{RuntimeError, SourceFile};
use crate::host::register_builtin;
use crate::interp::env::Environment;
use crate::interp::methods::{check_arity, string_arg};
use crate::interp::value::{Payload, Value};
use crate::{lexer, parser};

pub fn register(env: &mut Environment) {
    register_builtin(env, "True", Value::bool(true));
    register_builtin(env, "False", Value::bool(false));
    register_builtin(env, "None", Value::unit());

    register_builtin(
        env,
        "id",
        Value::native("id", |_, mut args| {
            check_arity("id", &args, 1)?;
            Ok(args.swap_remove(0))
        }),
    );

    register_builtin(
        env,
        "error",
        Value::native("error", |_, args| {
            check_arity("error", &args, 1)?;
            let message = match args[0].payload() {
                Payload::Str(s) => s.clone(),
                _ => args[0].to_string(),
            };
            Err(RuntimeError::raised(message).into())
        }),
    );

    register_builtin(
        env,
        "object",
        Value::native("object", |_, args| {
            check_arity("object", &args, 1)?;
            let Payload::List(pairs) = args[0].payload() else {
                return Err(RuntimeError::type_error(
                    "`object` expects a list of [name, value] pairs",
                )
                .into());
            };
            let object = Value::object();
            for pair in pairs.borrow().iter() {
                let Payload::List(entry) = pair.payload() else {
                    return Err(RuntimeError::type_error(
                        "`object` expects a list of [name, value] pairs",
                    )
                    .into());
                };
                let entry = entry.borrow();
                if entry.len() != 2 {
                    return Err(RuntimeError::type_error(
                        "`object` expects a list of [name, value] pairs",
                    )
                    .into());
                }
                let name = string_arg("object", &entry[0])?;
                object.dict_insert(name, entry[1].clone());
            }
            Ok(object)
        }),
    );

    register_builtin(
        env,
        "eval",
        Value::native("eval", |interp, args| {
            check_arity("eval", &args, 1)?;
            let source = string_arg("eval", &args[0])?;
            let file = SourceFile::new("<eval>", source);
            let tokens =
                lexer::lex(&file).map_err(|e| RuntimeError::syntax(e.to_string()))?;
            let ast = parser::parse(&tokens, &file)
                .map_err(|e| RuntimeError::syntax(e.to_string()))?;
            interp.eval_in_root_scope(&ast)
        }),
    );
}
