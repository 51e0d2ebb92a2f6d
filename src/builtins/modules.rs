//! Module loader: the `import` builtin
//!
//! A dotted module name maps to a path (dots become separators, `.cin`
//! extension), resolved first against the current working directory and
//! then against each directory on the `CINDER_PATH` search path. The file
//! is evaluated in a fresh child of the root frame and its value
//! (conventionally a `module (...)` value) is returned to the importer.

use std::path::PathBuf;

use crate::diagnostics::{RuntimeError, SourceFile};
use crate::host::register_builtin;
use crate::interp::env::Environment;
use crate::interp::methods::{check_arity, string_arg};
use crate::interp::value::Value;
use crate::{lexer, parser};

/// File extension for Cinder modules
pub const MODULE_EXTENSION: &str = "cin";

/// Candidate file paths for a dotted module name, in resolution order
pub fn candidate_paths(name: &str, search: &[PathBuf]) -> Vec<PathBuf> {
    let mut relative = PathBuf::new();
    for part in name.split('.') {
        relative.push(part);
    }
    relative.set_extension(MODULE_EXTENSION);

    let mut candidates = vec![relative.clone()];
    for dir in search {
        candidates.push(dir.join(&relative));
    }
    candidates
}

fn search_path() -> Vec<PathBuf> {
    match std::env::var_os("CINDER_PATH") {
        Some(joined) => std::env::split_paths(&joined).collect(),
        None => Vec::new(),
    }
}

pub fn register(env: &mut Environment) {
    register_builtin(
        env,
        "import",
        Value::native("import", |interp, args| {
            check_arity("import", &args, 1)?;
            let name = string_arg("import", &args[0])?;

            let candidates = candidate_paths(&name, &search_path());
            let path = candidates
                .iter()
                .find(|p| p.is_file())
                .ok_or_else(|| {
                    RuntimeError::io(format!("cannot resolve module `{}`", name))
                })?;

            tracing::debug!("importing `{}` from {}", name, path.display());
            let source = std::fs::read_to_string(path).map_err(|e| {
                RuntimeError::io(format!("cannot read `{}`: {}", path.display(), e))
            })?;
            let file = SourceFile::new(path.display().to_string(), source);
            let tokens =
                lexer::lex(&file).map_err(|e| RuntimeError::syntax(e.to_string()))?;
            let ast = parser::parse(&tokens, &file)
                .map_err(|e| RuntimeError::syntax(e.to_string()))?;
            interp.eval_in_root_scope(&ast)
        }),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_paths_order() {
        let search = vec![PathBuf::from("/lib/cinder")];
        let candidates = candidate_paths("net.http", &search);
        assert_eq!(
            candidates,
            vec![
                PathBuf::from("net/http.cin"),
                PathBuf::from("/lib/cinder/net/http.cin"),
            ]
        );
    }

    #[test]
    fn test_candidate_paths_without_search_dirs() {
        let candidates = candidate_paths("util", &[]);
        assert_eq!(candidates, vec![PathBuf::from("util.cin")]);
    }
}
