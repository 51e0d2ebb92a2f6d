//! Host interop boundary
//!
//! Bidirectional conversion between runtime values and host values, the
//! builtin-registration contract used by the builtin library modules, the
//! host-managed resource handle behind `open`, and the native-thread
//! surface. Host values are fully owned and `Send`: work shipped to a
//! spawned thread never touches live runtime values.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, Read, Write};
use std::sync::{Arc, Mutex};

use crate::diagnostics::RuntimeError;
use crate::interp::env::Environment;
use crate::interp::value::{NativeImpl, Payload, Value};

/// A host callable over host values; safe to invoke from any thread
pub type HostFn = Arc<dyn Fn(Vec<HostValue>) -> Result<HostValue, RuntimeError> + Send + Sync>;

/// Host-side representation of a runtime value
pub enum HostValue {
    Unit,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Binary(Vec<u8>),
    Seq(Vec<HostValue>),
    Record(Vec<(String, HostValue)>),
    Callable { name: String, f: HostFn },
    Resource(Arc<ResourceHandle>),
}

/// Convert a runtime value to a host value
///
/// Numbers become integers when exactly representable; strings have their
/// backslash escapes decoded; lists, objects and modules convert
/// recursively. Interpreter-defined functions convert to a named callable
/// that fails when invoked: without the evaluator there is nothing sound
/// to run.
pub fn to_host_value(value: &Value) -> Result<HostValue, RuntimeError> {
    match value.payload() {
        Payload::Unit => Ok(HostValue::Unit),
        Payload::Number(n) => {
            if n.fract() == 0.0 && n.is_finite() && n.abs() < 9e15 {
                Ok(HostValue::Int(*n as i64))
            } else {
                Ok(HostValue::Float(*n))
            }
        }
        Payload::Str(s) => Ok(HostValue::Text(decode_escapes(s))),
        Payload::Bytes(b) => Ok(HostValue::Binary(b.clone())),
        Payload::List(values) => {
            let values = values.borrow();
            let mut out = Vec::with_capacity(values.len());
            for v in values.iter() {
                out.push(to_host_value(v)?);
            }
            Ok(HostValue::Seq(out))
        }
        Payload::Native(nf) => Ok(HostValue::Callable {
            name: nf.name.to_string(),
            f: match &nf.imp {
                NativeImpl::Host(f) => f.clone(),
                NativeImpl::Eval(_) => {
                    let name = nf.name.to_string();
                    Arc::new(move |_args: Vec<HostValue>| {
                        Err(RuntimeError::type_error(format!(
                            "function `{}` needs the interpreter and cannot run at the host boundary",
                            name
                        )))
                    })
                }
            },
        }),
        Payload::Object | Payload::Module => {
            let mut fields = Vec::new();
            for (name, v) in value.dict_entries() {
                fields.push((name, to_host_value(&v)?));
            }
            Ok(HostValue::Record(fields))
        }
        Payload::Resource(handle) => Ok(HostValue::Resource(handle.clone())),
    }
}

/// Convert a host value to a runtime value
///
/// Booleans and unit map to the dedicated singletons (Numbers 1/0 and
/// `None`); callables wrap into host-kind native functions; records
/// become plain objects mirroring their field set.
pub fn to_runtime_value(value: HostValue) -> Value {
    match value {
        HostValue::Unit => Value::unit(),
        HostValue::Bool(b) => Value::bool(b),
        HostValue::Int(i) => Value::number(i as f64),
        HostValue::Float(f) => Value::number(f),
        HostValue::Text(s) => Value::string(encode_escapes(&s)),
        HostValue::Binary(b) => Value::bytes(b),
        HostValue::Seq(items) => Value::list(items.into_iter().map(to_runtime_value).collect()),
        HostValue::Record(fields) => {
            let object = Value::object();
            for (name, v) in fields {
                object.dict_insert(name, to_runtime_value(v));
            }
            object
        }
        HostValue::Callable { name, f } => Value::native_host(name, f),
        HostValue::Resource(handle) => Value::resource(handle),
    }
}

impl fmt::Display for HostValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostValue::Unit => write!(f, "None"),
            HostValue::Bool(b) => write!(f, "{}", if *b { "True" } else { "False" }),
            HostValue::Int(i) => write!(f, "{}", i),
            HostValue::Float(x) => write!(f, "{}", x),
            HostValue::Text(s) => write!(f, "{}", s),
            HostValue::Binary(b) => {
                write!(f, "b\"")?;
                for byte in b {
                    write!(f, "{}", byte.escape_ascii())?;
                }
                write!(f, "\"")
            }
            HostValue::Seq(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            HostValue::Record(fields) => {
                write!(f, "{{")?;
                for (i, (name, v)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", name, v)?;
                }
                write!(f, "}}")
            }
            HostValue::Callable { name, .. } => write!(f, "<fn {}>", name),
            HostValue::Resource(handle) => write!(f, "<resource {}>", handle.path()),
        }
    }
}

/// Decode backslash escapes in a runtime string for host consumption
pub fn decode_escapes(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some('\\') => out.push('\\'),
            Some('"') => out.push('"'),
            Some(other) => {
                // Unknown escape: keep it verbatim
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Re-encode host text into runtime escape form; inverse of
/// [`decode_escapes`] for text produced by it
pub fn encode_escapes(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\0' => out.push_str("\\0"),
            '"' => out.push_str("\\\""),
            other => out.push(other),
        }
    }
    out
}

/// Install an immutable binding in the root frame
///
/// This is the sole hook builtin library modules have into the global
/// namespace. Re-registration under the same name replaces the binding
/// directly, bypassing the usual re-declaration mutability check:
/// builtins are installed before user code runs.
pub fn register_builtin(env: &mut Environment, name: &str, value: Value) {
    env.insert_root(name, value);
}

/// Run host work on a detached native thread
///
/// The closure must own everything it touches; live runtime values are
/// never `Send`, so the type system enforces the isolation the evaluator
/// relies on.
pub fn spawn_detached(f: impl FnOnce() + Send + 'static) {
    std::thread::spawn(f);
}

// ==================== RESOURCES ====================

/// Mode a resource was opened in
enum ResourceIo {
    Reader(BufReader<File>),
    Writer(BufWriter<File>),
}

/// A host-managed file resource with scoped-acquisition discipline:
/// opened on request, explicitly closed, no implicit finalization
/// promised by the core.
pub struct ResourceHandle {
    path: String,
    binary: bool,
    io: Mutex<Option<ResourceIo>>,
}

impl ResourceHandle {
    /// Open a file resource; modes are `r`, `rb`, `w`, `a`
    pub fn open(path: &str, mode: &str) -> Result<Arc<Self>, RuntimeError> {
        let (io, binary) = match mode {
            "r" | "rb" => {
                let file = File::open(path)
                    .map_err(|e| RuntimeError::io(format!("cannot open `{}`: {}", path, e)))?;
                (ResourceIo::Reader(BufReader::new(file)), mode == "rb")
            }
            "w" => {
                let file = File::create(path)
                    .map_err(|e| RuntimeError::io(format!("cannot create `{}`: {}", path, e)))?;
                (ResourceIo::Writer(BufWriter::new(file)), false)
            }
            "a" => {
                let file = OpenOptions::new()
                    .append(true)
                    .create(true)
                    .open(path)
                    .map_err(|e| RuntimeError::io(format!("cannot open `{}`: {}", path, e)))?;
                (ResourceIo::Writer(BufWriter::new(file)), false)
            }
            other => {
                return Err(RuntimeError::type_error(format!(
                    "unsupported file mode `{}`",
                    other
                )));
            }
        };
        Ok(Arc::new(ResourceHandle {
            path: path.to_string(),
            binary,
            io: Mutex::new(Some(io)),
        }))
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_binary(&self) -> bool {
        self.binary
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Option<ResourceIo>>, RuntimeError> {
        self.io
            .lock()
            .map_err(|_| RuntimeError::io(format!("resource `{}` is poisoned", self.path)))
    }

    /// Read up to `limit` bytes, or to end of file when `limit` is None
    pub fn read(&self, limit: Option<u64>) -> Result<Vec<u8>, RuntimeError> {
        let mut guard = self.lock()?;
        let io = guard
            .as_mut()
            .ok_or_else(|| RuntimeError::io(format!("resource `{}` is closed", self.path)))?;
        let ResourceIo::Reader(reader) = io else {
            return Err(RuntimeError::io(format!(
                "resource `{}` is not open for reading",
                self.path
            )));
        };
        let mut buffer = Vec::new();
        let result = match limit {
            Some(n) => reader.take(n).read_to_end(&mut buffer),
            None => reader.read_to_end(&mut buffer),
        };
        result.map_err(|e| RuntimeError::io(format!("read from `{}` failed: {}", self.path, e)))?;
        Ok(buffer)
    }

    pub fn write(&self, data: &[u8]) -> Result<(), RuntimeError> {
        let mut guard = self.lock()?;
        let io = guard
            .as_mut()
            .ok_or_else(|| RuntimeError::io(format!("resource `{}` is closed", self.path)))?;
        let ResourceIo::Writer(writer) = io else {
            return Err(RuntimeError::io(format!(
                "resource `{}` is not open for writing",
                self.path
            )));
        };
        writer
            .write_all(data)
            .map_err(|e| RuntimeError::io(format!("write to `{}` failed: {}", self.path, e)))
    }

    /// Flush and release the underlying file; further operations fail
    pub fn close(&self) -> Result<(), RuntimeError> {
        let mut guard = self.lock()?;
        if let Some(ResourceIo::Writer(mut writer)) = guard.take() {
            writer
                .flush()
                .map_err(|e| RuntimeError::io(format!("flush of `{}` failed: {}", self.path, e)))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interp::value::values_equal;

    #[test]
    fn test_escape_round_trip() {
        let raw = "line one\nline two\ttabbed \"quoted\"";
        assert_eq!(decode_escapes(&encode_escapes(raw)), raw);
        let stored = "a\\nb";
        assert_eq!(encode_escapes(&decode_escapes(stored)), stored);
    }

    #[test]
    fn test_number_conversion_prefers_integers() {
        let host = to_host_value(&Value::number(3.0)).expect("numbers convert");
        assert!(matches!(host, HostValue::Int(3)));
        let host = to_host_value(&Value::number(3.5)).expect("numbers convert");
        assert!(matches!(host, HostValue::Float(x) if x == 3.5));
    }

    #[test]
    fn test_round_trip_core_variants() {
        let samples = vec![
            Value::number(0.0),
            Value::number(-17.25),
            Value::string("hello"),
            Value::bytes(vec![0, 1, 255]),
            Value::list(vec![]),
            Value::list(vec![Value::number(1.0), Value::string("two")]),
        ];
        for value in samples {
            let back = to_runtime_value(to_host_value(&value).expect("conversion succeeds"));
            assert!(
                values_equal(&value, &back),
                "round trip changed {}",
                value
            );
        }
    }

    #[test]
    fn test_record_becomes_object() {
        let host = HostValue::Record(vec![("x".to_string(), HostValue::Int(1))]);
        let value = to_runtime_value(host);
        assert!(values_equal(
            &value.dict_get("x").expect("field is mirrored"),
            &Value::number(1.0)
        ));
    }
}
