//! Runtime values and the attribute-dictionary protocol
//!
//! Every value is a shared handle (`Rc`) to a payload plus a mutable
//! attribute dictionary. Cloning a value clones the handle, so Lists and
//! objects alias their backing storage through every copy of the value.
//! Dispatch never goes through a vtable: attribute resolution consults the
//! dictionary (and the per-variant built-in method table, see
//! [`super::methods`]) by name.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::diagnostics::RuntimeError;
use crate::host::{HostFn, ResourceHandle};
use crate::interp::eval::Interpreter;

/// Non-local control flow and errors, threaded through every evaluation
///
/// `Break` and `Return` are not errors: they unwind to the nearest loop
/// or call boundary and are never caught by `try`. Ordinary errors ride
/// the same channel so that `?` propagates everything uniformly.
#[derive(Debug)]
pub enum Unwind {
    Error(RuntimeError),
    Break,
    Return(Value),
}

impl From<RuntimeError> for Unwind {
    fn from(err: RuntimeError) -> Self {
        Unwind::Error(err)
    }
}

/// Result of evaluating one AST node
pub type EvalResult = Result<Value, Unwind>;

/// Native function implementation
#[derive(Clone)]
pub enum NativeImpl {
    /// Runs inside the evaluator; may call back into it
    Eval(Rc<dyn Fn(&mut Interpreter, Vec<Value>) -> EvalResult>),
    /// Pure host work over converted host values; thread-shippable
    Host(HostFn),
}

/// A callable wrapping host code or a language-defined function body
#[derive(Clone)]
pub struct NativeFn {
    pub name: Rc<str>,
    pub imp: NativeImpl,
}

/// Variant-specific payload of a runtime value
pub enum Payload {
    /// The `None` singleton
    Unit,
    /// Double-precision float; the only falsy value is exactly 0
    Number(f64),
    /// Sequence of Unicode scalar values; escapes stored verbatim
    Str(String),
    /// Raw byte sequence
    Bytes(Vec<u8>),
    /// Ordered, mutable, reference-shared sequence
    List(RefCell<Vec<Value>>),
    /// Callable
    Native(NativeFn),
    /// Open-ended attribute dictionary with no extra payload
    Object,
    /// Attribute set frozen after construction
    Module,
    /// Host-managed resource (e.g. an open file)
    Resource(Arc<ResourceHandle>),
}

struct ValueInner {
    payload: Payload,
    dict: RefCell<IndexMap<String, Value>>,
}

/// A runtime value: shared handle to payload + attribute dictionary
#[derive(Clone)]
pub struct Value(Rc<ValueInner>);

impl Value {
    fn from_payload(payload: Payload) -> Self {
        Value(Rc::new(ValueInner {
            payload,
            dict: RefCell::new(IndexMap::new()),
        }))
    }

    pub fn unit() -> Self {
        Value::from_payload(Payload::Unit)
    }

    pub fn number(n: f64) -> Self {
        Value::from_payload(Payload::Number(n))
    }

    /// Comparison/logic results: Number 1 or 0
    pub fn bool(b: bool) -> Self {
        Value::number(if b { 1.0 } else { 0.0 })
    }

    pub fn string(s: impl Into<String>) -> Self {
        Value::from_payload(Payload::Str(s.into()))
    }

    pub fn bytes(b: Vec<u8>) -> Self {
        Value::from_payload(Payload::Bytes(b))
    }

    pub fn list(values: Vec<Value>) -> Self {
        Value::from_payload(Payload::List(RefCell::new(values)))
    }

    pub fn object() -> Self {
        Value::from_payload(Payload::Object)
    }

    pub fn resource(handle: Arc<ResourceHandle>) -> Self {
        Value::from_payload(Payload::Resource(handle))
    }

    /// A module whose attribute set is exactly `exports`
    pub fn module(exports: Vec<(String, Value)>) -> Self {
        Value(Rc::new(ValueInner {
            payload: Payload::Module,
            dict: RefCell::new(exports.into_iter().collect()),
        }))
    }

    /// Wrap an evaluator-side native function
    pub fn native(
        name: impl Into<String>,
        f: impl Fn(&mut Interpreter, Vec<Value>) -> EvalResult + 'static,
    ) -> Self {
        Value::from_payload(Payload::Native(NativeFn {
            name: Rc::from(name.into()),
            imp: NativeImpl::Eval(Rc::new(f)),
        }))
    }

    /// Wrap a host-side native function (thread-shippable)
    pub fn native_host(name: impl Into<String>, f: HostFn) -> Self {
        Value::from_payload(Payload::Native(NativeFn {
            name: Rc::from(name.into()),
            imp: NativeImpl::Host(f),
        }))
    }

    pub fn payload(&self) -> &Payload {
        &self.0.payload
    }

    pub fn ptr_eq(&self, other: &Value) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Get the type name of this value
    pub fn type_name(&self) -> &'static str {
        match self.payload() {
            Payload::Unit => "none",
            Payload::Number(_) => "number",
            Payload::Str(_) => "string",
            Payload::Bytes(_) => "bytes",
            Payload::List(_) => "list",
            Payload::Native(_) => "function",
            Payload::Object => "object",
            Payload::Module => "module",
            Payload::Resource(_) => "resource",
        }
    }

    /// Check if value is truthy: everything except the Number 0
    pub fn is_truthy(&self) -> bool {
        !matches!(self.payload(), Payload::Number(n) if *n == 0.0)
    }

    /// Direct dictionary lookup, no interceptors, no built-in methods
    pub fn dict_get(&self, name: &str) -> Option<Value> {
        self.0.dict.borrow().get(name).cloned()
    }

    /// Direct dictionary mutation; fails for frozen module dictionaries
    pub fn dict_set(&self, name: impl Into<String>, value: Value) -> Result<(), RuntimeError> {
        if matches!(self.payload(), Payload::Module) {
            return Err(RuntimeError::type_error(
                "module attributes are immutable",
            ));
        }
        self.0.dict.borrow_mut().insert(name.into(), value);
        Ok(())
    }

    /// Unconditional insert, used where the dictionary is known open
    /// (freshly built objects, module construction)
    pub(crate) fn dict_insert(&self, name: impl Into<String>, value: Value) {
        self.0.dict.borrow_mut().insert(name.into(), value);
    }

    /// Snapshot of the dictionary entries, in insertion order
    pub fn dict_entries(&self) -> Vec<(String, Value)> {
        self.0
            .dict
            .borrow()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

/// Structural equality per variant
///
/// Values of different variants are never equal. Variants with an
/// equality-relevant field (Number, Str, Bytes, List) compare that field;
/// the rest compare their attribute dictionaries structurally, except
/// resources, which compare by handle identity.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a.payload(), b.payload()) {
        (Payload::Unit, Payload::Unit) => true,
        (Payload::Number(x), Payload::Number(y)) => x == y,
        (Payload::Str(x), Payload::Str(y)) => x == y,
        (Payload::Bytes(x), Payload::Bytes(y)) => x == y,
        (Payload::List(x), Payload::List(y)) => {
            if a.ptr_eq(b) {
                return true;
            }
            let x = x.borrow();
            let y = y.borrow();
            x.len() == y.len() && x.iter().zip(y.iter()).all(|(l, r)| values_equal(l, r))
        }
        (Payload::Resource(x), Payload::Resource(y)) => Arc::ptr_eq(x, y),
        (Payload::Native(_), Payload::Native(_))
        | (Payload::Object, Payload::Object)
        | (Payload::Module, Payload::Module) => dicts_equal(a, b),
        _ => false,
    }
}

fn dicts_equal(a: &Value, b: &Value) -> bool {
    if a.ptr_eq(b) {
        return true;
    }
    let x = a.0.dict.borrow();
    let y = b.0.dict.borrow();
    x.len() == y.len()
        && x.iter()
            .all(|(k, v)| y.get(k).is_some_and(|w| values_equal(v, w)))
}

/// Render a Number the way the REPL shows it: no trailing `.0` noise
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.is_finite() && n.abs() < 9e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.payload() {
            Payload::Unit => write!(f, "None"),
            Payload::Number(n) => write!(f, "{}", format_number(*n)),
            Payload::Str(s) => write!(f, "\"{}\"", s),
            Payload::Bytes(b) => {
                write!(f, "b\"")?;
                for byte in b {
                    write!(f, "{}", byte.escape_ascii())?;
                }
                write!(f, "\"")
            }
            Payload::List(values) => {
                write!(f, "[")?;
                let values = values.borrow();
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", v)?;
                }
                write!(f, "]")
            }
            Payload::Native(nf) => write!(f, "<fn {}>", nf.name),
            Payload::Object => write!(f, "<object>"),
            Payload::Module => {
                write!(f, "<module")?;
                for key in self.0.dict.borrow().keys() {
                    write!(f, " {}", key)?;
                }
                write!(f, ">")
            }
            Payload::Resource(handle) => write!(f, "<resource {}>", handle.path()),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truthiness() {
        assert!(!Value::number(0.0).is_truthy());
        assert!(Value::number(0.5).is_truthy());
        assert!(Value::number(-1.0).is_truthy());
        assert!(Value::number(f64::NAN).is_truthy());
        assert!(Value::unit().is_truthy());
        assert!(Value::string("").is_truthy());
        assert!(Value::list(vec![]).is_truthy());
    }

    #[test]
    fn test_number_equality() {
        assert!(values_equal(&Value::number(3.0), &Value::number(3.0)));
        assert!(!values_equal(&Value::number(3.0), &Value::number(4.0)));
        assert!(!values_equal(&Value::number(1.0), &Value::string("1")));
    }

    #[test]
    fn test_list_equality_is_elementwise() {
        let a = Value::list(vec![Value::number(1.0), Value::string("x")]);
        let b = Value::list(vec![Value::number(1.0), Value::string("x")]);
        assert!(values_equal(&a, &b));

        let c = Value::list(vec![Value::number(1.0)]);
        assert!(!values_equal(&a, &c));
    }

    #[test]
    fn test_object_equality_is_dict_structural() {
        let a = Value::object();
        let b = Value::object();
        assert!(values_equal(&a, &b));

        a.dict_set("x", Value::number(1.0)).expect("object is open");
        assert!(!values_equal(&a, &b));
        b.dict_set("x", Value::number(1.0)).expect("object is open");
        assert!(values_equal(&a, &b));
    }

    #[test]
    fn test_module_dict_is_frozen() {
        let module = Value::module(vec![("x".to_string(), Value::number(1.0))]);
        assert!(module.dict_set("y", Value::number(2.0)).is_err());
        assert!(values_equal(
            &module.dict_get("x").expect("export is present"),
            &Value::number(1.0)
        ));
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::number(3.0).to_string(), "3");
        assert_eq!(Value::number(3.5).to_string(), "3.5");
        assert_eq!(Value::string("hi").to_string(), "\"hi\"");
        assert_eq!(
            Value::list(vec![Value::number(1.0), Value::string("a")]).to_string(),
            "[1, \"a\"]"
        );
        assert_eq!(Value::unit().to_string(), "None");
    }
}
