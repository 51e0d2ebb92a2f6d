//! Tree-walking evaluator
//!
//! A single recursive function maps (AST node, environment) to a value.
//! Break and Return ride the unwinding channel (`Unwind`) past ordinary
//! expression evaluation: Break stops at the nearest loop, Return at the
//! nearest call boundary (or the top level, which yields the value).
//! `try` catches ordinary errors only and never the two signals.

use crate::ast::{Expr, ExprKind};
use crate::diagnostics::{RuntimeError, SourceFile};
use crate::host;
use crate::interp::env::Environment;
use crate::interp::methods;
use crate::interp::value::{EvalResult, NativeImpl, Payload, Unwind, Value};
use crate::{builtins, lexer, parser};

/// The interpreter: evaluator plus the process-lifetime root environment
pub struct Interpreter {
    pub(crate) env: Environment,
}

impl Interpreter {
    /// Create an interpreter with all builtins installed in the root frame
    pub fn new() -> Self {
        let mut env = Environment::new();
        builtins::install(&mut env);
        Interpreter { env }
    }

    /// Enter a persistent child scope (used by the REPL so session
    /// bindings do not land in the root frame)
    pub fn enter_scope(&mut self) {
        self.env.descend();
    }

    /// Top-level entry point: parse, then evaluate in a fresh child of
    /// the root frame
    pub fn evaluate_program(&mut self, file: &SourceFile) -> miette::Result<Value> {
        tracing::debug!("evaluating {}", file.name);
        let tokens = lexer::lex(file)?;
        let ast = parser::parse(&tokens, file)?;
        let saved = self.env.current();
        self.env.descend_from(self.env.root());
        let result = self.eval(&ast);
        self.env.ascend_discard();
        self.env.restore(saved);
        self.finish(result)
    }

    /// Evaluate one expression in the current scope (REPL lines)
    pub fn evaluate_line(&mut self, file: &SourceFile) -> miette::Result<Value> {
        let tokens = lexer::lex(file)?;
        let ast = parser::parse(&tokens, file)?;
        let result = self.eval(&ast);
        self.finish(result)
    }

    fn finish(&self, result: EvalResult) -> miette::Result<Value> {
        match result {
            Ok(value) => Ok(value),
            // The top level is the outermost call boundary
            Err(Unwind::Return(value)) => Ok(value),
            Err(Unwind::Break) => Err(miette::Report::new(RuntimeError::type_error(
                "`break` with no enclosing loop",
            ))),
            Err(Unwind::Error(error)) => Err(miette::Report::new(error)),
        }
    }

    /// Evaluate an already-parsed expression in a fresh child of the root
    /// frame, treating it as a call boundary (the `eval` builtin and the
    /// module loader)
    pub(crate) fn eval_in_root_scope(&mut self, expr: &Expr) -> EvalResult {
        let saved = self.env.current();
        self.env.descend_from(self.env.root());
        let result = self.eval(expr);
        self.env.ascend_discard();
        self.env.restore(saved);
        match result {
            Err(Unwind::Return(value)) => Ok(value),
            Err(Unwind::Break) => {
                Err(RuntimeError::type_error("`break` with no enclosing loop").into())
            }
            other => other,
        }
    }

    /// Evaluate an expression
    pub fn eval(&mut self, expr: &Expr) -> EvalResult {
        match &expr.kind {
            ExprKind::Number(n) => Ok(Value::number(*n)),

            ExprKind::Str(s) => Ok(Value::string(s.clone())),

            ExprKind::Name(name) => Ok(self.env.lookup(name)?),

            ExprKind::Call { callee, args } => {
                let callee = self.eval(callee)?;
                let mut evaluated = Vec::with_capacity(args.len());
                for arg in args {
                    evaluated.push(self.eval(arg)?);
                }
                self.call_value(&callee, evaluated)
            }

            ExprKind::Attr { base, name } => {
                let base = self.eval(base)?;
                self.get_attribute(&base, name)
            }

            ExprKind::If {
                cond,
                then,
                otherwise,
            } => {
                if self.eval(cond)?.is_truthy() {
                    self.eval(then)
                } else if let Some(otherwise) = otherwise {
                    self.eval(otherwise)
                } else {
                    Ok(Value::unit())
                }
            }

            ExprKind::Block(exprs) => self.eval_block(exprs),

            ExprKind::While { cond, body } => {
                let mut collected = Vec::new();
                loop {
                    if !self.eval(cond)?.is_truthy() {
                        break;
                    }
                    match self.eval(body) {
                        Ok(value) => collected.push(value),
                        // Break stops this loop, not the whole function
                        Err(Unwind::Break) => break,
                        Err(unwind) => return Err(unwind),
                    }
                }
                Ok(Value::list(collected))
            }

            ExprKind::For {
                var,
                iterable,
                body,
            } => self.eval_for(var, iterable, body),

            ExprKind::Let {
                name,
                mutable,
                value,
            } => {
                // Initializer runs in the current environment, before the
                // binding exists
                let value = self.eval(value)?;
                self.env.declare(name, *mutable, value.clone())?;
                Ok(value)
            }

            ExprKind::Def { params, body } => {
                let captured = self.env.current();
                self.env.pin(captured);
                let params = params.clone();
                let body = body.clone();
                Ok(Value::native("anonymous", move |interp, args| {
                    if args.len() > params.len() {
                        return Err(RuntimeError::type_error(format!(
                            "too many arguments: expected {}, got {}",
                            params.len(),
                            args.len()
                        ))
                        .into());
                    }
                    if args.len() < params.len() {
                        return Err(RuntimeError::type_error(format!(
                            "not enough arguments: expected {}, got {}",
                            params.len(),
                            args.len()
                        ))
                        .into());
                    }
                    let caller = interp.env.current();
                    interp.env.descend_from(captured);
                    for (param, arg) in params.iter().zip(args) {
                        interp.env.insert(param, false, arg);
                    }
                    let result = interp.eval(&body);
                    // Call frames are discarded, never merged back
                    interp.env.ascend_discard();
                    interp.env.restore(caller);
                    match result {
                        Err(Unwind::Return(value)) => Ok(value),
                        other => other,
                    }
                }))
            }

            ExprKind::ModuleDef { exports, body } => self.eval_module(exports, body),

            ExprKind::Try { body, handler } => match self.eval(body) {
                // Ordinary errors only; Break and Return pass through
                Err(Unwind::Error(_)) => self.eval(handler),
                other => other,
            },

            ExprKind::Break => Err(Unwind::Break),

            ExprKind::Return(value) => {
                let value = self.eval(value)?;
                Err(Unwind::Return(value))
            }
        }
    }

    /// Evaluate a block: child frame, last value wins, locals merge into
    /// the parent on natural exit only
    fn eval_block(&mut self, exprs: &[Expr]) -> EvalResult {
        self.env.descend();
        let mut result = Value::unit();
        for expr in exprs {
            match self.eval(expr) {
                Ok(value) => result = value,
                Err(unwind) => {
                    self.env.ascend_discard();
                    return Err(unwind);
                }
            }
        }
        self.env.ascend_merge();
        Ok(result)
    }

    /// Evaluate a for loop over the iterable's `__iter__` protocol
    fn eval_for(&mut self, var: &str, iterable: &Expr, body: &Expr) -> EvalResult {
        let iterable = self.eval(iterable)?;
        let iter_method = self.get_attribute(&iterable, "__iter__")?;
        let iterator = self.call_value(&iter_method, Vec::new())?;

        self.env.descend();
        let mut collected = Vec::new();
        let outcome = loop {
            let element = match self.call_value(&iterator, Vec::new()) {
                Ok(value) => value,
                Err(Unwind::Error(RuntimeError::StopIteration)) => break Ok(()),
                Err(unwind) => break Err(unwind),
            };
            self.env.insert(var, false, element);
            match self.eval(body) {
                Ok(value) => collected.push(value),
                Err(Unwind::Break) => break Ok(()),
                Err(unwind) => break Err(unwind),
            }
        };
        match outcome {
            Ok(()) => {
                self.env.ascend_merge();
                Ok(Value::list(collected))
            }
            Err(unwind) => {
                self.env.ascend_discard();
                Err(unwind)
            }
        }
    }

    /// Evaluate a module definition: the body runs in a child frame and
    /// exactly the declared export names are copied into the module value
    fn eval_module(&mut self, exports: &[String], body: &Expr) -> EvalResult {
        let frame = self.env.descend();
        match self.eval(body) {
            Ok(_) => {
                let mut entries = Vec::with_capacity(exports.len());
                for name in exports {
                    match self.env.frame_binding(frame, name) {
                        Some(binding) => entries.push((name.clone(), binding.value)),
                        None => {
                            self.env.ascend_discard();
                            return Err(RuntimeError::name(name).into());
                        }
                    }
                }
                self.env.ascend_discard();
                Ok(Value::module(entries))
            }
            Err(unwind) => {
                self.env.ascend_discard();
                Err(unwind)
            }
        }
    }

    /// Attribute resolution: catch-all interceptor, then direct entry
    /// (with built-in methods behaving as direct entries shadowed by
    /// user-set ones), then fallback interceptor, then AttributeError
    pub fn get_attribute(&mut self, value: &Value, name: &str) -> EvalResult {
        if let Some(interceptor) = value.dict_get("__getallattr__") {
            return self.call_value(&interceptor, vec![Value::string(name)]);
        }
        if let Some(entry) = value.dict_get(name) {
            return Ok(entry);
        }
        if let Some(bound) = methods::lookup_builtin(value, name) {
            return Ok(bound);
        }
        if let Some(fallback) = value.dict_get("__getattr__") {
            return self.call_value(&fallback, vec![Value::string(name)]);
        }
        Err(RuntimeError::attribute(value.to_string(), name).into())
    }

    /// Call a value with evaluated arguments
    ///
    /// Native functions are invoked directly; anything else resolves its
    /// `__call__` attribute and recurses.
    pub fn call_value(&mut self, callee: &Value, args: Vec<Value>) -> EvalResult {
        let imp = match callee.payload() {
            Payload::Native(nf) => Some(nf.imp.clone()),
            _ => None,
        };
        match imp {
            Some(NativeImpl::Eval(f)) => f(self, args),
            Some(NativeImpl::Host(f)) => {
                let mut host_args = Vec::with_capacity(args.len());
                for arg in &args {
                    host_args.push(host::to_host_value(arg)?);
                }
                let out = f(host_args)?;
                Ok(host::to_runtime_value(out))
            }
            None => {
                let target = match self.get_attribute(callee, "__call__") {
                    Ok(target) => target,
                    Err(Unwind::Error(RuntimeError::Attribute { .. })) => {
                        return Err(RuntimeError::type_error(format!(
                            "{} is not callable",
                            callee.type_name()
                        ))
                        .into());
                    }
                    Err(unwind) => return Err(unwind),
                };
                if target.ptr_eq(callee) {
                    return Err(RuntimeError::type_error(format!(
                        "{} is not callable",
                        callee.type_name()
                    ))
                    .into());
                }
                self.call_value(&target, args)
            }
        }
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}
