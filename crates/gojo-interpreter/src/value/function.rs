use std::fmt::{self, Display, Formatter};
use std::io::Write;
use std::rc::Rc;

use gc::{Finalize, Gc, Trace};
use gojo_common::error::Result;
use gojo_common::types::Span;
use gojo_syntax::ast::StmtFunction;

use crate::env::Env;
use crate::interpreter::Flow;
use crate::value::{Callable, Value};
use crate::Interpreter;

/// A user-defined function. Its body sees the global scope, its parameters
/// and its own name, but not the scope it was declared in.
#[derive(Clone, Debug, Finalize, Trace)]
pub struct Function(Gc<FunctionImpl>);

impl Function {
    pub fn new(decl: &Rc<StmtFunction>) -> Self {
        Function(Gc::new(FunctionImpl { decl: Rc::clone(decl) }))
    }

    pub fn params(&self) -> &[String] {
        &self.0.decl.params
    }

    pub fn ptr_eq(&self, other: &Function) -> bool {
        Gc::ptr_eq(&self.0, &other.0)
    }
}

impl Callable for Function {
    fn arity(&self) -> Option<usize> {
        Some(self.params().len())
    }

    fn name(&self) -> &str {
        &self.0.decl.name
    }

    fn call_unchecked<Stdout: Write>(
        &self,
        interpreter: &mut Interpreter<Stdout>,
        args: Vec<Value>,
        span: &Span,
    ) -> Result<Value> {
        let env = Env::with_parent(interpreter.globals());
        env.define(self.name(), Value::Function(self.clone()), false);
        for (param, arg) in self.params().iter().zip(args) {
            env.define(param, arg, false);
        }
        match interpreter.run_call(&env, &self.0.decl.body.stmts, span)? {
            Flow::Return(value) => Ok(value),
            Flow::Normal | Flow::Break | Flow::Continue => Ok(Value::Undefined),
        }
    }
}

impl Display for Function {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "function {}({}) {{ ... }}", self.name(), self.params().join(", "))
    }
}

#[derive(Debug, Finalize, Trace)]
pub struct FunctionImpl {
    #[unsafe_ignore_trace]
    decl: Rc<StmtFunction>,
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    fn declare(source: &str) -> Function {
        let program = gojo_syntax::parse(source).unwrap();
        match &program.stmts[0].0 {
            gojo_syntax::ast::Stmt::Function(decl) => Function::new(decl),
            stmt => panic!("expected function declaration, got {stmt:?}"),
        }
    }

    #[test]
    fn display_lists_params() {
        let function = declare("function add(a, b) { return a + b; }");
        assert_eq!(function.to_string(), "function add(a, b) { ... }");
        assert_eq!(Value::Function(function).repr(), "[Function: add]");
    }

    #[test]
    fn calls_bind_params_in_a_fresh_scope() {
        let function = declare("function add(a, b) { var sum = a + b; return sum; }");
        let mut interpreter = Interpreter::new(Vec::new());
        let args = vec![Value::Number(2.0), Value::Number(3.0)];
        assert_eq!(function.call(&mut interpreter, args, &(0..1)), Ok(Value::Number(5.0)));
        assert!(interpreter.globals().bindings().iter().all(|(name, _)| name != "sum"));
    }

    #[test]
    fn missing_return_yields_undefined() {
        let function = declare("function f() { 1 + 1; }");
        let mut interpreter = Interpreter::new(Vec::new());
        assert_eq!(function.call(&mut interpreter, Vec::new(), &(0..1)), Ok(Value::Undefined));
    }
}
