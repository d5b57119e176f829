use std::io::Write;

use gojo_common::error::{Error, Result, TypeError};
use gojo_common::types::Span;

use crate::value::Value;
use crate::Interpreter;

pub trait Callable {
    /// The number of arguments expected, or `None` if any number is accepted.
    fn arity(&self) -> Option<usize>;

    fn name(&self) -> &str;

    fn call_unchecked<Stdout: Write>(
        &self,
        interpreter: &mut Interpreter<Stdout>,
        args: Vec<Value>,
        span: &Span,
    ) -> Result<Value>;

    fn call<Stdout: Write>(
        &self,
        interpreter: &mut Interpreter<Stdout>,
        args: Vec<Value>,
        span: &Span,
    ) -> Result<Value> {
        if let Some(exp_args) = self.arity() {
            let got_args = args.len();
            if exp_args != got_args {
                return Err((
                    Error::TypeError(TypeError::ArityMismatch {
                        name: self.name().to_string(),
                        exp_args,
                        got_args,
                    }),
                    span.clone(),
                ));
            }
        }
        self.call_unchecked(interpreter, args, span)
    }
}
