use std::fmt::{self, Display, Formatter};
use std::io::Write;

use gc::{Finalize, Trace};
use gojo_common::error::{Error, Result, ValueError};
use gojo_common::types::Span;

use crate::value::{Callable, Value};
use crate::Interpreter;

/// A built-in function, reached through its namespace (`Math.sqrt`).
#[derive(Clone, Debug, Eq, Finalize, Trace, PartialEq)]
pub enum Native {
    ConsoleLog,
    MathPow,
    MathSqrt,
}

impl Callable for Native {
    fn arity(&self) -> Option<usize> {
        match self {
            Native::ConsoleLog => None,
            Native::MathPow => Some(2),
            Native::MathSqrt => Some(1),
        }
    }

    fn name(&self) -> &str {
        match self {
            Native::ConsoleLog => "console.log",
            Native::MathPow => "Math.pow",
            Native::MathSqrt => "Math.sqrt",
        }
    }

    fn call_unchecked<Stdout: Write>(
        &self,
        interpreter: &mut Interpreter<Stdout>,
        args: Vec<Value>,
        span: &Span,
    ) -> Result<Value> {
        match self {
            Native::ConsoleLog => {
                let line = args.iter().map(Value::inspect).collect::<Vec<_>>().join(" ");
                interpreter.write_line(&line, span)?;
                Ok(Value::Undefined)
            }
            Native::MathPow => match (&args[0], &args[1]) {
                (Value::Number(base), Value::Number(exp)) => Ok(Value::Number(base.powf(*exp))),
                _ => Err(self.invalid_argument("arguments must be numbers", span)),
            },
            Native::MathSqrt => match &args[0] {
                Value::Number(number) if *number >= 0.0 => Ok(Value::Number(number.sqrt())),
                _ => Err(self.invalid_argument("argument must be a non-negative number", span)),
            },
        }
    }
}

impl Native {
    fn invalid_argument(&self, reason: &str, span: &Span) -> (Error, Span) {
        (
            Error::ValueError(ValueError::InvalidArgument {
                name: self.name().to_string(),
                reason: reason.to_string(),
            }),
            span.clone(),
        )
    }
}

impl Display for Native {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "function {}() {{ [native code] }}", self.name())
    }
}
