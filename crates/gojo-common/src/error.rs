use crate::types::{Position, Span, Spanned};

use codespan_reporting::diagnostic::{Diagnostic, Label};
use codespan_reporting::files::{self, SimpleFile};
use codespan_reporting::term;
use termcolor::WriteColor;
use thiserror::Error;

pub type ErrorS = Spanned<Error>;
pub type Result<T, E = ErrorS> = std::result::Result<T, E>;

#[remain::sorted]
#[derive(Debug, Error, Eq, PartialEq)]
pub enum Error {
    #[error("AttributeError: {0}")]
    AttributeError(AttributeError),
    #[error("Interrupted: execution was cancelled")]
    Interrupted,
    #[error("IOError: {0}")]
    IoError(IoError),
    #[error("NameError: {0}")]
    NameError(NameError),
    #[error("RecursionError: maximum call depth of {max_depth} exceeded")]
    RecursionError { max_depth: usize },
    #[error("SyntaxError: {0}")]
    SyntaxError(SyntaxError),
    #[error("TypeError: {0}")]
    TypeError(TypeError),
    #[error("ValueError: {0}")]
    ValueError(ValueError),
    #[error("ZeroDivisionError: {0}")]
    ZeroDivisionError(ZeroDivisionError),
}

impl Error {
    /// Lexing and parsing errors; everything else happens at runtime.
    pub fn is_syntax(&self) -> bool {
        matches!(self, Error::SyntaxError(_))
    }

    fn code(&self) -> &'static str {
        match self {
            Error::AttributeError(_) => "AttributeError",
            Error::Interrupted => "Interrupted",
            Error::IoError(_) => "IOError",
            Error::NameError(_) => "NameError",
            Error::RecursionError { .. } => "RecursionError",
            Error::SyntaxError(_) => "SyntaxError",
            Error::TypeError(_) => "TypeError",
            Error::ValueError(_) => "ValueError",
            Error::ZeroDivisionError(_) => "ZeroDivisionError",
        }
    }
}

impl AsDiagnostic for Error {
    fn as_diagnostic(&self, span: &Span) -> Diagnostic<()> {
        let diagnostic = Diagnostic::error()
            .with_code(self.code())
            .with_message(self.to_string())
            .with_labels(vec![Label::primary((), span.clone())]);
        match self {
            Error::SyntaxError(
                SyntaxError::UnrecognizedEof { expected }
                | SyntaxError::UnrecognizedToken { expected, .. },
            ) => diagnostic.with_notes(vec![format!("expected: {}", one_of(expected))]),
            _ => diagnostic,
        }
    }
}

#[derive(Debug, Error, Eq, PartialEq)]
pub enum AttributeError {
    #[error("{type_:?} object has no attribute {name:?}")]
    NoSuchAttribute { type_: String, name: String },
}

#[derive(Debug, Error, Eq, PartialEq)]
pub enum IoError {
    #[error("unable to write to file: {file:?}")]
    WriteError { file: String },
}

#[derive(Debug, Error, Eq, PartialEq)]
pub enum NameError {
    #[error("name {name:?} is not defined")]
    NotDefined { name: String },
}

#[remain::sorted]
#[derive(Debug, Error, Eq, PartialEq)]
pub enum SyntaxError {
    #[error(r#""break" outside loop or switch"#)]
    BreakOutsideLoop,
    #[error(r#""continue" outside loop"#)]
    ContinueOutsideLoop,
    #[error(r#"more than one "default" clause in switch"#)]
    DuplicateDefault,
    #[error("invalid assignment target")]
    InvalidAssignmentTarget,
    #[error("invalid escape sequence: {sequence:?}")]
    InvalidEscape { sequence: String },
    #[error("missing initializer in const declaration of {name:?}")]
    MissingInitializer { name: String },
    #[error("nesting exceeds the maximum depth of {max_depth}")]
    NestingTooDeep { max_depth: usize },
    #[error(r#""return" outside function"#)]
    ReturnOutsideFunction,
    #[error("unexpected input: {token:?}")]
    UnexpectedInput { token: String },
    #[error("unexpected end of file")]
    UnrecognizedEof { expected: Vec<String> },
    #[error("unexpected {token:?}")]
    UnrecognizedToken { token: String, expected: Vec<String> },
    #[error("unterminated comment")]
    UnterminatedComment,
    #[error("unterminated string")]
    UnterminatedString,
}

#[remain::sorted]
#[derive(Debug, Error, Eq, PartialEq)]
pub enum TypeError {
    #[error("{name}() takes {exp_args} arguments but {got_args} were given")]
    ArityMismatch { name: String, exp_args: usize, got_args: usize },
    #[error("assignment to constant variable {name:?}")]
    AssignToConstant { name: String },
    #[error("array index must be an integer from 0 to 4294967294, not {index}")]
    InvalidIndex { index: String },
    #[error("{type_:?} object is not callable")]
    NotCallable { type_: String },
    #[error("{type_:?} object is not indexable")]
    NotIndexable { type_: String },
    #[error("unsupported operand type(s) for {op}: {lt_type:?} and {rt_type:?}")]
    UnsupportedOperandInfix { op: String, lt_type: String, rt_type: String },
    #[error("unsupported operand type for {op}: {rt_type:?}")]
    UnsupportedOperandPrefix { op: String, rt_type: String },
}

#[derive(Debug, Error, Eq, PartialEq)]
pub enum ValueError {
    #[error("array length {len} exceeds the maximum of {max_len}")]
    ArrayTooLarge { len: usize, max_len: usize },
    #[error("{name}() {reason}")]
    InvalidArgument { name: String, reason: String },
}

#[derive(Debug, Error, Eq, PartialEq)]
pub enum ZeroDivisionError {
    #[error("division by zero")]
    Division,
    #[error("modulo by zero")]
    Modulo,
}

trait AsDiagnostic {
    fn as_diagnostic(&self, span: &Span) -> Diagnostic<()>;
}

fn one_of(tokens: &[String]) -> String {
    let (token_last, tokens) = match tokens.split_last() {
        Some((token_last, &[])) => return token_last.to_string(),
        Some((token_last, tokens)) => (token_last, tokens),
        None => return "nothing".to_string(),
    };

    let mut output = String::new();
    for token in tokens {
        output.push_str(token);
        output.push_str(", ");
    }
    output.push_str("or ");
    output.push_str(token_last);
    output
}

/// Renders an error with its source excerpt, e.g. for a terminal.
pub fn report_err(
    writer: &mut dyn WriteColor,
    name: &str,
    source: &str,
    (e, span): &ErrorS,
) -> Result<(), files::Error> {
    let file = SimpleFile::new(name, source);
    let config = term::Config::default();
    term::emit(writer, &config, &file, &e.as_diagnostic(span))
}

/// A single-line rendering: `<name>:<line>:<column>: <error>`.
pub fn format_err(name: &str, source: &str, (e, span): &ErrorS) -> String {
    format!("{name}:{}: {e}", Position::new(source, span.start))
}
