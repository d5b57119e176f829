mod callable;
mod function;
mod native;

use std::fmt::{self, Display, Formatter};

pub use callable::Callable;
pub use function::Function;
use gc::{Finalize, Gc, GcCell, Trace};
use gojo_common::error::{AttributeError, Error, Result, TypeError, ValueError};
use gojo_common::types::Span;
pub use native::Native;

/// A runtime value. Arrays are shared by reference: cloning a
/// `Value::Array` clones the handle.
#[derive(Clone, Debug, Finalize, Trace)]
pub enum Value {
    Array(Gc<GcCell<Vec<Value>>>),
    Bool(bool),
    Function(Function),
    Namespace(Namespace),
    Native(Native),
    Null,
    Number(f64),
    String(String),
    Undefined,
}

impl Value {
    pub fn array(elements: Vec<Value>) -> Self {
        Value::Array(Gc::new(GcCell::new(elements)))
    }

    pub fn truthy(&self) -> bool {
        match self {
            Value::Bool(bool) => *bool,
            Value::Null | Value::Undefined => false,
            Value::Number(number) => !(*number == 0.0 || number.is_nan()),
            Value::String(string) => !string.is_empty(),
            Value::Array(_) | Value::Function(_) | Value::Namespace(_) | Value::Native(_) => true,
        }
    }

    pub fn type_(&self) -> String {
        match self {
            Value::Array(_) => "array".to_string(),
            Value::Bool(_) => "boolean".to_string(),
            Value::Function(_) => "function".to_string(),
            Value::Namespace(_) => "object".to_string(),
            Value::Native(_) => "function".to_string(),
            Value::Null => "null".to_string(),
            Value::Number(_) => "number".to_string(),
            Value::String(_) => "string".to_string(),
            Value::Undefined => "undefined".to_string(),
        }
    }

    /// Reads a named member, e.g. `Math.sqrt`.
    pub fn get(&self, name: &str, span: &Span) -> Result<Value> {
        let member = match (self, name) {
            (Value::Namespace(Namespace::Math), "sqrt") => Some(Native::MathSqrt),
            (Value::Namespace(Namespace::Math), "pow") => Some(Native::MathPow),
            (Value::Namespace(Namespace::Console), "log") => Some(Native::ConsoleLog),
            _ => None,
        };
        member.map(Value::Native).ok_or_else(|| {
            (
                Error::AttributeError(AttributeError::NoSuchAttribute {
                    type_: self.type_(),
                    name: name.to_string(),
                }),
                span.clone(),
            )
        })
    }

    pub fn get_index(&self, index: &Value, span: &Span) -> Result<Value> {
        let array = self.as_array(span)?;
        let index = to_index(index, span)?;
        let value = array.borrow().get(index).cloned();
        Ok(value.unwrap_or(Value::Undefined))
    }

    /// Writes `value` at `index`, padding the array with `undefined` when the
    /// index is past the end. Arrays never grow beyond [`MAX_ARRAY_LEN`].
    pub fn set_index(&self, index: &Value, value: Value, span: &Span) -> Result<()> {
        let array = self.as_array(span)?;
        let index = to_index(index, span)?;
        let mut array = array.borrow_mut();
        if index >= array.len() {
            let too_large = || {
                let error = ValueError::ArrayTooLarge { len: index + 1, max_len: MAX_ARRAY_LEN };
                (Error::ValueError(error), span.clone())
            };
            if index >= MAX_ARRAY_LEN {
                return Err(too_large());
            }
            let len = array.len();
            array.try_reserve(index + 1 - len).map_err(|_| too_large())?;
            array.resize(index + 1, Value::Undefined);
        }
        array[index] = value;
        Ok(())
    }

    fn as_array(&self, span: &Span) -> Result<&Gc<GcCell<Vec<Value>>>> {
        match self {
            Value::Array(array) => Ok(array),
            _ => {
                let error = TypeError::NotIndexable { type_: self.type_() };
                Err((Error::TypeError(error), span.clone()))
            }
        }
    }

    /// `===`: same type and value; arrays are equal only to themselves.
    pub fn strict_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Array(a), Value::Array(b)) => Gc::ptr_eq(a, b),
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => a.ptr_eq(b),
            (Value::Namespace(a), Value::Namespace(b)) => a == b,
            (Value::Native(a), Value::Native(b)) => a == b,
            (Value::Null, Value::Null) | (Value::Undefined, Value::Undefined) => true,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            _ => false,
        }
    }

    /// `==`: like `===`, except that `null` and `undefined` are equal to each
    /// other, strings are compared to numbers numerically, and booleans are
    /// compared as 0 or 1.
    pub fn loose_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null | Value::Undefined, Value::Null | Value::Undefined) => true,
            (Value::Number(number), Value::String(string))
            | (Value::String(string), Value::Number(number)) => *number == to_number(string),
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Bool(bool), other) | (other, Value::Bool(bool)) => {
                Value::Number(if *bool { 1.0 } else { 0.0 }).loose_eq(other)
            }
            _ => self.strict_eq(other),
        }
    }

    /// The form `console.log` prints: strings as-is, everything else as in
    /// [`Value::repr`].
    pub fn inspect(&self) -> String {
        match self {
            Value::String(string) => string.clone(),
            _ => self.repr(),
        }
    }

    /// The form the REPL echoes: strings are quoted and arrays are bracketed,
    /// e.g. `[ 1, 'a', [ true ] ]`.
    pub fn repr(&self) -> String {
        let mut output = String::new();
        self.write_repr(&mut output, &mut Vec::new());
        output
    }

    fn write_repr(&self, output: &mut String, seen: &mut Vec<*const GcCell<Vec<Value>>>) {
        match self {
            Value::Array(array) => {
                let ptr = &**array as *const GcCell<Vec<Value>>;
                if seen.contains(&ptr) {
                    output.push_str("[Circular]");
                    return;
                }
                let elements = array.borrow();
                if elements.is_empty() {
                    output.push_str("[]");
                    return;
                }
                seen.push(ptr);
                output.push_str("[ ");
                for (idx, element) in elements.iter().enumerate() {
                    if idx != 0 {
                        output.push_str(", ");
                    }
                    element.write_repr(output, seen);
                }
                output.push_str(" ]");
                seen.pop();
            }
            Value::Function(function) => {
                output.push_str("[Function: ");
                output.push_str(function.name());
                output.push(']');
            }
            Value::Native(native) => {
                output.push_str("[Function: ");
                output.push_str(native.name());
                output.push(']');
            }
            Value::String(string) => {
                output.push('\'');
                output.push_str(&string.replace('\\', "\\\\").replace('\'', "\\'"));
                output.push('\'');
            }
            value => output.push_str(&value.to_string()),
        }
    }

    fn write_joined(
        &self,
        f: &mut Formatter<'_>,
        seen: &mut Vec<*const GcCell<Vec<Value>>>,
    ) -> fmt::Result {
        match self {
            Value::Array(array) => {
                let ptr = &**array as *const GcCell<Vec<Value>>;
                if seen.contains(&ptr) {
                    return Ok(());
                }
                seen.push(ptr);
                for (idx, element) in array.borrow().iter().enumerate() {
                    if idx != 0 {
                        write!(f, ",")?;
                    }
                    match element {
                        Value::Null | Value::Undefined => {}
                        element => element.write_joined(f, seen)?,
                    }
                }
                seen.pop();
                Ok(())
            }
            Value::Bool(bool) => write!(f, "{bool}"),
            Value::Function(function) => write!(f, "{function}"),
            Value::Namespace(namespace) => write!(f, "{namespace}"),
            Value::Native(native) => write!(f, "{native}"),
            Value::Null => write!(f, "null"),
            Value::Number(number) => write!(f, "{}", format_number(*number)),
            Value::String(string) => write!(f, "{string}"),
            Value::Undefined => write!(f, "undefined"),
        }
    }
}

/// The string form used by `+` concatenation. Arrays join their elements with
/// commas, rendering `null` and `undefined` elements as empty.
impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.write_joined(f, &mut Vec::new())
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.strict_eq(other)
    }
}

/// A built-in object whose members are native functions, e.g. `Math`.
/// Exported so that callers can match on [`Value::Namespace`].
#[derive(Clone, Debug, Eq, Finalize, Trace, PartialEq)]
pub enum Namespace {
    Console,
    Math,
}

impl Display for Namespace {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Namespace::Console => write!(f, "[object console]"),
            Namespace::Math => write!(f, "[object Math]"),
        }
    }
}

/// Formats a number the way JavaScript does: the shortest decimal that
/// round-trips, switching to exponent notation below `1e-6` and from `1e21`.
pub fn format_number(number: f64) -> String {
    if number.is_nan() {
        return "NaN".to_string();
    }
    if number.is_infinite() {
        return if number > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if number == 0.0 {
        return "0".to_string();
    }

    let scientific = format!("{number:e}");
    let (mantissa, exponent) = match scientific.split_once('e') {
        Some((mantissa, exponent)) => (mantissa, exponent.parse::<i32>().unwrap_or_default()),
        None => return number.to_string(),
    };
    if (-6..21).contains(&exponent) {
        number.to_string()
    } else {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{mantissa}e{sign}{}", exponent.abs())
    }
}

/// Converts a string to a number for loose comparison. Surrounding whitespace
/// is ignored, an empty string is 0, and anything that isn't a decimal
/// literal is NaN.
fn to_number(string: &str) -> f64 {
    let string = string.trim();
    let is_numeric = |c: char| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-');
    match string {
        "" => 0.0,
        "Infinity" | "+Infinity" => f64::INFINITY,
        "-Infinity" => f64::NEG_INFINITY,
        _ if string.chars().all(is_numeric) => string.parse().unwrap_or(f64::NAN),
        _ => f64::NAN,
    }
}

/// The largest index an array accepts.
const MAX_INDEX: f64 = 4_294_967_294.0;

/// The largest length an array may grow to through index assignment.
pub const MAX_ARRAY_LEN: usize = 1 << 24;

fn to_index(index: &Value, span: &Span) -> Result<usize> {
    match index {
        Value::Number(number) if (0.0..=MAX_INDEX).contains(number) && number.fract() == 0.0 => {
            Ok(*number as usize)
        }
        _ => Err((Error::TypeError(TypeError::InvalidIndex { index: index.repr() }), span.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    #[test]
    fn truthiness() {
        let falsy = [
            Value::Bool(false),
            Value::Number(0.0),
            Value::Number(-0.0),
            Value::Number(f64::NAN),
            Value::String(String::new()),
            Value::Null,
            Value::Undefined,
        ];
        for value in falsy {
            assert!(!value.truthy(), "{value:?} should be falsy");
        }
        let truthy = [
            Value::Bool(true),
            Value::Number(-1.5),
            Value::String("0".to_string()),
            Value::array(Vec::new()),
            Value::Namespace(Namespace::Math),
        ];
        for value in truthy {
            assert!(value.truthy(), "{value:?} should be truthy");
        }
    }

    #[test]
    fn number_formatting() {
        assert_eq!(format_number(4.0), "4");
        assert_eq!(format_number(0.5), "0.5");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(0.1 + 0.2), "0.30000000000000004");
        assert_eq!(format_number(1e21), "1e+21");
        assert_eq!(format_number(1.5e-7), "1.5e-7");
        assert_eq!(format_number(123456789.0), "123456789");
        assert_eq!(format_number(f64::NAN), "NaN");
        assert_eq!(format_number(f64::NEG_INFINITY), "-Infinity");
    }

    #[test]
    fn string_forms() {
        let nested = Value::array(vec![
            Value::Number(1.0),
            Value::String("a".to_string()),
            Value::array(vec![Value::Bool(true), Value::Null]),
        ]);
        assert_eq!(nested.to_string(), "1,a,true,");
        assert_eq!(nested.inspect(), "[ 1, 'a', [ true, null ] ]");
        assert_eq!(Value::array(Vec::new()).inspect(), "[]");
        assert_eq!(Value::String("it's".to_string()).inspect(), "it's");
        assert_eq!(Value::String("it's".to_string()).repr(), r"'it\'s'");
        assert_eq!(Value::Native(Native::MathSqrt).repr(), "[Function: Math.sqrt]");
    }

    #[test]
    fn self_referential_array() {
        let array = Value::array(vec![Value::Number(1.0)]);
        array.set_index(&Value::Number(1.0), array.clone(), &(0..1)).unwrap();
        assert_eq!(array.inspect(), "[ 1, [Circular] ]");
        assert_eq!(array.to_string(), "1,");
    }

    #[test]
    fn strict_equality() {
        let array = Value::array(vec![Value::Number(1.0)]);
        assert!(array.strict_eq(&array.clone()));
        assert!(!array.strict_eq(&Value::array(vec![Value::Number(1.0)])));
        assert!(!Value::Number(f64::NAN).strict_eq(&Value::Number(f64::NAN)));
        assert!(!Value::Number(1.0).strict_eq(&Value::String("1".to_string())));
        assert!(!Value::Null.strict_eq(&Value::Undefined));
    }

    #[test]
    fn loose_equality() {
        assert!(Value::Null.loose_eq(&Value::Undefined));
        assert!(Value::Number(1.0).loose_eq(&Value::String("1".to_string())));
        assert!(Value::String(" 2.5 ".to_string()).loose_eq(&Value::Number(2.5)));
        assert!(Value::Number(0.0).loose_eq(&Value::String(String::new())));
        assert!(Value::Bool(true).loose_eq(&Value::Number(1.0)));
        assert!(Value::String("1".to_string()).loose_eq(&Value::Bool(true)));
        assert!(!Value::Null.loose_eq(&Value::Bool(false)));
        assert!(!Value::Null.loose_eq(&Value::Number(0.0)));
        assert!(!Value::String("abc".to_string()).loose_eq(&Value::Number(f64::NAN)));
    }

    #[test]
    fn indexing() {
        let array = Value::array(vec![Value::Number(1.0), Value::Number(2.0)]);
        assert_eq!(array.get_index(&Value::Number(1.0), &(0..1)), Ok(Value::Number(2.0)));
        assert_eq!(array.get_index(&Value::Number(5.0), &(0..1)), Ok(Value::Undefined));

        array.set_index(&Value::Number(3.0), Value::Bool(true), &(0..1)).unwrap();
        assert_eq!(array.inspect(), "[ 1, 2, undefined, true ]");

        assert_eq!(
            array.get_index(&Value::Number(-1.0), &(2..4)),
            Err((Error::TypeError(TypeError::InvalidIndex { index: "-1".to_string() }), 2..4))
        );
        assert_eq!(
            Value::Number(1.0).get_index(&Value::Number(0.0), &(0..4)),
            Err((Error::TypeError(TypeError::NotIndexable { type_: "number".to_string() }), 0..4))
        );
    }

    #[test]
    fn large_indices_are_bounded() {
        let array = Value::array(vec![Value::Number(1.0)]);
        fn invalid<T>(index: &str) -> Result<T> {
            Err((Error::TypeError(TypeError::InvalidIndex { index: index.to_string() }), 0..1))
        }
        let set = |index: f64| array.set_index(&Value::Number(index), Value::Null, &(0..1));
        assert_eq!(set(1e300), invalid("1e+300"));
        assert_eq!(set(1e12), invalid("1000000000000"));
        assert_eq!(array.get_index(&Value::Number(f64::NAN), &(0..1)), invalid("NaN"));
        assert_eq!(array.get_index(&Value::Number(4_294_967_294.0), &(0..1)), Ok(Value::Undefined));

        let len = MAX_ARRAY_LEN + 1;
        assert_eq!(
            set(MAX_ARRAY_LEN as f64),
            Err((
                Error::ValueError(ValueError::ArrayTooLarge { len, max_len: MAX_ARRAY_LEN }),
                0..1
            ))
        );
        assert_eq!(array.inspect(), "[ 1 ]");
    }

    #[test]
    fn member_lookup() {
        let math = Value::Namespace(Namespace::Math);
        assert_eq!(math.get("pow", &(0..1)), Ok(Value::Native(Native::MathPow)));
        assert_eq!(
            math.get("floor", &(0..1)),
            Err((
                Error::AttributeError(AttributeError::NoSuchAttribute {
                    type_: "object".to_string(),
                    name: "floor".to_string(),
                }),
                0..1,
            ))
        );
    }
}
