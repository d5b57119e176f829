mod env;
mod interpreter;
mod value;

pub use crate::env::Env;
pub use crate::interpreter::{Flow, Interpreter};
pub use crate::value::{format_number, Callable, Function, Namespace, Native, Value};

use gojo_common::error::ErrorS;

/// Parses and runs `source`, returning every line written by `console.log`
/// along with the outcome. Lines written before an error are kept.
pub fn run_source(source: &str) -> (Vec<String>, Result<(), ErrorS>) {
    let program = match gojo_syntax::parse(source) {
        Ok(program) => program,
        Err(e) => return (Vec::new(), Err(e)),
    };
    let mut stdout = Vec::new();
    let result = Interpreter::new(&mut stdout).run(&program);
    let lines = String::from_utf8_lossy(&stdout).lines().map(str::to_string).collect();
    (lines, result)
}

#[cfg(test)]
mod tests {
    use super::*;

    use gojo_common::error::{Error, SyntaxError};
    use pretty_assertions::assert_eq;

    const FIXTURE: &str = r#"
var x = 10;
var y = 5;
console.log("x + y =", x + y);

if (x > y && y > 0) {
    console.log("x is larger")
} else if (x < y) {
    console.log("y is larger")
} else {
    console.log("equal")
}

var i = 0;
while (i < 3) {
    console.log("i =", i);
    i = i + 1
}

var arr = [1, "two", true];
console.log(arr[1], arr);

switch (arr[0]) {
    case 1:
        console.log("one");
    case 2:
        console.log("fell through");
        break;
    default:
        console.log("default")
}

console.log(Math.sqrt(16), Math.pow(3, 2));
"#;

    #[test]
    fn run_fixture() {
        let (lines, result) = run_source(FIXTURE);
        assert_eq!(result, Ok(()));
        assert_eq!(
            lines,
            vec![
                "x + y = 15",
                "x is larger",
                "i = 0",
                "i = 1",
                "i = 2",
                "two [ 1, 'two', true ]",
                "one",
                "fell through",
                "4 9",
            ]
        );
    }

    #[test]
    fn output_is_deterministic() {
        assert_eq!(run_source(FIXTURE), run_source(FIXTURE));
    }

    #[test]
    fn syntax_error_produces_no_output() {
        let (lines, result) = run_source("console.log(1);\nvar = 2;");
        assert!(lines.is_empty());
        let Err((Error::SyntaxError(e), _)) = result else { panic!("expected a syntax error") };
        assert!(matches!(e, SyntaxError::UnrecognizedToken { .. }));
    }

    #[test]
    fn globals_expose_namespaces() {
        let mut interpreter = Interpreter::new(Vec::new());
        let program = gojo_syntax::parse("Math").unwrap();
        let value = interpreter.eval(&program).unwrap();
        assert_eq!(value, Some(Value::Namespace(Namespace::Math)));
        let Some(Value::Namespace(namespace)) = &value else { panic!("expected a namespace") };
        assert_eq!(namespace.to_string(), "[object Math]");
    }

    #[test]
    fn runtime_error_keeps_prior_output() {
        let (lines, result) = run_source("console.log(1);\nundefinedName = 2;\nconsole.log(2);");
        assert_eq!(lines, vec!["1"]);
        assert!(result.is_err());
    }
}
