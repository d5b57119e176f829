pub mod ast;
pub mod lexer;
pub mod parser;

use gojo_common::error::{Error, ErrorS, SyntaxError};

use crate::ast::Program;
use crate::lexer::{Lexer, Token};
use crate::parser::Parser;

pub fn parse(source: &str) -> Result<Program, ErrorS> {
    Parser::new(source).parse_program()
}

/// Lexes the entire source, stopping at the first error.
pub fn tokenize(source: &str) -> Result<Vec<(usize, Token, usize)>, ErrorS> {
    Lexer::new(source).collect()
}

/// Returns false if the source ends in the middle of a statement or a block
/// comment, i.e. more input could turn it into a valid program.
pub fn is_complete(source: &str) -> bool {
    !matches!(
        parse(source),
        Err((
            Error::SyntaxError(
                SyntaxError::UnrecognizedEof { .. } | SyntaxError::UnterminatedComment
            ),
            _
        ))
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn incomplete_input() {
        assert!(is_complete("var x = 1;"));
        assert!(is_complete(""));
        assert!(!is_complete("while (x < 5) {"));
        assert!(!is_complete("var x ="));
        assert!(!is_complete("console.log(1,"));
        assert!(!is_complete("/* still open"));
        assert!(!is_complete("function f() {"));
        // Errors other than running out of input are complete.
        assert!(is_complete("var = 1;"));
        assert!(is_complete("\"unterminated"));
    }

    #[test]
    fn tokenize_stops_at_error() {
        assert_eq!(tokenize("1 + 2").map(|tokens| tokens.len()), Ok(3));
        assert!(tokenize("1 @ 2").is_err());
    }
}
