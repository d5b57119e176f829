use gojo_common::error::{Error, ErrorS, SyntaxError};
use logos::{FilterResult, Logos};

use std::fmt::{self, Display, Formatter};
use std::num::ParseFloatError;
use std::str::Chars;

pub struct Lexer<'a> {
    inner: logos::Lexer<'a, Token>,
    pending: Option<(usize, Token, usize)>,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self { inner: Token::lexer(source), pending: None }
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Result<(usize, Token, usize), ErrorS>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(token) = self.pending.take() {
            return Some(Ok(token));
        }

        match self.inner.next()? {
            Token::Error => {
                let mut span = self.inner.span();
                let slice = self.inner.slice();

                if slice.starts_with("/*") {
                    let error = Error::SyntaxError(SyntaxError::UnterminatedComment);
                    return Some(Err((error, span)));
                }

                // Strings that failed to lex are either unterminated or carry a bad escape.
                if let Some(quote @ ('"' | '\'')) = slice.chars().next() {
                    let error = if slice.len() >= 2 && slice.ends_with(quote) {
                        match unescape(&slice[1..slice.len() - 1]) {
                            Err(sequence) => SyntaxError::InvalidEscape { sequence },
                            Ok(_) => SyntaxError::UnexpectedInput { token: slice.to_string() },
                        }
                    } else {
                        SyntaxError::UnterminatedString
                    };
                    return Some(Err((Error::SyntaxError(error), span)));
                }

                // Recover error.
                while let Some(token) = self.inner.next() {
                    let span_new = self.inner.span();
                    if span.end == span_new.start {
                        span.end = span_new.end;
                    } else {
                        self.pending = Some((span_new.start, token, span_new.end));
                        break;
                    }
                }

                Some(Err((
                    Error::SyntaxError(SyntaxError::UnexpectedInput {
                        token: self.inner.source()[span.start..span.end].to_string(),
                    }),
                    span,
                )))
            }
            token => {
                let span = self.inner.span();
                Some(Ok((span.start, token, span.end)))
            }
        }
    }
}

#[derive(Clone, Debug, Logos, PartialEq)]
pub enum Token {
    // Single-character tokens.
    #[token("(")]
    LtParen,
    #[token(")")]
    RtParen,
    #[token("{")]
    LtBrace,
    #[token("}")]
    RtBrace,
    #[token("[")]
    LtBracket,
    #[token("]")]
    RtBracket,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,
    #[token(":")]
    Colon,
    #[token(";")]
    Semicolon,
    #[token("-")]
    Minus,
    #[token("+")]
    Plus,
    #[token("/")]
    Slash,
    #[token("*")]
    Asterisk,
    #[token("%")]
    Percent,

    // One, two or three character tokens.
    #[token("!")]
    Bang,
    #[token("!=")]
    BangEqual,
    #[token("!==")]
    BangEqualEqual,
    #[token("=")]
    Equal,
    #[token("==")]
    EqualEqual,
    #[token("===")]
    EqualEqualEqual,
    #[token(">")]
    Greater,
    #[token(">=")]
    GreaterEqual,
    #[token("<")]
    Less,
    #[token("<=")]
    LessEqual,
    #[token("&&")]
    AmpAmp,
    #[token("||")]
    PipePipe,

    // Literals.
    #[regex("[a-zA-Z_$][a-zA-Z0-9_$]*", lex_identifier)]
    Identifier(String),
    #[regex(r#""([^"\\]|\\.)*""#, lex_string)]
    #[regex(r#"'([^'\\]|\\.)*'"#, lex_string)]
    String(String),
    #[regex(r"[0-9]+(\.[0-9]+)?([eE][+-]?[0-9]+)?", lex_number)]
    Number(f64),

    // Keywords.
    #[token("break")]
    Break,
    #[token("case")]
    Case,
    #[token("const")]
    Const,
    #[token("continue")]
    Continue,
    #[token("default")]
    Default,
    #[token("else")]
    Else,
    #[token("false")]
    False,
    #[token("function")]
    Function,
    #[token("if")]
    If,
    #[token("let")]
    Let,
    #[token("null")]
    Null,
    #[token("return")]
    Return,
    #[token("switch")]
    Switch,
    #[token("true")]
    True,
    #[token("undefined")]
    Undefined,
    #[token("var")]
    Var,
    #[token("while")]
    While,

    #[regex(r"//[^\n]*", logos::skip)]
    #[token("/*", lex_block_comment)]
    #[regex(r"[ \r\n\t\f]+", logos::skip)]
    #[error]
    Error,
}

impl Display for Token {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let text = match self {
            Token::LtParen => "(",
            Token::RtParen => ")",
            Token::LtBrace => "{",
            Token::RtBrace => "}",
            Token::LtBracket => "[",
            Token::RtBracket => "]",
            Token::Comma => ",",
            Token::Dot => ".",
            Token::Colon => ":",
            Token::Semicolon => ";",
            Token::Minus => "-",
            Token::Plus => "+",
            Token::Slash => "/",
            Token::Asterisk => "*",
            Token::Percent => "%",
            Token::Bang => "!",
            Token::BangEqual => "!=",
            Token::BangEqualEqual => "!==",
            Token::Equal => "=",
            Token::EqualEqual => "==",
            Token::EqualEqualEqual => "===",
            Token::Greater => ">",
            Token::GreaterEqual => ">=",
            Token::Less => "<",
            Token::LessEqual => "<=",
            Token::AmpAmp => "&&",
            Token::PipePipe => "||",
            Token::Identifier(_) => "identifier",
            Token::String(_) => "string",
            Token::Number(_) => "number",
            Token::Break => "break",
            Token::Case => "case",
            Token::Const => "const",
            Token::Continue => "continue",
            Token::Default => "default",
            Token::Else => "else",
            Token::False => "false",
            Token::Function => "function",
            Token::If => "if",
            Token::Let => "let",
            Token::Null => "null",
            Token::Return => "return",
            Token::Switch => "switch",
            Token::True => "true",
            Token::Undefined => "undefined",
            Token::Var => "var",
            Token::While => "while",
            Token::Error => "error",
        };
        f.write_str(text)
    }
}

fn lex_number(lexer: &mut logos::Lexer<Token>) -> Result<f64, ParseFloatError> {
    let slice = lexer.slice();
    slice.parse::<f64>()
}

fn lex_string(lexer: &mut logos::Lexer<Token>) -> Option<String> {
    let slice = lexer.slice();
    unescape(&slice[1..slice.len() - 1]).ok()
}

/// Skips a block comment, or consumes the rest of the input as an error if
/// the comment is never closed.
fn lex_block_comment(lexer: &mut logos::Lexer<Token>) -> FilterResult<()> {
    match lexer.remainder().find("*/") {
        Some(end) => {
            lexer.bump(end + 2);
            FilterResult::Skip
        }
        None => {
            lexer.bump(lexer.remainder().len());
            FilterResult::Error
        }
    }
}

fn lex_identifier(lexer: &mut logos::Lexer<Token>) -> String {
    let slice = lexer.slice();
    slice.to_string()
}

/// Resolves escape sequences in the body of a string literal. On failure,
/// returns the offending sequence.
fn unescape(body: &str) -> Result<String, String> {
    let mut output = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            output.push(c);
            continue;
        }
        let escaped = match chars.next() {
            Some('n') => '\n',
            Some('t') => '\t',
            Some('r') => '\r',
            Some('b') => '\u{8}',
            Some('f') => '\u{c}',
            Some('v') => '\u{b}',
            Some('0') => '\0',
            Some('x') => unescape_hex(&mut chars, 'x', 2)?,
            Some('u') => unescape_hex(&mut chars, 'u', 4)?,
            // Any other escaped character stands for itself.
            Some(c) => c,
            None => return Err("\\".to_string()),
        };
        output.push(escaped);
    }
    Ok(output)
}

fn unescape_hex(chars: &mut Chars, prefix: char, len: usize) -> Result<char, String> {
    let digits = chars.by_ref().take(len).collect::<String>();
    let invalid = || format!("\\{prefix}{digits}");
    if digits.len() != len || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid());
    }
    u32::from_str_radix(&digits, 16).ok().and_then(char::from_u32).ok_or_else(invalid)
}
