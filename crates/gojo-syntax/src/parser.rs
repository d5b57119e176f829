use std::rc::Rc;

use gojo_common::error::{Error, ErrorS, Result, SyntaxError};

use crate::ast::{
    Expr, ExprArray, ExprAssign, ExprCall, ExprGet, ExprIndex, ExprIndexSet, ExprInfix,
    ExprLiteral, ExprPrefix, ExprS, ExprVariable, OpInfix, OpPrefix, Program, Span, Stmt,
    StmtBlock, StmtExpr, StmtFunction, StmtIf, StmtReturn, StmtS, StmtSwitch, StmtVar, StmtWhile,
    SwitchCase, VarKind,
};
use crate::lexer::{Lexer, Token};

/// How deeply statements and expressions may nest before parsing gives up.
pub const MAX_DEPTH: usize = 128;

/// A recursive-descent parser over a lazily lexed token stream, with one
/// token of lookahead.
///
/// Expression precedence, lowest first:
///
/// ```text
/// assignment := (identifier | postfix "[" expr "]") "=" assignment | logic_or
/// logic_or   := logic_and ("||" logic_and)*
/// logic_and  := equality ("&&" equality)*
/// equality   := relational (("==" | "!=" | "===" | "!==") relational)*
/// relational := additive (("<" | "<=" | ">" | ">=") additive)*
/// additive   := multiplicative (("+" | "-") multiplicative)*
/// multiplicative := prefix (("*" | "/" | "%") prefix)*
/// prefix     := ("!" | "-") prefix | postfix
/// postfix    := primary ("(" args ")" | "[" expr "]" | "." identifier)*
/// ```
pub struct Parser<'a> {
    source: &'a str,
    lexer: Lexer<'a>,
    peeked: Option<(usize, Token, usize)>,
    /// Number of enclosing loops, for `continue`.
    loops: usize,
    /// Number of enclosing loops and switches, for `break`.
    breakables: usize,
    /// Number of enclosing function bodies, for `return`.
    functions: usize,
    /// Current nesting of statements and expressions.
    depth: usize,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            lexer: Lexer::new(source),
            peeked: None,
            loops: 0,
            breakables: 0,
            functions: 0,
            depth: 0,
        }
    }

    pub fn parse_program(mut self) -> Result<Program> {
        let mut stmts = Vec::new();
        while self.peek()?.is_some() {
            stmts.push(self.parse_stmt()?);
        }
        Ok(Program { stmts })
    }

    fn parse_stmt(&mut self) -> Result<StmtS> {
        self.nested(|parser| match parser.peek()? {
            Some((_, Token::Var | Token::Let | Token::Const, _)) => parser.parse_var(),
            Some((_, Token::Function, _)) => parser.parse_function(),
            Some((_, Token::If, _)) => parser.parse_if(),
            Some((_, Token::While, _)) => parser.parse_while(),
            Some((_, Token::Switch, _)) => parser.parse_switch(),
            Some((_, Token::LtBrace, _)) => parser.parse_block(),
            Some((_, Token::Break, _)) => parser.parse_break(),
            Some((_, Token::Continue, _)) => parser.parse_continue(),
            Some((_, Token::Return, _)) => parser.parse_return(),
            _ => parser.parse_expr_stmt(),
        })
    }

    fn parse_var(&mut self) -> Result<StmtS> {
        let (start, token, _) = self.bump()?;
        let kind = match token {
            Token::Var => VarKind::Var,
            Token::Let => VarKind::Let,
            _ => VarKind::Const,
        };
        let (name, name_span) = self.expect_identifier()?;
        let value = match self.eat(&Token::Equal)? {
            Some(_) => Some(self.parse_expr()?),
            None if kind == VarKind::Const => {
                return Err((
                    Error::SyntaxError(SyntaxError::MissingInitializer { name }),
                    name_span,
                ));
            }
            None => None,
        };
        let end = value.as_ref().map_or(name_span.end, |(_, span)| span.end);
        let end = self.terminate(end)?;
        Ok((Stmt::Var(StmtVar { kind, name, value }), start..end))
    }

    fn parse_function(&mut self) -> Result<StmtS> {
        let (start, ..) = self.bump()?;
        let (name, _) = self.expect_identifier()?;
        self.expect(Token::LtParen)?;
        let params = self.parse_params()?;

        // Loops outside the function can't be left from inside it.
        let (loops, breakables) = (self.loops, self.breakables);
        self.loops = 0;
        self.breakables = 0;
        self.functions += 1;
        let body = self.parse_block_body();
        self.loops = loops;
        self.breakables = breakables;
        self.functions -= 1;

        let (body, body_span) = body?;
        let function = StmtFunction { name, params, body };
        Ok((Stmt::Function(Rc::new(function)), start..body_span.end))
    }

    /// Parses parameter names up to and including the closing `)`.
    fn parse_params(&mut self) -> Result<Vec<String>> {
        let mut params = Vec::new();
        loop {
            if self.eat(&Token::RtParen)?.is_some() {
                return Ok(params);
            }
            let (param, _) = self.expect_identifier()?;
            params.push(param);
            if self.eat(&Token::Comma)?.is_some() {
                continue;
            }
            return match self.eat(&Token::RtParen)? {
                Some(_) => Ok(params),
                None => {
                    Err(self.unexpected(vec![expected(&Token::Comma), expected(&Token::RtParen)]))
                }
            };
        }
    }

    fn parse_if(&mut self) -> Result<StmtS> {
        let (start, ..) = self.bump()?;
        let cond = self.parse_paren_expr()?;
        let then = self.parse_stmt()?;
        let else_ = match self.eat(&Token::Else)? {
            Some(_) => Some(self.parse_stmt()?),
            None => None,
        };
        let end = else_.as_ref().unwrap_or(&then).1.end;
        Ok((Stmt::If(Box::new(StmtIf { cond, then, else_ })), start..end))
    }

    fn parse_while(&mut self) -> Result<StmtS> {
        let (start, ..) = self.bump()?;
        let cond = self.parse_paren_expr()?;
        self.loops += 1;
        self.breakables += 1;
        let body = self.parse_stmt();
        self.loops -= 1;
        self.breakables -= 1;
        let body = body?;
        let end = body.1.end;
        Ok((Stmt::While(Box::new(StmtWhile { cond, body })), start..end))
    }

    fn parse_switch(&mut self) -> Result<StmtS> {
        let (start, ..) = self.bump()?;
        let discriminant = self.parse_paren_expr()?;
        self.expect(Token::LtBrace)?;
        self.breakables += 1;
        let cases = self.parse_switch_cases();
        self.breakables -= 1;
        let (cases, end) = cases?;
        Ok((Stmt::Switch(Box::new(StmtSwitch { discriminant, cases })), start..end))
    }

    fn parse_switch_cases(&mut self) -> Result<(Vec<SwitchCase>, usize)> {
        let mut cases = Vec::new();
        let mut has_default = false;
        loop {
            let test = match self.peek()? {
                Some((_, Token::Case, _)) => {
                    self.bump()?;
                    Some(self.parse_expr()?)
                }
                Some((_, Token::Default, _)) => {
                    let (start, _, end) = self.bump()?;
                    if has_default {
                        return Err((Error::SyntaxError(SyntaxError::DuplicateDefault), start..end));
                    }
                    has_default = true;
                    None
                }
                Some((_, Token::RtBrace, _)) => {
                    let (_, _, end) = self.bump()?;
                    return Ok((cases, end));
                }
                _ => {
                    return Err(self.unexpected(vec![
                        expected(&Token::Case),
                        expected(&Token::Default),
                        expected(&Token::RtBrace),
                    ]));
                }
            };
            self.expect(Token::Colon)?;

            let mut body = Vec::new();
            while !matches!(
                self.peek()?,
                None | Some((_, Token::Case | Token::Default | Token::RtBrace, _))
            ) {
                body.push(self.parse_stmt()?);
            }
            cases.push(SwitchCase { test, body });
        }
    }

    fn parse_block(&mut self) -> Result<StmtS> {
        let (block, span) = self.parse_block_body()?;
        Ok((Stmt::Block(block), span))
    }

    fn parse_block_body(&mut self) -> Result<(StmtBlock, Span)> {
        let start = self.expect(Token::LtBrace)?.start;
        let mut stmts = Vec::new();
        loop {
            if let Some(span) = self.eat(&Token::RtBrace)? {
                return Ok((StmtBlock { stmts }, start..span.end));
            }
            if self.peek()?.is_none() {
                return Err(self.unexpected(vec![expected(&Token::RtBrace)]));
            }
            stmts.push(self.parse_stmt()?);
        }
    }

    fn parse_break(&mut self) -> Result<StmtS> {
        let (start, _, end) = self.bump()?;
        if self.breakables == 0 {
            return Err((Error::SyntaxError(SyntaxError::BreakOutsideLoop), start..end));
        }
        let end = self.terminate(end)?;
        Ok((Stmt::Break, start..end))
    }

    fn parse_continue(&mut self) -> Result<StmtS> {
        let (start, _, end) = self.bump()?;
        if self.loops == 0 {
            return Err((Error::SyntaxError(SyntaxError::ContinueOutsideLoop), start..end));
        }
        let end = self.terminate(end)?;
        Ok((Stmt::Continue, start..end))
    }

    fn parse_return(&mut self) -> Result<StmtS> {
        let (start, _, end) = self.bump()?;
        if self.functions == 0 {
            return Err((Error::SyntaxError(SyntaxError::ReturnOutsideFunction), start..end));
        }
        // A value must start on the same line as the `return`.
        let next = self.peek()?.map(|(next_start, token, _)| {
            (*next_start, matches!(token, Token::Semicolon | Token::RtBrace))
        });
        let value = match next {
            None | Some((_, true)) => None,
            Some((next_start, _)) if self.source[end..next_start].contains('\n') => None,
            Some(_) => Some(self.parse_expr()?),
        };
        let end = value.as_ref().map_or(end, |(_, span)| span.end);
        let end = self.terminate(end)?;
        Ok((Stmt::Return(StmtReturn { value }), start..end))
    }

    fn parse_expr_stmt(&mut self) -> Result<StmtS> {
        let value = self.parse_expr()?;
        let start = value.1.start;
        let end = self.terminate(value.1.end)?;
        Ok((Stmt::Expr(StmtExpr { value }), start..end))
    }

    fn parse_paren_expr(&mut self) -> Result<ExprS> {
        self.expect(Token::LtParen)?;
        let expr = self.parse_expr()?;
        self.expect(Token::RtParen)?;
        Ok(expr)
    }

    pub fn parse_expr(&mut self) -> Result<ExprS> {
        self.nested(Self::parse_assign)
    }

    fn parse_assign(&mut self) -> Result<ExprS> {
        let target = self.parse_logic_or()?;
        if self.eat(&Token::Equal)?.is_none() {
            return Ok(target);
        }
        let value = self.parse_expr()?;
        let span = target.1.start..value.1.end;
        match target {
            (Expr::Variable(var), _) => {
                Ok((Expr::Assign(Box::new(ExprAssign { name: var.name, value })), span))
            }
            (Expr::Index(index), _) => {
                let ExprIndex { array, index } = *index;
                Ok((Expr::IndexSet(Box::new(ExprIndexSet { array, index, value })), span))
            }
            (_, target_span) => {
                Err((Error::SyntaxError(SyntaxError::InvalidAssignmentTarget), target_span))
            }
        }
    }

    fn parse_logic_or(&mut self) -> Result<ExprS> {
        self.parse_infix(Self::parse_logic_and, |token| match token {
            Token::PipePipe => Some(OpInfix::LogicOr),
            _ => None,
        })
    }

    fn parse_logic_and(&mut self) -> Result<ExprS> {
        self.parse_infix(Self::parse_equality, |token| match token {
            Token::AmpAmp => Some(OpInfix::LogicAnd),
            _ => None,
        })
    }

    fn parse_equality(&mut self) -> Result<ExprS> {
        self.parse_infix(Self::parse_relational, |token| match token {
            Token::EqualEqual => Some(OpInfix::Equal),
            Token::BangEqual => Some(OpInfix::NotEqual),
            Token::EqualEqualEqual => Some(OpInfix::StrictEqual),
            Token::BangEqualEqual => Some(OpInfix::StrictNotEqual),
            _ => None,
        })
    }

    fn parse_relational(&mut self) -> Result<ExprS> {
        self.parse_infix(Self::parse_additive, |token| match token {
            Token::Less => Some(OpInfix::Less),
            Token::LessEqual => Some(OpInfix::LessEqual),
            Token::Greater => Some(OpInfix::Greater),
            Token::GreaterEqual => Some(OpInfix::GreaterEqual),
            _ => None,
        })
    }

    fn parse_additive(&mut self) -> Result<ExprS> {
        self.parse_infix(Self::parse_multiplicative, |token| match token {
            Token::Plus => Some(OpInfix::Add),
            Token::Minus => Some(OpInfix::Subtract),
            _ => None,
        })
    }

    fn parse_multiplicative(&mut self) -> Result<ExprS> {
        self.parse_infix(Self::parse_prefix, |token| match token {
            Token::Asterisk => Some(OpInfix::Multiply),
            Token::Slash => Some(OpInfix::Divide),
            Token::Percent => Some(OpInfix::Modulo),
            _ => None,
        })
    }

    /// Parses a left-associative chain of operators sharing one precedence level.
    fn parse_infix(
        &mut self,
        operand: fn(&mut Self) -> Result<ExprS>,
        operator: fn(&Token) -> Option<OpInfix>,
    ) -> Result<ExprS> {
        let mut lt = operand(self)?;
        while let Some(op) = self.peek()?.and_then(|(_, token, _)| operator(token)) {
            self.bump()?;
            let rt = operand(self)?;
            let span = lt.1.start..rt.1.end;
            lt = (Expr::Infix(Box::new(ExprInfix { lt, op, rt })), span);
        }
        Ok(lt)
    }

    fn parse_prefix(&mut self) -> Result<ExprS> {
        let op = match self.peek()? {
            Some((_, Token::Bang, _)) => OpPrefix::Not,
            Some((_, Token::Minus, _)) => OpPrefix::Negate,
            _ => return self.parse_postfix(),
        };
        let (start, ..) = self.bump()?;
        let rt = self.nested(Self::parse_prefix)?;
        let span = start..rt.1.end;
        Ok((Expr::Prefix(Box::new(ExprPrefix { op, rt })), span))
    }

    fn parse_postfix(&mut self) -> Result<ExprS> {
        let mut expr = self.parse_primary()?;
        loop {
            let start = expr.1.start;
            expr = match self.peek()? {
                Some((_, Token::LtParen, _)) => {
                    self.bump()?;
                    let (args, end) = self.parse_list(Token::RtParen)?;
                    (Expr::Call(Box::new(ExprCall { callee: expr, args })), start..end)
                }
                Some((_, Token::LtBracket, _)) => {
                    self.bump()?;
                    let index = self.parse_expr()?;
                    let end = self.expect(Token::RtBracket)?.end;
                    (Expr::Index(Box::new(ExprIndex { array: expr, index })), start..end)
                }
                Some((_, Token::Dot, _)) => {
                    self.bump()?;
                    let (name, name_span) = self.expect_identifier()?;
                    (Expr::Get(Box::new(ExprGet { object: expr, name })), start..name_span.end)
                }
                _ => return Ok(expr),
            };
        }
    }

    fn parse_primary(&mut self) -> Result<ExprS> {
        let (start, token, end) = match self.next()? {
            Some(token) => token,
            None => return Err(self.eof(vec!["expression".to_string()])),
        };
        let expr = match token {
            Token::Number(number) => Expr::Literal(ExprLiteral::Number(number)),
            Token::String(string) => Expr::Literal(ExprLiteral::String(string)),
            Token::True => Expr::Literal(ExprLiteral::Bool(true)),
            Token::False => Expr::Literal(ExprLiteral::Bool(false)),
            Token::Null => Expr::Literal(ExprLiteral::Null),
            Token::Undefined => Expr::Literal(ExprLiteral::Undefined),
            Token::Identifier(name) => Expr::Variable(ExprVariable { name }),
            Token::LtParen => {
                let (expr, _) = self.parse_expr()?;
                let end = self.expect(Token::RtParen)?.end;
                return Ok((expr, start..end));
            }
            Token::LtBracket => {
                let (elements, end) = self.parse_list(Token::RtBracket)?;
                return Ok((Expr::Array(ExprArray { elements }), start..end));
            }
            _ => return Err(self.unrecognized(start..end, vec!["expression".to_string()])),
        };
        Ok((expr, start..end))
    }

    /// Parses comma-separated expressions up to and including `close`. A
    /// trailing comma is allowed.
    fn parse_list(&mut self, close: Token) -> Result<(Vec<ExprS>, usize)> {
        let mut items = Vec::new();
        loop {
            if let Some(span) = self.eat(&close)? {
                return Ok((items, span.end));
            }
            items.push(self.parse_expr()?);
            if self.eat(&Token::Comma)?.is_some() {
                continue;
            }
            return match self.eat(&close)? {
                Some(span) => Ok((items, span.end)),
                None => Err(self.unexpected(vec![expected(&Token::Comma), expected(&close)])),
            };
        }
    }

    /// Ends a simple statement. The semicolon may be left out before a `}`,
    /// at the end of input, or when the next token starts on a new line.
    fn terminate(&mut self, end: usize) -> Result<usize> {
        let next_start = match self.peek()? {
            Some((_, Token::Semicolon, _)) => return Ok(self.bump()?.2),
            Some((_, Token::RtBrace, _)) | None => return Ok(end),
            Some((start, ..)) => *start,
        };
        if self.source[end..next_start].contains('\n') {
            Ok(end)
        } else {
            Err(self.unexpected(vec![expected(&Token::Semicolon)]))
        }
    }

    fn expect_identifier(&mut self) -> Result<(String, Span)> {
        match self.next()? {
            Some((start, Token::Identifier(name), end)) => Ok((name, start..end)),
            Some((start, _, end)) => Err(self.unrecognized(start..end, vec![identifier()])),
            None => Err(self.eof(vec![identifier()])),
        }
    }

    /// Runs `parse` one level deeper, failing once [`MAX_DEPTH`] is reached.
    fn nested<T>(&mut self, parse: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        if self.depth >= MAX_DEPTH {
            let span = match self.peek()? {
                Some((start, _, end)) => *start..*end,
                None => self.source.len()..self.source.len(),
            };
            let error = SyntaxError::NestingTooDeep { max_depth: MAX_DEPTH };
            return Err((Error::SyntaxError(error), span));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn expect(&mut self, token: Token) -> Result<Span> {
        match self.eat(&token)? {
            Some(span) => Ok(span),
            None => Err(self.unexpected(vec![expected(&token)])),
        }
    }

    fn eat(&mut self, token: &Token) -> Result<Option<Span>> {
        match self.peek()? {
            Some((_, next, _)) if next == token => {
                let (start, _, end) = self.bump()?;
                Ok(Some(start..end))
            }
            _ => Ok(None),
        }
    }

    fn peek(&mut self) -> Result<Option<&(usize, Token, usize)>> {
        if self.peeked.is_none() {
            self.peeked = self.lexer.next().transpose()?;
        }
        Ok(self.peeked.as_ref())
    }

    fn next(&mut self) -> Result<Option<(usize, Token, usize)>> {
        self.peek()?;
        Ok(self.peeked.take())
    }

    /// Consumes a token that the caller has already peeked.
    fn bump(&mut self) -> Result<(usize, Token, usize)> {
        match self.next()? {
            Some(token) => Ok(token),
            None => Err(self.eof(Vec::new())),
        }
    }

    /// Builds the error for the upcoming token not being one of `expected`.
    fn unexpected(&mut self, expected: Vec<String>) -> ErrorS {
        let span = match self.peek() {
            Ok(Some((start, _, end))) => *start..*end,
            Ok(None) => return self.eof(expected),
            Err(e) => return e,
        };
        self.unrecognized(span, expected)
    }

    fn unrecognized(&self, span: Span, expected: Vec<String>) -> ErrorS {
        let token = self.source[span.clone()].to_string();
        (Error::SyntaxError(SyntaxError::UnrecognizedToken { token, expected }), span)
    }

    fn eof(&self, expected: Vec<String>) -> ErrorS {
        let end = self.source.len();
        (Error::SyntaxError(SyntaxError::UnrecognizedEof { expected }), end..end)
    }
}

fn expected(token: &Token) -> String {
    format!("\"{token}\"")
}

fn identifier() -> String {
    Token::Identifier(String::new()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    fn parse(source: &str) -> Result<Program> {
        Parser::new(source).parse_program()
    }

    fn parse_expr(source: &str) -> ExprS {
        Parser::new(source).parse_expr().expect("failed to parse expression")
    }

    fn number(number: f64, span: Span) -> ExprS {
        (Expr::Literal(ExprLiteral::Number(number)), span)
    }

    fn variable(name: &str, span: Span) -> ExprS {
        (Expr::Variable(ExprVariable { name: name.to_string() }), span)
    }

    #[test]
    fn parse_var_decl() {
        let exp = Program {
            stmts: vec![(
                Stmt::Var(StmtVar {
                    kind: VarKind::Var,
                    name: "y".to_string(),
                    value: Some((
                        Expr::Infix(Box::new(ExprInfix {
                            lt: number(1.0, 8..9),
                            op: OpInfix::Add,
                            rt: number(1.0, 12..13),
                        })),
                        8..13,
                    )),
                }),
                0..14,
            )],
        };
        assert_eq!(exp, parse("var y = 1 + 1;").unwrap());
    }

    #[test]
    fn parse_precedence() {
        // 1 + 2 * 3 parses as 1 + (2 * 3).
        let exp = (
            Expr::Infix(Box::new(ExprInfix {
                lt: number(1.0, 0..1),
                op: OpInfix::Add,
                rt: (
                    Expr::Infix(Box::new(ExprInfix {
                        lt: number(2.0, 4..5),
                        op: OpInfix::Multiply,
                        rt: number(3.0, 8..9),
                    })),
                    4..9,
                ),
            })),
            0..9,
        );
        assert_eq!(exp, parse_expr("1 + 2 * 3"));
    }

    #[test]
    fn parse_logic_precedence() {
        // a || b && c parses as a || (b && c).
        let (expr, _) = parse_expr("a || b && c");
        let Expr::Infix(infix) = expr else { panic!("expected infix expression") };
        assert_eq!(infix.op, OpInfix::LogicOr);
        assert_eq!(infix.lt, variable("a", 0..1));
        assert!(matches!(&infix.rt.0, Expr::Infix(rt) if rt.op == OpInfix::LogicAnd));
    }

    #[test]
    fn parse_member_call() {
        let exp = (
            Expr::Call(Box::new(ExprCall {
                callee: (
                    Expr::Get(Box::new(ExprGet {
                        object: variable("Math", 0..4),
                        name: "pow".to_string(),
                    })),
                    0..8,
                ),
                args: vec![number(3.0, 9..10), number(2.0, 12..13)],
            })),
            0..14,
        );
        assert_eq!(exp, parse_expr("Math.pow(3, 2)"));
    }

    #[test]
    fn parse_array_index() {
        let exp = (
            Expr::Index(Box::new(ExprIndex {
                array: (
                    Expr::Array(ExprArray {
                        elements: vec![number(1.0, 1..2), number(2.0, 4..5)],
                    }),
                    0..7,
                ),
                index: number(0.0, 8..9),
            })),
            0..10,
        );
        assert_eq!(exp, parse_expr("[1, 2,][0]"));
    }

    #[test]
    fn parse_assignment_targets() {
        let (expr, _) = parse_expr("i = i + 1");
        assert!(matches!(expr, Expr::Assign(assign) if assign.name == "i"));

        let (expr, _) = parse_expr("arr[0] = 5");
        assert!(matches!(expr, Expr::IndexSet(_)));

        let got = Parser::new("1 = 2").parse_expr();
        assert_eq!(got, Err((Error::SyntaxError(SyntaxError::InvalidAssignmentTarget), 0..1)));
    }

    #[test]
    fn parse_else_if_chain() {
        let program = parse("if (x > y) { a } else if (x < y) { b } else { c }").unwrap();
        let (Stmt::If(if_), _) = &program.stmts[0] else { panic!("expected if statement") };
        let Some((Stmt::If(else_if), _)) = &if_.else_ else { panic!("expected nested if") };
        assert!(matches!(else_if.else_, Some((Stmt::Block(_), _))));
    }

    #[test]
    fn parse_switch_clauses() {
        let source = "switch (x) { case 1: a(); break; case 2: default: b(); }";
        let program = parse(source).unwrap();
        let (Stmt::Switch(switch), _) = &program.stmts[0] else { panic!("expected switch") };
        let shapes = switch
            .cases
            .iter()
            .map(|case| (case.test.is_some(), case.body.len()))
            .collect::<Vec<_>>();
        assert_eq!(shapes, vec![(true, 2), (true, 0), (false, 1)]);
    }

    #[test]
    fn parse_optional_semicolons() {
        assert!(parse("{ console.log(\"x\") }").is_ok());
        assert!(parse("var x = 1\nvar y = 2").is_ok());
        assert_eq!(
            parse("var x = 1 var y = 2"),
            Err((
                Error::SyntaxError(SyntaxError::UnrecognizedToken {
                    token: "var".to_string(),
                    expected: vec!["\";\"".to_string()],
                }),
                10..13,
            ))
        );
    }

    #[test]
    fn parse_unexpected_token() {
        assert_eq!(
            parse("var = 1;"),
            Err((
                Error::SyntaxError(SyntaxError::UnrecognizedToken {
                    token: "=".to_string(),
                    expected: vec!["identifier".to_string()],
                }),
                4..5,
            ))
        );
    }

    #[test]
    fn parse_unexpected_eof() {
        assert_eq!(
            parse("while (i < 5) {"),
            Err((
                Error::SyntaxError(SyntaxError::UnrecognizedEof {
                    expected: vec!["\"}\"".to_string()],
                }),
                15..15,
            ))
        );
    }

    #[test]
    fn parse_break_continue_placement() {
        assert!(parse("while (true) { break; }").is_ok());
        assert!(parse("switch (1) { default: break; }").is_ok());
        assert!(parse("while (true) { switch (1) { default: continue; } }").is_ok());
        assert_eq!(
            parse("break;"),
            Err((Error::SyntaxError(SyntaxError::BreakOutsideLoop), 0..5))
        );
        assert_eq!(
            parse("switch (1) { default: continue; }"),
            Err((Error::SyntaxError(SyntaxError::ContinueOutsideLoop), 22..30))
        );
    }

    #[test]
    fn parse_duplicate_default() {
        assert_eq!(
            parse("switch (1) { default: default: }"),
            Err((Error::SyntaxError(SyntaxError::DuplicateDefault), 22..29))
        );
    }

    #[test]
    fn parse_const_requires_initializer() {
        assert_eq!(
            parse("const x;"),
            Err((
                Error::SyntaxError(SyntaxError::MissingInitializer { name: "x".to_string() }),
                6..7,
            ))
        );
    }

    #[test]
    fn parse_function_decl() {
        let program = parse("function add(a, b) { return a + b; }").unwrap();
        let exp_return = (
            Stmt::Return(StmtReturn {
                value: Some((
                    Expr::Infix(Box::new(ExprInfix {
                        lt: variable("a", 28..29),
                        op: OpInfix::Add,
                        rt: variable("b", 32..33),
                    })),
                    28..33,
                )),
            }),
            21..34,
        );
        let exp = StmtFunction {
            name: "add".to_string(),
            params: vec!["a".to_string(), "b".to_string()],
            body: StmtBlock { stmts: vec![exp_return] },
        };
        assert_eq!(program.stmts, vec![(Stmt::Function(Rc::new(exp)), 0..36)]);
    }

    #[test]
    fn parse_return_value_on_same_line() {
        let program = parse("function f() { return\n1 }").unwrap();
        let (Stmt::Function(function), _) = &program.stmts[0] else { panic!("expected function") };
        let stmts = &function.body.stmts;
        assert_eq!(stmts.len(), 2);
        assert!(matches!(&stmts[0].0, Stmt::Return(StmtReturn { value: None })));
        assert!(parse("function f() { return }").is_ok());
    }

    #[test]
    fn parse_function_boundaries() {
        assert_eq!(
            parse("return 1;"),
            Err((Error::SyntaxError(SyntaxError::ReturnOutsideFunction), 0..6))
        );
        assert_eq!(
            parse("while (true) { function f() { break; } }"),
            Err((Error::SyntaxError(SyntaxError::BreakOutsideLoop), 30..35))
        );
        assert!(parse("function f() { while (true) { return; } }").is_ok());
        assert_eq!(
            parse("function f(a b) {}"),
            Err((
                Error::SyntaxError(SyntaxError::UnrecognizedToken {
                    token: "b".to_string(),
                    expected: vec!["\",\"".to_string(), "\")\"".to_string()],
                }),
                13..14,
            ))
        );
    }

    #[test]
    fn parse_nesting_is_bounded() {
        let source = format!("{}1{}", "(".repeat(100), ")".repeat(100));
        assert!(parse(&source).is_ok());

        let too_deep = Error::SyntaxError(SyntaxError::NestingTooDeep { max_depth: MAX_DEPTH });
        let source = format!("console.log({}1{})", "(".repeat(50_000), ")".repeat(50_000));
        assert!(matches!(parse(&source), Err((e, _)) if e == too_deep));
        let source = format!("{}x", "!".repeat(50_000));
        assert!(matches!(parse(&source), Err((e, _)) if e == too_deep));
        let source = format!("{}{}", "{".repeat(50_000), "}".repeat(50_000));
        assert!(matches!(parse(&source), Err((e, _)) if e == too_deep));
    }

    #[test]
    fn parse_propagates_lex_error() {
        assert_eq!(
            parse("var x = # 1;"),
            Err((
                Error::SyntaxError(SyntaxError::UnexpectedInput { token: "#".to_string() }),
                8..9,
            ))
        );
    }
}
