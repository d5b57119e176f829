use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use gojo_common::error::{Error, IoError, Result, TypeError, ZeroDivisionError};
use gojo_common::types::Span;
use gojo_syntax::ast::{
    Expr, ExprLiteral, ExprS, OpInfix, OpPrefix, Program, Stmt, StmtS, VarKind,
};

use crate::env::Env;
use crate::value::{Callable, Function, Value};

/// How many user-defined function calls may be active at once.
pub const MAX_CALL_DEPTH: usize = 100;

/// How control leaves a statement.
#[derive(Clone, Debug, PartialEq)]
pub enum Flow {
    Normal,
    Break,
    Continue,
    Return(Value),
}

#[derive(Debug)]
pub struct Interpreter<Stdout> {
    globals: Env,
    stdout: Stdout,
    interrupt: Option<Arc<AtomicBool>>,
    /// Number of active user-defined function calls.
    depth: usize,
}

impl<Stdout: Write> Interpreter<Stdout> {
    /// An interpreter whose global scope holds the built-in namespaces.
    pub fn new(stdout: Stdout) -> Self {
        Self::with_env(stdout, Env::globals())
    }

    /// An interpreter that runs against `env` as its global scope.
    pub fn with_env(stdout: Stdout, env: Env) -> Self {
        Self { globals: env, stdout, interrupt: None, depth: 0 }
    }

    /// Installs a flag that stops the run at the next loop iteration once set.
    pub fn set_interrupt(&mut self, interrupt: Arc<AtomicBool>) {
        self.interrupt = Some(interrupt);
    }

    pub fn globals(&self) -> &Env {
        &self.globals
    }

    pub fn run(&mut self, program: &Program) -> Result<()> {
        self.eval(program)?;
        Ok(())
    }

    /// Runs the program, returning the value of its last statement if that
    /// statement is an expression.
    pub fn eval(&mut self, program: &Program) -> Result<Option<Value>> {
        let globals = self.globals.clone();
        let mut last = None;
        for stmt in &program.stmts {
            last = match stmt {
                (Stmt::Expr(expr), _) => {
                    self.trace(stmt);
                    Some(self.run_expr(&globals, &expr.value)?)
                }
                stmt => {
                    self.run_stmt(&globals, stmt)?;
                    None
                }
            };
        }
        Ok(last)
    }

    pub(crate) fn write_line(&mut self, line: &str, span: &Span) -> Result<()> {
        writeln!(self.stdout, "{line}").map_err(|_| {
            (Error::IoError(IoError::WriteError { file: "stdout".to_string() }), span.clone())
        })
    }

    /// Runs the body of a function call in `env`.
    pub(crate) fn run_call(&mut self, env: &Env, stmts: &[StmtS], span: &Span) -> Result<Flow> {
        if self.depth >= MAX_CALL_DEPTH {
            return Err((Error::RecursionError { max_depth: MAX_CALL_DEPTH }, span.clone()));
        }
        self.depth += 1;
        let flow = self.run_stmts(env, stmts);
        self.depth -= 1;
        flow
    }

    fn run_stmt(&mut self, env: &Env, stmt_s: &StmtS) -> Result<Flow> {
        self.trace(stmt_s);
        let (stmt, span) = stmt_s;
        match stmt {
            Stmt::Block(block) => {
                let env = Env::with_parent(env);
                self.run_stmts(&env, &block.stmts)
            }
            Stmt::Break => Ok(Flow::Break),
            Stmt::Continue => Ok(Flow::Continue),
            Stmt::Expr(expr) => {
                self.run_expr(env, &expr.value)?;
                Ok(Flow::Normal)
            }
            Stmt::Function(decl) => {
                env.define(&decl.name, Value::Function(Function::new(decl)), false);
                Ok(Flow::Normal)
            }
            Stmt::If(if_) => {
                if self.run_expr(env, &if_.cond)?.truthy() {
                    self.run_stmt(env, &if_.then)
                } else if let Some(else_) = &if_.else_ {
                    self.run_stmt(env, else_)
                } else {
                    Ok(Flow::Normal)
                }
            }
            Stmt::Return(return_) => {
                let value = match &return_.value {
                    Some(value) => self.run_expr(env, value)?,
                    None => Value::Undefined,
                };
                Ok(Flow::Return(value))
            }
            Stmt::Switch(switch) => {
                let discriminant = self.run_expr(env, &switch.discriminant)?;
                let mut start = None;
                for (idx, case) in switch.cases.iter().enumerate() {
                    if let Some(test) = &case.test {
                        if self.run_expr(env, test)?.strict_eq(&discriminant) {
                            start = Some(idx);
                            break;
                        }
                    }
                }
                let default = || switch.cases.iter().position(|case| case.test.is_none());
                let start = match start.or_else(default) {
                    Some(start) => start,
                    None => return Ok(Flow::Normal),
                };

                // Matching clauses fall through into the ones after them.
                let env = Env::with_parent(env);
                for case in &switch.cases[start..] {
                    match self.run_stmts(&env, &case.body)? {
                        Flow::Normal => {}
                        Flow::Break => return Ok(Flow::Normal),
                        flow @ (Flow::Continue | Flow::Return(_)) => return Ok(flow),
                    }
                }
                Ok(Flow::Normal)
            }
            Stmt::Var(var) => {
                let value = match &var.value {
                    Some(value) => self.run_expr(env, value)?,
                    None => Value::Undefined,
                };
                env.define(&var.name, value, var.kind == VarKind::Const);
                Ok(Flow::Normal)
            }
            Stmt::While(while_) => {
                loop {
                    self.check_interrupt(span)?;
                    if !self.run_expr(env, &while_.cond)?.truthy() {
                        break;
                    }
                    let env = Env::with_parent(env);
                    match self.run_stmt(&env, &while_.body)? {
                        Flow::Normal | Flow::Continue => {}
                        Flow::Break => break,
                        flow @ Flow::Return(_) => return Ok(flow),
                    }
                }
                Ok(Flow::Normal)
            }
        }
    }

    /// Runs statements in order, stopping early at a `break` or `continue`.
    fn run_stmts(&mut self, env: &Env, stmts: &[StmtS]) -> Result<Flow> {
        for stmt in stmts {
            match self.run_stmt(env, stmt)? {
                Flow::Normal => {}
                flow => return Ok(flow),
            }
        }
        Ok(Flow::Normal)
    }

    fn run_expr(&mut self, env: &Env, expr_s: &ExprS) -> Result<Value> {
        let (expr, span) = expr_s;
        match expr {
            Expr::Array(array) => {
                let elements = array
                    .elements
                    .iter()
                    .map(|element| self.run_expr(env, element))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Value::array(elements))
            }
            Expr::Assign(assign) => {
                let value = self.run_expr(env, &assign.value)?;
                env.assign(&assign.name, value.clone(), span)?;
                Ok(value)
            }
            Expr::Call(call) => {
                let callee = self.run_expr(env, &call.callee)?;
                let args = call
                    .args
                    .iter()
                    .map(|arg| self.run_expr(env, arg))
                    .collect::<Result<Vec<_>>>()?;
                match &callee {
                    Value::Function(function) => function.call(self, args, span),
                    Value::Native(native) => native.call(self, args, span),
                    _ => Err((
                        Error::TypeError(TypeError::NotCallable { type_: callee.type_() }),
                        span.clone(),
                    )),
                }
            }
            Expr::Get(get) => {
                let object = self.run_expr(env, &get.object)?;
                object.get(&get.name, span)
            }
            Expr::Index(index) => {
                let array = self.run_expr(env, &index.array)?;
                let index = self.run_expr(env, &index.index)?;
                array.get_index(&index, span)
            }
            Expr::IndexSet(index_set) => {
                let array = self.run_expr(env, &index_set.array)?;
                let index = self.run_expr(env, &index_set.index)?;
                let value = self.run_expr(env, &index_set.value)?;
                array.set_index(&index, value.clone(), span)?;
                Ok(value)
            }
            Expr::Infix(infix) => {
                let lt = self.run_expr(env, &infix.lt)?;
                match infix.op {
                    OpInfix::LogicAnd if !lt.truthy() => Ok(lt),
                    OpInfix::LogicOr if lt.truthy() => Ok(lt),
                    OpInfix::LogicAnd | OpInfix::LogicOr => self.run_expr(env, &infix.rt),
                    op => {
                        let rt = self.run_expr(env, &infix.rt)?;
                        run_infix(op, lt, rt, span)
                    }
                }
            }
            Expr::Literal(literal) => Ok(match literal {
                ExprLiteral::Undefined => Value::Undefined,
                ExprLiteral::Null => Value::Null,
                ExprLiteral::Bool(bool) => Value::Bool(*bool),
                ExprLiteral::Number(number) => Value::Number(*number),
                ExprLiteral::String(string) => Value::String(string.clone()),
            }),
            Expr::Prefix(prefix) => {
                let rt = self.run_expr(env, &prefix.rt)?;
                match (prefix.op, &rt) {
                    (OpPrefix::Negate, Value::Number(number)) => Ok(Value::Number(-number)),
                    (OpPrefix::Not, rt) => Ok(Value::Bool(!rt.truthy())),
                    (op, rt) => Err((
                        Error::TypeError(TypeError::UnsupportedOperandPrefix {
                            op: op.to_string(),
                            rt_type: rt.type_(),
                        }),
                        span.clone(),
                    )),
                }
            }
            Expr::Variable(var) => env.get(&var.name, span),
        }
    }

    fn check_interrupt(&self, span: &Span) -> Result<()> {
        match &self.interrupt {
            Some(interrupt) if interrupt.load(Ordering::Relaxed) => {
                Err((Error::Interrupted, span.clone()))
            }
            _ => Ok(()),
        }
    }

    fn trace(&self, (stmt, span): &StmtS) {
        if cfg!(feature = "trace") {
            let kind = match stmt {
                Stmt::Block(_) => "block",
                Stmt::Break => "break",
                Stmt::Continue => "continue",
                Stmt::Expr(_) => "expr",
                Stmt::Function(_) => "function",
                Stmt::If(_) => "if",
                Stmt::Return(_) => "return",
                Stmt::Switch(_) => "switch",
                Stmt::Var(_) => "var",
                Stmt::While(_) => "while",
            };
            eprintln!("{:>5}..{:<5} {kind}", span.start, span.end);
        }
    }
}

fn run_infix(op: OpInfix, lt: Value, rt: Value, span: &Span) -> Result<Value> {
    match (op, &lt, &rt) {
        (OpInfix::Add, Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
        (OpInfix::Add, Value::String(_), _) | (OpInfix::Add, _, Value::String(_)) => {
            Ok(Value::String(format!("{lt}{rt}")))
        }
        (OpInfix::Subtract, Value::Number(a), Value::Number(b)) => Ok(Value::Number(a - b)),
        (OpInfix::Multiply, Value::Number(a), Value::Number(b)) => Ok(Value::Number(a * b)),
        (OpInfix::Divide, Value::Number(_), Value::Number(b)) if *b == 0.0 => {
            Err((Error::ZeroDivisionError(ZeroDivisionError::Division), span.clone()))
        }
        (OpInfix::Divide, Value::Number(a), Value::Number(b)) => Ok(Value::Number(a / b)),
        (OpInfix::Modulo, Value::Number(_), Value::Number(b)) if *b == 0.0 => {
            Err((Error::ZeroDivisionError(ZeroDivisionError::Modulo), span.clone()))
        }
        (OpInfix::Modulo, Value::Number(a), Value::Number(b)) => Ok(Value::Number(a % b)),
        (OpInfix::Less, Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a < b)),
        (OpInfix::Less, Value::String(a), Value::String(b)) => Ok(Value::Bool(a < b)),
        (OpInfix::LessEqual, Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a <= b)),
        (OpInfix::LessEqual, Value::String(a), Value::String(b)) => Ok(Value::Bool(a <= b)),
        (OpInfix::Greater, Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a > b)),
        (OpInfix::Greater, Value::String(a), Value::String(b)) => Ok(Value::Bool(a > b)),
        (OpInfix::GreaterEqual, Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a >= b)),
        (OpInfix::GreaterEqual, Value::String(a), Value::String(b)) => Ok(Value::Bool(a >= b)),
        (OpInfix::Equal, a, b) => Ok(Value::Bool(a.loose_eq(b))),
        (OpInfix::NotEqual, a, b) => Ok(Value::Bool(!a.loose_eq(b))),
        (OpInfix::StrictEqual, a, b) => Ok(Value::Bool(a.strict_eq(b))),
        (OpInfix::StrictNotEqual, a, b) => Ok(Value::Bool(!a.strict_eq(b))),
        (op, a, b) => Err((
            Error::TypeError(TypeError::UnsupportedOperandInfix {
                op: op.to_string(),
                lt_type: a.type_(),
                rt_type: b.type_(),
            }),
            span.clone(),
        )),
    }
}
