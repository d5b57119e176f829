use std::fmt::{self, Display, Formatter};
use std::rc::Rc;

pub use gojo_common::types::{Span, Spanned};

pub type ExprS = Spanned<Expr>;
pub type StmtS = Spanned<Stmt>;

#[derive(Debug, Default, PartialEq)]
pub struct Program {
    pub stmts: Vec<StmtS>,
}

#[derive(Debug, PartialEq)]
pub enum Stmt {
    Block(StmtBlock),
    Break,
    Continue,
    Expr(StmtExpr),
    /// Shared with the function values created from it.
    Function(Rc<StmtFunction>),
    If(Box<StmtIf>),
    Return(StmtReturn),
    Switch(Box<StmtSwitch>),
    Var(StmtVar),
    While(Box<StmtWhile>),
}

#[derive(Debug, PartialEq)]
pub struct StmtBlock {
    pub stmts: Vec<StmtS>,
}

/// An expression statement evaluates an expression and discards the result.
#[derive(Debug, PartialEq)]
pub struct StmtExpr {
    pub value: ExprS,
}

#[derive(Debug, PartialEq)]
pub struct StmtFunction {
    pub name: String,
    pub params: Vec<String>,
    pub body: StmtBlock,
}

/// `else if` is represented as an `If` in the `else_` branch.
#[derive(Debug, PartialEq)]
pub struct StmtIf {
    pub cond: ExprS,
    pub then: StmtS,
    pub else_: Option<StmtS>,
}

#[derive(Debug, PartialEq)]
pub struct StmtReturn {
    pub value: Option<ExprS>,
}

#[derive(Debug, PartialEq)]
pub struct StmtSwitch {
    pub discriminant: ExprS,
    /// Clauses in source order, including the default clause.
    pub cases: Vec<SwitchCase>,
}

#[derive(Debug, PartialEq)]
pub struct SwitchCase {
    /// `None` for the `default` clause.
    pub test: Option<ExprS>,
    pub body: Vec<StmtS>,
}

#[derive(Debug, PartialEq)]
pub struct StmtVar {
    pub kind: VarKind,
    pub name: String,
    pub value: Option<ExprS>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum VarKind {
    Var,
    Let,
    Const,
}

#[derive(Debug, PartialEq)]
pub struct StmtWhile {
    pub cond: ExprS,
    pub body: StmtS,
}

#[derive(Debug, PartialEq)]
pub enum Expr {
    Array(ExprArray),
    Assign(Box<ExprAssign>),
    Call(Box<ExprCall>),
    Get(Box<ExprGet>),
    Index(Box<ExprIndex>),
    IndexSet(Box<ExprIndexSet>),
    Infix(Box<ExprInfix>),
    Literal(ExprLiteral),
    Prefix(Box<ExprPrefix>),
    Variable(ExprVariable),
}

#[derive(Debug, PartialEq)]
pub struct ExprArray {
    pub elements: Vec<ExprS>,
}

#[derive(Debug, PartialEq)]
pub struct ExprAssign {
    pub name: String,
    pub value: ExprS,
}

#[derive(Debug, PartialEq)]
pub struct ExprCall {
    pub callee: ExprS,
    pub args: Vec<ExprS>,
}

/// Member access by name, e.g. `Math.sqrt`.
#[derive(Debug, PartialEq)]
pub struct ExprGet {
    pub object: ExprS,
    pub name: String,
}

#[derive(Debug, PartialEq)]
pub struct ExprIndex {
    pub array: ExprS,
    pub index: ExprS,
}

#[derive(Debug, PartialEq)]
pub struct ExprIndexSet {
    pub array: ExprS,
    pub index: ExprS,
    pub value: ExprS,
}

#[derive(Debug, PartialEq)]
pub enum ExprLiteral {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
}

#[derive(Debug, PartialEq)]
pub struct ExprInfix {
    pub lt: ExprS,
    pub op: OpInfix,
    pub rt: ExprS,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum OpInfix {
    /// Short-circuiting logical OR.
    LogicOr,
    /// Short-circuiting logical AND.
    LogicAnd,
    Equal,
    NotEqual,
    StrictEqual,
    StrictNotEqual,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
}

impl Display for OpInfix {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let op = match self {
            OpInfix::LogicOr => "||",
            OpInfix::LogicAnd => "&&",
            OpInfix::Equal => "==",
            OpInfix::NotEqual => "!=",
            OpInfix::StrictEqual => "===",
            OpInfix::StrictNotEqual => "!==",
            OpInfix::Greater => ">",
            OpInfix::GreaterEqual => ">=",
            OpInfix::Less => "<",
            OpInfix::LessEqual => "<=",
            OpInfix::Add => "+",
            OpInfix::Subtract => "-",
            OpInfix::Multiply => "*",
            OpInfix::Divide => "/",
            OpInfix::Modulo => "%",
        };
        write!(f, "{op}")
    }
}

#[derive(Debug, PartialEq)]
pub struct ExprPrefix {
    pub op: OpPrefix,
    pub rt: ExprS,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum OpPrefix {
    Negate,
    Not,
}

impl Display for OpPrefix {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let op = match self {
            OpPrefix::Negate => "-",
            OpPrefix::Not => "!",
        };
        write!(f, "{op}")
    }
}

#[derive(Debug, Eq, PartialEq)]
pub struct ExprVariable {
    pub name: String,
}
