//! Script statement nodes.

use crate::expr::Expr;

/// One `name = init` pair of a `var` statement.
#[derive(Debug, Clone, PartialEq)]
pub struct VarDeclarator {
    pub name: String,
    pub init: Option<Expr>,
}

impl VarDeclarator {
    pub fn new(name: impl Into<String>, init: Option<Expr>) -> VarDeclarator {
        VarDeclarator { name: name.into(), init }
    }
}

/// Initializer clause of a `for` statement.
#[derive(Debug, Clone, PartialEq)]
pub enum ForInit {
    Var(Vec<VarDeclarator>),
    Expr(Expr),
}

/// One `case`/`default` group of a `switch`. A `None` label is `default`.
/// Groups with multiple labels fall through into a shared body.
#[derive(Debug, Clone, PartialEq)]
pub struct SwitchSection {
    pub labels: Vec<Option<Expr>>,
    pub body: Vec<Stmt>,
}

/// `catch (name) { ... }`.
#[derive(Debug, Clone, PartialEq)]
pub struct CatchClause {
    pub name: String,
    pub body: Vec<Stmt>,
}

/// A function declaration statement.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    pub name: String,
    pub params: Vec<String>,
    pub body: Vec<Stmt>,
}

/// Script statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Block(Vec<Stmt>),
    Empty,
    Expr(Expr),
    Var(Vec<VarDeclarator>),
    If { test: Expr, then_branch: Box<Stmt>, else_branch: Option<Box<Stmt>> },
    For {
        init: Option<ForInit>,
        test: Option<Expr>,
        update: Option<Expr>,
        body: Box<Stmt>,
    },
    ForIn { is_declared: bool, name: String, object: Expr, body: Box<Stmt> },
    While { test: Expr, body: Box<Stmt> },
    DoWhile { body: Box<Stmt>, test: Expr },
    Switch { discriminant: Expr, sections: Vec<SwitchSection> },
    Try {
        body: Vec<Stmt>,
        catch: Option<CatchClause>,
        finally: Option<Vec<Stmt>>,
    },
    Throw(Expr),
    Return(Option<Expr>),
    Break(Option<String>),
    Continue(Option<String>),
    Labeled { label: String, body: Box<Stmt> },
    /// An unconditional jump to a label. Only valid before state-machine
    /// rewriting; the writer refuses to serialize it.
    Goto(String),
    Function(FunctionDecl),
}

impl Stmt {
    pub fn block(stmts: Vec<Stmt>) -> Stmt {
        Stmt::Block(stmts)
    }

    pub fn expr(expr: Expr) -> Stmt {
        Stmt::Expr(expr)
    }

    /// A `var` statement declaring a single name.
    pub fn var(name: impl Into<String>, init: Option<Expr>) -> Stmt {
        Stmt::Var(vec![VarDeclarator::new(name, init)])
    }

    pub fn if_then(test: Expr, then_branch: Stmt) -> Stmt {
        Stmt::If { test, then_branch: Box::new(then_branch), else_branch: None }
    }

    pub fn if_else(test: Expr, then_branch: Stmt, else_branch: Stmt) -> Stmt {
        Stmt::If {
            test,
            then_branch: Box::new(then_branch),
            else_branch: Some(Box::new(else_branch)),
        }
    }

    pub fn labeled(label: impl Into<String>, body: Stmt) -> Stmt {
        Stmt::Labeled { label: label.into(), body: Box::new(body) }
    }

    /// An infinite `for (;;)` loop.
    pub fn for_ever(body: Stmt) -> Stmt {
        Stmt::For { init: None, test: None, update: None, body: Box::new(body) }
    }
}
