//! Script expression nodes.

use crate::ScriptTypeId;
use crate::stmt::Stmt;

/// Literal values.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Number(f64),
    String(String),
    Boolean(bool),
    Null,
    Regex { pattern: String, flags: String },
}

/// Binary operators, in source-text form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    LeftShift,
    RightShiftSigned,
    RightShiftUnsigned,
    BitwiseAnd,
    BitwiseOr,
    BitwiseXor,
    LogicalAnd,
    LogicalOr,
    Equal,
    NotEqual,
    Same,
    NotSame,
    Lesser,
    LesserOrEqual,
    Greater,
    GreaterOrEqual,
    In,
    InstanceOf,
}

impl BinaryOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Modulo => "%",
            BinaryOp::LeftShift => "<<",
            BinaryOp::RightShiftSigned => ">>",
            BinaryOp::RightShiftUnsigned => ">>>",
            BinaryOp::BitwiseAnd => "&",
            BinaryOp::BitwiseOr => "|",
            BinaryOp::BitwiseXor => "^",
            BinaryOp::LogicalAnd => "&&",
            BinaryOp::LogicalOr => "||",
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::Same => "===",
            BinaryOp::NotSame => "!==",
            BinaryOp::Lesser => "<",
            BinaryOp::LesserOrEqual => "<=",
            BinaryOp::Greater => ">",
            BinaryOp::GreaterOrEqual => ">=",
            BinaryOp::In => "in",
            BinaryOp::InstanceOf => "instanceof",
        }
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    LogicalNot,
    BitwiseNot,
    Negate,
    Positive,
    TypeOf,
    Void,
    Delete,
    PrefixIncrement,
    PrefixDecrement,
    PostfixIncrement,
    PostfixDecrement,
}

impl UnaryOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnaryOp::LogicalNot => "!",
            UnaryOp::BitwiseNot => "~",
            UnaryOp::Negate => "-",
            UnaryOp::Positive => "+",
            UnaryOp::TypeOf => "typeof",
            UnaryOp::Void => "void",
            UnaryOp::Delete => "delete",
            UnaryOp::PrefixIncrement | UnaryOp::PostfixIncrement => "++",
            UnaryOp::PrefixDecrement | UnaryOp::PostfixDecrement => "--",
        }
    }

    pub fn is_postfix(&self) -> bool {
        matches!(self, UnaryOp::PostfixIncrement | UnaryOp::PostfixDecrement)
    }
}

/// Assignment operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    AddAssign,
    SubtractAssign,
    MultiplyAssign,
    DivideAssign,
    ModuloAssign,
    LeftShiftAssign,
    RightShiftSignedAssign,
    RightShiftUnsignedAssign,
    BitwiseAndAssign,
    BitwiseOrAssign,
    BitwiseXorAssign,
}

impl AssignOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssignOp::Assign => "=",
            AssignOp::AddAssign => "+=",
            AssignOp::SubtractAssign => "-=",
            AssignOp::MultiplyAssign => "*=",
            AssignOp::DivideAssign => "/=",
            AssignOp::ModuloAssign => "%=",
            AssignOp::LeftShiftAssign => "<<=",
            AssignOp::RightShiftSignedAssign => ">>=",
            AssignOp::RightShiftUnsignedAssign => ">>>=",
            AssignOp::BitwiseAndAssign => "&=",
            AssignOp::BitwiseOrAssign => "|=",
            AssignOp::BitwiseXorAssign => "^=",
        }
    }
}

/// Property key in an object literal.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyName {
    Ident(String),
    String(String),
    Number(f64),
}

/// One `name: value` pair of an object literal.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectProperty {
    pub name: PropertyName,
    pub value: Expr,
}

/// A function expression.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionExpr {
    pub name: Option<String>,
    pub params: Vec<String>,
    pub body: Vec<Stmt>,
}

/// Script expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Ident(String),
    Literal(Literal),
    Member { object: Box<Expr>, name: String },
    Index { object: Box<Expr>, index: Box<Expr> },
    Call { target: Box<Expr>, args: Vec<Expr> },
    New { target: Box<Expr>, args: Vec<Expr> },
    Binary { op: BinaryOp, lhs: Box<Expr>, rhs: Box<Expr> },
    Unary { op: UnaryOp, operand: Box<Expr> },
    Assign { op: AssignOp, target: Box<Expr>, value: Box<Expr> },
    Array(Vec<Expr>),
    Object(Vec<ObjectProperty>),
    Function(FunctionExpr),
    Conditional { test: Box<Expr>, consequent: Box<Expr>, alternate: Box<Expr> },
    Comma(Vec<Expr>),
    This,
    TypeRef(ScriptTypeId),
}

impl Expr {
    pub fn ident(name: impl Into<String>) -> Expr {
        Expr::Ident(name.into())
    }

    pub fn number(value: f64) -> Expr {
        Expr::Literal(Literal::Number(value))
    }

    pub fn string(value: impl Into<String>) -> Expr {
        Expr::Literal(Literal::String(value.into()))
    }

    pub fn boolean(value: bool) -> Expr {
        Expr::Literal(Literal::Boolean(value))
    }

    pub fn null() -> Expr {
        Expr::Literal(Literal::Null)
    }

    pub fn member(object: Expr, name: impl Into<String>) -> Expr {
        Expr::Member { object: Box::new(object), name: name.into() }
    }

    pub fn index(object: Expr, index: Expr) -> Expr {
        Expr::Index { object: Box::new(object), index: Box::new(index) }
    }

    pub fn call(target: Expr, args: Vec<Expr>) -> Expr {
        Expr::Call { target: Box::new(target), args }
    }

    pub fn new_object(target: Expr, args: Vec<Expr>) -> Expr {
        Expr::New { target: Box::new(target), args }
    }

    pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
        Expr::Binary { op, lhs: Box::new(lhs), rhs: Box::new(rhs) }
    }

    pub fn unary(op: UnaryOp, operand: Expr) -> Expr {
        Expr::Unary { op, operand: Box::new(operand) }
    }

    pub fn logical_not(operand: Expr) -> Expr {
        Expr::unary(UnaryOp::LogicalNot, operand)
    }

    pub fn assign(target: Expr, value: Expr) -> Expr {
        Expr::Assign { op: AssignOp::Assign, target: Box::new(target), value: Box::new(value) }
    }

    pub fn conditional(test: Expr, consequent: Expr, alternate: Expr) -> Expr {
        Expr::Conditional {
            test: Box::new(test),
            consequent: Box::new(consequent),
            alternate: Box::new(alternate),
        }
    }

    pub fn type_ref(id: ScriptTypeId) -> Expr {
        Expr::TypeRef(id)
    }

    /// True for the `null` literal.
    pub fn is_null_literal(&self) -> bool {
        matches!(self, Expr::Literal(Literal::Null))
    }
}
