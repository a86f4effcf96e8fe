//! Text writer for script trees.
//!
//! Serialization is where deferred [`Expr::TypeRef`] nodes are resolved to
//! dotted names, so the writer takes a [`TypeNameResolver`].

use crate::expr::{Expr, Literal, PropertyName, UnaryOp};
use crate::stmt::{ForInit, Stmt, SwitchSection, VarDeclarator};
use crate::ScriptTypeId;
use std::fmt::Write as _;
use thiserror::Error;

/// Resolves a deferred type token to its dotted script name.
pub trait TypeNameResolver {
    fn resolve(&self, id: ScriptTypeId) -> String;
}

impl<F: Fn(ScriptTypeId) -> String> TypeNameResolver for F {
    fn resolve(&self, id: ScriptTypeId) -> String {
        self(id)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WriteError {
    /// A `goto` survived to serialization; the state-machine rewriter should
    /// have replaced it.
    #[error("cannot serialize goto to label `{0}`; the tree was not rewritten")]
    UnloweredGoto(String),
}

// Operator precedence levels, loosest binding first.
const PREC_COMMA: u8 = 1;
const PREC_ASSIGN: u8 = 2;
const PREC_CONDITIONAL: u8 = 3;
const PREC_UNARY: u8 = 14;
const PREC_POSTFIX: u8 = 15;
const PREC_NEW: u8 = 16;
const PREC_CALL: u8 = 17;
const PREC_PRIMARY: u8 = 18;

fn binary_precedence(op: crate::expr::BinaryOp) -> u8 {
    use crate::expr::BinaryOp::*;
    match op {
        LogicalOr => 4,
        LogicalAnd => 5,
        BitwiseOr => 6,
        BitwiseXor => 7,
        BitwiseAnd => 8,
        Equal | NotEqual | Same | NotSame => 9,
        Lesser | LesserOrEqual | Greater | GreaterOrEqual | In | InstanceOf => 10,
        LeftShift | RightShiftSigned | RightShiftUnsigned => 11,
        Add | Subtract => 12,
        Multiply | Divide | Modulo => 13,
    }
}

fn expr_precedence(expr: &Expr) -> u8 {
    match expr {
        Expr::Comma(_) => PREC_COMMA,
        Expr::Assign { .. } => PREC_ASSIGN,
        Expr::Conditional { .. } => PREC_CONDITIONAL,
        Expr::Binary { op, .. } => binary_precedence(*op),
        Expr::Unary { op, .. } => {
            if op.is_postfix() {
                PREC_POSTFIX
            } else {
                PREC_UNARY
            }
        }
        Expr::New { .. } => PREC_NEW,
        Expr::Call { .. } | Expr::Member { .. } | Expr::Index { .. } => PREC_CALL,
        _ => PREC_PRIMARY,
    }
}

/// Writes statements and expressions as script text.
pub struct ScriptWriter<'a> {
    resolver: &'a dyn TypeNameResolver,
    out: String,
    indent: usize,
}

impl<'a> ScriptWriter<'a> {
    pub fn new(resolver: &'a dyn TypeNameResolver) -> ScriptWriter<'a> {
        ScriptWriter { resolver, out: String::new(), indent: 0 }
    }

    /// Serialize a statement list as a module body.
    pub fn write_module(mut self, stmts: &[Stmt]) -> Result<String, WriteError> {
        for stmt in stmts {
            self.stmt(stmt)?;
        }
        Ok(self.out)
    }

    /// Serialize a single expression.
    pub fn write_expr(mut self, expr: &Expr) -> Result<String, WriteError> {
        self.expr(expr, PREC_COMMA)?;
        Ok(self.out)
    }

    fn line_start(&mut self) {
        for _ in 0..self.indent {
            self.out.push('\t');
        }
    }

    fn stmt(&mut self, stmt: &Stmt) -> Result<(), WriteError> {
        match stmt {
            Stmt::Block(stmts) => {
                self.line_start();
                self.block(stmts)?;
                self.out.push('\n');
            }
            Stmt::Empty => {
                self.line_start();
                self.out.push_str(";\n");
            }
            Stmt::Expr(expr) => {
                self.line_start();
                // A leading function or object literal would parse as a
                // declaration or block.
                let needs_parens = matches!(expr, Expr::Function(_) | Expr::Object(_));
                if needs_parens {
                    self.out.push('(');
                }
                self.expr(expr, PREC_COMMA)?;
                if needs_parens {
                    self.out.push(')');
                }
                self.out.push_str(";\n");
            }
            Stmt::Var(decls) => {
                self.line_start();
                self.out.push_str("var ");
                self.var_declarators(decls)?;
                self.out.push_str(";\n");
            }
            Stmt::If { test, then_branch, else_branch } => {
                self.line_start();
                self.out.push_str("if (");
                self.expr(test, PREC_COMMA)?;
                self.out.push_str(") ");
                self.embedded(then_branch)?;
                if let Some(else_branch) = else_branch {
                    self.line_start();
                    self.out.push_str("else ");
                    self.embedded(else_branch)?;
                }
            }
            Stmt::For { init, test, update, body } => {
                self.line_start();
                self.out.push_str("for (");
                match init {
                    Some(ForInit::Var(decls)) => {
                        self.out.push_str("var ");
                        self.var_declarators(decls)?;
                    }
                    Some(ForInit::Expr(expr)) => self.expr(expr, PREC_COMMA)?,
                    None => {}
                }
                self.out.push(';');
                if let Some(test) = test {
                    self.out.push(' ');
                    self.expr(test, PREC_COMMA)?;
                }
                self.out.push(';');
                if let Some(update) = update {
                    self.out.push(' ');
                    self.expr(update, PREC_COMMA)?;
                }
                self.out.push_str(") ");
                self.embedded(body)?;
            }
            Stmt::ForIn { is_declared, name, object, body } => {
                self.line_start();
                self.out.push_str("for (");
                if *is_declared {
                    self.out.push_str("var ");
                }
                self.out.push_str(name);
                self.out.push_str(" in ");
                self.expr(object, PREC_COMMA)?;
                self.out.push_str(") ");
                self.embedded(body)?;
            }
            Stmt::While { test, body } => {
                self.line_start();
                self.out.push_str("while (");
                self.expr(test, PREC_COMMA)?;
                self.out.push_str(") ");
                self.embedded(body)?;
            }
            Stmt::DoWhile { body, test } => {
                self.line_start();
                self.out.push_str("do ");
                self.embedded(body)?;
                // re-open the line the embedded block closed
                let trimmed = self.out.trim_end_matches('\n').len();
                self.out.truncate(trimmed);
                self.out.push_str(" while (");
                self.expr(test, PREC_COMMA)?;
                self.out.push_str(");\n");
            }
            Stmt::Switch { discriminant, sections } => {
                self.line_start();
                self.out.push_str("switch (");
                self.expr(discriminant, PREC_COMMA)?;
                self.out.push_str(") {\n");
                self.indent += 1;
                for section in sections {
                    self.switch_section(section)?;
                }
                self.indent -= 1;
                self.line_start();
                self.out.push_str("}\n");
            }
            Stmt::Try { body, catch, finally } => {
                self.line_start();
                self.out.push_str("try ");
                self.block(body)?;
                if let Some(catch) = catch {
                    self.out.push('\n');
                    self.line_start();
                    let _ = write!(self.out, "catch ({}) ", catch.name);
                    self.block(&catch.body)?;
                }
                if let Some(finally) = finally {
                    self.out.push('\n');
                    self.line_start();
                    self.out.push_str("finally ");
                    self.block(finally)?;
                }
                self.out.push('\n');
            }
            Stmt::Throw(expr) => {
                self.line_start();
                self.out.push_str("throw ");
                self.expr(expr, PREC_COMMA)?;
                self.out.push_str(";\n");
            }
            Stmt::Return(value) => {
                self.line_start();
                self.out.push_str("return");
                if let Some(value) = value {
                    self.out.push(' ');
                    self.expr(value, PREC_COMMA)?;
                }
                self.out.push_str(";\n");
            }
            Stmt::Break(label) => {
                self.line_start();
                self.out.push_str("break");
                if let Some(label) = label {
                    self.out.push(' ');
                    self.out.push_str(label);
                }
                self.out.push_str(";\n");
            }
            Stmt::Continue(label) => {
                self.line_start();
                self.out.push_str("continue");
                if let Some(label) = label {
                    self.out.push(' ');
                    self.out.push_str(label);
                }
                self.out.push_str(";\n");
            }
            Stmt::Labeled { label, body } => {
                self.line_start();
                self.out.push_str(label);
                self.out.push_str(":\n");
                self.stmt(body)?;
            }
            Stmt::Goto(label) => return Err(WriteError::UnloweredGoto(label.clone())),
            Stmt::Function(decl) => {
                self.line_start();
                let _ = write!(self.out, "function {}(", decl.name);
                self.param_list(&decl.params);
                self.out.push_str(") ");
                self.block(&decl.body)?;
                self.out.push('\n');
            }
        }
        Ok(())
    }

    /// Writes a statement in embedded position (loop/if body). Blocks stay on
    /// the current line; other statements go to a fresh indented line.
    fn embedded(&mut self, stmt: &Stmt) -> Result<(), WriteError> {
        if let Stmt::Block(stmts) = stmt {
            self.block(stmts)?;
            self.out.push('\n');
        } else {
            self.out.push('\n');
            self.indent += 1;
            self.stmt(stmt)?;
            self.indent -= 1;
        }
        Ok(())
    }

    fn block(&mut self, stmts: &[Stmt]) -> Result<(), WriteError> {
        self.out.push_str("{\n");
        self.indent += 1;
        for stmt in stmts {
            self.stmt(stmt)?;
        }
        self.indent -= 1;
        self.line_start();
        self.out.push('}');
        Ok(())
    }

    fn switch_section(&mut self, section: &SwitchSection) -> Result<(), WriteError> {
        for label in &section.labels {
            self.line_start();
            match label {
                Some(expr) => {
                    self.out.push_str("case ");
                    self.expr(expr, PREC_COMMA)?;
                    self.out.push_str(":\n");
                }
                None => self.out.push_str("default:\n"),
            }
        }
        self.indent += 1;
        for stmt in &section.body {
            self.stmt(stmt)?;
        }
        self.indent -= 1;
        Ok(())
    }

    fn var_declarators(&mut self, decls: &[VarDeclarator]) -> Result<(), WriteError> {
        for (i, decl) in decls.iter().enumerate() {
            if i > 0 {
                self.out.push_str(", ");
            }
            self.out.push_str(&decl.name);
            if let Some(init) = &decl.init {
                self.out.push_str(" = ");
                self.expr(init, PREC_ASSIGN)?;
            }
        }
        Ok(())
    }

    fn param_list(&mut self, params: &[String]) {
        for (i, param) in params.iter().enumerate() {
            if i > 0 {
                self.out.push_str(", ");
            }
            self.out.push_str(param);
        }
    }

    fn expr(&mut self, expr: &Expr, min_prec: u8) -> Result<(), WriteError> {
        let prec = expr_precedence(expr);
        let parens = prec < min_prec;
        if parens {
            self.out.push('(');
        }
        match expr {
            Expr::Ident(name) => self.out.push_str(name),
            Expr::Literal(lit) => self.literal(lit),
            Expr::Member { object, name } => {
                self.expr(object, PREC_CALL)?;
                self.out.push('.');
                self.out.push_str(name);
            }
            Expr::Index { object, index } => {
                self.expr(object, PREC_CALL)?;
                self.out.push('[');
                self.expr(index, PREC_COMMA)?;
                self.out.push(']');
            }
            Expr::Call { target, args } => {
                self.expr(target, PREC_CALL)?;
                self.out.push('(');
                self.expr_list(args)?;
                self.out.push(')');
            }
            Expr::New { target, args } => {
                self.out.push_str("new ");
                self.expr(target, PREC_NEW)?;
                self.out.push('(');
                self.expr_list(args)?;
                self.out.push(')');
            }
            Expr::Binary { op, lhs, rhs } => {
                self.expr(lhs, prec)?;
                let _ = write!(self.out, " {} ", op.as_str());
                self.expr(rhs, prec + 1)?;
            }
            Expr::Unary { op, operand } => {
                if op.is_postfix() {
                    self.expr(operand, PREC_POSTFIX)?;
                    self.out.push_str(op.as_str());
                } else {
                    self.out.push_str(op.as_str());
                    // a space also keeps `- -x` from reading as a decrement
                    let sign_pair = matches!(
                        (op, &**operand),
                        (UnaryOp::Negate, Expr::Unary { op: UnaryOp::Negate, .. })
                            | (UnaryOp::Positive, Expr::Unary { op: UnaryOp::Positive, .. })
                    );
                    if sign_pair
                        || matches!(op, UnaryOp::TypeOf | UnaryOp::Void | UnaryOp::Delete)
                    {
                        self.out.push(' ');
                    }
                    self.expr(operand, PREC_UNARY)?;
                }
            }
            Expr::Assign { op, target, value } => {
                self.expr(target, PREC_UNARY)?;
                let _ = write!(self.out, " {} ", op.as_str());
                self.expr(value, PREC_ASSIGN)?;
            }
            Expr::Array(items) => {
                self.out.push('[');
                self.expr_list(items)?;
                self.out.push(']');
            }
            Expr::Object(props) => {
                if props.is_empty() {
                    self.out.push_str("{}");
                } else {
                    self.out.push_str("{ ");
                    for (i, prop) in props.iter().enumerate() {
                        if i > 0 {
                            self.out.push_str(", ");
                        }
                        match &prop.name {
                            PropertyName::Ident(name) => self.out.push_str(name),
                            PropertyName::String(s) => self.string_literal(s),
                            PropertyName::Number(n) => self.number_literal(*n),
                        }
                        self.out.push_str(": ");
                        self.expr(&prop.value, PREC_ASSIGN)?;
                    }
                    self.out.push_str(" }");
                }
            }
            Expr::Function(func) => {
                self.out.push_str("function");
                if let Some(name) = &func.name {
                    self.out.push(' ');
                    self.out.push_str(name);
                }
                self.out.push('(');
                self.param_list(&func.params);
                self.out.push_str(") ");
                self.block(&func.body)?;
            }
            Expr::Conditional { test, consequent, alternate } => {
                self.expr(test, PREC_CONDITIONAL + 1)?;
                self.out.push_str(" ? ");
                self.expr(consequent, PREC_ASSIGN)?;
                self.out.push_str(" : ");
                self.expr(alternate, PREC_ASSIGN)?;
            }
            Expr::Comma(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        self.out.push_str(", ");
                    }
                    self.expr(item, PREC_ASSIGN)?;
                }
            }
            Expr::This => self.out.push_str("this"),
            Expr::TypeRef(id) => {
                let name = self.resolver.resolve(*id);
                self.out.push_str(&name);
            }
        }
        if parens {
            self.out.push(')');
        }
        Ok(())
    }

    fn expr_list(&mut self, items: &[Expr]) -> Result<(), WriteError> {
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                self.out.push_str(", ");
            }
            self.expr(item, PREC_ASSIGN)?;
        }
        Ok(())
    }

    fn literal(&mut self, lit: &Literal) {
        match lit {
            Literal::Number(n) => self.number_literal(*n),
            Literal::String(s) => self.string_literal(s),
            Literal::Boolean(true) => self.out.push_str("true"),
            Literal::Boolean(false) => self.out.push_str("false"),
            Literal::Null => self.out.push_str("null"),
            Literal::Regex { pattern, flags } => {
                let _ = write!(self.out, "/{}/{}", pattern, flags);
            }
        }
    }

    fn number_literal(&mut self, n: f64) {
        if n < 0.0 {
            // a literal never carries the sign; negation is a unary node
            let _ = write!(self.out, "({})", n);
        } else if n.fract() == 0.0 && n.abs() < 1e21 {
            let _ = write!(self.out, "{}", n as i64);
        } else {
            let _ = write!(self.out, "{}", n);
        }
    }

    fn string_literal(&mut self, s: &str) {
        self.out.push('\'');
        for c in s.chars() {
            match c {
                '\'' => self.out.push_str("\\'"),
                '\\' => self.out.push_str("\\\\"),
                '\n' => self.out.push_str("\\n"),
                '\r' => self.out.push_str("\\r"),
                '\t' => self.out.push_str("\\t"),
                c if (c as u32) < 0x20 => {
                    let _ = write!(self.out, "\\x{:02x}", c as u32);
                }
                c => self.out.push(c),
            }
        }
        self.out.push('\'');
    }
}
