//! # Reef Script Trees
//!
//! This crate defines the syntax trees for the script emitted by the Reef
//! compiler, together with a text writer.
//!
//! The trees are deliberately small: they model the dynamically typed target
//! language, not the source language. One node is special. [`Expr::TypeRef`]
//! carries an opaque token for a source-language type definition instead of a
//! name; it is resolved to a dotted script name only when the tree is
//! written, through a [`TypeNameResolver`], which is what allows a type to be
//! renamed after expressions referring to it have been built.

pub mod expr;
pub mod stmt;
pub mod writer;

pub use expr::{
    AssignOp, BinaryOp, Expr, FunctionExpr, Literal, ObjectProperty, PropertyName, UnaryOp,
};
pub use stmt::{CatchClause, ForInit, FunctionDecl, Stmt, SwitchSection, VarDeclarator};
pub use writer::{ScriptWriter, TypeNameResolver, WriteError};

/// Opaque handle for a source-language type definition referenced from a
/// script expression. Resolution to a dotted name is deferred to the writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScriptTypeId(pub u32);
