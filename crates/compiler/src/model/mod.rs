//! The read-only type and member graph the core consumes.
//!
//! The source-language parser and type resolver are external collaborators;
//! this module defines the shape of the data they hand over. Symbols are
//! newtype indices into arenas owned by [`TypeModel`], so identity is cheap
//! and hashable. The graph is populated up front and read-only afterwards.

mod attributes;
mod graph;
mod members;
mod types;

pub use attributes::{Attr, AttributeSet, InlineCodeAttr};
pub use graph::{Assembly, KnownTypes, TypeModel};
pub use members::{ConstValue, Event, Field, Method, Param, Property};
pub use types::{
    AssemblyId, EventId, FieldId, MethodId, PropertyId, TypeDef, TypeId, TypeKind, TypeParamOwner,
    TypeParamRef, TypeRef,
};
