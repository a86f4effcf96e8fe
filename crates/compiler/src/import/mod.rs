//! The metadata importer and its semantic records.

mod importer;
pub mod inline_code;
mod member_import;
mod naming;
pub mod reserved;
mod semantics;

pub use importer::{script_type_id, MetadataImporter};
pub use semantics::{
    ConstructorSemantics, DelegateSemantics, EventSemantics, FieldSemantics, MemberRef,
    MethodSemantics, PropertySemantics, TypeImplKind, TypeSemantics,
};
