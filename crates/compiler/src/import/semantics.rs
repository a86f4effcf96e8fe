//! Immutable per-symbol records describing how a symbol appears in script.
//!
//! Records are created during import and never mutated by later phases. The
//! accessors that consumers lean on most (`script_name`, `generates_code`)
//! are provided as methods so callers need not match every variant.

use crate::model::{FieldId, PropertyId};

/// How a type surfaces in script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeImplKind {
    Normal,
    NotUsable,
}

/// Type-level record.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeSemantics {
    pub kind: TypeImplKind,
    /// Dotted script name; empty for globally exposed types.
    pub name: String,
    pub ignore_generic_arguments: bool,
    pub generate_code: bool,
    pub is_serializable: bool,
    pub is_named_values: bool,
    pub is_imported: bool,
    /// False when the type is imported and bypasses the runtime type system.
    pub obeys_type_system: bool,
}

impl TypeSemantics {
    pub fn is_usable(&self) -> bool {
        self.kind == TypeImplKind::Normal
    }
}

/// Delegate-type record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelegateSemantics {
    pub expand_params: bool,
    pub bind_this_to_first_parameter: bool,
}

/// Method record.
#[derive(Debug, Clone, PartialEq)]
pub enum MethodSemantics {
    Normal {
        name: String,
        generate_code: bool,
        ignore_generic_arguments: bool,
        expand_params: bool,
        enumerate_as_array: bool,
    },
    InlineCode {
        code: String,
        non_virtual_code: Option<String>,
        generated_method_name: Option<String>,
        enumerate_as_array: bool,
    },
    /// Single-parameter indexer accessed with bracket syntax.
    NativeIndexer,
    /// Operator method emitted as the native operator.
    NativeOperator,
    /// Instance method surfaced as a static function taking the receiver as
    /// its first argument.
    StaticMethodWithThisAsFirstArgument {
        name: String,
        generate_code: bool,
        expand_params: bool,
    },
    NotUsable,
}

impl MethodSemantics {
    pub fn normal(name: impl Into<String>) -> MethodSemantics {
        MethodSemantics::Normal {
            name: name.into(),
            generate_code: true,
            ignore_generic_arguments: false,
            expand_params: false,
            enumerate_as_array: false,
        }
    }

    /// The script name, for kinds that have one.
    pub fn script_name(&self) -> Option<&str> {
        match self {
            MethodSemantics::Normal { name, .. }
            | MethodSemantics::StaticMethodWithThisAsFirstArgument { name, .. } => Some(name),
            MethodSemantics::InlineCode { generated_method_name, .. } => {
                generated_method_name.as_deref()
            }
            _ => None,
        }
    }

    pub fn is_usable(&self) -> bool {
        !matches!(self, MethodSemantics::NotUsable)
    }

    pub fn expand_params(&self) -> bool {
        match self {
            MethodSemantics::Normal { expand_params, .. }
            | MethodSemantics::StaticMethodWithThisAsFirstArgument { expand_params, .. } => {
                *expand_params
            }
            _ => false,
        }
    }

    pub fn enumerate_as_array(&self) -> bool {
        match self {
            MethodSemantics::Normal { enumerate_as_array, .. }
            | MethodSemantics::InlineCode { enumerate_as_array, .. } => *enumerate_as_array,
            _ => false,
        }
    }
}

/// Target of a record-constructor parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberRef {
    Property(PropertyId),
    Field(FieldId),
}

/// Constructor record.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstructorSemantics {
    /// The type's anonymous constructor.
    Unnamed { generate_code: bool, expand_params: bool, skip_in_initializer: bool },
    Named {
        name: String,
        generate_code: bool,
        expand_params: bool,
        skip_in_initializer: bool,
    },
    /// Invoked as a plain static method rather than with `new`.
    StaticMethod {
        name: String,
        generate_code: bool,
        expand_params: bool,
        skip_in_initializer: bool,
    },
    InlineCode { code: String, skip_in_initializer: bool },
    /// Builds an object literal; each parameter maps onto one member of the
    /// declaring type.
    Json { parameter_to_member: Vec<MemberRef>, skip_in_initializer: bool },
    NotUsable,
}

impl ConstructorSemantics {
    pub fn unnamed() -> ConstructorSemantics {
        ConstructorSemantics::Unnamed {
            generate_code: true,
            expand_params: false,
            skip_in_initializer: false,
        }
    }

    pub fn script_name(&self) -> Option<&str> {
        match self {
            ConstructorSemantics::Named { name, .. }
            | ConstructorSemantics::StaticMethod { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn is_usable(&self) -> bool {
        !matches!(self, ConstructorSemantics::NotUsable)
    }
}

/// Property record. The accessor records stored for the getter and setter
/// methods always agree with the arms here.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertySemantics {
    GetAndSetMethods {
        get: Option<Box<MethodSemantics>>,
        set: Option<Box<MethodSemantics>>,
    },
    Field { name: String },
    NotUsable,
}

/// Event record, parallel to [`PropertySemantics`].
#[derive(Debug, Clone, PartialEq)]
pub enum EventSemantics {
    AddAndRemoveMethods {
        add: Option<Box<MethodSemantics>>,
        remove: Option<Box<MethodSemantics>>,
    },
    NotUsable,
}

/// Field record. A constant whose `name` is `None` is substituted inline at
/// every use.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldSemantics {
    Field { name: String },
    BooleanConstant { value: bool, name: Option<String> },
    NumericConstant { value: f64, name: Option<String> },
    StringConstant { value: String, name: Option<String> },
    NullConstant { name: Option<String> },
    NotUsable,
}

impl FieldSemantics {
    pub fn script_name(&self) -> Option<&str> {
        match self {
            FieldSemantics::Field { name } => Some(name),
            FieldSemantics::BooleanConstant { name, .. }
            | FieldSemantics::NumericConstant { name, .. }
            | FieldSemantics::StringConstant { name, .. }
            | FieldSemantics::NullConstant { name } => name.as_deref(),
            FieldSemantics::NotUsable => None,
        }
    }
}
