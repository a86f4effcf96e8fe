//! Typed attribute payloads and the name-indexed lookup over them.
//!
//! Attributes arrive from referenced assemblies as side-channel metadata; the
//! payload structs carry only the fields the import rules consult.

/// Payload of an inline-code attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineCodeAttr {
    pub code: String,
    /// Variant used for non-virtual (base) invocations.
    pub non_virtual_code: Option<String>,
    /// When set, a real method with this name is generated alongside the
    /// inline expansion, and overrides dispatch to it.
    pub generated_method_name: Option<String>,
}

/// One attribute with its typed payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Attr {
    ScriptName(String),
    PreserveCase,
    /// Assembly- or type-scoped: keep member casing as written.
    PreserveMemberCase,
    ScriptNamespace(String),
    IgnoreNamespace,
    NonScriptable,
    Imported { obeys_type_system: bool },
    Serializable,
    /// The payload is the expression members attach to, e.g. `"$.fn"`.
    Mixin(Option<String>),
    GlobalMethods,
    NamedValues,
    IncludeGenericArguments(bool),
    InlineCode(InlineCodeAttr),
    ScriptSkip,
    ScriptAlias(String),
    InstanceMethodOnFirstArgument,
    IntrinsicProperty,
    IntrinsicOperator,
    EnumerateAsArray,
    ExpandParams,
    BindThisToFirstParameter,
    ObjectLiteral,
    AlternateSignature,
    /// The constant's value is substituted at every use; the field itself
    /// gets no name.
    InlineConstant,
}

/// Attribute list with typed finders.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeSet {
    attrs: Vec<Attr>,
}

impl AttributeSet {
    pub fn new() -> AttributeSet {
        AttributeSet::default()
    }

    pub fn of(attrs: Vec<Attr>) -> AttributeSet {
        AttributeSet { attrs }
    }

    pub fn push(&mut self, attr: Attr) {
        self.attrs.push(attr);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Attr> {
        self.attrs.iter()
    }

    pub fn script_name(&self) -> Option<&str> {
        self.attrs.iter().find_map(|a| match a {
            Attr::ScriptName(name) => Some(name.as_str()),
            _ => None,
        })
    }

    pub fn has_preserve_case(&self) -> bool {
        self.attrs.iter().any(|a| matches!(a, Attr::PreserveCase))
    }

    pub fn has_preserve_member_case(&self) -> bool {
        self.attrs.iter().any(|a| matches!(a, Attr::PreserveMemberCase))
    }

    pub fn script_namespace(&self) -> Option<&str> {
        self.attrs.iter().find_map(|a| match a {
            Attr::ScriptNamespace(ns) => Some(ns.as_str()),
            _ => None,
        })
    }

    pub fn has_ignore_namespace(&self) -> bool {
        self.attrs.iter().any(|a| matches!(a, Attr::IgnoreNamespace))
    }

    pub fn has_non_scriptable(&self) -> bool {
        self.attrs.iter().any(|a| matches!(a, Attr::NonScriptable))
    }

    /// `Some(obeys_type_system)` when the imported attribute is present.
    pub fn imported(&self) -> Option<bool> {
        self.attrs.iter().find_map(|a| match a {
            Attr::Imported { obeys_type_system } => Some(*obeys_type_system),
            _ => None,
        })
    }

    pub fn has_serializable(&self) -> bool {
        self.attrs.iter().any(|a| matches!(a, Attr::Serializable))
    }

    pub fn mixin(&self) -> Option<Option<&str>> {
        self.attrs.iter().find_map(|a| match a {
            Attr::Mixin(expr) => Some(expr.as_deref()),
            _ => None,
        })
    }

    pub fn has_global_methods(&self) -> bool {
        self.attrs.iter().any(|a| matches!(a, Attr::GlobalMethods))
    }

    pub fn has_named_values(&self) -> bool {
        self.attrs.iter().any(|a| matches!(a, Attr::NamedValues))
    }

    pub fn include_generic_arguments(&self) -> Option<bool> {
        self.attrs.iter().find_map(|a| match a {
            Attr::IncludeGenericArguments(include) => Some(*include),
            _ => None,
        })
    }

    pub fn inline_code(&self) -> Option<&InlineCodeAttr> {
        self.attrs.iter().find_map(|a| match a {
            Attr::InlineCode(code) => Some(code),
            _ => None,
        })
    }

    pub fn has_script_skip(&self) -> bool {
        self.attrs.iter().any(|a| matches!(a, Attr::ScriptSkip))
    }

    pub fn script_alias(&self) -> Option<&str> {
        self.attrs.iter().find_map(|a| match a {
            Attr::ScriptAlias(alias) => Some(alias.as_str()),
            _ => None,
        })
    }

    pub fn has_instance_method_on_first_argument(&self) -> bool {
        self.attrs.iter().any(|a| matches!(a, Attr::InstanceMethodOnFirstArgument))
    }

    pub fn has_intrinsic_property(&self) -> bool {
        self.attrs.iter().any(|a| matches!(a, Attr::IntrinsicProperty))
    }

    pub fn has_intrinsic_operator(&self) -> bool {
        self.attrs.iter().any(|a| matches!(a, Attr::IntrinsicOperator))
    }

    pub fn has_enumerate_as_array(&self) -> bool {
        self.attrs.iter().any(|a| matches!(a, Attr::EnumerateAsArray))
    }

    pub fn has_expand_params(&self) -> bool {
        self.attrs.iter().any(|a| matches!(a, Attr::ExpandParams))
    }

    pub fn has_bind_this_to_first_parameter(&self) -> bool {
        self.attrs.iter().any(|a| matches!(a, Attr::BindThisToFirstParameter))
    }

    pub fn has_object_literal(&self) -> bool {
        self.attrs.iter().any(|a| matches!(a, Attr::ObjectLiteral))
    }

    pub fn has_alternate_signature(&self) -> bool {
        self.attrs.iter().any(|a| matches!(a, Attr::AlternateSignature))
    }

    pub fn has_inline_constant(&self) -> bool {
        self.attrs.iter().any(|a| matches!(a, Attr::InlineConstant))
    }
}
