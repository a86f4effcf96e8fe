//! Member definitions: methods, properties, events, fields.

use super::attributes::AttributeSet;
use super::types::{MethodId, PropertyId, TypeId, TypeRef};
use crate::diag::Region;

/// A compile-time constant value.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstValue {
    Boolean(bool),
    Number(f64),
    String(String),
    Null,
}

/// A method parameter.
#[derive(Debug, Clone)]
pub struct Param {
    pub name: String,
    pub ty: TypeRef,
    pub is_params: bool,
    pub is_by_ref: bool,
    pub is_out: bool,
}

impl Param {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Param {
        Param { name: name.into(), ty, is_params: false, is_by_ref: false, is_out: false }
    }

    pub fn params_array(mut self) -> Param {
        self.is_params = true;
        self
    }
}

/// A method or constructor definition.
#[derive(Debug, Clone)]
pub struct Method {
    pub name: String,
    pub declaring_type: TypeId,
    pub params: Vec<Param>,
    pub return_type: Option<TypeRef>,
    pub type_params: Vec<String>,
    pub is_static: bool,
    pub is_constructor: bool,
    /// Overridable: declared virtual or abstract, or an interface member.
    pub is_virtual: bool,
    pub is_override: bool,
    pub is_operator: bool,
    pub is_conversion_operator: bool,
    pub is_public: bool,
    pub is_explicit_interface_implementation: bool,
    /// Synthetic constructor that exists only so attributes can be attached
    /// to the default value-type constructor.
    pub is_placeholder_constructor: bool,
    pub overridden_method: Option<MethodId>,
    pub implemented_interface_methods: Vec<MethodId>,
    pub attributes: AttributeSet,
    pub region: Option<Region>,
}

impl Method {
    pub fn new(declaring_type: TypeId, name: impl Into<String>) -> Method {
        Method {
            name: name.into(),
            declaring_type,
            params: Vec::new(),
            return_type: None,
            type_params: Vec::new(),
            is_static: false,
            is_constructor: false,
            is_virtual: false,
            is_override: false,
            is_operator: false,
            is_conversion_operator: false,
            is_public: true,
            is_explicit_interface_implementation: false,
            is_placeholder_constructor: false,
            overridden_method: None,
            implemented_interface_methods: Vec::new(),
            attributes: AttributeSet::new(),
            region: None,
        }
    }

    pub fn constructor(declaring_type: TypeId) -> Method {
        let mut method = Method::new(declaring_type, ".ctor");
        method.is_constructor = true;
        method
    }

    pub fn with_params(mut self, params: Vec<Param>) -> Method {
        self.params = params;
        self
    }

    pub fn with_return_type(mut self, ty: TypeRef) -> Method {
        self.return_type = Some(ty);
        self
    }

    pub fn with_type_params(mut self, params: Vec<&str>) -> Method {
        self.type_params = params.into_iter().map(str::to_string).collect();
        self
    }

    pub fn with_attr(mut self, attr: super::Attr) -> Method {
        self.attributes.push(attr);
        self
    }

    pub fn static_(mut self) -> Method {
        self.is_static = true;
        self
    }

    pub fn virtual_(mut self) -> Method {
        self.is_virtual = true;
        self
    }

    pub fn overriding(mut self, base: MethodId) -> Method {
        self.is_override = true;
        self.is_virtual = true;
        self.overridden_method = Some(base);
        self
    }

    pub fn implementing(mut self, interface_methods: Vec<MethodId>) -> Method {
        self.implemented_interface_methods = interface_methods;
        self
    }

    pub fn non_public(mut self) -> Method {
        self.is_public = false;
        self
    }

    /// True when the last parameter is a params array.
    pub fn has_params_array(&self) -> bool {
        self.params.last().is_some_and(|p| p.is_params)
    }
}

/// A property definition. Indexer parameters are the getter's parameters.
#[derive(Debug, Clone)]
pub struct Property {
    pub name: String,
    pub declaring_type: TypeId,
    pub getter: Option<MethodId>,
    pub setter: Option<MethodId>,
    pub is_indexer: bool,
    pub index_param_count: usize,
    pub is_auto: bool,
    pub is_static: bool,
    pub is_virtual: bool,
    pub is_override: bool,
    pub is_public: bool,
    pub implemented_interface_properties: Vec<PropertyId>,
    pub attributes: AttributeSet,
    pub region: Option<Region>,
}

impl Property {
    pub fn new(declaring_type: TypeId, name: impl Into<String>) -> Property {
        Property {
            name: name.into(),
            declaring_type,
            getter: None,
            setter: None,
            is_indexer: false,
            index_param_count: 0,
            is_auto: false,
            is_static: false,
            is_virtual: false,
            is_override: false,
            is_public: true,
            implemented_interface_properties: Vec::new(),
            attributes: AttributeSet::new(),
            region: None,
        }
    }

    pub fn with_getter(mut self, getter: MethodId) -> Property {
        self.getter = Some(getter);
        self
    }

    pub fn with_setter(mut self, setter: MethodId) -> Property {
        self.setter = Some(setter);
        self
    }

    pub fn indexer(mut self, param_count: usize) -> Property {
        self.is_indexer = true;
        self.index_param_count = param_count;
        self
    }

    pub fn auto(mut self) -> Property {
        self.is_auto = true;
        self
    }

    pub fn static_(mut self) -> Property {
        self.is_static = true;
        self
    }

    pub fn with_attr(mut self, attr: super::Attr) -> Property {
        self.attributes.push(attr);
        self
    }
}

/// An event definition.
#[derive(Debug, Clone)]
pub struct Event {
    pub name: String,
    pub declaring_type: TypeId,
    pub adder: Option<MethodId>,
    pub remover: Option<MethodId>,
    pub is_auto: bool,
    pub is_static: bool,
    pub is_virtual: bool,
    pub is_override: bool,
    pub is_public: bool,
    pub attributes: AttributeSet,
    pub region: Option<Region>,
}

impl Event {
    pub fn new(declaring_type: TypeId, name: impl Into<String>) -> Event {
        Event {
            name: name.into(),
            declaring_type,
            adder: None,
            remover: None,
            is_auto: false,
            is_static: false,
            is_virtual: false,
            is_override: false,
            is_public: true,
            attributes: AttributeSet::new(),
            region: None,
        }
    }

    pub fn with_accessors(mut self, adder: MethodId, remover: MethodId) -> Event {
        self.adder = Some(adder);
        self.remover = Some(remover);
        self
    }

    pub fn auto(mut self) -> Event {
        self.is_auto = true;
        self
    }
}

/// A field definition.
#[derive(Debug, Clone)]
pub struct Field {
    pub name: String,
    pub declaring_type: TypeId,
    pub ty: TypeRef,
    pub is_const: bool,
    pub const_value: Option<ConstValue>,
    pub is_static: bool,
    pub is_public: bool,
    pub attributes: AttributeSet,
    pub region: Option<Region>,
}

impl Field {
    pub fn new(declaring_type: TypeId, name: impl Into<String>, ty: TypeRef) -> Field {
        Field {
            name: name.into(),
            declaring_type,
            ty,
            is_const: false,
            const_value: None,
            is_static: false,
            is_public: true,
            attributes: AttributeSet::new(),
            region: None,
        }
    }

    pub fn constant(mut self, value: ConstValue) -> Field {
        self.is_const = true;
        self.const_value = Some(value);
        self
    }

    pub fn static_(mut self) -> Field {
        self.is_static = true;
        self
    }

    pub fn with_attr(mut self, attr: super::Attr) -> Field {
        self.attributes.push(attr);
        self
    }
}
