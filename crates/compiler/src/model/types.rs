//! Type definitions and type references.

use super::attributes::AttributeSet;
use crate::diag::Region;

macro_rules! id_type {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u32);

        impl $name {
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }
    };
}

id_type!(
    /// Handle for a type definition.
    TypeId
);
id_type!(
    /// Handle for a method or constructor.
    MethodId
);
id_type!(
    /// Handle for a property.
    PropertyId
);
id_type!(
    /// Handle for an event.
    EventId
);
id_type!(
    /// Handle for a field.
    FieldId
);
id_type!(
    /// Handle for a referenced assembly.
    AssemblyId
);

/// Kind of a type definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Class,
    Interface,
    Struct,
    Enum,
    Delegate,
}

/// Owner of a type parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeParamOwner {
    Type(TypeId),
    Method(MethodId),
}

/// A use of a type parameter, identified by owner and declaration index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeParamRef {
    pub owner: TypeParamOwner,
    pub index: u32,
}

/// A use of a type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    /// A (possibly open generic) type definition.
    Def(TypeId),
    /// A closed generic instantiation.
    Inst { def: TypeId, args: Vec<TypeRef> },
    Param(TypeParamRef),
    Array { element: Box<TypeRef>, rank: u32 },
    Nullable(Box<TypeRef>),
    Dynamic,
}

impl TypeRef {
    pub fn inst(def: TypeId, args: Vec<TypeRef>) -> TypeRef {
        TypeRef::Inst { def, args }
    }

    pub fn array(element: TypeRef) -> TypeRef {
        TypeRef::Array { element: Box::new(element), rank: 1 }
    }

    pub fn nullable(inner: TypeRef) -> TypeRef {
        TypeRef::Nullable(Box::new(inner))
    }

    /// The definition a reference names, if any.
    pub fn definition(&self) -> Option<TypeId> {
        match self {
            TypeRef::Def(id) => Some(*id),
            TypeRef::Inst { def, .. } => Some(*def),
            _ => None,
        }
    }

    pub fn is_nullable(&self) -> bool {
        matches!(self, TypeRef::Nullable(_))
    }
}

/// A type definition.
///
/// `type_params` lists the parameters of enclosing types first, then the
/// type's own, matching source declaration order.
#[derive(Debug, Clone)]
pub struct TypeDef {
    pub name: String,
    pub namespace: String,
    pub assembly: AssemblyId,
    pub kind: TypeKind,
    pub declaring_type: Option<TypeId>,
    pub type_params: Vec<String>,
    pub base_class: Option<TypeId>,
    pub interfaces: Vec<TypeId>,
    pub methods: Vec<MethodId>,
    pub properties: Vec<PropertyId>,
    pub events: Vec<EventId>,
    pub fields: Vec<FieldId>,
    pub is_public: bool,
    pub attributes: AttributeSet,
    pub region: Option<Region>,
}

impl TypeDef {
    pub fn new(kind: TypeKind, namespace: impl Into<String>, name: impl Into<String>) -> TypeDef {
        TypeDef {
            name: name.into(),
            namespace: namespace.into(),
            assembly: AssemblyId(0),
            kind,
            declaring_type: None,
            type_params: Vec::new(),
            base_class: None,
            interfaces: Vec::new(),
            methods: Vec::new(),
            properties: Vec::new(),
            events: Vec::new(),
            fields: Vec::new(),
            is_public: true,
            attributes: AttributeSet::new(),
            region: None,
        }
    }

    pub fn with_assembly(mut self, assembly: AssemblyId) -> TypeDef {
        self.assembly = assembly;
        self
    }

    pub fn with_declaring_type(mut self, declaring: TypeId) -> TypeDef {
        self.declaring_type = Some(declaring);
        self
    }

    pub fn with_type_params(mut self, params: Vec<&str>) -> TypeDef {
        self.type_params = params.into_iter().map(str::to_string).collect();
        self
    }

    pub fn with_base_class(mut self, base: TypeId) -> TypeDef {
        self.base_class = Some(base);
        self
    }

    pub fn with_interfaces(mut self, interfaces: Vec<TypeId>) -> TypeDef {
        self.interfaces = interfaces;
        self
    }

    pub fn with_attr(mut self, attr: super::Attr) -> TypeDef {
        self.attributes.push(attr);
        self
    }

    pub fn non_public(mut self) -> TypeDef {
        self.is_public = false;
        self
    }

    /// Number of type parameters introduced by this type itself, excluding
    /// slots inherited from enclosing types.
    pub fn own_type_param_count(&self, declaring_param_count: usize) -> usize {
        self.type_params.len().saturating_sub(declaring_param_count)
    }
}
