//! The arena-backed symbol graph.

use super::attributes::AttributeSet;
use super::members::{Event, Field, Method, Property};
use super::types::{AssemblyId, EventId, FieldId, MethodId, PropertyId, TypeDef, TypeId};

/// A referenced assembly.
#[derive(Debug, Clone)]
pub struct Assembly {
    pub name: String,
    pub attributes: AttributeSet,
}

impl Assembly {
    pub fn new(name: impl Into<String>) -> Assembly {
        Assembly { name: name.into(), attributes: AttributeSet::new() }
    }

    pub fn with_attr(mut self, attr: super::Attr) -> Assembly {
        self.attributes.push(attr);
        self
    }
}

/// Handles for types the core addresses directly. The driver resolves these
/// from the referenced runtime assembly before import.
#[derive(Debug, Clone, Copy, Default)]
pub struct KnownTypes {
    pub object: Option<TypeId>,
    pub string: Option<TypeId>,
    pub char: Option<TypeId>,
    pub int32: Option<TypeId>,
    pub script: Option<TypeId>,
    pub nullable: Option<TypeId>,
    pub exception: Option<TypeId>,
    pub task_completion_source: Option<TypeId>,
    pub array: Option<TypeId>,
    /// Base class that serializable records may inherit from.
    pub record_base: Option<TypeId>,
}

impl KnownTypes {
    fn require(id: Option<TypeId>, name: &str) -> TypeId {
        id.unwrap_or_else(|| panic!("internal error: known type `{name}` was not registered"))
    }

    pub fn object(&self) -> TypeId {
        Self::require(self.object, "Object")
    }

    pub fn script(&self) -> TypeId {
        Self::require(self.script, "Script")
    }

    pub fn nullable(&self) -> TypeId {
        Self::require(self.nullable, "Nullable")
    }

    pub fn int32(&self) -> TypeId {
        Self::require(self.int32, "Int32")
    }

    pub fn exception(&self) -> TypeId {
        Self::require(self.exception, "Exception")
    }

    pub fn task_completion_source(&self) -> TypeId {
        Self::require(self.task_completion_source, "TaskCompletionSource")
    }
}

/// The whole symbol graph for one compilation.
#[derive(Debug, Default)]
pub struct TypeModel {
    assemblies: Vec<Assembly>,
    types: Vec<TypeDef>,
    methods: Vec<Method>,
    properties: Vec<Property>,
    events: Vec<Event>,
    fields: Vec<Field>,
    pub known: KnownTypes,
}

impl TypeModel {
    pub fn new() -> TypeModel {
        TypeModel::default()
    }

    pub fn add_assembly(&mut self, assembly: Assembly) -> AssemblyId {
        self.assemblies.push(assembly);
        AssemblyId(self.assemblies.len() as u32 - 1)
    }

    pub fn add_type(&mut self, def: TypeDef) -> TypeId {
        let id = TypeId(self.types.len() as u32);
        self.types.push(def);
        id
    }

    /// Adds a method and registers it with its declaring type.
    pub fn add_method(&mut self, method: Method) -> MethodId {
        let id = MethodId(self.methods.len() as u32);
        let declaring = method.declaring_type;
        self.methods.push(method);
        self.types[declaring.index()].methods.push(id);
        id
    }

    pub fn add_property(&mut self, property: Property) -> PropertyId {
        let id = PropertyId(self.properties.len() as u32);
        let declaring = property.declaring_type;
        self.properties.push(property);
        self.types[declaring.index()].properties.push(id);
        id
    }

    pub fn add_event(&mut self, event: Event) -> EventId {
        let id = EventId(self.events.len() as u32);
        let declaring = event.declaring_type;
        self.events.push(event);
        self.types[declaring.index()].events.push(id);
        id
    }

    pub fn add_field(&mut self, field: Field) -> FieldId {
        let id = FieldId(self.fields.len() as u32);
        let declaring = field.declaring_type;
        self.fields.push(field);
        self.types[declaring.index()].fields.push(id);
        id
    }

    pub fn assembly(&self, id: AssemblyId) -> &Assembly {
        &self.assemblies[id.index()]
    }

    pub fn type_def(&self, id: TypeId) -> &TypeDef {
        &self.types[id.index()]
    }

    pub fn method(&self, id: MethodId) -> &Method {
        &self.methods[id.index()]
    }

    pub fn property(&self, id: PropertyId) -> &Property {
        &self.properties[id.index()]
    }

    pub fn event(&self, id: EventId) -> &Event {
        &self.events[id.index()]
    }

    pub fn field(&self, id: FieldId) -> &Field {
        &self.fields[id.index()]
    }

    pub fn type_ids(&self) -> impl Iterator<Item = TypeId> {
        (0..self.types.len() as u32).map(TypeId)
    }

    /// Dotted source name, for messages.
    pub fn full_name(&self, id: TypeId) -> String {
        let def = self.type_def(id);
        if let Some(declaring) = def.declaring_type {
            format!("{}.{}", self.full_name(declaring), def.name)
        } else if def.namespace.is_empty() {
            def.name.clone()
        } else {
            format!("{}.{}", def.namespace, def.name)
        }
    }

    /// All base types, transitively: the base-class chain and every base
    /// interface, nearest first, without duplicates.
    pub fn all_base_types(&self, id: TypeId) -> Vec<TypeId> {
        let mut result = Vec::new();
        let mut queue = Vec::new();
        let def = self.type_def(id);
        queue.extend(def.base_class);
        queue.extend(def.interfaces.iter().copied());
        while let Some(base) = queue.pop() {
            if result.contains(&base) {
                continue;
            }
            result.push(base);
            let base_def = self.type_def(base);
            queue.extend(base_def.base_class);
            queue.extend(base_def.interfaces.iter().copied());
        }
        result
    }

    /// Direct base types: base class (if any) first, then interfaces.
    pub fn direct_base_types(&self, id: TypeId) -> Vec<TypeId> {
        let def = self.type_def(id);
        let mut result = Vec::new();
        result.extend(def.base_class);
        result.extend(def.interfaces.iter().copied());
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TypeKind;

    #[test]
    fn test_all_base_types_deduplicates() {
        let mut model = TypeModel::new();
        model.add_assembly(Assembly::new("lib"));
        let root = model.add_type(TypeDef::new(TypeKind::Interface, "", "IRoot"));
        let a = model.add_type(
            TypeDef::new(TypeKind::Interface, "", "IA").with_interfaces(vec![root]),
        );
        let b = model.add_type(
            TypeDef::new(TypeKind::Interface, "", "IB").with_interfaces(vec![root]),
        );
        let c = model.add_type(
            TypeDef::new(TypeKind::Class, "", "C").with_interfaces(vec![a, b]),
        );
        let bases = model.all_base_types(c);
        assert_eq!(bases.iter().filter(|&&t| t == root).count(), 1);
        assert_eq!(bases.len(), 3);
    }
}
