//! The metadata importer: a deterministic naming and semantics oracle.
//!
//! For every type and member reachable from the compilation the importer
//! decides how it appears in the output script and records that decision as
//! an immutable semantic record. Records are created in two passes per type
//! (type-level, then members), in inheritance order; lookups for symbols that
//! were never prepared are internal errors and panic.

use super::semantics::{
    ConstructorSemantics, DelegateSemantics, EventSemantics, FieldSemantics, MethodSemantics,
    PropertySemantics, TypeImplKind, TypeSemantics,
};
use crate::diag::{DiagnosticCode, DiagnosticCollector, Region};
use crate::import::reserved::{is_reserved, is_valid_dotted_identifier, is_valid_identifier};
use crate::model::{
    AssemblyId, EventId, FieldId, MethodId, PropertyId, TypeDef, TypeId, TypeKind, TypeModel,
    TypeParamOwner, TypeParamRef,
};
use crate::options::CompilerOptions;
use indexmap::IndexMap;
use reef_script::ScriptTypeId;
use std::collections::{HashMap, HashSet};

/// Identity of any member, for the ignored-members set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(super) enum MemberKey {
    Method(MethodId),
    Property(PropertyId),
    Event(EventId),
    Field(FieldId),
}

/// The importer. Owns every semantic-record table for one compilation.
pub struct MetadataImporter<'a> {
    pub(super) model: &'a TypeModel,
    pub(super) options: &'a CompilerOptions,
    pub(super) diagnostics: DiagnosticCollector,

    pub(super) type_semantics: IndexMap<TypeId, TypeSemantics>,
    pub(super) delegate_semantics: IndexMap<TypeId, DelegateSemantics>,
    pub(super) method_semantics: IndexMap<MethodId, MethodSemantics>,
    pub(super) constructor_semantics: IndexMap<MethodId, ConstructorSemantics>,
    pub(super) property_semantics: IndexMap<PropertyId, PropertySemantics>,
    pub(super) event_semantics: IndexMap<EventId, EventSemantics>,
    pub(super) field_semantics: IndexMap<FieldId, FieldSemantics>,
    pub(super) type_param_names: IndexMap<TypeParamRef, String>,

    pub(super) instance_names: HashMap<TypeId, HashSet<String>>,
    pub(super) static_names: HashMap<TypeId, HashSet<String>>,
    pub(super) minimized_type_index: HashMap<(AssemblyId, String), u32>,
    pub(super) backing_field_counters: HashMap<TypeId, u32>,
    pub(super) property_backing_names: IndexMap<PropertyId, String>,
    pub(super) event_backing_names: IndexMap<EventId, String>,
    pub(super) unnamed_ctor_counts: HashMap<TypeId, u32>,
    pub(super) ignored_members: HashSet<MemberKey>,
    pub(super) prepared: HashSet<TypeId>,
}

impl<'a> MetadataImporter<'a> {
    pub fn new(model: &'a TypeModel, options: &'a CompilerOptions) -> MetadataImporter<'a> {
        MetadataImporter {
            model,
            options,
            diagnostics: DiagnosticCollector::new(),
            type_semantics: IndexMap::new(),
            delegate_semantics: IndexMap::new(),
            method_semantics: IndexMap::new(),
            constructor_semantics: IndexMap::new(),
            property_semantics: IndexMap::new(),
            event_semantics: IndexMap::new(),
            field_semantics: IndexMap::new(),
            type_param_names: IndexMap::new(),
            instance_names: HashMap::new(),
            static_names: HashMap::new(),
            minimized_type_index: HashMap::new(),
            backing_field_counters: HashMap::new(),
            property_backing_names: IndexMap::new(),
            event_backing_names: IndexMap::new(),
            unnamed_ctor_counts: HashMap::new(),
            ignored_members: HashSet::new(),
            prepared: HashSet::new(),
        }
    }

    pub fn diagnostics(&self) -> &DiagnosticCollector {
        &self.diagnostics
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.has_errors()
    }

    pub(super) fn report(
        &mut self,
        code: DiagnosticCode,
        region: Option<&Region>,
        message: String,
    ) {
        self.diagnostics.report(code, region.cloned(), message);
    }

    // ----- lifecycle -------------------------------------------------------

    /// Populate the type-level and member records for one type. All base
    /// types and the declaring type must have been prepared first.
    pub fn prepare(&mut self, id: TypeId) {
        if self.prepared.contains(&id) {
            return;
        }
        if let Some(declaring) = self.model.type_def(id).declaring_type {
            assert!(
                self.prepared.contains(&declaring),
                "internal error: declaring type of `{}` was not prepared first",
                self.model.full_name(id)
            );
        }
        for base in self.model.direct_base_types(id) {
            assert!(
                self.prepared.contains(&base),
                "internal error: base type `{}` of `{}` was not prepared first",
                self.model.full_name(base),
                self.model.full_name(id)
            );
        }
        self.process_type(id);
        self.process_members(id);
        self.prepared.insert(id);
    }

    /// Prepare every type in the model, in inheritance order.
    pub fn prepare_all(&mut self) {
        let all: Vec<TypeId> = self.model.type_ids().collect();
        let mut remaining: Vec<TypeId> = all;
        while !remaining.is_empty() {
            let mut next = Vec::new();
            let before = remaining.len();
            for id in remaining {
                let def = self.model.type_def(id);
                let ready = def
                    .declaring_type
                    .map_or(true, |d| self.prepared.contains(&d))
                    && self
                        .model
                        .direct_base_types(id)
                        .iter()
                        .all(|b| self.prepared.contains(b));
                if ready {
                    self.prepare(id);
                } else {
                    next.push(id);
                }
            }
            assert!(
                next.len() < before,
                "internal error: inheritance graph contains a cycle"
            );
            remaining = next;
        }
    }

    // ----- lookups ---------------------------------------------------------

    pub fn get_type_semantics(&self, id: TypeId) -> &TypeSemantics {
        self.type_semantics.get(&id).unwrap_or_else(|| {
            panic!(
                "internal error: type `{}` has not been imported",
                self.model.full_name(id)
            )
        })
    }

    pub fn get_delegate_semantics(&self, id: TypeId) -> &DelegateSemantics {
        self.delegate_semantics.get(&id).unwrap_or_else(|| {
            panic!(
                "internal error: delegate `{}` has not been imported",
                self.model.full_name(id)
            )
        })
    }

    pub fn get_method_semantics(&self, id: MethodId) -> &MethodSemantics {
        self.method_semantics.get(&id).unwrap_or_else(|| {
            panic!(
                "internal error: method `{}` has not been imported",
                self.model.method(id).name
            )
        })
    }

    pub fn get_constructor_semantics(&self, id: MethodId) -> &ConstructorSemantics {
        self.constructor_semantics.get(&id).unwrap_or_else(|| {
            panic!(
                "internal error: constructor of `{}` has not been imported",
                self.model.full_name(self.model.method(id).declaring_type)
            )
        })
    }

    pub fn get_property_semantics(&self, id: PropertyId) -> &PropertySemantics {
        self.property_semantics.get(&id).unwrap_or_else(|| {
            panic!(
                "internal error: property `{}` has not been imported",
                self.model.property(id).name
            )
        })
    }

    pub fn get_event_semantics(&self, id: EventId) -> &EventSemantics {
        self.event_semantics.get(&id).unwrap_or_else(|| {
            panic!(
                "internal error: event `{}` has not been imported",
                self.model.event(id).name
            )
        })
    }

    pub fn get_field_semantics(&self, id: FieldId) -> &FieldSemantics {
        self.field_semantics.get(&id).unwrap_or_else(|| {
            panic!(
                "internal error: field `{}` has not been imported",
                self.model.field(id).name
            )
        })
    }

    pub fn get_type_parameter_name(&self, param: TypeParamRef) -> &str {
        self.type_param_names.get(&param).unwrap_or_else(|| {
            panic!("internal error: type parameter {param:?} has not been imported")
        })
    }

    // ----- backing fields --------------------------------------------------

    pub fn get_auto_property_backing_field_name(&mut self, id: PropertyId) -> String {
        if let Some(name) = self.property_backing_names.get(&id) {
            return name.clone();
        }
        let declaring = self.model.property(id).declaring_type;
        let name = self.next_backing_field_name(declaring);
        self.property_backing_names.insert(id, name.clone());
        name
    }

    pub fn get_auto_event_backing_field_name(&mut self, id: EventId) -> String {
        if let Some(name) = self.event_backing_names.get(&id) {
            return name.clone();
        }
        let declaring = self.model.event(id).declaring_type;
        let name = self.next_backing_field_name(declaring);
        self.event_backing_names.insert(id, name.clone());
        name
    }

    fn next_backing_field_name(&mut self, declaring: TypeId) -> String {
        let counter = self.backing_field_counters.entry(declaring).or_insert(0);
        *counter += 1;
        let name = format!("${}", *counter);
        self.reserve_member_name(declaring, &name, false);
        name
    }

    // ----- name reservation ------------------------------------------------

    /// Record `name` as taken on `ty`, cooperatively with plugins.
    pub fn reserve_member_name(&mut self, ty: TypeId, name: &str, is_static: bool) {
        let table = if is_static { &mut self.static_names } else { &mut self.instance_names };
        table.entry(ty).or_default().insert(name.to_string());
    }

    /// True when `name` can still be chosen for a member of `ty`. Instance
    /// names must also be free in every base type.
    pub fn is_member_name_available(&self, ty: TypeId, name: &str, is_static: bool) -> bool {
        if is_reserved(name, is_static) {
            return false;
        }
        if is_static {
            !self
                .static_names
                .get(&ty)
                .is_some_and(|names| names.contains(name))
        } else {
            if self
                .instance_names
                .get(&ty)
                .is_some_and(|names| names.contains(name))
            {
                return false;
            }
            !self.model.all_base_types(ty).iter().any(|base| {
                self.instance_names
                    .get(base)
                    .is_some_and(|names| names.contains(name))
            })
        }
    }

    // ----- authoritative overrides ----------------------------------------

    pub fn set_method_semantics(&mut self, id: MethodId, semantics: MethodSemantics) {
        self.ignored_members.insert(MemberKey::Method(id));
        self.method_semantics.insert(id, semantics);
    }

    pub fn set_constructor_semantics(&mut self, id: MethodId, semantics: ConstructorSemantics) {
        self.ignored_members.insert(MemberKey::Method(id));
        self.constructor_semantics.insert(id, semantics);
    }

    pub fn set_property_semantics(&mut self, id: PropertyId, semantics: PropertySemantics) {
        self.ignored_members.insert(MemberKey::Property(id));
        self.property_semantics.insert(id, semantics);
    }

    pub fn set_event_semantics(&mut self, id: EventId, semantics: EventSemantics) {
        self.ignored_members.insert(MemberKey::Event(id));
        self.event_semantics.insert(id, semantics);
    }

    pub fn set_field_semantics(&mut self, id: FieldId, semantics: FieldSemantics) {
        self.ignored_members.insert(MemberKey::Field(id));
        self.field_semantics.insert(id, semantics);
    }

    // ----- type-level processing ------------------------------------------

    fn process_type(&mut self, id: TypeId) {
        let model = self.model;
        let def = model.type_def(id);

        if def.kind == TypeKind::Delegate {
            self.delegate_semantics.insert(
                id,
                DelegateSemantics {
                    expand_params: def.attributes.has_expand_params(),
                    bind_this_to_first_parameter: def
                        .attributes
                        .has_bind_this_to_first_parameter(),
                },
            );
            // delegate values are plain script functions
            self.type_semantics.insert(
                id,
                TypeSemantics {
                    kind: TypeImplKind::Normal,
                    name: "Function".to_string(),
                    ignore_generic_arguments: true,
                    generate_code: false,
                    is_serializable: false,
                    is_named_values: false,
                    is_imported: true,
                    obeys_type_system: true,
                },
            );
            return;
        }

        let declaring_unusable = def
            .declaring_type
            .is_some_and(|d| !self.get_type_semantics(d).is_usable());
        if declaring_unusable || def.attributes.has_non_scriptable() {
            self.type_semantics.insert(
                id,
                TypeSemantics {
                    kind: TypeImplKind::NotUsable,
                    name: def.name.clone(),
                    ignore_generic_arguments: false,
                    generate_code: false,
                    is_serializable: false,
                    is_named_values: false,
                    is_imported: false,
                    obeys_type_system: true,
                },
            );
            return;
        }

        let assembly = model.assembly(def.assembly);
        let include = def
            .attributes
            .include_generic_arguments()
            .or_else(|| assembly.attributes.include_generic_arguments());
        let ignore_generic_arguments = match include {
            Some(include) => !include,
            None => {
                if !def.type_params.is_empty() {
                    self.report(
                        DiagnosticCode::E7006,
                        def.region.as_ref(),
                        format!(
                            "the generic type `{}` does not specify how its type arguments \
                             are handled; they will be included",
                            model.full_name(id)
                        ),
                    );
                }
                false
            }
        };

        let imported = def.attributes.imported();
        let is_serializable = def.attributes.has_serializable();
        let is_named_values = def.kind == TypeKind::Enum && def.attributes.has_named_values();

        let name = self.determine_type_script_name(id, def, ignore_generic_arguments);

        if is_serializable {
            self.validate_serializable_type(id, def);
        }

        self.reserve_type_parameter_names(id, def);

        self.type_semantics.insert(
            id,
            TypeSemantics {
                kind: TypeImplKind::Normal,
                name,
                ignore_generic_arguments,
                generate_code: imported.is_none(),
                is_serializable,
                is_named_values,
                is_imported: imported.is_some(),
                obeys_type_system: imported.unwrap_or(true),
            },
        );
    }

    fn determine_type_script_name(
        &mut self,
        id: TypeId,
        def: &TypeDef,
        ignore_generic_arguments: bool,
    ) -> String {
        let model = self.model;

        if def.attributes.mixin().is_some() || def.attributes.has_global_methods() {
            self.validate_global_type(id, def);
            return String::new();
        }

        let name = match def.attributes.script_name() {
            Some(explicit) if is_valid_identifier(explicit) => explicit.to_string(),
            Some(explicit) => {
                self.report(
                    DiagnosticCode::E7001,
                    def.region.as_ref(),
                    format!(
                        "`{}` is not a valid script name for type `{}`",
                        explicit,
                        model.full_name(id)
                    ),
                );
                self.default_type_name(def, ignore_generic_arguments)
            }
            None => self.default_type_name(def, ignore_generic_arguments),
        };

        if let Some(outer) = def.declaring_type {
            if def.attributes.script_namespace().is_some() || def.attributes.has_ignore_namespace()
            {
                self.report(
                    DiagnosticCode::E7003,
                    def.region.as_ref(),
                    format!(
                        "the nested type `{}` cannot carry a namespace attribute",
                        model.full_name(id)
                    ),
                );
            }
            let outer_name = self.get_type_semantics(outer).name.clone();
            return if outer_name.is_empty() {
                name
            } else {
                format!("{outer_name}${name}")
            };
        }

        let namespace = self.determine_script_namespace(id, def);
        if namespace.is_empty() {
            name
        } else {
            format!("{namespace}.{name}")
        }
    }

    fn default_type_name(&mut self, def: &TypeDef, ignore_generic_arguments: bool) -> String {
        if self.minimize_type(def) {
            let key = (def.assembly, def.namespace.clone());
            let counter = self.minimized_type_index.entry(key).or_insert(0);
            let name = format!("${}", *counter);
            *counter += 1;
            return name;
        }
        let declaring_params = def
            .declaring_type
            .map_or(0, |d| self.model.type_def(d).type_params.len());
        let own_params = def.own_type_param_count(declaring_params);
        if own_params > 0 && !ignore_generic_arguments {
            format!("{}${}", def.name, own_params)
        } else {
            def.name.clone()
        }
    }

    fn determine_script_namespace(&mut self, id: TypeId, def: &TypeDef) -> String {
        let explicit = def.attributes.script_namespace();
        let ignore = def.attributes.has_ignore_namespace();
        if explicit.is_some() && ignore {
            self.report(
                DiagnosticCode::E7002,
                def.region.as_ref(),
                format!(
                    "type `{}` carries conflicting namespace attributes",
                    self.model.full_name(id)
                ),
            );
        }
        if let Some(namespace) = explicit {
            if namespace.is_empty() || is_valid_dotted_identifier(namespace) {
                return namespace.to_string();
            }
            self.report(
                DiagnosticCode::E7007,
                def.region.as_ref(),
                format!(
                    "`{}` is not a valid script namespace for type `{}`",
                    namespace,
                    self.model.full_name(id)
                ),
            );
            return def.namespace.clone();
        }
        if ignore {
            return String::new();
        }
        if let Some(namespace) = self.model.assembly(def.assembly).attributes.script_namespace() {
            return namespace.to_string();
        }
        def.namespace.clone()
    }

    fn validate_global_type(&mut self, id: TypeId, def: &TypeDef) {
        let model = self.model;
        let accessors = self.accessor_method_set(def);
        let all_static = def
            .methods
            .iter()
            .filter(|m| !accessors.contains(m))
            .all(|&m| {
                let method = model.method(m);
                method.is_static || method.is_constructor
            })
            && def.properties.iter().all(|&p| model.property(p).is_static)
            && def.fields.iter().all(|&f| model.field(f).is_static)
            && def.events.iter().all(|&e| model.event(e).is_static);
        if !all_static {
            let code = if def.attributes.mixin().is_some() {
                DiagnosticCode::E7004
            } else {
                DiagnosticCode::E7005
            };
            self.report(
                code,
                def.region.as_ref(),
                format!(
                    "the globally exposed type `{}` may only contain static members",
                    model.full_name(id)
                ),
            );
        }
    }

    fn validate_serializable_type(&mut self, id: TypeId, def: &TypeDef) {
        let model = self.model;
        let full_name = model.full_name(id);

        if let Some(base) = def.base_class {
            let base_ok = Some(base) == model.known.object
                || Some(base) == model.known.record_base
                || self.get_type_semantics(base).is_serializable;
            if !base_ok {
                self.report(
                    DiagnosticCode::E7101,
                    def.region.as_ref(),
                    format!(
                        "the serializable type `{}` must inherit from another serializable \
                         type or the root object type",
                        full_name
                    ),
                );
            }
        }
        for &iface in &def.interfaces {
            if !self.get_type_semantics(iface).is_serializable {
                self.report(
                    DiagnosticCode::E7102,
                    def.region.as_ref(),
                    format!(
                        "the serializable type `{}` cannot implement the non-serializable \
                         interface `{}`",
                        full_name,
                        model.full_name(iface)
                    ),
                );
            }
        }
        for &event in &def.events {
            if !model.event(event).is_static {
                self.report(
                    DiagnosticCode::E7103,
                    model.event(event).region.as_ref(),
                    format!(
                        "the serializable type `{}` cannot declare the instance event `{}`",
                        full_name,
                        model.event(event).name
                    ),
                );
            }
        }

        let accessors = self.accessor_method_set(def);
        for &method in def.methods.iter().filter(|m| !accessors.contains(m)) {
            let method = model.method(method);
            if !method.is_constructor && (method.is_virtual || method.is_override) {
                self.report(
                    DiagnosticCode::E7104,
                    method.region.as_ref(),
                    format!(
                        "the serializable type `{}` cannot declare the virtual or overriding \
                         member `{}`",
                        full_name, method.name
                    ),
                );
            }
        }
        for &property in &def.properties {
            let property = model.property(property);
            if property.is_virtual || property.is_override {
                self.report(
                    DiagnosticCode::E7104,
                    property.region.as_ref(),
                    format!(
                        "the serializable type `{}` cannot declare the virtual or overriding \
                         member `{}`",
                        full_name, property.name
                    ),
                );
            }
        }
        if def.kind == TypeKind::Interface {
            for &method in def.methods.iter().filter(|m| !accessors.contains(m)) {
                let method = model.method(method);
                if !method.is_static && !method.is_constructor {
                    self.report(
                        DiagnosticCode::E7105,
                        method.region.as_ref(),
                        format!(
                            "the serializable interface `{}` cannot declare the instance \
                             method `{}`",
                            full_name, method.name
                        ),
                    );
                }
            }
        }
    }

    fn reserve_type_parameter_names(&mut self, id: TypeId, def: &TypeDef) {
        for (index, param) in def.type_params.iter().enumerate() {
            let name = if self.options.minimize_names {
                format!("${}", index + 1)
            } else {
                param.clone()
            };
            self.type_param_names.insert(
                TypeParamRef { owner: TypeParamOwner::Type(id), index: index as u32 },
                name.clone(),
            );
            self.reserve_member_name(id, &name, false);
            self.reserve_member_name(id, &name, true);
        }
    }

    // ----- shared helpers --------------------------------------------------

    pub(super) fn minimize_type(&self, def: &TypeDef) -> bool {
        self.options.minimize_names && (!def.is_public || self.options.minimize_public_names)
    }

    pub(super) fn minimize_member(&self, member_public: bool, def: &TypeDef) -> bool {
        self.options.minimize_names
            && (!(member_public && def.is_public) || self.options.minimize_public_names)
    }

    /// Ids of property and event accessor methods, which are processed with
    /// their owning member rather than as plain methods.
    pub(super) fn accessor_method_set(&self, def: &TypeDef) -> HashSet<MethodId> {
        let model = self.model;
        let mut accessors = HashSet::new();
        for &p in &def.properties {
            let property = model.property(p);
            accessors.extend(property.getter);
            accessors.extend(property.setter);
        }
        for &e in &def.events {
            let event = model.event(e);
            accessors.extend(event.adder);
            accessors.extend(event.remover);
        }
        accessors
    }
}

impl reef_script::TypeNameResolver for MetadataImporter<'_> {
    fn resolve(&self, id: ScriptTypeId) -> String {
        self.get_type_semantics(TypeId(id.0)).name.clone()
    }
}

/// The deferred-resolution token for a type definition.
pub fn script_type_id(id: TypeId) -> ScriptTypeId {
    ScriptTypeId(id.0)
}
