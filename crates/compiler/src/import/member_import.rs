//! Member-level import: naming and semantics for methods, properties,
//! events, fields and constructors.
//!
//! Members are visited grouped by preferred script name, explicitly named
//! members first, then in a fixed kind and signature order, so that two runs
//! over the same model always produce identical records.

use super::importer::{MemberKey, MetadataImporter};
use super::inline_code::validate_template;
use super::naming::encode_minimized;
use super::reserved::{is_reserved, is_valid_identifier};
use super::semantics::{
    ConstructorSemantics, EventSemantics, FieldSemantics, MemberRef, MethodSemantics,
    PropertySemantics, TypeSemantics,
};
use crate::diag::{DiagnosticCode, Region};
use crate::model::{
    AttributeSet, ConstValue, EventId, FieldId, Method, MethodId, PropertyId, TypeDef, TypeId,
    TypeKind, TypeModel, TypeParamOwner, TypeParamRef, TypeRef,
};

struct MemberEntry {
    key: MemberKey,
    preferred: Option<String>,
    specified: bool,
    kind_rank: u8,
    source_name: String,
    signature_key: (usize, String, String, usize),
}

fn type_ref_sort_name(model: &TypeModel, ty: &TypeRef) -> String {
    match ty {
        TypeRef::Def(id) => model.full_name(*id),
        TypeRef::Inst { def, args } => {
            let args: Vec<String> = args.iter().map(|a| type_ref_sort_name(model, a)).collect();
            format!("{}<{}>", model.full_name(*def), args.join(","))
        }
        TypeRef::Param(p) => format!("#{}", p.index),
        TypeRef::Array { element, rank } => {
            format!("{}[{}]", type_ref_sort_name(model, element), rank)
        }
        TypeRef::Nullable(inner) => format!("{}?", type_ref_sort_name(model, inner)),
        TypeRef::Dynamic => "dynamic".to_string(),
    }
}

impl<'a> MetadataImporter<'a> {
    pub(super) fn process_members(&mut self, id: TypeId) {
        let model = self.model;
        let def = model.type_def(id);
        if def.kind == TypeKind::Delegate {
            return;
        }
        if !self.get_type_semantics(id).is_usable() {
            self.mark_members_not_usable(def);
            return;
        }

        for &method_id in &def.methods {
            if model.method(method_id).is_constructor
                && !self.ignored_members.contains(&MemberKey::Method(method_id))
            {
                self.process_constructor(method_id);
            }
        }

        let accessors = self.accessor_method_set(def);
        let mut entries: Vec<MemberEntry> = Vec::new();
        for &method_id in &def.methods {
            let method = model.method(method_id);
            if method.is_constructor || accessors.contains(&method_id) {
                continue;
            }
            let (preferred, specified) = self.preferred_member_name(
                &method.attributes,
                &method.name,
                method.is_public,
                def,
                method.region.as_ref(),
            );
            let param_names: Vec<String> = method
                .params
                .iter()
                .map(|p| type_ref_sort_name(model, &p.ty))
                .collect();
            let return_name = method
                .return_type
                .as_ref()
                .map(|t| type_ref_sort_name(model, t))
                .unwrap_or_default();
            entries.push(MemberEntry {
                key: MemberKey::Method(method_id),
                preferred,
                specified,
                kind_rank: 0,
                source_name: method.name.clone(),
                signature_key: (
                    method.params.len(),
                    param_names.join(","),
                    return_name,
                    method.type_params.len(),
                ),
            });
        }
        for &property_id in &def.properties {
            let property = model.property(property_id);
            let (preferred, specified) = self.preferred_member_name(
                &property.attributes,
                &property.name,
                property.is_public,
                def,
                property.region.as_ref(),
            );
            entries.push(MemberEntry {
                key: MemberKey::Property(property_id),
                preferred,
                specified,
                kind_rank: 1,
                source_name: property.name.clone(),
                signature_key: Default::default(),
            });
        }
        for &field_id in &def.fields {
            let field = model.field(field_id);
            let (preferred, specified) = self.preferred_member_name(
                &field.attributes,
                &field.name,
                field.is_public,
                def,
                field.region.as_ref(),
            );
            entries.push(MemberEntry {
                key: MemberKey::Field(field_id),
                preferred,
                specified,
                kind_rank: 2,
                source_name: field.name.clone(),
                signature_key: Default::default(),
            });
        }
        for &event_id in &def.events {
            let event = model.event(event_id);
            let (preferred, specified) = self.preferred_member_name(
                &event.attributes,
                &event.name,
                event.is_public,
                def,
                event.region.as_ref(),
            );
            entries.push(MemberEntry {
                key: MemberKey::Event(event_id),
                preferred,
                specified,
                kind_rank: 3,
                source_name: event.name.clone(),
                signature_key: Default::default(),
            });
        }

        entries.sort_by(|a, b| {
            (&a.preferred, !a.specified, a.kind_rank, &a.source_name, &a.signature_key).cmp(&(
                &b.preferred,
                !b.specified,
                b.kind_rank,
                &b.source_name,
                &b.signature_key,
            ))
        });

        for entry in entries {
            if self.ignored_members.contains(&entry.key) {
                continue;
            }
            match entry.key {
                MemberKey::Method(m) => self.process_method(m, entry.preferred, entry.specified),
                MemberKey::Property(p) => {
                    self.process_property(p, entry.preferred, entry.specified)
                }
                MemberKey::Field(f) => self.process_field(f, entry.preferred, entry.specified),
                MemberKey::Event(e) => self.process_event(e, entry.preferred, entry.specified),
            }
        }
    }

    fn mark_members_not_usable(&mut self, def: &TypeDef) {
        let model = self.model;
        for &method_id in &def.methods {
            if self.ignored_members.contains(&MemberKey::Method(method_id)) {
                continue;
            }
            if model.method(method_id).is_constructor {
                self.constructor_semantics
                    .insert(method_id, ConstructorSemantics::NotUsable);
            } else {
                self.method_semantics.insert(method_id, MethodSemantics::NotUsable);
            }
        }
        for &property_id in &def.properties {
            if !self.ignored_members.contains(&MemberKey::Property(property_id)) {
                self.property_semantics.insert(property_id, PropertySemantics::NotUsable);
            }
        }
        for &event_id in &def.events {
            if !self.ignored_members.contains(&MemberKey::Event(event_id)) {
                self.event_semantics.insert(event_id, EventSemantics::NotUsable);
            }
        }
        for &field_id in &def.fields {
            if !self.ignored_members.contains(&MemberKey::Field(field_id)) {
                self.field_semantics.insert(field_id, FieldSemantics::NotUsable);
            }
        }
    }

    /// Derive the preferred script name of a member and whether it was
    /// explicitly specified. `None` means a minimized name is allocated when
    /// the member is processed.
    fn preferred_member_name(
        &mut self,
        attributes: &AttributeSet,
        source_name: &str,
        is_public: bool,
        def: &TypeDef,
        region: Option<&Region>,
    ) -> (Option<String>, bool) {
        if let Some(explicit) = attributes.script_name() {
            if is_valid_identifier(explicit) {
                return (Some(explicit.to_string()), true);
            }
            self.report(
                DiagnosticCode::E7201,
                region,
                format!("`{explicit}` is not a valid script name for member `{source_name}`"),
            );
        }
        if attributes.has_preserve_case() {
            return (Some(source_name.to_string()), false);
        }
        if self.minimize_member(is_public, def) {
            return (None, false);
        }
        let preserve = def.attributes.has_preserve_member_case()
            || self
                .model
                .assembly(def.assembly)
                .attributes
                .has_preserve_member_case();
        if preserve {
            (Some(source_name.to_string()), false)
        } else {
            (Some(super::naming::camel_case(source_name)), false)
        }
    }

    // ----- methods ---------------------------------------------------------

    fn process_method(&mut self, id: MethodId, preferred: Option<String>, specified: bool) {
        let model = self.model;
        let method = model.method(id);
        let def = model.type_def(method.declaring_type);
        let type_sem = self.get_type_semantics(method.declaring_type).clone();

        self.assign_method_type_param_names(id, method, def);

        if method.attributes.has_non_scriptable() || !type_sem.is_usable() {
            self.method_semantics.insert(id, MethodSemantics::NotUsable);
            return;
        }

        let expand_params = {
            let requested = method.attributes.has_expand_params();
            if requested && !method.has_params_array() {
                self.report(
                    DiagnosticCode::E7308,
                    method.region.as_ref(),
                    format!(
                        "`{}` cannot expand its parameters because it has no parameter array",
                        method.name
                    ),
                );
                false
            } else {
                requested
            }
        };

        let mut enumerate_as_array = method.attributes.has_enumerate_as_array();
        if enumerate_as_array
            && !(method.name == "GetEnumerator"
                && !method.is_static
                && method.params.is_empty()
                && method.type_params.is_empty())
        {
            self.report(
                DiagnosticCode::E7307,
                method.region.as_ref(),
                format!(
                    "`{}` cannot be enumerated as an array; only a parameterless instance \
                     GetEnumerator can",
                    method.name
                ),
            );
            enumerate_as_array = false;
        }

        if method.attributes.has_intrinsic_operator() {
            if !method.is_operator {
                self.report(
                    DiagnosticCode::E7301,
                    method.region.as_ref(),
                    format!("`{}` is not an operator method", method.name),
                );
            } else if method.is_conversion_operator {
                self.report(
                    DiagnosticCode::E7302,
                    method.region.as_ref(),
                    format!("the conversion operator `{}` cannot be intrinsic", method.name),
                );
            } else {
                self.method_semantics.insert(id, MethodSemantics::NativeOperator);
                return;
            }
        } else if method.attributes.has_script_skip() {
            let shape_ok = !method.is_override
                && !method.is_virtual
                && method.implemented_interface_methods.is_empty();
            if shape_ok && method.is_static && method.params.len() == 1 {
                self.method_semantics.insert(
                    id,
                    MethodSemantics::InlineCode {
                        code: format!("{{{}}}", method.params[0].name),
                        non_virtual_code: None,
                        generated_method_name: None,
                        enumerate_as_array,
                    },
                );
                return;
            }
            if shape_ok && !method.is_static && method.params.is_empty() {
                self.method_semantics.insert(
                    id,
                    MethodSemantics::InlineCode {
                        code: "{this}".to_string(),
                        non_virtual_code: None,
                        generated_method_name: None,
                        enumerate_as_array,
                    },
                );
                return;
            }
            self.report(
                DiagnosticCode::E7303,
                method.region.as_ref(),
                format!(
                    "`{}` cannot be skipped; only a non-virtual static method with one \
                     parameter or a non-virtual instance method with none can",
                    method.name
                ),
            );
        } else if let Some(alias) = method.attributes.script_alias() {
            if method.is_static {
                let args: Vec<String> =
                    method.params.iter().map(|p| format!("{{{}}}", p.name)).collect();
                self.method_semantics.insert(
                    id,
                    MethodSemantics::InlineCode {
                        code: format!("{}({})", alias, args.join(", ")),
                        non_virtual_code: None,
                        generated_method_name: None,
                        enumerate_as_array,
                    },
                );
                return;
            }
            self.report(
                DiagnosticCode::E7304,
                method.region.as_ref(),
                format!("the instance method `{}` cannot have a script alias", method.name),
            );
        } else if let Some(inline) = method.attributes.inline_code() {
            let mut valid = true;
            for code in
                std::iter::once(&inline.code).chain(inline.non_virtual_code.as_ref())
            {
                if let Err(error) = validate_template(code, method, &def.type_params) {
                    self.report(
                        DiagnosticCode::E7305,
                        method.region.as_ref(),
                        format!("invalid inline code for `{}`: {}", method.name, error),
                    );
                    valid = false;
                }
            }
            if valid {
                if let Some(generated) = &inline.generated_method_name {
                    self.reserve_member_name(method.declaring_type, generated, method.is_static);
                }
                self.method_semantics.insert(
                    id,
                    MethodSemantics::InlineCode {
                        code: inline.code.clone(),
                        non_virtual_code: inline.non_virtual_code.clone(),
                        generated_method_name: inline.generated_method_name.clone(),
                        enumerate_as_array,
                    },
                );
                return;
            }
        } else if method.attributes.has_instance_method_on_first_argument() {
            if method.is_static && !method.params.is_empty() {
                let target_name = preferred
                    .clone()
                    .unwrap_or_else(|| super::naming::camel_case(&method.name));
                let rest: Vec<String> = method.params[1..]
                    .iter()
                    .map(|p| format!("{{{}}}", p.name))
                    .collect();
                self.method_semantics.insert(
                    id,
                    MethodSemantics::InlineCode {
                        code: format!(
                            "{{{}}}.{}({})",
                            method.params[0].name,
                            target_name,
                            rest.join(", ")
                        ),
                        non_virtual_code: None,
                        generated_method_name: None,
                        enumerate_as_array,
                    },
                );
                return;
            }
            self.report(
                DiagnosticCode::E7309,
                method.region.as_ref(),
                format!(
                    "`{}` must be a static method with at least one parameter to be \
                     invoked on its first argument",
                    method.name
                ),
            );
        }

        if method.is_override {
            if specified {
                self.report(
                    DiagnosticCode::E7204,
                    method.region.as_ref(),
                    format!(
                        "the overriding method `{}` cannot choose its own script name",
                        method.name
                    ),
                );
            }
            let base_id = method.overridden_method.unwrap_or_else(|| {
                panic!(
                    "internal error: override `{}` has no overridden method",
                    method.name
                )
            });
            let base = self.get_method_semantics(base_id).clone();
            if let Some(sem) =
                self.inherited_semantics(method, base, &type_sem, expand_params, enumerate_as_array)
            {
                self.method_semantics.insert(id, sem);
                return;
            }
        } else if !method.implemented_interface_methods.is_empty() {
            let usable: Vec<MethodSemantics> = method
                .implemented_interface_methods
                .iter()
                .map(|&m| self.get_method_semantics(m).clone())
                .filter(|s| s.is_usable())
                .collect();
            if let Some(first) = usable.first().cloned() {
                for other in &usable[1..] {
                    if other.script_name() != first.script_name() {
                        self.report(
                            DiagnosticCode::E7203,
                            method.region.as_ref(),
                            format!(
                                "`{}` implements interface members that disagree on the \
                                 script name",
                                method.name
                            ),
                        );
                    }
                }
                if let Some(sem) = self.inherited_semantics(
                    method,
                    first,
                    &type_sem,
                    expand_params,
                    enumerate_as_array,
                ) {
                    self.method_semantics.insert(id, sem);
                    return;
                }
            }
        }

        let name = self.choose_fresh_name(
            method.declaring_type,
            &preferred,
            specified,
            method.is_static,
            method.region.as_ref(),
        );
        let sem = if type_sem.is_serializable && !method.is_static {
            MethodSemantics::StaticMethodWithThisAsFirstArgument {
                name,
                generate_code: type_sem.generate_code,
                expand_params,
            }
        } else {
            let ignore_generic_arguments = method
                .attributes
                .include_generic_arguments()
                .map(|include| !include)
                .unwrap_or(type_sem.ignore_generic_arguments);
            MethodSemantics::Normal {
                name,
                generate_code: type_sem.generate_code,
                ignore_generic_arguments,
                expand_params,
                enumerate_as_array,
            }
        };
        self.method_semantics.insert(id, sem);
    }

    /// Semantics a method inherits from its base or interface member.
    /// `None` means the inheritance failed and a fresh name is chosen.
    fn inherited_semantics(
        &mut self,
        method: &Method,
        base: MethodSemantics,
        type_sem: &TypeSemantics,
        expand_params: bool,
        enumerate_as_array: bool,
    ) -> Option<MethodSemantics> {
        match base {
            MethodSemantics::Normal {
                name,
                ignore_generic_arguments,
                enumerate_as_array: base_enumerate,
                ..
            } => Some(MethodSemantics::Normal {
                name,
                generate_code: type_sem.generate_code,
                ignore_generic_arguments,
                expand_params,
                enumerate_as_array: enumerate_as_array || base_enumerate,
            }),
            MethodSemantics::InlineCode {
                generated_method_name: Some(name),
                enumerate_as_array: base_enumerate,
                ..
            } => Some(MethodSemantics::Normal {
                name,
                generate_code: type_sem.generate_code,
                ignore_generic_arguments: false,
                expand_params,
                enumerate_as_array: enumerate_as_array || base_enumerate,
            }),
            MethodSemantics::InlineCode { generated_method_name: None, .. } => {
                self.report(
                    DiagnosticCode::E7306,
                    method.region.as_ref(),
                    format!(
                        "`{}` cannot inherit from an inline-code member without a \
                         generated method name",
                        method.name
                    ),
                );
                None
            }
            MethodSemantics::NativeIndexer => Some(MethodSemantics::NativeIndexer),
            MethodSemantics::NativeOperator => Some(MethodSemantics::NativeOperator),
            MethodSemantics::StaticMethodWithThisAsFirstArgument { name, .. } => {
                Some(MethodSemantics::StaticMethodWithThisAsFirstArgument {
                    name,
                    generate_code: type_sem.generate_code,
                    expand_params,
                })
            }
            MethodSemantics::NotUsable => Some(MethodSemantics::NotUsable),
        }
    }

    fn assign_method_type_param_names(&mut self, id: MethodId, method: &Method, def: &TypeDef) {
        for (index, param) in method.type_params.iter().enumerate() {
            let name = if self.options.minimize_names {
                format!("${}", def.type_params.len() + index + 1)
            } else {
                param.clone()
            };
            self.type_param_names.insert(
                TypeParamRef { owner: TypeParamOwner::Method(id), index: index as u32 },
                name,
            );
        }
    }

    // ----- naming ----------------------------------------------------------

    fn choose_fresh_name(
        &mut self,
        ty: TypeId,
        preferred: &Option<String>,
        specified: bool,
        is_static: bool,
        region: Option<&Region>,
    ) -> String {
        match preferred {
            Some(name) if specified => {
                if is_reserved(name, is_static) {
                    self.report(
                        DiagnosticCode::E7205,
                        region,
                        format!("`{name}` is a reserved script identifier"),
                    );
                } else if !self.is_member_name_available(ty, name, is_static) {
                    self.report(
                        DiagnosticCode::E7202,
                        region,
                        format!(
                            "the name `{}` is already used on `{}` or one of its base types",
                            name,
                            self.model.full_name(ty)
                        ),
                    );
                }
                self.reserve_member_name(ty, name, is_static);
                name.clone()
            }
            Some(name) => {
                let mut candidate = name.clone();
                let mut suffix = 1;
                while !self.is_member_name_available(ty, &candidate, is_static) {
                    candidate = format!("{name}${suffix}");
                    suffix += 1;
                }
                self.reserve_member_name(ty, &candidate, is_static);
                candidate
            }
            None => self.minimized_member_name(ty, is_static),
        }
    }

    fn minimized_member_name(&mut self, ty: TypeId, is_static: bool) -> String {
        for index in 0.. {
            let candidate = format!("${}", encode_minimized(index));
            if self.is_member_name_available(ty, &candidate, is_static) {
                self.reserve_member_name(ty, &candidate, is_static);
                return candidate;
            }
        }
        unreachable!()
    }

    // ----- properties ------------------------------------------------------

    fn process_property(&mut self, id: PropertyId, preferred: Option<String>, specified: bool) {
        let model = self.model;
        let property = model.property(id);
        let def = model.type_def(property.declaring_type);
        let type_sem = self.get_type_semantics(property.declaring_type).clone();

        if property.attributes.has_non_scriptable() || !type_sem.is_usable() {
            self.property_semantics.insert(id, PropertySemantics::NotUsable);
            self.mark_accessors_not_usable(property.getter, property.setter);
            return;
        }

        let serializable_instance = type_sem.is_serializable && !property.is_static;
        if serializable_instance {
            let accessors_inline = property
                .getter
                .into_iter()
                .chain(property.setter)
                .all(|a| model.method(a).attributes.inline_code().is_some())
                && (property.getter.is_some() || property.setter.is_some());
            if !accessors_inline {
                let name = self.choose_fresh_name(
                    property.declaring_type,
                    &preferred,
                    specified,
                    false,
                    property.region.as_ref(),
                );
                self.property_semantics.insert(id, PropertySemantics::Field { name });
                self.mark_accessors_not_usable(property.getter, property.setter);
                return;
            }
        }

        if property.attributes.has_intrinsic_property() {
            if def.kind == TypeKind::Interface {
                self.report(
                    DiagnosticCode::E7401,
                    property.region.as_ref(),
                    format!("the interface property `{}` cannot be intrinsic", property.name),
                );
            } else if property.is_override {
                self.report(
                    DiagnosticCode::E7402,
                    property.region.as_ref(),
                    format!("the overriding property `{}` cannot be intrinsic", property.name),
                );
            } else if property.is_virtual {
                self.report(
                    DiagnosticCode::E7403,
                    property.region.as_ref(),
                    format!("the overridable property `{}` cannot be intrinsic", property.name),
                );
            } else if !property.implemented_interface_properties.is_empty() {
                self.report(
                    DiagnosticCode::E7404,
                    property.region.as_ref(),
                    format!(
                        "the interface implementation `{}` cannot be intrinsic",
                        property.name
                    ),
                );
            } else if property.is_indexer {
                if property.index_param_count == 1 {
                    if let Some(getter) = property.getter {
                        self.method_semantics.insert(getter, MethodSemantics::NativeIndexer);
                    }
                    if let Some(setter) = property.setter {
                        self.method_semantics.insert(setter, MethodSemantics::NativeIndexer);
                    }
                    self.property_semantics.insert(
                        id,
                        PropertySemantics::GetAndSetMethods {
                            get: property
                                .getter
                                .map(|_| Box::new(MethodSemantics::NativeIndexer)),
                            set: property
                                .setter
                                .map(|_| Box::new(MethodSemantics::NativeIndexer)),
                        },
                    );
                    return;
                }
                self.report(
                    DiagnosticCode::E7405,
                    property.region.as_ref(),
                    format!(
                        "the indexer `{}` must take exactly one parameter to be intrinsic",
                        property.name
                    ),
                );
            } else {
                let name = self.choose_fresh_name(
                    property.declaring_type,
                    &preferred,
                    specified,
                    property.is_static,
                    property.region.as_ref(),
                );
                self.property_semantics.insert(id, PropertySemantics::Field { name });
                self.mark_accessors_not_usable(property.getter, property.setter);
                return;
            }
        }

        let get = property.getter.map(|getter| {
            let accessor_preferred = preferred.as_ref().map(|n| format!("get_{n}"));
            self.process_method(getter, accessor_preferred, specified);
            Box::new(self.get_method_semantics(getter).clone())
        });
        let set = property.setter.map(|setter| {
            let accessor_preferred = preferred.as_ref().map(|n| format!("set_{n}"));
            self.process_method(setter, accessor_preferred, specified);
            Box::new(self.get_method_semantics(setter).clone())
        });
        self.property_semantics
            .insert(id, PropertySemantics::GetAndSetMethods { get, set });
    }

    fn mark_accessors_not_usable(&mut self, first: Option<MethodId>, second: Option<MethodId>) {
        for accessor in first.into_iter().chain(second) {
            self.method_semantics.insert(accessor, MethodSemantics::NotUsable);
        }
    }

    // ----- events ----------------------------------------------------------

    fn process_event(&mut self, id: EventId, preferred: Option<String>, specified: bool) {
        let model = self.model;
        let event = model.event(id);
        let type_sem = self.get_type_semantics(event.declaring_type).clone();

        if event.attributes.has_non_scriptable() || !type_sem.is_usable() {
            self.event_semantics.insert(id, EventSemantics::NotUsable);
            self.mark_accessors_not_usable(event.adder, event.remover);
            return;
        }

        let add = event.adder.map(|adder| {
            let accessor_preferred = preferred.as_ref().map(|n| format!("add_{n}"));
            self.process_method(adder, accessor_preferred, specified);
            Box::new(self.get_method_semantics(adder).clone())
        });
        let remove = event.remover.map(|remover| {
            let accessor_preferred = preferred.as_ref().map(|n| format!("remove_{n}"));
            self.process_method(remover, accessor_preferred, specified);
            Box::new(self.get_method_semantics(remover).clone())
        });
        self.event_semantics
            .insert(id, EventSemantics::AddAndRemoveMethods { add, remove });
    }

    // ----- fields ----------------------------------------------------------

    fn process_field(&mut self, id: FieldId, preferred: Option<String>, specified: bool) {
        let model = self.model;
        let field = model.field(id);
        let def = model.type_def(field.declaring_type);
        let type_sem = self.get_type_semantics(field.declaring_type).clone();

        if field.attributes.has_non_scriptable() || !type_sem.is_usable() {
            self.field_semantics.insert(id, FieldSemantics::NotUsable);
            return;
        }

        if type_sem.is_named_values {
            let name = self.choose_fresh_name(
                field.declaring_type,
                &preferred,
                specified,
                true,
                field.region.as_ref(),
            );
            self.field_semantics.insert(
                id,
                FieldSemantics::StringConstant { value: name.clone(), name: Some(name) },
            );
            return;
        }

        if field.attributes.has_inline_constant() {
            if field.is_const {
                if let Some(value) = &field.const_value {
                    self.field_semantics.insert(id, constant_semantics(value, None));
                    return;
                }
            }
            self.report(
                DiagnosticCode::E7406,
                field.region.as_ref(),
                format!("`{}` must be a constant to be substituted inline", field.name),
            );
        }

        let minimized_const = field.is_const && self.minimize_member(field.is_public, def);
        if field.is_const && (def.kind == TypeKind::Enum || minimized_const) {
            if let Some(value) = &field.const_value {
                let name = self.choose_fresh_name(
                    field.declaring_type,
                    &preferred,
                    specified,
                    true,
                    field.region.as_ref(),
                );
                let sem = constant_semantics(value, Some(name));
                self.field_semantics.insert(id, sem);
                return;
            }
        }

        let name = self.choose_fresh_name(
            field.declaring_type,
            &preferred,
            specified,
            field.is_static,
            field.region.as_ref(),
        );
        self.field_semantics.insert(id, FieldSemantics::Field { name });
    }

    // ----- constructors ----------------------------------------------------

    fn process_constructor(&mut self, id: MethodId) {
        let model = self.model;
        let method = model.method(id);
        let declaring = method.declaring_type;
        let def = model.type_def(declaring);
        let type_sem = self.get_type_semantics(declaring).clone();

        if method.is_placeholder_constructor
            || method.attributes.has_non_scriptable()
            || !type_sem.is_usable()
        {
            self.constructor_semantics.insert(id, ConstructorSemantics::NotUsable);
            return;
        }
        if method.is_static {
            // static initializer sentinel
            self.constructor_semantics.insert(id, ConstructorSemantics::unnamed());
            return;
        }

        let expand_params = {
            let requested = method.attributes.has_expand_params();
            if requested && !method.has_params_array() {
                self.report(
                    DiagnosticCode::E7308,
                    method.region.as_ref(),
                    format!(
                        "the constructor of `{}` cannot expand its parameters because it \
                         has no parameter array",
                        model.full_name(declaring)
                    ),
                );
                false
            } else {
                requested
            }
        };

        if let Some(inline) = method.attributes.inline_code() {
            match validate_template(&inline.code, method, &def.type_params) {
                Ok(_) => {
                    self.constructor_semantics.insert(
                        id,
                        ConstructorSemantics::InlineCode {
                            code: inline.code.clone(),
                            skip_in_initializer: false,
                        },
                    );
                    return;
                }
                Err(error) => {
                    self.report(
                        DiagnosticCode::E7504,
                        method.region.as_ref(),
                        format!(
                            "invalid inline code on the constructor of `{}`: {}",
                            model.full_name(declaring),
                            error
                        ),
                    );
                }
            }
        }

        if method.attributes.has_alternate_signature() {
            let mains: Vec<MethodId> = def
                .methods
                .iter()
                .copied()
                .filter(|&m| {
                    let c = model.method(m);
                    c.is_constructor
                        && !c.is_static
                        && !c.is_placeholder_constructor
                        && !c.attributes.has_alternate_signature()
                })
                .collect();
            if mains.len() == 1 {
                let main = model.method(mains[0]);
                let sem = match main.attributes.script_name() {
                    Some(name) if name != "$ctor" => {
                        self.named_constructor(&type_sem, name.to_string(), false, expand_params)
                    }
                    _ if type_sem.is_serializable => ConstructorSemantics::StaticMethod {
                        name: "$ctor".to_string(),
                        generate_code: false,
                        expand_params,
                        skip_in_initializer: false,
                    },
                    _ => ConstructorSemantics::Unnamed {
                        generate_code: false,
                        expand_params,
                        skip_in_initializer: false,
                    },
                };
                self.constructor_semantics.insert(id, sem);
                return;
            }
            self.report(
                DiagnosticCode::E7503,
                method.region.as_ref(),
                format!(
                    "`{}` must have exactly one constructor without an alternate signature",
                    model.full_name(declaring)
                ),
            );
        }

        if method.attributes.has_object_literal()
            || (type_sem.is_serializable && type_sem.is_imported)
        {
            match self.json_parameter_map(method, declaring) {
                Some(parameter_to_member) => {
                    self.constructor_semantics.insert(
                        id,
                        ConstructorSemantics::Json {
                            parameter_to_member,
                            skip_in_initializer: true,
                        },
                    );
                }
                None => {
                    self.constructor_semantics.insert(
                        id,
                        ConstructorSemantics::Unnamed {
                            generate_code: type_sem.generate_code,
                            expand_params,
                            skip_in_initializer: false,
                        },
                    );
                }
            }
            return;
        }

        if type_sem.is_imported && method.params.len() == 1 && method.params[0].is_params {
            self.constructor_semantics.insert(
                id,
                ConstructorSemantics::InlineCode {
                    code: format!("{{$Script}}.mkdict({{*{}}})", method.params[0].name),
                    skip_in_initializer: false,
                },
            );
            return;
        }

        if let Some(explicit) = method.attributes.script_name() {
            if !is_valid_identifier(explicit) {
                self.report(
                    DiagnosticCode::E7201,
                    method.region.as_ref(),
                    format!(
                        "`{}` is not a valid script name for a constructor of `{}`",
                        explicit,
                        model.full_name(declaring)
                    ),
                );
            } else if explicit == "$ctor" {
                let sem = if type_sem.is_serializable {
                    ConstructorSemantics::StaticMethod {
                        name: "$ctor".to_string(),
                        generate_code: type_sem.generate_code,
                        expand_params,
                        skip_in_initializer: false,
                    }
                } else {
                    ConstructorSemantics::Unnamed {
                        generate_code: type_sem.generate_code,
                        expand_params,
                        skip_in_initializer: false,
                    }
                };
                self.constructor_semantics.insert(id, sem);
                return;
            } else {
                self.reserve_member_name(declaring, explicit, true);
                let sem = self.named_constructor(
                    &type_sem,
                    explicit.to_string(),
                    type_sem.generate_code,
                    expand_params,
                );
                self.constructor_semantics.insert(id, sem);
                return;
            }
        }

        let count = {
            let counter = self.unnamed_ctor_counts.entry(declaring).or_insert(0);
            *counter += 1;
            *counter
        };
        let sem = if count == 1 {
            if type_sem.is_serializable {
                let name = if self.minimize_type(def) {
                    self.minimized_member_name(declaring, true)
                } else {
                    "$ctor".to_string()
                };
                ConstructorSemantics::StaticMethod {
                    name,
                    generate_code: type_sem.generate_code,
                    expand_params,
                    skip_in_initializer: false,
                }
            } else {
                ConstructorSemantics::Unnamed {
                    generate_code: type_sem.generate_code,
                    expand_params,
                    skip_in_initializer: false,
                }
            }
        } else {
            let name = format!("$ctor{count}");
            self.reserve_member_name(declaring, &name, true);
            self.named_constructor(&type_sem, name, type_sem.generate_code, expand_params)
        };
        self.constructor_semantics.insert(id, sem);
    }

    fn named_constructor(
        &self,
        type_sem: &TypeSemantics,
        name: String,
        generate_code: bool,
        expand_params: bool,
    ) -> ConstructorSemantics {
        if type_sem.is_serializable {
            ConstructorSemantics::StaticMethod {
                name,
                generate_code,
                expand_params,
                skip_in_initializer: false,
            }
        } else {
            ConstructorSemantics::Named {
                name,
                generate_code,
                expand_params,
                skip_in_initializer: false,
            }
        }
    }

    /// Match each constructor parameter to a property or field of the
    /// declaring type by lowercase name. `None` when any parameter failed.
    fn json_parameter_map(&mut self, method: &Method, declaring: TypeId) -> Option<Vec<MemberRef>> {
        let model = self.model;
        let mut search = vec![declaring];
        search.extend(model.all_base_types(declaring));

        let mut map = Vec::new();
        let mut ok = true;
        for param in &method.params {
            let lower = param.name.to_lowercase();
            let mut found = None;
            'types: for &ty in &search {
                let def = model.type_def(ty);
                for &property_id in &def.properties {
                    if model.property(property_id).name.to_lowercase() == lower {
                        found =
                            Some((MemberRef::Property(property_id), property_type(model, property_id)));
                        break 'types;
                    }
                }
                for &field_id in &def.fields {
                    if model.field(field_id).name.to_lowercase() == lower {
                        found = Some((
                            MemberRef::Field(field_id),
                            Some(model.field(field_id).ty.clone()),
                        ));
                        break 'types;
                    }
                }
            }
            match found {
                None => {
                    self.report(
                        DiagnosticCode::E7501,
                        method.region.as_ref(),
                        format!(
                            "the record constructor parameter `{}` matches no property or \
                             field of `{}`",
                            param.name,
                            model.full_name(declaring)
                        ),
                    );
                    ok = false;
                }
                Some((member, member_type)) => {
                    if let Some(member_type) = member_type {
                        if member_type != param.ty {
                            self.report(
                                DiagnosticCode::E7502,
                                method.region.as_ref(),
                                format!(
                                    "the record constructor parameter `{}` does not have the \
                                     same type as the member it binds to",
                                    param.name
                                ),
                            );
                            ok = false;
                        }
                    }
                    map.push(member);
                }
            }
        }
        ok.then_some(map)
    }
}

fn property_type(model: &TypeModel, id: PropertyId) -> Option<TypeRef> {
    let property = model.property(id);
    property
        .getter
        .and_then(|g| model.method(g).return_type.clone())
        .or_else(|| {
            property
                .setter
                .and_then(|s| model.method(s).params.last().map(|p| p.ty.clone()))
        })
}

fn constant_semantics(value: &ConstValue, name: Option<String>) -> FieldSemantics {
    match value {
        ConstValue::Boolean(value) => FieldSemantics::BooleanConstant { value: *value, name },
        ConstValue::Number(value) => FieldSemantics::NumericConstant { value: *value, name },
        ConstValue::String(value) => {
            FieldSemantics::StringConstant { value: value.clone(), name }
        }
        ConstValue::Null => FieldSemantics::NullConstant { name },
    }
}
