//! Tests for the metadata importer: type and member naming, attribute
//! validation, and the semantic-record laws.

use reef_compiler::diag::DiagnosticCode;
use reef_compiler::import::{
    DelegateSemantics, FieldSemantics, MethodSemantics, PropertySemantics, TypeImplKind,
};
use reef_compiler::model::{
    Assembly, Attr, ConstValue, Event, Field, Method, Param, Property, TypeDef, TypeKind,
    TypeModel, TypeRef,
};
use reef_compiler::{CompilerOptions, MetadataImporter};

fn new_model() -> TypeModel {
    let mut model = TypeModel::new();
    model.add_assembly(Assembly::new("lib"));
    model
}

fn import<'a>(model: &'a TypeModel, options: &'a CompilerOptions) -> MetadataImporter<'a> {
    let mut importer = MetadataImporter::new(model, options);
    importer.prepare_all();
    importer
}

#[test]
fn test_type_name_uses_source_namespace() {
    let mut model = new_model();
    let ty = model.add_type(TypeDef::new(TypeKind::Class, "Acme.Ui", "Widget"));
    let options = CompilerOptions::new();
    let importer = import(&model, &options);
    assert_eq!(importer.get_type_semantics(ty).name, "Acme.Ui.Widget");
    assert!(importer.get_type_semantics(ty).generate_code);
}

#[test]
fn test_explicit_script_name_and_namespace() {
    let mut model = new_model();
    let ty = model.add_type(
        TypeDef::new(TypeKind::Class, "Acme.Ui", "Widget")
            .with_attr(Attr::ScriptName("W".into()))
            .with_attr(Attr::ScriptNamespace("ui".into())),
    );
    let options = CompilerOptions::new();
    let importer = import(&model, &options);
    assert_eq!(importer.get_type_semantics(ty).name, "ui.W");
}

#[test]
fn test_ignore_namespace_clears_namespace() {
    let mut model = new_model();
    let ty = model.add_type(
        TypeDef::new(TypeKind::Class, "Acme.Ui", "Widget").with_attr(Attr::IgnoreNamespace),
    );
    let options = CompilerOptions::new();
    let importer = import(&model, &options);
    assert_eq!(importer.get_type_semantics(ty).name, "Widget");
}

#[test]
fn test_conflicting_namespace_attributes_reported() {
    let mut model = new_model();
    model.add_type(
        TypeDef::new(TypeKind::Class, "Acme", "Widget")
            .with_attr(Attr::ScriptNamespace("ui".into()))
            .with_attr(Attr::IgnoreNamespace),
    );
    let options = CompilerOptions::new();
    let importer = import(&model, &options);
    assert!(importer.diagnostics().contains(DiagnosticCode::E7002));
}

#[test]
fn test_assembly_namespace_is_the_fallback() {
    let mut model = TypeModel::new();
    model.add_assembly(Assembly::new("lib").with_attr(Attr::ScriptNamespace("runtime".into())));
    let ty = model.add_type(TypeDef::new(TypeKind::Class, "Acme.Impl", "Widget"));
    let options = CompilerOptions::new();
    let importer = import(&model, &options);
    assert_eq!(importer.get_type_semantics(ty).name, "runtime.Widget");
}

#[test]
fn test_nested_type_joins_outer_name() {
    let mut model = new_model();
    let outer = model.add_type(TypeDef::new(TypeKind::Class, "Acme", "Outer"));
    let inner = model.add_type(
        TypeDef::new(TypeKind::Class, "Acme", "Inner").with_declaring_type(outer),
    );
    let options = CompilerOptions::new();
    let importer = import(&model, &options);
    assert_eq!(importer.get_type_semantics(inner).name, "Acme.Outer$Inner");
}

#[test]
fn test_nested_type_with_namespace_attribute_reported() {
    let mut model = new_model();
    let outer = model.add_type(TypeDef::new(TypeKind::Class, "Acme", "Outer"));
    model.add_type(
        TypeDef::new(TypeKind::Class, "Acme", "Inner")
            .with_declaring_type(outer)
            .with_attr(Attr::ScriptNamespace("other".into())),
    );
    let options = CompilerOptions::new();
    let importer = import(&model, &options);
    assert!(importer.diagnostics().contains(DiagnosticCode::E7003));
}

#[test]
fn test_generic_type_gets_arity_suffix_and_warning() {
    let mut model = new_model();
    let ty = model.add_type(
        TypeDef::new(TypeKind::Class, "Acme", "Cache").with_type_params(vec!["K", "V"]),
    );
    let options = CompilerOptions::new();
    let importer = import(&model, &options);
    let sem = importer.get_type_semantics(ty);
    assert_eq!(sem.name, "Acme.Cache$2");
    assert!(!sem.ignore_generic_arguments);
    assert!(importer.diagnostics().contains(DiagnosticCode::E7006));
    assert!(!importer.has_errors());
}

#[test]
fn test_generic_suffix_omitted_when_arguments_ignored() {
    let mut model = new_model();
    let ty = model.add_type(
        TypeDef::new(TypeKind::Class, "Acme", "Cache")
            .with_type_params(vec!["K", "V"])
            .with_attr(Attr::IncludeGenericArguments(false)),
    );
    let options = CompilerOptions::new();
    let importer = import(&model, &options);
    let sem = importer.get_type_semantics(ty);
    assert_eq!(sem.name, "Acme.Cache");
    assert!(sem.ignore_generic_arguments);
}

#[test]
fn test_minimized_type_names_count_per_namespace() {
    let mut model = new_model();
    let first = model.add_type(TypeDef::new(TypeKind::Class, "A", "First").non_public());
    let second = model.add_type(TypeDef::new(TypeKind::Class, "A", "Second").non_public());
    let other = model.add_type(TypeDef::new(TypeKind::Class, "B", "Third").non_public());
    let public = model.add_type(TypeDef::new(TypeKind::Class, "A", "Visible"));
    let options = CompilerOptions { minimize_names: true, ..CompilerOptions::new() };
    let importer = import(&model, &options);
    assert_eq!(importer.get_type_semantics(first).name, "A.$0");
    assert_eq!(importer.get_type_semantics(second).name, "A.$1");
    assert_eq!(importer.get_type_semantics(other).name, "B.$0");
    assert_eq!(importer.get_type_semantics(public).name, "A.Visible");
}

#[test]
fn test_non_scriptable_type_and_members() {
    let mut model = new_model();
    let ty = model.add_type(
        TypeDef::new(TypeKind::Class, "Acme", "Hidden").with_attr(Attr::NonScriptable),
    );
    let method = model.add_method(Method::new(ty, "Run"));
    let options = CompilerOptions::new();
    let importer = import(&model, &options);
    assert_eq!(importer.get_type_semantics(ty).kind, TypeImplKind::NotUsable);
    assert_eq!(*importer.get_method_semantics(method), MethodSemantics::NotUsable);
}

#[test]
fn test_member_names_are_camel_cased() {
    let mut model = new_model();
    let ty = model.add_type(TypeDef::new(TypeKind::Class, "Acme", "Widget"));
    let method = model.add_method(Method::new(ty, "RefreshLayout"));
    let options = CompilerOptions::new();
    let importer = import(&model, &options);
    assert_eq!(
        importer.get_method_semantics(method).script_name(),
        Some("refreshLayout")
    );
}

#[test]
fn test_preserve_case_keeps_the_source_spelling() {
    let mut model = new_model();
    let ty = model.add_type(TypeDef::new(TypeKind::Class, "Acme", "Widget"));
    let method = model.add_method(
        Method::new(ty, "RefreshLayout").with_attr(Attr::PreserveCase),
    );
    let options = CompilerOptions::new();
    let importer = import(&model, &options);
    assert_eq!(
        importer.get_method_semantics(method).script_name(),
        Some("RefreshLayout")
    );
}

#[test]
fn test_overloads_get_unique_suffixes() {
    let mut model = new_model();
    let ty = model.add_type(TypeDef::new(TypeKind::Class, "Acme", "Widget"));
    let one = model.add_method(Method::new(ty, "Draw"));
    let two = model.add_method(
        Method::new(ty, "Draw").with_params(vec![Param::new("depth", TypeRef::Dynamic)]),
    );
    let options = CompilerOptions::new();
    let importer = import(&model, &options);
    assert_eq!(importer.get_method_semantics(one).script_name(), Some("draw"));
    assert_eq!(importer.get_method_semantics(two).script_name(), Some("draw$1"));
}

#[test]
fn test_reserved_names_are_avoided() {
    let mut model = new_model();
    let ty = model.add_type(TypeDef::new(TypeKind::Class, "Acme", "Widget"));
    let instance = model.add_method(Method::new(ty, "HasOwnProperty"));
    let static_proto = model.add_method(Method::new(ty, "Prototype").static_());
    let instance_proto = model.add_method(Method::new(ty, "Prototype2"));
    let options = CompilerOptions::new();
    let importer = import(&model, &options);
    // hasOwnProperty is prototype-inherited, so instance members avoid it
    assert_eq!(
        importer.get_method_semantics(instance).script_name(),
        Some("hasOwnProperty$1")
    );
    // prototype is only unusable in static context
    assert_eq!(
        importer.get_method_semantics(static_proto).script_name(),
        Some("prototype$1")
    );
    assert_eq!(
        importer.get_method_semantics(instance_proto).script_name(),
        Some("prototype2")
    );
}

#[test]
fn test_instance_names_respect_base_types() {
    let mut model = new_model();
    let base = model.add_type(TypeDef::new(TypeKind::Class, "Acme", "Base"));
    let base_method = model.add_method(Method::new(base, "Run"));
    let derived = model.add_type(
        TypeDef::new(TypeKind::Class, "Acme", "Derived").with_base_class(base),
    );
    let derived_method = model.add_method(Method::new(derived, "Run"));
    let options = CompilerOptions::new();
    let importer = import(&model, &options);
    assert_eq!(importer.get_method_semantics(base_method).script_name(), Some("run"));
    assert_eq!(
        importer.get_method_semantics(derived_method).script_name(),
        Some("run$1")
    );
}

#[test]
fn test_override_inherits_the_base_name() {
    let mut model = new_model();
    let base = model.add_type(TypeDef::new(TypeKind::Class, "Acme", "Base"));
    let base_method = model.add_method(Method::new(base, "Render").virtual_());
    let derived = model.add_type(
        TypeDef::new(TypeKind::Class, "Acme", "Derived").with_base_class(base),
    );
    let derived_method = model.add_method(Method::new(derived, "Render").overriding(base_method));
    let options = CompilerOptions::new();
    let importer = import(&model, &options);
    assert_eq!(
        importer.get_method_semantics(derived_method).script_name(),
        Some("render")
    );
    assert!(!importer.has_errors());
}

#[test]
fn test_interface_implementation_inherits_the_interface_name() {
    let mut model = new_model();
    let iface = model.add_type(TypeDef::new(TypeKind::Interface, "Acme", "IRunnable"));
    let iface_method = model.add_method(
        Method::new(iface, "Run").with_attr(Attr::ScriptName("go".into())),
    );
    let class = model.add_type(
        TypeDef::new(TypeKind::Class, "Acme", "Job").with_interfaces(vec![iface]),
    );
    let class_method =
        model.add_method(Method::new(class, "Run").implementing(vec![iface_method]));
    let options = CompilerOptions::new();
    let importer = import(&model, &options);
    assert_eq!(importer.get_method_semantics(class_method).script_name(), Some("go"));
}

#[test]
fn test_explicit_name_collision_reported() {
    let mut model = new_model();
    let ty = model.add_type(TypeDef::new(TypeKind::Class, "Acme", "Widget"));
    model.add_method(Method::new(ty, "First").with_attr(Attr::ScriptName("go".into())));
    model.add_method(Method::new(ty, "Second").with_attr(Attr::ScriptName("go".into())));
    let options = CompilerOptions::new();
    let importer = import(&model, &options);
    assert!(importer.diagnostics().contains(DiagnosticCode::E7202));
}

#[test]
fn test_property_expands_into_accessor_pair() {
    let mut model = new_model();
    let ty = model.add_type(TypeDef::new(TypeKind::Class, "Acme", "Widget"));
    let getter = model.add_method(Method::new(ty, "get_Title"));
    let setter = model.add_method(
        Method::new(ty, "set_Title").with_params(vec![Param::new("value", TypeRef::Dynamic)]),
    );
    let prop = model.add_property(
        Property::new(ty, "Title").with_getter(getter).with_setter(setter).auto(),
    );
    let options = CompilerOptions::new();
    let importer = import(&model, &options);
    let PropertySemantics::GetAndSetMethods { get, set } = importer.get_property_semantics(prop)
    else {
        panic!("expected accessor methods");
    };
    // accessor records in the method table agree with the property record
    assert_eq!(get.as_deref(), Some(importer.get_method_semantics(getter)));
    assert_eq!(set.as_deref(), Some(importer.get_method_semantics(setter)));
    assert_eq!(importer.get_method_semantics(getter).script_name(), Some("get_title"));
    assert_eq!(importer.get_method_semantics(setter).script_name(), Some("set_title"));
}

#[test]
fn test_intrinsic_property_becomes_a_field() {
    let mut model = new_model();
    let ty = model.add_type(TypeDef::new(TypeKind::Class, "Acme", "Widget"));
    let getter = model.add_method(Method::new(ty, "get_Title"));
    let prop = model.add_property(
        Property::new(ty, "Title")
            .with_getter(getter)
            .with_attr(Attr::IntrinsicProperty),
    );
    let options = CompilerOptions::new();
    let importer = import(&model, &options);
    assert_eq!(
        *importer.get_property_semantics(prop),
        PropertySemantics::Field { name: "title".into() }
    );
    assert_eq!(*importer.get_method_semantics(getter), MethodSemantics::NotUsable);
}

#[test]
fn test_intrinsic_indexer_becomes_native_indexer() {
    let mut model = new_model();
    let ty = model.add_type(TypeDef::new(TypeKind::Class, "Acme", "Widget"));
    let getter = model.add_method(
        Method::new(ty, "get_Item").with_params(vec![Param::new("index", TypeRef::Dynamic)]),
    );
    let prop = model.add_property(
        Property::new(ty, "Item")
            .with_getter(getter)
            .indexer(1)
            .with_attr(Attr::IntrinsicProperty),
    );
    let options = CompilerOptions::new();
    let importer = import(&model, &options);
    let PropertySemantics::GetAndSetMethods { get, .. } = importer.get_property_semantics(prop)
    else {
        panic!("expected accessor records");
    };
    assert_eq!(get.as_deref(), Some(&MethodSemantics::NativeIndexer));
    assert_eq!(*importer.get_method_semantics(getter), MethodSemantics::NativeIndexer);
}

#[test]
fn test_intrinsic_property_on_override_reported() {
    let mut model = new_model();
    let base = model.add_type(TypeDef::new(TypeKind::Class, "Acme", "Base"));
    let base_getter = model.add_method(Method::new(base, "get_Title").virtual_());
    model.add_property(Property::new(base, "Title").with_getter(base_getter));
    let derived = model.add_type(
        TypeDef::new(TypeKind::Class, "Acme", "Derived").with_base_class(base),
    );
    let getter = model.add_method(Method::new(derived, "get_Title").overriding(base_getter));
    let mut prop = Property::new(derived, "Title")
        .with_getter(getter)
        .with_attr(Attr::IntrinsicProperty);
    prop.is_override = true;
    model.add_property(prop);
    let options = CompilerOptions::new();
    let importer = import(&model, &options);
    assert!(importer.diagnostics().contains(DiagnosticCode::E7402));
}

#[test]
fn test_serializable_type_members() {
    let mut model = new_model();
    let ty = model.add_type(
        TypeDef::new(TypeKind::Class, "Acme", "Point").with_attr(Attr::Serializable),
    );
    let getter = model.add_method(Method::new(ty, "get_X"));
    let prop = model.add_property(Property::new(ty, "X").with_getter(getter).auto());
    let method = model.add_method(Method::new(ty, "Length"));
    let options = CompilerOptions::new();
    let importer = import(&model, &options);
    assert_eq!(
        *importer.get_property_semantics(prop),
        PropertySemantics::Field { name: "x".into() }
    );
    assert!(matches!(
        importer.get_method_semantics(method),
        MethodSemantics::StaticMethodWithThisAsFirstArgument { name, .. } if name == "length"
    ));
}

#[test]
fn test_serializable_base_rule_reported() {
    let mut model = new_model();
    let base = model.add_type(TypeDef::new(TypeKind::Class, "Acme", "Plain"));
    model.add_type(
        TypeDef::new(TypeKind::Class, "Acme", "Point")
            .with_base_class(base)
            .with_attr(Attr::Serializable),
    );
    let options = CompilerOptions::new();
    let importer = import(&model, &options);
    assert!(importer.diagnostics().contains(DiagnosticCode::E7101));
}

#[test]
fn test_serializable_instance_event_reported() {
    let mut model = new_model();
    let ty = model.add_type(
        TypeDef::new(TypeKind::Class, "Acme", "Point").with_attr(Attr::Serializable),
    );
    let adder = model.add_method(Method::new(ty, "add_Changed"));
    let remover = model.add_method(Method::new(ty, "remove_Changed"));
    model.add_event(Event::new(ty, "Changed").with_accessors(adder, remover));
    let options = CompilerOptions::new();
    let importer = import(&model, &options);
    assert!(importer.diagnostics().contains(DiagnosticCode::E7103));
}

#[test]
fn test_named_values_enum_fields_become_string_constants() {
    let mut model = new_model();
    let ty = model.add_type(
        TypeDef::new(TypeKind::Enum, "Acme", "Color").with_attr(Attr::NamedValues),
    );
    let field = model.add_field(
        Field::new(ty, "DeepRed", TypeRef::Def(ty)).constant(ConstValue::Number(0.0)).static_(),
    );
    let options = CompilerOptions::new();
    let importer = import(&model, &options);
    assert_eq!(
        *importer.get_field_semantics(field),
        FieldSemantics::StringConstant { value: "deepRed".into(), name: Some("deepRed".into()) }
    );
}

#[test]
fn test_enum_constants_carry_their_values() {
    let mut model = new_model();
    let ty = model.add_type(TypeDef::new(TypeKind::Enum, "Acme", "Color"));
    let field = model.add_field(
        Field::new(ty, "Red", TypeRef::Def(ty)).constant(ConstValue::Number(2.0)).static_(),
    );
    let options = CompilerOptions::new();
    let importer = import(&model, &options);
    assert_eq!(
        *importer.get_field_semantics(field),
        FieldSemantics::NumericConstant { value: 2.0, name: Some("red".into()) }
    );
}

#[test]
fn test_inline_constant_strips_the_name() {
    let mut model = new_model();
    let ty = model.add_type(TypeDef::new(TypeKind::Class, "Acme", "Limits"));
    let field = model.add_field(
        Field::new(ty, "MaxDepth", TypeRef::Dynamic)
            .constant(ConstValue::Number(64.0))
            .static_()
            .with_attr(Attr::InlineConstant),
    );
    let options = CompilerOptions { minimize_names: true, minimize_public_names: true, ..CompilerOptions::new() };
    let importer = import(&model, &options);
    // minification would already make it a named constant; the attribute
    // strips the name so every use is substituted
    assert_eq!(
        *importer.get_field_semantics(field),
        FieldSemantics::NumericConstant { value: 64.0, name: None }
    );
}

#[test]
fn test_script_skip_methods_evaporate() {
    let mut model = new_model();
    let ty = model.add_type(TypeDef::new(TypeKind::Class, "Acme", "Script"));
    let static_skip = model.add_method(
        Method::new(ty, "Literal")
            .static_()
            .with_params(vec![Param::new("value", TypeRef::Dynamic)])
            .with_attr(Attr::ScriptSkip),
    );
    let instance_skip = model.add_method(
        Method::new(ty, "Unwrap").with_attr(Attr::ScriptSkip),
    );
    let options = CompilerOptions::new();
    let importer = import(&model, &options);
    assert!(matches!(
        importer.get_method_semantics(static_skip),
        MethodSemantics::InlineCode { code, .. } if code == "{value}"
    ));
    assert!(matches!(
        importer.get_method_semantics(instance_skip),
        MethodSemantics::InlineCode { code, .. } if code == "{this}"
    ));
}

#[test]
fn test_script_alias_expands_to_a_call() {
    let mut model = new_model();
    let ty = model.add_type(TypeDef::new(TypeKind::Class, "Acme", "Script"));
    let method = model.add_method(
        Method::new(ty, "IsFinite")
            .static_()
            .with_params(vec![Param::new("value", TypeRef::Dynamic)])
            .with_attr(Attr::ScriptAlias("isFinite".into())),
    );
    let options = CompilerOptions::new();
    let importer = import(&model, &options);
    assert!(matches!(
        importer.get_method_semantics(method),
        MethodSemantics::InlineCode { code, .. } if code == "isFinite({value})"
    ));
}

#[test]
fn test_invalid_inline_code_falls_back_to_a_normal_method() {
    let mut model = new_model();
    let ty = model.add_type(TypeDef::new(TypeKind::Class, "Acme", "Script"));
    let method = model.add_method(
        Method::new(ty, "Bad").with_attr(Attr::InlineCode(
            reef_compiler::model::InlineCodeAttr {
                code: "f({missing})".into(),
                non_virtual_code: None,
                generated_method_name: None,
            },
        )),
    );
    let options = CompilerOptions::new();
    let importer = import(&model, &options);
    assert!(importer.diagnostics().contains(DiagnosticCode::E7305));
    assert!(matches!(
        importer.get_method_semantics(method),
        MethodSemantics::Normal { name, .. } if name == "bad"
    ));
}

#[test]
fn test_enumerate_as_array_requires_get_enumerator() {
    let mut model = new_model();
    let ty = model.add_type(TypeDef::new(TypeKind::Class, "Acme", "Bag"));
    let good = model.add_method(
        Method::new(ty, "GetEnumerator").with_attr(Attr::EnumerateAsArray),
    );
    let bad = model.add_method(Method::new(ty, "Items").with_attr(Attr::EnumerateAsArray));
    let options = CompilerOptions::new();
    let importer = import(&model, &options);
    assert!(importer.get_method_semantics(good).enumerate_as_array());
    assert!(!importer.get_method_semantics(bad).enumerate_as_array());
    assert!(importer.diagnostics().contains(DiagnosticCode::E7307));
}

#[test]
fn test_enumerate_as_array_propagates_to_overrides() {
    let mut model = new_model();
    let base = model.add_type(TypeDef::new(TypeKind::Class, "Acme", "Bag"));
    let base_method = model.add_method(
        Method::new(base, "GetEnumerator")
            .virtual_()
            .with_attr(Attr::EnumerateAsArray),
    );
    let derived = model.add_type(
        TypeDef::new(TypeKind::Class, "Acme", "Sack").with_base_class(base),
    );
    let derived_method =
        model.add_method(Method::new(derived, "GetEnumerator").overriding(base_method));
    let options = CompilerOptions::new();
    let importer = import(&model, &options);
    assert!(importer.get_method_semantics(derived_method).enumerate_as_array());
}

#[test]
fn test_delegate_semantics() {
    let mut model = new_model();
    let del = model.add_type(
        TypeDef::new(TypeKind::Delegate, "Acme", "Callback")
            .with_attr(Attr::BindThisToFirstParameter),
    );
    let options = CompilerOptions::new();
    let importer = import(&model, &options);
    assert_eq!(
        *importer.get_delegate_semantics(del),
        DelegateSemantics { expand_params: false, bind_this_to_first_parameter: true }
    );
    assert_eq!(importer.get_type_semantics(del).name, "Function");
}

#[test]
fn test_reservation_blocks_derived_instance_names() {
    let mut model = new_model();
    let base = model.add_type(TypeDef::new(TypeKind::Class, "Acme", "Base"));
    let derived = model.add_type(
        TypeDef::new(TypeKind::Class, "Acme", "Derived").with_base_class(base),
    );
    let options = CompilerOptions::new();
    let mut importer = MetadataImporter::new(&model, &options);
    importer.reserve_member_name(base, "special", false);
    assert!(!importer.is_member_name_available(base, "special", false));
    assert!(!importer.is_member_name_available(derived, "special", false));
    assert!(importer.is_member_name_available(derived, "special", true));
}

#[test]
fn test_plugin_overrides_are_respected() {
    let mut model = new_model();
    let ty = model.add_type(TypeDef::new(TypeKind::Class, "Acme", "Widget"));
    let method = model.add_method(Method::new(ty, "Draw"));
    let options = CompilerOptions::new();
    let mut importer = MetadataImporter::new(&model, &options);
    importer.set_method_semantics(method, MethodSemantics::normal("paint"));
    importer.prepare_all();
    assert_eq!(importer.get_method_semantics(method).script_name(), Some("paint"));
}

#[test]
fn test_backing_field_names_are_memoized_and_counted() {
    let mut model = new_model();
    let ty = model.add_type(TypeDef::new(TypeKind::Class, "Acme", "Widget"));
    let g1 = model.add_method(Method::new(ty, "get_A"));
    let p1 = model.add_property(Property::new(ty, "A").with_getter(g1).auto());
    let g2 = model.add_method(Method::new(ty, "get_B"));
    let p2 = model.add_property(Property::new(ty, "B").with_getter(g2).auto());
    let options = CompilerOptions::new();
    let mut importer = MetadataImporter::new(&model, &options);
    importer.prepare_all();
    let first = importer.get_auto_property_backing_field_name(p1);
    let second = importer.get_auto_property_backing_field_name(p2);
    assert_eq!(first, "$1");
    assert_eq!(second, "$2");
    assert_eq!(importer.get_auto_property_backing_field_name(p1), first);
    assert!(!importer.is_member_name_available(ty, "$1", false));
}

#[test]
fn test_import_is_deterministic() {
    fn build() -> TypeModel {
        let mut model = new_model();
        let iface = model.add_type(TypeDef::new(TypeKind::Interface, "Acme", "IShape"));
        let iface_method = model.add_method(Method::new(iface, "Area"));
        let base = model.add_type(TypeDef::new(TypeKind::Class, "Acme", "Shape"));
        model.add_method(Method::new(base, "Area").virtual_());
        let ty = model.add_type(
            TypeDef::new(TypeKind::Class, "Acme", "Square")
                .with_base_class(base)
                .with_interfaces(vec![iface]),
        );
        model.add_method(Method::new(ty, "Area").implementing(vec![iface_method]));
        model.add_method(Method::new(ty, "Area").with_params(vec![Param::new(
            "scale",
            TypeRef::Dynamic,
        )]));
        let getter = model.add_method(Method::new(ty, "get_Side"));
        model.add_property(Property::new(ty, "Side").with_getter(getter).auto());
        model
    }
    let options = CompilerOptions::new();
    let model_a = build();
    let model_b = build();
    let importer_a = import(&model_a, &options);
    let importer_b = import(&model_b, &options);
    for ty in model_a.type_ids() {
        assert_eq!(
            importer_a.get_type_semantics(ty),
            importer_b.get_type_semantics(ty)
        );
        for &m in &model_a.type_def(ty).methods {
            if !model_a.method(m).is_constructor {
                assert_eq!(
                    importer_a.get_method_semantics(m),
                    importer_b.get_method_semantics(m)
                );
            }
        }
    }
}

#[test]
#[should_panic(expected = "has not been imported")]
fn test_lookup_of_unprepared_symbol_panics() {
    let mut model = new_model();
    let ty = model.add_type(TypeDef::new(TypeKind::Class, "Acme", "Widget"));
    let options = CompilerOptions::new();
    let importer = MetadataImporter::new(&model, &options);
    let _ = importer.get_type_semantics(ty);
}

#[test]
#[should_panic(expected = "base type")]
fn test_prepare_out_of_order_panics() {
    let mut model = new_model();
    let base = model.add_type(TypeDef::new(TypeKind::Class, "Acme", "Base"));
    let derived = model.add_type(
        TypeDef::new(TypeKind::Class, "Acme", "Derived").with_base_class(base),
    );
    let options = CompilerOptions::new();
    let mut importer = MetadataImporter::new(&model, &options);
    importer.prepare(derived);
}
