//! Tests for the constructor pipeline.

use reef_compiler::diag::DiagnosticCode;
use reef_compiler::import::{ConstructorSemantics, MemberRef};
use reef_compiler::model::{
    Assembly, Attr, Field, Method, Param, TypeDef, TypeKind, TypeModel, TypeRef,
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
fn test_first_nameless_constructor_is_unnamed_and_later_ones_numbered() {
    let mut model = new_model();
    let ty = model.add_type(TypeDef::new(TypeKind::Class, "Acme", "Widget"));
    let first = model.add_method(Method::constructor(ty));
    let second = model.add_method(
        Method::constructor(ty).with_params(vec![Param::new("size", TypeRef::Dynamic)]),
    );
    let third = model.add_method(Method::constructor(ty).with_params(vec![
        Param::new("size", TypeRef::Dynamic),
        Param::new("title", TypeRef::Dynamic),
    ]));
    let options = CompilerOptions::new();
    let importer = import(&model, &options);
    assert!(matches!(
        importer.get_constructor_semantics(first),
        ConstructorSemantics::Unnamed { generate_code: true, .. }
    ));
    assert_eq!(
        importer.get_constructor_semantics(second).script_name(),
        Some("$ctor2")
    );
    assert_eq!(
        importer.get_constructor_semantics(third).script_name(),
        Some("$ctor3")
    );
}

#[test]
fn test_named_constructor() {
    let mut model = new_model();
    let ty = model.add_type(TypeDef::new(TypeKind::Class, "Acme", "Widget"));
    let ctor = model.add_method(
        Method::constructor(ty).with_attr(Attr::ScriptName("fromTitle".into())),
    );
    let options = CompilerOptions::new();
    let importer = import(&model, &options);
    assert!(matches!(
        importer.get_constructor_semantics(ctor),
        ConstructorSemantics::Named { name, .. } if name == "fromTitle"
    ));
}

#[test]
fn test_ctor_marker_name_means_unnamed() {
    let mut model = new_model();
    let ty = model.add_type(TypeDef::new(TypeKind::Class, "Acme", "Widget"));
    let ctor = model.add_method(
        Method::constructor(ty).with_attr(Attr::ScriptName("$ctor".into())),
    );
    let options = CompilerOptions::new();
    let importer = import(&model, &options);
    assert!(matches!(
        importer.get_constructor_semantics(ctor),
        ConstructorSemantics::Unnamed { .. }
    ));
}

#[test]
fn test_static_constructor_is_the_unnamed_sentinel() {
    let mut model = new_model();
    let ty = model.add_type(TypeDef::new(TypeKind::Class, "Acme", "Widget"));
    let cctor = model.add_method(Method::constructor(ty).static_());
    let options = CompilerOptions::new();
    let importer = import(&model, &options);
    assert!(matches!(
        importer.get_constructor_semantics(cctor),
        ConstructorSemantics::Unnamed { .. }
    ));
}

#[test]
fn test_placeholder_constructor_is_not_usable() {
    let mut model = new_model();
    let ty = model.add_type(TypeDef::new(TypeKind::Struct, "Acme", "Span"));
    let mut marker = Method::constructor(ty);
    marker.is_placeholder_constructor = true;
    let marker = model.add_method(marker);
    let options = CompilerOptions::new();
    let importer = import(&model, &options);
    assert_eq!(
        *importer.get_constructor_semantics(marker),
        ConstructorSemantics::NotUsable
    );
}

#[test]
fn test_serializable_constructor_is_a_static_method() {
    let mut model = new_model();
    let ty = model.add_type(
        TypeDef::new(TypeKind::Class, "Acme", "Point").with_attr(Attr::Serializable),
    );
    let ctor = model.add_method(Method::constructor(ty));
    let options = CompilerOptions::new();
    let importer = import(&model, &options);
    assert!(matches!(
        importer.get_constructor_semantics(ctor),
        ConstructorSemantics::StaticMethod { name, .. } if name == "$ctor"
    ));
}

#[test]
fn test_record_constructor_binds_parameters_to_members() {
    let mut model = new_model();
    let int = model.add_type(TypeDef::new(TypeKind::Struct, "System", "Int32"));
    let ty = model.add_type(
        TypeDef::new(TypeKind::Class, "Acme", "Entry").with_attr(Attr::Serializable),
    );
    let id_field = model.add_field(Field::new(ty, "Id", TypeRef::Def(int)));
    let ctor = model.add_method(
        Method::constructor(ty)
            .with_params(vec![Param::new("id", TypeRef::Def(int))])
            .with_attr(Attr::ObjectLiteral),
    );
    let options = CompilerOptions::new();
    let importer = import(&model, &options);
    assert_eq!(
        *importer.get_constructor_semantics(ctor),
        ConstructorSemantics::Json {
            parameter_to_member: vec![MemberRef::Field(id_field)],
            skip_in_initializer: true,
        }
    );
}

#[test]
fn test_record_constructor_type_mismatch_falls_back_to_unnamed() {
    let mut model = new_model();
    let int = model.add_type(TypeDef::new(TypeKind::Struct, "System", "Int32"));
    let string = model.add_type(TypeDef::new(TypeKind::Class, "System", "String"));
    let ty = model.add_type(
        TypeDef::new(TypeKind::Class, "Acme", "Entry").with_attr(Attr::Serializable),
    );
    model.add_field(Field::new(ty, "Id", TypeRef::Def(int)));
    let ctor = model.add_method(
        Method::constructor(ty)
            .with_params(vec![Param::new("id", TypeRef::Def(string))])
            .with_attr(Attr::ObjectLiteral),
    );
    let options = CompilerOptions::new();
    let importer = import(&model, &options);
    assert!(importer.diagnostics().contains(DiagnosticCode::E7502));
    assert!(matches!(
        importer.get_constructor_semantics(ctor),
        ConstructorSemantics::Unnamed { .. }
    ));
}

#[test]
fn test_record_constructor_unmatched_parameter_reported() {
    let mut model = new_model();
    let ty = model.add_type(
        TypeDef::new(TypeKind::Class, "Acme", "Entry").with_attr(Attr::Serializable),
    );
    let ctor = model.add_method(
        Method::constructor(ty)
            .with_params(vec![Param::new("missing", TypeRef::Dynamic)])
            .with_attr(Attr::ObjectLiteral),
    );
    let options = CompilerOptions::new();
    let importer = import(&model, &options);
    assert!(importer.diagnostics().contains(DiagnosticCode::E7501));
    assert!(matches!(
        importer.get_constructor_semantics(ctor),
        ConstructorSemantics::Unnamed { .. }
    ));
}

#[test]
fn test_alternate_signature_shares_the_main_name_without_code() {
    let mut model = new_model();
    let ty = model.add_type(TypeDef::new(TypeKind::Class, "Acme", "Widget"));
    let alternate = model.add_method(
        Method::constructor(ty).with_attr(Attr::AlternateSignature),
    );
    let main = model.add_method(
        Method::constructor(ty)
            .with_params(vec![Param::new("size", TypeRef::Dynamic)])
            .with_attr(Attr::ScriptName("make".into())),
    );
    let options = CompilerOptions::new();
    let importer = import(&model, &options);
    assert!(matches!(
        importer.get_constructor_semantics(alternate),
        ConstructorSemantics::Named { name, generate_code: false, .. } if name == "make"
    ));
    assert!(matches!(
        importer.get_constructor_semantics(main),
        ConstructorSemantics::Named { name, generate_code: true, .. } if name == "make"
    ));
}

#[test]
fn test_alternate_signature_without_single_main_reported() {
    let mut model = new_model();
    let ty = model.add_type(TypeDef::new(TypeKind::Class, "Acme", "Widget"));
    model.add_method(Method::constructor(ty).with_attr(Attr::AlternateSignature));
    let options = CompilerOptions::new();
    let importer = import(&model, &options);
    assert!(importer.diagnostics().contains(DiagnosticCode::E7503));
}

#[test]
fn test_imported_params_object_constructor_builds_a_dictionary() {
    let mut model = new_model();
    let ty = model.add_type(
        TypeDef::new(TypeKind::Class, "Acme", "Options")
            .with_attr(Attr::Imported { obeys_type_system: true }),
    );
    let ctor = model.add_method(Method::constructor(ty).with_params(vec![
        Param::new("pairs", TypeRef::array(TypeRef::Dynamic)).params_array(),
    ]));
    let options = CompilerOptions::new();
    let importer = import(&model, &options);
    assert_eq!(
        *importer.get_constructor_semantics(ctor),
        ConstructorSemantics::InlineCode {
            code: "{$Script}.mkdict({*pairs})".into(),
            skip_in_initializer: false,
        }
    );
}

#[test]
fn test_inline_code_constructor() {
    let mut model = new_model();
    let ty = model.add_type(TypeDef::new(TypeKind::Class, "Acme", "Widget"));
    let ctor = model.add_method(Method::constructor(ty).with_params(vec![Param::new(
        "title",
        TypeRef::Dynamic,
    )]).with_attr(
        Attr::InlineCode(reef_compiler::model::InlineCodeAttr {
            code: "{{ title: {title} }}".into(),
            non_virtual_code: None,
            generated_method_name: None,
        }),
    ));
    let options = CompilerOptions::new();
    let importer = import(&model, &options);
    assert!(matches!(
        importer.get_constructor_semantics(ctor),
        ConstructorSemantics::InlineCode { code, .. } if code == "{{ title: {title} }}"
    ));
}

#[test]
fn test_serializable_imported_constructor_is_json_without_attribute() {
    let mut model = new_model();
    let ty = model.add_type(
        TypeDef::new(TypeKind::Class, "Acme", "Record")
            .with_attr(Attr::Serializable)
            .with_attr(Attr::Imported { obeys_type_system: true }),
    );
    let name_field = model.add_field(Field::new(ty, "Name", TypeRef::Dynamic));
    let ctor = model.add_method(
        Method::constructor(ty).with_params(vec![Param::new("name", TypeRef::Dynamic)]),
    );
    let options = CompilerOptions::new();
    let importer = import(&model, &options);
    assert_eq!(
        *importer.get_constructor_semantics(ctor),
        ConstructorSemantics::Json {
            parameter_to_member: vec![MemberRef::Field(name_field)],
            skip_in_initializer: true,
        }
    );
}
