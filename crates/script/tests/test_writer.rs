//! Integration tests for the script writer.

use reef_script::{
    CatchClause, Expr, ForInit, ScriptTypeId, ScriptWriter, Stmt, SwitchSection, VarDeclarator,
};

fn no_types(_: ScriptTypeId) -> String {
    unreachable!("no type references in this test")
}

#[test]
fn test_dispatch_loop_shape() {
    let body = vec![
        Stmt::Var(vec![VarDeclarator::new("$state1", Some(Expr::number(0.0)))]),
        Stmt::labeled(
            "$loop1",
            Stmt::for_ever(Stmt::Block(vec![Stmt::Switch {
                discriminant: Expr::ident("$state1"),
                sections: vec![
                    SwitchSection {
                        labels: vec![Some(Expr::number(0.0))],
                        body: vec![
                            Stmt::expr(Expr::call(Expr::ident("a"), Vec::new())),
                            Stmt::Continue(Some("$loop1".into())),
                        ],
                    },
                    SwitchSection {
                        labels: vec![None],
                        body: vec![Stmt::Break(Some("$loop1".into()))],
                    },
                ],
            }])),
        ),
    ];
    let text = ScriptWriter::new(&no_types).write_module(&body).unwrap();
    let expected = "\
var $state1 = 0;
$loop1:
for (;;) {
\tswitch ($state1) {
\t\tcase 0:
\t\t\ta();
\t\t\tcontinue $loop1;
\t\tdefault:
\t\t\tbreak $loop1;
\t}
}
";
    assert_eq!(text, expected);
}

#[test]
fn test_try_catch_finally() {
    let stmt = Stmt::Try {
        body: vec![Stmt::expr(Expr::call(Expr::ident("risky"), Vec::new()))],
        catch: Some(CatchClause {
            name: "ex".into(),
            body: vec![Stmt::Throw(Expr::ident("ex"))],
        }),
        finally: Some(vec![Stmt::expr(Expr::call(Expr::ident("cleanup"), Vec::new()))]),
    };
    let text = ScriptWriter::new(&no_types).write_module(&[stmt]).unwrap();
    let expected = "\
try {
\trisky();
}
catch (ex) {
\tthrow ex;
}
finally {
\tcleanup();
}
";
    assert_eq!(text, expected);
}

#[test]
fn test_for_with_expression_init() {
    let stmt = Stmt::For {
        init: Some(ForInit::Expr(Expr::Comma(vec![
            Expr::assign(Expr::ident("i"), Expr::number(0.0)),
            Expr::assign(Expr::ident("j"), Expr::number(1.0)),
        ]))),
        test: Some(Expr::binary(
            reef_script::BinaryOp::Lesser,
            Expr::ident("i"),
            Expr::ident("n"),
        )),
        update: Some(Expr::unary(reef_script::UnaryOp::PostfixIncrement, Expr::ident("i"))),
        body: Box::new(Stmt::Block(vec![Stmt::expr(Expr::call(
            Expr::ident("visit"),
            vec![Expr::ident("i")],
        ))])),
    };
    let text = ScriptWriter::new(&no_types).write_module(&[stmt]).unwrap();
    assert_eq!(text, "for (i = 0, j = 1; i < n; i++) {\n\tvisit(i);\n}\n");
}

#[test]
fn test_object_literal_statement_is_parenthesized() {
    let stmt = Stmt::expr(Expr::Object(vec![reef_script::ObjectProperty {
        name: reef_script::PropertyName::Ident("x".into()),
        value: Expr::number(1.0),
    }]));
    let text = ScriptWriter::new(&no_types).write_module(&[stmt]).unwrap();
    assert_eq!(text, "({ x: 1 });\n");
}

#[test]
fn test_conditional_and_assignment_nesting() {
    let expr = Expr::assign(
        Expr::ident("x"),
        Expr::conditional(
            Expr::binary(reef_script::BinaryOp::Same, Expr::ident("a"), Expr::null()),
            Expr::string("none"),
            Expr::member(Expr::ident("a"), "title"),
        ),
    );
    let text = ScriptWriter::new(&no_types).write_expr(&expr).unwrap();
    assert_eq!(text, "x = a === null ? 'none' : a.title");
}
