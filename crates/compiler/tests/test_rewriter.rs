//! Tests for the state-machine rewriter.

use reef_compiler::rewrite::{rewrite_body, RewriteError};
use reef_script::{Expr, ForInit, Stmt, SwitchSection, UnaryOp, VarDeclarator};

fn call(name: &str) -> Stmt {
    Stmt::expr(Expr::call(Expr::ident(name), Vec::new()))
}

fn set_state(state_var: &str, state: i32) -> Stmt {
    let value = if state < 0 {
        Expr::unary(UnaryOp::Negate, Expr::number(-state as f64))
    } else {
        Expr::number(state as f64)
    };
    Stmt::expr(Expr::assign(Expr::ident(state_var), value))
}

fn go(state: i32) -> Vec<Stmt> {
    vec![set_state("$state1", state), Stmt::Continue(Some("$loop1".into()))]
}

fn case(state: i32, body: Vec<Stmt>) -> SwitchSection {
    SwitchSection { labels: vec![Some(Expr::number(state as f64))], body }
}

fn machine(state_var: &str, loop_label: &str, hoisted: &[&str], sections: Vec<SwitchSection>) -> Vec<Stmt> {
    let mut declarators = vec![VarDeclarator::new(state_var, Some(Expr::number(0.0)))];
    for name in hoisted {
        declarators.push(VarDeclarator::new(*name, None));
    }
    vec![
        Stmt::Var(declarators),
        Stmt::labeled(
            loop_label,
            Stmt::for_ever(Stmt::Block(vec![Stmt::Switch {
                discriminant: Expr::ident(state_var),
                sections,
            }])),
        ),
    ]
}

/// A body with no labels, jumps or exception regions is returned unchanged.
#[test]
fn test_preservation_of_plain_bodies() {
    let body = vec![
        call("a"),
        Stmt::if_then(Expr::ident("c"), call("b")),
        Stmt::While { test: Expr::ident("c"), body: Box::new(call("d")) },
        Stmt::Try { body: vec![call("e")], catch: None, finally: Some(vec![call("f")]) },
        Stmt::Return(None),
    ];
    assert_eq!(rewrite_body(body.clone()).unwrap(), body);
}

/// `a; b; lbl1: if (c) goto lbl2; d; lbl2: e; f;` becomes a three-state
/// dispatch loop.
#[test]
fn test_composite_goto_rewrite() {
    let body = vec![
        call("a"),
        call("b"),
        Stmt::labeled(
            "lbl1",
            Stmt::if_then(Expr::ident("c"), Stmt::Goto("lbl2".into())),
        ),
        call("d"),
        Stmt::labeled("lbl2", call("e")),
        call("f"),
    ];
    let rewritten = rewrite_body(body).unwrap();

    let mut case1 = vec![Stmt::If {
        test: Expr::ident("c"),
        then_branch: Box::new(Stmt::Block(go(2))),
        else_branch: None,
    }];
    case1.push(call("d"));
    case1.extend(go(2));

    let mut case0 = vec![call("a"), call("b")];
    case0.extend(go(1));
    let mut case2 = vec![call("e"), call("f")];
    case2.push(set_state("$state1", -1));
    case2.push(Stmt::Break(Some("$loop1".into())));

    let expected = machine(
        "$state1",
        "$loop1",
        &[],
        vec![case(0, case0), case(1, case1), case(2, case2)],
    );
    assert_eq!(rewritten, expected);
}

/// A goto out of a try lands in the outer machine: the transition assigns
/// the target state and continues the outer loop from inside the inner one.
#[test]
fn test_nested_try_with_outer_label_goto() {
    let body = vec![
        call("a"),
        Stmt::Try {
            body: vec![call("b"), Stmt::Goto("lbl2".into())],
            catch: None,
            finally: Some(vec![call("f")]),
        },
        call("c"),
        Stmt::labeled("lbl2", call("d")),
    ];
    let rewritten = rewrite_body(body).unwrap();

    let mut inner_case = vec![call("b")];
    inner_case.extend(go(3));
    let inner_machine = Stmt::labeled(
        "$loop2",
        Stmt::for_ever(Stmt::Block(vec![Stmt::Switch {
            discriminant: Expr::ident("$state1"),
            sections: vec![
                case(1, inner_case),
                SwitchSection {
                    labels: vec![None],
                    body: vec![Stmt::Break(Some("$loop2".into()))],
                },
            ],
        }])),
    );

    let mut case0 = vec![call("a")];
    case0.extend(go(1));
    let mut case1 = vec![Stmt::Try {
        body: vec![inner_machine],
        catch: None,
        finally: Some(vec![call("f")]),
    }];
    case1.extend(go(2));
    let mut case2 = vec![call("c")];
    case2.extend(go(3));
    let mut case3 = vec![call("d")];
    case3.push(set_state("$state1", -1));
    case3.push(Stmt::Break(Some("$loop1".into())));

    let expected = machine(
        "$state1",
        "$loop1",
        &[],
        vec![case(0, case0), case(1, case1), case(2, case2), case(3, case3)],
    );
    assert_eq!(rewritten, expected);
}

/// Function expressions are opaque: their labels survive untouched.
#[test]
fn test_nested_functions_untouched() {
    let inner_function = Expr::Function(reef_script::FunctionExpr {
        name: None,
        params: vec!["x".into()],
        body: vec![Stmt::labeled(
            "inner",
            Stmt::While {
                test: Expr::ident("x"),
                body: Box::new(Stmt::Break(Some("inner".into()))),
            },
        )],
    });
    let body = vec![
        Stmt::var("g", Some(inner_function.clone())),
        Stmt::labeled("lbl", call("g")),
        Stmt::Goto("lbl".into()),
    ];
    let rewritten = rewrite_body(body).unwrap();

    // the function travels into the hoisted initializer assignment unchanged
    let Stmt::Labeled { body: loop_body, .. } = &rewritten[1] else {
        panic!("expected the dispatch loop");
    };
    let text = format!("{loop_body:?}");
    assert!(text.contains("inner"));
    let mut case0 = vec![Stmt::expr(Expr::assign(Expr::ident("g"), inner_function))];
    case0.extend(go(1));
    let mut case1 = vec![call("g")];
    case1.extend(go(1));
    let expected = machine("$state1", "$loop1", &["g"], vec![case(0, case0), case(1, case1)]);
    assert_eq!(rewritten, expected);
}

/// Declarations are hoisted into one statement before the loop; the original
/// initializers run as assignments in their section.
#[test]
fn test_variable_hoisting() {
    let body = vec![
        Stmt::Var(vec![
            VarDeclarator::new("a", Some(Expr::number(0.0))),
            VarDeclarator::new("b", Some(Expr::number(0.0))),
            VarDeclarator::new("c", None),
        ]),
        Stmt::Var(vec![VarDeclarator::new("d", None), VarDeclarator::new("e", None)]),
        Stmt::For {
            init: Some(ForInit::Var(vec![
                VarDeclarator::new("f", Some(Expr::number(0.0))),
                VarDeclarator::new("g", Some(Expr::number(1.0))),
                VarDeclarator::new("h", None),
            ])),
            test: Some(Expr::ident("t")),
            update: Some(Expr::call(Expr::ident("u"), Vec::new())),
            body: Box::new(call("q")),
        },
        Stmt::labeled("lbl", Stmt::Goto("lbl".into())),
    ];
    let rewritten = rewrite_body(body).unwrap();

    let Stmt::Var(declarators) = &rewritten[0] else {
        panic!("expected the hoisted declaration first");
    };
    let names: Vec<&str> = declarators.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, ["$state1", "a", "b", "c", "d", "e", "f", "g", "h"]);
    assert_eq!(declarators[0].init, Some(Expr::number(0.0)));
    assert!(declarators[1..].iter().all(|d| d.init.is_none()));

    let expected_for = Stmt::For {
        init: Some(ForInit::Expr(Expr::Comma(vec![
            Expr::assign(Expr::ident("f"), Expr::number(0.0)),
            Expr::assign(Expr::ident("g"), Expr::number(1.0)),
        ]))),
        test: Some(Expr::ident("t")),
        update: Some(Expr::call(Expr::ident("u"), Vec::new())),
        body: Box::new(call("q")),
    };
    let mut case0 = vec![
        Stmt::expr(Expr::assign(Expr::ident("a"), Expr::number(0.0))),
        Stmt::expr(Expr::assign(Expr::ident("b"), Expr::number(0.0))),
        expected_for,
    ];
    case0.extend(go(1));
    let expected = machine(
        "$state1",
        "$loop1",
        &["a", "b", "c", "d", "e", "f", "g", "h"],
        vec![case(0, case0), case(1, go(1))],
    );
    assert_eq!(rewritten, expected);
}

/// Rewriting is idempotent once the body is in loop-and-switch form.
#[test]
fn test_idempotence() {
    let body = vec![
        call("a"),
        Stmt::labeled(
            "lbl1",
            Stmt::if_then(Expr::ident("c"), Stmt::Goto("lbl2".into())),
        ),
        Stmt::labeled("lbl2", call("e")),
    ];
    let once = rewrite_body(body).unwrap();
    let twice = rewrite_body(once.clone()).unwrap();
    assert_eq!(once, twice);
}

/// An empty try body still gets the framing machine, with a default arm
/// only.
#[test]
fn test_empty_try_frames_with_default_arm() {
    let body = vec![
        Stmt::Try { body: Vec::new(), catch: None, finally: Some(vec![call("f")]) },
        Stmt::labeled("lbl", Stmt::Goto("lbl".into())),
    ];
    let rewritten = rewrite_body(body).unwrap();
    let text = format!("{rewritten:?}");
    assert!(text.contains("$loop2"));

    // locate the try and check its dispatch has only the default arm
    fn find_try(stmts: &[Stmt]) -> Option<&Stmt> {
        for stmt in stmts {
            match stmt {
                Stmt::Try { .. } => return Some(stmt),
                Stmt::Labeled { body, .. } => {
                    if let Some(t) = find_try(std::slice::from_ref(body)) {
                        return Some(t);
                    }
                }
                Stmt::For { body, .. } => {
                    if let Some(t) = find_try(std::slice::from_ref(body)) {
                        return Some(t);
                    }
                }
                Stmt::Block(inner) => {
                    if let Some(t) = find_try(inner) {
                        return Some(t);
                    }
                }
                Stmt::Switch { sections, .. } => {
                    for section in sections {
                        if let Some(t) = find_try(&section.body) {
                            return Some(t);
                        }
                    }
                }
                _ => {}
            }
        }
        None
    }
    let Some(Stmt::Try { body: try_body, .. }) = find_try(&rewritten) else {
        panic!("expected a try statement in the rewritten body");
    };
    let Stmt::Labeled { body: loop_body, .. } = &try_body[0] else {
        panic!("expected the framing loop");
    };
    let Stmt::For { body: for_body, .. } = &**loop_body else {
        panic!("expected the dispatch loop");
    };
    let Stmt::Block(for_stmts) = &**for_body else {
        panic!("expected a block");
    };
    let Stmt::Switch { sections, .. } = &for_stmts[0] else {
        panic!("expected the dispatch switch");
    };
    assert_eq!(sections.len(), 1);
    assert_eq!(sections[0].labels, vec![None]);
}

/// A catch block containing a goto becomes an independent machine with its
/// own state variable.
#[test]
fn test_catch_with_goto_gets_independent_machine() {
    let body = vec![
        Stmt::Try {
            body: vec![call("a")],
            catch: Some(reef_script::CatchClause {
                name: "ex".into(),
                body: vec![call("h"), Stmt::Goto("done".into())],
            }),
            finally: None,
        },
        Stmt::labeled("done", call("d")),
    ];
    let rewritten = rewrite_body(body).unwrap();
    let text = format!("{rewritten:?}");
    assert!(text.contains("$state2"), "catch machine should use a fresh state variable");
    assert!(!text.contains("Goto"), "all gotos must be resolved");
}

/// Labels inside a loop decompose the loop into test, body and update
/// sections; break and continue become transitions.
#[test]
fn test_loop_with_internal_label_is_decomposed() {
    let body = vec![
        Stmt::labeled(
            "outer",
            Stmt::While {
                test: Expr::ident("t"),
                body: Box::new(Stmt::Block(vec![
                    Stmt::labeled("again", call("x")),
                    Stmt::if_then(Expr::ident("c"), Stmt::Break(Some("outer".into()))),
                    Stmt::Goto("again".into()),
                ])),
            },
        ),
        call("z"),
    ];
    let rewritten = rewrite_body(body).unwrap();
    let text = format!("{rewritten:?}");
    assert!(!text.contains("While"), "the labeled loop should be decomposed");
    assert!(!text.contains("Goto"), "all gotos must be resolved");
    // the body still writes out as valid script
    let no_types = |_: reef_script::ScriptTypeId| -> String { unreachable!() };
    reef_script::ScriptWriter::new(&no_types).write_module(&rewritten).unwrap();
}

/// A jump to a label that exists nowhere is an internal error.
#[test]
fn test_undefined_label_is_an_error() {
    let body = vec![call("a"), Stmt::Goto("nowhere".into())];
    assert_eq!(
        rewrite_body(body),
        Err(RewriteError::UndefinedLabel("nowhere".into()))
    );
}

/// Unreachable statements after a goto stay in their section.
#[test]
fn test_statements_after_goto_are_kept() {
    let body = vec![
        Stmt::labeled("top", call("a")),
        Stmt::Goto("top".into()),
        call("never"),
    ];
    let rewritten = rewrite_body(body).unwrap();
    let text = format!("{rewritten:?}");
    assert!(text.contains("never"));
}

/// The synthesized names avoid identifiers already used in the body.
#[test]
fn test_fresh_names_avoid_collisions() {
    let body = vec![
        Stmt::var("$state1", Some(Expr::number(7.0))),
        Stmt::labeled("$loop1", call("a")),
        Stmt::labeled("lbl", Stmt::Goto("lbl".into())),
    ];
    let rewritten = rewrite_body(body).unwrap();
    let Stmt::Var(declarators) = &rewritten[0] else {
        panic!("expected hoisted declaration");
    };
    assert_eq!(declarators[0].name, "$state2");
    let Stmt::Labeled { label, .. } = &rewritten[1] else {
        panic!("expected dispatch loop");
    };
    assert_eq!(label, "$loop2");
}
