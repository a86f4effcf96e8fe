use criterion::{black_box, criterion_group, criterion_main, Criterion};
use reef_compiler::rewrite::rewrite_body;
use reef_script::{Expr, Stmt};

/// A long chain of labeled sections with forward and backward jumps.
fn goto_chain(sections: usize) -> Vec<Stmt> {
    let mut body = Vec::new();
    for i in 0..sections {
        body.push(Stmt::labeled(
            format!("l{i}"),
            Stmt::expr(Expr::call(Expr::ident("work"), vec![Expr::number(i as f64)])),
        ));
        if i % 3 == 0 && i + 2 < sections {
            body.push(Stmt::if_then(
                Expr::ident("cond"),
                Stmt::Goto(format!("l{}", i + 2)),
            ));
        }
    }
    body.push(Stmt::Goto("l0".into()));
    body
}

fn nested_tries(depth: usize) -> Vec<Stmt> {
    let mut body = vec![
        Stmt::expr(Expr::call(Expr::ident("innermost"), Vec::new())),
        Stmt::Goto("out".into()),
    ];
    for _ in 0..depth {
        body = vec![Stmt::Try {
            body,
            catch: None,
            finally: Some(vec![Stmt::expr(Expr::call(Expr::ident("cleanup"), Vec::new()))]),
        }];
    }
    body.push(Stmt::labeled(
        "out",
        Stmt::expr(Expr::call(Expr::ident("done"), Vec::new())),
    ));
    body
}

fn bench_rewriter(c: &mut Criterion) {
    let chain = goto_chain(120);
    c.bench_function("rewrite_goto_chain_120", |b| {
        b.iter(|| rewrite_body(black_box(chain.clone())).unwrap())
    });

    let tries = nested_tries(16);
    c.bench_function("rewrite_nested_tries_16", |b| {
        b.iter(|| rewrite_body(black_box(tries.clone())).unwrap())
    });
}

criterion_group!(benches, bench_rewriter);
criterion_main!(benches);
