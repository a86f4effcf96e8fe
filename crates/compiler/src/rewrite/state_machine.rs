//! Lowering of labels, gotos and exception regions to loop-and-switch
//! dispatch.
//!
//! The body is split into sections at every label boundary and at every
//! entry and exit of a try region. Each section becomes one arm of a
//! `switch` over a numeric state variable inside a labeled infinite loop;
//! control transfers are an assignment of the next state followed by a
//! `continue` of the owning loop label. Try bodies become nested machines
//! that reuse the outer state variable; catch and finally blocks (and loop
//! bodies that cannot be decomposed) become independent machines with a
//! fresh state variable. Function expressions are opaque: they belong to a
//! different closure and are compiled separately.

use reef_script::{Expr, ForInit, Stmt, SwitchSection, UnaryOp, VarDeclarator};
use smallvec::SmallVec;
use std::collections::{HashMap, HashSet};
use std::mem;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RewriteError {
    /// A jump targets a label that does not exist anywhere in the body.
    #[error("goto target `{0}` is not defined")]
    UndefinedLabel(String),
}

/// Rewrite a method body. A body without gotos is returned unchanged, which
/// also makes the rewrite idempotent: rewritten output contains no gotos.
pub fn rewrite_body(body: Vec<Stmt>) -> Result<Vec<Stmt>, RewriteError> {
    if !stmts_contain_goto(&body) {
        return Ok(body);
    }
    let mut ctx = Ctx::new(&body);
    let rewritten = build_independent_machine(&mut ctx, body, &[])?;
    if let Some(label) = find_remaining_goto(&rewritten) {
        return Err(RewriteError::UndefinedLabel(label));
    }
    Ok(rewritten)
}

// ----- shared rewrite context ----------------------------------------------

struct Ctx {
    used: HashSet<String>,
    next_loop: u32,
    next_state_var: u32,
    next_synthetic: u32,
}

impl Ctx {
    fn new(body: &[Stmt]) -> Ctx {
        let mut used = HashSet::new();
        collect_names_stmts(body, &mut used);
        Ctx { used, next_loop: 1, next_state_var: 1, next_synthetic: 1 }
    }

    fn fresh_loop_label(&mut self) -> String {
        loop {
            let candidate = format!("$loop{}", self.next_loop);
            self.next_loop += 1;
            if !self.used.contains(&candidate) {
                return candidate;
            }
        }
    }

    fn fresh_state_var(&mut self) -> String {
        loop {
            let candidate = format!("$state{}", self.next_state_var);
            self.next_state_var += 1;
            if !self.used.contains(&candidate) {
                return candidate;
            }
        }
    }

    fn synthetic_label(&mut self) -> String {
        loop {
            let candidate = format!("$sec{}", self.next_synthetic);
            self.next_synthetic += 1;
            if !self.used.contains(&candidate) {
                self.used.insert(candidate.clone());
                return candidate;
            }
        }
    }
}

/// A decomposed loop whose break and continue have become transitions.
#[derive(Clone)]
struct DecomposedLoop {
    labels: Vec<String>,
    break_to: String,
    continue_to: String,
}

struct Section {
    state: i32,
    body: Vec<Stmt>,
}

enum MachineKind {
    /// Outermost machine of a rewritten block; falling off the end assigns
    /// the finished sentinel and breaks the dispatch loop.
    Root,
    /// Machine for a try body; falling off the end breaks the inner loop so
    /// the enclosing section resumes after the try statement.
    TryBody,
}

// ----- machine assembly -----------------------------------------------------

/// Build a complete machine with its own state variable and hoisted
/// declaration. Used for the outermost body and for catch/finally and
/// non-decomposable loop bodies.
fn build_independent_machine(
    ctx: &mut Ctx,
    body: Vec<Stmt>,
    loop_stack: &[DecomposedLoop],
) -> Result<Vec<Stmt>, RewriteError> {
    let state_var = ctx.fresh_state_var();
    let loop_label = ctx.fresh_loop_label();
    let mut next_state = 1;
    let mut hoisted = Vec::new();
    let mut builder = MachineBuilder {
        ctx,
        state_var: state_var.clone(),
        loop_label: loop_label.clone(),
        next_state: &mut next_state,
        hoisted: &mut hoisted,
        loop_stack: loop_stack.to_vec(),
        sections: Vec::new(),
        labels: HashMap::new(),
        current: Vec::new(),
        current_state: 0,
    };
    builder.process_stmts(body)?;
    let (mut sections, labels) = builder.finish(MachineKind::Root);
    fixup_sections(&mut sections, &labels, &state_var, &loop_label);

    let mut declarators = vec![VarDeclarator::new(state_var.clone(), Some(Expr::number(0.0)))];
    let mut seen: HashSet<&str> = HashSet::new();
    for name in &hoisted {
        if name != &state_var && seen.insert(name.as_str()) {
            declarators.push(VarDeclarator::new(name.clone(), None));
        }
    }
    Ok(vec![
        Stmt::Var(declarators),
        Stmt::labeled(
            loop_label,
            Stmt::for_ever(Stmt::Block(vec![dispatch_switch(&state_var, sections, None)])),
        ),
    ])
}

fn dispatch_switch(
    state_var: &str,
    sections: Vec<Section>,
    default_breaks: Option<&str>,
) -> Stmt {
    let mut switch_sections: Vec<SwitchSection> = sections
        .into_iter()
        .map(|s| SwitchSection {
            labels: vec![Some(Expr::number(s.state as f64))],
            body: s.body,
        })
        .collect();
    if let Some(loop_label) = default_breaks {
        switch_sections.push(SwitchSection {
            labels: vec![None],
            body: vec![Stmt::Break(Some(loop_label.to_string()))],
        });
    }
    Stmt::Switch { discriminant: Expr::ident(state_var), sections: switch_sections }
}

fn finished_sentinel() -> Expr {
    Expr::unary(UnaryOp::Negate, Expr::number(1.0))
}

// ----- the section builder --------------------------------------------------

struct MachineBuilder<'c> {
    ctx: &'c mut Ctx,
    state_var: String,
    loop_label: String,
    next_state: &'c mut i32,
    hoisted: &'c mut Vec<String>,
    loop_stack: Vec<DecomposedLoop>,
    sections: Vec<Section>,
    labels: HashMap<String, i32>,
    current: Vec<Stmt>,
    current_state: i32,
}

impl MachineBuilder<'_> {
    /// Close the current section and begin a new one carrying `labels`. When
    /// the current section is still empty the labels just alias its state.
    fn begin_section(&mut self, labels: Vec<String>) {
        if self.current.is_empty() {
            for label in labels {
                self.labels.insert(label, self.current_state);
            }
            return;
        }
        let state = *self.next_state;
        *self.next_state += 1;
        if !ends_with_jump(&self.current) {
            self.current.push(Stmt::Goto(labels[0].clone()));
        }
        for label in labels {
            self.labels.insert(label, state);
        }
        let body = mem::take(&mut self.current);
        self.sections.push(Section { state: self.current_state, body });
        self.current_state = state;
    }

    fn finish(mut self, kind: MachineKind) -> (Vec<Section>, HashMap<String, i32>) {
        if !ends_with_jump(&self.current) {
            match kind {
                MachineKind::Root => {
                    self.current.push(Stmt::expr(Expr::assign(
                        Expr::ident(&self.state_var),
                        finished_sentinel(),
                    )));
                    self.current.push(Stmt::Break(Some(self.loop_label.clone())));
                }
                MachineKind::TryBody => {
                    self.current.push(Stmt::Break(Some(self.loop_label.clone())));
                }
            }
        }
        let body = mem::take(&mut self.current);
        self.sections.push(Section { state: self.current_state, body });
        (self.sections, self.labels)
    }

    fn process_stmts(&mut self, stmts: Vec<Stmt>) -> Result<(), RewriteError> {
        for stmt in stmts {
            self.process_stmt(stmt)?;
        }
        Ok(())
    }

    fn process_stmt(&mut self, stmt: Stmt) -> Result<(), RewriteError> {
        match stmt {
            Stmt::Block(inner) => self.process_stmts(inner),
            Stmt::Labeled { label, body } => {
                let (labels, inner) = peel_labels(label, body);
                self.process_labeled(labels, inner)
            }
            Stmt::Goto(label) => {
                self.current.push(Stmt::Goto(label));
                Ok(())
            }
            Stmt::Break(label) => {
                match self.resolve_jump(label.as_deref(), JumpKind::Break) {
                    Some(target) => self.current.push(Stmt::Goto(target)),
                    None => self.current.push(Stmt::Break(label)),
                }
                Ok(())
            }
            Stmt::Continue(label) => {
                match self.resolve_jump(label.as_deref(), JumpKind::Continue) {
                    Some(target) => self.current.push(Stmt::Goto(target)),
                    None => self.current.push(Stmt::Continue(label)),
                }
                Ok(())
            }
            Stmt::Var(declarators) => {
                for declarator in declarators {
                    self.hoisted.push(declarator.name.clone());
                    if let Some(init) = declarator.init {
                        self.current.push(Stmt::expr(Expr::assign(
                            Expr::ident(declarator.name),
                            init,
                        )));
                    }
                }
                Ok(())
            }
            Stmt::Try { body, catch, finally } => self.process_try(body, catch, finally),
            Stmt::If { test, then_branch, else_branch } => {
                if stmt_contains_label(&then_branch)
                    || else_branch.as_deref().is_some_and(stmt_contains_label)
                {
                    self.decompose_if(test, *then_branch, else_branch.map(|b| *b))
                } else {
                    self.append_intact(Stmt::If { test, then_branch, else_branch });
                    Ok(())
                }
            }
            Stmt::While { test, body } => {
                if stmt_contains_label(&body) {
                    self.decompose_while(Vec::new(), test, *body)
                } else {
                    self.append_intact(Stmt::While { test, body });
                    Ok(())
                }
            }
            Stmt::DoWhile { body, test } => {
                if stmt_contains_label(&body) {
                    self.decompose_do_while(Vec::new(), *body, test)
                } else {
                    self.append_intact(Stmt::DoWhile { body, test });
                    Ok(())
                }
            }
            Stmt::For { init, test, update, body } => {
                if stmt_contains_label(&body) {
                    self.decompose_for(Vec::new(), init, test, update, *body)
                } else {
                    self.append_intact(Stmt::For { init, test, update, body });
                    Ok(())
                }
            }
            Stmt::ForIn { is_declared, name, object, body } => {
                self.process_for_in(Vec::new(), is_declared, name, object, *body)
            }
            Stmt::Switch { discriminant, sections } => {
                self.process_switch(Vec::new(), discriminant, sections)
            }
            other => {
                self.append_intact(other);
                Ok(())
            }
        }
    }

    fn process_labeled(&mut self, labels: Vec<String>, inner: Stmt) -> Result<(), RewriteError> {
        match inner {
            Stmt::While { test, body } if stmt_contains_label(&body) => {
                self.decompose_while(labels, test, *body)
            }
            Stmt::DoWhile { body, test } if stmt_contains_label(&body) => {
                self.decompose_do_while(labels, *body, test)
            }
            Stmt::For { init, test, update, body } if stmt_contains_label(&body) => {
                self.decompose_for(labels, init, test, update, *body)
            }
            Stmt::ForIn { is_declared, name, object, body } => {
                self.begin_section(labels.clone());
                self.process_for_in(labels, is_declared, name, object, *body)
            }
            Stmt::Switch { discriminant, sections } => {
                self.begin_section(labels.clone());
                self.process_switch(labels, discriminant, sections)
            }
            inner @ (Stmt::While { .. } | Stmt::DoWhile { .. } | Stmt::For { .. }) => {
                // the label stays on the loop so break/continue keep working
                self.begin_section(labels.clone());
                self.append_intact(relabel(labels, inner));
                Ok(())
            }
            inner => {
                self.begin_section(labels);
                self.process_stmt(inner)
            }
        }
    }

    fn resolve_jump(&self, label: Option<&str>, kind: JumpKind) -> Option<String> {
        let frame = match label {
            None => self.loop_stack.last(),
            Some(label) => self
                .loop_stack
                .iter()
                .rev()
                .find(|f| f.labels.iter().any(|l| l == label)),
        }?;
        Some(match kind {
            JumpKind::Break => frame.break_to.clone(),
            JumpKind::Continue => frame.continue_to.clone(),
        })
    }

    fn append_intact(&mut self, stmt: Stmt) {
        let stmt = hoist_vars_stmt(stmt, self.hoisted);
        let stmt = replace_jumps_stmt(stmt, &self.loop_stack, true, true);
        self.current.push(stmt);
    }

    // ----- try regions -----------------------------------------------------

    fn process_try(
        &mut self,
        body: Vec<Stmt>,
        catch: Option<reef_script::CatchClause>,
        finally: Option<Vec<Stmt>>,
    ) -> Result<(), RewriteError> {
        let try_label = self.ctx.synthetic_label();
        let after_label = self.ctx.synthetic_label();
        self.begin_section(vec![try_label]);
        let try_state = self.current_state;

        let inner_loop = self.ctx.fresh_loop_label();
        let inner_stmts = if body.is_empty() {
            // framing machine with a default arm only
            vec![dispatch_switch(&self.state_var, Vec::new(), Some(&inner_loop))]
        } else {
            let mut inner = MachineBuilder {
                ctx: &mut *self.ctx,
                state_var: self.state_var.clone(),
                loop_label: inner_loop.clone(),
                next_state: &mut *self.next_state,
                hoisted: &mut *self.hoisted,
                loop_stack: self.loop_stack.clone(),
                sections: Vec::new(),
                labels: HashMap::new(),
                current: Vec::new(),
                current_state: try_state,
            };
            inner.process_stmts(body)?;
            let (mut sections, labels) = inner.finish(MachineKind::TryBody);
            fixup_sections(&mut sections, &labels, &self.state_var, &inner_loop);
            vec![dispatch_switch(&self.state_var, sections, Some(&inner_loop))]
        };

        let catch = match catch {
            Some(clause) => Some(reef_script::CatchClause {
                name: clause.name,
                body: self.rewrite_handler_block(clause.body)?,
            }),
            None => None,
        };
        let finally = match finally {
            Some(block) => Some(self.rewrite_handler_block(block)?),
            None => None,
        };

        self.current.push(Stmt::Try {
            body: vec![Stmt::labeled(
                inner_loop,
                Stmt::for_ever(Stmt::Block(inner_stmts)),
            )],
            catch,
            finally,
        });
        self.current.push(Stmt::Goto(after_label.clone()));
        self.begin_section(vec![after_label]);
        Ok(())
    }

    /// Catch and finally blocks are independent: when they contain jumps
    /// they get a machine with a fresh state variable, otherwise they only
    /// get variable hoisting and jump replacement.
    fn rewrite_handler_block(&mut self, body: Vec<Stmt>) -> Result<Vec<Stmt>, RewriteError> {
        if stmts_contain_goto(&body) {
            let replaced = body
                .into_iter()
                .map(|s| replace_jumps_stmt(s, &self.loop_stack, true, true))
                .collect();
            build_independent_machine(self.ctx, replaced, &self.loop_stack)
        } else {
            Ok(body
                .into_iter()
                .map(|s| {
                    let s = hoist_vars_stmt(s, self.hoisted);
                    replace_jumps_stmt(s, &self.loop_stack, true, true)
                })
                .collect())
        }
    }

    // ----- decomposed compounds --------------------------------------------

    fn decompose_if(
        &mut self,
        test: Expr,
        then_branch: Stmt,
        else_branch: Option<Stmt>,
    ) -> Result<(), RewriteError> {
        let then_label = self.ctx.synthetic_label();
        let after_label = self.ctx.synthetic_label();
        match else_branch {
            Some(else_branch) => {
                let else_label = self.ctx.synthetic_label();
                self.current.push(Stmt::if_then(
                    test,
                    Stmt::Block(vec![Stmt::Goto(then_label.clone())]),
                ));
                self.current.push(Stmt::Goto(else_label.clone()));
                self.begin_section(vec![then_label]);
                self.process_stmt(then_branch)?;
                if !ends_with_jump(&self.current) {
                    self.current.push(Stmt::Goto(after_label.clone()));
                }
                self.begin_section(vec![else_label]);
                self.process_stmt(else_branch)?;
                self.begin_section(vec![after_label]);
            }
            None => {
                self.current.push(Stmt::if_then(
                    test,
                    Stmt::Block(vec![Stmt::Goto(then_label.clone())]),
                ));
                self.current.push(Stmt::Goto(after_label.clone()));
                self.begin_section(vec![then_label]);
                self.process_stmt(then_branch)?;
                self.begin_section(vec![after_label]);
            }
        }
        Ok(())
    }

    fn decompose_while(
        &mut self,
        source_labels: Vec<String>,
        test: Expr,
        body: Stmt,
    ) -> Result<(), RewriteError> {
        let test_label = self.ctx.synthetic_label();
        let body_label = self.ctx.synthetic_label();
        let after_label = self.ctx.synthetic_label();

        let mut entry = source_labels.clone();
        entry.push(test_label.clone());
        self.begin_section(entry);
        self.current.push(Stmt::if_then(
            test,
            Stmt::Block(vec![Stmt::Goto(body_label.clone())]),
        ));
        self.current.push(Stmt::Goto(after_label.clone()));
        self.begin_section(vec![body_label]);
        self.loop_stack.push(DecomposedLoop {
            labels: source_labels,
            break_to: after_label.clone(),
            continue_to: test_label.clone(),
        });
        let result = self.process_stmt(body);
        self.loop_stack.pop();
        result?;
        if !ends_with_jump(&self.current) {
            self.current.push(Stmt::Goto(test_label));
        }
        self.begin_section(vec![after_label]);
        Ok(())
    }

    fn decompose_do_while(
        &mut self,
        source_labels: Vec<String>,
        body: Stmt,
        test: Expr,
    ) -> Result<(), RewriteError> {
        let test_label = self.ctx.synthetic_label();
        let body_label = self.ctx.synthetic_label();
        let after_label = self.ctx.synthetic_label();

        let mut entry = source_labels.clone();
        entry.push(body_label.clone());
        self.begin_section(entry);
        self.loop_stack.push(DecomposedLoop {
            labels: source_labels,
            break_to: after_label.clone(),
            continue_to: test_label.clone(),
        });
        let result = self.process_stmt(body);
        self.loop_stack.pop();
        result?;
        if !ends_with_jump(&self.current) {
            self.current.push(Stmt::Goto(test_label.clone()));
        }
        self.begin_section(vec![test_label]);
        self.current.push(Stmt::if_then(
            test,
            Stmt::Block(vec![Stmt::Goto(body_label)]),
        ));
        self.begin_section(vec![after_label]);
        Ok(())
    }

    fn decompose_for(
        &mut self,
        source_labels: Vec<String>,
        init: Option<ForInit>,
        test: Option<Expr>,
        update: Option<Expr>,
        body: Stmt,
    ) -> Result<(), RewriteError> {
        if !source_labels.is_empty() {
            self.begin_section(source_labels.clone());
        }
        match init {
            Some(ForInit::Var(declarators)) => {
                for declarator in declarators {
                    self.hoisted.push(declarator.name.clone());
                    if let Some(init) = declarator.init {
                        self.current.push(Stmt::expr(Expr::assign(
                            Expr::ident(declarator.name),
                            init,
                        )));
                    }
                }
            }
            Some(ForInit::Expr(expr)) => self.current.push(Stmt::expr(expr)),
            None => {}
        }

        let test_label = self.ctx.synthetic_label();
        let body_label = self.ctx.synthetic_label();
        let update_label = self.ctx.synthetic_label();
        let after_label = self.ctx.synthetic_label();

        self.begin_section(vec![test_label.clone()]);
        match test {
            Some(test) => {
                self.current.push(Stmt::if_then(
                    test,
                    Stmt::Block(vec![Stmt::Goto(body_label.clone())]),
                ));
                self.current.push(Stmt::Goto(after_label.clone()));
            }
            None => self.current.push(Stmt::Goto(body_label.clone())),
        }
        self.begin_section(vec![body_label]);
        self.loop_stack.push(DecomposedLoop {
            labels: source_labels,
            break_to: after_label.clone(),
            continue_to: update_label.clone(),
        });
        let result = self.process_stmt(body);
        self.loop_stack.pop();
        result?;
        if !ends_with_jump(&self.current) {
            self.current.push(Stmt::Goto(update_label.clone()));
        }
        self.begin_section(vec![update_label]);
        if let Some(update) = update {
            self.current.push(Stmt::expr(update));
        }
        self.current.push(Stmt::Goto(test_label));
        self.begin_section(vec![after_label]);
        Ok(())
    }

    // ----- non-decomposable loop and switch bodies -------------------------

    fn process_for_in(
        &mut self,
        source_labels: Vec<String>,
        is_declared: bool,
        name: String,
        object: Expr,
        body: Stmt,
    ) -> Result<(), RewriteError> {
        let body_stmts = flatten(body);
        if !stmts_contain_goto(&body_stmts) {
            if is_declared {
                self.hoisted.push(name.clone());
            }
            self.append_intact(relabel(
                source_labels,
                Stmt::ForIn {
                    is_declared: false,
                    name,
                    object,
                    body: Box::new(Stmt::Block(body_stmts)),
                },
            ));
            return Ok(());
        }
        // the iteration protocol is opaque, so the body becomes its own
        // machine inside the retained loop
        let wrap_label = self.ctx.fresh_loop_label();
        let replaced: Vec<Stmt> = body_stmts
            .into_iter()
            .map(|s| retarget_unlabeled_jumps(s, &wrap_label, true, true))
            .collect();
        let machine = build_independent_machine(self.ctx, replaced, &self.loop_stack)?;
        if is_declared {
            self.hoisted.push(name.clone());
        }
        let wrapped = Stmt::labeled(
            wrap_label,
            Stmt::ForIn {
                is_declared: false,
                name,
                object,
                body: Box::new(Stmt::Block(machine)),
            },
        );
        self.current.push(relabel(source_labels, wrapped));
        Ok(())
    }

    fn process_switch(
        &mut self,
        source_labels: Vec<String>,
        discriminant: Expr,
        sections: Vec<SwitchSection>,
    ) -> Result<(), RewriteError> {
        let needs_machines = sections.iter().any(|s| stmts_contain_goto(&s.body));
        if !needs_machines {
            self.append_intact(relabel(
                source_labels,
                Stmt::Switch { discriminant, sections },
            ));
            return Ok(());
        }
        let wrap_label = self.ctx.fresh_loop_label();
        let mut rewritten = Vec::with_capacity(sections.len());
        for section in sections {
            let body = if stmts_contain_goto(&section.body) {
                let replaced: Vec<Stmt> = section
                    .body
                    .into_iter()
                    .map(|s| retarget_unlabeled_jumps(s, &wrap_label, true, false))
                    .collect();
                build_independent_machine(self.ctx, replaced, &self.loop_stack)?
            } else {
                section
                    .body
                    .into_iter()
                    .map(|s| {
                        let s = hoist_vars_stmt(s, self.hoisted);
                        replace_jumps_stmt(s, &self.loop_stack, false, true)
                    })
                    .collect()
            };
            rewritten.push(SwitchSection { labels: section.labels, body });
        }
        let wrapped = Stmt::labeled(
            wrap_label,
            Stmt::Switch { discriminant, sections: rewritten },
        );
        self.current.push(relabel(source_labels, wrapped));
        Ok(())
    }
}

#[derive(Clone, Copy)]
enum JumpKind {
    Break,
    Continue,
}

fn relabel(labels: Vec<String>, stmt: Stmt) -> Stmt {
    labels
        .into_iter()
        .rev()
        .fold(stmt, |inner, label| Stmt::labeled(label, inner))
}

fn peel_labels(label: String, body: Box<Stmt>) -> (Vec<String>, Stmt) {
    let mut labels = vec![label];
    let mut current = *body;
    while let Stmt::Labeled { label, body } = current {
        labels.push(label);
        current = *body;
    }
    (labels, current)
}

fn flatten(stmt: Stmt) -> Vec<Stmt> {
    match stmt {
        Stmt::Block(stmts) => stmts,
        other => vec![other],
    }
}

fn ends_with_jump(stmts: &[Stmt]) -> bool {
    matches!(
        stmts.last(),
        Some(
            Stmt::Goto(_)
                | Stmt::Break(_)
                | Stmt::Continue(_)
                | Stmt::Return(_)
                | Stmt::Throw(_)
        )
    )
}

// ----- statement walkers ----------------------------------------------------

fn stmts_contain_goto(stmts: &[Stmt]) -> bool {
    stmts.iter().any(stmt_contains_goto)
}

fn stmt_contains_goto(stmt: &Stmt) -> bool {
    match stmt {
        Stmt::Goto(_) => true,
        Stmt::Block(stmts) => stmts_contain_goto(stmts),
        Stmt::Try { body, catch, finally } => {
            stmts_contain_goto(body)
                || catch.as_ref().is_some_and(|c| stmts_contain_goto(&c.body))
                || finally.as_deref().is_some_and(stmts_contain_goto)
        }
        Stmt::If { then_branch, else_branch, .. } => {
            stmt_contains_goto(then_branch)
                || else_branch.as_deref().is_some_and(stmt_contains_goto)
        }
        Stmt::While { body, .. }
        | Stmt::DoWhile { body, .. }
        | Stmt::For { body, .. }
        | Stmt::ForIn { body, .. }
        | Stmt::Labeled { body, .. } => stmt_contains_goto(body),
        Stmt::Switch { sections, .. } => sections.iter().any(|s| stmts_contain_goto(&s.body)),
        _ => false,
    }
}

fn stmt_contains_label(stmt: &Stmt) -> bool {
    match stmt {
        Stmt::Labeled { .. } => true,
        Stmt::Block(stmts) => stmts.iter().any(stmt_contains_label),
        Stmt::Try { body, catch, finally } => {
            body.iter().any(stmt_contains_label)
                || catch
                    .as_ref()
                    .is_some_and(|c| c.body.iter().any(stmt_contains_label))
                || finally
                    .as_ref()
                    .is_some_and(|f| f.iter().any(stmt_contains_label))
        }
        Stmt::If { then_branch, else_branch, .. } => {
            stmt_contains_label(then_branch)
                || else_branch.as_deref().is_some_and(stmt_contains_label)
        }
        Stmt::While { body, .. }
        | Stmt::DoWhile { body, .. }
        | Stmt::For { body, .. }
        | Stmt::ForIn { body, .. } => stmt_contains_label(body),
        Stmt::Switch { sections, .. } => {
            sections.iter().any(|s| s.body.iter().any(stmt_contains_label))
        }
        _ => false,
    }
}

/// Hoist `var` declarations out of an intact statement, leaving initializers
/// behind as assignments. Function bodies are not entered.
fn hoist_vars_stmt(stmt: Stmt, hoisted: &mut Vec<String>) -> Stmt {
    match stmt {
        Stmt::Var(declarators) => {
            let mut assigns = Vec::new();
            for declarator in declarators {
                hoisted.push(declarator.name.clone());
                if let Some(init) = declarator.init {
                    assigns.push(Stmt::expr(Expr::assign(Expr::ident(declarator.name), init)));
                }
            }
            match assigns.len() {
                0 => Stmt::Empty,
                1 => assigns.pop().unwrap(),
                _ => Stmt::Block(assigns),
            }
        }
        Stmt::Block(stmts) => Stmt::Block(
            stmts.into_iter().map(|s| hoist_vars_stmt(s, hoisted)).collect(),
        ),
        Stmt::If { test, then_branch, else_branch } => Stmt::If {
            test,
            then_branch: Box::new(hoist_vars_stmt(*then_branch, hoisted)),
            else_branch: else_branch.map(|b| Box::new(hoist_vars_stmt(*b, hoisted))),
        },
        Stmt::While { test, body } => Stmt::While {
            test,
            body: Box::new(hoist_vars_stmt(*body, hoisted)),
        },
        Stmt::DoWhile { body, test } => Stmt::DoWhile {
            body: Box::new(hoist_vars_stmt(*body, hoisted)),
            test,
        },
        Stmt::For { init, test, update, body } => {
            let init = match init {
                Some(ForInit::Var(declarators)) => {
                    let mut assigns = Vec::new();
                    for declarator in declarators {
                        hoisted.push(declarator.name.clone());
                        if let Some(init) = declarator.init {
                            assigns.push(Expr::assign(Expr::ident(declarator.name), init));
                        }
                    }
                    match assigns.len() {
                        0 => None,
                        1 => Some(ForInit::Expr(assigns.pop().unwrap())),
                        _ => Some(ForInit::Expr(Expr::Comma(assigns))),
                    }
                }
                other => other,
            };
            Stmt::For {
                init,
                test,
                update,
                body: Box::new(hoist_vars_stmt(*body, hoisted)),
            }
        }
        Stmt::ForIn { is_declared, name, object, body } => {
            if is_declared {
                hoisted.push(name.clone());
            }
            Stmt::ForIn {
                is_declared: false,
                name,
                object,
                body: Box::new(hoist_vars_stmt(*body, hoisted)),
            }
        }
        Stmt::Switch { discriminant, sections } => Stmt::Switch {
            discriminant,
            sections: sections
                .into_iter()
                .map(|s| SwitchSection {
                    labels: s.labels,
                    body: s.body.into_iter().map(|b| hoist_vars_stmt(b, hoisted)).collect(),
                })
                .collect(),
        },
        Stmt::Try { body, catch, finally } => Stmt::Try {
            body: body.into_iter().map(|s| hoist_vars_stmt(s, hoisted)).collect(),
            catch: catch.map(|c| reef_script::CatchClause {
                name: c.name,
                body: c.body.into_iter().map(|s| hoist_vars_stmt(s, hoisted)).collect(),
            }),
            finally: finally
                .map(|f| f.into_iter().map(|s| hoist_vars_stmt(s, hoisted)).collect()),
        },
        Stmt::Labeled { label, body } => Stmt::Labeled {
            label,
            body: Box::new(hoist_vars_stmt(*body, hoisted)),
        },
        other => other,
    }
}

/// Replace break/continue that target a decomposed loop with gotos to the
/// loop's transition sections. Nested intact loops shield unlabeled jumps;
/// a switch shields unlabeled break only.
fn replace_jumps_stmt(
    stmt: Stmt,
    stack: &[DecomposedLoop],
    allow_break: bool,
    allow_continue: bool,
) -> Stmt {
    if stack.is_empty() {
        return stmt;
    }
    let lookup = |label: Option<&str>, kind: JumpKind, allowed: bool| -> Option<String> {
        let frame = match label {
            None if allowed => stack.last(),
            None => None,
            Some(label) => stack
                .iter()
                .rev()
                .find(|f| f.labels.iter().any(|l| l == label)),
        }?;
        Some(match kind {
            JumpKind::Break => frame.break_to.clone(),
            JumpKind::Continue => frame.continue_to.clone(),
        })
    };
    match stmt {
        Stmt::Break(label) => match lookup(label.as_deref(), JumpKind::Break, allow_break) {
            Some(target) => Stmt::Goto(target),
            None => Stmt::Break(label),
        },
        Stmt::Continue(label) => {
            match lookup(label.as_deref(), JumpKind::Continue, allow_continue) {
                Some(target) => Stmt::Goto(target),
                None => Stmt::Continue(label),
            }
        }
        Stmt::Block(stmts) => Stmt::Block(
            stmts
                .into_iter()
                .map(|s| replace_jumps_stmt(s, stack, allow_break, allow_continue))
                .collect(),
        ),
        Stmt::If { test, then_branch, else_branch } => Stmt::If {
            test,
            then_branch: Box::new(replace_jumps_stmt(
                *then_branch,
                stack,
                allow_break,
                allow_continue,
            )),
            else_branch: else_branch
                .map(|b| Box::new(replace_jumps_stmt(*b, stack, allow_break, allow_continue))),
        },
        Stmt::While { test, body } => Stmt::While {
            test,
            body: Box::new(replace_jumps_stmt(*body, stack, false, false)),
        },
        Stmt::DoWhile { body, test } => Stmt::DoWhile {
            body: Box::new(replace_jumps_stmt(*body, stack, false, false)),
            test,
        },
        Stmt::For { init, test, update, body } => Stmt::For {
            init,
            test,
            update,
            body: Box::new(replace_jumps_stmt(*body, stack, false, false)),
        },
        Stmt::ForIn { is_declared, name, object, body } => Stmt::ForIn {
            is_declared,
            name,
            object,
            body: Box::new(replace_jumps_stmt(*body, stack, false, false)),
        },
        Stmt::Switch { discriminant, sections } => Stmt::Switch {
            discriminant,
            sections: sections
                .into_iter()
                .map(|s| SwitchSection {
                    labels: s.labels,
                    body: s
                        .body
                        .into_iter()
                        .map(|b| replace_jumps_stmt(b, stack, false, allow_continue))
                        .collect(),
                })
                .collect(),
        },
        Stmt::Try { body, catch, finally } => Stmt::Try {
            body: body
                .into_iter()
                .map(|s| replace_jumps_stmt(s, stack, allow_break, allow_continue))
                .collect(),
            catch: catch.map(|c| reef_script::CatchClause {
                name: c.name,
                body: c
                    .body
                    .into_iter()
                    .map(|s| replace_jumps_stmt(s, stack, allow_break, allow_continue))
                    .collect(),
            }),
            finally: finally.map(|f| {
                f.into_iter()
                    .map(|s| replace_jumps_stmt(s, stack, allow_break, allow_continue))
                    .collect()
            }),
        },
        Stmt::Labeled { label, body } => Stmt::Labeled {
            label,
            body: Box::new(replace_jumps_stmt(*body, stack, allow_break, allow_continue)),
        },
        other => other,
    }
}

/// Give unlabeled break/continue an explicit label before a body is wrapped
/// in a dispatch machine whose own loop would capture them.
fn retarget_unlabeled_jumps(
    stmt: Stmt,
    label: &str,
    allow_break: bool,
    allow_continue: bool,
) -> Stmt {
    match stmt {
        Stmt::Break(None) if allow_break => Stmt::Break(Some(label.to_string())),
        Stmt::Continue(None) if allow_continue => Stmt::Continue(Some(label.to_string())),
        Stmt::Block(stmts) => Stmt::Block(
            stmts
                .into_iter()
                .map(|s| retarget_unlabeled_jumps(s, label, allow_break, allow_continue))
                .collect(),
        ),
        Stmt::If { test, then_branch, else_branch } => Stmt::If {
            test,
            then_branch: Box::new(retarget_unlabeled_jumps(
                *then_branch,
                label,
                allow_break,
                allow_continue,
            )),
            else_branch: else_branch.map(|b| {
                Box::new(retarget_unlabeled_jumps(*b, label, allow_break, allow_continue))
            }),
        },
        Stmt::Switch { discriminant, sections } => Stmt::Switch {
            discriminant,
            sections: sections
                .into_iter()
                .map(|s| SwitchSection {
                    labels: s.labels,
                    body: s
                        .body
                        .into_iter()
                        .map(|b| retarget_unlabeled_jumps(b, label, false, allow_continue))
                        .collect(),
                })
                .collect(),
        },
        Stmt::Try { body, catch, finally } => Stmt::Try {
            body: body
                .into_iter()
                .map(|s| retarget_unlabeled_jumps(s, label, allow_break, allow_continue))
                .collect(),
            catch: catch.map(|c| reef_script::CatchClause {
                name: c.name,
                body: c
                    .body
                    .into_iter()
                    .map(|s| retarget_unlabeled_jumps(s, label, allow_break, allow_continue))
                    .collect(),
            }),
            finally: finally.map(|f| {
                f.into_iter()
                    .map(|s| retarget_unlabeled_jumps(s, label, allow_break, allow_continue))
                    .collect()
            }),
        },
        Stmt::Labeled { label: l, body } => Stmt::Labeled {
            label: l,
            body: Box::new(retarget_unlabeled_jumps(*body, label, allow_break, allow_continue)),
        },
        // nested loops capture their own unlabeled jumps
        other @ (Stmt::While { .. }
        | Stmt::DoWhile { .. }
        | Stmt::For { .. }
        | Stmt::ForIn { .. }) => other,
        other => other,
    }
}

// ----- transition fixup -----------------------------------------------------

/// Resolve every goto whose target belongs to this machine into a state
/// assignment plus a continue of the machine's loop. Gotos to outer labels
/// are left for the enclosing machine's fixup.
fn fixup_sections(
    sections: &mut [Section],
    labels: &HashMap<String, i32>,
    state_var: &str,
    loop_label: &str,
) {
    for section in sections {
        fixup_stmts(&mut section.body, labels, state_var, loop_label);
    }
}

fn transition(state_var: &str, state: i32, loop_label: &str) -> SmallVec<[Stmt; 2]> {
    let value = if state < 0 {
        Expr::unary(UnaryOp::Negate, Expr::number(-(state as f64)))
    } else {
        Expr::number(state as f64)
    };
    let mut out = SmallVec::new();
    out.push(Stmt::expr(Expr::assign(Expr::ident(state_var), value)));
    out.push(Stmt::Continue(Some(loop_label.to_string())));
    out
}

fn fixup_stmts(
    stmts: &mut Vec<Stmt>,
    labels: &HashMap<String, i32>,
    state_var: &str,
    loop_label: &str,
) {
    let mut result = Vec::with_capacity(stmts.len());
    for stmt in stmts.drain(..) {
        match stmt {
            Stmt::Goto(target) => match labels.get(&target) {
                Some(&state) => {
                    result.extend(transition(state_var, state, loop_label));
                }
                None => result.push(Stmt::Goto(target)),
            },
            other => result.push(fixup_stmt(other, labels, state_var, loop_label)),
        }
    }
    *stmts = result;
}

fn fixup_boxed(
    stmt: Box<Stmt>,
    labels: &HashMap<String, i32>,
    state_var: &str,
    loop_label: &str,
) -> Box<Stmt> {
    match *stmt {
        Stmt::Goto(target) => match labels.get(&target) {
            Some(&state) => Box::new(Stmt::Block(
                transition(state_var, state, loop_label).into_vec(),
            )),
            None => Box::new(Stmt::Goto(target)),
        },
        other => Box::new(fixup_stmt(other, labels, state_var, loop_label)),
    }
}

fn fixup_stmt(
    stmt: Stmt,
    labels: &HashMap<String, i32>,
    state_var: &str,
    loop_label: &str,
) -> Stmt {
    match stmt {
        Stmt::Goto(target) => match labels.get(&target) {
            Some(&state) => {
                Stmt::Block(transition(state_var, state, loop_label).into_vec())
            }
            None => Stmt::Goto(target),
        },
        Stmt::Block(mut stmts) => {
            fixup_stmts(&mut stmts, labels, state_var, loop_label);
            Stmt::Block(stmts)
        }
        Stmt::If { test, then_branch, else_branch } => Stmt::If {
            test,
            then_branch: fixup_boxed(then_branch, labels, state_var, loop_label),
            else_branch: else_branch.map(|b| fixup_boxed(b, labels, state_var, loop_label)),
        },
        Stmt::While { test, body } => Stmt::While {
            test,
            body: fixup_boxed(body, labels, state_var, loop_label),
        },
        Stmt::DoWhile { body, test } => Stmt::DoWhile {
            body: fixup_boxed(body, labels, state_var, loop_label),
            test,
        },
        Stmt::For { init, test, update, body } => Stmt::For {
            init,
            test,
            update,
            body: fixup_boxed(body, labels, state_var, loop_label),
        },
        Stmt::ForIn { is_declared, name, object, body } => Stmt::ForIn {
            is_declared,
            name,
            object,
            body: fixup_boxed(body, labels, state_var, loop_label),
        },
        Stmt::Switch { discriminant, sections } => Stmt::Switch {
            discriminant,
            sections: sections
                .into_iter()
                .map(|mut s| {
                    fixup_stmts(&mut s.body, labels, state_var, loop_label);
                    s
                })
                .collect(),
        },
        Stmt::Try { mut body, catch, finally } => {
            fixup_stmts(&mut body, labels, state_var, loop_label);
            Stmt::Try {
                body,
                catch: catch.map(|mut c| {
                    fixup_stmts(&mut c.body, labels, state_var, loop_label);
                    c
                }),
                finally: finally.map(|mut f| {
                    fixup_stmts(&mut f, labels, state_var, loop_label);
                    f
                }),
            }
        }
        Stmt::Labeled { label, body } => Stmt::Labeled {
            label,
            body: fixup_boxed(body, labels, state_var, loop_label),
        },
        other => other,
    }
}

fn find_remaining_goto(stmts: &[Stmt]) -> Option<String> {
    stmts.iter().find_map(find_goto_in_stmt)
}

fn find_goto_in_stmt(stmt: &Stmt) -> Option<String> {
    match stmt {
        Stmt::Goto(label) => Some(label.clone()),
        Stmt::Block(stmts) => find_remaining_goto(stmts),
        Stmt::If { then_branch, else_branch, .. } => find_goto_in_stmt(then_branch)
            .or_else(|| else_branch.as_deref().and_then(find_goto_in_stmt)),
        Stmt::While { body, .. }
        | Stmt::DoWhile { body, .. }
        | Stmt::For { body, .. }
        | Stmt::ForIn { body, .. }
        | Stmt::Labeled { body, .. } => find_goto_in_stmt(body),
        Stmt::Switch { sections, .. } => {
            sections.iter().find_map(|s| find_remaining_goto(&s.body))
        }
        Stmt::Try { body, catch, finally } => find_remaining_goto(body)
            .or_else(|| catch.as_ref().and_then(|c| find_remaining_goto(&c.body)))
            .or_else(|| finally.as_deref().and_then(find_remaining_goto)),
        _ => None,
    }
}

// ----- name collection ------------------------------------------------------

fn collect_names_stmts(stmts: &[Stmt], names: &mut HashSet<String>) {
    for stmt in stmts {
        collect_names_stmt(stmt, names);
    }
}

fn collect_names_stmt(stmt: &Stmt, names: &mut HashSet<String>) {
    match stmt {
        Stmt::Block(stmts) => collect_names_stmts(stmts, names),
        Stmt::Expr(expr) | Stmt::Throw(expr) => collect_names_expr(expr, names),
        Stmt::Var(declarators) => {
            for declarator in declarators {
                names.insert(declarator.name.clone());
                if let Some(init) = &declarator.init {
                    collect_names_expr(init, names);
                }
            }
        }
        Stmt::If { test, then_branch, else_branch } => {
            collect_names_expr(test, names);
            collect_names_stmt(then_branch, names);
            if let Some(else_branch) = else_branch {
                collect_names_stmt(else_branch, names);
            }
        }
        Stmt::For { init, test, update, body } => {
            match init {
                Some(ForInit::Var(declarators)) => {
                    for declarator in declarators {
                        names.insert(declarator.name.clone());
                        if let Some(init) = &declarator.init {
                            collect_names_expr(init, names);
                        }
                    }
                }
                Some(ForInit::Expr(expr)) => collect_names_expr(expr, names),
                None => {}
            }
            if let Some(test) = test {
                collect_names_expr(test, names);
            }
            if let Some(update) = update {
                collect_names_expr(update, names);
            }
            collect_names_stmt(body, names);
        }
        Stmt::ForIn { name, object, body, .. } => {
            names.insert(name.clone());
            collect_names_expr(object, names);
            collect_names_stmt(body, names);
        }
        Stmt::While { test, body } | Stmt::DoWhile { body, test } => {
            collect_names_expr(test, names);
            collect_names_stmt(body, names);
        }
        Stmt::Switch { discriminant, sections } => {
            collect_names_expr(discriminant, names);
            for section in sections {
                for label in section.labels.iter().flatten() {
                    collect_names_expr(label, names);
                }
                collect_names_stmts(&section.body, names);
            }
        }
        Stmt::Try { body, catch, finally } => {
            collect_names_stmts(body, names);
            if let Some(catch) = catch {
                names.insert(catch.name.clone());
                collect_names_stmts(&catch.body, names);
            }
            if let Some(finally) = finally {
                collect_names_stmts(finally, names);
            }
        }
        Stmt::Return(Some(expr)) => collect_names_expr(expr, names),
        Stmt::Break(Some(label)) | Stmt::Continue(Some(label)) | Stmt::Goto(label) => {
            names.insert(label.clone());
        }
        Stmt::Labeled { label, body } => {
            names.insert(label.clone());
            collect_names_stmt(body, names);
        }
        Stmt::Function(decl) => {
            names.insert(decl.name.clone());
            for param in &decl.params {
                names.insert(param.clone());
            }
            collect_names_stmts(&decl.body, names);
        }
        _ => {}
    }
}

fn collect_names_expr(expr: &Expr, names: &mut HashSet<String>) {
    match expr {
        Expr::Ident(name) => {
            names.insert(name.clone());
        }
        Expr::Member { object, .. } => collect_names_expr(object, names),
        Expr::Index { object, index } => {
            collect_names_expr(object, names);
            collect_names_expr(index, names);
        }
        Expr::Call { target, args } | Expr::New { target, args } => {
            collect_names_expr(target, names);
            for arg in args {
                collect_names_expr(arg, names);
            }
        }
        Expr::Binary { lhs, rhs, .. } => {
            collect_names_expr(lhs, names);
            collect_names_expr(rhs, names);
        }
        Expr::Unary { operand, .. } => collect_names_expr(operand, names),
        Expr::Assign { target, value, .. } => {
            collect_names_expr(target, names);
            collect_names_expr(value, names);
        }
        Expr::Array(items) | Expr::Comma(items) => {
            for item in items {
                collect_names_expr(item, names);
            }
        }
        Expr::Object(props) => {
            for prop in props {
                collect_names_expr(&prop.value, names);
            }
        }
        Expr::Function(func) => {
            if let Some(name) = &func.name {
                names.insert(name.clone());
            }
            for param in &func.params {
                names.insert(param.clone());
            }
            collect_names_stmts(&func.body, names);
        }
        Expr::Conditional { test, consequent, alternate } => {
            collect_names_expr(test, names);
            collect_names_expr(consequent, names);
            collect_names_expr(alternate, names);
        }
        _ => {}
    }
}
