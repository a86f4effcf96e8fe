//! Builders for script expressions that address the runtime helpers.
//!
//! Every operation the target runtime cannot express directly goes through a
//! fixed helper surface: `Script.*` for the general helpers, `Nullable.*`
//! for three-valued lifting, `Int32.{div,trunc}` and `Exception.wrap`. The
//! helpers are addressed through deferred type references so minified naming
//! applies to the runtime types as well.
//!
//! The builders are stateless: they read the importer's records and the two
//! configuration flags, produce pure trees, and touch no tables. The one
//! diagnostic (character upcast) goes through the collector handed in by the
//! caller.

use crate::diag::{DiagnosticCode, DiagnosticCollector, Region};
use crate::import::{script_type_id, MetadataImporter};
use crate::model::{TypeId, TypeKind, TypeModel, TypeParamRef, TypeRef};
use crate::options::CompilerOptions;
use reef_script::{BinaryOp, Expr, UnaryOp};
use smallvec::SmallVec;

const NULLABLE_HELPERS: &[&str] = &[
    "not", "neg", "pos", "cpl", "eq", "ne", "le", "ge", "lt", "gt", "sub", "add", "mod", "div",
    "mul", "band", "bor", "xor", "shl", "srs", "sru", "and", "or", "unbox",
];

/// Emits invocations of the well-known runtime helpers.
pub struct RuntimeLibrary<'a> {
    model: &'a TypeModel,
    importer: &'a MetadataImporter<'a>,
    omit_downcasts: bool,
    omit_nullable_checks: bool,
}

impl<'a> RuntimeLibrary<'a> {
    pub fn new(
        model: &'a TypeModel,
        importer: &'a MetadataImporter<'a>,
        options: &CompilerOptions,
    ) -> RuntimeLibrary<'a> {
        RuntimeLibrary {
            model,
            importer,
            omit_downcasts: options.omit_downcasts,
            omit_nullable_checks: options.omit_nullable_checks,
        }
    }

    fn script_helper(&self, name: &str) -> Expr {
        Expr::member(Expr::type_ref(script_type_id(self.model.known.script())), name)
    }

    fn nullable_helper(&self, name: &str) -> Expr {
        Expr::member(Expr::type_ref(script_type_id(self.model.known.nullable())), name)
    }

    fn object_reference(&self) -> Expr {
        Expr::type_ref(script_type_id(self.model.known.object()))
    }

    // ----- type reflection -------------------------------------------------

    /// The runtime representation of a type, as used by `typeof`.
    pub fn type_of(&self, ty: &TypeRef) -> Expr {
        self.instantiate_type(ty)
    }

    pub fn instantiate_type(&self, ty: &TypeRef) -> Expr {
        self.script_type(ty)
    }

    pub fn instantiate_type_for_use_as_generic_argument(&self, ty: &TypeRef) -> Expr {
        self.script_type(ty)
    }

    fn script_type(&self, ty: &TypeRef) -> Expr {
        match ty {
            TypeRef::Param(param) => Expr::ident(self.importer.get_type_parameter_name(*param)),
            TypeRef::Def(id) => {
                let def = self.model.type_def(*id);
                let sem = self.importer.get_type_semantics(*id);
                // open generics and bypassed interfaces canonicalize to the
                // root object
                if !def.type_params.is_empty()
                    || (def.kind == TypeKind::Interface && !sem.obeys_type_system)
                {
                    return self.object_reference();
                }
                Expr::type_ref(script_type_id(*id))
            }
            TypeRef::Inst { def, args } => {
                let type_def = self.model.type_def(*def);
                let sem = self.importer.get_type_semantics(*def);
                if type_def.kind == TypeKind::Interface && !sem.obeys_type_system {
                    return self.object_reference();
                }
                if sem.ignore_generic_arguments {
                    return Expr::type_ref(script_type_id(*def));
                }
                let mut call_args: SmallVec<[Expr; 4]> =
                    SmallVec::with_capacity(args.len() + 1);
                call_args.push(Expr::type_ref(script_type_id(*def)));
                call_args.push(Expr::Array(
                    args.iter()
                        .map(|a| self.instantiate_type_for_use_as_generic_argument(a))
                        .collect(),
                ));
                Expr::call(self.script_helper("makeGenericType"), call_args.into_vec())
            }
            TypeRef::Array { .. } => {
                Expr::type_ref(script_type_id(self.model.known.array.unwrap_or_else(|| {
                    panic!("internal error: known type `Array` was not registered")
                })))
            }
            TypeRef::Nullable(inner) => self.script_type(inner),
            TypeRef::Dynamic => self.object_reference(),
        }
    }

    pub fn type_parameter_expr(&self, param: TypeParamRef) -> Expr {
        Expr::ident(self.importer.get_type_parameter_name(param))
    }

    // ----- type tests and conversions --------------------------------------

    /// Same script identity: same script name from the same assembly.
    fn same_script_type(&self, a: &TypeRef, b: &TypeRef) -> bool {
        match (a, b) {
            (TypeRef::Nullable(inner), other) | (other, TypeRef::Nullable(inner)) => {
                self.same_script_type(inner, other)
            }
            _ => match (a.definition(), b.definition()) {
                (Some(x), Some(y)) => {
                    let sx = self.importer.get_type_semantics(x);
                    let sy = self.importer.get_type_semantics(y);
                    sx.name == sy.name
                        && self.model.type_def(x).assembly == self.model.type_def(y).assembly
                }
                _ => a == b,
            },
        }
    }

    pub fn type_is(&self, expr: Expr, source: &TypeRef, target: &TypeRef) -> Expr {
        if self.same_script_type(source, target) {
            // the test can only be distinguishing null
            return Expr::call(self.script_helper("isValue"), vec![expr]);
        }
        Expr::call(
            self.script_helper("isInstanceOfType"),
            vec![expr, self.instantiate_type(target)],
        )
    }

    /// The `as` conversion; null when the value is not of the target type.
    pub fn try_downcast(&self, expr: Expr, source: &TypeRef, target: &TypeRef) -> Expr {
        if self.same_script_type(source, target) || self.omit_downcasts {
            return expr;
        }
        Expr::call(
            self.script_helper("safeCast"),
            vec![expr, self.instantiate_type(target)],
        )
    }

    pub fn downcast(&self, expr: Expr, source: &TypeRef, target: &TypeRef) -> Expr {
        if self.same_script_type(source, target) || self.omit_downcasts {
            return expr;
        }
        Expr::call(
            self.script_helper("cast"),
            vec![expr, self.instantiate_type(target)],
        )
    }

    /// Upcasts are free in script, except that a character is a number and
    /// cannot be widened to anything else.
    pub fn upcast(
        &self,
        expr: Expr,
        source: &TypeRef,
        _target: &TypeRef,
        diagnostics: &mut DiagnosticCollector,
        region: Option<&Region>,
    ) -> Expr {
        if source.definition().is_some() && source.definition() == self.model.known.char {
            diagnostics.report(
                DiagnosticCode::E7601,
                region.cloned(),
                "a character value cannot be converted to another type; it is a number in \
                 script"
                    .to_string(),
            );
        }
        expr
    }

    // ----- reference equality ----------------------------------------------

    pub fn reference_equals(
        &self,
        lhs: Expr,
        lhs_type: Option<&TypeRef>,
        rhs: Expr,
        rhs_type: Option<&TypeRef>,
        negate: bool,
    ) -> Expr {
        if lhs.is_null_literal() {
            return self.null_check(rhs, negate);
        }
        if rhs.is_null_literal() {
            return self.null_check(lhs, negate);
        }
        if self.is_string_type(lhs_type) || self.is_string_type(rhs_type) {
            let op = if negate { BinaryOp::NotSame } else { BinaryOp::Same };
            return Expr::binary(op, lhs, rhs);
        }
        let call = Expr::call(self.script_helper("referenceEquals"), vec![lhs, rhs]);
        if negate {
            Expr::logical_not(call)
        } else {
            call
        }
    }

    fn null_check(&self, expr: Expr, negate: bool) -> Expr {
        let helper = if negate { "isValue" } else { "isNullOrUndefined" };
        Expr::call(self.script_helper(helper), vec![expr])
    }

    fn is_string_type(&self, ty: Option<&TypeRef>) -> bool {
        ty.and_then(TypeRef::definition)
            .is_some_and(|id| Some(id) == self.model.known.string)
    }

    // ----- nullable lifting ------------------------------------------------

    /// Rewrite an operator expression into its three-valued helper. Lifting
    /// an already-lifted expression returns it unchanged.
    pub fn lift(&self, expr: Expr) -> Expr {
        if self.is_lifted(&expr) {
            return expr;
        }
        match expr {
            Expr::Binary { op, lhs, rhs } => match Self::binary_helper(op) {
                Some(helper) => {
                    Expr::call(self.nullable_helper(helper), vec![*lhs, *rhs])
                }
                None => Expr::Binary { op, lhs, rhs },
            },
            Expr::Unary { op, operand } => match Self::unary_helper(op) {
                Some(helper) => Expr::call(self.nullable_helper(helper), vec![*operand]),
                None => Expr::Unary { op, operand },
            },
            other => other,
        }
    }

    fn binary_helper(op: BinaryOp) -> Option<&'static str> {
        Some(match op {
            BinaryOp::Add => "add",
            BinaryOp::Subtract => "sub",
            BinaryOp::Multiply => "mul",
            BinaryOp::Divide => "div",
            BinaryOp::Modulo => "mod",
            BinaryOp::LeftShift => "shl",
            BinaryOp::RightShiftSigned => "srs",
            BinaryOp::RightShiftUnsigned => "sru",
            BinaryOp::BitwiseAnd => "band",
            BinaryOp::BitwiseOr => "bor",
            BinaryOp::BitwiseXor => "xor",
            BinaryOp::LogicalAnd => "and",
            BinaryOp::LogicalOr => "or",
            BinaryOp::Equal | BinaryOp::Same => "eq",
            BinaryOp::NotEqual | BinaryOp::NotSame => "ne",
            BinaryOp::Lesser => "lt",
            BinaryOp::LesserOrEqual => "le",
            BinaryOp::Greater => "gt",
            BinaryOp::GreaterOrEqual => "ge",
            BinaryOp::In | BinaryOp::InstanceOf => return None,
        })
    }

    fn unary_helper(op: UnaryOp) -> Option<&'static str> {
        Some(match op {
            UnaryOp::LogicalNot => "not",
            UnaryOp::Negate => "neg",
            UnaryOp::Positive => "pos",
            UnaryOp::BitwiseNot => "cpl",
            _ => return None,
        })
    }

    /// True for invocations of the lifting helpers, and for the integer
    /// division and truncation helpers which already handle null.
    fn is_lifted(&self, expr: &Expr) -> bool {
        let Expr::Call { target, .. } = expr else {
            return false;
        };
        let Expr::Member { object, name } = &**target else {
            return false;
        };
        let Expr::TypeRef(id) = &**object else {
            return false;
        };
        let id = TypeId(id.0);
        if Some(id) == self.model.known.nullable {
            return NULLABLE_HELPERS.contains(&name.as_str());
        }
        if Some(id) == self.model.known.int32 {
            return name == "div" || name == "trunc";
        }
        false
    }

    /// Unwrap a nullable value, checking for null.
    pub fn from_nullable(&self, expr: Expr) -> Expr {
        if self.omit_nullable_checks {
            return expr;
        }
        // a boolean negation has already produced a plain boolean
        if matches!(&expr, Expr::Unary { op: UnaryOp::LogicalNot, .. }) {
            return expr;
        }
        Expr::call(self.nullable_helper("unbox"), vec![expr])
    }

    pub fn integer_division(&self, lhs: Expr, rhs: Expr) -> Expr {
        let int32 = Expr::type_ref(script_type_id(self.model.known.int32()));
        Expr::call(Expr::member(int32, "div"), vec![lhs, rhs])
    }

    pub fn float_truncation(&self, operand: Expr) -> Expr {
        let int32 = Expr::type_ref(script_type_id(self.model.known.int32()));
        Expr::call(Expr::member(int32, "trunc"), vec![operand])
    }

    // ----- delegates -------------------------------------------------------

    /// Bind `this` for a delegate value.
    pub fn bind(&self, function: Expr, target: Expr) -> Expr {
        Expr::call(self.script_helper("mkdel"), vec![target, function])
    }

    pub fn bind_first_parameter_to_this(&self, function: Expr) -> Expr {
        Expr::call(self.script_helper("thisFix"), vec![function])
    }

    /// A clone between identical delegate types exists only for reference
    /// distinctness, so it is real; a clone to a different delegate type is
    /// just a type adjustment and elides. Delegate types all share one
    /// script name, so identity is structural here.
    pub fn clone_delegate(&self, expr: Expr, source: &TypeRef, target: &TypeRef) -> Expr {
        if source == target {
            Expr::call(self.script_helper("delegateClone"), vec![expr])
        } else {
            expr
        }
    }

    // ----- arrays ----------------------------------------------------------

    pub fn create_array(&self, size: Expr) -> Expr {
        let array = self.model.known.array.unwrap_or_else(|| {
            panic!("internal error: known type `Array` was not registered")
        });
        Expr::new_object(Expr::type_ref(script_type_id(array)), vec![size])
    }

    pub fn create_multidim_array(&self, default_value: Expr, sizes: Vec<Expr>) -> Expr {
        let mut args = vec![default_value];
        args.extend(sizes);
        Expr::call(self.script_helper("multidimArray"), args)
    }

    pub fn multidim_array_get(&self, array: Expr, indices: Vec<Expr>) -> Expr {
        let mut args = vec![array];
        args.extend(indices);
        Expr::call(self.script_helper("arrayGet"), args)
    }

    pub fn multidim_array_set(&self, array: Expr, indices: Vec<Expr>, value: Expr) -> Expr {
        let mut args = vec![array];
        args.extend(indices);
        args.push(value);
        Expr::call(self.script_helper("arraySet"), args)
    }

    // ----- defaults and construction ---------------------------------------

    pub fn default_value(&self, ty: &TypeRef) -> Expr {
        match ty {
            TypeRef::Nullable(_) | TypeRef::Dynamic | TypeRef::Array { .. } => Expr::null(),
            TypeRef::Def(id) | TypeRef::Inst { def: id, .. } => {
                match self.model.type_def(*id).kind {
                    TypeKind::Class | TypeKind::Interface | TypeKind::Delegate => Expr::null(),
                    TypeKind::Struct | TypeKind::Enum => Expr::call(
                        self.script_helper("getDefaultValue"),
                        vec![self.instantiate_type(ty)],
                    ),
                }
            }
            TypeRef::Param(_) => Expr::call(
                self.script_helper("getDefaultValue"),
                vec![self.instantiate_type(ty)],
            ),
        }
    }

    pub fn coalesce(&self, lhs: Expr, rhs: Expr) -> Expr {
        Expr::call(self.script_helper("coalesce"), vec![lhs, rhs])
    }

    pub fn apply_constructor(&self, constructor: Expr, arguments_array: Expr) -> Expr {
        Expr::call(
            self.script_helper("applyConstructor"),
            vec![constructor, arguments_array],
        )
    }

    pub fn shallow_copy(&self, source: Expr, target: Expr) -> Expr {
        Expr::call(self.script_helper("shallowCopy"), vec![source, target])
    }

    // ----- iterator blocks and async ---------------------------------------

    pub fn make_enumerator(
        &self,
        yield_type: &TypeRef,
        move_next: Expr,
        get_current: Expr,
        dispose: Option<Expr>,
    ) -> Expr {
        Expr::call(
            self.script_helper("makeEnumerator"),
            vec![
                self.instantiate_type_for_use_as_generic_argument(yield_type),
                move_next,
                get_current,
                dispose.unwrap_or_else(Expr::null),
            ],
        )
    }

    pub fn make_enumerable(&self, yield_type: &TypeRef, get_enumerator: Expr) -> Expr {
        Expr::call(
            self.script_helper("makeEnumerable"),
            vec![
                self.instantiate_type_for_use_as_generic_argument(yield_type),
                get_enumerator,
            ],
        )
    }

    pub fn create_task_completion_source(&self) -> Expr {
        let tcs = self.model.known.task_completion_source();
        Expr::new_object(Expr::type_ref(script_type_id(tcs)), Vec::new())
    }

    pub fn set_async_result(&self, source: Expr, value: Option<Expr>) -> Expr {
        Expr::call(
            Expr::member(source, "setResult"),
            vec![value.unwrap_or_else(Expr::null)],
        )
    }

    pub fn set_async_exception(&self, source: Expr, exception: Expr) -> Expr {
        let wrap = Expr::member(
            Expr::type_ref(script_type_id(self.model.known.exception())),
            "wrap",
        );
        Expr::call(
            Expr::member(source, "setException"),
            vec![Expr::call(wrap, vec![exception])],
        )
    }

    pub fn get_task_from_task_completion_source(&self, source: Expr) -> Expr {
        Expr::member(source, "task")
    }

    // ----- base calls ------------------------------------------------------

    /// `Base.prototype.method.call(this, args...)`, with the `call`/`apply`
    /// split for expanded parameter arrays.
    pub fn base_call(
        &self,
        base: TypeId,
        name: &str,
        expand_params: bool,
        this_expr: Expr,
        mut args: Vec<Expr>,
    ) -> Expr {
        let method = Expr::member(
            Expr::member(Expr::type_ref(script_type_id(base)), "prototype"),
            name,
        );
        if !expand_params {
            let mut call_args = vec![this_expr];
            call_args.append(&mut args);
            return Expr::call(Expr::member(method, "call"), call_args);
        }
        match args.pop() {
            Some(Expr::Array(rest)) => {
                let mut call_args = vec![this_expr];
                call_args.append(&mut args);
                call_args.extend(rest);
                Expr::call(Expr::member(method, "call"), call_args)
            }
            Some(rest) => {
                let first = Expr::Array(args);
                let all = Expr::call(Expr::member(first, "concat"), vec![rest]);
                Expr::call(Expr::member(method, "apply"), vec![this_expr, all])
            }
            None => Expr::call(Expr::member(method, "call"), vec![this_expr]),
        }
    }
}
