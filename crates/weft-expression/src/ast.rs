//! The expression tree: evaluate, assign, and the connect pass.
//!
//! Nodes are built with the `Expr::*` constructors, which return
//! `Rc<Expr>` so trees compose and share without ceremony:
//!
//! ```
//! use weft_expression::{Expr, Scope};
//! use weft_observation::{BindingFlags, Obj, Value};
//!
//! let vm = Obj::with([("count", Value::Int(2))]);
//! let scope = Scope::new(vm);
//!
//! // count + 1
//! let expr = Expr::binary(
//!     weft_expression::BinaryOp::Add,
//!     Expr::access_scope("count"),
//!     Expr::literal(1),
//! );
//! let value = expr.evaluate(BindingFlags::empty(), &scope, None).unwrap();
//! assert_eq!(value, Value::Int(3));
//! ```
//!
//! # Connect pass
//!
//! `evaluate` with a [`Connectable`] reports every property/collection the
//! evaluated path touches. Only the path actually taken is reported:
//! conditional arms and short-circuited `&&`/`||` sides that don't execute
//! contribute nothing, so the caller's next pruning pass drops their
//! observers.
//!
//! # Lifecycle hooks
//!
//! `bind`/`unbind` exist for node kinds that need per-binding setup before
//! first evaluation. None of the current kinds do — both are no-ops — but
//! bindings call them at the contracted points so behavior-style nodes can
//! be added without touching the binding implementations.

use std::fmt;
use std::rc::Rc;

use weft_observation::{BindingFlags, Value};

use crate::connect::Connectable;
use crate::error::ExprError;
use crate::scope::Scope;

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// Logical negation of truthiness.
    Not,
    /// Numeric negation.
    Neg,
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// Numeric addition / string concatenation.
    Add,
    /// Numeric subtraction.
    Sub,
    /// Numeric multiplication.
    Mul,
    /// Numeric division.
    Div,
    /// Equality (value semantics; identity for objects/lists/functions).
    Eq,
    /// Negated equality.
    Ne,
    /// Less than.
    Lt,
    /// Less than or equal.
    Le,
    /// Greater than.
    Gt,
    /// Greater than or equal.
    Ge,
    /// Short-circuit logical and; yields the deciding operand.
    And,
    /// Short-circuit logical or; yields the deciding operand.
    Or,
}

impl BinaryOp {
    fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::And => "&&",
            Self::Or => "||",
        }
    }
}

/// An immutable binding expression node.
#[derive(Debug, Clone)]
pub enum Expr {
    /// A constant value.
    Literal(Value),
    /// `$this` / `$parent^n`: the context object `ancestor` hops up.
    AccessThis {
        /// Override-chain hops (`0` = innermost context).
        ancestor: usize,
    },
    /// A name resolved against the scope chain.
    AccessScope {
        /// Property name.
        name: String,
        /// Override-chain hops pinning resolution (`0` = walk).
        ancestor: usize,
    },
    /// `object.name`.
    AccessMember {
        /// The object expression.
        object: Rc<Expr>,
        /// Member name.
        name: String,
    },
    /// `object[key]`.
    AccessKeyed {
        /// The object expression.
        object: Rc<Expr>,
        /// The key expression.
        key: Rc<Expr>,
    },
    /// `name(args…)` resolved against the scope chain.
    CallScope {
        /// Function property name.
        name: String,
        /// Argument expressions.
        args: Vec<Rc<Expr>>,
        /// Override-chain hops.
        ancestor: usize,
    },
    /// `object.name(args…)`.
    CallMember {
        /// The object expression.
        object: Rc<Expr>,
        /// Method property name.
        name: String,
        /// Argument expressions.
        args: Vec<Rc<Expr>>,
    },
    /// Unary operation.
    Unary {
        /// Operator.
        op: UnaryOp,
        /// Operand.
        expr: Rc<Expr>,
    },
    /// Binary operation.
    Binary {
        /// Operator.
        op: BinaryOp,
        /// Left operand.
        left: Rc<Expr>,
        /// Right operand.
        right: Rc<Expr>,
    },
    /// `condition ? yes : no`.
    Conditional {
        /// The condition.
        condition: Rc<Expr>,
        /// Value when truthy.
        yes: Rc<Expr>,
        /// Value when falsy.
        no: Rc<Expr>,
    },
    /// `target = value`.
    Assign {
        /// Assignable target expression.
        target: Rc<Expr>,
        /// Value expression.
        value: Rc<Expr>,
    },
}

impl Expr {
    /// Constant node.
    #[must_use]
    pub fn literal(value: impl Into<Value>) -> Rc<Self> {
        Rc::new(Self::Literal(value.into()))
    }

    /// `$this`.
    #[must_use]
    pub fn access_this() -> Rc<Self> {
        Rc::new(Self::AccessThis { ancestor: 0 })
    }

    /// `$parent^n`.
    #[must_use]
    pub fn access_ancestor(ancestor: usize) -> Rc<Self> {
        Rc::new(Self::AccessThis { ancestor })
    }

    /// Scope access, walking the override chain.
    #[must_use]
    pub fn access_scope(name: impl Into<String>) -> Rc<Self> {
        Rc::new(Self::AccessScope {
            name: name.into(),
            ancestor: 0,
        })
    }

    /// Scope access pinned `ancestor` hops up (`$parent.name`).
    #[must_use]
    pub fn access_scope_ancestor(name: impl Into<String>, ancestor: usize) -> Rc<Self> {
        Rc::new(Self::AccessScope {
            name: name.into(),
            ancestor,
        })
    }

    /// Member access.
    #[must_use]
    pub fn member(object: Rc<Self>, name: impl Into<String>) -> Rc<Self> {
        Rc::new(Self::AccessMember {
            object,
            name: name.into(),
        })
    }

    /// Keyed access.
    #[must_use]
    pub fn keyed(object: Rc<Self>, key: Rc<Self>) -> Rc<Self> {
        Rc::new(Self::AccessKeyed { object, key })
    }

    /// Scope call.
    #[must_use]
    pub fn call_scope(name: impl Into<String>, args: Vec<Rc<Self>>) -> Rc<Self> {
        Rc::new(Self::CallScope {
            name: name.into(),
            args,
            ancestor: 0,
        })
    }

    /// Member call.
    #[must_use]
    pub fn call_member(object: Rc<Self>, name: impl Into<String>, args: Vec<Rc<Self>>) -> Rc<Self> {
        Rc::new(Self::CallMember {
            object,
            name: name.into(),
            args,
        })
    }

    /// Unary operation.
    #[must_use]
    pub fn unary(op: UnaryOp, expr: Rc<Self>) -> Rc<Self> {
        Rc::new(Self::Unary { op, expr })
    }

    /// Binary operation.
    #[must_use]
    pub fn binary(op: BinaryOp, left: Rc<Self>, right: Rc<Self>) -> Rc<Self> {
        Rc::new(Self::Binary { op, left, right })
    }

    /// Conditional.
    #[must_use]
    pub fn conditional(condition: Rc<Self>, yes: Rc<Self>, no: Rc<Self>) -> Rc<Self> {
        Rc::new(Self::Conditional { condition, yes, no })
    }

    /// Assignment.
    #[must_use]
    pub fn assign_expr(target: Rc<Self>, value: Rc<Self>) -> Rc<Self> {
        Rc::new(Self::Assign { target, value })
    }

    /// Node kind name, used in errors and debugging.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Literal(_) => "literal",
            Self::AccessThis { .. } => "access-this",
            Self::AccessScope { .. } => "access-scope",
            Self::AccessMember { .. } => "access-member",
            Self::AccessKeyed { .. } => "access-keyed",
            Self::CallScope { .. } => "call-scope",
            Self::CallMember { .. } => "call-member",
            Self::Unary { .. } => "unary",
            Self::Binary { .. } => "binary",
            Self::Conditional { .. } => "conditional",
            Self::Assign { .. } => "assign",
        }
    }

    /// Whether [`Expr::assign`] can succeed for this shape.
    #[must_use]
    pub fn is_assignable(&self) -> bool {
        matches!(
            self,
            Self::AccessScope { .. } | Self::AccessMember { .. } | Self::AccessKeyed { .. }
        )
    }

    /// Evaluate against `scope`, reporting touched properties to
    /// `connectable` when supplied.
    pub fn evaluate(
        &self,
        flags: BindingFlags,
        scope: &Scope,
        mut connectable: Option<&mut (dyn Connectable + '_)>,
    ) -> Result<Value, ExprError> {
        match self {
            Self::Literal(value) => Ok(value.clone()),
            Self::AccessThis { ancestor } => {
                scope.ancestor_context(*ancestor).map(Value::Object)
            }
            Self::AccessScope { name, ancestor } => {
                let context = scope.context_for(name, *ancestor)?;
                if let Some(c) = connectable.as_deref_mut() {
                    c.observe_property(&context, name);
                }
                Ok(context.get(name))
            }
            Self::AccessMember { object, name } => {
                let value = object.evaluate(flags, scope, connectable.as_deref_mut())?;
                Self::read_member(&value, name, connectable)
            }
            Self::AccessKeyed { object, key } => {
                let value = object.evaluate(flags, scope, connectable.as_deref_mut())?;
                let key = key.evaluate(flags, scope, connectable.as_deref_mut())?;
                Self::read_keyed(&value, &key, connectable)
            }
            Self::CallScope {
                name,
                args,
                ancestor,
            } => {
                let context = scope.context_for(name, *ancestor)?;
                let callee = context.get(name);
                let args = Self::evaluate_args(args, flags, scope, connectable)?;
                Self::invoke(&callee, name, &args)
            }
            Self::CallMember { object, name, args } => {
                let value = object.evaluate(flags, scope, connectable.as_deref_mut())?;
                let callee = Self::read_member(&value, name, None)?;
                let args = Self::evaluate_args(args, flags, scope, connectable)?;
                Self::invoke(&callee, name, &args)
            }
            Self::Unary { op, expr } => {
                let value = expr.evaluate(flags, scope, connectable)?;
                match op {
                    UnaryOp::Not => Ok(Value::Bool(!value.is_truthy())),
                    UnaryOp::Neg => match value {
                        Value::Int(i) => i
                            .checked_neg()
                            .map(Value::Int)
                            .ok_or(ExprError::Overflow { op: "-" }),
                        Value::Float(x) => Ok(Value::Float(-x)),
                        other => Err(ExprError::TypeMismatch {
                            op: "-",
                            left: other.type_name(),
                            right: "-",
                        }),
                    },
                }
            }
            Self::Binary { op, left, right } => {
                let lhs = left.evaluate(flags, scope, connectable.as_deref_mut())?;
                match op {
                    // Short-circuit: the untaken side is neither evaluated
                    // nor observed.
                    BinaryOp::And => {
                        if lhs.is_truthy() {
                            right.evaluate(flags, scope, connectable)
                        } else {
                            Ok(lhs)
                        }
                    }
                    BinaryOp::Or => {
                        if lhs.is_truthy() {
                            Ok(lhs)
                        } else {
                            right.evaluate(flags, scope, connectable)
                        }
                    }
                    _ => {
                        let rhs = right.evaluate(flags, scope, connectable)?;
                        Self::apply_binary(*op, &lhs, &rhs)
                    }
                }
            }
            Self::Conditional { condition, yes, no } => {
                let chosen = if condition
                    .evaluate(flags, scope, connectable.as_deref_mut())?
                    .is_truthy()
                {
                    yes
                } else {
                    no
                };
                chosen.evaluate(flags, scope, connectable)
            }
            Self::Assign { target, value } => {
                let value = value.evaluate(flags, scope, connectable)?;
                target.assign(flags, scope, value.clone())?;
                Ok(value)
            }
        }
    }

    /// Write `value` through this expression. Only scope, member, and
    /// keyed accesses are assignable.
    pub fn assign(&self, flags: BindingFlags, scope: &Scope, value: Value) -> Result<(), ExprError> {
        match self {
            Self::AccessScope { name, ancestor } => {
                let context = scope.context_for(name, *ancestor)?;
                context.set_with_flags(name, value, flags);
                Ok(())
            }
            Self::AccessMember { object, name } => {
                let target = object.evaluate(flags, scope, None)?;
                match target {
                    Value::Object(obj) => {
                        obj.set_with_flags(name, value, flags);
                        Ok(())
                    }
                    Value::Null => Err(ExprError::NullAccess { name: name.clone() }),
                    other => Err(ExprError::TypeMismatch {
                        op: "member assignment",
                        left: other.type_name(),
                        right: "-",
                    }),
                }
            }
            Self::AccessKeyed { object, key } => {
                let target = object.evaluate(flags, scope, None)?;
                let key = key.evaluate(flags, scope, None)?;
                match (target, key) {
                    (Value::List(list), Value::Int(index)) => {
                        let index = usize::try_from(index).map_err(|_| {
                            ExprError::TypeMismatch {
                                op: "keyed assignment",
                                left: "list",
                                right: "negative index",
                            }
                        })?;
                        if index >= list.len() {
                            return Err(ExprError::IndexOutOfBounds {
                                index,
                                len: list.len(),
                            });
                        }
                        list.set(index, value);
                        Ok(())
                    }
                    (Value::Object(obj), Value::Str(name)) => {
                        obj.set_with_flags(&name, value, flags);
                        Ok(())
                    }
                    (Value::Null, _) => Err(ExprError::NullAccess {
                        name: "[key]".to_owned(),
                    }),
                    (target, key) => Err(ExprError::TypeMismatch {
                        op: "keyed assignment",
                        left: target.type_name(),
                        right: key.type_name(),
                    }),
                }
            }
            _ => Err(ExprError::NotAssignable { kind: self.kind() }),
        }
    }

    /// Per-binding setup hook, called once per bind before the first
    /// evaluation. No current node kind needs setup.
    pub fn bind(&self, _flags: BindingFlags, _scope: &Scope) -> Result<(), ExprError> {
        Ok(())
    }

    /// Teardown counterpart of [`Expr::bind`], called once per unbind.
    pub fn unbind(&self, _flags: BindingFlags, _scope: &Scope) {}

    fn evaluate_args(
        args: &[Rc<Self>],
        flags: BindingFlags,
        scope: &Scope,
        mut connectable: Option<&mut (dyn Connectable + '_)>,
    ) -> Result<Vec<Value>, ExprError> {
        args.iter()
            .map(|arg| arg.evaluate(flags, scope, connectable.as_deref_mut()))
            .collect()
    }

    fn read_member(
        value: &Value,
        name: &str,
        mut connectable: Option<&mut (dyn Connectable + '_)>,
    ) -> Result<Value, ExprError> {
        match value {
            Value::Object(obj) => {
                if let Some(c) = connectable.as_deref_mut() {
                    c.observe_property(obj, name);
                }
                Ok(obj.get(name))
            }
            Value::List(list) if name == "length" => {
                if let Some(c) = connectable.as_deref_mut() {
                    c.observe_list(list);
                }
                Ok(Value::Int(list.len() as i64))
            }
            Value::Str(s) if name == "length" => Ok(Value::Int(s.chars().count() as i64)),
            Value::Null => Err(ExprError::NullAccess {
                name: name.to_owned(),
            }),
            // Scalar member access reads as absent, like a missing property.
            _ => Ok(Value::Null),
        }
    }

    fn read_keyed(
        value: &Value,
        key: &Value,
        mut connectable: Option<&mut (dyn Connectable + '_)>,
    ) -> Result<Value, ExprError> {
        match (value, key) {
            (Value::List(list), Value::Int(index)) => {
                if let Some(c) = connectable.as_deref_mut() {
                    c.observe_list(list);
                }
                let Ok(index) = usize::try_from(*index) else {
                    return Ok(Value::Null);
                };
                Ok(list.get(index).unwrap_or(Value::Null))
            }
            (Value::Object(obj), Value::Str(name)) => {
                if let Some(c) = connectable.as_deref_mut() {
                    c.observe_property(obj, name);
                }
                Ok(obj.get(name))
            }
            (Value::Null, _) => Err(ExprError::NullAccess {
                name: "[key]".to_owned(),
            }),
            _ => Ok(Value::Null),
        }
    }

    fn invoke(callee: &Value, name: &str, args: &[Value]) -> Result<Value, ExprError> {
        match callee {
            Value::Func(f) => Ok(f(args)),
            _ => Err(ExprError::NotCallable {
                name: name.to_owned(),
            }),
        }
    }

    fn apply_binary(op: BinaryOp, lhs: &Value, rhs: &Value) -> Result<Value, ExprError> {
        use Value::{Float, Int, Str};
        let mismatch = || ExprError::TypeMismatch {
            op: op.symbol(),
            left: lhs.type_name(),
            right: rhs.type_name(),
        };
        match op {
            BinaryOp::Add => match (lhs, rhs) {
                (Int(a), Int(b)) => a
                    .checked_add(*b)
                    .map(Int)
                    .ok_or(ExprError::Overflow { op: "+" }),
                (Float(a), Float(b)) => Ok(Float(a + b)),
                (Int(a), Float(b)) => Ok(Float(*a as f64 + b)),
                (Float(a), Int(b)) => Ok(Float(a + *b as f64)),
                (Str(a), Str(b)) => Ok(Value::str(format!("{a}{b}"))),
                _ => Err(mismatch()),
            },
            BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div => {
                Self::apply_arithmetic(op, lhs, rhs).ok_or_else(mismatch)?
            }
            BinaryOp::Eq => Ok(Value::Bool(lhs == rhs)),
            BinaryOp::Ne => Ok(Value::Bool(lhs != rhs)),
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
                let ordering = Self::compare(lhs, rhs).ok_or_else(mismatch)?;
                let result = match op {
                    BinaryOp::Lt => ordering.is_lt(),
                    BinaryOp::Le => ordering.is_le(),
                    BinaryOp::Gt => ordering.is_gt(),
                    _ => ordering.is_ge(),
                };
                Ok(Value::Bool(result))
            }
            // Handled by the short-circuit paths in `evaluate`.
            BinaryOp::And | BinaryOp::Or => unreachable!("short-circuit ops evaluated earlier"),
        }
    }

    fn apply_arithmetic(op: BinaryOp, lhs: &Value, rhs: &Value) -> Option<Result<Value, ExprError>> {
        use Value::{Float, Int};
        let (a, b) = match (lhs, rhs) {
            (Int(a), Int(b)) => {
                return Some(match op {
                    BinaryOp::Sub => a
                        .checked_sub(*b)
                        .map(Int)
                        .ok_or(ExprError::Overflow { op: "-" }),
                    BinaryOp::Mul => a
                        .checked_mul(*b)
                        .map(Int)
                        .ok_or(ExprError::Overflow { op: "*" }),
                    BinaryOp::Div => {
                        if *b == 0 {
                            Err(ExprError::DivisionByZero)
                        } else {
                            // i64::MIN / -1 is the one overflowing division.
                            a.checked_div(*b).map(Int).ok_or(ExprError::Overflow { op: "/" })
                        }
                    }
                    _ => unreachable!("arithmetic op"),
                });
            }
            (Float(a), Float(b)) => (*a, *b),
            (Int(a), Float(b)) => (*a as f64, *b),
            (Float(a), Int(b)) => (*a, *b as f64),
            _ => return None,
        };
        Some(match op {
            BinaryOp::Sub => Ok(Float(a - b)),
            BinaryOp::Mul => Ok(Float(a * b)),
            BinaryOp::Div => Ok(Float(a / b)),
            _ => unreachable!("arithmetic op"),
        })
    }

    fn compare(lhs: &Value, rhs: &Value) -> Option<std::cmp::Ordering> {
        use Value::{Float, Int, Str};
        match (lhs, rhs) {
            (Int(a), Int(b)) => Some(a.cmp(b)),
            (Float(a), Float(b)) => a.partial_cmp(b),
            (Int(a), Float(b)) => (*a as f64).partial_cmp(b),
            (Float(a), Int(b)) => a.partial_cmp(&(*b as f64)),
            (Str(a), Str(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(v) => write!(f, "{v:?}"),
            Self::AccessThis { ancestor: 0 } => write!(f, "$this"),
            Self::AccessThis { ancestor } => write!(f, "$parent^{ancestor}"),
            Self::AccessScope { name, ancestor: 0 } => write!(f, "{name}"),
            Self::AccessScope { name, ancestor } => write!(f, "$parent^{ancestor}.{name}"),
            Self::AccessMember { object, name } => write!(f, "{object}.{name}"),
            Self::AccessKeyed { object, key } => write!(f, "{object}[{key}]"),
            Self::CallScope { name, args, .. } => {
                write!(f, "{name}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ")")
            }
            Self::CallMember { object, name, args } => {
                write!(f, "{object}.{name}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ")")
            }
            Self::Unary { op, expr } => match op {
                UnaryOp::Not => write!(f, "!{expr}"),
                UnaryOp::Neg => write!(f, "-{expr}"),
            },
            Self::Binary { op, left, right } => {
                write!(f, "({left} {} {right})", op.symbol())
            }
            Self::Conditional { condition, yes, no } => {
                write!(f, "({condition} ? {yes} : {no})")
            }
            Self::Assign { target, value } => write!(f, "({target} = {value})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connect::RecordingConnectable;
    use weft_observation::{List, Obj};

    fn eval(expr: &Expr, scope: &Scope) -> Value {
        expr.evaluate(BindingFlags::empty(), scope, None).unwrap()
    }

    #[test]
    fn literal_and_scope_access() {
        let vm = Obj::with([("count", Value::Int(5))]);
        let scope = Scope::new(vm);
        assert_eq!(eval(&Expr::literal(1), &scope), Value::Int(1));
        assert_eq!(eval(&Expr::access_scope("count"), &scope), Value::Int(5));
        assert_eq!(eval(&Expr::access_scope("absent"), &scope), Value::Null);
    }

    #[test]
    fn member_chain() {
        let address = Obj::with([("city", Value::str("Oslo"))]);
        let user = Obj::with([("address", Value::Object(address))]);
        let vm = Obj::with([("user", Value::Object(user))]);
        let scope = Scope::new(vm);

        let expr = Expr::member(Expr::member(Expr::access_scope("user"), "address"), "city");
        assert_eq!(eval(&expr, &scope), Value::str("Oslo"));
    }

    #[test]
    fn member_access_through_null_errors() {
        let vm = Obj::with([("user", Value::Null)]);
        let scope = Scope::new(vm);
        let expr = Expr::member(Expr::access_scope("user"), "name");
        let err = expr
            .evaluate(BindingFlags::empty(), &scope, None)
            .unwrap_err();
        assert_eq!(
            err,
            ExprError::NullAccess {
                name: "name".to_owned()
            }
        );
    }

    #[test]
    fn keyed_access_on_list_and_object() {
        let list = List::from_values(vec![Value::str("a"), Value::str("b")]);
        let map = Obj::with([("key", Value::Int(9))]);
        let vm = Obj::with([
            ("items", Value::List(list)),
            ("map", Value::Object(map)),
            ("idx", Value::Int(1)),
        ]);
        let scope = Scope::new(vm);

        let by_index = Expr::keyed(Expr::access_scope("items"), Expr::access_scope("idx"));
        assert_eq!(eval(&by_index, &scope), Value::str("b"));

        let by_name = Expr::keyed(Expr::access_scope("map"), Expr::literal("key"));
        assert_eq!(eval(&by_name, &scope), Value::Int(9));

        let oob = Expr::keyed(Expr::access_scope("items"), Expr::literal(99));
        assert_eq!(eval(&oob, &scope), Value::Null);
    }

    #[test]
    fn list_length_member() {
        let list = List::from_values(vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
        let vm = Obj::with([("items", Value::List(list))]);
        let scope = Scope::new(vm);
        let expr = Expr::member(Expr::access_scope("items"), "length");
        assert_eq!(eval(&expr, &scope), Value::Int(3));
    }

    #[test]
    fn call_scope_with_args() {
        let vm = Obj::new();
        vm.set_silent(
            "add",
            Value::func(|args| match (&args[0], &args[1]) {
                (Value::Int(a), Value::Int(b)) => Value::Int(a + b),
                _ => Value::Null,
            }),
        );
        vm.set_silent("x", Value::Int(2));
        let scope = Scope::new(vm);

        let expr = Expr::call_scope("add", vec![Expr::access_scope("x"), Expr::literal(3)]);
        assert_eq!(eval(&expr, &scope), Value::Int(5));
    }

    #[test]
    fn calling_a_non_function_errors() {
        let vm = Obj::with([("x", Value::Int(1))]);
        let scope = Scope::new(vm);
        let expr = Expr::call_scope("x", vec![]);
        let err = expr
            .evaluate(BindingFlags::empty(), &scope, None)
            .unwrap_err();
        assert_eq!(err, ExprError::NotCallable { name: "x".to_owned() });
    }

    #[test]
    fn arithmetic_and_comparison() {
        let scope = Scope::new(Obj::new());
        let expr = Expr::binary(BinaryOp::Mul, Expr::literal(6), Expr::literal(7));
        assert_eq!(eval(&expr, &scope), Value::Int(42));

        let expr = Expr::binary(BinaryOp::Add, Expr::literal("a"), Expr::literal("b"));
        assert_eq!(eval(&expr, &scope), Value::str("ab"));

        let expr = Expr::binary(BinaryOp::Lt, Expr::literal(1), Expr::literal(2.5));
        assert_eq!(eval(&expr, &scope), Value::Bool(true));

        let expr = Expr::binary(BinaryOp::Div, Expr::literal(1), Expr::literal(0));
        assert_eq!(
            expr.evaluate(BindingFlags::empty(), &scope, None)
                .unwrap_err(),
            ExprError::DivisionByZero
        );
    }

    #[test]
    fn integer_overflow_is_an_error_not_a_panic() {
        let scope = Scope::new(Obj::new());

        let add = Expr::binary(BinaryOp::Add, Expr::literal(i64::MAX), Expr::literal(1));
        assert_eq!(
            add.evaluate(BindingFlags::empty(), &scope, None)
                .unwrap_err(),
            ExprError::Overflow { op: "+" }
        );

        let sub = Expr::binary(BinaryOp::Sub, Expr::literal(i64::MIN), Expr::literal(1));
        assert_eq!(
            sub.evaluate(BindingFlags::empty(), &scope, None)
                .unwrap_err(),
            ExprError::Overflow { op: "-" }
        );

        let mul = Expr::binary(BinaryOp::Mul, Expr::literal(i64::MAX), Expr::literal(2));
        assert_eq!(
            mul.evaluate(BindingFlags::empty(), &scope, None)
                .unwrap_err(),
            ExprError::Overflow { op: "*" }
        );

        let div = Expr::binary(BinaryOp::Div, Expr::literal(i64::MIN), Expr::literal(-1));
        assert_eq!(
            div.evaluate(BindingFlags::empty(), &scope, None)
                .unwrap_err(),
            ExprError::Overflow { op: "/" }
        );

        let neg = Expr::unary(UnaryOp::Neg, Expr::literal(i64::MIN));
        assert_eq!(
            neg.evaluate(BindingFlags::empty(), &scope, None)
                .unwrap_err(),
            ExprError::Overflow { op: "-" }
        );
    }

    #[test]
    fn conditional_takes_active_branch() {
        let vm = Obj::with([
            ("flag", Value::Bool(true)),
            ("a", Value::Int(1)),
            ("b", Value::Int(2)),
        ]);
        let scope = Scope::new(vm.clone());
        let expr = Expr::conditional(
            Expr::access_scope("flag"),
            Expr::access_scope("a"),
            Expr::access_scope("b"),
        );
        assert_eq!(eval(&expr, &scope), Value::Int(1));
        vm.set("flag", Value::Bool(false));
        assert_eq!(eval(&expr, &scope), Value::Int(2));
    }

    #[test]
    fn connect_pass_reports_only_taken_branch() {
        let a = Obj::with([("x", Value::Int(1))]);
        let c = Obj::with([("y", Value::Int(2))]);
        let vm = Obj::with([
            ("flag", Value::Bool(true)),
            ("a", Value::Object(a.clone())),
            ("c", Value::Object(c.clone())),
        ]);
        let scope = Scope::new(vm.clone());

        // flag ? a.x : c.y
        let expr = Expr::conditional(
            Expr::access_scope("flag"),
            Expr::member(Expr::access_scope("a"), "x"),
            Expr::member(Expr::access_scope("c"), "y"),
        );

        let mut recorder = RecordingConnectable::default();
        expr.evaluate(BindingFlags::empty(), &scope, Some(&mut recorder))
            .unwrap();
        let names: Vec<&str> = recorder.properties.iter().map(|(_, n)| n.as_str()).collect();
        assert_eq!(names, vec!["flag", "a", "x"]);
        assert!(!recorder.properties.iter().any(|(id, _)| *id == c.id()));
    }

    #[test]
    fn short_circuit_skips_untaken_side() {
        let vm = Obj::with([("lhs", Value::Bool(false)), ("rhs", Value::Bool(true))]);
        let scope = Scope::new(vm);
        let expr = Expr::binary(
            BinaryOp::And,
            Expr::access_scope("lhs"),
            Expr::access_scope("rhs"),
        );
        let mut recorder = RecordingConnectable::default();
        expr.evaluate(BindingFlags::empty(), &scope, Some(&mut recorder))
            .unwrap();
        let names: Vec<&str> = recorder.properties.iter().map(|(_, n)| n.as_str()).collect();
        assert_eq!(names, vec!["lhs"]);
    }

    #[test]
    fn assign_to_scope_and_member() {
        let user = Obj::new();
        let vm = Obj::with([("user", Value::Object(user.clone()))]);
        let scope = Scope::new(vm.clone());

        Expr::access_scope("title")
            .assign(BindingFlags::empty(), &scope, Value::str("hi"))
            .unwrap();
        assert_eq!(vm.get("title"), Value::str("hi"));

        Expr::member(Expr::access_scope("user"), "name")
            .assign(BindingFlags::empty(), &scope, Value::str("Ada"))
            .unwrap();
        assert_eq!(user.get("name"), Value::str("Ada"));
    }

    #[test]
    fn assign_to_non_assignable_errors() {
        let scope = Scope::new(Obj::new());
        let expr = Expr::binary(BinaryOp::Add, Expr::literal(1), Expr::literal(2));
        assert_eq!(
            expr.assign(BindingFlags::empty(), &scope, Value::Int(1))
                .unwrap_err(),
            ExprError::NotAssignable { kind: "binary" }
        );
        assert!(!expr.is_assignable());
        assert!(Expr::access_scope("x").is_assignable());
    }

    #[test]
    fn keyed_assign_bounds() {
        let list = List::from_values(vec![Value::Int(1)]);
        let vm = Obj::with([("items", Value::List(list.clone()))]);
        let scope = Scope::new(vm);

        let expr = Expr::keyed(Expr::access_scope("items"), Expr::literal(0));
        expr.assign(BindingFlags::empty(), &scope, Value::Int(9))
            .unwrap();
        assert_eq!(list.get(0), Some(Value::Int(9)));

        let oob = Expr::keyed(Expr::access_scope("items"), Expr::literal(5));
        assert_eq!(
            oob.assign(BindingFlags::empty(), &scope, Value::Int(1))
                .unwrap_err(),
            ExprError::IndexOutOfBounds { index: 5, len: 1 }
        );
    }

    #[test]
    fn assign_expression_evaluates_to_value() {
        let vm = Obj::new();
        let scope = Scope::new(vm.clone());
        let expr = Expr::assign_expr(Expr::access_scope("x"), Expr::literal(7));
        assert_eq!(eval(&expr, &scope), Value::Int(7));
        assert_eq!(vm.get("x"), Value::Int(7));
    }

    #[test]
    fn display_round_trips_shape() {
        let expr = Expr::conditional(
            Expr::access_scope("flag"),
            Expr::member(Expr::access_scope("a"), "x"),
            Expr::literal(0),
        );
        assert_eq!(expr.to_string(), "(flag ? a.x : 0)");
    }
}
