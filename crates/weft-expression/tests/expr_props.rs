//! Property-based checks for expression evaluation over scalar values.

use proptest::prelude::*;
use weft_expression::{BinaryOp, Expr, Scope, UnaryOp};
use weft_observation::{BindingFlags, Obj, Value};

fn scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::Int),
        "[a-z]{0,8}".prop_map(Value::str),
    ]
}

fn eval(expr: &Expr) -> Value {
    expr.evaluate(BindingFlags::empty(), &Scope::new(Obj::new()), None)
        .unwrap()
}

proptest! {
    #[test]
    fn equality_matches_value_semantics(a in scalar(), b in scalar()) {
        let eq = Expr::binary(BinaryOp::Eq, Expr::literal(a.clone()), Expr::literal(b.clone()));
        let ne = Expr::binary(BinaryOp::Ne, Expr::literal(a.clone()), Expr::literal(b.clone()));
        prop_assert_eq!(eval(&eq), Value::Bool(a == b));
        prop_assert_eq!(eval(&ne), Value::Bool(a != b));
    }

    #[test]
    fn double_negation_preserves_truthiness(v in scalar()) {
        let expr = Expr::unary(
            UnaryOp::Not,
            Expr::unary(UnaryOp::Not, Expr::literal(v.clone())),
        );
        prop_assert_eq!(eval(&expr), Value::Bool(v.is_truthy()));
    }

    #[test]
    fn and_or_yield_the_deciding_operand(a in scalar(), b in scalar()) {
        let and = Expr::binary(BinaryOp::And, Expr::literal(a.clone()), Expr::literal(b.clone()));
        let or = Expr::binary(BinaryOp::Or, Expr::literal(a.clone()), Expr::literal(b.clone()));
        let expect_and = if a.is_truthy() { b.clone() } else { a.clone() };
        let expect_or = if a.is_truthy() { a.clone() } else { b.clone() };
        prop_assert_eq!(eval(&and), expect_and);
        prop_assert_eq!(eval(&or), expect_or);
    }

    #[test]
    fn conditional_selects_by_truthiness(c in scalar(), yes in any::<i64>(), no in any::<i64>()) {
        let expr = Expr::conditional(
            Expr::literal(c.clone()),
            Expr::literal(yes),
            Expr::literal(no),
        );
        let expected = if c.is_truthy() { yes } else { no };
        prop_assert_eq!(eval(&expr), Value::Int(expected));
    }

    #[test]
    fn integer_comparison_matches_ord(a in any::<i64>(), b in any::<i64>()) {
        let lt = Expr::binary(BinaryOp::Lt, Expr::literal(a), Expr::literal(b));
        let ge = Expr::binary(BinaryOp::Ge, Expr::literal(a), Expr::literal(b));
        prop_assert_eq!(eval(&lt), Value::Bool(a < b));
        prop_assert_eq!(eval(&ge), Value::Bool(a >= b));
    }
}
