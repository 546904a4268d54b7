//! The user-facing expression tree and the builder methods that replace
//! operator overloading (spec.md REDESIGN FLAGS: Rust has no `__add__`, so
//! `a + b` becomes `a.add(b)`).

use bolt_expr_core::HostValue;

use crate::ir::{BinaryOp, ConditionOp, UnaryOp};
use crate::source::{DataSource, ScoreSource};

/// A node in the tree the unroller walks. Built exclusively through the
/// `Expr` constructors and the `ExprExt` builder methods below; never
/// constructed directly by a host crate.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Score(ScoreSource),
    Data(DataSource),
    Literal(HostValue),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Insert {
        index: i32,
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Condition(Condition),
}

/// A boolean-valued expression, produced by `ExprExt::eq`/`lt`/... and
/// consumed by `Expression::resolve_branch`.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Truthiness of a single operand.
    Boolean { operand: Box<Expr>, invert: bool },
    Compare {
        op: ConditionOp,
        left: Box<Expr>,
        right: Box<Expr>,
        invert: bool,
    },
    And(Vec<Condition>),
    Or(Vec<Condition>),
    Not(Box<Condition>),
}

/// Anything that can appear as an expression operand: a source, a literal,
/// or another expression.
pub trait IntoExpr {
    fn into_expr(self) -> Expr;
}

impl IntoExpr for Expr {
    fn into_expr(self) -> Expr {
        self
    }
}
impl IntoExpr for ScoreSource {
    fn into_expr(self) -> Expr {
        Expr::Score(self)
    }
}
impl IntoExpr for DataSource {
    fn into_expr(self) -> Expr {
        Expr::Data(self)
    }
}
impl IntoExpr for i64 {
    fn into_expr(self) -> Expr {
        Expr::Literal(HostValue::Int(self))
    }
}
impl IntoExpr for f64 {
    fn into_expr(self) -> Expr {
        Expr::Literal(HostValue::Float(self))
    }
}
impl IntoExpr for bool {
    fn into_expr(self) -> Expr {
        Expr::Literal(HostValue::Bool(self))
    }
}
impl IntoExpr for &str {
    fn into_expr(self) -> Expr {
        Expr::Literal(HostValue::Str(self.to_string()))
    }
}
impl IntoExpr for HostValue {
    fn into_expr(self) -> Expr {
        Expr::Literal(self)
    }
}

/// Builder methods standing in for the operator overloads the Python
/// original used (`a + b`, `a == b`, ...). Blanket-implemented for anything
/// convertible to an `Expr`.
pub trait ExprExt: IntoExpr + Sized {
    fn binary(self, op: BinaryOp, rhs: impl IntoExpr) -> Expr {
        Expr::Binary {
            op,
            left: Box::new(self.into_expr()),
            right: Box::new(rhs.into_expr()),
        }
    }

    fn set(self, rhs: impl IntoExpr) -> Expr {
        self.binary(BinaryOp::Set, rhs)
    }
    fn add(self, rhs: impl IntoExpr) -> Expr {
        self.binary(BinaryOp::Add, rhs)
    }
    fn sub(self, rhs: impl IntoExpr) -> Expr {
        self.binary(BinaryOp::Sub, rhs)
    }
    fn mul(self, rhs: impl IntoExpr) -> Expr {
        self.binary(BinaryOp::Mul, rhs)
    }
    fn div(self, rhs: impl IntoExpr) -> Expr {
        self.binary(BinaryOp::Div, rhs)
    }
    fn rem(self, rhs: impl IntoExpr) -> Expr {
        self.binary(BinaryOp::Mod, rhs)
    }
    fn min(self, rhs: impl IntoExpr) -> Expr {
        self.binary(BinaryOp::Min, rhs)
    }
    fn max(self, rhs: impl IntoExpr) -> Expr {
        self.binary(BinaryOp::Max, rhs)
    }
    fn append(self, rhs: impl IntoExpr) -> Expr {
        self.binary(BinaryOp::Append, rhs)
    }
    fn prepend(self, rhs: impl IntoExpr) -> Expr {
        self.binary(BinaryOp::Prepend, rhs)
    }
    fn merge(self, rhs: impl IntoExpr) -> Expr {
        self.binary(BinaryOp::Merge, rhs)
    }

    fn insert(self, index: i32, rhs: impl IntoExpr) -> Expr {
        Expr::Insert {
            index,
            op: BinaryOp::Merge,
            left: Box::new(self.into_expr()),
            right: Box::new(rhs.into_expr()),
        }
    }

    fn unary(self, op: UnaryOp) -> Expr {
        Expr::Unary {
            op,
            operand: Box::new(self.into_expr()),
        }
    }
    fn remove(self) -> Expr {
        self.unary(UnaryOp::Remove)
    }
    fn reset(self) -> Expr {
        self.unary(UnaryOp::Reset)
    }
    fn enable(self) -> Expr {
        self.unary(UnaryOp::Enable)
    }
    fn get_length(self) -> Expr {
        self.unary(UnaryOp::GetLength)
    }

    fn boolean(self) -> Condition {
        Condition::Boolean {
            operand: Box::new(self.into_expr()),
            invert: false,
        }
    }

    fn compare(self, op: ConditionOp, rhs: impl IntoExpr) -> Condition {
        Condition::Compare {
            op,
            left: Box::new(self.into_expr()),
            right: Box::new(rhs.into_expr()),
            invert: false,
        }
    }
    fn eq(self, rhs: impl IntoExpr) -> Condition {
        self.compare(ConditionOp::Equal, rhs)
    }
    fn lt(self, rhs: impl IntoExpr) -> Condition {
        self.compare(ConditionOp::LessThan, rhs)
    }
    fn le(self, rhs: impl IntoExpr) -> Condition {
        self.compare(ConditionOp::LessThanOrEqualTo, rhs)
    }
    fn gt(self, rhs: impl IntoExpr) -> Condition {
        self.compare(ConditionOp::GreaterThan, rhs)
    }
    fn ge(self, rhs: impl IntoExpr) -> Condition {
        self.compare(ConditionOp::GreaterThanOrEqualTo, rhs)
    }
}

impl<T: IntoExpr> ExprExt for T {}

impl Condition {
    pub fn and(self, other: Condition) -> Condition {
        match self {
            Condition::And(mut clauses) => {
                clauses.push(other);
                Condition::And(clauses)
            }
            first => Condition::And(vec![first, other]),
        }
    }

    pub fn or(self, other: Condition) -> Condition {
        match self {
            Condition::Or(mut clauses) => {
                clauses.push(other);
                Condition::Or(clauses)
            }
            first => Condition::Or(vec![first, other]),
        }
    }

    pub fn not(self) -> Condition {
        match self {
            Condition::Boolean { operand, invert } => Condition::Boolean { operand, invert: !invert },
            Condition::Compare { op, left, right, invert } => Condition::Compare { op, left, right, invert: !invert },
            other => Condition::Not(Box::new(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_methods_compose_a_tree() {
        let x = ScoreSource::new("@s", "health");
        let expr = x.clone().add(5i64).mul(2i64);
        assert_eq!(
            expr,
            Expr::Binary {
                op: BinaryOp::Mul,
                left: Box::new(Expr::Binary {
                    op: BinaryOp::Add,
                    left: Box::new(Expr::Score(x)),
                    right: Box::new(Expr::Literal(HostValue::Int(5))),
                }),
                right: Box::new(Expr::Literal(HostValue::Int(2))),
            }
        );
    }

    #[test]
    fn double_negation_of_a_compare_cancels_invert() {
        let cond = ScoreSource::new("@s", "health").eq(0i64).not().not();
        assert!(matches!(cond, Condition::Compare { invert: false, .. }));
    }
}
