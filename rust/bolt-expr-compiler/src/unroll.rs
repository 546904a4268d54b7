//! Lowers an `Expr`/`Condition` tree into a flat, ordered `IrNode` list
//! (spec.md §4.3). This is a tree-walk, not the generator-based
//! `SmartGenerator` the original used — Rust has no cheap coroutines, so the
//! unroller just returns `(result, Vec<IrNode>)` and callers concatenate.

use bolt_expr_core::{cast, check, CheckFlags, NbtType, NbtValue, Scale};

use crate::error::UnrollError;
use crate::expr_tree::{Condition, Expr};
use crate::ir::{
    BinaryOp, ConditionOp, IrBinary, IrBinaryCondition, IrCast, IrCondition, IrData, IrInsert,
    IrLiteral, IrNode, IrOperand, IrScore, IrStore, IrUnary, IrUnaryCondition, StoreKind, UnaryOp,
};
use crate::managers::{ConstManager, TempManager};

pub struct Unroller<'a> {
    pub temps: &'a mut TempManager,
    pub consts: &'a mut ConstManager,
}

impl<'a> Unroller<'a> {
    pub fn new(temps: &'a mut TempManager, consts: &'a mut ConstManager) -> Self {
        Unroller { temps, consts }
    }

    /// Lowers `expr`, returning the operand holding its final value and the
    /// commands needed to compute it, in order.
    pub fn unroll(&mut self, expr: &Expr) -> Result<(IrOperand, Vec<IrNode>), UnrollError> {
        match expr {
            Expr::Score(s) => Ok((IrOperand::Score(IrScore { source: s.clone() }), Vec::new())),
            Expr::Data(d) => Ok((IrOperand::Data(IrData { source: d.clone() }), Vec::new())),
            Expr::Literal(host) => {
                let nbt = NbtValue::from_host(host.clone())
                    .map_err(|_| UnrollError::Unrepresentable(host.clone()))?;
                if is_composite(&nbt) {
                    Ok((IrOperand::Composite(crate::ir::IrCompositeLiteral { value: nbt }), Vec::new()))
                } else {
                    Ok((IrOperand::Literal(IrLiteral { value: nbt }), Vec::new()))
                }
            }
            Expr::Unary { op, operand } => self.unroll_unary(*op, operand),
            Expr::Binary { op, left, right } => self.unroll_binary(*op, None, left, right),
            Expr::Insert { index, op, left, right } => self.unroll_insert(*index, *op, left, right),
            Expr::Condition(_) => Err(UnrollError::UnsupportedShape {
                op: "condition".to_string(),
                shape: "value position".to_string(),
                reason: "a condition has no scalar value; use resolve_branch".to_string(),
            }),
        }
    }

    fn unroll_unary(&mut self, op: UnaryOp, operand: &Expr) -> Result<(IrOperand, Vec<IrNode>), UnrollError> {
        let (val, mut nodes) = self.unroll(operand)?;
        match op {
            UnaryOp::GetLength => {
                let dest = IrOperand::Score(IrScore { source: self.temps.fresh_score() });
                nodes.push(IrNode::Unary(IrUnary {
                    op,
                    target: val,
                    stores: vec![IrStore {
                        kind: StoreKind::Result,
                        target: dest.clone(),
                        scale: Scale::ONE,
                        cast_type: None,
                    }],
                }));
                Ok((dest, nodes))
            }
            UnaryOp::Remove | UnaryOp::Reset | UnaryOp::Enable => {
                nodes.push(IrNode::Unary(IrUnary { op, target: val.clone(), stores: Vec::new() }));
                Ok((val, nodes))
            }
        }
    }

    /// `op` applied with an explicit destination, used when a parent binary
    /// op already decided where this subtree's result must land (so the
    /// final `set`/arithmetic op writes straight there instead of via an
    /// intermediate temp).
    fn unroll_binary(
        &mut self,
        op: BinaryOp,
        dest: Option<IrOperand>,
        left: &Expr,
        right: &Expr,
    ) -> Result<(IrOperand, Vec<IrNode>), UnrollError> {
        let (lval, mut nodes) = self.unroll(left)?;

        if op.is_copy() {
            // `set`/`append`/`prepend`/`merge` always write into the left
            // operand itself. A self-referential compound assignment like
            // `x.set(x.mul(3))` — the same pattern a host's `x *= 3` lowers
            // to, since there's no operator overload to special-case it at
            // the builder level — unrolls the right side with `lval` as its
            // destination, so the arithmetic lands there directly instead of
            // a temp round-trip plus a copy back. Anything else (the right
            // side naming a different source, or not being arithmetic at
            // all) unrolls the ordinary way.
            let (rval, rnodes) = match right {
                Expr::Binary { op: inner_op, left: inner_left, right: inner_right }
                    if !inner_op.is_copy() && inner_left.as_ref() == left =>
                {
                    self.unroll_binary(*inner_op, Some(lval.clone()), inner_left, inner_right)?
                }
                _ => self.unroll(right)?,
            };
            nodes.extend(rnodes);
            let rval = check_literal_assignment(&lval, rval)?;
            if rval != lval {
                nodes.push(IrNode::Binary(IrBinary { op, left: lval.clone(), right: rval, stores: Vec::new() }));
            }
            return Ok((lval, nodes));
        }

        let (rval, rnodes) = self.unroll(right)?;
        nodes.extend(rnodes);
        let (mut target, mut rhs) = (lval, rval);
        let destination = match dest {
            Some(d) => {
                if target != d {
                    nodes.push(set_node(d.clone(), target));
                }
                d
            }
            None if target.is_temp(self.temps.allocated()) => target,
            None if op.is_commutative() && rhs.is_temp(self.temps.allocated()) => {
                std::mem::swap(&mut target, &mut rhs);
                target
            }
            None => {
                let temp = IrOperand::Score(IrScore { source: self.temps.fresh_score() });
                nodes.push(set_node(temp.clone(), target));
                temp
            }
        };

        nodes.push(IrNode::Binary(IrBinary {
            op,
            left: destination.clone(),
            right: rhs,
            stores: Vec::new(),
        }));
        Ok((destination, nodes))
    }

    fn unroll_insert(
        &mut self,
        index: i32,
        op: BinaryOp,
        left: &Expr,
        right: &Expr,
    ) -> Result<(IrOperand, Vec<IrNode>), UnrollError> {
        let (lval, mut nodes) = self.unroll(left)?;
        let (rval, rnodes) = self.unroll(right)?;
        nodes.extend(rnodes);
        let rval = check_literal_assignment(&lval, rval)?;
        nodes.push(IrNode::Insert(IrInsert {
            index,
            inner: IrBinary { op, left: lval.clone(), right: rval, stores: Vec::new() },
        }));
        Ok((lval, nodes))
    }

    /// Lowers a cast expression: an explicit numeric/type conversion between
    /// two operands, as opposed to the implicit scale-matching the optimizer
    /// inserts for plain arithmetic.
    pub fn unroll_cast(&mut self, expr: &Expr, cast_type: NbtType, scale: Scale) -> Result<(IrOperand, Vec<IrNode>), UnrollError> {
        let (rval, mut nodes) = self.unroll(expr)?;
        let dest = IrOperand::Score(IrScore { source: self.temps.fresh_score() });
        nodes.push(IrNode::Cast(IrCast { left: dest.clone(), right: rval, cast_type, scale }));
        Ok((dest, nodes))
    }

    /// Lowers a `Condition` tree into one `IrCondition` per leaf and the
    /// supporting IR needed to compute any data-operand comparisons (which
    /// must be wrapped through a temp score — `execute if data ... op ...`
    /// has no direct comparison form).
    pub fn unroll_condition(&mut self, cond: &Condition) -> Result<(Vec<IrCondition>, Vec<IrNode>), UnrollError> {
        match cond {
            Condition::Boolean { operand, invert } => {
                let (val, nodes) = self.unroll(operand)?;
                Ok((vec![IrCondition::Unary(IrUnaryCondition { operand: val, invert: *invert })], nodes))
            }
            Condition::Compare { op, left, right, invert } => {
                let (lval, mut nodes) = self.unroll(left)?;
                let (rval, rnodes) = self.unroll(right)?;
                nodes.extend(rnodes);
                Ok((
                    vec![IrCondition::Binary(IrBinaryCondition { op: *op, left: lval, right: rval, invert: *invert })],
                    nodes,
                ))
            }
            Condition::And(clauses) => {
                let mut conds = Vec::new();
                let mut nodes = Vec::new();
                for clause in clauses {
                    let (c, n) = self.unroll_condition(clause)?;
                    conds.extend(c);
                    nodes.extend(n);
                }
                Ok((conds, nodes))
            }
            Condition::Or(_) => Err(UnrollError::UnsupportedShape {
                op: "or".to_string(),
                shape: "condition".to_string(),
                reason: "disjunction requires branch duplication, left to the driver".to_string(),
            }),
            Condition::Not(inner) => {
                let (mut conds, nodes) = self.unroll_condition(inner)?;
                for c in &mut conds {
                    invert_condition(c);
                }
                Ok((conds, nodes))
            }
        }
    }
}

fn invert_condition(cond: &mut IrCondition) {
    match cond {
        IrCondition::Unary(u) => u.invert = !u.invert,
        IrCondition::Binary(b) => b.invert = !b.invert,
    }
}

fn set_node(dest: IrOperand, src: IrOperand) -> IrNode {
    IrNode::Binary(IrBinary { op: BinaryOp::Set, left: dest, right: src, stores: Vec::new() })
}

fn is_composite(value: &NbtValue) -> bool {
    matches!(value, NbtValue::Compound(_) | NbtValue::List(_))
}

/// Checks a literal being written straight into a data path against that
/// path's declared NBT type, and coerces it to that type's representation
/// (spec.md §4.1 `check`/`cast`). A path with no declared type, or a right
/// side that isn't a literal, passes through unchanged — structural
/// checking at a bare score or between two data sources is left for the
/// optimizer's scale/cast passes, which already carry that information.
fn check_literal_assignment(target: &IrOperand, value: IrOperand) -> Result<IrOperand, UnrollError> {
    let (IrOperand::Data(d), IrOperand::Literal(lit)) = (target, &value) else {
        return Ok(value);
    };
    let Some(declared) = &d.source.nbt_type else {
        return Ok(value);
    };
    let found = NbtType::infer(&lit.value);
    check(declared, &found, CheckFlags::default())?;
    let coerced = cast(declared, &lit.value).unwrap_or_else(|| lit.value.clone());
    Ok(IrOperand::Literal(IrLiteral { value: coerced }))
}

pub fn condition_op_for(op: ConditionOp) -> ConditionOp {
    op
}

#[cfg(test)]
mod tests {
    use super::*;
    use bolt_expr_core::Accessor;
    use crate::expr_tree::ExprExt;
    use crate::source::{DataSource, ScoreSource, TargetKind};

    fn managers() -> (TempManager, ConstManager) {
        (TempManager::new("bolt.expr.temp", "bolt:expr"), ConstManager::new("bolt.expr.const"))
    }

    #[test]
    fn nested_arithmetic_reuses_a_single_temp() {
        let (mut temps, mut consts) = managers();
        let mut unroller = Unroller::new(&mut temps, &mut consts);
        let x = ScoreSource::new("@s", "health");
        let expr = x.add(5i64).mul(2i64);
        let (result, nodes) = unroller.unroll(&expr).unwrap();
        // set temp, add, then mul — all into the same temp, never touching x again.
        assert_eq!(nodes.len(), 3);
        assert!(matches!(result, IrOperand::Score(_)));
    }

    #[test]
    fn set_writes_directly_into_the_target() {
        let (mut temps, mut consts) = managers();
        let mut unroller = Unroller::new(&mut temps, &mut consts);
        let x = ScoreSource::new("@s", "health");
        let expr = x.clone().set(5i64);
        let (result, nodes) = unroller.unroll(&expr).unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(result, IrOperand::Score(IrScore { source: x }));
    }

    #[test]
    fn self_referential_set_fuses_into_one_arithmetic_node() {
        let (mut temps, mut consts) = managers();
        let mut unroller = Unroller::new(&mut temps, &mut consts);
        let x = ScoreSource::new("#x", "obj");
        // `x.set(x.mul(3))` is the shape a host's `x *= 3` lowers to; it
        // should collapse to one `Mul(x, 3)`, not a temp round-trip.
        let expr = x.clone().set(x.clone().mul(3i64));
        let (result, nodes) = unroller.unroll(&expr).unwrap();
        assert_eq!(nodes.len(), 1);
        let IrNode::Binary(b) = &nodes[0] else { panic!("expected a binary node") };
        assert_eq!(b.op, BinaryOp::Mul);
        assert_eq!(b.left, IrOperand::Score(IrScore { source: x }));
        assert_eq!(result, b.left);
    }

    #[test]
    fn set_of_unrelated_arithmetic_still_copies_the_result_in() {
        let (mut temps, mut consts) = managers();
        let mut unroller = Unroller::new(&mut temps, &mut consts);
        let out = DataSource::new(TargetKind::Storage, "demo").with_path(Accessor::Key("out".to_string()));
        let v = ScoreSource::new("#v", "obj");
        // `out.set(v.div(100))` names a different source on the right, so the
        // fusion must not fire — the division still needs a temp to land in
        // before the final copy into `out`.
        let expr = out.clone().set(v.div(100i64));
        let (_, nodes) = unroller.unroll(&expr).unwrap();
        assert_eq!(nodes.len(), 3);
        let IrNode::Binary(last) = nodes.last().unwrap() else { panic!("expected a binary node") };
        assert_eq!(last.op, BinaryOp::Set);
        assert_eq!(last.left, IrOperand::Data(IrData { source: out }));
    }

    #[test]
    fn commutative_swap_avoids_a_redundant_set() {
        let (mut temps, mut consts) = managers();
        let mut unroller = Unroller::new(&mut temps, &mut consts);
        let x = ScoreSource::new("@s", "health");
        // (x + 1) is a temp; temp + x should swap so the second add reuses
        // the already-materialized temp instead of copying x in.
        let inner = x.clone().add(1i64);
        let expr = inner.add(Expr::Score(x));
        let (_, nodes) = unroller.unroll(&expr).unwrap();
        assert_eq!(nodes.len(), 2);
    }

    #[test]
    fn literal_set_into_typed_path_widens_to_declared_type() {
        let (mut temps, mut consts) = managers();
        let mut unroller = Unroller::new(&mut temps, &mut consts);
        let out = DataSource::new(TargetKind::Storage, "demo")
            .with_path(Accessor::Key("x".to_string()))
            .with_type(NbtType::Long);
        let expr = out.set(5i64);
        let (_, nodes) = unroller.unroll(&expr).unwrap();
        let IrNode::Binary(b) = &nodes[0] else { panic!("expected a binary node") };
        assert_eq!(b.right, IrOperand::Literal(IrLiteral { value: NbtValue::Long(5) }));
    }

    #[test]
    fn literal_set_into_narrower_typed_path_is_a_type_error() {
        let (mut temps, mut consts) = managers();
        let mut unroller = Unroller::new(&mut temps, &mut consts);
        let out = DataSource::new(TargetKind::Storage, "demo")
            .with_path(Accessor::Key("x".to_string()))
            .with_type(NbtType::Byte);
        let expr = out.set(1000i64);
        assert!(matches!(unroller.unroll(&expr), Err(UnrollError::Type(_))));
    }
}
