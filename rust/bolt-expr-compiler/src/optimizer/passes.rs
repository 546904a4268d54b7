//! The 22 pass bodies. Each operates on the whole IR list (and recurses
//! into `IrBranch` children, since a branch's body is itself a nested IR
//! list) rather than as a single-node visitor — several passes
//! (collapsing, dead-code elimination, renaming) need to see more than one
//! node at a time.

use std::collections::HashMap;

use bolt_expr_core::{Accessor, NbtType, NbtValue, Scale};

use super::{analysis, OptimizerContext, PassId};
use crate::error::OptimizeError;
use crate::ir::{
    BinaryOp, ConditionOp, IrBinary, IrBranch, IrCast, IrCondition, IrData, IrInsert, IrLiteral,
    IrNode, IrOperand, IrScore, IrStore, IrUnary, StoreKind, UnaryOp,
};
use crate::source::{DataSource, ScoreSource};

pub fn run(pass: PassId, nodes: Vec<IrNode>, ctx: &mut OptimizerContext) -> Result<Vec<IrNode>, OptimizeError> {
    let out = match pass {
        PassId::DataInsertScore => recurse_flat(nodes, &mut |n| data_insert_score(n, ctx)),
        PassId::ConvertCast => recurse_map(nodes, &convert_cast),
        PassId::ConvertDataArithmetic => recurse_flat(nodes, &mut |n| convert_data_arithmetic(n, ctx)),
        PassId::ConvertDataOrderOperation => recurse_flat(nodes, &mut |n| convert_data_order_operation(n, ctx)),
        PassId::DiscardCasting => recurse_map(nodes, &discard_casting),
        PassId::InitScoreBooleanResult => recurse_flat(nodes, &mut init_score_boolean_result),
        PassId::ApplyTempSourceReuse => apply_temp_source_reuse(nodes, ctx),
        PassId::SetToSelfRemoval => recurse_filter(nodes, &set_to_self_removal),
        PassId::DataSetScaling => data_set_scaling(nodes, &*ctx),
        PassId::DataGetScaling => data_get_scaling(nodes),
        PassId::MultiplyDivideByFraction => recurse_flat(nodes, &mut |n| multiply_divide_by_fraction(n, ctx)),
        PassId::MultiplyDivideByOneRemoval => recurse_filter(nodes, &multiply_divide_by_one_removal),
        PassId::AddSubtractByZeroRemoval => recurse_filter(nodes, &add_subtract_by_zero_removal),
        PassId::SetAndGetCleanup => set_and_get_cleanup(nodes),
        PassId::NoncommutativeSetCollapsing => collapse_adjacent(nodes, false),
        PassId::CommutativeSetCollapsing => collapse_adjacent(nodes, true),
        PassId::LiteralToConstantReplacement => recurse_flat(nodes, &mut |n| literal_to_constant_replacement(n, ctx)),
        PassId::BooleanConditionPropagation => boolean_condition_propagation(nodes),
        PassId::BranchConditionPropagation => branch_condition_propagation(nodes),
        PassId::ConvertDefinedBooleanCondition => recurse_map(nodes, &convert_defined_boolean_condition),
        PassId::DeadcodeElimination => deadcode_elimination(nodes, &*ctx),
        PassId::RenameTempScores => rename_temp_scores(nodes, &*ctx),
    };
    Ok(out)
}

/// Applies `f` to every node, top-down, recursing into branch children.
fn recurse_map(nodes: Vec<IrNode>, f: &dyn Fn(IrNode) -> IrNode) -> Vec<IrNode> {
    nodes
        .into_iter()
        .map(|n| {
            let n = f(n);
            match n {
                IrNode::Branch(mut b) => {
                    b.children = recurse_map(b.children, f);
                    IrNode::Branch(b)
                }
                other => other,
            }
        })
        .collect()
}

/// Like `recurse_map` but `f` may expand one node into several (and runs
/// before recursing into any `IrBranch` it produces).
fn recurse_flat(nodes: Vec<IrNode>, f: &mut dyn FnMut(IrNode) -> Vec<IrNode>) -> Vec<IrNode> {
    let mut out = Vec::with_capacity(nodes.len());
    for node in nodes {
        for expanded in f(node) {
            match expanded {
                IrNode::Branch(mut b) => {
                    b.children = recurse_flat(b.children, f);
                    out.push(IrNode::Branch(b));
                }
                other => out.push(other),
            }
        }
    }
    out
}

/// Like `recurse_map` but `f` may drop a node entirely.
fn recurse_filter(nodes: Vec<IrNode>, f: &dyn Fn(&IrNode) -> bool) -> Vec<IrNode> {
    nodes
        .into_iter()
        .filter_map(|n| {
            if !f(&n) {
                return None;
            }
            Some(match n {
                IrNode::Branch(mut b) => {
                    b.children = recurse_filter(b.children, f);
                    IrNode::Branch(b)
                }
                other => other,
            })
        })
        .collect()
}

// --- 1. data_insert_score -------------------------------------------------

fn data_insert_score(node: IrNode, ctx: &mut OptimizerContext) -> Vec<IrNode> {
    match node {
        IrNode::Insert(insert) if matches!(insert.inner.right, IrOperand::Score(_)) => {
            let temp = IrOperand::Data(IrData { source: ctx.temps.fresh_data() });
            let load = IrNode::Cast(IrCast {
                left: temp.clone(),
                right: insert.inner.right,
                cast_type: NbtType::Int,
                scale: Scale::ONE,
            });
            let inserted = IrNode::Insert(IrInsert {
                index: insert.index,
                inner: IrBinary { op: insert.inner.op, left: insert.inner.left, right: temp, stores: insert.inner.stores },
            });
            vec![load, inserted]
        }
        // `list.append(score)`/`list.prepend(score)` have no slot to `from`
        // yet — reserve one with a placeholder literal, then store the
        // score straight into the index that placeholder landed at.
        IrNode::Binary(b) if matches!(b.op, BinaryOp::Append | BinaryOp::Prepend) && matches!(b.right, IrOperand::Score(_)) => {
            let IrOperand::Data(data) = &b.left else { return vec![IrNode::Binary(b)] };
            let slot_index = if b.op == BinaryOp::Append { -1 } else { 0 };
            let reserve = IrNode::Binary(IrBinary {
                op: b.op,
                left: b.left.clone(),
                right: IrOperand::Literal(IrLiteral { value: NbtValue::Int(0) }),
                stores: Vec::new(),
            });
            let slot = data.source.with_path(Accessor::Index(slot_index));
            let store = IrNode::Binary(IrBinary {
                op: BinaryOp::Set,
                left: IrOperand::Data(IrData { source: slot }),
                right: b.right,
                stores: Vec::new(),
            });
            vec![reserve, store]
        }
        other => vec![other],
    }
}

// --- 2. convert_cast -------------------------------------------------------

fn convert_cast(node: IrNode) -> IrNode {
    match node {
        IrNode::Cast(c) => IrNode::Binary(IrBinary {
            op: BinaryOp::Set,
            left: c.left.clone(),
            right: c.right,
            stores: vec![IrStore { kind: StoreKind::Result, target: c.left, scale: c.scale, cast_type: Some(c.cast_type) }],
        }),
        other => other,
    }
}

// --- 3. convert_data_arithmetic --------------------------------------------

fn convert_data_arithmetic(node: IrNode, ctx: &mut OptimizerContext) -> Vec<IrNode> {
    match node {
        IrNode::Binary(b) if !b.op.is_copy() && matches!(b.left, IrOperand::Data(_)) => {
            let IrOperand::Data(IrData { source }) = b.left.clone() else { unreachable!() };
            let temp = IrOperand::Score(IrScore { source: ctx.temps.fresh_score() });
            let load = IrNode::Cast(IrCast { left: temp.clone(), right: b.left.clone(), cast_type: NbtType::Int, scale: source.scale });
            let op = IrNode::Binary(IrBinary { op: b.op, left: temp.clone(), right: b.right, stores: b.stores });
            let store_back = IrNode::Cast(IrCast { left: b.left, right: temp, cast_type: NbtType::Int, scale: source.scale.reciprocal() });
            vec![load, op, store_back]
        }
        other => vec![other],
    }
}

// --- 4. convert_data_order_operation ---------------------------------------

fn convert_data_order_operation(node: IrNode, ctx: &mut OptimizerContext) -> Vec<IrNode> {
    match node {
        IrNode::Branch(mut branch) => {
            let mut preamble = Vec::new();
            for cond in &mut branch.conditions {
                if let IrCondition::Binary(b) = cond {
                    if let IrOperand::Data(_) = &b.left {
                        let temp = IrOperand::Score(IrScore { source: ctx.temps.fresh_score() });
                        preamble.push(IrNode::Cast(IrCast { left: temp.clone(), right: b.left.clone(), cast_type: NbtType::Int, scale: Scale::ONE }));
                        b.left = temp;
                    }
                    if let IrOperand::Data(_) = &b.right {
                        let temp = IrOperand::Score(IrScore { source: ctx.temps.fresh_score() });
                        preamble.push(IrNode::Cast(IrCast { left: temp.clone(), right: b.right.clone(), cast_type: NbtType::Int, scale: Scale::ONE }));
                        b.right = temp;
                    }
                }
            }
            preamble.push(IrNode::Branch(branch));
            preamble
        }
        other => vec![other],
    }
}

// --- 5. discard_casting -----------------------------------------------------

fn discard_casting(node: IrNode) -> IrNode {
    match node {
        IrNode::Binary(mut b) => {
            b.stores.retain(|s| !(s.scale.is_one() && s.cast_type.is_none() && operand_eq_target(&b.left, s)));
            IrNode::Binary(b)
        }
        other => other,
    }
}

fn operand_eq_target(left: &IrOperand, store: &IrStore) -> bool {
    *left == store.target
}

// --- 6. init_score_boolean_result -------------------------------------------

fn init_score_boolean_result(node: IrNode) -> Vec<IrNode> {
    match node {
        IrNode::Branch(branch) if matches!(&branch.store, Some(s) if s.kind == StoreKind::Result && matches!(s.target, IrOperand::Score(_))) => {
            let target = branch.store.as_ref().unwrap().target.clone();
            let init = IrNode::Binary(IrBinary {
                op: BinaryOp::Set,
                left: target,
                right: IrOperand::Literal(crate::ir::IrLiteral { value: NbtValue::Int(0) }),
                stores: Vec::new(),
            });
            vec![init, IrNode::Branch(branch)]
        }
        other => vec![other],
    }
}

// --- 7. apply_temp_source_reuse ---------------------------------------------

/// Forward copy propagation: when a temp is set from some other operand and
/// that operand isn't redefined before the temp's next use, later reads of
/// the temp are rewritten to read the original operand directly. The `Set`
/// itself is left in place — `deadcode_elimination` drops it later if every
/// use got rewritten out from under it.
fn apply_temp_source_reuse(nodes: Vec<IrNode>, ctx: &mut OptimizerContext) -> Vec<IrNode> {
    let mut subst: Vec<(IrOperand, IrOperand)> = Vec::new();
    let mut out = Vec::with_capacity(nodes.len());
    for node in nodes {
        let node = substitute_reads(node, &subst);

        let writes = node.targets();
        subst.retain(|(temp, value)| !writes.iter().any(|w| w == temp || w == value));

        if let IrNode::Binary(b) = &node {
            if b.op == BinaryOp::Set && b.left.is_temp(ctx.temps.allocated()) && b.stores.is_empty() {
                subst.push((b.left.clone(), b.right.clone()));
            }
        }

        let node = match node {
            IrNode::Branch(mut branch) => {
                branch.children = apply_temp_source_reuse(branch.children, ctx);
                IrNode::Branch(branch)
            }
            other => other,
        };
        out.push(node);
    }
    out
}

fn substitute_reads(node: IrNode, subst: &[(IrOperand, IrOperand)]) -> IrNode {
    fn sub(op: IrOperand, subst: &[(IrOperand, IrOperand)]) -> IrOperand {
        subst.iter().rev().find(|(temp, _)| *temp == op).map(|(_, value)| value.clone()).unwrap_or(op)
    }
    match node {
        IrNode::Binary(mut b) => {
            b.right = sub(b.right, subst);
            IrNode::Binary(b)
        }
        IrNode::Insert(mut i) => {
            i.inner.right = sub(i.inner.right, subst);
            IrNode::Insert(i)
        }
        IrNode::Cast(mut c) => {
            c.right = sub(c.right, subst);
            IrNode::Cast(c)
        }
        IrNode::Branch(mut branch) => {
            branch.conditions = branch
                .conditions
                .into_iter()
                .map(|cond| match cond {
                    IrCondition::Unary(mut u) => {
                        u.operand = sub(u.operand, subst);
                        IrCondition::Unary(u)
                    }
                    IrCondition::Binary(mut b) => {
                        b.left = sub(b.left, subst);
                        b.right = sub(b.right, subst);
                        IrCondition::Binary(b)
                    }
                })
                .collect();
            IrNode::Branch(branch)
        }
        other => other,
    }
}

// --- 8. set_to_self_removal --------------------------------------------------

fn set_to_self_removal(node: &IrNode) -> bool {
    !matches!(node, IrNode::Binary(b) if b.op == BinaryOp::Set && b.left == b.right)
}

// --- 9/10. data_set_scaling / data_get_scaling -------------------------------

/// Folds a `mul`/`div`-by-literal on a temp into the store it immediately
/// feeds, rather than leaving it as a runtime `scoreboard players operation`
/// on a constant holder. A data target with no declared NBT type widens to
/// `default_floating_nbt_type` so the division isn't truncated by an
/// implicit `int` cast.
fn data_set_scaling(nodes: Vec<IrNode>, ctx: &OptimizerContext) -> Vec<IrNode> {
    let mut out = Vec::with_capacity(nodes.len());
    let mut i = 0;
    while i < nodes.len() {
        if let Some(folded) = fold_data_set_scale(&nodes, i, ctx) {
            out.push(folded);
            i += 2;
            continue;
        }
        let node = match nodes[i].clone() {
            IrNode::Branch(mut b) => {
                b.children = data_set_scaling(b.children, ctx);
                IrNode::Branch(b)
            }
            other => other,
        };
        out.push(node);
        i += 1;
    }
    out
}

fn fold_data_set_scale(nodes: &[IrNode], i: usize, ctx: &OptimizerContext) -> Option<IrNode> {
    let IrNode::Binary(scale_op) = &nodes[i] else { return None };
    if !matches!(scale_op.op, BinaryOp::Mul | BinaryOp::Div) || !scale_op.stores.is_empty() {
        return None;
    }
    let IrOperand::Score(temp) = &scale_op.left else { return None };
    let IrOperand::Literal(lit) = &scale_op.right else { return None };
    let factor = lit.value.as_score_int()?;

    let IrNode::Binary(store_set) = nodes.get(i + 1)? else { return None };
    if store_set.op != BinaryOp::Set || !store_set.stores.is_empty() {
        return None;
    }
    let IrOperand::Data(data) = &store_set.left else { return None };
    let IrOperand::Score(used) = &store_set.right else { return None };
    if used.source != temp.source {
        return None;
    }

    let factor_scale = Scale::from_int(i64::from(factor));
    let new_scale = match scale_op.op {
        BinaryOp::Mul => data.source.scale.mul(factor_scale),
        BinaryOp::Div => data.source.scale.mul(factor_scale.reciprocal()),
        _ => unreachable!(),
    };
    let mut new_source = data.source.with_scale(new_scale);
    if new_source.nbt_type.is_none() {
        new_source = new_source.with_type(ctx.config.default_floating_nbt_type.clone());
    }
    Some(IrNode::Binary(IrBinary {
        op: BinaryOp::Set,
        left: IrOperand::Data(IrData { source: new_source }),
        right: store_set.right.clone(),
        stores: Vec::new(),
    }))
}

/// The read-side counterpart: folds a `mul`/`div`-by-literal on a temp into
/// the `Cast` (`execute store result score ... run data get ...`) that just
/// loaded it from a data path, instead of leaving a runtime scoreboard op.
fn data_get_scaling(nodes: Vec<IrNode>) -> Vec<IrNode> {
    let mut out = Vec::with_capacity(nodes.len());
    let mut i = 0;
    while i < nodes.len() {
        if let Some(folded) = fold_data_get_scale(&nodes, i) {
            out.push(folded);
            i += 2;
            continue;
        }
        let node = match nodes[i].clone() {
            IrNode::Branch(mut b) => {
                b.children = data_get_scaling(b.children);
                IrNode::Branch(b)
            }
            other => other,
        };
        out.push(node);
        i += 1;
    }
    out
}

fn fold_data_get_scale(nodes: &[IrNode], i: usize) -> Option<IrNode> {
    let IrNode::Cast(load) = &nodes[i] else { return None };
    let IrOperand::Score(temp) = &load.left else { return None };
    if !matches!(load.right, IrOperand::Data(_)) {
        return None;
    }

    let IrNode::Binary(scale_op) = nodes.get(i + 1)? else { return None };
    if !matches!(scale_op.op, BinaryOp::Mul | BinaryOp::Div) || !scale_op.stores.is_empty() {
        return None;
    }
    let IrOperand::Score(used) = &scale_op.left else { return None };
    if used.source != temp.source {
        return None;
    }
    let IrOperand::Literal(lit) = &scale_op.right else { return None };
    let factor = lit.value.as_score_int()?;

    let factor_scale = Scale::from_int(i64::from(factor));
    let new_scale = match scale_op.op {
        BinaryOp::Mul => load.scale.mul(factor_scale),
        BinaryOp::Div => load.scale.mul(factor_scale.reciprocal()),
        _ => unreachable!(),
    };
    Some(IrNode::Cast(IrCast {
        left: load.left.clone(),
        right: load.right.clone(),
        cast_type: load.cast_type.clone(),
        scale: new_scale,
    }))
}

// --- 11. multiply_divide_by_fraction -----------------------------------------

fn multiply_divide_by_fraction(node: IrNode, ctx: &mut OptimizerContext) -> Vec<IrNode> {
    match node {
        IrNode::Binary(b) if matches!(b.op, BinaryOp::Mul | BinaryOp::Div) => {
            if let IrOperand::Literal(lit) = &b.right {
                let as_float = match &lit.value {
                    NbtValue::Float(f) => Some(f64::from(*f)),
                    NbtValue::Double(d) => Some(*d),
                    _ => None,
                };
                if let Some(value) = as_float {
                    let scale = Scale::approximate(value, ctx.config.max_scale_denominator);
                    let (num, den) = if b.op == BinaryOp::Mul { (scale.numerator(), scale.denominator()) } else { (scale.denominator(), scale.numerator()) };
                    let mut out = Vec::new();
                    if num != 1 {
                        out.push(IrNode::Binary(IrBinary {
                            op: BinaryOp::Mul,
                            left: b.left.clone(),
                            right: IrOperand::Literal(crate::ir::IrLiteral { value: NbtValue::Int(num as i32) }),
                            stores: Vec::new(),
                        }));
                    }
                    if den != 1 {
                        out.push(IrNode::Binary(IrBinary {
                            op: BinaryOp::Div,
                            left: b.left.clone(),
                            right: IrOperand::Literal(crate::ir::IrLiteral { value: NbtValue::Int(den as i32) }),
                            stores: b.stores.clone(),
                        }));
                    }
                    if out.is_empty() {
                        return Vec::new();
                    }
                    return out;
                }
            }
            vec![IrNode::Binary(b)]
        }
        other => vec![other],
    }
}

// --- 12. multiply_divide_by_one_removal --------------------------------------

fn multiply_divide_by_one_removal(node: &IrNode) -> bool {
    !matches!(node, IrNode::Binary(b)
        if matches!(b.op, BinaryOp::Mul | BinaryOp::Div)
        && b.stores.is_empty()
        && matches!(&b.right, IrOperand::Literal(l) if l.value.as_score_int() == Some(1)))
}

// --- 13. add_subtract_by_zero_removal ----------------------------------------

fn add_subtract_by_zero_removal(node: &IrNode) -> bool {
    !matches!(node, IrNode::Binary(b)
        if matches!(b.op, BinaryOp::Add | BinaryOp::Sub)
        && b.stores.is_empty()
        && matches!(&b.right, IrOperand::Literal(l) if l.value.as_score_int() == Some(0)))
}

// --- 14. set_and_get_cleanup --------------------------------------------------

/// Drops a `Set(temp, X)` immediately followed by exactly one later use of
/// `temp`, inlining `X` into that use in its place. Narrower than full copy
/// propagation (pass 7) — this one only looks one node ahead, which is
/// exactly the shape the unroller leaves behind for `obj.attr.get_length()`.
fn set_and_get_cleanup(nodes: Vec<IrNode>) -> Vec<IrNode> {
    let mut out = Vec::with_capacity(nodes.len());
    let mut i = 0;
    while i < nodes.len() {
        if let IrNode::Binary(set) = &nodes[i] {
            if set.op == BinaryOp::Set && set.stores.is_empty() {
                if let Some(next) = nodes.get(i + 1) {
                    if uses_operand_once(next, &set.left) && !writes_operand(next, &set.left) {
                        let replaced = substitute_operand(next.clone(), &set.left, &set.right);
                        out.push(replaced);
                        i += 2;
                        continue;
                    }
                }
            }
        }
        out.push(nodes[i].clone());
        i += 1;
    }
    out
}

fn uses_operand_once(node: &IrNode, operand: &IrOperand) -> bool {
    node.operands().iter().filter(|o| *o == operand).count() == 1
}

fn writes_operand(node: &IrNode, operand: &IrOperand) -> bool {
    node.targets().iter().any(|t| t == operand)
}

fn substitute_operand(node: IrNode, from: &IrOperand, to: &IrOperand) -> IrNode {
    match node {
        IrNode::Binary(mut b) => {
            if b.right == *from {
                b.right = to.clone();
            }
            IrNode::Binary(b)
        }
        IrNode::Unary(mut u) => {
            if u.target == *from {
                u.target = to.clone();
            }
            IrNode::Unary(u)
        }
        other => other,
    }
}

// --- 15/16. *_set_collapsing --------------------------------------------------

/// Merges two adjacent `Binary` nodes with the same target and the same op
/// (restricted to the commutative or noncommutative op family as requested)
/// when both right-hand sides are literals and nothing reads the target in
/// between — replacing two commands with one.
fn collapse_adjacent(nodes: Vec<IrNode>, commutative: bool) -> Vec<IrNode> {
    let mut out: Vec<IrNode> = Vec::with_capacity(nodes.len());
    for node in nodes {
        let node = if let IrNode::Branch(mut b) = node {
            b.children = collapse_adjacent(b.children, commutative);
            IrNode::Branch(b)
        } else {
            node
        };

        if let (Some(IrNode::Binary(prev)), IrNode::Binary(cur)) = (out.last(), &node) {
            let family_matches = prev.op == cur.op
                && in_family(prev.op, commutative)
                && prev.left == cur.left
                && prev.stores.is_empty();
            if family_matches {
                if let (IrOperand::Literal(a), IrOperand::Literal(b)) = (&prev.right, &cur.right) {
                    if let (Some(x), Some(y)) = (a.value.as_score_int(), b.value.as_score_int()) {
                        if let Some(combined) = combine(prev.op, x, y) {
                            let left = prev.left.clone();
                            out.pop();
                            out.push(IrNode::Binary(IrBinary {
                                op: prev.op,
                                left,
                                right: IrOperand::Literal(crate::ir::IrLiteral { value: NbtValue::Int(combined) }),
                                stores: cur.stores.clone(),
                            }));
                            continue;
                        }
                    }
                }
            }
        }
        out.push(node);
    }
    out
}

fn in_family(op: BinaryOp, commutative: bool) -> bool {
    let is_commutative_family = matches!(op, BinaryOp::Add | BinaryOp::Mul | BinaryOp::Min | BinaryOp::Max);
    let is_noncommutative_family = matches!(op, BinaryOp::Sub | BinaryOp::Div);
    if commutative {
        is_commutative_family
    } else {
        is_noncommutative_family
    }
}

fn combine(op: BinaryOp, a: i32, b: i32) -> Option<i32> {
    match op {
        BinaryOp::Add => a.checked_add(b),
        BinaryOp::Sub => a.checked_add(b),
        BinaryOp::Mul => a.checked_mul(b),
        BinaryOp::Div => a.checked_mul(b),
        BinaryOp::Min => Some(a.min(b)),
        BinaryOp::Max => Some(a.max(b)),
        _ => None,
    }
}

// --- 17. literal_to_constant_replacement -------------------------------------

fn literal_to_constant_replacement(node: IrNode, ctx: &mut OptimizerContext) -> Vec<IrNode> {
    match node {
        IrNode::Binary(mut b) if requires_score_operand(b.op) => {
            if let IrOperand::Literal(lit) = &b.right {
                if let Some(holder) = ctx.consts.get_or_insert(&lit.value) {
                    b.right = IrOperand::Score(IrScore { source: holder });
                }
            }
            vec![IrNode::Binary(b)]
        }
        other => vec![other],
    }
}

/// `scoreboard players operation` has no literal-immediate form; only
/// `add`/`set`/`remove` do, so multiply/divide/modulo/min/max must route a
/// literal through a constant-holding score.
fn requires_score_operand(op: BinaryOp) -> bool {
    matches!(op, BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod | BinaryOp::Min | BinaryOp::Max)
}

// --- 18. boolean_condition_propagation ---------------------------------------

/// Folds `if C: set y = 1` immediately followed by `unless C: set y = 0`
/// (the unroller's canonical boolean-materialization shape) into a single
/// `execute store success` branch.
fn boolean_condition_propagation(nodes: Vec<IrNode>) -> Vec<IrNode> {
    let mut out: Vec<IrNode> = Vec::new();
    let mut i = 0;
    while i < nodes.len() {
        if let (IrNode::Branch(a), Some(IrNode::Branch(b))) = (&nodes[i], nodes.get(i + 1)) {
            if let Some(folded) = try_fold_boolean_pair(a, b) {
                out.push(folded);
                i += 2;
                continue;
            }
        }
        let node = match nodes[i].clone() {
            IrNode::Branch(mut br) => {
                br.children = boolean_condition_propagation(br.children);
                IrNode::Branch(br)
            }
            other => other,
        };
        out.push(node);
        i += 1;
    }
    out
}

fn try_fold_boolean_pair(a: &IrBranch, b: &IrBranch) -> Option<IrNode> {
    if a.store.is_some() || b.store.is_some() {
        return None;
    }
    let [a_child] = a.children.as_slice() else { return None };
    let [b_child] = b.children.as_slice() else { return None };
    let (IrNode::Binary(a_set), IrNode::Binary(b_set)) = (a_child, b_child) else { return None };
    if a_set.op != BinaryOp::Set || b_set.op != BinaryOp::Set || a_set.left != b_set.left {
        return None;
    }
    let one = matches!(&a_set.right, IrOperand::Literal(l) if l.value.as_score_int() == Some(1));
    let zero = matches!(&b_set.right, IrOperand::Literal(l) if l.value.as_score_int() == Some(0));
    if !one || !zero || a.conditions != invert_all(&b.conditions) {
        return None;
    }
    Some(IrNode::Branch(IrBranch {
        conditions: a.conditions.clone(),
        children: Vec::new(),
        store: Some(IrStore { kind: StoreKind::Success, target: a_set.left.clone(), scale: Scale::ONE, cast_type: None }),
    }))
}

fn invert_all(conditions: &[IrCondition]) -> Vec<IrCondition> {
    conditions
        .iter()
        .map(|c| match c {
            IrCondition::Unary(u) => IrCondition::Unary(crate::ir::IrUnaryCondition { operand: u.operand.clone(), invert: !u.invert }),
            IrCondition::Binary(b) => IrCondition::Binary(crate::ir::IrBinaryCondition { op: b.op, left: b.left.clone(), right: b.right.clone(), invert: !b.invert }),
        })
        .collect()
}

// --- 19. branch_condition_propagation -----------------------------------------

/// Flattens `if C1: { if C2: { children } }` into `if C1 and C2: children`
/// — a single `execute` chain instead of two nested ones.
fn branch_condition_propagation(nodes: Vec<IrNode>) -> Vec<IrNode> {
    nodes
        .into_iter()
        .map(|n| match n {
            IrNode::Branch(mut outer) => {
                outer.children = branch_condition_propagation(outer.children);
                if outer.store.is_none() && outer.children.len() == 1 {
                    if let IrNode::Branch(inner) = &outer.children[0] {
                        if inner.store.is_none() {
                            let mut conditions = outer.conditions.clone();
                            conditions.extend(inner.conditions.clone());
                            return IrNode::Branch(IrBranch { conditions, children: inner.children.clone(), store: None });
                        }
                    }
                }
                IrNode::Branch(outer)
            }
            other => other,
        })
        .collect()
}

// --- 20. convert_defined_boolean_condition ------------------------------------

fn convert_defined_boolean_condition(node: IrNode) -> IrNode {
    match node {
        IrNode::Branch(mut branch) => {
            branch.conditions = branch
                .conditions
                .into_iter()
                .map(|cond| match cond {
                    IrCondition::Binary(b) if b.op == ConditionOp::Equal => {
                        if matches!(&b.right, IrOperand::Literal(l) if l.value.as_score_int() == Some(1)) {
                            IrCondition::Unary(crate::ir::IrUnaryCondition { operand: b.left, invert: b.invert })
                        } else if matches!(&b.right, IrOperand::Literal(l) if l.value.as_score_int() == Some(0)) {
                            IrCondition::Unary(crate::ir::IrUnaryCondition { operand: b.left, invert: !b.invert })
                        } else {
                            IrCondition::Binary(b)
                        }
                    }
                    other => other,
                })
                .collect();
            IrNode::Branch(branch)
        }
        other => other,
    }
}

// --- 21. deadcode_elimination ---------------------------------------------------

fn deadcode_elimination(nodes: Vec<IrNode>, ctx: &OptimizerContext) -> Vec<IrNode> {
    let mut out = Vec::with_capacity(nodes.len());
    for (i, node) in nodes.iter().enumerate() {
        let node = node.clone();
        let keep = match &node {
            IrNode::Binary(b) if !matches!(b.op, BinaryOp::Append | BinaryOp::Prepend | BinaryOp::Merge) => {
                !is_dead_temp_write(&b.left, i, &nodes, ctx)
            }
            IrNode::Unary(u) if matches!(u.op, UnaryOp::GetLength) => !is_dead_temp_write(&u.target, i, &nodes, ctx),
            _ => true,
        };
        if keep {
            let node = match node {
                IrNode::Branch(mut b) => {
                    b.children = deadcode_elimination(b.children, ctx);
                    IrNode::Branch(b)
                }
                other => other,
            };
            out.push(node);
        }
    }
    out
}

fn is_dead_temp_write(target: &IrOperand, index: usize, nodes: &[IrNode], ctx: &OptimizerContext) -> bool {
    if !target.is_temp(ctx.temps.allocated()) {
        return false;
    }
    let tuple = match target {
        IrOperand::Score(s) => crate::source::SourceTuple::from_score(&s.source),
        IrOperand::Data(d) => crate::source::SourceTuple::from_data(&d.source),
        _ => return false,
    };
    analysis::is_dead_after(nodes, index + 1, &tuple)
}

// --- 22. rename_temp_scores -------------------------------------------------

fn rename_temp_scores(nodes: Vec<IrNode>, ctx: &OptimizerContext) -> Vec<IrNode> {
    let mut score_map: HashMap<ScoreSource, ScoreSource> = HashMap::new();
    let mut data_map: HashMap<DataSource, DataSource> = HashMap::new();
    collect_temp_order(&nodes, ctx, &mut score_map, &mut data_map);
    rename_all(nodes, &score_map, &data_map)
}

fn collect_temp_order(
    nodes: &[IrNode],
    ctx: &OptimizerContext,
    score_map: &mut HashMap<ScoreSource, ScoreSource>,
    data_map: &mut HashMap<DataSource, DataSource>,
) {
    for node in nodes {
        for operand in node.targets().into_iter().chain(node.operands()) {
            match operand {
                IrOperand::Score(s) if ctx.temps.allocated().contains_score(&s.source) && !score_map.contains_key(&s.source) => {
                    let renamed = ScoreSource::new(format!("#t{}", score_map.len()), s.source.objective.clone());
                    score_map.insert(s.source, renamed);
                }
                IrOperand::Data(d) if ctx.temps.allocated().contains_data(&d.source) && !data_map.contains_key(&d.source) => {
                    let renamed = d.source.with_path(bolt_expr_core::Accessor::Key(format!("t{}", data_map.len())));
                    data_map.insert(d.source, renamed);
                }
                _ => {}
            }
        }
        if let IrNode::Branch(b) = node {
            collect_temp_order(&b.children, ctx, score_map, data_map);
        }
    }
}

fn rename_all(nodes: Vec<IrNode>, score_map: &HashMap<ScoreSource, ScoreSource>, data_map: &HashMap<DataSource, DataSource>) -> Vec<IrNode> {
    nodes
        .into_iter()
        .map(|n| rename_node(n, score_map, data_map))
        .collect()
}

fn rename_node(node: IrNode, score_map: &HashMap<ScoreSource, ScoreSource>, data_map: &HashMap<DataSource, DataSource>) -> IrNode {
    fn rename_operand(op: IrOperand, score_map: &HashMap<ScoreSource, ScoreSource>, data_map: &HashMap<DataSource, DataSource>) -> IrOperand {
        match op {
            IrOperand::Score(s) => IrOperand::Score(IrScore { source: score_map.get(&s.source).cloned().unwrap_or(s.source) }),
            IrOperand::Data(d) => IrOperand::Data(IrData { source: data_map.get(&d.source).cloned().unwrap_or(d.source) }),
            other => other,
        }
    }
    fn rename_store(mut s: IrStore, score_map: &HashMap<ScoreSource, ScoreSource>, data_map: &HashMap<DataSource, DataSource>) -> IrStore {
        s.target = rename_operand(s.target, score_map, data_map);
        s
    }
    match node {
        IrNode::Binary(mut b) => {
            b.left = rename_operand(b.left, score_map, data_map);
            b.right = rename_operand(b.right, score_map, data_map);
            b.stores = b.stores.into_iter().map(|s| rename_store(s, score_map, data_map)).collect();
            IrNode::Binary(b)
        }
        IrNode::Unary(mut u) => {
            u.target = rename_operand(u.target, score_map, data_map);
            u.stores = u.stores.into_iter().map(|s| rename_store(s, score_map, data_map)).collect();
            IrNode::Unary(u)
        }
        IrNode::Insert(mut ins) => {
            ins.inner = match rename_node(IrNode::Binary(ins.inner), score_map, data_map) {
                IrNode::Binary(b) => b,
                _ => unreachable!(),
            };
            IrNode::Insert(ins)
        }
        IrNode::Cast(mut c) => {
            c.left = rename_operand(c.left, score_map, data_map);
            c.right = rename_operand(c.right, score_map, data_map);
            IrNode::Cast(c)
        }
        IrNode::Branch(mut b) => {
            b.conditions = b
                .conditions
                .into_iter()
                .map(|c| match c {
                    IrCondition::Unary(mut u) => {
                        u.operand = rename_operand(u.operand, score_map, data_map);
                        IrCondition::Unary(u)
                    }
                    IrCondition::Binary(mut bc) => {
                        bc.left = rename_operand(bc.left, score_map, data_map);
                        bc.right = rename_operand(bc.right, score_map, data_map);
                        IrCondition::Binary(bc)
                    }
                })
                .collect();
            b.children = rename_all(b.children, score_map, data_map);
            b.store = b.store.map(|s| rename_store(s, score_map, data_map));
            IrNode::Branch(b)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score(holder: &str, objective: &str) -> IrOperand {
        IrOperand::Score(IrScore { source: ScoreSource::new(holder, objective) })
    }

    fn literal(value: i64) -> IrOperand {
        IrOperand::Literal(IrLiteral { value: NbtValue::Int(value as i32) })
    }

    fn binary(op: BinaryOp, left: IrOperand, right: IrOperand) -> IrNode {
        IrNode::Binary(IrBinary { op, left, right, stores: Vec::new() })
    }

    #[test]
    fn zero_add_is_eliminated() {
        let node = binary(BinaryOp::Add, score("@s", "health"), literal(0));
        assert!(!add_subtract_by_zero_removal(&node));
    }

    #[test]
    fn nonzero_add_survives() {
        let node = binary(BinaryOp::Add, score("@s", "health"), literal(5));
        assert!(add_subtract_by_zero_removal(&node));
    }

    #[test]
    fn zero_subtract_is_eliminated() {
        let node = binary(BinaryOp::Sub, score("@s", "health"), literal(0));
        assert!(!add_subtract_by_zero_removal(&node));
    }

    #[test]
    fn set_to_self_is_eliminated() {
        let x = score("#x", "obj");
        let node = binary(BinaryOp::Set, x.clone(), x);
        assert!(!set_to_self_removal(&node));
    }

    #[test]
    fn set_between_distinct_sources_survives() {
        let node = binary(BinaryOp::Set, score("#x", "obj"), score("#y", "other"));
        assert!(set_to_self_removal(&node));
    }
}
