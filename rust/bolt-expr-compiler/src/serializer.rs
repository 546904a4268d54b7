//! Lowers optimized IR into command strings (spec.md §4.5). This is the one
//! stage allowed to panic: by the time IR reaches here every shape the
//! unroller/optimizer can produce is known, so a node this module can't
//! render is a compiler-internal bug, not a recoverable user error.

use bolt_expr_core::{NbtType, NbtValue};

use crate::ir::{
    BinaryOp, ConditionOp, IrBranch, IrCondition, IrNode, IrOperand, IrStore, StoreKind, UnaryOp,
};
use crate::source::render_path;

/// Serializes a whole IR list into the ordered command strings that
/// implement it, recursing into `IrBranch` bodies as nested `execute ...
/// run` prefixes. `default_nbt_type` is the cast type used whenever a data
/// target has no declared NBT type and the node doesn't otherwise carry one
/// (spec.md §6 `default_nbt_type`).
pub fn serialize(nodes: &[IrNode], default_nbt_type: &NbtType) -> Vec<String> {
    nodes.iter().flat_map(|n| serialize_node(n, default_nbt_type)).collect()
}

fn serialize_node(node: &IrNode, default_nbt_type: &NbtType) -> Vec<String> {
    match node {
        IrNode::Unary(u) => serialize_unary(u.op, &u.target, &u.stores, default_nbt_type),
        IrNode::Binary(b) => serialize_binary(b.op, &b.left, &b.right, &b.stores, None, default_nbt_type),
        IrNode::Insert(i) => serialize_binary(i.inner.op, &i.inner.left, &i.inner.right, &i.inner.stores, Some(i.index), default_nbt_type),
        IrNode::Cast(c) => {
            let body = format!("data modify {} set from {}", render_operand(&c.left), render_operand(&c.right));
            vec![store_prefix(&IrStore { kind: StoreKind::Result, target: c.left.clone(), scale: c.scale, cast_type: Some(c.cast_type.clone()) }, &body, default_nbt_type)]
        }
        IrNode::Branch(branch) => serialize_branch(branch, default_nbt_type),
    }
}

fn serialize_unary(op: UnaryOp, target: &IrOperand, stores: &[IrStore], default_nbt_type: &NbtType) -> Vec<String> {
    let body = match (op, target) {
        (UnaryOp::Remove, IrOperand::Data(d)) => format!("data remove {}", render_path_target(d)),
        (UnaryOp::Reset, IrOperand::Score(s)) => format!("scoreboard players reset {} {}", s.source.holder, s.source.objective),
        (UnaryOp::Enable, IrOperand::Score(s)) => format!("scoreboard players enable {} {}", s.source.holder, s.source.objective),
        (UnaryOp::GetLength, IrOperand::Data(d)) => format!("data get {}", render_path_target(d)),
        (op, operand) => panic!("unary op {op:?} cannot apply to operand {operand:?}"),
    };
    with_stores(body, stores, default_nbt_type)
}

fn serialize_binary(op: BinaryOp, left: &IrOperand, right: &IrOperand, stores: &[IrStore], index: Option<i32>, default_nbt_type: &NbtType) -> Vec<String> {
    let body = match (op, left, right) {
        (BinaryOp::Set, IrOperand::Score(l), IrOperand::Score(r)) => {
            format!("scoreboard players operation {} {} = {} {}", l.source.holder, l.source.objective, r.source.holder, r.source.objective)
        }
        (BinaryOp::Set, IrOperand::Score(l), IrOperand::Literal(lit)) => {
            format!("scoreboard players set {} {} {}", l.source.holder, l.source.objective, score_literal(&lit.value))
        }
        (BinaryOp::Set, IrOperand::Data(l), IrOperand::Score(r)) => {
            let cast = l.source.nbt_type.as_ref().map(ToString::to_string).unwrap_or_else(|| default_nbt_type.to_string());
            format!(
                "execute store result {} {cast} {} run scoreboard players get {} {}",
                render_path_target(l), l.source.scale, r.source.holder, r.source.objective
            )
        }
        (BinaryOp::Set, IrOperand::Data(l), right) => data_modify(l, "set", right, index),
        (op, IrOperand::Score(l), IrOperand::Score(r)) if scoreboard_op(op).is_some() => {
            format!("scoreboard players operation {} {} {} {} {}", l.source.holder, l.source.objective, scoreboard_op(op).unwrap(), r.source.holder, r.source.objective)
        }
        (BinaryOp::Add, IrOperand::Score(l), IrOperand::Literal(lit)) => {
            format!("scoreboard players add {} {} {}", l.source.holder, l.source.objective, score_literal(&lit.value))
        }
        (BinaryOp::Sub, IrOperand::Score(l), IrOperand::Literal(lit)) => {
            format!("scoreboard players remove {} {} {}", l.source.holder, l.source.objective, score_literal(&lit.value))
        }
        (BinaryOp::Append, IrOperand::Data(l), right) => data_modify(l, "append", right, None),
        (BinaryOp::Prepend, IrOperand::Data(l), right) => data_modify(l, "prepend", right, None),
        (BinaryOp::Merge, IrOperand::Data(l), right) => {
            if let Some(idx) = index {
                data_modify(l, "insert", right, Some(idx))
            } else {
                data_modify(l, "merge", right, None)
            }
        }
        (op, left, right) => panic!("binary op {op:?} cannot apply to operands {left:?}, {right:?}"),
    };
    with_stores(body, stores, default_nbt_type)
}

fn scoreboard_op(op: BinaryOp) -> Option<&'static str> {
    match op {
        BinaryOp::Add => Some("+="),
        BinaryOp::Sub => Some("-="),
        BinaryOp::Mul => Some("*="),
        BinaryOp::Div => Some("/="),
        BinaryOp::Mod => Some("%="),
        BinaryOp::Min => Some("<"),
        BinaryOp::Max => Some(">"),
        BinaryOp::Set => Some("="),
        _ => None,
    }
}

fn data_modify(target: &crate::ir::IrData, verb: &str, right: &IrOperand, index: Option<i32>) -> String {
    let index_suffix = index.map(|i| format!(" {i}")).unwrap_or_default();
    match right {
        IrOperand::Literal(lit) => format!("data modify {} {verb}{index_suffix} value {}", render_path_target(target), lit.value.to_snbt()),
        IrOperand::Composite(lit) => format!("data modify {} {verb}{index_suffix} value {}", render_path_target(target), lit.value.to_snbt()),
        IrOperand::Data(src) => format!("data modify {} {verb}{index_suffix} from {}", render_path_target(target), render_path_target(src)),
        IrOperand::Score(_) => unreachable!("convert_data_arithmetic/data_insert_score must eliminate score rhs before serialization"),
    }
}

fn score_literal(value: &NbtValue) -> i32 {
    value.as_score_int().unwrap_or_else(|| panic!("non-integer literal reached score position: {value:?}"))
}

fn with_stores(body: String, stores: &[IrStore], default_nbt_type: &NbtType) -> Vec<String> {
    if stores.is_empty() {
        return vec![body];
    }
    stores.iter().map(|s| store_prefix(s, &body, default_nbt_type)).collect()
}

fn store_prefix(store: &IrStore, body: &str, default_nbt_type: &NbtType) -> String {
    let kind = match store.kind {
        StoreKind::Result => "result",
        StoreKind::Success => "success",
    };
    let dest = match &store.target {
        IrOperand::Score(s) => format!("score {} {}", s.source.holder, s.source.objective),
        IrOperand::Data(d) => {
            let cast = store.cast_type.as_ref().map(ToString::to_string).unwrap_or_else(|| default_nbt_type.to_string());
            format!("storage {} {} {cast} {}", d.source.target, render_path(&d.source.path), store.scale)
        }
        other => panic!("store destination must be a score or data path, got {other:?}"),
    };
    format!("execute store {kind} {dest} run {body}")
}

fn render_operand(operand: &IrOperand) -> String {
    match operand {
        IrOperand::Score(s) => format!("{} {}", s.source.holder, s.source.objective),
        IrOperand::Data(d) => render_path_target(d),
        IrOperand::Literal(l) => l.value.to_snbt(),
        IrOperand::Composite(l) => l.value.to_snbt(),
    }
}

fn render_path_target(data: &crate::ir::IrData) -> String {
    format!("{} {} {}", data.source.target_kind, data.source.target, render_path(&data.source.path))
}

fn serialize_branch(branch: &IrBranch, default_nbt_type: &NbtType) -> Vec<String> {
    let prefix = branch
        .conditions
        .iter()
        .map(serialize_condition)
        .collect::<Vec<_>>()
        .join(" ");

    let mut bodies: Vec<String> = branch.children.iter().flat_map(|n| serialize_node(n, default_nbt_type)).collect();
    if let Some(store) = &branch.store {
        let kind = match store.kind {
            StoreKind::Result => "result",
            StoreKind::Success => "success",
        };
        let dest = render_operand(&store.target);
        let dest = match &store.target {
            IrOperand::Score(_) => format!("score {dest}"),
            _ => dest,
        };
        // A branch with a store but no children captures the conditions'
        // own success/result directly, e.g. `execute store success score
        // ... if ...` with no trailing `run`.
        if bodies.is_empty() {
            return vec![format!("execute store {kind} {dest} {prefix}")];
        }
    }

    if prefix.is_empty() {
        return bodies;
    }
    bodies.drain(..).map(|b| format!("execute {prefix} run {b}")).collect()
}

fn serialize_condition(cond: &IrCondition) -> String {
    match cond {
        IrCondition::Unary(u) => {
            let verb = if u.invert { "unless" } else { "if" };
            match &u.operand {
                IrOperand::Score(s) => format!("{verb} score {} {} matches 1..", s.source.holder, s.source.objective),
                IrOperand::Data(d) => format!("{verb} data {}", render_path_target(d)),
                other => panic!("condition operand must be a score or data path, got {other:?}"),
            }
        }
        IrCondition::Binary(b) => {
            let verb = if b.invert { "unless" } else { "if" };
            match (&b.left, &b.right) {
                (IrOperand::Score(l), IrOperand::Score(r)) => {
                    let op = condition_op_symbol(b.op);
                    format!("{verb} score {} {} {op} {} {}", l.source.holder, l.source.objective, r.source.holder, r.source.objective)
                }
                // A score compared against a literal has no `<`/`>` operator
                // form — Minecraft only supports that between two scores —
                // so it's rendered as a `matches` range instead.
                (IrOperand::Score(l), IrOperand::Literal(lit)) => {
                    let range = literal_range(b.op, score_literal(&lit.value), false);
                    format!("{verb} score {} {} matches {range}", l.source.holder, l.source.objective)
                }
                (IrOperand::Literal(lit), IrOperand::Score(r)) => {
                    let range = literal_range(b.op, score_literal(&lit.value), true);
                    format!("{verb} score {} {} matches {range}", r.source.holder, r.source.objective)
                }
                (l, r) => panic!("binary condition requires at least one score operand after convert_data_order_operation, got {l:?}, {r:?}"),
            }
        }
    }
}

/// The `matches` range equivalent to `op` against a literal `value`, when
/// the literal sits on the left of the comparison (`literal_on_left`) or
/// the right. Mirrors the original converter's per-operator range math
/// (e.g. `score > 5` becomes `matches 6..`, `5 > score` becomes `matches
/// ..4`).
fn literal_range(op: ConditionOp, value: i32, literal_on_left: bool) -> String {
    let value = i64::from(value);
    match (op, literal_on_left) {
        (ConditionOp::Equal, _) => format!("{value}"),
        (ConditionOp::GreaterThan, false) => format!("{}..", value + 1),
        (ConditionOp::GreaterThan, true) => format!("..{}", value - 1),
        (ConditionOp::LessThan, false) => format!("..{}", value - 1),
        (ConditionOp::LessThan, true) => format!("{}..", value + 1),
        (ConditionOp::GreaterThanOrEqualTo, false) => format!("{value}.."),
        (ConditionOp::GreaterThanOrEqualTo, true) => format!("..{value}"),
        (ConditionOp::LessThanOrEqualTo, false) => format!("..{value}"),
        (ConditionOp::LessThanOrEqualTo, true) => format!("{value}.."),
    }
}

fn condition_op_symbol(op: ConditionOp) -> &'static str {
    match op {
        ConditionOp::Equal => "=",
        ConditionOp::LessThan => "<",
        ConditionOp::LessThanOrEqualTo => "<=",
        ConditionOp::GreaterThan => ">",
        ConditionOp::GreaterThanOrEqualTo => ">=",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{IrBinary, IrLiteral, IrScore};
    use crate::source::ScoreSource;

    #[test]
    fn set_literal_uses_scoreboard_set() {
        let node = IrNode::Binary(IrBinary {
            op: BinaryOp::Set,
            left: IrOperand::Score(IrScore { source: ScoreSource::new("@s", "health") }),
            right: IrOperand::Literal(IrLiteral { value: NbtValue::Int(5) }),
            stores: Vec::new(),
        });
        assert_eq!(serialize(&[node], &NbtType::Int), vec!["scoreboard players set @s health 5"]);
    }

    #[test]
    fn add_literal_uses_scoreboard_add() {
        let node = IrNode::Binary(IrBinary {
            op: BinaryOp::Add,
            left: IrOperand::Score(IrScore { source: ScoreSource::new("@s", "health") }),
            right: IrOperand::Literal(IrLiteral { value: NbtValue::Int(3) }),
            stores: Vec::new(),
        });
        assert_eq!(serialize(&[node], &NbtType::Int), vec!["scoreboard players add @s health 3"]);
    }

    #[test]
    fn remove_data_path_emits_data_remove() {
        use crate::ir::{IrData, IrUnary};
        use crate::source::{DataSource, TargetKind};

        let path = DataSource::new(TargetKind::Storage, "demo")
            .with_path(bolt_expr_core::Accessor::Key("flags".to_string()));
        let node = IrNode::Unary(IrUnary {
            op: UnaryOp::Remove,
            target: IrOperand::Data(IrData { source: path }),
            stores: Vec::new(),
        });
        assert_eq!(serialize(&[node], &NbtType::Int), vec!["data remove storage demo flags"]);
    }
}
