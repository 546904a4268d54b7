//! The intermediate representation the unroller produces and the optimizer
//! rewrites (spec.md §4.2). Every node is immutable and structurally
//! comparable — passes build replacement nodes rather than mutating in place,
//! which is what lets `deadcode_elimination`/`rename_temp_scores` diff an IR
//! list against its own previous revision.

use bolt_expr_core::{NbtType, NbtValue, Scale};

use crate::source::{DataSource, ScoreSource};

/// An operand to an IR operation: either a named location or a literal.
#[derive(Debug, Clone, PartialEq)]
pub enum IrOperand {
    Score(IrScore),
    Data(IrData),
    Literal(IrLiteral),
    Composite(IrCompositeLiteral),
}

impl IrOperand {
    pub fn is_temp(&self, temp: &crate::managers::TempSet) -> bool {
        match self {
            IrOperand::Score(s) => temp.contains_score(&s.source),
            IrOperand::Data(d) => temp.contains_data(&d.source),
            _ => false,
        }
    }
}

/// A reference to a scoreboard value.
#[derive(Debug, Clone, PartialEq)]
pub struct IrScore {
    pub source: ScoreSource,
}

/// A reference to a data-storage path.
#[derive(Debug, Clone, PartialEq)]
pub struct IrData {
    pub source: DataSource,
}

/// A scalar literal, representable directly as a command-line SNBT token.
#[derive(Debug, Clone, PartialEq)]
pub struct IrLiteral {
    pub value: NbtValue,
}

/// A compound/list literal that must be written with `data modify ... set
/// value <snbt>` rather than folded into a scoreboard operation — kept
/// distinct from `IrLiteral` because the serializer and the
/// `literal_to_constant_replacement` pass only ever touch scalar literals.
#[derive(Debug, Clone, PartialEq)]
pub struct IrCompositeLiteral {
    pub value: NbtValue,
}

/// Which half of `execute store <type>` a store clause captures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    /// The numeric result of the command (`execute store result ...`).
    Result,
    /// The 0/1 success flag of the command (`execute store success ...`).
    Success,
}

/// A destination an operation's byproduct should additionally be copied
/// into, e.g. `x = (y := a + b)` stores `a + b`'s result into `y` as well
/// as `x`.
#[derive(Debug, Clone, PartialEq)]
pub struct IrStore {
    pub kind: StoreKind,
    pub target: IrOperand,
    pub scale: Scale,
    pub cast_type: Option<NbtType>,
}

/// Comparison operators shared by unary and binary conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionOp {
    Equal,
    LessThan,
    LessThanOrEqualTo,
    GreaterThan,
    GreaterThanOrEqualTo,
}

impl ConditionOp {
    pub fn negate(self) -> ConditionOp {
        match self {
            ConditionOp::Equal => ConditionOp::Equal, // negated via `invert`, see IrBinaryCondition
            ConditionOp::LessThan => ConditionOp::GreaterThanOrEqualTo,
            ConditionOp::LessThanOrEqualTo => ConditionOp::GreaterThan,
            ConditionOp::GreaterThan => ConditionOp::LessThanOrEqualTo,
            ConditionOp::GreaterThanOrEqualTo => ConditionOp::LessThan,
        }
    }
}

/// A truthiness test on a single operand (`execute if score ... matches
/// 1.. `/ `execute if data ...`), as opposed to a two-operand comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct IrUnaryCondition {
    pub operand: IrOperand,
    /// True for `execute unless` instead of `execute if`.
    pub invert: bool,
}

/// A two-operand comparison, serialized as `execute if score a op b` or, for
/// data operands, lowered to a temp-score comparison first.
#[derive(Debug, Clone, PartialEq)]
pub struct IrBinaryCondition {
    pub op: ConditionOp,
    pub left: IrOperand,
    pub right: IrOperand,
    pub invert: bool,
}

/// A condition, either shape.
#[derive(Debug, Clone, PartialEq)]
pub enum IrCondition {
    Unary(IrUnaryCondition),
    Binary(IrBinaryCondition),
}

/// Single-operand data/score operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Remove,
    Reset,
    Enable,
    GetLength,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IrUnary {
    pub op: UnaryOp,
    pub target: IrOperand,
    pub stores: Vec<IrStore>,
}

/// Two-operand data/score operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Set,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Min,
    Max,
    Append,
    Prepend,
    Merge,
}

impl BinaryOp {
    /// True for operations whose two operands may be swapped without
    /// changing the result (spec.md §4.3's commutative-swap unrolling rule,
    /// used to pick which side becomes the in-place destination).
    pub fn is_commutative(self) -> bool {
        matches!(self, BinaryOp::Add | BinaryOp::Mul | BinaryOp::Min | BinaryOp::Max)
    }

    /// True for operations whose destination is assigned wholesale rather
    /// than combined with its previous value — `set_to_self_removal` only
    /// fires on these.
    pub fn is_copy(self) -> bool {
        matches!(self, BinaryOp::Set | BinaryOp::Append | BinaryOp::Prepend | BinaryOp::Merge)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IrBinary {
    pub op: BinaryOp,
    pub left: IrOperand,
    pub right: IrOperand,
    pub stores: Vec<IrStore>,
}

/// `insert` is `append`/`prepend`/`merge`'s sibling with an explicit index,
/// kept as its own node because the serializer emits a different data-path
/// suffix (`data modify ... insert <index> ...`) and no other binary op
/// takes an index operand.
#[derive(Debug, Clone, PartialEq)]
pub struct IrInsert {
    pub index: i32,
    pub inner: IrBinary,
}

/// An explicit numeric cast between a score and a data path, or between two
/// data paths of different declared NBT types (`execute store <kind> ...
/// <cast_type> <scale> run ...`).
#[derive(Debug, Clone, PartialEq)]
pub struct IrCast {
    pub left: IrOperand,
    pub right: IrOperand,
    pub cast_type: NbtType,
    pub scale: Scale,
}

/// A conditionally-executed block of IR, lowered to a chain of `execute if/
/// unless ... run` prefixes wrapping each child command. `store`, if
/// present, captures the block's overall success into a destination.
#[derive(Debug, Clone, PartialEq)]
pub struct IrBranch {
    pub conditions: Vec<IrCondition>,
    pub children: Vec<IrNode>,
    pub store: Option<IrStore>,
}

/// One instruction in the flat, ordered IR list the unroller produces and
/// the optimizer rewrites.
#[derive(Debug, Clone, PartialEq)]
pub enum IrNode {
    Unary(IrUnary),
    Binary(IrBinary),
    Insert(IrInsert),
    Cast(IrCast),
    Branch(IrBranch),
}

impl IrNode {
    /// Every location this node writes to — used by reaching-definitions
    /// and the dependency graph the `dead_code_elimination`/collapsing
    /// passes build over the IR list.
    pub fn targets(&self) -> Vec<IrOperand> {
        match self {
            IrNode::Unary(u) => {
                let mut out = vec![u.target.clone()];
                out.extend(u.stores.iter().map(|s| s.target.clone()));
                out
            }
            IrNode::Binary(b) => {
                let mut out = vec![b.left.clone()];
                out.extend(b.stores.iter().map(|s| s.target.clone()));
                out
            }
            IrNode::Insert(i) => i.inner.targets(),
            IrNode::Cast(c) => vec![c.left.clone()],
            IrNode::Branch(branch) => branch
                .store
                .iter()
                .map(|s| s.target.clone())
                .chain(branch.children.iter().flat_map(IrNode::targets))
                .collect(),
        }
    }

    /// Every location this node reads from.
    pub fn operands(&self) -> Vec<IrOperand> {
        match self {
            IrNode::Unary(u) => vec![u.target.clone()],
            IrNode::Binary(b) => vec![b.left.clone(), b.right.clone()],
            IrNode::Insert(i) => i.inner.operands(),
            IrNode::Cast(c) => vec![c.right.clone()],
            IrNode::Branch(branch) => branch
                .conditions
                .iter()
                .flat_map(|cond| match cond {
                    IrCondition::Unary(u) => vec![u.operand.clone()],
                    IrCondition::Binary(b) => vec![b.left.clone(), b.right.clone()],
                })
                .chain(branch.children.iter().flat_map(IrNode::operands))
                .collect(),
        }
    }
}
