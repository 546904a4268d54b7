//! The fixed-order optimizer pipeline (spec.md §4.4): 22 named passes, each
//! toggleable, each a pure `Vec<IrNode> -> Vec<IrNode>` rewrite over the
//! unroller's output.

mod analysis;
mod passes;

use serde::{Deserialize, Serialize};
use strum::EnumIter;

use crate::config::ExpressionConfig;
use crate::error::OptimizeError;
use crate::ir::IrNode;
use crate::managers::{ConstManager, TempManager};

pub use analysis::{dependency_graph, reaching_definitions, use_set};

/// Identifies one of the fixed optimizer passes. Order here is cosmetic;
/// `PIPELINE_ORDER` is the order that actually matters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PassId {
    DataInsertScore,
    ConvertCast,
    ConvertDataArithmetic,
    ConvertDataOrderOperation,
    DiscardCasting,
    InitScoreBooleanResult,
    ApplyTempSourceReuse,
    SetToSelfRemoval,
    DataSetScaling,
    DataGetScaling,
    MultiplyDivideByFraction,
    MultiplyDivideByOneRemoval,
    AddSubtractByZeroRemoval,
    SetAndGetCleanup,
    NoncommutativeSetCollapsing,
    CommutativeSetCollapsing,
    LiteralToConstantReplacement,
    BooleanConditionPropagation,
    BranchConditionPropagation,
    ConvertDefinedBooleanCondition,
    DeadcodeElimination,
    RenameTempScores,
}

impl std::fmt::Display for PassId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

/// `set_to_self_removal` runs twice — once early, to clean up the literal
/// copies `convert_data_arithmetic`/`convert_cast` just introduced, and
/// again immediately after `add_subtract_by_zero_removal`, to purge the
/// self-assignments those arithmetic-cleanup passes leave behind before
/// `set_and_get_cleanup`/collapsing run over the result.
const PIPELINE_ORDER: &[PassId] = &[
    PassId::DataInsertScore,
    PassId::ConvertCast,
    PassId::ConvertDataArithmetic,
    PassId::ConvertDataOrderOperation,
    PassId::DiscardCasting,
    PassId::InitScoreBooleanResult,
    PassId::ApplyTempSourceReuse,
    PassId::SetToSelfRemoval,
    PassId::DataSetScaling,
    PassId::DataGetScaling,
    PassId::MultiplyDivideByFraction,
    PassId::MultiplyDivideByOneRemoval,
    PassId::AddSubtractByZeroRemoval,
    PassId::SetToSelfRemoval,
    PassId::SetAndGetCleanup,
    PassId::NoncommutativeSetCollapsing,
    PassId::CommutativeSetCollapsing,
    PassId::LiteralToConstantReplacement,
    PassId::BooleanConditionPropagation,
    PassId::BranchConditionPropagation,
    PassId::ConvertDefinedBooleanCondition,
    PassId::DeadcodeElimination,
    PassId::RenameTempScores,
];

pub struct OptimizerContext<'a> {
    pub temps: &'a mut TempManager,
    pub consts: &'a mut ConstManager,
    pub config: &'a ExpressionConfig,
}

/// Runs every enabled pass, in fixed order, over `nodes`.
pub fn optimize(mut nodes: Vec<IrNode>, ctx: &mut OptimizerContext) -> Result<Vec<IrNode>, OptimizeError> {
    for pass in PIPELINE_ORDER {
        if ctx.config.disabled_passes.contains(pass) {
            continue;
        }
        nodes = passes::run(*pass, nodes, ctx)?;
    }
    Ok(nodes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipeline_runs_set_to_self_removal_twice() {
        let count = PIPELINE_ORDER.iter().filter(|p| **p == PassId::SetToSelfRemoval).count();
        assert_eq!(count, 2);
    }
}
