//! `Expression`: the driver that owns the managers and runs a tree through
//! unroll → optimize → serialize (spec.md §4.6).

use std::collections::HashMap;

use tracing::{debug, instrument};

use crate::config::ExpressionConfig;
use crate::error::ExpressionError;
use crate::expr_tree::{Condition, Expr};
use crate::managers::{ConstManager, TempManager};
use crate::optimizer::{self, OptimizerContext};
use crate::serializer;
use crate::source::ScoreSource;
use crate::unroll::Unroller;

/// A destination commands are written to as they're produced. Hosts
/// implement this to hook the compiler into whatever build pipeline emits
/// the final function files (spec.md §6).
pub trait CommandSink {
    fn push(&mut self, command: String);

    fn push_all(&mut self, commands: impl IntoIterator<Item = String>) {
        for command in commands {
            self.push(command);
        }
    }
}

impl CommandSink for Vec<String> {
    fn push(&mut self, command: String) {
        Vec::push(self, command);
    }
}

/// Owns the temp/const managers across calls so identifiers stay unique
/// within one compilation unit, and exposes the two entry points a host
/// calls: `resolve` for a value expression, `resolve_branch` for a
/// condition.
pub struct Expression {
    config: ExpressionConfig,
    temps: TempManager,
    consts: ConstManager,
    lazy_values: HashMap<String, Vec<String>>,
}

impl Expression {
    pub fn new(config: ExpressionConfig) -> Self {
        let temps = TempManager::new(config.temp_objective.clone(), config.temp_storage.clone());
        let consts = ConstManager::new(config.const_objective().to_string());
        Expression { config, temps, consts, lazy_values: HashMap::new() }
    }

    /// Lowers `expr` into commands and appends them to `sink`. When `lazy`
    /// is `Some(key)`, the commands are stashed under that key instead of
    /// being emitted immediately — a later call to `generate_init` (or a
    /// direct `take_lazy`) is what actually flushes them, letting a host
    /// batch deferred work (e.g. per-tick init) into one place.
    #[instrument(skip(self, sink))]
    pub fn resolve(&mut self, expr: &Expr, lazy: Option<&str>, sink: &mut impl CommandSink) -> Result<(), ExpressionError> {
        self.temps.reset();
        let mut unroller = Unroller::new(&mut self.temps, &mut self.consts);
        let (_, nodes) = unroller.unroll(expr)?;
        let mut ctx = OptimizerContext { temps: &mut self.temps, consts: &mut self.consts, config: &self.config };
        let optimized = optimizer::optimize(nodes, &mut ctx)?;
        let commands = serializer::serialize(&optimized, &self.config.default_nbt_type);
        debug!(count = commands.len(), "resolved expression");
        match lazy {
            Some(key) => {
                self.lazy_values.entry(key.to_string()).or_default().extend(commands);
            }
            None => sink.push_all(commands),
        }
        Ok(())
    }

    /// Lowers a `Condition` into a single `execute if/unless ... run` chain
    /// wrapping `then`, appended to `sink`.
    #[instrument(skip(self, then, sink))]
    pub fn resolve_branch(&mut self, cond: &Condition, then: &Expr, sink: &mut impl CommandSink) -> Result<(), ExpressionError> {
        self.temps.reset();
        let mut unroller = Unroller::new(&mut self.temps, &mut self.consts);
        let (conditions, mut nodes) = unroller.unroll_condition(cond)?;
        let (_, then_nodes) = unroller.unroll(then)?;
        nodes.push(crate::ir::IrNode::Branch(crate::ir::IrBranch { conditions, children: then_nodes, store: None }));
        let mut ctx = OptimizerContext { temps: &mut self.temps, consts: &mut self.consts, config: &self.config };
        let optimized = optimizer::optimize(nodes, &mut ctx)?;
        sink.push_all(serializer::serialize(&optimized, &self.config.default_nbt_type));
        Ok(())
    }

    /// Initializes every constant score this `Expression` has allocated so
    /// far, as `scoreboard players set` commands — the counterpart to a
    /// datapack's `load` function.
    pub fn generate_init(&self, sink: &mut impl CommandSink) {
        for (value, holder) in self.consts.allocated() {
            let ScoreSource { holder, objective } = holder;
            if let Some(i) = value.as_score_int() {
                sink.push(format!("scoreboard players set {holder} {objective} {i}"));
            }
        }
    }

    /// Flushes and removes a lazily-stashed batch, in the order the calls
    /// to `resolve(..., Some(key), ...)` that produced it were made.
    pub fn take_lazy(&mut self, key: &str) -> Vec<String> {
        self.lazy_values.remove(key).unwrap_or_default()
    }

    pub fn config(&self) -> &ExpressionConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr_tree::ExprExt;
    use crate::source::ScoreSource;

    #[test]
    fn resolve_emits_commands_into_the_sink() {
        let mut expr = Expression::new(ExpressionConfig::default());
        let mut sink: Vec<String> = Vec::new();
        let x = ScoreSource::new("@s", "health");
        expr.resolve(&x.set(5i64), None, &mut sink).unwrap();
        assert_eq!(sink, vec!["scoreboard players set @s health 5"]);
    }

    #[test]
    fn lazy_resolve_defers_until_taken() {
        let mut expr = Expression::new(ExpressionConfig::default());
        let mut sink: Vec<String> = Vec::new();
        let x = ScoreSource::new("@s", "health");
        expr.resolve(&x.set(5i64), Some("tick"), &mut sink).unwrap();
        assert!(sink.is_empty());
        assert_eq!(expr.take_lazy("tick"), vec!["scoreboard players set @s health 5"]);
    }
}
