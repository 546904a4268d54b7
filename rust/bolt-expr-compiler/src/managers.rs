//! Temp and constant allocation (spec.md §4.3). Both managers are scoped to
//! a single `Expression::resolve` call and reset between calls; the
//! `rename_temp_scores` pass renumbers whatever survives to the optimizer
//! into compact, deterministic IDs afterward.

use std::collections::HashSet;

use bolt_expr_core::NbtValue;

use crate::source::{DataSource, ScoreSource, TargetKind};

/// Allocates fresh scratch scores and data paths, and remembers which ones
/// it handed out so later passes can tell a temporary from a user source.
#[derive(Debug, Clone)]
pub struct TempManager {
    objective: String,
    storage: String,
    next_score: u64,
    next_data: u64,
    allocated: TempSet,
}

impl TempManager {
    pub fn new(objective: impl Into<String>, storage: impl Into<String>) -> Self {
        TempManager {
            objective: objective.into(),
            storage: storage.into(),
            next_score: 0,
            next_data: 0,
            allocated: TempSet::default(),
        }
    }

    pub fn fresh_score(&mut self) -> ScoreSource {
        let holder = format!("#temp{}", self.next_score);
        self.next_score += 1;
        let source = ScoreSource::new(holder, self.objective.clone());
        self.allocated.scores.insert(source.clone());
        source
    }

    pub fn fresh_data(&mut self) -> DataSource {
        let path = bolt_expr_core::Accessor::Key(format!("temp{}", self.next_data));
        self.next_data += 1;
        let source = DataSource::new(TargetKind::Storage, self.storage.clone()).with_path(path);
        self.allocated.data.insert(source.clone());
        source
    }

    pub fn allocated(&self) -> &TempSet {
        &self.allocated
    }

    pub fn reset(&mut self) {
        self.next_score = 0;
        self.next_data = 0;
        self.allocated = TempSet::default();
    }
}

/// The set of sources a `TempManager` has handed out, queried by the
/// optimizer to distinguish discardable temporaries from user-visible state.
#[derive(Debug, Clone, Default)]
pub struct TempSet {
    scores: HashSet<ScoreSource>,
    data: HashSet<DataSource>,
}

impl TempSet {
    pub fn contains_score(&self, source: &ScoreSource) -> bool {
        self.scores.contains(source)
    }

    pub fn contains_data(&self, source: &DataSource) -> bool {
        self.data.contains(source)
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty() && self.data.is_empty()
    }
}

/// Deduplicates scalar literals promoted to constant scores by the
/// `literal_to_constant_replacement` pass, so the same literal value is
/// never assigned to more than one constant holder.
#[derive(Debug, Clone, Default)]
pub struct ConstManager {
    objective: String,
    seen: Vec<(NbtValue, ScoreSource)>,
}

impl ConstManager {
    pub fn new(objective: impl Into<String>) -> Self {
        ConstManager {
            objective: objective.into(),
            seen: Vec::new(),
        }
    }

    /// Returns the constant holder for `value`, allocating one the first
    /// time this value is requested. `None` if `value` has no integer
    /// representation (only integer constants are ever promoted).
    pub fn get_or_insert(&mut self, value: &NbtValue) -> Option<ScoreSource> {
        let as_int = value.as_score_int()?;
        if let Some((_, source)) = self.seen.iter().find(|(v, _)| v.as_score_int() == Some(as_int)) {
            return Some(source.clone());
        }
        let holder = format!("${as_int}");
        let source = ScoreSource::new(holder, self.objective.clone());
        self.seen.push((value.clone(), source.clone()));
        Some(source)
    }

    /// All constants allocated so far, in allocation order — used to emit
    /// the `init` function's `scoreboard players set` block.
    pub fn allocated(&self) -> impl Iterator<Item = (&NbtValue, &ScoreSource)> {
        self.seen.iter().map(|(v, s)| (v, s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temp_scores_are_distinct_and_tracked() {
        let mut mgr = TempManager::new("bolt.expr.temp", "bolt:expr");
        let a = mgr.fresh_score();
        let b = mgr.fresh_score();
        assert_ne!(a, b);
        assert!(mgr.allocated().contains_score(&a));
        assert!(mgr.allocated().contains_score(&b));
    }

    #[test]
    fn const_manager_dedupes_equal_values() {
        let mut mgr = ConstManager::new("bolt.expr.const");
        let a = mgr.get_or_insert(&NbtValue::Int(5)).unwrap();
        let b = mgr.get_or_insert(&NbtValue::Int(5)).unwrap();
        assert_eq!(a, b);
        assert_eq!(mgr.allocated().count(), 1);
    }
}
