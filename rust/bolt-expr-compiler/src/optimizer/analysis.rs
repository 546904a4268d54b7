//! Shared dataflow helpers the whole-list passes build on: which sources a
//! node reads, which definition of a source reaches a given point, and the
//! read/write dependency graph between nodes (spec.md §4.4).

use std::collections::{HashMap, HashSet};

use crate::ir::{IrNode, IrOperand};
use crate::source::SourceTuple;

fn tuple_of(operand: &IrOperand) -> Option<SourceTuple> {
    match operand {
        IrOperand::Score(s) => Some(SourceTuple::from_score(&s.source)),
        IrOperand::Data(d) => Some(SourceTuple::from_data(&d.source)),
        IrOperand::Literal(_) | IrOperand::Composite(_) => None,
    }
}

/// Every source any node in `nodes` reads from.
pub fn use_set(nodes: &[IrNode]) -> HashSet<SourceTuple> {
    let mut out = HashSet::new();
    for node in nodes {
        for operand in node.operands() {
            if let Some(t) = tuple_of(&operand) {
                out.insert(t);
            }
        }
    }
    out
}

/// For each node index, the index of the most recent prior node that wrote
/// to (or aliased) each of that node's source operands — the classic
/// reaching-definitions map, restricted to "last write wins" since this IR
/// has no control-flow joins other than `IrBranch`, which this analysis
/// treats as opaque (a branch is never assumed to not execute).
pub fn reaching_definitions(nodes: &[IrNode]) -> Vec<HashMap<SourceTuple, usize>> {
    let mut last_write: HashMap<SourceTuple, usize> = HashMap::new();
    let mut result = Vec::with_capacity(nodes.len());
    for (i, node) in nodes.iter().enumerate() {
        // The reaching map visible to this node is the state before it runs.
        result.push(last_write.clone());
        for target in node.targets() {
            if let Some(t) = tuple_of(&target) {
                // Any source aliasing this write is no longer reliably known.
                last_write.retain(|existing, _| !existing.aliases(&t));
                last_write.insert(t, i);
            }
        }
    }
    result
}

/// For each node index, the indices of later nodes that read a source this
/// node writes (a read-after-write edge) — used by collapsing/dead-code
/// passes to check it's safe to merge or drop a node without changing what
/// a later node observes.
pub fn dependency_graph(nodes: &[IrNode]) -> Vec<Vec<usize>> {
    let mut edges = vec![Vec::new(); nodes.len()];
    for (i, node) in nodes.iter().enumerate() {
        let writes: Vec<SourceTuple> = node.targets().iter().filter_map(tuple_of).collect();
        if writes.is_empty() {
            continue;
        }
        for (j, later) in nodes.iter().enumerate().skip(i + 1) {
            let reads: Vec<SourceTuple> = later.operands().iter().filter_map(tuple_of).collect();
            if reads.iter().any(|r| writes.iter().any(|w| w.aliases(r))) {
                edges[i].push(j);
            }
            // A later write to the same source shadows this one; readers
            // after that point no longer depend on node `i`.
            let later_writes: Vec<SourceTuple> = later.targets().iter().filter_map(tuple_of).collect();
            if writes.iter().any(|w| later_writes.iter().any(|lw| lw.aliases(w))) {
                break;
            }
        }
    }
    edges
}

/// True if no later node in `nodes[after..]` reads `source` before it is
/// next written — i.e. the value at `nodes[after]` is dead.
pub fn is_dead_after(nodes: &[IrNode], after: usize, source: &SourceTuple) -> bool {
    for node in &nodes[after..] {
        if node.operands().iter().filter_map(tuple_of).any(|r| r.aliases(source)) {
            return false;
        }
        if node.targets().iter().filter_map(tuple_of).any(|w| w.aliases(source)) {
            return true;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{BinaryOp, IrBinary, IrScore};
    use crate::source::ScoreSource;

    fn score(name: &str) -> IrOperand {
        IrOperand::Score(IrScore { source: ScoreSource::new(name, "obj") })
    }

    #[test]
    fn dependency_graph_links_write_to_later_read() {
        let nodes = vec![
            IrNode::Binary(IrBinary { op: BinaryOp::Set, left: score("a"), right: score("b"), stores: vec![] }),
            IrNode::Binary(IrBinary { op: BinaryOp::Add, left: score("a"), right: score("c"), stores: vec![] }),
        ];
        let graph = dependency_graph(&nodes);
        assert_eq!(graph[0], vec![1]);
    }

    #[test]
    fn dead_write_detected_when_never_read_again() {
        let nodes = vec![
            IrNode::Binary(IrBinary { op: BinaryOp::Set, left: score("a"), right: score("b"), stores: vec![] }),
            IrNode::Binary(IrBinary { op: BinaryOp::Set, left: score("a"), right: score("c"), stores: vec![] }),
        ];
        let tuple = tuple_of(&score("a")).unwrap();
        assert!(is_dead_after(&nodes, 0, &tuple));
    }
}
