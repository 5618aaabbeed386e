//! The data dependency graph (DDG).
//!
//! A DDG is built per block. Its nodes are the statements of the block
//! plus two sentinels, the *source* (preceding everything) and the
//! *sink* (following everything). Its edges are dependencies: an edge
//! from `a` to `b` means `b` must start at least `weight` cycles after
//! `a` starts. Weights are non-negative in a forward graph; reversing
//! the graph negates them, which turns an as-soon-as-possible scheduler
//! into as-late-as-possible.

pub mod build;
pub mod dot;
pub mod event;

use std::collections::BTreeSet;
use std::fmt;

use petgraph::Direction as PetDirection;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use rustc_hash::FxHashMap;

use crate::error::{SchedError, SchedResult};
use event::Cause;

/// Identity of a statement within a block's dependency graph: one of
/// the two sentinels, or a real statement by its position in the block.
///
/// The derived ordering is program order: source first, then the
/// statements by position, then the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StmtId {
    /// Sentinel preceding all statements.
    Source,
    /// A real statement, by position in the block.
    Stmt(u32),
    /// Sentinel following all statements.
    Sink,
}

impl StmtId {
    /// The block position, if this is a real statement.
    pub fn index(self) -> Option<usize> {
        match self {
            StmtId::Stmt(i) => Some(i as usize),
            _ => None,
        }
    }
}

impl fmt::Display for StmtId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StmtId::Source => write!(f, "source"),
            StmtId::Stmt(i) => write!(f, "stmt {i}"),
            StmtId::Sink => write!(f, "sink"),
        }
    }
}

/// Per-statement data stored in the graph.
#[derive(Debug, Clone)]
pub struct DdgNode {
    /// The statement this node belongs to.
    pub stmt: StmtId,
    /// Position of the statement in the original program order, used
    /// as a tie-breaking key by scheduling heuristics. The source gets
    /// -1, real statements 0 through N-1, and the sink N. Negated when
    /// the graph is reversed.
    pub order: i64,
    /// Length of the longest path from this node to the sink, in
    /// cycles. Only present after [`Ddg::add_remaining`].
    pub remaining: Option<u64>,
}

/// A dependency between two statements.
#[derive(Debug, Clone)]
pub struct DdgEdge {
    /// Minimum number of cycles between the start of the predecessor
    /// and the start of the successor. Non-negative in a forward
    /// graph, non-positive in a reversed one.
    pub weight: i64,
    /// The accesses that caused this dependency.
    pub causes: Vec<Cause>,
}

/// The data dependency graph of one block.
///
/// Constructed with [`build::build`]; the graph can afterwards be
/// [reversed](Ddg::reverse) in place for backward scheduling. Dropping
/// the value discards the analysis.
#[derive(Debug, Clone)]
pub struct Ddg {
    graph: DiGraph<DdgNode, DdgEdge>,
    nodes: FxHashMap<StmtId, NodeIndex>,
    source: NodeIndex,
    sink: NodeIndex,
    /// +1 for a forward graph, -1 for a reversed one.
    direction: i64,
    num_statements: usize,
}

impl Ddg {
    /// The effective scheduling direction: +1 forward, -1 reversed.
    #[inline]
    pub fn direction(&self) -> i64 {
        self.direction
    }

    /// Number of real statements (excluding the sentinels).
    #[inline]
    pub fn num_statements(&self) -> usize {
        self.num_statements
    }

    /// The statement acting as the source in the current direction.
    #[inline]
    pub fn source(&self) -> StmtId {
        self.graph[self.source].stmt
    }

    /// The statement acting as the sink in the current direction.
    #[inline]
    pub fn sink(&self) -> StmtId {
        self.graph[self.sink].stmt
    }

    /// The node data for a statement.
    pub fn node(&self, stmt: StmtId) -> Option<&DdgNode> {
        self.nodes.get(&stmt).map(|&idx| &self.graph[idx])
    }

    /// The edge from one statement to another, if any. Directional.
    pub fn edge(&self, from: StmtId, to: StmtId) -> Option<&DdgEdge> {
        let from = *self.nodes.get(&from)?;
        let to = *self.nodes.get(&to)?;
        self.graph
            .find_edge(from, to)
            .map(|edge| &self.graph[edge])
    }

    /// Iterate over the direct predecessors of a statement with the
    /// connecting edges.
    pub fn predecessors(&self, stmt: StmtId) -> impl Iterator<Item = (StmtId, &DdgEdge)> {
        self.neighbors(stmt, PetDirection::Incoming)
    }

    /// Iterate over the direct successors of a statement with the
    /// connecting edges.
    pub fn successors(&self, stmt: StmtId) -> impl Iterator<Item = (StmtId, &DdgEdge)> {
        self.neighbors(stmt, PetDirection::Outgoing)
    }

    fn neighbors(
        &self,
        stmt: StmtId,
        dir: PetDirection,
    ) -> impl Iterator<Item = (StmtId, &DdgEdge)> {
        self.nodes
            .get(&stmt)
            .into_iter()
            .flat_map(move |&idx| self.graph.edges_directed(idx, dir))
            .map(move |edge| {
                let other = match dir {
                    PetDirection::Incoming => edge.source(),
                    PetDirection::Outgoing => edge.target(),
                };
                (self.graph[other].stmt, edge.weight())
            })
    }

    /// Iterate over all nodes, including the sentinels.
    pub fn all_nodes(&self) -> impl Iterator<Item = &DdgNode> {
        self.graph.node_weights()
    }

    /// Iterate over all edges as (predecessor, successor, edge).
    pub fn edges(&self) -> impl Iterator<Item = (StmtId, StmtId, &DdgEdge)> {
        self.graph.edge_references().map(|edge| {
            (
                self.graph[edge.source()].stmt,
                self.graph[edge.target()].stmt,
                edge.weight(),
            )
        })
    }

    /// Reverse the graph in place: swap source and sink, flip every
    /// edge, negate weights and orders, and flip the direction.
    ///
    /// Reversing twice restores the original graph.
    pub fn reverse(&mut self) {
        self.graph.reverse();
        for edge in self.graph.edge_weights_mut() {
            edge.weight = -edge.weight;
        }
        for node in self.graph.node_weights_mut() {
            node.order = -node.order;
        }
        std::mem::swap(&mut self.source, &mut self.sink);
        self.direction = -self.direction;
    }

    /// Annotate every node with the length of the longest path from it
    /// to the current sink, in cycles.
    ///
    /// Works on both forward and reversed graphs; edge weights are
    /// taken by absolute value.
    pub fn add_remaining(&mut self) {
        for node in self.graph.node_weights_mut() {
            node.remaining = None;
        }
        self.graph[self.sink].remaining = Some(0);

        let mut to_visit: BTreeSet<NodeIndex> = BTreeSet::new();
        to_visit.insert(self.sink);
        while let Some(&current) = to_visit.iter().next() {
            to_visit.remove(&current);
            let current_remaining = self.graph[current].remaining.unwrap_or(0);
            let predecessors: Vec<(NodeIndex, u64)> = self
                .graph
                .edges_directed(current, PetDirection::Incoming)
                .map(|edge| (edge.source(), edge.weight().weight.unsigned_abs()))
                .collect();
            for (pred, weight) in predecessors {
                let candidate = current_remaining + weight;
                let remaining = &mut self.graph[pred].remaining;
                if remaining.is_none_or(|r| candidate > r) {
                    *remaining = Some(candidate);
                    to_visit.insert(pred);
                }
            }
        }
    }

    /// Check the structural invariants of the graph. Failures indicate
    /// a bug in the builder or in a transformation applied afterwards.
    pub fn check_consistency(&self) -> SchedResult<()> {
        let fail = |message: String| Err(SchedError::Internal(message));

        if petgraph::algo::is_cyclic_directed(&self.graph) {
            return fail("dependency graph contains a cycle".into());
        }
        if self.graph.node_count() != self.num_statements + 2 {
            return fail(format!(
                "expected {} nodes, found {}",
                self.num_statements + 2,
                self.graph.node_count()
            ));
        }
        if self
            .graph
            .edges_directed(self.source, PetDirection::Incoming)
            .next()
            .is_some()
        {
            return fail("source has an incoming edge".into());
        }
        if self
            .graph
            .edges_directed(self.sink, PetDirection::Outgoing)
            .next()
            .is_some()
        {
            return fail("sink has an outgoing edge".into());
        }
        // Orders are negated together with the direction, so the
        // source stays non-positive and the sink non-negative.
        if self.graph[self.source].order > 0 {
            return fail("source order does not precede the statements".into());
        }
        if self.graph[self.sink].order < 0 {
            return fail("sink order does not follow the statements".into());
        }

        for edge in self.graph.edge_references() {
            let from = &self.graph[edge.source()];
            let to = &self.graph[edge.target()];
            if from.order >= to.order {
                return fail(format!(
                    "edge from {} to {} goes against node order",
                    from.stmt, to.stmt
                ));
            }
            if edge.weight().weight * self.direction < 0 {
                return fail(format!(
                    "edge from {} to {} has weight {} against direction {}",
                    from.stmt,
                    to.stmt,
                    edge.weight().weight,
                    self.direction
                ));
            }
            if edge.weight().causes.is_empty() {
                return fail(format!(
                    "edge from {} to {} has no causes",
                    from.stmt, to.stmt
                ));
            }
        }

        // Every node must lie on a path from source to sink.
        let mut dfs = petgraph::visit::Dfs::new(&self.graph, self.source);
        let mut reachable = 0usize;
        while dfs.next(&self.graph).is_some() {
            reachable += 1;
        }
        if reachable != self.graph.node_count() {
            return fail("not all nodes are reachable from the source".into());
        }
        let reversed = petgraph::visit::Reversed(&self.graph);
        let mut dfs = petgraph::visit::Dfs::new(&reversed, self.sink);
        let mut coreachable = 0usize;
        while dfs.next(&reversed).is_some() {
            coreachable += 1;
        }
        if coreachable != self.graph.node_count() {
            return fail("not all nodes can reach the sink".into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::build::build;
    use super::*;
    use vanta_ir::{Block, QubitId};

    fn chain_block() -> Block {
        let mut block = Block::with_size("chain", 1, 0);
        block.h(QubitId(0)).unwrap();
        block.h(QubitId(0)).unwrap();
        block.h(QubitId(0)).unwrap();
        block
    }

    #[test]
    fn test_orders_are_program_positions() {
        let block = chain_block();
        let ddg = build(&block, true, true);
        assert_eq!(ddg.node(StmtId::Source).unwrap().order, -1);
        assert_eq!(ddg.node(StmtId::Stmt(0)).unwrap().order, 0);
        assert_eq!(ddg.node(StmtId::Stmt(2)).unwrap().order, 2);
        assert_eq!(ddg.node(StmtId::Sink).unwrap().order, 3);
        ddg.check_consistency().unwrap();
    }

    #[test]
    fn test_reverse_is_involution() {
        let block = chain_block();
        let mut ddg = build(&block, true, true);
        let forward: Vec<_> = ddg
            .edges()
            .map(|(a, b, e)| (a, b, e.weight))
            .collect();

        ddg.reverse();
        assert_eq!(ddg.direction(), -1);
        assert_eq!(ddg.source(), StmtId::Sink);
        assert_eq!(ddg.sink(), StmtId::Source);
        ddg.check_consistency().unwrap();
        for (a, b, e) in ddg.edges() {
            assert!(e.weight <= 0);
            assert!(forward.contains(&(b, a, -e.weight)));
        }

        ddg.reverse();
        assert_eq!(ddg.direction(), 1);
        let restored: Vec<_> = ddg
            .edges()
            .map(|(a, b, e)| (a, b, e.weight))
            .collect();
        assert_eq!(forward.len(), restored.len());
        for entry in &forward {
            assert!(restored.contains(entry));
        }
    }

    #[test]
    fn test_remaining_is_critical_path() {
        let block = chain_block();
        let mut ddg = build(&block, true, true);
        ddg.add_remaining();
        // Three sequential unit-duration gates: remaining counts the
        // path to the sink.
        assert_eq!(ddg.node(StmtId::Sink).unwrap().remaining, Some(0));
        assert_eq!(ddg.node(StmtId::Stmt(2)).unwrap().remaining, Some(1));
        assert_eq!(ddg.node(StmtId::Stmt(0)).unwrap().remaining, Some(3));
        assert_eq!(ddg.node(StmtId::Source).unwrap().remaining, Some(3));
    }

    #[test]
    fn test_remaining_on_reversed_graph() {
        let block = chain_block();
        let mut ddg = build(&block, true, true);
        ddg.reverse();
        ddg.add_remaining();
        // On the reversed graph the roles flip: the original source is
        // now the sink. Weights still carry the forward predecessor's
        // duration, so values are shifted by one edge relative to the
        // forward graph.
        assert_eq!(ddg.node(StmtId::Source).unwrap().remaining, Some(0));
        assert_eq!(ddg.node(StmtId::Stmt(0)).unwrap().remaining, Some(0));
        assert_eq!(ddg.node(StmtId::Stmt(1)).unwrap().remaining, Some(1));
        assert_eq!(ddg.node(StmtId::Stmt(2)).unwrap().remaining, Some(2));
        assert_eq!(ddg.node(StmtId::Sink).unwrap().remaining, Some(3));
    }
}
