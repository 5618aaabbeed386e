//! Construction of the data dependency graph for a block.

use petgraph::graph::{DiGraph, NodeIndex};
use rustc_hash::FxHashMap;
use tracing::trace;
use vanta_ir::{Block, Instruction};

use super::event::{Cause, DependencyType, Event, EventGatherer};
use super::{Ddg, DdgEdge, DdgNode, StmtId};

/// An event together with the node whose statement caused it.
#[derive(Debug, Clone)]
struct EventNodePair {
    event: Event,
    node: NodeIndex,
}

impl EventNodePair {
    /// Whether this event commutes with the given pair. Events caused
    /// by the same statement always commute; without this the state
    /// machine would make a statement depend on itself.
    fn commutes_with(&self, other: &EventNodePair) -> bool {
        self.node == other.node || self.event.commutes_with(&other.event)
    }
}

struct Builder<'b> {
    block: &'b Block,
    gatherer: EventGatherer,
    graph: DiGraph<DdgNode, DdgEdge>,
    nodes: FxHashMap<StmtId, NodeIndex>,
    /// Duration of the statement behind each node, indexed by node.
    durations: Vec<u64>,
    /// Events whose statements may still be freely reordered with
    /// future events. Everything in this list commutes pairwise.
    /// Incoming events evict entries that do not commute with them.
    commuting: Vec<EventNodePair>,
    /// Events that can no longer commute with anything in the future.
    /// An incoming event gets a dependency edge from every entry here
    /// that may touch the same location.
    non_commuting: Vec<EventNodePair>,
}

impl<'b> Builder<'b> {
    fn new(block: &'b Block, commute_single_qubit: bool, commute_multi_qubit: bool) -> Self {
        Self {
            block,
            gatherer: EventGatherer::new(commute_single_qubit, commute_multi_qubit),
            graph: DiGraph::new(),
            nodes: FxHashMap::default(),
            durations: Vec::with_capacity(block.len() + 2),
            commuting: Vec::new(),
            non_commuting: Vec::new(),
        }
    }

    fn add_node(&mut self, stmt: StmtId, order: i64, duration: u64) -> NodeIndex {
        let node = self.graph.add_node(DdgNode {
            stmt,
            order,
            remaining: None,
        });
        self.nodes.insert(stmt, node);
        self.durations.push(duration);
        node
    }

    /// Add a dependency edge, or extend an existing one with another
    /// cause. The weight is raised to at least the duration of the
    /// predecessor statement.
    fn add_edge(&mut self, from: &EventNodePair, to: &EventNodePair) {
        debug_assert_ne!(from.node, to.node);
        let edge = match self.graph.find_edge(from.node, to.node) {
            Some(edge) => edge,
            None => {
                trace!(
                    from = %self.graph[from.node].stmt,
                    to = %self.graph[to.node].stmt,
                    "add dependency edge"
                );
                self.graph.add_edge(
                    from.node,
                    to.node,
                    DdgEdge {
                        weight: 0,
                        causes: Vec::new(),
                    },
                )
            }
        };
        let edge = &mut self.graph[edge];
        edge.weight = edge.weight.max(self.durations[from.node.index()] as i64);
        edge.causes.push(Cause {
            reference: from.event.reference.intersect_with(&to.event.reference),
            dependency_type: DependencyType {
                first_mode: from.event.mode,
                second_mode: to.event.mode,
            },
        });
    }

    /// Move an entry from the commuting to the non-commuting list.
    ///
    /// Anything in the non-commuting list shadowed by the evicted
    /// event is pruned: it already has an edge to the evicted node, so
    /// by transitivity an edge from it to any future statement would be
    /// redundant.
    fn evict(&mut self, index: usize) {
        let evicted = self.commuting.remove(index);
        trace!(event = %evicted.event, "evict to non-commuting");
        self.non_commuting
            .retain(|nc| !nc.event.is_shadowed_by(&evicted.event));
        self.non_commuting.push(evicted);
    }

    fn process_event(&mut self, incoming: EventNodePair) {
        trace!(event = %incoming.event, stmt = %self.graph[incoming.node].stmt, "process event");

        let mut i = 0;
        while i < self.commuting.len() {
            if !self.commuting[i].commutes_with(&incoming) {
                self.evict(i);
            } else {
                i += 1;
            }
        }

        // Edges from everything in the past that may touch the same
        // location. Global-state writes are held back: if any other
        // edge is added, its predecessor already depends on the global
        // write and the direct edge would be redundant.
        let mut any_edge = false;
        let mut global_writes = Vec::new();
        for index in 0..self.non_commuting.len() {
            let nc = &self.non_commuting[index];
            if nc.event.reference.is_global_state() {
                global_writes.push(index);
                continue;
            }
            if !nc
                .event
                .reference
                .is_provably_distinct_from(&incoming.event.reference)
            {
                let nc = self.non_commuting[index].clone();
                self.add_edge(&nc, &incoming);
                any_edge = true;
            }
        }
        if !any_edge {
            for index in global_writes {
                let nc = self.non_commuting[index].clone();
                self.add_edge(&nc, &incoming);
            }
        }

        self.commuting.push(incoming);
    }

    fn process_statement(&mut self, node: NodeIndex, instruction: Option<&Instruction>) {
        let events = match instruction {
            Some(instruction) => self.gatherer.gather(instruction),
            // The sentinels act as barriers on everything.
            None => vec![Event::global_barrier()],
        };
        for event in events {
            self.process_event(EventNodePair { event, node });
        }
    }

    fn build(mut self) -> Ddg {
        let block = self.block;
        let num_statements = block.len();

        let source = self.add_node(StmtId::Source, -1, 0);
        for (index, instruction) in block.statements().enumerate() {
            self.add_node(
                StmtId::Stmt(index as u32),
                index as i64,
                instruction.duration,
            );
        }
        let sink = self.add_node(StmtId::Sink, num_statements as i64, 0);

        self.process_statement(source, None);
        for (index, instruction) in block.statements().enumerate() {
            let node = self.nodes[&StmtId::Stmt(index as u32)];
            self.process_statement(node, Some(instruction));
        }
        self.process_statement(sink, None);

        Ddg {
            graph: self.graph,
            nodes: self.nodes,
            source,
            sink,
            direction: 1,
            num_statements,
        }
    }
}

/// Build a forward data dependency graph for the given block.
///
/// `commute_single_qubit` and `commute_multi_qubit` control whether the
/// commuting operand modes of single- and multi-qubit gates take
/// effect; when disabled, those operands are treated as plain writes.
pub fn build(block: &Block, commute_single_qubit: bool, commute_multi_qubit: bool) -> Ddg {
    Builder::new(block, commute_single_qubit, commute_multi_qubit).build()
}
