//! Resource-constrained ASAP/ALAP list scheduling.
//!
//! The scheduler walks the dependency graph from its source, keeping a
//! set of statements whose dependencies are satisfied and placing the
//! most critical one in the current cycle whenever the resources allow
//! it. Scheduling over a reversed graph produces an as-late-as-possible
//! schedule: cycles then decrease from 0 and are shifted back to
//! non-negative afterwards.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet};

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use tracing::debug;
use vanta_ir::Block;

use crate::ddg::{Ddg, StmtId, build::build};
use crate::error::{SchedError, SchedResult};
use crate::resource::manager::ResourceManager;
use crate::resource::state::ResourceState;
use crate::resource::{Direction, GateRequest};

/// A criticality metric over statements. Higher values are scheduled
/// first; ties fall back to the original program order.
pub trait Heuristic {
    /// The criticality of a statement.
    fn criticality(&self, ddg: &Ddg, stmt: StmtId) -> u64;
}

/// Considers all statements equally critical, reducing the scheduler
/// to plain ASAP/ALAP in original program order.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrivialHeuristic;

impl Heuristic for TrivialHeuristic {
    fn criticality(&self, _ddg: &Ddg, _stmt: StmtId) -> u64 {
        0
    }
}

/// Prefers statements with a longer path to the sink. Requires
/// [`Ddg::add_remaining`] to have been run.
#[derive(Debug, Clone, Copy, Default)]
pub struct CriticalPathHeuristic;

impl Heuristic for CriticalPathHeuristic {
    fn criticality(&self, ddg: &Ddg, stmt: StmtId) -> u64 {
        ddg.node(stmt).and_then(|node| node.remaining).unwrap_or(0)
    }
}

/// Selects one of the built-in heuristics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HeuristicKind {
    /// [`TrivialHeuristic`].
    Trivial,
    /// [`CriticalPathHeuristic`].
    #[default]
    CriticalPath,
}

impl HeuristicKind {
    /// Instantiate the heuristic.
    pub fn instantiate(self) -> Box<dyn Heuristic> {
        match self {
            HeuristicKind::Trivial => Box::new(TrivialHeuristic),
            HeuristicKind::CriticalPath => Box::new(CriticalPathHeuristic),
        }
    }

    fn needs_remaining(self) -> bool {
        matches!(self, HeuristicKind::CriticalPath)
    }
}

/// Options for [`schedule_asap`] and [`schedule_alap`].
#[derive(Debug, Clone)]
pub struct SchedulerOptions {
    /// Let single-qubit gates commute on their operand axis.
    pub commute_single_qubit: bool,
    /// Let multi-qubit gates commute on their operand axes.
    pub commute_multi_qubit: bool,
    /// The criticality heuristic.
    pub heuristic: HeuristicKind,
    /// How many cycles to wait for resources to free up when nothing
    /// can be scheduled, before declaring the resources deadlocked.
    /// Zero disables the check.
    pub max_resource_wait: u64,
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self {
            commute_single_qubit: true,
            commute_multi_qubit: true,
            heuristic: HeuristicKind::default(),
            max_resource_wait: 10_000,
        }
    }
}

/// The result of scheduling a block: a start cycle per statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    cycles: Vec<u64>,
    length: u64,
}

impl Schedule {
    /// The start cycle of each statement, indexed by block position.
    pub fn cycles(&self) -> &[u64] {
        &self.cycles
    }

    /// The start cycle of one statement.
    pub fn cycle(&self, index: usize) -> Option<u64> {
        self.cycles.get(index).copied()
    }

    /// The length of the schedule in cycles.
    pub fn length(&self) -> u64 {
        self.length
    }

    /// Group statement positions by start cycle, in cycle order.
    pub fn bundles(&self) -> Vec<(u64, Vec<usize>)> {
        let mut map: BTreeMap<u64, Vec<usize>> = BTreeMap::new();
        for (index, &cycle) in self.cycles.iter().enumerate() {
            map.entry(cycle).or_default().push(index);
        }
        map.into_iter().collect()
    }
}

/// Availability key: most critical first, then original program order.
type AvailableKey = (Reverse<u64>, i64, StmtId);

fn abs_max(a: i64, b: i64) -> i64 {
    if a.abs() < b.abs() { b } else { a }
}

fn request_for(block: &Block, stmt: StmtId) -> SchedResult<GateRequest<'_>> {
    Ok(match stmt {
        StmtId::Source => GateRequest {
            name: "source",
            qubits: &[],
            duration: 0,
        },
        StmtId::Sink => GateRequest {
            name: "sink",
            qubits: &[],
            duration: 0,
        },
        StmtId::Stmt(index) => {
            let instruction = block.statement(index as usize).ok_or_else(|| {
                SchedError::Internal(format!("statement {index} is not in the block"))
            })?;
            GateRequest {
                name: instruction.name(),
                qubits: &instruction.qubits,
                duration: instruction.duration,
            }
        }
    })
}

/// A potentially resource-constrained list scheduler over a prebuilt
/// dependency graph.
///
/// The usual entry points are [`schedule_asap`] and [`schedule_alap`];
/// the scheduler is public for callers that want to drive placement
/// themselves via [`try_schedule`](Scheduler::try_schedule) and
/// [`advance`](Scheduler::advance).
pub struct Scheduler<'a> {
    block: &'a Block,
    ddg: &'a Ddg,
    heuristic: Box<dyn Heuristic>,
    resources: Option<ResourceState>,
    /// The cycle currently being filled. Starts at 0 and moves away
    /// from it in the graph's direction.
    cycle: i64,
    direction: i64,
    scheduled: FxHashMap<StmtId, i64>,
    /// Statements schedulable in the current cycle as far as the
    /// dependencies are concerned, most critical first.
    available: BTreeSet<AvailableKey>,
    /// Statements whose predecessors are all scheduled but whose
    /// earliest cycle lies ahead, keyed by that cycle times the
    /// direction (so the map is ordered by distance from cycle 0).
    available_in: BTreeMap<i64, Vec<StmtId>>,
    /// Statements with unscheduled predecessors.
    waiting: FxHashSet<StmtId>,
}

impl<'a> Scheduler<'a> {
    /// Create a scheduler over the given graph and schedule the source
    /// sentinel at cycle 0.
    ///
    /// When a resource manager is given, a fresh resource state is
    /// built for the graph's direction.
    pub fn new(
        block: &'a Block,
        ddg: &'a Ddg,
        resources: Option<&ResourceManager>,
        heuristic: Box<dyn Heuristic>,
    ) -> SchedResult<Self> {
        let direction = ddg.direction();
        let resources = match resources {
            None => None,
            Some(manager) => Some(manager.build(if direction > 0 {
                Direction::Forward
            } else {
                Direction::Backward
            })?),
        };

        let mut scheduler = Self {
            block,
            ddg,
            heuristic,
            resources,
            cycle: 0,
            direction,
            scheduled: FxHashMap::default(),
            available: BTreeSet::new(),
            available_in: BTreeMap::new(),
            waiting: FxHashSet::default(),
        };
        for index in 0..block.len() {
            scheduler.waiting.insert(StmtId::Stmt(index as u32));
        }
        scheduler.waiting.insert(ddg.sink());
        let source = ddg.source();
        scheduler.available.insert(scheduler.key(source));
        scheduler.schedule(source)?;
        Ok(scheduler)
    }

    fn key(&self, stmt: StmtId) -> AvailableKey {
        let order = self.ddg.node(stmt).map_or(0, |node| node.order);
        (
            Reverse(self.heuristic.criticality(self.ddg, stmt)),
            order,
            stmt,
        )
    }

    /// The cycle currently being filled.
    pub fn cycle(&self) -> i64 {
        self.cycle
    }

    /// The direction the cycle number advances in: +1 or -1.
    pub fn direction(&self) -> i64 {
        self.direction
    }

    /// Whether every statement, sentinels included, has been placed.
    pub fn is_done(&self) -> bool {
        self.available.is_empty() && self.available_in.is_empty() && self.waiting.is_empty()
    }

    /// The statements schedulable in the current cycle, dependencies
    /// and resources both considered, most critical first.
    pub fn available_statements(&mut self) -> SchedResult<Vec<StmtId>> {
        let candidates: Vec<StmtId> = self.available.iter().map(|key| key.2).collect();
        let mut result = Vec::new();
        for stmt in candidates {
            if self.resources_allow(stmt)? {
                result.push(stmt);
            }
        }
        Ok(result)
    }

    /// Move to the next cycle (or several at once). Statements whose
    /// earliest cycle is reached or passed become available.
    pub fn advance(&mut self, by: u64) {
        self.cycle += self.direction * by as i64;
        let horizon = self.cycle * self.direction;
        while let Some((&key, _)) = self.available_in.first_key_value() {
            if key > horizon {
                break;
            }
            if let Some(batch) = self.available_in.remove(&key) {
                for stmt in batch {
                    self.available.insert(self.key(stmt));
                }
            }
        }
    }

    fn resources_allow(&mut self, stmt: StmtId) -> SchedResult<bool> {
        let Some(resources) = &mut self.resources else {
            return Ok(true);
        };
        let request = request_for(self.block, stmt)?;
        resources.available(self.cycle, &request)
    }

    /// Try to place the given statement in the current cycle. Returns
    /// `false` if its dependencies or the resources don't allow it.
    pub fn try_schedule(&mut self, stmt: StmtId) -> SchedResult<bool> {
        if !self.available.contains(&self.key(stmt)) {
            return Ok(false);
        }
        if !self.resources_allow(stmt)? {
            return Ok(false);
        }
        self.schedule(stmt)?;
        Ok(true)
    }

    /// Try to place the most critical statement that fits the current
    /// cycle.
    pub fn try_schedule_any(&mut self) -> SchedResult<bool> {
        let candidates: Vec<StmtId> = self.available.iter().map(|key| key.2).collect();
        for stmt in candidates {
            if self.try_schedule(stmt)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Place a statement in the current cycle, reserve its resources,
    /// and release any successors that become schedulable. When the
    /// current cycle has nothing left, jumps ahead to the next cycle
    /// with pending statements.
    fn schedule(&mut self, stmt: StmtId) -> SchedResult<()> {
        let block = self.block;
        let ddg = self.ddg;

        if let Some(resources) = &mut self.resources {
            let request = request_for(block, stmt)?;
            resources.reserve(self.cycle, &request)?;
        }
        debug!(stmt = %stmt, cycle = self.cycle, "schedule statement");
        self.available.remove(&self.key(stmt));
        self.scheduled.insert(stmt, self.cycle);

        for (successor, _) in ddg.successors(stmt) {
            let mut ready = true;
            let mut available_from = 0i64;
            for (pred, edge) in ddg.predecessors(successor) {
                match self.scheduled.get(&pred) {
                    None => {
                        ready = false;
                        break;
                    }
                    Some(&pred_cycle) => {
                        available_from = abs_max(available_from, pred_cycle + edge.weight);
                    }
                }
            }
            if ready {
                if !self.waiting.remove(&successor) {
                    return Err(SchedError::Internal(format!(
                        "{successor} released twice"
                    )));
                }
                if available_from == self.cycle {
                    self.available.insert(self.key(successor));
                } else {
                    self.available_in
                        .entry(available_from * self.direction)
                        .or_default()
                        .push(successor);
                }
            }
        }

        if self.available.is_empty() {
            if let Some((&key, _)) = self.available_in.iter().next() {
                self.cycle = key * self.direction;
                if let Some(batch) = self.available_in.remove(&key) {
                    for stmt in batch {
                        self.available.insert(self.key(stmt));
                    }
                }
            }
        }
        Ok(())
    }

    /// Run to completion: place statements cycle by cycle, waiting for
    /// resources when needed, up to `max_resource_wait` consecutive
    /// idle cycles (0 disables the bound).
    pub fn run(&mut self, max_resource_wait: u64) -> SchedResult<()> {
        while !self.is_done() {
            if self.available.is_empty() {
                return Err(SchedError::Internal(
                    "no statements available despite unscheduled statements".to_string(),
                ));
            }
            let mut advanced = 0u64;
            while !self.try_schedule_any()? {
                self.advance(1);
                advanced += 1;
                if max_resource_wait != 0 && advanced > max_resource_wait {
                    let name = match self.available.iter().next() {
                        Some(&(_, _, stmt)) => request_for(self.block, stmt)?.name.to_string(),
                        None => "<none>".to_string(),
                    };
                    return Err(SchedError::Infeasible {
                        name,
                        cycle: self.cycle,
                        waited: advanced,
                    });
                }
            }
        }
        debug!(length = self.cycle.unsigned_abs(), "scheduler done");
        Ok(())
    }

    /// Convert the raw cycle numbers into a [`Schedule`], shifting
    /// them so the earliest cycle is 0. For a reversed graph this
    /// yields the as-late-as-possible schedule in forward cycles.
    pub fn finish(self) -> SchedResult<Schedule> {
        if !self.is_done() {
            return Err(SchedError::Internal(
                "finish() called before all statements were scheduled".to_string(),
            ));
        }
        let min = self.scheduled.values().copied().min().unwrap_or(0);
        let max = self.scheduled.values().copied().max().unwrap_or(0);
        let mut cycles = vec![0u64; self.block.len()];
        for (stmt, &cycle) in &self.scheduled {
            if let Some(index) = stmt.index() {
                cycles[index] = (cycle - min) as u64;
            }
        }
        Ok(Schedule {
            cycles,
            length: (max - min) as u64,
        })
    }
}

/// Build a dependency graph for the block using the commutation
/// settings from the options.
pub fn build_ddg(block: &Block, options: &SchedulerOptions) -> Ddg {
    build(
        block,
        options.commute_single_qubit,
        options.commute_multi_qubit,
    )
}

fn schedule_with(
    block: &Block,
    resources: Option<&ResourceManager>,
    options: &SchedulerOptions,
    backward: bool,
) -> SchedResult<Schedule> {
    let mut ddg = build_ddg(block, options);
    ddg.check_consistency()?;
    if backward {
        ddg.reverse();
    }
    if options.heuristic.needs_remaining() {
        ddg.add_remaining();
    }
    let mut scheduler = Scheduler::new(block, &ddg, resources, options.heuristic.instantiate())?;
    scheduler.run(options.max_resource_wait)?;
    scheduler.finish()
}

/// Schedule a block as soon as possible, optionally under resource
/// constraints.
pub fn schedule_asap(
    block: &Block,
    resources: Option<&ResourceManager>,
    options: &SchedulerOptions,
) -> SchedResult<Schedule> {
    schedule_with(block, resources, options, false)
}

/// Schedule a block as late as possible, optionally under resource
/// constraints. The returned cycles are forward cycles starting at 0.
pub fn schedule_alap(
    block: &Block,
    resources: Option<&ResourceManager>,
    options: &SchedulerOptions,
) -> SchedResult<Schedule> {
    schedule_with(block, resources, options, true)
}
