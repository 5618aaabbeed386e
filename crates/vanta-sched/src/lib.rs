//! Vanta Instruction Scheduling
//!
//! Dependency analysis and cycle assignment for straight-line blocks of
//! quantum instructions. The crate is built around three pieces:
//!
//! - a per-block [data dependency graph](ddg) with axis-aware
//!   commutation, so that e.g. two CZ gates sharing a qubit may still
//!   be reordered;
//! - a pluggable, direction-sensitive [resource model](resource) for
//!   constraints the graph cannot express, such as a shared readout
//!   instrument;
//! - a [list scheduler](scheduler) that assigns start cycles either as
//!   soon or as late as possible, honoring both.
//!
//! # Example
//!
//! ```rust
//! use vanta_ir::{Block, QubitId};
//! use vanta_sched::{SchedulerOptions, schedule_asap};
//!
//! let mut block = Block::with_size("demo", 2, 0);
//! block.h(QubitId(0)).unwrap();
//! block.h(QubitId(1)).unwrap();
//! block.cx(QubitId(0), QubitId(1)).unwrap();
//!
//! let schedule = schedule_asap(&block, None, &SchedulerOptions::default()).unwrap();
//! assert_eq!(schedule.cycles(), &[0, 0, 1]);
//! assert_eq!(schedule.length(), 2);
//! ```

pub mod ddg;
pub mod error;
pub mod resource;
pub mod scheduler;

pub use ddg::build::build as build_ddg;
pub use ddg::event::{AccessMode, Cause, DependencyType, Event, EventGatherer, Reference};
pub use ddg::{Ddg, DdgEdge, DdgNode, StmtId};
pub use error::{SchedError, SchedResult};
pub use resource::manager::{ResourceContext, ResourceFactory, ResourceManager, ResourceSpec};
pub use resource::state::ResourceState;
pub use resource::{Direction, GateRequest, Resource, ResourceInstance};
pub use scheduler::{
    CriticalPathHeuristic, Heuristic, HeuristicKind, Schedule, Scheduler, SchedulerOptions,
    TrivialHeuristic, schedule_alap, schedule_asap,
};
