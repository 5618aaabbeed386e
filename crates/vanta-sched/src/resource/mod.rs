//! Scheduling resources.
//!
//! Resources model hardware constraints that the dependency graph does
//! not capture, such as a shared readout instrument that can only
//! handle a bounded number of simultaneous operations. A resource is
//! queried per candidate (statement, cycle) pair and answers whether
//! the statement may start there; committing the query updates the
//! resource's internal state.
//!
//! Resource state is direction-sensitive: a state built for forward
//! scheduling must be queried with non-decreasing cycle numbers, one
//! built for backward scheduling with non-increasing ones.

pub mod instrument;
pub mod manager;
pub mod qubit;
pub mod state;

use std::fmt;

use vanta_ir::QubitId;

/// The scheduling direction a resource state is built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Scheduling with non-decreasing cycle numbers (ASAP).
    Forward,
    /// Scheduling with non-increasing cycle numbers (ALAP).
    Backward,
    /// No direction requirement. Built-in resources reject this, but
    /// custom resources that track no cycle state may accept it.
    Undefined,
}

/// What a resource gets to see about a statement being placed.
#[derive(Debug, Clone, Copy)]
pub struct GateRequest<'a> {
    /// Name of the instruction.
    pub name: &'a str,
    /// The qubits it operates on.
    pub qubits: &'a [QubitId],
    /// Its duration in cycles.
    pub duration: u64,
}

/// A resource implementation.
///
/// Implementations may assume that the cycle numbers they see respect
/// the direction they were constructed for; the [`ResourceInstance`]
/// wrapper enforces this before calling in.
pub trait Resource: fmt::Debug {
    /// Check whether the statement may start at the given cycle, and
    /// commit it to the internal state if `commit` is set. Must not
    /// change state when `commit` is unset or when returning `false`.
    fn gate(&mut self, cycle: i64, request: &GateRequest<'_>, commit: bool) -> bool;

    /// Clone the resource, state included.
    fn clone_box(&self) -> Box<dyn Resource>;
}

impl Clone for Box<dyn Resource> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// A constructed resource with its identity and the cycle-order
/// guard.
#[derive(Debug, Clone)]
pub struct ResourceInstance {
    type_name: String,
    name: String,
    direction: Direction,
    /// Cycle of the last committed gate, used to reject out-of-order
    /// queries.
    prev_cycle: Option<i64>,
    imp: Box<dyn Resource>,
}

impl ResourceInstance {
    pub(crate) fn new(
        type_name: String,
        name: String,
        direction: Direction,
        imp: Box<dyn Resource>,
    ) -> Self {
        Self {
            type_name,
            name,
            direction,
            prev_cycle: None,
            imp,
        }
    }

    /// The registered type of this resource.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// The unique instance name of this resource.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The direction this instance was built for.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Query or commit a statement at the given cycle. Queries that go
    /// against the scheduling direction relative to the last committed
    /// cycle are rejected outright.
    pub fn gate(&mut self, cycle: i64, request: &GateRequest<'_>, commit: bool) -> bool {
        let out_of_order = match (self.direction, self.prev_cycle) {
            (Direction::Forward, Some(prev)) => cycle < prev,
            (Direction::Backward, Some(prev)) => cycle > prev,
            _ => false,
        };
        if out_of_order {
            return false;
        }
        let ok = self.imp.gate(cycle, request, commit);
        if ok && commit {
            self.prev_cycle = Some(cycle);
        }
        ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone)]
    struct AlwaysFree;

    impl Resource for AlwaysFree {
        fn gate(&mut self, _cycle: i64, _request: &GateRequest<'_>, _commit: bool) -> bool {
            true
        }

        fn clone_box(&self) -> Box<dyn Resource> {
            Box::new(self.clone())
        }
    }

    fn request() -> GateRequest<'static> {
        GateRequest {
            name: "x",
            qubits: &[],
            duration: 1,
        }
    }

    #[test]
    fn test_forward_rejects_out_of_order() {
        let mut instance = ResourceInstance::new(
            "test".into(),
            "test".into(),
            Direction::Forward,
            Box::new(AlwaysFree),
        );
        assert!(instance.gate(5, &request(), true));
        // Checking earlier cycles is rejected, same or later is fine.
        assert!(!instance.gate(4, &request(), false));
        assert!(instance.gate(5, &request(), false));
        assert!(instance.gate(7, &request(), true));
    }

    #[test]
    fn test_backward_rejects_out_of_order() {
        let mut instance = ResourceInstance::new(
            "test".into(),
            "test".into(),
            Direction::Backward,
            Box::new(AlwaysFree),
        );
        assert!(instance.gate(-5, &request(), true));
        assert!(!instance.gate(-4, &request(), false));
        assert!(instance.gate(-7, &request(), true));
    }

    #[test]
    fn test_unsuccessful_query_keeps_watermark() {
        let mut instance = ResourceInstance::new(
            "test".into(),
            "test".into(),
            Direction::Forward,
            Box::new(AlwaysFree),
        );
        // Non-committing calls never move the watermark.
        assert!(instance.gate(5, &request(), false));
        assert!(instance.gate(2, &request(), true));
    }
}
