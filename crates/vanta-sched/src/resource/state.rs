//! The combined state of all resources during one scheduling run.

use tracing::trace;

use super::{GateRequest, ResourceInstance};
use crate::error::{SchedError, SchedResult};

/// Scheduling state of a set of resources.
///
/// Built fresh for each scheduling run with
/// [`ResourceManager::build`](super::manager::ResourceManager::build).
/// A statement may be placed at a cycle only if *all* resources accept
/// it there; [`reserve`](ResourceState::reserve) commits the placement.
///
/// Reservation is not transactional: if a resource rejects a
/// reservation after earlier resources already committed it, the state
/// is marked broken and every further call fails. Callers avoid this by
/// checking [`available`](ResourceState::available) first.
#[derive(Debug, Clone)]
pub struct ResourceState {
    instances: Vec<ResourceInstance>,
    broken: bool,
}

impl ResourceState {
    pub(crate) fn new(instances: Vec<ResourceInstance>) -> Self {
        Self {
            instances,
            broken: false,
        }
    }

    /// The constructed resource instances.
    pub fn instances(&self) -> &[ResourceInstance] {
        &self.instances
    }

    /// Whether a failed reservation has invalidated this state.
    pub fn is_broken(&self) -> bool {
        self.broken
    }

    /// Check whether the statement may start at the given cycle
    /// according to every resource. Does not change any state.
    pub fn available(&mut self, cycle: i64, request: &GateRequest<'_>) -> SchedResult<bool> {
        if self.broken {
            return Err(SchedError::BrokenState);
        }
        for instance in &mut self.instances {
            if !instance.gate(cycle, request, false) {
                trace!(
                    resource = instance.name(),
                    name = request.name,
                    cycle,
                    "statement not available"
                );
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Commit the statement at the given cycle to every resource.
    ///
    /// On failure the state becomes unusable, since the resources
    /// before the rejecting one have already been updated.
    pub fn reserve(&mut self, cycle: i64, request: &GateRequest<'_>) -> SchedResult<()> {
        if self.broken {
            return Err(SchedError::BrokenState);
        }
        for instance in &mut self.instances {
            if !instance.gate(cycle, request, true) {
                self.broken = true;
                return Err(SchedError::ReservationFailed {
                    name: request.name.to_string(),
                    cycle,
                    resource: instance.name().to_string(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::Direction;
    use super::super::manager::ResourceManager;
    use super::*;
    use serde_json::json;
    use vanta_ir::QubitId;

    fn single_qubit_state() -> ResourceState {
        let mut manager = ResourceManager::default();
        manager
            .add_resource("qubit", None, json!({ "num_qubits": 2 }))
            .unwrap();
        manager.build(Direction::Forward).unwrap()
    }

    #[test]
    fn test_available_then_reserve() {
        let mut state = single_qubit_state();
        let qubits = [QubitId(0)];
        let request = GateRequest {
            name: "x",
            qubits: &qubits,
            duration: 2,
        };
        assert!(state.available(0, &request).unwrap());
        state.reserve(0, &request).unwrap();
        // The qubit is busy for two cycles.
        assert!(!state.available(1, &request).unwrap());
        assert!(state.available(2, &request).unwrap());
    }

    #[test]
    fn test_failed_reservation_breaks_state() {
        let mut state = single_qubit_state();
        let qubits = [QubitId(0)];
        let request = GateRequest {
            name: "x",
            qubits: &qubits,
            duration: 2,
        };
        state.reserve(0, &request).unwrap();
        let err = state.reserve(1, &request).unwrap_err();
        assert!(matches!(err, SchedError::ReservationFailed { .. }));
        assert!(state.is_broken());
        assert!(matches!(
            state.available(5, &request).unwrap_err(),
            SchedError::BrokenState
        ));
    }

    #[test]
    fn test_clone_replays_independently() {
        let mut state = single_qubit_state();
        let qubits = [QubitId(0)];
        let request = GateRequest {
            name: "x",
            qubits: &qubits,
            duration: 1,
        };
        state.reserve(0, &request).unwrap();

        let mut fork = state.clone();
        state.reserve(1, &request).unwrap();
        // The fork still has cycle 1 free.
        assert!(fork.available(1, &request).unwrap());
    }
}
