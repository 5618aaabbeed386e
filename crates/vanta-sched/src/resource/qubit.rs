//! Built-in qubit occupancy resource.

use serde::Deserialize;

use super::manager::ResourceContext;
use super::{Direction, GateRequest, Resource};
use crate::error::{SchedError, SchedResult};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Config {
    num_qubits: u32,
}

/// Tracks per-qubit occupancy: a qubit can run one operation at a
/// time.
///
/// For forward scheduling each qubit stores the cycle it becomes free
/// *from*; for backward scheduling the cycle it is free *until*.
/// Qubits outside the configured range are ignored.
///
/// Configuration: `{ "num_qubits": <count> }`.
#[derive(Debug, Clone)]
pub struct QubitResource {
    direction: Direction,
    state: Vec<i64>,
}

impl QubitResource {
    /// Construct from a resource context.
    pub fn from_context(context: &ResourceContext<'_>) -> SchedResult<Self> {
        let config: Config = serde_json::from_value(context.config.clone()).map_err(|err| {
            SchedError::ResourceConfig {
                name: context.name.to_string(),
                reason: err.to_string(),
            }
        })?;
        let fill = match context.direction {
            Direction::Forward => i64::MIN,
            Direction::Backward => i64::MAX,
            Direction::Undefined => {
                return Err(SchedError::ResourceConfig {
                    name: context.name.to_string(),
                    reason: "qubit resource requires a scheduling direction".to_string(),
                });
            }
        };
        Ok(Self {
            direction: context.direction,
            state: vec![fill; config.num_qubits as usize],
        })
    }
}

impl Resource for QubitResource {
    fn gate(&mut self, cycle: i64, request: &GateRequest<'_>, commit: bool) -> bool {
        let duration = request.duration as i64;
        for &qubit in request.qubits {
            let Some(&state) = self.state.get(qubit.0 as usize) else {
                continue;
            };
            let free = match self.direction {
                Direction::Forward => cycle >= state,
                _ => cycle + duration <= state,
            };
            if !free {
                return false;
            }
        }
        if commit {
            for &qubit in request.qubits {
                let index = qubit.0 as usize;
                if index < self.state.len() {
                    self.state[index] = match self.direction {
                        Direction::Forward => cycle + duration,
                        _ => cycle,
                    };
                }
            }
        }
        true
    }

    fn clone_box(&self) -> Box<dyn Resource> {
        Box::new(self.clone())
    }
}
