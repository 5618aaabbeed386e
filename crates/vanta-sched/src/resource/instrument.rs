//! Built-in shared-instrument resource.

use serde::Deserialize;

use super::manager::ResourceContext;
use super::{Direction, GateRequest, Resource};
use crate::error::{SchedError, SchedResult};

fn default_count() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Config {
    /// Number of operations the instrument can handle simultaneously.
    #[serde(default = "default_count")]
    count: u32,
    /// Instruction names the instrument applies to. When absent, all
    /// instructions are affected.
    #[serde(default)]
    instructions: Option<Vec<String>>,
}

/// Models a shared piece of hardware with a bounded number of slots,
/// such as a readout unit that can measure at most N qubits at once.
///
/// Each slot carries the same free-from (forward) or free-until
/// (backward) watermark as the qubit resource; an affected statement
/// claims one free slot for its duration. With `count` 1 the
/// instrument serializes all affected statements.
///
/// Configuration: `{ "count": <slots>, "instructions": [<names>] }`,
/// both fields optional.
#[derive(Debug, Clone)]
pub struct InstrumentResource {
    direction: Direction,
    slots: Vec<i64>,
    instructions: Option<Vec<String>>,
}

impl InstrumentResource {
    /// Construct from a resource context.
    pub fn from_context(context: &ResourceContext<'_>) -> SchedResult<Self> {
        let config: Config = serde_json::from_value(context.config.clone()).map_err(|err| {
            SchedError::ResourceConfig {
                name: context.name.to_string(),
                reason: err.to_string(),
            }
        })?;
        if config.count == 0 {
            return Err(SchedError::ResourceConfig {
                name: context.name.to_string(),
                reason: "count must be at least 1".to_string(),
            });
        }
        let fill = match context.direction {
            Direction::Forward => i64::MIN,
            Direction::Backward => i64::MAX,
            Direction::Undefined => {
                return Err(SchedError::ResourceConfig {
                    name: context.name.to_string(),
                    reason: "instrument resource requires a scheduling direction".to_string(),
                });
            }
        };
        Ok(Self {
            direction: context.direction,
            slots: vec![fill; config.count as usize],
            instructions: config.instructions,
        })
    }

    fn affects(&self, request: &GateRequest<'_>) -> bool {
        match &self.instructions {
            Some(names) => names.iter().any(|name| name == request.name),
            None => true,
        }
    }
}

impl Resource for InstrumentResource {
    fn gate(&mut self, cycle: i64, request: &GateRequest<'_>, commit: bool) -> bool {
        if !self.affects(request) {
            return true;
        }
        let duration = request.duration as i64;
        let free = |slot: i64| match self.direction {
            Direction::Forward => cycle >= slot,
            _ => cycle + duration <= slot,
        };
        let Some(index) = self.slots.iter().position(|&slot| free(slot)) else {
            return false;
        };
        if commit {
            self.slots[index] = match self.direction {
                Direction::Forward => cycle + duration,
                _ => cycle,
            };
        }
        true
    }

    fn clone_box(&self) -> Box<dyn Resource> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn resource(direction: Direction, config: serde_json::Value) -> InstrumentResource {
        InstrumentResource::from_context(&ResourceContext {
            type_name: "instrument",
            name: "instrument",
            direction,
            config: &config,
        })
        .unwrap()
    }

    fn request(name: &str, duration: u64) -> GateRequest<'_> {
        GateRequest {
            name,
            qubits: &[],
            duration,
        }
    }

    #[test]
    fn test_single_slot_serializes() {
        let mut res = resource(Direction::Forward, json!({}));
        assert!(res.gate(0, &request("measure", 2), true));
        assert!(!res.gate(1, &request("measure", 2), false));
        assert!(res.gate(2, &request("measure", 2), true));
    }

    #[test]
    fn test_two_slots_allow_overlap() {
        let mut res = resource(Direction::Forward, json!({ "count": 2 }));
        assert!(res.gate(0, &request("measure", 4), true));
        assert!(res.gate(1, &request("measure", 4), true));
        assert!(!res.gate(2, &request("measure", 4), false));
        assert!(res.gate(4, &request("measure", 4), true));
    }

    #[test]
    fn test_instruction_predicate() {
        let mut res = resource(
            Direction::Forward,
            json!({ "instructions": ["measure"] }),
        );
        assert!(res.gate(0, &request("measure", 4), true));
        // Other instructions pass through freely.
        assert!(res.gate(1, &request("x", 1), true));
        assert!(!res.gate(1, &request("measure", 4), false));
    }

    #[test]
    fn test_backward_slots() {
        let mut res = resource(Direction::Backward, json!({}));
        assert!(res.gate(-2, &request("measure", 2), true));
        assert!(!res.gate(-3, &request("measure", 2), false));
        assert!(res.gate(-4, &request("measure", 2), true));
    }

    #[test]
    fn test_zero_count_rejected() {
        let config = json!({ "count": 0 });
        let err = InstrumentResource::from_context(&ResourceContext {
            type_name: "instrument",
            name: "instrument",
            direction: Direction::Forward,
            config: &config,
        })
        .unwrap_err();
        assert!(matches!(err, SchedError::ResourceConfig { .. }));
    }
}
