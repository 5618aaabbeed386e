//! Instructions combining gates with operands and timing.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::gate::{GateKind, StandardGate};
use crate::qubit::{ClbitId, QubitId};

/// The kind of instruction in a block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InstructionKind {
    /// A quantum gate operation.
    Gate(GateKind),
    /// Measurement of qubits into classical bits.
    Measure,
    /// Reset qubit to |0⟩.
    Reset,
    /// Barrier (synchronization point). A barrier without operands
    /// synchronizes everything.
    Barrier,
    /// Delay on a qubit for the instruction's duration.
    Delay,
}

/// A complete instruction with operands and a duration in cycles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instruction {
    /// The kind of instruction.
    pub kind: InstructionKind,
    /// Qubits this instruction operates on.
    pub qubits: Vec<QubitId>,
    /// Classical bits this instruction writes (for measure).
    pub clbits: Vec<ClbitId>,
    /// Classical bits read as an execution condition, if any.
    pub condition: Vec<ClbitId>,
    /// Duration in cycles. Timed instructions must have a non-zero
    /// duration; barriers take zero cycles.
    pub duration: u64,
}

impl Instruction {
    /// Create a gate instruction with the default duration of one cycle.
    pub fn gate(gate: impl Into<GateKind>, qubits: impl IntoIterator<Item = QubitId>) -> Self {
        Self {
            kind: InstructionKind::Gate(gate.into()),
            qubits: qubits.into_iter().collect(),
            clbits: vec![],
            condition: vec![],
            duration: 1,
        }
    }

    /// Create a single-qubit gate instruction.
    pub fn single_qubit_gate(gate: StandardGate, qubit: QubitId) -> Self {
        Self::gate(gate, [qubit])
    }

    /// Create a two-qubit gate instruction.
    pub fn two_qubit_gate(gate: StandardGate, q1: QubitId, q2: QubitId) -> Self {
        Self::gate(gate, [q1, q2])
    }

    /// Create a measurement instruction.
    pub fn measure(qubit: QubitId, clbit: ClbitId) -> Self {
        Self {
            kind: InstructionKind::Measure,
            qubits: vec![qubit],
            clbits: vec![clbit],
            condition: vec![],
            duration: 1,
        }
    }

    /// Create a reset instruction.
    pub fn reset(qubit: QubitId) -> Self {
        Self {
            kind: InstructionKind::Reset,
            qubits: vec![qubit],
            clbits: vec![],
            condition: vec![],
            duration: 1,
        }
    }

    /// Create a barrier instruction. An empty qubit list synchronizes
    /// everything.
    pub fn barrier(qubits: impl IntoIterator<Item = QubitId>) -> Self {
        Self {
            kind: InstructionKind::Barrier,
            qubits: qubits.into_iter().collect(),
            clbits: vec![],
            condition: vec![],
            duration: 0,
        }
    }

    /// Create a delay instruction.
    pub fn delay(qubit: QubitId, duration: u64) -> Self {
        Self {
            kind: InstructionKind::Delay,
            qubits: vec![qubit],
            clbits: vec![],
            condition: vec![],
            duration,
        }
    }

    /// Set the duration in cycles.
    #[must_use]
    pub fn with_duration(mut self, duration: u64) -> Self {
        self.duration = duration;
        self
    }

    /// Condition execution on the given classical bits.
    #[must_use]
    pub fn with_condition(mut self, clbits: impl IntoIterator<Item = ClbitId>) -> Self {
        self.condition = clbits.into_iter().collect();
        self
    }

    /// Check if this is a gate instruction.
    pub fn is_gate(&self) -> bool {
        matches!(self.kind, InstructionKind::Gate(_))
    }

    /// Check if this is a measurement.
    pub fn is_measure(&self) -> bool {
        matches!(self.kind, InstructionKind::Measure)
    }

    /// Check if this is a barrier.
    pub fn is_barrier(&self) -> bool {
        matches!(self.kind, InstructionKind::Barrier)
    }

    /// Get the gate if this is a gate instruction.
    pub fn as_gate(&self) -> Option<&GateKind> {
        match &self.kind {
            InstructionKind::Gate(g) => Some(g),
            _ => None,
        }
    }

    /// Get the name of the instruction.
    pub fn name(&self) -> &str {
        match &self.kind {
            InstructionKind::Gate(g) => g.name(),
            InstructionKind::Measure => "measure",
            InstructionKind::Reset => "reset",
            InstructionKind::Barrier => "barrier",
            InstructionKind::Delay => "delay",
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.condition.is_empty() {
            write!(f, "if (")?;
            for (i, c) in self.condition.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{c}")?;
            }
            write!(f, ") ")?;
        }
        write!(f, "{}", self.name())?;
        let mut first = true;
        for q in &self.qubits {
            write!(f, "{} {q}", if first { "" } else { "," })?;
            first = false;
        }
        for c in &self.clbits {
            write!(f, "{} {c}", if first { "" } else { "," })?;
            first = false;
        }
        Ok(())
    }
}
