//! Blocks: straight-line sequences of instructions.

use serde::{Deserialize, Serialize};

use crate::error::{IrError, IrResult};
use crate::gate::StandardGate;
use crate::instruction::{Instruction, InstructionKind};
use crate::qubit::{ClbitId, QubitId};

/// A straight-line block of instructions.
///
/// Statements are identified by their position in the block; the
/// position is the stable identity the scheduler keys its maps on.
/// Control flow between blocks is tracked elsewhere; a block itself has
/// no internal control flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// Name of the block, for diagnostics.
    pub name: String,
    /// Number of qubits addressable in this block.
    num_qubits: u32,
    /// Number of classical bits addressable in this block.
    num_clbits: u32,
    /// The instructions, in program order.
    statements: Vec<Instruction>,
}

impl Block {
    /// Create a new empty block with the given register sizes.
    pub fn with_size(name: impl Into<String>, num_qubits: u32, num_clbits: u32) -> Self {
        Self {
            name: name.into(),
            num_qubits,
            num_clbits,
            statements: Vec::new(),
        }
    }

    /// Get the number of qubits.
    #[inline]
    pub fn num_qubits(&self) -> u32 {
        self.num_qubits
    }

    /// Get the number of classical bits.
    #[inline]
    pub fn num_clbits(&self) -> u32 {
        self.num_clbits
    }

    /// Get the number of statements.
    #[inline]
    pub fn len(&self) -> usize {
        self.statements.len()
    }

    /// Check if the block has no statements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// Get a statement by position.
    #[inline]
    pub fn statement(&self, index: usize) -> Option<&Instruction> {
        self.statements.get(index)
    }

    /// Iterate over the statements in program order.
    pub fn statements(&self) -> impl Iterator<Item = &Instruction> {
        self.statements.iter()
    }

    /// Append an instruction to the block after validating its operands
    /// and duration. Returns the position of the new statement.
    pub fn push(&mut self, instruction: Instruction) -> IrResult<usize> {
        // Gate arity must match the qubit operand count.
        if let InstructionKind::Gate(gate) = &instruction.kind {
            let expected = gate.num_qubits();
            let got = instruction.qubits.len() as u32;
            if expected != got {
                return Err(IrError::QubitCountMismatch {
                    name: gate.name().to_string(),
                    expected,
                    got,
                });
            }
        }

        for &qubit in &instruction.qubits {
            if qubit.0 >= self.num_qubits {
                return Err(IrError::QubitOutOfRange {
                    qubit,
                    num_qubits: self.num_qubits,
                    name: instruction.name().to_string(),
                });
            }
        }
        for &clbit in instruction.clbits.iter().chain(&instruction.condition) {
            if clbit.0 >= self.num_clbits {
                return Err(IrError::ClbitOutOfRange {
                    clbit,
                    num_clbits: self.num_clbits,
                    name: instruction.name().to_string(),
                });
            }
        }

        let mut seen = Vec::with_capacity(instruction.qubits.len());
        for &qubit in &instruction.qubits {
            if seen.contains(&qubit) {
                return Err(IrError::DuplicateQubit {
                    qubit,
                    name: instruction.name().to_string(),
                });
            }
            seen.push(qubit);
        }

        // Barriers legitimately take zero cycles; everything else must
        // occupy at least one.
        if instruction.duration == 0 && !instruction.is_barrier() {
            return Err(IrError::ZeroDuration {
                name: instruction.name().to_string(),
            });
        }

        self.statements.push(instruction);
        Ok(self.statements.len() - 1)
    }

    /// Append a Hadamard gate.
    pub fn h(&mut self, qubit: QubitId) -> IrResult<usize> {
        self.push(Instruction::single_qubit_gate(StandardGate::H, qubit))
    }

    /// Append a Pauli-X gate.
    pub fn x(&mut self, qubit: QubitId) -> IrResult<usize> {
        self.push(Instruction::single_qubit_gate(StandardGate::X, qubit))
    }

    /// Append a Pauli-Z gate.
    pub fn z(&mut self, qubit: QubitId) -> IrResult<usize> {
        self.push(Instruction::single_qubit_gate(StandardGate::Z, qubit))
    }

    /// Append an Rz rotation.
    pub fn rz(&mut self, theta: f64, qubit: QubitId) -> IrResult<usize> {
        self.push(Instruction::single_qubit_gate(StandardGate::Rz(theta), qubit))
    }

    /// Append an Rx rotation.
    pub fn rx(&mut self, theta: f64, qubit: QubitId) -> IrResult<usize> {
        self.push(Instruction::single_qubit_gate(StandardGate::Rx(theta), qubit))
    }

    /// Append a CNOT gate.
    pub fn cx(&mut self, control: QubitId, target: QubitId) -> IrResult<usize> {
        self.push(Instruction::two_qubit_gate(StandardGate::CX, control, target))
    }

    /// Append a CZ gate.
    pub fn cz(&mut self, q1: QubitId, q2: QubitId) -> IrResult<usize> {
        self.push(Instruction::two_qubit_gate(StandardGate::CZ, q1, q2))
    }

    /// Append a measurement.
    pub fn measure(&mut self, qubit: QubitId, clbit: ClbitId) -> IrResult<usize> {
        self.push(Instruction::measure(qubit, clbit))
    }

    /// Append a reset.
    pub fn reset(&mut self, qubit: QubitId) -> IrResult<usize> {
        self.push(Instruction::reset(qubit))
    }

    /// Append a barrier over the given qubits; an empty list
    /// synchronizes everything.
    pub fn barrier(&mut self, qubits: impl IntoIterator<Item = QubitId>) -> IrResult<usize> {
        self.push(Instruction::barrier(qubits))
    }
}
