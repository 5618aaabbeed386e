//! Error types for the IR crate.

use crate::qubit::{ClbitId, QubitId};
use thiserror::Error;

/// Errors that can occur when constructing blocks.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum IrError {
    /// Qubit index out of range for the block.
    #[error("qubit {qubit} out of range for block with {num_qubits} qubits (instruction: {name})")]
    QubitOutOfRange {
        /// The offending qubit.
        qubit: QubitId,
        /// Number of qubits in the block.
        num_qubits: u32,
        /// Name of the instruction.
        name: String,
    },

    /// Classical bit index out of range for the block.
    #[error(
        "classical bit {clbit} out of range for block with {num_clbits} bits (instruction: {name})"
    )]
    ClbitOutOfRange {
        /// The offending classical bit.
        clbit: ClbitId,
        /// Number of classical bits in the block.
        num_clbits: u32,
        /// Name of the instruction.
        name: String,
    },

    /// Gate requires a different number of qubits.
    #[error("gate '{name}' requires {expected} qubits, got {got}")]
    QubitCountMismatch {
        /// Name of the gate.
        name: String,
        /// Expected number of qubits.
        expected: u32,
        /// Actual number of qubits provided.
        got: u32,
    },

    /// Duplicate qubit operand in one instruction.
    #[error("duplicate qubit {qubit} in instruction '{name}'")]
    DuplicateQubit {
        /// The duplicate qubit.
        qubit: QubitId,
        /// Name of the instruction.
        name: String,
    },

    /// Timed instruction with a zero duration.
    #[error("instruction '{name}' has zero duration; timed instructions take at least one cycle")]
    ZeroDuration {
        /// Name of the instruction.
        name: String,
    },
}

/// Result type for IR operations.
pub type IrResult<T> = Result<T, IrError>;
